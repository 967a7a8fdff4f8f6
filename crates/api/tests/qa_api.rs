//! Integration tests for the glacier Q&A endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_bytes, body_json, get, post_json, ScriptedGenerator};
use glacier_core::memory::InMemoryBackend;
use serde_json::json;

fn ask_body(question: &str) -> serde_json::Value {
    json!({
        "question": question,
        "glacier": "Pindari Glacier",
        "variable": "Air Temperature",
        "date": "2023-08-15",
    })
}

// ---------------------------------------------------------------------------
// Test: Blank questions are rejected without calling the model
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blank_question_is_rejected_without_generation() {
    let generator = ScriptedGenerator::new();
    let app = common::build_test_app(InMemoryBackend::demo(), generator.clone());

    let response = post_json(app.clone(), "/api/v1/qa/ask", ask_body("   ")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Please enter a question.");
    assert_eq!(generator.calls(), 0);

    let response = get(app, "/api/v1/qa/latest").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: An answer is returned with its context and stored for the session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn answer_is_returned_and_stored() {
    let generator = ScriptedGenerator::new();
    let app = common::build_test_app(InMemoryBackend::demo(), generator.clone());

    let response = post_json(
        app.clone(),
        "/api/v1/qa/ask",
        ask_body("Is the glacier melting?"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["question"], "Is the glacier melting?");
    assert_eq!(json["data"]["answer"], ScriptedGenerator::ANSWER);

    let context = json["data"]["context"].as_str().unwrap();
    assert!(context.contains("- Glacier/Location: Pindari Glacier"));
    assert!(context.contains("- Analysis Date: 2023-08-15"));
    assert!(context.contains("- Mean Temperature: 263.15 K (-10.00 °C)"));
    assert!(!context.contains("Glacier Velocity Analysis"));

    let prompt = generator.last_prompt().unwrap();
    assert!(prompt.contains(context));
    assert!(prompt.ends_with("**User Question:** Is the glacier melting?"));

    let response = get(app, "/api/v1/qa/latest").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["question"], "Is the glacier melting?");
    assert_eq!(json["data"]["answer"], ScriptedGenerator::ANSWER);
}

// ---------------------------------------------------------------------------
// Test: Generation failures come back as the answer text
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generation_failure_becomes_answer_text() {
    let generator = ScriptedGenerator::failing("quota exceeded");
    let app = common::build_test_app(InMemoryBackend::demo(), generator.clone());

    let response = post_json(app, "/api/v1/qa/ask", ask_body("Why?")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["data"]["answer"],
        "Error generating response: quota exceeded"
    );
    assert_eq!(generator.calls(), 1);
}

// ---------------------------------------------------------------------------
// Test: Only a successful velocity result reaches the context
// ---------------------------------------------------------------------------

#[tokio::test]
async fn context_includes_velocity_after_success_only() {
    let app = common::build_demo_app();

    let failing = json!({
        "glacier": "Pindari Glacier",
        "start_date": "2023-06-01",
        "end_date": "2023-11-15",
    });
    post_json(app.clone(), "/api/v1/velocity", failing).await;

    let response = post_json(app.clone(), "/api/v1/qa/ask", ask_body("How fast?")).await;
    let context = body_json(response).await["data"]["context"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(!context.contains("Glacier Velocity Analysis"));

    let summer = json!({
        "glacier": "Pindari Glacier",
        "start_date": "2023-06-01",
        "end_date": "2023-08-31",
    });
    post_json(app.clone(), "/api/v1/velocity", summer).await;

    let response = post_json(app, "/api/v1/qa/ask", ask_body("How fast?")).await;
    let context = body_json(response).await["data"]["context"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(context.contains("- Time Period: 2023-06-01 to 2023-08-31"));
    assert!(context.contains("- Average Velocity: 0.5495 m/day"));
    assert!(context.contains("- Max Velocity: 0.5495 m/day"));
}

// ---------------------------------------------------------------------------
// Test: Climate sampling faults do not block an answer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn answer_survives_backend_fault() {
    let generator = ScriptedGenerator::new();
    let app = common::build_test_app(
        InMemoryBackend::demo().failing("service unavailable"),
        generator.clone(),
    );

    let response = post_json(app, "/api/v1/qa/ask", ask_body("Anything?")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["answer"], ScriptedGenerator::ANSWER);
    let context = json["data"]["context"].as_str().unwrap();
    assert!(context.contains("- Selected Variable: Air Temperature"));
    assert!(!context.contains("Mean Temperature"));
    assert_eq!(generator.calls(), 1);
}

// ---------------------------------------------------------------------------
// Test: Suggestions grow once a velocity result exists
// ---------------------------------------------------------------------------

#[tokio::test]
async fn suggestions_depend_on_velocity() {
    let app = common::build_demo_app();
    let uri = "/api/v1/qa/suggestions?glacier=Pindari%20Glacier&variable=snow_depth";

    let response = get(app.clone(), uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let questions = json["data"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(
        questions[0],
        "How might current Snow Depth conditions affect Pindari Glacier?"
    );

    let summer = json!({
        "glacier": "Pindari Glacier",
        "start_date": "2023-06-01",
        "end_date": "2023-08-31",
    });
    post_json(app.clone(), "/api/v1/velocity", summer).await;

    let response = get(app, uri).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 4);
}

// ---------------------------------------------------------------------------
// Test: The latest exchange downloads as a text attachment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn latest_exchange_downloads_as_text() {
    let app = common::build_demo_app();

    let response = get(app.clone(), "/api/v1/qa/latest/download").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    post_json(app.clone(), "/api/v1/qa/ask", ask_body("Is it stable?")).await;

    let response = get(app, "/api/v1/qa/latest/download").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "attachment; filename=\"glacier_analysis.txt\""
    );

    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert_eq!(
        body,
        format!("Question: Is it stable?\n\nAnswer:\n{}", ScriptedGenerator::ANSWER)
    );
}
