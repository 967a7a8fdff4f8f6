//! Integration tests for velocity calculation and the stored session result.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_in_session, post_json, post_json_in_session, ScriptedGenerator};
use glacier_api::config::ServerConfig;
use glacier_core::memory::{InMemoryBackend, Polygon};
use serde_json::json;

fn summer_request() -> serde_json::Value {
    json!({
        "glacier": "Pindari Glacier",
        "start_date": "2023-06-01",
        "end_date": "2023-08-31",
    })
}

// ---------------------------------------------------------------------------
// Test: A summer window over the demo glacier recovers the known shift
// ---------------------------------------------------------------------------

#[tokio::test]
async fn calculate_returns_metrics_for_summer_window() {
    let app = common::build_demo_app();
    let response = post_json(app, "/api/v1/velocity", summer_request()).await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["success"], true);
    assert!(data.get("error").is_none());
    assert_eq!(data["elapsed_days"], 91);
    assert_eq!(data["analysis_dates"], json!(["2023-06-01", "2023-08-31"]));

    let expected = InMemoryBackend::DEMO_SHIFT_M / 91.0;
    let mean = data["stats"]["mean"].as_f64().unwrap();
    assert!((mean - expected).abs() < 1e-9, "mean {mean} != {expected}");
    assert!((data["metrics"]["annual_m_per_year"].as_f64().unwrap() - expected * 365.25).abs() < 1e-6);

    assert_eq!(data["display"]["mean"], "0.55 m/day");
    assert_eq!(data["display"]["max"], "0.55 m/day");
    assert_eq!(data["display"]["annual"], "200.7 m/year");
}

// ---------------------------------------------------------------------------
// Test: Start date on or after end date is rejected before any backend call
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_not_before_end_is_rejected() {
    let app = common::build_test_app(
        InMemoryBackend::demo().failing("must not be called"),
        ScriptedGenerator::new(),
    );
    let body = json!({
        "glacier": "Pindari Glacier",
        "start_date": "2023-08-31",
        "end_date": "2023-08-31",
    });
    let response = post_json(app.clone(), "/api/v1/velocity", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "End date must be after start date.");

    // Nothing was stored.
    let response = get(app, "/api/v1/velocity/latest").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: Malformed dates are a 400
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_date_is_rejected() {
    let app = common::build_demo_app();
    let body = json!({
        "glacier": "Pindari Glacier",
        "start_date": "01/06/2023",
        "end_date": "2023-08-31",
    });
    let response = post_json(app, "/api/v1/velocity", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Test: Missing imagery is a failed outcome, stored like a success
// ---------------------------------------------------------------------------

#[tokio::test]
async fn insufficient_imagery_is_reported_and_stored() {
    let app = common::build_demo_app();
    let body = json!({
        "glacier": "Pindari Glacier",
        "start_date": "2023-06-01",
        "end_date": "2023-11-15",
    });
    let response = post_json(app.clone(), "/api/v1/velocity", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], false);
    let error = json["data"]["error"].as_str().unwrap();
    assert!(error.contains("Period 1 had 2 images"), "{error}");
    assert!(error.contains("Period 2 had 0"), "{error}");
    assert!(json["data"].get("stats").is_none());

    let response = get(app, "/api/v1/velocity/latest").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], false);
}

// ---------------------------------------------------------------------------
// Test: No glacier outlines in the area fails the calculation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn area_without_glaciers_fails() {
    let app = common::build_test_app(
        InMemoryBackend::demo().with_glaciers(Vec::<Polygon>::new()),
        ScriptedGenerator::new(),
    );
    let response = post_json(app, "/api/v1/velocity", summer_request()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], false);
    assert_eq!(
        json["data"]["error"],
        "No GLIMS glacier polygons found in the analysis area."
    );
}

// ---------------------------------------------------------------------------
// Test: A later failure replaces an earlier success
// ---------------------------------------------------------------------------

#[tokio::test]
async fn latest_result_is_overwritten() {
    let app = common::build_demo_app();
    post_json(app.clone(), "/api/v1/velocity", summer_request()).await;

    let response = get(app.clone(), "/api/v1/velocity/latest").await;
    assert_eq!(body_json(response).await["data"]["success"], true);

    let failing = json!({
        "glacier": "Pindari Glacier",
        "start_date": "2023-06-01",
        "end_date": "2023-11-15",
    });
    post_json(app.clone(), "/api/v1/velocity", failing).await;

    let response = get(app.clone(), "/api/v1/velocity/latest").await;
    assert_eq!(body_json(response).await["data"]["success"], false);

    // The layer needs a successful result.
    let response = post_json(app, "/api/v1/velocity/latest/layer", json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: A success after a failure clears the stored error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn success_after_failure_replaces_error() {
    let app = common::build_demo_app();
    let failing = json!({
        "glacier": "Pindari Glacier",
        "start_date": "2023-06-01",
        "end_date": "2023-11-15",
    });
    post_json(app.clone(), "/api/v1/velocity", failing).await;

    let response = get(app.clone(), "/api/v1/velocity/latest").await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], false);
    assert!(json["data"]["error"].is_string());

    post_json(app.clone(), "/api/v1/velocity", summer_request()).await;

    let response = get(app.clone(), "/api/v1/velocity/latest").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["success"], true);
    assert!(data.get("error").is_none());
    assert!(data["metrics"].is_object());

    let response = post_json(app, "/api/v1/velocity/latest/layer", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Test: No result yet is a 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn latest_without_result_returns_404() {
    let app = common::build_demo_app();
    let response = get(app, "/api/v1/velocity/latest").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Velocity result not found");
}

// ---------------------------------------------------------------------------
// Test: The stored speed field renders as a tile layer with its legend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn latest_layer_renders_speed_field() {
    let app = common::build_demo_app();
    post_json(app.clone(), "/api/v1/velocity", summer_request()).await;

    let response = post_json(app, "/api/v1/velocity/latest/layer", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["layer"]["name"], "Glacier Velocity (m/day)");
    assert_eq!(data["layer"]["url_template"], "memory://velocity/{z}/{x}/{y}");
    assert_eq!(data["legend"]["labels"], json!(["0.0", "1.0", "2.0"]));
}

// ---------------------------------------------------------------------------
// Test: Results are kept per session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sessions_do_not_share_results() {
    let app = common::build_demo_app();
    let response = post_json_in_session(
        app.clone(),
        "/api/v1/velocity",
        summer_request(),
        Some("tab-a"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_in_session(app.clone(), "/api/v1/velocity/latest", Some("tab-a")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_in_session(app.clone(), "/api/v1/velocity/latest", Some("tab-b")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // No header means the default session, which is also empty.
    let response = get(app, "/api/v1/velocity/latest").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: Custom coordinates work without a catalog name
// ---------------------------------------------------------------------------

#[tokio::test]
async fn custom_coordinates_are_accepted() {
    let app = common::build_demo_app();
    let body = json!({
        "glacier": "Custom Location",
        "lat": 30.32,
        "lon": 79.96,
        "radius_km": 5.0,
        "start_date": "2023-06-01",
        "end_date": "2023-08-31",
    });
    let response = post_json(app, "/api/v1/velocity", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["success"], true);
}

// ---------------------------------------------------------------------------
// Test: A body missing a date is rejected by the JSON extractor
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_date_field_is_unprocessable() {
    let app = common::build_demo_app();
    let body = json!({ "glacier": "Pindari Glacier", "start_date": "2023-06-01" });
    let response = post_json(app, "/api/v1/velocity", body).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ---------------------------------------------------------------------------
// Test: The oldest session is dropped once the session cap is reached
// ---------------------------------------------------------------------------

#[tokio::test]
async fn oldest_session_is_evicted_at_capacity() {
    let config = ServerConfig {
        max_sessions: 2,
        ..common::test_config()
    };
    let app =
        common::build_test_app_with_config(config, InMemoryBackend::demo(), ScriptedGenerator::new());

    for session in ["tab-a", "tab-b", "tab-c"] {
        let response = post_json_in_session(
            app.clone(),
            "/api/v1/velocity",
            summer_request(),
            Some(session),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = get_in_session(app.clone(), "/api/v1/velocity/latest", Some("tab-a")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    for session in ["tab-b", "tab-c"] {
        let response = get_in_session(app.clone(), "/api/v1/velocity/latest", Some(session)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
