//! Map legend for a rendered layer.

use serde::Serialize;

use crate::climate::legend_unit;
use crate::geo::VisParams;

/// Colour-bar legend derived from a layer's visualization options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: String,
    pub unit: String,
    /// CSS `linear-gradient` over the palette, left to right.
    pub gradient: String,
    /// Min, mid and max labels, one decimal each.
    pub labels: [String; 3],
    pub html: String,
}

impl Legend {
    pub fn new(variable_name: &str, vis: &VisParams) -> Self {
        let unit = legend_unit(variable_name).to_string();
        let title = format!("{variable_name} ({unit})");
        let gradient = format!("linear-gradient(to right, {})", vis.palette.join(", "));
        let mid = (vis.min + vis.max) / 2.0;
        let labels = [
            format!("{:.1}", vis.min),
            format!("{mid:.1}"),
            format!("{:.1}", vis.max),
        ];
        let html = render_html(&title, &gradient, &labels);
        Self {
            title,
            unit,
            gradient,
            labels,
            html,
        }
    }
}

fn render_html(title: &str, gradient: &str, labels: &[String; 3]) -> String {
    let [min, mid, max] = labels;
    format!(
        r#"<div style="position: fixed; bottom: 50px; left: 20px; width: 250px; background-color: rgba(255, 255, 255, 0.85); border-radius: 8px; padding: 10px; font-family: sans-serif; font-size: 14px; box-shadow: 0 2px 6px rgba(0,0,0,0.2); z-index: 1000; border: 1px solid #ddd;">
  <div style="font-weight: bold; margin-bottom: 5px; color: #333;">{title}</div>
  <div style="height: 20px; border-radius: 4px; background: {gradient};"></div>
  <div style="display: flex; justify-content: space-between; font-size: 12px; margin-top: 4px; color: #555;">
    <span>{min}</span>
    <span style="text-align: center;">{mid}</span>
    <span>{max}</span>
  </div>
</div>"#
    )
}
