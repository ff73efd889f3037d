//! Canvas drawing tools — generated SVG markup.
//!
//! Drawing is expressed as markup generation: each call returns an SVG
//! fragment as its observation, and the caller decides where the fragments
//! end up. Keeping the tools pure means the shared registry carries no
//! mutable canvas state across concurrent tasks.

use async_trait::async_trait;
use stepline_core::error::ToolError;
use stepline_core::step::Observation;
use stepline_core::tool::Tool;

use crate::require_number;

pub struct DrawRectangleTool;

#[async_trait]
impl Tool for DrawRectangleTool {
    fn name(&self) -> &str {
        "draw_rectangle"
    }

    fn description(&self) -> &str {
        "Draw a rectangle from corner (x1,y1) to corner (x2,y2); returns SVG markup."
    }

    fn params(&self) -> &[&str] {
        &["x1", "y1", "x2", "y2"]
    }

    async fn invoke(&self, args: &[String]) -> Result<Observation, ToolError> {
        let x1 = require_number(self.name(), "x1", &args[0])?;
        let y1 = require_number(self.name(), "y1", &args[1])?;
        let x2 = require_number(self.name(), "x2", &args[2])?;
        let y2 = require_number(self.name(), "y2", &args[3])?;

        if x2 <= x1 || y2 <= y1 {
            return Err(ToolError::ExecutionFailed {
                tool: self.name().to_string(),
                reason: format!(
                    "corner ({x2},{y2}) must be below and right of ({x1},{y1})"
                ),
            });
        }

        Ok(Observation::Text(format!(
            r#"<rect x="{x1}" y="{y1}" width="{}" height="{}" fill="none" stroke="black"/>"#,
            x2 - x1,
            y2 - y1
        )))
    }
}

pub struct DrawTextTool;

#[async_trait]
impl Tool for DrawTextTool {
    fn name(&self) -> &str {
        "draw_text"
    }

    fn description(&self) -> &str {
        "Place text at position (x,y); returns SVG markup."
    }

    fn params(&self) -> &[&str] {
        &["x", "y", "text"]
    }

    async fn invoke(&self, args: &[String]) -> Result<Observation, ToolError> {
        let x = require_number(self.name(), "x", &args[0])?;
        let y = require_number(self.name(), "y", &args[1])?;
        let text = xml_escape(&args[2]);

        Ok(Observation::Text(format!(
            r#"<text x="{x}" y="{y}">{text}</text>"#
        )))
    }
}

fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
