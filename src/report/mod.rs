//! Rendering of completed caption frames for stdout

use serde::Serialize;
use crate::caption::{CaptionMode, FrameSnapshot};
use crate::types::OutputFormat;

/// Separator printed above every frame in text output
pub const FRAME_SEPARATOR: &str = "-------------------------------";

/// JSON structure for one frame (internal serialization)
#[derive(Serialize)]
struct FrameJson<'a> {
    ts_time: String,
    timestamp: f64,
    mode: CaptionMode,
    lines: &'a [String],
}

/// Output formatter for caption frames
pub struct Reporter;

impl Reporter {
    /// Renders one frame; the result carries no trailing newline.
    pub fn render(frame: &FrameSnapshot, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => Self::render_text(frame),
            OutputFormat::Json => Self::render_json(frame),
            OutputFormat::Dump => frame.dump().trim_end().to_string(),
        }
    }

    fn render_text(frame: &FrameSnapshot) -> String {
        let text = frame.to_text();
        if text.is_empty() {
            FRAME_SEPARATOR.to_string()
        } else {
            format!("{FRAME_SEPARATOR}\n{text}")
        }
    }

    /// Single-line JSON object stamped with the wall-clock time it was written
    fn render_json(frame: &FrameSnapshot) -> String {
        let rep = FrameJson {
            ts_time: chrono::Utc::now().to_rfc3339(),
            timestamp: frame.timestamp,
            mode: frame.mode,
            lines: &frame.lines,
        };
        serde_json::to_string(&rep).unwrap_or_else(|_| "{\"error\": \"JSON serialization failed\"}".to_string())
    }
}
