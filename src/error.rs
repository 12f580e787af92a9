//! Structured error types for the glyphflow layout engine.
//!
//! Only input decoding can fail outright. A layout pass itself always
//! completes; glyph and font problems are logged and degraded in place.

use thiserror::Error;

/// The unified error type returned by fallible glyphflow API functions.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// JSON input failed to parse as a valid text document.
    #[error("Failed to parse document: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// A font source could not be decoded or parsed.
    #[error("Font error: {0}")]
    Font(String),
    /// A glyph could not be loaded by the rasterizer.
    #[error("Glyph {glyph_id} could not be loaded: {message}")]
    Glyph { glyph_id: u16, message: String },
    /// Path data produced no usable geometry.
    #[error("Path error: {0}")]
    Path(String),
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for LayoutError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the text document schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        LayoutError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_has_hint() {
        let err: LayoutError = serde_json::from_str::<serde_json::Value>("{,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse document"));
        assert!(msg.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn test_eof_error_hint() {
        let err: LayoutError = serde_json::from_str::<serde_json::Value>("{\"a\": ")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_glyph_error_display() {
        let err = LayoutError::Glyph {
            glyph_id: 7,
            message: "no outline".to_string(),
        };
        assert_eq!(err.to_string(), "Glyph 7 could not be loaded: no outline");
    }
}
