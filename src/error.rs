//! Errors surfaced at the JavaScript boundary.
//!
//! The layout, routing and interaction core never fails; only decoding host
//! payloads and resolving host-supplied ids can.

use wasm_bindgen::JsValue;

use crate::graph::RelativeId;

#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// A JS value did not decode into the expected shape.
    #[error("invalid {what}: {message}")]
    InvalidPayload { what: &'static str, message: String },

    /// The host referenced a relative that is not laid out.
    #[error("unknown relative {}", .0.raw())]
    UnknownRelative(RelativeId),

    /// A value could not be handed back to JavaScript.
    #[error("failed to serialize {what}: {message}")]
    Serialize { what: &'static str, message: String },
}

impl CanvasError {
    pub fn invalid(what: &'static str, err: impl std::fmt::Display) -> Self {
        CanvasError::InvalidPayload {
            what,
            message: err.to_string(),
        }
    }

    pub fn serialize(what: &'static str, err: impl std::fmt::Display) -> Self {
        CanvasError::Serialize {
            what,
            message: err.to_string(),
        }
    }
}

impl From<CanvasError> for JsValue {
    fn from(err: CanvasError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

pub type Result<T> = std::result::Result<T, CanvasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = CanvasError::invalid("relatives", "expected a sequence");
        assert_eq!(err.to_string(), "invalid relatives: expected a sequence");
        assert_eq!(
            CanvasError::UnknownRelative(RelativeId(9)).to_string(),
            "unknown relative 9"
        );
    }
}
