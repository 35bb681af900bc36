//! JSON codec for persisted content.
//!
//! The wire format is UTF-8 JSON text encoding the two-element
//! `[tables, values]` array. The store distinguishes explicitly-absent
//! entries from every representable value; JSON has no way to say
//! "absent", so the null literal stands in for it on the wire and decoding
//! maps null back to absent. A real null therefore cannot appear in
//! content - `Option<Cell>` has no null-carrying variant - which is the
//! same accepted limitation other implementations of this format carry.

use thiserror::Error;

use tabula_persister::PersisterError;
use tabula_store::Content;

/// Errors from encoding or decoding persisted content.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The text is not well-formed JSON in the `[tables, values]` shape.
    #[error("malformed persisted content: {0}")]
    Parse(#[source] serde_json::Error),

    /// The content could not be serialized.
    #[error("failed to serialize persisted content: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl From<CodecError> for PersisterError {
    fn from(error: CodecError) -> Self {
        PersisterError::Codec {
            message: error.to_string(),
        }
    }
}

/// Parse JSON text into content, mapping null entries to absent.
pub fn decode(text: &str) -> Result<Content, CodecError> {
    serde_json::from_str(text).map_err(CodecError::Parse)
}

/// Serialize content to JSON text, mapping absent entries to null.
///
/// Exact inverse of [`decode`]: `decode(&encode(x)?)? == x` for any
/// content `x`.
pub fn encode(content: &Content) -> Result<String, CodecError> {
    serde_json::to_string(content).map_err(CodecError::Serialize)
}
