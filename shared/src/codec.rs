//! Fixed-width text field codec
//!
//! MAVLink `char[N]` fields are NUL padded. A string that fills the whole
//! field carries no terminator:
//! ```text
//! [ b'R' b'G' b'B' 0 0 0 ... 0 ]   (N bytes)
//! ```

use thiserror::Error;

/// Errors from strict text encoding
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TextError {
    #[error("Text too long: {len} bytes (field width: {width})")]
    TooLong { len: usize, width: usize },

    #[error("Text contains a NUL byte at offset {0}")]
    InteriorNul(usize),
}

/// Encode `text` into an `N` byte field, failing if it does not fit
pub fn encode_text<const N: usize>(text: &str) -> Result<[u8; N], TextError> {
    if let Some(pos) = text.bytes().position(|b| b == 0) {
        return Err(TextError::InteriorNul(pos));
    }
    if text.len() > N {
        return Err(TextError::TooLong {
            len: text.len(),
            width: N,
        });
    }

    let mut field = [0u8; N];
    field[..text.len()].copy_from_slice(text.as_bytes());
    Ok(field)
}

/// Encode `text` into an `N` byte field, truncating at a char boundary
pub fn encode_text_lossy<const N: usize>(text: &str) -> [u8; N] {
    let mut end = text.len().min(N);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let text = &text[..end];
    let end = text.bytes().position(|b| b == 0).unwrap_or(text.len());

    let mut field = [0u8; N];
    field[..end].copy_from_slice(&text.as_bytes()[..end]);
    field
}

/// Decode a NUL padded field, stopping at the first NUL
pub fn decode_text(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}
