//! Text encoding for key and ciphertext material
//!
//! Everything that leaves this crate (public keys, wrapped keys, ciphertexts,
//! nonces) is carried as standard padded base64 so it can sit in an ordinary
//! text column or travel over a text channel unchanged.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Errors that can occur while decoding text into bytes
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid length, expected {expected} bytes, got {got}")]
    Length { expected: usize, got: usize },
    #[error("input too short, need at least {min} bytes, got {got}")]
    TooShort { min: usize, got: usize },
}

/// Encode raw bytes as standard base64 text
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64 text into raw bytes
pub fn decode(text: &str) -> Result<Vec<u8>, EncodingError> {
    Ok(STANDARD.decode(text.trim())?)
}

/// Decode text into a fixed-size array, rejecting any other length
pub fn decode_array<const N: usize>(text: &str) -> Result<[u8; N], EncodingError> {
    let bytes = decode(text)?;
    if bytes.len() != N {
        return Err(EncodingError::Length {
            expected: N,
            got: bytes.len(),
        });
    }
    let mut buff = [0u8; N];
    buff.copy_from_slice(&bytes);
    Ok(buff)
}
