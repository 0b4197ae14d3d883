//! HTTP body envelope: gzip encoding and the `HashSHA256` signature.
//!
//! The signature is a base64 HMAC-SHA256 over the *uncompressed* body, keyed
//! with a secret shared out-of-band between agent and server.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{MetricsError, Result};

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "HashSHA256";

type HmacSha256 = Hmac<Sha256>;

pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut enc = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    enc.write_all(data)
        .map_err(|e| MetricsError::Internal(format!("gzip write failed: {e}")))?;
    enc.finish()
        .map_err(|e| MetricsError::Internal(format!("gzip finish failed: {e}")))
}

/// Inflate a gzip body, refusing to produce more than `limit` bytes.
pub fn decompress(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data)
        .take(limit as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| MetricsError::BadRequest(format!("invalid gzip body: {e}")))?;
    if out.len() > limit {
        return Err(MetricsError::BadRequest("decompressed body too large".into()));
    }
    Ok(out)
}

fn mac(key: &[u8]) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(key).map_err(|e| MetricsError::Internal(format!("hmac key: {e}")))
}

/// Base64 HMAC-SHA256 of `data`.
pub fn sign(key: &[u8], data: &[u8]) -> Result<String> {
    let mut m = mac(key)?;
    m.update(data);
    Ok(STANDARD.encode(m.finalize().into_bytes()))
}

/// Constant-time check of a base64 signature. Undecodable input is a mismatch.
pub fn verify(key: &[u8], data: &[u8], signature: &str) -> Result<bool> {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return Ok(false);
    };
    let mut m = mac(key)?;
    m.update(data);
    Ok(m.verify_slice(&expected).is_ok())
}
