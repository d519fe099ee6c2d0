//! Source decoding and the fast codec used for cached payloads.

use std::io::{Read, Write};

use flate2::read::{DeflateDecoder, GzDecoder};
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::core::RemeshError;

/// One-time compression applied to a source object, detected from its URL suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// `.lzma`: LZMA-alone stream.
    Lzma,
    /// `.gz`: gzip member.
    Gzip,
    /// Anything else is taken as already decoded.
    Identity,
}

impl SourceEncoding {
    /// Pick the encoding from the URL suffix, ignoring any query string.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path.ends_with(".lzma") {
            Self::Lzma
        } else if path.ends_with(".gz") {
            Self::Gzip
        } else {
            Self::Identity
        }
    }

    /// Fully decode `raw`.
    ///
    /// # Errors
    ///
    /// [`RemeshError::Fetch`] when the payload is corrupt.
    pub fn decode(self, raw: Vec<u8>) -> Result<Vec<u8>, RemeshError> {
        match self {
            Self::Identity => Ok(raw),
            Self::Lzma => {
                let mut out = Vec::with_capacity(raw.len() * 4);
                lzma_rs::lzma_decompress(&mut raw.as_slice(), &mut out)
                    .map_err(|e| RemeshError::Fetch(format!("lzma decode: {e}")))?;
                Ok(out)
            }
            Self::Gzip => {
                let mut out = Vec::with_capacity(raw.len() * 4);
                GzDecoder::new(raw.as_slice())
                    .read_to_end(&mut out)
                    .map_err(|e| RemeshError::Fetch(format!("gzip decode: {e}")))?;
                Ok(out)
            }
        }
    }
}

/// Compress a decoded payload for the cache store, favouring speed over ratio.
///
/// # Errors
///
/// [`RemeshError::CacheStore`] if the encoder fails.
pub fn compress_fast(decoded: &[u8]) -> Result<Vec<u8>, RemeshError> {
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(decoded.len() / 2), Compression::fast());
    encoder
        .write_all(decoded)
        .map_err(|e| RemeshError::CacheStore(format!("compress: {e}")))?;
    encoder
        .finish()
        .map_err(|e| RemeshError::CacheStore(format!("compress: {e}")))
}

/// Reverse [`compress_fast`].
///
/// # Errors
///
/// [`RemeshError::CacheStore`] when the cached value is corrupt.
pub fn decompress_fast(compressed: &[u8]) -> Result<Vec<u8>, RemeshError> {
    let mut out = Vec::with_capacity(compressed.len() * 2);
    DeflateDecoder::new(compressed)
        .read_to_end(&mut out)
        .map_err(|e| RemeshError::CacheStore(format!("decompress: {e}")))?;
    Ok(out)
}
