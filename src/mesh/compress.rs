//! Compressed mesh I/O records (spec.md §6).
//!
//! A compressed buffer record is `{u32 in_size, u32 out_size}` followed by
//! `out_size` bytes of LZ4-compressed payload; `in_size` is the decompressed
//! length in bytes of the original typed array. This module is the hot path
//! for persisting large vertex/index buffers into the scene database; the
//! Mitsuba zlib/deflate serialized-mesh reader (a distinct, out-of-scope
//! asset format) can reuse the same record shape for its own payloads.

use crate::errors::{IgnisError, Result};

/// Header of a compressed-buffer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressedHeader {
    pub in_size: u32,
    pub out_size: u32,
}

/// Compresses `data` and returns the full record: header bytes followed by
/// the compressed payload.
#[must_use]
pub fn compress(data: &[u8]) -> Vec<u8> {
    let compressed = lz4_flex::compress(data);
    let header = CompressedHeader {
        in_size: data.len() as u32,
        out_size: compressed.len() as u32,
    };

    let mut record = Vec::with_capacity(8 + compressed.len());
    record.extend_from_slice(&header.in_size.to_le_bytes());
    record.extend_from_slice(&header.out_size.to_le_bytes());
    record.extend_from_slice(&compressed);
    record
}

/// Parses and inflates a record produced by [`compress`].
///
/// # Errors
/// Returns [`IgnisError::Io`] if `record` is shorter than the 8-byte header
/// plus its declared payload, or if decompression fails.
pub fn decompress(record: &[u8]) -> Result<Vec<u8>> {
    if record.len() < 8 {
        return Err(io_err("compressed record shorter than header"));
    }
    let in_size = u32::from_le_bytes(record[0..4].try_into().unwrap());
    let out_size = u32::from_le_bytes(record[4..8].try_into().unwrap());
    let payload_end = 8usize
        .checked_add(out_size as usize)
        .ok_or_else(|| io_err("compressed record payload length overflow"))?;
    if record.len() < payload_end {
        return Err(io_err("compressed record truncated"));
    }

    let payload = &record[8..payload_end];
    lz4_flex::decompress(payload, in_size as usize)
        .map_err(|e| io_err(&format!("lz4 decompress failed: {e}")))
}

fn io_err(msg: &str) -> IgnisError {
    IgnisError::Io(std::io::Error::other(msg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_bytes() {
        let cases: &[&[u8]] = &[
            b"",
            b"a",
            b"hello world, hello world, hello world",
            &[0u8; 4096],
        ];
        for data in cases {
            let record = compress(data);
            let restored = decompress(&record).unwrap();
            assert_eq!(&restored, data);
        }
    }

    #[test]
    fn rejects_truncated_record() {
        let record = compress(b"some payload");
        assert!(decompress(&record[..4]).is_err());
        assert!(decompress(&record[..record.len() - 1]).is_err());
    }
}
