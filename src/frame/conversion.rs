//! Conversion helpers for length prefix encoding.
//!
//! Prefixes are additive: byte `i` of a little-endian prefix contributes
//! `byte << (8 * i)`, and big-endian prefixes mirror that order. Any width in
//! `1..=8` is accepted, so three-byte prefixes are as valid as two-byte ones.
use std::io;

use super::format::Endianness;

pub(crate) const ERR_UNSUPPORTED_PREFIX: &str = "unsupported length prefix size";
pub(crate) const ERR_FRAME_TOO_LARGE: &str = "frame too large";
pub(crate) const ERR_INCOMPLETE_PREFIX: &str = "incomplete length prefix";

/// Largest value representable by a prefix of `size` bytes.
///
/// `size` must already be validated to lie in `1..=8`.
pub(crate) fn max_for_width(size: usize) -> u64 {
    if size >= 8 {
        u64::MAX
    } else {
        (1u64 << (8 * size)) - 1
    }
}

fn check_size(size: usize) -> io::Result<()> {
    if (1..=8).contains(&size) {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            ERR_UNSUPPORTED_PREFIX,
        ))
    }
}

/// Converts a byte slice into a `u64` according to `size` and `endianness`.
///
/// `bytes` must contain at least `size` bytes; trailing bytes are ignored.
///
/// # Errors
/// Returns [`io::ErrorKind::InvalidInput`] if `size` is outside `1..=8` or
/// [`io::ErrorKind::UnexpectedEof`] if `bytes` is too short.
pub fn bytes_to_u64(bytes: &[u8], size: usize, endianness: Endianness) -> io::Result<u64> {
    check_size(size)?;
    if bytes.len() < size {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            ERR_INCOMPLETE_PREFIX,
        ));
    }

    let prefix = &bytes[..size];
    let val = match endianness {
        Endianness::Little => prefix
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (8 * i))),
        Endianness::Big => prefix
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
    };
    Ok(val)
}

/// Encodes `len` into `out` according to `size` and `endianness`.
///
/// Bytes of `out` beyond `size` are zeroed. Returns the number of bytes
/// written, which always equals `size`.
///
/// # Errors
/// Returns [`io::ErrorKind::InvalidInput`] if the size is unsupported or if
/// `len` does not fit into the prefix. Values are never truncated.
#[must_use = "length prefix byte count must be used"]
pub fn u64_to_bytes(
    len: usize,
    size: usize,
    endianness: Endianness,
    out: &mut [u8; 8],
) -> io::Result<usize> {
    check_size(size)?;
    let value = u64::try_from(len)
        .ok()
        .filter(|v| *v <= max_for_width(size))
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, ERR_FRAME_TOO_LARGE))?;

    let le = value.to_le_bytes();
    match endianness {
        Endianness::Little => out[..size].copy_from_slice(&le[..size]),
        Endianness::Big => {
            for (dst, src) in out[..size].iter_mut().zip(le[..size].iter().rev()) {
                *dst = *src;
            }
        }
    }
    out[size..].fill(0);

    Ok(size)
}
