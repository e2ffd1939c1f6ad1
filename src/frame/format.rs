//! Length prefix formatting options.
use std::io;

use bytes::BytesMut;

use super::conversion::{ERR_FRAME_TOO_LARGE, bytes_to_u64, max_for_width, u64_to_bytes};

/// Byte order used for encoding and decoding length prefixes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    Little,
}

/// Format of the length prefix preceding each frame.
///
/// The prefix value is the length of the whole frame, prefix included. A
/// two-byte prefix carrying `7` is therefore followed by five payload bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LengthFormat {
    pub bytes: usize,
    pub endianness: Endianness,
}

impl LengthFormat {
    /// Creates a new `LengthFormat` with the specified number of bytes and
    /// endianness for the length prefix.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is not in `1..=8`.
    #[must_use]
    pub const fn new(bytes: usize, endianness: Endianness) -> Self {
        assert!(matches!(bytes, 1..=8), "invalid length-prefix width");
        Self { bytes, endianness }
    }

    /// Fallible constructor validating the prefix width.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not in `1..=8`.
    pub fn try_new(bytes: usize, endianness: Endianness) -> io::Result<Self> {
        if !(1..=8).contains(&bytes) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid length-prefix width",
            ));
        }
        Ok(Self { bytes, endianness })
    }

    /// Creates a `LengthFormat` for a 2-byte little-endian length prefix.
    #[must_use]
    pub const fn u16_le() -> Self { Self::new(2, Endianness::Little) }

    /// Creates a `LengthFormat` for a 2-byte big-endian length prefix.
    #[must_use]
    pub const fn u16_be() -> Self { Self::new(2, Endianness::Big) }

    /// Creates a `LengthFormat` for a 4-byte little-endian length prefix.
    #[must_use]
    pub const fn u32_le() -> Self { Self::new(4, Endianness::Little) }

    /// Creates a `LengthFormat` for a 4-byte big-endian length prefix.
    #[must_use]
    pub const fn u32_be() -> Self { Self::new(4, Endianness::Big) }

    /// Largest total frame length (prefix included) this format can declare.
    #[must_use]
    pub fn max_frame_len(&self) -> usize {
        usize::try_from(max_for_width(self.bytes)).unwrap_or(usize::MAX)
    }

    /// Largest payload that still fits once the prefix is accounted for.
    #[must_use]
    pub fn max_payload_len(&self) -> usize { self.max_frame_len().saturating_sub(self.bytes) }

    /// Read a length prefix from `bytes` according to this format.
    ///
    /// # Errors
    /// Returns an error if `bytes` are shorter than the prefix or if the
    /// encoded length exceeds `usize`.
    pub fn read_len(&self, bytes: &[u8]) -> io::Result<usize> {
        let len = bytes_to_u64(bytes, self.bytes, self.endianness)?;
        usize::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, ERR_FRAME_TOO_LARGE))
    }

    /// Write `len` to `dst` using this format's prefix encoding.
    ///
    /// # Errors
    /// Returns an error if `len` cannot be represented by the prefix size.
    pub fn write_len(&self, len: usize, dst: &mut BytesMut) -> io::Result<()> {
        let mut buf = [0u8; 8];
        let written = u64_to_bytes(len, self.bytes, self.endianness, &mut buf)?;
        dst.extend_from_slice(&buf[..written]);
        Ok(())
    }

    /// Total frame length for a payload of `payload_len` bytes.
    ///
    /// # Errors
    /// Returns [`io::ErrorKind::InvalidInput`] when the frame would not be
    /// representable by this prefix width.
    pub fn frame_len(&self, payload_len: usize) -> io::Result<usize> {
        self.bytes
            .checked_add(payload_len)
            .filter(|total| *total <= self.max_frame_len())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, ERR_FRAME_TOO_LARGE))
    }

    /// Append a complete frame carrying `payload` to `dst`.
    ///
    /// Nothing is written when the payload is too large for the prefix.
    ///
    /// # Errors
    /// Returns [`io::ErrorKind::InvalidInput`] when the frame length cannot be
    /// represented.
    pub fn encode_frame(&self, payload: &[u8], dst: &mut BytesMut) -> io::Result<()> {
        let total = self.frame_len(payload.len())?;
        dst.reserve(total);
        self.write_len(total, dst)?;
        dst.extend_from_slice(payload);
        Ok(())
    }
}

impl Default for LengthFormat {
    fn default() -> Self { Self::u16_le() }
}
