//! Payload transforms applied on the wire.
//!
//! Sessions encrypt outbound buffers with an [`EncryptFn`] and frame readers
//! decrypt inbound bytes in place with a [`DecryptFn`]. Both can be replaced
//! while a connection is live, which is how a post-handshake cipher upgrade
//! or key rotation is performed.

use std::{fmt, sync::Arc};

use parking_lot::RwLock;

/// Transform writing the encrypted form of `src` into `dst`.
///
/// `dst` is exactly as long as `src`.
pub type EncryptFn = Arc<dyn Fn(&mut [u8], &[u8]) + Send + Sync>;

/// Transform decrypting a byte range in place.
pub type DecryptFn = Arc<dyn Fn(&mut [u8]) + Send + Sync>;

/// Wrap a closure as an [`EncryptFn`].
///
/// ```
/// use wiresession::hooks::encrypt_fn;
///
/// let xor = encrypt_fn(|dst, src| {
///     for (d, s) in dst.iter_mut().zip(src) {
///         *d = s ^ 0x5a;
///     }
/// });
/// let mut out = [0u8; 2];
/// xor(&mut out, &[0x5a, 0x00]);
/// assert_eq!(out, [0x00, 0x5a]);
/// ```
pub fn encrypt_fn<F>(f: F) -> EncryptFn
where
    F: Fn(&mut [u8], &[u8]) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a [`DecryptFn`].
pub fn decrypt_fn<F>(f: F) -> DecryptFn
where
    F: Fn(&mut [u8]) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Shared, swappable decrypt hook.
///
/// Readers take the read lock once per frame and hold a clone of the current
/// transform for the whole frame, so a swap takes effect on the next frame
/// boundary. Only [`DecryptSlot::set`] takes the write lock.
#[derive(Clone, Default)]
pub struct DecryptSlot(Arc<RwLock<Option<DecryptFn>>>);

impl DecryptSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Install or clear the decrypt transform.
    pub fn set(&self, decrypt: Option<DecryptFn>) { *self.0.write() = decrypt; }

    /// Snapshot the transform currently installed.
    #[must_use]
    pub fn current(&self) -> Option<DecryptFn> { self.0.read().clone() }

    /// Returns `true` if a transform is installed.
    #[must_use]
    pub fn is_set(&self) -> bool { self.0.read().is_some() }
}

impl fmt::Debug for DecryptSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptSlot")
            .field("installed", &self.is_set())
            .finish()
    }
}
