//! Process-wide balance-update nonce
//!
//! The controller uses the nonce to discard stale or reordered updates, so
//! every emission takes a value strictly greater than any emitted before it in
//! this process. The counter is a single atomic advanced only by the encoder;
//! outside this crate it is read-only.

use std::sync::atomic::{AtomicU64, Ordering};

static NONCE: AtomicU64 = AtomicU64::new(0);

/// Claim the nonce for the next emission. The first value is 1.
pub(crate) fn next_nonce() -> u64 {
    NONCE.fetch_add(1, Ordering::SeqCst) + 1
}

/// Nonce of the most recent emission (0 before any)
pub fn current_nonce() -> u64 {
    NONCE.load(Ordering::SeqCst)
}

/// Restart the sequence
#[cfg(test)]
pub(crate) fn reset_for_tests() {
    NONCE.store(0, Ordering::SeqCst);
}

/// Serializes unit tests that emit nonces against the reset test
#[cfg(test)]
pub(crate) fn test_guard() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
