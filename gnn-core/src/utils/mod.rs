use std::sync::atomic::{AtomicU64, Ordering};

pub mod testing;

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity for graphs and parameter sets, so handles minted by
/// one container are rejected by another.
pub(crate) fn fresh_identity() -> u64 {
    NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)
}
