//! Closure-scoped backend transactions

use tracing::{debug, warn};
use trellis_core::{InventoryBackend, Result};

/// Run `f` inside one backend transaction
///
/// Commits when `f` succeeds. When `f` fails the transaction is rolled back
/// and the error of `f` is returned; a failing rollback is logged, never
/// reported in place of the original error. The engine never retries.
pub fn in_transaction<B, T, F>(backend: &B, writable: bool, f: F) -> Result<T>
where
    B: InventoryBackend,
    F: FnOnce() -> Result<T>,
{
    let txn = backend.start_transaction(writable)?;
    debug!(target: "trellis::txn", writable, "begin");
    match f() {
        Ok(value) => {
            backend.commit(txn)?;
            debug!(target: "trellis::txn", "commit");
            Ok(value)
        }
        Err(e) => {
            warn!(target: "trellis::txn", error = %e, "rolling back");
            if let Err(rollback) = backend.rollback(txn) {
                warn!(target: "trellis::txn", error = %rollback, "rollback failed");
            }
            Err(e)
        }
    }
}
