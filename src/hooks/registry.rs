//! # Hook registry - append-only name → hook mapping.
//!
//! The registry owns every [`HookEntry`] from registration until the
//! coordinator snapshots it for execution.
//!
//! ## Architecture
//! ```text
//! register(name, hook, timeout) ──► write lock ──► seq = next_seq++ ──► insert
//!
//! trigger ──► seal()  (watermark = next_seq)
//!
//! snapshot() ──► read lock ──► entries with seq < watermark ──► Vec<HookEntry>
//! ```
//!
//! ## Rules
//! - Names are unique and non-empty; timeouts are positive
//! - A rejected registration leaves the registry untouched
//! - No unregister: the registry is append-only
//! - Entries registered strictly after [`HookRegistry::seal`] are never part of a snapshot

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;

use crate::error::CoordinatorError;
use crate::hooks::HookRef;

/// Registered hook with its individual timeout.
#[derive(Clone)]
pub struct HookEntry {
    name: Arc<str>,
    hook: HookRef,
    timeout: Duration,
}

impl HookEntry {
    /// Hook name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the hook.
    pub fn hook(&self) -> &HookRef {
        &self.hook
    }

    /// Individual timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }
}

impl std::fmt::Debug for HookEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookEntry")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Entry plus its registration sequence number.
struct Slot {
    entry: HookEntry,
    seq: u64,
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    /// Entry will run when shutdown is triggered.
    Pending,
    /// Shutdown already started; entry will not run in this pass.
    AfterSeal,
}

/// Concurrency-safe, append-only registry of shutdown hooks.
pub struct HookRegistry {
    hooks: RwLock<HashMap<Arc<str>, Slot>>,
    next_seq: AtomicU64,
    sealed_at: AtomicU64,
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            sealed_at: AtomicU64::new(u64::MAX),
        }
    }

    /// Adds a hook under `name`.
    ///
    /// ### Errors
    /// - [`CoordinatorError::EmptyHookName`] if `name` is empty
    /// - [`CoordinatorError::ZeroTimeout`] if `timeout` is zero
    /// - [`CoordinatorError::DuplicateHook`] if `name` is taken
    pub async fn register(
        &self,
        name: &str,
        hook: HookRef,
        timeout: Duration,
    ) -> Result<Registered, CoordinatorError> {
        if name.is_empty() {
            return Err(CoordinatorError::EmptyHookName);
        }
        if timeout.is_zero() {
            return Err(CoordinatorError::ZeroTimeout {
                name: name.to_string(),
            });
        }

        let mut hooks = self.hooks.write().await;
        if hooks.contains_key(name) {
            return Err(CoordinatorError::DuplicateHook {
                name: name.to_string(),
            });
        }

        let seq = self.next_seq.fetch_add(1, Ordering::AcqRel);
        let name: Arc<str> = Arc::from(name);
        hooks.insert(
            Arc::clone(&name),
            Slot {
                entry: HookEntry {
                    name,
                    hook,
                    timeout,
                },
                seq,
            },
        );

        if seq >= self.sealed_at.load(Ordering::Acquire) {
            Ok(Registered::AfterSeal)
        } else {
            Ok(Registered::Pending)
        }
    }

    /// Freezes the set of entries that [`snapshot`](Self::snapshot) returns.
    ///
    /// Idempotent: only the first call sets the watermark.
    pub fn seal(&self) {
        let watermark = self.next_seq.load(Ordering::Acquire);
        let _ = self.sealed_at.compare_exchange(
            u64::MAX,
            watermark,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// True once [`seal`](Self::seal) was called.
    pub fn is_sealed(&self) -> bool {
        self.sealed_at.load(Ordering::Acquire) != u64::MAX
    }

    /// Returns an immutable copy of the entries registered before the seal, sorted by name.
    pub async fn snapshot(&self) -> Vec<HookEntry> {
        let watermark = self.sealed_at.load(Ordering::Acquire);
        let hooks = self.hooks.read().await;
        let mut entries: Vec<HookEntry> = hooks
            .values()
            .filter(|slot| slot.seq < watermark)
            .map(|slot| slot.entry.clone())
            .collect();
        entries.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Returns sorted list of registered names.
    pub async fn names(&self) -> Vec<String> {
        let hooks = self.hooks.read().await;
        let mut names: Vec<String> = hooks.keys().map(|n| n.to_string()).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered hooks.
    pub async fn len(&self) -> usize {
        self.hooks.read().await.len()
    }

    /// True if nothing is registered.
    pub async fn is_empty(&self) -> bool {
        self.hooks.read().await.is_empty()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookError;
    use crate::hooks::{Deadline, HookFn};

    fn noop() -> HookRef {
        HookFn::arc(|_d: Deadline| async { Ok::<(), HookError>(()) })
    }

    #[tokio::test]
    async fn test_register_unique_names() {
        let reg = HookRegistry::new();
        for name in ["http", "db", "cache"] {
            let res = reg.register(name, noop(), Duration::from_secs(1)).await;
            assert_eq!(res.unwrap(), Registered::Pending);
        }
        assert_eq!(reg.len().await, 3);
        assert_eq!(reg.names().await, vec!["cache", "db", "http"]);
    }

    #[tokio::test]
    async fn test_duplicate_leaves_first_untouched() {
        let reg = HookRegistry::new();
        reg.register("db", noop(), Duration::from_secs(1))
            .await
            .unwrap();

        let err = reg
            .register("db", noop(), Duration::from_secs(9))
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::DuplicateHook { ref name } if name == "db"));

        let snapshot = reg.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].timeout(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_rejects_empty_name_and_zero_timeout() {
        let reg = HookRegistry::new();
        assert!(matches!(
            reg.register("", noop(), Duration::from_secs(1)).await,
            Err(CoordinatorError::EmptyHookName)
        ));
        assert!(matches!(
            reg.register("db", noop(), Duration::ZERO).await,
            Err(CoordinatorError::ZeroTimeout { .. })
        ));
        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn test_snapshot_excludes_entries_after_seal() {
        let reg = HookRegistry::new();
        reg.register("early", noop(), Duration::from_secs(1))
            .await
            .unwrap();

        assert!(!reg.is_sealed());
        reg.seal();
        assert!(reg.is_sealed());

        let late = reg
            .register("late", noop(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(late, Registered::AfterSeal);

        let names: Vec<String> = reg
            .snapshot()
            .await
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["early"]);
        assert_eq!(reg.len().await, 2);
    }

    #[tokio::test]
    async fn test_seal_is_idempotent() {
        let reg = HookRegistry::new();
        reg.seal();
        reg.register("late", noop(), Duration::from_secs(1))
            .await
            .unwrap();
        reg.seal();
        assert!(reg.snapshot().await.is_empty());
    }
}
