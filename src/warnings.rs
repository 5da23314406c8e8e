use crate::error::StoreError;
use crate::store::RecordStore;
use std::time::Duration;

/// Warning count at which a suspension is issued.
pub const ESCALATION_THRESHOLD: u32 = 3;
/// Length of the automatic suspension.
pub const SUSPENSION: Duration = Duration::from_secs(2 * 24 * 60 * 60);

/// Result of recording a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarnOutcome {
    /// Running warning count after the increment.
    pub count: u32,
    /// Whether a suspension should be issued. True on every warn call at or
    /// above the threshold, not just the crossing one: re-warning an already
    /// escalated member restarts the suspension.
    pub escalate: bool,
}

/// Increments the member's warning count and persists the store.
pub async fn warn(store: &mut RecordStore<u32>, key: &str) -> Result<WarnOutcome, StoreError> {
    let count = get(store, key).saturating_add(1);
    store.insert(key, count);
    store.save().await?;

    Ok(WarnOutcome {
        count,
        escalate: count >= ESCALATION_THRESHOLD,
    })
}

/// Removes up to `amount` warnings, floored at zero, and persists the store.
/// Never lifts an active suspension.
pub async fn remove_warnings(
    store: &mut RecordStore<u32>,
    key: &str,
    amount: u32,
) -> Result<u32, StoreError> {
    let count = get(store, key).saturating_sub(amount);
    store.insert(key, count);
    store.save().await?;

    Ok(count)
}

/// Current warning count, zero if the member was never warned.
pub fn get(store: &RecordStore<u32>, key: &str) -> u32 {
    store.get(key).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static UNIQUE: AtomicUsize = AtomicUsize::new(0);

    fn temp_store() -> RecordStore<u32> {
        let path: PathBuf = std::env::temp_dir().join(format!(
            "legion-bot-warnings-{}-{}.json",
            std::process::id(),
            UNIQUE.fetch_add(1, Ordering::Relaxed)
        ));
        let _ = std::fs::remove_file(&path);
        RecordStore::load(path).unwrap()
    }

    #[tokio::test]
    async fn three_warnings_escalate() {
        let mut store = temp_store();

        let first = warn(&mut store, "100").await.unwrap();
        assert_eq!(first.count, 1);
        assert!(!first.escalate);

        let second = warn(&mut store, "100").await.unwrap();
        assert_eq!(second.count, 2);
        assert!(!second.escalate);

        let third = warn(&mut store, "100").await.unwrap();
        assert_eq!(third.count, 3);
        assert!(third.escalate);

        assert_eq!(get(&store, "100"), 3);
        let _ = std::fs::remove_file(store.path());
    }

    #[tokio::test]
    async fn escalation_retriggers_above_threshold() {
        let mut store = temp_store();

        for _ in 0..3 {
            warn(&mut store, "100").await.unwrap();
        }
        let fourth = warn(&mut store, "100").await.unwrap();
        assert_eq!(fourth.count, 4);
        assert!(fourth.escalate);

        let _ = std::fs::remove_file(store.path());
    }

    #[tokio::test]
    async fn removal_floors_at_zero() {
        let mut store = temp_store();

        warn(&mut store, "100").await.unwrap();
        warn(&mut store, "100").await.unwrap();

        assert_eq!(remove_warnings(&mut store, "100", 5).await.unwrap(), 0);
        assert_eq!(get(&store, "100"), 0);

        // Removing from a member with no record stays at zero.
        assert_eq!(remove_warnings(&mut store, "200", 1).await.unwrap(), 0);

        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn unknown_member_has_no_warnings() {
        let store = temp_store();
        assert_eq!(get(&store, "100"), 0);
    }
}
