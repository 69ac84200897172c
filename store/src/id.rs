//! Id assignment for todo records.

use chrono::Utc;

/// Generates unique todo ids.
///
/// Ids must never repeat within a store lifetime, even under rapid
/// successive calls.
pub trait IdGenerator: Send + Sync {
    /// Produce a fresh id.
    fn generate(&self) -> String;
}

/// Production generator combining a millisecond timestamp with a random
/// 64-bit suffix.
///
/// Two calls within the same millisecond collide only if the random
/// suffixes match.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeRandomIds;

impl IdGenerator for TimeRandomIds {
    fn generate(&self) -> String {
        let millis = Utc::now().timestamp_millis();
        let suffix: u64 = rand::random();
        format!("todo_{millis}_{suffix:016x}")
    }
}

/// Deterministic generator for tests: `todo_0`, `todo_1`, ...
#[derive(Debug, Default)]
pub struct SequenceIds {
    next: std::sync::atomic::AtomicU64,
}

impl IdGenerator for SequenceIds {
    fn generate(&self) -> String {
        let n = self
            .next
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        format!("todo_{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn time_random_ids_are_unique_under_rapid_calls() {
        let ids = TimeRandomIds;
        let generated: HashSet<String> = (0..10_000).map(|_| ids.generate()).collect();
        assert_eq!(generated.len(), 10_000);
    }

    #[test]
    fn time_random_ids_have_expected_shape() {
        let id = TimeRandomIds.generate();
        let mut parts = id.splitn(3, '_');
        assert_eq!(parts.next(), Some("todo"));
        let millis = parts.next().expect("millis part");
        assert!(millis.parse::<i64>().is_ok());
        let suffix = parts.next().expect("suffix part");
        assert_eq!(suffix.len(), 16);
    }

    #[test]
    fn sequence_ids_count_up() {
        let ids = SequenceIds::default();
        assert_eq!(ids.generate(), "todo_0");
        assert_eq!(ids.generate(), "todo_1");
    }
}
