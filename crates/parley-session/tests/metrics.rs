use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use parley_session::{NewMessage, SequentialIdGenerator, SessionStore, SteppingClock};

/// (name, labels, value) for every counter the recorder has seen
type Counters = Vec<(String, Vec<(String, String)>, u64)>;

fn collect_counters(recorder: &DebuggingRecorder) -> Counters {
    recorder
        .snapshotter()
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(key, _, _, value)| match value {
            DebugValue::Counter(n) => {
                let labels = key
                    .key()
                    .labels()
                    .map(|l| (l.key().to_string(), l.value().to_string()))
                    .collect();
                Some((key.key().name().to_string(), labels, n))
            }
            _ => None,
        })
        .collect()
}

fn counter(counters: &Counters, name: &str, labels: &[(&str, &str)]) -> u64 {
    counters
        .iter()
        .filter(|(n, l, _)| {
            n == name
                && l.len() == labels.len()
                && labels
                    .iter()
                    .all(|(k, v)| l.iter().any(|(lk, lv)| lk == k && lv == v))
        })
        .map(|(_, _, value)| *value)
        .sum()
}

fn test_store() -> SessionStore {
    SessionStore::new().with_collaborators(
        Arc::new(SequentialIdGenerator::new("s")),
        Arc::new(SteppingClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            Duration::seconds(1),
        )),
    )
}

#[test]
fn test_lifecycle_counters() {
    let recorder = DebuggingRecorder::new();

    metrics::with_local_recorder(&recorder, || {
        let store = test_store();
        let id = store.create_draft();
        store.add_message(&id, NewMessage::user("hi"));
        store.add_message(&id, NewMessage::assistant("hello"));
        store.create_draft();
        store.delete_session(&id);
    });

    let counters = collect_counters(&recorder);
    assert_eq!(counter(&counters, "parley_drafts_created_total", &[]), 2);
    assert_eq!(counter(&counters, "parley_sessions_promoted_total", &[]), 1);
    assert_eq!(counter(&counters, "parley_messages_added_total", &[]), 2);
    assert_eq!(counter(&counters, "parley_sessions_deleted_total", &[]), 1);
    assert_eq!(
        counter(&counters, "parley_operations_ignored_total", &[("operation", "delete_session")]),
        0
    );
}

#[test]
fn test_ignored_operations_are_counted_per_operation() {
    let recorder = DebuggingRecorder::new();

    metrics::with_local_recorder(&recorder, || {
        let store = test_store();
        store.rename_session("missing", "ignored");
        store.rename_session("missing", "ignored again");
        store.add_message("missing", NewMessage::user("lost"));
        store.update_session_settings(|old| old.clone().with_system_prompt("nobody selected"));
        store.delete_session("missing");

        assert!(store.sessions().is_empty());
        assert!(store.draft().is_none());
    });

    let counters = collect_counters(&recorder);
    let ignored = |operation: &str| {
        counter(
            &counters,
            "parley_operations_ignored_total",
            &[("operation", operation)],
        )
    };

    assert_eq!(ignored("rename_session"), 2);
    assert_eq!(ignored("add_message"), 1);
    assert_eq!(ignored("update_session_settings"), 1);
    assert_eq!(ignored("delete_session"), 1);
    assert_eq!(counter(&counters, "parley_sessions_deleted_total", &[]), 0);
    assert_eq!(counter(&counters, "parley_messages_added_total", &[]), 0);
}
