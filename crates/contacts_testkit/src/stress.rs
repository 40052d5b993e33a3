//! Stress helpers for concurrent access.
//!
//! Each worker thread plays one request handler: it shares the service
//! handle, checks out its own connection per call and relies on the
//! database for isolation.

use contacts_core::{
    Contact, ContactAttributes, Contacts, CoreError, ExternalId, HistoryId, UserId,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

/// Outcome counts of a stress run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StressTestResult {
    /// Operations that ended as the workload allows.
    pub successful_ops: usize,
    /// Operations that returned an unexpected error.
    pub failed_ops: usize,
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of worker threads.
    pub threads: usize,
    /// Operations each worker performs.
    pub ops_per_thread: usize,
    /// Workers are spread over user ids `1..=users`.
    pub users: i64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            ops_per_thread: 25,
            users: 1,
        }
    }
}

impl StressConfig {
    fn user_for(&self, worker: usize) -> UserId {
        let users = self.users.max(1) as usize;
        UserId::new((worker % users) as i64 + 1)
    }
}

/// Every worker creates contacts; returns each successful result.
///
/// Worker `w` writes as user `w % users + 1`.
pub fn concurrent_creates(
    contacts: &Arc<Contacts>,
    config: &StressConfig,
) -> (StressTestResult, Vec<Contact>) {
    let failed = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..config.threads)
        .map(|worker| {
            let contacts = Arc::clone(contacts);
            let failed = Arc::clone(&failed);
            let user = config.user_for(worker);
            let ops = config.ops_per_thread;
            thread::spawn(move || {
                let mut created = Vec::with_capacity(ops);
                for i in 0..ops {
                    let attrs = ContactAttributes::new()
                        .with_first_name(format!("w{worker}"))
                        .with_last_name(format!("n{i}"));
                    match contacts.create(user, attrs) {
                        Ok(contact) => created.push(contact),
                        Err(err) => {
                            tracing::warn!(worker, error = %err, "create failed");
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
                created
            })
        })
        .collect();

    let created: Vec<Contact> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("worker panicked"))
        .collect();

    let result = StressTestResult {
        successful_ops: created.len(),
        failed_ops: failed.load(Ordering::Relaxed),
    };
    (result, created)
}

/// Every worker mutates the same set of contacts of `user` at once.
///
/// Workers alternate update and trash calls over `targets`; losing races
/// (updating a contact another worker already trashed) is expected and
/// counted as a failure only if the error is not a terminal-state violation.
pub fn concurrent_mutations(
    contacts: &Arc<Contacts>,
    user: UserId,
    targets: &[ExternalId],
    config: &StressConfig,
) -> StressTestResult {
    let targets: Arc<Vec<ExternalId>> = Arc::new(targets.to_vec());
    let failed = Arc::new(AtomicUsize::new(0));
    let succeeded = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..config.threads)
        .map(|worker| {
            let contacts = Arc::clone(contacts);
            let targets = Arc::clone(&targets);
            let failed = Arc::clone(&failed);
            let succeeded = Arc::clone(&succeeded);
            let ops = config.ops_per_thread;
            thread::spawn(move || {
                for i in 0..ops {
                    let Some(target) = targets.get((worker + i) % targets.len().max(1)) else {
                        return;
                    };
                    let outcome = if (worker + i) % 5 == 4 {
                        contacts.trash_by_id_list(user, &[*target]).map(|_| ())
                    } else {
                        let attrs = ContactAttributes::new().with_last_name(format!("w{worker}i{i}"));
                        contacts.update(user, *target, attrs).map(|_| ())
                    };
                    match outcome {
                        Ok(()) | Err(CoreError::TerminalStateViolation { .. }) => {
                            succeeded.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(err) => {
                            tracing::warn!(worker, error = %err, "mutation failed");
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }

    StressTestResult {
        successful_ops: succeeded.load(Ordering::Relaxed),
        failed_ops: failed.load(Ordering::Relaxed),
    }
}

/// Polls deltas for `user` until `stop` is set, checking each answer.
///
/// Returns the number of polls and every cursor observed, in order. Each
/// answer must have a cursor no lower than the previous one and contain
/// no contact whose history id exceeds its own cursor.
pub fn poll_deltas(
    contacts: &Contacts,
    user: UserId,
    stop: &std::sync::atomic::AtomicBool,
) -> Result<Vec<HistoryId>, String> {
    let mut cursors = Vec::new();
    let mut last = HistoryId::ZERO;
    while !stop.load(Ordering::Acquire) {
        let delta = contacts
            .get_delta(user, HistoryId::ZERO)
            .map_err(|e| e.to_string())?;
        if delta.cursor < last {
            return Err(format!("cursor went back from {last} to {}", delta.cursor));
        }
        let newest = delta
            .inserted
            .iter()
            .chain(&delta.updated)
            .chain(&delta.trashed)
            .map(|c| c.history_id)
            .max()
            .unwrap_or(HistoryId::ZERO);
        if newest != delta.cursor {
            return Err(format!(
                "delta newest history id {newest} does not match cursor {}",
                delta.cursor
            ));
        }
        last = delta.cursor;
        cursors.push(last);
    }
    Ok(cursors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestContacts;

    #[test]
    fn small_concurrent_create_run() {
        let test = TestContacts::new();
        let config = StressConfig {
            threads: 2,
            ops_per_thread: 5,
            users: 2,
        };
        let (result, created) = concurrent_creates(&test.shared(), &config);
        assert_eq!(result.successful_ops, 10);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(created.len(), 10);
    }

    #[test]
    fn mutation_run_accounts_for_every_operation() {
        let user = UserId::new(1);
        let (test, created) = crate::fixtures::scenarios::populated(user, 2);
        let targets: Vec<_> = created.iter().map(|c| c.external_id).collect();
        let config = StressConfig {
            threads: 3,
            ops_per_thread: 4,
            users: 1,
        };
        let result = concurrent_mutations(&test.shared(), user, &targets, &config);
        assert_eq!(
            result,
            StressTestResult {
                successful_ops: 12,
                failed_ops: 0,
            }
        );
    }
}
