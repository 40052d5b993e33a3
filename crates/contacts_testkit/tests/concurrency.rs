//! Concurrent writers and readers against one database.

use contacts_core::{
    next_history_id, ContactState, CoreError, HistoryId, TxnOptions, UserId,
};
use contacts_testkit::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

#[test]
fn same_user_writers_get_unique_ids() {
    let test = TestContacts::new();
    let config = StressConfig {
        threads: 8,
        ops_per_thread: 20,
        users: 1,
    };
    let (result, created) = concurrent_creates(&test.shared(), &config);
    assert_eq!(result.failed_ops, 0);
    assert_eq!(created.len(), 160);

    let mut ids: Vec<u64> = created.iter().map(|c| c.history_id.as_u64()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=160).collect::<Vec<_>>());

    // Row order (commit order) and history order agree.
    let mut by_row: Vec<_> = created
        .iter()
        .map(|c| (c.internal_id, c.history_id))
        .collect();
    by_row.sort_unstable();
    assert!(by_row.windows(2).all(|w| w[0].1 < w[1].1));
}

#[test]
fn users_keep_independent_sequences() {
    let test = TestContacts::new();
    let config = StressConfig {
        threads: 6,
        ops_per_thread: 15,
        users: 3,
    };
    let (result, created) = concurrent_creates(&test.shared(), &config);
    assert_eq!(result.failed_ops, 0);

    let mut per_user: BTreeMap<i64, Vec<u64>> = BTreeMap::new();
    for contact in &created {
        per_user
            .entry(contact.user_id.as_i64())
            .or_default()
            .push(contact.history_id.as_u64());
    }
    assert_eq!(per_user.len(), 3);
    for ids in per_user.values_mut() {
        ids.sort_unstable();
        assert_eq!(*ids, (1..=30).collect::<Vec<_>>());
    }
}

#[test]
fn racing_update_and_trash_never_resurrect() {
    let (test, created) = scenarios::populated(UserId::new(1), 4);
    let user = UserId::new(1);
    let targets: Vec<_> = created.iter().map(|c| c.external_id).collect();

    let config = StressConfig {
        threads: 6,
        ops_per_thread: 20,
        users: 1,
    };
    let result = concurrent_mutations(&test.shared(), user, &targets, &config);
    assert_eq!(result.failed_ops, 0);

    // Every id issued is stamped on exactly one mutation; the latest on one contact.
    let delta = test.get_delta(user, HistoryId::ZERO).unwrap();
    let newest = delta
        .inserted
        .iter()
        .chain(&delta.updated)
        .chain(&delta.trashed)
        .map(|c| c.history_id)
        .max()
        .unwrap();
    assert_eq!(newest, delta.cursor);

    let stamps: HashSet<_> = delta
        .inserted
        .iter()
        .chain(&delta.updated)
        .chain(&delta.trashed)
        .map(|c| c.history_id)
        .collect();
    assert_eq!(stamps.len(), delta.len());

    // Anything trashed during the race stays trashed.
    for contact in &delta.trashed {
        assert_eq!(
            test.get(user, contact.external_id).unwrap().state,
            ContactState::Trashed
        );
    }
}

#[test]
fn readers_see_consistent_snapshots_during_writes() {
    let test = TestContacts::new();
    let user = UserId::new(1);
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let contacts = test.shared();
            let stop = Arc::clone(&stop);
            thread::spawn(move || poll_deltas(&contacts, user, &stop))
        })
        .collect();

    let config = StressConfig {
        threads: 4,
        ops_per_thread: 25,
        users: 1,
    };
    let (result, created) = concurrent_creates(&test.shared(), &config);
    assert_eq!(result.failed_ops, 0);

    let ids: Vec<_> = created.iter().take(30).map(|c| c.external_id).collect();
    test.trash_by_id_list(user, &ids).unwrap();
    stop.store(true, Ordering::Release);

    for reader in readers {
        let cursors = reader.join().unwrap().unwrap();
        assert!(cursors.windows(2).all(|w| w[0] <= w[1]));
    }

    let delta = test.get_delta(user, HistoryId::ZERO).unwrap();
    assert_eq!(delta.cursor, HistoryId::new(130));
    assert_eq!(delta.trashed.len(), 30);
    assert_eq!(delta.inserted.len(), 70);
}

#[test]
fn open_mutation_only_blocks_its_own_user() {
    let test = TestContacts::new();
    let contacts = test.shared();
    let (locked_tx, locked_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    // User 1's mutation draws a history id and then stays open.
    let holder = {
        let contacts = Arc::clone(&contacts);
        thread::spawn(move || {
            let user = UserId::new(1);
            contacts
                .database()
                .write(user.as_i64(), "held", &TxnOptions::new(), |tx| {
                    next_history_id(tx, user)?;
                    locked_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Ok::<_, CoreError>(())
                })
        })
    };
    locked_rx.recv().unwrap();

    let short = TxnOptions::new().with_timeout(Duration::from_millis(100));
    let other = contacts
        .store()
        .create(UserId::new(2), email("free@x.com"), &short)
        .unwrap();
    assert_eq!(other.history_id, HistoryId::new(1));

    let same = contacts
        .store()
        .create(UserId::new(1), email("queued@x.com"), &short)
        .unwrap_err();
    assert!(matches!(same, CoreError::Timeout { .. }));

    release_tx.send(()).unwrap();
    holder.join().unwrap().unwrap();
    let next = contacts.create(UserId::new(1), email("after@x.com")).unwrap();
    assert_eq!(next.history_id, HistoryId::new(2));
}
