//! Concurrent transfer tests
//!
//! These tests verify the two race conditions the transfer protocol must
//! survive: duplicate submissions of the same idempotency key, and
//! simultaneous drains of one account.
//!
//! Run with: cargo test --test concurrent_transfer_test -- --nocapture

use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::TempDir;

use coffer_core::adapters::duckdb::DuckDbRepository;
use coffer_core::ports::{NullNotifier, Repository};
use coffer_core::services::{AccountService, TransferService};
use coffer_core::Error;

const THREAD_COUNT: usize = 6;

struct Harness {
    _temp_dir: TempDir,
    repo: Arc<DuckDbRepository>,
    accounts: Arc<AccountService>,
    transfers: Arc<TransferService>,
}

fn harness() -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.duckdb");
    let repo = Arc::new(DuckDbRepository::new(&db_path).unwrap());
    repo.ensure_schema().unwrap();

    let repository: Arc<dyn Repository> = Arc::clone(&repo) as Arc<dyn Repository>;
    let accounts = Arc::new(AccountService::new(Arc::clone(&repository)));
    let transfers = Arc::new(TransferService::new(
        Arc::clone(&repository),
        Arc::clone(&accounts),
        Arc::new(NullNotifier),
        None,
    ));

    Harness {
        _temp_dir: temp_dir,
        repo,
        accounts,
        transfers,
    }
}

/// All threads submit the same idempotency key at once. Exactly one
/// commit happens; everyone observes the same transaction id, and the
/// ledger carries exactly one entry pair for it.
#[test]
fn test_same_key_race_commits_exactly_once() {
    let h = harness();
    h.accounts.ensure_system_account("USD").unwrap();
    let a = h.accounts.open_account("alice", "USD").unwrap();
    let b = h.accounts.open_account("bob", "USD").unwrap();
    h.transfers.fund_initial(a.id, 1_000, "seed").unwrap();

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let mut handles = vec![];

    for _ in 0..THREAD_COUNT {
        let barrier = Arc::clone(&barrier);
        let transfers = Arc::clone(&h.transfers);
        let (from, to) = (a.id, b.id);

        handles.push(thread::spawn(move || {
            barrier.wait();
            transfers.transfer("alice", from, to, 400, "race-key")
        }));
    }

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();

    let fresh: Vec<_> = outcomes.iter().filter(|o| !o.already_processed).collect();
    assert_eq!(fresh.len(), 1, "exactly one submission should commit");

    let winner_id = fresh[0].transaction.id;
    assert!(outcomes.iter().all(|o| o.transaction.id == winner_id));

    // Funds moved exactly once
    assert_eq!(h.repo.balance_of(a.id).unwrap(), 600);
    assert_eq!(h.repo.balance_of(b.id).unwrap(), 400);
    assert_eq!(h.repo.entries_by_transaction(winner_id).unwrap().len(), 2);

    // seed funding (2 entries) + one transfer (2 entries)
    assert_eq!(h.repo.entry_count().unwrap(), 4);
}

/// Threads with distinct keys all try to drain the same account. However
/// the race resolves, the source balance never goes negative and the
/// ledger stays conserved.
#[test]
fn test_concurrent_drain_never_overdraws() {
    let h = harness();
    h.accounts.ensure_system_account("USD").unwrap();
    let a = h.accounts.open_account("alice", "USD").unwrap();
    let b = h.accounts.open_account("bob", "USD").unwrap();
    h.transfers.fund_initial(a.id, 1_000, "seed").unwrap();

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let mut handles = vec![];

    // 6 threads x 300 = 1800 requested against a balance of 1000:
    // at most 3 can succeed.
    for thread_id in 0..THREAD_COUNT {
        let barrier = Arc::clone(&barrier);
        let transfers = Arc::clone(&h.transfers);
        let (from, to) = (a.id, b.id);

        handles.push(thread::spawn(move || {
            barrier.wait();
            transfers.transfer("alice", from, to, 300, &format!("drain-{thread_id}"))
        }));
    }

    let mut successes = 0;
    let mut rejections = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(outcome) => {
                assert!(!outcome.already_processed);
                successes += 1;
            }
            Err(Error::InsufficientFunds { balance, requested }) => {
                assert!(balance < requested);
                rejections += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes + rejections, THREAD_COUNT);
    assert_eq!(successes, 3, "1000 supports exactly three 300 transfers");

    let a_balance = h.repo.balance_of(a.id).unwrap();
    let b_balance = h.repo.balance_of(b.id).unwrap();
    assert!(a_balance >= 0, "source overdrawn: {a_balance}");
    assert_eq!(a_balance, 100);
    assert_eq!(b_balance, 900);

    // Conservation: user balances are exactly offset by the system account
    let system = h.repo.system_account().unwrap().unwrap();
    assert_eq!(a_balance + b_balance + h.repo.balance_of(system.id).unwrap(), 0);
}

/// Two repository instances on the same database file. The second
/// instance's writes respect the first's unique constraint, so the
/// idempotency guarantee holds across processes, not just threads.
#[test]
fn test_idempotency_holds_across_repository_instances() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("shared.duckdb");

    let repo1 = Arc::new(DuckDbRepository::new(&db_path).unwrap());
    repo1.ensure_schema().unwrap();

    let repository1: Arc<dyn Repository> = Arc::clone(&repo1) as Arc<dyn Repository>;
    let accounts1 = Arc::new(AccountService::new(Arc::clone(&repository1)));
    let transfers1 = TransferService::new(
        Arc::clone(&repository1),
        Arc::clone(&accounts1),
        Arc::new(NullNotifier),
        None,
    );

    accounts1.ensure_system_account("USD").unwrap();
    let a = accounts1.open_account("alice", "USD").unwrap();
    let b = accounts1.open_account("bob", "USD").unwrap();
    transfers1.fund_initial(a.id, 500, "seed").unwrap();
    let first = transfers1.transfer("alice", a.id, b.id, 200, "cross").unwrap();

    // Drop the first handle before opening a second one; DuckDB holds an
    // exclusive file lock per process-wide connection.
    drop(transfers1);
    drop(accounts1);
    drop(repository1);
    drop(repo1);

    let repo2 = Arc::new(DuckDbRepository::new(&db_path).unwrap());
    let repository2: Arc<dyn Repository> = Arc::clone(&repo2) as Arc<dyn Repository>;
    let accounts2 = Arc::new(AccountService::new(Arc::clone(&repository2)));
    let transfers2 = TransferService::new(
        Arc::clone(&repository2),
        Arc::clone(&accounts2),
        Arc::new(NullNotifier),
        None,
    );

    let replay = transfers2.transfer("alice", a.id, b.id, 200, "cross").unwrap();
    assert!(replay.already_processed);
    assert_eq!(replay.transaction.id, first.transaction.id);
    assert_eq!(repo2.balance_of(b.id).unwrap(), 200);
}
