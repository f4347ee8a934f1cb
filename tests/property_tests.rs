//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Counter conservation: total_operations == Σ user_operations
//! - Atomic rejection: a failed call changes no state and emits nothing
//! - Batch all-or-nothing: one bad element rejects the whole batch
//! - Linearizability: sequence indices are strictly increasing

use proptest::prelude::*;
use record_ledger::{Config, Error, Ledger, LedgerEvent, Principal};

const CALLERS: &[&str] = &["deployer", "alice", "bob", "carol"];

/// One caller-visible operation against the ledger
#[derive(Debug, Clone)]
enum Op {
    Create { caller: usize, payload: Vec<u8> },
    Batch { caller: usize, payloads: Vec<Vec<u8>> },
    Pause { caller: usize },
    Unpause { caller: usize },
}

fn caller_strategy() -> impl Strategy<Value = usize> {
    0..CALLERS.len()
}

/// Payloads including the empty one, to exercise rejection paths
fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..32)
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (caller_strategy(), payload_strategy())
            .prop_map(|(caller, payload)| Op::Create { caller, payload }),
        3 => (caller_strategy(), prop::collection::vec(payload_strategy(), 0..8))
            .prop_map(|(caller, payloads)| Op::Batch { caller, payloads }),
        1 => caller_strategy().prop_map(|caller| Op::Pause { caller }),
        1 => caller_strategy().prop_map(|caller| Op::Unpause { caller }),
    ]
}

/// Create test ledger with temp directory; CALLERS[0] deploys
async fn create_test_ledger(temp: &tempfile::TempDir) -> Ledger {
    let mut config = Config::default();
    config.data_dir = temp.path().to_path_buf();
    Ledger::open(config, Principal::new(CALLERS[0])).await.unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: after any operation sequence, total_operations equals both
    /// the sum of all per-caller counters and the number of RecordCreated
    /// events in the durable log, with strictly increasing sequence indices.
    #[test]
    fn prop_counter_conservation(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let temp = tempfile::tempdir().unwrap();
            let ledger = create_test_ledger(&temp).await;

            for op in ops {
                // Failures are expected and must leave no trace
                match op {
                    Op::Create { caller, payload } => {
                        let _ = ledger
                            .create_record(Principal::new(CALLERS[caller]), payload)
                            .await;
                    }
                    Op::Batch { caller, payloads } => {
                        let _ = ledger
                            .batch_create_records(Principal::new(CALLERS[caller]), payloads)
                            .await;
                    }
                    Op::Pause { caller } => {
                        let _ = ledger.pause(Principal::new(CALLERS[caller])).await;
                    }
                    Op::Unpause { caller } => {
                        let _ = ledger.unpause(Principal::new(CALLERS[caller])).await;
                    }
                }
            }

            let total = ledger.total_operations().await.unwrap();

            let mut per_caller_sum = 0u64;
            for caller in CALLERS {
                per_caller_sum += ledger
                    .user_operations(Principal::new(*caller))
                    .await
                    .unwrap();
            }
            prop_assert_eq!(total, per_caller_sum);

            let sequences: Vec<u64> = ledger
                .replay(0)
                .unwrap()
                .into_iter()
                .filter_map(|event| match event {
                    LedgerEvent::RecordCreated(record) => Some(record.sequence),
                    _ => None,
                })
                .collect();
            prop_assert_eq!(sequences.len() as u64, total);
            let expected: Vec<u64> = (1..=total).collect();
            prop_assert_eq!(sequences, expected);

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: a batch of valid payloads advances both counters by its
    /// length and yields consecutive receipts.
    #[test]
    fn prop_valid_batch_counts(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..32), 1..16),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let temp = tempfile::tempdir().unwrap();
            let ledger = create_test_ledger(&temp).await;
            let alice = Principal::new("alice");
            let len = payloads.len() as u64;

            let receipts = ledger
                .batch_create_records(alice.clone(), payloads)
                .await
                .unwrap();

            prop_assert_eq!(receipts.len() as u64, len);
            for (i, receipt) in receipts.iter().enumerate() {
                prop_assert_eq!(receipt.sequence, i as u64 + 1);
            }
            prop_assert_eq!(ledger.total_operations().await.unwrap(), len);
            prop_assert_eq!(ledger.user_operations(alice).await.unwrap(), len);

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: one empty element anywhere rejects the whole batch with
    /// InvalidInput; counters stay unchanged and nothing is logged.
    #[test]
    fn prop_batch_all_or_nothing(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..32), 1..16),
        position in any::<prop::sample::Index>(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let temp = tempfile::tempdir().unwrap();
            let ledger = create_test_ledger(&temp).await;
            let alice = Principal::new("alice");

            let mut poisoned = payloads.clone();
            poisoned.insert(position.index(poisoned.len() + 1), Vec::new());

            let result = ledger.batch_create_records(alice.clone(), poisoned).await;
            prop_assert!(matches!(result, Err(Error::InvalidInput(_))));

            prop_assert_eq!(ledger.total_operations().await.unwrap(), 0);
            prop_assert_eq!(ledger.user_operations(alice).await.unwrap(), 0);
            prop_assert!(ledger.replay(0).unwrap().is_empty());

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: replay reconstructs every accepted payload byte-for-byte.
    #[test]
    fn prop_replay_reconstructs_payloads(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..64), 1..20),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let temp = tempfile::tempdir().unwrap();
            let ledger = create_test_ledger(&temp).await;
            let alice = Principal::new("alice");

            for payload in &payloads {
                ledger
                    .create_record(alice.clone(), payload.clone())
                    .await
                    .unwrap();
            }

            let replayed: Vec<Vec<u8>> = ledger
                .replay(0)
                .unwrap()
                .into_iter()
                .filter_map(|event| match event {
                    LedgerEvent::RecordCreated(record) => Some(record.payload),
                    _ => None,
                })
                .collect();
            prop_assert_eq!(replayed, payloads);

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_deploy_scenario() {
        let temp = tempfile::tempdir().unwrap();
        let ledger = create_test_ledger(&temp).await;
        let owner = Principal::new("deployer");
        let caller_a = Principal::new("alice");
        let caller_b = Principal::new("bob");

        // Deploy: owner = deployer, zero operations
        assert_eq!(ledger.owner().await.unwrap(), owner);
        assert_eq!(ledger.total_operations().await.unwrap(), 0);

        // Caller A writes one record
        let receipt = ledger
            .create_record(caller_a.clone(), b"test data".to_vec())
            .await
            .unwrap();
        assert_eq!(receipt.sequence, 1);
        assert_eq!(ledger.total_operations().await.unwrap(), 1);
        assert_eq!(ledger.user_operations(caller_a.clone()).await.unwrap(), 1);

        // Caller A writes a batch of three
        ledger
            .batch_create_records(
                caller_a.clone(),
                vec![b"data1".to_vec(), b"data2".to_vec(), b"data3".to_vec()],
            )
            .await
            .unwrap();
        assert_eq!(ledger.total_operations().await.unwrap(), 4);
        assert_eq!(ledger.user_operations(caller_a).await.unwrap(), 4);

        // Owner pauses
        ledger.pause(owner.clone()).await.unwrap();
        assert!(ledger.paused().await.unwrap());

        // Caller B is rejected while paused, counters unchanged
        let result = ledger.create_record(caller_b.clone(), b"x".to_vec()).await;
        assert!(matches!(result, Err(Error::ContractPaused)));
        assert_eq!(ledger.total_operations().await.unwrap(), 4);

        // Caller B cannot pause
        let result = ledger.pause(caller_b).await;
        assert!(matches!(result, Err(Error::UnauthorizedAccess { .. })));

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_batch_too_large() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp.path().to_path_buf();
        config.batch.max_batch_size = 2;
        let ledger = Ledger::open(config, Principal::new("deployer")).await.unwrap();

        let result = ledger
            .batch_create_records(
                Principal::new("alice"),
                vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec()],
            )
            .await;
        assert!(matches!(result, Err(Error::BatchTooLarge { len: 3, max: 2 })));
        assert_eq!(ledger.total_operations().await.unwrap(), 0);

        // The bound itself is fine
        ledger
            .batch_create_records(Principal::new("alice"), vec![b"1".to_vec(), b"2".to_vec()])
            .await
            .unwrap();
        assert_eq!(ledger.total_operations().await.unwrap(), 2);

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_redundant_pause_toggles_fail() {
        let temp = tempfile::tempdir().unwrap();
        let ledger = create_test_ledger(&temp).await;
        let owner = Principal::new("deployer");

        assert!(matches!(
            ledger.unpause(owner.clone()).await,
            Err(Error::AlreadyActive)
        ));
        ledger.pause(owner.clone()).await.unwrap();
        assert!(matches!(
            ledger.pause(owner.clone()).await,
            Err(Error::AlreadyPaused)
        ));
        ledger.unpause(owner).await.unwrap();
        assert!(!ledger.paused().await.unwrap());

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_transfer_ownership_moves_capability() {
        let temp = tempfile::tempdir().unwrap();
        let ledger = create_test_ledger(&temp).await;
        let owner = Principal::new("deployer");
        let successor = Principal::new("successor");

        // Non-owner cannot transfer
        let result = ledger
            .transfer_ownership(Principal::new("mallory"), successor.clone())
            .await;
        assert!(matches!(result, Err(Error::UnauthorizedAccess { .. })));

        // Null target rejected
        let result = ledger
            .transfer_ownership(owner.clone(), Principal::new(""))
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        ledger
            .transfer_ownership(owner.clone(), successor.clone())
            .await
            .unwrap();
        assert_eq!(ledger.owner().await.unwrap(), successor);

        // Event was logged
        let events = ledger.replay(0).unwrap();
        assert!(matches!(
            events.last(),
            Some(LedgerEvent::OwnershipTransferred { .. })
        ));

        // Capability moved: old owner rejected, new owner can pause
        assert!(matches!(
            ledger.pause(owner).await,
            Err(Error::UnauthorizedAccess { .. })
        ));
        ledger.pause(successor).await.unwrap();

        ledger.shutdown().await.unwrap();
    }
}
