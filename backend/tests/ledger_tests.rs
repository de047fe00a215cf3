//! Stock ledger tests
//!
//! Entries, exits and the guarantee that an item's quantity is always the
//! sum of its entries minus its exits, net of stock out on projects.

mod common;

use common::Harness;
use shared::{MovementInput, MovementKind};
use stockroom_backend::error::AppError;

fn movement(quantity: i64) -> MovementInput {
    MovementInput {
        quantity,
        ..Default::default()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn entry_adds_stock_and_records_movement() {
        let h = Harness::new().await;
        let item = h.item("DL-001", 10, 5).await;

        let updated = h
            .ledger
            .record_entry(
                item.id,
                MovementInput {
                    quantity: 4,
                    note: Some("Compra".into()),
                    project_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.quantity, 14);
        let history = h.ledger.history(item.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, MovementKind::Entry);
        assert_eq!(history[0].quantity, 4);
        assert_eq!(history[0].note.as_deref(), Some("Compra"));
    }

    #[tokio::test]
    async fn exit_takes_stock() {
        let h = Harness::new().await;
        let item = h.item("HP-002", 8, 3).await;

        let updated = h.ledger.record_exit(item.id, movement(8)).await.unwrap();

        assert_eq!(updated.quantity, 0);
        assert_eq!(h.ledger_balance(item.id).await, 0);
    }

    #[tokio::test]
    async fn exit_beyond_stock_changes_nothing() {
        let h = Harness::new().await;
        let item = h.item("LG-003", 3, 1).await;

        let err = h.ledger.record_exit(item.id, movement(4)).await.unwrap_err();

        match err {
            AppError::InsufficientStock {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 4);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(h.quantity(item.id).await, 3);
        assert_eq!(h.ledger.history(item.id).await.unwrap().len(), 1);
        assert_eq!(h.notifier.count(), 0);
    }

    #[tokio::test]
    async fn non_positive_quantities_are_rejected() {
        let h = Harness::new().await;
        let item = h.item("LN-004", 15, 5).await;

        for quantity in [0, -2] {
            assert!(matches!(
                h.ledger.record_entry(item.id, movement(quantity)).await,
                Err(AppError::InvalidQuantity(_))
            ));
            assert!(matches!(
                h.ledger.record_exit(item.id, movement(quantity)).await,
                Err(AppError::InvalidQuantity(_))
            ));
        }
        assert_eq!(h.quantity(item.id).await, 15);
    }

    #[tokio::test]
    async fn entry_that_would_overflow_is_rejected() {
        let h = Harness::new().await;
        let item = h.item("OV-001", 10, 0).await;

        let err = h.ledger.record_entry(item.id, movement(i64::MAX)).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidQuantity(_)), "unexpected error: {:?}", err);
        assert_eq!(h.quantity(item.id).await, 10);
        assert_eq!(h.ledger.history(item.id).await.unwrap().len(), 1);

        let topped = h.ledger.record_entry(item.id, movement(i64::MAX - 10)).await.unwrap();
        assert_eq!(topped.quantity, i64::MAX);
        assert!(matches!(
            h.ledger.record_entry(item.id, movement(1)).await,
            Err(AppError::InvalidQuantity(_))
        ));
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let h = Harness::new().await;

        assert!(matches!(
            h.ledger.record_entry(999, movement(1)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            h.ledger.record_exit(999, movement(1)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(h.ledger.history(999).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn unknown_project_reference_is_rejected() {
        let h = Harness::new().await;
        let item = h.item("SM-005", 5, 1).await;

        let result = h
            .ledger
            .record_exit(
                item.id,
                MovementInput {
                    quantity: 1,
                    note: None,
                    project_id: Some(4242),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(h.quantity(item.id).await, 5);
    }

    #[tokio::test]
    async fn history_is_newest_first_with_project_names() {
        let h = Harness::new().await;
        let item = h.item("CS-007", 20, 2).await;
        let project = h.project("obra norte").await;

        h.ledger.record_exit(item.id, movement(2)).await.unwrap();
        h.ledger
            .record_exit(
                item.id,
                MovementInput {
                    quantity: 3,
                    note: None,
                    project_id: Some(project.id),
                },
            )
            .await
            .unwrap();

        let history = h.ledger.history(item.id).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].quantity, 3);
        assert_eq!(history[0].project_name.as_deref(), Some("OBRA NORTE"));
        assert_eq!(history[1].quantity, 2);
        assert_eq!(history[1].project_name, None);
        assert_eq!(history[2].note.as_deref(), Some("Stock inicial"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_exits_never_overdraw() {
        let h = Harness::new().await;
        let item_id = h.item("AP-006", 10, 0).await.id;

        let mut tasks = Vec::new();
        for _ in 0..15 {
            let ledger = h.ledger.clone();
            tasks.push(tokio::spawn(async move {
                ledger.record_exit(item_id, movement(1)).await
            }));
        }

        let mut succeeded = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(AppError::InsufficientStock { .. }) => {}
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(succeeded, 10);
        assert_eq!(h.quantity(item_id).await, 0);
        assert_eq!(h.ledger_balance(item_id).await, 0);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use shared::AssignInput;

    #[derive(Debug, Clone)]
    enum Op {
        Entry(i64),
        Exit(i64),
        Assign(i64),
        Return(i64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1i64..50).prop_map(Op::Entry),
            (1i64..50).prop_map(Op::Exit),
            (1i64..30).prop_map(Op::Assign),
            (1i64..30).prop_map(Op::Return),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Quantity always equals the opening stock plus entries, minus
        /// exits, minus what is still out on the project; never negative
        #[test]
        fn prop_quantity_matches_ledger(
            initial in 0i64..40,
            ops in prop::collection::vec(op_strategy(), 1..25)
        ) {
            let (expected, quantity, balance, allocated) = tokio_test::block_on(async {
                let h = Harness::new().await;
                let item = h.item("PROP-1", initial, 0).await;
                let project = h.project("PROP SITE").await;
                let mut entries = 0;
                let mut exits = 0;

                for op in &ops {
                    let on_hand = h.quantity(item.id).await;
                    match op {
                        Op::Entry(q) => {
                            h.ledger.record_entry(item.id, movement(*q)).await.unwrap();
                            entries += q;
                        }
                        Op::Exit(q) => match h.ledger.record_exit(item.id, movement(*q)).await {
                            Ok(_) => exits += q,
                            Err(AppError::InsufficientStock { .. }) => assert!(*q > on_hand),
                            Err(other) => panic!("unexpected error: {:?}", other),
                        },
                        Op::Assign(q) => {
                            let input = AssignInput {
                                item_id: item.id,
                                quantity: *q,
                                note: None,
                            };
                            match h.allocations.assign(project.id, input).await {
                                Ok(_) => {}
                                Err(AppError::InsufficientStock { .. }) => assert!(*q > on_hand),
                                Err(other) => panic!("unexpected error: {:?}", other),
                            }
                        }
                        Op::Return(q) => {
                            let open = h.allocations.list_for_project(project.id).await.unwrap();
                            let Some(allocation) = open.first() else {
                                continue;
                            };
                            match h.allocations.return_partial(allocation.id, *q).await {
                                Ok(_) => {}
                                Err(AppError::InvalidQuantity(_)) => {
                                    assert!(*q > allocation.quantity_assigned)
                                }
                                Err(other) => panic!("unexpected error: {:?}", other),
                            }
                        }
                    }
                }

                let allocated = h.allocated(item.id).await;
                (
                    initial + entries - exits - allocated,
                    h.quantity(item.id).await,
                    h.ledger_balance(item.id).await,
                    allocated,
                )
            });

            prop_assert!(quantity >= 0);
            prop_assert!(allocated >= 0);
            prop_assert_eq!(quantity, expected);
            prop_assert_eq!(quantity, balance);
        }
    }
}
