//! Property tests for registry construction and the ledger state machine

use multisig_gate::gate::{
    ActionCall, DispatchError, GateError, OwnerRegistry, Principal, TransactionLedger, TxId,
};
use proptest::prelude::*;
use std::collections::HashSet;

const OWNERS: [&str; 4] = ["alice", "bob", "carol", "dave"];
const STRANGER: &str = "mallory";

fn p(name: &str) -> Principal {
    Principal::parse(name).unwrap()
}

/// Index into OWNERS, or OWNERS.len() for the stranger
fn who(index: usize) -> Principal {
    OWNERS.get(index).map_or_else(|| p(STRANGER), |name| p(name))
}

#[derive(Clone, Debug)]
enum Op {
    Submit { by: usize },
    Approve { by: usize, id: TxId },
    Execute { by: usize, id: TxId, fail: bool },
}

fn arb_op() -> impl Strategy<Value = Op> {
    let by = 0..=OWNERS.len();
    prop_oneof![
        by.clone().prop_map(|by| Op::Submit { by }),
        (by.clone(), 0..8u64).prop_map(|(by, id)| Op::Approve { by, id }),
        (by, 0..8u64, any::<bool>()).prop_map(|(by, id, fail)| Op::Execute { by, id, fail }),
    ]
}

fn outcome(fail: bool) -> impl FnMut(&ActionCall, &mut TransactionLedger) -> Result<(), DispatchError> {
    move |_: &ActionCall, _: &mut TransactionLedger| {
        if fail {
            Err(DispatchError::Rejected("refused".to_string()))
        } else {
            Ok(())
        }
    }
}

proptest! {
    /// Construction succeeds exactly for distinct, non-empty owners and 1 <= t <= n
    #[test]
    fn registry_construction(
        names in prop::collection::vec("[a-z]{1,6}", 0..8),
        threshold in 0usize..10,
    ) {
        let distinct: HashSet<&String> = names.iter().collect();
        let valid = !names.is_empty()
            && distinct.len() == names.len()
            && threshold >= 1
            && threshold <= names.len();

        match OwnerRegistry::from_strings(&names, threshold) {
            Ok(registry) => {
                prop_assert!(valid);
                prop_assert!(registry.threshold() >= 1);
                prop_assert!(registry.threshold() <= registry.member_count());
                let unique: HashSet<&Principal> = registry.members().iter().collect();
                prop_assert_eq!(unique.len(), registry.member_count());
            }
            Err(e) => {
                prop_assert!(!valid);
                prop_assert!(matches!(e, GateError::InvalidConfiguration(_)));
            }
        }
    }

    /// Ids are 0, 1, 2, ... in call order regardless of submitter
    #[test]
    fn ids_are_dense(submitters in prop::collection::vec(0..OWNERS.len(), 1..20)) {
        let registry = OwnerRegistry::from_strings(&OWNERS, 2).unwrap();
        let mut ledger = TransactionLedger::new(registry);

        for (expected, by) in submitters.iter().enumerate() {
            let id = ledger.submit(&who(*by), p("target"), 1, vec![]).unwrap();
            prop_assert_eq!(id, expected as TxId);
        }
    }

    /// The state machine matches a simple model under random operations
    #[test]
    fn random_operations_keep_invariants(
        threshold in 1usize..=OWNERS.len(),
        ops in prop::collection::vec(arb_op(), 1..60),
    ) {
        let registry = OwnerRegistry::from_strings(&OWNERS, threshold).unwrap();
        let mut ledger = TransactionLedger::new(registry);
        // Model: (approvers, executed) per id
        let mut model: Vec<(HashSet<usize>, bool)> = Vec::new();

        for op in ops {
            match op {
                Op::Submit { by } => {
                    let result = ledger.submit(&who(by), p("target"), 5, vec![]);
                    if by < OWNERS.len() {
                        prop_assert_eq!(result.unwrap(), model.len() as TxId);
                        model.push((HashSet::new(), false));
                    } else {
                        prop_assert!(matches!(result, Err(GateError::Unauthorized(_))));
                    }
                }
                Op::Approve { by, id } => {
                    let result = ledger.approve(&who(by), id);
                    let entry = model.get_mut(id as usize);
                    match (by < OWNERS.len(), entry) {
                        (false, _) => prop_assert!(matches!(result, Err(GateError::Unauthorized(_)))),
                        (true, None) => prop_assert!(matches!(result, Err(GateError::NotFound(_)))),
                        (true, Some((_, true))) => {
                            prop_assert!(matches!(result, Err(GateError::AlreadyExecuted(_))))
                        }
                        (true, Some((approvers, false))) => {
                            if approvers.insert(by) {
                                prop_assert!(result.is_ok());
                            } else {
                                prop_assert!(matches!(result, Err(GateError::DuplicateApproval { .. })), "expected DuplicateApproval");
                            }
                        }
                    }
                }
                Op::Execute { by, id, fail } => {
                    let result = ledger.execute(&who(by), id, &mut outcome(fail));
                    let entry = model.get_mut(id as usize);
                    match (by < OWNERS.len(), entry) {
                        (false, _) => prop_assert!(matches!(result, Err(GateError::Unauthorized(_)))),
                        (true, None) => prop_assert!(matches!(result, Err(GateError::NotFound(_)))),
                        (true, Some((_, true))) => {
                            prop_assert!(matches!(result, Err(GateError::AlreadyExecuted(_))))
                        }
                        (true, Some((approvers, executed))) => {
                            if approvers.len() < threshold {
                                prop_assert!(matches!(result, Err(GateError::QuorumNotMet { .. })), "expected QuorumNotMet");
                            } else if fail {
                                prop_assert!(matches!(result, Err(GateError::ExecutionFailed { .. })), "expected ExecutionFailed");
                            } else {
                                prop_assert!(result.is_ok());
                                *executed = true;
                            }
                        }
                    }
                }
            }

            // Ledger agrees with the model after every operation
            prop_assert_eq!(ledger.transaction_count(), model.len());
            for (id, (approvers, executed)) in model.iter().enumerate() {
                let record = ledger.record(id as TxId).unwrap();
                prop_assert_eq!(record.approval_count(), record.approvers().len());
                prop_assert_eq!(record.approval_count(), approvers.len());
                prop_assert_eq!(record.is_executed(), *executed);
                for (index, owner) in OWNERS.iter().enumerate() {
                    prop_assert_eq!(record.has_approved(&p(owner)), approvers.contains(&index));
                }
            }
        }
    }
}
