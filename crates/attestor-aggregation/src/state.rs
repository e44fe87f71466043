use attestor_crypto::BlsScheme;
use attestor_types::{
    AggregatedAttestation, AttestorError, G1Point, G2Point, NonSignerInfo, OperatorId,
    OperatorInfo, Result, Task, TaskResponseData,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationStatus {
    Open,
    QuorumReached,
    TimedOut,
    Finalized,
}

/// Per-task aggregation bookkeeping. All mutation happens inside the
/// scheduler actor; this type only enforces the per-task rules: expected
/// signers only, one signature per operator, integer stake math, and the
/// non-signer complement at finalization.
pub struct TaskAggregationState {
    task: Task,
    /// Snapshot order defines the non-signer bitmap indices.
    expected: Vec<OperatorInfo>,
    position: HashMap<OperatorId, usize>,
    received: HashMap<OperatorId, G1Point>,
    status: AggregationStatus,
    deadline: Instant,
}

impl TaskAggregationState {
    pub fn new(task: Task, expected: Vec<OperatorInfo>, now: Instant) -> Result<Self> {
        task.validate()?;

        let mut position = HashMap::with_capacity(expected.len());
        for (i, info) in expected.iter().enumerate() {
            if position.insert(info.operator_id, i).is_some() {
                return Err(AttestorError::Config(format!(
                    "task {}: operator {} listed twice in expected signers",
                    task.index, info.operator_id
                )));
            }
        }

        let deadline = now + std::time::Duration::from_millis(task.timeout_ms);
        Ok(Self {
            task,
            expected,
            position,
            received: HashMap::new(),
            status: AggregationStatus::Open,
            deadline,
        })
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn status(&self) -> AggregationStatus {
        self.status
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn signature_count(&self) -> usize {
        self.received.len()
    }

    /// Record one partial signature. Returns `true` when this signature
    /// tipped every quorum over its threshold (the Open → QuorumReached
    /// edge, which fires at most once per task).
    pub fn record_signature(&mut self, operator_id: OperatorId, point: G1Point) -> Result<bool> {
        if self.status != AggregationStatus::Open {
            return Err(AttestorError::UnknownTask(self.task.index));
        }
        if !self.position.contains_key(&operator_id) {
            return Err(AttestorError::UnknownSigner {
                task_index: self.task.index,
                operator_id,
            });
        }
        if self.received.contains_key(&operator_id) {
            return Err(AttestorError::DuplicateSigner {
                task_index: self.task.index,
                operator_id,
            });
        }

        self.received.insert(operator_id, point);
        if self.quorums_satisfied() {
            self.status = AggregationStatus::QuorumReached;
            return Ok(true);
        }
        Ok(false)
    }

    /// Every quorum the task lists must independently clear its threshold:
    /// signed stake * 100 >= total stake * pct, in integer arithmetic. A
    /// quorum with zero total stake can never be satisfied.
    pub fn quorums_satisfied(&self) -> bool {
        self.task.quorum_requirements().all(|(quorum, pct)| {
            let total: u128 = self.expected.iter().map(|o| o.stake_on(quorum)).sum();
            let signed: u128 = self
                .expected
                .iter()
                .filter(|o| self.received.contains_key(&o.operator_id))
                .map(|o| o.stake_on(quorum))
                .sum();
            total > 0 && signed * 100 >= total * u128::from(pct)
        })
    }

    pub fn mark_timed_out(&mut self) {
        self.status = AggregationStatus::TimedOut;
    }

    /// Build the attestation once quorum is reached: non-signer complement,
    /// per-quorum aggregate public keys over the signers in that quorum,
    /// the signers' G2 aggregate, and the combined signature.
    pub fn build_attestation(&mut self, scheme: &dyn BlsScheme) -> Result<AggregatedAttestation> {
        debug_assert_eq!(self.status, AggregationStatus::QuorumReached);

        let map_crypto = |e: attestor_crypto::CryptoError| AttestorError::Aggregation(e.to_string());

        let mut non_signer_info = NonSignerInfo::default();
        for (i, info) in self.expected.iter().enumerate() {
            if !self.received.contains_key(&info.operator_id) {
                non_signer_info.quorum_bitmap_indices.push(i as u32);
                non_signer_info.non_signer_pubkeys.push(info.pubkey_g1.clone());
            }
        }

        let mut quorum_apks = Vec::with_capacity(self.task.quorum_numbers.len());
        for &quorum in &self.task.quorum_numbers {
            let keys: Vec<G1Point> = self
                .expected
                .iter()
                .filter(|o| o.participates_in(quorum) && self.received.contains_key(&o.operator_id))
                .map(|o| o.pubkey_g1.clone())
                .collect();
            // A zero-threshold quorum can finalize with no signers in it.
            let apk = if keys.is_empty() {
                G1Point::zero()
            } else {
                scheme.aggregate_g1(&keys).map_err(map_crypto)?
            };
            quorum_apks.push(apk);
        }

        let signer_g2_keys: Vec<G2Point> = self
            .expected
            .iter()
            .filter(|o| self.received.contains_key(&o.operator_id))
            .map(|o| o.pubkey_g2.clone())
            .collect();
        let signers_apk_g2 = scheme.aggregate_g2(&signer_g2_keys).map_err(map_crypto)?;

        let points: Vec<G1Point> = self.received.values().cloned().collect();
        let aggregate_signature = scheme.aggregate_g1(&points).map_err(map_crypto)?;

        self.status = AggregationStatus::Finalized;
        Ok(AggregatedAttestation {
            task_index: self.task.index,
            task_response: TaskResponseData {
                task_index: self.task.index,
                approved: true,
                metadata_url: self.task.metadata_url.clone(),
            },
            non_signer_info,
            quorum_apks,
            signers_apk_g2,
            aggregate_signature,
            quorum_indices: self.task.quorum_numbers.iter().map(|&q| q as u32).collect(),
            aggregated_at: Utc::now(),
        })
    }

    /// Crypto failure during finalization: reopen so the next signature can
    /// retry the build instead of wedging the task.
    pub fn reopen(&mut self) {
        if self.status == AggregationStatus::QuorumReached {
            self.status = AggregationStatus::Open;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attestor_crypto::DevBls;

    fn task(index: u32, thresholds: Vec<(u8, u8)>, timeout_ms: u64) -> Task {
        Task {
            index,
            metadata_url: "https://example.com/task".to_string(),
            creation_block: 1,
            quorum_numbers: thresholds.iter().map(|&(q, _)| q).collect(),
            quorum_threshold_percentages: thresholds.iter().map(|&(_, p)| p).collect(),
            timeout_ms,
        }
    }

    fn operator(id: u8, stakes: &[(u8, u128)]) -> OperatorInfo {
        OperatorInfo {
            operator_id: OperatorId::from_bytes([id; 32]),
            pubkey_g1: G1Point::from_coordinates(&(id as u64 * 100).to_string(), "7").unwrap(),
            pubkey_g2: G2Point::zero(),
            stake_per_quorum: stakes.iter().copied().collect(),
        }
    }

    fn point(seed: u8) -> G1Point {
        G1Point::from_coordinates(&seed.to_string(), &seed.to_string()).unwrap()
    }

    fn id(seed: u8) -> OperatorId {
        OperatorId::from_bytes([seed; 32])
    }

    #[test]
    fn test_sixty_forty_requires_both_at_full_threshold() {
        let expected = vec![operator(1, &[(0, 60)]), operator(2, &[(0, 40)])];
        let mut state =
            TaskAggregationState::new(task(7, vec![(0, 100)], 60_000), expected, Instant::now())
                .unwrap();

        assert!(!state.record_signature(id(1), point(1)).unwrap());
        assert_eq!(state.status(), AggregationStatus::Open);

        assert!(state.record_signature(id(2), point(2)).unwrap());
        assert_eq!(state.status(), AggregationStatus::QuorumReached);
    }

    #[test]
    fn test_majority_threshold_met_by_largest_staker() {
        let expected = vec![operator(1, &[(0, 60)]), operator(2, &[(0, 40)])];
        let mut state =
            TaskAggregationState::new(task(1, vec![(0, 60)], 60_000), expected, Instant::now())
                .unwrap();

        assert!(state.record_signature(id(1), point(1)).unwrap());
    }

    #[test]
    fn test_all_quorums_must_pass_independently() {
        // Operator 1 carries quorum 0 alone; quorum 1 needs operator 2.
        let expected = vec![operator(1, &[(0, 100)]), operator(2, &[(1, 100)])];
        let mut state = TaskAggregationState::new(
            task(2, vec![(0, 50), (1, 50)], 60_000),
            expected,
            Instant::now(),
        )
        .unwrap();

        assert!(!state.record_signature(id(1), point(1)).unwrap());
        assert!(state.record_signature(id(2), point(2)).unwrap());
    }

    #[test]
    fn test_duplicate_signer_rejected_without_double_count() {
        let expected = vec![operator(1, &[(0, 50)]), operator(2, &[(0, 50)])];
        let mut state =
            TaskAggregationState::new(task(3, vec![(0, 100)], 60_000), expected, Instant::now())
                .unwrap();

        assert!(!state.record_signature(id(1), point(1)).unwrap());
        let err = state.record_signature(id(1), point(1)).unwrap_err();
        assert!(matches!(err, AttestorError::DuplicateSigner { .. }));
        // Still one signature; quorum still unmet.
        assert_eq!(state.signature_count(), 1);
        assert!(!state.quorums_satisfied());
    }

    #[test]
    fn test_unknown_signer_rejected() {
        let expected = vec![operator(1, &[(0, 100)])];
        let mut state =
            TaskAggregationState::new(task(4, vec![(0, 100)], 60_000), expected, Instant::now())
                .unwrap();

        let err = state.record_signature(id(9), point(9)).unwrap_err();
        assert!(matches!(err, AttestorError::UnknownSigner { .. }));
        assert_eq!(state.signature_count(), 0);
    }

    #[test]
    fn test_zero_stake_quorum_never_satisfied() {
        let expected = vec![operator(1, &[(0, 100)])];
        // Quorum 5 has no stake at all.
        let mut state = TaskAggregationState::new(
            task(5, vec![(0, 50), (5, 50)], 60_000),
            expected,
            Instant::now(),
        )
        .unwrap();

        assert!(!state.record_signature(id(1), point(1)).unwrap());
        assert!(!state.quorums_satisfied());
    }

    #[test]
    fn test_attestation_has_empty_non_signers_when_all_sign() {
        let scheme = DevBls;
        let expected = vec![operator(1, &[(0, 60)]), operator(2, &[(0, 40)])];
        let mut state =
            TaskAggregationState::new(task(7, vec![(0, 100)], 60_000), expected, Instant::now())
                .unwrap();

        state.record_signature(id(1), point(1)).unwrap();
        assert!(state.record_signature(id(2), point(2)).unwrap());

        let attestation = state.build_attestation(&scheme).unwrap();
        assert_eq!(attestation.task_index, 7);
        assert!(attestation.task_response.approved);
        assert!(attestation.non_signer_info.quorum_bitmap_indices.is_empty());
        assert!(attestation.non_signer_info.non_signer_pubkeys.is_empty());
        assert_eq!(attestation.quorum_apks.len(), 1);
        assert_eq!(attestation.quorum_indices, vec![0]);
        assert_eq!(state.status(), AggregationStatus::Finalized);
    }

    #[test]
    fn test_attestation_lists_non_signers_in_snapshot_order() {
        let scheme = DevBls;
        let expected = vec![
            operator(1, &[(0, 30)]),
            operator(2, &[(0, 60)]),
            operator(3, &[(0, 10)]),
        ];
        let mut state =
            TaskAggregationState::new(task(8, vec![(0, 50)], 60_000), expected, Instant::now())
                .unwrap();

        assert!(state.record_signature(id(2), point(2)).unwrap());
        let attestation = state.build_attestation(&scheme).unwrap();

        assert_eq!(attestation.non_signer_info.quorum_bitmap_indices, vec![0, 2]);
        assert_eq!(attestation.non_signer_info.non_signer_pubkeys.len(), 2);
    }

    #[test]
    fn test_signatures_after_quorum_rejected() {
        let expected = vec![operator(1, &[(0, 60)]), operator(2, &[(0, 40)])];
        let mut state =
            TaskAggregationState::new(task(9, vec![(0, 50)], 60_000), expected, Instant::now())
                .unwrap();

        assert!(state.record_signature(id(1), point(1)).unwrap());
        // Quorum reached: the state no longer accepts signatures.
        assert!(matches!(
            state.record_signature(id(2), point(2)),
            Err(AttestorError::UnknownTask(9))
        ));
    }

    #[test]
    fn test_duplicate_expected_signer_rejected_at_registration() {
        let expected = vec![operator(1, &[(0, 60)]), operator(1, &[(0, 40)])];
        assert!(
            TaskAggregationState::new(task(10, vec![(0, 100)], 60_000), expected, Instant::now())
                .is_err()
        );
    }
}
