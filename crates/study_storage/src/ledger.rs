#![forbid(unsafe_code)]

use study_kernel_contracts::participant::ParticipantId;
use study_kernel_contracts::trial::{CompletionMarker, TrialRecord, UploadPayload};
use study_kernel_contracts::{ContractViolation, Validate};

use crate::StorageError;

/// Append-only list of one participant's trial records, handed off once at session end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLedger {
    participant_id: ParticipantId,
    records: Vec<TrialRecord>,
    drained: bool,
}

impl RecordLedger {
    pub fn new(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            records: Vec::new(),
            drained: false,
        }
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_drained(&self) -> bool {
        self.drained
    }

    pub fn append(&mut self, record: TrialRecord) -> Result<(), StorageError> {
        if self.drained {
            return Err(self.already_drained());
        }
        record.validate()?;
        if record.participant_id != self.participant_id {
            return Err(ContractViolation::InvalidValue {
                field: "trial_record.participant_id",
                reason: "must match the ledger's participant",
            }
            .into());
        }
        self.records.push(record);
        Ok(())
    }

    /// Flattens the session into its upload payload. Succeeds exactly once.
    pub fn drain(&mut self) -> Result<UploadPayload, StorageError> {
        if self.drained {
            return Err(self.already_drained());
        }
        self.drained = true;
        let records = std::mem::take(&mut self.records);
        if records.is_empty() {
            return Ok(UploadPayload::Completion(CompletionMarker::v1(
                self.participant_id.clone(),
            )));
        }
        Ok(UploadPayload::Records {
            participant_id: self.participant_id.clone(),
            records,
        })
    }

    fn already_drained(&self) -> StorageError {
        StorageError::AlreadyDrained {
            participant_id: self.participant_id.to_string(),
        }
    }
}
