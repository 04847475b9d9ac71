//! Submission state machine.

use serde::{Deserialize, Serialize};

use super::errors::FormError;

/// SubmissionState は 1 回の送信の状態
///
/// State transitions:
/// - Validating -> Applying -> Committed
/// - Validating -> Rejected
/// - Applying -> Failed
///
/// Rejected と Failed では、どの書き込みも外から観測できない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Validating,
    Applying,
    Committed,
    Rejected,
    Failed,
}

impl SubmissionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SubmissionState::Committed | SubmissionState::Rejected | SubmissionState::Failed
        )
    }

    pub fn can_transition_to(self, next: SubmissionState) -> bool {
        matches!(
            (self, next),
            (SubmissionState::Validating, SubmissionState::Applying)
                | (SubmissionState::Validating, SubmissionState::Rejected)
                | (SubmissionState::Applying, SubmissionState::Committed)
                | (SubmissionState::Applying, SubmissionState::Failed)
        )
    }

    pub fn transition(self, next: SubmissionState) -> Result<SubmissionState, FormError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(FormError::InvalidState(format!(
                "illegal submission transition {self:?} -> {next:?}"
            )))
        }
    }
}
