//! Error types for the leave workflow
use std::convert::Infallible;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("End date cannot be before start date")]
    EndBeforeStart,
    #[error("Date range contains no working days")]
    NoWorkingDays,
    #[error("Emergency contact number must be exactly 10 digits")]
    InvalidContactNumber,
    #[error("Delegation entry {0} is missing a project, deadline or delegate")]
    IncompleteDelegation(usize),
    #[error("Unknown leave type: {0}")]
    UnknownLeaveType(String),
    #[error("Unknown role: {0}")]
    UnknownRole(String),
    #[error("Approver {0} appears more than once in the reporting authority")]
    DuplicateApprover(String),
}

#[derive(thiserror::Error, Debug)]
pub enum LeaveError {
    #[error("Leave request {0} not found")]
    NotFound(String),
    #[error("Staff record {0} not found")]
    StaffNotFound(String),
    #[error("Staff member {0} has no reporting authority configured")]
    EmptyChain(String),
    #[error("Leave request has no pending approval step")]
    AlreadyFinalized,
    #[error("Approver {actual} is not the current approver. Expected: {expected}")]
    NotCurrentApprover { expected: String, actual: String },
    #[error("A comment is required when disapproving a leave request")]
    CommentRequired,
    #[error("Leave request {0} was modified concurrently")]
    ConcurrentModification(String),
    #[error("Leave request {0} is finalized and can no longer be changed")]
    RequestFinalized(String),
    #[error("User {0} may not modify this leave request")]
    Forbidden(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Document store unavailable: {0}")]
    StoreUnavailable(#[from] sled::Error),
    #[error("Failed to encode document: {0}")]
    Encode(#[from] minicbor::encode::Error<Infallible>),
    #[error("Failed to decode stored document: {0}")]
    Decode(#[from] minicbor::decode::Error),
    #[error("Failed to allocate an identifier: {0}")]
    IdAllocation(String),
}

impl LeaveError {
    /// True when repeating the whole call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LeaveError::StoreUnavailable(_) | LeaveError::ConcurrentModification(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(LeaveError::ConcurrentModification("leave_1".into()).is_retryable());
        assert!(!LeaveError::AlreadyFinalized.is_retryable());
        assert!(!LeaveError::CommentRequired.is_retryable());
        assert!(!LeaveError::NotFound("leave_1".into()).is_retryable());
        assert!(!LeaveError::EmptyChain("staff_1".into()).is_retryable());
    }

    #[test]
    fn validation_errors_convert() {
        let err: LeaveError = ValidationError::EndBeforeStart.into();
        assert!(matches!(
            err,
            LeaveError::Validation(ValidationError::EndBeforeStart)
        ));
        assert_eq!(err.to_string(), "End date cannot be before start date");
    }
}
