//! Leave request document and the approval state machine
//!
//! A [`LeaveRequest`] carries an ordered chain of [`ApprovalStep`]s. The chain
//! is walked strictly front to back: the active step is the first one still
//! `Pending`, and a single `Disapproved` step halts the chain for good. The
//! aggregate status and the `current_approver` pointer are never set directly;
//! they are re-derived from the steps after every mutation.
use super::chain::{StaffRecord, build_chain};
use super::error::LeaveError;
use super::leave::{LeaveDetails, TimeStamp};
use chrono::Utc;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaveStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Approved,
    #[n(2)]
    Disapproved,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "PENDING",
            LeaveStatus::Approved => "APPROVED",
            LeaveStatus::Disapproved => "DISAPPROVED",
        }
    }
}

/// The two outcomes an approver may record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Disapproved,
}

impl From<Decision> for LeaveStatus {
    fn from(value: Decision) -> Self {
        match value {
            Decision::Approved => LeaveStatus::Approved,
            Decision::Disapproved => LeaveStatus::Disapproved,
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct ApprovalStep {
    #[n(0)]
    pub id: String, // approver identity, snapshot taken when the chain was built
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub designation: String,
    #[n(3)]
    pub status: LeaveStatus,
    #[n(4)]
    pub comment: String,
    #[n(5)]
    pub approved_on: Option<TimeStamp<Utc>>, // set once the step leaves Pending
}

impl ApprovalStep {
    pub fn pending(id: &str, name: &str, designation: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            designation: designation.to_string(),
            status: LeaveStatus::Pending,
            comment: String::new(),
            approved_on: None,
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct LeaveRequest {
    #[n(0)]
    id: String, // bech32m encoded uuid7
    #[n(1)]
    staff_id: String,
    #[n(2)]
    applicant_name: String,
    #[n(3)]
    details: LeaveDetails,
    #[n(4)]
    no_of_days: u32,
    #[n(5)]
    approval_status: Vec<ApprovalStep>,
    #[n(6)]
    current_approver: String,
    #[n(7)]
    status: LeaveStatus,
    #[n(8)]
    applied_on: TimeStamp<Utc>,
    #[n(9)]
    revision: u64,
}

impl LeaveRequest {
    /// Validates the payload and builds the approval chain from the applicant's record.
    pub fn new(
        id: String,
        applicant: &StaffRecord,
        details: LeaveDetails,
        applied_on: TimeStamp<Utc>,
    ) -> Result<Self, LeaveError> {
        let no_of_days = details.validate()?;
        let approval_status = build_chain(applicant)?;

        let mut request = Self {
            id,
            staff_id: applicant.staff_id.clone(),
            applicant_name: applicant.full_name(),
            details,
            no_of_days,
            approval_status,
            current_approver: String::new(),
            status: LeaveStatus::Pending,
            applied_on,
            revision: 0,
        };
        request.reconcile();

        Ok(request)
    }

    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn staff_id(&self) -> &str {
        &self.staff_id
    }
    pub fn applicant_name(&self) -> &str {
        &self.applicant_name
    }
    pub fn details(&self) -> &LeaveDetails {
        &self.details
    }
    pub fn no_of_days(&self) -> u32 {
        self.no_of_days
    }
    pub fn steps(&self) -> &[ApprovalStep] {
        &self.approval_status
    }
    pub fn current_approver(&self) -> &str {
        &self.current_approver
    }
    pub fn status(&self) -> LeaveStatus {
        self.status
    }
    pub fn applied_on(&self) -> &TimeStamp<Utc> {
        &self.applied_on
    }
    pub fn revision(&self) -> u64 {
        self.revision
    }
    pub fn is_terminal(&self) -> bool {
        self.status != LeaveStatus::Pending
    }

    /// The step for `approver_id`, if they are anywhere in the chain.
    pub fn step_for(&self, approver_id: &str) -> Option<&ApprovalStep> {
        self.approval_status
            .iter()
            .find(|step| step.id == approver_id)
    }

    /// Index of the step currently awaiting a decision. `None` once the chain
    /// is exhausted or halted by a rejection.
    pub fn active_index(&self) -> Option<usize> {
        if self
            .approval_status
            .iter()
            .any(|step| step.status == LeaveStatus::Disapproved)
        {
            return None;
        }
        self.approval_status
            .iter()
            .position(|step| step.status == LeaveStatus::Pending)
    }

    pub fn active_step(&self) -> Option<&ApprovalStep> {
        self.active_index().map(|index| &self.approval_status[index])
    }

    /// Records `decision` on the active step. On error the document is unchanged.
    ///
    /// An approver whose own step is already decided gets `AlreadyFinalized`,
    /// so repeating a successful call never changes the document.
    pub fn apply_decision(
        &mut self,
        approver_id: &str,
        decision: Decision,
        comment: &str,
        at: TimeStamp<Utc>,
    ) -> Result<(), LeaveError> {
        let index = self.active_index().ok_or(LeaveError::AlreadyFinalized)?;

        // every step before the active one has been decided
        if self.approval_status[..index]
            .iter()
            .any(|step| step.id == approver_id)
        {
            return Err(LeaveError::AlreadyFinalized);
        }

        let expected = &self.approval_status[index].id;
        if expected != approver_id {
            return Err(LeaveError::NotCurrentApprover {
                expected: expected.clone(),
                actual: approver_id.to_string(),
            });
        }
        if decision == Decision::Disapproved && comment.trim().is_empty() {
            return Err(LeaveError::CommentRequired);
        }

        let step = &mut self.approval_status[index];
        step.status = decision.into();
        step.comment = comment.to_string();
        step.approved_on = Some(at);

        self.reconcile();
        self.revision += 1;

        Ok(())
    }

    /// Replaces the descriptive payload while the request is still pending.
    pub fn replace_details(&mut self, details: LeaveDetails) -> Result<(), LeaveError> {
        if self.is_terminal() {
            return Err(LeaveError::RequestFinalized(self.id.clone()));
        }
        self.no_of_days = details.validate()?;
        self.details = details;
        self.revision += 1;

        Ok(())
    }

    // re-derive the aggregate status and current approver from the steps
    fn reconcile(&mut self) {
        self.status = aggregate_status(&self.approval_status);

        let pointer = match self.active_step() {
            Some(step) => Some(step.id.clone()),
            None => self
                .approval_status
                .iter()
                .rev()
                .find(|step| step.status != LeaveStatus::Pending)
                .map(|step| step.id.clone()),
        };
        if let Some(id) = pointer {
            self.current_approver = id;
        }
    }
}

/// Disapproved if any step is, approved only if all are, pending otherwise.
pub fn aggregate_status(steps: &[ApprovalStep]) -> LeaveStatus {
    if steps
        .iter()
        .any(|step| step.status == LeaveStatus::Disapproved)
    {
        LeaveStatus::Disapproved
    } else if !steps.is_empty()
        && steps
            .iter()
            .all(|step| step.status == LeaveStatus::Approved)
    {
        LeaveStatus::Approved
    } else {
        LeaveStatus::Pending
    }
}
