//! Builds the ordered approval chain for a new leave request
use super::error::{LeaveError, ValidationError};
use super::request::ApprovalStep;
use super::session::Role;
use std::collections::HashSet;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct ReportingAuthority {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub designation: String,
}

/// The parts of a staff record the workflow reads. Maintained by an administrator.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct StaffRecord {
    #[n(0)]
    pub staff_id: String,
    #[n(1)]
    pub first_name: String,
    #[n(2)]
    pub last_name: String,
    #[n(3)]
    pub designation: String,
    #[n(4)]
    pub role: Role,
    #[n(5)]
    pub reporting_authority: Vec<ReportingAuthority>, // approval precedence, first approves first
}

impl StaffRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// One pending step per reporting authority, in the configured order.
///
/// Approver name and designation are copied into the step so that the
/// historical record does not change when the approver's profile does.
/// An approver may hold at most one step in a chain.
pub fn build_chain(applicant: &StaffRecord) -> Result<Vec<ApprovalStep>, LeaveError> {
    if applicant.reporting_authority.is_empty() {
        return Err(LeaveError::EmptyChain(applicant.staff_id.clone()));
    }

    let mut seen = HashSet::new();
    if let Some(duplicate) = applicant
        .reporting_authority
        .iter()
        .find(|authority| !seen.insert(authority.id.as_str()))
    {
        return Err(ValidationError::DuplicateApprover(duplicate.id.clone()).into());
    }

    Ok(applicant
        .reporting_authority
        .iter()
        .map(|authority| {
            ApprovalStep::pending(&authority.id, &authority.name, &authority.designation)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::LeaveStatus;

    fn record(authorities: Vec<ReportingAuthority>) -> StaffRecord {
        StaffRecord {
            staff_id: "staff_9".into(),
            first_name: "Kiran".into(),
            last_name: "Rao".into(),
            designation: "Engineer".into(),
            role: Role::Employee,
            reporting_authority: authorities,
        }
    }

    fn authority(id: &str, designation: &str) -> ReportingAuthority {
        ReportingAuthority {
            id: id.into(),
            name: format!("Name of {id}"),
            designation: designation.into(),
        }
    }

    #[test]
    fn preserves_order_and_snapshots_identity() {
        let chain = build_chain(&record(vec![
            authority("lead", "Team Lead"),
            authority("hr", "HR Manager"),
            authority("cto", "CTO"),
        ]))
        .unwrap();

        let ids: Vec<_> = chain.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["lead", "hr", "cto"]);
        assert_eq!(chain[1].designation, "HR Manager");
        assert_eq!(chain[2].name, "Name of cto");
        for step in &chain {
            assert_eq!(step.status, LeaveStatus::Pending);
            assert!(step.comment.is_empty());
            assert!(step.approved_on.is_none());
        }
    }

    #[test]
    fn empty_chain_is_refused() {
        let err = build_chain(&record(vec![])).unwrap_err();
        assert!(matches!(err, LeaveError::EmptyChain(id) if id == "staff_9"));
    }

    #[test]
    fn repeated_approver_is_refused() {
        let back_to_back = record(vec![
            authority("lead", "Team Lead"),
            authority("lead", "Team Lead"),
        ]);
        let err = build_chain(&back_to_back).unwrap_err();
        assert!(matches!(
            err,
            LeaveError::Validation(ValidationError::DuplicateApprover(id)) if id == "lead"
        ));

        let apart = record(vec![
            authority("lead", "Team Lead"),
            authority("hr", "HR Manager"),
            authority("lead", "Team Lead"),
        ]);
        assert!(matches!(
            build_chain(&apart),
            Err(LeaveError::Validation(ValidationError::DuplicateApprover(_)))
        ));
    }

    #[test]
    fn full_name_joins_parts() {
        let mut staff = record(vec![]);
        assert_eq!(staff.full_name(), "Kiran Rao");
        staff.last_name.clear();
        assert_eq!(staff.full_name(), "Kiran");
    }
}
