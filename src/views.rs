//! Read only projections used by the dashboards
//!
//! Every view is a plain filter over the full set of stored requests. There is
//! no secondary index; callers pass a fresh scan of the store.
use super::leave::LeaveDate;
use super::request::{LeaveRequest, LeaveStatus};
use chrono::Datelike;
use std::cmp::Reverse;

/// Requests whose active step belongs to `approver_id`.
pub fn pending_for_approver<'a>(
    requests: &'a [LeaveRequest],
    approver_id: &str,
) -> Vec<&'a LeaveRequest> {
    requests
        .iter()
        .filter(|request| {
            request
                .active_step()
                .is_some_and(|step| step.id == approver_id && step.status == LeaveStatus::Pending)
        })
        .collect()
}

/// Requests with `approver_id` anywhere in the chain, whatever the state of their step.
pub fn history_for_approver<'a>(
    requests: &'a [LeaveRequest],
    approver_id: &str,
) -> Vec<&'a LeaveRequest> {
    requests
        .iter()
        .filter(|request| request.step_for(approver_id).is_some())
        .collect()
}

/// Requests where the step of `approver_id` is in `status`, whatever the
/// aggregate status of the request.
pub fn history_for_approver_by_step_status<'a>(
    requests: &'a [LeaveRequest],
    approver_id: &str,
    status: LeaveStatus,
) -> Vec<&'a LeaveRequest> {
    requests
        .iter()
        .filter(|request| {
            request
                .step_for(approver_id)
                .is_some_and(|step| step.status == status)
        })
        .collect()
}

pub fn all_for_staff<'a>(requests: &'a [LeaveRequest], staff_id: &str) -> Vec<&'a LeaveRequest> {
    requests
        .iter()
        .filter(|request| request.staff_id() == staff_id)
        .collect()
}

/// Narrows a view to one aggregate status, as the dashboard tabs do.
pub fn with_status<'a>(
    requests: &[&'a LeaveRequest],
    status: LeaveStatus,
) -> Vec<&'a LeaveRequest> {
    requests
        .iter()
        .copied()
        .filter(|request| request.status() == status)
        .collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecisionTally {
    pub approved: usize,
    pub disapproved: usize,
}

/// Decisions taken by `approver_id` on requests applied for in the given month.
pub fn approver_month_tally(
    requests: &[LeaveRequest],
    approver_id: &str,
    year: i32,
    month: u32,
) -> DecisionTally {
    history_for_approver(requests, approver_id)
        .into_iter()
        .filter(|request| {
            let applied = request.applied_on().to_datetime_utc();
            applied.year() == year && applied.month() == month
        })
        .filter_map(|request| request.step_for(approver_id))
        .fold(DecisionTally::default(), |mut tally, step| {
            match step.status {
                LeaveStatus::Approved => tally.approved += 1,
                LeaveStatus::Disapproved => tally.disapproved += 1,
                LeaveStatus::Pending => {}
            }
            tally
        })
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusTally {
    pub pending: usize,
    pub approved: usize,
    pub disapproved: usize,
}

pub fn staff_status_tally(requests: &[LeaveRequest], staff_id: &str) -> StatusTally {
    all_for_staff(requests, staff_id)
        .into_iter()
        .fold(StatusTally::default(), |mut tally, request| {
            match request.status() {
                LeaveStatus::Pending => tally.pending += 1,
                LeaveStatus::Approved => tally.approved += 1,
                LeaveStatus::Disapproved => tally.disapproved += 1,
            }
            tally
        })
}

/// Approved leave of `staff_id` starting after `today`, soonest first.
pub fn upcoming_approved<'a>(
    requests: &'a [LeaveRequest],
    staff_id: &str,
    today: LeaveDate,
) -> Vec<&'a LeaveRequest> {
    let mut upcoming: Vec<_> = all_for_staff(requests, staff_id)
        .into_iter()
        .filter(|request| request.status() == LeaveStatus::Approved)
        .filter(|request| request.details().start_date.is_some_and(|start| start > today))
        .collect();
    upcoming.sort_by_key(|request| request.details().start_date);
    upcoming
}

/// The `limit` most recently applied requests of `staff_id`.
pub fn recent_for_staff<'a>(
    requests: &'a [LeaveRequest],
    staff_id: &str,
    limit: usize,
) -> Vec<&'a LeaveRequest> {
    let mut recent = all_for_staff(requests, staff_id);
    recent.sort_by_key(|request| Reverse(request.applied_on().to_datetime_utc()));
    recent.truncate(limit);
    recent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ReportingAuthority, StaffRecord};
    use crate::leave::{LeaveDetails, LeaveType, TimeStamp};
    use crate::request::Decision;
    use crate::session::Role;

    fn staff(staff_id: &str, approvers: &[&str]) -> StaffRecord {
        StaffRecord {
            staff_id: staff_id.into(),
            first_name: staff_id.into(),
            last_name: String::new(),
            designation: "Engineer".into(),
            role: Role::Employee,
            reporting_authority: approvers
                .iter()
                .map(|id| ReportingAuthority {
                    id: id.to_string(),
                    name: id.to_string(),
                    designation: "Lead".into(),
                })
                .collect(),
        }
    }

    fn request(
        id: &str,
        staff_id: &str,
        approvers: &[&str],
        start: (i32, u32, u32),
        applied: TimeStamp<chrono::Utc>,
    ) -> LeaveRequest {
        let start = LeaveDate::from_ymd(start.0, start.1, start.2).unwrap();
        let details = LeaveDetails::new()
            .set_leave_type(LeaveType::Sick)
            .set_dates(start, start)
            .set_reason("Fever")
            .set_address("Home")
            .set_emergency_contact("Sam", "9123456780");
        LeaveRequest::new(id.into(), &staff(staff_id, approvers), details, applied).unwrap()
    }

    fn ids(view: &[&LeaveRequest]) -> Vec<String> {
        view.iter().map(|r| r.id().to_string()).collect()
    }

    fn fixture() -> Vec<LeaveRequest> {
        let june = TimeStamp::new_with(2024, 6, 3, 9, 0, 0).unwrap();
        let may = TimeStamp::new_with(2024, 5, 20, 9, 0, 0).unwrap();

        // a waits on x then y
        let a = request("a", "s1", &["x", "y"], (2024, 6, 12), june.clone());
        // b approved by x, now waiting on y
        let mut b = request("b", "s1", &["x", "y"], (2024, 6, 13), june.clone());
        b.apply_decision("x", Decision::Approved, "", june.clone())
            .unwrap();
        // c rejected by x
        let mut c = request("c", "s2", &["x"], (2024, 6, 14), june.clone());
        c.apply_decision("x", Decision::Disapproved, "busy", june.clone())
            .unwrap();
        // d fully approved, applied in May
        let mut d = request("d", "s1", &["y"], (2024, 7, 1), may.clone());
        d.apply_decision("y", Decision::Approved, "", may).unwrap();

        vec![a, b, c, d]
    }

    #[test]
    fn pending_follows_active_step() {
        let all = fixture();
        assert_eq!(ids(&pending_for_approver(&all, "x")), ["a"]);
        assert_eq!(ids(&pending_for_approver(&all, "y")), ["b"]);
        assert!(pending_for_approver(&all, "z").is_empty());
    }

    #[test]
    fn history_includes_every_chain_membership() {
        let all = fixture();
        assert_eq!(ids(&history_for_approver(&all, "x")), ["a", "b", "c"]);
        // y has not been reached on a yet but a still shows up
        assert_eq!(ids(&history_for_approver(&all, "y")), ["a", "b", "d"]);
    }

    #[test]
    fn approver_tabs_follow_own_step() {
        let all = fixture();
        // b is still pending overall but x has already approved it
        assert_eq!(
            ids(&history_for_approver_by_step_status(&all, "x", LeaveStatus::Approved)),
            ["b"]
        );
        assert_eq!(
            ids(&history_for_approver_by_step_status(&all, "x", LeaveStatus::Pending)),
            ["a"]
        );
        assert_eq!(
            ids(&history_for_approver_by_step_status(&all, "x", LeaveStatus::Disapproved)),
            ["c"]
        );
        assert_eq!(
            ids(&history_for_approver_by_step_status(&all, "y", LeaveStatus::Pending)),
            ["a", "b"]
        );
        assert_eq!(
            ids(&history_for_approver_by_step_status(&all, "y", LeaveStatus::Approved)),
            ["d"]
        );
        assert!(history_for_approver_by_step_status(&all, "z", LeaveStatus::Pending).is_empty());
    }

    #[test]
    fn staff_view_and_status_tabs() {
        let all = fixture();
        let mine = all_for_staff(&all, "s1");
        assert_eq!(ids(&mine), ["a", "b", "d"]);
        assert_eq!(ids(&with_status(&mine, LeaveStatus::Pending)), ["a", "b"]);
        assert_eq!(ids(&with_status(&mine, LeaveStatus::Approved)), ["d"]);
        assert_eq!(
            staff_status_tally(&all, "s1"),
            StatusTally {
                pending: 2,
                approved: 1,
                disapproved: 0
            }
        );
    }

    #[test]
    fn month_tally_counts_own_decisions() {
        let all = fixture();
        assert_eq!(
            approver_month_tally(&all, "x", 2024, 6),
            DecisionTally {
                approved: 1,
                disapproved: 1
            }
        );
        assert_eq!(
            approver_month_tally(&all, "y", 2024, 5),
            DecisionTally {
                approved: 1,
                disapproved: 0
            }
        );
        assert_eq!(approver_month_tally(&all, "y", 2024, 6), DecisionTally::default());
    }

    #[test]
    fn upcoming_and_recent() {
        let all = fixture();
        let today = LeaveDate::from_ymd(2024, 6, 20).unwrap();
        assert_eq!(ids(&upcoming_approved(&all, "s1", today)), ["d"]);
        let later = LeaveDate::from_ymd(2024, 7, 1).unwrap();
        assert!(upcoming_approved(&all, "s1", later).is_empty());

        let recent = recent_for_staff(&all, "s1", 2);
        assert_eq!(recent.len(), 2);
        assert!(!ids(&recent).contains(&"d".to_string()));
    }

    #[test]
    fn recent_is_newest_first() {
        let first = TimeStamp::new_with(2024, 3, 1, 8, 0, 0).unwrap();
        let second = TimeStamp::new_with(2024, 4, 1, 8, 0, 0).unwrap();
        let third = TimeStamp::new_with(2024, 5, 1, 8, 0, 0).unwrap();
        let all = vec![
            request("second", "s1", &["x"], (2024, 6, 12), second),
            request("third", "s1", &["x"], (2024, 6, 12), third),
            request("first", "s1", &["x"], (2024, 6, 12), first),
        ];
        assert_eq!(ids(&recent_for_staff(&all, "s1", 3)), ["third", "second", "first"]);
        assert_eq!(ids(&recent_for_staff(&all, "s1", 1)), ["third"]);
        assert!(recent_for_staff(&all, "s1", 0).is_empty());
    }
}
