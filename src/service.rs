//! Service layer API for the leave workflow
use super::chain::StaffRecord;
use super::config::ServiceConfig;
use super::error::LeaveError;
use super::leave::{LeaveDate, LeaveDetails, LeavePatch, TimeStamp};
use super::request::{Decision, LeaveRequest, LeaveStatus};
use super::session::Principal;
use super::store::{LeaveStore, Snapshot};
use super::{utils, views};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct LeaveService {
    instance: Arc<sled::Db>,
    store: LeaveStore,
    config: ServiceConfig,
}

impl LeaveService {
    pub fn new(instance: Arc<sled::Db>) -> Result<Self, LeaveError> {
        Self::with_config(instance, ServiceConfig::default())
    }

    pub fn with_config(instance: Arc<sled::Db>, config: ServiceConfig) -> Result<Self, LeaveError> {
        let store = LeaveStore::open(&instance, &config)?;
        Ok(Self {
            instance,
            store,
            config,
        })
    }

    /// Open the sled database at `config.db_path`
    pub fn open(config: &ServiceConfig) -> Result<Self, LeaveError> {
        let instance = sled::open(&config.db_path)?;
        Self::with_config(Arc::new(instance), config.clone())
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<(), LeaveError> {
        self.instance.flush()?;
        Ok(())
    }

    fn load(&self, request_id: &str) -> Result<Snapshot<LeaveRequest>, LeaveError> {
        self.store
            .get_leave(request_id)?
            .ok_or_else(|| LeaveError::NotFound(request_id.to_string()))
    }

    fn scan(&self) -> Result<Vec<LeaveRequest>, LeaveError> {
        let requests = self.store.scan_leaves()?;
        debug!(count = requests.len(), "scanned leave requests");
        Ok(requests)
    }

    /// Store or replace a staff record. Only the workflow relevant fields are kept.
    pub fn register_staff(&self, record: &StaffRecord) -> Result<(), LeaveError> {
        self.store.put_staff(record)?;
        info!(
            staff_id = %record.staff_id,
            approvers = record.reporting_authority.len(),
            "staff record stored"
        );
        Ok(())
    }

    pub fn get_staff(&self, staff_id: &str) -> Result<StaffRecord, LeaveError> {
        self.store
            .get_staff(staff_id)?
            .ok_or_else(|| LeaveError::StaffNotFound(staff_id.to_string()))
    }

    /// Submit a new leave request; the approval chain comes from the applicant's record
    pub fn create_leave_request(
        &self,
        staff_id: &str,
        details: LeaveDetails,
    ) -> Result<LeaveRequest, LeaveError> {
        let applicant = self.get_staff(staff_id)?;
        let request_id =
            utils::new_leave_id().map_err(|err| LeaveError::IdAllocation(err.to_string()))?;

        let request = LeaveRequest::new(request_id, &applicant, details, TimeStamp::new())
            .inspect_err(|err| warn!(staff_id, error = %err, "leave request rejected"))?;

        if !self.store.insert_new_leave(&request)? {
            return Err(LeaveError::ConcurrentModification(request.id().to_string()));
        }

        info!(
            request_id = %request.id(),
            staff_id,
            steps = request.steps().len(),
            days = request.no_of_days(),
            "leave request created"
        );

        Ok(request)
    }

    pub fn get_leave_request(&self, request_id: &str) -> Result<LeaveRequest, LeaveError> {
        Ok(self.load(request_id)?.doc)
    }

    /// Record an approver's decision on the step currently awaiting them.
    ///
    /// The write is a compare-and-swap against the document as loaded. When
    /// another writer got there first the decision is re-evaluated against the
    /// fresh document, up to `conflict_retries` times.
    pub fn decide(
        &self,
        request_id: &str,
        approver_id: &str,
        decision: Decision,
        comment: &str,
        timestamp: TimeStamp<Utc>,
    ) -> Result<LeaveRequest, LeaveError> {
        let mut attempt = 0;

        loop {
            let snapshot = self.load(request_id)?;
            let mut request = snapshot.doc.clone();

            if let Err(err) =
                request.apply_decision(approver_id, decision, comment, timestamp.clone())
            {
                warn!(request_id, approver_id, ?decision, error = %err, "decision rejected");
                return Err(err);
            }

            if self.store.replace_leave(&snapshot, &request)? {
                info!(
                    request_id,
                    approver_id,
                    ?decision,
                    status = request.status().as_str(),
                    current_approver = request.current_approver(),
                    revision = request.revision(),
                    "decision recorded"
                );
                return Ok(request);
            }

            if attempt >= self.config.conflict_retries {
                warn!(request_id, approver_id, attempt, "giving up after write conflicts");
                return Err(LeaveError::ConcurrentModification(request_id.to_string()));
            }
            attempt += 1;
            warn!(request_id, approver_id, attempt, "write conflict, re-evaluating decision");
        }
    }

    /// Edit the descriptive fields of a request that is still pending
    pub fn update_request_fields(
        &self,
        principal: &Principal,
        request_id: &str,
        patch: &LeavePatch,
    ) -> Result<LeaveRequest, LeaveError> {
        let snapshot = self.load(request_id)?;
        if !principal.may_modify(snapshot.doc.staff_id()) {
            return Err(LeaveError::Forbidden(principal.user_id.clone()));
        }

        let mut request = snapshot.doc.clone();
        request.replace_details(patch.apply_to(request.details()))?;

        if !self.store.replace_leave(&snapshot, &request)? {
            warn!(request_id, "leave request changed while editing");
            return Err(LeaveError::ConcurrentModification(request_id.to_string()));
        }

        info!(
            request_id,
            user_id = %principal.user_id,
            revision = request.revision(),
            "leave request updated"
        );
        Ok(request)
    }

    /// Hard delete a request that is still pending
    pub fn delete_request(&self, principal: &Principal, request_id: &str) -> Result<(), LeaveError> {
        let snapshot = self.load(request_id)?;
        if !principal.may_modify(snapshot.doc.staff_id()) {
            return Err(LeaveError::Forbidden(principal.user_id.clone()));
        }
        if snapshot.doc.is_terminal() {
            return Err(LeaveError::RequestFinalized(request_id.to_string()));
        }

        if !self.store.remove_leave(&snapshot)? {
            warn!(request_id, "leave request changed before delete");
            return Err(LeaveError::ConcurrentModification(request_id.to_string()));
        }

        info!(request_id, user_id = %principal.user_id, "leave request deleted");
        Ok(())
    }

    pub fn list_pending(&self, approver_id: &str) -> Result<Vec<LeaveRequest>, LeaveError> {
        let all = self.scan()?;
        Ok(views::pending_for_approver(&all, approver_id)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn list_history(&self, approver_id: &str) -> Result<Vec<LeaveRequest>, LeaveError> {
        let all = self.scan()?;
        Ok(views::history_for_approver(&all, approver_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Requests where the approver's own step is in `status`, as on the approver's tabs.
    pub fn list_history_by_step_status(
        &self,
        approver_id: &str,
        status: LeaveStatus,
    ) -> Result<Vec<LeaveRequest>, LeaveError> {
        let all = self.scan()?;
        Ok(
            views::history_for_approver_by_step_status(&all, approver_id, status)
                .into_iter()
                .cloned()
                .collect(),
        )
    }

    pub fn list_for_staff(&self, staff_id: &str) -> Result<Vec<LeaveRequest>, LeaveError> {
        let all = self.scan()?;
        Ok(views::all_for_staff(&all, staff_id)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn approver_month_tally(
        &self,
        approver_id: &str,
        year: i32,
        month: u32,
    ) -> Result<views::DecisionTally, LeaveError> {
        Ok(views::approver_month_tally(
            &self.scan()?,
            approver_id,
            year,
            month,
        ))
    }

    pub fn staff_status_tally(&self, staff_id: &str) -> Result<views::StatusTally, LeaveError> {
        Ok(views::staff_status_tally(&self.scan()?, staff_id))
    }

    pub fn upcoming_approved(
        &self,
        staff_id: &str,
        today: LeaveDate,
    ) -> Result<Vec<LeaveRequest>, LeaveError> {
        let all = self.scan()?;
        Ok(views::upcoming_approved(&all, staff_id, today)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn recent_for_staff(
        &self,
        staff_id: &str,
        limit: usize,
    ) -> Result<Vec<LeaveRequest>, LeaveError> {
        let all = self.scan()?;
        Ok(views::recent_for_staff(&all, staff_id, limit)
            .into_iter()
            .cloned()
            .collect())
    }
}
