//! Sled backed document store for leave requests and staff records
//!
//! Documents are CBOR encoded and keyed by their id. Every write of an
//! existing leave request is a compare-and-swap against the bytes it was read
//! from, so a concurrent writer is detected instead of overwritten.
use super::chain::StaffRecord;
use super::config::ServiceConfig;
use super::error::LeaveError;
use super::request::LeaveRequest;
use sled::{Db, IVec, Tree};

/// A decoded document plus the exact bytes it was decoded from
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub doc: T,
    raw: IVec,
}

pub struct LeaveStore {
    leaves: Tree,
    staff: Tree,
}

impl LeaveStore {
    pub fn open(instance: &Db, config: &ServiceConfig) -> Result<Self, LeaveError> {
        Ok(Self {
            leaves: instance.open_tree(&config.leaves_tree)?,
            staff: instance.open_tree(&config.staff_tree)?,
        })
    }

    pub fn get_leave(&self, request_id: &str) -> Result<Option<Snapshot<LeaveRequest>>, LeaveError> {
        match self.leaves.get(request_id.as_bytes())? {
            Some(raw) => {
                let doc = minicbor::decode(&raw)?;
                Ok(Some(Snapshot { doc, raw }))
            }
            None => Ok(None),
        }
    }

    /// Stores a new request. Returns false if the id is already taken.
    pub fn insert_new_leave(&self, request: &LeaveRequest) -> Result<bool, LeaveError> {
        let cbor = minicbor::to_vec(request)?;
        let swapped =
            self.leaves
                .compare_and_swap(request.id().as_bytes(), None::<&[u8]>, Some(cbor))?;
        Ok(swapped.is_ok())
    }

    /// Replaces the document read in `previous` with `next`. Returns false if
    /// the stored document changed since it was read.
    pub fn replace_leave(
        &self,
        previous: &Snapshot<LeaveRequest>,
        next: &LeaveRequest,
    ) -> Result<bool, LeaveError> {
        let cbor = minicbor::to_vec(next)?;
        let swapped = self.leaves.compare_and_swap(
            next.id().as_bytes(),
            Some(&previous.raw),
            Some(cbor),
        )?;
        Ok(swapped.is_ok())
    }

    /// Deletes the document read in `previous`, unless it changed since.
    pub fn remove_leave(&self, previous: &Snapshot<LeaveRequest>) -> Result<bool, LeaveError> {
        let swapped = self.leaves.compare_and_swap(
            previous.doc.id().as_bytes(),
            Some(&previous.raw),
            None::<IVec>,
        )?;
        Ok(swapped.is_ok())
    }

    pub fn scan_leaves(&self) -> Result<Vec<LeaveRequest>, LeaveError> {
        self.leaves
            .iter()
            .map(|entry| -> Result<LeaveRequest, LeaveError> {
                let (_key, raw) = entry?;
                Ok(minicbor::decode(&raw)?)
            })
            .collect()
    }

    pub fn put_staff(&self, record: &StaffRecord) -> Result<(), LeaveError> {
        let cbor = minicbor::to_vec(record)?;
        self.staff.insert(record.staff_id.as_bytes(), cbor)?;
        Ok(())
    }

    pub fn get_staff(&self, staff_id: &str) -> Result<Option<StaffRecord>, LeaveError> {
        match self.staff.get(staff_id.as_bytes())? {
            Some(raw) => Ok(Some(minicbor::decode(&raw)?)),
            None => Ok(None),
        }
    }
}
