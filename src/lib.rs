//! Leave requests with a sequential multi-approver workflow.
//!
//! A request is created from the applicant's staff record, which supplies the
//! ordered chain of approvers. Approvers act one at a time through
//! [`service::LeaveService::decide`]; dashboards read the same documents
//! through the filters in [`views`].

pub mod chain;
pub mod config;
pub mod error;
pub mod leave;
pub mod request;
pub mod service;
pub mod session;
pub mod store;
pub mod utils;
pub mod views;
