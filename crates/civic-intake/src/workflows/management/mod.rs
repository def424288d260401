//! Back-office console: list, review, status changes and bulk selection.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{
    ApplicationPage, ApplicationQuery, SelectionReport, StatusChange, StatusChangeRequest,
};
pub use router::management_router;
pub use service::{ApplicationListCache, ManagementError, ManagementService};
