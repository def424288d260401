//! Backend-for-frontend for the Civic Participation Program.
//!
//! Serves the public application wizard (lookups, per-step validation, guarded
//! navigation, submission and email verification) and the administrator console
//! (listing, review, status changes, bulk selection) on top of the program's
//! REST backend.

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
