//! Reference data (languages, provinces, ...) used to populate selection fields.

pub mod cache;
pub mod domain;

pub use cache::LookupCache;
pub use domain::{active_entries, Locale, LookupEntity, LookupKind, LookupOption};
