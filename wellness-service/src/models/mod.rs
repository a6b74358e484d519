//! Domain models for the wellness service.

pub mod query;
pub mod session;

pub use query::{SessionQuery, SortField, SortOrder};
pub use session::{RecordSource, SessionKind, SessionRecord};
