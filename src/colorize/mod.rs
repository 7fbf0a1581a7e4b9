//! Per-document range tracking: the edit log, both passes' ranges, and the
//! reconciliation between them.

pub mod document;
pub mod edit_log;
pub mod state;
pub mod store;

pub use document::{ColorizationSnapshot, DocumentColorizer, PassVersions};
pub use edit_log::EditLog;
pub use state::ColorizationState;
pub use store::{PassRanges, PassState, TokenRangeStore};
