pub mod change;
pub mod transform;

// Re-export main types and functions
pub use change::{Edit, TextChange, inserted_end};
pub use transform::{apply_change, apply_changes, transform_range};
