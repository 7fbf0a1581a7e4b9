pub mod colorize;
pub mod config;
pub mod domain;
pub mod error;
pub mod presentation;
pub mod runtime;
pub mod service;
pub mod text;

// Re-export the types most callers need
pub use colorize::{ColorizationSnapshot, ColorizationState, DocumentColorizer, TokenRangeStore};
pub use config::ColorizationSettings;
pub use domain::{Category, Pass, StyleResolver, TokenStyle};
pub use error::{ColorizeError, ColorizeResult};
pub use presentation::{RecordingSink, RenderSink, ViewId};
pub use service::ColorizationService;
pub use text::{TextChange, transform_range};
