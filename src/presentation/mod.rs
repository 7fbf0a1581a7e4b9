//! Render handle lifecycle and paint calls against the editor surface.

pub mod coordinator;
pub mod handles;
pub mod sink;

pub use coordinator::PresentationCoordinator;
pub use handles::HandleSet;
pub use sink::{
    PaintPrecedence, RecordingSink, RenderHandle, RenderSink, RenderStyle, SinkCall, ViewId,
};
