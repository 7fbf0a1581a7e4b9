//! Interface to the editor surface that actually paints ranges.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tower_lsp_server::ls_types::Range;
use url::Url;

use crate::domain::{Category, TokenStyle};
use crate::error::LockResultExt;

/// Opaque resource describing how to paint one kind of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RenderHandle(pub u64);

/// An editor view showing some document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(pub u64);

/// How the sink resolves overlapping ranges painted with different handles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaintPrecedence {
    /// Handles created later paint on top.
    #[default]
    LastCreatedWins,
    /// Handles created earlier paint on top.
    FirstCreatedWins,
}

/// What a render handle paints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderStyle {
    Token {
        category: Category,
        style: TokenStyle,
    },
    Inactive {
        opacity: f32,
        foreground: Option<String>,
        background: Option<String>,
    },
}

/// Editor-side painting primitive.
///
/// Handles must be released with [`RenderSink::dispose_handle`]; the sink
/// owns whatever resources back them.
pub trait RenderSink: Send + Sync {
    fn create_handle(&self, style: &RenderStyle) -> RenderHandle;

    fn dispose_handle(&self, handle: RenderHandle);

    /// Replace the ranges painted with `handle` in `view`.
    fn apply_ranges(&self, view: ViewId, handle: RenderHandle, ranges: &[Range]);

    /// Views currently showing `uri`.
    fn visible_views(&self, uri: &Url) -> Vec<ViewId>;

    fn precedence(&self) -> PaintPrecedence {
        PaintPrecedence::LastCreatedWins
    }
}

/// A call observed by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum SinkCall {
    Create {
        handle: RenderHandle,
        style: RenderStyle,
    },
    Dispose {
        handle: RenderHandle,
    },
    Apply {
        view: ViewId,
        handle: RenderHandle,
        ranges: Vec<Range>,
    },
}

#[derive(Debug, Default)]
struct RecordingState {
    next_handle: u64,
    live: BTreeMap<RenderHandle, RenderStyle>,
    views: HashMap<Url, Vec<ViewId>>,
    painted: HashMap<(ViewId, RenderHandle), Vec<Range>>,
    calls: Vec<SinkCall>,
}

/// In-memory sink that records every call and tracks what each view shows.
#[derive(Debug, Default)]
pub struct RecordingSink {
    precedence: PaintPrecedence,
    state: Mutex<RecordingState>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precedence(precedence: PaintPrecedence) -> Self {
        Self {
            precedence,
            state: Mutex::default(),
        }
    }

    /// Make `view` visible for `uri`.
    pub fn show(&self, uri: &Url, view: ViewId) {
        let mut state = self.state.lock().recover_poison("RecordingSink::show");
        let views = state.views.entry(uri.clone()).or_default();
        if !views.contains(&view) {
            views.push(view);
        }
    }

    /// Hide `view`, forgetting what it painted.
    pub fn hide(&self, uri: &Url, view: ViewId) {
        let mut state = self.state.lock().recover_poison("RecordingSink::hide");
        if let Some(views) = state.views.get_mut(uri) {
            views.retain(|v| *v != view);
        }
        state.painted.retain(|(v, _), _| *v != view);
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.state
            .lock()
            .recover_poison("RecordingSink::calls")
            .calls
            .clone()
    }

    pub fn clear_calls(&self) {
        self.state
            .lock()
            .recover_poison("RecordingSink::clear_calls")
            .calls
            .clear();
    }

    /// Handles created and not yet disposed, in creation order.
    pub fn live_handles(&self) -> Vec<(RenderHandle, RenderStyle)> {
        let state = self.state.lock().recover_poison("RecordingSink::live_handles");
        state
            .live
            .iter()
            .map(|(handle, style)| (*handle, style.clone()))
            .collect()
    }

    /// Non-empty ranges currently shown in `view` through live handles.
    pub fn painted(&self, view: ViewId) -> Vec<(RenderStyle, Vec<Range>)> {
        let state = self.state.lock().recover_poison("RecordingSink::painted");
        state
            .live
            .iter()
            .filter_map(|(handle, style)| {
                state
                    .painted
                    .get(&(view, *handle))
                    .filter(|ranges| !ranges.is_empty())
                    .map(|ranges| (style.clone(), ranges.clone()))
            })
            .collect()
    }

    /// Ranges shown in `view` for `category`, if a live handle paints it.
    pub fn painted_category(&self, view: ViewId, category: Category) -> Vec<Range> {
        self.painted(view)
            .into_iter()
            .find_map(|(style, ranges)| match style {
                RenderStyle::Token { category: c, .. } if c == category => Some(ranges),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Inactive ranges shown in `view`.
    pub fn painted_inactive(&self, view: ViewId) -> Vec<Range> {
        self.painted(view)
            .into_iter()
            .find_map(|(style, ranges)| match style {
                RenderStyle::Inactive { .. } => Some(ranges),
                _ => None,
            })
            .unwrap_or_default()
    }
}

impl RenderSink for RecordingSink {
    fn create_handle(&self, style: &RenderStyle) -> RenderHandle {
        let mut state = self.state.lock().recover_poison("RecordingSink::create_handle");
        state.next_handle += 1;
        let handle = RenderHandle(state.next_handle);
        state.live.insert(handle, style.clone());
        state.calls.push(SinkCall::Create {
            handle,
            style: style.clone(),
        });
        handle
    }

    fn dispose_handle(&self, handle: RenderHandle) {
        let mut state = self.state.lock().recover_poison("RecordingSink::dispose_handle");
        state.live.remove(&handle);
        state.painted.retain(|(_, h), _| *h != handle);
        state.calls.push(SinkCall::Dispose { handle });
    }

    fn apply_ranges(&self, view: ViewId, handle: RenderHandle, ranges: &[Range]) {
        let mut state = self.state.lock().recover_poison("RecordingSink::apply_ranges");
        state.painted.insert((view, handle), ranges.to_vec());
        state.calls.push(SinkCall::Apply {
            view,
            handle,
            ranges: ranges.to_vec(),
        });
    }

    fn visible_views(&self, uri: &Url) -> Vec<ViewId> {
        let state = self.state.lock().recover_poison("RecordingSink::visible_views");
        state.views.get(uri).cloned().unwrap_or_default()
    }

    fn precedence(&self) -> PaintPrecedence {
        self.precedence
    }
}
