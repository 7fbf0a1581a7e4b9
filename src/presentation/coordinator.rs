//! Painting merged ranges and swapping render handles without a gap.
//!
//! A handle swap runs in this order:
//!
//! ```text
//! retain current handles
//!       │
//!       ▼
//! create replacement handles (token categories, inactive regions)
//!       │
//!       ▼
//! paint every visible view with the replacements
//!       │
//!       ▼
//! dispose the retained handles
//! ```
//!
//! Disposing before repainting leaves the view unpainted for a frame on
//! some editors.

use std::collections::BTreeMap;
use std::sync::Arc;
use tower_lsp_server::ls_types::Range;
use url::Url;

use super::handles::HandleSet;
use super::sink::{RenderSink, ViewId};
use crate::colorize::TokenRangeStore;
use crate::config::ColorizationSettings;
use crate::domain::{Category, StyleTable};

const LOG_TARGET: &str = "irodori::presentation";

/// Presentation state for one document.
pub struct PresentationCoordinator {
    uri: Url,
    sink: Arc<dyn RenderSink>,
    handles: HandleSet,
}

impl PresentationCoordinator {
    pub fn new(uri: Url, sink: Arc<dyn RenderSink>) -> Self {
        let handles = HandleSet::empty(sink.clone());
        Self { uri, sink, handles }
    }

    pub fn handles(&self) -> &HandleSet {
        &self.handles
    }

    /// Replace every handle and repaint all visible views.
    pub fn rebuild(
        &mut self,
        settings: &ColorizationSettings,
        styles: &StyleTable,
        store: &TokenRangeStore,
    ) {
        let replacement = HandleSet::create(self.sink.clone(), settings, styles);
        let mut retired = std::mem::replace(&mut self.handles, replacement);

        let views = self.render(store);
        retired.dispose();

        log::debug!(
            target: LOG_TARGET,
            "Swapped render handles for {} ({} handles, {} views)",
            self.uri,
            self.handles.len(),
            views
        );
    }

    /// Paint every visible view of the document with the current handles.
    ///
    /// Returns the number of views painted.
    pub fn render(&self, store: &TokenRangeStore) -> usize {
        let views = self.sink.visible_views(&self.uri);
        if views.is_empty() || self.handles.is_empty() {
            return 0;
        }

        let merged = store.merged_all();
        for view in &views {
            self.paint(*view, &merged, store.inactive());
        }
        views.len()
    }

    /// Repaint one view that just became visible or changed its viewport.
    ///
    /// Returns `false` without painting when `view` does not show this
    /// document.
    pub fn refresh(&self, view: ViewId, store: &TokenRangeStore) -> bool {
        if !self.sink.visible_views(&self.uri).contains(&view) {
            log::debug!(
                target: LOG_TARGET,
                "Skipping refresh of view {:?}, which does not show {}",
                view,
                self.uri
            );
            return false;
        }
        if !self.handles.is_empty() {
            self.paint(view, &store.merged_all(), store.inactive());
        }
        true
    }

    /// Release every handle.
    pub fn dispose(&mut self) {
        self.handles.dispose();
    }

    fn paint(&self, view: ViewId, merged: &BTreeMap<Category, Vec<Range>>, inactive: &[Range]) {
        // Empty slices are applied too so ranges removed by edits disappear
        for (category, handle) in self.handles.tokens() {
            let ranges = merged.get(category).map(Vec::as_slice).unwrap_or_default();
            self.sink.apply_ranges(view, *handle, ranges);
        }
        if let Some(handle) = self.handles.inactive() {
            self.sink.apply_ranges(view, handle, inactive);
        }
    }
}

impl std::fmt::Debug for PresentationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentationCoordinator")
            .field("uri", &self.uri.as_str())
            .field("handles", &self.handles)
            .finish()
    }
}
