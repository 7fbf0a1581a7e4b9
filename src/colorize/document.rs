//! One open document: reconciliation state plus its presentation.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_lsp_server::ls_types::Range;
use url::Url;

use super::state::ColorizationState;
use crate::config::ColorizationSettings;
use crate::domain::{Category, Pass, StyleResolver, StyleTable};
use crate::error::{ColorizeError, ColorizeResult};
use crate::presentation::{PresentationCoordinator, RenderSink, ViewId};
use crate::text::TextChange;

const LOG_TARGET: &str = "irodori::reconcile";

/// Colorization of a single document.
///
/// Every mutation keeps the painted state in step with the stored ranges:
/// edits repaint with the existing handles, classification results and
/// settings changes swap in a fresh handle set.
#[derive(Debug)]
pub struct DocumentColorizer {
    uri: Url,
    state: ColorizationState,
    presentation: PresentationCoordinator,
    settings: Arc<ColorizationSettings>,
    styles: StyleTable,
}

impl DocumentColorizer {
    /// Start tracking `uri`, opened at `version`.
    pub fn open(
        uri: Url,
        version: i32,
        sink: Arc<dyn RenderSink>,
        settings: Arc<ColorizationSettings>,
        resolver: &dyn StyleResolver,
    ) -> Self {
        let mut document = Self {
            presentation: PresentationCoordinator::new(uri.clone(), sink),
            uri,
            state: ColorizationState::new(version),
            settings,
            styles: StyleTable::build(resolver),
        };
        document.rebuild();
        document
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn state(&self) -> &ColorizationState {
        &self.state
    }

    pub fn presentation(&self) -> &PresentationCoordinator {
        &self.presentation
    }

    pub fn settings(&self) -> &ColorizationSettings {
        &self.settings
    }

    /// Record a document edit and move both passes' ranges through it.
    pub fn on_document_edited(
        &mut self,
        changes: Vec<TextChange>,
        version: i32,
    ) -> ColorizeResult<()> {
        self.state.record_edit(changes, version)?;
        self.state.reconcile_all();
        self.presentation.render(self.state.store());
        Ok(())
    }

    /// Accept a syntactic classification computed at `version`.
    ///
    /// Returns `Ok(false)` when the result is stale and was ignored.
    pub fn on_syntactic_result(
        &mut self,
        uri: &Url,
        ranges_by_category: BTreeMap<Category, Vec<Range>>,
        version: i32,
    ) -> ColorizeResult<bool> {
        self.check_uri(uri)?;
        if !self.state.replace_syntactic(ranges_by_category, version)? {
            return Ok(false);
        }
        self.after_result(Pass::Syntactic);
        Ok(true)
    }

    /// Accept a semantic classification, including inactive regions,
    /// computed at `version`.
    pub fn on_semantic_result(
        &mut self,
        uri: &Url,
        ranges_by_category: BTreeMap<Category, Vec<Range>>,
        inactive: Vec<Range>,
        version: i32,
    ) -> ColorizeResult<bool> {
        self.check_uri(uri)?;
        if !self
            .state
            .replace_semantic(ranges_by_category, inactive, version)?
        {
            return Ok(false);
        }
        self.after_result(Pass::Semantic);
        Ok(true)
    }

    /// Repaint `view` with the current ranges.
    ///
    /// Returns `false` when `view` does not show this document.
    pub fn refresh(&self, view: ViewId) -> bool {
        self.presentation.refresh(view, self.state.store())
    }

    /// Switch to new settings and styles, swapping every handle.
    pub fn apply_settings(
        &mut self,
        settings: Arc<ColorizationSettings>,
        resolver: &dyn StyleResolver,
    ) {
        self.settings = settings;
        self.styles = StyleTable::build(resolver);
        self.rebuild();
    }

    /// Release every render handle. The document is unusable for painting
    /// afterwards until settings are applied again.
    pub fn close(&mut self) {
        self.presentation.dispose();
        log::debug!(target: LOG_TARGET, "Closed {}", self.uri);
    }

    pub fn snapshot(&self) -> ColorizationSnapshot {
        let store = self.state.store();
        let versions = |pass: Pass| {
            let state = store.pass(pass);
            PassVersions {
                applied_version: state.applied_version(),
                last_received_version: state.last_received_version(),
            }
        };
        ColorizationSnapshot {
            uri: self.uri.clone(),
            syntactic: versions(Pass::Syntactic),
            semantic: versions(Pass::Semantic),
            pending_edits: self.state.edit_log().versions(),
            ranges: store.merged_all(),
            inactive: store.inactive().to_vec(),
        }
    }

    fn after_result(&mut self, pass: Pass) {
        let applied = self.state.reconcile(pass);
        let purged = self.state.purge();
        log::debug!(
            target: LOG_TARGET,
            "Accepted {} result for {} ({} pending edits replayed, {} purged)",
            pass,
            self.uri,
            applied,
            purged
        );
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.presentation
            .rebuild(&self.settings, &self.styles, self.state.store());
    }

    fn check_uri(&self, uri: &Url) -> ColorizeResult<()> {
        if uri != &self.uri {
            return Err(ColorizeError::document_not_found(uri.as_str()));
        }
        Ok(())
    }
}

/// Version counters of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassVersions {
    pub applied_version: i32,
    pub last_received_version: i32,
}

/// Point-in-time view of a document's colorization state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorizationSnapshot {
    pub uri: Url,
    pub syntactic: PassVersions,
    pub semantic: PassVersions,
    /// Versions still held by the edit log
    pub pending_edits: Vec<i32>,
    pub ranges: BTreeMap<Category, Vec<Range>>,
    pub inactive: Vec<Range>,
}
