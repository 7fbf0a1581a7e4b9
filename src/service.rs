//! Registry of open documents and the entry point for editor events.
//!
//! Each document owns a [`SerialExecutor`], so events for one document are
//! applied in the order they were submitted while different documents make
//! progress independently.

use arc_swap::ArcSwap;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tower_lsp_server::ls_types::{Range, TextDocumentContentChangeEvent};
use url::Url;

use crate::colorize::{ColorizationSnapshot, DocumentColorizer};
use crate::config::{ColorizationSettings, SettingsStyleResolver, load_settings};
use crate::domain::{Category, StyleResolver};
use crate::error::{ColorizeError, ColorizeResult};
use crate::presentation::{RenderSink, ViewId};
use crate::runtime::{SerialExecutor, TaskHandle};
use crate::text::TextChange;

const LOG_TARGET: &str = "irodori::service";

type DocumentMap = DashMap<Url, SerialExecutor<DocumentColorizer>>;

pub struct ColorizationService {
    sink: Arc<dyn RenderSink>,
    /// Overrides the styles table of the settings when present
    resolver: Option<Arc<dyn StyleResolver>>,
    settings: Arc<ArcSwap<ColorizationSettings>>,
    documents: Arc<DocumentMap>,
    /// Spawned on the first settings change
    settings_queue: OnceLock<SerialExecutor<SettingsUpdater>>,
}

impl ColorizationService {
    pub fn new(sink: Arc<dyn RenderSink>, settings: ColorizationSettings) -> Self {
        Self {
            sink,
            resolver: None,
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            documents: Arc::new(DashMap::new()),
            settings_queue: OnceLock::new(),
        }
    }

    /// Resolve styles through `resolver` instead of the settings' style table.
    pub fn with_resolver(mut self, resolver: Arc<dyn StyleResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> Arc<ColorizationSettings> {
        self.settings.load_full()
    }

    pub fn is_open(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// URIs of every open document, sorted.
    pub fn open_documents(&self) -> Vec<Url> {
        let mut uris: Vec<Url> = self.documents.iter().map(|e| e.key().clone()).collect();
        uris.sort();
        uris
    }

    /// Start tracking `uri` at `version`.
    pub async fn open_document(&self, uri: Url, version: i32) -> ColorizeResult<()> {
        let settings = self.settings();
        let resolver = resolver_for(self.resolver.as_ref(), &settings);
        match self.documents.entry(uri.clone()) {
            Entry::Occupied(_) => Err(ColorizeError::document_already_open(uri.as_str())),
            Entry::Vacant(vacant) => {
                let document = DocumentColorizer::open(
                    uri.clone(),
                    version,
                    self.sink.clone(),
                    settings,
                    resolver.as_ref(),
                );
                vacant.insert(SerialExecutor::spawn(document));
                log::debug!(target: LOG_TARGET, "Opened {} at version {}", uri, version);
                Ok(())
            }
        }
    }

    /// Stop tracking `uri` once its queued events have been applied,
    /// releasing every render handle.
    pub async fn close_document(&self, uri: &Url) -> ColorizeResult<()> {
        let (_, executor) = self
            .documents
            .remove(uri)
            .ok_or_else(|| ColorizeError::document_not_found(uri.as_str()))?;
        let mut document = executor.shutdown().await?;
        document.close();
        Ok(())
    }

    /// Apply an LSP `didChange` notification.
    pub async fn did_change(
        &self,
        uri: &Url,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> ColorizeResult<()> {
        let changes: Vec<TextChange> = changes.into_iter().map(TextChange::from_lsp).collect();
        self.dispatch(uri, move |document| {
            document.on_document_edited(changes, version)
        })?
        .await?
    }

    /// Apply edits already expressed as [`TextChange`]s.
    pub async fn apply_edit(
        &self,
        uri: &Url,
        changes: Vec<TextChange>,
        version: i32,
    ) -> ColorizeResult<()> {
        self.dispatch(uri, move |document| {
            document.on_document_edited(changes, version)
        })?
        .await?
    }

    /// Deliver a syntactic classification result.
    ///
    /// Returns `Ok(false)` for a stale result.
    pub async fn syntactic_result(
        &self,
        uri: &Url,
        ranges_by_category: BTreeMap<Category, Vec<Range>>,
        version: i32,
    ) -> ColorizeResult<bool> {
        let result_uri = uri.clone();
        self.dispatch(uri, move |document| {
            document.on_syntactic_result(&result_uri, ranges_by_category, version)
        })?
        .await?
    }

    /// Deliver a semantic classification result with its inactive regions.
    ///
    /// Returns `Ok(false)` for a stale result.
    pub async fn semantic_result(
        &self,
        uri: &Url,
        ranges_by_category: BTreeMap<Category, Vec<Range>>,
        inactive: Vec<Range>,
        version: i32,
    ) -> ColorizeResult<bool> {
        let result_uri = uri.clone();
        self.dispatch(uri, move |document| {
            document.on_semantic_result(&result_uri, ranges_by_category, inactive, version)
        })?
        .await?
    }

    /// Repaint `view`, which shows `uri`.
    ///
    /// Returns `Ok(false)` when the sink does not list `view` for `uri`.
    pub async fn refresh_view(&self, uri: &Url, view: ViewId) -> ColorizeResult<bool> {
        self.dispatch(uri, move |document| document.refresh(view))?
            .await
    }

    pub async fn snapshot(&self, uri: &Url) -> ColorizeResult<ColorizationSnapshot> {
        self.dispatch(uri, |document| document.snapshot())?.await
    }

    /// Switch every open document to `settings`.
    ///
    /// Settings changes are applied one at a time in the order requested.
    /// Returns the number of documents updated.
    pub async fn update_settings(&self, settings: ColorizationSettings) -> ColorizeResult<usize> {
        self.settings_queue()
            .submit(move |updater: &mut SettingsUpdater| Box::pin(updater.apply(settings)))
            .await?
    }

    /// Load settings from `path` and apply them. Missing or malformed files
    /// fall back to defaults.
    ///
    /// The file is read inside the settings queue, so overlapping reloads
    /// take effect in the order they were requested.
    pub async fn reload_settings(&self, path: &Path) -> ColorizeResult<usize> {
        let path: PathBuf = path.to_path_buf();
        self.settings_queue()
            .submit(move |updater: &mut SettingsUpdater| {
                Box::pin(async move {
                    let settings = load_settings(&path).await;
                    updater.apply(settings).await
                })
            })
            .await?
    }

    /// Close every open document. Returns the number closed.
    pub async fn shutdown_all(&self) -> ColorizeResult<usize> {
        let mut closed = 0;
        for uri in &self.open_documents() {
            match self.close_document(uri).await {
                Ok(()) => closed += 1,
                // Closed concurrently
                Err(ColorizeError::DocumentNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(closed)
    }

    fn settings_queue(&self) -> &SerialExecutor<SettingsUpdater> {
        self.settings_queue.get_or_init(|| {
            SerialExecutor::spawn(SettingsUpdater {
                settings: self.settings.clone(),
                documents: self.documents.clone(),
                resolver: self.resolver.clone(),
            })
        })
    }

    /// Queue `f` on the executor of `uri`.
    ///
    /// The map guard is released before the caller awaits the handle.
    fn dispatch<R, F>(&self, uri: &Url, f: F) -> ColorizeResult<TaskHandle<R>>
    where
        R: Send + 'static,
        F: FnOnce(&mut DocumentColorizer) -> R + Send + 'static,
    {
        let executor = self
            .documents
            .get(uri)
            .ok_or_else(|| ColorizeError::document_not_found(uri.as_str()))?;
        Ok(executor.run(f))
    }
}

/// Applies settings changes. Lives on its own executor.
struct SettingsUpdater {
    settings: Arc<ArcSwap<ColorizationSettings>>,
    documents: Arc<DocumentMap>,
    resolver: Option<Arc<dyn StyleResolver>>,
}

impl SettingsUpdater {
    async fn apply(&mut self, settings: ColorizationSettings) -> ColorizeResult<usize> {
        let settings = Arc::new(settings);
        self.settings.store(settings.clone());

        let handles: Vec<TaskHandle<()>> = self
            .documents
            .iter()
            .map(|entry| {
                let settings = settings.clone();
                let resolver = resolver_for(self.resolver.as_ref(), &settings);
                entry.value().run(move |document| {
                    document.apply_settings(settings, resolver.as_ref())
                })
            })
            .collect();

        let updated = handles.len();
        for handle in handles {
            handle.await?;
        }
        log::info!(
            target: LOG_TARGET,
            "Applied settings to {} open documents",
            updated
        );
        Ok(updated)
    }
}

fn resolver_for(
    custom: Option<&Arc<dyn StyleResolver>>,
    settings: &ColorizationSettings,
) -> Arc<dyn StyleResolver> {
    match custom {
        Some(resolver) => resolver.clone(),
        None => Arc::new(SettingsStyleResolver::new(settings)),
    }
}

impl std::fmt::Debug for ColorizationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorizationService")
            .field("documents", &self.documents.len())
            .field("custom_resolver", &self.resolver.is_some())
            .finish()
    }
}
