//! Owned sets of render handles.

use std::sync::Arc;

use super::sink::{PaintPrecedence, RenderHandle, RenderSink, RenderStyle};
use crate::config::ColorizationSettings;
use crate::domain::{Category, StyleTable};

/// Render handles for one document: one per category plus one for
/// inactive regions, each enabled by configuration.
///
/// Handles are released on [`HandleSet::dispose`] or on drop, whichever
/// comes first. Disposal is idempotent.
pub struct HandleSet {
    sink: Arc<dyn RenderSink>,
    /// In creation order
    tokens: Vec<(Category, RenderHandle)>,
    inactive: Option<RenderHandle>,
}

impl HandleSet {
    /// A set holding no handles.
    pub fn empty(sink: Arc<dyn RenderSink>) -> Self {
        Self {
            sink,
            tokens: Vec::new(),
            inactive: None,
        }
    }

    /// Create every handle `settings` asks for.
    ///
    /// Category handles are created so that smaller ordinals take precedence
    /// under the sink's [`PaintPrecedence`].
    pub fn create(
        sink: Arc<dyn RenderSink>,
        settings: &ColorizationSettings,
        styles: &StyleTable,
    ) -> Self {
        let mut set = Self::empty(sink);

        if settings.token_colorization_enabled() {
            let order: Vec<Category> = match set.sink.precedence() {
                PaintPrecedence::LastCreatedWins => Category::ALL.iter().rev().copied().collect(),
                PaintPrecedence::FirstCreatedWins => Category::ALL.to_vec(),
            };
            for category in order {
                let handle = set.sink.create_handle(&RenderStyle::Token {
                    category,
                    style: styles.get(category).clone(),
                });
                set.tokens.push((category, handle));
            }
        }

        if settings.inactive_dimming_enabled() {
            set.inactive = Some(set.sink.create_handle(&RenderStyle::Inactive {
                opacity: settings.inactive_opacity(),
                foreground: settings.inactive_region_foreground.clone(),
                background: settings.inactive_region_background.clone(),
            }));
        }

        set
    }

    pub fn tokens(&self) -> &[(Category, RenderHandle)] {
        &self.tokens
    }

    pub fn inactive(&self) -> Option<RenderHandle> {
        self.inactive
    }

    pub fn len(&self) -> usize {
        self.tokens.len() + usize::from(self.inactive.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release every handle. Calling this again does nothing.
    pub fn dispose(&mut self) {
        for (_, handle) in self.tokens.drain(..) {
            self.sink.dispose_handle(handle);
        }
        if let Some(handle) = self.inactive.take() {
            self.sink.dispose_handle(handle);
        }
    }
}

impl Drop for HandleSet {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for HandleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleSet")
            .field("tokens", &self.tokens.len())
            .field("inactive", &self.inactive)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisEngine;
    use crate::presentation::sink::{RecordingSink, SinkCall};

    fn create(sink: &Arc<RecordingSink>, settings: &ColorizationSettings) -> HandleSet {
        HandleSet::create(sink.clone(), settings, &StyleTable::default())
    }

    #[test]
    fn test_create_one_handle_per_category_plus_inactive() {
        let sink = Arc::new(RecordingSink::new());
        let set = create(&sink, &ColorizationSettings::default());

        assert_eq!(set.tokens().len(), Category::COUNT);
        assert!(set.inactive().is_some());
        assert_eq!(sink.live_handles().len(), Category::COUNT + 1);
    }

    #[test]
    fn test_last_created_wins_creates_highest_ordinal_first() {
        let sink = Arc::new(RecordingSink::new());
        let set = create(&sink, &ColorizationSettings::default());

        assert_eq!(set.tokens().first().map(|(c, _)| *c), Some(Category::XmlDocTag));
        assert_eq!(set.tokens().last().map(|(c, _)| *c), Some(Category::Macro));
    }

    #[test]
    fn test_first_created_wins_creates_lowest_ordinal_first() {
        let sink = Arc::new(RecordingSink::with_precedence(
            PaintPrecedence::FirstCreatedWins,
        ));
        let set = create(&sink, &ColorizationSettings::default());

        assert_eq!(set.tokens().first().map(|(c, _)| *c), Some(Category::Macro));
    }

    #[test]
    fn test_disabled_flags_create_no_token_handles() {
        let sink = Arc::new(RecordingSink::new());
        let settings = ColorizationSettings {
            analysis_engine: AnalysisEngine::TagParser,
            dim_inactive_regions: false,
            ..Default::default()
        };

        let set = create(&sink, &settings);
        assert!(set.is_empty());

        let settings = ColorizationSettings {
            enhanced_colorization: false,
            ..Default::default()
        };
        let set = create(&sink, &settings);
        assert!(set.tokens().is_empty());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_dispose_is_idempotent_and_runs_on_drop() {
        let sink = Arc::new(RecordingSink::new());
        let mut set = create(&sink, &ColorizationSettings::default());

        set.dispose();
        set.dispose();
        drop(set);

        let disposals = sink
            .calls()
            .iter()
            .filter(|call| matches!(call, SinkCall::Dispose { .. }))
            .count();
        assert_eq!(disposals, Category::COUNT + 1);
        assert!(sink.live_handles().is_empty());

        let set = create(&sink, &ColorizationSettings::default());
        drop(set);
        assert!(sink.live_handles().is_empty());
    }
}
