//! Drives a [`Surface`] through the fetch, copy and theme workflows.
//!
//! The controller owns the surface behind `Arc<Mutex<_>>` so the cooldown
//! and copy-revert timers can update it from their own tasks. Methods that
//! start timers must be called from within a tokio runtime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::UiConfig;
use crate::lookup::{resolve_input, InputError, Lookup, LookupResult};
use crate::sources::SourceError;
use crate::ui::surface::{
    Surface, Trigger, COPIED_ARIA_LABEL, COPIED_LABEL, COPIED_STATUS, COPY_FAILED_LABEL,
    COPY_FAILED_STATUS, NOTHING_TO_COPY,
};
use crate::ui::theme::{has_stored_preference, initial_theme, Theme, THEME_KEY};
use crate::utils::{Clipboard, ClipboardError, PreferenceError, PreferenceStore};

/// Timer durations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// How long the trigger stays disabled after a successful fetch
    pub cooldown: Duration,
    /// How long the copy label shows `Copied!`
    pub copy_revert: Duration,
}

impl Timings {
    pub fn from_config(ui: &UiConfig) -> Self {
        Self {
            cooldown: Duration::from_secs(ui.cooldown_secs),
            copy_revert: Duration::from_secs(ui.copy_revert_secs),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(10),
            copy_revert: Duration::from_secs(2),
        }
    }
}

/// What a submit did
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The trigger was disabled; nothing happened
    Busy,
    /// The input was empty or held no DOI
    Rejected(InputError),
    /// The BibTeX fetch failed
    Failed(SourceError),
    Fetched(Box<LookupResult>),
}

/// What a copy did
#[derive(Debug)]
pub enum CopyOutcome {
    NothingToCopy,
    Copied,
    Failed(ClipboardError),
}

#[derive(Debug)]
pub struct Controller {
    surface: Arc<Mutex<Surface>>,
    lookup: Lookup,
    clipboard: Box<dyn Clipboard>,
    prefs: Box<dyn PreferenceStore>,
    timings: Timings,
    cooldown_task: Option<JoinHandle<()>>,
    copy_revert_task: Option<JoinHandle<()>>,
}

fn lock(surface: &Mutex<Surface>) -> MutexGuard<'_, Surface> {
    surface.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Controller {
    /// Create a controller. The theme comes from `prefs` when stored,
    /// otherwise from `system_prefers_dark` without being persisted.
    /// A stored value that is neither `dark` nor `light` is discarded.
    pub fn new(
        lookup: Lookup,
        clipboard: Box<dyn Clipboard>,
        mut prefs: Box<dyn PreferenceStore>,
        system_prefers_dark: bool,
        timings: Timings,
    ) -> Self {
        if prefs.get(THEME_KEY).is_some() && !has_stored_preference(prefs.as_ref()) {
            if let Err(e) = prefs.remove(THEME_KEY) {
                tracing::warn!(error = %e, "failed to discard unrecognised theme preference");
            }
        }
        let theme = initial_theme(prefs.as_ref(), system_prefers_dark);
        Self {
            surface: Arc::new(Mutex::new(Surface::new(theme))),
            lookup,
            clipboard,
            prefs,
            timings,
            cooldown_task: None,
            copy_revert_task: None,
        }
    }

    /// Snapshot of the current display state
    pub fn surface(&self) -> Surface {
        lock(&self.surface).clone()
    }

    pub fn theme(&self) -> Theme {
        lock(&self.surface).theme
    }

    pub fn is_ready(&self) -> bool {
        lock(&self.surface).trigger.enabled
    }

    /// Run a lookup for `input` and show the result.
    ///
    /// Results are cleared first. Input errors leave the trigger alone.
    /// A fetch failure re-enables the trigger at once; a success starts
    /// the cooldown.
    pub async fn submit(&mut self, input: &str) -> SubmitOutcome {
        {
            let mut surface = lock(&self.surface);
            if !surface.trigger.enabled {
                tracing::debug!("submit ignored while trigger is disabled");
                return SubmitOutcome::Busy;
            }
            surface.input = input.to_string();
            surface.clear_results();
        }

        let doi = match resolve_input(input) {
            Ok(doi) => doi,
            Err(e) => {
                lock(&self.surface).error = e.to_string();
                return SubmitOutcome::Rejected(e);
            }
        };

        lock(&self.surface).trigger = Trigger::fetching();

        let record = match self.lookup.fetch_record(&doi).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(%doi, error = %e, "lookup failed");
                let mut surface = lock(&self.surface);
                surface.error = e.to_string();
                surface.trigger = Trigger::ready();
                return SubmitOutcome::Failed(e);
            }
        };
        lock(&self.surface).show_record(&record);

        let abstract_text = self.lookup.fetch_abstract(&doi).await;
        let result = LookupResult {
            record,
            abstract_text,
        };
        lock(&self.surface).show_abstract(result.abstract_or_placeholder());

        self.start_cooldown();
        SubmitOutcome::Fetched(Box::new(result))
    }

    fn start_cooldown(&mut self) {
        let total = self.timings.cooldown.as_secs();
        if total == 0 {
            lock(&self.surface).trigger = Trigger::ready();
            return;
        }
        lock(&self.surface).trigger = Trigger::cooldown(total);

        if let Some(previous) = self.cooldown_task.take() {
            previous.abort();
        }
        let surface = Arc::clone(&self.surface);
        let second = Duration::from_secs(1);
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + second, second);
        self.cooldown_task = Some(tokio::spawn(async move {
            let mut remaining = total;
            loop {
                ticker.tick().await;
                remaining -= 1;
                let mut surface = lock(&surface);
                if remaining == 0 {
                    surface.trigger = Trigger::ready();
                    break;
                }
                surface.trigger = Trigger::cooldown(remaining);
            }
        }));
    }

    /// Copy the BibTeX output to the clipboard
    pub fn copy_output(&mut self) -> CopyOutcome {
        let text = {
            let mut surface = lock(&self.surface);
            if surface.output.is_empty() {
                surface.copy.status = NOTHING_TO_COPY.to_string();
                return CopyOutcome::NothingToCopy;
            }
            surface.output.clone()
        };

        if let Err(e) = self.clipboard.set_text(&text) {
            tracing::warn!(error = %e, "clipboard write failed");
            let mut surface = lock(&self.surface);
            surface.copy.status = COPY_FAILED_STATUS.to_string();
            surface.copy.label = COPY_FAILED_LABEL.to_string();
            return CopyOutcome::Failed(e);
        }

        {
            let mut surface = lock(&self.surface);
            surface.copy.label = COPIED_LABEL.to_string();
            surface.copy.aria_label = COPIED_ARIA_LABEL.to_string();
            surface.copy.copied = true;
            surface.copy.status = COPIED_STATUS.to_string();
        }

        if let Some(pending) = self.copy_revert_task.take() {
            pending.abort();
        }
        let surface = Arc::clone(&self.surface);
        let revert = tokio::time::sleep(self.timings.copy_revert);
        self.copy_revert_task = Some(tokio::spawn(async move {
            revert.await;
            lock(&surface).copy.revert();
        }));
        CopyOutcome::Copied
    }

    /// Whether the last copy is lost when this process exits
    pub fn needs_clipboard_handoff(&self) -> bool {
        self.clipboard.needs_handoff()
    }

    /// Block until another program owns the copied BibTeX
    pub fn wait_for_clipboard_handoff(&mut self) -> Result<(), ClipboardError> {
        self.clipboard.wait_for_handoff()
    }

    fn apply_theme(&self, theme: Theme) {
        lock(&self.surface).theme = theme;
    }

    /// Flip the theme and persist the choice
    pub fn toggle_theme(&mut self) -> Result<Theme, PreferenceError> {
        let theme = self.theme().toggled();
        self.apply_theme(theme);
        self.prefs.set(THEME_KEY, theme.as_str())?;
        tracing::debug!(%theme, "theme toggled");
        Ok(theme)
    }

    /// Follow the environment's preference unless the user pinned a theme
    pub fn on_environment_change(&mut self, prefers_dark: bool) -> Theme {
        if !has_stored_preference(self.prefs.as_ref()) {
            self.apply_theme(Theme::from_prefers_dark(prefers_dark));
        }
        self.theme()
    }

    /// Forget the pinned theme and follow the environment again
    pub fn reset_theme(&mut self, system_prefers_dark: bool) -> Result<Theme, PreferenceError> {
        self.prefs.remove(THEME_KEY)?;
        let theme = Theme::from_prefers_dark(system_prefers_dark);
        self.apply_theme(theme);
        Ok(theme)
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        for task in [self.cooldown_task.take(), self.copy_revert_task.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{MockAbstractSource, MockBibtexSource, ABSTRACT_PLACEHOLDER};
    use crate::ui::surface::{COPY_ARIA_LABEL, COPY_LABEL, FETCH_LABEL};
    use crate::utils::{MemoryClipboard, MemoryPreferenceStore};

    const BIBTEX: &str = "@article{x, title = {Foo}, author = {Smith, John and Doe, Jane}, \
                          journal = {J. Test}, volume = {3}, year = {2020}}";

    struct Harness {
        controller: Controller,
        bibtex: Arc<MockBibtexSource>,
        abstracts: Arc<MockAbstractSource>,
        clipboard: MemoryClipboard,
        prefs: MemoryPreferenceStore,
    }

    fn harness_with(
        bibtex: MockBibtexSource,
        abstracts: MockAbstractSource,
        clipboard: MemoryClipboard,
        prefs: MemoryPreferenceStore,
        prefers_dark: bool,
    ) -> Harness {
        let bibtex = Arc::new(bibtex);
        let abstracts = Arc::new(abstracts);
        let lookup = Lookup::new(bibtex.clone(), vec![abstracts.clone()]);
        let controller = Controller::new(
            lookup,
            Box::new(clipboard.clone()),
            Box::new(prefs.clone()),
            prefers_dark,
            Timings::default(),
        );
        Harness {
            controller,
            bibtex,
            abstracts,
            clipboard,
            prefs,
        }
    }

    fn harness() -> Harness {
        harness_with(
            MockBibtexSource::new().with_record(BIBTEX),
            MockAbstractSource::new("abs").with_abstract("An abstract."),
            MemoryClipboard::new(),
            MemoryPreferenceStore::new(),
            false,
        )
    }

    // Timers fire on whole seconds; checks land between them
    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_submit_populates_surface() {
        let mut h = harness();
        let outcome = h.controller.submit("see https://doi.org/10.1000/xyz123").await;
        assert!(matches!(outcome, SubmitOutcome::Fetched(_)));

        let surface = h.controller.surface();
        assert_eq!(surface.output, BIBTEX);
        assert!(surface.error.is_empty());
        assert!(surface.article.visible);
        assert_eq!(surface.article.title, "Foo");
        assert_eq!(surface.article.authors, "John Smith, Jane Doe");
        assert_eq!(surface.article.journal, "J. Test, vol. 3");
        assert_eq!(surface.article.date, "2020");
        assert_eq!(surface.article.abstract_text, "An abstract.");
        assert_eq!(h.bibtex.calls(), 1);
        assert_eq!(h.abstracts.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_counts_down_each_second() {
        let mut h = harness();
        h.controller.submit("10.1000/xyz123").await;

        let surface = h.controller.surface();
        assert_eq!(surface.trigger.label, "Wait 10s");
        assert!(!surface.trigger.enabled);
        assert!(surface.trigger.cooling_down);

        sleep_ms(500).await;
        for remaining in (1..10).rev() {
            sleep_ms(1000).await;
            assert_eq!(
                h.controller.surface().trigger.label,
                format!("Wait {}s", remaining)
            );
        }

        sleep_ms(1000).await;
        let trigger = h.controller.surface().trigger;
        assert!(trigger.enabled);
        assert!(!trigger.cooling_down);
        assert_eq!(trigger.label, FETCH_LABEL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_during_cooldown_is_busy() {
        let mut h = harness();
        h.controller.submit("10.1000/xyz123").await;
        sleep_ms(3500).await;

        let outcome = h.controller.submit("10.1000/other").await;
        assert!(matches!(outcome, SubmitOutcome::Busy));
        assert_eq!(h.bibtex.calls(), 1);
        // The previous result stays on screen
        assert_eq!(h.controller.surface().output, BIBTEX);

        sleep_ms(7000).await;
        assert!(h.controller.is_ready());
        let outcome = h.controller.submit("10.1000/other").await;
        assert!(matches!(outcome, SubmitOutcome::Fetched(_)));
        assert_eq!(h.bibtex.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_reenables_immediately() {
        let mut h = harness_with(
            MockBibtexSource::new().with_status(404),
            MockAbstractSource::new("abs").with_abstract("unused"),
            MemoryClipboard::new(),
            MemoryPreferenceStore::new(),
            false,
        );

        let outcome = h.controller.submit("10.1000/missing").await;
        assert!(matches!(outcome, SubmitOutcome::Failed(SourceError::Status(404))));

        let surface = h.controller.surface();
        assert_eq!(surface.error, "Failed to fetch BibTeX: 404");
        assert!(surface.trigger.enabled);
        assert_eq!(surface.trigger.label, FETCH_LABEL);
        assert!(surface.output.is_empty());
        assert!(!surface.article.visible);
        assert_eq!(h.abstracts.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_errors_skip_network() {
        let mut h = harness();

        let outcome = h.controller.submit("   ").await;
        assert!(matches!(outcome, SubmitOutcome::Rejected(InputError::Empty)));
        assert_eq!(h.controller.surface().error, "Please enter a DOI");

        let outcome = h.controller.submit("no identifier here").await;
        assert!(matches!(outcome, SubmitOutcome::Rejected(InputError::NoDoi)));
        let surface = h.controller.surface();
        assert_eq!(surface.error, "No valid DOI found in input");
        assert!(surface.trigger.enabled);
        assert_eq!(surface.trigger.label, FETCH_LABEL);

        assert_eq!(h.bibtex.calls(), 0);
        assert_eq!(h.abstracts.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_placeholder_when_no_abstract() {
        let mut h = harness_with(
            MockBibtexSource::new().with_record(BIBTEX),
            MockAbstractSource::new("abs"),
            MemoryClipboard::new(),
            MemoryPreferenceStore::new(),
            false,
        );
        h.controller.submit("10.1000/xyz123").await;
        assert_eq!(
            h.controller.surface().article.abstract_text,
            ABSTRACT_PLACEHOLDER
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_with_empty_output() {
        let mut h = harness();
        assert!(matches!(h.controller.copy_output(), CopyOutcome::NothingToCopy));
        assert_eq!(h.controller.surface().copy.status, NOTHING_TO_COPY);
        assert!(h.clipboard.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_reverts_after_two_seconds() {
        let mut h = harness();
        h.controller.submit("10.1000/xyz123").await;

        assert!(matches!(h.controller.copy_output(), CopyOutcome::Copied));
        assert_eq!(h.clipboard.writes(), vec![BIBTEX.to_string()]);
        let copy = h.controller.surface().copy;
        assert_eq!(copy.label, COPIED_LABEL);
        assert_eq!(copy.aria_label, COPIED_ARIA_LABEL);
        assert!(copy.copied);
        assert_eq!(copy.status, COPIED_STATUS);

        sleep_ms(1500).await;
        assert_eq!(h.controller.surface().copy.label, COPIED_LABEL);

        sleep_ms(1000).await;
        let copy = h.controller.surface().copy;
        assert_eq!(copy.label, COPY_LABEL);
        assert_eq!(copy.aria_label, COPY_ARIA_LABEL);
        assert!(!copy.copied);
        assert_eq!(copy.status, COPIED_STATUS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_copy_restarts_revert_timer() {
        let mut h = harness();
        h.controller.submit("10.1000/xyz123").await;

        h.controller.copy_output();
        sleep_ms(1000).await;
        h.controller.copy_output();
        sleep_ms(1500).await;
        // The first timer would have fired here
        assert_eq!(h.controller.surface().copy.label, COPIED_LABEL);

        sleep_ms(1000).await;
        assert_eq!(h.controller.surface().copy.label, COPY_LABEL);
        assert_eq!(h.clipboard.writes().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_failure_has_no_revert() {
        let mut h = harness_with(
            MockBibtexSource::new().with_record(BIBTEX),
            MockAbstractSource::new("abs"),
            MemoryClipboard::failing(),
            MemoryPreferenceStore::new(),
            false,
        );
        h.controller.submit("10.1000/xyz123").await;

        assert!(matches!(h.controller.copy_output(), CopyOutcome::Failed(_)));
        let copy = h.controller.surface().copy;
        assert_eq!(copy.status, COPY_FAILED_STATUS);
        assert_eq!(copy.label, COPY_FAILED_LABEL);

        sleep_ms(5000).await;
        assert_eq!(h.controller.surface().copy.label, COPY_FAILED_LABEL);
    }

    #[tokio::test]
    async fn test_clipboard_handoff_after_copy() {
        let mut h = harness();
        assert!(!h.controller.needs_clipboard_handoff());

        h.controller.submit("10.1000/xyz123").await;
        h.controller.copy_output();
        assert!(h.controller.needs_clipboard_handoff());

        h.controller.wait_for_clipboard_handoff().unwrap();
        assert_eq!(h.clipboard.handoffs(), 1);
    }

    #[tokio::test]
    async fn test_initial_theme_follows_environment_without_persisting() {
        let h = harness_with(
            MockBibtexSource::new(),
            MockAbstractSource::new("abs"),
            MemoryClipboard::new(),
            MemoryPreferenceStore::new(),
            true,
        );
        assert_eq!(h.controller.theme(), Theme::Dark);
        assert_eq!(h.prefs.get(THEME_KEY), None);
    }

    #[tokio::test]
    async fn test_toggle_persists_and_pins() {
        let mut h = harness();
        assert_eq!(h.controller.theme(), Theme::Light);

        assert_eq!(h.controller.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(h.prefs.get(THEME_KEY).as_deref(), Some("dark"));

        // Pinned: environment changes are ignored
        assert_eq!(h.controller.on_environment_change(false), Theme::Dark);

        assert_eq!(h.controller.toggle_theme().unwrap(), Theme::Light);
        assert_eq!(h.prefs.get(THEME_KEY).as_deref(), Some("light"));
    }

    #[tokio::test]
    async fn test_environment_change_applies_when_unpinned() {
        let mut h = harness();
        assert_eq!(h.controller.on_environment_change(true), Theme::Dark);
        assert_eq!(h.controller.on_environment_change(false), Theme::Light);
        assert_eq!(h.prefs.get(THEME_KEY), None);
    }

    #[tokio::test]
    async fn test_stored_theme_wins_and_reset_unpins() {
        let mut prefs = MemoryPreferenceStore::new();
        prefs.set(THEME_KEY, "dark").unwrap();
        let mut h = harness_with(
            MockBibtexSource::new(),
            MockAbstractSource::new("abs"),
            MemoryClipboard::new(),
            prefs,
            false,
        );
        assert_eq!(h.controller.theme(), Theme::Dark);

        assert_eq!(h.controller.reset_theme(false).unwrap(), Theme::Light);
        assert_eq!(h.prefs.get(THEME_KEY), None);
        assert_eq!(h.controller.on_environment_change(true), Theme::Dark);
    }

    #[tokio::test]
    async fn test_unrecognised_stored_theme_is_discarded() {
        let mut prefs = MemoryPreferenceStore::new();
        prefs.set(THEME_KEY, "sepia").unwrap();
        let mut h = harness_with(
            MockBibtexSource::new(),
            MockAbstractSource::new("abs"),
            MemoryClipboard::new(),
            prefs,
            false,
        );
        assert_eq!(h.controller.theme(), Theme::Light);
        assert_eq!(h.prefs.get(THEME_KEY), None);

        // Still tracking the environment
        assert_eq!(h.controller.on_environment_change(true), Theme::Dark);
        assert_eq!(h.controller.on_environment_change(false), Theme::Light);
    }
}
