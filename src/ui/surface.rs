//! The display state the controller drives.
//!
//! A [`Surface`] holds everything a front end shows: the input, the fetch
//! trigger, the raw BibTeX output, the status line, the article block, the
//! copy control and the theme. Front ends render snapshots of it.

use serde::Serialize;

use crate::lookup::Record;
use crate::models::ArticleSummary;
use crate::ui::Theme;

pub const FETCH_LABEL: &str = "Get BibTeX";
pub const FETCHING_LABEL: &str = "Fetching...";

pub const COPY_LABEL: &str = "Copy";
pub const COPIED_LABEL: &str = "Copied!";
pub const COPY_FAILED_LABEL: &str = "Failed";
pub const COPY_ARIA_LABEL: &str = "Copy BibTeX to clipboard";
pub const COPIED_ARIA_LABEL: &str = "Copied to clipboard";

pub const NOTHING_TO_COPY: &str = "Nothing to copy";
pub const COPIED_STATUS: &str = "BibTeX copied to clipboard";
pub const COPY_FAILED_STATUS: &str = "Failed to copy to clipboard";

/// The fetch button
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trigger {
    pub label: String,
    pub enabled: bool,
    pub cooling_down: bool,
}

impl Trigger {
    pub fn ready() -> Self {
        Self {
            label: FETCH_LABEL.to_string(),
            enabled: true,
            cooling_down: false,
        }
    }

    pub fn fetching() -> Self {
        Self {
            label: FETCHING_LABEL.to_string(),
            enabled: false,
            cooling_down: false,
        }
    }

    pub fn cooldown(remaining_secs: u64) -> Self {
        Self {
            label: format!("Wait {}s", remaining_secs),
            enabled: false,
            cooling_down: true,
        }
    }
}

impl Default for Trigger {
    fn default() -> Self {
        Self::ready()
    }
}

/// The copy button and its status line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyControl {
    pub label: String,
    pub aria_label: String,
    pub copied: bool,
    pub status: String,
}

impl CopyControl {
    /// Restore the idle label. The status line is left as is.
    pub fn revert(&mut self) {
        self.label = COPY_LABEL.to_string();
        self.aria_label = COPY_ARIA_LABEL.to_string();
        self.copied = false;
    }
}

impl Default for CopyControl {
    fn default() -> Self {
        Self {
            label: COPY_LABEL.to_string(),
            aria_label: COPY_ARIA_LABEL.to_string(),
            copied: false,
            status: String::new(),
        }
    }
}

/// Structured article fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArticleView {
    pub visible: bool,
    pub title: String,
    pub authors: String,
    pub journal: String,
    pub date: String,
    pub abstract_text: String,
}

impl ArticleView {
    /// A visible block for `summary` with no abstract yet
    pub fn from_summary(summary: &ArticleSummary) -> Self {
        Self {
            visible: true,
            title: summary.title.clone(),
            authors: summary.authors.clone(),
            journal: summary.journal.clone(),
            date: summary.date.clone(),
            abstract_text: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Surface {
    pub input: String,
    pub trigger: Trigger,
    pub output: String,
    pub error: String,
    pub copy: CopyControl,
    pub article: ArticleView,
    pub theme: Theme,
}

impl Surface {
    pub fn new(theme: Theme) -> Self {
        Self {
            input: String::new(),
            trigger: Trigger::ready(),
            output: String::new(),
            error: String::new(),
            copy: CopyControl::default(),
            article: ArticleView::default(),
            theme,
        }
    }

    /// Blank the status line, the BibTeX output and the article block
    pub fn clear_results(&mut self) {
        self.error.clear();
        self.output.clear();
        self.article = ArticleView::default();
    }

    /// Show a fetched record; the abstract follows separately
    pub fn show_record(&mut self, record: &Record) {
        self.output = record.bibtex.clone();
        self.article = ArticleView::from_summary(&record.summary);
    }

    pub fn show_abstract(&mut self, text: &str) {
        self.article.abstract_text = text.to_string();
    }
}
