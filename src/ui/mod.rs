//! Presentation layer: the display state, its controller and terminal rendering.
//!
//! [`Controller`] drives a [`Surface`]; [`Renderer`] turns surface snapshots
//! into colored terminal text using a palette chosen by the active [`Theme`].

mod controller;
mod surface;
mod theme;

pub use controller::{Controller, CopyOutcome, SubmitOutcome, Timings};
pub use surface::{
    ArticleView, CopyControl, Surface, Trigger, COPIED_ARIA_LABEL, COPIED_LABEL, COPIED_STATUS,
    COPY_ARIA_LABEL, COPY_FAILED_LABEL, COPY_FAILED_STATUS, COPY_LABEL, FETCHING_LABEL,
    FETCH_LABEL, NOTHING_TO_COPY,
};
pub use theme::{
    colorfgbg_is_dark, has_stored_preference, initial_theme, stored_theme, Appearance,
    EnvAppearance, Theme, THEME_KEY,
};

use owo_colors::{OwoColorize, Style};
use std::io::IsTerminal;
use std::time::Duration;

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Pending,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Pending => "○",
    }
}

/// Text roles the palette assigns styles to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Heading,
    Label,
    Title,
    Muted,
    Status(Status),
}

/// Styles for one theme
fn palette(theme: Theme, role: Role) -> Style {
    let style = Style::new();
    match (theme, role) {
        (Theme::Dark, Role::Heading) => style.bold().bright_cyan(),
        (Theme::Light, Role::Heading) => style.bold().blue(),
        (Theme::Dark, Role::Label) => style.bright_white().bold(),
        (Theme::Light, Role::Label) => style.black().bold(),
        (Theme::Dark, Role::Title) => style.bright_yellow().bold(),
        (Theme::Light, Role::Title) => style.magenta().bold(),
        (_, Role::Muted) => style.dimmed(),
        (_, Role::Status(Status::Success)) => style.green().bold(),
        (_, Role::Status(Status::Error)) => style.red().bold(),
        (_, Role::Status(Status::Warning)) => style.yellow().bold(),
        (Theme::Dark, Role::Status(Status::Info)) => style.bright_cyan().bold(),
        (Theme::Light, Role::Status(Status::Info)) => style.cyan().bold(),
        (_, Role::Status(Status::Pending)) => style.dimmed(),
    }
}

/// Renders surfaces and messages as terminal text
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    theme: Theme,
    color: bool,
}

impl Renderer {
    pub fn new(theme: Theme, color: bool) -> Self {
        Self { theme, color }
    }

    /// Color only when stdout is a terminal
    pub fn for_stdout(theme: Theme) -> Self {
        Self::new(theme, is_terminal())
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    fn paint(&self, text: &str, role: Role) -> String {
        if self.color {
            text.style(palette(self.theme, role)).to_string()
        } else {
            text.to_string()
        }
    }

    /// A status line with its icon
    pub fn status(&self, status: Status, msg: &str) -> String {
        format!("{} {}", self.paint(status_icon(status), Role::Status(status)), msg)
    }

    /// A section header
    pub fn section(&self, title: &str) -> String {
        self.paint(&format!("━━━ {} ━━━", title), Role::Heading)
    }

    /// The article block; empty fields are skipped
    pub fn article(&self, article: &ArticleView) -> String {
        let mut lines = Vec::new();
        if !article.title.is_empty() {
            lines.push(self.paint(&article.title, Role::Title));
        }
        for (label, value) in [
            ("Authors", &article.authors),
            ("Journal", &article.journal),
            ("Date", &article.date),
        ] {
            if !value.is_empty() {
                lines.push(format!("{} {}", self.paint(&format!("{}:", label), Role::Label), value));
            }
        }
        if !article.abstract_text.is_empty() {
            lines.push(String::new());
            lines.push(self.paint("Abstract:", Role::Label));
            lines.push(article.abstract_text.clone());
        }
        lines.join("\n")
    }

    /// Error line, article, BibTeX and copy status; skips the trigger
    pub fn results(&self, surface: &Surface) -> String {
        self.result_blocks(surface).join("\n\n")
    }

    /// Everything the surface currently shows
    pub fn surface(&self, surface: &Surface) -> String {
        let mut blocks = self.result_blocks(surface);
        let trigger = if surface.trigger.enabled {
            self.status(Status::Info, &surface.trigger.label)
        } else {
            self.status(Status::Pending, &self.paint(&surface.trigger.label, Role::Muted))
        };
        blocks.push(trigger);
        blocks.join("\n\n")
    }

    fn result_blocks(&self, surface: &Surface) -> Vec<String> {
        let mut blocks = Vec::new();
        if !surface.error.is_empty() {
            blocks.push(self.status(Status::Error, &surface.error));
        }
        if surface.article.visible {
            blocks.push(self.section("Article"));
            blocks.push(self.article(&surface.article));
        }
        if !surface.output.is_empty() {
            blocks.push(self.section("BibTeX"));
            blocks.push(surface.output.trim_end().to_string());
        }
        if !surface.copy.status.is_empty() {
            let status = if surface.copy.copied {
                Status::Success
            } else if surface.copy.label == COPY_FAILED_LABEL {
                Status::Error
            } else {
                Status::Info
            };
            blocks.push(self.status(status, &surface.copy.status));
        }
        blocks
    }
}

/// Print a loading spinner with message.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// A spinner that draws nothing, for quiet or non-terminal output.
    pub fn hidden() -> Self {
        Self {
            pb: indicatif::ProgressBar::hidden(),
        }
    }

    /// Remove the spinner from the terminal.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}
