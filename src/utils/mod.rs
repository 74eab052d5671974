//! Utility modules supporting lookups and the presentation layer.
//!
//! - [`HttpClient`]: shared HTTP client built from the `[http]` config section
//! - [`cite`]: display formatting for parsed BibTeX fields
//! - [`PreferenceStore`]: persistent key-value preferences (theme)
//! - [`Clipboard`]: clipboard access, backed by the system clipboard
//!
//! # Formatting authors
//!
//! ```rust
//! use doibib::utils::cite::format_authors;
//!
//! assert_eq!(format_authors("Smith, John and Doe, Jane"), "John Smith, Jane Doe");
//! ```

pub mod cite;
mod clipboard;
mod http;
mod prefs;

pub use clipboard::{Clipboard, ClipboardError, MemoryClipboard, SystemClipboard};
pub use http::HttpClient;
pub use prefs::{FilePreferenceStore, MemoryPreferenceStore, PreferenceError, PreferenceStore};
