//! # doibib
//!
//! Turn a DOI, or any text containing one, into its BibTeX record, a
//! readable article summary and, when one can be found, its abstract.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: DOI extraction and BibTeX field parsing
//! - [`sources`]: doi.org, Semantic Scholar and Crossref behind a common trait
//! - [`lookup`]: the pipeline from input text to a finished result
//! - [`ui`]: display state, its controller and terminal rendering
//! - [`utils`]: HTTP client, citation formatting, preferences and clipboard
//! - [`config`]: Configuration management

pub mod config;
pub mod lookup;
pub mod models;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use lookup::{Lookup, LookupError, LookupResult};
pub use models::{extract_doi, parse_bibtex, Doi};
pub use sources::{Source, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
