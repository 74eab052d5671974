//! Mock sources for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::models::Doi;
use crate::sources::{Source, SourceCapabilities, SourceError};

/// How a [`MockBibtexSource`] answers.
#[derive(Debug, Clone)]
enum BibtexReply {
    Record(String),
    Status(u16),
    Network(String),
}

/// A BibTeX source that returns a predefined record or failure.
#[derive(Debug)]
pub struct MockBibtexSource {
    reply: Mutex<BibtexReply>,
    calls: AtomicUsize,
}

impl MockBibtexSource {
    /// Create a mock that returns an empty record.
    pub fn new() -> Self {
        Self {
            reply: Mutex::new(BibtexReply::Record(String::new())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Return `bibtex` on every fetch.
    pub fn with_record(self, bibtex: &str) -> Self {
        self.set_reply(BibtexReply::Record(bibtex.to_string()));
        self
    }

    /// Fail every fetch with an HTTP status.
    pub fn with_status(self, status: u16) -> Self {
        self.set_reply(BibtexReply::Status(status));
        self
    }

    /// Fail every fetch with a transport error.
    pub fn with_network_error(self, message: &str) -> Self {
        self.set_reply(BibtexReply::Network(message.to_string()));
        self
    }

    /// Number of fetches made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set_reply(&self, reply: BibtexReply) {
        let mut guard = self.reply.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = reply;
    }
}

impl Default for MockBibtexSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Source for MockBibtexSource {
    fn id(&self) -> &str {
        "mock-bibtex"
    }

    fn name(&self) -> &str {
        "Mock BibTeX Source"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::BIBTEX
    }

    async fn fetch_bibtex(&self, _doi: &Doi) -> Result<String, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.reply.lock().unwrap_or_else(PoisonError::into_inner).clone();
        match reply {
            BibtexReply::Record(text) => Ok(text),
            BibtexReply::Status(code) => Err(SourceError::Status(code)),
            BibtexReply::Network(message) => Err(SourceError::Network(message)),
        }
    }
}

/// An abstract source that returns a predefined abstract, or nothing.
#[derive(Debug)]
pub struct MockAbstractSource {
    id: String,
    text: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl MockAbstractSource {
    /// Create a mock that finds no abstract.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            text: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Return `text` on every fetch.
    pub fn with_abstract(self, text: &str) -> Self {
        *self.text.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_string());
        self
    }

    /// Number of fetches made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for MockAbstractSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Mock Abstract Source"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::ABSTRACT
    }

    async fn fetch_abstract(&self, _doi: &Doi) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
