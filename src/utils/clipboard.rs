//! System clipboard access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Clipboard errors
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("Clipboard write failed: {0}")]
    Write(String),
}

/// Somewhere text can be copied to
pub trait Clipboard: std::fmt::Debug {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;

    /// Whether copied text disappears once this process exits
    fn needs_handoff(&self) -> bool {
        false
    }

    /// Block until another program owns the copied text.
    ///
    /// Returns at once where the platform keeps clipboard contents alive
    /// on its own.
    fn wait_for_handoff(&mut self) -> Result<(), ClipboardError> {
        Ok(())
    }
}

/// The desktop clipboard via `arboard`.
///
/// The handle is opened lazily and kept for the life of the value. On
/// Linux the contents live only as long as their owner, so a short-lived
/// process calls [`Clipboard::wait_for_handoff`] before exiting.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
    last: Option<String>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn open(&mut self) -> Result<&mut arboard::Clipboard, ClipboardError> {
        if self.inner.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.inner = Some(clipboard);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| ClipboardError::Unavailable("not initialised".to_string()))
    }
}

impl std::fmt::Debug for SystemClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemClipboard")
            .field("open", &self.inner.is_some())
            .finish()
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.open()?
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Write(e.to_string()))?;
        self.last = Some(text.to_string());
        Ok(())
    }

    fn needs_handoff(&self) -> bool {
        cfg!(target_os = "linux") && self.last.is_some()
    }

    #[cfg(target_os = "linux")]
    fn wait_for_handoff(&mut self) -> Result<(), ClipboardError> {
        use arboard::SetExtLinux;

        let Some(text) = self.last.take() else {
            return Ok(());
        };
        tracing::debug!("holding clipboard contents until another program takes them");
        self.open()?
            .set()
            .wait()
            .text(text)
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

/// Records writes in memory, optionally failing. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    writes: Arc<Mutex<Vec<String>>>,
    handoffs: Arc<AtomicUsize>,
    fail: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard whose every write fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Every text written so far, oldest first.
    pub fn writes(&self) -> Vec<String> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times a handoff was awaited.
    pub fn handoffs(&self) -> usize {
        self.handoffs.load(Ordering::SeqCst)
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Write("write rejected".to_string()));
        }
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
        Ok(())
    }

    fn needs_handoff(&self) -> bool {
        !self.writes().is_empty()
    }

    fn wait_for_handoff(&mut self) -> Result<(), ClipboardError> {
        self.handoffs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
