//! Transient status line shown after each user action.
use std::sync::{Mutex, PoisonError};
use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

/// Holds at most one banner; a newer one replaces the old, and each
/// disappears `ttl` after it was shown.
pub struct BannerSlot {
    ttl: Duration,
    current: Mutex<Option<(Banner, Instant)>>,
}

impl BannerSlot {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            current: Mutex::new(None),
        }
    }

    pub fn show(&self, kind: BannerKind, text: impl Into<String>) {
        let banner = Banner {
            kind,
            text: text.into(),
        };
        match kind {
            BannerKind::Error => tracing::warn!(text = %banner.text, "ui.banner"),
            _ => tracing::info!(text = %banner.text, "ui.banner"),
        }
        *self.lock() = Some((banner, Instant::now()));
    }

    pub fn success(&self, text: impl Into<String>) {
        self.show(BannerKind::Success, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.show(BannerKind::Error, text);
    }

    pub fn info(&self, text: impl Into<String>) {
        self.show(BannerKind::Info, text);
    }

    /// The visible banner, if it has not expired yet.
    pub fn current(&self) -> Option<Banner> {
        let mut slot = self.lock();
        let expired = slot
            .as_ref()
            .is_some_and(|(_, shown)| shown.elapsed() >= self.ttl);
        if expired {
            *slot = None;
        }
        slot.as_ref().map(|(banner, _)| banner.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<(Banner, Instant)>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
