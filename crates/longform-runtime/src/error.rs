#![forbid(unsafe_code)]

//! Media playback failures.
//!
//! None of these interrupt the story. Callers log them and carry on; the
//! ambient track retries on the next user gesture.

/// Why a `play()` request did not start playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// The platform refused unattended playback.
    AutoplayRejected,
    /// The media failed to load or has no source.
    MediaUnavailable(String),
    /// The media has not buffered enough to start.
    NotReady,
}

impl PlaybackError {
    /// Whether a later user gesture can be expected to succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::MediaUnavailable(_))
    }
}

impl std::fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AutoplayRejected => write!(f, "autoplay rejected by the platform"),
            Self::MediaUnavailable(reason) => write!(f, "media unavailable: {reason}"),
            Self::NotReady => write!(f, "media not ready"),
        }
    }
}

impl std::error::Error for PlaybackError {}
