//! The connection stage of a [`Shard`](crate::Shard).

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Current connection stage of a shard's session.
///
/// Transitions strictly follow `Disconnected -> Connecting -> Identifying |
/// Resuming -> Running -> Closing -> Disconnected`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Stage {
    /// No socket is open; the shard is idle or has exhausted its retries.
    Disconnected,
    /// A socket is open, waiting for `Hello`.
    Connecting,
    /// `Hello` was received; sending `Identify` and awaiting `Ready`.
    Identifying,
    /// `Hello` was received; sending `Resume` and awaiting `Resumed`.
    Resuming,
    /// `Ready` or `Resumed` was received; dispatch events are flowing.
    Running,
    /// The shard was told to shut down and is draining outstanding work.
    Closing,
}

impl Default for Stage {
    fn default() -> Self {
        Self::Disconnected
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Identifying => "Identifying",
            Self::Resuming => "Resuming",
            Self::Running => "Running",
            Self::Closing => "Closing",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Stage;

    #[test]
    fn default_stage_is_disconnected() {
        assert_eq!(Stage::Disconnected, Stage::default());
    }

    #[test]
    fn formatting() {
        assert_eq!("Running", Stage::Running.to_string());
        assert_eq!("Closing", Stage::Closing.to_string());
    }
}
