//! Readiness probes evaluated by the container runtime after start.

use std::time::Duration;

/// Output stream a readiness message is expected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
    Either
}

/// Condition a container must meet before it counts as started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessProbe {
    /// Every message has appeared in the container output. Services log
    /// these once they accept connections on their ports.
    LogMessages {
        messages: Vec<(LogStream, String)>,
        timeout: Duration
    },

    /// `GET path` on the mapped `port` answers with `status`.
    Http {
        port: u16,
        path: String,
        status: u16,
        timeout: Duration
    }
}

impl ReadinessProbe {
    pub fn log_messages<S>(
        messages: impl IntoIterator<Item = (LogStream, S)>,
        timeout: Duration
    ) -> Self
    where
        S: Into<String>
    {
        Self::LogMessages {
            messages: messages
                .into_iter()
                .map(|(stream, message)| (stream, message.into()))
                .collect(),
            timeout
        }
    }

    /// HTTP probe expecting `200 OK`.
    pub fn http_ok(port: u16, path: impl Into<String>, timeout: Duration) -> Self {
        Self::Http {
            port,
            path: path.into(),
            status: 200,
            timeout
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        match self {
            Self::LogMessages { timeout, .. } | Self::Http { timeout, .. } => *timeout
        }
    }
}
