use std::fmt;

/// Machine-readable error codes for operator-facing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidServerUrl,
    InvalidFilterValue,
    EventNotFound,
    SnapshotFetchFailed,
    SnapshotStatusError,
    SnapshotDecodeFailed,
    SnapshotFileUnreadable,
    StreamConnectFailed,
    StreamTransportFailed,
    PayloadDecodeFailed,
    TerminalSetupFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidServerUrl => "E1002",
            Self::InvalidFilterValue => "E1003",
            Self::EventNotFound => "E2001",
            Self::SnapshotFetchFailed => "E3001",
            Self::SnapshotStatusError => "E3002",
            Self::SnapshotDecodeFailed => "E3003",
            Self::SnapshotFileUnreadable => "E3004",
            Self::StreamConnectFailed => "E4001",
            Self::StreamTransportFailed => "E4002",
            Self::PayloadDecodeFailed => "E5001",
            Self::TerminalSetupFailed => "E6001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidServerUrl => "Invalid server URL",
            Self::InvalidFilterValue => "Invalid filter value",
            Self::EventNotFound => "Event not found",
            Self::SnapshotFetchFailed => "Snapshot request failed",
            Self::SnapshotStatusError => "Snapshot endpoint returned an error status",
            Self::SnapshotDecodeFailed => "Snapshot response is not a JSON event array",
            Self::SnapshotFileUnreadable => "Snapshot file unreadable",
            Self::StreamConnectFailed => "Live feed connection failed",
            Self::StreamTransportFailed => "Live feed transport error",
            Self::PayloadDecodeFailed => "Event payload could not be decoded",
            Self::TerminalSetupFailed => "Terminal setup failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => {
                Some("Fix syntax in ~/.config/errorkube/config.toml (or the --config file) and retry.")
            }
            Self::InvalidServerUrl => {
                Some("Pass an absolute http(s) URL via --url or ERRORKUBE_URL.")
            }
            Self::InvalidFilterValue => Some("Use one of: all, 1h, 10h, 24h, 1w, 30d."),
            Self::EventNotFound => None,
            Self::SnapshotFetchFailed => {
                Some("Check that the errorkube server is reachable at the configured URL.")
            }
            Self::SnapshotStatusError => Some("Inspect the server logs for the failing request."),
            Self::SnapshotDecodeFailed => {
                Some("Verify --url points at the errorkube API, not another service.")
            }
            Self::SnapshotFileUnreadable => Some("Check the --snapshot-file path and permissions."),
            Self::StreamConnectFailed => {
                Some("Check that the server exposes the WebSocket endpoint (default /events).")
            }
            Self::StreamTransportFailed => {
                Some("The live feed stopped; restart `errorkube watch` to reconnect.")
            }
            Self::PayloadDecodeFailed => None,
            Self::TerminalSetupFailed => {
                Some("Run from an interactive terminal, or use `errorkube list` when piping.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
