use std::fmt;

/// Machine-readable error codes for scripted callers of the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    CorpusNotFound,
    CorpusParseError,
    ConfigParseError,
    DocumentNotFound,
    EmptyQuery,
    EmbeddingProviderUnavailable,
    DuplicateScanCancelled,
    DuplicateScanTimedOut,
    CacheWriteFailed,
    FeedbackWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// The `E####` identifier scripts match on.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::CorpusNotFound => "E1001",
            Self::CorpusParseError => "E1002",
            Self::ConfigParseError => "E1003",
            Self::DocumentNotFound => "E2001",
            Self::EmptyQuery => "E2002",
            Self::EmbeddingProviderUnavailable => "E3001",
            Self::DuplicateScanCancelled => "E4001",
            Self::DuplicateScanTimedOut => "E4002",
            Self::CacheWriteFailed => "E5001",
            Self::FeedbackWriteFailed => "E5002",
            Self::LockContention => "E5003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// One-line description of the failure class.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::CorpusNotFound => "Corpus file not found",
            Self::CorpusParseError => "Corpus file parse error",
            Self::ConfigParseError => "Config file parse error",
            Self::DocumentNotFound => "Document not found",
            Self::EmptyQuery => "Empty search query",
            Self::EmbeddingProviderUnavailable => "Embedding provider unavailable",
            Self::DuplicateScanCancelled => "Duplicate scan cancelled",
            Self::DuplicateScanTimedOut => "Duplicate scan timed out",
            Self::CacheWriteFailed => "Recent-search cache write failed",
            Self::FeedbackWriteFailed => "Feedback log write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint surfaced next to the message.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::CorpusNotFound => {
                Some("Point --corpus at an extracted corpus.json or set SIFT_HOME.")
            }
            Self::CorpusParseError => {
                Some("The corpus must be a JSON array of {filename, path, text} objects.")
            }
            Self::ConfigParseError => Some("Fix syntax in config.toml and retry."),
            Self::DocumentNotFound => None,
            Self::EmptyQuery => Some("Provide a non-empty query string."),
            Self::EmbeddingProviderUnavailable => {
                Some("Semantic ranking is skipped; enable [semantic] in config.toml.")
            }
            Self::DuplicateScanCancelled => None,
            Self::DuplicateScanTimedOut => {
                Some("Narrow the scan with --query or filters, or raise --timeout-secs.")
            }
            Self::CacheWriteFailed | Self::FeedbackWriteFailed => {
                Some("Check disk space and write permissions for the data directory.")
            }
            Self::LockContention => Some("Retry after the other `sift` process finishes."),
            Self::InternalUnexpected => Some("Rerun with --verbose and report the log if it happens again."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
