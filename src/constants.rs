//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Review pipeline constants
pub mod review {
    /// Default number of analyses folded by one reduce call
    pub const DEFAULT_BATCH_SIZE: usize = 7;

    /// Smallest batch width that still guarantees each round shrinks the sequence
    pub const MIN_BATCH_SIZE: usize = 2;

    /// Largest accepted batch width
    pub const MAX_BATCH_SIZE: usize = 100;

    /// Default completion budget for structure, file and reduce calls
    pub const DEFAULT_MAX_TOKENS: u32 = 400;

    /// Default completion budget for the terminal summary call
    pub const DEFAULT_MAX_TOKEN_SUMMARY: u32 = 500;

    /// Total token budget shared by the calls of one reduce round
    pub const DEFAULT_TOTAL_TOKEN_BUDGET: u32 = 4096;

    /// Default sampling temperature
    pub const DEFAULT_TEMPERATURE: f32 = 0.6;

    /// Returned by the reducer when there is nothing to fold
    pub const NOTHING_TO_SUMMARIZE: &str = "Nothing to summarize: no analyses were produced.";

    /// Returned by the pipeline when the repository listed no files
    pub const NOTHING_TO_ANALYZE: &str = "Nothing to analyze: the repository contains no files.";

    /// Prefix carried by every analysis that stands in for a failed call
    pub const ERROR_PREFIX: &str = "Error:";

    /// Where reduce and summary templates receive the joined analyses
    pub const ANALYSES_PLACEHOLDER: &str = "{analyses}";

    /// Where reduce and summary templates receive the developer level
    pub const LEVEL_PLACEHOLDER: &str = "{level}";
}

/// Provider retry constants
pub mod retry {
    /// Default maximum attempts per completion
    pub const DEFAULT_MAX_RETRIES: u8 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 30;

    /// Backoff multiplier
    pub const BACKOFF_FACTOR: f32 = 2.0;

    /// Upper bound on a server-suggested retry delay (seconds)
    pub const MAX_RETRY_AFTER_SECS: u64 = 300;
}

/// GitHub retrieval constants
pub mod github {
    pub const WEB_ROOT: &str = "https://github.com/";

    pub const API_URL: &str = "https://api.github.com";

    /// Extensions whose content is downloaded and reviewed
    pub const VALID_EXTENSIONS: &[&str] = &[".py", ".md", ".ini"];

    /// Concurrent raw-file downloads per listing
    pub const MAX_CONCURRENT_DOWNLOADS: usize = 8;

    pub const USER_AGENT: &str = concat!("codeverdict/", env!("CARGO_PKG_VERSION"));
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Default bind address for the review server
    pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
}
