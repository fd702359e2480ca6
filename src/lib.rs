pub mod auth;
pub mod client;
pub mod config;
pub mod duration;
pub mod error;
pub mod log_writer;
pub mod prober;
pub mod runner;
pub mod types;

/// IDEX production REST API base URL.
pub const API_BASE: &str = "https://api.idex.io";

/// IDEX sandbox REST API base URL, used when `SANDBOX=true` and no `BASE_URL` is set.
pub const SANDBOX_API_BASE: &str = "https://api-sandbox.idex.io";

/// Environment name used in the log path when none is configured.
pub const DEFAULT_ENV: &str = "prod";

/// Root directory for latency logs.
pub const DEFAULT_LOG_DIR: &str = "logs";
