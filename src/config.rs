//! Runtime configuration
//!
//! Settings come from `JOBSH_*` environment variables, then command-line
//! flags applied on top by the binary.

use std::env;

/// Default prompt
pub const DEFAULT_PROMPT: &str = ">> ";

/// Startup banner, shown when enabled
pub const BANNER: &str = "Booting shell...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prompt written before every line (JOBSH_PROMPT)
    pub prompt: String,
    /// Print the banner at startup (JOBSH_BANNER=1)
    pub banner: bool,
    /// `exit` sends SIGTERM to outstanding background jobs
    /// (JOBSH_EXIT_KILLS_JOBS=1). Off by default: jobs are just forgotten.
    pub exit_kills_jobs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prompt: DEFAULT_PROMPT.to_string(),
            banner: false,
            exit_kills_jobs: false,
        }
    }
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        Config {
            prompt: lookup("JOBSH_PROMPT").unwrap_or(defaults.prompt),
            banner: lookup("JOBSH_BANNER").map_or(defaults.banner, |v| is_enabled(&v)),
            exit_kills_jobs: lookup("JOBSH_EXIT_KILLS_JOBS")
                .map_or(defaults.exit_kills_jobs, |v| is_enabled(&v)),
        }
    }
}

fn is_enabled(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
