//! Engine configuration from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::analysis::ProgressPolicy;
use crate::session::SessionSettings;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Path to the UCI engine binary
    pub stockfish_path: String,

    /// Target depth for `go depth N`
    pub analysis_depth: u32,

    /// Bounded wait per analysis before the partial result is returned
    pub analysis_timeout_secs: u64,

    /// Bounded wait for the `uciok`/`readyok` handshake
    pub init_timeout_secs: u64,

    /// `setoption name Threads`
    pub threads: u32,

    /// `setoption name Hash` in MB
    pub hash_mb: u32,

    /// Forward progress on every multiple of this depth
    pub progress_depth_step: u32,

    /// Forward progress on every new depth at or above this one
    pub progress_depth_floor: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stockfish_path: "stockfish".to_string(),
            analysis_depth: 20,
            analysis_timeout_secs: 10,
            init_timeout_secs: 10,
            threads: 1,
            hash_mb: 64,
            progress_depth_step: 3,
            progress_depth_floor: 10,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            stockfish_path: env::var("STOCKFISH_PATH").unwrap_or(defaults.stockfish_path),
            analysis_depth: env_or("ANALYSIS_DEPTH", defaults.analysis_depth).max(1),
            analysis_timeout_secs: env_or("ANALYSIS_TIMEOUT_SECS", defaults.analysis_timeout_secs),
            init_timeout_secs: env_or("ENGINE_INIT_TIMEOUT_SECS", defaults.init_timeout_secs),
            threads: env_or("ENGINE_THREADS", defaults.threads).max(1),
            hash_mb: env_or("ENGINE_HASH_MB", defaults.hash_mb).max(1),
            progress_depth_step: env_or("PROGRESS_DEPTH_STEP", defaults.progress_depth_step),
            progress_depth_floor: env_or("PROGRESS_DEPTH_FLOOR", defaults.progress_depth_floor),
        }
    }

    /// UCI options sent during the handshake.
    pub fn uci_options(&self) -> Vec<(String, String)> {
        vec![
            ("Threads".to_string(), self.threads.to_string()),
            ("Hash".to_string(), self.hash_mb.to_string()),
            ("UCI_AnalyseMode".to_string(), "true".to_string()),
        ]
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            init_timeout: Duration::from_secs(self.init_timeout_secs),
            analysis_timeout: Duration::from_secs(self.analysis_timeout_secs),
            progress: ProgressPolicy {
                depth_step: self.progress_depth_step,
                depth_floor: self.progress_depth_floor,
            },
            options: self.uci_options(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_settings_from_config() {
        let config = EngineConfig {
            analysis_timeout_secs: 3,
            progress_depth_step: 5,
            ..EngineConfig::default()
        };
        let settings = config.session_settings();
        assert_eq!(settings.analysis_timeout, Duration::from_secs(3));
        assert_eq!(settings.progress.depth_step, 5);
        assert_eq!(settings.progress.depth_floor, 10);
        assert_eq!(settings.options[0], ("Threads".to_string(), "1".to_string()));
        assert_eq!(settings.options[1], ("Hash".to_string(), "64".to_string()));
    }
}
