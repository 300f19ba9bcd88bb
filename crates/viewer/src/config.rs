use std::env;

use engine_session::EngineConfig;

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub engine: EngineConfig,
}

impl ViewerConfig {
    pub fn from_env() -> Self {
        Self {
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            user_agent: env::var("HTTP_USER_AGENT")
                .unwrap_or_else(|_| "PgnAnalyzer/1.0".to_string()),
            engine: EngineConfig::from_env(),
        }
    }
}
