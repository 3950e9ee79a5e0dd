//! Command line and environment configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use pilot_client::{DEFAULT_LOGIN_URL, DEFAULT_SERVER_URL, SessionConfig};

use crate::decision::{LoopConfig, RetryPolicy};
use crate::llm::{LlmConfig, LlmProvider};

/// Play Pokemon Showdown battles with an LLM choosing the moves
#[derive(Debug, Clone, Parser)]
#[command(name = "pilot", version, about)]
pub struct Args {
    /// Account to log in as
    #[arg(long, env = "PS_USERNAME")]
    pub username: String,

    /// Account password
    #[arg(long, env = "PS_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// User to challenge
    #[arg(long, env = "PS_TARGET_USERNAME")]
    pub opponent: String,

    /// Battle format to challenge in
    #[arg(long, default_value = "gen9randombattle")]
    pub format: String,

    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,

    /// Login endpoint, defaults to the official one
    #[arg(long)]
    pub login_url: Option<String>,

    /// Avatar to set after logging in
    #[arg(long)]
    pub avatar: Option<String>,

    /// Number of battles to play before quitting
    #[arg(long, default_value_t = 1)]
    pub battles: u32,

    #[arg(long, default_value_t = 500)]
    pub poll_interval_ms: u64,

    /// Pause after each request before deciding
    #[arg(long, default_value_t = 100)]
    pub settle_delay_ms: u64,

    /// Retries per decision after the first attempt
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    /// JSON file with species, moves, abilities and items
    #[arg(long)]
    pub reference_data: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short)]
    pub verbose: bool,

    /// Ask for an analysis after each battle and send it to the opponent
    #[arg(long)]
    pub post_battle_analysis: bool,

    #[arg(long, env = "LLM_API_KEY", hide_env_values = true, default_value = "")]
    pub llm_api_key: String,

    /// Endpoint or base URL of the LLM API
    #[arg(long, env = "LLM_API_URL")]
    pub llm_api_url: Option<String>,

    #[arg(long, env = "LLM_MODEL")]
    pub llm_model: Option<String>,

    #[arg(long, env = "LLM_PROVIDER", value_enum, default_value_t = LlmProvider::Anthropic)]
    pub llm_provider: LlmProvider,
}

impl Args {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            server_url: self.server_url.clone(),
            login_url: self
                .login_url
                .clone()
                .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string()),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            ..RetryPolicy::default()
        }
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_url: self.llm_api_url.clone(),
            model: self.llm_model.clone(),
            ..LlmConfig::new(self.llm_provider, self.llm_api_key.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 7] = [
        "pilot",
        "--username",
        "Pilot",
        "--password",
        "hunter2",
        "--opponent",
        "Rival",
    ];

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(REQUIRED).unwrap();

        assert_eq!(args.format, "gen9randombattle");
        assert_eq!(args.battles, 1);
        assert!(!args.verbose);

        let session = args.session_config();
        assert_eq!(session.server_url, DEFAULT_SERVER_URL);
        assert_eq!(session.login_url, DEFAULT_LOGIN_URL);

        assert_eq!(args.retry_policy(), RetryPolicy::default());
        assert_eq!(args.loop_config(), LoopConfig::default());
    }

    #[test]
    fn test_overrides() {
        let mut argv = REQUIRED.to_vec();
        argv.extend([
            "--battles",
            "5",
            "--max-retries",
            "1",
            "--settle-delay-ms",
            "0",
            "--llm-provider",
            "openai",
            "--llm-api-url",
            "https://api.deepseek.com",
            "--llm-model",
            "deepseek-chat",
            "--llm-api-key",
            "sk-test",
            "-v",
        ]);
        let args = Args::try_parse_from(argv).unwrap();

        assert_eq!(args.battles, 5);
        assert!(args.verbose);
        assert_eq!(args.retry_policy().max_retries, 1);
        assert_eq!(args.loop_config().settle_delay, Duration::ZERO);

        let llm = args.llm_config();
        assert_eq!(llm.provider, LlmProvider::OpenAi);
        assert_eq!(llm.api_key, "sk-test");
        assert_eq!(llm.endpoint(), "https://api.deepseek.com/v1/chat/completions");
        assert_eq!(llm.model(), "deepseek-chat");
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let mut argv = REQUIRED.to_vec();
        argv.extend(["--llm-provider", "mystery"]);
        assert!(Args::try_parse_from(argv).is_err());
    }
}
