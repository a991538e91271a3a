//! Test configuration helpers for loading .env credentials and creating test generators

use imagegen_dl::config::{ApiConfig, PollConfig, ProgressConfig, RetryConfig};
use imagegen_dl::{Config, HttpTransport, ImageGenerator};
use std::sync::Arc;
use std::time::Duration;

/// Token sent by generators built against a mock server
pub const TEST_TOKEN: &str = "sess-integration-token";

/// Error type for test configuration
#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Config pointing at `base_url` with a fast poll cadence and no console output
pub fn mock_config(base_url: &str) -> Config {
    Config {
        api: ApiConfig {
            base_url: base_url.to_string(),
            collection_id: "collection-it".to_string(),
            request_timeout: Duration::from_secs(5),
        },
        batch_size: 4,
        poll: PollConfig {
            max_attempts: 4,
            interval: Duration::from_millis(20),
        },
        progress: ProgressConfig {
            enabled: false,
            ..Default::default()
        },
        retry: RetryConfig {
            max_attempts: 2,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            backoff_multiplier: 2.0,
            jitter: false,
        },
        ..Default::default()
    }
}

/// Generator using the real HTTP transport against a mock server
pub fn mock_generator(config: Config) -> ImageGenerator {
    let transport = HttpTransport::new(TEST_TOKEN, config.api.request_timeout)
        .expect("Failed to build HTTP transport");
    ImageGenerator::with_transport(Arc::new(transport), config)
        .expect("Failed to create generator")
}

/// Load the session token for live tests
///
/// Required environment variable: `TOKEN`
pub fn load_token() -> Result<String, ConfigError> {
    dotenvy::dotenv().ok();
    std::env::var("TOKEN").map_err(|_| ConfigError("TOKEN not set in environment".to_string()))
}

/// Check if live credentials are available
pub fn has_live_credentials() -> bool {
    load_token().is_ok()
}
