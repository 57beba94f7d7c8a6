//! Decoder and session configuration.
//!
//! Use the builder methods to customize behavior, or `StreamConfig::from_env`
//! to pick up overrides from `TOKENWIRE_*` environment variables.
//!
//! # Example
//!
//! ```
//! use tokenwire::config::{DecoderConfig, StreamConfig, TokenParseFailure};
//!
//! let config = StreamConfig::default().with_decoder(
//!     DecoderConfig::default()
//!         .with_infer_event_name(false)
//!         .with_token_parse_failure(TokenParseFailure::Terminate),
//! );
//! assert!(!config.decoder.infer_event_name);
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::traits::Headers;

/// Environment variable: any value makes token parse failures terminal.
pub const ENV_STRICT_TOKENS: &str = "TOKENWIRE_STRICT_TOKENS";
/// Environment variable: any value disables event-name inference.
pub const ENV_NO_INFERENCE: &str = "TOKENWIRE_NO_INFERENCE";
/// Environment variable: connect timeout in whole seconds.
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "TOKENWIRE_CONNECT_TIMEOUT_SECS";
/// Environment variable: extra request headers as `name=value;name2=value2`.
pub const ENV_HEADERS: &str = "TOKENWIRE_HEADERS";

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A variable was set to something that could not be parsed
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// What to do when a `token` frame's data is not valid JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenParseFailure {
    /// Report `token_parse_failed` and keep reading
    #[default]
    Report,
    /// Report `token_parse_failed` and end the session
    Terminate,
}

/// Knobs for the byte → frame → event pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderConfig {
    /// Rewrite `\r\n` to `\n` before frame splitting (default: true)
    pub normalize_line_endings: bool,
    /// Dispatch an unterminated final frame when the source ends (default: true)
    pub flush_trailing_frame: bool,
    /// Infer the event from the payload's shape when `event:` is absent (default: true)
    pub infer_event_name: bool,
    /// Policy for malformed `token` frames (default: report and continue)
    pub token_parse_failure: TokenParseFailure,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            normalize_line_endings: true,
            flush_trailing_frame: true,
            infer_event_name: true,
            token_parse_failure: TokenParseFailure::Report,
        }
    }
}

impl DecoderConfig {
    /// Create a new DecoderConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether `\r\n` is normalized to `\n`.
    pub fn with_normalize_line_endings(mut self, normalize: bool) -> Self {
        self.normalize_line_endings = normalize;
        self
    }

    /// Set whether the unterminated final frame is dispatched at end of stream.
    pub fn with_flush_trailing_frame(mut self, flush: bool) -> Self {
        self.flush_trailing_frame = flush;
        self
    }

    /// Set whether frames without `event:` are inferred from their payload.
    pub fn with_infer_event_name(mut self, infer: bool) -> Self {
        self.infer_event_name = infer;
        self
    }

    /// Set the malformed-token policy.
    pub fn with_token_parse_failure(mut self, policy: TokenParseFailure) -> Self {
        self.token_parse_failure = policy;
        self
    }
}

/// Configuration for a `StreamController`.
#[derive(Debug, Clone, Default)]
pub struct StreamConfig {
    /// Pipeline behavior for every session
    pub decoder: DecoderConfig,
    /// Headers added to every request on top of the content negotiation ones
    pub headers: Headers,
    /// Upper bound for establishing the connection; reads are never timed out
    pub connect_timeout: Option<Duration>,
}

impl StreamConfig {
    /// Create a new StreamConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the decoder configuration.
    pub fn with_decoder(mut self, decoder: DecoderConfig) -> Self {
        self.decoder = decoder;
        self
    }

    /// Add a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Create config from `TOKENWIRE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut decoder = DecoderConfig::default();
        if lookup(ENV_STRICT_TOKENS).is_some() {
            decoder = decoder.with_token_parse_failure(TokenParseFailure::Terminate);
        }
        if lookup(ENV_NO_INFERENCE).is_some() {
            decoder = decoder.with_infer_event_name(false);
        }

        let mut config = Self::default().with_decoder(decoder);

        if let Some(raw) = lookup(ENV_CONNECT_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    name: ENV_CONNECT_TIMEOUT_SECS,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
            config = config.with_connect_timeout(Duration::from_secs(secs));
        }

        if let Some(raw) = lookup(ENV_HEADERS) {
            for (name, value) in parse_header_list(&raw)? {
                config = config.with_header(name, value);
            }
        }

        Ok(config)
    }
}

/// Parse `name=value;name2=value2` into header pairs.
fn parse_header_list(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(ConfigError::InvalidValue {
                name: ENV_HEADERS,
                value: pair.to_string(),
                reason: "expected name=value".to_string(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_decoder_config_default() {
        let config = DecoderConfig::default();
        assert!(config.normalize_line_endings);
        assert!(config.flush_trailing_frame);
        assert!(config.infer_event_name);
        assert_eq!(config.token_parse_failure, TokenParseFailure::Report);
    }

    #[test]
    fn test_decoder_config_builder() {
        let config = DecoderConfig::new()
            .with_normalize_line_endings(false)
            .with_flush_trailing_frame(false)
            .with_infer_event_name(false)
            .with_token_parse_failure(TokenParseFailure::Terminate);
        assert!(!config.normalize_line_endings);
        assert!(!config.flush_trailing_frame);
        assert!(!config.infer_event_name);
        assert_eq!(config.token_parse_failure, TokenParseFailure::Terminate);
    }

    #[test]
    fn test_stream_config_builder() {
        let config = StreamConfig::new()
            .with_header("Authorization", "Bearer abc")
            .with_connect_timeout(Duration::from_secs(5));
        assert_eq!(
            config.headers.get("Authorization"),
            Some(&"Bearer abc".to_string())
        );
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_from_lookup_empty_is_default() {
        let config = StreamConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.decoder, DecoderConfig::default());
        assert!(config.headers.is_empty());
        assert!(config.connect_timeout.is_none());
    }

    #[test]
    fn test_from_lookup_all_variables() {
        let config = StreamConfig::from_lookup(lookup_from(&[
            (ENV_STRICT_TOKENS, "1"),
            (ENV_NO_INFERENCE, "1"),
            (ENV_CONNECT_TIMEOUT_SECS, " 10 "),
            (ENV_HEADERS, "x-csrf-token=abc; x-trace = 7 ;"),
        ]))
        .unwrap();

        assert_eq!(config.decoder.token_parse_failure, TokenParseFailure::Terminate);
        assert!(!config.decoder.infer_event_name);
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.headers.get("x-csrf-token"), Some(&"abc".to_string()));
        assert_eq!(config.headers.get("x-trace"), Some(&"7".to_string()));
    }

    #[test]
    fn test_from_lookup_invalid_timeout() {
        let err = StreamConfig::from_lookup(lookup_from(&[(ENV_CONNECT_TIMEOUT_SECS, "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: ENV_CONNECT_TIMEOUT_SECS,
                ..
            }
        ));
    }

    #[test]
    fn test_from_lookup_invalid_header() {
        let err = StreamConfig::from_lookup(lookup_from(&[(ENV_HEADERS, "novalue")])).unwrap_err();
        assert!(err.to_string().contains("expected name=value"));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var(ENV_STRICT_TOKENS, "1");
        let config = StreamConfig::from_env().unwrap();
        std::env::remove_var(ENV_STRICT_TOKENS);
        assert_eq!(config.decoder.token_parse_failure, TokenParseFailure::Terminate);
    }

    #[test]
    #[serial]
    fn test_from_env_without_variables() {
        for name in [ENV_STRICT_TOKENS, ENV_NO_INFERENCE, ENV_CONNECT_TIMEOUT_SECS, ENV_HEADERS] {
            std::env::remove_var(name);
        }
        let config = StreamConfig::from_env().unwrap();
        assert_eq!(config.decoder, DecoderConfig::default());
    }
}
