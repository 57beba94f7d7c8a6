//! Command-line argument parsing for the tokenwire CLI.
//!
//! This module handles parsing command-line arguments and determining
//! which CLI command to execute.

/// Default request payload when `--payload` is not given.
pub const DEFAULT_PAYLOAD: &str = "{}";

/// Options for a streaming run.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamArgs {
    /// Address to POST to
    pub url: String,
    /// Raw JSON request body
    pub payload: String,
    /// Treat malformed token frames as terminal
    pub strict: bool,
    /// Do not infer event names from payload shape
    pub no_inference: bool,
    /// Number of `-v` flags
    pub verbosity: u8,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Stream one request
    Stream(StreamArgs),
    /// Arguments could not be understood
    Invalid(String),
}

/// Parse command-line arguments and return the appropriate command.
///
/// # Arguments
///
/// * `args` - Iterator of command-line arguments (typically `std::env::args()`)
///
/// # Examples
///
/// ```
/// use tokenwire::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["tokenwire".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut url = None;
    let mut payload = None;
    let mut strict = false;
    let mut no_inference = false;
    let mut verbosity: u8 = 0;

    // Skip the program name
    let mut args = args.skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            "--strict" => strict = true,
            "--no-inference" => no_inference = true,
            "--payload" | "-p" => match args.next() {
                Some(value) => payload = Some(value),
                None => return CliCommand::Invalid(format!("{} requires a value", arg)),
            },
            flag if is_verbosity(flag) => {
                verbosity = verbosity.saturating_add((flag.len() - 1) as u8);
            }
            flag if flag.starts_with('-') => {
                return CliCommand::Invalid(format!("unknown option: {}", flag));
            }
            _ if url.is_some() => {
                return CliCommand::Invalid(format!("unexpected argument: {}", arg));
            }
            _ => url = Some(arg),
        }
    }

    match url {
        Some(url) => CliCommand::Stream(StreamArgs {
            url,
            payload: payload.unwrap_or_else(|| DEFAULT_PAYLOAD.to_string()),
            strict,
            no_inference,
            verbosity,
        }),
        None => CliCommand::Invalid("missing <url>".to_string()),
    }
}

/// `-v`, `-vv`, `-vvv`...
fn is_verbosity(flag: &str) -> bool {
    flag.len() > 1 && flag.starts_with('-') && flag[1..].chars().all(|c| c == 'v')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliCommand {
        let args: Vec<String> = std::iter::once("tokenwire")
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect();
        parse_args(args.into_iter())
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]), CliCommand::Version);
        assert_eq!(parse(&["-V"]), CliCommand::Version);
    }

    #[test]
    fn test_parse_help_flag() {
        assert_eq!(parse(&["-h"]), CliCommand::Help);
    }

    #[test]
    fn test_parse_url_only() {
        assert_eq!(
            parse(&["http://localhost:8000/chat"]),
            CliCommand::Stream(StreamArgs {
                url: "http://localhost:8000/chat".to_string(),
                payload: DEFAULT_PAYLOAD.to_string(),
                strict: false,
                no_inference: false,
                verbosity: 0,
            })
        );
    }

    #[test]
    fn test_parse_all_options() {
        let command = parse(&[
            "-v",
            "--payload",
            r#"{"prompt":"hi"}"#,
            "http://localhost/chat",
            "--strict",
            "--no-inference",
            "-vv",
        ]);
        let CliCommand::Stream(args) = command else {
            panic!("expected stream command, got {:?}", command);
        };
        assert_eq!(args.payload, r#"{"prompt":"hi"}"#);
        assert!(args.strict);
        assert!(args.no_inference);
        assert_eq!(args.verbosity, 3);
    }

    #[test]
    fn test_parse_missing_url() {
        assert!(matches!(parse(&[]), CliCommand::Invalid(_)));
        assert!(matches!(parse(&["--strict"]), CliCommand::Invalid(_)));
    }

    #[test]
    fn test_parse_missing_payload_value() {
        assert_eq!(
            parse(&["http://x", "--payload"]),
            CliCommand::Invalid("--payload requires a value".to_string())
        );
    }

    #[test]
    fn test_parse_unknown_flag() {
        assert_eq!(
            parse(&["http://x", "--unknown"]),
            CliCommand::Invalid("unknown option: --unknown".to_string())
        );
    }

    #[test]
    fn test_parse_second_url_rejected() {
        assert!(matches!(parse(&["http://a", "http://b"]), CliCommand::Invalid(_)));
    }
}
