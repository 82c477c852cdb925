//! Integration tests for CLI argument handling
//!
//! Runs the binary for paths that fail before any network I/O: argument
//! errors, missing credentials and bad configuration.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str], env: &[(&str, &str)]) -> std::process::Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_dashfetch"));
    command
        .args(args)
        // Keep a developer's .env out of the picture.
        .current_dir(std::env::temp_dir())
        .env_remove("OPENWEATHER_API_KEY")
        .env_remove("ALPHA_VANTAGE_API_KEY")
        .env_remove("NEWS_API_KEY")
        .env_remove("DASHFETCH_CACHE_TTL_SECS")
        .env_remove("DASHFETCH_TIMEOUT_SECS");
    for (name, value) in env {
        command.env(name, value);
    }
    command.output().expect("Failed to execute dashfetch")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"], &[]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("dashfetch"), "Help should mention dashfetch");
    assert!(stdout.contains("weather"), "Help should list the weather command");
    assert!(stdout.contains("dashboard"), "Help should list the dashboard command");
}

#[test]
fn test_missing_subcommand_fails() {
    let output = run_cli(&[], &[]);
    assert!(!output.status.success());
}

#[test]
fn test_invalid_param_prints_error_and_exits() {
    let output = run_cli(&["get", "https://api.example/x", "-p", "novalue"], &[]);
    assert!(!output.status.success(), "Expected invalid param to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid parameter"),
        "Should explain the bad parameter: {}",
        stderr
    );
}

#[test]
fn test_weather_without_credential_fails_fast() {
    let output = run_cli(&["weather", "London"], &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("OPENWEATHER_API_KEY"),
        "Should name the missing credential: {}",
        stderr
    );
}

#[test]
fn test_blank_credential_counts_as_missing() {
    let output = run_cli(&["stock", "IBM"], &[("ALPHA_VANTAGE_API_KEY", "  ")]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ALPHA_VANTAGE_API_KEY"), "{}", stderr);
}

#[test]
fn test_news_without_credential_fails_fast() {
    let output = run_cli(&["news", "--country", "gb"], &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("NEWS_API_KEY"), "{}", stderr);
}

#[test]
fn test_empty_url_is_rejected() {
    let output = run_cli(&["get", ""], &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("empty URL"), "{}", stderr);
}

#[test]
fn test_invalid_cache_ttl_is_rejected() {
    let output = run_cli(
        &["get", "https://api.example/x"],
        &[("DASHFETCH_CACHE_TTL_SECS", "0")],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("DASHFETCH_CACHE_TTL_SECS"), "{}", stderr);
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use dashfetch::cli::{parse_param, request_options, Cli, Command};

    #[test]
    fn test_cli_parse_watch_defaults() {
        let cli = Cli::parse_from(["dashfetch", "watch", "https://api.example/x"]);
        match cli.command {
            Command::Watch { every, count, params, .. } => {
                assert_eq!(every, 60);
                assert_eq!(count, 5);
                assert!(params.is_empty());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_covid_country() {
        let cli = Cli::parse_from(["dashfetch", "covid", "--country", "New Zealand"]);
        match cli.command {
            Command::Covid { country } => assert_eq!(country.as_deref(), Some("New Zealand")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_repeated_param_keeps_last_value() {
        let params = vec![parse_param("q=a").unwrap(), parse_param("q=b").unwrap()];
        let options = request_options(&params);
        assert_eq!(options.params.get("q"), Some("b"));
        assert_eq!(options.params.len(), 1);
    }
}
