//! Config validation CLI tool
//!
//! Validates a focusd configuration file and reports any errors.

use focus_config::ConfigError;
use focus_host_api::TabScanMode;
use focus_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        eprintln!();
        eprintln!("Usage: validate-config [config-file]");
        return ExitCode::from(2);
    }

    match focus_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", focus_config::CURRENT_CONFIG_VERSION);
            println!("  Socket: {}", settings.service.socket_path.display());
            println!("  Data dir: {}", settings.service.data_dir.display());
            println!(
                "  Enforcement interval: {}ms (call timeout {}ms)",
                settings.timing.enforcement_interval.as_millis(),
                settings.timing.call_timeout.as_millis()
            );
            println!("  Default snooze: {}s", settings.timing.default_snooze.as_secs());
            println!();
            println!("Browsers:");
            for browser in &settings.browsers {
                let mode = match browser.scan_mode {
                    TabScanMode::AllTabs => "all tabs",
                    TabScanMode::ActiveTabOnly => "active tab only",
                    TabScanMode::Unsupported => "unsupported",
                };
                println!("  - {} [{}]: {}", browser.name, browser.bundle_id, mode);
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        focus_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
