//! Logging initialization and configuration checking
//!
//! This module provides:
//! - Logger initialization (console + optional file)
//! - Credentials configuration logging
//! - External tool availability diagnostics

use anyhow::Result;
use simplelog::*;
use std::fs::File;
use std::str::FromStr;

use crate::core::config;
use crate::core::process::CommandRunner;
use crate::download::credentials::CredentialSet;
use crate::download::tools::ToolConfig;

/// Initialize logger for console output and, when configured, a log file
///
/// # Arguments
/// * `level` - Level filter name (`error`, `warn`, `info`, `debug`, `trace`)
/// * `log_file_path` - Optional path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(level: &str, log_file_path: Option<&str>) -> Result<()> {
    let level = LevelFilter::from_str(level).unwrap_or(LevelFilter::Info);

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(path) = log_file_path {
        let log_file = File::create(path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;
        loggers.push(WriteLogger::new(level, Config::default(), log_file));
    }

    CombinedLogger::init(loggers).map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs credential configuration at application startup
///
/// Only counts are logged; credential contents never reach the log.
pub fn log_credentials_configuration(credentials: &CredentialSet) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🍪 Credentials Configuration Check");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if credentials.is_empty() {
        log::warn!(
            "⚠️  No credentials found ({}1, {}2, ...). Instagram downloads will be refused.",
            config::credentials::ENV_PREFIX.as_str(),
            config::credentials::ENV_PREFIX.as_str()
        );
    } else {
        log::info!(
            "✅ {} credential(s) loaded from {}N, rotated in random order per request",
            credentials.len(),
            config::credentials::ENV_PREFIX.as_str()
        );
    }
}

/// Logs the versions of the external tools, or an error when one cannot be launched
pub async fn log_tools_availability(runner: &dyn CommandRunner, tools: &ToolConfig) -> bool {
    let mut all_ok = true;
    for cmd in &tools.version_commands() {
        match runner.run(cmd).await {
            Ok(output) if output.success() => {
                let version = output.stdout.lines().next().unwrap_or_default();
                log::info!("✅ {}: {}", cmd.program(), version);
            }
            Ok(output) => {
                all_ok = false;
                log::error!("❌ {} exited with {}: {}", cmd.program(), output.status, output.stderr);
            }
            Err(e) => {
                all_ok = false;
                log::error!("❌ {} is not available: {}", cmd.program(), e);
            }
        }
    }
    all_ok
}
