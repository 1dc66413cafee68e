//! Terminal logging setup, elapsed-time reporting and statistics tables.
use crate::errors::IntegraError;
use log::{LevelFilter, info};
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};
use std::time::Duration;
use tabled::{builder::Builder, settings::Style};

pub fn parse_loglevel(level: &str) -> Result<LevelFilter, IntegraError> {
    match level.to_lowercase().as_str() {
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        "off" | "none" => Ok(LevelFilter::Off),
        other => Err(IntegraError::Config(format!(
            "loglevel must be debug, info, warn, error or off, found {}",
            other
        ))),
    }
}

/// Installs the terminal logger. `None` means info. Returns false when a logger was
/// already installed (it is kept).
pub fn init_logger(loglevel: Option<&str>) -> Result<bool, IntegraError> {
    let level = match loglevel {
        Some(level) => parse_loglevel(level)?,
        None => LevelFilter::Info,
    };
    if level == LevelFilter::Off {
        return Ok(false);
    }
    let installed = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
    Ok(installed.is_ok())
}

/// Logs the elapsed time in the largest fitting unit and returns (unit, amount).
pub fn elapsed_time(elapsed: Duration) -> (String, f64) {
    let time = elapsed.as_millis();
    if time < 1000 {
        info!("Elapsed {} ms", time);
        ("ms".to_string(), time as f64)
    } else if time < 60_000 {
        info!("Elapsed {} s", elapsed.as_secs());
        ("s".to_string(), elapsed.as_secs_f64())
    } else if time < 3_600_000 {
        info!("Elapsed {} min", elapsed.as_secs() / 60);
        ("min".to_string(), elapsed.as_secs_f64() / 60.0)
    } else {
        info!("Elapsed {} h", elapsed.as_secs() / 3600);
        ("h".to_string(), elapsed.as_secs_f64() / 3600.0)
    }
}

/// Two-column table of name/value rows.
pub fn statistics_table(rows: &[(String, String)]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["quantity", "value"]);
    for (name, value) in rows {
        builder.push_record([name.as_str(), value.as_str()]);
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}
