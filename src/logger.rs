use std::fs;

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::config::LogSettings;
use crate::error::OccupancyError;

const FILE_PATTERN: &str = "{d(%Y.%m.%d %H:%M:%S)} | {({l}):5.5} | {({f}:{L}):>40.40} — {m}{n}";
const CONSOLE_PATTERN: &str = "{({l}):5.5} {m}{n}";

fn get_logging_level(log_level: &str) -> LevelFilter {
    match log_level {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

/// File appender when a log file is configured, stderr otherwise.
pub fn setup_logging(log_settings: &LogSettings) -> Result<Config, OccupancyError> {
    let level = get_logging_level(&log_settings.log_level);

    let appender = match &log_settings.log_file {
        Some(log_file) => {
            if let Some(parent) = log_file.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = FileAppender::builder()
                .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
                .append(false)
                .build(log_file)?;
            Appender::builder().build("out", Box::new(file))
        }
        None => {
            let console = ConsoleAppender::builder()
                .target(Target::Stderr)
                .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
                .build();
            Appender::builder().build("out", Box::new(console))
        }
    };

    Config::builder()
        .appender(appender)
        .build(Root::builder().appender("out").build(level))
        .map_err(|e| OccupancyError::Config(format!("logger: {e}")))
}

pub fn initiate_logger(log_settings: &LogSettings) -> Result<(), OccupancyError> {
    let config = setup_logging(log_settings)?;
    log4rs::init_config(config)
        .map(|_| ())
        .map_err(|e| OccupancyError::Config(format!("logger: {e}")))
}
