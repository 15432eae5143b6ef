use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

const ENCODER_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;

/// Initializes the logging system from a log4rs config file.
///
/// # Errors
/// Returns an error if the file cannot be read or a logger is already installed.
pub fn init_path(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(())
}

#[must_use]
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling_appender(
    base: &Path,
    stem: &str,
    keep: u32,
) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(ENCODER_PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?;
    Ok(appender)
}

/// Builds the log4rs config: `app.log` for everything, `metrics.log` for slow-query
/// warnings (target `mangolite::metrics`), and optionally `dev6.log` for bench lines.
///
/// # Errors
/// Returns an error if the directory cannot be created or an appender fails to open.
pub fn build_config(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<u32>,
    enable_dev6: bool,
) -> Result<Config, Box<dyn std::error::Error>> {
    let base = match dir {
        Some(d) => PathBuf::from(d),
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&base)?;
    let keep = retention.unwrap_or(7);
    let lvl = parse_level(level);

    let mut builder = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling_appender(&base, "app", keep)?)))
        .appender(
            Appender::builder()
                .build("metrics", Box::new(rolling_appender(&base, "metrics", keep)?)),
        )
        .logger(
            Logger::builder().appender("metrics").additive(false).build("mangolite::metrics", lvl),
        );

    if enable_dev6 {
        builder = builder
            .appender(
                Appender::builder().build("dev6", Box::new(rolling_appender(&base, "dev6", keep)?)),
            )
            .logger(
                Logger::builder()
                    .appender("dev6")
                    .additive(false)
                    .build("mangolite::dev6", LevelFilter::Trace),
            );
    } else {
        builder = builder
            .logger(Logger::builder().additive(false).build("mangolite::dev6", LevelFilter::Off));
    }

    Ok(builder.build(Root::builder().appender("app").build(lvl))?)
}

/// Configure logging globally for the process.
///
/// # Errors
/// Returns an error if the config cannot be built or a logger is already installed.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<u32>,
    enable_dev6: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(dir, level, retention, enable_dev6)?;
    log4rs::init_config(config)?;
    Ok(())
}

/// Configure logging from environment variables if present:
/// - MANGOLITE_LOG_DIR
/// - MANGOLITE_LOG_LEVEL
/// - MANGOLITE_LOG_RETENTION
/// - MANGOLITE_DEV6
///
/// # Errors
/// Same as [`configure_logging`].
pub fn configure_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::var("MANGOLITE_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("MANGOLITE_LOG_LEVEL").ok();
    let retention =
        std::env::var("MANGOLITE_LOG_RETENTION").ok().and_then(|s| s.parse::<u32>().ok());
    let dev6_enabled = std::env::var("MANGOLITE_DEV6")
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    configure_logging(dir.as_deref(), level.as_deref(), retention, dev6_enabled)
}
