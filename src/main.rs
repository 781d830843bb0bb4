use std::path::PathBuf;
use std::str::FromStr;

use clap::{command, Arg, ArgAction, ArgMatches, Command};
use color_eyre::Result;
use fs_err as fs;
use tracing::{error, info, warn, Level};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    filter, fmt, layer::SubscriberExt, prelude::*, util::SubscriberInitExt, EnvFilter,
};

use cachebust::{clear_cache, restart_service, CACHEBUST_LOG_PATH_DEFAULT};

const STDOUT_LOG_LEVEL_DEFAULT: Level = Level::INFO;
const STDERR_LOG_LEVEL_DEFAULT: &str = "error";
const FILE_LOG_LEVEL_DEFAULT: &str = "debug";
const RUST_LOG: &str = "RUST_LOG";

fn init_tracing(log_path: PathBuf) -> tracing_appender::non_blocking::WorkerGuard {
    let log_parent_path = log_path
        .parent()
        .unwrap();
    let log_file_name = log_path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap();
    if !log_parent_path.exists() {
        fs::create_dir_all(log_parent_path).unwrap();
    }
    let file_appender = tracing_appender::rolling::never(log_parent_path, log_file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let level = std::env::var(RUST_LOG)
        .ok()
        .and_then(|l| Level::from_str(&l).ok())
        .unwrap_or_else(|| STDOUT_LOG_LEVEL_DEFAULT);
    let allowed_levels: Vec<Level> = vec![Level::INFO, Level::WARN]
        .into_iter()
        .filter(|&l| l <= level)
        .collect();
    let stdout_filter = filter::filter_fn(move |metadata: &tracing::Metadata<'_>| {
        allowed_levels.iter().any(|l| metadata.level() == l)
    });

    let stderr_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(STDERR_LOG_LEVEL_DEFAULT));
    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(FILE_LOG_LEVEL_DEFAULT));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .without_time()
                .with_writer(std::io::stdout)
                .with_ansi(true)
                .with_level(false)
                .with_target(false)
                .fmt_fields(fmt::format::PrettyFields::new())
                .with_filter(stdout_filter),
        )
        .with(
            fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .without_time()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_level(true)
                .with_target(false)
                .fmt_fields(fmt::format::PrettyFields::new())
                .with_filter(stderr_filter),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .json()
                .with_filter(file_filter),
        )
        .with(ErrorLayer::default())
        .init();

    guard
}

fn execute(matches: &ArgMatches) -> Result<()> {
    let path = PathBuf::from(matches.get_one::<String>("PATH").unwrap());
    let service_name = matches.get_one::<String>("SERVICE_NAME").unwrap();

    info!("Path argument is {:?}", path);
    info!("Service name argument is {:?}", service_name);

    if let Err(e) = clear_cache::execute(&path) {
        warn!("Cache clear failed; continuing to service restart: {e}");
    }
    restart_service::execute(service_name)?;

    info!("Done clearing cache and restarting service.");
    Ok(())
}

fn make_app() -> Command {
    command!()
        .name("cachebust")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Clear a cache directory and restart the service that depends on it")
        .disable_version_flag(true)
        .arg(Arg::new("version")
            .short('v')
            .long("version")
            .action(ArgAction::Version)
            .help("Print version")
        )
        .arg(Arg::new("PATH")
            .action(ArgAction::Set)
            .short('p')
            .long("path")
            .help("Directory whose contents are wiped")
            .default_value("")
        )
        .arg(Arg::new("SERVICE_NAME")
            .action(ArgAction::Set)
            .short('s')
            .long("serviceName")
            .help("Service to restart once the cache is cleared")
            .default_value("")
        )
}

fn main() -> Result<()> {
    let log_path = std::env::var("CACHEBUST_LOG_PATH")
        .unwrap_or_else(|_| CACHEBUST_LOG_PATH_DEFAULT.to_string());
    let _guard = init_tracing(PathBuf::from(log_path));
    color_eyre::config::HookBuilder::default()
        .display_env_section(false)
        .install()?;

    let matches = make_app().get_matches();

    match execute(&matches) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("{:?}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_flags() {
        let matches = make_app()
            .try_get_matches_from(["cachebust", "--path=/tmp/x", "--serviceName=nginx"])
            .unwrap();

        assert_eq!(matches.get_one::<String>("PATH").unwrap(), "/tmp/x");
        assert_eq!(matches.get_one::<String>("SERVICE_NAME").unwrap(), "nginx");
    }

    #[test]
    fn parses_short_flags() {
        let matches = make_app()
            .try_get_matches_from(["cachebust", "-p", "/tmp/x", "-s", "nginx"])
            .unwrap();

        assert_eq!(matches.get_one::<String>("PATH").unwrap(), "/tmp/x");
        assert_eq!(matches.get_one::<String>("SERVICE_NAME").unwrap(), "nginx");
    }

    #[test]
    fn missing_flags_default_to_empty_strings() {
        let matches = make_app().try_get_matches_from(["cachebust"]).unwrap();

        assert_eq!(matches.get_one::<String>("PATH").unwrap(), "");
        assert_eq!(matches.get_one::<String>("SERVICE_NAME").unwrap(), "");
    }

    #[test]
    fn rejects_unrecognized_flags() {
        let err = make_app()
            .try_get_matches_from(["cachebust", "--frobnicate"])
            .unwrap_err();

        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn rejects_flag_without_value() {
        let err = make_app()
            .try_get_matches_from(["cachebust", "--path"])
            .unwrap_err();

        assert_eq!(err.exit_code(), 2);
    }
}
