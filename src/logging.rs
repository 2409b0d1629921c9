use crate::Result;
use flexi_logger::{opt_format, Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming};
use std::path::Path;

/// Starts the logger. The level comes from `RUST_LOG` when set, else
/// `default_level`. With a directory, logs also go to files there, rotated
/// every 10 MB. Keep the returned handle alive for the life of the program.
pub fn setup_logging(default_level: &str, directory: Option<&Path>) -> Result<LoggerHandle> {
    let logger = Logger::try_with_env_or_str(default_level)?;
    let handle = match directory {
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir).basename("azul_analyzer"))
            .duplicate_to_stderr(flexi_logger::Duplicate::Info)
            .format(opt_format)
            .rotate(
                Criterion::Size(10 * 1024 * 1024),
                Naming::Numbers,
                Cleanup::KeepLogFiles(7),
            )
            .start()?,
        None => logger.format(flexi_logger::colored_default_format).start()?,
    };
    Ok(handle)
}
