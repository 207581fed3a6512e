//! Logging for binaries: warnings and above on stderr, everything in a file.
use std::{
    env,
    fs::File,
    path::{Path, PathBuf},
};

use log::{info, LevelFilter, Log, Metadata, Record};

/// Forwards every record to each logger that wants it.
struct Tee {
    loggers: Vec<env_logger::Logger>,
}

impl Log for Tee {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.loggers.iter().any(|logger| logger.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        for logger in &self.loggers {
            if logger.enabled(record.metadata()) {
                logger.log(record);
            }
        }
    }

    fn flush(&self) {
        for logger in &self.loggers {
            logger.flush();
        }
    }
}

/// Points the user at the full log if the program exits without [`Guard::disarm`].
pub struct Guard {
    file: Option<PathBuf>,
}

impl Guard {
    pub fn disarm(&mut self) {
        if let Some(file) = self.file.take() {
            info!("Full log stored in {file:?}");
        }
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        if let Some(file) = self.file.as_ref() {
            eprintln!("Full log stored in {file:?}");
        }
    }
}

fn file_path() -> Option<PathBuf> {
    let current_exe = env::current_exe().ok()?;
    let name = current_exe.file_stem()?.to_str()?;
    Some(env::temp_dir().join(name).with_extension("log"))
}

fn file_logger(path: &Path) -> Option<env_logger::Logger> {
    let target = env_logger::Target::Pipe(Box::new(File::create(path).ok()?));
    Some(
        env_logger::Builder::new()
            .filter_level(LevelFilter::Trace)
            .target(target)
            .build(),
    )
}

fn stderr_logger() -> env_logger::Logger {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .build()
}

/// Install the global logger.
///
/// When no log file can be created in the temp dir only stderr is logged to.
pub fn init() -> Guard {
    let mut loggers = vec![stderr_logger()];
    let file = file_path().and_then(|path| {
        let logger = file_logger(&path)?;
        loggers.push(logger);
        Some(path)
    });

    let max_level = loggers
        .iter()
        .map(|l| l.filter())
        .max()
        .unwrap_or(LevelFilter::Off);
    if let Err(e) = log::set_boxed_logger(Box::new(Tee { loggers })) {
        eprintln!("Could not install logger: {e}");
        return Guard { file: None };
    }
    log::set_max_level(max_level);

    Guard { file }
}
