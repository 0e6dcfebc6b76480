use crate::LoggingError;
use config_loader::{app_config::BaseAppConfig, logging::FileLoggerConfig};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Rolling file writer that rotates on size.
/// Always writes to {prefix}.log; when the file exceeds max_size it is
/// renamed to {prefix}-YYYYMMDD-{increment}.log and a fresh file is opened.
pub struct SizeBasedRollingWriter {
    dir: PathBuf,
    prefix: String,
    max_size: u64,
    inner: Mutex<ActiveFile>,
}

struct ActiveFile {
    file: fs::File,
    written: u64,
}

impl SizeBasedRollingWriter {
    fn new(dir: &Path, prefix: &str, max_size: u64) -> Result<Self, LoggingError> {
        let log_path = dir.join(format!("{}.log", prefix));

        let written = fs::metadata(&log_path).map(|m| m.len()).unwrap_or(0);
        let file = open_append(&log_path)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
            max_size,
            inner: Mutex::new(ActiveFile { file, written }),
        })
    }

    fn active_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.prefix))
    }

    fn rotate(&self, active: &mut ActiveFile) -> std::io::Result<()> {
        active.file.flush()?;

        let now = time::OffsetDateTime::now_utc();
        let date_str = format!("{:04}{:02}{:02}", now.year(), now.month() as u8, now.day());

        // Next free increment for today's date
        let mut increment = 1;
        let rotated_path = loop {
            let candidate = self
                .dir
                .join(format!("{}-{}-{}.log", self.prefix, date_str, increment));
            if !candidate.exists() {
                break candidate;
            }
            increment += 1;
        };

        fs::rename(self.active_path(), &rotated_path)?;

        active.file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.active_path())?;
        active.written = 0;

        Ok(())
    }
}

impl Write for SizeBasedRollingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut active = self.inner.lock().unwrap();

        if active.written >= self.max_size {
            self.rotate(&mut active)?;
        }

        let written = active.file.write(buf)?;
        active.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.lock().unwrap().file.flush()
    }
}

fn open_append(path: &Path) -> Result<fs::File, LoggingError> {
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LoggingError::BuildLayerError {
            message: anyhow::anyhow!("Failed to open log file {}: {}", path.display(), e)
                .to_string(),
            context: "file_appender",
        })
}

pub fn setup_file_appender(
    app_config: BaseAppConfig,
    file_logger_config: FileLoggerConfig,
) -> Result<
    (
        tracing_appender::non_blocking::NonBlocking,
        tracing_appender::non_blocking::WorkerGuard,
    ),
    LoggingError,
> {
    let path = PathBuf::from(&file_logger_config.path);
    let prefix = app_config.name;

    if !path.exists() {
        fs::create_dir_all(&path).map_err(|e| LoggingError::BuildLayerError {
            message: anyhow::anyhow!("Failed to create directory {}: {}", path.display(), e)
                .to_string(),
            context: "file_appender",
        })?;
    }

    if !path.is_dir() {
        return Err(LoggingError::BuildLayerError {
            message: anyhow::anyhow!("Path {} is not a directory", path.display()).to_string(),
            context: "file_appender",
        });
    }

    let writer = SizeBasedRollingWriter::new(&path, &prefix, file_logger_config.max_size)?;
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    Ok((non_blocking_writer, guard))
}
