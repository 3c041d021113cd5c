use chrono::{Local, NaiveDateTime};
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Writes every log line to the console and to the run's log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Path of the log file for a run started at `started`.
pub fn log_file_path(dir: &Path, started: NaiveDateTime) -> PathBuf {
    dir.join(format!("{}.log", started.format("%Y-%m-%d-%H%M")))
}

/// One log line, e.g. `2030-01-05 10:30:00,123 INFO   | DATA EXTRACTED`.
pub fn format_line(at: NaiveDateTime, level: log::Level, message: &str) -> String {
    format!(
        "{} {:<6} | {}",
        at.format("%Y-%m-%d %H:%M:%S,%3f"),
        level.to_string(),
        message
    )
}

/// Install the global logger. Returns the path of the log file it writes to.
pub fn init(log_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let path = log_file_path(log_dir, Local::now().naive_local());
    let file = File::create(&path)?;

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{}",
                format_line(Local::now().naive_local(), record.level(), &record.args().to_string())
            )
        })
        .filter(None, LevelFilter::Info)
        .target(Target::Pipe(Box::new(Tee { file })))
        .try_init()
        .map_err(|e| Error::Config(format!("logger already installed: {}", e)))?;

    log::info!("Logging to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 5)
            .unwrap()
            .and_hms_milli_opt(h, m, 7, 42)
            .unwrap()
    }

    #[test]
    fn log_file_is_named_after_the_start_minute() {
        let path = log_file_path(Path::new("logging"), at(9, 3));
        assert_eq!(path, Path::new("logging").join("2030-01-05-0903.log"));
    }

    #[test]
    fn line_pads_level_and_separates_message() {
        let line = format_line(at(10, 30), log::Level::Info, "DATA EXTRACTED");
        assert_eq!(line, "2030-01-05 10:30:07,042 INFO   | DATA EXTRACTED");
    }
}
