use log::info;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::Result;

pub const LAST_PAGE_FILE: &str = "fisevi_scraper.csv";
pub const ACTIVE_FILE: &str = "fisevi_scraper_update.csv";

/// Create `dir` and any missing parents. An existing directory is fine.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    match fs::create_dir(dir) {
        Ok(()) => {
            info!("Directory {} created", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            info!("Directory {} already exists", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir)?;
            info!("Directory {} created", dir.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Write `rows` to `path` as a `;`-delimited UTF-8 file, replacing whatever
/// was there. Rows may differ in width.
pub fn write_delimited<P, R, F>(path: P, rows: R, headers: Option<&[&str]>) -> Result<()>
where
    P: AsRef<Path>,
    R: IntoIterator,
    R::Item: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)?;

    if let Some(headers) = headers {
        writer.write_record(headers)?;
    }
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
