use crate::document::ConfigDocument;
use crate::GeneratorError;
use chrono::{DateTime, TimeZone};
use std::path::{Path, PathBuf};

/// `{prefix}-config-{YYMMDDHHMM}.json`, stamped in the given zone.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use proxykit_generator::export_filename;
///
/// let at = Utc.with_ymd_and_hms(2025, 3, 9, 7, 5, 0).unwrap();
/// assert_eq!(export_filename("proxykit", &at), "proxykit-config-2503090705.json");
/// ```
pub fn export_filename<Tz: TimeZone>(prefix: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{prefix}-config-{}.json", at.format("%y%m%d%H%M"))
}

/// Write `doc` into `dir` under a timestamped name and return the path.
pub fn write_document<Tz: TimeZone>(
    dir: &Path,
    prefix: &str,
    at: &DateTime<Tz>,
    doc: &ConfigDocument,
) -> Result<PathBuf, GeneratorError>
where
    Tz::Offset: std::fmt::Display,
{
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(prefix, at));
    std::fs::write(&path, doc.to_json()?)?;
    tracing::info!(path = %path.display(), entries = doc.data.len(), "generator.export.written");
    Ok(path)
}
