//! File handler that starts a new file per day (or month, or year) and keeps
//! a bounded number of old files.

use chrono::{DateTime, Utc};
use logweave_types::{
    handler_options, Binding, BoundArgs, Handler, HandlerDescriptor, HandlerOptions,
    LogweaveError, ParamDefault, ParamDescriptor, Record, Result, Rotating,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{parse_permission, LazyFile};
use crate::formatter::format_line;

/// One file per day.
pub const FILE_PER_DAY: &str = "%Y-%m-%d";
/// One file per month.
pub const FILE_PER_MONTH: &str = "%Y-%m";
/// One file per year.
pub const FILE_PER_YEAR: &str = "%Y";

const DEFAULT_FILENAME_FORMAT: &str = "{filename}-{date}";

static DATE_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^%Y(([/_.-]?%m)([/_.-]?%d)?)?$").expect("static regex")
});

const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor::required("filename"),
    ParamDescriptor::optional("maxFiles", ParamDefault::Int(0)),
    ParamDescriptor::nullable("filePermission"),
];

/// Registry entry for `RotatingFileHandler`.
pub const DESCRIPTOR: HandlerDescriptor = HandlerDescriptor {
    class: "RotatingFileHandler",
    binding: Binding::Named(PARAMS),
    default_bubble: true,
    construct: RotatingFileHandler::construct,
};

/// Writes to `{filename}-{date}.{ext}` next to the configured file name.
#[derive(Debug)]
pub struct RotatingFileHandler {
    options: HandlerOptions,
    filename: PathBuf,
    max_files: usize,
    filename_format: String,
    date_format: String,
    file: LazyFile,
}

impl RotatingFileHandler {
    /// Create a daily rotating handler.
    pub fn new(filename: impl Into<PathBuf>, max_files: usize) -> Self {
        Self {
            options: HandlerOptions::default(),
            filename: filename.into(),
            max_files,
            filename_format: DEFAULT_FILENAME_FORMAT.to_string(),
            date_format: FILE_PER_DAY.to_string(),
            file: LazyFile::new(None),
        }
    }

    fn construct(mut args: BoundArgs) -> Result<Box<dyn Handler>> {
        let filename = args.require_string("filename")?;
        let max_files = args.take_u64("maxFiles")?.unwrap_or(0) as usize;
        let permission = parse_permission(args.target(), args.take_raw("filePermission"))?;

        let mut handler = Self::new(filename, max_files);
        handler.file = LazyFile::new(permission);
        Ok(Box::new(handler))
    }

    /// Filename template.
    pub fn filename_format(&self) -> &str {
        &self.filename_format
    }

    /// Date format substituted for `{date}`.
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Number of files kept, 0 for unlimited.
    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// File a record stamped at `datetime` is written to.
    pub fn timed_filename(&self, datetime: &DateTime<Utc>) -> PathBuf {
        let date = datetime.format(&self.date_format).to_string();
        self.path_for(&date)
    }

    fn path_for(&self, date: &str) -> PathBuf {
        let stem = self
            .filename
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut name = self
            .filename_format
            .replace("{filename}", &stem)
            .replace("{date}", date);
        if let Some(ext) = self.filename.extension() {
            name.push('.');
            name.push_str(&ext.to_string_lossy());
        }

        match self.filename.parent() {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Remove the oldest files beyond `max_files`.
    fn rotate(&self, current: &Path) {
        if self.max_files == 0 {
            return;
        }

        let dir = match current.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        // Match any date in place of `{date}`.
        let template = self.path_for("\u{0}");
        let template = template
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pattern = regex::escape(&template).replace('\u{0}', "[0-9/_.-]+");
        let matcher = match Regex::new(&format!("^{}$", pattern)) {
            Ok(matcher) => matcher,
            Err(_) => return,
        };

        let mut files: Vec<PathBuf> = match fs::read_dir(&dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .map(|n| matcher.is_match(&n.to_string_lossy()))
                        .unwrap_or(false)
                })
                .collect(),
            Err(_) => return,
        };

        if files.len() <= self.max_files {
            return;
        }

        // Newest first; dates sort lexicographically.
        files.sort_by(|a, b| b.cmp(a));
        for old in files.into_iter().skip(self.max_files) {
            if old != current {
                if let Err(e) = fs::remove_file(&old) {
                    warn!("Failed to remove rotated log file {}: {}", old.display(), e);
                }
            }
        }
    }
}

impl Rotating for RotatingFileHandler {
    fn set_filename_format(
        &mut self,
        filename_format: Option<&str>,
        date_format: Option<&str>,
    ) -> Result<()> {
        let invalid = |parameter: &str, reason: String| LogweaveError::InvalidParameter {
            parameter: parameter.to_string(),
            target: DESCRIPTOR.class.to_string(),
            reason,
        };

        if let Some(date_format) = date_format {
            if !DATE_FORMAT.is_match(date_format) {
                return Err(invalid(
                    "dateFormat",
                    format!(
                        "'{}' must be a combination of %Y, %m and %d, e.g. '{}', '{}' or '{}'",
                        date_format, FILE_PER_DAY, FILE_PER_MONTH, FILE_PER_YEAR
                    ),
                ));
            }
            self.date_format = date_format.to_string();
        }

        if let Some(filename_format) = filename_format {
            if !filename_format.contains("{date}") {
                return Err(invalid(
                    "filenameFormat",
                    format!("'{}' must contain {{date}}", filename_format),
                ));
            }
            self.filename_format = filename_format.to_string();
        }

        Ok(())
    }
}

impl Handler for RotatingFileHandler {
    handler_options!();

    fn handle(&self, record: &Record) -> Result<bool> {
        let path = self.timed_filename(&record.datetime);
        if self.file.write(&path, &format_line(record))? {
            self.rotate(&path);
        }
        Ok(!self.options.bubble)
    }

    fn close(&self) -> Result<()> {
        self.file.flush()
    }

    fn as_rotating(&mut self) -> Option<&mut dyn Rotating> {
        Some(self)
    }
}
