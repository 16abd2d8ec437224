//! Naming convention of recorded segments.
//!
//! A segment is written by the encoder as `<camera>_<FILE_DATE_FORMAT>.mp4`,
//! optionally inside a `<FOLDER_DATE_FORMAT>` bucket directory. The embedded
//! timestamp is the start of the segment in local time.

use std::{fmt, str::FromStr};

use time::{
    Date, PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

/// strftime pattern of the segment start timestamp embedded in file names.
pub const FILE_DATE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// strftime pattern of the per-day bucket directory.
pub const FOLDER_DATE_FORMAT: &str = "%Y-%m-%d";

/// Extension of recorded segments (container is always mp4).
pub const RECORDING_EXTENSION: &str = ".mp4";

/// `YYYY-MM-DD_hh-mm-ss`
const STAMP_LEN: usize = 19;

const STAMP_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
const FOLDER_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// How segments are arranged under the recording root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordingLayout {
    /// `<root>/<YYYY-MM-DD>/<camera>_<stamp>.mp4`
    #[default]
    Dated,
    /// `<root>/<camera>_<stamp>.mp4`
    Flat,
}

impl FromStr for RecordingLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dated" => Ok(RecordingLayout::Dated),
            "flat" => Ok(RecordingLayout::Flat),
            other => Err(format!("unknown layout {other:?} (expected: dated|flat)")),
        }
    }
}

/// Parsed name of one recorded segment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordingName {
    pub camera: String,
    pub started_at: PrimitiveDateTime,
}

impl RecordingName {
    pub fn new(camera: impl Into<String>, started_at: PrimitiveDateTime) -> Self {
        Self {
            camera: camera.into(),
            started_at,
        }
    }

    /// Parses a bare file name (no directory part).
    ///
    /// Returns `None` for anything that is not a recording: wrong extension,
    /// missing camera prefix or an invalid calendar timestamp.
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(RECORDING_EXTENSION)?;
        let split = stem.len().checked_sub(STAMP_LEN)?;
        if !stem.is_char_boundary(split) {
            return None;
        }
        let (head, stamp) = stem.split_at(split);
        let camera = head.strip_suffix('_')?;
        if camera.is_empty() {
            return None;
        }

        let started_at = PrimitiveDateTime::parse(stamp, STAMP_FORMAT).ok()?;
        Some(Self::new(camera, started_at))
    }

    /// Renders the file name this recording is stored under.
    pub fn file_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RecordingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stamp = self.started_at.format(STAMP_FORMAT).map_err(|_| fmt::Error)?;
        write!(f, "{}_{stamp}{RECORDING_EXTENSION}", self.camera)
    }
}

/// Renders the bucket directory name of `date` (`YYYY-MM-DD`).
pub fn folder_name(date: Date) -> String {
    // `Date`'s own Display is the same ISO form
    date.format(FOLDER_FORMAT).unwrap_or_else(|_| date.to_string())
}

/// Parses a bucket directory name back into its date.
pub fn parse_folder_name(name: &str) -> Option<Date> {
    Date::parse(name, FOLDER_FORMAT).ok()
}
