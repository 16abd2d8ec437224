//! Domain types shared by every camvisor crate.
//!
//! - [`CameraSpec`] and the `cameras.config` parser;
//! - [`WorkerKind`], the stable identity of a supervised worker;
//! - [`RecordingName`], the on-disk naming convention of recorded segments.

mod camera;
pub use camera::{CameraSpec, load_cameras, parse_cameras};

mod error;
pub use error::ConfigError;

mod recording;
pub use recording::{
    FILE_DATE_FORMAT, FOLDER_DATE_FORMAT, RECORDING_EXTENSION, RecordingLayout, RecordingName, folder_name,
    parse_folder_name,
};

mod worker;
pub use worker::WorkerKind;
