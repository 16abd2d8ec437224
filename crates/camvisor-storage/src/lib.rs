//! Housekeeping of the recording root.
//!
//! - [`DiskReaper`] keeps free space above a threshold by deleting the oldest
//!   recording, one file per check;
//! - [`FolderRoller`] makes sure the dated bucket directories exist before the
//!   encoder needs them;
//! - [`SpaceProbe`] abstracts the free-space query ([`DfProbe`] in production).

mod error;
pub use error::StorageError;

mod probe;
pub use probe::{DfProbe, SpaceProbe, parse_df_available};

mod reaper;
pub use reaper::{DiskReaper, ReaperConfig, TickOutcome};

mod roller;
pub use roller::{FolderRoller, RollerConfig};
