//! Encoder subprocess plumbing for camvisor.
//!
//! [`StreamRecorder`] is the per-camera worker: it runs the external encoder
//! against one stream url and writes time-segmented recordings under the
//! recording root. [`probe_encoder`] is the startup capability check.

mod encoder;
pub use encoder::{EncoderConfig, encoder_args, probe_encoder, segment_template};

mod error;
pub use error::{ExecError, ExecResult};

mod recorder;
pub use recorder::{RecorderConfig, StreamRecorder};

mod util;
