//! Daemon supervision and the remote-control (RC) client.
//!
//! - [`supervisor`] — launch, readiness grace period, PID file, termination
//! - [`rc`] — authenticated JSON-over-HTTP calls to the daemon

mod error;
pub mod pidfile;
pub mod rc;
pub mod supervisor;

pub use error::{RcError, StartError, StopError};
pub use rc::{RcClient, RemoteControl, LIVENESS_COMMAND};
pub use supervisor::{start, status, stop, DaemonStatus, Started, Stopped};
