//! # rclonectl-units
//!
//! Named units the daemon can run on request.
//!
//! [`resolve`] finds a unit's declaration, [`bind`] turns it into a [`Unit`]
//! with a handler chosen by kind, and [`Unit::start`] / [`Unit::stop`] run
//! that handler against a live [`RemoteControl`](rclonectl_daemon::RemoteControl).

pub mod error;
pub mod outcome;
pub mod protocol;
pub mod registry;
pub mod unit;

pub use error::UnitError;
pub use outcome::{JobId, JobOutcome};
pub use protocol::{RcRequest, ServeHandler};
pub use registry::{list, unit_names, UnitSummary};
pub use unit::{bind, resolve, Lifecycle, MountHandler, Unit, UnitKind};
