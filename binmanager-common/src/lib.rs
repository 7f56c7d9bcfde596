// binmanager-common - Shared vocabulary for the bin-placement engine
//
// This crate defines the types every other crate in the workspace needs to
// agree on: the opaque location identifier, the UTC clock abstraction, and
// the typed snapshot-decode failure.

mod clock;
mod error;
mod location_id;

pub use clock::{Clock, ManualClock, SystemClock, UtcInstant};
pub use error::SnapshotError;
pub use location_id::LocationId;
