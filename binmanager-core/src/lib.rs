// binmanager-core - the bin-based content-placement engine.
//
// Wires together the bin table, the location index, the balance ordering,
// and the snapshot codec behind a single `Engine<C>` type.

mod bin_table;
mod codec;
mod engine;
mod location;
mod metrics;
mod ordering;

pub use bin_table::BIN_COUNT;
pub use codec::{AssignmentRecord, BinMappings};
pub use engine::Engine;
pub use metrics::{EngineMetrics, MetricsSnapshot};
