//! Everything needed to run a simulation on its own thread and observe it.
//!
//! Used by the web server and by anything else that wants a live
//! simulation without owning the tick loop.

pub mod commands;
pub mod registry;
pub mod sim_thread;
pub mod snapshot;

pub use commands::{SimCommand, SimState};
pub use registry::SimulationRegistry;
pub use sim_thread::SimulationHandle;
pub use snapshot::{CreatureView, SnapshotStats, WorldSnapshot};
