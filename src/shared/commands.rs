//! Commands for controlling a simulation thread.

use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};

use crate::error::PlaceFoodError;

/// Commands sent to the simulation thread. They are applied strictly
/// between ticks.
#[derive(Debug)]
pub enum SimCommand {
    /// Pause the tick loop
    Pause,
    /// Resume the tick loop
    Resume,
    /// Execute a single tick
    Step,
    /// Save state to the configured path
    Save,
    /// Place a food item; the outcome goes back on `reply`
    PlaceFood {
        x: i64,
        y: i64,
        reply: Sender<Result<(), PlaceFoodError>>,
    },
    /// Final save, then exit the thread
    Shutdown,
}

/// Current simulation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimState {
    /// Ticking at the configured interval
    #[default]
    Running,
    /// Waiting for commands
    Paused,
    /// Stopped after shutdown or too many failed ticks
    Stopped,
}
