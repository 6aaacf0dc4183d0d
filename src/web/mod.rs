//! Web front end for neurogrid.
//!
//! Provides a browser view of the simulation using Axum + WebSocket.
//!
//! ## Architecture
//!
//! - **Simulation Thread**: ticks the world at `tick_interval_ms`
//! - **WebSocket** (`/ws`): broadcasts every snapshot as JSON
//! - **REST API** (`/api/...`): health, config, food placement, loop control
//!
//! ## Usage
//!
//! ```no_run
//! use neurogrid::Config;
//! use neurogrid::web::run_server;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::default();
//!     run_server(config, "127.0.0.1:8080".parse().unwrap(), "public".into())
//!         .await
//!         .unwrap();
//! }
//! ```

mod routes;
mod server;
mod state;
mod websocket;

pub use server::{run_server, MAIN_SIMULATION};
