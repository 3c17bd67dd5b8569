//! Rust library for monitoring and controlling Calaos home-automation servers
//!
//! This library provides an async API for discovering a Calaos server on
//! the local network, loading its home configuration, and keeping a local
//! mirror of every item's state synchronized through the server's polling
//! API. It supports:
//!
//! - Server discovery via UDP broadcast
//! - Loading rooms and items from the home configuration
//! - State polling with automatic queue (re)registration
//! - Change events with typed, per-item-type state values
//! - Output commands (lights, dimmers, shutters, timers, registers)
//!
//! # Quick Start
//!
//! ```no_run
//! use calaos_client::{discover, CalaosClient, DISCOVERY_TIMEOUT};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Find a server on the local network
//!     let address = discover(DISCOVERY_TIMEOUT).await?;
//!
//!     // Connect and load the home configuration
//!     let mut client =
//!         CalaosClient::connect(format!("https://{address}"), "user", "secret").await?;
//!
//!     for room in client.rooms() {
//!         println!("{}", room);
//!         for item in room.items() {
//!             println!("  {} = {}", item, item.state());
//!         }
//!     }
//!
//!     // Actuate an output
//!     if let Some(lamp) = client.items_by_type("WODigital").first() {
//!         lamp.turn_on().await?;
//!     }
//!
//!     // Watch for state changes
//!     loop {
//!         for event in client.poll().await? {
//!             println!("{}", event);
//!         }
//!         tokio::time::sleep(std::time::Duration::from_millis(500)).await;
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized into several layers:
//!
//! - **Discovery**: UDP broadcast lookup of the server address
//! - **Client**: snapshot loading and the poll loop producing change events
//! - **Home/Room/Item**: the mirrored installation with typed item states
//! - **State**: per-type translation between wire strings and typed values
//! - **Connection**: JSON-over-HTTP(S) exchange with injected credentials

mod client;
mod connection;
mod discovery;
mod error;
mod home;
mod item;
mod protocol;
mod state;

// Public exports
pub use client::CalaosClient;
pub use discovery::{discover, DISCOVERY_TIMEOUT};
pub use error::{CalaosError, Result};
pub use home::Room;
pub use item::{Event, Item};
pub use protocol::IoDirection;
pub use state::{ClickCount, ClickDuration, ShutterAction, StateValue, Translator};
