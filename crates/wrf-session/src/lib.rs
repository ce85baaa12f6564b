//! WRF01 Session Engine
//!
//! Stateful side of the WRF01 serial protocol, built on `wrf-protocol`:
//!
//! - [`Engine`]: byte-level state machine, response dispatch, send queue
//!   and file upload, for a single module over any [`std::io::Write`] sink
//! - [`SessionEvents`]: callbacks the engine invokes, all optional
//! - [`CommandSink`]: the request surface, implemented by the engine and by
//!   the [`Outbox`] lent to callbacks
//! - [`PollScheduler`]: interval polling for waiting cloud messages
//!
//! # Example
//!
//! ```rust,ignore
//! use wrf_session::{CommandSink, Engine, EngineConfig};
//!
//! let mut engine = Engine::new(uart, MyHandler::default(), EngineConfig::default());
//! engine.request_status()?;
//!
//! loop {
//!     for byte in uart_rx.drain() {
//!         engine.register_byte(byte)?;
//!     }
//!     engine.handle_send_queue()?;
//! }
//! ```

mod config;
mod engine;
mod error;
mod events;
mod poll;
mod queue;
mod transfer;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use poll::*;
pub use queue::*;
pub use transfer::*;
