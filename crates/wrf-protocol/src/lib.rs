//! WRF01 Serial Protocol
//!
//! This crate provides the wire vocabulary for talking to a WRF01 Wi-Fi
//! companion module over a serial line. It is stateless: building requests,
//! framing them, and classifying replies. The session logic that sequences
//! requests and runs file uploads lives in `wrf-session`.
//!
//! # Protocol Overview
//!
//! - **Requests** (host → module): JSON text wrapped as
//!   `{"devicedrive":{"command":...}}` and terminated with EOT (0x04)
//! - **Responses** (module → host): JSON text terminated with EOT
//! - **Power-up** (module → host): the two bytes STX ETX
//! - **File upload**: binary packets gated by single ACK/NAK/CAN bytes
//!
//! # Example
//!
//! ```rust,ignore
//! use wrf_protocol::{encode_message, Command, Response};
//!
//! // Build a request
//! let frame = encode_message(&Command::Status.encode()?);
//!
//! // Classify a reply (EOT already stripped)
//! let response = Response::decode(r#"{"devicedrive":{"result":"OK"}}"#);
//! ```

mod commands;
mod constants;
mod error;
mod frame;
mod responses;
mod types;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use responses::*;
pub use types::*;
