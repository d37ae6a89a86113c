//! Storage layer
//!
//! The on-disk side of the store: one append-only file of JSON records.
//!
//! ## Layout
//!
//! - **codec**: record format, encoder and streaming decoder
//! - **log**: the `events.json` file handle, with replay on open
//! - **error**: typed storage and codec errors

mod codec;
mod error;
mod log;

pub use codec::{encode, encode_to_vec, read_all, Decoded, LogReader};
pub use error::{CodecError, FileOp, StoreError, StoreResult};
pub use log::{EventLog, EVENTS_FILE};
