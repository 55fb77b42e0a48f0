//! Wire protocol module.
//!
//! Defines the request type and message framing for broker connections.
//!
//! ## Wire Format
//!
//! Messages are length-prefixed JSON:
//! ```text
//! [4 bytes: ASCII decimal length, zero-padded][JSON payload]
//! ```
//!
//! The payload uses `", "` and `": "` separators and escapes non-ASCII
//! characters as `\uXXXX`, so every payload is plain ASCII.

mod format;
mod frame;
mod request;

pub use format::{to_vec, SpacedFormatter};
pub use frame::{Frame, MAX_PAYLOAD_SIZE, PREFIX_LEN};
pub use request::{Request, PROCESS_METHOD};
