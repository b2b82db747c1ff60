// SPDX-License-Identifier: MIT

//! Structured logging for engine events.
//!
//! Message types follow a struct-based pattern with a `Display`
//! implementation plus a [`StructuredLog`] impl that emits the message
//! through `tracing` with its fields attached. This keeps log strings
//! out of the engine code paths and the field names consistent.

pub mod messages;

/// A loggable engine event with structured fields.
pub trait StructuredLog {
    /// Emit this message through `tracing` at its designated level.
    fn log(&self);
}
