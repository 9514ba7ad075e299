//! Save-document codec
//!
//! Encounter progress is persisted as a self-describing JSON document:
//! a header naming the owning encounter script, a positional array of boss
//! states, and an optional map of named numeric values. The codec is strict
//! about structure and lenient about schema drift, so a save written before
//! a boss was added (or after one was removed) degrades instead of
//! corrupting unrelated data.

mod codec;
mod document;
mod error;

pub use codec::{SaveCodec, ValueKind};
pub use document::{AdditionalValue, SaveDocument};
pub use error::SaveError;
