//! MIDI message handling
//!
//! This module provides:
//! - [`MidiMessage`], the subset of MIDI messages the latency test sends and recognises
//! - [`RawMessage`], an inline, allocation free byte encoding
//! - [`StreamParser`] for decoding raw and serial byte streams
//!
mod message;
mod parser;

pub use message::{MidiMessage, RawMessage, PROBE_NOTE, PROBE_VELOCITY};
pub use parser::StreamParser;
