//! Terminal feedback while sampling
//!
//! Progress is drawn with indicatif on stderr so the report on stdout stays
//! clean.

mod progress;

pub use progress::SampleProgress;
