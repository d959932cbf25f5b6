//! Audio I/O modules
//!
//! Shared sample buffers handed in by the audio-loading side. Format decoding
//! happens outside this crate.

pub mod sample_buffer;
