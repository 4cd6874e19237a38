//! Ogg/Opus file encoder with a C boundary for foreign runtimes.
//!
//! One [`OggOpusEncoder`] session owns one encode-to-file operation: `init`
//! binds it to an output path and sample rate, `set_bitrate` tunes the
//! encoder, `write_frame` streams PCM-16 mono audio into the Ogg container,
//! and `release` drains and closes the stream. The [`ffi`] module re-exposes
//! the same four operations over `extern "C"` for the `cdylib`/`staticlib`
//! builds.

mod encoder;
mod error;
pub mod ffi;

pub use encoder::{frame_samples, OggOpusEncoder, FRAME_DURATION_MS, OPUS_GRANULE_RATE};
pub use error::{status, EncoderError};
