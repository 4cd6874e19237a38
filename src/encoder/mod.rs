mod container;
mod session;

pub use session::OggOpusEncoder;

/// Granule positions and pre-skip are always counted at 48kHz, whatever the
/// input rate (the Ogg/Opus mapping fixes this clock)
pub const OPUS_GRANULE_RATE: u32 = 48_000;
/// Frame duration handed to libopus (20ms is the standard Opus frame)
pub const FRAME_DURATION_MS: u32 = 20;
/// Channels (mono voice stream)
pub const CHANNELS: u8 = 1;

/// Samples per 20ms frame at the given input rate (960 at 48kHz)
pub const fn frame_samples(sample_rate: u32) -> usize {
    (sample_rate * FRAME_DURATION_MS / 1000) as usize
}
