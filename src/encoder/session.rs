use opus::{Application, Bitrate, Channels, Encoder};
use std::path::Path;

use super::container::OggStreamWriter;
use super::{frame_samples, OPUS_GRANULE_RATE};
use crate::error::EncoderError;

/// Sample rates libopus accepts for encoding
const SUPPORTED_SAMPLE_RATES: [u32; 5] = [8000, 12000, 16000, 24000, 48000];

/// Maximum Opus packet size (as recommended in the libopus docs)
const MAX_PACKET_SIZE: usize = 4000;

enum State {
    Uninitialized,
    Active(Box<ActiveStream>),
    Released,
}

struct ActiveStream {
    encoder: Encoder,
    writer: OggStreamWriter,
    /// PCM waiting for a complete 20ms frame
    pending: Vec<i16>,
    /// Samples per 20ms frame at the input rate
    frame_size: usize,
    /// 48kHz granule units per input sample (6 at 8kHz, 1 at 48kHz)
    granule_factor: u64,
    /// Encoder lookahead, already converted to 48kHz units
    pre_skip: u64,
    /// Real input samples encoded so far (input-rate units, padding excluded)
    samples_encoded: u64,
}

/// One encode-PCM-to-an-Ogg/Opus-file session.
///
/// Lifecycle: `Uninitialized -> (init ok) -> Active -> (release) -> Released`.
/// A failed `init` leaves the session `Uninitialized`; `Released` is terminal.
/// Every operation other than `init` returns [`EncoderError::InvalidState`]
/// outside `Active` instead of touching a dead handle.
///
/// Not internally synchronized: callers drive one session from one logical
/// context at a time. Independent sessions share nothing and may run in
/// parallel.
pub struct OggOpusEncoder {
    state: State,
}

impl OggOpusEncoder {
    pub fn new() -> Self {
        Self {
            state: State::Uninitialized,
        }
    }

    /// Open `path` for writing and set up a mono Opus encoder at
    /// `sample_rate`, writing the Ogg/Opus stream headers immediately.
    ///
    /// On failure nothing is left half-open: the file handle closes when the
    /// stream writer drops, and the session stays `Uninitialized`.
    pub fn init(&mut self, path: impl AsRef<Path>, sample_rate: u32) -> Result<(), EncoderError> {
        if !matches!(self.state, State::Uninitialized) {
            tracing::error!("init called on an already-initialised or released session");
            return Err(EncoderError::InvalidState);
        }
        if !SUPPORTED_SAMPLE_RATES.contains(&sample_rate) {
            tracing::error!("Unsupported sample rate: {} Hz", sample_rate);
            return Err(EncoderError::UnsupportedSampleRate(sample_rate));
        }

        let path = path.as_ref();
        let mut encoder = Encoder::new(sample_rate, Channels::Mono, Application::Audio)
            .map_err(|e| {
                tracing::error!("Failed to create Opus encoder: {}", e);
                e
            })?;

        let granule_factor = u64::from(OPUS_GRANULE_RATE / sample_rate);
        // Lookahead is reported at the input rate; the OpusHead pre-skip
        // field wants it on the 48kHz clock.
        let pre_skip = encoder.get_lookahead()? as u64 * granule_factor;

        let mut writer = OggStreamWriter::create(path).map_err(|e| {
            tracing::error!("Failed to create output file {}: {}", path.display(), e);
            e
        })?;
        writer.write_id_header(pre_skip as u16, sample_rate)?;
        writer.write_comment_header()?;

        self.state = State::Active(Box::new(ActiveStream {
            encoder,
            writer,
            pending: Vec::with_capacity(frame_samples(sample_rate)),
            frame_size: frame_samples(sample_rate),
            granule_factor,
            pre_skip,
            samples_encoded: 0,
        }));

        tracing::info!("Encoding Ogg/Opus to {} at {} Hz", path.display(), sample_rate);
        Ok(())
    }

    /// Ask the live encoder to target `bitrate` bits per second.
    ///
    /// Advisory: a rejected bitrate leaves the session `Active` and
    /// subsequent [`write_frame`](Self::write_frame) calls unaffected.
    pub fn set_bitrate(&mut self, bitrate: i32) -> Result<(), EncoderError> {
        let stream = self.active_mut()?;
        stream
            .encoder
            .set_bitrate(Bitrate::Bits(bitrate))
            .map_err(|e| {
                tracing::error!("Failed to set bitrate to {} bps: {}", bitrate, e);
                e.into()
            })
    }

    /// Encode the first `samples_per_channel` entries of `samples` (PCM-16
    /// mono) and append the resulting packets to the stream.
    ///
    /// The count does not need to align to the 20ms frame size; leftover
    /// samples wait in the session until the next call or `release`.
    /// Returns the encoded bytes written by this call. An error is fatal to
    /// the output's integrity: stop writing and `release`.
    pub fn write_frame(
        &mut self,
        samples: &[i16],
        samples_per_channel: usize,
    ) -> Result<usize, EncoderError> {
        let stream = self.active_mut()?;
        if samples_per_channel == 0 || samples_per_channel > samples.len() {
            tracing::error!(
                "Invalid frame length: {} requested, {} supplied",
                samples_per_channel,
                samples.len()
            );
            return Err(EncoderError::BadFrameLength {
                requested: samples_per_channel,
                available: samples.len(),
            });
        }

        stream.pending.extend_from_slice(&samples[..samples_per_channel]);

        let mut written = 0;
        while stream.pending.len() >= stream.frame_size {
            written += stream.encode_frame(false).map_err(|e| {
                tracing::error!("Failed to encode frame: {}", e);
                e
            })?;
        }
        Ok(written)
    }

    /// Drain pending PCM, close the Ogg stream, and flush the file; then the
    /// encoder and the stream writer are freed, in that order.
    ///
    /// Idempotent: calling again, or before `init` ever ran, is a no-op.
    /// Also runs on drop, so a forgotten `release` never truncates output.
    pub fn release(&mut self) -> Result<(), EncoderError> {
        match std::mem::replace(&mut self.state, State::Released) {
            State::Active(mut stream) => {
                // Whole frames left over from a failed write, then one final
                // (possibly silence-padded) frame carrying the end-of-stream
                // marker. The final granule only counts real input samples,
                // so decoders trim the padding.
                while stream.pending.len() >= stream.frame_size {
                    stream.encode_frame(false)?;
                }
                stream.encode_frame(true)?;
                stream.writer.finish()?;
                tracing::info!("Ogg/Opus stream finished");
                Ok(())
            }
            State::Uninitialized => {
                self.state = State::Uninitialized;
                Ok(())
            }
            State::Released => Ok(()),
        }
    }

    fn active_mut(&mut self) -> Result<&mut ActiveStream, EncoderError> {
        match &mut self.state {
            State::Active(stream) => Ok(stream),
            State::Uninitialized | State::Released => Err(EncoderError::InvalidState),
        }
    }
}

impl Default for OggOpusEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OggOpusEncoder {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("Failed to finish stream on drop: {}", e);
        }
    }
}

impl ActiveStream {
    /// Encode one 20ms frame from the pending buffer and write it out.
    ///
    /// When closing the stream the frame may be short; it is padded with
    /// silence and the padding stays out of the granule position.
    fn encode_frame(&mut self, end_of_stream: bool) -> Result<usize, EncoderError> {
        let take = self.frame_size.min(self.pending.len());
        let mut frame: Vec<i16> = self.pending.drain(..take).collect();
        frame.resize(self.frame_size, 0);

        let mut packet = vec![0u8; MAX_PACKET_SIZE];
        let n = self.encoder.encode(&frame, &mut packet)?;
        packet.truncate(n);

        self.samples_encoded += take as u64;
        let granule_position = self.pre_skip + self.samples_encoded * self.granule_factor;
        self.writer
            .write_audio_packet(packet, granule_position, end_of_stream)?;
        Ok(n)
    }
}
