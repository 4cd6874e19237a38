use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("Encoder is not active (init must succeed first)")]
    InvalidState,
    #[error("Unsupported sample rate: {0} Hz")]
    UnsupportedSampleRate(u32),
    #[error("Invalid frame length: {requested} samples requested, {available} supplied")]
    BadFrameLength { requested: usize, available: usize },
    #[error("Opus error: {0}")]
    Opus(#[from] opus::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Status codes returned over the C boundary.
///
/// libopus failures keep their native codes (-1 .. -8); everything the
/// session adds on top lives at -100 and below so callers can tell the
/// two apart.
pub mod status {
    pub const OK: i32 = 0;
    pub const INVALID_STATE: i32 = -100;
    pub const UNSUPPORTED_SAMPLE_RATE: i32 = -101;
    pub const BAD_FRAME_LENGTH: i32 = -102;
    pub const IO: i32 = -103;
    pub const BAD_ARGUMENT: i32 = -104;
}

impl EncoderError {
    pub fn status_code(&self) -> i32 {
        match self {
            EncoderError::InvalidState => status::INVALID_STATE,
            EncoderError::UnsupportedSampleRate(_) => status::UNSUPPORTED_SAMPLE_RATE,
            EncoderError::BadFrameLength { .. } => status::BAD_FRAME_LENGTH,
            EncoderError::Io(_) => status::IO,
            EncoderError::Opus(e) => opus_status_code(e.code()),
        }
    }
}

/// libopus error constants, as defined in opus_defines.h
fn opus_status_code(code: opus::ErrorCode) -> i32 {
    use opus::ErrorCode::*;
    match code {
        BadArg => -1,
        BufferTooSmall => -2,
        InternalError => -3,
        InvalidPacket => -4,
        Unimplemented => -5,
        InvalidState => -6,
        AllocFail => -7,
        Unknown => -8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_errors_stay_out_of_the_libopus_range() {
        assert!(EncoderError::InvalidState.status_code() <= -100);
        assert!(EncoderError::UnsupportedSampleRate(44100).status_code() <= -100);
        assert!(
            EncoderError::BadFrameLength {
                requested: 10,
                available: 5
            }
            .status_code()
                <= -100
        );
    }
}
