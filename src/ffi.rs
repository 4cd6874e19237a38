//! C boundary mirroring the four foreign entry points, plus explicit
//! construction and destruction of the session they operate on.
//!
//! Every function takes the session as an opaque pointer; there is no
//! process-wide default instance. The session is not internally
//! synchronized, so foreign callers must serialize calls on one session
//! (the usual pattern is a single dedicated recording thread).

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};

use crate::error::status;
use crate::OggOpusEncoder;

/// Allocate a fresh, uninitialized session. Must be paired with
/// [`oggopus_encoder_free`].
#[no_mangle]
pub extern "C" fn oggopus_encoder_new() -> *mut OggOpusEncoder {
    Box::into_raw(Box::new(OggOpusEncoder::new()))
}

/// Destroy a session, draining and closing its stream first if it is still
/// active. Passing null is a no-op.
///
/// # Safety
/// `enc` must be null or a pointer from [`oggopus_encoder_new`] that has not
/// been freed yet.
#[no_mangle]
pub unsafe extern "C" fn oggopus_encoder_free(enc: *mut OggOpusEncoder) {
    if !enc.is_null() {
        drop(Box::from_raw(enc));
    }
}

/// Bind the session to `path` (UTF-8, NUL-terminated) at `sample_rate` Hz.
/// Returns 0 on success or a negative status code.
///
/// # Safety
/// `enc` must be a live session pointer; `path` must be null (rejected) or a
/// valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn oggopus_encoder_init(
    enc: *mut OggOpusEncoder,
    path: *const c_char,
    sample_rate: c_int,
) -> c_int {
    let Some(session) = enc.as_mut() else {
        return status::BAD_ARGUMENT;
    };
    if path.is_null() || sample_rate <= 0 {
        return status::BAD_ARGUMENT;
    }
    let Ok(path) = CStr::from_ptr(path).to_str() else {
        tracing::error!("Output path is not valid UTF-8");
        return status::BAD_ARGUMENT;
    };
    match session.init(path, sample_rate as u32) {
        Ok(()) => status::OK,
        Err(e) => e.status_code(),
    }
}

/// Request a target bitrate in bits per second. Returns 0 on success; a
/// failure leaves the session usable.
///
/// # Safety
/// `enc` must be null (rejected) or a live session pointer.
#[no_mangle]
pub unsafe extern "C" fn oggopus_encoder_set_bitrate(
    enc: *mut OggOpusEncoder,
    bitrate: c_int,
) -> c_int {
    let Some(session) = enc.as_mut() else {
        return status::BAD_ARGUMENT;
    };
    match session.set_bitrate(bitrate) {
        Ok(()) => status::OK,
        Err(e) => e.status_code(),
    }
}

/// Encode `samples_per_channel` PCM-16 mono samples. Returns the encoded
/// bytes written (>= 0) or a negative status code.
///
/// # Safety
/// `enc` must be null (rejected) or a live session pointer; `samples` must
/// point at least `samples_per_channel` readable `i16`s.
#[no_mangle]
pub unsafe extern "C" fn oggopus_encoder_write_frame(
    enc: *mut OggOpusEncoder,
    samples: *const i16,
    samples_per_channel: c_int,
) -> c_int {
    let Some(session) = enc.as_mut() else {
        return status::BAD_ARGUMENT;
    };
    if samples.is_null() || samples_per_channel <= 0 {
        return status::BAD_ARGUMENT;
    }
    let samples = std::slice::from_raw_parts(samples, samples_per_channel as usize);
    match session.write_frame(samples, samples.len()) {
        Ok(written) => written.min(c_int::MAX as usize) as c_int,
        Err(e) => e.status_code(),
    }
}

/// Drain and close the stream. Safe to call at any point in the lifecycle,
/// any number of times; failures are logged, matching the original void
/// signature.
///
/// # Safety
/// `enc` must be null (no-op) or a live session pointer.
#[no_mangle]
pub unsafe extern "C" fn oggopus_encoder_release(enc: *mut OggOpusEncoder) {
    let Some(session) = enc.as_mut() else {
        return;
    };
    if let Err(e) = session.release() {
        tracing::error!("Failed to release encoder: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::ptr;

    #[test]
    fn full_lifecycle_over_the_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let path = CString::new(dir.path().join("out.opus").to_str().unwrap()).unwrap();

        let enc = oggopus_encoder_new();
        unsafe {
            assert_eq!(oggopus_encoder_init(enc, path.as_ptr(), 48000), status::OK);
            assert_eq!(oggopus_encoder_set_bitrate(enc, 24000), status::OK);

            let samples = [0i16; 960];
            let written = oggopus_encoder_write_frame(enc, samples.as_ptr(), 960);
            assert!(written >= 0);

            oggopus_encoder_release(enc);
            oggopus_encoder_free(enc);
        }
        assert!(dir.path().join("out.opus").exists());
    }

    #[test]
    fn write_before_init_reports_invalid_state() {
        let enc = oggopus_encoder_new();
        unsafe {
            let samples = [0i16; 960];
            assert_eq!(
                oggopus_encoder_write_frame(enc, samples.as_ptr(), 960),
                status::INVALID_STATE
            );
            oggopus_encoder_free(enc);
        }
    }

    #[test]
    fn null_arguments_are_rejected_not_dereferenced() {
        unsafe {
            assert_eq!(
                oggopus_encoder_init(ptr::null_mut(), ptr::null(), 48000),
                status::BAD_ARGUMENT
            );
            assert_eq!(
                oggopus_encoder_write_frame(ptr::null_mut(), ptr::null(), 960),
                status::BAD_ARGUMENT
            );
            assert_eq!(
                oggopus_encoder_set_bitrate(ptr::null_mut(), 24000),
                status::BAD_ARGUMENT
            );
            oggopus_encoder_release(ptr::null_mut());
            oggopus_encoder_free(ptr::null_mut());

            let enc = oggopus_encoder_new();
            assert_eq!(
                oggopus_encoder_init(enc, ptr::null(), 48000),
                status::BAD_ARGUMENT
            );
            let samples = [0i16; 4];
            assert_eq!(
                oggopus_encoder_write_frame(enc, samples.as_ptr(), 0),
                status::BAD_ARGUMENT
            );
            oggopus_encoder_free(enc);
        }
    }

    #[test]
    fn unsupported_rate_code_comes_back_over_the_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let path = CString::new(dir.path().join("out.opus").to_str().unwrap()).unwrap();

        let enc = oggopus_encoder_new();
        unsafe {
            assert_eq!(
                oggopus_encoder_init(enc, path.as_ptr(), 44100),
                status::UNSUPPORTED_SAMPLE_RATE
            );
            oggopus_encoder_free(enc);
        }
    }
}
