//! Reader and encoder subtype selection.

use tracing::debug;

use mfcapture_device::guids::*;
use mfcapture_device::friendly_guid_name;
use mfcapture_ipc::{MediaKind, OutputFormat};

/// Uncompressed or decodable audio subtypes the reader may deliver.
pub const AUDIO_READER_SUBTYPES: [u128; 8] = [
    MF_AUDIO_FORMAT_FLOAT,
    MF_AUDIO_FORMAT_WMAUDIO_V8,
    MF_AUDIO_FORMAT_WMAUDIO_V9,
    MF_AUDIO_FORMAT_WMAUDIO_LOSSLESS,
    MF_AUDIO_FORMAT_MP3,
    MF_AUDIO_FORMAT_MPEG,
    MF_AUDIO_FORMAT_AAC,
    MF_AUDIO_FORMAT_PCM,
];

/// Video subtypes the encoders (via the color converter) accept.
pub const VIDEO_READER_SUBTYPES: [u128; 6] = [
    MF_VIDEO_FORMAT_NV12,
    MF_VIDEO_FORMAT_YUY2,
    MF_VIDEO_FORMAT_UYVY,
    MF_VIDEO_FORMAT_RGB32,
    MF_VIDEO_FORMAT_RGB24,
    MF_VIDEO_FORMAT_IYUV,
];

pub fn reader_subtypes(kind: MediaKind) -> &'static [u128] {
    match kind {
        MediaKind::Audio => &AUDIO_READER_SUBTYPES,
        MediaKind::Video => &VIDEO_READER_SUBTYPES,
    }
}

pub fn major_type(kind: MediaKind) -> u128 {
    match kind {
        MediaKind::Audio => MF_MEDIA_TYPE_AUDIO,
        MediaKind::Video => MF_MEDIA_TYPE_VIDEO,
    }
}

/// Encoded subtype written into the container.
pub fn encoder_subtype(format: OutputFormat) -> u128 {
    match format {
        OutputFormat::Wma => MF_AUDIO_FORMAT_WMAUDIO_V8,
        OutputFormat::Mp3 => MF_AUDIO_FORMAT_MP3,
        OutputFormat::Mp4 => MF_VIDEO_FORMAT_H264,
        OutputFormat::Wmv => MF_VIDEO_FORMAT_WMV3,
    }
}

/// Pick the reader output subtype.
///
/// If `native` is acceptable it is applied unchanged (`apply(None)`).
/// Otherwise each acceptable subtype is tried in order with
/// `apply(Some(subtype))`; the first success wins and the error of the
/// last attempt is returned when all fail.
pub fn negotiate_subtype<E>(
    native: u128,
    acceptable: &[u128],
    mut apply: impl FnMut(Option<u128>) -> Result<(), E>,
) -> Result<u128, E> {
    let Some((last, rest)) = acceptable.split_last() else {
        apply(None)?;
        return Ok(native);
    };

    if acceptable.contains(&native) {
        debug!(subtype = %friendly_guid_name(native), "Using native subtype");
        apply(None)?;
        return Ok(native);
    }

    for &candidate in rest {
        if apply(Some(candidate)).is_ok() {
            debug!(subtype = %friendly_guid_name(candidate), "Reader converts to subtype");
            return Ok(candidate);
        }
        debug!(subtype = %friendly_guid_name(candidate), "Subtype rejected");
    }

    apply(Some(*last))?;
    debug!(subtype = %friendly_guid_name(*last), "Reader converts to subtype");
    Ok(*last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_subtypes() {
        assert_eq!(encoder_subtype(OutputFormat::Wma), MF_AUDIO_FORMAT_WMAUDIO_V8);
        assert_eq!(encoder_subtype(OutputFormat::Mp3), MF_AUDIO_FORMAT_MP3);
        assert_eq!(encoder_subtype(OutputFormat::Mp4), MF_VIDEO_FORMAT_H264);
        assert_eq!(encoder_subtype(OutputFormat::Wmv), MF_VIDEO_FORMAT_WMV3);
    }

    #[test]
    fn test_native_subtype_preferred() {
        let mut calls = Vec::new();
        let chosen = negotiate_subtype::<()>(MF_VIDEO_FORMAT_YUY2, &VIDEO_READER_SUBTYPES, |s| {
            calls.push(s);
            Ok(())
        });
        assert_eq!(chosen, Ok(MF_VIDEO_FORMAT_YUY2));
        assert_eq!(calls, vec![None]);
    }

    #[test]
    fn test_native_failure_is_returned() {
        let chosen =
            negotiate_subtype(MF_AUDIO_FORMAT_PCM, &AUDIO_READER_SUBTYPES, |_| Err("busy"));
        assert_eq!(chosen, Err("busy"));
    }

    #[test]
    fn test_first_accepted_candidate_wins() {
        let mut tried = Vec::new();
        let chosen = negotiate_subtype::<u128>(MF_VIDEO_FORMAT_MJPG, &VIDEO_READER_SUBTYPES, |s| {
            let s = s.unwrap();
            tried.push(s);
            if s == MF_VIDEO_FORMAT_RGB32 {
                Ok(())
            } else {
                Err(s)
            }
        });
        assert_eq!(chosen, Ok(MF_VIDEO_FORMAT_RGB32));
        assert_eq!(tried, VIDEO_READER_SUBTYPES[..4].to_vec());
    }

    #[test]
    fn test_last_error_when_nothing_accepted() {
        let mut attempts = 0;
        let chosen = negotiate_subtype::<u128>(MF_VIDEO_FORMAT_MJPG, &VIDEO_READER_SUBTYPES, |s| {
            attempts += 1;
            Err(s.unwrap())
        });
        assert_eq!(chosen, Err(MF_VIDEO_FORMAT_IYUV));
        assert_eq!(attempts, VIDEO_READER_SUBTYPES.len());
    }

    #[test]
    fn test_lists_by_kind() {
        assert_eq!(reader_subtypes(MediaKind::Audio).len(), 8);
        assert_eq!(reader_subtypes(MediaKind::Video).len(), 6);
        assert_eq!(reader_subtypes(MediaKind::Audio)[0], MF_AUDIO_FORMAT_FLOAT);
        assert_eq!(major_type(MediaKind::Video), MF_MEDIA_TYPE_VIDEO);
    }
}
