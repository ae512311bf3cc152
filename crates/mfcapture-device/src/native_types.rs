//! Listing the native media types a source reader offers.

use std::fmt;

/// One native media type as friendly names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeType {
    pub major: String,
    pub subtype: String,
}

/// Native types of one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTypes {
    pub stream: u32,
    pub types: Vec<NativeType>,
}

impl fmt::Display for StreamTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Stream {}:", self.stream)?;
        for native in &self.types {
            writeln!(f, "    Type: {}/{}", native.major, native.subtype)?;
        }
        Ok(())
    }
}

#[cfg(windows)]
pub use platform::native_media_types;

#[cfg(windows)]
mod platform {
    use tracing::trace;
    use windows::Win32::Media::MediaFoundation::{
        IMFSourceReader, MF_E_INVALIDSTREAMNUMBER, MF_E_NO_MORE_TYPES, MF_MT_MAJOR_TYPE,
        MF_MT_SUBTYPE,
    };

    use super::{NativeType, StreamTypes};
    use crate::error::DeviceError;
    use crate::guid_names::guid_name;
    use crate::DeviceResult;

    /// Walk every stream until `MF_E_INVALIDSTREAMNUMBER` and every type of
    /// each stream until `MF_E_NO_MORE_TYPES`.
    pub fn native_media_types(reader: &IMFSourceReader) -> DeviceResult<Vec<StreamTypes>> {
        let mut streams = Vec::new();

        for stream in 0u32.. {
            let mut types = Vec::new();

            for index in 0u32.. {
                let media_type = match unsafe { reader.GetNativeMediaType(stream, index) } {
                    Ok(media_type) => media_type,
                    Err(e) if e.code() == MF_E_INVALIDSTREAMNUMBER => return Ok(streams),
                    Err(e) if e.code() == MF_E_NO_MORE_TYPES => break,
                    Err(e) => return Err(DeviceError::api("GetNativeMediaType failed", e)),
                };

                let major = unsafe { media_type.GetGUID(&MF_MT_MAJOR_TYPE) }?;
                let subtype = unsafe { media_type.GetGUID(&MF_MT_SUBTYPE) }?;
                trace!(stream, index, "Found native type");

                types.push(NativeType {
                    major: guid_name(&major),
                    subtype: guid_name(&subtype),
                });
            }

            streams.push(StreamTypes { stream, types });
        }

        Ok(streams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_listing_format() {
        let stream = StreamTypes {
            stream: 0,
            types: vec![
                NativeType {
                    major: "MFMediaType_Audio".into(),
                    subtype: "MFAudioFormat_Float".into(),
                },
                NativeType {
                    major: "MFMediaType_Audio".into(),
                    subtype: "MFAudioFormat_PCM".into(),
                },
            ],
        };

        assert_eq!(
            stream.to_string(),
            "  Stream 0:\n    Type: MFMediaType_Audio/MFAudioFormat_Float\n    Type: MFMediaType_Audio/MFAudioFormat_PCM\n"
        );
    }

    #[test]
    fn test_empty_stream_prints_header_only() {
        let stream = StreamTypes {
            stream: 3,
            types: Vec::new(),
        };
        assert_eq!(stream.to_string(), "  Stream 3:\n");
    }
}
