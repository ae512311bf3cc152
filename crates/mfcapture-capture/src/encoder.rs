//! Encoder media-type negotiation for the sink writer.

use tracing::{debug, instrument};
use windows::core::{w, GUID};
use windows::Win32::Media::MediaFoundation::{
    IMFMediaType, MFCreateMediaType, MFTRegisterLocalByCLSID, MFT_CATEGORY_VIDEO_PROCESSOR,
    MFT_ENUM_FLAG_SYNCMFT, MF_MT_AVG_BITRATE, MF_MT_FRAME_RATE, MF_MT_FRAME_SIZE,
    MF_MT_INTERLACE_MODE, MF_MT_MAJOR_TYPE, MF_MT_PIXEL_ASPECT_RATIO, MF_MT_SUBTYPE,
};

use mfcapture_ipc::{EncodingParameters, MediaKind};

use crate::error::CaptureError;
use crate::subtypes::{encoder_subtype, major_type};
use crate::CaptureResult;

/// `CColorConvertDMO`.
const CLSID_COLOR_CONVERT_DMO: GUID = GUID::from_u128(0x98230571_0087_4204_b020_3282538e57d3);

/// Packed 64-bit video attributes copied from the reader type.
const VIDEO_U64_ATTRIBUTES: [(&GUID, &str); 3] = [
    (&MF_MT_FRAME_SIZE, "MF_MT_FRAME_SIZE"),
    (&MF_MT_FRAME_RATE, "MF_MT_FRAME_RATE"),
    (&MF_MT_PIXEL_ASPECT_RATIO, "MF_MT_PIXEL_ASPECT_RATIO"),
];

/// Build the encoded output type for the sink writer from the reader type.
///
/// Audio copies every attribute of `source` first and then sets the major
/// type, encoded subtype and bitrate, so the encoded subtype is what
/// reaches the writer. Video sets those three and copies only the frame
/// geometry and timing.
#[instrument(name = "build_target_type", skip(source))]
pub fn build_target_type(
    params: &EncodingParameters,
    source: &IMFMediaType,
) -> CaptureResult<IMFMediaType> {
    let kind = params.format.media_kind();
    let target = unsafe { MFCreateMediaType() }
        .map_err(|e| CaptureError::api("MFCreateMediaType", e))?;

    unsafe {
        if kind == MediaKind::Audio {
            source
                .CopyAllItems(&target)
                .map_err(|e| CaptureError::api("Copying reader attributes", e))?;
        }

        target
            .SetGUID(&MF_MT_MAJOR_TYPE, &GUID::from_u128(major_type(kind)))
            .map_err(|e| CaptureError::api("SetGUID MF_MT_MAJOR_TYPE", e))?;
        target
            .SetGUID(&MF_MT_SUBTYPE, &GUID::from_u128(encoder_subtype(params.format)))
            .map_err(|e| CaptureError::api("SetGUID MF_MT_SUBTYPE", e))?;
        target
            .SetUINT32(&MF_MT_AVG_BITRATE, params.bitrate)
            .map_err(|e| CaptureError::api("SetUINT32 MF_MT_AVG_BITRATE", e))?;

        if kind == MediaKind::Video {
            for (key, name) in VIDEO_U64_ATTRIBUTES {
                let value = source
                    .GetUINT64(key)
                    .map_err(|e| CaptureError::api(&format!("Reading {name}"), e))?;
                target
                    .SetUINT64(key, value)
                    .map_err(|e| CaptureError::api(&format!("Setting {name}"), e))?;
            }
            let interlace = source
                .GetUINT32(&MF_MT_INTERLACE_MODE)
                .map_err(|e| CaptureError::api("Reading MF_MT_INTERLACE_MODE", e))?;
            target
                .SetUINT32(&MF_MT_INTERLACE_MODE, interlace)
                .map_err(|e| CaptureError::api("Setting MF_MT_INTERLACE_MODE", e))?;
        }
    }

    debug!(format = %params.format, bitrate = params.bitrate, "Built encoder output type");
    Ok(target)
}

/// Register the color converter DSP for this process so the sink writer
/// can insert it between the camera format and the video encoder.
pub fn register_color_converter() -> CaptureResult<()> {
    unsafe {
        MFTRegisterLocalByCLSID(
            &CLSID_COLOR_CONVERT_DMO,
            &MFT_CATEGORY_VIDEO_PROCESSOR,
            w!(""),
            MFT_ENUM_FLAG_SYNCMFT.0 as u32,
            None,
            None,
        )
    }
    .map_err(|e| CaptureError::api("MFTRegisterLocalByCLSID", e))?;

    debug!("Registered color converter");
    Ok(())
}
