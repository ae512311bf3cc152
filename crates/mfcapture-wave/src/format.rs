//! WAVEFORMATEX serialization.

use crate::error::WaveError;
use crate::WaveResult;

/// `wFormatTag` for integer PCM.
pub const WAVE_FORMAT_PCM: u16 = 0x0001;

/// `wFormatTag` for 32-bit IEEE float samples.
pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;

/// Size of a WAVEFORMATEX without trailing extra bytes.
pub const WAVEFORMATEX_LEN: usize = 18;

/// An audio format as carried in the `fmt ` chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub samples_per_sec: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Bytes following `cbSize` (e.g. the WAVEFORMATEXTENSIBLE tail).
    pub extra: Vec<u8>,
}

impl WaveFormat {
    /// Integer PCM.
    pub fn pcm(samples_per_sec: u32, channels: u16, bits_per_sample: u16) -> WaveResult<Self> {
        Self::packed(WAVE_FORMAT_PCM, samples_per_sec, channels, bits_per_sample)
    }

    /// 32-bit float.
    pub fn ieee_float(samples_per_sec: u32, channels: u16) -> WaveResult<Self> {
        Self::packed(WAVE_FORMAT_IEEE_FLOAT, samples_per_sec, channels, 32)
    }

    /// Derive `nBlockAlign` and `nAvgBytesPerSec`. Both must fit their
    /// 16- and 32-bit header fields.
    fn packed(
        format_tag: u16,
        samples_per_sec: u32,
        channels: u16,
        bits_per_sample: u16,
    ) -> WaveResult<Self> {
        let block_align = channels
            .checked_mul(bits_per_sample.div_ceil(8))
            .ok_or_else(|| {
                WaveError::InvalidFormat(format!(
                    "{channels} channels of {bits_per_sample} bits overflow the block alignment"
                ))
            })?;
        let avg_bytes_per_sec = samples_per_sec
            .checked_mul(u32::from(block_align))
            .ok_or_else(|| {
                WaveError::InvalidFormat(format!(
                    "{samples_per_sec} Hz with {block_align}-byte blocks overflows the byte rate"
                ))
            })?;

        Ok(Self {
            format_tag,
            channels,
            samples_per_sec,
            avg_bytes_per_sec,
            block_align,
            bits_per_sample,
            extra: Vec::new(),
        })
    }

    /// Serialize as a little-endian WAVEFORMATEX followed by `extra`.
    pub fn to_bytes(&self) -> WaveResult<Vec<u8>> {
        let cb_size = u16::try_from(self.extra.len())
            .map_err(|_| WaveError::InvalidFormat("format extension too long".into()))?;

        let mut out = Vec::with_capacity(WAVEFORMATEX_LEN + self.extra.len());
        out.extend_from_slice(&self.format_tag.to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&self.samples_per_sec.to_le_bytes());
        out.extend_from_slice(&self.avg_bytes_per_sec.to_le_bytes());
        out.extend_from_slice(&self.block_align.to_le_bytes());
        out.extend_from_slice(&self.bits_per_sample.to_le_bytes());
        out.extend_from_slice(&cb_size.to_le_bytes());
        out.extend_from_slice(&self.extra);
        Ok(out)
    }
}

/// Raw `fmt ` payload together with the two fields the data budget needs.
///
/// Media Foundation hands out the format as opaque bytes (WAVEFORMATEX or
/// WAVEFORMATEXTENSIBLE), so the writer never re-encodes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatBlock {
    pub bytes: Vec<u8>,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
}

impl FormatBlock {
    /// Build from raw format bytes, reading the rate fields out of the header.
    pub fn from_raw(bytes: Vec<u8>) -> WaveResult<Self> {
        if bytes.len() < 16 {
            return Err(WaveError::InvalidFormat(format!(
                "format block is {} bytes, need at least 16",
                bytes.len()
            )));
        }
        let avg_bytes_per_sec = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let block_align = u16::from_le_bytes([bytes[12], bytes[13]]);
        Ok(Self {
            bytes,
            avg_bytes_per_sec,
            block_align,
        })
    }
}

impl TryFrom<&WaveFormat> for FormatBlock {
    type Error = WaveError;

    fn try_from(format: &WaveFormat) -> WaveResult<Self> {
        Ok(Self {
            bytes: format.to_bytes()?,
            avg_bytes_per_sec: format.avg_bytes_per_sec,
            block_align: format.block_align,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_derived_fields() {
        let format = WaveFormat::pcm(44_100, 1, 16).unwrap();
        assert_eq!(format.block_align, 2);
        assert_eq!(format.avg_bytes_per_sec, 88_200);

        let stereo = WaveFormat::pcm(48_000, 2, 24).unwrap();
        assert_eq!(stereo.block_align, 6);
        assert_eq!(stereo.avg_bytes_per_sec, 288_000);
    }

    #[test]
    fn test_waveformatex_layout() {
        let bytes = WaveFormat::ieee_float(48_000, 2).unwrap().to_bytes().unwrap();
        assert_eq!(bytes.len(), WAVEFORMATEX_LEN);
        assert_eq!(&bytes[0..2], &[0x03, 0x00]); // IEEE float
        assert_eq!(&bytes[2..4], &[0x02, 0x00]); // channels
        assert_eq!(&bytes[4..8], &48_000u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &384_000u32.to_le_bytes());
        assert_eq!(&bytes[12..14], &[0x08, 0x00]); // block align
        assert_eq!(&bytes[14..16], &[0x20, 0x00]); // bits
        assert_eq!(&bytes[16..18], &[0x00, 0x00]); // cbSize
    }

    #[test]
    fn test_extension_bytes_follow_cb_size() {
        let mut format = WaveFormat::pcm(48_000, 2, 16).unwrap();
        format.extra = vec![0xAA; 22];
        let bytes = format.to_bytes().unwrap();
        assert_eq!(bytes.len(), 40);
        assert_eq!(&bytes[16..18], &22u16.to_le_bytes());
        assert!(bytes[18..].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_format_block_from_raw_reads_rates() {
        let raw = WaveFormat::pcm(22_050, 2, 16).unwrap().to_bytes().unwrap();
        let block = FormatBlock::from_raw(raw).unwrap();
        assert_eq!(block.avg_bytes_per_sec, 88_200);
        assert_eq!(block.block_align, 4);

        assert!(FormatBlock::from_raw(vec![0; 10]).is_err());
    }

    #[test]
    fn test_oversized_formats_rejected() {
        // 8192 channels of 64-bit samples do not fit a 16-bit block alignment.
        assert!(matches!(
            WaveFormat::pcm(48_000, 8_192, 64),
            Err(WaveError::InvalidFormat(_))
        ));
        assert!(matches!(
            WaveFormat::ieee_float(u32::MAX, 2),
            Err(WaveError::InvalidFormat(_))
        ));

        let widest = WaveFormat::pcm(1_000, u16::MAX, 8).unwrap();
        assert_eq!(widest.block_align, u16::MAX);
        assert_eq!(widest.avg_bytes_per_sec, 65_535_000);
    }
}
