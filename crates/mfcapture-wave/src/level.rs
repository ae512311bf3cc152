//! Simple statistics over recorded PCM.

/// Mean absolute sample value of 16-bit PCM; 0.0 for no samples.
pub fn average_absolute_level(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| f64::from(s).abs()).sum();
    sum / samples.len() as f64
}

/// Little-endian bytes for 16-bit PCM samples.
pub fn pcm16_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_of_silence_and_empty() {
        assert_eq!(average_absolute_level(&[]), 0.0);
        assert_eq!(average_absolute_level(&[0; 100]), 0.0);
    }

    #[test]
    fn test_level_uses_magnitude() {
        assert_eq!(average_absolute_level(&[100, -100, 50, -50]), 75.0);
        // i16::MIN has no positive counterpart in i16.
        assert_eq!(average_absolute_level(&[i16::MIN]), 32_768.0);
    }

    #[test]
    fn test_pcm16_little_endian() {
        assert_eq!(pcm16_bytes(&[0x0102, -1]), vec![0x02, 0x01, 0xFF, 0xFF]);
    }
}
