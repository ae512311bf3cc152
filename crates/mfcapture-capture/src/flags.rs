//! Source reader stream flags.

pub const READERF_ERROR: u32 = 0x0000_0001;
pub const READERF_END_OF_STREAM: u32 = 0x0000_0002;
pub const READERF_NEW_STREAM: u32 = 0x0000_0004;
pub const READERF_NATIVE_TYPE_CHANGED: u32 = 0x0000_0010;
pub const READERF_CURRENT_TYPE_CHANGED: u32 = 0x0000_0020;
pub const READERF_STREAM_TICK: u32 = 0x0000_0100;

/// What a synchronous `ReadSample` delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// The reader hit an error on this stream.
    StreamError,

    /// The decoded type changed mid-stream.
    TypeChanged,

    EndOfStream,

    /// No sample this time (gap or stream tick).
    Empty,

    Sample,
}

/// Classify a read from its flags and whether a sample came back.
///
/// A type change wins over end of stream.
pub fn classify_read(flags: u32, has_sample: bool) -> ReadStatus {
    if flags & READERF_ERROR != 0 {
        ReadStatus::StreamError
    } else if flags & READERF_CURRENT_TYPE_CHANGED != 0 {
        ReadStatus::TypeChanged
    } else if flags & READERF_END_OF_STREAM != 0 {
        ReadStatus::EndOfStream
    } else if has_sample {
        ReadStatus::Sample
    } else {
        ReadStatus::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_read() {
        assert_eq!(classify_read(0, true), ReadStatus::Sample);
        assert_eq!(classify_read(0, false), ReadStatus::Empty);
        assert_eq!(classify_read(READERF_STREAM_TICK, false), ReadStatus::Empty);
        assert_eq!(classify_read(READERF_END_OF_STREAM, false), ReadStatus::EndOfStream);
        assert_eq!(
            classify_read(READERF_END_OF_STREAM | READERF_CURRENT_TYPE_CHANGED, true),
            ReadStatus::TypeChanged
        );
        assert_eq!(
            classify_read(READERF_ERROR | READERF_END_OF_STREAM, false),
            ReadStatus::StreamError
        );
    }

    #[test]
    fn test_native_change_alone_is_not_a_type_change() {
        assert_eq!(classify_read(READERF_NATIVE_TYPE_CHANGED, true), ReadStatus::Sample);
        assert_eq!(classify_read(READERF_NEW_STREAM, false), ReadStatus::Empty);
    }
}
