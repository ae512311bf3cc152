//! Failures reported from the asynchronous read callback.

use std::fmt;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::warn;

/// Capacity of the failure channel.
pub const NOTICE_CHANNEL_CAPACITY: usize = 16;

/// A failure inside the read-sample callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFailure {
    /// HRESULT of the failing call.
    pub code: u32,
    pub message: String,
}

impl fmt::Display for CaptureFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08X})", self.message, self.code)
    }
}

pub fn notice_channel() -> (Sender<CaptureFailure>, Receiver<CaptureFailure>) {
    crossbeam_channel::bounded(NOTICE_CHANNEL_CAPACITY)
}

/// Send without blocking the callback thread; a full channel drops the
/// failure since the first one already stops the capture.
pub fn post_failure(sender: &Sender<CaptureFailure>, failure: CaptureFailure) {
    match sender.try_send(failure) {
        Ok(()) => {}
        Err(TrySendError::Full(failure)) => {
            warn!(%failure, "Failure channel full, dropping notice");
        }
        Err(TrySendError::Disconnected(failure)) => {
            warn!(%failure, "Nobody is listening for capture failures");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display() {
        let failure = CaptureFailure {
            code: 0xC00D_3E85,
            message: "The object has been shut down".into(),
        };
        assert_eq!(failure.to_string(), "The object has been shut down (0xC00D3E85)");
    }

    #[test]
    fn test_post_failure_never_blocks() {
        let (tx, rx) = notice_channel();
        for code in 0..(NOTICE_CHANNEL_CAPACITY as u32 + 4) {
            post_failure(&tx, CaptureFailure { code, message: String::new() });
        }
        assert_eq!(rx.len(), NOTICE_CHANNEL_CAPACITY);
        assert_eq!(rx.try_recv().map(|f| f.code), Ok(0));

        drop(rx);
        post_failure(&tx, CaptureFailure { code: 1, message: String::new() });
    }
}
