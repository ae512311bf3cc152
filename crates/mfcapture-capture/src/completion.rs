//! Decisions taken by the asynchronous read callback.
//!
//! The callback itself only exists on Windows; the rules it follows live
//! here so they can be exercised against a fake reader.

/// Where a completed read goes: the encoder input and the next request.
pub trait ReadTarget {
    type Sample: ?Sized;
    type Error;

    /// Rebase and write one sample.
    fn write(&mut self, timestamp: i64, sample: &Self::Sample) -> Result<(), Self::Error>;

    /// Issue the next asynchronous `ReadSample`.
    fn request_next(&mut self) -> Result<(), Self::Error>;
}

/// Outcome of one read completion.
#[derive(Debug, PartialEq, Eq)]
pub enum Completion<E> {
    /// The session was not capturing; nothing was touched.
    Ignored,
    /// The sample (if any) was written and another read is pending.
    Continued,
    /// A step failed. No further read was requested.
    Failed(E),
}

/// Handle one completion.
///
/// A failed status or a failed write ends the read chain: the next sample
/// is only requested after everything before it succeeded. A completion
/// without a sample (stream tick, gap) still requests the next one.
pub fn complete_read<T: ReadTarget>(
    target: &mut T,
    capturing: bool,
    status: Result<(), T::Error>,
    timestamp: i64,
    sample: Option<&T::Sample>,
) -> Completion<T::Error> {
    if !capturing {
        return Completion::Ignored;
    }

    let result = status
        .and_then(|()| match sample {
            Some(sample) => target.write(timestamp, sample),
            None => Ok(()),
        })
        .and_then(|()| target.request_next());

    match result {
        Ok(()) => Completion::Continued,
        Err(e) => Completion::Failed(e),
    }
}

/// Whether `removed_link` names the device being recorded.
///
/// Only a running capture can lose its device; links compare
/// case-insensitively.
pub fn is_active_link(capturing: bool, active_link: Option<&str>, removed_link: &str) -> bool {
    capturing && active_link.is_some_and(|link| link.eq_ignore_ascii_case(removed_link))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeReader {
        written: Vec<(i64, u32)>,
        requests: usize,
        fail_write: bool,
        fail_request: bool,
    }

    impl ReadTarget for FakeReader {
        type Sample = u32;
        type Error = &'static str;

        fn write(&mut self, timestamp: i64, sample: &u32) -> Result<(), &'static str> {
            if self.fail_write {
                return Err("write failed");
            }
            self.written.push((timestamp, *sample));
            Ok(())
        }

        fn request_next(&mut self) -> Result<(), &'static str> {
            self.requests += 1;
            if self.fail_request {
                return Err("read failed");
            }
            Ok(())
        }
    }

    #[test]
    fn test_sample_written_then_next_requested() {
        let mut reader = FakeReader::default();
        let outcome = complete_read(&mut reader, true, Ok(()), 500, Some(&7));
        assert_eq!(outcome, Completion::Continued);
        assert_eq!(reader.written, vec![(500, 7)]);
        assert_eq!(reader.requests, 1);
    }

    #[test]
    fn test_empty_completion_still_requests_next() {
        let mut reader = FakeReader::default();
        let outcome = complete_read(&mut reader, true, Ok(()), 0, None);
        assert_eq!(outcome, Completion::Continued);
        assert!(reader.written.is_empty());
        assert_eq!(reader.requests, 1);
    }

    #[test]
    fn test_failed_status_stops_read_chain() {
        let mut reader = FakeReader::default();
        let outcome = complete_read(&mut reader, true, Err("device invalidated"), 10, Some(&1));
        assert_eq!(outcome, Completion::Failed("device invalidated"));
        assert!(reader.written.is_empty());
        assert_eq!(reader.requests, 0);
    }

    #[test]
    fn test_failed_write_stops_read_chain() {
        let mut reader = FakeReader {
            fail_write: true,
            ..Default::default()
        };
        let outcome = complete_read(&mut reader, true, Ok(()), 10, Some(&1));
        assert_eq!(outcome, Completion::Failed("write failed"));
        assert_eq!(reader.requests, 0);
    }

    #[test]
    fn test_failed_request_reported() {
        let mut reader = FakeReader {
            fail_request: true,
            ..Default::default()
        };
        let outcome = complete_read(&mut reader, true, Ok(()), 10, Some(&1));
        assert_eq!(outcome, Completion::Failed("read failed"));
        assert_eq!(reader.written, vec![(10, 1)]);
    }

    #[test]
    fn test_completion_ignored_when_idle() {
        let mut reader = FakeReader::default();
        let outcome = complete_read(&mut reader, false, Err("late failure"), 10, Some(&1));
        assert_eq!(outcome, Completion::Ignored);
        assert!(reader.written.is_empty());
        assert_eq!(reader.requests, 0);
    }

    #[test]
    fn test_active_link_match() {
        let link = r"\\?\USB#VID_046D&PID_0825";
        assert!(is_active_link(true, Some(link), r"\\?\usb#vid_046d&pid_0825"));
        assert!(!is_active_link(true, Some(link), r"\\?\usb#vid_046d&pid_0826"));
        assert!(!is_active_link(true, None, link));
    }

    #[test]
    fn test_no_device_lost_while_idle() {
        let link = r"\\?\USB#VID_046D&PID_0825";
        assert!(!is_active_link(false, Some(link), link));
    }
}
