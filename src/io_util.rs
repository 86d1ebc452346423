//! Read/write helpers that ride out transient failures
//!
//! Partial transfers are resumed; `EINTR` and `EAGAIN` back off for a
//! quarter second before the operation is retried. Reads give up after
//! five consecutive fruitless attempts, writes are bounded only by
//! non-retryable error codes.

use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

const RETRY_DELAY: Duration = Duration::from_millis(250);
const MAX_READ_TRIES: u32 = 5;

/// Fill `buf` from `src`, accumulating short reads
///
/// Returns the number of bytes read, which is less than `buf.len()` only
/// on end of stream. The retry counter resets whenever any progress is
/// made.
pub fn read_all<R: Read>(src: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut done = 0;
    let mut tries = 0;
    while done < buf.len() {
        match src.read(&mut buf[done..]) {
            Ok(0) => break,
            Ok(n) => {
                done += n;
                tries = 0;
            }
            Err(e) if retryable(&e) && tries < MAX_READ_TRIES => {
                tries += 1;
                thread::sleep(RETRY_DELAY);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(done)
}

/// Write the whole of `buf` to `dst`, resuming short writes
pub fn write_all<W: Write>(dst: &mut W, buf: &[u8]) -> io::Result<()> {
    let mut rest = buf;
    while !rest.is_empty() {
        match dst.write(rest) {
            Ok(0) => {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned zero"));
            }
            Ok(n) => rest = &rest[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(RETRY_DELAY),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn retryable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Yields one byte per call, failing with `EINTR` the first
    /// `failures` times.
    struct Flaky {
        failures: u32,
        data: Cursor<Vec<u8>>,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            let n = 1.min(buf.len());
            self.data.read(&mut buf[..n])
        }
    }

    #[test]
    fn short_reads_accumulate() {
        let mut src = Flaky {
            failures: 0,
            data: Cursor::new(b"abcd".to_vec()),
        };
        let mut buf = [0u8; 4];
        assert_eq!(read_all(&mut src, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
    }

    #[test]
    fn eof_returns_the_partial_count() {
        let mut src = Cursor::new(b"ab".to_vec());
        let mut buf = [0u8; 4];
        assert_eq!(read_all(&mut src, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ab");
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let mut src = Flaky {
            failures: 2,
            data: Cursor::new(b"xy".to_vec()),
        };
        let mut buf = [0u8; 2];
        assert_eq!(read_all(&mut src, &mut buf).unwrap(), 2);
        assert_eq!(&buf, b"xy");
    }

    #[test]
    fn reads_give_up_after_bounded_retries() {
        let mut src = Flaky {
            failures: u32::MAX,
            data: Cursor::new(Vec::new()),
        };
        let mut buf = [0u8; 1];
        let err = read_all(&mut src, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
    }

    #[test]
    fn write_all_pushes_everything_through() {
        let mut dst = Cursor::new(Vec::new());
        write_all(&mut dst, b"deadbeef").unwrap();
        assert_eq!(dst.into_inner(), b"deadbeef");
    }

    #[test]
    fn a_dead_writer_is_an_error() {
        struct Dead;
        impl Write for Dead {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let err = write_all(&mut Dead, b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }
}
