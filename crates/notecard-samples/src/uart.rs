//! Readiness shim for buffered UART drivers.

use core::task::Poll;

use embassy_futures::poll_once;
use embedded_io_async::{BufRead, ErrorType, Read, ReadReady, Write};

/// Wraps a buffered UART so the serial framer can ask whether a byte is
/// waiting. Readiness is one poll of `fill_buf`, which never consumes input.
pub struct ReadyUart<U>(pub U);

impl<U: ErrorType> ErrorType for ReadyUart<U> {
    type Error = U::Error;
}

impl<U: Read> Read for ReadyUart<U> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.0.read(buf).await
    }
}

impl<U: BufRead> ReadReady for ReadyUart<U> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        match poll_once(self.0.fill_buf()) {
            Poll::Ready(Ok(buf)) => Ok(!buf.is_empty()),
            Poll::Ready(Err(e)) => Err(e),
            Poll::Pending => Ok(false),
        }
    }
}

impl<U: Write> Write for ReadyUart<U> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.0.write(buf).await
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush().await
    }
}
