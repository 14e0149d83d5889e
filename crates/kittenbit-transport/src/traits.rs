use std::io::{Read, Write};

use crate::error::Result;

/// A connected serial byte stream implementing Read + Write.
///
/// This is the fundamental I/O type the protocol layers run over.
/// On Unix it may wrap a Unix domain socket stream; anywhere it may wrap the
/// process's stdin/stdout pair.
pub struct SerialStream {
    inner: SerialStreamInner,
}

enum SerialStreamInner {
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
    Stdio {
        stdin: std::io::Stdin,
        stdout: std::io::Stdout,
    },
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            SerialStreamInner::Unix(stream) => stream.read(buf),
            SerialStreamInner::Stdio { stdin, .. } => stdin.read(buf),
        }
    }
}

impl Write for SerialStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            SerialStreamInner::Unix(stream) => stream.write(buf),
            SerialStreamInner::Stdio { stdout, .. } => stdout.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            SerialStreamInner::Unix(stream) => stream.flush(),
            SerialStreamInner::Stdio { stdout, .. } => stdout.flush(),
        }
    }
}

impl SerialStream {
    /// Create a SerialStream from a Unix domain socket stream.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: SerialStreamInner::Unix(stream),
        }
    }

    /// Serial stream over this process's stdin (receive) and stdout (transmit).
    pub fn stdio() -> Self {
        Self {
            inner: SerialStreamInner::Stdio {
                stdin: std::io::stdin(),
                stdout: std::io::stdout(),
            },
        }
    }

    /// Set read timeout on the underlying stream. No-op for stdio.
    pub fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            SerialStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            SerialStreamInner::Stdio { .. } => Ok(()),
        }
    }

    /// Set write timeout on the underlying stream. No-op for stdio.
    pub fn set_write_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            SerialStreamInner::Unix(stream) => {
                stream.set_write_timeout(timeout).map_err(Into::into)
            }
            SerialStreamInner::Stdio { .. } => Ok(()),
        }
    }

    /// Try to clone this stream (creates a new file descriptor for sockets).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            #[cfg(unix)]
            SerialStreamInner::Unix(stream) => {
                let cloned = stream.try_clone()?;
                Ok(Self::from_unix(cloned))
            }
            SerialStreamInner::Stdio { .. } => Ok(Self::stdio()),
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            #[cfg(unix)]
            SerialStreamInner::Unix(_) => "unix-domain-socket",
            SerialStreamInner::Stdio { .. } => "stdio",
        }
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("type", &self.transport_name())
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::{Read, Write};

    use super::*;

    #[test]
    fn unix_pair_carries_bytes_both_ways() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut host = SerialStream::from_unix(left);
        let mut robot = SerialStream::from_unix(right);

        host.write_all(b"M0\n").unwrap();
        let mut buf = [0u8; 3];
        robot.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"M0\n");

        robot.write_all(b"M0 ok").unwrap();
        let mut buf = [0u8; 5];
        host.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"M0 ok");
    }

    #[test]
    fn clone_shares_the_socket() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let stream = SerialStream::from_unix(left);
        let mut writer = stream.try_clone().unwrap();
        let mut peer = SerialStream::from_unix(right);

        writer.write_all(b"x").unwrap();
        let mut buf = [0u8; 1];
        peer.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"x");
        assert_eq!(stream.transport_name(), "unix-domain-socket");
    }

    #[test]
    fn stdio_timeouts_are_accepted() {
        let stream = SerialStream::stdio();
        assert!(stream
            .set_read_timeout(Some(std::time::Duration::from_millis(5)))
            .is_ok());
        assert!(stream.set_write_timeout(None).is_ok());
        assert_eq!(format!("{stream:?}"), "SerialStream { type: \"stdio\" }");
    }
}
