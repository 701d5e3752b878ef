use std::collections::VecDeque;
use std::error::Error;
use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use serialport::{DataBits, FlowControl, Parity, StopBits};
use tokio::sync::mpsc::{self, error::TryRecvError, Receiver};

const READ_CHUNK: usize = 64;
const CHANNEL_DEPTH: usize = 64;
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Non-blocking byte input polled by the tracker.
pub trait ByteSource {
    /// Next available byte, or `None` when nothing is buffered right now.
    fn try_read_byte(&mut self) -> Option<u8>;
}

impl ByteSource for VecDeque<u8> {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.pop_front()
    }
}

/// Byte source fed by a blocking reader thread through a bounded channel.
pub struct ChannelSource {
    rx: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    closed: bool,
}

impl ChannelSource {
    pub fn new(rx: Receiver<Vec<u8>>) -> Self {
        ChannelSource {
            rx,
            pending: VecDeque::new(),
            closed: false,
        }
    }

    /// True once the reader has gone away and every byte has been consumed.
    pub fn is_closed(&self) -> bool {
        self.closed && self.pending.is_empty()
    }
}

impl ByteSource for ChannelSource {
    fn try_read_byte(&mut self) -> Option<u8> {
        if self.pending.is_empty() && !self.closed {
            match self.rx.try_recv() {
                Ok(chunk) => self.pending.extend(chunk),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => self.closed = true,
            }
        }
        self.pending.pop_front()
    }
}

/// Both directions of the serial link: command input and protocol output.
pub struct SerialLink {
    pub input: ChannelSource,
    pub output: Box<dyn Write + Send>,
}

impl SerialLink {
    /// Open `port` raw at `baud`, 8N1 without flow control; `-` means
    /// stdin/stdout and ignores `baud`.
    pub fn open(port: &str, baud: u32) -> Result<Self, Box<dyn Error + Send + Sync>> {
        if port == "-" {
            info!("Reading commands from stdin");
            return Ok(SerialLink {
                input: spawn_reader(io::stdin()),
                output: Box::new(io::stdout()),
            });
        }

        let device = serialport::new(port, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()?;
        let reader = device.try_clone()?;
        info!("Opened serial device {} at {} baud", port, baud);
        Ok(SerialLink {
            input: spawn_reader(reader),
            output: Box::new(device),
        })
    }
}

/// Move bytes from a blocking reader into a channel until EOF or error.
/// Read timeouts are idle periods, not failures.
///
/// Runs on a detached thread: a read parked on an idle port must not hold
/// up runtime shutdown.
pub fn spawn_reader<R>(mut reader: R) -> ChannelSource
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
    thread::spawn(move || {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => {
                    debug!("Serial input reached end of stream");
                    break;
                }
                Ok(n) => {
                    if tx.blocking_send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    if tx.is_closed() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Serial read failed: {}", e);
                    break;
                }
            }
        }
    });
    ChannelSource::new(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deque_drains_in_order() {
        let mut source: VecDeque<u8> = b"ab".iter().copied().collect();
        assert_eq!(source.try_read_byte(), Some(b'a'));
        assert_eq!(source.try_read_byte(), Some(b'b'));
        assert_eq!(source.try_read_byte(), None);
    }

    #[tokio::test]
    async fn channel_source_is_non_blocking() {
        let (tx, rx) = mpsc::channel(4);
        let mut source = ChannelSource::new(rx);
        assert_eq!(source.try_read_byte(), None);
        assert!(!source.is_closed());

        tx.send(b"hi".to_vec()).await.unwrap();
        assert_eq!(source.try_read_byte(), Some(b'h'));
        assert_eq!(source.try_read_byte(), Some(b'i'));
        assert_eq!(source.try_read_byte(), None);

        drop(tx);
        assert_eq!(source.try_read_byte(), None);
        assert!(source.is_closed());
    }

    struct IdleThenData {
        idle_reads: usize,
        data: io::Cursor<Vec<u8>>,
    }

    impl Read for IdleThenData {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.idle_reads > 0 {
                self.idle_reads -= 1;
                return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
            }
            self.data.read(buf)
        }
    }

    async fn collect(mut source: ChannelSource) -> Vec<u8> {
        let mut received = Vec::new();
        while !source.is_closed() {
            match source.try_read_byte() {
                Some(b) => received.push(b),
                None => tokio::task::yield_now().await,
            }
        }
        received
    }

    #[tokio::test]
    async fn reader_thread_survives_idle_timeouts() {
        let reader = IdleThenData {
            idle_reads: 3,
            data: io::Cursor::new(b"X:4,Y:5\n".to_vec()),
        };
        assert_eq!(collect(spawn_reader(reader)).await, b"X:4,Y:5\n");
    }

    #[test]
    fn missing_device_is_an_error() {
        assert!(SerialLink::open("/dev/pantilt-does-not-exist", 115_200).is_err());
    }

    #[tokio::test]
    async fn reader_thread_forwards_until_eof() {
        let source = spawn_reader(io::Cursor::new(b"X:1,Y:2\n".to_vec()));
        assert_eq!(collect(source).await, b"X:1,Y:2\n");
    }
}
