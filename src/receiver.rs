use log::{debug, warn};

use crate::constants::{DEFAULT_MAX_LINE, LINE_TERMINATOR};

/// Accumulates serial bytes into newline-delimited lines.
///
/// The buffer never holds a terminator. When a line grows past `max_len`
/// the partial line is dropped and everything up to the next terminator is
/// skipped, so the receiver picks up again on the following line.
/// A `max_len` of zero disables the cap.
#[derive(Debug)]
pub struct LineReceiver {
    buffer: Vec<u8>,
    max_len: usize,
    resyncing: bool,
}

impl LineReceiver {
    pub fn new(max_len: usize) -> Self {
        LineReceiver {
            buffer: Vec::new(),
            max_len,
            resyncing: false,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Feed one byte. Returns the completed line when `byte` terminates one.
    pub fn push(&mut self, byte: u8) -> Option<String> {
        if byte == LINE_TERMINATOR {
            if self.resyncing {
                debug!("Resynchronized on line boundary");
                self.resyncing = false;
                return None;
            }
            let line = String::from_utf8_lossy(&self.buffer).into_owned();
            self.buffer.clear();
            return Some(line);
        }

        if self.resyncing {
            return None;
        }

        if self.max_len > 0 && self.buffer.len() >= self.max_len {
            warn!(
                "Line exceeded {} bytes, discarding until next newline",
                self.max_len
            );
            self.buffer.clear();
            self.resyncing = true;
            return None;
        }

        self.buffer.push(byte);
        None
    }

    /// Number of bytes held for the line in progress.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_resyncing(&self) -> bool {
        self.resyncing
    }
}

impl Default for LineReceiver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(receiver: &mut LineReceiver, bytes: &[u8]) -> Vec<String> {
        bytes.iter().filter_map(|&b| receiver.push(b)).collect()
    }

    #[test]
    fn splits_on_newline() {
        let mut receiver = LineReceiver::default();
        let lines = feed(&mut receiver, b"X:1,Y:2\nX:3,Y:4\n");
        assert_eq!(lines, vec!["X:1,Y:2", "X:3,Y:4"]);
        assert_eq!(receiver.pending(), 0);
    }

    #[test]
    fn holds_partial_line_across_calls() {
        let mut receiver = LineReceiver::default();
        assert!(feed(&mut receiver, b"X:10,").is_empty());
        assert_eq!(receiver.pending(), 5);
        assert_eq!(feed(&mut receiver, b"Y:20\n"), vec!["X:10,Y:20"]);
    }

    #[test]
    fn empty_line_is_delivered() {
        let mut receiver = LineReceiver::default();
        assert_eq!(feed(&mut receiver, b"\n"), vec![""]);
    }

    #[test]
    fn overflow_discards_and_resyncs() {
        let mut receiver = LineReceiver::new(8);
        let lines = feed(&mut receiver, b"0123456789abcdef\nX:1,Y:2\n");
        assert_eq!(lines, vec!["X:1,Y:2"]);
        assert!(!receiver.is_resyncing());
    }

    #[test]
    fn line_at_capacity_is_kept() {
        let mut receiver = LineReceiver::new(7);
        assert_eq!(feed(&mut receiver, b"X:1,Y:2\n"), vec!["X:1,Y:2"]);
    }

    #[test]
    fn zero_capacity_is_unbounded() {
        let mut receiver = LineReceiver::unbounded();
        let long = vec![b'a'; 10_000];
        assert!(feed(&mut receiver, &long).is_empty());
        assert_eq!(receiver.pending(), 10_000);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut receiver = LineReceiver::default();
        let lines = feed(&mut receiver, b"\xffX:5,Y:6\n");
        assert_eq!(lines, vec!["\u{fffd}X:5,Y:6"]);
    }
}
