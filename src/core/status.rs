use nix::errno::Errno;
use nix::unistd;

use std::os::unix::io::AsRawFd;
use std::os::unix::io::RawFd;

const READ_SIZE: usize = 1024;

/// Line-buffered status text read from a file descriptor (stdin in a
/// running session). Only the last complete, non-empty line of each read
/// is kept.
pub struct StatusFeed {
    fd: RawFd,
    buffer: Vec<u8>,
    open: bool,
}

impl StatusFeed {
    pub fn new(fd: RawFd) -> Self {
        Self {
            fd,
            buffer: Vec::with_capacity(READ_SIZE),
            open: true,
        }
    }

    pub fn stdin() -> Self {
        Self::new(std::io::stdin().as_raw_fd())
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The descriptor to poll, while the feed is still open.
    #[inline]
    pub fn descriptor(&self) -> Option<RawFd> {
        if self.open {
            Some(self.fd)
        } else {
            None
        }
    }

    /// Performs a single read and returns the text to publish, if the read
    /// completed a line. End of input and read errors close the feed and
    /// are reported as text.
    pub fn read(&mut self) -> Option<String> {
        if !self.open {
            return None;
        }

        let mut chunk = [0u8; READ_SIZE];

        match unistd::read(self.fd, &mut chunk) {
            Ok(0) => {
                info!("status feed reached end of input");
                self.open = false;
                Some(String::from("EOF"))
            },
            Ok(n) => {
                self.buffer.extend_from_slice(&chunk[..n]);
                let line = self.take_last_line();

                // a partial line longer than one read keeps only its tail
                if self.buffer.len() > READ_SIZE {
                    let excess = self.buffer.len() - READ_SIZE;
                    self.buffer.drain(..excess);
                }

                line
            },
            Err(e) => match e.as_errno() {
                Some(Errno::EINTR) | Some(Errno::EAGAIN) => None,
                _ => {
                    warn!("unable to read status feed: {}", e);
                    self.open = false;
                    Some(e.to_string())
                },
            },
        }
    }

    fn take_last_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().rposition(|&b| b == b'\n')?;
        let complete: Vec<u8> = self.buffer.drain(..=end).collect();

        String::from_utf8_lossy(&complete)
            .lines()
            .rev()
            .find(|line| !line.is_empty())
            .map(String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> (StatusFeed, RawFd) {
        let (read_end, write_end) = unistd::pipe().unwrap();
        (StatusFeed::new(read_end), write_end)
    }

    #[test]
    fn last_complete_line_wins() {
        let (mut feed, write_end) = feed();

        unistd::write(write_end, b"foo\nbar\nbaz").unwrap();
        assert_eq!(feed.read(), Some("bar".into()));

        unistd::write(write_end, b" qux\n").unwrap();
        assert_eq!(feed.read(), Some("baz qux".into()));

        unistd::close(write_end).unwrap();
        unistd::close(feed.fd).unwrap();
    }

    #[test]
    fn empty_lines_are_ignored() {
        let (mut feed, write_end) = feed();

        unistd::write(write_end, b"status\n\n\n").unwrap();
        assert_eq!(feed.read(), Some("status".into()));

        unistd::write(write_end, b"\n").unwrap();
        assert_eq!(feed.read(), None);
        assert!(feed.is_open());

        unistd::close(write_end).unwrap();
        unistd::close(feed.fd).unwrap();
    }

    #[test]
    fn unterminated_input_is_bounded() {
        let (mut feed, write_end) = feed();

        unistd::write(write_end, &[b'a'; 3 * READ_SIZE]).unwrap();

        for _ in 0..3 {
            assert_eq!(feed.read(), None);
            assert!(feed.buffer.len() <= READ_SIZE);
        }

        unistd::write(write_end, b"b\n").unwrap();
        let line = feed.read().unwrap();
        assert_eq!(line.len(), READ_SIZE + 1);
        assert!(line.ends_with("ab"));
        assert!(feed.buffer.is_empty());

        unistd::close(write_end).unwrap();
        unistd::close(feed.fd).unwrap();
    }

    #[test]
    fn end_of_input_closes_the_feed() {
        let (mut feed, write_end) = feed();

        unistd::close(write_end).unwrap();
        assert_eq!(feed.read(), Some("EOF".into()));
        assert!(!feed.is_open());
        assert_eq!(feed.descriptor(), None);
        assert_eq!(feed.read(), None);

        unistd::close(feed.fd).unwrap();
    }
}
