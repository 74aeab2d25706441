use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Time since the log was created.
    pub timestamp: Duration,
    pub direction: Direction,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Direction {
    Rx,
    Tx,
}

/// Bounded transcript of the frames exchanged with the device: every
/// request sent and every final response received.
pub struct FrameLog {
    entries: VecDeque<LogEntry>,
    max_entries: usize,
    started: Instant,
    filter_rx: bool,
    filter_tx: bool,
}

impl FrameLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
            started: Instant::now(),
            filter_rx: true,
            filter_tx: true,
        }
    }

    pub fn set_filter(&mut self, show_rx: bool, show_tx: bool) {
        self.filter_rx = show_rx;
        self.filter_tx = show_tx;
    }

    pub fn push(&mut self, direction: Direction, data: Vec<u8>) {
        self.entries.push_back(LogEntry {
            timestamp: self.started.elapsed(),
            direction,
            data,
        });

        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// One line per visible entry: `[   1.250] TX: 5D08005A`.
    pub fn to_text(&self, show_timestamp: bool) -> String {
        let mut result = String::new();
        for entry in &self.entries {
            if (entry.direction == Direction::Rx && !self.filter_rx) || (entry.direction == Direction::Tx && !self.filter_tx) {
                continue;
            }

            if show_timestamp {
                let millis = entry.timestamp.as_millis();
                result.push_str(&format!("[{:4}.{:03}] ", millis / 1000, millis % 1000));
            }
            result.push_str(match entry.direction {
                Direction::Rx => "RX: ",
                Direction::Tx => "TX: ",
            });
            result.push_str(&hex::encode_upper(&entry.data));
            result.push('\n');
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_entries_are_dropped() {
        let mut log = FrameLog::new(2);
        log.push(Direction::Tx, vec![1]);
        log.push(Direction::Rx, vec![2]);
        log.push(Direction::Tx, vec![3]);
        let data: Vec<_> = log.entries().map(|e| e.data[0]).collect();
        assert_eq!(data, vec![2, 3]);
    }

    #[test]
    fn renders_hex_lines() {
        let mut log = FrameLog::new(10);
        log.push(Direction::Tx, vec![0x5D, 0x08, 0x00, 0x5A]);
        log.push(Direction::Rx, vec![0x5D, 0x08, 0x00, 0x02, 0x5A]);
        assert_eq!(log.to_text(false), "TX: 5D08005A\nRX: 5D0800025A\n");

        log.set_filter(true, false);
        assert_eq!(log.to_text(false), "RX: 5D0800025A\n");
    }

    #[test]
    fn timestamps_are_relative() {
        let mut log = FrameLog::new(10);
        log.push(Direction::Tx, vec![0xAA]);
        let text = log.to_text(true);
        assert!(text.starts_with("[   0."), "{text}");
        assert!(text.ends_with("] TX: AA\n"), "{text}");
    }
}
