//! Tail a JSON-lines trace of raw signals
//!
//! Each line holds one serialized [`RawSignal`]. Lines may be appended while
//! the reader is attached; every `process` call picks up only what is new.
//! A trailing line without a newline is held back until it is complete.

use crate::game::RawSignal;
use crate::reader::LogReader;
use crate::{Result, WatchError};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

pub struct TraceReader {
    path: PathBuf,
    reader: BufReader<File>,
    /// Incomplete last line carried over to the next call
    pending: Vec<u8>,
    line_number: usize,
    /// The pending partial line predates `new_game_start` and is dropped
    /// once it completes
    skip_pending: bool,
}

/// Complete lines read in one call, plus the I/O error that ended reading
struct LineBatch {
    lines: Vec<Vec<u8>>,
    error: Option<std::io::Error>,
}

impl TraceReader {
    /// Open a trace for tailing from its first line
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| WatchError::AttachFailed {
            path: path.clone(),
            source,
        })?;
        Ok(TraceReader {
            path,
            reader: BufReader::new(file),
            pending: Vec::new(),
            line_number: 0,
            skip_pending: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of complete lines consumed so far, skipped ones included
    pub fn lines_read(&self) -> usize {
        self.line_number
    }

    /// Read every complete line available now
    ///
    /// An I/O error stops reading but keeps the lines already collected, so
    /// the caller can dispatch them before reporting it.
    fn read_complete_lines(&mut self) -> LineBatch {
        let mut lines = Vec::new();
        loop {
            match self.reader.read_until(b'\n', &mut self.pending) {
                Ok(0) => break,
                Ok(_) => {
                    if self.pending.last() != Some(&b'\n') {
                        // Writer is mid-line; wait for the rest
                        break;
                    }
                    let line = std::mem::take(&mut self.pending);
                    if std::mem::take(&mut self.skip_pending) {
                        self.line_number += 1;
                        continue;
                    }
                    lines.push(line);
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return LineBatch { lines, error: Some(err) },
            }
        }
        LineBatch { lines, error: None }
    }

    fn parse_error(&self, err: impl std::fmt::Display) -> WatchError {
        WatchError::ParseError(format!("{}:{}: {}", self.path.display(), self.line_number, err))
    }
}

impl LogReader for TraceReader {
    fn process(&mut self, sink: &mut dyn FnMut(RawSignal)) -> Result<()> {
        let LineBatch { lines, error } = self.read_complete_lines();

        let mut first_error = None;
        for line in &lines {
            self.line_number += 1;
            let parsed = std::str::from_utf8(line)
                .map_err(|err| self.parse_error(err))
                .and_then(|text| {
                    let text = text.trim();
                    if text.is_empty() {
                        return Ok(None);
                    }
                    serde_json::from_str::<RawSignal>(text)
                        .map(Some)
                        .map_err(|err| self.parse_error(err))
                });
            match parsed {
                Ok(Some(signal)) => sink(signal),
                Ok(None) => {}
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        if !lines.is_empty() {
            sink(RawSignal::LogChanged);
        }

        if let Some(err) = error {
            return Err(err.into());
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Skip everything already in the trace; only later lines are read
    ///
    /// Skipped lines still count toward [`lines_read`](Self::lines_read), so
    /// parse errors keep reporting real line numbers.
    fn new_game_start(&mut self) -> Result<()> {
        let mut rest = Vec::new();
        self.reader.read_to_end(&mut rest)?;
        self.pending.extend_from_slice(&rest);

        self.line_number += self.pending.iter().filter(|&&b| b == b'\n').count();
        let tail_start = self
            .pending
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |pos| pos + 1);
        self.pending.drain(..tail_start);
        self.skip_pending = !self.pending.is_empty();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BlockType, EntityId};
    use std::io::Write;

    fn temp_trace(name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = std::env::temp_dir().join(format!("hswatch-{}-{}.jsonl", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn drain(reader: &mut TraceReader) -> (Vec<RawSignal>, Result<()>) {
        let mut signals = Vec::new();
        let result = reader.process(&mut |s| signals.push(s));
        (signals, result)
    }

    #[test]
    fn test_missing_file_fails_to_attach() {
        let err = TraceReader::open("/nonexistent/hswatch/trace.jsonl").err().unwrap();
        assert!(matches!(err, WatchError::AttachFailed { .. }));
    }

    #[test]
    fn test_tails_appended_lines() {
        let path = temp_trace(
            "tail",
            "{\"kind\":\"block_start\",\"entity_id\":7,\"block_type\":\"PLAY\"}\n",
        );
        let mut reader = TraceReader::open(&path).unwrap();

        let (signals, result) = drain(&mut reader);
        assert!(result.is_ok());
        assert_eq!(
            signals,
            vec![
                RawSignal::BlockStart {
                    entity_id: EntityId::new(7),
                    block_type: BlockType::Play,
                },
                RawSignal::LogChanged,
            ]
        );

        // Nothing new: no signals at all, not even LogChanged
        let (signals, _) = drain(&mut reader);
        assert!(signals.is_empty());

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        write!(file, "{{\"kind\":\"create_game\"}}\n{{\"kind\":\"block_end\"").unwrap();
        file.flush().unwrap();

        let (signals, _) = drain(&mut reader);
        assert_eq!(signals, vec![RawSignal::CreateGame, RawSignal::LogChanged]);

        writeln!(file, ",\"entity_id\":7,\"block_type\":\"PLAY\"}}").unwrap();
        let (signals, _) = drain(&mut reader);
        assert_eq!(signals.len(), 2);
        assert_eq!(reader.lines_read(), 3);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_bad_line_reported_after_good_ones() {
        let path = temp_trace(
            "bad",
            "{\"kind\":\"create_game\"}\nnot json\n{\"kind\":\"log_changed\"}\n",
        );
        let mut reader = TraceReader::open(&path).unwrap();

        let (signals, result) = drain(&mut reader);
        assert_eq!(
            signals,
            vec![RawSignal::CreateGame, RawSignal::LogChanged, RawSignal::LogChanged]
        );
        match result {
            Err(WatchError::ParseError(msg)) => assert!(msg.contains(":2:"), "{}", msg),
            other => panic!("expected parse error, got {:?}", other),
        }

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_invalid_utf8_line_does_not_lose_neighbours() {
        let mut contents = b"{\"kind\":\"create_game\"}\n".to_vec();
        contents.extend_from_slice(b"{\"kind\":\"log_changed\"\xff}\n");
        contents.extend_from_slice(b"{\"kind\":\"start_waiting_main_action\"}\n");
        let path = temp_trace("utf8", contents);
        let mut reader = TraceReader::open(&path).unwrap();

        let (signals, result) = drain(&mut reader);
        assert_eq!(
            signals,
            vec![
                RawSignal::CreateGame,
                RawSignal::StartWaitingMainAction,
                RawSignal::LogChanged
            ]
        );
        match result {
            Err(WatchError::ParseError(msg)) => assert!(msg.contains(":2:"), "{}", msg),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert_eq!(reader.lines_read(), 3);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_new_game_start_skips_history() {
        let path = temp_trace("skip", "{\"kind\":\"create_game\"}\n");
        let mut reader = TraceReader::open(&path).unwrap();
        reader.new_game_start().unwrap();

        let (signals, _) = drain(&mut reader);
        assert!(signals.is_empty());
        assert_eq!(reader.lines_read(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_new_game_start_drops_half_written_line() {
        let path = temp_trace("skip-partial", "{\"kind\":\"create_game\"}\n{\"kind\":\"create");
        let mut reader = TraceReader::open(&path).unwrap();
        reader.new_game_start().unwrap();

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "_game\"}}").unwrap();
        writeln!(file, "not json").unwrap();

        // The completed old line is skipped; the next one is new content
        let (signals, result) = drain(&mut reader);
        assert_eq!(signals, vec![RawSignal::LogChanged]);
        match result {
            Err(WatchError::ParseError(msg)) => assert!(msg.contains(":3:"), "{}", msg),
            other => panic!("expected parse error, got {:?}", other),
        }

        let _ = std::fs::remove_file(&path);
    }
}
