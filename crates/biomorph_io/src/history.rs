use crate::error::{IoError, Result};
use biomorph_data::LifecycleEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name of the event log inside a history directory.
pub const EVENTS_FILE: &str = "events.jsonl";

/// One line of the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: DateTime<Utc>,
    /// Global step that produced the event.
    pub tick: u64,
    pub event: LifecycleEvent,
}

/// Appends lifecycle events to `<dir>/events.jsonl`, one JSON object per
/// line. A dummy logger accepts events and writes nothing.
pub struct HistoryLogger {
    file: Option<BufWriter<File>>,
    path: Option<PathBuf>,
}

impl HistoryLogger {
    pub fn new_at<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            IoError::FileSystem(e).with_context(format!("creating log dir {}", dir.display()))
        })?;
        let path = dir.join(EVENTS_FILE);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            file: Some(BufWriter::new(file)),
            path: Some(path),
        })
    }

    #[must_use]
    pub fn new_dummy() -> Self {
        Self {
            file: None,
            path: None,
        }
    }

    /// Path of the log file, `None` for a dummy logger.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn log_event(&mut self, tick: u64, event: &LifecycleEvent) -> Result<()> {
        if let Some(ref mut file) = self.file {
            write_record(file, tick, event)?;
            file.flush()?;
        }
        Ok(())
    }

    /// Logs a whole step's events with a single flush.
    pub fn log_events(&mut self, tick: u64, events: &[LifecycleEvent]) -> Result<()> {
        if let Some(ref mut file) = self.file {
            for event in events {
                write_record(file, tick, event)?;
            }
            file.flush()?;
        }
        Ok(())
    }
}

fn write_record(file: &mut BufWriter<File>, tick: u64, event: &LifecycleEvent) -> Result<()> {
    let record = HistoryRecord {
        timestamp: Utc::now(),
        tick,
        event: event.clone(),
    };
    let json = serde_json::to_string(&record)?;
    writeln!(file, "{}", json)?;
    Ok(())
}

/// Reads an event log back. A missing file is an empty history; lines that
/// do not parse are skipped with a warning.
pub fn read_history<P: AsRef<Path>>(path: P) -> Result<Vec<HistoryRecord>> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut records = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<HistoryRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(path = %path.display(), line = n + 1, error = %e, "Skipping corrupt history line"),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use biomorph_data::{Creature, CreatureId, EventKind, Genotype, Mode, Position, Velocity};

    fn creature(serial: u64) -> Creature {
        Creature::new(
            CreatureId::new("depths".into(), serial),
            Genotype::origin(Mode::Basic),
            Position::new(0.5, 0.5),
            Velocity::default(),
            1,
            None,
        )
    }

    #[test]
    fn test_log_and_read_back() {
        let dir = std::env::temp_dir().join(format!("biomorph_history_{}", uuid::Uuid::new_v4()));
        let mut logger = HistoryLogger::new_at(&dir).unwrap();
        logger
            .log_event(
                3,
                &LifecycleEvent::Birth {
                    region: "depths".into(),
                    creature: creature(1),
                },
            )
            .unwrap();
        logger
            .log_events(
                4,
                &[
                    LifecycleEvent::Death {
                        region: "depths".into(),
                        creature: creature(1),
                    },
                    LifecycleEvent::Migration {
                        creature: creature(2),
                        from: "depths".into(),
                        to: "fringe".into(),
                        arrival: CreatureId::new("fringe".into(), 9),
                    },
                ],
            )
            .unwrap();

        let path = logger.path().unwrap().to_path_buf();
        let mut raw = std::fs::read_to_string(&path).unwrap();
        raw.push_str("{ not json\n");
        std::fs::write(&path, raw).unwrap();

        let records = read_history(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].tick, 3);
        assert_eq!(records[0].event.kind(), EventKind::Birth);
        assert_eq!(records[2].event.kind(), EventKind::Migration);
        assert!(records[0].timestamp <= records[2].timestamp);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_dummy_logger_writes_nothing() {
        let mut logger = HistoryLogger::new_dummy();
        assert!(logger.path().is_none());
        logger
            .log_event(
                1,
                &LifecycleEvent::Birth {
                    region: "depths".into(),
                    creature: creature(1),
                },
            )
            .unwrap();
    }

    #[test]
    fn test_missing_history_is_empty() {
        let records = read_history("/nonexistent/biomorph/events.jsonl").unwrap();
        assert!(records.is_empty());
    }
}
