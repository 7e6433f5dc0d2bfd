//! Append-only log of completed turns

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes one line per finished turn
#[derive(Debug, Clone)]
pub struct Transcript {
    path: PathBuf,
}

impl Transcript {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an entry to the transcript
    pub fn record(&self, segment: u64, status: &str, text: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(
            file,
            "[{}] #{} {} {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            segment,
            status,
            text
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let transcript = Transcript::new(dir.path().join("logs/transcript.log"));

        transcript.record(0, "delivered", "hello").unwrap();
        transcript.record(1, "failed", "what time is it").unwrap();

        let content = std::fs::read_to_string(transcript.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("#0 delivered hello"));
        assert!(lines[1].ends_with("#1 failed what time is it"));
    }
}
