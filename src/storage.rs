use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use scopeguard::{ScopeGuard, guard};
use tokio::task;
use tracing::warn;

use crate::error::ReportWriteError;

pub const DEFAULT_LOGFILE_NAME: &str = "monitor_log.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSink {
    Stdout,
    File(PathBuf),
}

impl ReportSink {
    /// `None` means the default log file next to the executable. An empty
    /// value, `none` or `-` selects standard output.
    pub fn resolve(logfile: Option<&str>) -> Self {
        match logfile.map(str::trim) {
            None => ReportSink::File(default_logfile()),
            Some("") | Some("-") => ReportSink::Stdout,
            Some(s) if s.eq_ignore_ascii_case("none") => ReportSink::Stdout,
            Some(path) => ReportSink::File(PathBuf::from(path)),
        }
    }
}

impl fmt::Display for ReportSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportSink::Stdout => f.write_str("stdout"),
            ReportSink::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn default_logfile() -> PathBuf {
    match std::env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join(DEFAULT_LOGFILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOGFILE_NAME)),
        Err(e) => {
            warn!("Could not locate the executable, logging to the working directory: {}", e);
            PathBuf::from(DEFAULT_LOGFILE_NAME)
        }
    }
}

/// Writes one report block with a single call so blocks never interleave.
pub async fn write_report(sink: &ReportSink, block: String) -> Result<(), ReportWriteError> {
    let sink = sink.clone();
    task::spawn_blocking(move || match &sink {
        ReportSink::Stdout => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            out.write_all(block.as_bytes())
                .and_then(|_| out.flush())
                .map_err(|source| ReportWriteError::Io {
                    path: "stdout".into(),
                    source,
                })
        }
        ReportSink::File(path) => append_block(path, &block).map_err(|source| ReportWriteError::Io {
            path: path.display().to_string(),
            source,
        }),
    })
    .await?
}

fn append_block(path: &Path, block: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    // Best-effort sync when the write itself fails; the handle closes on drop.
    let mut file = guard(file, |file| {
        let _ = file.sync_all();
    });
    file.write_all(block.as_bytes())?;
    let file = ScopeGuard::into_inner(file);
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_sinks() {
        assert_eq!(ReportSink::resolve(Some("")), ReportSink::Stdout);
        assert_eq!(ReportSink::resolve(Some("-")), ReportSink::Stdout);
        assert_eq!(ReportSink::resolve(Some("None")), ReportSink::Stdout);
        assert_eq!(
            ReportSink::resolve(Some("logs/out.txt")),
            ReportSink::File(PathBuf::from("logs/out.txt"))
        );
        match ReportSink::resolve(None) {
            ReportSink::File(path) => assert!(path.ends_with(DEFAULT_LOGFILE_NAME)),
            other => panic!("expected default file sink, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn appends_blocks_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("monitor_log.txt");
        let sink = ReportSink::File(path.clone());

        write_report(&sink, "first\n---\n".to_string()).await.unwrap();
        write_report(&sink, "second\n---\n".to_string()).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\n---\nsecond\n---\n");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn full_disk_is_reported() {
        if !Path::new("/dev/full").exists() {
            return;
        }
        let sink = ReportSink::File(PathBuf::from("/dev/full"));
        let err = write_report(&sink, "Run started at: x\n---\n".to_string())
            .await
            .unwrap_err();
        match err {
            ReportWriteError::Io { path, source } => {
                assert_eq!(path, "/dev/full");
                assert_eq!(source.raw_os_error(), Some(28));
            }
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unwritable_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let sink = ReportSink::File(dir.path().to_path_buf());
        let err = write_report(&sink, "x\n".to_string()).await.unwrap_err();
        assert!(matches!(err, ReportWriteError::Io { .. }));
    }
}
