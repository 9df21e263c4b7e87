use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE: &str = "neurouq.log";
/// Maximum log file size before rotation (5 MB)
const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;
/// Size to keep after rotation (1 MB of most recent logs)
const KEEP_SIZE: u64 = 1024 * 1024;

/// Trim the log file to its last `keep` bytes once it exceeds `max`.
fn rotate_log_if_needed(log_path: &Path, max: u64, keep: u64) -> std::io::Result<()> {
    if !log_path.exists() {
        return Ok(());
    }

    let metadata = fs::metadata(log_path)?;
    if metadata.len() <= max {
        return Ok(());
    }

    let mut file = File::open(log_path)?;
    file.seek(SeekFrom::Start(metadata.len().saturating_sub(keep)))?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    drop(file);

    // Skip to the first newline to avoid partial lines
    let skip = buffer
        .iter()
        .position(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);

    let mut file = File::create(log_path)?;
    file.write_all(b"--- Log rotated (older entries removed) ---\n")?;
    file.write_all(&buffer[skip..])?;
    Ok(())
}

/// Log to stderr and to `{output_dir}/neurouq.log`.
///
/// `RUST_LOG` overrides `level`. The returned guard flushes the file writer
/// on drop and must be held for the life of the program.
pub fn init_logging(output_dir: &Path, level: &str) -> color_eyre::Result<WorkerGuard> {
    fs::create_dir_all(output_dir)?;
    let log_path = output_dir.join(LOG_FILE);

    if let Err(e) = rotate_log_if_needed(&log_path, MAX_LOG_SIZE, KEEP_SIZE) {
        eprintln!("Warning: Failed to rotate log file: {e}");
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    let default_filter = format!("neurouq={level},neurouq_core={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    tracing::info!(log_path = %log_path.display(), "neurouq logging initialized");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_keeps_recent_whole_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(LOG_FILE);
        let content: String = (0..100).map(|i| format!("line {i:03}\n")).collect();
        fs::write(&path, &content).unwrap();

        rotate_log_if_needed(&path, 200, 50).unwrap();

        let rotated = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = rotated.lines().collect();
        assert_eq!(lines[0], "--- Log rotated (older entries removed) ---");
        assert_eq!(lines.last(), Some(&"line 099"));
        assert!(lines[1..].iter().all(|l| l.starts_with("line ")));
        assert!(lines.len() < 10);
    }

    #[test]
    fn test_small_log_untouched() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(LOG_FILE);
        fs::write(&path, "short\n").unwrap();
        rotate_log_if_needed(&path, 200, 50).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "short\n");
        assert!(rotate_log_if_needed(&dir.path().join("absent.log"), 200, 50).is_ok());
    }
}
