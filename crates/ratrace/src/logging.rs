//! File logging for the CLI
//!
//! Every invocation appends to `{data_dir}/ratrace.log`. A log that has grown
//! past [`MAX_LOG_BYTES`] is cut back to its newest whole lines first.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_NAME: &str = "ratrace.log";

pub const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
const TAIL_BYTES: u64 = 1024 * 1024;

/// Keep the last `tail` bytes of `path`, starting at a line boundary, once
/// the file exceeds `max`. Returns the number of bytes dropped.
fn truncate_head(path: &Path, max: u64, tail: u64) -> io::Result<u64> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let size = file.metadata()?.len();
    if size <= max {
        return Ok(0);
    }

    let cut = size.saturating_sub(tail);
    file.seek(SeekFrom::Start(cut))?;
    let mut kept = Vec::with_capacity(tail as usize);
    file.read_to_end(&mut kept)?;

    let line_start = kept.iter().position(|&b| b == b'\n').map_or(0, |i| i + 1);
    let dropped = cut + line_start as u64;
    let mut file = File::create(path)?;
    writeln!(file, "[log truncated: {dropped} older bytes removed]")?;
    file.write_all(&kept[line_start..])?;
    Ok(dropped)
}

fn open_log(data_dir: &Path) -> io::Result<(PathBuf, File)> {
    fs::create_dir_all(data_dir)?;
    let path = data_dir.join(LOG_FILE_NAME);
    if let Err(e) = truncate_head(&path, MAX_LOG_BYTES, TAIL_BYTES) {
        eprintln!("warning: could not truncate {}: {e}", path.display());
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}

/// Route `tracing` output for both crates to the data directory's log file.
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(data_dir: &Path, level: &str) -> color_eyre::Result<()> {
    let (path, file) = open_log(data_dir)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ratrace={level},ratrace_core={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()?;

    tracing::debug!(path = %path.display(), "logging to file");
    Ok(())
}
