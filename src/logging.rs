//! Process-wide `tracing` setup for hosts without a subscriber of their own.
//!
//! The [`Logger`](crate::Logger) middleware only emits events; nothing is
//! written anywhere until some subscriber is installed. Hosts that already
//! run one should skip this module.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable naming the base path of the log file.
pub const LOG_PATH_ENV: &str = "ANYSTATE_LOG";

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_FILTER_ENV: &str = "ANYSTATE_LOG_FILTER";

/// Shows the action logger at its default level.
const DEFAULT_FILTER: &str = "anystate=debug";

/// Install a file subscriber when `ANYSTATE_LOG` is set.
///
/// Returns the path actually written to, or `None` when the variable is
/// unset, the file cannot be created, or a global subscriber already
/// exists.
pub fn init_tracing() -> Option<PathBuf> {
    let base = std::env::var_os(LOG_PATH_ENV)?;
    init_tracing_at(Path::new(&base))
}

/// Install a file subscriber writing next to `base`.
///
/// The file is named `{base}.{timestamp}.{pid}` so several processes can
/// share one base path. The filter comes from `ANYSTATE_LOG_FILTER`,
/// defaulting to `anystate=debug`.
pub fn init_tracing_at(base: &Path) -> Option<PathBuf> {
    let path = unique_log_path(base, std::process::id());
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Warning: failed to create log file {}: {}", path.display(), err);
            return None;
        }
    };

    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    match tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
    {
        Ok(()) => Some(path),
        Err(_) => {
            // Someone else owns the global subscriber; leave no empty file.
            let _ = fs::remove_file(&path);
            None
        }
    }
}

fn unique_log_path(base: &Path, pid: u32) -> PathBuf {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut name = base.as_os_str().to_os_string();
    name.push(format!(".{}.{}", timestamp, pid));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_keeps_base_and_appends_pid() {
        let path = unique_log_path(Path::new("/tmp/logs/anystate.log"), 4242);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        assert_eq!(path.parent(), Some(Path::new("/tmp/logs")));
        assert!(name.starts_with("anystate.log."), "{name}");
        assert!(name.ends_with(".4242"), "{name}");
    }
}
