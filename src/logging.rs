//! Node log
//!
//! Each message goes to a `tracing` event (stderr once a subscriber is
//! installed) and is appended to the node's log file. The file is opened and
//! closed per line so nothing is held between calls.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Append-only log shared by every call of a node
///
/// The file is always written. The stderr mirror goes through `tracing`, so
/// a host embedding the library must install a subscriber to see it; calling
/// [`init_tracing`] once at startup is enough. The CLI does this itself.
#[derive(Debug, Clone)]
pub struct NodeLog {
    path: PathBuf,
}

impl NodeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Log a progress message
    pub fn line(&self, message: &str) {
        tracing::info!(target: "pedalboard_node", "{}", message);
        self.append(Level::INFO, message);
    }

    /// Log a failure, just before the matching error is returned
    pub fn error(&self, message: &str) {
        tracing::error!(target: "pedalboard_node", "{}", message);
        self.append(Level::ERROR, message);
    }

    fn append(&self, level: Level, message: &str) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{} {} {}", timestamp, level, message));

        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), "Logging error: {}", e);
        }
    }
}

/// Install a stderr subscriber for the command-line front end
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` when verbose.
/// Records from the `log` facade are forwarded as well.
pub fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A host may already have installed a subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
