use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::PassError;

/// Install the global subscriber.
///
/// Terminal layer on stderr: `pvpass=debug` with `verbose`, otherwise
/// `RUST_LOG` or `pvpass=warn`. With `log_file`, a second non-ANSI layer
/// appends everything at debug level to that file.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<(), PassError> {
    let terminal_filter = if verbose {
        EnvFilter::new("pvpass=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pvpass=warn"))
    };

    let terminal_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(terminal_filter);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).map_err(|e| PassError::Io {
                    context: format!("creating {}", parent.display()),
                    source: e,
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| PassError::Io {
                    context: format!("opening log file {}", path.display()),
                    source: e,
                })?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(EnvFilter::new("pvpass=debug")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(terminal_layer)
        .with(file_layer)
        .init();
    Ok(())
}
