//! Configuration file watcher for hot reload.
//!
//! Only admission limits can change on a running gateway. The watcher
//! reloads the file on every save but forwards a new [`AdmissionConfig`]
//! only when that section actually changed; edits to anything else are
//! reported as needing a restart.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::{AdmissionConfig, GatewayConfig};

/// Watches the configuration file and forwards admission limit changes.
pub struct ConfigWatcher {
    path: PathBuf,
    current: GatewayConfig,
    update_tx: mpsc::UnboundedSender<AdmissionConfig>,
}

impl ConfigWatcher {
    /// `current` is the configuration the server was started with.
    pub fn new(
        path: &Path,
        current: GatewayConfig,
    ) -> (Self, mpsc::UnboundedReceiver<AdmissionConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                current,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    ///
    /// The parent directory is watched rather than the file, since editors
    /// often save by replacing the file.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            mut current,
            update_tx,
        } = self;
        let file_name = path.file_name().map(OsString::from);
        let directory = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let reload_path = path.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches_file(&event, file_name.as_deref()) => {
                    match load_config(&reload_path) {
                        Ok(new_config) => {
                            if let Some(admission) = admission_update(&mut current, new_config) {
                                let _ = update_tx.send(admission);
                            }
                        }
                        Err(e) => tracing::error!(
                            error = %e,
                            "Failed to reload config, keeping current configuration"
                        ),
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

/// A create or modify event naming the watched file.
fn touches_file(event: &Event, file_name: Option<&std::ffi::OsStr>) -> bool {
    let Some(file_name) = file_name else {
        return false;
    };
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name))
}

/// Adopt `new` as the current configuration and return the admission
/// section if it differs from before.
///
/// Repeated events for one save load identical configurations and yield
/// nothing.
fn admission_update(current: &mut GatewayConfig, new: GatewayConfig) -> Option<AdmissionConfig> {
    let admission_changed = current.admission != new.admission;
    if other_sections(current) != other_sections(&new) {
        tracing::warn!("Settings other than admission limits changed; restart to apply them");
    }

    *current = new;
    if admission_changed {
        tracing::info!(
            burst_capacity = current.admission.burst_capacity,
            sustained_rate = current.admission.sustained_rate,
            "Admission limits changed on disk"
        );
        Some(current.admission.clone())
    } else {
        tracing::debug!("Config file touched, admission limits unchanged");
        None
    }
}

fn other_sections(config: &GatewayConfig) -> Option<serde_json::Value> {
    let mut value = serde_json::to_value(config).ok()?;
    if let Some(sections) = value.as_object_mut() {
        sections.remove("admission");
    }
    Some(value)
}
