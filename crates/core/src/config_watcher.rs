use crate::config::WithdrawalSettings;
use crate::config_loader::ConfigLoader;
use anyhow::Result;
use notify::{Event, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// Follows a config file and publishes its `[withdrawal]` section.
///
/// Withdrawal settings are the only part of the configuration the engine
/// accepts at runtime. Receivers are woken only when that section actually
/// changes; a file that fails to parse is logged and the last good settings
/// stay in place.
pub struct ConfigWatcher {
    path: PathBuf,
    tx: watch::Sender<WithdrawalSettings>,
}

impl ConfigWatcher {
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        initial: WithdrawalSettings,
    ) -> (Self, watch::Receiver<WithdrawalSettings>) {
        let (tx, rx) = watch::channel(initial);
        let watcher = Self {
            path: path.into(),
            tx,
        };
        (watcher, rx)
    }

    /// Blocks a worker thread on file notifications until the watcher shuts
    /// down or every receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be watched or the worker panics.
    pub async fn watch(self) -> Result<()> {
        tokio::task::spawn_blocking(move || {
            let (notify_tx, notify_rx) = std::sync::mpsc::channel();

            let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            })?;
            watcher.watch(Path::new(&self.path), RecursiveMode::NonRecursive)?;
            tracing::info!("Watching {} for withdrawal settings", self.path.display());

            for event in notify_rx {
                if self.tx.is_closed() {
                    break;
                }
                if event.kind.is_modify() {
                    self.reload();
                }
            }

            Ok::<_, anyhow::Error>(())
        })
        .await??;

        Ok(())
    }

    /// Re-reads the file. Returns true when receivers were notified.
    pub fn reload(&self) -> bool {
        let settings = match ConfigLoader::load_from(&self.path) {
            Ok(config) => config.withdrawal,
            Err(e) => {
                tracing::error!("Failed to reload {}: {e:#}", self.path.display());
                return false;
            }
        };

        let changed = self.tx.send_if_modified(|current| {
            if *current == settings {
                false
            } else {
                *current = settings;
                true
            }
        });
        if changed {
            tracing::info!("Withdrawal settings changed in {}", self.path.display());
        } else {
            tracing::debug!("{} changed without touching [withdrawal]", self.path.display());
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn only_withdrawal_changes_wake_receivers() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("Engine.toml", "[withdrawal]\nthreshold_amount = \"1\"\n")?;
            let initial = ConfigLoader::load_from("Engine.toml").unwrap().withdrawal;
            let (watcher, rx) = ConfigWatcher::new("Engine.toml", initial);

            jail.create_file(
                "Engine.toml",
                "[server]\nport = 9000\n[withdrawal]\nthreshold_amount = \"1\"\n",
            )?;
            assert!(!watcher.reload());
            assert!(!rx.has_changed().unwrap());

            jail.create_file("Engine.toml", "[withdrawal]\nthreshold_amount = \"2.5\"\n")?;
            assert!(watcher.reload());
            assert!(rx.has_changed().unwrap());
            assert_eq!(rx.borrow().threshold_amount, dec!(2.5));
            Ok(())
        });
    }

    #[test]
    fn unparseable_file_keeps_last_good_settings() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("Engine.toml", "[withdrawal]\nmax_transfer_minutes = 5\n")?;
            let initial = ConfigLoader::load_from("Engine.toml").unwrap().withdrawal;
            let (watcher, rx) = ConfigWatcher::new("Engine.toml", initial);

            jail.create_file("Engine.toml", "[withdrawal]\nmax_transfer_minutes = \"soon\"\n")?;
            assert!(!watcher.reload());
            assert_eq!(rx.borrow().max_transfer_minutes, 5);
            Ok(())
        });
    }
}
