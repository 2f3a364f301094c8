//! Daily sweep scheduler: a cron-style full-population busyness recompute,
//! distinct from the per-mutation recalculation triggers but built on the
//! same calculator primitive.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tracing::{error, info, instrument};

use cadence_core::{day_start, defaults, Error, Result, UserDirectory};
use cadence_db::Database;

use crate::busyness::BusynessCalculator;
use crate::calculators_from_database;

/// Configuration for the daily sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// UTC hour of day the sweep fires at.
    pub hour_utc: u32,
    /// Whether the sweep runs at all.
    pub enabled: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            hour_utc: defaults::SWEEP_HOUR_UTC,
            enabled: true,
        }
    }
}

impl SweepConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SWEEP_ENABLED` | `true` | Enable/disable the daily sweep |
    /// | `SWEEP_HOUR_UTC` | `9` | UTC hour the sweep fires at |
    pub fn from_env() -> Self {
        let enabled = std::env::var("SWEEP_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);
        let hour_utc = std::env::var("SWEEP_HOUR_UTC")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|h| *h < 24)
            .unwrap_or(defaults::SWEEP_HOUR_UTC);
        Self { hour_utc, enabled }
    }

    /// Set the UTC hour of day.
    pub fn with_hour(mut self, hour_utc: u32) -> Self {
        self.hour_utc = hour_utc.min(23);
        self
    }

    /// Enable or disable the sweep.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Event emitted by the daily sweep.
#[derive(Debug, Clone)]
pub enum SweepEvent {
    /// A sweep over the full user population began.
    SweepStarted { day: NaiveDate },
    /// A sweep finished; failures were logged per user and skipped.
    SweepCompleted {
        day: NaiveDate,
        users: usize,
        failures: usize,
    },
    /// Scheduler stopped.
    SweepStopped,
}

/// Outcome of one full-population sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub users: usize,
    pub failures: usize,
}

/// Handle for controlling a running sweep scheduler.
pub struct SweepHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<SweepEvent>,
}

impl SweepHandle {
    /// Signal the scheduler to shut down gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for sweep events.
    pub fn events(&self) -> broadcast::Receiver<SweepEvent> {
        self.event_rx.resubscribe()
    }
}

/// Periodic full-population busyness recompute.
pub struct DailySweep {
    users: Arc<dyn UserDirectory>,
    busyness: BusynessCalculator,
    config: SweepConfig,
    event_tx: broadcast::Sender<SweepEvent>,
}

impl DailySweep {
    /// Create a sweep over explicit collaborators.
    pub fn new(
        users: Arc<dyn UserDirectory>,
        busyness: BusynessCalculator,
        config: SweepConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            users,
            busyness,
            config,
            event_tx,
        }
    }

    /// Create a sweep wired to a PostgreSQL [`Database`].
    pub fn from_database(db: &Database, config: SweepConfig) -> Self {
        let (busyness, _) = calculators_from_database(db);
        Self::new(
            Arc::new(cadence_db::PgUserDirectory::new(db.pool.clone())),
            busyness,
            config,
        )
    }

    /// Get a receiver for sweep events.
    pub fn events(&self) -> broadcast::Receiver<SweepEvent> {
        self.event_tx.subscribe()
    }

    /// Recompute busyness for every known user for `day`.
    ///
    /// Per-user failures are logged and counted, never aborting the sweep;
    /// only a failure to read the user directory itself surfaces.
    #[instrument(skip(self))]
    pub async fn run_once(&self, day: NaiveDate) -> Result<SweepSummary> {
        let user_ids = self.users.list_user_ids().await?;
        let mut failures = 0;

        for user in &user_ids {
            if let Err(e) = self.busyness.compute_and_store(*user, day).await {
                failures += 1;
                error!(
                    subsystem = "jobs",
                    component = "sweep",
                    user_id = %user,
                    error = %e,
                    "Busyness recompute failed during sweep"
                );
            }
        }

        info!(
            subsystem = "jobs",
            component = "sweep",
            users = user_ids.len(),
            failures,
            "Daily busyness sweep finished"
        );
        Ok(SweepSummary {
            users: user_ids.len(),
            failures,
        })
    }

    /// Start the scheduler loop and return a handle for control.
    pub fn start(self) -> SweepHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            if !self.config.enabled {
                info!("Daily sweep is disabled, not starting");
                return;
            }
            info!(
                subsystem = "jobs",
                component = "sweep",
                hour_utc = self.config.hour_utc,
                "Daily sweep scheduler started"
            );

            loop {
                let now = Utc::now();
                let next = next_run_after(now, self.config.hour_utc);
                let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Daily sweep received shutdown signal");
                        break;
                    }
                    _ = sleep(wait) => {
                        let day = Utc::now().date_naive();
                        let _ = self.event_tx.send(SweepEvent::SweepStarted { day });
                        match self.run_once(day).await {
                            Ok(summary) => {
                                let _ = self.event_tx.send(SweepEvent::SweepCompleted {
                                    day,
                                    users: summary.users,
                                    failures: summary.failures,
                                });
                            }
                            Err(e) => {
                                error!(
                                    subsystem = "jobs",
                                    component = "sweep",
                                    error = %e,
                                    "Daily sweep failed to enumerate users"
                                );
                            }
                        }
                    }
                }
            }

            let _ = self.event_tx.send(SweepEvent::SweepStopped);
            info!(subsystem = "jobs", component = "sweep", "Daily sweep scheduler stopped");
        });

        SweepHandle {
            shutdown_tx,
            event_rx,
        }
    }
}

/// The next instant strictly after `now` at `hour_utc` o'clock.
fn next_run_after(now: DateTime<Utc>, hour_utc: u32) -> DateTime<Utc> {
    let today_run = day_start(now.date_naive()) + chrono::Duration::hours(hour_utc as i64);
    if today_run > now {
        today_run
    } else {
        today_run + chrono::Duration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_config_default() {
        let config = SweepConfig::default();
        assert_eq!(config.hour_utc, defaults::SWEEP_HOUR_UTC);
        assert!(config.enabled);
    }

    #[test]
    fn test_sweep_config_with_hour_clamps() {
        assert_eq!(SweepConfig::default().with_hour(30).hour_utc, 23);
        assert_eq!(SweepConfig::default().with_hour(6).hour_utc, 6);
    }

    #[test]
    fn test_next_run_after_same_day() {
        let now: DateTime<Utc> = "2024-05-01T03:00:00Z".parse().unwrap();
        let next = next_run_after(now, 9);
        assert_eq!(next, "2024-05-01T09:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn test_next_run_after_rolls_to_tomorrow() {
        let now: DateTime<Utc> = "2024-05-01T09:00:00Z".parse().unwrap();
        let next = next_run_after(now, 9);
        assert_eq!(next, "2024-05-02T09:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }
}
