//! The live snapshot feed.
//!
//! [`SnapshotFeed`] holds the single current snapshot and the transient state
//! around it: the pending AI advisory and the jittered pilgrim markers. A
//! refresh replaces the snapshot wholesale; readers get an `Arc` to a complete
//! snapshot and never see one half-built.
//!
//! Two independent timers drive the feed:
//! - the refresh loop regenerates the snapshot and rolls for an advisory
//! - the jitter loop nudges the tracked pilgrim markers

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::advisory::{Advisory, AdvisoryError, AdvisoryOutcome, Decision, maybe_raise};
use crate::aggregation::{AnalyticsReport, build_analytics};
use crate::config::SimulationConfig;
use crate::generator::generate_snapshot;
use crate::geo::{LonLat, jitter};
use crate::model::{AlertLevel, Snapshot};

/// Summary of one refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub generation: u64,
    pub total_crowd: u64,
    pub alert_level: AlertLevel,

    /// The advisory raised by this refresh, if the roll succeeded.
    pub advisory: Option<Advisory>,
}

struct FeedState {
    snapshot: Arc<Snapshot>,
    generation: u64,
    markers: Vec<LonLat>,
    pending_advisory: Option<Advisory>,
    rng: StdRng,
}

/// Shared handle to the current snapshot. Cheap to clone.
#[derive(Clone)]
pub struct SnapshotFeed {
    config: Arc<SimulationConfig>,
    state: Arc<RwLock<FeedState>>,
}

impl SnapshotFeed {
    /// Create a feed seeded from the OS entropy source.
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng(), local_now())
    }

    /// Create a feed with a fixed seed, for reproducible runs.
    pub fn seeded(config: SimulationConfig, seed: u64, now: NaiveDateTime) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed), now)
    }

    fn with_rng(config: SimulationConfig, mut rng: StdRng, now: NaiveDateTime) -> Self {
        let snapshot = generate_snapshot(&mut rng, &config, now);
        let markers = tracked_markers(&snapshot, config.tracked_markers);

        Self {
            config: Arc::new(config),
            state: Arc::new(RwLock::new(FeedState {
                snapshot: Arc::new(snapshot),
                generation: 0,
                markers,
                pending_advisory: None,
                rng,
            })),
        }
    }

    /// The current snapshot.
    pub async fn current(&self) -> Arc<Snapshot> {
        self.state.read().await.snapshot.clone()
    }

    /// How many refreshes have replaced the initial snapshot.
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Replace the current snapshot with a freshly generated one.
    pub async fn refresh(&self, now: NaiveDateTime) -> RefreshReport {
        let mut state = self.state.write().await;
        let FeedState { rng, .. } = &mut *state;

        let snapshot = generate_snapshot(rng, &self.config, now);
        let advisory = maybe_raise(rng, &snapshot, self.config.advisory_probability, now);

        state.markers = tracked_markers(&snapshot, self.config.tracked_markers);
        state.snapshot = Arc::new(snapshot);
        state.generation += 1;
        if let Some(advisory) = &advisory {
            state.pending_advisory = Some(advisory.clone());
        }

        RefreshReport {
            generation: state.generation,
            total_crowd: state.snapshot.total_crowd,
            alert_level: state.snapshot.alert_level,
            advisory,
        }
    }

    /// Nudge every tracked marker by a small random offset.
    pub async fn jitter_markers(&self) {
        let mut state = self.state.write().await;
        let FeedState { markers, rng, .. } = &mut *state;
        let magnitude = self.config.jitter_magnitude;

        for marker in markers.iter_mut() {
            *marker = jitter(rng, *marker, magnitude);
        }
    }

    pub async fn markers(&self) -> Vec<LonLat> {
        self.state.read().await.markers.clone()
    }

    pub async fn pending_advisory(&self) -> Option<Advisory> {
        self.state.read().await.pending_advisory.clone()
    }

    /// Approve or reject the pending advisory.
    ///
    /// Only the pending advisory is cleared; the snapshot is left untouched.
    pub async fn resolve_advisory(
        &self,
        id: Uuid,
        decision: Decision,
    ) -> Result<AdvisoryOutcome, AdvisoryError> {
        let mut state = self.state.write().await;

        match state.pending_advisory.take() {
            Some(advisory) if advisory.id == id => Ok(AdvisoryOutcome::new(&advisory, decision)),
            other => {
                state.pending_advisory = other;
                Err(AdvisoryError::NotPending(id))
            }
        }
    }

    /// Analytics series for the current snapshot.
    pub async fn analytics(&self) -> AnalyticsReport {
        let mut state = self.state.write().await;
        let snapshot = state.snapshot.clone();
        build_analytics(&mut state.rng, &snapshot)
    }

    /// Regenerate the snapshot every `refresh_interval` until the task is aborted.
    pub fn spawn_refresh_loop(&self) -> JoinHandle<()> {
        let feed = self.clone();
        let period = self.config.refresh_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately; the initial snapshot covers it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let report = feed.refresh(local_now()).await;
                info!(
                    generation = report.generation,
                    total_crowd = report.total_crowd,
                    alert_level = ?report.alert_level,
                    "Snapshot refreshed"
                );
                if let Some(advisory) = &report.advisory {
                    info!(
                        advisory_id = %advisory.id,
                        kind = ?advisory.kind,
                        sector = %advisory.sector_id,
                        "AI advisory raised"
                    );
                }
            }
        })
    }

    /// Jitter the pilgrim markers every `jitter_interval` until aborted.
    pub fn spawn_jitter_loop(&self) -> JoinHandle<()> {
        let feed = self.clone();
        let period = self.config.jitter_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                feed.jitter_markers().await;
                debug!("Pilgrim markers jittered");
            }
        })
    }
}

fn tracked_markers(snapshot: &Snapshot, count: usize) -> Vec<LonLat> {
    snapshot
        .pilgrim_paths
        .features
        .iter()
        .take(count)
        .map(|f| f.geometry.coordinates)
        .collect()
}

/// Local wall-clock time, the only ambient clock read in the crate.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
