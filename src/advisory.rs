//! Simulated AI advisories.
//!
//! Each refresh has a small chance of raising one advisory that suggests an
//! operator action for a random sector. Operators approve or reject it.
//! Resolution only clears the pending advisory and produces a notification;
//! the snapshot itself is never touched.

use chrono::NaiveDateTime;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::generator::random_uuid;
use crate::model::Snapshot;

/// Confidence shown with every advisory, in percent.
pub const ADVISORY_CONFIDENCE: f64 = 94.7;

/// Estimated number of pilgrims affected by an advisory.
pub const ADVISORY_ESTIMATED_IMPACT: u32 = 15_000;

/// Which assistant raised the advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisoryKind {
    /// Predictive crowd-density alert.
    Samanjasya,
    /// Communication and rumour-control suggestion.
    Vishwas,
    /// Drone response to an incident.
    Suraksha,
}

impl AdvisoryKind {
    pub const ALL: [AdvisoryKind; 3] = [
        AdvisoryKind::Samanjasya,
        AdvisoryKind::Vishwas,
        AdvisoryKind::Suraksha,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            AdvisoryKind::Samanjasya => "Samanjasya: Predictive Alert",
            AdvisoryKind::Vishwas => "Vishwas: Communication Suggestion",
            AdvisoryKind::Suraksha => "Suraksha: Drone Response",
        }
    }

    pub fn severity(&self) -> AdvisorySeverity {
        match self {
            AdvisoryKind::Samanjasya => AdvisorySeverity::Warning,
            AdvisoryKind::Vishwas => AdvisorySeverity::Urgent,
            AdvisoryKind::Suraksha => AdvisorySeverity::Critical,
        }
    }

    fn message(&self, sector_name: &str) -> String {
        match self {
            AdvisoryKind::Samanjasya => format!(
                "Crowd density in {sector_name} is predicted to reach critical levels in 15 minutes. \
                 Suggestion: Divert pilgrims towards an alternate pathway."
            ),
            AdvisoryKind::Vishwas => format!(
                "Social media sentiment analysis indicates a rumor spreading in {sector_name}. \
                 Suggestion: Play rumor-control announcement RC-08."
            ),
            AdvisoryKind::Suraksha => format!(
                "Missing person reported in {sector_name}. \
                 Deploying drone unit DR-05 for immediate search operation."
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisorySeverity {
    Warning,
    Urgent,
    Critical,
}

/// An advisory waiting for an operator decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: AdvisoryKind,
    pub title: String,
    pub message: String,
    pub severity: AdvisorySeverity,

    /// Local time the advisory was raised, `HH:MM:SS`.
    pub issued_at: String,

    pub sector_id: String,
    pub confidence: f64,
    pub estimated_impact: u32,
}

/// Roll the per-tick chance of an advisory for `snapshot`.
///
/// Returns `None` when the roll fails or the snapshot has no sectors.
pub fn maybe_raise<R: Rng + ?Sized>(
    rng: &mut R,
    snapshot: &Snapshot,
    probability: f64,
    now: NaiveDateTime,
) -> Option<Advisory> {
    if !rng.random_bool(probability.clamp(0.0, 1.0)) || snapshot.sectors.is_empty() {
        return None;
    }
    let kind = AdvisoryKind::ALL[rng.random_range(0..AdvisoryKind::ALL.len())];
    raise(rng, snapshot, kind, now)
}

/// Raise an advisory of a given kind naming a random sector of `snapshot`.
pub fn raise<R: Rng + ?Sized>(
    rng: &mut R,
    snapshot: &Snapshot,
    kind: AdvisoryKind,
    now: NaiveDateTime,
) -> Option<Advisory> {
    if snapshot.sectors.is_empty() {
        return None;
    }
    let sector = &snapshot.sectors[rng.random_range(0..snapshot.sectors.len())];

    Some(Advisory {
        id: random_uuid(rng),
        kind,
        title: kind.title().to_string(),
        message: kind.message(&sector.name),
        severity: kind.severity(),
        issued_at: now.format("%H:%M:%S").to_string(),
        sector_id: sector.id.clone(),
        confidence: ADVISORY_CONFIDENCE,
        estimated_impact: ADVISORY_ESTIMATED_IMPACT,
    })
}

/// An operator's answer to an advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

/// Notification tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Info,
}

/// Result of resolving an advisory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryOutcome {
    pub advisory_id: Uuid,
    pub decision: Decision,
    pub notice: NoticeKind,
    pub message: String,
}

impl AdvisoryOutcome {
    pub fn new(advisory: &Advisory, decision: Decision) -> Self {
        let (notice, message) = match decision {
            Decision::Approve => (
                NoticeKind::Success,
                format!(
                    "AI suggestion \"{}\" has been approved and executed.",
                    advisory.title
                ),
            ),
            Decision::Reject => (
                NoticeKind::Info,
                format!("AI suggestion \"{}\" was rejected.", advisory.title),
            ),
        };

        Self {
            advisory_id: advisory.id,
            decision,
            notice,
            message,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdvisoryError {
    #[error("advisory {0} is not pending")]
    NotPending(Uuid),
}
