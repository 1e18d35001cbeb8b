//! Data models for Drishti.
//!
//! A [`Snapshot`] is one complete picture of the simulated event: crowd
//! totals, sectors, checkpoints, SOS alerts, drones, stocks, service health,
//! announcements, choke points and short-term crowd forecasts.
//!
//! Snapshots are built whole by the generator and handed out read-only.
//! Nothing downstream mutates one; a refresh replaces it entirely.
//!
//! Field names serialize in camelCase and enum values in kebab-case so the
//! JSON matches what the dashboard front end already renders.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::geo::{FeatureCollection, LonLat, Polygon};

/// Overall alert posture for the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertLevel {
    pub fn label(&self) -> &'static str {
        match self {
            AlertLevel::Low => "LOW",
            AlertLevel::Medium => "MEDIUM",
            AlertLevel::High => "HIGH",
            AlertLevel::Critical => "CRITICAL",
        }
    }
}

/// One complete generated instance of the simulated operational world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Estimated number of people on the grounds. Never below 3,000,000.
    pub total_crowd: u64,

    pub alert_level: AlertLevel,

    /// Always `"Operational"`.
    pub system_status: String,

    /// Equals `sos_alerts.len()`.
    #[serde(rename = "activeSOS")]
    pub active_sos: usize,

    pub active_drones: u32,

    /// Average response time in seconds.
    pub avg_response_time: u32,

    /// Number of checkpoints whose status is low-stock.
    pub low_stock_items: usize,

    pub sectors: Vec<Sector>,
    pub checkpoints: Vec<Checkpoint>,
    pub sos_alerts: Vec<SosAlert>,

    /// Positional samples for heatmaps and markers. Not entities.
    pub pilgrim_paths: FeatureCollection,

    pub drones: Vec<Drone>,
    pub logistics: Vec<LogisticsItem>,
    pub services: Vec<ServiceHealth>,
    pub announcements: Vec<Announcement>,
    pub choke_points: Vec<ChokePoint>,

    /// Exactly one entry per sector, in sector order.
    pub crowd_predictions: Vec<CrowdPrediction>,
}

impl Snapshot {
    pub fn sector(&self, id: &str) -> Option<&Sector> {
        self.sectors.iter().find(|s| s.id == id)
    }

    pub fn low_stock_count(&self) -> usize {
        self.checkpoints
            .iter()
            .filter(|cp| cp.status == CheckpointStatus::LowStock)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectorType {
    Ghat,
    Bridge,
    Entry,
    Hub,
    Residential,
}

/// A named geographic zone with a crowd-density value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SectorType,

    /// Current occupancy as a fraction of capacity.
    pub density: f64,

    /// Expected density shortly; never below `density`.
    pub predicted_density: f64,

    pub geometry: Polygon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointType {
    Medical,
    Logistics,
    Water,
    Security,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckpointStatus {
    Operational,
    Busy,
    LowStock,
    Maintenance,
}

/// Raised when a checkpoint tier is not 1, 2 or 3.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid checkpoint tier {0}, expected 1, 2 or 3")]
pub struct InvalidTier(pub u8);

/// Checkpoint size class. Serialized as the bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Tier {
    One,
    Two,
    Three,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::One, Tier::Two, Tier::Three];

    pub fn value(self) -> u8 {
        match self {
            Tier::One => 1,
            Tier::Two => 2,
            Tier::Three => 3,
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.value()
    }
}

impl TryFrom<u8> for Tier {
    type Error = InvalidTier;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::One),
            2 => Ok(Tier::Two),
            3 => Ok(Tier::Three),
            other => Err(InvalidTier(other)),
        }
    }
}

/// A stock bucket at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub current: u32,
    pub max: u32,
}

/// Below this many water bottles a checkpoint is low on stock.
pub const WATER_LOW_STOCK: u32 = 40;

/// Below this many first-aid kits a checkpoint is low on stock.
pub const KITS_LOW_STOCK: u32 = 10;

/// The four stock buckets every checkpoint carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(rename = "Water Bottles")]
    pub water_bottles: StockLevel,

    #[serde(rename = "First-Aid Kits")]
    pub first_aid_kits: StockLevel,

    #[serde(rename = "Food Packets")]
    pub food_packets: StockLevel,

    #[serde(rename = "Blankets")]
    pub blankets: StockLevel,
}

impl Inventory {
    /// Low when water or first-aid kits fall under their thresholds.
    pub fn is_low_stock(&self) -> bool {
        self.water_bottles.current < WATER_LOW_STOCK
            || self.first_aid_kits.current < KITS_LOW_STOCK
    }
}

/// A staffed post with resource inventory and operational status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// `CP-001` style identifier.
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CheckpointType,
    pub tier: Tier,
    pub status: CheckpointStatus,
    pub coordinates: LonLat,
    pub personnel: u32,
    pub inventory: Inventory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SosType {
    Medical,
    LostPerson,
    Emergency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosAlert {
    pub pilgrim_id: String,

    /// Local wall-clock time, `HH:MM:SS`.
    pub timestamp: String,

    pub sector: String,
    #[serde(rename = "type")]
    pub kind: SosType,
    pub coordinates: LonLat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DroneStatus {
    Idle,
    EnRoute,
    Scanning,
    Returning,
}

impl DroneStatus {
    pub const ALL: [DroneStatus; 4] = [
        DroneStatus::Idle,
        DroneStatus::EnRoute,
        DroneStatus::Scanning,
        DroneStatus::Returning,
    ];

    /// The task a drone in this status is performing.
    pub fn task(&self) -> &'static str {
        match self {
            DroneStatus::Idle => "Standby",
            DroneStatus::EnRoute => "Dispatch to SOS",
            DroneStatus::Scanning => "Crowd Imaging",
            DroneStatus::Returning => "Return to Base",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drone {
    pub id: String,
    pub status: DroneStatus,

    /// Charge percentage, 15 to 100.
    pub battery: u8,

    /// Id of the sector the drone is assigned to.
    pub sector: String,
    pub task: String,

    /// Minutes left on the current task; 0 exactly when idle.
    pub eta: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogisticsItem {
    pub name: String,
    pub current: u32,
    pub max: u32,
    pub unit: String,
    pub eta_depletion_minutes: u32,
}

impl LogisticsItem {
    /// Fill level as a percentage of `max`.
    pub fn fill_pct(&self) -> f64 {
        if self.max == 0 {
            0.0
        } else {
            f64::from(self.current) / f64::from(self.max) * 100.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub name: String,
    pub status: ServiceStatus,
    pub latency_ms: u32,

    /// Error rate in percent.
    pub error_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    PublicAddress,
    Sms,
    AppPush,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: Uuid,
    pub time: String,
    pub channel: Channel,
    pub message: String,
    #[serde(rename = "approvedByAI")]
    pub approved_by_ai: bool,
    pub approved_by_human: bool,
}

/// A predicted crowd-congestion risk location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChokePoint {
    pub id: String,
    pub sector_id: String,

    /// 0.4 to 0.95.
    pub risk_score: f64,
    pub coordinates: LonLat,
    pub eta_minutes: u32,
}

/// Change in density beyond which a sector is rising or falling.
pub const TREND_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    /// Classify the 15 minute change `plus15 - now`.
    pub fn from_delta(delta: f64) -> Self {
        if delta > TREND_THRESHOLD {
            Trend::Rising
        } else if delta < -TREND_THRESHOLD {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrowdPrediction {
    pub sector_id: String,

    /// The sector's current density.
    pub now: f64,
    pub plus15: f64,
    pub plus30: f64,
    pub trend: Trend,
}
