//! Synthetic operational-state generator.
//!
//! [`generate_snapshot`] builds one complete, self-consistent [`Snapshot`] from
//! independent random draws. It keeps no state between calls: two snapshots
//! are unrelated, and a sector's density in one says nothing about the next.
//!
//! Both inputs that used to be ambient are explicit. The random source is a
//! caller-supplied [`Rng`], so a seeded generator reproduces a snapshot
//! exactly, and the wall-clock reading is passed in as `now`.
//!
//! The only derived fields are:
//! - checkpoint status (forced to low-stock by the stock thresholds)
//! - `lowStockItems` and `activeSOS`
//! - drone task and eta (functions of status)
//! - predicted densities and forecast trends (from the sector's density)

use chrono::{Duration, NaiveDateTime, Timelike};
use rand::Rng;
use rand::distr::Alphanumeric;
use rand::seq::IndexedRandom;
use uuid::Uuid;

use crate::config::{AlertWeights, SimulationConfig};
use crate::geo::{FeatureCollection, LonLat, PointFeature, Polygon, random_point_in_disk};
use crate::model::{
    AlertLevel, Announcement, Channel, Checkpoint, CheckpointStatus, CheckpointType, ChokePoint,
    CrowdPrediction, Drone, DroneStatus, Inventory, LogisticsItem, Sector, SectorType,
    ServiceHealth, ServiceStatus, Snapshot, SosAlert, SosType, StockLevel, Tier, Trend,
};

/// Floor for the total crowd estimate.
pub const MIN_TOTAL_CROWD: u64 = 3_000_000;

const PEAK_BASE_CROWD: i64 = 8_000_000;
const OFF_PEAK_BASE_CROWD: i64 = 5_000_000;

const PEAK_BASE_DENSITY: f64 = 0.6;
const OFF_PEAK_BASE_DENSITY: f64 = 0.3;

/// Seconds in a day, for "recent" timestamps expressed in fractions of a day.
const SECONDS_PER_DAY: f64 = 86_400.0;

const SYSTEM_STATUS: &str = "Operational";

const CHECKPOINT_TYPES: [CheckpointType; 5] = [
    CheckpointType::Medical,
    CheckpointType::Logistics,
    CheckpointType::Water,
    CheckpointType::Security,
    CheckpointType::Info,
];

const CHECKPOINT_LABELS: [&str; 4] = ["Post", "Station", "Point", "Unit"];

const SOS_TYPES: [SosType; 3] = [SosType::Medical, SosType::LostPerson, SosType::Emergency];

const CHANNELS: [Channel; 3] = [Channel::PublicAddress, Channel::AppPush, Channel::Sms];

/// Messages an announcement can carry.
pub const ANNOUNCEMENT_TEMPLATES: [&str; 4] = [
    "Advisory: Please keep left while moving towards Ram Ghat.",
    "Heat Alert: Stay hydrated, water points every 150m.",
    "Announcement: Lost child assistance desk active at Central Hub.",
    "Traffic: Sector S4 entry regulated for 10 mins to ease congestion.",
];

struct SectorTemplate {
    id: &'static str,
    name: &'static str,
    kind: SectorType,
    ring: [(f64, f64); 5],
}

const SECTOR_TEMPLATES: [SectorTemplate; 4] = [
    SectorTemplate {
        id: "S1",
        name: "Ram Ghat Sector",
        kind: SectorType::Ghat,
        ring: [
            (75.765, 23.185),
            (75.77, 23.186),
            (75.772, 23.183),
            (75.767, 23.182),
            (75.765, 23.185),
        ],
    },
    SectorTemplate {
        id: "S2",
        name: "Mangalnath Zone",
        kind: SectorType::Ghat,
        ring: [
            (75.78, 23.19),
            (75.785, 23.192),
            (75.786, 23.188),
            (75.781, 23.187),
            (75.78, 23.19),
        ],
    },
    SectorTemplate {
        id: "S3",
        name: "Central Hub",
        kind: SectorType::Hub,
        ring: [
            (75.775, 23.18),
            (75.78, 23.182),
            (75.782, 23.178),
            (75.777, 23.176),
            (75.775, 23.18),
        ],
    },
    SectorTemplate {
        id: "S4",
        name: "Entry Plaza West",
        kind: SectorType::Entry,
        ring: [
            (75.76, 23.178),
            (75.765, 23.18),
            (75.767, 23.176),
            (75.762, 23.174),
            (75.76, 23.178),
        ],
    },
];

/// Whether `hour` (0-23) falls in a peak window, 08-12 or 16-20 inclusive.
pub fn is_peak_hour(hour: u32) -> bool {
    (8..=12).contains(&hour) || (16..=20).contains(&hour)
}

/// Build one complete snapshot.
///
/// `now` is the local wall-clock time; its hour selects the peak-hour bias and
/// it anchors the `HH:MM:SS` timestamps of alerts and announcements.
pub fn generate_snapshot<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SimulationConfig,
    now: NaiveDateTime,
) -> Snapshot {
    let peak = is_peak_hour(now.hour());

    let base_crowd = if peak {
        PEAK_BASE_CROWD
    } else {
        OFF_PEAK_BASE_CROWD
    };
    let drawn_crowd = base_crowd + rng.random_range(-500_000..=1_000_000);
    let total_crowd = u64::try_from(drawn_crowd)
        .unwrap_or(0)
        .max(MIN_TOTAL_CROWD);

    let weights = if peak {
        &config.peak_alert_weights
    } else {
        &config.off_peak_alert_weights
    };
    let alert_level = draw_alert_level(rng, weights);

    let sectors = generate_sectors(rng, config, peak);
    let checkpoints = (1..=config.checkpoint_count)
        .map(|n| generate_checkpoint(rng, config, n))
        .collect::<Vec<_>>();

    let sos_count = rng.random_range(2..=15);
    let sos_alerts = (0..sos_count)
        .map(|_| generate_sos_alert(rng, config, now))
        .collect::<Vec<_>>();

    let pilgrim_paths = FeatureCollection {
        features: (0..config.pilgrim_points)
            .map(|_| PointFeature::at(random_point_in_disk(rng, config.center, config.radius)))
            .collect(),
    };

    let drone_count = rng.random_range(8..=20);
    let drones = (1..=drone_count)
        .map(|n| generate_drone(rng, &sectors, n))
        .collect();

    let logistics = generate_logistics(rng);
    let services = generate_services(rng);

    let announcement_count = rng.random_range(3..=8);
    let announcements = (0..announcement_count)
        .map(|_| generate_announcement(rng, now))
        .collect();

    let choke_count = rng.random_range(2..=6);
    let choke_points = (1..=choke_count)
        .map(|n| generate_choke_point(rng, config, &sectors, n))
        .collect();

    let crowd_predictions = sectors
        .iter()
        .map(|sector| predict_sector(rng, config, sector))
        .collect();

    let low_stock_items = checkpoints
        .iter()
        .filter(|cp| cp.status == CheckpointStatus::LowStock)
        .count();

    Snapshot {
        total_crowd,
        alert_level,
        system_status: SYSTEM_STATUS.to_string(),
        active_sos: sos_alerts.len(),
        active_drones: rng.random_range(8..=25),
        avg_response_time: rng.random_range(45..=180),
        low_stock_items,
        sectors,
        checkpoints,
        sos_alerts,
        pilgrim_paths,
        drones,
        logistics,
        services,
        announcements,
        choke_points,
        crowd_predictions,
    }
}

/// Round to the two-decimal precision values are drawn with.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Uniform draw in `[min, max]` at 0.01 precision.
fn draw_hundredths<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    round2(rng.random_range(min..=max))
}

fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

fn draw_alert_level<R: Rng + ?Sized>(rng: &mut R, weights: &AlertWeights) -> AlertLevel {
    weights
        .table()
        .choose_weighted(rng, |(_, weight)| *weight)
        .map(|(level, _)| *level)
        .unwrap_or(AlertLevel::Low)
}

/// Recent local time formatted `HH:MM:SS`, up to `max_age_days` ago.
fn recent_time<R: Rng + ?Sized>(rng: &mut R, now: NaiveDateTime, max_age_days: f64) -> String {
    let max_age = (max_age_days * SECONDS_PER_DAY) as i64;
    let age = Duration::seconds(rng.random_range(0..=max_age));
    (now - age).format("%H:%M:%S").to_string()
}

fn generate_sectors<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SimulationConfig,
    peak: bool,
) -> Vec<Sector> {
    let base = if peak {
        PEAK_BASE_DENSITY
    } else {
        OFF_PEAK_BASE_DENSITY
    };

    SECTOR_TEMPLATES
        .iter()
        .map(|template| {
            let density = config
                .density
                .clamp(round2(base + draw_hundredths(rng, -0.2, 0.3)));
            let predicted = round2(density + draw_hundredths(rng, -0.05, 0.15))
                .clamp(density, config.predicted_density_ceiling);

            Sector {
                id: template.id.to_string(),
                name: template.name.to_string(),
                kind: template.kind,
                density,
                predicted_density: predicted,
                geometry: Polygon::from_ring(
                    template.ring.iter().map(|&(lon, lat)| LonLat(lon, lat)).collect(),
                ),
            }
        })
        .collect()
}

fn generate_checkpoint<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SimulationConfig,
    number: usize,
) -> Checkpoint {
    let kind = *pick(rng, &CHECKPOINT_TYPES);
    let tier = *pick(rng, &Tier::ALL);
    let inventory = Inventory {
        water_bottles: StockLevel {
            current: rng.random_range(10..=200),
            max: 200,
        },
        first_aid_kits: StockLevel {
            current: rng.random_range(5..=50),
            max: 50,
        },
        food_packets: StockLevel {
            current: rng.random_range(20..=500),
            max: 500,
        },
        blankets: StockLevel {
            current: rng.random_range(10..=100),
            max: 100,
        },
    };

    let label = pick(rng, &CHECKPOINT_LABELS);
    let status = if inventory.is_low_stock() {
        CheckpointStatus::LowStock
    } else if rng.random_bool(0.5) {
        CheckpointStatus::Operational
    } else {
        CheckpointStatus::Busy
    };
    let coordinates = random_point_in_disk(rng, config.center, config.radius);
    let t = u32::from(tier.value());

    Checkpoint {
        id: format!("CP-{number:03}"),
        name: format!("{label} {number:03}"),
        kind,
        tier,
        status,
        coordinates,
        personnel: rng.random_range(2 * t..=8 * t),
        inventory,
    }
}

fn generate_sos_alert<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SimulationConfig,
    now: NaiveDateTime,
) -> SosAlert {
    let tag: String = (0..8)
        .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase())
        .collect();

    SosAlert {
        pilgrim_id: format!("PIL-{tag}"),
        timestamp: recent_time(rng, now, 0.1),
        sector: rng.random_range(1..=5u8).to_string(),
        kind: *pick(rng, &SOS_TYPES),
        coordinates: random_point_in_disk(rng, config.center, config.radius),
    }
}

fn generate_drone<R: Rng + ?Sized>(rng: &mut R, sectors: &[Sector], number: usize) -> Drone {
    let status = *pick(rng, &DroneStatus::ALL);
    let battery = rng.random_range(15..=100);
    let sector = pick(rng, sectors).id.clone();
    let eta = match status {
        DroneStatus::Idle => 0,
        _ => rng.random_range(1..=18),
    };

    Drone {
        id: format!("DR-{number:02}"),
        status,
        battery,
        sector,
        task: status.task().to_string(),
        eta,
    }
}

fn generate_logistics<R: Rng + ?Sized>(rng: &mut R) -> Vec<LogisticsItem> {
    // (name, current range, max, unit, depletion range in minutes)
    let specs: [(&str, (u32, u32), u32, &str, (u32, u32)); 4] = [
        ("Water (Liters)", (5_000, 25_000), 30_000, "L", (30, 240)),
        ("First-Aid Kits", (200, 900), 1_000, "kits", (60, 360)),
        ("Food Packets", (5_000, 40_000), 50_000, "packs", (45, 300)),
        ("Blankets", (200, 2_500), 3_000, "units", (120, 720)),
    ];

    specs
        .iter()
        .map(|&(name, (lo, hi), max, unit, (eta_lo, eta_hi))| LogisticsItem {
            name: name.to_string(),
            current: rng.random_range(lo..=hi),
            max,
            unit: unit.to_string(),
            eta_depletion_minutes: rng.random_range(eta_lo..=eta_hi),
        })
        .collect()
}

fn generate_services<R: Rng + ?Sized>(rng: &mut R) -> Vec<ServiceHealth> {
    // (name, can degrade, latency range, max error rate)
    let specs: [(&str, bool, (u32, u32), f64); 5] = [
        ("API Gateway", false, (45, 110), 0.5),
        ("Auth Service", true, (55, 160), 0.8),
        ("Crowd ML Engine", true, (120, 400), 1.2),
        ("Notification Bus", false, (30, 95), 0.3),
        ("Geo DB", true, (8, 25), 0.2),
    ];

    specs
        .iter()
        .map(|&(name, can_degrade, (lo, hi), max_error)| {
            let status = if can_degrade && rng.random_bool(0.5) {
                ServiceStatus::Degraded
            } else {
                ServiceStatus::Healthy
            };
            ServiceHealth {
                name: name.to_string(),
                status,
                latency_ms: rng.random_range(lo..=hi),
                error_rate: draw_hundredths(rng, 0.0, max_error),
            }
        })
        .collect()
}

fn generate_announcement<R: Rng + ?Sized>(rng: &mut R, now: NaiveDateTime) -> Announcement {
    Announcement {
        id: random_uuid(rng),
        time: recent_time(rng, now, 0.2),
        channel: *pick(rng, &CHANNELS),
        message: pick(rng, &ANNOUNCEMENT_TEMPLATES).to_string(),
        approved_by_ai: true,
        approved_by_human: rng.random_bool(0.5),
    }
}

fn generate_choke_point<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SimulationConfig,
    sectors: &[Sector],
    number: usize,
) -> ChokePoint {
    ChokePoint {
        id: format!("CPK-{number}"),
        sector_id: pick(rng, sectors).id.clone(),
        risk_score: draw_hundredths(rng, 0.4, 0.95),
        coordinates: random_point_in_disk(rng, config.center, config.radius),
        eta_minutes: rng.random_range(5..=30),
    }
}

fn predict_sector<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SimulationConfig,
    sector: &Sector,
) -> CrowdPrediction {
    let now = sector.density;
    let plus15 = config
        .forecast
        .clamp(round2(now + draw_hundredths(rng, -0.1, 0.25)));
    let plus30 = config
        .forecast
        .clamp(round2(plus15 + draw_hundredths(rng, -0.1, 0.25)));

    CrowdPrediction {
        sector_id: sector.id.clone(),
        now,
        plus15,
        plus30,
        trend: Trend::from_delta(plus15 - now),
    }
}

/// A v4-layout uuid drawn from `rng`, so seeded runs reproduce identifiers.
pub fn random_uuid<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    uuid::Builder::from_random_bytes(rng.random()).into_uuid()
}
