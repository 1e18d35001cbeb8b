//! Aggregate views derived from a single snapshot.
//!
//! These are the numbers the KPI ribbon and the analytics panels show. They
//! read a snapshot and never modify it. Only the analytics time series draw
//! fresh random noise; everything else is a pure function of the snapshot.

use rand::Rng;
use serde::Serialize;

use crate::model::{ChokePoint, DroneStatus, Snapshot, Trend};

/// Crush-risk index above which the ribbon warns.
const CRUSH_RISK_WARN_PCT: u32 = 65;

/// Supply sufficiency below which the ribbon warns.
const SUPPLY_WARN_PCT: u32 = 55;

/// Drone coverage below which the ribbon warns.
const DRONE_COVERAGE_WARN_PCT: u32 = 45;

/// More rising sectors than this triggers a warning.
const RISING_SECTORS_WARN: usize = 2;

/// A sector only counts as rising when its 15 minute forecast exceeds this.
const RISING_DENSITY_FLOOR: f64 = 0.7;

/// Response time above which the SLA warns, in seconds.
const RESPONSE_SLA_WARN_SECS: u32 = 150;

/// Number of points in each analytics time series.
const SERIES_LEN: u32 = 12;

/// First hour label of the analytics time series.
const SERIES_START_HOUR: u32 = 6;

/// Headline figures for the KPI ribbon.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    /// Alert level, upper-cased.
    pub threat_level: String,

    /// Mean choke-point risk as a percentage.
    pub crush_risk_index: u32,

    /// Logistics stock on hand as a percentage of capacity.
    pub supply_sufficiency: u32,

    /// Share of drones that are not idle, as a percentage.
    pub drone_coverage: u32,

    /// Sectors forecast to rise past 70% density within 15 minutes.
    pub rising_sectors: usize,

    pub response_sla_seconds: u32,

    pub warnings: KpiWarnings,
}

/// Which KPI figures are outside their comfortable range.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct KpiWarnings {
    pub crush_risk: bool,
    pub supply: bool,
    pub drone_coverage: bool,
    pub rising_sectors: bool,
    pub response_sla: bool,
}

impl KpiWarnings {
    pub fn any(&self) -> bool {
        self.crush_risk
            || self.supply
            || self.drone_coverage
            || self.rising_sectors
            || self.response_sla
    }
}

/// Rounded percentage of `part / whole`, treating an empty whole as 1.
fn percent(part: f64, whole: f64) -> u32 {
    (100.0 * part / whole.max(1.0)).round() as u32
}

/// Compute the KPI ribbon for a snapshot.
pub fn compute_kpis(snapshot: &Snapshot) -> KpiSummary {
    let risk_total: f64 = snapshot.choke_points.iter().map(|c| c.risk_score).sum();
    let crush_risk_index = percent(risk_total, snapshot.choke_points.len() as f64);

    let stock_current: f64 = snapshot
        .logistics
        .iter()
        .map(|l| f64::from(l.current))
        .sum();
    let stock_max: f64 = snapshot.logistics.iter().map(|l| f64::from(l.max)).sum();
    let supply_sufficiency = percent(stock_current, stock_max);

    let engaged = snapshot
        .drones
        .iter()
        .filter(|d| d.status != DroneStatus::Idle)
        .count();
    let drone_coverage = percent(engaged as f64, snapshot.drones.len() as f64);

    let rising_sectors = snapshot
        .crowd_predictions
        .iter()
        .filter(|p| p.trend == Trend::Rising && p.plus15 > RISING_DENSITY_FLOOR)
        .count();

    let response_sla_seconds = snapshot.avg_response_time;

    KpiSummary {
        threat_level: snapshot.alert_level.label().to_string(),
        crush_risk_index,
        supply_sufficiency,
        drone_coverage,
        rising_sectors,
        response_sla_seconds,
        warnings: KpiWarnings {
            crush_risk: crush_risk_index > CRUSH_RISK_WARN_PCT,
            supply: supply_sufficiency < SUPPLY_WARN_PCT,
            drone_coverage: drone_coverage < DRONE_COVERAGE_WARN_PCT,
            rising_sectors: rising_sectors > RISING_SECTORS_WARN,
            response_sla: response_sla_seconds > RESPONSE_SLA_WARN_SECS,
        },
    }
}

/// Choke points ordered from highest to lowest risk.
pub fn choke_points_by_risk(snapshot: &Snapshot) -> Vec<ChokePoint> {
    let mut sorted = snapshot.choke_points.clone();
    sorted.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
    sorted
}

/// A logistics item with its fill level.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogisticsLevel {
    pub name: String,
    pub current: u32,
    pub max: u32,
    pub unit: String,
    pub fill_pct: f64,
    pub eta_depletion_minutes: u32,
}

pub fn logistics_levels(snapshot: &Snapshot) -> Vec<LogisticsLevel> {
    snapshot
        .logistics
        .iter()
        .map(|item| LogisticsLevel {
            name: item.name.clone(),
            current: item.current,
            max: item.max,
            unit: item.unit.clone(),
            fill_pct: item.fill_pct(),
            eta_depletion_minutes: item.eta_depletion_minutes,
        })
        .collect()
}

/// One row of the per-sector density forecast table.
#[derive(Debug, Clone, Serialize)]
pub struct DensityRow {
    pub sector: String,
    pub now: f64,
    pub plus15: f64,
    pub plus30: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrowdPoint {
    /// `HH:00` label.
    pub t: String,
    pub crowd: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponsePoint {
    pub t: String,
    pub rt: u32,
}

/// Data behind the analytics view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub density: Vec<DensityRow>,
    pub hourly_crowd: Vec<CrowdPoint>,
    pub response_times: Vec<ResponsePoint>,
}

/// Build the analytics series for a snapshot.
///
/// The hourly series are illustrative: they scale the snapshot's figures by a
/// daily wave plus noise and carry no history.
pub fn build_analytics<R: Rng + ?Sized>(rng: &mut R, snapshot: &Snapshot) -> AnalyticsReport {
    let density = snapshot
        .crowd_predictions
        .iter()
        .map(|p| DensityRow {
            sector: p.sector_id.clone(),
            now: p.now,
            plus15: p.plus15,
            plus30: p.plus30,
            trend: p.trend,
        })
        .collect();

    let total = snapshot.total_crowd as f64;
    let hourly_crowd = (0..SERIES_LEN)
        .map(|i| {
            let wave = 0.6 + (f64::from(i) / 3.0).sin() * 0.15 + rng.random::<f64>() * 0.1;
            CrowdPoint {
                t: hour_label(i),
                crowd: (total * wave).round() as u64,
            }
        })
        .collect();

    let avg = f64::from(snapshot.avg_response_time);
    let response_times = (0..SERIES_LEN)
        .map(|i| ResponsePoint {
            t: hour_label(i),
            rt: (avg * (0.8 + rng.random::<f64>() * 0.6)).round() as u32,
        })
        .collect();

    AnalyticsReport {
        density,
        hourly_crowd,
        response_times,
    }
}

fn hour_label(index: u32) -> String {
    format!("{:02}:00", index + SERIES_START_HOUR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::generator::generate_snapshot;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample_snapshot(seed: u64) -> Snapshot {
        let mut rng = StdRng::seed_from_u64(seed);
        let now = NaiveDate::from_ymd_opt(2028, 4, 9)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        generate_snapshot(&mut rng, &SimulationConfig::default(), now)
    }

    #[test]
    fn test_kpis_match_snapshot() {
        let snapshot = sample_snapshot(21);
        let kpis = compute_kpis(&snapshot);

        assert_eq!(kpis.threat_level, snapshot.alert_level.label());
        assert_eq!(kpis.response_sla_seconds, snapshot.avg_response_time);
        // Choke-point risk is drawn from [0.4, 0.95].
        assert!((40..=95).contains(&kpis.crush_risk_index));
        assert!(kpis.supply_sufficiency <= 100);
        assert!(kpis.drone_coverage <= 100);
        assert!(kpis.rising_sectors <= snapshot.sectors.len());
        assert_eq!(kpis.warnings.response_sla, kpis.response_sla_seconds > 150);
    }

    #[test]
    fn test_kpis_handle_empty_collections() {
        let mut snapshot = sample_snapshot(22);
        snapshot.choke_points.clear();
        snapshot.logistics.clear();
        snapshot.drones.clear();
        snapshot.crowd_predictions.clear();

        let kpis = compute_kpis(&snapshot);

        assert_eq!(kpis.crush_risk_index, 0);
        assert_eq!(kpis.supply_sufficiency, 0);
        assert_eq!(kpis.drone_coverage, 0);
        assert_eq!(kpis.rising_sectors, 0);
        assert!(kpis.warnings.supply);
        assert!(kpis.warnings.drone_coverage);
        assert!(kpis.warnings.any());
    }

    #[test]
    fn test_drone_coverage_counts_non_idle() {
        let mut snapshot = sample_snapshot(23);
        for (i, drone) in snapshot.drones.iter_mut().enumerate() {
            drone.status = if i % 2 == 0 {
                DroneStatus::Idle
            } else {
                DroneStatus::Scanning
            };
        }
        let engaged = snapshot.drones.len() / 2;
        let expected = (100.0 * engaged as f64 / snapshot.drones.len() as f64).round() as u32;

        assert_eq!(compute_kpis(&snapshot).drone_coverage, expected);
    }

    #[test]
    fn test_choke_points_sorted_by_risk() {
        let snapshot = sample_snapshot(24);
        let sorted = choke_points_by_risk(&snapshot);

        assert_eq!(sorted.len(), snapshot.choke_points.len());
        assert!(sorted.windows(2).all(|w| w[0].risk_score >= w[1].risk_score));
    }

    #[test]
    fn test_logistics_levels() {
        let snapshot = sample_snapshot(25);
        let levels = logistics_levels(&snapshot);

        assert_eq!(levels.len(), 4);
        for level in levels {
            assert!(level.fill_pct > 0.0 && level.fill_pct <= 100.0);
        }
    }

    #[test]
    fn test_analytics_series() {
        let snapshot = sample_snapshot(26);
        let mut rng = StdRng::seed_from_u64(1);
        let report = build_analytics(&mut rng, &snapshot);

        assert_eq!(report.density.len(), snapshot.sectors.len());
        assert_eq!(report.hourly_crowd.len(), 12);
        assert_eq!(report.response_times.len(), 12);
        assert_eq!(report.hourly_crowd[0].t, "06:00");
        assert_eq!(report.hourly_crowd[11].t, "17:00");

        let total = snapshot.total_crowd as f64;
        for point in &report.hourly_crowd {
            let ratio = point.crowd as f64 / total;
            assert!((0.44..=0.86).contains(&ratio), "ratio {ratio}");
        }
        let avg = f64::from(snapshot.avg_response_time);
        for point in &report.response_times {
            let ratio = f64::from(point.rt) / avg;
            assert!((0.79..=1.41).contains(&ratio), "ratio {ratio}");
        }
    }

    #[test]
    fn test_views_serialize_camel_case() {
        let snapshot = sample_snapshot(9);

        let kpis = serde_json::to_value(compute_kpis(&snapshot)).unwrap();
        assert!(kpis["threatLevel"].is_string());
        assert!(kpis["crushRiskIndex"].is_u64());
        assert!(kpis["warnings"]["responseSla"].is_boolean());

        let levels = serde_json::to_value(logistics_levels(&snapshot)).unwrap();
        assert!(levels[0]["fillPct"].is_f64());
        assert!(levels[0]["etaDepletionMinutes"].is_u64());

        let mut rng = StdRng::seed_from_u64(9);
        let report = serde_json::to_value(build_analytics(&mut rng, &snapshot)).unwrap();
        assert_eq!(report["hourlyCrowd"].as_array().unwrap().len(), 12);
        assert_eq!(report["responseTimes"].as_array().unwrap().len(), 12);
    }
}
