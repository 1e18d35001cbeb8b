//! The map feature an operator has selected.
//!
//! A selection is one of four unrelated record shapes, carried as an explicit
//! tagged variant and resolved against a snapshot by kind and id.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::model::{Checkpoint, ChokePoint, Sector, Snapshot, SosAlert};

/// The kinds of feature that can be selected on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureKind {
    Checkpoint,
    Sector,
    SosAlert,
    ChokePoint,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::Checkpoint => "checkpoint",
            FeatureKind::Sector => "sector",
            FeatureKind::SosAlert => "sos-alert",
            FeatureKind::ChokePoint => "choke-point",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown feature kind {0:?}")]
pub struct UnknownFeatureKind(pub String);

impl FromStr for FeatureKind {
    type Err = UnknownFeatureKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkpoint" => Ok(FeatureKind::Checkpoint),
            "sector" => Ok(FeatureKind::Sector),
            "sos-alert" | "sos" => Ok(FeatureKind::SosAlert),
            "choke-point" | "chokepoint" => Ok(FeatureKind::ChokePoint),
            other => Err(UnknownFeatureKind(other.to_string())),
        }
    }
}

/// A selected feature with its full record.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "feature", rename_all = "kebab-case")]
pub enum SelectedFeature {
    Checkpoint(Checkpoint),
    Sector(Sector),
    SosAlert(SosAlert),
    ChokePoint(ChokePoint),
}

impl SelectedFeature {
    pub fn kind(&self) -> FeatureKind {
        match self {
            SelectedFeature::Checkpoint(_) => FeatureKind::Checkpoint,
            SelectedFeature::Sector(_) => FeatureKind::Sector,
            SelectedFeature::SosAlert(_) => FeatureKind::SosAlert,
            SelectedFeature::ChokePoint(_) => FeatureKind::ChokePoint,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SelectedFeature::Checkpoint(cp) => &cp.id,
            SelectedFeature::Sector(s) => &s.id,
            SelectedFeature::SosAlert(a) => &a.pilgrim_id,
            SelectedFeature::ChokePoint(c) => &c.id,
        }
    }
}

impl Snapshot {
    /// Resolve a selection. SOS alerts are keyed by pilgrim id.
    pub fn select(&self, kind: FeatureKind, id: &str) -> Option<SelectedFeature> {
        match kind {
            FeatureKind::Checkpoint => self
                .checkpoints
                .iter()
                .find(|cp| cp.id == id)
                .cloned()
                .map(SelectedFeature::Checkpoint),
            FeatureKind::Sector => self.sector(id).cloned().map(SelectedFeature::Sector),
            FeatureKind::SosAlert => self
                .sos_alerts
                .iter()
                .find(|a| a.pilgrim_id == id)
                .cloned()
                .map(SelectedFeature::SosAlert),
            FeatureKind::ChokePoint => self
                .choke_points
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .map(SelectedFeature::ChokePoint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::generator::generate_snapshot;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample_snapshot() -> Snapshot {
        let mut rng = StdRng::seed_from_u64(41);
        let now = NaiveDate::from_ymd_opt(2028, 4, 9)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        generate_snapshot(&mut rng, &SimulationConfig::default(), now)
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!("checkpoint".parse::<FeatureKind>(), Ok(FeatureKind::Checkpoint));
        assert_eq!("sos".parse::<FeatureKind>(), Ok(FeatureKind::SosAlert));
        assert_eq!("choke-point".parse::<FeatureKind>(), Ok(FeatureKind::ChokePoint));
        assert_eq!(
            "drone".parse::<FeatureKind>(),
            Err(UnknownFeatureKind("drone".to_string()))
        );
        for kind in [
            FeatureKind::Checkpoint,
            FeatureKind::Sector,
            FeatureKind::SosAlert,
            FeatureKind::ChokePoint,
        ] {
            assert_eq!(kind.as_str().parse::<FeatureKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_select_each_kind() {
        let snap = sample_snapshot();

        let cp = snap.select(FeatureKind::Checkpoint, "CP-007").unwrap();
        assert_eq!(cp.kind(), FeatureKind::Checkpoint);
        assert_eq!(cp.id(), "CP-007");

        let sector = snap.select(FeatureKind::Sector, "S3").unwrap();
        assert!(matches!(&sector, SelectedFeature::Sector(s) if s.name == "Central Hub"));

        let pilgrim = snap.sos_alerts[0].pilgrim_id.clone();
        let sos = snap.select(FeatureKind::SosAlert, &pilgrim).unwrap();
        assert_eq!(sos.id(), pilgrim);

        let choke = snap.select(FeatureKind::ChokePoint, "CPK-1").unwrap();
        assert_eq!(choke.kind(), FeatureKind::ChokePoint);
    }

    #[test]
    fn test_select_missing() {
        let snap = sample_snapshot();
        assert!(snap.select(FeatureKind::Checkpoint, "CP-999").is_none());
        assert!(snap.select(FeatureKind::Sector, "S9").is_none());
    }

    #[test]
    fn test_tagged_serialization() {
        let snap = sample_snapshot();
        let selected = snap.select(FeatureKind::Checkpoint, "CP-001").unwrap();
        let value = serde_json::to_value(&selected).unwrap();

        assert_eq!(value["kind"], "checkpoint");
        assert_eq!(value["feature"]["id"], "CP-001");
        assert!(value["feature"].get("inventory").is_some());
    }
}
