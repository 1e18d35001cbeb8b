//! Drishti - A synthetic operational-state feed for a crowd-management dashboard.
//!
//! # Overview
//!
//! Drishti simulates the operational picture of a very large event: crowd
//! totals, sector densities, checkpoint stocks, SOS alerts, drones, logistics,
//! service health, announcements, choke points and short-term forecasts. A
//! timer regenerates the whole picture every few seconds and the dashboard
//! renders whatever the latest snapshot says.
//!
//! Snapshots are random but internally consistent: a handful of fields are
//! derived from others (low-stock status from inventory, drone eta from
//! status, forecast trend from the forecast). No snapshot depends on the one
//! before it.
//!
//! # Modules
//!
//! - [`model`]: Snapshot data types
//! - [`generator`]: Builds one snapshot from an RNG and a clock reading
//! - [`geo`]: Coordinates, disk sampling and GeoJSON shapes
//! - [`config`]: Simulation constants and environment configuration
//! - [`aggregation`]: KPI and analytics views of a snapshot
//! - [`advisory`]: Simulated AI advisories and their resolution
//! - [`selection`]: Map feature selection as a tagged variant
//! - [`feed`]: The shared current snapshot and its timers
//! - [`api`]: HTTP API handlers

pub mod advisory;
pub mod aggregation;
pub mod api;
pub mod config;
pub mod feed;
pub mod generator;
pub mod geo;
pub mod model;
pub mod selection;
