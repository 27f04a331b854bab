//! Entity catalog
//!
//! Read-only source of float metadata and profile series. The catalog is an
//! external collaborator of the playback core: the engine only ever refers
//! to floats by identifier. `MockCatalog` serves the bundled demo dataset
//! with simulated latency.

use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ocean_common::config::CatalogSettings;
use ocean_common::time::millis_to_duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Mean Earth radius used for great-circle distances
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Operational status of a float
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloatStatus {
    Active,
    Inactive,
}

/// One reported position of a float
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub lat: f64,
    pub lon: f64,
    pub time: DateTime<Utc>,
}

/// A simulated ARGO float
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Float {
    pub id: String,
    pub name: String,
    /// Last-known latitude
    pub lat: f64,
    /// Last-known longitude
    pub lon: f64,
    pub alt: f64,
    pub status: FloatStatus,
    pub last_seen: DateTime<Utc>,
    pub profile_count: u32,
    /// Measured parameters (temperature, salinity, oxygen, ...)
    pub params: Vec<String>,
    pub trajectory: Vec<TrajectoryPoint>,
}

/// Position of a profile cast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

/// One depth level of a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileLevel {
    /// Depth in metres
    pub depth: f64,
    /// Temperature in °C
    pub temperature: f64,
    /// Practical salinity (PSU)
    pub salinity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMeta {
    pub source: String,
    pub platform_type: String,
    pub mesh_quality: String,
}

/// Depth-indexed measurements for one float at one time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSeries {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub location: Location,
    #[serde(rename = "profile")]
    pub levels: Vec<ProfileLevel>,
    pub meta: ProfileMeta,
}

/// Geographic bounding box in degrees
///
/// `west > east` denotes a box crossing the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        if lat < self.south || lat > self.north {
            return false;
        }
        if self.west <= self.east {
            lon >= self.west && lon <= self.east
        } else {
            lon >= self.west || lon <= self.east
        }
    }
}

/// Spatial, temporal and parameter filter for catalog listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityFilter {
    pub bbox: Option<BoundingBox>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Every listed parameter must be measured by the float
    #[serde(default)]
    pub params: Vec<String>,
}

impl EntityFilter {
    pub fn is_empty(&self) -> bool {
        self.bbox.is_none() && self.start.is_none() && self.end.is_none() && self.params.is_empty()
    }

    /// Whether a float satisfies every constraint of this filter
    pub fn matches(&self, float: &Float) -> bool {
        if let Some(bbox) = &self.bbox {
            if !bbox.contains(float.lat, float.lon) {
                return false;
            }
        }

        if self.start.is_some() || self.end.is_some() {
            let in_window = |t: &DateTime<Utc>| {
                self.start.map_or(true, |s| *t >= s) && self.end.map_or(true, |e| *t <= e)
            };
            let seen_in_window = in_window(&float.last_seen)
                || float.trajectory.iter().any(|p| in_window(&p.time));
            if !seen_in_window {
                return false;
            }
        }

        self.params.iter().all(|wanted| {
            float
                .params
                .iter()
                .any(|have| have.eq_ignore_ascii_case(wanted))
        })
    }
}

/// Result of a catalog listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityList {
    pub count: usize,
    pub entities: Vec<Float>,
}

/// Read-only access to floats and their profiles
#[async_trait]
pub trait EntityCatalog: Send + Sync {
    /// List floats, optionally restricted by a filter
    async fn list_entities(&self, filter: Option<&EntityFilter>) -> Result<EntityList>;

    /// Latest profile of one float; `EntityNotFound` for unknown ids
    async fn get_profile(&self, id: &str) -> Result<ProfileSeries>;

    /// Up to `n` floats ordered by great-circle distance from a point
    async fn nearest(&self, lat: f64, lon: f64, n: usize) -> Result<Vec<Float>>;

    /// Whether `id` names a known float (no simulated latency)
    fn contains(&self, id: &str) -> bool;
}

/// Simulated per-operation latency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogLatency {
    pub list: Duration,
    pub profile: Duration,
    pub nearest: Duration,
}

impl CatalogLatency {
    /// No simulated delay (tests)
    pub fn none() -> Self {
        Self::default()
    }
}

impl From<&CatalogSettings> for CatalogLatency {
    fn from(settings: &CatalogSettings) -> Self {
        Self {
            list: millis_to_duration(settings.list_latency_ms),
            profile: millis_to_duration(settings.profile_latency_ms),
            nearest: millis_to_duration(settings.nearest_latency_ms),
        }
    }
}

/// In-memory catalog serving the bundled demo floats
pub struct MockCatalog {
    floats: Vec<Float>,
    profiles: HashMap<String, ProfileSeries>,
    latency: CatalogLatency,
}

impl MockCatalog {
    /// Catalog over the bundled demo dataset
    pub fn demo(latency: CatalogLatency) -> Self {
        let profiles = demo_profiles()
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        Self {
            floats: demo_floats(),
            profiles,
            latency,
        }
    }

    /// Catalog over caller-supplied data
    pub fn new(floats: Vec<Float>, profiles: Vec<ProfileSeries>, latency: CatalogLatency) -> Self {
        Self {
            floats,
            profiles: profiles.into_iter().map(|p| (p.id.clone(), p)).collect(),
            latency,
        }
    }

    /// Synchronous snapshot of the floats, used by the responder
    pub fn floats(&self) -> &[Float] {
        &self.floats
    }

    fn filtered(&self, filter: Option<&EntityFilter>) -> Vec<Float> {
        self.floats
            .iter()
            .filter(|f| filter.map_or(true, |flt| flt.matches(f)))
            .cloned()
            .collect()
    }
}

async fn simulate_latency(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl EntityCatalog for MockCatalog {
    fn contains(&self, id: &str) -> bool {
        self.floats.iter().any(|f| f.id == id)
    }

    async fn list_entities(&self, filter: Option<&EntityFilter>) -> Result<EntityList> {
        simulate_latency(self.latency.list).await;
        let entities = self.filtered(filter);
        debug!("Catalog listing matched {} floats", entities.len());
        Ok(EntityList {
            count: entities.len(),
            entities,
        })
    }

    async fn get_profile(&self, id: &str) -> Result<ProfileSeries> {
        simulate_latency(self.latency.profile).await;
        self.profiles
            .get(id)
            .cloned()
            .ok_or_else(|| Error::EntityNotFound(id.to_string()))
    }

    async fn nearest(&self, lat: f64, lon: f64, n: usize) -> Result<Vec<Float>> {
        simulate_latency(self.latency.nearest).await;
        let mut by_distance: Vec<(f64, &Float)> = self
            .floats
            .iter()
            .map(|f| (haversine_km(lat, lon, f.lat, f.lon), f))
            .collect();
        by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(by_distance
            .into_iter()
            .take(n)
            .map(|(_, f)| f.clone())
            .collect())
    }
}

/// Great-circle distance between two points in kilometres
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

fn point(lat: f64, lon: f64, time: DateTime<Utc>) -> TrajectoryPoint {
    TrajectoryPoint { lat, lon, time }
}

fn params(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Bundled demo floats
pub fn demo_floats() -> Vec<Float> {
    vec![
        Float {
            id: "R12345".to_string(),
            name: "ARGO Float R12345".to_string(),
            lat: 0.3245,
            lon: 34.2351,
            alt: -2.0,
            status: FloatStatus::Active,
            last_seen: utc(2023, 3, 12, 5, 23),
            profile_count: 58,
            params: params(&["temperature", "salinity", "oxygen"]),
            trajectory: vec![
                point(0.1, 34.0, utc(2023, 1, 1, 0, 0)),
                point(0.2, 34.1, utc(2023, 2, 1, 0, 0)),
                point(0.3245, 34.2351, utc(2023, 3, 12, 5, 23)),
            ],
        },
        Float {
            id: "R67890".to_string(),
            name: "ARGO Float R67890".to_string(),
            lat: -0.0021,
            lon: 36.1212,
            alt: -1.5,
            status: FloatStatus::Active,
            last_seen: utc(2023, 3, 20, 10, 11),
            profile_count: 64,
            params: params(&["temperature", "salinity"]),
            trajectory: vec![
                point(-0.5, 35.8, utc(2023, 1, 10, 0, 0)),
                point(-0.2, 36.0, utc(2023, 2, 15, 0, 0)),
                point(-0.0021, 36.1212, utc(2023, 3, 20, 10, 11)),
            ],
        },
        Float {
            id: "R11223".to_string(),
            name: "ARGO Float R11223".to_string(),
            lat: -15.5432,
            lon: 45.7891,
            alt: -3.2,
            status: FloatStatus::Inactive,
            last_seen: utc(2023, 2, 28, 14, 30),
            profile_count: 12,
            params: params(&["temperature", "salinity"]),
            trajectory: vec![point(-15.5432, 45.7891, utc(2023, 2, 28, 14, 30))],
        },
    ]
}

fn levels(rows: &[(f64, f64, f64)]) -> Vec<ProfileLevel> {
    rows.iter()
        .map(|&(depth, temperature, salinity)| ProfileLevel {
            depth,
            temperature,
            salinity,
        })
        .collect()
}

fn argo_meta() -> ProfileMeta {
    ProfileMeta {
        source: "Argo".to_string(),
        platform_type: "float".to_string(),
        mesh_quality: "good".to_string(),
    }
}

/// Bundled demo profiles (R11223 has none)
pub fn demo_profiles() -> Vec<ProfileSeries> {
    vec![
        ProfileSeries {
            id: "R12345".to_string(),
            timestamp: utc(2023, 3, 12, 5, 23),
            location: Location {
                lat: 0.3245,
                lon: 34.2351,
                alt: -2.0,
            },
            levels: levels(&[
                (0.0, 29.2, 35.0),
                (10.0, 28.8, 35.1),
                (20.0, 27.5, 35.2),
                (50.0, 24.1, 35.4),
                (100.0, 16.9, 35.6),
                (200.0, 12.8, 35.7),
            ]),
            meta: argo_meta(),
        },
        ProfileSeries {
            id: "R67890".to_string(),
            timestamp: utc(2023, 3, 20, 10, 11),
            location: Location {
                lat: -0.0021,
                lon: 36.1212,
                alt: -1.5,
            },
            levels: levels(&[
                (0.0, 28.8, 35.1),
                (10.0, 28.5, 35.2),
                (20.0, 27.2, 35.3),
                (50.0, 23.8, 35.5),
                (100.0, 16.5, 35.7),
                (200.0, 12.3, 35.8),
            ]),
            meta: argo_meta(),
        },
    ]
}
