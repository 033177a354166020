use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::ServiceType;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// One directory entry returned by a catalog lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateService {
    pub id: String,
    pub name: String,
    /// Miles from the caller.
    pub distance: f64,
    pub rating: f32,
    pub coordinates: Coordinates,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub phone: String,
    pub address: String,
    pub hours: String,
    #[serde(default)]
    pub services: Vec<String>,
    pub price_range: String,
    pub wait_time: String,
}

impl CandidateService {
    /// Two entries with the same key are the same business.
    pub fn dedup_key(&self) -> (String, String) {
        (self.name.to_lowercase(), self.address.to_lowercase())
    }
}

/// Read-only directory of nearby services.
pub trait ServiceCatalog: Send + Sync {
    /// Candidates of `service_type` near `location`, best first.
    fn lookup(&self, service_type: ServiceType, location: &str) -> Vec<CandidateService>;
}

impl<F> ServiceCatalog for F
where
    F: Fn(ServiceType, &str) -> Vec<CandidateService> + Send + Sync,
{
    fn lookup(&self, service_type: ServiceType, location: &str) -> Vec<CandidateService> {
        self(service_type, location)
    }
}

/// In-memory implementation of ServiceCatalog
///
/// The location hint is ignored; entries are ranked by distance, then rating.
#[derive(Debug)]
pub struct InMemoryCatalog {
    entries: DashMap<ServiceType, Vec<CandidateService>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn from_services(services: impl IntoIterator<Item = CandidateService>) -> Self {
        let catalog = Self::new();
        for service in services {
            catalog.insert(service);
        }
        catalog
    }

    /// Loads a JSON array of services.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let services: Vec<CandidateService> = serde_json::from_str(json)?;
        Ok(Self::from_services(services))
    }

    pub fn insert(&self, service: CandidateService) {
        let mut bucket = self.entries.entry(service.service_type).or_default();
        bucket.push(service);
        bucket.sort_by(rank);
    }

    pub fn len(&self) -> usize {
        self.entries.iter().map(|bucket| bucket.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceCatalog for InMemoryCatalog {
    fn lookup(&self, service_type: ServiceType, _location: &str) -> Vec<CandidateService> {
        self.entries
            .get(&service_type)
            .map(|bucket| bucket.clone())
            .unwrap_or_default()
    }
}

fn rank(a: &CandidateService, b: &CandidateService) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| b.rating.total_cmp(&a.rating))
}
