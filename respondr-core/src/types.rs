use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse incident-impact classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Minor,
    Major,
    Severe,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Severe => "severe",
        }
    }

    /// Parses analyzer output leniently. Unknown words yield `None`.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "minor" | "low" | "light" => Some(Severity::Minor),
            "major" | "moderate" | "medium" | "serious" => Some(Severity::Major),
            "severe" | "critical" | "fatal" | "high" => Some(Severity::Severe),
            _ => None,
        }
    }

    /// Fixed severity to priority table.
    pub fn priority(&self) -> Priority {
        match self {
            Severity::Severe => Priority::Emergency,
            Severity::Major => Priority::High,
            Severity::Minor => Priority::Medium,
        }
    }

    pub fn is_at_least_major(&self) -> bool {
        matches!(self, Severity::Major | Severity::Severe)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Emergency,
}

/// Labels of the damage vocabulary produced by the text cue tables.
pub mod damage {
    pub const TIRE: &str = "tire damage";
    pub const ENGINE: &str = "engine damage";
    pub const BODY: &str = "body damage";
    pub const GLASS: &str = "glass damage";
    pub const FLUID_LEAK: &str = "fluid leak";
}

/// Normalized damage-category label, e.g. "front collision" or "tire damage".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DamageTag(String);

impl DamageTag {
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(label.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DamageTag {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for DamageTag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<DamageTag> for String {
    fn from(value: DamageTag) -> Self {
        value.0
    }
}

impl fmt::Display for DamageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of damage tags. Keeps first-seen order so narratives are stable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<DamageTag>", into = "Vec<DamageTag>")]
pub struct DamageSet(Vec<DamageTag>);

impl DamageSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns `true` if the tag was not already present.
    pub fn insert(&mut self, tag: DamageTag) -> bool {
        if tag.as_str().is_empty() || self.0.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    pub fn contains(&self, tag: &DamageTag) -> bool {
        self.0.contains(tag)
    }

    /// True if any tag contains `needle` as a substring.
    pub fn mentions(&self, needle: &str) -> bool {
        self.0.iter().any(|tag| tag.as_str().contains(needle))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DamageTag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(DamageTag::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<Vec<DamageTag>> for DamageSet {
    fn from(tags: Vec<DamageTag>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<DamageSet> for Vec<DamageTag> {
    fn from(set: DamageSet) -> Self {
        set.0
    }
}

impl FromIterator<DamageTag> for DamageSet {
    fn from_iter<I: IntoIterator<Item = DamageTag>>(iter: I) -> Self {
        let mut set = DamageSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<DamageTag> for DamageSet {
    fn extend<I: IntoIterator<Item = DamageTag>>(&mut self, iter: I) {
        for tag in iter {
            self.insert(tag);
        }
    }
}

/// Category of nearby business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    TireShop,
    TowTruck,
    Mechanic,
    AutoBodyShop,
    Hospital,
    Police,
}

impl ServiceType {
    pub const ALL: [ServiceType; 6] = [
        ServiceType::TireShop,
        ServiceType::TowTruck,
        ServiceType::Mechanic,
        ServiceType::AutoBodyShop,
        ServiceType::Hospital,
        ServiceType::Police,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ServiceType::TireShop => "tire_shop",
            ServiceType::TowTruck => "tow_truck",
            ServiceType::Mechanic => "mechanic",
            ServiceType::AutoBodyShop => "auto_body_shop",
            ServiceType::Hospital => "hospital",
            ServiceType::Police => "police",
        }
    }

    /// Human readable plural used in narratives.
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceType::TireShop => "tire shops",
            ServiceType::TowTruck => "tow truck services",
            ServiceType::Mechanic => "mechanics",
            ServiceType::AutoBodyShop => "auto body shops",
            ServiceType::Hospital => "hospitals",
            ServiceType::Police => "police stations",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How soon a recommended service should be contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    Immediate,
    Urgent,
    Soon,
    Routine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecommendation {
    pub service_type: ServiceType,
    pub reason: String,
    pub priority: RecommendationPriority,
}

/// Fused outcome of the video and text signals for one incident report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAssessment {
    pub severity: Severity,
    pub cars_involved: u32,
    pub damages: DamageSet,
    pub priority: Priority,
    pub text_override_applied: bool,
    pub overview_summary: String,
    pub detailed_explanation: String,
    pub immediate_actions: Vec<String>,
    pub general_advice: Vec<String>,
    pub location_recommendations: Vec<LocationRecommendation>,
    pub comprehensive_tips: Vec<String>,
}

impl FinalAssessment {
    pub fn has_tire_damage(&self) -> bool {
        self.damages.mentions("tire")
    }
}
