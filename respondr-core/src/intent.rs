//! Follow-up message classification.
//!
//! Decides whether a chat message asks for nearby services, which categories, how
//! urgently, and which canned information topics it touches.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cues::{KeywordRule, contains_keyword};
use crate::types::{FinalAssessment, ServiceType, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    #[default]
    General,
    LocationRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Normal,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecificRequest {
    PricingInfo,
    InsuranceGuidance,
    NextSteps,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryIntent {
    pub needs_location_search: bool,
    pub search_types: Vec<ServiceType>,
    pub intent: IntentKind,
    pub urgency: Urgency,
    pub specific_requests: Vec<SpecificRequest>,
}

impl QueryIntent {
    pub fn wants(&self, request: SpecificRequest) -> bool {
        self.specific_requests.contains(&request)
    }
}

pub const LOCATION_KEYWORDS: &[&str] = &[
    "where",
    "nearby",
    "close",
    "location",
    "address",
    "directions",
    "map",
];

pub const URGENT_KEYWORDS: &[&str] = &[
    "emergency",
    "urgent",
    "asap",
    "immediately",
    "help",
    "stuck",
];

/// Category order here is the order categories appear in `search_types`.
pub static SERVICE_RULES: &[KeywordRule<ServiceType>] = &[
    KeywordRule {
        keywords: &["tire", "tyre", "flat", "puncture", "wheel"],
        outcome: ServiceType::TireShop,
    },
    KeywordRule {
        keywords: &["tow", "wrecker", "roadside"],
        outcome: ServiceType::TowTruck,
    },
    KeywordRule {
        keywords: &["mechanic", "repair", "engine", "garage", "fix", "diagnos"],
        outcome: ServiceType::Mechanic,
    },
    KeywordRule {
        keywords: &[
            "body shop",
            "bodywork",
            "body work",
            "dented",
            "bumper",
            "paint",
            "collision center",
        ],
        outcome: ServiceType::AutoBodyShop,
    },
    KeywordRule {
        keywords: &["hospital", "doctor", "medical", "injur", "hurt", "clinic", "urgent care"],
        outcome: ServiceType::Hospital,
    },
    KeywordRule {
        keywords: &["police", "cop", "officer", "police report", "file a report"],
        outcome: ServiceType::Police,
    },
];

pub static SPECIFIC_REQUEST_RULES: &[KeywordRule<SpecificRequest>] = &[
    KeywordRule {
        keywords: &["cost", "price", "how much"],
        outcome: SpecificRequest::PricingInfo,
    },
    KeywordRule {
        keywords: &["insurance"],
        outcome: SpecificRequest::InsuranceGuidance,
    },
    KeywordRule {
        keywords: &["next step", "what now"],
        outcome: SpecificRequest::NextSteps,
    },
];

/// Categories to search when the message names none, based on the prior assessment.
pub fn infer_search_types(assessment: &FinalAssessment) -> Vec<ServiceType> {
    if assessment.has_tire_damage() {
        return vec![ServiceType::TireShop];
    }
    match assessment.severity {
        Severity::Severe => vec![ServiceType::Hospital, ServiceType::TowTruck],
        Severity::Major => vec![ServiceType::AutoBodyShop, ServiceType::TowTruck],
        Severity::Minor => vec![ServiceType::Mechanic],
    }
}

pub fn classify_intent(message: &str, prior: Option<&FinalAssessment>) -> QueryIntent {
    let lowered = message.to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| contains_keyword(&lowered, k));

    let mut intent = QueryIntent::default();

    if contains_any(LOCATION_KEYWORDS) {
        intent.needs_location_search = true;
        intent.intent = IntentKind::LocationRequest;
    }

    for rule in SERVICE_RULES {
        if rule.matches(&lowered) && !intent.search_types.contains(&rule.outcome) {
            intent.search_types.push(rule.outcome);
            intent.needs_location_search = true;
        }
    }

    if intent.search_types.is_empty() {
        if let Some(assessment) = prior {
            intent.search_types = infer_search_types(assessment);
        }
    }

    if contains_any(URGENT_KEYWORDS) {
        intent.urgency = Urgency::Urgent;
    }

    intent.specific_requests = SPECIFIC_REQUEST_RULES
        .iter()
        .filter(|rule| rule.matches(&lowered))
        .map(|rule| rule.outcome)
        .collect();

    debug!(
        needs_location_search = intent.needs_location_search,
        search_types = ?intent.search_types,
        urgency = ?intent.urgency,
        specific_requests = ?intent.specific_requests,
        "classified follow-up intent"
    );

    intent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::fuse;
    use crate::signals::{TextSignal, VideoSignal};
    use crate::types::{DamageTag, damage};

    fn assessment(severity: Severity, damages: &[&str]) -> FinalAssessment {
        let video = VideoSignal {
            severity,
            damages: damages.iter().map(|d| DamageTag::new(d)).collect(),
            ..VideoSignal::default()
        };
        fuse(&video, &TextSignal::default())
    }

    #[test]
    fn test_tow_emergency_without_prior() {
        let intent = classify_intent("where can I get towed, this is an emergency", None);
        assert!(intent.needs_location_search);
        assert_eq!(intent.intent, IntentKind::LocationRequest);
        assert_eq!(intent.search_types, vec![ServiceType::TowTruck]);
        assert_eq!(intent.urgency, Urgency::Urgent);
    }

    #[test]
    fn test_entire_is_not_a_tire_request() {
        let intent = classify_intent("can someone fix the entire door", None);
        assert_eq!(intent.search_types, vec![ServiceType::Mechanic]);

        let intent = classify_intent("both front tires are shredded", None);
        assert_eq!(intent.search_types, vec![ServiceType::TireShop]);
    }

    #[test]
    fn test_categories_follow_definition_order() {
        let intent = classify_intent("need a police report and then a tire change", None);
        assert_eq!(
            intent.search_types,
            vec![ServiceType::TireShop, ServiceType::Police]
        );
        assert!(intent.needs_location_search);
        assert_eq!(intent.intent, IntentKind::General);
    }

    #[test]
    fn test_inference_only_without_explicit_category() {
        let prior = assessment(Severity::Severe, &[]);
        let inferred = classify_intent("anything else?", Some(&prior));
        assert_eq!(
            inferred.search_types,
            vec![ServiceType::Hospital, ServiceType::TowTruck]
        );
        assert!(!inferred.needs_location_search);

        let explicit = classify_intent("find me a mechanic", Some(&prior));
        assert_eq!(explicit.search_types, vec![ServiceType::Mechanic]);
    }

    #[test]
    fn test_inference_table() {
        let tire = assessment(Severity::Major, &[damage::TIRE]);
        assert_eq!(infer_search_types(&tire), vec![ServiceType::TireShop]);

        let major = assessment(Severity::Major, &["side damage"]);
        assert_eq!(
            infer_search_types(&major),
            vec![ServiceType::AutoBodyShop, ServiceType::TowTruck]
        );

        let minor = assessment(Severity::Minor, &["scratches"]);
        assert_eq!(infer_search_types(&minor), vec![ServiceType::Mechanic]);
    }

    #[test]
    fn test_specific_requests_are_independent() {
        let intent = classify_intent(
            "How much will it cost and will insurance cover it? What now?",
            None,
        );
        assert!(intent.wants(SpecificRequest::PricingInfo));
        assert!(intent.wants(SpecificRequest::InsuranceGuidance));
        assert!(intent.wants(SpecificRequest::NextSteps));
        assert_eq!(intent.urgency, Urgency::Normal);
    }

    #[test]
    fn test_empty_message() {
        let intent = classify_intent("", None);
        assert!(intent.search_types.is_empty());
        assert!(!intent.needs_location_search);
        assert!(intent.specific_requests.is_empty());
    }
}
