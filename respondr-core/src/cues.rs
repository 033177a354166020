//! Lexical cue matching over the user's note.
//!
//! Rules are ordered tables. Severity and vehicle-count tables are
//! first-match-wins in table order; damage rules are independent and each
//! contributes at most one tag. Keywords only match at the start of a word, so
//! "tire" does not fire inside "entire".

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{DamageSet, DamageTag, Severity, damage};

/// A set of substrings that, if any occurs, yields `outcome`.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule<T> {
    pub keywords: &'static [&'static str],
    pub outcome: T,
}

impl<T: Copy> KeywordRule<T> {
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| contains_keyword(lowered, keyword))
    }
}

/// True if `keyword` occurs in `lowered` starting at a word boundary.
pub fn contains_keyword(lowered: &str, keyword: &str) -> bool {
    lowered.match_indices(keyword).any(|(start, _)| {
        lowered[..start]
            .chars()
            .next_back()
            .is_none_or(|prev| !prev.is_alphanumeric())
    })
}

/// Returns the outcome of the first rule with a matching keyword.
pub fn first_match<T: Copy>(rules: &[KeywordRule<T>], lowered: &str) -> Option<T> {
    rules
        .iter()
        .find(|rule| rule.matches(lowered))
        .map(|rule| rule.outcome)
}

/// How a vehicle-count cue adjusts the video estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarsOverride {
    /// At least two vehicles: `max(current, 2)`.
    MultiVehicle,
    /// Exactly one vehicle.
    Solo,
}

impl CarsOverride {
    pub fn apply(&self, current: u32) -> u32 {
        match self {
            CarsOverride::MultiVehicle => current.max(2),
            CarsOverride::Solo => 1,
        }
    }
}

/// Phrases that deny an injury. They are blanked out before severity matching so
/// "nobody was injured" does not read as an injury report.
pub const NEGATED_INJURY_PHRASES: &[&str] = &[
    "no one was injured",
    "no one is injured",
    "no one injured",
    "nobody was injured",
    "nobody is injured",
    "nobody injured",
    "no one was hurt",
    "not injured",
    "wasn't injured",
    "weren't injured",
    "uninjured",
    "without injury",
    "no injury",
    "no injuries",
];

/// Checked most severe first.
pub static SEVERITY_RULES: &[KeywordRule<Severity>] = &[
    KeywordRule {
        keywords: &[
            "911",
            "ambulance",
            "unconscious",
            "bleeding",
            "injured",
            "injury",
            "can't breathe",
            "trapped",
            "fire",
            "rolled over",
            "flipped",
            "totaled",
        ],
        outcome: Severity::Severe,
    },
    KeywordRule {
        keywords: &[
            "airbag",
            "can't drive",
            "cannot drive",
            "won't start",
            "undrivable",
            "need a tow",
            "towed",
            "smashed",
            "crushed",
            "major damage",
            "serious damage",
        ],
        outcome: Severity::Major,
    },
    KeywordRule {
        keywords: &[
            "minor",
            "fender bender",
            "small dent",
            "tiny dent",
            "just a scratch",
            "little scratch",
            "nobody hurt",
            "no one hurt",
            "no injuries",
            "barely",
        ],
        outcome: Severity::Minor,
    },
];

/// Multi-vehicle rules come first, so a solo cue never overrides a multi-vehicle cue
/// in the same note.
pub static VEHICLE_RULES: &[KeywordRule<CarsOverride>] = &[
    KeywordRule {
        keywords: &[
            "two car",
            "2 car",
            "three car",
            "3 car",
            "multiple car",
            "multi-car",
            "multi car",
            "other car",
            "other driver",
            "another driver",
            "another car",
            "another vehicle",
            "both cars",
            "rear-ended",
            "rear ended",
            "t-boned",
            "head-on",
            "head on",
            "pile-up",
            "pileup",
        ],
        outcome: CarsOverride::MultiVehicle,
    },
    KeywordRule {
        keywords: &[
            "hit a pole",
            "hit a tree",
            "hit a wall",
            "hit a curb",
            "hit the curb",
            "hit a guardrail",
            "hit a pothole",
            "single car",
            "single vehicle",
            "only my car",
            "by myself",
            "no other car",
            "ran off the road",
        ],
        outcome: CarsOverride::Solo,
    },
];

pub static DAMAGE_RULES: &[KeywordRule<&str>] = &[
    KeywordRule {
        keywords: &["tire", "tyre", "flat", "puncture", "blowout", "blown out", "bent rim"],
        outcome: damage::TIRE,
    },
    KeywordRule {
        keywords: &[
            "engine",
            "overheat",
            "won't start",
            "check engine",
            "smoke from the hood",
            "radiator",
        ],
        outcome: damage::ENGINE,
    },
    KeywordRule {
        keywords: &[
            "dented", "a dent", "bumper", "fender", "scratch", "door", "panel", "crumpled",
        ],
        outcome: damage::BODY,
    },
    KeywordRule {
        keywords: &["windshield", "window", "glass", "mirror", "shattered"],
        outcome: damage::GLASS,
    },
    KeywordRule {
        keywords: &["leak", "fluid", "oil", "coolant", "gas smell", "smell gas", "dripping"],
        outcome: damage::FLUID_LEAK,
    },
];

/// Adjustments suggested by one note.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextCues {
    pub severity_override: Option<Severity>,
    pub cars_override: Option<CarsOverride>,
    pub damage_additions: DamageSet,
}

impl TextCues {
    pub fn is_empty(&self) -> bool {
        self.severity_override.is_none()
            && self.cars_override.is_none()
            && self.damage_additions.is_empty()
    }
}

pub fn classify(text: &str) -> TextCues {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return TextCues::default();
    }

    let severity_override = first_match(SEVERITY_RULES, &blank_negated_injuries(&lowered));
    let cars_override = first_match(VEHICLE_RULES, &lowered);
    let damage_additions: DamageSet = DAMAGE_RULES
        .iter()
        .filter(|rule| rule.matches(&lowered))
        .map(|rule| DamageTag::new(rule.outcome))
        .collect();

    debug!(
        severity_override = ?severity_override,
        cars_override = ?cars_override,
        damage_additions = %damage_additions.joined(),
        "classified text cues"
    );

    TextCues {
        severity_override,
        cars_override,
        damage_additions,
    }
}

fn blank_negated_injuries(lowered: &str) -> String {
    NEGATED_INJURY_PHRASES
        .iter()
        .fold(lowered.to_string(), |text, phrase| {
            text.replace(phrase, &" ".repeat(phrase.len()))
        })
}
