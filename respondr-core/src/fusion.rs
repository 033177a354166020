//! Decision fusion: reconciles the video estimate with cues from the user's note.
//!
//! Text wins whenever it carries a cue. The video estimate seeds every field and is
//! only replaced (severity), adjusted (vehicle count), or extended (damages) by what
//! the note says. Everything downstream of the fused fields is a fixed template
//! lookup, so the same inputs always produce the same assessment.

use tracing::{debug, info};

use crate::cues;
use crate::signals::{TextSignal, VideoSignal};
use crate::types::{
    DamageSet, FinalAssessment, LocationRecommendation, RecommendationPriority, ServiceType,
    Severity,
};

pub const MAX_TIPS: usize = 8;

type RecommendationTemplate = (ServiceType, RecommendationPriority, &'static str);

/// Canned guidance for one severity branch.
struct Playbook {
    immediate_actions: &'static [&'static str],
    general_advice: &'static [&'static str],
    recommendations: &'static [RecommendationTemplate],
}

static SEVERE_PLAYBOOK: Playbook = Playbook {
    immediate_actions: &[
        "Call 911 immediately if anyone is injured or in danger",
        "Do not move injured people unless there is an immediate threat such as fire",
        "Turn on hazard lights and get everyone who can walk away from traffic",
        "Stay on the line with emergency services and follow their instructions",
    ],
    general_advice: &[
        "Accept a medical evaluation even if you feel fine, adrenaline can mask injuries",
        "Do not discuss blame at the scene",
        "Ask the responding officer for the police report number before leaving",
        "Contact your insurance company once everyone is safe",
    ],
    recommendations: &[
        (
            ServiceType::Hospital,
            RecommendationPriority::Immediate,
            "Possible injuries need urgent medical evaluation",
        ),
        (
            ServiceType::TowTruck,
            RecommendationPriority::Immediate,
            "The vehicle is unlikely to be safe to drive",
        ),
        (
            ServiceType::Police,
            RecommendationPriority::Urgent,
            "A severe collision must be reported to the police",
        ),
    ],
};

static MAJOR_PLAYBOOK: Playbook = Playbook {
    immediate_actions: &[
        "Check everyone for injuries and call 911 if anyone is hurt",
        "Turn on hazard lights and set up warning triangles if you have them",
        "Do not drive the vehicle if it is leaking fluids or handling abnormally",
        "Call a tow service if the vehicle cannot be driven safely",
    ],
    general_advice: &[
        "File a police report, most insurers require one for major damage",
        "Get a written estimate from a certified body shop before authorizing repairs",
        "Keep receipts for towing, rental cars and other accident expenses",
    ],
    recommendations: &[
        (
            ServiceType::AutoBodyShop,
            RecommendationPriority::Urgent,
            "Significant damage needs a professional assessment",
        ),
        (
            ServiceType::TowTruck,
            RecommendationPriority::Urgent,
            "Major damage may make the vehicle unsafe to drive",
        ),
    ],
};

static MINOR_PLAYBOOK: Playbook = Playbook {
    immediate_actions: &[
        "Move the vehicle out of traffic if it is safe to drive",
        "Turn on hazard lights",
        "Exchange contact and insurance details with any other driver involved",
    ],
    general_advice: &[
        "Have the car inspected even if the damage looks cosmetic",
        "Small dents and scratches can often be fixed with paintless dent repair",
        "Compare the repair cost with your deductible before filing a claim",
    ],
    recommendations: &[],
};

static MINOR_TIRE_PLAYBOOK: Playbook = Playbook {
    immediate_actions: &[
        "Pull over to a flat, safe spot away from traffic and turn on hazard lights",
        "Do not keep driving on a flat or damaged tire, it can ruin the rim",
        "Fit the spare tire if you have one and know how, otherwise call roadside assistance",
        "Stay under 50 mph on a temporary spare until the tire is replaced",
    ],
    general_advice: &[
        "Check the other tires and the rims for bulges or cracks",
        "Pothole and curb impacts often knock the wheels out of alignment",
        "Many tire shops repair simple punctures in under an hour",
    ],
    recommendations: &[(
        ServiceType::TireShop,
        RecommendationPriority::Urgent,
        "Tire damage detected, repair or replace it before driving further",
    )],
};

static BASELINE_MECHANIC: RecommendationTemplate = (
    ServiceType::Mechanic,
    RecommendationPriority::Soon,
    "A general inspection can catch damage that is not visible yet",
);

const DOCUMENTATION_TIPS: [&str; 2] = [
    "Take photos of all vehicles, damage, license plates and the surrounding scene from \
     several angles",
    "Write down the time, location, weather and road conditions while they are fresh",
];

const MULTI_VEHICLE_TIPS: [&str; 2] = [
    "Exchange names, phone numbers, insurance details and plate numbers with every driver involved",
    "Do not admit fault or apologize at the scene, liability is for the insurers to determine",
];

const TIRE_ALIGNMENT_TIP: &str =
    "Have the wheel alignment checked after the damaged tire is replaced";

const MEDICAL_LOG_TIP: &str =
    "Keep a log of any pain or symptoms and every medical visit, even minor ones";

const INSURANCE_TIPS: [&str; 3] = [
    "Notify your insurance company within 24 hours",
    "Get at least two written repair estimates before authorizing work",
    "Keep every receipt for towing, rentals and repairs for reimbursement",
];

fn playbook(severity: Severity, damages: &DamageSet) -> &'static Playbook {
    match severity {
        Severity::Severe => &SEVERE_PLAYBOOK,
        Severity::Major => &MAJOR_PLAYBOOK,
        Severity::Minor if damages.mentions("tire") => &MINOR_TIRE_PLAYBOOK,
        Severity::Minor => &MINOR_PLAYBOOK,
    }
}

fn recommendation_templates(
    severity: Severity,
    damages: &DamageSet,
) -> impl Iterator<Item = &'static RecommendationTemplate> {
    let baseline = (severity == Severity::Minor).then_some(&BASELINE_MECHANIC);
    playbook(severity, damages)
        .recommendations
        .iter()
        .chain(baseline)
}

/// Service categories implied by the severity/damage branch, in recommendation order.
pub fn recommended_categories(severity: Severity, damages: &DamageSet) -> Vec<ServiceType> {
    recommendation_templates(severity, damages)
        .map(|(service_type, _, _)| *service_type)
        .collect()
}

/// Fuses the video estimate with the note into the final assessment.
pub fn fuse(video: &VideoSignal, text: &TextSignal) -> FinalAssessment {
    let mut severity = video.severity;
    let mut cars_involved = video.cars_involved.max(1);
    let mut damages = video.damages.clone();
    let mut text_override_applied = false;

    if text.has_content {
        let text_cues = cues::classify(&text.raw_note);

        if let Some(override_severity) = text_cues.severity_override {
            if override_severity != severity {
                debug!(from = %severity, to = %override_severity, "text overrides severity");
                severity = override_severity;
                text_override_applied = true;
            }
        }

        if let Some(mode) = text_cues.cars_override {
            let adjusted = mode.apply(cars_involved);
            if adjusted != cars_involved {
                debug!(
                    from = cars_involved,
                    to = adjusted,
                    mode = ?mode,
                    "text overrides vehicle count"
                );
                cars_involved = adjusted;
                text_override_applied = true;
            }
        }

        for tag in text_cues.damage_additions.iter().cloned() {
            if damages.insert(tag) {
                text_override_applied = true;
            }
        }
    }

    let book = playbook(severity, &damages);
    let location_recommendations = recommendation_templates(severity, &damages)
        .map(|(service_type, priority, reason)| LocationRecommendation {
            service_type: *service_type,
            reason: reason.to_string(),
            priority: *priority,
        })
        .collect();

    let assessment = FinalAssessment {
        severity,
        cars_involved,
        priority: severity.priority(),
        text_override_applied,
        overview_summary: overview_summary(severity, cars_involved, &damages),
        detailed_explanation: detailed_explanation(
            severity,
            cars_involved,
            &damages,
            video,
            text_override_applied,
        ),
        immediate_actions: to_owned_lines(book.immediate_actions),
        general_advice: to_owned_lines(book.general_advice),
        location_recommendations,
        comprehensive_tips: comprehensive_tips(severity, cars_involved, &damages),
        damages,
    };

    info!(
        severity = %assessment.severity,
        cars_involved = assessment.cars_involved,
        damages = %assessment.damages.joined(),
        priority = ?assessment.priority,
        text_override_applied = assessment.text_override_applied,
        "fused accident assessment"
    );

    assessment
}

fn to_owned_lines(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| line.to_string()).collect()
}

fn vehicles_phrase(cars_involved: u32) -> String {
    if cars_involved > 1 {
        format!("involving {} vehicles", cars_involved)
    } else {
        "involving a single vehicle".to_string()
    }
}

fn overview_summary(severity: Severity, cars_involved: u32, damages: &DamageSet) -> String {
    let mut summary = format!(
        "{} accident {}.",
        capitalize(severity.label()),
        vehicles_phrase(cars_involved)
    );
    if !damages.is_empty() {
        summary.push_str(&format!(" Damage observed: {}.", damages.joined()));
    }
    summary
}

fn detailed_explanation(
    severity: Severity,
    cars_involved: u32,
    damages: &DamageSet,
    video: &VideoSignal,
    text_override_applied: bool,
) -> String {
    let mut parts = vec![match severity {
        Severity::Severe => "This looks like a severe accident. Safety and medical care come \
                             before anything else, and the vehicle should not be driven."
            .to_string(),
        Severity::Major => "This looks like a major accident. The vehicle may not be safe to \
                            drive and will likely need professional repair."
            .to_string(),
        Severity::Minor => "This looks like a minor accident. The vehicle is probably drivable, \
                            but it is still worth getting it checked."
            .to_string(),
    }];

    if cars_involved > 1 {
        parts.push(format!(
            "{} vehicles appear to be involved, so information must be exchanged with the \
             other drivers.",
            cars_involved
        ));
    }

    if !damages.is_empty() {
        parts.push(format!("Detected damage: {}.", damages.joined()));
    }

    if let Some(location_type) = &video.location_type {
        parts.push(format!("The incident appears to have happened at: {}.", location_type));
    }

    if !video.immediate_concerns.is_empty() {
        parts.push(format!(
            "Immediate concerns flagged in the footage: {}.",
            video.immediate_concerns.join(", ")
        ));
    }

    if text_override_applied {
        parts.push(
            "Your description added details the footage did not show, and it takes \
             precedence in this assessment."
                .to_string(),
        );
    }

    parts.join(" ")
}

fn comprehensive_tips(severity: Severity, cars_involved: u32, damages: &DamageSet) -> Vec<String> {
    let mut tips: Vec<&str> = DOCUMENTATION_TIPS.to_vec();
    if cars_involved > 1 {
        tips.extend(MULTI_VEHICLE_TIPS);
    }
    if damages.mentions("tire") {
        tips.push(TIRE_ALIGNMENT_TIP);
    }
    if severity.is_at_least_major() {
        tips.push(MEDICAL_LOG_TIP);
    }
    tips.extend(INSURANCE_TIPS);
    tips.truncate(MAX_TIPS);
    to_owned_lines(&tips)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
