//! Turns assessments and follow-up intents into user-facing payloads.
//!
//! Candidate services always come from the injected [`ServiceCatalog`]; the composer
//! only selects, deduplicates, annotates, and narrates them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::catalog::{CandidateService, Coordinates, ServiceCatalog};
use crate::fusion::recommended_categories;
use crate::intent::{QueryIntent, SpecificRequest, Urgency};
use crate::types::{FinalAssessment, RecommendationPriority, ServiceType, Severity};

pub const MAX_ANALYSIS_CATEGORIES: usize = 4;
pub const MAX_CHAT_CATEGORIES: usize = 3;
pub const CANDIDATES_PER_CATEGORY: usize = 3;
pub const MAX_ANALYSIS_SERVICES: usize = 6;

/// A catalog entry annotated for one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedService {
    #[serde(flatten)]
    pub service: CandidateService,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<RecommendationPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub id: String,
    pub name: String,
    pub service_type: ServiceType,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapData {
    pub markers: Vec<MapMarker>,
    pub center: Option<Coordinates>,
}

impl MapData {
    pub fn from_services(services: &[RecommendedService]) -> Self {
        let markers: Vec<MapMarker> = services
            .iter()
            .map(|s| MapMarker {
                id: s.service.id.clone(),
                name: s.service.name.clone(),
                service_type: s.service.service_type,
                lat: s.service.coordinates.lat,
                lng: s.service.coordinates.lng,
            })
            .collect();

        let center = (!markers.is_empty()).then(|| {
            let n = markers.len() as f64;
            Coordinates {
                lat: markers.iter().map(|m| m.lat).sum::<f64>() / n,
                lng: markers.iter().map(|m| m.lng).sum::<f64>() / n,
            }
        });

        Self { markers, center }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub assessment: FinalAssessment,
    pub summary: String,
    pub recommended_services: Vec<RecommendedService>,
    pub searched_categories: Vec<ServiceType>,
    pub map: MapData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub intent: QueryIntent,
    pub services: Vec<RecommendedService>,
    pub map: MapData,
}

/// Branch categories, explicit recommendations after them, deduplicated and capped.
pub fn analysis_search_categories(assessment: &FinalAssessment) -> Vec<ServiceType> {
    let mut categories = recommended_categories(assessment.severity, &assessment.damages);
    if assessment.has_tire_damage() {
        categories.push(ServiceType::TireShop);
    }
    categories.extend(
        assessment
            .location_recommendations
            .iter()
            .map(|r| r.service_type),
    );

    let mut seen = HashSet::new();
    categories.retain(|category| seen.insert(*category));
    categories.truncate(MAX_ANALYSIS_CATEGORIES);
    categories
}

pub fn compose_analysis_response(
    assessment: &FinalAssessment,
    catalog: &dyn ServiceCatalog,
    location: &str,
) -> AnalysisResponse {
    let searched_categories = analysis_search_categories(assessment);
    let mut seen = HashSet::new();
    let mut recommended_services = Vec::new();

    for category in &searched_categories {
        let recommendation = assessment
            .location_recommendations
            .iter()
            .find(|r| r.service_type == *category);

        for candidate in catalog
            .lookup(*category, location)
            .into_iter()
            .take(CANDIDATES_PER_CATEGORY)
        {
            if !seen.insert(candidate.dedup_key()) {
                debug!(name = %candidate.name, "skipping duplicate candidate");
                continue;
            }
            recommended_services.push(RecommendedService {
                service: candidate,
                recommendation_reason: recommendation.map(|r| r.reason.clone()),
                priority: recommendation.map(|r| r.priority),
                advice: Some(service_advice(*category, assessment)),
                search_context: None,
            });
        }
    }
    recommended_services.truncate(MAX_ANALYSIS_SERVICES);

    info!(
        categories = ?searched_categories,
        services = recommended_services.len(),
        "composed analysis response"
    );

    AnalysisResponse {
        summary: analysis_summary(assessment, &recommended_services),
        map: MapData::from_services(&recommended_services),
        assessment: assessment.clone(),
        recommended_services,
        searched_categories,
    }
}

fn analysis_summary(assessment: &FinalAssessment, services: &[RecommendedService]) -> String {
    let mut summary = assessment.overview_summary.clone();

    if !assessment.immediate_actions.is_empty() {
        summary.push_str("\n\nWhat to do right now:");
        for action in assessment.immediate_actions.iter().take(3) {
            summary.push_str(&format!("\n- {}", action));
        }
    }

    if !services.is_empty() {
        let names: Vec<&str> = services.iter().map(|s| s.service.name.as_str()).collect();
        summary.push_str(&format!("\n\nNearby help: {}.", names.join(", ")));
    }

    summary
}

/// Fixed (service type, severity) advice, with damage-specific extras.
pub fn service_advice(service_type: ServiceType, assessment: &FinalAssessment) -> String {
    let base = match (service_type, assessment.severity) {
        (ServiceType::TowTruck, Severity::Severe) => {
            "Request a flatbed tow and do not attempt to drive the vehicle."
        }
        (ServiceType::TowTruck, Severity::Major) => {
            "Ask for a flatbed if the car is leaking fluids or a wheel is damaged."
        }
        (ServiceType::TowTruck, Severity::Minor) => {
            "Only needed if the car will not start or feels unsafe to drive."
        }
        (ServiceType::TireShop, Severity::Severe) => {
            "Tire work can wait until the vehicle has been checked for structural damage."
        }
        (ServiceType::TireShop, Severity::Major) => {
            "Have the tires checked along with the body repair, impacts can weaken sidewalls."
        }
        (ServiceType::TireShop, Severity::Minor) => {
            "Most punctures can be patched quickly if the sidewall is intact."
        }
        (ServiceType::Mechanic, Severity::Severe) => {
            "Get a full safety inspection before the vehicle is driven again."
        }
        (ServiceType::Mechanic, Severity::Major) => {
            "Ask for a suspension and steering check in addition to the visible damage."
        }
        (ServiceType::Mechanic, Severity::Minor) => {
            "A quick inspection can confirm nothing under the hood was affected."
        }
        (ServiceType::AutoBodyShop, Severity::Severe) => {
            "Get a written estimate, your insurer may declare the vehicle a total loss."
        }
        (ServiceType::AutoBodyShop, Severity::Major) => {
            "Ask whether they bill your insurance company directly."
        }
        (ServiceType::AutoBodyShop, Severity::Minor) => {
            "Ask about paintless dent repair for small dents, it is usually cheaper."
        }
        (ServiceType::Hospital, Severity::Severe) => {
            "Go now or call 911, and tell staff you were in a vehicle collision."
        }
        (ServiceType::Hospital, Severity::Major) => {
            "Get checked today even if you feel fine, some injuries appear hours later."
        }
        (ServiceType::Hospital, Severity::Minor) => {
            "Visit if you notice pain, dizziness or stiffness over the next few days."
        }
        (ServiceType::Police, Severity::Severe) => {
            "Officers should come to the scene, ask them for the report number."
        }
        (ServiceType::Police, Severity::Major) => {
            "File a report, insurers usually require one for major damage claims."
        }
        (ServiceType::Police, Severity::Minor) => {
            "Many cities let you file a minor accident report online."
        }
    };

    let mut advice = base.to_string();
    if service_type == ServiceType::TireShop && assessment.damages.mentions("tire") {
        advice.push_str(
            " Tire damage was detected, so have the size printed on the sidewall ready \
             when you call.",
        );
    }
    if service_type == ServiceType::Mechanic && assessment.damages.mentions("engine") {
        advice.push_str(
            " Engine damage was reported, so ask for a diagnostic before any other repair.",
        );
    }
    advice
}

pub fn compose_chat_response(
    message: &str,
    intent: &QueryIntent,
    prior: &FinalAssessment,
    catalog: &dyn ServiceCatalog,
    location: &str,
) -> ChatResponse {
    let mut groups: Vec<(ServiceType, Vec<RecommendedService>)> = Vec::new();

    if intent.needs_location_search {
        for category in intent.search_types.iter().take(MAX_CHAT_CATEGORIES) {
            let context = format!("Requested: {}", category.display_name());
            let found: Vec<RecommendedService> = catalog
                .lookup(*category, location)
                .into_iter()
                .take(CANDIDATES_PER_CATEGORY)
                .map(|service| RecommendedService {
                    service,
                    recommendation_reason: None,
                    priority: None,
                    advice: None,
                    search_context: Some(context.clone()),
                })
                .collect();
            if !found.is_empty() {
                groups.push((*category, found));
            }
        }
    }
    let found_categories: Vec<ServiceType> = groups.iter().map(|(category, _)| *category).collect();

    let mut sections = Vec::new();
    if intent.wants(SpecificRequest::PricingInfo) {
        sections.push(pricing_paragraph(prior));
    }
    if intent.wants(SpecificRequest::InsuranceGuidance) {
        sections.push(insurance_paragraph(prior));
    }
    if intent.wants(SpecificRequest::NextSteps) {
        sections.push(next_steps_paragraph(prior));
    }
    if !groups.is_empty() {
        sections.push(location_section(&groups, intent.urgency, location));
    } else if intent.needs_location_search {
        sections.push(format!(
            "I couldn't find matching services near {} right now. If you are in danger or \
             stranded, call 911 or your roadside assistance provider.",
            location
        ));
    }
    if sections.is_empty() {
        sections.push(fallback_reply(message, prior));
    }

    let services: Vec<RecommendedService> =
        groups.into_iter().flat_map(|(_, found)| found).collect();

    let mut reply = sections.join("\n\n");
    if !services.is_empty() && !mentions_location_results(&reply) {
        let names: Vec<&str> = found_categories.iter().map(|c| c.display_name()).collect();
        reply.push_str(&format!(
            "\n\nI found {} nearby options across: {}.",
            services.len(),
            names.join(", ")
        ));
    }

    info!(
        services = services.len(),
        categories = ?found_categories,
        "composed chat response"
    );

    ChatResponse {
        reply,
        intent: intent.clone(),
        map: MapData::from_services(&services),
        services,
    }
}

fn mentions_location_results(reply: &str) -> bool {
    let lowered = reply.to_lowercase();
    ["found", "located", "here are"]
        .iter()
        .any(|marker| lowered.contains(marker))
}

fn pricing_paragraph(prior: &FinalAssessment) -> String {
    let mut paragraph = match prior.severity {
        Severity::Minor => "For minor damage like this, repairs usually run $300 to $1,500. \
                            Cosmetic fixes such as paintless dent repair sit at the low end."
            .to_string(),
        Severity::Major => "Major damage repairs typically range from $2,000 to $15,000, \
                            depending on parts, labor rates and whether the frame is affected."
            .to_string(),
        Severity::Severe => "With severe damage, repairs often exceed $15,000 and the insurer \
                             may declare the vehicle a total loss, in which case they pay its \
                             market value instead."
            .to_string(),
    };

    if prior.damages.mentions("tire") {
        paragraph.push_str(
            " Replacing a single tire usually costs $100 to $300, plus around $100 for \
             an alignment.",
        );
    }
    if prior.damages.mentions("engine") {
        paragraph.push_str(" Engine repairs alone can range from $1,000 to $7,000.");
    }
    if prior.damages.mentions("glass") {
        paragraph.push_str(" Windshield or window replacement is typically $250 to $1,000.");
    }
    paragraph.push_str(" Always get at least two written estimates before authorizing work.");
    paragraph
}

fn insurance_paragraph(prior: &FinalAssessment) -> String {
    let mut paragraph = String::from(
        "Call your insurance company within 24 hours and give them the date, time, location \
         and photos of the damage.",
    );
    if prior.cars_involved > 1 {
        paragraph.push_str(
            " Since another driver was involved, get their policy details, their liability \
             coverage may pay for your repairs.",
        );
    }
    match prior.severity {
        Severity::Severe => paragraph.push_str(
            " Ask about medical payments or personal injury protection coverage, and keep every \
             medical record.",
        ),
        Severity::Major => paragraph.push_str(
            " Collision coverage usually applies here, minus your deductible. Ask whether a \
             rental car is covered while yours is repaired.",
        ),
        Severity::Minor => paragraph.push_str(
            " If the estimate is close to your deductible, paying out of pocket may avoid a \
             premium increase.",
        ),
    }
    paragraph
}

fn next_steps_paragraph(prior: &FinalAssessment) -> String {
    let mut paragraph = String::from("Here's what to do next:");
    let steps = prior
        .immediate_actions
        .iter()
        .take(3)
        .chain(prior.general_advice.iter().take(2));
    for (n, step) in steps.enumerate() {
        paragraph.push_str(&format!("\n{}. {}", n + 1, step));
    }
    paragraph
}

fn pro_tip(service_type: ServiceType) -> &'static str {
    match service_type {
        ServiceType::TowTruck => {
            "Pro tip: ask for the total price up front and confirm where the car will be taken."
        }
        ServiceType::TireShop => {
            "Pro tip: call ahead to confirm they have your tire size in stock."
        }
        ServiceType::Mechanic => "Pro tip: ask for a written estimate before authorizing any work.",
        ServiceType::AutoBodyShop => {
            "Pro tip: check whether the shop is in your insurer's preferred network."
        }
        ServiceType::Hospital => {
            "Pro tip: bring your ID and insurance card and mention the accident at check-in."
        }
        ServiceType::Police => {
            "Pro tip: bring your license, registration and the other driver's details."
        }
    }
}

fn location_section(
    groups: &[(ServiceType, Vec<RecommendedService>)],
    urgency: Urgency,
    location: &str,
) -> String {
    let mut section = String::new();
    if urgency == Urgency::Urgent {
        section.push_str("Since this is urgent, call the first option directly.\n\n");
    }

    for (i, (category, found)) in groups.iter().enumerate() {
        if i > 0 {
            section.push_str("\n\n");
        }
        section.push_str(&format!("Nearest {} to {}:", category.display_name(), location));
        for (n, recommended) in found.iter().enumerate() {
            let c = &recommended.service;
            section.push_str(&format!(
                "\n{}. {} - {:.1} miles away, rated {:.1}\n   Address: {}\n   Phone: {}\n   \
                 Hours: {} | Price: {} | Wait: {}",
                n + 1,
                c.name,
                c.distance,
                c.rating,
                c.address,
                c.phone,
                c.hours,
                c.price_range,
                c.wait_time
            ));
        }
    }

    if let Some((first, _)) = groups.first() {
        section.push_str("\n\n");
        section.push_str(pro_tip(*first));
    }
    section
}

fn fallback_reply(message: &str, prior: &FinalAssessment) -> String {
    let lowered = message.to_lowercase();
    if lowered.contains("thank") {
        return "You're welcome! Stay safe, and message me any time you need nearby services \
                or help with your next steps."
            .to_string();
    }
    if ["help", "what", "how"].iter().any(|w| lowered.contains(w)) {
        let first_action = prior
            .immediate_actions
            .first()
            .map(String::as_str)
            .unwrap_or("make sure everyone is safe");
        return format!(
            "I can find nearby tow trucks, tire shops, mechanics, body shops and hospitals, or \
             explain repair costs, insurance and next steps. For your {} accident, start with \
             this: {}.",
            prior.severity, first_action
        );
    }
    format!(
        "Got it. Based on your {} accident assessment, you can ask me where to find help \
         nearby, what repairs might cost, or how to handle insurance.",
        prior.severity
    )
}
