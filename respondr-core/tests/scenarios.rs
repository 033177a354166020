//! End-to-end behaviour of the public API on the documented accident scenarios.

use respondr_core::{
    CandidateService, Coordinates, CoreError, DamageTag, InMemoryCatalog,
    InMemorySessionRepository, IncidentRunner, IntentKind, Priority, RecommendationPriority,
    ServiceType, Severity, TextSignal, Urgency, VideoSignal, classify_intent, fuse,
};
use std::sync::Arc;

fn video(severity: Severity, cars_involved: u32, damages: &[&str]) -> VideoSignal {
    VideoSignal {
        severity,
        cars_involved,
        damages: damages.iter().map(|d| DamageTag::new(d)).collect(),
        ..VideoSignal::default()
    }
}

fn candidate(id: &str, service_type: ServiceType) -> CandidateService {
    CandidateService {
        id: id.to_string(),
        name: format!("Shop {}", id),
        distance: 1.5,
        rating: 4.2,
        coordinates: Coordinates {
            lat: 25.77,
            lng: -80.19,
        },
        service_type,
        phone: "(305) 555-0142".to_string(),
        address: format!("{} Biscayne Blvd, Miami, FL", id),
        hours: "8am-6pm".to_string(),
        services: vec![],
        price_range: "$$".to_string(),
        wait_time: "30 min".to_string(),
    }
}

#[test]
fn fusion_is_deterministic() {
    let v = video(Severity::Major, 2, &["front collision", "broken glass"]);
    let t = TextSignal::from_note("The other driver rear-ended me and my bumper is hanging off");
    assert_eq!(fuse(&v, &t), fuse(&v, &t));
}

#[test]
fn emergency_words_force_severe() {
    for base in [Severity::Minor, Severity::Major, Severity::Severe] {
        let assessment = fuse(
            &video(base, 1, &[]),
            &TextSignal::from_note("Someone called 911, waiting for the ambulance"),
        );
        assert_eq!(assessment.severity, Severity::Severe);
    }
}

#[test]
fn solo_cue_forces_single_vehicle() {
    let assessment = fuse(
        &video(Severity::Major, 3, &[]),
        &TextSignal::from_note("I hit a pole while swerving"),
    );
    assert_eq!(assessment.cars_involved, 1);
    assert!(assessment.text_override_applied);
}

#[test]
fn multi_vehicle_cue_raises_count_to_two() {
    let note = TextSignal::from_note("It was a two car collision at the light");
    assert_eq!(fuse(&video(Severity::Minor, 1, &[]), &note).cars_involved, 2);
    assert_eq!(fuse(&video(Severity::Minor, 4, &[]), &note).cars_involved, 4);
}

#[test]
fn duplicate_damage_is_reported_once() {
    let assessment = fuse(
        &video(Severity::Minor, 1, &["tire damage"]),
        &TextSignal::from_note("flat tire"),
    );
    let tire_count = assessment
        .damages
        .iter()
        .filter(|d| d.as_str() == "tire damage")
        .count();
    assert_eq!(tire_count, 1);
}

#[test]
fn priority_follows_severity() {
    let expected = [
        (Severity::Minor, Priority::Medium),
        (Severity::Major, Priority::High),
        (Severity::Severe, Priority::Emergency),
    ];
    for (severity, priority) in expected {
        let assessment = fuse(&video(severity, 1, &[]), &TextSignal::default());
        assert_eq!(assessment.priority, priority);
    }
}

#[test]
fn tips_never_exceed_eight() {
    let notes = [
        "",
        "two car crash, flat tire, engine smoking, 911 called",
        "hit a pole, windshield shattered, leaking oil",
        "minor scratch",
    ];
    for severity in [Severity::Minor, Severity::Major, Severity::Severe] {
        for cars in [1, 2, 5] {
            for damages in [&[][..], &["tire damage"][..], &["engine damage", "dents"][..]] {
                for note in notes {
                    let assessment =
                        fuse(&video(severity, cars, damages), &TextSignal::from_note(note));
                    assert!(assessment.comprehensive_tips.len() <= 8);
                    assert!(assessment.comprehensive_tips[0].starts_with("Take photos"));
                }
            }
        }
    }
}

#[test]
fn pothole_flat_tire_scenario() {
    let assessment = fuse(
        &video(Severity::Minor, 1, &[]),
        &TextSignal::from_note("I hit a pothole and now my tire is flat"),
    );

    assert_eq!(assessment.severity, Severity::Minor);
    assert_eq!(assessment.damages.len(), 1);
    assert!(assessment.damages.contains(&DamageTag::new("tire damage")));

    let tire_shop = assessment
        .location_recommendations
        .iter()
        .find(|r| r.service_type == ServiceType::TireShop)
        .expect("tire shop recommendation");
    assert_eq!(tire_shop.priority, RecommendationPriority::Urgent);
}

#[test]
fn follow_up_without_analysis_is_invalid_session() {
    let message = "where can I get towed, this is an emergency";

    let intent = classify_intent(message, None);
    assert!(intent.needs_location_search);
    assert_eq!(intent.intent, IntentKind::LocationRequest);
    assert_eq!(intent.search_types, vec![ServiceType::TowTruck]);
    assert_eq!(intent.urgency, Urgency::Urgent);

    let runner = IncidentRunner::new(
        Arc::new(InMemorySessionRepository::new()),
        Arc::new(InMemoryCatalog::new()),
    );
    let result = runner.chat("fresh-session", message, "Miami");
    assert!(matches!(result, Err(CoreError::InvalidSession(_))));
}

#[test]
fn major_cost_question_quotes_range() {
    let runner = IncidentRunner::new(
        Arc::new(InMemorySessionRepository::new()),
        Arc::new(InMemoryCatalog::new()),
    );
    runner
        .analyze(
            "s-major",
            &video(Severity::Major, 1, &["side damage"]),
            &TextSignal::default(),
            "Miami",
        )
        .unwrap();

    let response = runner
        .chat("s-major", "how much will this cost", "Miami")
        .unwrap();
    assert!(response.reply.contains("$2,000 to $15,000"));
}

#[test]
fn analysis_response_pulls_from_catalog() {
    let catalog = InMemoryCatalog::from_services([
        candidate("t1", ServiceType::TireShop),
        candidate("t2", ServiceType::TireShop),
        candidate("m1", ServiceType::Mechanic),
    ]);
    let runner = IncidentRunner::new(
        Arc::new(InMemorySessionRepository::new()),
        Arc::new(catalog),
    );

    let response = runner
        .analyze(
            "s-tire",
            &video(Severity::Minor, 1, &[]),
            &TextSignal::from_note("I hit a pothole and now my tire is flat"),
            "Miami",
        )
        .unwrap();

    assert_eq!(
        response.searched_categories,
        vec![ServiceType::TireShop, ServiceType::Mechanic]
    );
    let ids: Vec<&str> = response
        .recommended_services
        .iter()
        .map(|s| s.service.id.as_str())
        .collect();
    assert_eq!(ids, vec!["t1", "t2", "m1"]);
    assert_eq!(
        response.recommended_services[0].priority,
        Some(RecommendationPriority::Urgent)
    );
}

#[test]
fn denied_injury_stays_minor() {
    for note in [
        "No injury, just a scratch on the bumper",
        "fender bender, nobody was injured",
    ] {
        let assessment = fuse(&VideoSignal::default(), &TextSignal::from_note(note));
        assert_eq!(assessment.severity, Severity::Minor, "{note}");
        assert_eq!(assessment.priority, Priority::Medium, "{note}");
        assert!(!assessment.immediate_actions[0].contains("911"), "{note}");
    }
}

#[test]
fn entire_is_not_tire_damage() {
    let assessment = fuse(
        &VideoSignal::default(),
        &TextSignal::from_note("the entire rear bumper is dented"),
    );
    assert!(!assessment.has_tire_damage());
    assert!(
        assessment
            .location_recommendations
            .iter()
            .all(|r| r.service_type != ServiceType::TireShop)
    );
}
