use leadership4dx_lib::pipeline::analyze;
use leadership4dx_lib::scoring::{
    trait_levels, BlakeMoutonStyle, CandorQuadrant, LmxLevel, RiskLevel, MID_CUTOFF,
};
use leadership4dx_lib::survey::{
    catalog, validate_submission, Dimension, Response, ResponseStore, SurveySubmission,
};

/// Full answer set where every item of a dimension gets the same raw value.
fn answers(value_for: impl Fn(Dimension) -> u8) -> ResponseStore {
    let mut store = ResponseStore::new();
    for q in catalog().questions() {
        store.record(&q.id, value_for(q.dimension)).unwrap();
    }
    store
}

#[test]
fn people_first_manager_with_soft_feedback() {
    let store = answers(|d| match d {
        Dimension::People => 7,
        Dimension::Production => 4,
        Dimension::Care => 6,
        Dimension::Challenge => 2,
        Dimension::Lmx => 5,
        _ => 1,
    });

    let analysis = analyze(&store);
    assert_eq!(analysis.classification.blake_mouton, BlakeMoutonStyle::CountryClub);
    assert_eq!(analysis.classification.candor, CandorQuadrant::RuinousEmpathy);
    assert_eq!(analysis.classification.lmx, LmxLevel::Medium);
    assert!(!analysis.insights.strengths.is_empty());
    assert!(!analysis.insights.recommendations.is_empty());
    assert!(!analysis.insights.style_description.is_empty());
}

#[test]
fn disengaged_profile_gets_a_development_plan() {
    let store = answers(|d| match d {
        Dimension::People | Dimension::Production | Dimension::Lmx => 2,
        _ => 3,
    });

    let analysis = analyze(&store);
    assert_eq!(analysis.classification.blake_mouton, BlakeMoutonStyle::Impoverished);
    assert_eq!(analysis.classification.lmx, LmxLevel::Low);
    assert!(analysis.scores.people < MID_CUTOFF);
    assert!(!analysis.insights.development_plan.is_empty());
    assert!(analysis.insights.development_plan.len() <= 5);
}

#[test]
fn concealed_traits_drive_risk_but_not_visible_labels() {
    let calm = analyze(&answers(|d| if d.is_concealed() { 1 } else { 5 }));
    let risky = analyze(&answers(|_| 5));

    assert_eq!(calm.classification, risky.classification);
    assert_eq!(calm.insights, risky.insights);
    assert_eq!(calm.scores.visible(), risky.scores.visible());

    assert_eq!(risky.scores.concealed().average(), 5.0);
    assert_eq!(risky.risk_level, RiskLevel::High);
    assert_eq!(trait_levels(&risky.scores.concealed()).machiavellianism, RiskLevel::High);

    assert_eq!(calm.scores.concealed().average(), 1.0);
    assert_eq!(calm.risk_level, RiskLevel::Low);
}

#[test]
fn validated_submission_scores_like_a_direct_store() {
    let responses: Vec<Response> = catalog()
        .questions()
        .enumerate()
        .map(|(i, q)| Response {
            question_id: q.id.clone(),
            value: (i % 4) as u8 + 2,
        })
        .collect();

    let submission = SurveySubmission {
        user_id: None,
        name: "Sam Rivera".to_string(),
        email: "sam@example.com".to_string(),
        organization: None,
        department: Some("Operations".to_string()),
        position: Some("Team lead".to_string()),
        responses: responses.clone(),
        completion_time_seconds: Some(600),
    };

    let validated = validate_submission(&submission).unwrap();
    let direct = ResponseStore::from_responses(responses).unwrap();
    assert_eq!(analyze(&validated.responses), analyze(&direct));
}
