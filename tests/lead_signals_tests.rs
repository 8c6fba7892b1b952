/// Unit tests for lead signal extraction
/// Tests signal and interest detection, qualification data parsing and score arithmetic
use property_chat_api::core::chat::{apply_turn, LeadState};
use property_chat_api::core::lead_signals::{
    analyze_lead_signals, calculate_lead_score, extract_interests, extract_qualification_data,
    BudgetRange, Interest, LeadSignal, QualificationData,
};

#[cfg(test)]
mod signal_tests {
    use super::*;

    #[test]
    fn test_budget_detected_in_any_case() {
        for msg in ["What's the budget?", "BUDGET matters", "Our Budget is tight"] {
            assert!(analyze_lead_signals(msg).contains(&LeadSignal::BudgetDiscussion));
        }
    }

    #[test]
    fn test_price_range_phrase() {
        let signals = analyze_lead_signals("Is this in my price range?");
        assert_eq!(signals, vec![LeadSignal::BudgetDiscussion]);
    }

    #[test]
    fn test_multiple_signals_in_check_order() {
        let signals = analyze_lead_signals(
            "We need to move in quickly, our kids start school soon and the mortgage is approved",
        );
        assert_eq!(
            signals,
            vec![
                LeadSignal::TimelineInterest,
                LeadSignal::FinancingDiscussion,
                LeadSignal::FamilySituation,
                LeadSignal::Urgency,
            ]
        );
    }

    #[test]
    fn test_no_signals() {
        assert!(analyze_lead_signals("Nice photos").is_empty());
        assert!(analyze_lead_signals("").is_empty());
    }

    #[test]
    fn test_viewing_interest() {
        let signals = analyze_lead_signals("Could I tour the house on Saturday?");
        assert!(signals.contains(&LeadSignal::ViewingInterest));
    }
}

#[cfg(test)]
mod interest_tests {
    use super::*;

    #[test]
    fn test_property_features() {
        let interests = extract_interests("How big is the kitchen, and is there a pool and a yard?");
        assert_eq!(
            interests,
            vec![Interest::Kitchen, Interest::OutdoorSpace, Interest::Pool]
        );
    }

    #[test]
    fn test_location_features() {
        let interests = extract_interests("What are the schools like? How is the commute downtown?");
        assert_eq!(interests, vec![Interest::Schools, Interest::Commute]);
    }

    #[test]
    fn test_substring_quirk_parking_matches_parks() {
        // Plain containment: "parking" contains "park"
        let interests = extract_interests("Is there street parking?");
        assert_eq!(interests, vec![Interest::Garage, Interest::Parks]);
    }

    #[test]
    fn test_no_interests() {
        assert!(extract_interests("Thanks!").is_empty());
    }
}

#[cfg(test)]
mod qualification_data_tests {
    use super::*;

    #[test]
    fn test_budget_range_between_two_amounts() {
        let data = extract_qualification_data("between $300,000 and $350,000");
        assert_eq!(
            data,
            QualificationData {
                budget_range: Some(BudgetRange {
                    min: 300_000,
                    max: Some(350_000),
                }),
                timeline_months: None,
            }
        );
    }

    #[test]
    fn test_budget_range_with_dash() {
        let data = extract_qualification_data("$400,000 - $450,000");
        assert_eq!(
            data.budget_range,
            Some(BudgetRange {
                min: 400_000,
                max: Some(450_000),
            })
        );
    }

    #[test]
    fn test_single_amount() {
        let data = extract_qualification_data("We can go up to $525,000 max");
        assert_eq!(
            data.budget_range,
            Some(BudgetRange {
                min: 525_000,
                max: None,
            })
        );
    }

    #[test]
    fn test_no_numbers_is_empty() {
        let data = extract_qualification_data("no numbers here");
        assert_eq!(data, QualificationData::default());
        assert_eq!(serde_json::to_value(&data).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_timeline_months() {
        assert_eq!(
            extract_qualification_data("We want to move in 3 months").timeline_months,
            Some(3)
        );
        assert_eq!(
            extract_qualification_data("within 1 month").timeline_months,
            Some(1)
        );
        assert_eq!(
            extract_qualification_data("in 6months or so").timeline_months,
            Some(6)
        );
    }

    #[test]
    fn test_month_without_number() {
        assert_eq!(
            extract_qualification_data("sometime next month").timeline_months,
            None
        );
    }

    #[test]
    fn test_budget_and_timeline_together() {
        let data = extract_qualification_data("About $600,000, closing in 2 months");
        assert_eq!(data.budget_range.map(|b| b.min), Some(600_000));
        assert_eq!(data.timeline_months, Some(2));
    }
}

#[cfg(test)]
mod score_tests {
    use super::*;

    #[test]
    fn test_clamped_at_100() {
        assert_eq!(calculate_lead_score(90, &[LeadSignal::ViewingInterest]), 100);
    }

    #[test]
    fn test_no_signals_keeps_score() {
        assert_eq!(calculate_lead_score(0, &[]), 0);
        assert_eq!(calculate_lead_score(42, &[]), 42);
    }

    #[test]
    fn test_additive_increments() {
        assert_eq!(
            calculate_lead_score(
                50,
                &[LeadSignal::BudgetDiscussion, LeadSignal::TimelineInterest]
            ),
            77
        );
    }

    #[test]
    fn test_all_increments() {
        assert_eq!(calculate_lead_score(0, &LeadSignal::ALL), 80);
    }

    #[test]
    fn test_repeated_signal_across_turns_counts_twice() {
        let first = apply_turn(
            &LeadState::default(),
            "What is the budget for upgrades?",
            "ok",
            false,
            chrono::Utc::now(),
        );
        assert_eq!(first.state.score, 15);

        let second = apply_turn(
            &first.state,
            "And the budget for closing costs?",
            "ok",
            false,
            chrono::Utc::now(),
        );
        assert_eq!(second.state.score, 30);
    }
}
