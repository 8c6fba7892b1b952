/// Per-turn lead bookkeeping for the property chat.
///
/// The handler does the I/O (session load, LLM call, persistence); this module
/// decides what a turn changes:
/// 1. Score the visitor's own message (never the assistant reply)
/// 2. Merge interests into the session's running set
/// 3. Record the turn for `conversation_history`
/// 4. Decide whether the lead notification should fire
use crate::follow_up::{self, SuggestedAction, QUALIFIED_THRESHOLD};
use crate::lead_signals::{
    analyze_lead_signals, calculate_lead_score, extract_interests, extract_qualification_data,
    LeadSignal,
};
use crate::models::{ConversationTurn, LeadQualification, QualificationUpdates};
use chrono::{DateTime, Utc};

/// Reply used when the LLM call fails; the turn still counts.
pub const FALLBACK_RESPONSE: &str = "I'm sorry, I'm having trouble responding right now. \
Please reach out to the listing agent directly and they'll be happy to help.";

/// Lead state carried by a session between turns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadState {
    pub score: i32,
    pub interests: Vec<String>,
    pub notified: bool,
}

/// Everything one turn changes.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub state: LeadState,
    pub signals: Vec<LeadSignal>,
    pub turn: ConversationTurn,
    /// True when this turn should fire the lead notification.
    pub notify: bool,
}

/// Appends `incoming` tags not already present, keeping first-seen order.
///
/// Returns the tags that were new.
pub fn merge_interests(existing: &mut Vec<String>, incoming: &[String]) -> Vec<String> {
    let mut added = Vec::new();
    for tag in incoming {
        if !existing.contains(tag) {
            existing.push(tag.clone());
            added.push(tag.clone());
        }
    }
    added
}

/// Applies one visitor message to the session's lead state.
///
/// `can_notify` is false when no notification endpoint is configured; the
/// `notified` flag then stays untouched so a later turn can still fire.
pub fn apply_turn(
    previous: &LeadState,
    user_message: &str,
    ai_response: &str,
    can_notify: bool,
    now: DateTime<Utc>,
) -> TurnOutcome {
    let signals = analyze_lead_signals(user_message);
    let interests: Vec<String> = extract_interests(user_message)
        .iter()
        .map(|i| i.as_str().to_string())
        .collect();
    let extracted = extract_qualification_data(user_message);

    let score = calculate_lead_score(previous.score, &signals);
    let mut merged = previous.interests.clone();
    let new_interests = merge_interests(&mut merged, &interests);

    let notify = can_notify && score >= QUALIFIED_THRESHOLD && !previous.notified;

    let turn = ConversationTurn {
        timestamp: now,
        user_message: user_message.to_string(),
        ai_response: ai_response.to_string(),
        lead_signals: signals.clone(),
        qualification_updates: QualificationUpdates {
            previous_score: previous.score,
            new_score: score,
            new_interests,
            extracted,
        },
    };

    TurnOutcome {
        state: LeadState {
            score,
            interests: merged,
            notified: previous.notified || notify,
        },
        signals,
        turn,
        notify,
    }
}

/// Qualification block of the chat response.
pub fn lead_qualification(state: &LeadState) -> LeadQualification {
    LeadQualification {
        score: state.score,
        is_qualified: follow_up::is_qualified(state.score),
        interests: state.interests.clone(),
        next_questions: follow_up::next_questions(state.score)
            .iter()
            .map(|q| q.to_string())
            .collect(),
    }
}

/// Actions for the response; a failed LLM call always yields `contact_agent` only.
pub fn response_actions(
    state: &LeadState,
    signals: &[LeadSignal],
    llm_failed: bool,
) -> Vec<SuggestedAction> {
    if llm_failed {
        vec![SuggestedAction::ContactAgent]
    } else {
        follow_up::suggested_actions(state.score, signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(score: i32) -> LeadState {
        LeadState {
            score,
            ..Default::default()
        }
    }

    #[test]
    fn test_scores_user_message_not_ai_response() {
        let outcome = apply_turn(
            &state(0),
            "Hello there",
            "Would you like to schedule a viewing? What's your budget?",
            true,
            Utc::now(),
        );
        assert_eq!(outcome.state.score, 0);
        assert!(outcome.signals.is_empty());
    }

    #[test]
    fn test_turn_records_score_change_and_extracted_data() {
        let outcome = apply_turn(
            &state(10),
            "Our budget is $450,000 and we need a big kitchen",
            "Happy to help",
            true,
            Utc::now(),
        );

        let updates = &outcome.turn.qualification_updates;
        assert_eq!(updates.previous_score, 10);
        assert_eq!(updates.new_score, 25);
        assert_eq!(updates.new_interests, vec!["kitchen".to_string()]);
        assert_eq!(updates.extracted.budget_range.unwrap().min, 450_000);
        assert_eq!(outcome.turn.lead_signals, vec![LeadSignal::BudgetDiscussion]);
    }

    #[test]
    fn test_interests_only_grow() {
        let mut current = LeadState::default();
        for message in ["I love the pool", "Is there a garage?", "The pool again"] {
            let before = current.interests.clone();
            current = apply_turn(&current, message, "ok", true, Utc::now()).state;
            assert!(before.iter().all(|i| current.interests.contains(i)));
        }
        assert_eq!(current.interests, vec!["pool".to_string(), "garage".to_string()]);
    }

    #[test]
    fn test_notification_fires_once_when_crossing_threshold() {
        let first = apply_turn(
            &state(55),
            "Can we tour it? We are pre-approved",
            "Sure",
            true,
            Utc::now(),
        );
        assert_eq!(first.state.score, 85);
        assert!(first.notify);
        assert!(first.state.notified);

        let second = apply_turn(&first.state, "Can we tour it tomorrow?", "Sure", true, Utc::now());
        assert!(!second.notify);
        assert!(second.state.notified);
    }

    #[test]
    fn test_no_notification_without_endpoint() {
        let outcome = apply_turn(&state(65), "We want a showing", "Sure", false, Utc::now());
        assert!(outcome.state.score >= QUALIFIED_THRESHOLD);
        assert!(!outcome.notify);
        assert!(!outcome.state.notified);
    }

    #[test]
    fn test_llm_failure_forces_contact_agent() {
        let s = state(80);
        assert_eq!(
            response_actions(&s, &[LeadSignal::Urgency], true),
            vec![SuggestedAction::ContactAgent]
        );
        assert_eq!(response_actions(&s, &[], false).len(), 3);
    }

    #[test]
    fn test_lead_qualification_block() {
        let q = lead_qualification(&state(70));
        assert!(q.is_qualified);
        assert_eq!(q.next_questions.len(), 3);

        let q = lead_qualification(&state(69));
        assert!(!q.is_qualified);
    }
}
