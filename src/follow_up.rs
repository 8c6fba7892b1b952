use crate::lead_signals::LeadSignal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Score at which the agent contact card is shown to the visitor.
pub const CONTACT_THRESHOLD: i32 = 50;
/// Score at which a visitor counts as a qualified lead.
pub const QUALIFIED_THRESHOLD: i32 = 70;

/// Next step the UI can offer the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    ScheduleViewing,
    ContactAgent,
    PriorityFollowUp,
    ImmediateResponse,
}

impl SuggestedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestedAction::ScheduleViewing => "schedule_viewing",
            SuggestedAction::ContactAgent => "contact_agent",
            SuggestedAction::PriorityFollowUp => "priority_follow_up",
            SuggestedAction::ImmediateResponse => "immediate_response",
        }
    }
}

impl fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A score band: applies when the score is below `below`, or always when `None`.
struct QuestionBand {
    below: Option<i32>,
    questions: &'static [&'static str],
}

// Evaluated top-down, first match wins.
const QUESTION_BANDS: &[QuestionBand] = &[
    QuestionBand {
        below: Some(30),
        questions: &[
            "What price range are you considering for your next home?",
            "When are you hoping to move?",
            "What features are most important to you in a home?",
        ],
    },
    QuestionBand {
        below: Some(60),
        questions: &[
            "Have you been pre-approved for a mortgage yet?",
            "Would you like to schedule a viewing of this property?",
            "How many bedrooms and bathrooms do you need?",
        ],
    },
    QuestionBand {
        below: None,
        questions: &[
            "Would you like me to connect you directly with the listing agent?",
            "What days and times work best for a private showing?",
            "Are you ready to talk about making an offer?",
        ],
    },
];

/// Follow-up questions for the visitor's current qualification score.
pub fn next_questions(score: i32) -> &'static [&'static str] {
    QUESTION_BANDS
        .iter()
        .find(|band| band.below.map_or(true, |limit| score < limit))
        .map(|band| band.questions)
        .unwrap_or(&[])
}

struct ActionRule {
    action: SuggestedAction,
    applies: fn(i32, &[LeadSignal]) -> bool,
}

fn wants_viewing(score: i32, signals: &[LeadSignal]) -> bool {
    signals.contains(&LeadSignal::ViewingInterest) || score >= CONTACT_THRESHOLD
}

fn wants_contact(score: i32, _signals: &[LeadSignal]) -> bool {
    score >= CONTACT_THRESHOLD
}

fn wants_priority(score: i32, _signals: &[LeadSignal]) -> bool {
    score >= QUALIFIED_THRESHOLD
}

fn is_urgent(_score: i32, signals: &[LeadSignal]) -> bool {
    signals.contains(&LeadSignal::Urgency)
}

const ACTION_RULES: &[ActionRule] = &[
    ActionRule {
        action: SuggestedAction::ScheduleViewing,
        applies: wants_viewing,
    },
    ActionRule {
        action: SuggestedAction::ContactAgent,
        applies: wants_contact,
    },
    ActionRule {
        action: SuggestedAction::PriorityFollowUp,
        applies: wants_priority,
    },
    ActionRule {
        action: SuggestedAction::ImmediateResponse,
        applies: is_urgent,
    },
];

/// Actions to surface given the cumulative score and this turn's signals.
///
/// Rules are independent; each one that holds contributes its action.
pub fn suggested_actions(score: i32, signals: &[LeadSignal]) -> Vec<SuggestedAction> {
    ACTION_RULES
        .iter()
        .filter(|rule| (rule.applies)(score, signals))
        .map(|rule| rule.action)
        .collect()
}

pub fn is_qualified(score: i32) -> bool {
    score >= QUALIFIED_THRESHOLD
}

pub fn should_show_contact(score: i32) -> bool {
    score >= CONTACT_THRESHOLD
}
