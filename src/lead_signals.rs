/// Lead signal extraction for property chat messages
///
/// Everything here is a pure function over the visitor's raw message:
/// 1. Detect buyer-intent signals (budget, timeline, financing, ...)
/// 2. Detect property/location interests (kitchen, schools, commute, ...)
/// 3. Pull a budget range and move timeline out of free text
/// 4. Fold detected signals into the running qualification score
///
/// Matching is plain substring containment on the lower-cased message. There is
/// no stemming and no word-boundary check, so "parking" also counts as `parks`.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound of the qualification score.
pub const MAX_SCORE: i32 = 100;

/// Buyer-intent tags detected in a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSignal {
    BudgetDiscussion,
    TimelineInterest,
    FinancingDiscussion,
    ViewingInterest,
    FamilySituation,
    Urgency,
}

/// Signal vocabulary in check order, with the substrings that trigger each tag.
const SIGNAL_KEYWORDS: &[(LeadSignal, &[&str])] = &[
    (
        LeadSignal::BudgetDiscussion,
        &["budget", "afford", "price range", "how much", "cost"],
    ),
    (
        LeadSignal::TimelineInterest,
        &[
            "timeline",
            "move in",
            "moving",
            "how soon",
            "when can",
            "closing date",
        ],
    ),
    (
        LeadSignal::FinancingDiscussion,
        &[
            "mortgage",
            "financing",
            "loan",
            "pre-approved",
            "preapproved",
            "down payment",
            "interest rate",
        ],
    ),
    (
        LeadSignal::ViewingInterest,
        &[
            "viewing",
            "showing",
            "tour",
            "visit",
            "open house",
            "see the property",
            "see it in person",
        ],
    ),
    (
        LeadSignal::FamilySituation,
        &["family", "kids", "children", "spouse", "wife", "husband"],
    ),
    (
        LeadSignal::Urgency,
        &[
            "urgent",
            "asap",
            "immediately",
            "right away",
            "as soon as possible",
            "quickly",
        ],
    ),
];

impl LeadSignal {
    /// All signals in check order.
    pub const ALL: [LeadSignal; 6] = [
        LeadSignal::BudgetDiscussion,
        LeadSignal::TimelineInterest,
        LeadSignal::FinancingDiscussion,
        LeadSignal::ViewingInterest,
        LeadSignal::FamilySituation,
        LeadSignal::Urgency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSignal::BudgetDiscussion => "budget_discussion",
            LeadSignal::TimelineInterest => "timeline_interest",
            LeadSignal::FinancingDiscussion => "financing_discussion",
            LeadSignal::ViewingInterest => "viewing_interest",
            LeadSignal::FamilySituation => "family_situation",
            LeadSignal::Urgency => "urgency",
        }
    }

    /// Points added to the qualification score when this signal is detected.
    pub fn score_increment(&self) -> i32 {
        match self {
            LeadSignal::BudgetDiscussion => 15,
            LeadSignal::TimelineInterest => 12,
            LeadSignal::FinancingDiscussion => 10,
            LeadSignal::ViewingInterest => 20,
            LeadSignal::FamilySituation => 8,
            LeadSignal::Urgency => 15,
        }
    }

    /// Trigger substrings for this signal.
    pub fn keywords(&self) -> &'static [&'static str] {
        lookup(SIGNAL_KEYWORDS, *self)
    }
}

impl fmt::Display for LeadSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Property and neighborhood features a visitor mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interest {
    Kitchen,
    Bathrooms,
    Bedrooms,
    Garage,
    OutdoorSpace,
    Basement,
    Pool,
    Schools,
    Commute,
    Shopping,
    Dining,
    Parks,
    Transportation,
}

const INTEREST_KEYWORDS: &[(Interest, &[&str])] = &[
    (Interest::Kitchen, &["kitchen", "appliances", "cooking"]),
    (Interest::Bathrooms, &["bathroom", "bath"]),
    (Interest::Bedrooms, &["bedroom"]),
    (Interest::Garage, &["garage", "parking"]),
    (
        Interest::OutdoorSpace,
        &["yard", "garden", "patio", "deck", "outdoor"],
    ),
    (Interest::Basement, &["basement"]),
    (Interest::Pool, &["pool"]),
    (Interest::Schools, &["school"]),
    (Interest::Commute, &["commute", "drive to work", "traffic"]),
    (Interest::Shopping, &["shopping", "mall", "stores"]),
    (Interest::Dining, &["restaurant", "dining"]),
    (Interest::Parks, &["park"]),
    (
        Interest::Transportation,
        &["transit", "bus", "train", "subway", "transportation"],
    ),
];

impl Interest {
    pub const ALL: [Interest; 13] = [
        Interest::Kitchen,
        Interest::Bathrooms,
        Interest::Bedrooms,
        Interest::Garage,
        Interest::OutdoorSpace,
        Interest::Basement,
        Interest::Pool,
        Interest::Schools,
        Interest::Commute,
        Interest::Shopping,
        Interest::Dining,
        Interest::Parks,
        Interest::Transportation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interest::Kitchen => "kitchen",
            Interest::Bathrooms => "bathrooms",
            Interest::Bedrooms => "bedrooms",
            Interest::Garage => "garage",
            Interest::OutdoorSpace => "outdoor_space",
            Interest::Basement => "basement",
            Interest::Pool => "pool",
            Interest::Schools => "schools",
            Interest::Commute => "commute",
            Interest::Shopping => "shopping",
            Interest::Dining => "dining",
            Interest::Parks => "parks",
            Interest::Transportation => "transportation",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        lookup(INTEREST_KEYWORDS, *self)
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn lookup<T: PartialEq + Copy>(
    table: &'static [(T, &'static [&'static str])],
    tag: T,
) -> &'static [&'static str] {
    table
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, keywords)| *keywords)
        .unwrap_or(&[])
}

/// Collects every tag of `table` with at least one trigger contained in `message`.
fn match_vocabulary<T: Copy>(table: &[(T, &[&str])], message: &str) -> Vec<T> {
    let lowered = message.to_lowercase();
    table
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(tag, _)| *tag)
        .collect()
}

/// Detects buyer-intent signals in a message, in vocabulary order.
pub fn analyze_lead_signals(message: &str) -> Vec<LeadSignal> {
    match_vocabulary(SIGNAL_KEYWORDS, message)
}

/// Detects property/location interests in a message, in vocabulary order.
pub fn extract_interests(message: &str) -> Vec<Interest> {
    match_vocabulary(INTEREST_KEYWORDS, message)
}

/// Budget range mentioned by the visitor, in whole dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: u64,
    pub max: Option<u64>,
}

/// Best-effort qualification details pulled from one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_range: Option<BudgetRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline_months: Option<u32>,
}

impl QualificationData {
    pub fn is_empty(&self) -> bool {
        self.budget_range.is_none() && self.timeline_months.is_none()
    }
}

// `$300,000` optionally followed, across non-dollar non-digit text, by a second `$350,000`
static BUDGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(\d[\d,]*)(?:[^$\d]*\$(\d[\d,]*))?").expect("valid budget regex")
});

static TIMELINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*months?").expect("valid timeline regex"));

fn parse_dollars(raw: &str) -> Option<u64> {
    raw.replace(',', "").parse().ok()
}

/// Extracts a budget range and move timeline from a message.
///
/// Both extractions are independent and may both come back empty.
pub fn extract_qualification_data(message: &str) -> QualificationData {
    let mut data = QualificationData::default();

    if let Some(caps) = BUDGET_RE.captures(message) {
        if let Some(min) = caps.get(1).and_then(|m| parse_dollars(m.as_str())) {
            let max = caps.get(2).and_then(|m| parse_dollars(m.as_str()));
            data.budget_range = Some(BudgetRange { min, max });
        }
    }

    let lowered = message.to_lowercase();
    if lowered.contains("month") {
        data.timeline_months = TIMELINE_RE
            .captures(&lowered)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok());
    }

    data
}

/// Adds the increment of each distinct signal to `current_score` and clamps to `[0, 100]`.
///
/// Nothing is remembered between calls: a signal detected again on a later turn
/// adds its increment again.
pub fn calculate_lead_score(current_score: i32, signals: &[LeadSignal]) -> i32 {
    let added: i32 = LeadSignal::ALL
        .iter()
        .filter(|signal| signals.contains(signal))
        .map(LeadSignal::score_increment)
        .sum();

    current_score.saturating_add(added).clamp(0, MAX_SCORE)
}
