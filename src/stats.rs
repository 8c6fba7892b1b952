use crate::follow_up::{CONTACT_THRESHOLD, QUALIFIED_THRESHOLD};
use crate::models::ChatSessionSummary;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const TOP_INTERESTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestCount {
    pub interest: String,
    pub sessions: usize,
}

/// Agent dashboard numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_properties: i64,
    pub total_sessions: usize,
    pub qualified_leads: usize,
    pub warm_leads: usize,
    pub notified_leads: usize,
    pub average_score: f64,
    pub top_interests: Vec<InterestCount>,
}

pub fn aggregate_dashboard_stats(
    total_properties: i64,
    sessions: &[ChatSessionSummary],
) -> DashboardStats {
    let qualified_leads = sessions
        .iter()
        .filter(|s| s.lead_qualification_score >= QUALIFIED_THRESHOLD)
        .count();
    let warm_leads = sessions
        .iter()
        .filter(|s| {
            (CONTACT_THRESHOLD..QUALIFIED_THRESHOLD).contains(&s.lead_qualification_score)
        })
        .count();
    let notified_leads = sessions.iter().filter(|s| s.lead_notified).count();

    let average_score = if sessions.is_empty() {
        0.0
    } else {
        let total: i64 = sessions
            .iter()
            .map(|s| i64::from(s.lead_qualification_score))
            .sum();
        let avg = total as f64 / sessions.len() as f64;
        (avg * 10.0).round() / 10.0
    };

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for session in sessions {
        for interest in &session.identified_interests {
            *counts.entry(interest.as_str()).or_default() += 1;
        }
    }
    let mut top_interests: Vec<InterestCount> = counts
        .into_iter()
        .map(|(interest, sessions)| InterestCount {
            interest: interest.to_string(),
            sessions,
        })
        .collect();
    top_interests.sort_by(|a, b| {
        b.sessions
            .cmp(&a.sessions)
            .then_with(|| a.interest.cmp(&b.interest))
    });
    top_interests.truncate(TOP_INTERESTS);

    DashboardStats {
        total_properties,
        total_sessions: sessions.len(),
        qualified_leads,
        warm_leads,
        notified_leads,
        average_score,
        top_interests,
    }
}
