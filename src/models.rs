use crate::follow_up::SuggestedAction;
use crate::lead_signals::{LeadSignal, QualificationData};
use crate::visitor::VisitorInfo;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// ============ Database Models ============

/// A listed property joined with the listing agent's profile and brand.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PropertyContext {
    /// Unique identifier for the property.
    pub id: Uuid,
    /// Owning agent (profiles.id).
    pub agent_id: Uuid,
    pub title: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    /// Asking price in dollars.
    pub price: Option<BigDecimal>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<BigDecimal>,
    pub square_feet: Option<i32>,
    /// e.g. "single_family", "condo".
    pub property_type: Option<String>,
    pub description: Option<String>,
    /// Free-form feature list entered by the agent.
    pub features: Option<Vec<String>>,
    pub agent_name: Option<String>,
    pub agent_email: Option<String>,
    pub agent_phone: Option<String>,
    pub brokerage_name: Option<String>,
    pub brand_tagline: Option<String>,
}

impl PropertyContext {
    /// Human-readable name used in prompts and notifications.
    pub fn display_name(&self) -> String {
        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            return title.to_string();
        }
        let parts: Vec<&str> = [
            self.address.as_deref(),
            self.city.as_deref(),
            self.state.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|p| !p.trim().is_empty())
        .collect();

        if parts.is_empty() {
            "this property".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// One visitor's conversation about one property.
#[derive(Debug, Clone, FromRow)]
pub struct ChatSession {
    pub id: Uuid,
    pub property_id: Uuid,
    /// SHA-256 fingerprint of the visitor's email or phone.
    pub visitor_key: Option<String>,
    pub visitor_info: Option<Json<VisitorInfo>>,
    pub lead_qualification_score: i32,
    pub identified_interests: Vec<String>,
    pub conversation_history: Json<Vec<ConversationTurn>>,
    pub lead_notified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One request/response exchange stored in `conversation_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub ai_response: String,
    #[serde(default)]
    pub lead_signals: Vec<LeadSignal>,
    pub qualification_updates: QualificationUpdates,
}

/// Score bookkeeping recorded alongside each turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualificationUpdates {
    pub previous_score: i32,
    pub new_score: i32,
    /// Interests first seen on this turn.
    #[serde(default)]
    pub new_interests: Vec<String>,
    #[serde(flatten)]
    pub extracted: QualificationData,
}

/// Row used for listings and dashboard aggregation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChatSessionSummary {
    pub id: Uuid,
    pub property_id: Uuid,
    pub lead_qualification_score: i32,
    pub identified_interests: Vec<String>,
    pub lead_notified: bool,
    pub turn_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

// ============ API Models ============

/// Request body for `POST /api/chat`.
///
/// `message` and `property_id` are optional here so that missing values produce
/// the handler's own 400 instead of an extractor rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub property_id: Option<String>,
    /// Kept as text: a malformed id starts a new session instead of rejecting the turn.
    pub session_id: Option<String>,
    pub visitor_info: Option<VisitorInfo>,
    /// Page context forwarded by the client (microsite section, campaign, ...).
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: Uuid,
    pub lead_qualification: LeadQualification,
    pub agent_contact: AgentContact,
    pub suggested_actions: Vec<SuggestedAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadQualification {
    pub score: i32,
    pub is_qualified: bool,
    pub interests: Vec<String>,
    pub next_questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub brokerage: Option<String>,
    pub should_show_contact: bool,
}

impl AgentContact {
    pub fn from_property(property: &PropertyContext, should_show_contact: bool) -> Self {
        Self {
            name: property.agent_name.clone(),
            email: property.agent_email.clone(),
            phone: property.agent_phone.clone(),
            brokerage: property.brokerage_name.clone(),
            should_show_contact,
        }
    }
}

/// Full session as returned by `GET /api/chat/sessions/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSessionView {
    pub id: Uuid,
    pub property_id: Uuid,
    pub visitor_info: Option<VisitorInfo>,
    pub lead_qualification_score: i32,
    pub is_qualified: bool,
    pub identified_interests: Vec<String>,
    pub conversation_history: Vec<ConversationTurn>,
    pub lead_notified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ChatSession> for ChatSessionView {
    fn from(session: ChatSession) -> Self {
        Self {
            id: session.id,
            property_id: session.property_id,
            visitor_info: session.visitor_info.map(|Json(info)| info),
            lead_qualification_score: session.lead_qualification_score,
            is_qualified: crate::follow_up::is_qualified(session.lead_qualification_score),
            identified_interests: session.identified_interests,
            conversation_history: session.conversation_history.0,
            lead_notified: session.lead_notified,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionListParams {
    pub property_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardParams {
    pub agent_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead_signals::BudgetRange;

    fn bare_property() -> PropertyContext {
        PropertyContext {
            id: Uuid::new_v4(),
            agent_id: Uuid::new_v4(),
            title: None,
            address: Some("12 Elm St".to_string()),
            city: Some("Springfield".to_string()),
            state: None,
            zip_code: None,
            price: None,
            bedrooms: None,
            bathrooms: None,
            square_feet: None,
            property_type: None,
            description: None,
            features: None,
            agent_name: None,
            agent_email: None,
            agent_phone: None,
            brokerage_name: None,
            brand_tagline: None,
        }
    }

    #[test]
    fn test_display_name_prefers_title() {
        let mut property = bare_property();
        assert_eq!(property.display_name(), "12 Elm St, Springfield");

        property.title = Some("Sunny Craftsman".to_string());
        assert_eq!(property.display_name(), "Sunny Craftsman");

        property.title = Some("  ".to_string());
        property.address = None;
        property.city = None;
        assert_eq!(property.display_name(), "this property");
    }

    #[test]
    fn test_turn_flattens_extracted_data() {
        let turn = ConversationTurn {
            timestamp: Utc::now(),
            user_message: "Budget is $400,000".to_string(),
            ai_response: "Great".to_string(),
            lead_signals: vec![LeadSignal::BudgetDiscussion],
            qualification_updates: QualificationUpdates {
                previous_score: 0,
                new_score: 15,
                new_interests: vec![],
                extracted: QualificationData {
                    budget_range: Some(BudgetRange {
                        min: 400_000,
                        max: None,
                    }),
                    timeline_months: None,
                },
            },
        };

        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["lead_signals"][0], "budget_discussion");
        assert_eq!(json["qualification_updates"]["budget_range"]["min"], 400_000);
        assert!(json["qualification_updates"].get("timeline_months").is_none());

        let back: ConversationTurn = serde_json::from_value(json).unwrap();
        assert_eq!(back, turn);
    }

    #[test]
    fn test_chat_request_tolerates_missing_fields() {
        let req: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(req.message.as_deref(), Some("hi"));
        assert!(req.property_id.is_none());
        assert!(req.session_id.is_none());
    }
}
