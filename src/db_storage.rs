use crate::errors::AppError;
use crate::models::{ChatSession, ChatSessionSummary, ConversationTurn, PropertyContext};
use crate::visitor::VisitorInfo;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

const SESSION_COLUMNS: &str = "id, property_id, visitor_key, visitor_info, lead_qualification_score, \
     identified_interests, conversation_history, lead_notified, created_at, updated_at";

const SUMMARY_COLUMNS: &str = "cs.id, cs.property_id, cs.lead_qualification_score, \
     cs.identified_interests, cs.lead_notified, \
     COALESCE(jsonb_array_length(cs.conversation_history), 0)::int4 AS turn_count, \
     cs.created_at, cs.updated_at";

/// Read access to listed properties and their agent profile.
pub struct PropertyStorage {
    pool: PgPool,
}

impl PropertyStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads a property joined with the listing agent's contact and brand fields.
    pub async fn find_property_context(
        &self,
        property_id: Uuid,
    ) -> Result<Option<PropertyContext>, AppError> {
        let property = sqlx::query_as::<_, PropertyContext>(
            r#"
            SELECT p.id, p.agent_id, p.title, p.address, p.city, p.state, p.zip_code,
                   p.price, p.bedrooms, p.bathrooms, p.square_feet, p.property_type,
                   p.description, p.features,
                   a.full_name AS agent_name, a.email AS agent_email, a.phone AS agent_phone,
                   a.brokerage_name, a.brand_tagline
            FROM properties p
            LEFT JOIN profiles a ON a.id = p.agent_id
            WHERE p.id = $1
            "#,
        )
        .bind(property_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(property)
    }

    pub async fn count_agent_properties(&self, agent_id: Uuid) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM properties WHERE agent_id = $1")
                .bind(agent_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

/// Persistence for `chat_sessions` rows.
///
/// Updates are plain read-modify-write with no version check; two racing turns
/// on one session can overwrite each other's score and history.
pub struct ChatSessionStorage {
    pool: PgPool,
}

impl ChatSessionStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_session(&self, session_id: Uuid) -> Result<Option<ChatSession>, AppError> {
        let session = sqlx::query_as::<_, ChatSession>(&format!(
            "SELECT {} FROM chat_sessions WHERE id = $1",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Most recently active session of a returning visitor for one property.
    pub async fn find_visitor_session(
        &self,
        property_id: Uuid,
        visitor_key: &str,
    ) -> Result<Option<ChatSession>, AppError> {
        let session = sqlx::query_as::<_, ChatSession>(&format!(
            "SELECT {} FROM chat_sessions \
             WHERE property_id = $1 AND visitor_key = $2 \
             ORDER BY updated_at DESC NULLS LAST, created_at DESC \
             LIMIT 1",
            SESSION_COLUMNS
        ))
        .bind(property_id)
        .bind(visitor_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn create_session(
        &self,
        property_id: Uuid,
        visitor_key: Option<&str>,
        visitor_info: Option<&VisitorInfo>,
    ) -> Result<ChatSession, AppError> {
        let session = sqlx::query_as::<_, ChatSession>(&format!(
            r#"
            INSERT INTO chat_sessions (
                id, property_id, visitor_key, visitor_info, lead_qualification_score,
                identified_interests, conversation_history, lead_notified, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, 0, '{{}}', '[]'::jsonb, false, now(), now())
            RETURNING {}
            "#,
            SESSION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(property_id)
        .bind(visitor_key)
        .bind(visitor_info.map(Json))
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            "Created chat session {} for property {}",
            session.id,
            property_id
        );
        Ok(session)
    }

    /// Writes the session's lead state and history after a turn.
    pub async fn update_session(
        &self,
        session_id: Uuid,
        score: i32,
        interests: &[String],
        history: &[ConversationTurn],
        lead_notified: bool,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE chat_sessions
            SET lead_qualification_score = $2,
                identified_interests = $3,
                conversation_history = $4,
                lead_notified = $5,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .bind(score)
        .bind(interests)
        .bind(Json(history))
        .bind(lead_notified)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!("No chat session found to update: {}", session_id);
        }

        Ok(())
    }

    /// Fills in visitor details on a session that was started anonymously.
    pub async fn attach_visitor(
        &self,
        session_id: Uuid,
        visitor_key: Option<&str>,
        visitor_info: &VisitorInfo,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE chat_sessions
            SET visitor_info = $2,
                visitor_key = COALESCE(visitor_key, $3)
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .bind(Json(visitor_info))
        .bind(visitor_key)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_property_sessions(
        &self,
        property_id: Uuid,
    ) -> Result<Vec<ChatSessionSummary>, AppError> {
        let sessions = sqlx::query_as::<_, ChatSessionSummary>(&format!(
            "SELECT {} FROM chat_sessions cs \
             WHERE cs.property_id = $1 \
             ORDER BY cs.lead_qualification_score DESC, cs.updated_at DESC NULLS LAST",
            SUMMARY_COLUMNS
        ))
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    pub async fn list_agent_sessions(
        &self,
        agent_id: Uuid,
    ) -> Result<Vec<ChatSessionSummary>, AppError> {
        let sessions = sqlx::query_as::<_, ChatSessionSummary>(&format!(
            "SELECT {} FROM chat_sessions cs \
             JOIN properties p ON p.id = cs.property_id \
             WHERE p.agent_id = $1",
            SUMMARY_COLUMNS
        ))
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Returns whether a row was deleted.
    pub async fn delete_session(&self, session_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
