use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Payload posted when a chat visitor becomes a qualified lead.
#[derive(Debug, Clone, Serialize)]
pub struct LeadNotification {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub session_id: Uuid,
    pub property_id: Uuid,
    pub agent_id: Uuid,
    pub property_title: String,
    pub score: i32,
    pub interests: Vec<String>,
    pub visitor_info: Option<crate::visitor::VisitorInfo>,
    pub notified_at: DateTime<Utc>,
}

impl LeadNotification {
    pub const KIND: &'static str = "lead_qualified";
}

/// Client for the lead notification webhook.
#[derive(Clone)]
pub struct LeadNotifier {
    client: reqwest::Client,
    url: String,
}

impl LeadNotifier {
    pub fn new(url: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create notification client: {}", e))
            })?;

        Ok(Self { client, url })
    }

    /// Posts the notification once.
    pub async fn send(&self, notification: &LeadNotification) -> Result<(), AppError> {
        tracing::info!(
            "Sending lead notification for session {} (score {})",
            notification.session_id,
            notification.score
        );

        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApiError(format!("Lead notification request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Lead notification returned {}: {}",
                status, error_text
            )));
        }

        tracing::info!(
            "Lead notification delivered for session {}",
            notification.session_id
        );
        Ok(())
    }

    /// Fire-and-forget delivery: failures are logged, never retried.
    pub fn spawn_send(&self, notification: LeadNotification) {
        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&notification).await {
                tracing::error!(
                    "Failed to notify agent about session {}: {}",
                    notification.session_id,
                    e
                );
            }
        });
    }
}
