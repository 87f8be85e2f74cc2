use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, instrument};

use crate::config::MailConfig;
use crate::errors::ServiceError;
use crate::state::AppState;

/// Health report relayed to a doctor. Sent from the official application
/// address with the user's name as display name; replies go straight back
/// to the user.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportEmail {
    pub from: String,
    pub from_name: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound mail seam. Transport is an external collaborator; this crate
/// only shapes the message.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_report(&self, report: &ReportEmail) -> anyhow::Result<()>;
}

/// Relay over an HTTP mail API (Resend-style JSON endpoint).
pub struct HttpMailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn payload(&self, report: &ReportEmail) -> Value {
        json!({
            "from": format!("{} <{}>", report.from_name, self.config.from_email),
            "to": [report.to],
            "reply_to": report.from,
            "subject": report.subject,
            "text": report.body,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_report(&self, report: &ReportEmail) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&self.payload(report))
            .send()
            .await?;
        if let Err(e) = response.error_for_status_ref() {
            error!(error = %e, to = %report.to, "mail relay rejected the message");
            return Err(e.into());
        }
        Ok(())
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/email/send", post(send))
}

#[instrument(skip(state, report))]
async fn send(
    State(state): State<AppState>,
    Json(report): Json<ReportEmail>,
) -> Result<StatusCode, ServiceError> {
    state.mailer.send_report(&report).await?;
    Ok(StatusCode::ACCEPTED)
}
