use crate::model::Role;

/// Severity shown as a prefix on each audit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    Info,
    Failure,
}

impl AuditLevel {
    fn prefix(self) -> &'static str {
        match self {
            AuditLevel::Info => "[info]",
            AuditLevel::Failure => "[failure]",
        }
    }
}

/// Posts operator-facing lines to a webhook channel.
///
/// Delivery is fire-and-forget: each post runs on its own task and a failure
/// only produces a `warn!`.
#[derive(Clone)]
pub struct WebhookAudit {
    http: reqwest::Client,
    url: String,
}

impl WebhookAudit {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn post(&self, level: AuditLevel, line: String) {
        let http = self.http.clone();
        let url = self.url.clone();
        let content = format!("{} {}", level.prefix(), line);
        tokio::spawn(async move {
            let sent = http
                .post(&url)
                .json(&serde_json::json!({ "content": content }))
                .send()
                .await
                .and_then(|r| r.error_for_status());
            if let Err(e) = sent {
                tracing::warn!("audit webhook delivery failed: {}", e);
            }
        });
    }

    pub fn grants(&self, discord_id: &str, gained: &[Role]) {
        self.post(AuditLevel::Info, grant_line(discord_id, gained));
    }

    pub fn failure(&self, token: &str, error: &dyn std::fmt::Display) {
        self.post(AuditLevel::Failure, failure_line(token, error));
    }
}

pub fn grant_line(discord_id: &str, gained: &[Role]) -> String {
    if gained.is_empty() {
        format!(
            "user with ID {} had a successful request but gained no roles",
            discord_id
        )
    } else {
        let labels: Vec<&str> = gained.iter().map(|r| r.label()).collect();
        format!(
            "user with ID {} gained the following roles: {}",
            discord_id,
            labels.join(", ")
        )
    }
}

pub fn failure_line(token: &str, error: &dyn std::fmt::Display) -> String {
    format!("error with a user\n\ntoken: {}\n\n{}", token, error)
}
