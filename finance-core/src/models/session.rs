use chrono::{DateTime, Utc};

/// Identity of the acting user, passed explicitly to every operation that
/// needs one. Obtained from [`crate::services::login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    username: String,
    started_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn start(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            started_at: Utc::now(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
