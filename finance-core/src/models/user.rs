use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account. Secrets are stored only as salted hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub security_question: String,
    pub answer_hash: String,
    pub created_at: DateTime<Utc>,
}

/// For creating new users (no timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub security_question: String,
    pub answer_hash: String,
}

impl NewUser {
    pub fn into_user(
        self,
        created_at: DateTime<Utc>,
    ) -> User {
        User {
            username: self.username,
            password_hash: self.password_hash,
            security_question: self.security_question,
            answer_hash: self.answer_hash,
            created_at,
        }
    }
}
