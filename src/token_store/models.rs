//! The OAuth credential record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// OAuth access/refresh token pair plus metadata, singleton per deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime in seconds, counted from `created`.
    pub expires_in: i64,
    pub scope: String,
    pub token_type: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

impl AuthToken {
    pub fn expired(&self) -> bool {
        Utc::now() > self.created + Duration::seconds(self.expires_in)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_created_secs_ago(secs: i64, expires_in: i64) -> AuthToken {
        AuthToken {
            access_token: "access_token_test".to_string(),
            refresh_token: "refresh_token_test".to_string(),
            expires_in,
            scope: "user-read-private user-read-email".to_string(),
            token_type: "Bearer".to_string(),
            created: Utc::now() - Duration::seconds(secs),
        }
    }

    #[test]
    fn not_expired_one_second_before_the_deadline() {
        assert!(!token_created_secs_ago(3599, 3600).expired());
    }

    #[test]
    fn expired_one_second_after_the_deadline() {
        assert!(token_created_secs_ago(3601, 3600).expired());
    }

    #[test]
    fn fresh_token_is_not_expired() {
        assert!(!token_created_secs_ago(0, 3600).expired());
    }
}
