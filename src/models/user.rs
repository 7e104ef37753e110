use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Local user record, keyed by the identity provider email
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub display_name: Option<String>,
    pub email: String,
    pub age: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub onboarding_completed: bool,
}

/// User payload returned by the auth endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub display_name: Option<String>,
    pub email: String,
    pub role: String,
    pub is_new_user: bool,
    pub onboarding_completed: bool,
}

impl UserPayload {
    pub fn new(user: &User, is_admin: bool, is_new_user: bool) -> Self {
        Self {
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            role: if is_admin { "admin" } else { "user" }.to_string(),
            is_new_user,
            onboarding_completed: user.onboarding_completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: 1,
            display_name: Some("Test User".to_string()),
            email: "test@example.com".to_string(),
            age: None,
            created_at: Utc::now(),
            onboarding_completed: false,
        }
    }

    #[test]
    fn test_payload_field_names() {
        let payload = UserPayload::new(&test_user(), false, true);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["displayName"], "Test User");
        assert_eq!(json["email"], "test@example.com");
        assert_eq!(json["role"], "user");
        assert_eq!(json["isNewUser"], true);
        assert_eq!(json["onboardingCompleted"], false);
    }

    #[test]
    fn test_payload_admin_role() {
        let payload = UserPayload::new(&test_user(), true, false);
        assert_eq!(payload.role, "admin");
    }
}
