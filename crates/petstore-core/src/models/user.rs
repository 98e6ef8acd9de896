//! User account records and login results.

use serde::{Deserialize, Serialize};

/// Active account status used for every sign-up.
pub const USER_STATUS_ACTIVE: i32 = 1;

/// Account record sent to `POST user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub user_status: i32,
}

impl NewUser {
    /// Build a record from a sign-up request, stamping the id with the current epoch millis.
    pub fn from_signup(request: &SignupRequest) -> Self {
        Self {
            id: chrono::Utc::now().timestamp_millis(),
            username: request.username.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            email: request.email.clone(),
            password: request.password.clone(),
            phone: request.phone.clone(),
            user_status: USER_STATUS_ACTIVE,
        }
    }
}

/// Everything a user enters on the sign-up form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Result of `GET user/login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    /// Body text of the response, used as the bearer token.
    pub token: String,
    /// `X-Rate-Limit` header, if sent.
    pub rate_limit: Option<String>,
    /// `X-Expires-After` header, if sent.
    pub expires_after: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_wire_format() {
        let request = SignupRequest {
            username: "jdoe".into(),
            password: "pw".into(),
            email: "j@example.com".into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            phone: "555".into(),
        };
        let user = NewUser::from_signup(&request);
        assert!(user.id > 0);

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["firstName"], "Jane");
        assert_eq!(value["lastName"], "Doe");
        assert_eq!(value["userStatus"], 1);
        assert_eq!(value["username"], "jdoe");
    }
}
