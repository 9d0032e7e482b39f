use serde::{Deserialize, Serialize};

/// The identity of a logged-in user as returned by the API.
#[derive(Default, Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

/// The body returned by both `/auth/login` and `/auth/signup`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// The body sent to `/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub(crate) email: &'a str,
    pub(crate) password: &'a str,
}

/// The body sent to `/auth/signup`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SignupRequest<'a> {
    pub(crate) name: &'a str,
    pub(crate) email: &'a str,
    pub(crate) password: &'a str,
}

#[test]
fn test_user_accepts_underscore_id() {
    let json = r#"{"_id":"65f0c1","name":"Asha","email":"asha@example.com"}"#;
    let user: User = serde_json::from_str(json).unwrap();
    assert_eq!(user.id, "65f0c1");

    let out = serde_json::to_string(&user).unwrap();
    assert!(out.contains("\"id\":\"65f0c1\""));
}
