use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Google,
    Line,
    Apple,
    Facebook,
    Email,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Google => "google",
            AuthProvider::Line => "line",
            AuthProvider::Apple => "apple",
            AuthProvider::Facebook => "facebook",
            AuthProvider::Email => "email",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub is_vip: bool,
    pub role: Role,
    pub provider: AuthProvider,
    #[serde(default)]
    pub balance: f64,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_wire_format() {
        let user = User {
            id: "admin_001".into(),
            name: "Gold Master Owner".into(),
            email: "admin@goldmaster.com".into(),
            avatar: None,
            is_vip: true,
            role: Role::Admin,
            provider: AuthProvider::Email,
            balance: 1_000_000.0,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "admin");
        assert_eq!(json["provider"], "email");
        assert_eq!(json["isVip"], true);
        assert!(json.get("avatar").is_none());
        assert!(user.is_admin());
    }
}
