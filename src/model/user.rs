use serde::{Deserialize, Serialize};

/// 用户记录；密码哈希不参与序列化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub points: i64,
    pub is_admin: bool,
}

/// 对外展示的用户信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub points: i64,
    pub is_admin: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            points: user.points,
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CreateUserOutcome {
    Created(User),
    UsernameTaken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            points: 3,
            is_admin: false,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("password"));
        assert_eq!(UserProfile::from(&user).points, 3);
    }
}
