//! Identities handed to the catalog by the authentication provider, and the
//! capabilities they carry.

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Catalog entity a capability applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Entity {
    Author,
    Genre,
    Book,
    Bookshelf,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Author => "author",
            Entity::Genre => "genre",
            Entity::Book => "book",
            Entity::Bookshelf => "bookshelf",
        }
    }
}

/// Operation a capability allows
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    Add,
    Change,
    Delete,
    View,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Change => "change",
            Action::Delete => "delete",
            Action::View => "view",
        }
    }
}

/// An (entity, action) pair, written as a codename such as `add_book`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Capability {
    pub entity: Entity,
    pub action: Action,
}

impl Capability {
    pub const fn new(entity: Entity, action: Action) -> Self {
        Self { entity, action }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.action.as_str(), self.entity.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (action, entity) = s
            .split_once('_')
            .ok_or_else(|| format!("Invalid capability: {}", s))?;
        let action = match action {
            "add" => Action::Add,
            "change" => Action::Change,
            "delete" => Action::Delete,
            "view" => Action::View,
            _ => return Err(format!("Invalid capability action: {}", s)),
        };
        let entity = match entity {
            "author" => Entity::Author,
            "genre" => Entity::Genre,
            "book" => Entity::Book,
            "bookshelf" => Entity::Bookshelf,
            _ => return Err(format!("Invalid capability entity: {}", s)),
        };
        Ok(Self { entity, action })
    }
}

impl TryFrom<String> for Capability {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Capability> for String {
    fn from(cap: Capability) -> Self {
        cap.to_string()
    }
}

/// JWT claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub username: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub permissions: BTreeSet<Capability>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Claims valid for `ttl_hours` from now
    pub fn new(
        user_id: i32,
        username: &str,
        groups: Vec<String>,
        permissions: impl IntoIterator<Item = Capability>,
        ttl_hours: i64,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: username.to_string(),
            user_id,
            username: username.to_string(),
            groups,
            permissions: permissions.into_iter().collect(),
            exp: now + ttl_hours * 3600,
            iat: now,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.permissions.contains(&capability)
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.has(capability) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Missing permission {}",
                capability
            )))
        }
    }

    pub fn require_group(&self, group: &str) -> Result<(), AppError> {
        if self.in_group(group) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Membership in group {} required",
                group
            )))
        }
    }
}

/// Local mirror of an external user account; owns the bookshelf
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn capability_codenames_parse_and_print() {
        let cap: Capability = "add_book".parse().unwrap();
        assert_eq!(cap, Capability::new(Entity::Book, Action::Add));
        assert_eq!(cap.to_string(), "add_book");
        assert_eq!(
            "delete_author".parse::<Capability>().unwrap(),
            Capability::new(Entity::Author, Action::Delete)
        );
        assert!("add".parse::<Capability>().is_err());
        assert!("publish_book".parse::<Capability>().is_err());
        assert!("add_publisher".parse::<Capability>().is_err());
    }

    #[test]
    fn token_round_trip_keeps_permissions() {
        let claims = UserClaims::new(
            42,
            "reader",
            vec!["staff".to_string()],
            [Capability::new(Entity::Genre, Action::Add)],
            1,
        );
        let token = claims.create_token(SECRET).unwrap();
        let parsed = UserClaims::from_token(&token, SECRET).unwrap();

        assert_eq!(parsed.user_id, 42);
        assert!(parsed.has(Capability::new(Entity::Genre, Action::Add)));
        assert!(!parsed.has(Capability::new(Entity::Book, Action::Add)));
        assert!(parsed.in_group("staff"));
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = UserClaims::new(1, "u", vec![], [], 1).create_token(SECRET).unwrap();
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn require_reports_missing_permission() {
        let claims = UserClaims::new(1, "u", vec![], [], 1);
        let err = claims
            .require(Capability::new(Entity::Book, Action::Change))
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(msg) if msg.contains("change_book")));
    }
}
