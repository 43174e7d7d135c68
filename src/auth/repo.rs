use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::auth::policy::Role;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub role: Role,
    pub created_at: OffsetDateTime,
}

/// Append-only login history entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Login {
    pub id: i64,
    pub user_id: i64,
    pub login_time: OffsetDateTime,
}

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, role, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}

impl Login {
    /// Record a successful authentication. There is no update or delete path
    /// for these rows.
    pub async fn record(db: &PgPool, user_id: i64) -> anyhow::Result<Login> {
        let login = sqlx::query_as::<_, Login>(
            r#"
            INSERT INTO logins (user_id)
            VALUES ($1)
            RETURNING id, user_id, login_time
            "#,
        )
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_json_never_contains_the_password_hash() {
        let user = User {
            id: 8,
            name: "Juan".into(),
            email: "juan8@example.com".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            role: Role::Usuario,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("juan8@example.com"));
        assert!(json.contains("\"usuario\""));
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password_hash"));
    }
}
