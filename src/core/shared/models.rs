use anyhow::anyhow;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use super::schema::users;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Selectable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
}

impl User {
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(&self.password_hash, password)
    }
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Password hashing failed: {}", e))
}

pub fn verify_password(password_hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Active user by username, if any.
pub fn find_active_user(
    conn: &mut PgConnection,
    name: &str,
) -> Result<Option<User>, diesel::result::Error> {
    users::table
        .filter(users::username.eq(name))
        .filter(users::is_active.eq(true))
        .select(User::as_select())
        .first(conn)
        .optional()
}

/// Creates the user, or resets the password of an existing one.
pub fn upsert_user(conn: &mut PgConnection, name: &str, password: &str) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;
    let new_user = NewUser {
        id: Uuid::new_v4(),
        username: name.to_string(),
        password_hash,
        is_active: true,
    };

    let id = diesel::insert_into(users::table)
        .values(&new_user)
        .on_conflict(users::username)
        .do_update()
        .set((
            users::password_hash.eq(&new_user.password_hash),
            users::is_active.eq(true),
        ))
        .returning(users::id)
        .get_result(conn)?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_verifies() {
        let hash = hash_password("s3cret-branch").unwrap();
        assert!(verify_password(&hash, "s3cret-branch"));
        assert!(!verify_password(&hash, "wrong"));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("not-a-phc-string", "anything"));
    }
}
