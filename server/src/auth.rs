use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use password_hash::SaltString;
use rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use crate::entity::app_user;

#[derive(Debug)]
pub enum AuthError {
    NotFound,
    InvalidPassword,
    Inactive,
    AlreadyExists,
    Db(sea_orm::DbErr),
    Hash(String),
}

impl AuthError {
    /// True for failures that mean "bad credentials" rather than a broken store.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::NotFound | AuthError::InvalidPassword | AuthError::Inactive
        )
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::NotFound => write!(f, "User not found"),
            AuthError::InvalidPassword => write!(f, "Invalid password"),
            AuthError::Inactive => write!(f, "User is inactive"),
            AuthError::AlreadyExists => write!(f, "Already Registered"),
            AuthError::Db(e) => write!(f, "Database error: {e}"),
            AuthError::Hash(e) => write!(f, "Hash error: {e}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Registration fields for a new account.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
}

pub struct Auth {
    db: DatabaseConnection,
}

impl Auth {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Expose the underlying DB connection for direct SeaORM queries.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Verify username/password and stamp `last_login_at` on success.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<app_user::Model, AuthError> {
        let user = self
            .find_by_username(username)
            .await
            .map_err(AuthError::Db)?
            .ok_or(AuthError::NotFound)?;

        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        let hash =
            PasswordHash::new(&user.password_hash).map_err(|e| AuthError::Hash(e.to_string()))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .map_err(|_| AuthError::InvalidPassword)?;

        let mut active: app_user::ActiveModel = user.into();
        active.last_login_at = Set(Some(Utc::now().naive_utc()));
        active.update(&self.db).await.map_err(AuthError::Db)
    }

    /// Create an account. An existing username yields `AlreadyExists` and
    /// leaves the store untouched.
    pub async fn register(&self, new_user: NewUser<'_>) -> Result<app_user::Model, AuthError> {
        if self
            .find_by_username(new_user.username)
            .await
            .map_err(AuthError::Db)?
            .is_some()
        {
            tracing::debug!(username = %new_user.username, "username already registered");
            return Err(AuthError::AlreadyExists);
        }

        let password_hash = Self::hash_password(new_user.password)?;
        let now = Utc::now().naive_utc();
        app_user::ActiveModel {
            id: Set(Uuid::now_v7()),
            username: Set(new_user.username.to_owned()),
            password_hash: Set(password_hash),
            first_name: Set(new_user.first_name.to_owned()),
            last_name: Set(new_user.last_name.to_owned()),
            email: Set(new_user.email.to_owned()),
            is_active: Set(true),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| {
            // Lost a race with a concurrent registration of the same name.
            let msg = e.to_string();
            if msg.contains("UNIQUE") || msg.contains("unique") {
                AuthError::AlreadyExists
            } else {
                AuthError::Db(e)
            }
        })
    }

    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<app_user::Model>, sea_orm::DbErr> {
        app_user::Entity::find()
            .filter(app_user::Column::Username.eq(username))
            .one(&self.db)
            .await
    }

    /// Return the total number of registered users.
    pub async fn count_users(&self) -> Result<u64, sea_orm::DbErr> {
        app_user::Entity::find().count(&self.db).await
    }

    /// Hash a plaintext password with Argon2id + a random salt.
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .to_string();
        Ok(hash)
    }
}
