// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use validator::{Validate, ValidationError};

/// Kind of account: private person, contractor or company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum UserType {
    Individual,
    Contractor,
    Company,
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub user_type: UserType,

    /// Rounded mean of received review ratings (0 when unrated).
    pub rating: i64,
    pub completed_projects: i64,
    pub is_verified: bool,
    pub is_admin: bool,
    pub is_top_specialist: bool,
    pub wallet_balance: i64,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub const USER_COLUMNS: &str = "id, username, email, password, full_name, phone, location, bio, \
     avatar, user_type, rating, completed_projects, is_verified, is_admin, is_top_specialist, \
     wallet_balance, created_at";

impl User {
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Looks up a user by email when the login contains `@`, by username otherwise.
    /// Usernames never contain `@`, so the two namespaces cannot collide.
    pub async fn find_by_login(
        pool: &SqlitePool,
        login: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        if login.contains('@') {
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
                .bind(login.to_lowercase())
                .fetch_optional(pool)
                .await
        } else {
            sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
            ))
            .bind(login)
            .fetch_optional(pool)
            .await
        }
    }
}

/// Public profile shown to other users (no email, no wallet).
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub user_type: UserType,
    pub rating: i64,
    pub completed_projects: i64,
    pub is_verified: bool,
    pub is_top_specialist: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for PublicProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            location: user.location,
            bio: user.bio,
            avatar: user.avatar,
            user_type: user.user_type,
            rating: user.rating,
            completed_projects: user.completed_projects,
            is_verified: user.is_verified,
            is_top_specialist: user.is_top_specialist,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(
            min = 3,
            max = 50,
            message = "Username length must be between 3 and 50 characters."
        ),
        custom(function = validate_username)
    )]
    pub username: String,
    #[validate(email(message = "Email address is invalid."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
    pub user_type: Option<UserType>,
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
}

/// Usernames are ASCII letters, digits, `_`, `.` and `-`.
/// Rules out `@` (reserved for email logins) and surrounding whitespace.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_username").with_message(
            "Username may only contain letters, digits, '_', '.' and '-'.".into(),
        ))
    }
}

/// DTO for user login. `username` may also be an email address.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Response for register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// DTO for self-service profile edits. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(length(max = 500))]
    pub avatar: Option<String>,
    pub user_type: Option<UserType>,
}

/// DTO for admin edits of account flags.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    pub is_admin: Option<bool>,
    pub is_verified: Option<bool>,
    pub is_top_specialist: Option<bool>,
    #[validate(range(min = 0))]
    pub wallet_balance: Option<i64>,
    #[validate(range(min = 0))]
    pub completed_projects: Option<i64>,
}
