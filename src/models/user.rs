use crate::models::user_settings::NewUserSettings;
use crate::schema::*;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use chrono::Utc;
use diesel::{
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub is_active: bool,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
struct InsertableUser {
    username: String,
    hashed_password: String,
    is_active: bool,
    created_at: i64,
}

/// Registration and login payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Error)]
pub enum UserTableError {
    #[error("Username already registered")]
    UsernameExists,
    #[error("Password is too short")]
    PasswordTooShort,
    #[error("Failed to hash password")]
    PasswordHashError,
    #[error("User not found")]
    UserNotFound,
    #[error("Database error")]
    DatabaseError,
}

impl From<DieselError> for UserTableError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                UserTableError::UsernameExists
            }
            DieselError::NotFound => UserTableError::UserNotFound,
            _ => {
                log::error!("User table error: {:?}", err);
                UserTableError::DatabaseError
            }
        }
    }
}

#[derive(Debug)]
pub enum UserQuery<'a> {
    Id(i32),
    Username(&'a str),
}

impl User {
    /// Creates the account and its default settings row in one transaction.
    pub fn register(conn: &mut SqliteConnection, new_user: &NewUser) -> Result<User, UserTableError> {
        if User::exists(conn, &new_user.username) {
            log::warn!("User with username {} already exists", new_user.username);
            return Err(UserTableError::UsernameExists);
        }

        let hashed_password = match Self::hash_password(&new_user.password) {
            Ok(hash) => hash,
            Err(UserTableError::PasswordTooShort) => {
                log::warn!("Password too short");
                return Err(UserTableError::PasswordTooShort);
            }
            Err(err) => {
                log::error!("Failed to hash password");
                return Err(err);
            }
        };

        let now = Utc::now().timestamp();
        let record = InsertableUser {
            username: new_user.username.clone(),
            hashed_password,
            is_active: true,
            created_at: now,
        };

        conn.transaction::<_, UserTableError, _>(|conn| {
            let user = diesel::insert_into(users::table)
                .values(&record)
                .returning(User::as_returning())
                .get_result(conn)?;

            diesel::insert_into(user_settings::table)
                .values(&NewUserSettings::defaults(user.id, now))
                .execute(conn)?;

            log::info!("Registered user (id={})", user.id);
            Ok(user)
        })
    }

    /// Returns `None` both for an unknown username and for a wrong password.
    pub fn authenticate(conn: &mut SqliteConnection, username: &str, password: &str) -> Option<User> {
        let user = User::get(conn, UserQuery::Username(username))?;
        match User::check_password(&user, password) {
            Ok(true) => Some(user),
            _ => None,
        }
    }

    pub fn exists(conn: &mut SqliteConnection, name: &str) -> bool {
        use crate::schema::users::dsl::*;
        users
            .filter(username.eq(name))
            .select(id)
            .first::<i32>(conn)
            .is_ok()
    }

    pub fn get(conn: &mut SqliteConnection, query: UserQuery) -> Option<User> {
        use crate::schema::users::dsl::*;
        log::debug!("Getting user: {:?}", query);
        let result = match query {
            UserQuery::Id(user_id) => users
                .filter(id.eq(user_id))
                .select(User::as_select())
                .first(conn)
                .optional(),
            UserQuery::Username(name) => users
                .filter(username.eq(name))
                .select(User::as_select())
                .first(conn)
                .optional(),
        };

        match result {
            Ok(user) => user,
            Err(err) => {
                log::warn!("Error getting user: {:?}", err);
                None
            }
        }
    }

    pub fn set_active(
        conn: &mut SqliteConnection,
        user_id: i32,
        active: bool,
    ) -> Result<User, UserTableError> {
        use crate::schema::users::dsl::*;
        log::info!("Setting is_active={} for user (id={})", active, user_id);
        diesel::update(users.filter(id.eq(user_id)))
            .set(is_active.eq(active))
            .returning(User::as_returning())
            .get_result(conn)
            .map_err(UserTableError::from)
    }

    fn hash_password(password: &str) -> Result<String, UserTableError> {
        if password.is_empty() {
            return Err(UserTableError::PasswordTooShort);
        }
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| UserTableError::PasswordHashError)
    }

    pub fn check_password(user: &User, password: &str) -> Result<bool, UserTableError> {
        let password_hash = PasswordHash::new(&user.hashed_password).map_err(|_| {
            log::error!("Failed to parse password hash for user (id={})", user.id);
            UserTableError::PasswordHashError
        })?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &password_hash)
            .is_ok())
    }
}
