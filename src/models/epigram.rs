use super::user::User;
use crate::schema::*;
use chrono::Utc;
use diesel::{
    backend::Backend,
    deserialize::{self, FromSql, FromSqlRow},
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
    serialize::{self, Output, ToSql},
    sql_types::{Nullable, SmallInt, Text},
    define_sql_function, AsExpression,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_PAGE_SIZE: i64 = 100;

define_sql_function! {
    #[sql_name = "lower"]
    fn lower_text(x: Text) -> Text;
}

define_sql_function! {
    #[sql_name = "lower"]
    fn lower_nullable(x: Nullable<Text>) -> Nullable<Text>;
}

define_sql_function!(fn coalesce(x: Nullable<Text>, y: Text) -> Text);

define_sql_function!(fn random() -> diesel::sql_types::Integer);

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations, PartialEq)]
#[diesel(belongs_to(User))]
#[diesel(table_name = epigrams)]
pub struct Epigram {
    pub id: i32,
    pub text: String,
    pub author: Option<String>,
    pub user_id: i32,
    /// Kept in storage, not part of the public representation.
    #[serde(skip_serializing, default)]
    pub status: EpigramStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[repr(i16)]
#[derive(Debug, Default, Serialize, Deserialize, AsExpression, Clone, Copy, FromSqlRow, PartialEq, Eq)]
#[diesel(sql_type = SmallInt)]
#[serde(rename_all = "snake_case")]
pub enum EpigramStatus {
    Pending = 0,
    #[default]
    Approved = 1,
    Rejected = 2,
}

impl<DB> FromSql<SmallInt, DB> for EpigramStatus
where
    DB: Backend,
    i16: FromSql<SmallInt, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> deserialize::Result<Self> {
        match i16::from_sql(bytes)? {
            0 => Ok(EpigramStatus::Pending),
            1 => Ok(EpigramStatus::Approved),
            2 => Ok(EpigramStatus::Rejected),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl<DB> ToSql<SmallInt, DB> for EpigramStatus
where
    DB: Backend,
    i16: ToSql<SmallInt, DB>,
{
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, DB>) -> serialize::Result {
        match self {
            EpigramStatus::Pending => 0_i16.to_sql(out),
            EpigramStatus::Approved => 1_i16.to_sql(out),
            EpigramStatus::Rejected => 2_i16.to_sql(out),
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = epigrams)]
pub struct NewEpigram<'a> {
    pub text: &'a str,
    pub author: Option<&'a str>,
    pub user_id: i32,
    pub status: EpigramStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Error)]
pub enum EpigramError {
    #[error("Epigram not found")]
    NotFound,
    #[error("Epigram belongs to another user")]
    PermissionDenied,
    #[error("Epigram already exists")]
    Duplicate,
    #[error("Database error: {0}")]
    DatabaseError(DieselError),
}

impl From<DieselError> for EpigramError {
    fn from(err: DieselError) -> Self {
        match err {
            // the unique index on (lower(text), lower(author)) lost a race with the pre-check
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                EpigramError::Duplicate
            }
            DieselError::NotFound => EpigramError::NotFound,
            _ => {
                log::error!("Epigram table error: {:?}", err);
                EpigramError::DatabaseError(err)
            }
        }
    }
}

/// One page of an owner's epigrams plus the unpaginated total.
#[derive(Debug, Serialize)]
pub struct EpigramPage {
    pub items: Vec<Epigram>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
}

impl EpigramPage {
    pub fn pages(&self) -> i64 {
        (self.total + self.size - 1) / self.size
    }
}

impl Epigram {
    pub fn get(
        conn: &mut SqliteConnection,
        epigram_id: i32,
    ) -> Result<Option<Epigram>, EpigramError> {
        Ok(epigrams::table
            .find(epigram_id)
            .select(Epigram::as_select())
            .first(conn)
            .optional()?)
    }

    /// Finds a row whose normalized (text, author) matches. Lowercasing runs
    /// in SQL on both sides so it agrees with the unique index.
    pub fn find_duplicate(
        conn: &mut SqliteConnection,
        text: &str,
        author: Option<&str>,
        exclude_id: Option<i32>,
    ) -> Result<Option<Epigram>, EpigramError> {
        let mut query = epigrams::table
            .select(Epigram::as_select())
            .filter(lower_text(epigrams::text).eq(lower_text(text)))
            .filter(
                coalesce(lower_nullable(epigrams::author), "")
                    .eq(lower_text(author.unwrap_or(""))),
            )
            .into_boxed();

        if let Some(excluded) = exclude_id {
            query = query.filter(epigrams::id.ne(excluded));
        }

        Ok(query.first(conn).optional()?)
    }

    /// The duplicate check and the insert share one write transaction, so
    /// of several concurrent identical creates exactly one succeeds.
    pub fn create(
        conn: &mut SqliteConnection,
        text: &str,
        author: Option<&str>,
        owner_id: i32,
    ) -> Result<Epigram, EpigramError> {
        let epigram = conn.immediate_transaction(|conn| {
            if Epigram::find_duplicate(conn, text, author, None)?.is_some() {
                log::info!("Rejected duplicate epigram from user {owner_id}");
                return Err(EpigramError::Duplicate);
            }

            let now = Utc::now().timestamp();
            let new_epigram = NewEpigram {
                text,
                author,
                user_id: owner_id,
                status: EpigramStatus::Approved,
                created_at: now,
                updated_at: now,
            };

            Ok(diesel::insert_into(epigrams::table)
                .values(&new_epigram)
                .returning(Epigram::as_returning())
                .get_result(conn)?)
        })?;

        log::info!("Created epigram (id={}) for user {}", epigram.id, owner_id);
        Ok(epigram)
    }

    pub fn approved_count(conn: &mut SqliteConnection) -> Result<i64, EpigramError> {
        Ok(epigrams::table
            .filter(epigrams::status.eq(EpigramStatus::Approved))
            .count()
            .get_result(conn)?)
    }

    /// Up to `count` approved epigrams in random order. Avoiding `exclude_id`
    /// is best effort: it is dropped when it is the only approved epigram and
    /// appended back when the rest of the pool cannot fill the request.
    pub fn random_sample(
        conn: &mut SqliteConnection,
        count: i64,
        exclude_id: Option<i32>,
    ) -> Result<Vec<Epigram>, EpigramError> {
        if count <= 0 {
            return Ok(Vec::new());
        }

        let total = Epigram::approved_count(conn)?;
        if total == 0 {
            return Ok(Vec::new());
        }
        let exclude_id = if total == 1 { None } else { exclude_id };

        let mut query = epigrams::table
            .select(Epigram::as_select())
            .filter(epigrams::status.eq(EpigramStatus::Approved))
            .order(random())
            .limit(count)
            .into_boxed();

        if let Some(excluded) = exclude_id {
            query = query.filter(epigrams::id.ne(excluded));
        }

        let mut sample = query.load(conn)?;

        if let Some(excluded) = exclude_id {
            if (sample.len() as i64) < count {
                if let Some(epigram) = Epigram::get(conn, excluded)? {
                    if epigram.status == EpigramStatus::Approved {
                        sample.push(epigram);
                    }
                }
            }
        }

        Ok(sample)
    }

    /// Owner's epigrams, most recently updated first. `page` is 1-based and
    /// `limit` is clamped to [1, 100].
    pub fn list_by_owner(
        conn: &mut SqliteConnection,
        owner_id: i32,
        page: i64,
        limit: i64,
    ) -> Result<EpigramPage, EpigramError> {
        let page = page.max(1);
        let size = limit.clamp(1, MAX_PAGE_SIZE);

        let total = epigrams::table
            .filter(epigrams::user_id.eq(owner_id))
            .count()
            .get_result(conn)?;

        let items = epigrams::table
            .filter(epigrams::user_id.eq(owner_id))
            .select(Epigram::as_select())
            .order((epigrams::updated_at.desc(), epigrams::id.desc()))
            .limit(size)
            .offset((page - 1).saturating_mul(size))
            .load(conn)?;

        Ok(EpigramPage {
            items,
            total,
            page,
            size,
        })
    }

    fn owned_by(
        conn: &mut SqliteConnection,
        epigram_id: i32,
        requester_id: i32,
    ) -> Result<Epigram, EpigramError> {
        let epigram = Epigram::get(conn, epigram_id)?.ok_or(EpigramError::NotFound)?;
        if epigram.user_id != requester_id {
            log::warn!(
                "User {} attempted to modify epigram {} owned by {}",
                requester_id,
                epigram_id,
                epigram.user_id
            );
            return Err(EpigramError::PermissionDenied);
        }
        Ok(epigram)
    }

    pub fn update(
        conn: &mut SqliteConnection,
        epigram_id: i32,
        new_text: &str,
        new_author: Option<&str>,
        requester_id: i32,
    ) -> Result<Epigram, EpigramError> {
        let updated = conn.immediate_transaction(|conn| {
            Epigram::owned_by(conn, epigram_id, requester_id)?;

            if Epigram::find_duplicate(conn, new_text, new_author, Some(epigram_id))?.is_some() {
                return Err(EpigramError::Duplicate);
            }

            Ok(diesel::update(epigrams::table.find(epigram_id))
                .set((
                    epigrams::text.eq(new_text),
                    epigrams::author.eq(new_author),
                    epigrams::updated_at.eq(Utc::now().timestamp()),
                ))
                .returning(Epigram::as_returning())
                .get_result(conn)?)
        })?;

        log::info!("Updated epigram (id={epigram_id})");
        Ok(updated)
    }

    pub fn delete(
        conn: &mut SqliteConnection,
        epigram_id: i32,
        requester_id: i32,
    ) -> Result<(), EpigramError> {
        conn.immediate_transaction(|conn| {
            Epigram::owned_by(conn, epigram_id, requester_id)?;
            diesel::delete(epigrams::table.find(epigram_id)).execute(conn)?;
            Ok::<_, EpigramError>(())
        })?;
        log::info!("Deleted epigram (id={epigram_id})");
        Ok(())
    }

    /// Inserts each entry unless an equivalent epigram already exists.
    /// Returns the number of rows inserted.
    pub fn seed(
        conn: &mut SqliteConnection,
        owner_id: i32,
        entries: &[(&str, Option<&str>)],
    ) -> Result<usize, EpigramError> {
        let mut inserted = 0;
        for (text, author) in entries {
            match Epigram::create(conn, text, *author, owner_id) {
                Ok(_) => inserted += 1,
                Err(EpigramError::Duplicate) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(inserted)
    }
}
