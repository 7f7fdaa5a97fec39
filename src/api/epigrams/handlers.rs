use super::types::{BatchQuery, EpigramRequest, PageQuery, PaginatedEpigrams, RandomQuery};
use crate::errors::{AppError, AppResult};
use crate::models::epigram::Epigram;
use crate::security::validation;
use crate::session::AuthUser;
use crate::{log_user_action, RqDbPool};
use actix_web::{delete, get, post, put, web, HttpResponse};

fn normalized(body: EpigramRequest) -> AppResult<(String, Option<String>)> {
    validation::normalize_epigram(&body.text, body.author.as_deref())
        .map_err(|msg| AppError::invalid_input("epigram", &msg))
}

/// One random approved epigram, avoiding `current_id` when possible.
#[get("/random")]
pub async fn random_epigram(pool: RqDbPool, query: web::Query<RandomQuery>) -> AppResult<HttpResponse> {
    let current_id = query.current_id;
    let mut sample = web::block(move || -> AppResult<Vec<Epigram>> {
        let mut conn = pool.get()?;
        Ok(Epigram::random_sample(&mut conn, 1, current_id)?)
    })
    .await??;

    match sample.pop() {
        Some(epigram) => Ok(HttpResponse::Ok().json(epigram)),
        None => Err(AppError::resource_not_found("Epigram")),
    }
}

#[get("/random/batch")]
pub async fn random_batch(pool: RqDbPool, query: web::Query<BatchQuery>) -> AppResult<HttpResponse> {
    let count = query.count.unwrap_or(validation::DEFAULT_BATCH_COUNT);
    validation::validate_batch_count(count).map_err(|msg| AppError::invalid_input("count", &msg))?;
    let current_id = query.current_id;

    let sample = web::block(move || -> AppResult<Vec<Epigram>> {
        let mut conn = pool.get()?;
        Ok(Epigram::random_sample(&mut conn, count, current_id)?)
    })
    .await??;

    if sample.is_empty() {
        return Err(AppError::resource_not_found("Epigram"));
    }
    Ok(HttpResponse::Ok().json(sample))
}

#[post("")]
pub async fn create_epigram(
    pool: RqDbPool,
    user: AuthUser,
    body: web::Json<EpigramRequest>,
) -> AppResult<HttpResponse> {
    let (text, author) = normalized(body.into_inner())?;
    let owner_id = user.id();

    let epigram = web::block(move || -> AppResult<Epigram> {
        let mut conn = pool.get()?;
        Ok(Epigram::create(&mut conn, &text, author.as_deref(), owner_id)?)
    })
    .await??;

    log_user_action!(owner_id, "create_epigram", { "epigram_id": epigram.id });
    Ok(HttpResponse::Created().json(epigram))
}

#[get("/mine")]
pub async fn my_epigrams(
    pool: RqDbPool,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(validation::DEFAULT_PAGE_LIMIT);
    validation::validate_pagination(page, limit)
        .map_err(|msg| AppError::invalid_input("pagination", &msg))?;
    let owner_id = user.id();

    let listing = web::block(move || -> AppResult<PaginatedEpigrams> {
        let mut conn = pool.get()?;
        Ok(Epigram::list_by_owner(&mut conn, owner_id, page, limit)?.into())
    })
    .await??;

    Ok(HttpResponse::Ok().json(listing))
}

#[put("/{epigram_id}")]
pub async fn update_epigram(
    pool: RqDbPool,
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<EpigramRequest>,
) -> AppResult<HttpResponse> {
    let epigram_id = path.into_inner();
    let (text, author) = normalized(body.into_inner())?;
    let requester_id = user.id();

    let epigram = web::block(move || -> AppResult<Epigram> {
        let mut conn = pool.get()?;
        Ok(Epigram::update(
            &mut conn,
            epigram_id,
            &text,
            author.as_deref(),
            requester_id,
        )?)
    })
    .await??;

    log_user_action!(requester_id, "update_epigram", { "epigram_id": epigram_id });
    Ok(HttpResponse::Ok().json(epigram))
}

#[delete("/{epigram_id}")]
pub async fn delete_epigram(
    pool: RqDbPool,
    user: AuthUser,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let epigram_id = path.into_inner();
    let requester_id = user.id();

    web::block(move || -> AppResult<()> {
        let mut conn = pool.get()?;
        Ok(Epigram::delete(&mut conn, epigram_id, requester_id)?)
    })
    .await??;

    log_user_action!(requester_id, "delete_epigram", { "epigram_id": epigram_id });
    Ok(HttpResponse::NoContent().finish())
}
