use actix_web::{
    cookie::Cookie,
    dev::ServiceResponse,
    http::StatusCode,
    test, web, App,
};
use epigrams::{
    api,
    config::AuthConfig,
    models::user::User,
    observability::Uptime,
    security::SecurityHeaders,
    DbPool,
};
use serde_json::{json, Value};
use tempfile::TempDir;

fn create_test_db() -> (TempDir, DbPool) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = epigrams::initialize_db_pool(&db_path.display().to_string())
        .expect("Failed to create pool");

    let mut conn = pool.get().expect("Failed to get connection");
    epigrams::run_migrations(&mut conn).expect("Failed to run migrations");

    (temp_dir, pool)
}

fn create_test_app(
    pool: DbPool,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Response = ServiceResponse,
        Error = actix_web::Error,
        Config = (),
        InitError = (),
    >,
> {
    let auth = AuthConfig {
        jwt_secret: "integration-test-secret".to_string(),
        token_ttl_minutes: 30,
        secure_cookies: false,
    };

    App::new()
        .app_data(web::Data::new(pool))
        .app_data(web::Data::new(auth))
        .app_data(web::Data::new(Uptime::new()))
        .wrap(SecurityHeaders)
        .configure(api::routes::configure)
}

fn access_cookie(resp: &ServiceResponse) -> Cookie<'static> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "access_token")
        .expect("access_token cookie")
        .into_owned()
}

macro_rules! register {
    ($app:expr, $username:expr) => {{
        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(json!({ "username": $username, "password": "Secret-pass1" }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let cookie = access_cookie(&resp);
        let body: Value = test::read_body_json(resp).await;
        (body, cookie)
    }};
}

macro_rules! create_epigram {
    ($app:expr, $cookie:expr, $text:expr, $author:expr) => {{
        let author: Option<&str> = $author;
        let req = test::TestRequest::post()
            .uri("/epigrams")
            .cookie($cookie.clone())
            .set_json(json!({ "text": $text, "author": author }))
            .to_request();
        test::call_service(&$app, req).await
    }};
}

#[actix_web::test]
async fn test_health_endpoints() {
    let (_dir, pool) = create_test_db();
    let app = test::init_service(create_test_app(pool)).await;

    for uri in ["/health", "/health/ready", "/health/live"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success(), "{}", uri);
        assert_eq!(resp.headers().get("x-frame-options").unwrap(), "DENY");
    }
}

#[actix_web::test]
async fn test_register_sets_cookie_and_hides_password() {
    let (_dir, pool) = create_test_db();
    let app = test::init_service(create_test_app(pool)).await;

    let (user, cookie) = register!(app, "alice");
    assert_eq!(user["username"], "alice");
    assert_eq!(user["is_active"], true);
    assert!(user.get("hashed_password").is_none());
    assert_eq!(cookie.http_only(), Some(true));

    let req = test::TestRequest::get()
        .uri("/users/settings")
        .cookie(cookie)
        .to_request();
    let settings: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(settings["auto_reload_enabled"], false);
    assert_eq!(settings["auto_reload_interval_minutes"], 5);
}

#[actix_web::test]
async fn test_register_rejections() {
    let (_dir, pool) = create_test_db();
    let app = test::init_service(create_test_app(pool)).await;
    register!(app, "alice");

    let cases = [
        json!({ "username": "alice", "password": "Secret-pass1" }),
        json!({ "username": "al", "password": "Secret-pass1" }),
        json!({ "username": "bob smith", "password": "Secret-pass1" }),
        json!({ "username": "bob", "password": "weakpass" }),
    ];
    for body in cases {
        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", body);
    }
}

#[actix_web::test]
async fn test_login_flow() {
    let (_dir, pool) = create_test_db();
    let app = test::init_service(create_test_app(pool)).await;
    register!(app, "alice");

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "username": "alice", "password": "Wrong-pass1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "username": "nobody", "password": "Secret-pass1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "username": "alice", "password": "Secret-pass1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = access_cookie(&resp);

    let req = test::TestRequest::get()
        .uri("/auth/me")
        .cookie(cookie.clone())
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["username"], "alice");

    let req = test::TestRequest::post()
        .uri("/auth/verify-token")
        .cookie(cookie)
        .to_request();
    let status: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(status["valid"], true);
    assert_eq!(status["user_id"], me["id"]);
}

#[actix_web::test]
async fn test_logout_clears_cookie() {
    let (_dir, pool) = create_test_db();
    let app = test::init_service(create_test_app(pool)).await;

    let req = test::TestRequest::post().uri("/auth/logout").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = access_cookie(&resp);
    assert_eq!(cookie.value(), "");
}

#[actix_web::test]
async fn test_protected_routes_require_auth() {
    let (_dir, pool) = create_test_db();
    let app = test::init_service(create_test_app(pool)).await;

    let requests = [
        test::TestRequest::get().uri("/auth/me"),
        test::TestRequest::get().uri("/epigrams/mine"),
        test::TestRequest::post()
            .uri("/epigrams")
            .set_json(json!({ "text": "Hello" })),
        test::TestRequest::put()
            .uri("/epigrams/1")
            .set_json(json!({ "text": "Hello" })),
        test::TestRequest::delete().uri("/epigrams/1"),
        test::TestRequest::get().uri("/users/settings"),
    ];
    for req in requests {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    let req = test::TestRequest::get()
        .uri("/auth/me")
        .cookie(Cookie::new("access_token", "garbage"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_deactivated_user_is_rejected() {
    let (_dir, pool) = create_test_db();
    let app = test::init_service(create_test_app(pool.clone())).await;
    let (user, cookie) = register!(app, "alice");

    {
        let mut conn = pool.get().unwrap();
        User::set_active(&mut conn, user["id"].as_i64().unwrap() as i32, false).unwrap();
    }

    let req = test::TestRequest::get()
        .uri("/auth/me")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "username": "alice", "password": "Secret-pass1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_create_epigram_and_duplicates() {
    let (_dir, pool) = create_test_db();
    let app = test::init_service(create_test_app(pool)).await;
    let (user, alice) = register!(app, "alice");
    let (_, bob) = register!(app, "bob");

    let resp = create_epigram!(app, alice, "  Less is more.  ", Some("Mies"));
    assert_eq!(resp.status(), StatusCode::CREATED);
    let epigram: Value = test::read_body_json(resp).await;
    assert_eq!(epigram["text"], "Less is more.");
    assert_eq!(epigram["author"], "Mies");
    assert_eq!(epigram["user_id"], user["id"]);
    assert!(epigram.get("status").is_none());

    let resp = create_epigram!(app, bob, "LESS IS MORE.", Some("mies"));
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Same text, different author is a different epigram
    let resp = create_epigram!(app, bob, "Less is more.", None);
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = create_epigram!(app, bob, "less is more.", Some("   "));
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_create_epigram_validation() {
    let (_dir, pool) = create_test_db();
    let app = test::init_service(create_test_app(pool)).await;
    let (_, cookie) = register!(app, "alice");

    let too_long = "x".repeat(151);
    let long_author = "y".repeat(51);
    let cases: [(&str, Option<&str>); 3] = [
        ("   ", None),
        (&too_long, None),
        ("Fine text", Some(&long_author)),
    ];
    for (text, author) in cases {
        let resp = create_epigram!(app, cookie, text, author);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[actix_web::test]
async fn test_my_epigrams_pagination() {
    let (_dir, pool) = create_test_db();
    let app = test::init_service(create_test_app(pool)).await;
    let (_, alice) = register!(app, "alice");
    let (_, bob) = register!(app, "bob");

    for text in ["one", "two", "three"] {
        create_epigram!(app, alice, text, None);
    }
    create_epigram!(app, bob, "not alice's", None);

    let req = test::TestRequest::get()
        .uri("/epigrams/mine?page=1&limit=2")
        .cookie(alice.clone())
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    assert_eq!(page["total"], 3);
    assert_eq!(page["page"], 1);
    assert_eq!(page["size"], 2);
    assert_eq!(page["pages"], 2);
    assert_eq!(page["has_next"], true);
    assert_eq!(page["has_prev"], false);

    let req = test::TestRequest::get()
        .uri("/epigrams/mine?page=2&limit=2")
        .cookie(alice.clone())
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["has_next"], false);
    assert_eq!(page["has_prev"], true);

    let req = test::TestRequest::get()
        .uri("/epigrams/mine?page=9223372036854775807&limit=100")
        .cookie(alice.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Value = test::read_body_json(resp).await;
    assert!(page["items"].as_array().unwrap().is_empty());
    assert_eq!(page["total"], 3);
    assert_eq!(page["has_next"], false);

    for uri in ["/epigrams/mine?page=0", "/epigrams/mine?limit=101"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .cookie(alice.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[actix_web::test]
async fn test_update_epigram_rules() {
    let (_dir, pool) = create_test_db();
    let app = test::init_service(create_test_app(pool)).await;
    let (_, alice) = register!(app, "alice");
    let (_, bob) = register!(app, "bob");

    let first: Value =
        test::read_body_json(create_epigram!(app, alice, "First", Some("A"))).await;
    create_epigram!(app, alice, "Second", Some("B"));
    let id = first["id"].as_i64().unwrap();

    let update = |cookie: &Cookie<'static>, id: i64, body: Value| {
        test::TestRequest::put()
            .uri(&format!("/epigrams/{}", id))
            .cookie(cookie.clone())
            .set_json(body)
            .to_request()
    };

    let resp = test::call_service(&app, update(&bob, id, json!({ "text": "Hijack" }))).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, update(&alice, 9999, json!({ "text": "Ghost" }))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        update(&alice, id, json!({ "text": "second", "author": "b" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = test::call_service(&app, update(&alice, id, json!({ "text": "FIRST" }))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["text"], "FIRST");
    assert_eq!(updated["author"], Value::Null);
}

#[actix_web::test]
async fn test_delete_epigram_rules() {
    let (_dir, pool) = create_test_db();
    let app = test::init_service(create_test_app(pool)).await;
    let (_, alice) = register!(app, "alice");
    let (_, bob) = register!(app, "bob");

    let epigram: Value =
        test::read_body_json(create_epigram!(app, alice, "Ephemeral", None)).await;
    let uri = format!("/epigrams/{}", epigram["id"]);

    let req = test::TestRequest::delete().uri(&uri).cookie(bob).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .cookie(alice.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete().uri(&uri).cookie(alice).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_random_endpoints() {
    let (_dir, pool) = create_test_db();
    let app = test::init_service(create_test_app(pool)).await;

    for uri in ["/epigrams/random", "/epigrams/random/batch"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
    }

    let (_, alice) = register!(app, "alice");
    for text in ["alpha", "beta", "gamma"] {
        create_epigram!(app, alice, text, None);
    }

    let req = test::TestRequest::get()
        .uri("/epigrams/random/batch?count=2")
        .to_request();
    let batch: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(batch.as_array().unwrap().len(), 2);

    let req = test::TestRequest::get()
        .uri("/epigrams/random/batch?count=20")
        .to_request();
    let batch: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(batch.as_array().unwrap().len(), 3);

    for uri in [
        "/epigrams/random/batch?count=0",
        "/epigrams/random/batch?count=21",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }

    let req = test::TestRequest::get().uri("/epigrams/random").to_request();
    let current: Value = test::call_and_read_body_json(&app, req).await;
    for _ in 0..10 {
        let req = test::TestRequest::get()
            .uri(&format!("/epigrams/random?current_id={}", current["id"]))
            .to_request();
        let next: Value = test::call_and_read_body_json(&app, req).await;
        assert_ne!(next["id"], current["id"]);
    }
}

#[actix_web::test]
async fn test_settings_update_and_reset() {
    let (_dir, pool) = create_test_db();
    let app = test::init_service(create_test_app(pool)).await;
    let (_, cookie) = register!(app, "alice");

    let req = test::TestRequest::put()
        .uri("/users/settings")
        .cookie(cookie.clone())
        .set_json(json!({ "auto_reload_interval_minutes": 45 }))
        .to_request();
    let settings: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(settings["auto_reload_interval_minutes"], 45);
    assert_eq!(settings["auto_reload_enabled"], false);

    let req = test::TestRequest::put()
        .uri("/users/settings")
        .cookie(cookie.clone())
        .set_json(json!({ "auto_reload_enabled": true }))
        .to_request();
    let settings: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(settings["auto_reload_interval_minutes"], 45);
    assert_eq!(settings["auto_reload_enabled"], true);

    let req = test::TestRequest::put()
        .uri("/users/settings")
        .cookie(cookie.clone())
        .set_json(json!({ "auto_reload_interval_minutes": 241 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::delete()
        .uri("/users/settings")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/users/settings")
        .cookie(cookie)
        .to_request();
    let settings: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(settings["auto_reload_enabled"], false);
    assert_eq!(settings["auto_reload_interval_minutes"], 5);
}
