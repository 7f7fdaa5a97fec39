use actix_cors::Cors;
use actix_governor::Governor;
use actix_web::{http::header, middleware, web, App, HttpServer};
use clap::Parser;
use dotenvy::dotenv;
use epigrams::{
    api,
    config::AppConfig,
    models::{
        epigram::Epigram,
        user::{NewUser, User, UserQuery},
    },
    observability::{self, Uptime},
    security::{self, validation},
    seeds::STARTER_EPIGRAMS,
    DbPool,
};
use std::io;

/// CLI options
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Create a new user interactively
    #[clap(long)]
    create_user: bool,

    /// Deactivate an account so it can no longer log in
    #[clap(long, value_name = "USERNAME")]
    deactivate: Option<String>,

    /// Insert the starter epigrams, owned by the given user
    #[clap(long, value_name = "USERNAME")]
    seed: Option<String>,
}

fn main() -> io::Result<()> {
    dotenv().ok();
    observability::init_logging();

    let args = Args::parse();
    let config = AppConfig::from_env().map_err(io::Error::other)?;

    let db_pool = epigrams::initialize_db_pool(&config.database_url).map_err(io::Error::other)?;
    tracing::info!("Running database migrations");
    {
        let mut conn = db_pool.get().map_err(io::Error::other)?;
        epigrams::run_migrations(&mut conn).map_err(io::Error::other)?;
    }

    if args.create_user {
        return cli_create_user(&db_pool);
    }
    if let Some(username) = args.deactivate {
        return cli_deactivate_user(&db_pool, &username);
    }
    if let Some(username) = args.seed {
        return cli_seed(&db_pool, &username);
    }

    run_server(config, db_pool)
}

fn prompt_line(prompt: &str) -> io::Result<String> {
    println!("{}", prompt);
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn cli_create_user(pool: &DbPool) -> io::Result<()> {
    let username = prompt_line("\nEnter username:")?;
    if let Err(msg) = validation::validate_username(&username) {
        println!("{}", msg);
        return Ok(());
    }

    println!("Enter password:");
    let password = rpassword::read_password()?;
    println!("Enter password again:");
    let password2 = rpassword::read_password()?;

    if password != password2 {
        println!("Passwords do not match");
        return Ok(());
    }
    if let Err(msg) = validation::validate_password(&password) {
        println!("{}", msg);
        return Ok(());
    }

    let mut conn = pool.get().map_err(io::Error::other)?;
    match User::register(&mut conn, &NewUser { username, password }) {
        Ok(user) => println!("User created successfully: {} (id={})", user.username, user.id),
        Err(e) => println!("Failed to create user: {}", e),
    }
    Ok(())
}

fn cli_deactivate_user(pool: &DbPool, username: &str) -> io::Result<()> {
    let mut conn = pool.get().map_err(io::Error::other)?;
    let Some(user) = User::get(&mut conn, UserQuery::Username(username)) else {
        println!("No user named {}", username);
        return Ok(());
    };

    match User::set_active(&mut conn, user.id, false) {
        Ok(user) => println!("Deactivated {} (id={})", user.username, user.id),
        Err(e) => println!("Failed to deactivate user: {}", e),
    }
    Ok(())
}

fn cli_seed(pool: &DbPool, username: &str) -> io::Result<()> {
    let mut conn = pool.get().map_err(io::Error::other)?;
    let owner = match User::get(&mut conn, UserQuery::Username(username)) {
        Some(user) => user,
        None => {
            println!("No user named {}", username);
            return Ok(());
        }
    };

    let inserted =
        Epigram::seed(&mut conn, owner.id, STARTER_EPIGRAMS).map_err(io::Error::other)?;
    println!(
        "Inserted {} of {} starter epigrams",
        inserted,
        STARTER_EPIGRAMS.len()
    );
    Ok(())
}

#[actix_web::main]
async fn run_server(config: AppConfig, db_pool: DbPool) -> io::Result<()> {
    tracing::info!("Starting server at http://{}:{}", config.host, config.port);

    let pool = web::Data::new(db_pool);
    let auth = web::Data::new(config.auth.clone());
    let uptime = web::Data::new(Uptime::new());
    let cors_origin = config.cors_origin.clone();

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
            .supports_credentials()
            .max_age(3600);

        let general_rate_limiter = security::create_rate_limiter();
        let auth_rate_limiter = security::create_auth_rate_limiter();

        App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::new(
                middleware::TrailingSlash::Trim,
            ))
            .wrap(security::SecurityHeaders)
            .wrap(cors)
            .app_data(pool.clone())
            .app_data(auth.clone())
            .app_data(uptime.clone())
            .service(api::health::routes())
            .service(api::auth::routes().wrap(Governor::new(&auth_rate_limiter)))
            .service(api::epigrams::routes().wrap(Governor::new(&general_rate_limiter)))
            .service(api::users::routes().wrap(Governor::new(&general_rate_limiter)))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
