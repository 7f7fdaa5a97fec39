pub mod auth;
pub mod epigrams;
pub mod health;
pub mod routes;
pub mod users;
