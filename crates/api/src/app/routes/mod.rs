use axum::Router;

pub mod items;
pub mod system;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new().nest("/items", items::router())
}
