use axum::{Router, routing::get};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::blogs::home))
        .nest("/Blogs", blog_routes())
}

fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::blogs::index))
        .route("/Index", get(handlers::blogs::index))
        .route("/Details/{id}", get(handlers::blogs::details))
        .route(
            "/Create",
            get(handlers::blogs::create_form).post(handlers::blogs::create),
        )
        .route(
            "/Edit/{id}",
            get(handlers::blogs::edit_form).post(handlers::blogs::edit),
        )
        .route(
            "/Delete/{id}",
            get(handlers::blogs::delete_form).post(handlers::blogs::delete),
        )
}
