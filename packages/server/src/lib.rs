pub mod config;
pub mod data;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Blog System",
        version = "1.0.0",
        description = "Blogs and their comments, one form page per action"
    ),
    paths(
        handlers::blogs::index,
        handlers::blogs::details,
        handlers::blogs::create_form,
        handlers::blogs::create,
        handlers::blogs::edit_form,
        handlers::blogs::edit,
        handlers::blogs::delete_form,
        handlers::blogs::delete,
    ),
    tags(
        (name = "Blogs", description = "Blog and comment pages"),
    ),
)]
struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state.config);

    routes::routes()
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let mut allow_headers = vec![header::CONTENT_TYPE];
    if let Ok(name) = HeaderName::try_from(config.antiforgery.header_name.as_str()) {
        allow_headers.push(name);
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(allow_headers)
        .allow_credentials(true)
        .max_age(Duration::from_secs(config.server.cors.max_age))
}
