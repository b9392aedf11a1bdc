pub mod health;
pub mod purchase;
pub mod recipe;

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::state::AppState;

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(components(schemas(ErrorResponse)))]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        health::ApiDoc::openapi(),
        recipe::ApiDoc::openapi(),
        purchase::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}

/// All API routes with CORS applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/health", health::router())
        .nest("/api/recipe", recipe::router())
        .nest("/api/purchase", purchase::router())
        .with_state(state)
        .layer(cors_layer())
}

/// Permissive CORS matching what the front end expects: any origin, with credentials.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_credentials(true)
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::OPTIONS,
            Method::PATCH,
            Method::DELETE,
            Method::POST,
            Method::PUT,
        ])
        .allow_headers([
            header::HeaderName::from_static("x-csrf-token"),
            header::HeaderName::from_static("x-requested-with"),
            header::ACCEPT,
            header::HeaderName::from_static("accept-version"),
            header::CONTENT_LENGTH,
            header::HeaderName::from_static("content-md5"),
            header::CONTENT_TYPE,
            header::DATE,
            header::HeaderName::from_static("x-api-version"),
        ])
}

/// 405 for any method other than POST on a POST-only route.
pub async fn post_only() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, HeaderValue::from_static("POST"))],
    )
        .into_response()
}

/// Bare OPTIONS requests that are not CORS preflights.
pub async fn options_ok() -> StatusCode {
    StatusCode::OK
}
