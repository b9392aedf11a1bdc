use crate::api::{options_ok, post_only, ErrorResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use pirate_core::{send_purchase_email, PurchasedBook};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PurchaseRequest {
    pub email: String,
    #[serde(rename = "purchasedBooks")]
    pub purchased_books: Vec<PurchasedBook>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseResponse {
    pub message: String,
}

/// Confirm a cookbook purchase
///
/// Emails a tokenized download link for each purchased book.
#[utoipa::path(
    post,
    path = "/api/purchase",
    tag = "purchase",
    request_body = PurchaseRequest,
    responses(
        (status = 200, description = "Email sent", body = PurchaseResponse),
        (status = 405, description = "Method not allowed"),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 500, description = "Email could not be sent", body = ErrorResponse)
    )
)]
pub async fn purchase(
    State(state): State<AppState>,
    body: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Rejected purchase request body");
            return (
                rejection.status(),
                Json(ErrorResponse {
                    error: rejection.body_text(),
                }),
            )
                .into_response();
        }
    };

    match send_purchase_email(
        state.mailer.as_ref(),
        &state.purchase,
        &request.email,
        &request.purchased_books,
    )
    .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(PurchaseResponse {
                message: "Purchase successful, email sent!".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to send purchase email");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to process purchase".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Returns the router for /api/purchase (mounted at /api/purchase)
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        post(purchase).options(options_ok).fallback(post_only),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(purchase),
    components(schemas(PurchaseRequest, PurchaseResponse, PurchasedBook))
)]
pub struct ApiDoc;
