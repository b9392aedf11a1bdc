use crate::api::{options_ok, post_only};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use pirate_core::ai::RunStatus;
use pirate_core::{GenerateError, StructuredRecipe};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use utoipa::{IntoParams, OpenApi, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateRecipeRequest {
    /// Free-text description of the wanted recipe. Forwarded as-is, even when empty.
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GenerateRecipeParams {
    /// Stream status events instead of returning one JSON body.
    /// `Accept: text/event-stream` has the same effect.
    #[serde(default)]
    pub stream: bool,
}

/// Body of a failed buffered generation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenerateErrorResponse {
    pub error: String,
    pub details: String,
    /// Debug error chain; only present when PIRATE_EXPOSE_ERROR_DETAILS is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// One server-sent event payload.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GenerationEvent {
    Generating {
        #[serde(skip_serializing_if = "Option::is_none")]
        progress: Option<String>,
    },
    Complete {
        recipe: StructuredRecipe,
    },
    Error {
        message: String,
    },
}

impl GenerationEvent {
    fn into_sse(self) -> Event {
        Event::default().json_data(&self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize generation event");
            Event::default().data(r#"{"status":"error","message":"Internal error"}"#)
        })
    }
}

/// Generate a recipe from a free-text prompt
///
/// Returns the recipe as JSON, or, when `stream=true` or the client accepts
/// `text/event-stream`, a stream of `GenerationEvent`s ending in exactly one
/// `complete` or `error` event. Identical prompts are served from a shared cache.
#[utoipa::path(
    post,
    path = "/api/recipe",
    tag = "recipe",
    params(GenerateRecipeParams),
    request_body = GenerateRecipeRequest,
    responses(
        (status = 200, description = "Generated recipe, or an event stream of GenerationEvent", body = StructuredRecipe),
        (status = 405, description = "Method not allowed"),
        (status = 415, description = "Body is not JSON", body = GenerateErrorResponse),
        (status = 422, description = "Body does not match the request schema", body = GenerateErrorResponse),
        (status = 500, description = "Generation failed", body = GenerateErrorResponse)
    )
)]
pub async fn generate_recipe(
    State(state): State<AppState>,
    Query(params): Query<GenerateRecipeParams>,
    headers: HeaderMap,
    body: Result<Json<GenerateRecipeRequest>, JsonRejection>,
) -> Response {
    let streaming = params.stream || accepts_event_stream(&headers);

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return reject_body(rejection, streaming),
    };

    if streaming {
        stream_recipe(state, request.prompt).into_response()
    } else {
        buffered_recipe(state, request.prompt).await
    }
}

/// Unreadable bodies get the same error shapes as failed generations.
fn reject_body(rejection: JsonRejection, streaming: bool) -> Response {
    let details = rejection.body_text();
    tracing::warn!(status = rejection.status().as_u16(), error = %details, "Rejected recipe request body");

    if streaming {
        let event = GenerationEvent::Error {
            message: format!("Invalid request body: {}", details),
        };
        let events = tokio_stream::iter([Ok::<_, Infallible>(event.into_sse())]);
        return Sse::new(events).into_response();
    }

    (
        rejection.status(),
        Json(GenerateErrorResponse {
            error: "Invalid request body".to_string(),
            details,
            stack: None,
        }),
    )
        .into_response()
}

async fn buffered_recipe(state: AppState, prompt: String) -> Response {
    match state.recipes.recipe_for(&prompt, &no_progress).await {
        Ok(generated) => {
            tracing::info!(cached = generated.cached, title = %generated.recipe.title, "Recipe ready");
            (StatusCode::OK, Json(generated.recipe)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, config = e.is_config(), "Failed to generate recipe");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(error_body(&e, state.expose_error_details)),
            )
                .into_response()
        }
    }
}

fn stream_recipe(
    state: AppState,
    prompt: String,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel();
    let _ = tx.send(GenerationEvent::Generating { progress: None });

    // Runs to completion even if the client disconnects.
    tokio::spawn(async move {
        let progress_tx = tx.clone();
        let on_status = move |status: &RunStatus| {
            let _ = progress_tx.send(GenerationEvent::Generating {
                progress: Some(status.to_string()),
            });
        };

        let terminal = match state.recipes.recipe_for(&prompt, &on_status).await {
            Ok(generated) => {
                tracing::info!(cached = generated.cached, title = %generated.recipe.title, "Recipe ready");
                GenerationEvent::Complete {
                    recipe: generated.recipe,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, config = e.is_config(), "Failed to generate recipe");
                GenerationEvent::Error {
                    message: format!("Failed to generate recipe: {}", e),
                }
            }
        };
        let _ = tx.send(terminal);
    });

    Sse::new(UnboundedReceiverStream::new(rx).map(|event| Ok(event.into_sse())))
}

fn no_progress(_: &RunStatus) {}

fn accepts_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/event-stream"))
        .unwrap_or(false)
}

fn error_body(error: &GenerateError, expose_stack: bool) -> GenerateErrorResponse {
    GenerateErrorResponse {
        error: "Failed to generate recipe".to_string(),
        details: error.to_string(),
        stack: expose_stack.then(|| format!("{:?}", error)),
    }
}

/// Returns the router for /api/recipe (mounted at /api/recipe)
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        post(generate_recipe).options(options_ok).fallback(post_only),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(generate_recipe),
    components(schemas(
        GenerateRecipeRequest,
        GenerateErrorResponse,
        GenerationEvent,
        StructuredRecipe,
        pirate_core::Ingredient,
        pirate_core::NutritionalInfo,
    ))
)]
pub struct ApiDoc;
