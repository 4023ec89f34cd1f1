use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request, State},
    http::{HeaderValue, StatusCode, request::Parts},
    routing::get,
};
use serde_json::{Map, Value};
use tokio::net;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::domain::error::{AppError, MessageBody};
use crate::domain::Todo;
use crate::domain::validation;
use crate::services::TodoService;
use crate::storage::Storage;

#[cfg(feature = "tracing")]
use tracing::info;

type Key<S> = <S as Storage>::Key;

pub struct AppState<S: Storage> {
    pub todo_service: Arc<TodoService<S>>,
}

impl<S: Storage> AppState<S> {
    pub fn new(todo_service: TodoService<S>) -> Self {
        Self {
            todo_service: Arc::new(todo_service),
        }
    }
}

impl<S: Storage> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            todo_service: Arc::clone(&self.todo_service),
        }
    }
}

/// Request body as untyped JSON. An empty body reads as `{}`; the content
/// type is not checked.
pub struct JsonBody(pub Value);

impl<S: Send + Sync> FromRequest<S> for JsonBody {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge,
                _ => AppError::MalformedJson(rejection.body_text()),
            })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(Value::Object(Map::new())));
        }
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| AppError::MalformedJson(e.to_string()))
    }
}

/// The `{id}` path segment, percent-decoded. A segment that does not decode
/// to UTF-8 is an invalid identifier, quoted as it appeared in the URI.
pub struct IdToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for IdToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(token)) => Ok(Self(token)),
            Err(_) => {
                let raw = parts.uri.path().rsplit('/').next().unwrap_or_default();
                Err(AppError::InvalidIdentifier(raw.to_owned()))
            }
        }
    }
}

pub async fn get_todos<S: Storage + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Todo<Key<S>>>>, AppError> {
    Ok(Json(state.todo_service.get_all().await?))
}

pub async fn get_todo_by_id<S: Storage + 'static>(
    State(state): State<AppState<S>>,
    IdToken(id): IdToken,
) -> Result<Json<Todo<Key<S>>>, AppError> {
    let id = validation::parse_id::<Key<S>>(&id)?;
    Ok(Json(state.todo_service.get_by_id(&id).await?))
}

pub async fn post_todos<S: Storage + 'static>(
    State(state): State<AppState<S>>,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<Todo<Key<S>>>), AppError> {
    let todo = validation::validate_new_todo(&body)?;
    let todo = state.todo_service.create(todo).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn patch_todo<S: Storage + 'static>(
    State(state): State<AppState<S>>,
    IdToken(id): IdToken,
    JsonBody(body): JsonBody,
) -> Result<Json<Todo<Key<S>>>, AppError> {
    let id = validation::parse_id::<Key<S>>(&id)?;
    let patch = validation::validate_todo_patch(&body)?;
    Ok(Json(state.todo_service.update(&id, patch).await?))
}

pub async fn delete_todo<S: Storage + 'static>(
    State(state): State<AppState<S>>,
    IdToken(id): IdToken,
) -> Result<Json<MessageBody>, AppError> {
    let id = validation::parse_id::<Key<S>>(&id)?;
    state.todo_service.delete(&id).await?;
    Ok(Json(MessageBody {
        message: format!("Todo with ID {id} was successfully deleted"),
    }))
}

async fn health_route() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Permissive unless a single origin is configured.
pub fn cors_layer(origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    match origin {
        Some(origin) => {
            let origin = origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin {origin}"))?;
            Ok(CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any))
        }
        None => Ok(CorsLayer::permissive()),
    }
}

pub fn router<S: Storage + 'static>(state: AppState<S>, cors: CorsLayer) -> Router {
    #[cfg(feature = "tracing")]
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!("http_request", method = ?request.method(), uri = %request.uri())
    });
    #[cfg(not(feature = "tracing"))]
    let trace_layer = TraceLayer::new_for_http();

    Router::new()
        .route("/health", get(health_route))
        .route("/todos", get(get_todos::<S>).post(post_todos::<S>))
        .route(
            "/todos/{id}",
            get(get_todo_by_id::<S>)
                .patch(patch_todo::<S>)
                .delete(delete_todo::<S>),
        )
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

pub struct HttpServer {
    router: Router,
    listener: net::TcpListener,
}

impl HttpServer {
    pub async fn new<S: Storage + 'static>(
        todo_service: TodoService<S>,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let cors = cors_layer(config.cors_origin.as_deref())?;
        let router = router(AppState::new(todo_service), cors);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to listen on port {}", config.port))?;

        Ok(Self { router, listener })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        #[cfg(feature = "tracing")]
        info!(addr = %self.local_addr()?, "Server listening");
        axum::serve(self.listener, self.router)
            .await
            .context("received error from running server")?;
        Ok(())
    }
}
