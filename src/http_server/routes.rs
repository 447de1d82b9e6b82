//! REST Routes
//!
//! Collection, global and auth endpoints. Every handler resolves the
//! optional bearer token to a user, builds REST operation arguments and
//! hands them to the [`LocalApi`].

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{AuthError, User};
use crate::core::error::{CmsError, CmsResult};
use crate::core::{LocalApi, OperationArgs};

use super::params::QueryParams;

/// Shared REST state
#[derive(Clone)]
pub struct ApiState {
    pub api: Arc<LocalApi>,
}

impl ApiState {
    pub fn new(api: Arc<LocalApi>) -> Self {
        Self { api }
    }
}

/// Routes mounted under `/api`
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/globals/:slug", get(find_global).post(update_global))
        .route("/:collection", get(find).post(create))
        .route("/:collection/login", post(login))
        .route("/:collection/forgot-password", post(forgot_password))
        .route("/:collection/reset-password", post(reset_password))
        .route("/:collection/me", get(me))
        .route(
            "/:collection/:id",
            get(find_by_id).put(update).patch(update).delete(delete),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

// ==================
// Request helpers
// ==================

/// Resolve `Authorization: Bearer <token>`; no header means anonymous
async fn principal(state: &ApiState, headers: &HeaderMap) -> CmsResult<Option<User>> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let token = value
        .to_str()
        .ok()
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or_else(|| CmsError::invalid_request("Malformed authorization header"))?;

    state.api.resolve_token(token.trim()).await.map(Some)
}

async fn request_args(
    state: &ApiState,
    headers: &HeaderMap,
    slug: &str,
    params: &HashMap<String, String>,
) -> CmsResult<OperationArgs> {
    let user = principal(state, headers).await?;
    let mut args = QueryParams::parse(params)?.into_args(slug);
    args.user = user;
    Ok(args)
}

// ==================
// Globals
// ==================

async fn find_global(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> CmsResult<Json<Value>> {
    let args = request_args(&state, &headers, &slug, &params).await?;
    Ok(Json(state.api.find_global(args).await?))
}

async fn update_global(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> CmsResult<Json<Value>> {
    let args = request_args(&state, &headers, &slug, &params)
        .await?
        .with_data(body);
    let doc = state.api.update_global(args).await?;
    Ok(Json(json!({
        "message": "Global saved successfully.",
        "doc": doc,
    })))
}

// ==================
// Collections
// ==================

async fn find(
    State(state): State<ApiState>,
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> CmsResult<Json<Value>> {
    let args = request_args(&state, &headers, &collection, &params).await?;
    Ok(Json(state.api.find(args).await?))
}

async fn find_by_id(
    State(state): State<ApiState>,
    Path((collection, id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> CmsResult<Json<Value>> {
    let args = request_args(&state, &headers, &collection, &params)
        .await?
        .with_id(id);
    Ok(Json(state.api.find_by_id(args).await?))
}

async fn create(
    State(state): State<ApiState>,
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> CmsResult<impl IntoResponse> {
    let args = request_args(&state, &headers, &collection, &params)
        .await?
        .with_data(body);
    let doc = state.api.create(args).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Document successfully created.",
            "doc": doc,
        })),
    ))
}

async fn update(
    State(state): State<ApiState>,
    Path((collection, id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> CmsResult<Json<Value>> {
    let args = request_args(&state, &headers, &collection, &params)
        .await?
        .with_id(id)
        .with_data(body);
    let doc = state.api.update(args).await?;
    Ok(Json(json!({
        "message": "Updated successfully.",
        "doc": doc,
    })))
}

async fn delete(
    State(state): State<ApiState>,
    Path((collection, id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> CmsResult<Json<Value>> {
    let args = request_args(&state, &headers, &collection, &params)
        .await?
        .with_id(id);
    Ok(Json(state.api.delete(args).await?))
}

// ==================
// Auth
// ==================

async fn login(
    State(state): State<ApiState>,
    Path(collection): Path<String>,
    Json(request): Json<LoginRequest>,
) -> CmsResult<Json<Value>> {
    let result = state
        .api
        .login(&collection, &request.email, &request.password)
        .await?;
    Ok(Json(result))
}

async fn forgot_password(
    State(state): State<ApiState>,
    Path(collection): Path<String>,
    Json(request): Json<ForgotPasswordRequest>,
) -> CmsResult<Json<Value>> {
    Ok(Json(
        state.api.forgot_password(&collection, &request.email).await?,
    ))
}

async fn reset_password(
    State(state): State<ApiState>,
    Path(collection): Path<String>,
    Json(request): Json<ResetPasswordRequest>,
) -> CmsResult<Json<Value>> {
    let result = state
        .api
        .reset_password(&collection, &request.token, &request.password)
        .await?;
    Ok(Json(result))
}

/// A token whose user has been deleted reads as anonymous here
async fn me(
    State(state): State<ApiState>,
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> CmsResult<Json<Value>> {
    let user = match principal(&state, &headers).await {
        Err(CmsError::Auth(AuthError::UnknownUser)) => None,
        resolved => resolved?,
    };
    let mut args = QueryParams::parse(&params)?.into_args(&collection);
    args.user = user;
    Ok(Json(state.api.me(args).await?))
}
