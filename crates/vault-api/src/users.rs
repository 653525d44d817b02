//! Handlers for `/users/...`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};

use crate::{
  analytics::{ActivityReport, Analytics, CommentLengths, ResponseTimes},
  error::ApiError,
  limit::{CommentLengthParams, LimitParams},
};

/// `GET /users/activity[?limit=...]`
pub async fn activity(
  State(analytics): State<Arc<Analytics>>,
  params: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Json<ActivityReport>, ApiError> {
  let Query(params) = params?;
  let limit = params.resolve()?;
  let report = analytics.user_activity(limit).await.map_err(ApiError::store)?;
  Ok(Json(report))
}

/// `GET /users/fastest-commenters[?limit=...]`
pub async fn fastest_commenters(
  State(analytics): State<Arc<Analytics>>,
  params: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Json<Vec<ResponseTimes>>, ApiError> {
  let Query(params) = params?;
  let limit = params.resolve()?;
  let users = analytics.fastest_commenters(limit).await.map_err(ApiError::store)?;
  Ok(Json(users))
}

/// `GET /users/longest-comments[?limit=...&min_comments=...]`
pub async fn longest_comments(
  State(analytics): State<Arc<Analytics>>,
  params: Result<Query<CommentLengthParams>, QueryRejection>,
) -> Result<Json<Vec<CommentLengths>>, ApiError> {
  let Query(params) = params?;
  let (limit, min_comments) = params.resolve()?;
  let users = analytics.longest_comments(limit, min_comments).await.map_err(ApiError::store)?;
  Ok(Json(users))
}
