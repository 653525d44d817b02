//! Handlers for vault-wide figures.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
  analytics::{Analytics, CommentScoreRatio, Summary, ViewsPerAnswer, ViewsPerQuestion},
  error::ApiError,
};

/// `GET /summary`
pub async fn summary(State(analytics): State<Arc<Analytics>>) -> Result<Json<Summary>, ApiError> {
  let summary = analytics.summary().await.map_err(ApiError::store)?;
  Ok(Json(summary))
}

/// `GET /posts/views-per-question`
pub async fn views_per_question(
  State(analytics): State<Arc<Analytics>>,
) -> Result<Json<ViewsPerQuestion>, ApiError> {
  let views = analytics.views_per_question().await.map_err(ApiError::store)?;
  Ok(Json(views))
}

/// `GET /posts/views-per-answer`
pub async fn views_per_answer(
  State(analytics): State<Arc<Analytics>>,
) -> Result<Json<ViewsPerAnswer>, ApiError> {
  let views = analytics.views_per_answer().await.map_err(ApiError::store)?;
  Ok(Json(views))
}

/// `GET /ratios/comments-to-score`
pub async fn comments_to_score(
  State(analytics): State<Arc<Analytics>>,
) -> Result<Json<CommentScoreRatio>, ApiError> {
  let ratio = analytics.comment_score_ratio().await.map_err(ApiError::store)?;
  Ok(Json(ratio))
}
