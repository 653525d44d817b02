//! Handlers for `/tags/...`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};

use crate::{
  analytics::{Analytics, InactiveTags, TagEngagement, TagUsage},
  error::ApiError,
  limit::LimitParams,
};

/// `GET /tags/popular[?limit=...]`
pub async fn popular(
  State(analytics): State<Arc<Analytics>>,
  params: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Json<Vec<TagUsage>>, ApiError> {
  let Query(params) = params?;
  let limit = params.resolve()?;
  let tags = analytics.popular_tags(limit).await.map_err(ApiError::store)?;
  Ok(Json(tags))
}

/// `GET /tags/inactive`
pub async fn inactive(
  State(analytics): State<Arc<Analytics>>,
) -> Result<Json<InactiveTags>, ApiError> {
  let tags = analytics.inactive_tags().await.map_err(ApiError::store)?;
  Ok(Json(tags))
}

/// `GET /tags/engagement[?limit=...]`
pub async fn engagement(
  State(analytics): State<Arc<Analytics>>,
  params: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Json<Vec<TagEngagement>>, ApiError> {
  let Query(params) = params?;
  let tags = analytics.tag_engagement(params.resolve()?).await.map_err(ApiError::store)?;
  Ok(Json(tags))
}
