//! Query parameters of the ranking endpoints.

use serde::Deserialize;

use crate::error::ApiError;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;
pub const DEFAULT_MIN_COMMENTS: u32 = 5;

#[derive(Debug, Deserialize, Default)]
pub struct LimitParams {
  pub limit: Option<u32>,
}

impl LimitParams {
  /// The requested row count: defaulted when absent, capped at
  /// [`MAX_LIMIT`], and rejected when zero.
  pub fn resolve(&self) -> Result<u32, ApiError> {
    match self.limit {
      None => Ok(DEFAULT_LIMIT),
      Some(0) => Err(ApiError::BadRequest("limit must be at least 1".into())),
      Some(n) => Ok(n.min(MAX_LIMIT)),
    }
  }
}

/// `?limit=&min_comments=` for `/users/longest-comments`.
#[derive(Debug, Deserialize, Default)]
pub struct CommentLengthParams {
  pub limit:        Option<u32>,
  pub min_comments: Option<u32>,
}

impl CommentLengthParams {
  /// `(limit, min_comments)`, with the limit resolved as in [`LimitParams`].
  pub fn resolve(&self) -> Result<(u32, u32), ApiError> {
    let limit = LimitParams { limit: self.limit }.resolve()?;
    Ok((limit, self.min_comments.unwrap_or(DEFAULT_MIN_COMMENTS)))
  }
}
