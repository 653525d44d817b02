//! The six business entities of a Stack Exchange dump.

use serde::Serialize;

use crate::schema::{
  HUB_BADGE, HUB_COMMENT, HUB_POST, HUB_TAG, HUB_USER, HUB_VOTE, SAT_BADGE,
  SAT_COMMENT, SAT_POST, SAT_TAG, SAT_USER, SAT_VOTE, Table,
};

/// An entity with its own hub and satellite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
  User,
  Post,
  Comment,
  Vote,
  Badge,
  Tag,
}

impl Entity {
  pub const ALL: [Entity; 6] = [
    Entity::User,
    Entity::Post,
    Entity::Comment,
    Entity::Vote,
    Entity::Badge,
    Entity::Tag,
  ];

  /// Lowercase name used in table and column names (`hub_{name}`).
  pub fn name(self) -> &'static str {
    match self {
      Self::User => "user",
      Self::Post => "post",
      Self::Comment => "comment",
      Self::Vote => "vote",
      Self::Badge => "badge",
      Self::Tag => "tag",
    }
  }

  /// The dump file holding this entity; also used as the record source tag.
  pub fn source_file(self) -> &'static str {
    match self {
      Self::User => "users.csv",
      Self::Post => "posts.csv",
      Self::Comment => "comments.csv",
      Self::Vote => "votes.csv",
      Self::Badge => "badges.csv",
      Self::Tag => "tags.csv",
    }
  }

  pub fn hub(self) -> &'static Table {
    match self {
      Self::User => &HUB_USER,
      Self::Post => &HUB_POST,
      Self::Comment => &HUB_COMMENT,
      Self::Vote => &HUB_VOTE,
      Self::Badge => &HUB_BADGE,
      Self::Tag => &HUB_TAG,
    }
  }

  pub fn satellite(self) -> &'static Table {
    match self {
      Self::User => &SAT_USER,
      Self::Post => &SAT_POST,
      Self::Comment => &SAT_COMMENT,
      Self::Vote => &SAT_VOTE,
      Self::Badge => &SAT_BADGE,
      Self::Tag => &SAT_TAG,
    }
  }
}
