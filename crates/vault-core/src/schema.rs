//! Declarative hub/link/satellite catalog.
//!
//! Every table is a static descriptor with its [`TableKind`] fixed at
//! definition time. The same descriptors drive DDL generation, the loader's
//! per-column coercion and truncation, and the raw-to-canonical column renames
//! applied before satellite loads, so none of those can drift apart.

use serde::Serialize;

use crate::Entity;

// ─── Descriptor types ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
  Hub,
  Link,
  Satellite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
  /// 32-byte SHA-256 digest.
  HashKey,
  Integer,
  /// Unbounded text.
  Text,
  /// Text bounded to this many characters.
  Varchar(usize),
  Timestamp,
}

/// How the loader fills a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
  /// A hash key: derived from the business key for hubs and satellites,
  /// supplied precomputed by the caller for links.
  Key,
  BusinessKey,
  LoadDate,
  /// Record source (provenance tag).
  Source,
  /// Descriptive satellite attribute.
  Attribute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
  pub table:  &'static str,
  pub column: &'static str,
}

#[derive(Debug)]
pub struct Column {
  pub name:        &'static str,
  pub ty:          ColumnType,
  pub role:        ColumnRole,
  pub primary_key: bool,
  pub references:  Option<ForeignKey>,
  /// Raw CSV header this attribute is renamed from.
  pub source:      Option<&'static str>,
}

impl Column {
  /// A hash key forming the table's primary key.
  pub const fn key(name: &'static str) -> Self {
    Self {
      name,
      ty: ColumnType::HashKey,
      role: ColumnRole::Key,
      primary_key: true,
      references: None,
      source: None,
    }
  }

  /// A satellite's hash key: part of its primary key and a reference to the
  /// same-named column of its hub.
  pub const fn owner_key(name: &'static str, hub: &'static str) -> Self {
    Self {
      references: Some(ForeignKey { table: hub, column: name }),
      ..Self::key(name)
    }
  }

  /// A link participant referencing `table.column`.
  pub const fn participant(
    name: &'static str,
    table: &'static str,
    column: &'static str,
  ) -> Self {
    Self {
      primary_key: false,
      references: Some(ForeignKey { table, column }),
      ..Self::key(name)
    }
  }

  pub const fn business_key(name: &'static str) -> Self {
    Self {
      name,
      ty: ColumnType::Integer,
      role: ColumnRole::BusinessKey,
      primary_key: false,
      references: None,
      source: None,
    }
  }

  pub const fn load_date() -> Self {
    Self {
      name:        "load_date",
      ty:          ColumnType::Timestamp,
      role:        ColumnRole::LoadDate,
      primary_key: false,
      references:  None,
      source:      None,
    }
  }

  /// `load_date` as the second half of a satellite's primary key.
  pub const fn load_date_key() -> Self {
    Self { primary_key: true, ..Self::load_date() }
  }

  pub const fn record_source() -> Self {
    Self {
      name:        "source",
      ty:          ColumnType::Varchar(255),
      role:        ColumnRole::Source,
      primary_key: false,
      references:  None,
      source:      None,
    }
  }

  pub const fn attribute(
    name: &'static str,
    source: &'static str,
    ty: ColumnType,
  ) -> Self {
    Self {
      name,
      ty,
      role: ColumnRole::Attribute,
      primary_key: false,
      references: None,
      source: Some(source),
    }
  }

  /// Only descriptive attributes may be left empty.
  pub fn nullable(&self) -> bool { self.role == ColumnRole::Attribute }

  pub fn max_len(&self) -> Option<usize> {
    match self.ty {
      ColumnType::Varchar(n) => Some(n),
      _ => None,
    }
  }
}

#[derive(Debug)]
pub struct Table {
  pub name:    &'static str,
  pub kind:    TableKind,
  /// Owning entity of a hub or satellite.
  pub entity:  Option<Entity>,
  pub columns: &'static [Column],
}

impl Table {
  pub fn column(&self, name: &str) -> Option<&Column> {
    self.columns.iter().find(|c| c.name == name)
  }

  pub fn columns_with(&self, role: ColumnRole) -> impl Iterator<Item = &Column> {
    self.columns.iter().filter(move |c| c.role == role)
  }

  /// All hash-key columns, in declaration order.
  pub fn keys(&self) -> impl Iterator<Item = &Column> {
    self.columns_with(ColumnRole::Key)
  }

  /// A link's own composite key, if it declares one.
  pub fn link_key(&self) -> Option<&Column> {
    match self.kind {
      TableKind::Link => self.keys().find(|c| c.primary_key),
      _ => None,
    }
  }

  /// The hub keys a link joins, in participant order.
  pub fn participants(&self) -> impl Iterator<Item = &Column> {
    let is_link = self.kind == TableKind::Link;
    self.keys().filter(move |c| is_link && !c.primary_key)
  }

  pub fn attributes(&self) -> impl Iterator<Item = &Column> {
    self.columns_with(ColumnRole::Attribute)
  }

  pub fn primary_key(&self) -> impl Iterator<Item = &Column> {
    self.columns.iter().filter(|c| c.primary_key)
  }
}

// ─── Hubs ────────────────────────────────────────────────────────────────────

pub static HUB_USER: Table = Table {
  name:    "hub_user",
  kind:    TableKind::Hub,
  entity:  Some(Entity::User),
  columns: &[
    Column::key("user_hk"),
    Column::business_key("user_business_key"),
    Column::load_date(),
    Column::record_source(),
  ],
};

pub static HUB_POST: Table = Table {
  name:    "hub_post",
  kind:    TableKind::Hub,
  entity:  Some(Entity::Post),
  columns: &[
    Column::key("post_hk"),
    Column::business_key("post_business_key"),
    Column::load_date(),
    Column::record_source(),
  ],
};

pub static HUB_COMMENT: Table = Table {
  name:    "hub_comment",
  kind:    TableKind::Hub,
  entity:  Some(Entity::Comment),
  columns: &[
    Column::key("comment_hk"),
    Column::business_key("comment_business_key"),
    Column::load_date(),
    Column::record_source(),
  ],
};

pub static HUB_VOTE: Table = Table {
  name:    "hub_vote",
  kind:    TableKind::Hub,
  entity:  Some(Entity::Vote),
  columns: &[
    Column::key("vote_hk"),
    Column::business_key("vote_business_key"),
    Column::load_date(),
    Column::record_source(),
  ],
};

pub static HUB_BADGE: Table = Table {
  name:    "hub_badge",
  kind:    TableKind::Hub,
  entity:  Some(Entity::Badge),
  columns: &[
    Column::key("badge_hk"),
    Column::business_key("badge_business_key"),
    Column::load_date(),
    Column::record_source(),
  ],
};

pub static HUB_TAG: Table = Table {
  name:    "hub_tag",
  kind:    TableKind::Hub,
  entity:  Some(Entity::Tag),
  columns: &[
    Column::key("tag_hk"),
    Column::business_key("tag_business_key"),
    Column::load_date(),
    Column::record_source(),
  ],
};

// ─── Satellites ──────────────────────────────────────────────────────────────

pub static SAT_USER: Table = Table {
  name:    "sat_user",
  kind:    TableKind::Satellite,
  entity:  Some(Entity::User),
  columns: &[
    Column::owner_key("user_hk", "hub_user"),
    Column::load_date_key(),
    Column::attribute("reputation", "Reputation", ColumnType::Integer),
    Column::attribute("displayname", "DisplayName", ColumnType::Varchar(40)),
    Column::attribute("creationdate", "CreationDate", ColumnType::Timestamp),
    Column::attribute("lastaccessdate", "LastAccessDate", ColumnType::Timestamp),
    Column::attribute("websiteurl", "WebsiteUrl", ColumnType::Varchar(200)),
    Column::attribute("location", "Location", ColumnType::Varchar(100)),
    Column::attribute("aboutme", "AboutMe", ColumnType::Varchar(800)),
    Column::attribute("views", "Views", ColumnType::Integer),
    Column::attribute("upvotes", "UpVotes", ColumnType::Integer),
    Column::attribute("downvotes", "DownVotes", ColumnType::Integer),
    Column::attribute("accountid", "AccountId", ColumnType::Integer),
    Column::attribute("profileimageurl", "ProfileImageUrl", ColumnType::Varchar(200)),
    Column::attribute("emailhash", "EmailHash", ColumnType::Varchar(32)),
  ],
};

pub static SAT_POST: Table = Table {
  name:    "sat_post",
  kind:    TableKind::Satellite,
  entity:  Some(Entity::Post),
  columns: &[
    Column::owner_key("post_hk", "hub_post"),
    Column::load_date_key(),
    Column::attribute("posttypeid", "PostTypeId", ColumnType::Integer),
    Column::attribute("score", "Score", ColumnType::Integer),
    Column::attribute("viewcount", "ViewCount", ColumnType::Integer),
    Column::attribute("body", "Body", ColumnType::Text),
    Column::attribute("title", "Title", ColumnType::Varchar(250)),
    Column::attribute("tags", "Tags", ColumnType::Varchar(250)),
    Column::attribute("answercount", "AnswerCount", ColumnType::Integer),
    Column::attribute("commentcount", "CommentCount", ColumnType::Integer),
    Column::attribute("favoritecount", "FavoriteCount", ColumnType::Integer),
    Column::attribute("owneruserid", "OwnerUserId", ColumnType::Integer),
    Column::attribute("creationdate", "CreationDate", ColumnType::Timestamp),
  ],
};

pub static SAT_COMMENT: Table = Table {
  name:    "sat_comment",
  kind:    TableKind::Satellite,
  entity:  Some(Entity::Comment),
  columns: &[
    Column::owner_key("comment_hk", "hub_comment"),
    Column::load_date_key(),
    Column::attribute("score", "Score", ColumnType::Integer),
    Column::attribute("text", "Text", ColumnType::Varchar(600)),
    Column::attribute("userdisplayname", "UserDisplayName", ColumnType::Varchar(30)),
    Column::attribute("creationdate", "CreationDate", ColumnType::Timestamp),
  ],
};

pub static SAT_VOTE: Table = Table {
  name:    "sat_vote",
  kind:    TableKind::Satellite,
  entity:  Some(Entity::Vote),
  columns: &[
    Column::owner_key("vote_hk", "hub_vote"),
    Column::load_date_key(),
    Column::attribute("votetypeid", "VoteTypeId", ColumnType::Integer),
    Column::attribute("bountyamount", "BountyAmount", ColumnType::Integer),
  ],
};

pub static SAT_BADGE: Table = Table {
  name:    "sat_badge",
  kind:    TableKind::Satellite,
  entity:  Some(Entity::Badge),
  columns: &[
    Column::owner_key("badge_hk", "hub_badge"),
    Column::load_date_key(),
    Column::attribute("name", "Name", ColumnType::Varchar(50)),
  ],
};

pub static SAT_TAG: Table = Table {
  name:    "sat_tag",
  kind:    TableKind::Satellite,
  entity:  Some(Entity::Tag),
  columns: &[
    Column::owner_key("tag_hk", "hub_tag"),
    Column::load_date_key(),
    Column::attribute("tagname", "TagName", ColumnType::Varchar(35)),
    Column::attribute("count", "Count", ColumnType::Integer),
    Column::attribute("excerptpostid", "ExcerptPostId", ColumnType::Integer),
    Column::attribute("wikipostid", "WikiPostId", ColumnType::Integer),
  ],
};

// ─── Links ───────────────────────────────────────────────────────────────────
//
// Participant order is the composite-key order: `post_user_hk` hashes
// "{post}_{user}", `post_post_hk` hashes "{source}_{target}", and so on.

pub static LINK_POST_USER: Table = Table {
  name:    "link_post_user",
  kind:    TableKind::Link,
  entity:  None,
  columns: &[
    Column::key("post_user_hk"),
    Column::participant("post_hk", "hub_post", "post_hk"),
    Column::participant("user_hk", "hub_user", "user_hk"),
    Column::load_date(),
    Column::record_source(),
  ],
};

pub static LINK_POST_POST: Table = Table {
  name:    "link_post_post",
  kind:    TableKind::Link,
  entity:  None,
  columns: &[
    Column::key("post_post_hk"),
    Column::participant("source_post_hk", "hub_post", "post_hk"),
    Column::participant("target_post_hk", "hub_post", "post_hk"),
    Column::load_date(),
    Column::record_source(),
  ],
};

pub static LINK_POST_COMMENT: Table = Table {
  name:    "link_post_comment",
  kind:    TableKind::Link,
  entity:  None,
  columns: &[
    Column::key("post_comment_hk"),
    Column::participant("post_hk", "hub_post", "post_hk"),
    Column::participant("comment_hk", "hub_comment", "comment_hk"),
    Column::load_date(),
    Column::record_source(),
  ],
};

pub static LINK_POST_TAG: Table = Table {
  name:    "link_post_tag",
  kind:    TableKind::Link,
  entity:  None,
  columns: &[
    Column::key("post_tag_hk"),
    Column::participant("post_hk", "hub_post", "post_hk"),
    Column::participant("tag_hk", "hub_tag", "tag_hk"),
    Column::load_date(),
    Column::record_source(),
  ],
};

pub static LINK_USER_VOTE: Table = Table {
  name:    "link_user_vote",
  kind:    TableKind::Link,
  entity:  None,
  columns: &[
    Column::key("user_vote_hk"),
    Column::participant("user_hk", "hub_user", "user_hk"),
    Column::participant("vote_hk", "hub_vote", "vote_hk"),
    Column::load_date(),
    Column::record_source(),
  ],
};

/// Keyed directly off its participants: `post_vote_hk` is the post's hub key
/// and there is no separate link key.
pub static LINK_POST_VOTE: Table = Table {
  name:    "link_post_vote",
  kind:    TableKind::Link,
  entity:  None,
  columns: &[
    Column::participant("post_vote_hk", "hub_post", "post_hk"),
    Column::participant("vote_hk", "hub_vote", "vote_hk"),
    Column::load_date(),
    Column::record_source(),
  ],
};

pub static LINK_USER_BADGE: Table = Table {
  name:    "link_user_badge",
  kind:    TableKind::Link,
  entity:  None,
  columns: &[
    Column::key("user_badge_hk"),
    Column::participant("user_hk", "hub_user", "user_hk"),
    Column::participant("badge_hk", "hub_badge", "badge_hk"),
    Column::load_date(),
    Column::record_source(),
  ],
};

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// Every vault table in creation order: hubs, then satellites, then links.
/// Iterate in reverse to empty tables without violating foreign keys.
pub static CATALOG: [&Table; 19] = [
  &HUB_USER,
  &HUB_POST,
  &HUB_COMMENT,
  &HUB_VOTE,
  &HUB_BADGE,
  &HUB_TAG,
  &SAT_USER,
  &SAT_POST,
  &SAT_COMMENT,
  &SAT_VOTE,
  &SAT_BADGE,
  &SAT_TAG,
  &LINK_POST_USER,
  &LINK_POST_POST,
  &LINK_POST_COMMENT,
  &LINK_POST_TAG,
  &LINK_USER_VOTE,
  &LINK_POST_VOTE,
  &LINK_USER_BADGE,
];
