//! Per-entity ETL steps.
//!
//! Each step reads its entity's file, loads the hub and then the satellite,
//! and emits the links that file carries. Relationship keys are checked
//! against the referenced entity's own file before any link row is built.

use std::collections::HashMap;

use tracing::{info, warn};
use vault_core::{
  Column, ColumnType, Entity, Row, Table, Value, VaultStore,
  schema::{
    LINK_POST_COMMENT, LINK_POST_POST, LINK_POST_TAG, LINK_POST_USER, LINK_POST_VOTE,
    LINK_USER_BADGE, LINK_USER_VOTE,
  },
  value::parse_timestamp,
};

use crate::{
  Frame, PipelineContext, Result,
  relation::{Candidate, Relation},
};

/// Business-key column of every dump file.
pub const ID: &str = "Id";

pub const POST_LINKS_FILE: &str = "postLinks.csv";

/// Misspelled headers found in some posts dumps.
const POST_HEADER_FIXES: &[(&str, &str)] = &[
  ("CreaionDate", "CreationDate"),
  ("LasActivityDate", "LastActivityDate"),
];

// ─── Entities ────────────────────────────────────────────────────────────────

pub fn load_tags<S: VaultStore>(ctx: &mut PipelineContext<S>) -> Result<()> {
  load_entity(ctx, Entity::Tag, &[ID], &[])?;
  Ok(())
}

pub fn load_users<S: VaultStore>(ctx: &mut PipelineContext<S>) -> Result<()> {
  load_entity(ctx, Entity::User, &[ID], &[])?;
  Ok(())
}

/// Posts carry authorship (`OwnerUserId`) and tagging (`Tags`).
pub fn load_posts<S: VaultStore>(ctx: &mut PipelineContext<S>) -> Result<()> {
  let source = Entity::Post.source_file();
  let posts = load_entity(ctx, Entity::Post, &[ID, "OwnerUserId"], POST_HEADER_FIXES)?;

  let users = ctx.valid_ids(Entity::User)?;
  let authorship = pairs(&posts, ID, "OwnerUserId")?;
  ctx.load_link(Relation::new(&LINK_POST_USER).right_in(&users), authorship, source)?;

  if !posts.has_column("Tags") {
    warn!(file = source, "no Tags column, skipping post-tag links");
    return Ok(());
  }
  let tags = tag_ids(ctx)?;
  let tagging = post_tag_candidates(&posts, &tags)?;
  ctx.load_link(Relation::new(&LINK_POST_TAG).deduplicated(), tagging, source)?;
  Ok(())
}

pub fn load_comments<S: VaultStore>(ctx: &mut PipelineContext<S>) -> Result<()> {
  let source = Entity::Comment.source_file();
  let comments = load_entity(ctx, Entity::Comment, &[ID, "PostId"], &[])?;

  let posts = ctx.valid_ids(Entity::Post)?;
  let candidates = pairs(&comments, "PostId", ID)?;
  ctx.load_link(Relation::new(&LINK_POST_COMMENT).left_in(&posts), candidates, source)?;
  Ok(())
}

pub fn load_badges<S: VaultStore>(ctx: &mut PipelineContext<S>) -> Result<()> {
  let source = Entity::Badge.source_file();
  let badges = load_entity(ctx, Entity::Badge, &[ID, "UserId"], &[])?;

  let users = ctx.valid_ids(Entity::User)?;
  let candidates = pairs(&badges, "UserId", ID)?;
  ctx.load_link(Relation::new(&LINK_USER_BADGE).left_in(&users), candidates, source)?;
  Ok(())
}

/// One vote file feeds both the user-vote and post-vote links.
pub fn load_votes<S: VaultStore>(ctx: &mut PipelineContext<S>) -> Result<()> {
  let source = Entity::Vote.source_file();
  let votes = load_entity(ctx, Entity::Vote, &[ID, "PostId", "UserId"], &[])?;

  let users = ctx.valid_ids(Entity::User)?;
  let candidates = pairs(&votes, "UserId", ID)?;
  ctx.load_link(Relation::new(&LINK_USER_VOTE).left_in(&users), candidates, source)?;

  let posts = ctx.valid_ids(Entity::Post)?;
  let candidates = pairs(&votes, "PostId", ID)?;
  ctx.load_link(Relation::new(&LINK_POST_VOTE).left_in(&posts), candidates, source)?;
  Ok(())
}

/// Related-post links, deduplicated on `(PostId, RelatedPostId)`.
pub fn load_post_links<S: VaultStore>(ctx: &mut PipelineContext<S>) -> Result<()> {
  let links = ctx.read(POST_LINKS_FILE)?;
  links.require(&["PostId", "RelatedPostId"])?;

  let posts = ctx.valid_ids(Entity::Post)?;
  let candidates = pairs(&links, "PostId", "RelatedPostId")?;
  let relation = Relation::new(&LINK_POST_POST)
    .left_in(&posts)
    .right_in(&posts)
    .deduplicated();
  ctx.load_link(relation, candidates, POST_LINKS_FILE)?;
  Ok(())
}

// ─── Hubs and satellites ─────────────────────────────────────────────────────

/// Read `entity`'s file and load its hub, then its satellite.
fn load_entity<S: VaultStore>(
  ctx: &mut PipelineContext<S>,
  entity: Entity,
  required: &[&str],
  header_fixes: &[(&str, &str)],
) -> Result<Frame> {
  let source = entity.source_file();
  info!(entity = entity.name(), "starting entity load");

  let mut frame = ctx.read(source)?;
  frame.rename_columns(header_fixes);
  frame.require(required)?;

  let skipped = frame.records().filter(|r| r.get(ID).is_none()).count();
  if skipped > 0 {
    warn!(file = source, rows = skipped, "skipping rows without an Id");
  }

  let hub_rows: Vec<Row> = frame
    .records()
    .filter(|r| r.get(ID).is_some())
    .map(|r| Row::from([(ID.to_owned(), r.value(ID))]))
    .collect();
  ctx.load(entity.hub(), &hub_rows, ID, source)?;

  let sat_rows = satellite_rows(entity.satellite(), &frame);
  ctx.load(entity.satellite(), &sat_rows, ID, source)?;

  info!(entity = entity.name(), "entity loaded");
  Ok(frame)
}

/// Satellite input: `Id` plus every attribute whose raw column the file has,
/// renamed to the attribute's name with blanks filled by type.
pub fn satellite_rows(table: &'static Table, frame: &Frame) -> Vec<Row> {
  let present: Vec<(&Column, &str)> = table
    .attributes()
    .filter_map(|c| c.source.filter(|s| frame.has_column(s)).map(|s| (c, s)))
    .collect();

  frame
    .records()
    .filter(|r| r.get(ID).is_some())
    .map(|record| {
      let mut row = Row::new();
      row.insert(ID.to_owned(), record.value(ID));
      for (column, raw) in &present {
        row.insert(column.name.to_owned(), normalize(column, record.get(raw)));
      }
      row
    })
    .collect()
}

/// Blank text becomes `""`, blank numbers `0`; timestamps are parsed and
/// left `Null` when they cannot be.
fn normalize(column: &Column, raw: Option<&str>) -> Value {
  match (column.ty, raw) {
    (ColumnType::Timestamp, raw) => {
      raw.and_then(parse_timestamp).map_or(Value::Null, Value::Timestamp)
    }
    (_, Some(cell)) => Value::from(cell),
    (ColumnType::Integer, None) => Value::Integer(0),
    (ColumnType::Text | ColumnType::Varchar(_), None) => Value::from(""),
    (ColumnType::HashKey, None) => Value::Null,
  }
}

// ─── Relationship input ──────────────────────────────────────────────────────

/// `(left, right)` integer pairs from two columns of `frame`.
fn pairs(frame: &Frame, left: &str, right: &str) -> Result<Vec<Candidate>> {
  frame
    .records()
    .map(|r| Ok((r.integer(left)?, r.integer(right)?)))
    .collect()
}

/// `TagName → Id` from the tags file.
fn tag_ids<S: VaultStore>(ctx: &PipelineContext<S>) -> Result<HashMap<String, i64>> {
  let tags = ctx.read(Entity::Tag.source_file())?;
  tags.require(&[ID])?;
  if !tags.has_column("TagName") {
    warn!("tags file has no TagName column, no post-tag links can resolve");
  }
  let mut ids = HashMap::with_capacity(tags.len());
  for record in tags.records() {
    if let (Some(name), Some(id)) = (record.get("TagName"), record.integer(ID)?) {
      ids.insert(name.trim().to_owned(), id);
    }
  }
  Ok(ids)
}

/// Tag names in a `Tags` cell, in either `<a><b>` or `|a|b|` form.
pub fn split_tags(cell: &str) -> impl Iterator<Item = &str> {
  cell.split(['<', '>', '|']).map(str::trim).filter(|t| !t.is_empty())
}

/// One candidate per tag mention; unknown names resolve to no key.
fn post_tag_candidates(posts: &Frame, tags: &HashMap<String, i64>) -> Result<Vec<Candidate>> {
  let mut candidates = Vec::new();
  for record in posts.records() {
    let post = record.integer(ID)?;
    for name in split_tags(record.get("Tags").unwrap_or_default()) {
      candidates.push((post, tags.get(name).copied()));
    }
  }
  Ok(candidates)
}
