//! End-to-end pipeline runs over CSV fixtures in temporary directories.

use std::fs;

use tempfile::TempDir;
use vault_core::{
  HashKey, TruncateOutcome,
  schema::{HUB_POST, HUB_USER, LINK_POST_USER},
};
use vault_etl::{Error, Pipeline, PipelineOutcome};
use vault_store_sqlite::SqliteVault;

/// Header-only versions of every dump file.
const EMPTY_DUMP: &[(&str, &str)] = &[
  ("tags.csv", "Id,TagName,Count,ExcerptPostId,WikiPostId\n"),
  (
    "users.csv",
    "Id,Reputation,CreationDate,DisplayName,LastAccessDate,WebsiteUrl,Location,AboutMe,Views,UpVotes,DownVotes,AccountId\n",
  ),
  (
    "posts.csv",
    "Id,PostTypeId,CreaionDate,Score,ViewCount,Body,OwnerUserId,LasActivityDate,Title,Tags,AnswerCount,CommentCount,FavoriteCount\n",
  ),
  ("comments.csv", "Id,PostId,Score,Text,CreationDate,UserId,UserDisplayName\n"),
  ("badges.csv", "Id,UserId,Name,Date\n"),
  ("votes.csv", "Id,PostId,VoteTypeId,CreationDate,UserId,BountyAmount\n"),
  ("postLinks.csv", "Id,CreationDate,PostId,RelatedPostId,LinkTypeId\n"),
];

/// A dump directory where `files` replace the header-only defaults.
fn dump(files: &[(&str, &str)]) -> TempDir {
  let dir = tempfile::tempdir().unwrap();
  for (name, header) in EMPTY_DUMP {
    let body = files
      .iter()
      .find(|(n, _)| n == name)
      .map_or(*header, |(_, body)| *body);
    fs::write(dir.path().join(name), body).unwrap();
  }
  dir
}

fn vault() -> SqliteVault {
  let mut vault = SqliteVault::open_in_memory().unwrap();
  vault.provision().unwrap();
  vault
}

fn run(dir: &TempDir) -> PipelineOutcome<SqliteVault> {
  Pipeline::new(vault(), dir.path()).run().unwrap()
}

fn scalar(vault: &SqliteVault, sql: &str) -> i64 {
  vault.connection().query_row(sql, [], |r| r.get(0)).unwrap()
}

// ─── Relationships ───────────────────────────────────────────────────────────

#[test]
fn post_authorship_links_user_and_post() {
  let dir = dump(&[
    ("users.csv", "Id,DisplayName\n1,Ada\n"),
    ("posts.csv", "Id,OwnerUserId\n10,1\n"),
  ]);
  let PipelineOutcome { store, report } = run(&dir);

  assert_eq!(scalar(&store, "SELECT COUNT(*) FROM hub_user"), 1);
  assert_eq!(scalar(&store, "SELECT user_business_key FROM hub_user"), 1);
  assert_eq!(scalar(&store, "SELECT COUNT(*) FROM hub_post"), 1);
  assert_eq!(scalar(&store, "SELECT post_business_key FROM hub_post"), 10);

  assert_eq!(store.hash_keys(&LINK_POST_USER, "user_hk").unwrap(), [HashKey::of("1")]);
  assert_eq!(store.hash_keys(&LINK_POST_USER, "post_hk").unwrap(), [HashKey::of("10")]);
  assert_eq!(
    store.hash_keys(&LINK_POST_USER, "post_user_hk").unwrap(),
    [HashKey::of("10_1")]
  );
  assert_eq!(report.loaded("link_post_user"), Some(1));

  let name: String = store
    .connection()
    .query_row("SELECT displayname FROM sat_user", [], |r| r.get(0))
    .unwrap();
  assert_eq!(name, "Ada");
}

#[test]
fn zero_or_missing_owner_yields_no_link() {
  let dir = dump(&[
    ("users.csv", "Id,DisplayName\n1,Ada\n"),
    ("posts.csv", "Id,OwnerUserId\n10,0\n11,\n"),
  ]);
  let PipelineOutcome { store, report } = run(&dir);

  assert_eq!(scalar(&store, "SELECT COUNT(*) FROM hub_post"), 2);
  assert_eq!(scalar(&store, "SELECT COUNT(*) FROM link_post_user"), 0);
  let stats = report.link("link_post_user").unwrap();
  assert_eq!((stats.candidates, stats.kept, stats.dropped), (2, 0, 2));
}

#[test]
fn duplicate_post_links_collapse() {
  let dir = dump(&[
    ("posts.csv", "Id,OwnerUserId\n1,\n2,\n"),
    ("postLinks.csv", "Id,PostId,RelatedPostId\n1,1,2\n2,1,2\n"),
  ]);
  let PipelineOutcome { store, report } = run(&dir);

  assert_eq!(scalar(&store, "SELECT COUNT(*) FROM link_post_post"), 1);
  let stats = report.link("link_post_post").unwrap();
  assert_eq!(stats.duplicates, 1);
  assert_eq!(stats.kept, 1);
}

#[test]
fn relationships_to_unknown_entities_are_filtered() {
  let dir = dump(&[
    ("posts.csv", "Id,OwnerUserId\n10,\n"),
    ("comments.csv", "Id,PostId,Text\n1,10,ok\n2,99,orphan\n3,10,also ok\n"),
  ]);
  let PipelineOutcome { store, report } = run(&dir);

  // N = 3 candidates, M = 1 with an unknown post: N - M reach the loader.
  assert_eq!(report.loaded("link_post_comment"), Some(2));
  assert_eq!(report.link("link_post_comment").unwrap().dropped, 1);
  assert_eq!(scalar(&store, "SELECT COUNT(*) FROM link_post_comment"), 2);
  // Comments themselves are all loaded.
  assert_eq!(scalar(&store, "SELECT COUNT(*) FROM hub_comment"), 3);
}

// ─── Entity wiring ───────────────────────────────────────────────────────────

#[test]
fn votes_feed_both_vote_links() {
  let dir = dump(&[
    ("users.csv", "Id\n1\n"),
    ("posts.csv", "Id,OwnerUserId\n10,1\n"),
    ("votes.csv", "Id,PostId,UserId,VoteTypeId\n1,10,1,2\n2,10,,2\n3,77,1,2\n"),
  ]);
  let PipelineOutcome { store, .. } = run(&dir);

  assert_eq!(scalar(&store, "SELECT COUNT(*) FROM link_user_vote"), 2);
  assert_eq!(scalar(&store, "SELECT COUNT(*) FROM link_post_vote"), 2);
  assert_eq!(
    scalar(
      &store,
      "SELECT COUNT(*) FROM link_post_vote v JOIN hub_post p ON p.post_hk = v.post_vote_hk"
    ),
    2
  );
}

#[test]
fn badges_link_to_users() {
  let dir = dump(&[
    ("users.csv", "Id\n1\n"),
    ("badges.csv", "Id,UserId,Name\n5,1,Supporter\n6,2,Autobiographer\n"),
  ]);
  let PipelineOutcome { store, .. } = run(&dir);

  assert_eq!(scalar(&store, "SELECT COUNT(*) FROM sat_badge"), 2);
  assert_eq!(scalar(&store, "SELECT COUNT(*) FROM link_user_badge"), 1);
  assert_eq!(
    scalar(&store, "SELECT COUNT(*) FROM link_user_badge WHERE user_badge_hk = sha256('1_5')"),
    1
  );
}

#[test]
fn post_tags_resolve_by_name() {
  let dir = dump(&[
    ("tags.csv", "Id,TagName,Count\n1,rust,3\n2,sql,1\n"),
    (
      "posts.csv",
      "Id,OwnerUserId,Tags\n10,,<rust><sql><nope>\n11,,<rust><rust>\n",
    ),
  ]);
  let PipelineOutcome { store, report } = run(&dir);

  assert_eq!(scalar(&store, "SELECT COUNT(*) FROM link_post_tag"), 3);
  let stats = report.link("link_post_tag").unwrap();
  assert_eq!((stats.candidates, stats.dropped, stats.duplicates), (5, 1, 1));
}

#[test]
fn satellites_are_renamed_and_truncated() {
  let users = format!("Id,DisplayName,AboutMe\n1,Ada,{}\n", "a".repeat(1000));
  let dir = dump(&[
    ("users.csv", users.as_str()),
    (
      "posts.csv",
      "Id,OwnerUserId,CreaionDate,Title,Score\n10,1,2010-07-19 19:12:12,Hello,\n",
    ),
  ]);
  let PipelineOutcome { store, .. } = run(&dir);

  assert_eq!(scalar(&store, "SELECT length(aboutme) FROM sat_user"), 800);
  assert_eq!(scalar(&store, "SELECT score FROM sat_post"), 0);
  let created: String = store
    .connection()
    .query_row("SELECT creationdate FROM sat_post", [], |r| r.get(0))
    .unwrap();
  assert_eq!(created, "2010-07-19T19:12:12.000");
}

// ─── Pipeline behavior ───────────────────────────────────────────────────────

#[test]
fn rerun_is_a_full_reload() {
  let dir = dump(&[
    ("users.csv", "Id\n1\n2\n"),
    ("posts.csv", "Id,OwnerUserId\n10,1\n"),
  ]);
  let first = run(&dir);
  let second = Pipeline::new(first.store, dir.path()).run().unwrap();

  assert_ne!(first.report.run_id, second.report.run_id);
  assert_eq!(scalar(&second.store, "SELECT COUNT(*) FROM hub_user"), 2);
  let hub_user = second
    .report
    .truncated
    .iter()
    .find(|t| t.table == "hub_user")
    .unwrap();
  assert_eq!(hub_user.outcome, TruncateOutcome::Emptied { rows_removed: 2 });
  assert_eq!(second.report.count("link_post_user"), Some(1));
  assert_eq!(second.report.counts.len(), vault_core::CATALOG.len());
}

#[test]
fn truncate_tolerates_missing_tables() {
  let dir = dump(&[("users.csv", "Id\n1\n")]);
  let vault = vault();
  vault.connection().execute_batch("DROP TABLE link_user_badge").unwrap();

  let outcome = Pipeline::new(vault, dir.path()).run().unwrap();
  let badge = outcome
    .report
    .truncated
    .iter()
    .find(|t| t.table == "link_user_badge")
    .unwrap();
  assert_eq!(badge.outcome, TruncateOutcome::Missing);
  assert_eq!(outcome.report.count("link_user_badge"), None);
  assert_eq!(outcome.report.count("hub_user"), Some(1));
}

#[test]
fn missing_file_halts_later_stages() {
  let dir = dump(&[
    ("users.csv", "Id\n1\n"),
    ("posts.csv", "Id,OwnerUserId\n10,1\n11,1\n"),
    ("badges.csv", "Id,UserId,Name\n5,1,Supporter\n"),
    ("postLinks.csv", "Id,PostId,RelatedPostId\n1,10,11\n"),
  ]);
  fs::remove_file(dir.path().join("votes.csv")).unwrap();

  let db = dir.path().join("vault.db");
  let mut vault = SqliteVault::open(&db).unwrap();
  vault.provision().unwrap();

  let err = Pipeline::new(vault, dir.path()).run().err().unwrap();
  assert!(matches!(err, Error::MissingFile(ref p) if p.ends_with("votes.csv")), "{err}");

  let vault = SqliteVault::open(&db).unwrap();
  assert_eq!(scalar(&vault, "SELECT COUNT(*) FROM link_user_badge"), 1);
  assert_eq!(scalar(&vault, "SELECT COUNT(*) FROM hub_vote"), 0);
  assert_eq!(scalar(&vault, "SELECT COUNT(*) FROM link_post_post"), 0);
}

#[test]
fn missing_required_column_is_named() {
  let dir = dump(&[("posts.csv", "Id,Title\n10,Hello\n")]);
  let err = Pipeline::new(vault(), dir.path()).run().err().unwrap();
  match err {
    Error::MissingColumns { file, columns } => {
      assert_eq!(file, "posts.csv");
      assert_eq!(columns, ["OwnerUserId"]);
    }
    other => panic!("expected MissingColumns, got {other:?}"),
  }
}

#[test]
fn hub_keys_match_business_keys_after_a_run() {
  let dir = dump(&[
    ("users.csv", "Id\n1\n2\n3\n"),
    ("posts.csv", "Id,OwnerUserId\n10,1\n20,2\n"),
  ]);
  let PipelineOutcome { store, .. } = run(&dir);

  for (table, hk, bk) in [
    (&HUB_USER, "user_hk", "user_business_key"),
    (&HUB_POST, "post_hk", "post_business_key"),
  ] {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE {hk} != sha256({bk})", table.name);
    assert_eq!(scalar(&store, &sql), 0, "{}", table.name);
  }
}
