//! Integration tests for `SqliteVault` against in-memory databases.

use vault_core::{
  CATALOG, HashKey, Row, TruncateOutcome, Value, VaultStore,
  schema::{HUB_POST, HUB_USER, LINK_POST_USER, LINK_POST_VOTE, SAT_USER},
};

use crate::{Error, SqliteVault};

fn vault() -> SqliteVault {
  let mut vault = SqliteVault::open_in_memory().expect("in-memory vault");
  vault.provision().expect("provision");
  vault
}

fn row(cells: &[(&str, Value)]) -> Row {
  cells
    .iter()
    .map(|(name, value)| ((*name).to_owned(), value.clone()))
    .collect()
}

fn ids(ids: &[i64]) -> Vec<Row> {
  ids.iter().map(|id| row(&[("Id", Value::Integer(*id))])).collect()
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[test]
fn provision_creates_every_catalog_table() {
  let v = vault();
  let names = v.table_names().unwrap();
  assert_eq!(names.len(), CATALOG.len());
  for table in CATALOG {
    assert!(names.contains(table.name), "{}", table.name);
  }
  v.verify().unwrap();
}

#[test]
fn verify_names_missing_tables() {
  let v = SqliteVault::open_in_memory().unwrap();
  match v.verify() {
    Err(Error::MissingTables(missing)) => assert_eq!(missing.len(), CATALOG.len()),
    other => panic!("expected MissingTables, got {other:?}"),
  }

  let v = vault();
  v.connection().execute_batch("DROP TABLE link_post_tag").unwrap();
  match v.verify() {
    Err(Error::MissingTables(missing)) => assert_eq!(missing, ["link_post_tag"]),
    other => panic!("expected MissingTables, got {other:?}"),
  }
}

#[test]
fn provision_replaces_existing_tables_and_data() {
  let mut v = vault();
  v.connection().execute_batch("CREATE TABLE legacy (x INTEGER)").unwrap();
  v.load(&HUB_USER, &ids(&[1, 2]), "Id", "users.csv").unwrap();

  v.provision().unwrap();
  assert!(!v.table_names().unwrap().contains("legacy"));
  assert_eq!(v.count_rows(&HUB_USER).unwrap(), 0);
}

#[test]
fn provisioned_file_database_reopens() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("vault.db");
  {
    let mut v = SqliteVault::open(&path).unwrap();
    v.provision().unwrap();
    v.load(&HUB_USER, &ids(&[5]), "Id", "users.csv").unwrap();
    v.close().unwrap();
  }
  let v = SqliteVault::open(&path).unwrap();
  v.verify().unwrap();
  assert_eq!(v.count_rows(&HUB_USER).unwrap(), 1);
}

#[test]
fn sql_sha256_matches_hash_key() {
  let v = vault();
  let (int, text, null): (Vec<u8>, Vec<u8>, Option<Vec<u8>>) = v
    .connection()
    .query_row("SELECT sha256(42), sha256('42'), sha256(NULL)", [], |r| {
      Ok((r.get(0)?, r.get(1)?, r.get(2)?))
    })
    .unwrap();
  assert_eq!(int, HashKey::of(42).as_bytes());
  assert_eq!(text, HashKey::of(42).as_bytes());
  assert_eq!(null, None);
}

#[test]
fn sql_sha256_hashes_reals_by_their_text_form() {
  let v = vault();
  let same: (bool, bool, bool, bool) = v
    .connection()
    .query_row(
      "SELECT sha256(1.0) = sha256('1.0'),
              sha256(1.0) = sha256(1),
              sha256(0.5) = sha256(CAST(0.5 AS TEXT)),
              sha256(123.25) = sha256(CAST(123.25 AS TEXT))",
      [],
      |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
    )
    .unwrap();
  assert_eq!(same, (true, false, true, true));
}

// ─── Hubs and satellites ─────────────────────────────────────────────────────

#[test]
fn hub_keys_are_hashes_of_business_keys() {
  let mut v = vault();
  let loaded = v.load(&HUB_USER, &ids(&[1, 2, 3]), "Id", "users.csv").unwrap();
  assert_eq!(loaded, 3);

  let mismatched: i64 = v
    .connection()
    .query_row(
      "SELECT COUNT(*) FROM hub_user WHERE user_hk != sha256(user_business_key)",
      [],
      |r| r.get(0),
    )
    .unwrap();
  assert_eq!(mismatched, 0);

  let mut keys = v.hash_keys(&HUB_USER, "user_hk").unwrap();
  keys.sort();
  let mut expected = vec![HashKey::of(1), HashKey::of(2), HashKey::of(3)];
  expected.sort();
  assert_eq!(keys, expected);

  let (dates, source): (i64, String) = v
    .connection()
    .query_row(
      "SELECT COUNT(DISTINCT load_date), MIN(source) FROM hub_user",
      [],
      |r| Ok((r.get(0)?, r.get(1)?)),
    )
    .unwrap();
  assert_eq!(dates, 1);
  assert_eq!(source, "users.csv");
}

#[test]
fn business_keys_in_text_form_are_accepted() {
  let mut v = vault();
  let rows = vec![row(&[("Id", Value::from("7"))])];
  v.load(&HUB_POST, &rows, "Id", "posts.csv").unwrap();
  assert_eq!(v.hash_keys(&HUB_POST, "post_hk").unwrap(), [HashKey::of(7)]);
}

#[test]
fn missing_or_malformed_business_key_fails_the_load() {
  let mut v = vault();
  let rows = vec![row(&[("Id", Value::Integer(1))]), row(&[("Id", Value::Null)])];
  let err = v.load(&HUB_USER, &rows, "Id", "users.csv").unwrap_err();
  assert!(matches!(err, Error::MissingBusinessKey { row: 1, .. }), "{err:?}");

  let rows = vec![row(&[("Id", Value::from("abc"))])];
  let err = v.load(&HUB_USER, &rows, "Id", "users.csv").unwrap_err();
  assert!(matches!(err, Error::RowValue { row: 0, .. }), "{err:?}");

  assert_eq!(v.count_rows(&HUB_USER).unwrap(), 0);
}

#[test]
fn satellite_truncates_and_omits_nulls() {
  let mut v = vault();
  v.load(&HUB_USER, &ids(&[1]), "Id", "users.csv").unwrap();

  let rows = vec![row(&[
    ("Id", Value::Integer(1)),
    ("aboutme", Value::from("a".repeat(1000))),
    ("displayname", Value::Null),
    ("reputation", Value::from("101")),
    ("creationdate", Value::from("2010-07-19 19:12:12")),
    ("Unrelated", Value::from("ignored")),
  ])];
  v.load(&SAT_USER, &rows, "Id", "users.csv").unwrap();

  let (about_len, name, rep, created): (i64, Option<String>, i64, String) = v
    .connection()
    .query_row(
      "SELECT length(aboutme), displayname, reputation, creationdate FROM sat_user",
      [],
      |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
    )
    .unwrap();
  assert_eq!(about_len, 800);
  assert_eq!(name, None);
  assert_eq!(rep, 101);
  assert_eq!(created, "2010-07-19T19:12:12.000");
}

#[test]
fn satellite_requires_its_hub_row() {
  let mut v = vault();
  let err = v.load(&SAT_USER, &ids(&[9]), "Id", "users.csv").unwrap_err();
  assert!(matches!(err, Error::RowInsert { table: "sat_user", row: 0, .. }), "{err:?}");
}

#[test]
fn empty_input_is_a_no_op() {
  let mut v = vault();
  assert_eq!(v.load(&HUB_USER, &[], "Id", "users.csv").unwrap(), 0);
  assert_eq!(v.load(&LINK_POST_USER, &[], "", "posts.csv").unwrap(), 0);
}

// ─── Links ───────────────────────────────────────────────────────────────────

fn post_user_row(post: i64, user: i64) -> Row {
  row(&[
    ("post_user_hk", Value::Key(HashKey::composite(&[post, user]))),
    ("post_hk", Value::Key(HashKey::of(post))),
    ("user_hk", Value::Key(HashKey::of(user))),
  ])
}

#[test]
fn link_rows_reference_hubs() {
  let mut v = vault();
  v.load(&HUB_USER, &ids(&[1]), "Id", "users.csv").unwrap();
  v.load(&HUB_POST, &ids(&[10]), "Id", "posts.csv").unwrap();

  let loaded = v.load(&LINK_POST_USER, &[post_user_row(10, 1)], "", "posts.csv").unwrap();
  assert_eq!(loaded, 1);
  assert_eq!(v.hash_keys(&LINK_POST_USER, "user_hk").unwrap(), [HashKey::of(1)]);
  assert_eq!(
    v.hash_keys(&LINK_POST_USER, "post_user_hk").unwrap(),
    [HashKey::of("10_1")]
  );
}

#[test]
fn link_without_key_columns_inserts_nothing() {
  let mut v = vault();
  v.load(&HUB_USER, &ids(&[1]), "Id", "users.csv").unwrap();
  v.load(&HUB_POST, &ids(&[10]), "Id", "posts.csv").unwrap();

  let mut incomplete = post_user_row(10, 1);
  incomplete.remove("user_hk");
  let rows = vec![post_user_row(10, 1), incomplete];

  let err = v.load(&LINK_POST_USER, &rows, "", "posts.csv").unwrap_err();
  match err {
    Error::MissingColumns { table, columns } => {
      assert_eq!(table, "link_post_user");
      assert_eq!(columns, ["user_hk"]);
    }
    other => panic!("expected MissingColumns, got {other:?}"),
  }
  assert_eq!(v.count_rows(&LINK_POST_USER).unwrap(), 0);
}

#[test]
fn keyless_link_layout_loads() {
  let mut v = vault();
  v.load(&HUB_POST, &ids(&[10]), "Id", "posts.csv").unwrap();
  v.load(&vault_core::schema::HUB_VOTE, &ids(&[3]), "Id", "votes.csv").unwrap();

  let rows = vec![row(&[
    ("post_vote_hk", Value::Key(HashKey::of(10))),
    ("vote_hk", Value::Key(HashKey::of(3))),
  ])];
  assert_eq!(v.load(&LINK_POST_VOTE, &rows, "", "votes.csv").unwrap(), 1);
}

#[test]
fn failing_row_rolls_back_the_whole_table() {
  let mut v = vault();
  v.load(&HUB_USER, &ids(&[1]), "Id", "users.csv").unwrap();
  v.load(&HUB_POST, &ids(&[10]), "Id", "posts.csv").unwrap();

  // User 2 has no hub row.
  let rows = vec![post_user_row(10, 1), post_user_row(10, 2)];
  let err = v.load(&LINK_POST_USER, &rows, "", "posts.csv").unwrap_err();
  assert!(matches!(err, Error::RowInsert { row: 1, .. }), "{err:?}");
  assert_eq!(v.count_rows(&LINK_POST_USER).unwrap(), 0);
}

// ─── Truncate ────────────────────────────────────────────────────────────────

#[test]
fn truncate_is_idempotent() {
  let mut v = vault();
  v.load(&HUB_USER, &ids(&[1, 2]), "Id", "users.csv").unwrap();
  v.load(&SAT_USER, &ids(&[1]), "Id", "users.csv").unwrap();

  for table in CATALOG.iter().rev() {
    v.truncate(table).unwrap();
  }
  assert_eq!(v.count_rows(&HUB_USER).unwrap(), 0);

  for table in CATALOG.iter().rev() {
    assert_eq!(
      v.truncate(table).unwrap(),
      TruncateOutcome::Emptied { rows_removed: 0 }
    );
  }
}

#[test]
fn truncate_of_missing_table_is_reported() {
  let mut v = vault();
  v.connection().execute_batch("DROP TABLE link_user_badge").unwrap();
  assert_eq!(v.truncate(&vault_core::schema::LINK_USER_BADGE).unwrap(), TruncateOutcome::Missing);
  assert_eq!(v.truncate(&vault_core::schema::LINK_USER_BADGE).unwrap(), TruncateOutcome::Missing);
}
