//! [`Analytics`]: read-only queries over a loaded vault.
//!
//! Every query runs on the background thread owned by the
//! [`tokio_rusqlite::Connection`]. The connection is switched to
//! `query_only`, so no request can modify the vault.

use std::path::Path;

use rusqlite::{OpenFlags, params};
use serde::Serialize;
use tracing::debug;
use vault_core::{CATALOG, TableKind};

pub type Result<T, E = tokio_rusqlite::Error> = std::result::Result<T, E>;

// ─── Results ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct TableCount {
  pub table: &'static str,
  pub kind:  TableKind,
  pub rows:  u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
  pub tables:                   Vec<TableCount>,
  /// Comments whose satellite carries non-empty text.
  pub comments_with_text:       u64,
  /// Distinct comments attached to a post.
  pub comments_linked_to_posts: u64,
  /// Distinct posts with a known author.
  pub posts_with_author:        u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagUsage {
  pub tag_id:  i64,
  pub tagname: Option<String>,
  pub posts:   u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InactiveTags {
  pub inactive: u64,
  pub total:    u64,
  /// `inactive / total`, or 0 for an empty vault.
  pub ratio:    f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
  Active,
  NonActive,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserActivity {
  pub user_id:       i64,
  pub displayname:   Option<String>,
  pub post_count:    u64,
  /// Comments left on this user's posts.
  pub comment_count: u64,
  pub status:        ActivityStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityReport {
  pub average_posts:    f64,
  pub average_comments: f64,
  pub users:            Vec<UserActivity>,
}

/// Seconds between a post's creation and the comments it received.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseTimes {
  pub user_id:     i64,
  pub displayname: Option<String>,
  pub comments:    u64,
  pub avg_seconds: f64,
  pub min_seconds: f64,
  pub max_seconds: f64,
}

/// Length in characters of the non-empty comments a user's posts received.
#[derive(Debug, Clone, Serialize)]
pub struct CommentLengths {
  pub user_id:          i64,
  pub displayname:      Option<String>,
  pub comments:         u64,
  pub avg_length:       f64,
  pub longest:          u64,
  pub shortest:         u64,
  pub total_characters: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagEngagement {
  pub tag_id:               i64,
  pub tagname:              Option<String>,
  pub posts:                u64,
  pub comments:             u64,
  pub comments_per_post:    f64,
  /// `None` when no tagged post has a comment.
  pub avg_response_minutes: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewsPerAnswer {
  /// Mean of `viewcount / answercount` over answered posts; `None` when no
  /// post has an answer.
  pub average: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewsPerQuestion {
  /// `None` when no post has an answer.
  pub average_views: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentScoreRatio {
  pub comments:    u64,
  pub total_score: i64,
  /// `total_score / comments`, or 0 when there are no comments.
  pub ratio:       f64,
}

// ─── Queries ─────────────────────────────────────────────────────────────────

const LINK_COVERAGE: &str = "
SELECT
  (SELECT COUNT(*) FROM sat_comment WHERE text IS NOT NULL AND text != ''),
  (SELECT COUNT(DISTINCT comment_hk) FROM link_post_comment),
  (SELECT COUNT(DISTINCT post_hk) FROM link_post_user)";

const POPULAR_TAGS: &str = "
SELECT ht.tag_business_key, st.tagname, COUNT(DISTINCT lpt.post_hk) AS posts
FROM hub_tag ht
JOIN link_post_tag lpt ON lpt.tag_hk = ht.tag_hk
LEFT JOIN sat_tag st ON st.tag_hk = ht.tag_hk
GROUP BY ht.tag_hk, ht.tag_business_key, st.tagname
ORDER BY posts DESC, ht.tag_business_key ASC
LIMIT ?1";

const INACTIVE_TAGS: &str = "
WITH usage AS (
  SELECT ht.tag_hk, COUNT(lpt.post_hk) AS posts
  FROM hub_tag ht
  LEFT JOIN link_post_tag lpt ON lpt.tag_hk = ht.tag_hk
  GROUP BY ht.tag_hk
)
SELECT COALESCE(SUM(posts = 0), 0), COUNT(*) FROM usage";

/// Per-user posts authored and comments received, the basis of both the
/// activity ranking and its averages.
macro_rules! activity_cte {
  () => {
    "
WITH activity AS (
  SELECT hu.user_business_key AS user_id,
         su.displayname,
         COUNT(DISTINCT lpu.post_hk) AS post_count,
         COUNT(DISTINCT lpc.comment_hk) AS comment_count
  FROM hub_user hu
  LEFT JOIN sat_user su ON su.user_hk = hu.user_hk
  LEFT JOIN link_post_user lpu ON lpu.user_hk = hu.user_hk
  LEFT JOIN link_post_comment lpc ON lpc.post_hk = lpu.post_hk
  GROUP BY hu.user_hk, hu.user_business_key, su.displayname
)"
  };
}

const ACTIVITY_AVERAGES: &str = concat!(
  activity_cte!(),
  "
SELECT COALESCE(AVG(post_count), 0.0), COALESCE(AVG(comment_count), 0.0) FROM activity"
);

/// `?2` and `?3` are the averages from [`ACTIVITY_AVERAGES`].
const USER_ACTIVITY: &str = concat!(
  activity_cte!(),
  "
SELECT user_id, displayname, post_count, comment_count,
       post_count > ?2 OR comment_count > ?3
FROM activity
ORDER BY post_count + comment_count DESC, user_id ASC
LIMIT ?1"
);

const FASTEST_COMMENTERS: &str = "
WITH timing AS (
  SELECT hu.user_business_key AS user_id,
         su.displayname,
         (julianday(sc.creationdate) - julianday(sp.creationdate)) * 86400.0 AS seconds
  FROM sat_comment sc
  JOIN link_post_comment lpc ON lpc.comment_hk = sc.comment_hk
  JOIN sat_post sp ON sp.post_hk = lpc.post_hk
  JOIN link_post_user lpu ON lpu.post_hk = lpc.post_hk
  JOIN hub_user hu ON hu.user_hk = lpu.user_hk
  LEFT JOIN sat_user su ON su.user_hk = hu.user_hk
  WHERE sc.creationdate IS NOT NULL
    AND sp.creationdate IS NOT NULL
    AND sc.creationdate > sp.creationdate
)
SELECT user_id, displayname, COUNT(*),
       ROUND(AVG(seconds), 2), ROUND(MIN(seconds), 2), ROUND(MAX(seconds), 2)
FROM timing
GROUP BY user_id, displayname
ORDER BY AVG(seconds) ASC, user_id ASC
LIMIT ?1";

const LONGEST_COMMENTS: &str = "
WITH lengths AS (
  SELECT hu.user_business_key AS user_id,
         su.displayname,
         length(sc.text) AS chars
  FROM sat_comment sc
  JOIN link_post_comment lpc ON lpc.comment_hk = sc.comment_hk
  JOIN link_post_user lpu ON lpu.post_hk = lpc.post_hk
  JOIN hub_user hu ON hu.user_hk = lpu.user_hk
  LEFT JOIN sat_user su ON su.user_hk = hu.user_hk
  WHERE sc.text IS NOT NULL AND sc.text != ''
)
SELECT user_id, displayname, COUNT(*),
       ROUND(AVG(chars), 2), MAX(chars), MIN(chars), SUM(chars)
FROM lengths
GROUP BY user_id, displayname
HAVING COUNT(*) >= ?2
ORDER BY AVG(chars) DESC, user_id ASC
LIMIT ?1";

const TAG_ENGAGEMENT: &str = "
WITH engagement AS (
  SELECT ht.tag_business_key AS tag_id,
         st.tagname,
         COUNT(DISTINCT lpt.post_hk) AS posts,
         COUNT(DISTINCT lpc.comment_hk) AS comments,
         AVG((julianday(sc.creationdate) - julianday(sp.creationdate)) * 1440.0) AS minutes
  FROM hub_tag ht
  JOIN link_post_tag lpt ON lpt.tag_hk = ht.tag_hk
  LEFT JOIN sat_tag st ON st.tag_hk = ht.tag_hk
  LEFT JOIN sat_post sp ON sp.post_hk = lpt.post_hk
  LEFT JOIN link_post_comment lpc ON lpc.post_hk = lpt.post_hk
  LEFT JOIN sat_comment sc ON sc.comment_hk = lpc.comment_hk
  GROUP BY ht.tag_hk, ht.tag_business_key, st.tagname
)
SELECT tag_id, tagname, posts, comments,
       CAST(comments AS REAL) / posts, ROUND(minutes, 2)
FROM engagement
ORDER BY comments DESC, tag_id ASC
LIMIT ?1";

const VIEWS_PER_ANSWER: &str = "
SELECT AVG(CAST(viewcount AS REAL) / NULLIF(answercount, 0)) FROM sat_post";

const VIEWS_PER_QUESTION: &str = "
SELECT AVG(sp.viewcount)
FROM hub_post hp
JOIN sat_post sp ON sp.post_hk = hp.post_hk
WHERE sp.answercount > 0";

const COMMENT_SCORE: &str = "
SELECT
  (SELECT COUNT(*) FROM hub_comment),
  (SELECT COALESCE(SUM(score), 0) FROM sat_post)";

// ─── Analytics ───────────────────────────────────────────────────────────────

/// Read-only handle on a vault database. Cloning shares the connection.
#[derive(Clone)]
pub struct Analytics {
  conn: tokio_rusqlite::Connection,
}

impl Analytics {
  /// Open an existing vault at `path`. Fails if the file does not exist.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    // No SQLITE_OPEN_CREATE: a missing vault is an error, not an empty one.
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
      | OpenFlags::SQLITE_OPEN_URI
      | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = tokio_rusqlite::Connection::open_with_flags(path, flags).await?;
    conn
      .call(|conn| {
        conn.execute_batch("PRAGMA query_only = ON;")?;
        Ok(())
      })
      .await?;
    Ok(Self { conn })
  }

  /// Row counts for every catalog table plus relationship coverage.
  pub async fn summary(&self) -> Result<Summary> {
    self
      .conn
      .call(|conn| {
        let mut tables = Vec::with_capacity(CATALOG.len());
        for table in CATALOG {
          let rows: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.name),
            [],
            |row| row.get(0),
          )?;
          tables.push(TableCount { table: table.name, kind: table.kind, rows: rows as u64 });
        }
        let (with_text, linked, authored): (i64, i64, i64) =
          conn.query_row(LINK_COVERAGE, [], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        Ok(Summary {
          tables,
          comments_with_text: with_text as u64,
          comments_linked_to_posts: linked as u64,
          posts_with_author: authored as u64,
        })
      })
      .await
  }

  /// Tags ranked by how many posts carry them.
  pub async fn popular_tags(&self, limit: u32) -> Result<Vec<TagUsage>> {
    let tags = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(POPULAR_TAGS)?;
        let rows = stmt.query_map(params![limit], |row| {
          Ok(TagUsage {
            tag_id:  row.get(0)?,
            tagname: row.get(1)?,
            posts:   row.get::<_, i64>(2)? as u64,
          })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
      })
      .await?;
    debug!(limit, rows = tags.len(), "popular tags");
    Ok(tags)
  }

  /// Tags no post links to.
  pub async fn inactive_tags(&self) -> Result<InactiveTags> {
    self
      .conn
      .call(|conn| {
        let (inactive, total): (i64, i64) =
          conn.query_row(INACTIVE_TAGS, [], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let ratio = if total == 0 { 0.0 } else { inactive as f64 / total as f64 };
        Ok(InactiveTags { inactive: inactive as u64, total: total as u64, ratio })
      })
      .await
  }

  /// Users ranked by posts authored plus comments received. A user is active
  /// when either count is above the average across all users.
  pub async fn user_activity(&self, limit: u32) -> Result<ActivityReport> {
    self
      .conn
      .call(move |conn| {
        let (average_posts, average_comments): (f64, f64) =
          conn.query_row(ACTIVITY_AVERAGES, [], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut stmt = conn.prepare_cached(USER_ACTIVITY)?;
        let users = stmt
          .query_map(params![limit, average_posts, average_comments], |row| {
            let active: bool = row.get(4)?;
            Ok(UserActivity {
              user_id:       row.get(0)?,
              displayname:   row.get(1)?,
              post_count:    row.get::<_, i64>(2)? as u64,
              comment_count: row.get::<_, i64>(3)? as u64,
              status:        if active {
                ActivityStatus::Active
              } else {
                ActivityStatus::NonActive
              },
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(ActivityReport { average_posts, average_comments, users })
      })
      .await
  }

  /// Post authors ranked by how quickly their posts draw comments.
  pub async fn fastest_commenters(&self, limit: u32) -> Result<Vec<ResponseTimes>> {
    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(FASTEST_COMMENTERS)?;
        let rows = stmt.query_map(params![limit], |row| {
          Ok(ResponseTimes {
            user_id:     row.get(0)?,
            displayname: row.get(1)?,
            comments:    row.get::<_, i64>(2)? as u64,
            avg_seconds: row.get(3)?,
            min_seconds: row.get(4)?,
            max_seconds: row.get(5)?,
          })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
      })
      .await
  }

  /// Users whose posts drew the longest comments on average, among users
  /// with at least `min_comments` non-empty comments.
  pub async fn longest_comments(
    &self,
    limit: u32,
    min_comments: u32,
  ) -> Result<Vec<CommentLengths>> {
    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(LONGEST_COMMENTS)?;
        let rows = stmt.query_map(params![limit, min_comments], |row| {
          Ok(CommentLengths {
            user_id:          row.get(0)?,
            displayname:      row.get(1)?,
            comments:         row.get::<_, i64>(2)? as u64,
            avg_length:       row.get(3)?,
            longest:          row.get::<_, i64>(4)? as u64,
            shortest:         row.get::<_, i64>(5)? as u64,
            total_characters: row.get::<_, i64>(6)? as u64,
          })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
      })
      .await
  }

  /// Tags ranked by the comments their posts received.
  pub async fn tag_engagement(&self, limit: u32) -> Result<Vec<TagEngagement>> {
    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(TAG_ENGAGEMENT)?;
        let rows = stmt.query_map(params![limit], |row| {
          Ok(TagEngagement {
            tag_id:               row.get(0)?,
            tagname:              row.get(1)?,
            posts:                row.get::<_, i64>(2)? as u64,
            comments:             row.get::<_, i64>(3)? as u64,
            comments_per_post:    row.get(4)?,
            avg_response_minutes: row.get(5)?,
          })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
      })
      .await
  }

  pub async fn views_per_answer(&self) -> Result<ViewsPerAnswer> {
    self
      .conn
      .call(|conn| {
        let average: Option<f64> = conn.query_row(VIEWS_PER_ANSWER, [], |row| row.get(0))?;
        Ok(ViewsPerAnswer { average })
      })
      .await
  }

  /// Average view count of posts that have at least one answer.
  pub async fn views_per_question(&self) -> Result<ViewsPerQuestion> {
    self
      .conn
      .call(|conn| {
        let average_views: Option<f64> = conn.query_row(VIEWS_PER_QUESTION, [], |row| row.get(0))?;
        Ok(ViewsPerQuestion { average_views })
      })
      .await
  }

  /// Total post score per comment.
  pub async fn comment_score_ratio(&self) -> Result<CommentScoreRatio> {
    self
      .conn
      .call(|conn| {
        let (comments, total_score): (i64, i64) =
          conn.query_row(COMMENT_SCORE, [], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let ratio = if comments == 0 { 0.0 } else { total_score as f64 / comments as f64 };
        Ok(CommentScoreRatio { comments: comments as u64, total_score, ratio })
      })
      .await
  }
}
