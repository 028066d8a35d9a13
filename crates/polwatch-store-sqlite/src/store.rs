//! [`SqliteStore`] — the SQLite implementation of [`RevisionStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use polwatch_core::{
  item::{Item, ItemLocator},
  revision::{Revision, RevisionComment},
  store::{NewComment, NewRevision, RevisionStore},
};

use crate::{
  Error, Result,
  encode::{
    RawComment, RawItem, RawRevision, encode_config, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

const ITEM_COLUMNS: &str =
  "item_id, technology, account, region, name, created_at";
const REVISION_COLUMNS: &str =
  "revision_id, item_id, active, date_created, config, diff_html";

fn item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawItem> {
  Ok(RawItem {
    item_id:    row.get(0)?,
    technology: row.get(1)?,
    account:    row.get(2)?,
    region:     row.get(3)?,
    name:       row.get(4)?,
    created_at: row.get(5)?,
  })
}

fn revision_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRevision> {
  Ok(RawRevision {
    revision_id:  row.get(0)?,
    item_id:      row.get(1)?,
    active:       row.get(2)?,
    date_created: row.get(3)?,
    config:       row.get(4)?,
    diff_html:    row.get(5)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A polwatch revision store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn item_exists(&self, item_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(item_id);
    let exists: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM items WHERE item_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  /// Comments for one revision, oldest first.
  async fn comments_for(
    &self,
    revision_id: Uuid,
  ) -> Result<Vec<RevisionComment>> {
    let id_str = encode_uuid(revision_id);

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT comment_id, revision_id, user, date_created, text
           FROM revision_comments
           WHERE revision_id = ?1
           ORDER BY date_created, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawComment {
              comment_id:   row.get(0)?,
              revision_id:  row.get(1)?,
              user:         row.get(2)?,
              date_created: row.get(3)?,
              text:         row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn hydrate(&self, raw: RawRevision) -> Result<Revision> {
    let mut revision = raw.into_revision()?;
    revision.comments = self.comments_for(revision.revision_id).await?;
    Ok(revision)
  }
}

// ─── RevisionStore impl ──────────────────────────────────────────────────────

impl RevisionStore for SqliteStore {
  type Error = Error;

  // ── Items ─────────────────────────────────────────────────────────────────

  async fn upsert_item(&self, locator: ItemLocator) -> Result<Item> {
    // Generated up front; unused when the item already exists.
    let candidate_id = encode_uuid(Uuid::new_v4());
    let created_at = encode_dt(Utc::now());

    let raw: RawItem = self
      .conn
      .call(move |conn| {
        let existing = conn
          .query_row(
            &format!(
              "SELECT {ITEM_COLUMNS} FROM items
               WHERE technology = ?1 AND account = ?2
                 AND region = ?3 AND name = ?4"
            ),
            rusqlite::params![
              locator.technology,
              locator.account,
              locator.region,
              locator.name,
            ],
            item_from_row,
          )
          .optional()?;

        if let Some(raw) = existing {
          return Ok(raw);
        }

        conn.execute(
          "INSERT INTO items (item_id, technology, account, region, name, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            candidate_id,
            locator.technology,
            locator.account,
            locator.region,
            locator.name,
            created_at,
          ],
        )?;

        Ok(RawItem {
          item_id:    candidate_id,
          technology: locator.technology,
          account:    locator.account,
          region:     locator.region,
          name:       locator.name,
          created_at,
        })
      })
      .await?;

    raw.into_item()
  }

  async fn get_item(&self, id: Uuid) -> Result<Option<Item>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawItem> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ITEM_COLUMNS} FROM items WHERE item_id = ?1"),
              rusqlite::params![id_str],
              item_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawItem::into_item).transpose()
  }

  async fn find_item(&self, locator: &ItemLocator) -> Result<Option<Item>> {
    let locator = locator.clone();

    let raw: Option<RawItem> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ITEM_COLUMNS} FROM items
                 WHERE technology = ?1 AND account = ?2
                   AND region = ?3 AND name = ?4"
              ),
              rusqlite::params![
                locator.technology,
                locator.account,
                locator.region,
                locator.name,
              ],
              item_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawItem::into_item).transpose()
  }

  async fn list_items(&self, technology: Option<&str>) -> Result<Vec<Item>> {
    let technology = technology.map(str::to_owned);

    let raws: Vec<RawItem> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(tech) = technology {
          let mut stmt = conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE technology = ?1
             ORDER BY account, region, name"
          ))?;
          stmt
            .query_map(rusqlite::params![tech], item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items
             ORDER BY technology, account, region, name"
          ))?;
          stmt
            .query_map([], item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawItem::into_item).collect()
  }

  // ── Revisions ─────────────────────────────────────────────────────────────

  async fn record_revision(&self, input: NewRevision) -> Result<Revision> {
    if !self.item_exists(input.item_id).await? {
      return Err(Error::ItemNotFound(input.item_id));
    }

    let mut revision = Revision::new(
      Uuid::new_v4(),
      input.item_id,
      true,
      Utc::now(),
      input.config,
    );
    revision.diff_html = input.diff_html;

    let id_str = encode_uuid(revision.revision_id);
    let item_str = encode_uuid(revision.item_id);
    let at_str = encode_dt(revision.date_created);
    let config_str = encode_config(revision.config());
    let diff_html = revision.diff_html.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE revisions SET active = 0 WHERE item_id = ?1 AND active = 1",
          rusqlite::params![item_str],
        )?;
        tx.execute(
          "INSERT INTO revisions (revision_id, item_id, active, date_created, config, diff_html)
           VALUES (?1, ?2, 1, ?3, ?4, ?5)",
          rusqlite::params![id_str, item_str, at_str, config_str, diff_html],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(revision)
  }

  async fn get_revision(&self, id: Uuid) -> Result<Option<Revision>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawRevision> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {REVISION_COLUMNS} FROM revisions WHERE revision_id = ?1"
              ),
              rusqlite::params![id_str],
              revision_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(raw) => Ok(Some(self.hydrate(raw).await?)),
      None => Ok(None),
    }
  }

  async fn latest_revision(&self, item_id: Uuid) -> Result<Option<Revision>> {
    let id_str = encode_uuid(item_id);

    let raw: Option<RawRevision> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {REVISION_COLUMNS} FROM revisions
                 WHERE item_id = ?1
                 ORDER BY date_created DESC, rowid DESC
                 LIMIT 1"
              ),
              rusqlite::params![id_str],
              revision_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(raw) => Ok(Some(self.hydrate(raw).await?)),
      None => Ok(None),
    }
  }

  async fn list_revisions(&self, item_id: Uuid) -> Result<Vec<Revision>> {
    let id_str = encode_uuid(item_id);

    let raws: Vec<RawRevision> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REVISION_COLUMNS} FROM revisions
           WHERE item_id = ?1
           ORDER BY date_created DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], revision_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut revisions = Vec::with_capacity(raws.len());
    for raw in raws {
      revisions.push(self.hydrate(raw).await?);
    }
    Ok(revisions)
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, input: NewComment) -> Result<RevisionComment> {
    let revision_str = encode_uuid(input.revision_id);
    let revision_exists: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM revisions WHERE revision_id = ?1",
              rusqlite::params![revision_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    if !revision_exists {
      return Err(Error::RevisionNotFound(input.revision_id));
    }

    let comment = RevisionComment {
      comment_id:   Uuid::new_v4(),
      revision_id:  input.revision_id,
      user:         input.user,
      date_created: Utc::now(),
      text:         input.text,
    };

    let id_str = encode_uuid(comment.comment_id);
    let revision_str = encode_uuid(comment.revision_id);
    let at_str = encode_dt(comment.date_created);
    let user = comment.user.clone();
    let text = comment.text.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO revision_comments (comment_id, revision_id, user, date_created, text)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, revision_str, user, at_str, text],
        )?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }
}
