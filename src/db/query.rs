use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::trace;

use crate::db::cache::{self, LabelCache};
use crate::db::sql;
use crate::search::predicate::QueryPlan;
use crate::search::results::{GeoResult, PhotoResult};
use crate::search::txt;
use crate::search::store::{Album, AlbumStore, Label, LabelStore, NearPhoto, PhotoStore, Storage, Subject, SubjectStore};

/// Catalog backed by one SQLite connection.
pub struct Library<'a> {
    conn: &'a Connection,
    labels: Option<&'a LabelCache>,
}

impl<'a> Library<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn, labels: None }
    }

    pub fn with_label_cache(mut self, cache: &'a LabelCache) -> Self {
        self.labels = Some(cache);
        self
    }

    fn cached(&self, kind: &str, slugs: &[String], load: impl FnOnce() -> Result<Vec<Label>>) -> Result<Vec<Label>> {
        match self.labels {
            Some(c) => c.get_or_load(&cache::key(kind, slugs), load),
            None => load(),
        }
    }

    fn find_labels(&self, where_sql: &str, slugs: &[String], times: usize) -> Result<Vec<Label>> {
        let marks = vec!["?"; slugs.len()].join(", ");
        let sql = format!(
            "SELECT id, label_uid, label_slug, custom_slug, label_name FROM labels WHERE deleted_at IS NULL AND ({}) ORDER BY label_priority DESC, id",
            where_sql.replace("{}", &marks)
        );
        let params: Vec<&String> = std::iter::repeat(slugs.iter()).take(times).flatten().collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params), row_to_label)?.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn row_to_label(row: &Row<'_>) -> rusqlite::Result<Label> {
    Ok(Label {
        id: row.get("id")?,
        uid: row.get("label_uid")?,
        slug: row.get("label_slug")?,
        custom_slug: row.get("custom_slug")?,
        name: row.get("label_name")?,
    })
}

impl LabelStore for Library<'_> {
    fn labels_by_slug(&self, slugs: &[String]) -> Result<Vec<Label>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }
        self.cached("slug", slugs, || self.find_labels("label_slug IN ({}) OR custom_slug IN ({})", slugs, 2))
    }

    fn labels_by_custom_slug(&self, slugs: &[String]) -> Result<Vec<Label>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }
        self.cached("custom", slugs, || self.find_labels("custom_slug IN ({})", slugs, 1))
    }

    fn category_children(&self, label_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare("SELECT label_id FROM categories WHERE category_id = ?1")?;
        let rows = stmt.query_map(params![label_id], |row| row.get::<_, i64>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}

impl SubjectStore for Library<'_> {
    fn subjects_by_name(&self, name: &str) -> Result<Vec<Subject>> {
        let name = name.trim().trim_matches(|c| c == '%' || c == '*');
        if name.is_empty() {
            return Ok(Vec::new());
        }
        let name = txt::escape_like(name);
        let prefix = format!("{}%", name);
        let word = format!("% {}%", name);
        let mut stmt = self.conn.prepare(
            "SELECT subj_uid, subj_name, subj_alias FROM subjects WHERE deleted_at IS NULL \
             AND (subj_name LIKE ?1 ESCAPE '\\' OR subj_name LIKE ?2 ESCAPE '\\' \
             OR subj_alias LIKE ?1 ESCAPE '\\' OR subj_alias LIKE ?2 ESCAPE '\\') ORDER BY subj_name",
        )?;
        let rows = stmt
            .query_map(params![prefix, word], |row| Ok(Subject { uid: row.get(0)?, name: row.get(1)?, alias: row.get(2)? }))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl AlbumStore for Library<'_> {
    fn album_by_uid(&self, uid: &str) -> Result<Option<Album>> {
        let mut stmt = self.conn.prepare("SELECT album_uid, album_title, album_filter FROM albums WHERE album_uid = ?1 AND deleted_at IS NULL")?;
        let album = stmt
            .query_row(params![uid], |row| Ok(Album { uid: row.get(0)?, title: row.get(1)?, filter: row.get(2)? }))
            .optional()?;
        Ok(album)
    }
}

impl PhotoStore for Library<'_> {
    /// Includes archived photos so "near" works from any photo.
    fn photo_by_uid(&self, uid: &str) -> Result<Option<NearPhoto>> {
        let mut stmt = self.conn.prepare("SELECT photo_uid, cell_id, photo_lat, photo_lng FROM photos WHERE photo_uid = ?1")?;
        let photo = stmt
            .query_row(params![uid], |row| Ok(NearPhoto { uid: row.get(0)?, cell_id: row.get(1)?, lat: row.get(2)?, lng: row.get(3)? }))
            .optional()?;
        Ok(photo)
    }
}

impl Storage for Library<'_> {
    fn photos(&self, plan: &QueryPlan) -> Result<Vec<PhotoResult>> {
        let st = sql::render(plan);
        trace!("search: {}", st.sql);
        let mut stmt = self.conn.prepare(&st.sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(st.params), sql::row_to_photo)?.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn geo(&self, plan: &QueryPlan) -> Result<Vec<GeoResult>> {
        let st = sql::render(plan);
        trace!("places: {}", st.sql);
        let mut stmt = self.conn.prepare(&st.sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(st.params), sql::row_to_geo)?.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
