use anyhow::Result;
use rusqlite::Connection;

pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "mmap_size", 268435456i64)?;
    conn.pragma_update(None, "page_size", 4096i64)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

/// Library tables read by the search. Timestamps are UTC text in
/// `YYYY-MM-DD HH:MM:SS` form so they compare and sort lexically.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS cameras (
  id INTEGER PRIMARY KEY,
  camera_slug TEXT NOT NULL DEFAULT '',
  camera_name TEXT NOT NULL DEFAULT '',
  camera_make TEXT NOT NULL DEFAULT '',
  camera_model TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS lenses (
  id INTEGER PRIMARY KEY,
  lens_slug TEXT NOT NULL DEFAULT '',
  lens_name TEXT NOT NULL DEFAULT '',
  lens_make TEXT NOT NULL DEFAULT '',
  lens_model TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS places (
  id TEXT PRIMARY KEY,
  place_label TEXT NOT NULL DEFAULT '',
  place_city TEXT NOT NULL DEFAULT '',
  place_state TEXT NOT NULL DEFAULT '',
  place_country TEXT NOT NULL DEFAULT 'zz'
);

CREATE TABLE IF NOT EXISTS cells (
  id TEXT PRIMARY KEY,
  cell_name TEXT NOT NULL DEFAULT '',
  cell_category TEXT NOT NULL DEFAULT '',
  place_id TEXT NOT NULL DEFAULT 'zz'
);

CREATE TABLE IF NOT EXISTS photos (
  id INTEGER PRIMARY KEY,
  photo_uid TEXT NOT NULL UNIQUE,
  photo_type TEXT NOT NULL DEFAULT 'image',
  photo_title TEXT NOT NULL DEFAULT '',
  photo_caption TEXT NOT NULL DEFAULT '',
  photo_path TEXT NOT NULL DEFAULT '',
  photo_name TEXT NOT NULL DEFAULT '',
  original_name TEXT NOT NULL DEFAULT '',
  photo_stack INTEGER NOT NULL DEFAULT 0,
  photo_private INTEGER NOT NULL DEFAULT 0,
  photo_favorite INTEGER NOT NULL DEFAULT 0,
  photo_scan INTEGER NOT NULL DEFAULT 0,
  photo_panorama INTEGER NOT NULL DEFAULT 0,
  taken_at TEXT,
  taken_at_local TEXT,
  photo_year INTEGER NOT NULL DEFAULT -1,
  photo_month INTEGER NOT NULL DEFAULT -1,
  photo_day INTEGER NOT NULL DEFAULT -1,
  photo_lat REAL NOT NULL DEFAULT 0,
  photo_lng REAL NOT NULL DEFAULT 0,
  photo_altitude INTEGER NOT NULL DEFAULT 0,
  photo_country TEXT NOT NULL DEFAULT 'zz',
  cell_id TEXT NOT NULL DEFAULT 'zz',
  place_id TEXT NOT NULL DEFAULT 'zz',
  camera_id INTEGER NOT NULL DEFAULT 1,
  lens_id INTEGER NOT NULL DEFAULT 1,
  photo_iso INTEGER NOT NULL DEFAULT 0,
  photo_focal_length INTEGER NOT NULL DEFAULT 0,
  photo_f_number REAL NOT NULL DEFAULT 0,
  photo_quality INTEGER NOT NULL DEFAULT 0,
  photo_resolution INTEGER NOT NULL DEFAULT 0,
  photo_color INTEGER NOT NULL DEFAULT -1,
  photo_duration INTEGER NOT NULL DEFAULT 0,
  photo_faces INTEGER NOT NULL DEFAULT 0,
  created_by TEXT NOT NULL DEFAULT '',
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL,
  edited_at TEXT,
  published_at TEXT,
  deleted_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_photos_taken ON photos(taken_at, photo_uid);
CREATE INDEX IF NOT EXISTS idx_photos_created ON photos(created_at);
CREATE INDEX IF NOT EXISTS idx_photos_cell ON photos(cell_id);
CREATE INDEX IF NOT EXISTS idx_photos_ymd ON photos(photo_year, photo_month, photo_day);
CREATE INDEX IF NOT EXISTS idx_photos_path ON photos(photo_path, photo_name);
CREATE INDEX IF NOT EXISTS idx_photos_deleted ON photos(deleted_at);

CREATE TABLE IF NOT EXISTS files (
  id INTEGER PRIMARY KEY,
  photo_id INTEGER NOT NULL,
  photo_uid TEXT NOT NULL,
  file_uid TEXT NOT NULL UNIQUE,
  file_name TEXT NOT NULL,
  file_root TEXT NOT NULL DEFAULT '/',
  file_hash TEXT NOT NULL DEFAULT '',
  file_type TEXT NOT NULL DEFAULT '',
  file_mime TEXT NOT NULL DEFAULT '',
  media_type TEXT NOT NULL DEFAULT '',
  file_primary INTEGER NOT NULL DEFAULT 0,
  file_sidecar INTEGER NOT NULL DEFAULT 0,
  file_missing INTEGER NOT NULL DEFAULT 0,
  file_portrait INTEGER NOT NULL DEFAULT 0,
  file_width INTEGER NOT NULL DEFAULT 0,
  file_height INTEGER NOT NULL DEFAULT 0,
  file_orientation INTEGER NOT NULL DEFAULT 0,
  file_aspect_ratio REAL NOT NULL DEFAULT 0,
  file_main_color TEXT NOT NULL DEFAULT '',
  file_chroma INTEGER NOT NULL DEFAULT 0,
  file_diff INTEGER NOT NULL DEFAULT -1,
  file_size INTEGER NOT NULL DEFAULT 0,
  file_quality INTEGER NOT NULL DEFAULT 0,
  file_error TEXT NOT NULL DEFAULT '',
  FOREIGN KEY(photo_id) REFERENCES photos(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_files_photo ON files(photo_id, file_primary);
CREATE INDEX IF NOT EXISTS idx_files_hash ON files(file_hash);

CREATE TABLE IF NOT EXISTS labels (
  id INTEGER PRIMARY KEY,
  label_uid TEXT NOT NULL UNIQUE,
  label_slug TEXT NOT NULL UNIQUE,
  custom_slug TEXT NOT NULL DEFAULT '',
  label_name TEXT NOT NULL,
  label_priority INTEGER NOT NULL DEFAULT 0,
  deleted_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_labels_custom_slug ON labels(custom_slug);

CREATE TABLE IF NOT EXISTS categories (
  label_id INTEGER NOT NULL,
  category_id INTEGER NOT NULL,
  PRIMARY KEY(label_id, category_id)
);

CREATE TABLE IF NOT EXISTS photos_labels (
  photo_id INTEGER NOT NULL,
  label_id INTEGER NOT NULL,
  label_src TEXT NOT NULL DEFAULT '',
  uncertainty INTEGER NOT NULL DEFAULT 0,
  PRIMARY KEY(photo_id, label_id)
);

CREATE INDEX IF NOT EXISTS idx_photos_labels_label ON photos_labels(label_id, uncertainty);

CREATE TABLE IF NOT EXISTS keywords (
  id INTEGER PRIMARY KEY,
  keyword TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS photos_keywords (
  photo_id INTEGER NOT NULL,
  keyword_id INTEGER NOT NULL,
  PRIMARY KEY(photo_id, keyword_id)
);

CREATE INDEX IF NOT EXISTS idx_photos_keywords_keyword ON photos_keywords(keyword_id);

CREATE TABLE IF NOT EXISTS subjects (
  subj_uid TEXT PRIMARY KEY,
  subj_type TEXT NOT NULL DEFAULT 'person',
  subj_slug TEXT NOT NULL DEFAULT '',
  subj_name TEXT NOT NULL DEFAULT '',
  subj_alias TEXT NOT NULL DEFAULT '',
  deleted_at TEXT
);

CREATE TABLE IF NOT EXISTS faces (
  id TEXT PRIMARY KEY,
  face_kind INTEGER NOT NULL DEFAULT 0,
  subj_uid TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS markers (
  marker_uid TEXT PRIMARY KEY,
  file_uid TEXT NOT NULL,
  marker_type TEXT NOT NULL DEFAULT 'face',
  subj_uid TEXT NOT NULL DEFAULT '',
  face_id TEXT NOT NULL DEFAULT '',
  marker_invalid INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_markers_file ON markers(file_uid);
CREATE INDEX IF NOT EXISTS idx_markers_subj ON markers(subj_uid);

CREATE TABLE IF NOT EXISTS albums (
  album_uid TEXT PRIMARY KEY,
  album_slug TEXT NOT NULL DEFAULT '',
  album_type TEXT NOT NULL DEFAULT 'album',
  album_title TEXT NOT NULL DEFAULT '',
  album_filter TEXT NOT NULL DEFAULT '',
  created_at TEXT NOT NULL,
  deleted_at TEXT
);

CREATE TABLE IF NOT EXISTS photos_albums (
  photo_uid TEXT NOT NULL,
  album_uid TEXT NOT NULL,
  hidden INTEGER NOT NULL DEFAULT 0,
  missing INTEGER NOT NULL DEFAULT 0,
  PRIMARY KEY(photo_uid, album_uid)
);

CREATE INDEX IF NOT EXISTS idx_photos_albums_album ON photos_albums(album_uid, hidden);
    "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        apply_schema(&conn).unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('photos', 'files', 'photos_albums')", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 3);
    }
}
