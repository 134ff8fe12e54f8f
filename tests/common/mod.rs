#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use nazr_search::db;
use nazr_search::search::{GeoIndex, S2Index};
use nazr_search::utils::config::Config;
use nazr_search::AppState;
use rusqlite::{params, Connection};
use tempfile::TempDir;

pub const BERLIN: &str = "pt9jtdre2lvl0y01";
pub const VIDEO: &str = "pt9jtdre2lvl0y02";
pub const PARIS: &str = "pt9jtdre2lvl0y03";
pub const PRIVATE: &str = "pt9jtdre2lvl0y04";
pub const ARCHIVED: &str = "pt9jtdre2lvl0y05";
pub const MITTE: &str = "pt9jtdre2lvl0y06";

pub const ALBUM: &str = "at9lxuqxpogaaba7";

/// Create a temporary SQLite database for testing
pub fn setup_test_db() -> (TempDir, PathBuf, Connection) {
    let tmp = TempDir::new().unwrap();
    let db_dir = tmp.path().join("db");
    std::fs::create_dir_all(&db_dir).unwrap();
    let db_path = db_dir.join("nazr.db");
    let conn = db::open_or_create(&db_path).unwrap();
    (tmp, db_path, conn)
}

struct Photo {
    id: i64,
    uid: &'static str,
    kind: &'static str,
    year: i64,
    lat: f64,
    lng: f64,
    private: bool,
    created_by: &'static str,
    deleted: bool,
}

fn photos() -> Vec<Photo> {
    vec![
        Photo { id: 1, uid: BERLIN, kind: "image", year: 2019, lat: 52.52, lng: 13.405, private: false, created_by: "us9lxuqxpogaaba1", deleted: false },
        Photo { id: 2, uid: VIDEO, kind: "video", year: 2019, lat: 0.0, lng: 0.0, private: false, created_by: "us9lxuqxpogaaba1", deleted: false },
        Photo { id: 3, uid: PARIS, kind: "image", year: 2020, lat: 48.8566, lng: 2.3522, private: false, created_by: "us9lxuqxpogaaba1", deleted: false },
        Photo { id: 4, uid: PRIVATE, kind: "image", year: 2019, lat: 0.0, lng: 0.0, private: true, created_by: "us9lxuqxpogaaba1", deleted: false },
        Photo { id: 5, uid: ARCHIVED, kind: "image", year: 2019, lat: 0.0, lng: 0.0, private: false, created_by: "us9lxuqxpogaaba1", deleted: true },
        Photo { id: 6, uid: MITTE, kind: "image", year: 2021, lat: 52.53, lng: 13.41, private: false, created_by: "us9lxuqxpogaaba2", deleted: false },
    ]
}

/// Seeds a small library: six photos with one primary file each, a second
/// file for the Berlin photo, a "cat" label and one album. The Mitte photo's
/// cat label is too uncertain to match.
pub fn seed(conn: &Connection) {
    conn.execute_batch(
        r#"
INSERT INTO cameras (id, camera_slug, camera_name, camera_make, camera_model) VALUES
  (1, 'zz', 'Unknown', '', 'Unknown'),
  (2, 'canon-eos-5d', 'Canon EOS 5D', 'Canon', 'EOS 5D');
INSERT INTO lenses (id, lens_slug, lens_name) VALUES (1, 'zz', 'Unknown');
INSERT INTO places (id, place_label, place_city, place_state, place_country) VALUES
  ('zz', 'Unknown', '', '', 'zz'),
  ('de:berlin', 'Berlin, Germany', 'Berlin', 'Berlin', 'de');
INSERT INTO labels (id, label_uid, label_slug, custom_slug, label_name) VALUES
  (1, 'lt9k3pw1wowuy3c3', 'cat', 'cat', 'Cat');
INSERT INTO albums (album_uid, album_slug, album_title, album_filter, created_at) VALUES
  ('at9lxuqxpogaaba7', 'holiday', 'Holiday', '', '2020-01-01 00:00:00');
        "#,
    )
    .unwrap();

    let geo = S2Index;
    for p in photos() {
        let located = p.lat != 0.0 || p.lng != 0.0;
        let cell = if located { geo.cell_token(p.lat, p.lng) } else { "zz".to_string() };
        let (place, country) = if p.uid == BERLIN || p.uid == MITTE { ("de:berlin", "de") } else { ("zz", "zz") };
        let taken = format!("{}-06-0{} 12:00:00", p.year, p.id);
        conn.execute(
            "INSERT INTO photos (id, photo_uid, photo_type, photo_title, photo_path, photo_name, taken_at, taken_at_local, \
             photo_year, photo_month, photo_day, photo_lat, photo_lng, photo_country, cell_id, place_id, camera_id, \
             photo_private, photo_quality, created_by, created_at, updated_at, deleted_at) \
             VALUES (?1, ?2, ?3, ?4, '2019/06', ?5, ?6, ?6, ?7, 6, ?1, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 3, ?15, ?6, ?6, ?16)",
            params![
                p.id,
                p.uid,
                p.kind,
                format!("Photo {}", p.id),
                format!("IMG_000{}", p.id),
                taken,
                p.year,
                p.lat,
                p.lng,
                country,
                cell,
                place,
                if p.id == 1 { 2 } else { 1 },
                p.private,
                p.created_by,
                if p.deleted { Some("2022-01-01 00:00:00") } else { None },
            ],
        )
        .unwrap();
        let media = if p.kind == "video" { "video" } else { "image" };
        conn.execute(
            "INSERT INTO files (id, photo_id, photo_uid, file_uid, file_name, file_hash, file_type, file_mime, media_type, \
             file_primary, file_width, file_height, file_size) VALUES (?1, ?1, ?2, ?3, ?4, ?5, 'jpg', 'image/jpeg', ?6, 1, 4000, 3000, 1000)",
            params![p.id, p.uid, format!("ft9jtdre2lvl0y0{}", p.id), format!("2019/06/IMG_000{}.jpg", p.id), format!("{:040x}", p.id), media],
        )
        .unwrap();
    }

    conn.execute_batch(
        r#"
INSERT INTO files (id, photo_id, photo_uid, file_uid, file_name, file_hash, file_type, file_mime, media_type, file_primary, file_width, file_height, file_size)
  VALUES (7, 1, 'pt9jtdre2lvl0y01', 'ft9jtdre2lvl0y07', '2019/06/IMG_0001.cr2', 'aa00000000000000000000000000000000000007', 'raw', 'image/x-canon-cr2', 'raw', 0, 4000, 3000, 25000);
INSERT INTO photos_labels (photo_id, label_id, label_src, uncertainty) VALUES (1, 1, 'image', 10), (3, 1, 'image', 20), (6, 1, 'image', 100);
INSERT INTO photos_albums (photo_uid, album_uid, hidden) VALUES
  ('pt9jtdre2lvl0y01', 'at9lxuqxpogaaba7', 0),
  ('pt9jtdre2lvl0y03', 'at9lxuqxpogaaba7', 1),
  ('pt9jtdre2lvl0y06', 'at9lxuqxpogaaba7', 0);
        "#,
    )
    .unwrap();
}

pub fn test_config(data: PathBuf) -> Config {
    Config {
        data,
        port: 0,
        db_pool_size: 2,
        content_uri: "/api/v1".to_string(),
        api_uri: "/api/v1".to_string(),
        preview_token: "public".to_string(),
        download_token: "public".to_string(),
        public: false,
        query_timeout: Duration::from_secs(10),
        label_cache_ttl: Duration::from_secs(60),
    }
}

/// Create AppState for testing over a seeded database
pub fn create_test_app_state(tmp: &TempDir, db_path: PathBuf) -> Arc<AppState> {
    let pool = db::create_pool(&db_path, 2).unwrap();
    Arc::new(AppState::new(test_config(tmp.path().to_path_buf()), pool))
}
