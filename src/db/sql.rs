//! Renders query plans to SQLite statements with positional parameters.

use rusqlite::types::Value as SqlValue;
use rusqlite::Row;

use crate::search::predicate::{Expr, JoinKind, OrderTerm, QueryPlan, Source, Value};
use crate::search::results::{GeoResult, PhotoResult};

const PHOTO_COLUMNS: &str = "photos.id, photos.photo_uid, photos.photo_type, photos.photo_title, photos.photo_caption, \
photos.photo_path, photos.photo_name, photos.original_name, photos.taken_at, photos.taken_at_local, \
photos.photo_year, photos.photo_month, photos.photo_day, photos.photo_lat, photos.photo_lng, photos.photo_altitude, \
photos.cell_id, photos.photo_iso, photos.photo_focal_length, photos.photo_f_number, photos.photo_quality, \
photos.photo_resolution, photos.photo_favorite, photos.photo_private, photos.photo_scan, photos.photo_panorama, \
photos.photo_duration, photos.photo_faces, cameras.camera_name, lenses.lens_name, places.place_city, \
places.place_state, places.place_country, photos.created_at, photos.updated_at, photos.edited_at, photos.deleted_at, \
files.id AS file_id, files.file_uid, files.file_name, files.file_hash, files.file_type, files.file_mime, \
files.file_primary, files.file_sidecar, files.file_width, files.file_height, files.file_orientation, \
files.file_aspect_ratio, files.file_main_color, files.file_chroma, files.file_diff, files.file_size, files.file_quality";

const GEO_COLUMNS: &str = "photos.id, photos.photo_uid, photos.photo_type, photos.photo_title, photos.photo_caption, \
photos.photo_lat, photos.photo_lng, photos.photo_favorite, photos.photo_duration, photos.taken_at, photos.taken_at_local, \
files.file_hash, files.file_width, files.file_height";

const LOOKUPS: &str = "LEFT JOIN cameras ON cameras.id = photos.camera_id \
LEFT JOIN lenses ON lenses.id = photos.lens_id \
LEFT JOIN places ON places.id = photos.place_id";

/// SQL text and its parameters in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

pub fn render(plan: &QueryPlan) -> Statement {
    let mut params: Vec<SqlValue> = Vec::new();
    let mut sql = match plan.source {
        Source::Files => format!("SELECT {} FROM files JOIN photos ON photos.id = files.photo_id {}", PHOTO_COLUMNS, LOOKUPS),
        Source::Photos => format!(
            "SELECT {} FROM photos JOIN files ON files.photo_id = photos.id AND files.file_primary = 1 {}",
            GEO_COLUMNS, LOOKUPS
        ),
    };

    for j in &plan.joins {
        let kind = match j.kind {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
        };
        sql.push_str(&format!(" {} {} ON {}", kind, j.table, j.on));
        if let Some(f) = &j.filter {
            sql.push_str(&format!(" AND {}", expr(f, &mut params)));
        }
    }

    let where_clauses: Vec<String> = plan.predicates.iter().map(|p| expr(p, &mut params)).collect();
    if !where_clauses.is_empty() {
        sql.push_str(&format!(" WHERE {}", where_clauses.join(" AND ")));
    }

    if !plan.group_by.is_empty() {
        sql.push_str(&format!(" GROUP BY {}", plan.group_by.join(", ")));
    }

    let order: Vec<String> = plan.order.iter().map(|o| order_term(o, &mut params)).collect();
    if !order.is_empty() {
        sql.push_str(&format!(" ORDER BY {}", order.join(", ")));
    }

    sql.push_str(" LIMIT ? OFFSET ?");
    params.push(SqlValue::Integer(plan.limit));
    params.push(SqlValue::Integer(plan.offset));

    Statement { sql, params }
}

fn bind(v: &Value, params: &mut Vec<SqlValue>) -> &'static str {
    params.push(match v {
        Value::Null => SqlValue::Null,
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
    });
    "?"
}

fn expr(e: &Expr, params: &mut Vec<SqlValue>) -> String {
    match e {
        Expr::Cmp { col, op, value } => format!("{} {} {}", col, op.as_sql(), bind(value, params)),
        Expr::Columns { left, op, right } => format!("{} {} {}", left, op.as_sql(), right),
        Expr::Between { col, low, high } => {
            let low = bind(low, params);
            let high = bind(high, params);
            format!("{} BETWEEN {} AND {}", col, low, high)
        }
        Expr::In { values, negated, .. } if values.is_empty() => (if *negated { "1" } else { "0" }).to_string(),
        Expr::In { col, values, negated } => {
            let marks: Vec<&str> = values.iter().map(|v| bind(v, params)).collect();
            format!("{} {}IN ({})", col, if *negated { "NOT " } else { "" }, marks.join(", "))
        }
        Expr::Null { col, negated } => format!("{} IS {}NULL", col, if *negated { "NOT " } else { "" }),
        Expr::Like { col, pattern } => format!("{} LIKE {} ESCAPE '\\'", col, bind(pattern, params)),
        Expr::SameDay { col, value } => format!("DATE({}) = DATE({})", col, bind(value, params)),
        Expr::InSelect { col, select, filter, negated } => {
            let not = if *negated { "NOT " } else { "" };
            match filter {
                Some(f) => format!("{} {}IN ({} WHERE {})", col, not, select, expr(f, params)),
                None => format!("{} {}IN ({})", col, not, select),
            }
        }
        Expr::And(v) if v.is_empty() => "1".to_string(),
        Expr::Or(v) if v.is_empty() => "0".to_string(),
        Expr::And(v) => format!("({})", v.iter().map(|e| expr(e, params)).collect::<Vec<_>>().join(" AND ")),
        Expr::Or(v) => format!("({})", v.iter().map(|e| expr(e, params)).collect::<Vec<_>>().join(" OR ")),
        Expr::False => "0".to_string(),
    }
}

fn order_term(o: &OrderTerm, params: &mut Vec<SqlValue>) -> String {
    match o {
        OrderTerm::Asc(c) => format!("{} ASC", c),
        OrderTerm::Desc(c) => format!("{} DESC", c),
        OrderTerm::Random => "RANDOM()".to_string(),
        OrderTerm::MatchFirst { col, value } => format!("({} = {}) DESC", col, bind(value, params)),
        OrderTerm::Distance { lat_col, lng_col, lat, lng } => {
            let lat = bind(&Value::Float(*lat), params);
            let lng = bind(&Value::Float(*lng), params);
            format!("ABS({} - {}) + ABS({} - {})", lat, lat_col, lng, lng_col)
        }
    }
}

pub fn row_to_photo(row: &Row<'_>) -> rusqlite::Result<PhotoResult> {
    Ok(PhotoResult {
        id: row.get("id")?,
        photo_uid: row.get("photo_uid")?,
        photo_type: row.get("photo_type")?,
        photo_title: row.get("photo_title")?,
        photo_caption: row.get("photo_caption")?,
        photo_path: row.get("photo_path")?,
        photo_name: row.get("photo_name")?,
        original_name: row.get("original_name")?,
        taken_at: row.get("taken_at")?,
        taken_at_local: row.get("taken_at_local")?,
        photo_year: row.get("photo_year")?,
        photo_month: row.get("photo_month")?,
        photo_day: row.get("photo_day")?,
        photo_lat: row.get("photo_lat")?,
        photo_lng: row.get("photo_lng")?,
        photo_altitude: row.get("photo_altitude")?,
        cell_id: row.get("cell_id")?,
        photo_iso: row.get("photo_iso")?,
        photo_focal_length: row.get("photo_focal_length")?,
        photo_f_number: row.get("photo_f_number")?,
        photo_quality: row.get("photo_quality")?,
        photo_resolution: row.get("photo_resolution")?,
        photo_favorite: row.get("photo_favorite")?,
        photo_private: row.get("photo_private")?,
        photo_scan: row.get("photo_scan")?,
        photo_panorama: row.get("photo_panorama")?,
        photo_duration: row.get("photo_duration")?,
        photo_faces: row.get("photo_faces")?,
        camera_name: row.get("camera_name")?,
        lens_name: row.get("lens_name")?,
        place_city: row.get("place_city")?,
        place_state: row.get("place_state")?,
        place_country: row.get("place_country")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        edited_at: row.get("edited_at")?,
        deleted_at: row.get("deleted_at")?,
        file_id: row.get("file_id")?,
        file_uid: row.get("file_uid")?,
        file_name: row.get("file_name")?,
        file_hash: row.get("file_hash")?,
        file_type: row.get("file_type")?,
        file_mime: row.get("file_mime")?,
        file_primary: row.get("file_primary")?,
        file_sidecar: row.get("file_sidecar")?,
        file_width: row.get("file_width")?,
        file_height: row.get("file_height")?,
        file_orientation: row.get("file_orientation")?,
        file_aspect_ratio: row.get("file_aspect_ratio")?,
        file_main_color: row.get("file_main_color")?,
        file_chroma: row.get("file_chroma")?,
        file_diff: row.get("file_diff")?,
        file_size: row.get("file_size")?,
        file_quality: row.get("file_quality")?,
        merged: false,
        files: Vec::new(),
    })
}

pub fn row_to_geo(row: &Row<'_>) -> rusqlite::Result<GeoResult> {
    Ok(GeoResult {
        id: row.get("id")?,
        photo_uid: row.get("photo_uid")?,
        photo_type: row.get("photo_type")?,
        photo_title: row.get("photo_title")?,
        photo_caption: row.get("photo_caption")?,
        photo_lat: row.get("photo_lat")?,
        photo_lng: row.get("photo_lng")?,
        photo_favorite: row.get("photo_favorite")?,
        photo_duration: row.get("photo_duration")?,
        taken_at: row.get("taken_at")?,
        taken_at_local: row.get("taken_at_local")?,
        file_hash: row.get("file_hash")?,
        file_width: row.get("file_width")?,
        file_height: row.get("file_height")?,
    })
}
