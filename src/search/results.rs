//! Result rows and the merge of file rows into one row per photo.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One matching file together with its photo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoResult {
    pub id: i64,
    pub photo_uid: String,
    pub photo_type: String,
    pub photo_title: String,
    pub photo_caption: String,
    pub photo_path: String,
    pub photo_name: String,
    pub original_name: String,
    pub taken_at: Option<String>,
    pub taken_at_local: Option<String>,
    pub photo_year: i64,
    pub photo_month: i64,
    pub photo_day: i64,
    pub photo_lat: f64,
    pub photo_lng: f64,
    pub photo_altitude: i64,
    pub cell_id: String,
    pub photo_iso: i64,
    pub photo_focal_length: i64,
    pub photo_f_number: f64,
    pub photo_quality: i64,
    pub photo_resolution: i64,
    pub photo_favorite: bool,
    pub photo_private: bool,
    pub photo_scan: bool,
    pub photo_panorama: bool,
    pub photo_duration: i64,
    pub photo_faces: i64,
    pub camera_name: Option<String>,
    pub lens_name: Option<String>,
    pub place_city: Option<String>,
    pub place_state: Option<String>,
    pub place_country: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub edited_at: Option<String>,
    pub deleted_at: Option<String>,
    pub file_id: i64,
    pub file_uid: String,
    pub file_name: String,
    pub file_hash: String,
    pub file_type: String,
    pub file_mime: String,
    pub file_primary: bool,
    pub file_sidecar: bool,
    pub file_width: i64,
    pub file_height: i64,
    pub file_orientation: i64,
    pub file_aspect_ratio: f64,
    pub file_main_color: String,
    pub file_chroma: i64,
    pub file_diff: i64,
    pub file_size: i64,
    pub file_quality: i64,
    pub merged: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileRef>,
}

/// File level attributes kept for every file of a merged photo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub file_id: i64,
    pub file_uid: String,
    pub file_name: String,
    pub file_hash: String,
    pub file_type: String,
    pub file_mime: String,
    pub file_primary: bool,
    pub file_width: i64,
    pub file_height: i64,
    pub file_size: i64,
    pub file_quality: i64,
}

impl PhotoResult {
    pub fn file_ref(&self) -> FileRef {
        FileRef {
            file_id: self.file_id,
            file_uid: self.file_uid.clone(),
            file_name: self.file_name.clone(),
            file_hash: self.file_hash.clone(),
            file_type: self.file_type.clone(),
            file_mime: self.file_mime.clone(),
            file_primary: self.file_primary,
            file_width: self.file_width,
            file_height: self.file_height,
            file_size: self.file_size,
            file_quality: self.file_quality,
        }
    }

    pub fn is_playable(&self) -> bool {
        is_playable(&self.photo_type)
    }

    /// True when `self` is the better representative of its photo than `other`:
    /// primary first, then higher quality score, then the smaller file type.
    fn preferred_over(&self, other: &PhotoResult) -> bool {
        (self.file_primary, self.file_quality, &other.file_type) > (other.file_primary, other.file_quality, &self.file_type)
    }
}

pub fn is_playable(photo_type: &str) -> bool {
    matches!(photo_type, "video" | "live" | "animated")
}

/// Collapses file rows into one row per photo, keeping the position of each
/// photo's first row. Returns the merged rows and the number of input rows.
/// Rows that are already alone for their photo are returned unchanged.
///
/// Merging only regroups rows that were already loaded, so it cannot fail.
/// Storage errors surface earlier, from [`Storage::photos`](crate::search::store::Storage::photos).
pub fn merge(rows: Vec<PhotoResult>) -> (Vec<PhotoResult>, usize) {
    let count = rows.len();
    let mut index: HashMap<i64, usize> = HashMap::with_capacity(count);
    let mut groups: Vec<Vec<PhotoResult>> = Vec::new();
    for row in rows {
        match index.get(&row.id) {
            Some(&i) => groups[i].push(row),
            None => {
                index.insert(row.id, groups.len());
                groups.push(vec![row]);
            }
        }
    }

    let merged = groups
        .into_iter()
        .filter_map(|mut group| {
            if group.len() == 1 {
                return group.pop();
            }
            let mut files = Vec::new();
            let mut best = 0;
            for (i, row) in group.iter().enumerate() {
                if row.files.is_empty() {
                    files.push(row.file_ref());
                } else {
                    files.extend(row.files.iter().cloned());
                }
                if i > 0 && row.preferred_over(&group[best]) {
                    best = i;
                }
            }
            let mut out = group.swap_remove(best);
            out.merged = files.len() > 1;
            out.files = files;
            Some(out)
        })
        .collect();

    (merged, count)
}

/// Photo with a location, as returned by the geo search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoResult {
    pub id: i64,
    pub photo_uid: String,
    pub photo_type: String,
    pub photo_title: String,
    pub photo_caption: String,
    pub photo_lat: f64,
    pub photo_lng: f64,
    pub photo_favorite: bool,
    pub photo_duration: i64,
    pub taken_at: Option<String>,
    pub taken_at_local: Option<String>,
    pub file_hash: String,
    pub file_width: i64,
    pub file_height: i64,
}

impl GeoResult {
    pub fn is_playable(&self) -> bool {
        is_playable(&self.photo_type)
    }
}
