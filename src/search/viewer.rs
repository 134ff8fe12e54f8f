//! Viewer and map projections of search results. Pure string composition.

use serde::Serialize;
use serde_json::json;

use crate::search::results::{GeoResult, PhotoResult};

/// Where thumbnails and downloads are served from, and the tokens granting access.
#[derive(Debug, Clone, Default)]
pub struct ViewerConfig {
    pub content_uri: String,
    pub api_uri: String,
    pub preview_token: String,
    pub download_token: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ThumbSize {
    pub name: &'static str,
    pub width: i64,
    pub height: i64,
}

pub const VIEWER_SIZES: [ThumbSize; 6] = [
    ThumbSize { name: "fit_720", width: 720, height: 720 },
    ThumbSize { name: "fit_1280", width: 1280, height: 1024 },
    ThumbSize { name: "fit_1920", width: 1920, height: 1200 },
    ThumbSize { name: "fit_2560", width: 2560, height: 1600 },
    ThumbSize { name: "fit_4096", width: 4096, height: 4096 },
    ThumbSize { name: "fit_7680", width: 7680, height: 4320 },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumb {
    pub w: i64,
    pub h: i64,
    pub src: String,
}

impl Thumb {
    /// Thumbnail of a `width` x `height` original fitted into `size`.
    pub fn new(width: i64, height: i64, hash: &str, size: ThumbSize, cfg: &ViewerConfig) -> Self {
        let (w, h) = fit(width, height, size.width, size.height);
        Self { w, h, src: format!("{}/t/{}/{}/{}", cfg.content_uri, hash, cfg.preview_token, size.name) }
    }
}

fn fit(width: i64, height: i64, max_w: i64, max_h: i64) -> (i64, i64) {
    if width <= 0 || height <= 0 {
        return (max_w, max_h);
    }
    if width <= max_w && height <= max_h {
        return (width, height);
    }
    let scale = (max_w as f64 / width as f64).min(max_h as f64 / height as f64);
    (((width as f64 * scale).round() as i64).max(1), ((height as f64 * scale).round() as i64).max(1))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerThumbs {
    pub fit_720: Thumb,
    pub fit_1280: Thumb,
    pub fit_1920: Thumb,
    pub fit_2560: Thumb,
    pub fit_4096: Thumb,
    pub fit_7680: Thumb,
}

impl ViewerThumbs {
    /// Once a size covers the original, larger fields reuse that size.
    pub fn new(width: i64, height: i64, hash: &str, cfg: &ViewerConfig) -> Self {
        let mut cover: Option<ThumbSize> = None;
        let mut thumbs = VIEWER_SIZES.iter().map(|s| {
            if cover.is_none() && s.width >= width && s.height >= height {
                cover = Some(*s);
            }
            Thumb::new(width, height, hash, cover.unwrap_or(*s), cfg)
        });
        let mut next = || thumbs.next().unwrap_or_else(|| Thumb { w: 0, h: 0, src: String::new() });
        Self { fit_720: next(), fit_1280: next(), fit_1920: next(), fit_2560: next(), fit_4096: next(), fit_7680: next() }
    }
}

pub fn download_url(hash: &str, cfg: &ViewerConfig) -> String {
    format!("{}/dl/{}?t={}", cfg.api_uri, hash, urlencoding::encode(&cfg.download_token))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ViewerResult {
    #[serde(rename = "UID")]
    pub uid: String,
    #[serde(rename = "Type")]
    pub media_type: String,
    pub title: String,
    pub caption: String,
    pub lat: f64,
    pub lng: f64,
    pub taken_at_local: Option<String>,
    pub favorite: bool,
    pub playable: bool,
    pub duration: i64,
    pub width: i64,
    pub height: i64,
    pub hash: String,
    pub thumbs: ViewerThumbs,
    pub download_url: String,
}

impl ViewerResult {
    pub fn from_photo(p: &PhotoResult, cfg: &ViewerConfig) -> Self {
        Self {
            uid: p.photo_uid.clone(),
            media_type: p.photo_type.clone(),
            title: p.photo_title.clone(),
            caption: p.photo_caption.clone(),
            lat: p.photo_lat,
            lng: p.photo_lng,
            taken_at_local: p.taken_at_local.clone(),
            favorite: p.photo_favorite,
            playable: p.is_playable(),
            duration: p.photo_duration,
            width: p.file_width,
            height: p.file_height,
            hash: p.file_hash.clone(),
            thumbs: ViewerThumbs::new(p.file_width, p.file_height, &p.file_hash, cfg),
            download_url: download_url(&p.file_hash, cfg),
        }
    }

    pub fn from_geo(g: &GeoResult, cfg: &ViewerConfig) -> Self {
        Self {
            uid: g.photo_uid.clone(),
            media_type: g.photo_type.clone(),
            title: g.photo_title.clone(),
            caption: g.photo_caption.clone(),
            lat: g.photo_lat,
            lng: g.photo_lng,
            taken_at_local: g.taken_at_local.clone(),
            favorite: g.photo_favorite,
            playable: g.is_playable(),
            duration: g.photo_duration,
            width: g.file_width,
            height: g.file_height,
            hash: g.file_hash.clone(),
            thumbs: ViewerThumbs::new(g.file_width, g.file_height, &g.file_hash, cfg),
            download_url: download_url(&g.file_hash, cfg),
        }
    }
}

/// Renders geo results as a GeoJSON feature collection.
pub fn geojson(results: &[GeoResult]) -> serde_json::Value {
    let mut bbox: Option<[f64; 4]> = None;
    let features: Vec<serde_json::Value> = results
        .iter()
        .map(|r| {
            bbox = Some(match bbox {
                None => [r.photo_lng, r.photo_lat, r.photo_lng, r.photo_lat],
                Some([w, s, e, n]) => [w.min(r.photo_lng), s.min(r.photo_lat), e.max(r.photo_lng), n.max(r.photo_lat)],
            });
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [r.photo_lng, r.photo_lat] },
                "properties": {
                    "UID": r.photo_uid,
                    "Type": r.photo_type,
                    "Title": r.photo_title,
                    "TakenAt": r.taken_at,
                    "Hash": r.file_hash,
                    "Width": r.file_width,
                    "Height": r.file_height,
                    "Favorite": r.photo_favorite,
                    "Playable": r.is_playable(),
                }
            })
        })
        .collect();
    let mut collection = json!({ "type": "FeatureCollection", "features": features });
    if let Some(b) = bbox {
        collection["bbox"] = json!(b);
    }
    collection
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ViewerConfig {
        ViewerConfig {
            content_uri: "/api/v1".into(),
            api_uri: "/api/v1".into(),
            preview_token: "pt1".into(),
            download_token: "dl 1".into(),
        }
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit(3000, 2000, 720, 720), (720, 480));
        assert_eq!(fit(500, 400, 720, 720), (500, 400));
        assert_eq!(fit(0, 0, 720, 720), (720, 720));
    }

    #[test]
    fn test_viewer_thumbs_reuse_covering_size() {
        let t = ViewerThumbs::new(1000, 800, "abc", &cfg());
        assert_eq!(t.fit_720.src, "/api/v1/t/abc/pt1/fit_720");
        assert_eq!((t.fit_720.w, t.fit_720.h), (720, 576));
        assert_eq!(t.fit_1280.src, "/api/v1/t/abc/pt1/fit_1280");
        assert_eq!((t.fit_1280.w, t.fit_1280.h), (1000, 800));
        assert_eq!(t.fit_7680.src, "/api/v1/t/abc/pt1/fit_1280");
    }

    #[test]
    fn test_download_url() {
        assert_eq!(download_url("abc", &cfg()), "/api/v1/dl/abc?t=dl%201");
    }

    #[test]
    fn test_viewer_result_from_photo() {
        let p = PhotoResult {
            photo_uid: "pt9jtdre2lvl0yh7".into(),
            photo_type: "video".into(),
            file_hash: "abc".into(),
            file_width: 4000,
            file_height: 3000,
            ..Default::default()
        };
        let v = ViewerResult::from_photo(&p, &cfg());
        assert!(v.playable);
        assert_eq!(v.thumbs.fit_4096.src, "/api/v1/t/abc/pt1/fit_4096");
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["UID"], "pt9jtdre2lvl0yh7");
        assert_eq!(json["Type"], "video");
        assert!(json["Thumbs"]["fit_720"]["src"].is_string());
    }

    #[test]
    fn test_geojson() {
        let results = vec![
            GeoResult { photo_uid: "p1".into(), photo_lat: 52.5, photo_lng: 13.4, ..Default::default() },
            GeoResult { photo_uid: "p2".into(), photo_lat: 48.1, photo_lng: 11.6, ..Default::default() },
        ];
        let g = geojson(&results);
        assert_eq!(g["type"], "FeatureCollection");
        assert_eq!(g["features"].as_array().unwrap().len(), 2);
        assert_eq!(g["bbox"], json!([11.6, 48.1, 13.4, 52.5]));
        assert!(geojson(&[]).get("bbox").is_none());
    }
}
