//! Translates a search filter into joins and predicates.

use tracing::debug;

use crate::error::{Result, SearchError};
use crate::search::form::SearchFilter;
use crate::search::geo::{self, GeoIndex};
use crate::search::order::SortOrder;
use crate::search::plan::PlanBuilder;
use crate::search::predicate::{Expr, Join, JoinKind, Value};
use crate::search::store::{Catalog, Label};
use crate::search::txt;

const KEYWORD_PHOTOS: &str = "SELECT pk.photo_id FROM keywords k JOIN photos_keywords pk ON k.id = pk.keyword_id";
const LABEL_PHOTOS: &str = "SELECT pl.photo_id FROM photos_labels pl";
const MARKER_PHOTOS: &str = "SELECT f.photo_id FROM files f JOIN markers m ON f.file_uid = m.file_uid AND m.marker_invalid = 0";
const FACE_KIND_PHOTOS: &str =
    "SELECT f.photo_id FROM files f JOIN markers m ON f.file_uid = m.file_uid AND m.marker_invalid = 0 JOIN faces ON faces.id = m.face_id";
const STACKED_PHOTOS: &str = "SELECT a.photo_id FROM files a JOIN files b ON a.id <> b.id AND a.photo_id = b.photo_id AND a.file_type = b.file_type WHERE a.file_type = 'jpg'";
const SORTED_PHOTOS: &str =
    "SELECT pa.photo_uid FROM photos_albums pa JOIN albums a ON a.album_uid = pa.album_uid WHERE pa.hidden = 0 AND a.deleted_at IS NULL";
const ALBUM_PHOTOS: &str = "SELECT pa.photo_uid FROM photos_albums pa JOIN albums a ON a.album_uid = pa.album_uid AND pa.hidden = 0";

/// Label matches with at least this confidence are searchable.
const MAX_UNCERTAINTY: i64 = 100;

/// Keywords at least this long match as prefix, shorter ones exactly.
const KEYWORD_PREFIX_LEN: usize = 4;

/// Photo types covered by the `photo` flag.
const PHOTO_TYPES: [&str; 5] = ["image", "raw", "live", "animated", "vector"];

/// Query words that turn into filter flags, first match wins.
const SHORTCUTS: [&str; 18] = [
    "faces", "people", "videos", "video", "vectors", "vector", "animated", "gifs", "gif", "live", "raws", "raw", "favorites",
    "stacks", "panoramas", "scans", "monochrome", "mono",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// File rows for the list search.
    Photos,
    /// Located photos for the map.
    Geo,
}

pub struct Compiler<'a> {
    catalog: &'a dyn Catalog,
    geo: &'a dyn GeoIndex,
}

impl<'a> Compiler<'a> {
    pub fn new(catalog: &'a dyn Catalog, geo: &'a dyn GeoIndex) -> Self {
        Self { catalog, geo }
    }

    /// Adds the fragments for `f` to `b`. Returns false when the result is
    /// known to be empty without running a query. May rewrite `f`, e.g. to
    /// turn query words into flags.
    pub fn compile(&self, f: &mut SearchFilter, target: Target, b: &mut PlanBuilder) -> Result<bool> {
        ids(f, b)?;

        if !f.label.is_empty() {
            let slugs: Vec<String> = txt::split_or(&f.label).iter().map(|v| txt::slug(v)).filter(|s| !s.is_empty()).collect();
            let labels = self.catalog.labels_by_slug(&slugs)?;
            if labels.is_empty() {
                debug!("search: label {} not found", f.label.to_lowercase());
                return Ok(false);
            }
            let ids = self.expand_labels(&labels)?;
            b.join(Join {
                kind: JoinKind::Inner,
                table: "photos_labels",
                on: "photos_labels.photo_id = photos.id",
                filter: Some(Expr::And(vec![
                    Expr::lt("photos_labels.uncertainty", MAX_UNCERTAINTY),
                    Expr::is_in("photos_labels.label_id", ids),
                ])),
            });
            match target {
                Target::Photos => b.group_by(&["photos.id", "files.id"]),
                Target::Geo => b.group_by(&["photos.id"]),
            };
        }

        shortcuts(f);

        if let Some(tri) = f.geo {
            b.filter(if tri { Expr::ne("photos.cell_id", geo::UNKNOWN_CELL) } else { Expr::eq("photos.cell_id", geo::UNKNOWN_CELL) });
        }

        if !f.query.is_empty() {
            self.query(&f.query, b)?;
        }

        for group in and_groups(&f.keywords) {
            if let Some(words) = keyword_match(&group, 2) {
                b.filter(Expr::in_select("photos.id", KEYWORD_PHOTOS, words));
            }
        }

        faces(f, b);
        self.subjects(f, b)?;
        status(f, target, b);
        equipment(f, b);
        ranges(f, b);
        dates(f, b);
        appearance(f, b);
        places(f, b);
        media_types(f, b);
        names(f, b);
        self.location(f, b);

        if f.scope.is_empty() {
            albums(f, b);
        }

        if target == Target::Geo {
            b.filter(Expr::ne("photos.photo_lat", 0.0));
        }

        Ok(true)
    }

    /// Label ids plus the ids of labels filed under them as category.
    fn expand_labels(&self, labels: &[Label]) -> Result<Vec<Value>> {
        let mut ids: Vec<i64> = Vec::new();
        for l in labels {
            if !ids.contains(&l.id) {
                ids.push(l.id);
            }
            let children = self.catalog.category_children(l.id)?;
            debug!("search: label {} includes {} categories", l.name, children.len());
            for id in children {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        Ok(ids.into_iter().map(Value::from).collect())
    }

    /// Free text: label names first, then subject names, then keywords.
    fn query(&self, query: &str, b: &mut PlanBuilder) -> Result<()> {
        let mut slugs: Vec<String> = query.split_whitespace().map(txt::slug).filter(|s| !s.is_empty()).collect();
        let whole = txt::slug(query);
        if !whole.is_empty() && !slugs.contains(&whole) {
            slugs.push(whole);
        }
        let labels = self.catalog.labels_by_custom_slug(&slugs)?;

        if labels.is_empty() {
            debug!("search: label {} not found, using fuzzy search", query);
            let (subjects, remaining) = self.subject_matches(query)?;
            for uids in subjects {
                b.filter(Expr::in_select("photos.id", MARKER_PHOTOS, Expr::is_in("m.subj_uid", uids)));
            }
            for group in and_groups(&remaining) {
                if let Some(words) = keyword_match(&group, KEYWORD_PREFIX_LEN) {
                    b.filter(Expr::in_select("photos.id", KEYWORD_PHOTOS, words));
                }
            }
            return Ok(());
        }

        let ids = self.expand_labels(&labels)?;
        let labeled = || {
            Expr::in_select(
                "photos.id",
                LABEL_PHOTOS,
                Expr::And(vec![Expr::lt("pl.uncertainty", MAX_UNCERTAINTY), Expr::is_in("pl.label_id", ids.clone())]),
            )
        };
        let groups: Vec<Expr> = and_groups(query).iter().filter_map(|g| keyword_match(g, KEYWORD_PREFIX_LEN)).collect();
        if groups.is_empty() {
            b.filter(labeled());
        }
        for words in groups {
            b.filter(Expr::Or(vec![Expr::in_select("photos.id", KEYWORD_PHOTOS, words), labeled()]));
        }
        Ok(())
    }

    /// Splits query words naming a person from the rest. Each matched word
    /// yields the uids of the subjects it names.
    fn subject_matches(&self, query: &str) -> Result<(Vec<Vec<Value>>, String)> {
        let mut groups = Vec::new();
        let mut remaining = Vec::new();
        for token in query.split_whitespace() {
            let word = token.trim_matches(|c: char| !c.is_alphanumeric());
            if word.chars().count() > 1 {
                let uids: Vec<Value> = self.catalog.subjects_by_name(word)?.into_iter().map(|s| Value::from(s.uid)).collect();
                if !uids.is_empty() {
                    groups.push(uids);
                    continue;
                }
            }
            remaining.push(token);
        }
        Ok((groups, remaining.join(" ")))
    }

    fn subjects(&self, f: &SearchFilter, b: &mut PlanBuilder) -> Result<()> {
        for group in f.subject.to_lowercase().split(txt::AND).map(str::trim).filter(|g| !g.is_empty()) {
            let alternatives = txt::split_or(group);
            if alternatives.iter().all(|v| txt::is_uid(v, 'j')) {
                b.filter(Expr::in_select("photos.id", MARKER_PHOTOS, Expr::is_in("m.subj_uid", alternatives.iter().map(Value::from).collect())));
                continue;
            }
            let mut uids = Vec::new();
            for name in &alternatives {
                uids.extend(self.catalog.subjects_by_name(name)?.into_iter().map(|s| Value::from(s.uid)));
            }
            b.filter(subject_filter(uids));
        }

        for word in txt::split_and(&f.subjects) {
            let uids: Vec<Value> = self.catalog.subjects_by_name(&word)?.into_iter().map(|s| Value::from(s.uid)).collect();
            b.filter(subject_filter(uids));
        }
        Ok(())
    }

    /// Cell range first, then bounding box, then radius around a point.
    fn location(&self, f: &SearchFilter, b: &mut PlanBuilder) {
        if !f.s2.is_empty() || !f.olc.is_empty() {
            let token = if !f.s2.is_empty() { Some(f.s2.clone()) } else { self.geo.olc_token(&f.olc) };
            match token.and_then(|t| self.geo.cell_range(&t, geo::level_for_km(f.dist))) {
                Some((min, max)) => {
                    b.filter(Expr::between("photos.cell_id", min, max));
                }
                None => debug!("search: ignoring invalid location {}{}", f.s2, f.olc),
            }
        } else if !f.latlng.is_empty() {
            match geo::parse_bounds(&f.latlng) {
                Some((lat_n, lng_e, lat_s, lng_w)) => {
                    b.filter(Expr::between("photos.photo_lat", lat_s, lat_n));
                    if lng_w <= lng_e {
                        b.filter(Expr::between("photos.photo_lng", lng_w, lng_e));
                    } else {
                        // Box crosses the antimeridian.
                        b.filter(Expr::Or(vec![
                            Expr::between("photos.photo_lng", lng_w, 180.0),
                            Expr::between("photos.photo_lng", -180.0, lng_e),
                        ]));
                    }
                }
                None => debug!("search: ignoring invalid bounds {}", f.latlng),
            }
        } else if let (Some(lat), Some(lng)) = (f.lat, f.lng) {
            if let (Some((south, north)), Some((west, east))) = (geo::lat_range(lat, f.dist), geo::lng_range(lat, lng, f.dist)) {
                b.filter(Expr::between("photos.photo_lat", south, north));
                b.filter(Expr::between("photos.photo_lng", west, east));
            }
        }

        if let Some((lo, hi)) = txt::int_range(&f.alt, -6_378_000, 1_000_000_000) {
            b.filter(Expr::between("photos.photo_altitude", lo, hi));
        }
    }
}

/// Which files of a matching photo are returned by the list search.
pub fn file_selection(f: &SearchFilter, order: SortOrder) -> Vec<Expr> {
    let mut out = Vec::new();
    if f.error {
        out.push(Expr::ne("files.file_error", ""));
    } else if !f.hidden {
        out.push(Expr::eq("files.file_error", ""));
    }

    if f.primary {
        out.push(Expr::eq("files.file_primary", 1));
    } else if matches!(order, SortOrder::Similar | SortOrder::Random) {
        out.push(Expr::Or(vec![Expr::eq("files.file_primary", 1), Expr::eq("files.media_type", "video")]));
    } else {
        out.push(Expr::eq("files.file_sidecar", 0));
        out.push(Expr::eq("files.file_missing", 0));
    }
    out
}

fn ids(f: &SearchFilter, b: &mut PlanBuilder) -> Result<()> {
    if f.uid.is_empty() {
        return Ok(());
    }
    let ids = txt::split_or(&f.uid.to_lowercase());
    let values: Vec<Value> = ids.iter().map(Value::from).collect();
    if ids.iter().all(|v| txt::is_uid(v, 'p')) {
        b.filter(Expr::is_in("photos.photo_uid", values));
    } else if ids.iter().all(|v| txt::is_uid(v, 'f')) {
        b.filter(Expr::is_in("files.file_uid", values));
    } else if ids.iter().all(|v| txt::is_hash(v)) {
        b.filter(Expr::is_in("files.file_hash", values));
    } else {
        return Err(SearchError::BadRequest(format!("invalid uid {:?}", f.uid)));
    }
    Ok(())
}

/// Turns a well known word in the free text into the matching flag.
fn shortcuts(f: &mut SearchFilter) {
    if f.query.is_empty() {
        return;
    }
    let terms = txt::search_terms(&f.query);
    if terms.is_empty() {
        if f.title.is_empty() {
            f.title = format!("{}*", f.query.trim().trim_matches(|c| c == '%' || c == '*'));
            f.query.clear();
        }
        return;
    }

    let Some(term) = SHORTCUTS.iter().find(|s| terms.contains(**s)) else {
        return;
    };
    match *term {
        "faces" | "people" => f.faces = "true".to_string(),
        "videos" | "video" => f.video = true,
        "vectors" | "vector" => f.vector = true,
        "animated" | "gifs" | "gif" => f.animated = true,
        "live" => f.live = true,
        "raws" | "raw" => f.raw = true,
        "favorites" => f.favorite = Some(true),
        "stacks" => f.stack = true,
        "panoramas" => f.panorama = true,
        "scans" => f.scan = Some(true),
        _ => f.mono = true,
    }
    let rest: Vec<&str> = f.query.split_whitespace().filter(|w| !w.eq_ignore_ascii_case(term)).collect();
    f.query = txt::clean_query(&rest.join(" "));
}

/// `&` separated groups of a free text, each holding `|` or space separated words.
fn and_groups(s: &str) -> Vec<String> {
    s.split(txt::AND).map(str::trim).filter(|g| !g.is_empty()).map(str::to_string).collect()
}

/// Any word of `group` matching a keyword. Words of `prefix_len` or more
/// characters match as prefix.
fn keyword_match(group: &str, prefix_len: usize) -> Option<Expr> {
    let mut words: Vec<String> = Vec::new();
    for w in txt::words(&group.to_lowercase()) {
        if w.chars().count() > 1 && !words.contains(&w) {
            words.push(w);
        }
    }
    if words.is_empty() {
        return None;
    }
    Some(Expr::Or(
        words
            .into_iter()
            .map(|w| if w.chars().count() >= prefix_len { Expr::like("k.keyword", format!("{}%", txt::escape_like(&w))) } else { Expr::eq("k.keyword", w) })
            .collect(),
    ))
}

fn subject_filter(uids: Vec<Value>) -> Expr {
    if uids.is_empty() {
        Expr::False
    } else {
        Expr::in_select("photos.id", MARKER_PHOTOS, Expr::is_in("m.subj_uid", uids))
    }
}

fn faces(f: &mut SearchFilter, b: &mut PlanBuilder) {
    let faces = f.faces.trim().to_string();
    if !faces.is_empty() {
        if txt::is_new(&faces) {
            if f.face.is_empty() {
                f.face = "new".to_string();
            }
        } else if txt::is_yes(&faces) {
            b.filter(Expr::gt("photos.photo_faces", 0));
        } else if txt::is_no(&faces) {
            b.filter(Expr::eq("photos.photo_faces", 0));
        } else if let Ok(n) = faces.parse::<i64>() {
            if n > 0 {
                b.filter(Expr::ge("photos.photo_faces", n));
            }
        }
    }

    let face = f.face.trim();
    if face.is_empty() {
        return;
    }
    let marker = |cond: Expr| Expr::in_select("photos.id", MARKER_PHOTOS, Expr::And(vec![Expr::eq("m.marker_type", "face"), cond]));
    if face.len() >= 32 {
        for group in face.to_uppercase().split(txt::AND).map(str::trim).filter(|g| !g.is_empty()) {
            let ids = txt::split_or(group).into_iter().map(Value::from).collect();
            b.filter(marker(Expr::is_in("m.face_id", ids)));
        }
    } else if txt::is_new(face) {
        b.filter(marker(Expr::And(vec![Expr::ne("m.face_id", ""), Expr::eq("m.subj_uid", "")])));
    } else if txt::is_no(face) {
        b.filter(marker(Expr::eq("m.face_id", "")));
    } else if txt::is_yes(face) {
        b.filter(marker(Expr::ne("m.face_id", "")));
    } else if let Ok(kind) = face.parse::<i64>() {
        b.filter(Expr::in_select(
            "photos.id",
            FACE_KIND_PHOTOS,
            Expr::And(vec![Expr::ne("m.face_id", ""), Expr::eq("faces.face_kind", kind)]),
        ));
    }
}

fn status(f: &SearchFilter, target: Target, b: &mut PlanBuilder) {
    if f.hidden && target == Target::Photos {
        b.filter(Expr::eq("photos.photo_quality", -1));
        b.filter(Expr::is_null("photos.deleted_at"));
        return;
    }
    if f.archived {
        b.filter(Expr::gt("photos.photo_quality", -1));
        b.filter(Expr::not_null("photos.deleted_at"));
        return;
    }
    b.filter(Expr::is_null("photos.deleted_at"));
    if f.private {
        b.filter(Expr::eq("photos.photo_private", 1));
    } else if f.public {
        b.filter(Expr::eq("photos.photo_private", 0));
    }
    if f.review {
        b.filter(Expr::lt("photos.photo_quality", 3));
    } else if f.quality != 0 && !f.private {
        b.filter(Expr::ge("photos.photo_quality", f.quality));
    }
}

fn equipment(f: &SearchFilter, b: &mut PlanBuilder) {
    let camera = f.camera.trim();
    if txt::is_pos_int(camera) {
        b.filter(Expr::eq("photos.camera_id", camera.parse::<i64>().unwrap_or_default()));
    } else if !camera.is_empty() {
        let v = txt::like_prefix(camera);
        b.filter(Expr::Or(vec![
            Expr::like("cameras.camera_name", v.clone()),
            Expr::like("cameras.camera_model", v.clone()),
            Expr::like("cameras.camera_slug", v),
        ]));
    }

    let lens = f.lens.trim();
    if txt::is_pos_int(lens) {
        b.filter(Expr::eq("photos.lens_id", lens.parse::<i64>().unwrap_or_default()));
    } else if !lens.is_empty() {
        let v = txt::like_prefix(lens);
        b.filter(Expr::Or(vec![
            Expr::like("lenses.lens_name", v.clone()),
            Expr::like("lenses.lens_model", v.clone()),
            Expr::like("lenses.lens_slug", v),
        ]));
    }
}

fn ranges(f: &SearchFilter, b: &mut PlanBuilder) {
    if let Some((lo, hi)) = txt::int_range(&f.iso, 0, 10_000_000) {
        b.filter(Expr::between("photos.photo_iso", lo, hi));
    }
    if let Some((lo, hi)) = txt::int_range(&f.mm, 0, 10_000_000) {
        b.filter(Expr::between("photos.photo_focal_length", lo, hi));
    }
    if let Some((lo, hi)) = txt::float_range(&f.f, 0.0, 10_000_000.0) {
        b.filter(Expr::between("photos.photo_f_number", lo - 0.01, hi + 0.01));
    }
    if let Some((lo, hi)) = txt::int_range(&f.mp, 0, 32_000) {
        b.filter(Expr::between("photos.photo_resolution", lo, hi));
    }

    for (value, col, max) in [
        (&f.year, "photos.photo_year", txt::YEAR_MAX),
        (&f.month, "photos.photo_month", txt::MONTH_MAX),
        (&f.day, "photos.photo_day", txt::DAY_MAX),
    ] {
        let values = txt::any_int(value, max);
        if !values.is_empty() {
            b.filter(Expr::is_in(col, values.into_iter().map(Value::from).collect()));
        }
    }
}

fn dates(f: &SearchFilter, b: &mut PlanBuilder) {
    let fmt = |d: &chrono::DateTime<chrono::Utc>| d.format("%Y-%m-%d %H:%M:%S").to_string();
    if let Some(d) = &f.added {
        b.filter(Expr::ge("photos.created_at", fmt(d)));
    }
    if let Some(d) = &f.updated {
        b.filter(Expr::ge("photos.updated_at", fmt(d)));
    }
    if let Some(d) = &f.edited {
        b.filter(Expr::ge("photos.edited_at", fmt(d)));
    }
    if let Some(d) = &f.taken {
        b.filter(Expr::same_day("photos.taken_at", fmt(d)));
    }
    if let Some(d) = &f.before {
        b.filter(Expr::le("photos.taken_at", fmt(d)));
    }
    if let Some(d) = &f.after {
        b.filter(Expr::ge("photos.taken_at", fmt(d)));
    }
}

fn appearance(f: &SearchFilter, b: &mut PlanBuilder) {
    if !f.color.is_empty() {
        let colors = txt::split_or(&f.color.to_lowercase()).into_iter().map(Value::from).collect();
        b.filter(Expr::is_in("files.file_main_color", colors));
    }
    if f.mono {
        b.filter(Expr::eq("files.file_chroma", 0));
    } else if f.chroma > 9 {
        b.filter(Expr::gt("files.file_chroma", f.chroma));
    } else if f.chroma > 0 {
        b.filter(Expr::gt("files.file_chroma", 0));
        b.filter(Expr::le("files.file_chroma", f.chroma));
    }

    if f.panorama {
        b.filter(Expr::eq("photos.photo_panorama", 1));
    }
    if f.portrait {
        b.filter(Expr::eq("files.file_portrait", 1));
    }
    if f.landscape {
        b.filter(Expr::gt("files.file_aspect_ratio", 1.25));
    }
    if f.square {
        b.filter(Expr::eq("files.file_aspect_ratio", 1.0));
    }
    if let Some(v) = f.favorite {
        b.filter(Expr::eq("photos.photo_favorite", v));
    }
    if let Some(v) = f.scan {
        b.filter(Expr::eq("photos.photo_scan", v));
    }

    if f.stackable {
        b.filter(Expr::gt("photos.photo_stack", -1));
    } else if f.unstacked {
        b.filter(Expr::eq("photos.photo_stack", -1));
    }
    if f.stack {
        b.filter(Expr::InSelect { col: "photos.id", select: STACKED_PHOTOS, filter: None, negated: false });
    }
}

fn places(f: &SearchFilter, b: &mut PlanBuilder) {
    let any = |s: &str, lower: bool| -> Vec<Value> {
        let s = if lower { s.to_lowercase() } else { s.to_string() };
        txt::split_or(&s).into_iter().map(Value::from).collect()
    };
    if !f.country.is_empty() {
        b.filter(Expr::is_in("photos.photo_country", any(&f.country, true)));
    }
    if !f.state.is_empty() {
        b.filter(Expr::is_in("places.place_state", any(&f.state, false)));
    }
    if !f.city.is_empty() {
        b.filter(Expr::is_in("places.place_city", any(&f.city, false)));
    }
    if !f.category.is_empty() {
        b.join(Join { kind: JoinKind::Inner, table: "cells", on: "photos.cell_id = cells.id", filter: None });
        b.filter(Expr::is_in("cells.cell_category", any(&f.category, true)));
    }
}

fn media_types(f: &SearchFilter, b: &mut PlanBuilder) {
    if !f.media_type.is_empty() {
        let types = txt::split_or(&f.media_type.to_lowercase()).into_iter().map(Value::from).collect();
        b.filter(Expr::is_in("photos.photo_type", types));
        return;
    }

    let mut types: Vec<&str> = Vec::new();
    let mut add = |t: &'static str| {
        if !types.contains(&t) {
            types.push(t);
        }
    };
    if f.photo {
        PHOTO_TYPES.iter().for_each(|t| add(*t));
    }
    for (set, t) in [
        (f.image, "image"),
        (f.video, "video"),
        (f.raw, "raw"),
        (f.live, "live"),
        (f.animated, "animated"),
        (f.vector, "vector"),
        (f.audio, "audio"),
        (f.document, "document"),
    ] {
        if set {
            add(t);
        }
    }
    if !types.is_empty() {
        b.filter(Expr::is_in("photos.photo_type", types.into_iter().map(Value::from).collect()));
    }
}

fn names(f: &SearchFilter, b: &mut PlanBuilder) {
    let path = f.path.trim().trim_start_matches('/');
    if let Some(exact) = path.strip_suffix('/') {
        b.filter(Expr::eq("photos.photo_path", exact));
    } else if !path.is_empty() {
        b.filter(Expr::any_like("photos.photo_path", txt::split_or(path).iter().map(|p| txt::like_pattern(p)).collect()));
    }

    if !f.name.is_empty() {
        let names = txt::split_or(&f.name).iter().map(|n| txt::like_pattern(strip_known_ext(n))).collect();
        b.filter(Expr::any_like("photos.photo_name", names));
    }
    for (value, col) in [(&f.filename, "files.file_name"), (&f.original, "photos.original_name"), (&f.title, "photos.photo_title")] {
        if !value.is_empty() {
            b.filter(Expr::any_like(col, txt::split_or(value).iter().map(|v| txt::like_pattern(v)).collect()));
        }
    }

    if !f.hash.is_empty() {
        let hashes = txt::split_or(&f.hash.to_lowercase()).into_iter().map(Value::from).collect();
        b.filter(Expr::is_in("files.file_hash", hashes));
    }
}

/// File name without directories and a trailing short extension.
fn strip_known_ext(name: &str) -> &str {
    let base = name.rsplit('/').next().unwrap_or(name);
    match base.rfind('.') {
        Some(i) if i > 0 && base.len() - i <= 6 && base[i + 1..].chars().all(|c| c.is_ascii_alphanumeric()) => &base[..i],
        _ => base,
    }
}

fn albums(f: &SearchFilter, b: &mut PlanBuilder) {
    if f.unsorted && f.filter.is_empty() {
        b.filter(Expr::InSelect { col: "photos.photo_uid", select: SORTED_PHOTOS, filter: None, negated: true });
    } else if !f.album.is_empty() {
        let v = txt::like_prefix(&f.album);
        b.filter(Expr::in_select(
            "photos.photo_uid",
            ALBUM_PHOTOS,
            Expr::Or(vec![Expr::like("a.album_title", v.clone()), Expr::like("a.album_slug", v)]),
        ));
    } else if !f.albums.is_empty() {
        for group in and_groups(&f.albums) {
            let titles: Vec<Expr> = txt::words(&group).into_iter().map(|w| Expr::like("a.album_title", format!("{}%", txt::escape_like(&w)))).collect();
            if !titles.is_empty() {
                b.filter(Expr::in_select("photos.photo_uid", ALBUM_PHOTOS, Expr::Or(titles)));
            }
        }
    }
}
