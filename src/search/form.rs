//! Search filter model and its query string encoding.
//!
//! A filter can be built from HTTP parameters ([`SearchFilter::from_pairs`]) or
//! from a query string such as `label:cat year:2016|2018 title:"Lake Como" beach`
//! ([`SearchFilter::parse`]). [`SearchFilter::serialize`] writes the canonical
//! query string used for saved album filters, share links and logging.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{Result, SearchError};
use crate::search::txt;

/// Hard upper bound for the number of rows returned by one search.
pub const MAX_RESULTS: i64 = 10_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    pub query: String,
    pub filter: String,
    pub uid: String,
    pub label: String,
    pub keywords: String,
    pub subject: String,
    pub subjects: String,
    pub face: String,
    pub faces: String,
    pub year: String,
    pub month: String,
    pub day: String,
    pub iso: String,
    pub mm: String,
    pub f: String,
    pub alt: String,
    pub mp: String,
    pub added: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub edited: Option<DateTime<Utc>>,
    pub taken: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub dist: f64,
    pub latlng: String,
    pub s2: String,
    pub olc: String,
    pub near: String,
    pub geo: Option<bool>,
    pub country: String,
    pub state: String,
    pub city: String,
    pub category: String,
    pub camera: String,
    pub lens: String,
    pub color: String,
    pub chroma: i64,
    pub quality: i64,
    pub mono: bool,
    pub panorama: bool,
    pub portrait: bool,
    pub landscape: bool,
    pub square: bool,
    pub hidden: bool,
    pub archived: bool,
    pub private: bool,
    pub public: bool,
    pub review: bool,
    pub error: bool,
    pub primary: bool,
    pub favorite: Option<bool>,
    pub scan: Option<bool>,
    pub stack: bool,
    pub stackable: bool,
    pub unstacked: bool,
    #[serde(rename = "type")]
    pub media_type: String,
    pub image: bool,
    pub video: bool,
    pub raw: bool,
    pub live: bool,
    pub animated: bool,
    pub vector: bool,
    pub audio: bool,
    pub document: bool,
    pub photo: bool,
    pub path: String,
    pub name: String,
    pub filename: String,
    pub original: String,
    pub title: String,
    pub hash: String,
    pub scope: String,
    pub album: String,
    pub albums: String,
    pub unsorted: bool,
    pub merged: bool,
    pub order: String,
    pub count: i64,
    pub offset: i64,
}

/// Keys kept under the caller's control when a saved album filter is applied.
const PAGING_KEYS: [&str; 4] = ["scope", "count", "offset", "order"];

impl SearchFilter {
    /// Parses a query string into a new filter.
    pub fn parse(query: &str) -> Result<Self> {
        let mut f = SearchFilter { query: query.to_string(), ..Default::default() };
        f.parse_query_string()?;
        Ok(f)
    }

    /// Builds a filter from request parameters. `q` holds a query string,
    /// every other key maps to a filter field. Empty values are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut f = SearchFilter::default();
        for (k, v) in pairs {
            let (k, v) = (k.as_ref(), v.as_ref());
            if v.trim().is_empty() {
                continue;
            }
            if k.eq_ignore_ascii_case("q") {
                f.query = v.to_string();
            } else {
                f.set(k, v)?;
            }
        }
        f.parse_query_string()?;
        Ok(f)
    }

    /// Moves `key:value` tokens from `query` into their fields and keeps the
    /// remaining free text in `query`.
    pub fn parse_query_string(&mut self) -> Result<()> {
        if self.query.trim().is_empty() {
            self.query.clear();
            return Ok(());
        }
        let mut text: Vec<String> = Vec::new();
        for token in tokenize(&self.query)? {
            match token {
                Token::Pair(k, v) => self.set(&k, &v)?,
                Token::Text(t) => text.push(t),
            }
        }
        self.query = text.join(" ");
        Ok(())
    }

    /// Assigns one field from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.trim().to_ascii_lowercase();
        let v = value.trim();
        match key.as_str() {
            "query" => self.query = v.to_string(),
            "filter" => self.filter = v.to_string(),
            "uid" | "id" => self.uid = v.to_string(),
            "label" => self.label = v.to_string(),
            "keywords" => self.keywords = v.to_string(),
            "subject" | "person" => self.subject = v.to_string(),
            "subjects" | "people" => self.subjects = v.to_string(),
            "face" => self.face = v.to_string(),
            "faces" => self.faces = v.to_string(),
            "year" => self.year = v.to_string(),
            "month" => self.month = v.to_string(),
            "day" => self.day = v.to_string(),
            "iso" => self.iso = v.to_string(),
            "mm" => self.mm = v.to_string(),
            "f" => self.f = v.to_string(),
            "alt" => self.alt = v.to_string(),
            "mp" => self.mp = v.to_string(),
            "added" => self.added = parse_date(&key, v),
            "updated" => self.updated = parse_date(&key, v),
            "edited" => self.edited = parse_date(&key, v),
            "taken" => self.taken = parse_date(&key, v),
            "before" => self.before = parse_date(&key, v),
            "after" => self.after = parse_date(&key, v),
            "lat" => self.lat = Some(parse_num(&key, v)?),
            "lng" => self.lng = Some(parse_num(&key, v)?),
            "dist" => self.dist = parse_num(&key, v)?,
            "latlng" => self.latlng = v.to_string(),
            "s2" => self.s2 = v.to_string(),
            "olc" => self.olc = v.to_string(),
            "near" => self.near = v.to_string(),
            "geo" => self.geo = parse_tri(&key, v)?,
            "country" => self.country = v.to_string(),
            "state" => self.state = v.to_string(),
            "city" => self.city = v.to_string(),
            "category" => self.category = v.to_string(),
            "camera" => self.camera = v.to_string(),
            "lens" => self.lens = v.to_string(),
            "color" => self.color = v.to_string(),
            "chroma" => self.chroma = parse_num(&key, v)?,
            "quality" => self.quality = parse_num(&key, v)?,
            "mono" => self.mono = parse_flag(&key, v)?,
            "panorama" => self.panorama = parse_flag(&key, v)?,
            "portrait" => self.portrait = parse_flag(&key, v)?,
            "landscape" => self.landscape = parse_flag(&key, v)?,
            "square" => self.square = parse_flag(&key, v)?,
            "hidden" => self.hidden = parse_flag(&key, v)?,
            "archived" => self.archived = parse_flag(&key, v)?,
            "private" => self.private = parse_flag(&key, v)?,
            "public" => self.public = parse_flag(&key, v)?,
            "review" => self.review = parse_flag(&key, v)?,
            "error" => self.error = parse_flag(&key, v)?,
            "primary" => self.primary = parse_flag(&key, v)?,
            "favorite" => self.favorite = parse_tri(&key, v)?,
            "scan" => self.scan = parse_tri(&key, v)?,
            "stack" => self.stack = parse_flag(&key, v)?,
            "stackable" => self.stackable = parse_flag(&key, v)?,
            "unstacked" => self.unstacked = parse_flag(&key, v)?,
            "type" => self.media_type = v.to_string(),
            "image" => self.image = parse_flag(&key, v)?,
            "video" => self.video = parse_flag(&key, v)?,
            "raw" => self.raw = parse_flag(&key, v)?,
            "live" => self.live = parse_flag(&key, v)?,
            "animated" => self.animated = parse_flag(&key, v)?,
            "vector" => self.vector = parse_flag(&key, v)?,
            "audio" => self.audio = parse_flag(&key, v)?,
            "document" => self.document = parse_flag(&key, v)?,
            "photo" => self.photo = parse_flag(&key, v)?,
            "path" => self.path = v.to_string(),
            "name" => self.name = v.to_string(),
            "filename" => self.filename = v.to_string(),
            "original" => self.original = v.to_string(),
            "title" => self.title = v.to_string(),
            "hash" => self.hash = v.to_string(),
            "scope" | "s" => self.scope = v.to_string(),
            "album" => self.album = v.to_string(),
            "albums" => self.albums = v.to_string(),
            "unsorted" => self.unsorted = parse_flag(&key, v)?,
            "merged" => self.merged = parse_flag(&key, v)?,
            "order" => self.order = v.to_ascii_lowercase(),
            "count" => self.count = parse_num(&key, v)?,
            "offset" => self.offset = parse_num(&key, v)?,
            _ => return Err(SearchError::BadRequest(format!("unknown filter {:?}", key))),
        }
        Ok(())
    }

    /// Non-default fields as `(key, value)` in canonical order, free text excluded.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut out: Vec<(&'static str, String)> = Vec::new();
        let mut text = |k: &'static str, v: &str| {
            if !v.is_empty() {
                out.push((k, v.to_string()));
            }
        };
        text("filter", &self.filter);
        text("uid", &self.uid);
        text("label", &self.label);
        text("keywords", &self.keywords);
        text("subject", &self.subject);
        text("subjects", &self.subjects);
        text("face", &self.face);
        text("faces", &self.faces);
        text("year", &self.year);
        text("month", &self.month);
        text("day", &self.day);
        text("iso", &self.iso);
        text("mm", &self.mm);
        text("f", &self.f);
        text("alt", &self.alt);
        text("mp", &self.mp);
        text("latlng", &self.latlng);
        text("s2", &self.s2);
        text("olc", &self.olc);
        text("near", &self.near);
        text("country", &self.country);
        text("state", &self.state);
        text("city", &self.city);
        text("category", &self.category);
        text("camera", &self.camera);
        text("lens", &self.lens);
        text("color", &self.color);
        text("type", &self.media_type);
        text("path", &self.path);
        text("name", &self.name);
        text("filename", &self.filename);
        text("original", &self.original);
        text("title", &self.title);
        text("hash", &self.hash);
        text("scope", &self.scope);
        text("album", &self.album);
        text("albums", &self.albums);
        text("order", &self.order);

        let dates = [
            ("added", self.added),
            ("updated", self.updated),
            ("edited", self.edited),
            ("taken", self.taken),
            ("before", self.before),
            ("after", self.after),
        ];
        for (k, d) in dates {
            if let Some(d) = d {
                out.push((k, d.to_rfc3339_opts(SecondsFormat::AutoSi, true)));
            }
        }

        if let Some(v) = self.lat {
            out.push(("lat", v.to_string()));
        }
        if let Some(v) = self.lng {
            out.push(("lng", v.to_string()));
        }
        if self.dist != 0.0 {
            out.push(("dist", self.dist.to_string()));
        }
        for (k, v) in [("chroma", self.chroma), ("quality", self.quality), ("count", self.count), ("offset", self.offset)] {
            if v != 0 {
                out.push((k, v.to_string()));
            }
        }
        for (k, v) in [("geo", self.geo), ("favorite", self.favorite), ("scan", self.scan)] {
            if let Some(v) = v {
                out.push((k, if v { "yes" } else { "no" }.to_string()));
            }
        }

        let flags = [
            ("mono", self.mono),
            ("panorama", self.panorama),
            ("portrait", self.portrait),
            ("landscape", self.landscape),
            ("square", self.square),
            ("hidden", self.hidden),
            ("archived", self.archived),
            ("private", self.private),
            ("public", self.public),
            ("review", self.review),
            ("error", self.error),
            ("primary", self.primary),
            ("stack", self.stack),
            ("stackable", self.stackable),
            ("unstacked", self.unstacked),
            ("image", self.image),
            ("video", self.video),
            ("raw", self.raw),
            ("live", self.live),
            ("animated", self.animated),
            ("vector", self.vector),
            ("audio", self.audio),
            ("document", self.document),
            ("photo", self.photo),
            ("unsorted", self.unsorted),
            ("merged", self.merged),
        ];
        out.extend(flags.into_iter().filter(|(_, v)| *v).map(|(k, _)| (k, "true".to_string())));
        out
    }

    /// Canonical query string. `parse(serialize(f)) == f` for parsed filters.
    pub fn serialize(&self) -> String {
        let mut parts: Vec<String> = self.pairs().into_iter().map(|(k, v)| format!("{}:{}", k, quote(&v))).collect();
        if !self.query.is_empty() {
            parts.push(quote(&self.query));
        }
        parts.join(" ")
    }

    /// Applies a saved album filter: every field it sets overrides this filter,
    /// except scope and paging which stay under the caller's control.
    pub fn merge_saved(&mut self, saved: &str) -> Result<()> {
        let saved = SearchFilter::parse(saved).map_err(|e| SearchError::BadFilter(e.to_string()))?;
        for (k, v) in saved.pairs() {
            if PAGING_KEYS.contains(&k) {
                continue;
            }
            self.set(k, &v).map_err(|e| SearchError::BadFilter(e.to_string()))?;
        }
        if !saved.query.is_empty() {
            self.query = if self.query.is_empty() { saved.query } else { format!("{} {}", self.query, saved.query) };
        }
        Ok(())
    }

    /// Effective page size, always within `1..=MAX_RESULTS`.
    pub fn limit(&self) -> i64 {
        if self.count > 0 && self.count <= MAX_RESULTS {
            self.count
        } else {
            MAX_RESULTS
        }
    }

    /// Effective offset. Negative offsets are treated as zero.
    pub fn offset(&self) -> i64 {
        self.offset.max(0)
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Pair(String, String),
    Text(String),
}

fn tokenize(s: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = s.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }
        if is_quote(chars[i]) {
            let (text, next) = read_quoted(&chars, i)?;
            tokens.push(Token::Text(text));
            i = next;
            continue;
        }
        let start = i;
        while i < chars.len() && is_key_char(chars[i]) {
            i += 1;
        }
        if i > start && i < chars.len() && chars[i] == ':' {
            let key: String = chars[start..i].iter().collect();
            i += 1;
            if i < chars.len() && is_quote(chars[i]) {
                let (value, next) = read_quoted(&chars, i)?;
                tokens.push(Token::Pair(key, value));
                i = next;
            } else {
                let vstart = i;
                while i < chars.len() && !chars[i].is_whitespace() {
                    i += 1;
                }
                tokens.push(Token::Pair(key, chars[vstart..i].iter().collect()));
            }
            continue;
        }
        while i < chars.len() && !chars[i].is_whitespace() {
            i += 1;
        }
        tokens.push(Token::Text(chars[start..i].iter().collect()));
    }
    Ok(tokens)
}

/// Reads a quoted value starting at the opening quote. Inside it a backslash
/// escapes the active quote character and itself.
fn read_quoted(chars: &[char], start: usize) -> Result<(String, usize)> {
    let q = chars[start];
    let mut out = String::new();
    let mut i = start + 1;
    while i < chars.len() && chars[i] != q {
        if chars[i] == '\\' && i + 1 < chars.len() && (chars[i + 1] == q || chars[i + 1] == '\\') {
            i += 1;
        }
        out.push(chars[i]);
        i += 1;
    }
    if i >= chars.len() {
        return Err(SearchError::BadRequest("unterminated quote in query".to_string()));
    }
    Ok((out, i + 1))
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn quote(v: &str) -> String {
    if !v.contains(|c: char| c.is_whitespace() || c == ':' || is_quote(c)) {
        return v.to_string();
    }
    let q = if v.contains('"') && !v.contains('\'') { '\'' } else { '"' };
    let mut out = String::with_capacity(v.len() + 2);
    out.push(q);
    for c in v.chars() {
        if c == q || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(q);
    out
}

fn parse_flag(key: &str, v: &str) -> Result<bool> {
    if v.is_empty() || txt::is_yes(v) {
        Ok(true)
    } else if txt::is_no(v) {
        Ok(false)
    } else {
        Err(SearchError::BadRequest(format!("{} must be a boolean, got {:?}", key, v)))
    }
}

fn parse_tri(key: &str, v: &str) -> Result<Option<bool>> {
    txt::tri_state(v).map_err(|_| SearchError::BadRequest(format!("{} must be yes or no, got {:?}", key, v)))
}

fn parse_num<T: std::str::FromStr>(key: &str, v: &str) -> Result<T> {
    v.parse::<T>().map_err(|_| SearchError::BadRequest(format!("{} must be a number, got {:?}", key, v)))
}

/// Unparsable dates leave the field unset.
fn parse_date(key: &str, v: &str) -> Option<DateTime<Utc>> {
    if v.is_empty() {
        return None;
    }
    if let Ok(d) = DateTime::parse_from_rfc3339(v) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S") {
        return Some(d.and_utc());
    }
    if let Some(d) = NaiveDate::parse_from_str(v, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0)) {
        return Some(d.and_utc());
    }
    tracing::debug!("search: ignoring invalid {} date {:?}", key, v);
    None
}
