//! Collaborators the search engine reads from.

use serde::{Deserialize, Serialize};

use crate::search::predicate::QueryPlan;
use crate::search::results::{GeoResult, PhotoResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    pub uid: String,
    pub slug: String,
    pub custom_slug: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub uid: String,
    pub name: String,
    pub alias: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub uid: String,
    pub title: String,
    /// Saved query string of a dynamic album, empty for manual albums.
    pub filter: String,
}

/// Reference photo of a "near" search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearPhoto {
    pub uid: String,
    pub cell_id: String,
    pub lat: f64,
    pub lng: f64,
}

pub trait LabelStore {
    /// Labels whose slug or custom slug is one of `slugs`.
    fn labels_by_slug(&self, slugs: &[String]) -> anyhow::Result<Vec<Label>>;
    /// Labels whose custom slug is one of `slugs`.
    fn labels_by_custom_slug(&self, slugs: &[String]) -> anyhow::Result<Vec<Label>>;
    /// Ids of labels filed under `label_id` as their category.
    fn category_children(&self, label_id: i64) -> anyhow::Result<Vec<i64>>;
}

pub trait SubjectStore {
    /// Subjects whose name or alias contains a word starting with `name`.
    fn subjects_by_name(&self, name: &str) -> anyhow::Result<Vec<Subject>>;
}

pub trait AlbumStore {
    fn album_by_uid(&self, uid: &str) -> anyhow::Result<Option<Album>>;
}

pub trait PhotoStore {
    fn photo_by_uid(&self, uid: &str) -> anyhow::Result<Option<NearPhoto>>;
}

/// Executes compiled plans.
pub trait Storage {
    fn photos(&self, plan: &QueryPlan) -> anyhow::Result<Vec<PhotoResult>>;
    fn geo(&self, plan: &QueryPlan) -> anyhow::Result<Vec<GeoResult>>;
}

pub trait Catalog: LabelStore + SubjectStore + AlbumStore + PhotoStore + Storage {}

impl<T: LabelStore + SubjectStore + AlbumStore + PhotoStore + Storage> Catalog for T {}
