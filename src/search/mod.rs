//! Photo search: filter parsing, access scoping and query compilation.
//!
//! [`Engine`] is the entry point. It turns a [`SearchFilter`] and an optional
//! [`Session`] into a [`QueryPlan`], hands the plan to its [`Catalog`] and
//! post-processes the rows.

pub mod acl;
pub mod compile;
pub mod form;
pub mod geo;
pub mod order;
pub mod plan;
pub mod predicate;
pub mod results;
pub mod store;
pub mod txt;
pub mod viewer;

use std::time::Instant;

use tracing::debug;

use crate::error::{Result, SearchError};

pub use acl::{AccessScope, Acl, Permission, Resource, Role, Rules, Session};
pub use compile::{Compiler, Target};
pub use form::{SearchFilter, MAX_RESULTS};
pub use geo::{GeoIndex, S2Index};
pub use order::SortOrder;
pub use plan::{Outcome, PlanBuilder};
pub use predicate::{Expr, Join, JoinKind, OrderTerm, QueryPlan, Source, Value};
pub use results::{merge, GeoResult, PhotoResult};
pub use store::{Album, AlbumStore, Catalog, Label, LabelStore, NearPhoto, PhotoStore, Storage, Subject, SubjectStore};
pub use viewer::{ViewerConfig, ViewerResult};

/// Photos of an album hidden from it by the owner.
const HIDDEN_IN_ALBUM: &str = "SELECT pa.photo_uid FROM photos_albums pa";

/// Current time in storage format.
fn now() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub struct Engine<'a> {
    catalog: &'a dyn Catalog,
    acl: &'a dyn Acl,
    geo: &'a dyn GeoIndex,
}

impl<'a> Engine<'a> {
    pub fn new(catalog: &'a dyn Catalog, acl: &'a dyn Acl, geo: &'a dyn GeoIndex) -> Self {
        Self { catalog, acl, geo }
    }

    /// Searches photos. Returns the rows, merged per photo when the filter asks
    /// for it, and the number of file rows matched. Without a session the
    /// search is unrestricted.
    pub fn search(&self, filter: &SearchFilter, session: Option<&Session>) -> Result<(Vec<PhotoResult>, usize)> {
        let start = Instant::now();
        let mut f = filter.clone();
        f.parse_query_string()?;
        let order: SortOrder = f.order.parse()?;

        let plan = match self.plan(&mut f, session, Target::Photos, |f, b| {
            b.filters(compile::file_selection(f, order));
            b.filters(order.predicates());
            let labeled = b.has_join("photos_labels");
            b.order(order.terms(labeled));
        })? {
            Outcome::Plan(plan) => plan,
            Outcome::Empty => return Ok((Vec::new(), 0)),
        };

        let rows = self.catalog.photos(&plan)?;
        let (results, count) = if f.merged {
            merge(rows)
        } else {
            let n = rows.len();
            (rows, n)
        };

        debug!("search: found {} results for {} [{:?}]", count, filter.serialize(), start.elapsed());
        Ok((results, count))
    }

    /// Searches located photos for the map. Sort orders do not apply here:
    /// results come by capture time, or by distance for a "near" search.
    pub fn search_geo(&self, filter: &SearchFilter, session: Option<&Session>) -> Result<Vec<GeoResult>> {
        let start = Instant::now();
        let mut f = filter.clone();
        f.parse_query_string()?;

        let plan = match self.plan(&mut f, session, Target::Geo, |f, b| {
            b.order(geo_order(f));
        })? {
            Outcome::Plan(plan) => plan,
            Outcome::Empty => return Ok(Vec::new()),
        };

        let results = self.catalog.geo(&plan)?;
        debug!("places: found {} results for {} [{:?}]", results.len(), filter.serialize(), start.elapsed());
        Ok(results)
    }

    /// Photo search projected for the full screen viewer.
    pub fn search_viewer(&self, filter: &SearchFilter, session: Option<&Session>, cfg: &ViewerConfig) -> Result<Vec<ViewerResult>> {
        let (photos, _) = self.search(filter, session)?;
        Ok(photos.iter().map(|p| ViewerResult::from_photo(p, cfg)).collect())
    }

    /// Resolves scope and access, compiles `f` and lets `finish` add the
    /// target specific fragments.
    fn plan(
        &self,
        f: &mut SearchFilter,
        session: Option<&Session>,
        target: Target,
        finish: impl FnOnce(&SearchFilter, &mut PlanBuilder),
    ) -> Result<Outcome> {
        let (resource, source) = match target {
            Target::Photos => (Resource::Photos, Source::Files),
            Target::Geo => (Resource::Places, Source::Photos),
        };

        let album = f.album.trim().to_lowercase();
        if f.scope.is_empty() && txt::is_uid(&album, 'a') {
            f.scope = album;
            f.album.clear();
        }
        f.scope = f.scope.trim().to_lowercase();
        if !f.scope.is_empty() && !txt::is_uid(&f.scope, 'a') {
            return Err(SearchError::InvalidId(f.scope.clone()));
        }

        let access = match session {
            Some(s) => AccessScope::resolve(self.acl, s, resource, &f.scope)?,
            None => AccessScope::unrestricted(resource),
        };

        let mut b = PlanBuilder::new(source);
        if !f.scope.is_empty() {
            self.album_scope(f, &mut b)?;
        }

        access.restrict(f);
        if target == Target::Geo {
            f.hidden = false;
        }

        if !f.near.is_empty() {
            let near = self
                .catalog
                .photo_by_uid(&f.near)?
                .ok_or_else(|| SearchError::NotFound(format!("photo {}", f.near)))?;
            f.s2 = near.cell_id;
            f.lat = Some(near.lat);
            f.lng = Some(near.lng);
        }
        f.dist = geo::clamp_dist(f.dist, !f.scope.is_empty());

        if let Some(visible) = access.predicate(&now()) {
            b.filter(visible);
        }

        if !Compiler::new(self.catalog, self.geo).compile(f, target, &mut b)? {
            return Ok(Outcome::Empty);
        }

        finish(f, &mut b);
        Ok(Outcome::Plan(b.build(f.limit(), f.offset())))
    }

    /// Restricts `b` to the album in `f.scope`. Dynamic albums apply their
    /// saved filter, manual albums their membership.
    fn album_scope(&self, f: &mut SearchFilter, b: &mut PlanBuilder) -> Result<()> {
        let album = self.catalog.album_by_uid(&f.scope)?.ok_or_else(|| SearchError::InvalidId(f.scope.clone()))?;

        if album.filter.is_empty() {
            b.join(Join {
                kind: JoinKind::Inner,
                table: "photos_albums",
                on: "photos_albums.photo_uid = photos.photo_uid",
                filter: Some(Expr::And(vec![
                    Expr::eq("photos_albums.hidden", 0),
                    Expr::eq("photos_albums.album_uid", album.uid.as_str()),
                ])),
            });
            return Ok(());
        }

        f.merge_saved(&album.filter)?;
        f.filter = album.filter;
        b.filter(Expr::not_in_select(
            "photos.photo_uid",
            HIDDEN_IN_ALBUM,
            Some(Expr::And(vec![Expr::eq("pa.hidden", 1), Expr::eq("pa.album_uid", album.uid)])),
        ));
        Ok(())
    }
}

fn geo_order(f: &SearchFilter) -> Vec<OrderTerm> {
    if f.near.is_empty() {
        return vec![OrderTerm::Asc("photos.taken_at"), OrderTerm::Asc("photos.photo_uid")];
    }
    vec![
        OrderTerm::MatchFirst { col: "photos.photo_uid", value: Value::from(&f.near) },
        OrderTerm::Distance {
            lat_col: "photos.photo_lat",
            lng_col: "photos.photo_lng",
            lat: f.lat.unwrap_or_default(),
            lng: f.lng.unwrap_or_default(),
        },
        OrderTerm::Asc("photos.photo_uid"),
    ]
}
