mod common;

use std::collections::BTreeSet;

use common::*;
use nazr_search::db::query::Library;
use nazr_search::error::SearchError;
use nazr_search::search::{Engine, Role, Rules, S2Index, SearchFilter, Session};

fn uids<'a>(rows: impl IntoIterator<Item = &'a String>) -> BTreeSet<&'a str> {
    rows.into_iter().map(String::as_str).collect()
}

fn filter(pairs: &[(&str, &str)]) -> SearchFilter {
    SearchFilter::from_pairs(pairs.iter().copied()).unwrap()
}

#[test]
fn test_year_and_type() {
    let (_tmp, _path, conn) = setup_test_db();
    seed(&conn);
    let lib = Library::new(&conn);
    let rules = Rules::default();
    let engine = Engine::new(&lib, &rules, &S2Index);

    let (rows, count) = engine.search(&filter(&[("year", "2019"), ("type", "image"), ("count", "10")]), None).unwrap();
    assert!(rows.len() <= 10);
    assert_eq!(count, rows.len());
    assert!(rows.iter().all(|r| r.photo_year == 2019 && r.photo_type == "image"));
    // Archived photos are excluded, the raw file of the Berlin photo is not.
    assert_eq!(uids(rows.iter().map(|r| &r.photo_uid)), BTreeSet::from([BERLIN, PRIVATE]));
    assert_eq!(rows.len(), 3);
}

#[test]
fn test_merged_rows() {
    let (_tmp, _path, conn) = setup_test_db();
    seed(&conn);
    let lib = Library::new(&conn);
    let rules = Rules::default();
    let engine = Engine::new(&lib, &rules, &S2Index);

    let (rows, count) = engine.search(&filter(&[("year", "2019"), ("type", "image"), ("merged", "true")]), None).unwrap();
    assert_eq!(count, 3);
    assert_eq!(rows.len(), 2);
    let berlin = rows.iter().find(|r| r.photo_uid == BERLIN).unwrap();
    assert!(berlin.merged);
    assert_eq!(berlin.files.len(), 2);
    assert!(berlin.file_primary);
}

#[test]
fn test_query_string() {
    let (_tmp, _path, conn) = setup_test_db();
    seed(&conn);
    let lib = Library::new(&conn);
    let rules = Rules::default();
    let engine = Engine::new(&lib, &rules, &S2Index);

    // Mitte carries the label at uncertainty 100 and is left out.
    let f = SearchFilter::parse("label:cat primary:true").unwrap();
    let (rows, _) = engine.search(&f, None).unwrap();
    assert_eq!(uids(rows.iter().map(|r| &r.photo_uid)), BTreeSet::from([BERLIN, PARIS]));

    let f = SearchFilter::parse("label:dog").unwrap();
    let (rows, count) = engine.search(&f, None).unwrap();
    assert!(rows.is_empty());
    assert_eq!(count, 0);
}

#[test]
fn test_camera_and_country() {
    let (_tmp, _path, conn) = setup_test_db();
    seed(&conn);
    let lib = Library::new(&conn);
    let rules = Rules::default();
    let engine = Engine::new(&lib, &rules, &S2Index);

    let (rows, _) = engine.search(&filter(&[("camera", "canon"), ("primary", "true")]), None).unwrap();
    assert_eq!(uids(rows.iter().map(|r| &r.photo_uid)), BTreeSet::from([BERLIN]));
    assert_eq!(rows[0].camera_name.as_deref(), Some("Canon EOS 5D"));

    let (rows, _) = engine.search(&filter(&[("country", "de"), ("primary", "true")]), None).unwrap();
    assert_eq!(uids(rows.iter().map(|r| &r.photo_uid)), BTreeSet::from([BERLIN, MITTE]));
}

#[test]
fn test_title_wildcards() {
    let (_tmp, _path, conn) = setup_test_db();
    seed(&conn);
    let lib = Library::new(&conn);
    let rules = Rules::default();
    let engine = Engine::new(&lib, &rules, &S2Index);

    let (rows, _) = engine.search(&filter(&[("title", "Photo*3"), ("primary", "true")]), None).unwrap();
    assert_eq!(uids(rows.iter().map(|r| &r.photo_uid)), BTreeSet::from([PARIS]));

    // `_` and `%` match themselves, only `*` is a wildcard.
    let (rows, _) = engine.search(&filter(&[("title", "Photo_3")]), None).unwrap();
    assert!(rows.is_empty());
    let (rows, _) = engine.search(&filter(&[("title", "Photo%")]), None).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn test_order_and_paging() {
    let (_tmp, _path, conn) = setup_test_db();
    seed(&conn);
    let lib = Library::new(&conn);
    let rules = Rules::default();
    let engine = Engine::new(&lib, &rules, &S2Index);

    let (rows, _) = engine.search(&filter(&[("primary", "true"), ("order", "oldest")]), None).unwrap();
    let order: Vec<&str> = rows.iter().map(|r| r.photo_uid.as_str()).collect();
    assert_eq!(order, vec![BERLIN, VIDEO, PRIVATE, PARIS, MITTE]);

    let (page, _) = engine.search(&filter(&[("primary", "true"), ("order", "oldest"), ("count", "2"), ("offset", "2")]), None).unwrap();
    assert_eq!(page.iter().map(|r| r.photo_uid.as_str()).collect::<Vec<_>>(), vec![PRIVATE, PARIS]);

    match engine.search(&filter(&[("order", "sideways")]), None) {
        Err(SearchError::BadSortOrder(o)) => assert_eq!(o, "sideways"),
        other => panic!("unexpected {:?}", other.map(|r| r.1)),
    }
}

#[test]
fn test_visitor_needs_share() {
    let (_tmp, _path, conn) = setup_test_db();
    seed(&conn);
    let lib = Library::new(&conn);
    let rules = Rules::default();
    let engine = Engine::new(&lib, &rules, &S2Index);

    let visitor = Session::new(Role::Visitor, "");
    assert!(matches!(engine.search(&SearchFilter::default(), Some(&visitor)), Err(SearchError::Forbidden)));

    let shared = Session::new(Role::Visitor, "").with_shares(vec![ALBUM.to_string()]);
    let (rows, _) = engine.search(&filter(&[("scope", ALBUM), ("primary", "true")]), Some(&shared)).unwrap();
    // The Paris photo is hidden in the album.
    assert_eq!(uids(rows.iter().map(|r| &r.photo_uid)), BTreeSet::from([BERLIN, MITTE]));
}

#[test]
fn test_guest_sees_own_photos() {
    let (_tmp, _path, conn) = setup_test_db();
    seed(&conn);
    let lib = Library::new(&conn);
    let rules = Rules::default();
    let engine = Engine::new(&lib, &rules, &S2Index);

    let guest = Session::new(Role::Guest, "us9lxuqxpogaaba2");
    let (rows, _) = engine.search(&filter(&[("primary", "true")]), Some(&guest)).unwrap();
    assert_eq!(uids(rows.iter().map(|r| &r.photo_uid)), BTreeSet::from([MITTE]));
}

#[test]
fn test_invalid_scope() {
    let (_tmp, _path, conn) = setup_test_db();
    seed(&conn);
    let lib = Library::new(&conn);
    let rules = Rules::default();
    let engine = Engine::new(&lib, &rules, &S2Index);

    assert!(matches!(engine.search(&filter(&[("scope", "not-an-album")]), None), Err(SearchError::InvalidId(_))));
    assert!(matches!(engine.search(&filter(&[("scope", "at9lxuqxpogaaba9")]), None), Err(SearchError::InvalidId(_))));
}

#[test]
fn test_geo_default_radius() {
    let (_tmp, _path, conn) = setup_test_db();
    seed(&conn);
    let lib = Library::new(&conn);
    let rules = Rules::default();
    let engine = Engine::new(&lib, &rules, &S2Index);

    let rows = engine.search_geo(&filter(&[("lat", "52.52"), ("lng", "13.405")]), None).unwrap();
    assert_eq!(uids(rows.iter().map(|r| &r.photo_uid)), BTreeSet::from([BERLIN, MITTE]));

    let rows = engine.search_geo(&SearchFilter::default(), None).unwrap();
    assert_eq!(uids(rows.iter().map(|r| &r.photo_uid)), BTreeSet::from([BERLIN, PARIS, MITTE]));
}

#[test]
fn test_geo_near_comes_first() {
    let (_tmp, _path, conn) = setup_test_db();
    seed(&conn);
    let lib = Library::new(&conn);
    let rules = Rules::default();
    let engine = Engine::new(&lib, &rules, &S2Index);

    let rows = engine.search_geo(&filter(&[("near", MITTE), ("dist", "50")]), None).unwrap();
    assert_eq!(rows.first().map(|r| r.photo_uid.as_str()), Some(MITTE));
    assert!(rows.iter().all(|r| r.photo_uid != PARIS));

    assert!(matches!(
        engine.search_geo(&filter(&[("near", "pt9jtdre2lvl0y99")]), None),
        Err(SearchError::NotFound(_))
    ));
}
