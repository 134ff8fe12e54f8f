//! Role based access rules and the per-call access scope derived from them.

use std::collections::{HashMap, HashSet};
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};
use crate::search::form::SearchFilter;
use crate::search::predicate::{Expr, Value};
use crate::search::txt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Photos,
    Places,
    Files,
    Albums,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    AccessAll,
    AccessLibrary,
    AccessShared,
    AccessOwn,
    AccessPrivate,
    ActionSearch,
    ActionView,
    ActionDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Guest,
    Visitor,
    #[default]
    None,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Photos => "photos",
            Resource::Places => "places",
            Resource::Files => "files",
            Resource::Albums => "albums",
        }
    }
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::AccessAll => "all",
            Permission::AccessLibrary => "library",
            Permission::AccessShared => "shared",
            Permission::AccessOwn => "own",
            Permission::AccessPrivate => "private",
            Permission::ActionSearch => "search",
            Permission::ActionView => "view",
            Permission::ActionDelete => "delete",
        }
    }
}

impl Role {
    pub fn parse(s: &str) -> Role {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "user" => Role::User,
            "guest" => Role::Guest,
            "visitor" => Role::Visitor,
            _ => Role::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Guest => "guest",
            Role::Visitor => "visitor",
            Role::None => "none",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission checks consumed by the search engine.
pub trait Acl: Send + Sync {
    fn deny(&self, resource: Resource, role: Role, perm: Permission) -> bool;

    fn allow(&self, resource: Resource, role: Role, perm: Permission) -> bool {
        !self.deny(resource, role, perm)
    }

    fn deny_all(&self, resource: Resource, role: Role, perms: &[Permission]) -> bool {
        perms.iter().all(|p| self.deny(resource, role, *p))
    }

    /// True when the role may only see content shared with it.
    fn shared_only(&self, resource: Resource, role: Role) -> bool {
        self.deny_all(resource, role, &[Permission::AccessAll, Permission::AccessLibrary])
            && self.allow(resource, role, Permission::AccessShared)
    }
}

/// Static grant table. Roles without an entry for a resource are denied.
#[derive(Debug, Clone)]
pub struct Rules {
    grants: HashMap<(Resource, Role), HashSet<Permission>>,
}

impl Rules {
    pub fn empty() -> Self {
        Self { grants: HashMap::new() }
    }

    pub fn grant(mut self, resource: Resource, role: Role, perms: &[Permission]) -> Self {
        self.grants.entry((resource, role)).or_default().extend(perms.iter().copied());
        self
    }
}

static DEFAULT_RULES: Lazy<Rules> = Lazy::new(|| {
    use Permission::*;
    let everything = [AccessAll, AccessLibrary, AccessShared, AccessOwn, AccessPrivate, ActionSearch, ActionView, ActionDelete];
    let member = [AccessLibrary, AccessShared, AccessOwn, AccessPrivate, ActionSearch, ActionView, ActionDelete];
    let guest = [AccessShared, AccessOwn, ActionSearch, ActionView];
    let mut rules = Rules::empty();
    for resource in [Resource::Photos, Resource::Places, Resource::Files, Resource::Albums] {
        rules = rules.grant(resource, Role::Admin, &everything);
    }
    for resource in [Resource::Photos, Resource::Places, Resource::Albums] {
        rules = rules
            .grant(resource, Role::User, &member)
            .grant(resource, Role::Guest, &guest)
            .grant(resource, Role::Visitor, &[AccessShared, ActionView]);
    }
    rules.grant(Resource::Files, Role::User, &[AccessLibrary, AccessOwn])
});

impl Default for Rules {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

impl Acl for Rules {
    fn deny(&self, resource: Resource, role: Role, perm: Permission) -> bool {
        !self.grants.get(&(resource, role)).map(|g| g.contains(&perm)).unwrap_or(false)
    }
}

/// Caller identity as issued by the session layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub role: Role,
    pub user_uid: String,
    pub shared_uids: Vec<String>,
    pub base_path: String,
    pub ref_id: String,
}

impl Session {
    pub fn new(role: Role, user_uid: impl Into<String>) -> Self {
        Self { role, user_uid: user_uid.into(), ..Default::default() }
    }

    pub fn with_shares(mut self, uids: Vec<String>) -> Self {
        self.shared_uids = uids;
        self
    }

    pub fn with_base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = path.into().trim_matches('/').to_string();
        self
    }

    pub fn has_share(&self, uid: &str) -> bool {
        self.shared_uids.iter().any(|s| s == uid)
    }

    pub fn not_registered(&self) -> bool {
        self.role == Role::None || self.user_uid.is_empty()
    }

    pub fn is_visitor(&self) -> bool {
        self.role == Role::Visitor
    }
}

/// Rows a restricted caller may see when no album scope is given.
#[derive(Debug, Clone, PartialEq)]
pub struct Visibility {
    pub shared_uids: Vec<String>,
    pub owner: Option<String>,
    pub base_path: Option<String>,
}

/// Effective visibility policy for one search call.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessScope {
    pub role: Role,
    pub resource: Resource,
    pub granted: Vec<Permission>,
    pub user_uid: String,
    pub shared_uids: Vec<String>,
    pub base_path: String,
    pub public_only: bool,
    pub exclude_archived: bool,
    pub exclude_hidden: bool,
    pub visibility: Option<Visibility>,
}

const ALL_PERMISSIONS: [Permission; 8] = [
    Permission::AccessAll,
    Permission::AccessLibrary,
    Permission::AccessShared,
    Permission::AccessOwn,
    Permission::AccessPrivate,
    Permission::ActionSearch,
    Permission::ActionView,
    Permission::ActionDelete,
];

impl AccessScope {
    /// Scope for library internal calls without a session.
    pub fn unrestricted(resource: Resource) -> Self {
        Self {
            role: Role::Admin,
            resource,
            granted: ALL_PERMISSIONS.to_vec(),
            user_uid: String::new(),
            shared_uids: Vec::new(),
            base_path: String::new(),
            public_only: false,
            exclude_archived: false,
            exclude_hidden: false,
            visibility: None,
        }
    }

    /// Derives the scope for `session` searching `resource`, optionally inside
    /// the album `scope`. Denials are audit logged.
    pub fn resolve(acl: &dyn Acl, session: &Session, resource: Resource, scope: &str) -> Result<Self> {
        let role = session.role;
        let denied = |reason: &str| {
            tracing::warn!(
                role = %role,
                resource = resource.as_str(),
                action = Permission::ActionSearch.as_str(),
                session = %session.ref_id,
                "search: access denied ({})",
                reason
            );
            SearchError::Forbidden
        };

        use Permission::*;
        if acl.deny_all(resource, role, &[AccessAll, AccessLibrary, AccessShared, AccessOwn]) {
            return Err(denied("no access"));
        }

        if !scope.is_empty() {
            if !session.has_share(scope) && (session.not_registered() || session.is_visitor() || acl.shared_only(resource, role)) {
                return Err(denied("album not shared"));
            }
        } else if acl.deny(resource, role, ActionSearch) {
            return Err(denied("search not permitted"));
        }

        let visibility = if scope.is_empty() && acl.deny_all(resource, role, &[AccessAll, AccessLibrary]) {
            if session.is_visitor() || session.not_registered() {
                Some(Visibility { shared_uids: session.shared_uids.clone(), owner: None, base_path: None })
            } else {
                Some(Visibility {
                    shared_uids: session.shared_uids.clone(),
                    owner: Some(session.user_uid.clone()),
                    base_path: Some(session.base_path.clone()).filter(|p| !p.is_empty()),
                })
            }
        } else {
            None
        };

        Ok(Self {
            role,
            resource,
            granted: ALL_PERMISSIONS.iter().copied().filter(|p| acl.allow(resource, role, *p)).collect(),
            user_uid: session.user_uid.clone(),
            shared_uids: session.shared_uids.clone(),
            base_path: session.base_path.clone(),
            public_only: acl.deny(resource, role, AccessPrivate),
            exclude_archived: acl.deny(resource, role, ActionDelete),
            exclude_hidden: resource == Resource::Photos && acl.deny(Resource::Files, role, AccessAll),
            visibility,
        })
    }

    /// Forces the status flags this scope does not permit. Applied to the
    /// working copy of a filter only, never to the filter echoed to callers.
    pub fn restrict(&self, f: &mut SearchFilter) {
        if self.public_only {
            f.private = false;
            f.public = true;
        }
        if self.exclude_archived {
            f.archived = false;
            f.review = false;
        }
        if self.exclude_hidden {
            f.hidden = false;
        }
    }

    /// Row visibility predicate for restricted callers. `now` is the current
    /// time in storage format and opens the public preview window.
    pub fn predicate(&self, now: &str) -> Option<Expr> {
        let v = self.visibility.as_ref()?;
        let mut any = vec![Expr::in_select(
            "photos.photo_uid",
            "SELECT photo_uid FROM photos_albums",
            Expr::And(vec![
                Expr::eq("photos_albums.hidden", 0),
                Expr::eq("photos_albums.missing", 0),
                Expr::is_in("photos_albums.album_uid", v.shared_uids.iter().map(Value::from).collect()),
            ]),
        )];
        if let Some(owner) = &v.owner {
            any.push(Expr::eq("photos.created_by", owner.as_str()));
        }
        any.push(Expr::gt("photos.published_at", now));
        if let Some(base) = &v.base_path {
            any.push(Expr::eq("photos.photo_path", base.as_str()));
            any.push(Expr::like("photos.photo_path", format!("{}/%", txt::escape_like(base))));
        }
        Some(Expr::Or(any))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALBUM: &str = "at9lxuqxpogaaba7";

    #[test]
    fn test_default_rules() {
        let rules = Rules::default();
        assert!(rules.allow(Resource::Photos, Role::Admin, Permission::AccessAll));
        assert!(rules.deny(Resource::Photos, Role::User, Permission::AccessAll));
        assert!(rules.allow(Resource::Photos, Role::User, Permission::AccessPrivate));
        assert!(rules.deny(Resource::Photos, Role::None, Permission::AccessShared));
        assert!(rules.shared_only(Resource::Photos, Role::Visitor));
        assert!(rules.shared_only(Resource::Photos, Role::Guest));
        assert!(!rules.shared_only(Resource::Photos, Role::User));
    }

    #[test]
    fn test_admin_is_unrestricted() {
        let s = Session::new(Role::Admin, "uqxetse3cy5eo9z2");
        let scope = AccessScope::resolve(&Rules::default(), &s, Resource::Photos, "").unwrap();
        assert!(!scope.public_only);
        assert!(!scope.exclude_archived);
        assert!(!scope.exclude_hidden);
        assert!(scope.visibility.is_none());
        assert!(scope.predicate("2024-01-01 00:00:00").is_none());
    }

    #[test]
    fn test_unregistered_is_forbidden() {
        let s = Session::default();
        let res = AccessScope::resolve(&Rules::default(), &s, Resource::Photos, ALBUM);
        assert!(matches!(res, Err(SearchError::Forbidden)));
    }

    #[test]
    fn test_visitor_needs_share() {
        let rules = Rules::default();
        let s = Session::new(Role::Visitor, "uqxetse3cy5eo9z3");
        assert!(matches!(AccessScope::resolve(&rules, &s, Resource::Photos, ALBUM), Err(SearchError::Forbidden)));
        assert!(matches!(AccessScope::resolve(&rules, &s, Resource::Photos, ""), Err(SearchError::Forbidden)));

        let s = s.with_shares(vec![ALBUM.to_string()]);
        let scope = AccessScope::resolve(&rules, &s, Resource::Photos, ALBUM).unwrap();
        assert!(scope.public_only);
        assert!(scope.exclude_archived);
        assert!(scope.exclude_hidden);
        assert!(scope.visibility.is_none());
    }

    #[test]
    fn test_guest_is_limited_to_own_and_shared() {
        let s = Session::new(Role::Guest, "uqxetse3cy5eo9z4")
            .with_shares(vec![ALBUM.to_string()])
            .with_base_path("/guests/jane/");
        let scope = AccessScope::resolve(&Rules::default(), &s, Resource::Photos, "").unwrap();
        let v = scope.visibility.clone().unwrap();
        assert_eq!(v.owner.as_deref(), Some("uqxetse3cy5eo9z4"));
        assert_eq!(v.base_path.as_deref(), Some("guests/jane"));
        match scope.predicate("2024-01-01 00:00:00") {
            Some(Expr::Or(terms)) => assert_eq!(terms.len(), 5),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_restrict_forces_flags() {
        let s = Session::new(Role::Guest, "uqxetse3cy5eo9z4");
        let scope = AccessScope::resolve(&Rules::default(), &s, Resource::Photos, "").unwrap();
        let mut f = SearchFilter { private: true, archived: true, review: true, hidden: true, ..Default::default() };
        scope.restrict(&mut f);
        assert!(!f.private && f.public);
        assert!(!f.archived && !f.review && !f.hidden);
    }

    #[test]
    fn test_user_keeps_private_access() {
        let s = Session::new(Role::User, "uqxetse3cy5eo9z5");
        let scope = AccessScope::resolve(&Rules::default(), &s, Resource::Photos, "").unwrap();
        assert!(!scope.public_only);
        assert!(!scope.exclude_archived);
        assert!(scope.exclude_hidden);
        assert!(scope.visibility.is_none());
        let mut f = SearchFilter { private: true, ..Default::default() };
        scope.restrict(&mut f);
        assert!(f.private);
    }
}
