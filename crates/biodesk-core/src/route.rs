use std::fmt;

use crate::entity::EntityKind;

/// Client-side navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Dashboard,
    /// Collection screen for a kind.
    List(EntityKind),
    /// Single record, addressed by its key.
    Detail(EntityKind, String),
}

impl Route {
    pub fn detail(kind: EntityKind, key: impl Into<String>) -> Self {
        Self::Detail(kind, key.into())
    }

    /// Entity kind the route points at, if any.
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            Self::Dashboard => None,
            Self::List(kind) | Self::Detail(kind, _) => Some(*kind),
        }
    }

    /// Route one level up: detail → list, list → dashboard.
    pub fn up(&self) -> Self {
        match self {
            Self::Dashboard | Self::List(_) => Self::Dashboard,
            Self::Detail(kind, _) => Self::List(*kind),
        }
    }

    /// Path-style rendering, e.g. `/tumors/BB-01`.
    pub fn path(&self) -> String {
        match self {
            Self::Dashboard => "/".into(),
            Self::List(kind) => format!("/{}", kind.endpoint()),
            Self::Detail(kind, key) => format!("/{}/{key}", kind.endpoint()),
        }
    }

    /// Parse a path produced by [`Route::path`].
    pub fn parse(path: &str) -> Option<Self> {
        let mut parts = path.trim_matches('/').splitn(2, '/');
        match (parts.next(), parts.next()) {
            (None | Some(""), _) => Some(Self::Dashboard),
            (Some(endpoint), None) => EntityKind::from_endpoint(endpoint).map(Self::List),
            (Some(endpoint), Some(key)) if !key.is_empty() => {
                EntityKind::from_endpoint(endpoint).map(|kind| Self::detail(kind, key))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dashboard => f.write_str("Dashboard"),
            Self::List(kind) => f.write_str(kind.label()),
            Self::Detail(kind, key) => write!(f, "{} / {key}", kind.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_round_trip() {
        let routes = [
            Route::Dashboard,
            Route::List(EntityKind::LiquidBiopsy),
            Route::detail(EntityKind::Tumor, "BB-01"),
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
    }

    #[test]
    fn unknown_collection_does_not_parse() {
        assert_eq!(Route::parse("/devices"), None);
        assert_eq!(Route::parse("/devices/1"), None);
    }

    #[test]
    fn up_walks_towards_dashboard() {
        let detail = Route::detail(EntityKind::Patient, "N1");
        assert_eq!(detail.up(), Route::List(EntityKind::Patient));
        assert_eq!(detail.up().up(), Route::Dashboard);
    }
}
