//! Classify host URL paths as channel / direct-message views.

use crate::error::{PlaybooksError, Result};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

// `/:team/(channels|messages)/:identifier` with an optional permalink post id.
static DEFAULT_RE: OnceLock<Regex> = OnceLock::new();

fn default_re() -> &'static Regex {
    DEFAULT_RE.get_or_init(|| {
        Regex::new(
            r"^/(?P<team>[^/?#]+)/(?P<kind>channels|messages)/(?P<identifier>[^/?#]+)(?:/[^/?#]+)?/?(?:[?#].*)?$",
        )
        .unwrap()
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    pub team: Option<String>,
    /// `channels` or `messages` for the default pattern.
    pub kind: Option<String>,
    pub identifier: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChannelRoute {
    patterns: Vec<Regex>,
}

impl Default for ChannelRoute {
    fn default() -> Self {
        Self {
            patterns: vec![default_re().clone()],
        }
    }
}

impl ChannelRoute {
    /// The default route plus `extra` patterns.
    ///
    /// Extra patterns may name `team`, `kind` and `identifier` groups to make
    /// them visible through [`ChannelRoute::parse`].
    pub fn with_patterns<S: AsRef<str>>(extra: &[S]) -> Result<Self> {
        let mut route = Self::default();
        for pattern in extra {
            let pattern = pattern.as_ref();
            let re = Regex::new(pattern).map_err(|e| PlaybooksError::InvalidRoutePattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
            route.patterns.push(re);
        }
        Ok(route)
    }

    pub fn matches_channel_route(&self, path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(path))
    }

    /// The first pattern that matches `path`, with its named groups.
    pub fn parse(&self, path: &str) -> Option<RouteMatch> {
        self.patterns.iter().find_map(|re| {
            let caps = re.captures(path)?;
            let group = |name: &str| caps.name(name).map(|m| m.as_str().to_string());
            Some(RouteMatch {
                team: group("team"),
                kind: group("kind"),
                identifier: group("identifier"),
            })
        })
    }
}
