//! Route table.
//!
//! Each route pairs a set of methods and a path template with the
//! Content-Type contract for that endpoint. Templates use `{name}` for
//! parameter segments.
//!
//! ```rust
//! use http::Method;
//! use smrt_server::{RouteLookup, RouteSpec, Router};
//!
//! let mut router = Router::new();
//! router.add(RouteSpec::get("/lamps/{name}").produces("application/se.novafaen.lamp.v1+json"));
//!
//! match router.match_route(&Method::GET, "/lamps/kitchen") {
//!     RouteLookup::Found(m) => assert_eq!(m.param("name"), Some("kitchen")),
//!     _ => unreachable!(),
//! }
//! assert!(matches!(
//!     router.match_route(&Method::PUT, "/lamps/kitchen"),
//!     RouteLookup::MethodNotAllowed
//! ));
//! ```

use http::Method;
use smrt_middleware::ContentContract;
use std::collections::HashMap;

/// Declaration of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    methods: Vec<Method>,
    path: String,
    contract: ContentContract,
}

impl RouteSpec {
    /// A route answering `method` at `path`.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            methods: vec![method],
            path: path.into(),
            contract: ContentContract::none(),
        }
    }

    /// A `GET` route.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// A `PUT` route.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// A `POST` route.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// A `DELETE` route.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Also answer `method`.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    /// Require this inbound media type and validate bodies against its schema.
    #[must_use]
    pub fn consumes(mut self, media_type: impl Into<String>) -> Self {
        self.contract = self.contract.consumes(media_type);
        self
    }

    /// Declare the only representation this route produces.
    #[must_use]
    pub fn produces(mut self, media_type: impl Into<String>) -> Self {
        self.contract = self.contract.produces(media_type);
        self
    }

    /// The methods this route answers.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// The path template.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The Content-Type contract.
    #[must_use]
    pub fn contract(&self) -> &ContentContract {
        &self.contract
    }
}

/// A matched route with extracted path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    index: usize,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Position of the route in registration order.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// All extracted parameters.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// A single parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub(crate) fn into_params(self) -> HashMap<String, String> {
        self.params
    }
}

/// Result of looking up a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteLookup {
    /// A route matched path and method.
    Found(RouteMatch),
    /// The path exists but not for this method.
    MethodNotAllowed,
    /// No route has this path.
    NoRoute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route {
    spec: RouteSpec,
    segments: Vec<PathSegment>,
}

impl Route {
    fn new(spec: RouteSpec) -> Self {
        let segments = parse_segments(spec.path());
        Self { spec, segments }
    }

    fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if actual.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (pattern, value) in self.segments.iter().zip(actual) {
            match pattern {
                PathSegment::Literal(expected) if expected != value => return None,
                PathSegment::Literal(_) => {}
                PathSegment::Param(name) => {
                    params.insert(name.clone(), value.to_string());
                }
            }
        }
        Some(params)
    }

    /// Literal-segment flags, left to right. Compares greater for the route
    /// that has a literal where the other has a parameter first.
    fn specificity(&self) -> Vec<bool> {
        self.segments
            .iter()
            .map(|segment| matches!(segment, PathSegment::Literal(_)))
            .collect()
    }

    fn overlaps(&self, other: &Self) -> bool {
        let same_shape = self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (PathSegment::Literal(a), PathSegment::Literal(b)) => a == b,
                    (PathSegment::Param(_), PathSegment::Param(_)) => true,
                    _ => false,
                });

        same_shape
            && self
                .spec
                .methods()
                .iter()
                .any(|m| other.spec.methods().contains(m))
    }
}

fn parse_segments(pattern: &str) -> Vec<PathSegment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => PathSegment::Param(name.to_string()),
            None => PathSegment::Literal(s.to_string()),
        })
        .collect()
}

/// The route table.
///
/// # Route Priority
///
/// When several routes match a path, a literal segment beats a parameter
/// at the first position where they differ, so `/lamps/all` matches before
/// `/lamps/{name}` regardless of registration order. Routes of the same
/// shape are rejected by [`conflict`](Router::conflict).
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Adds a route and returns its index.
    pub fn add(&mut self, spec: RouteSpec) -> usize {
        self.routes.push(Route::new(spec));
        self.routes.len() - 1
    }

    /// Returns the index of an earlier route that answers the same method at
    /// the same template as `spec`, if any.
    #[must_use]
    pub fn conflict(&self, spec: &RouteSpec) -> Option<usize> {
        let candidate = Route::new(spec.clone());
        self.routes.iter().position(|route| route.overlaps(&candidate))
    }

    /// The route registered at `index`.
    #[must_use]
    pub fn spec(&self, index: usize) -> Option<&RouteSpec> {
        self.routes.get(index).map(|route| &route.spec)
    }

    /// Number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Looks up `method` and `path`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> RouteLookup {
        let mut path_known = false;
        let mut best: Option<(Vec<bool>, RouteMatch)> = None;

        for (index, route) in self.routes.iter().enumerate() {
            let Some(params) = route.match_path(path) else {
                continue;
            };
            path_known = true;
            if !route.spec.methods().contains(method) {
                continue;
            }

            let specificity = route.specificity();
            if best.as_ref().map_or(true, |(current, _)| specificity > *current) {
                best = Some((specificity, RouteMatch { index, params }));
            }
        }

        if let Some((_, found)) = best {
            RouteLookup::Found(found)
        } else if path_known {
            RouteLookup::MethodNotAllowed
        } else {
            RouteLookup::NoRoute
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        let mut router = Router::new();
        router.add(RouteSpec::get("/status"));
        router.add(RouteSpec::get("/test/error").method(Method::PUT));
        router.add(RouteSpec::put("/lamps/{name}").consumes("application/se.novafaen.lamp.v1+json"));
        router
    }

    #[test]
    fn test_literal_match() {
        match router().match_route(&Method::GET, "/status") {
            RouteLookup::Found(m) => {
                assert_eq!(m.index(), 0);
                assert!(m.params().is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_param_match() {
        match router().match_route(&Method::PUT, "/lamps/kitchen") {
            RouteLookup::Found(m) => assert_eq!(m.param("name"), Some("kitchen")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_multiple_methods() {
        let router = router();
        assert!(matches!(
            router.match_route(&Method::PUT, "/test/error"),
            RouteLookup::Found(_)
        ));
        assert!(matches!(
            router.match_route(&Method::GET, "/test/error"),
            RouteLookup::Found(_)
        ));
    }

    #[test]
    fn test_wrong_method() {
        assert_eq!(
            router().match_route(&Method::DELETE, "/lamps/kitchen"),
            RouteLookup::MethodNotAllowed
        );
    }

    #[test]
    fn test_unknown_path() {
        assert_eq!(
            router().match_route(&Method::GET, "/lamps"),
            RouteLookup::NoRoute
        );
        assert_eq!(
            router().match_route(&Method::GET, "/lamps/kitchen/colour"),
            RouteLookup::NoRoute
        );
    }

    #[test]
    fn test_trailing_slash_ignored() {
        assert!(matches!(
            router().match_route(&Method::GET, "/status/"),
            RouteLookup::Found(_)
        ));
    }

    #[test]
    fn test_conflict() {
        let router = router();
        assert_eq!(router.conflict(&RouteSpec::put("/lamps/{id}")), Some(2));
        assert_eq!(router.conflict(&RouteSpec::get("/lamps/{id}")), None);
        assert_eq!(router.conflict(&RouteSpec::put("/test/error")), Some(1));
    }

    #[test]
    fn test_literal_beats_param_registered_earlier() {
        let mut router = Router::new();
        let by_name = router.add(RouteSpec::get("/lamps/{name}"));
        let all = router.add(RouteSpec::get("/lamps/all"));

        match router.match_route(&Method::GET, "/lamps/all") {
            RouteLookup::Found(m) => {
                assert_eq!(m.index(), all);
                assert!(m.params().is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
        match router.match_route(&Method::GET, "/lamps/kitchen") {
            RouteLookup::Found(m) => {
                assert_eq!(m.index(), by_name);
                assert_eq!(m.param("name"), Some("kitchen"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_earlier_literal_segment_decides() {
        let mut router = Router::new();
        router.add(RouteSpec::get("/{room}/lamps"));
        let kitchen = router.add(RouteSpec::get("/kitchen/{device}"));

        match router.match_route(&Method::GET, "/kitchen/lamps") {
            RouteLookup::Found(m) => assert_eq!(m.index(), kitchen),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_literal_for_other_method_falls_back_to_param() {
        let mut router = Router::new();
        let by_name = router.add(RouteSpec::get("/lamps/{name}"));
        router.add(RouteSpec::put("/lamps/all"));

        match router.match_route(&Method::GET, "/lamps/all") {
            RouteLookup::Found(m) => assert_eq!(m.index(), by_name),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            router.match_route(&Method::DELETE, "/lamps/all"),
            RouteLookup::MethodNotAllowed
        );
    }

    #[test]
    fn test_method_dedup() {
        let spec = RouteSpec::get("/a").method(Method::GET).method(Method::PUT);
        assert_eq!(spec.methods(), &[Method::GET, Method::PUT]);
    }
}
