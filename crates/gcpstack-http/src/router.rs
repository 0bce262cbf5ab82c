//! Route matching: maps method and path to a [`GcpOperation`].
//!
//! Routes are written as `METHOD /literal/{param}/...`. A final `{name...}`
//! segment is greedy and captures every remaining segment, which is how object
//! names containing `/` are addressed. All captured values are percent-decoded
//! once a route is chosen; a value that does not decode to UTF-8 is rejected
//! with `400 invalid` rather than replaced, so distinct names never alias.
//!
//! Routes are tried from most to least specific: tail-free routes before
//! greedy ones, more literal segments before fewer. A path that matches some
//! route under a different method yields `405`; no match at all yields `404`.

use std::borrow::Cow;

use gcpstack_model::error::GcpError;
use gcpstack_model::operations::GcpOperation;
use http::Method;
use percent_encoding::percent_decode_str;

const SQL_PREFIX: &str = "/sql/v1beta4/projects/{project}";

/// The route table, before specificity ordering.
const ROUTES: &[(&str, &str, GcpOperation)] = &[
    // Buckets.
    ("GET", "/storage/v1/b", GcpOperation::ListBuckets),
    ("POST", "/storage/v1/b", GcpOperation::InsertBucket),
    ("GET", "/storage/v1/b/{bucket}", GcpOperation::GetBucket),
    ("PATCH", "/storage/v1/b/{bucket}", GcpOperation::PatchBucket),
    ("PUT", "/storage/v1/b/{bucket}", GcpOperation::UpdateBucket),
    ("DELETE", "/storage/v1/b/{bucket}", GcpOperation::DeleteBucket),
    // Objects.
    ("GET", "/storage/v1/b/{bucket}/o", GcpOperation::ListObjects),
    ("POST", "/upload/storage/v1/b/{bucket}/o", GcpOperation::InsertObject),
    ("GET", "/storage/v1/b/{bucket}/o/{object...}", GcpOperation::GetObject),
    ("PATCH", "/storage/v1/b/{bucket}/o/{object...}", GcpOperation::PatchObject),
    ("PUT", "/storage/v1/b/{bucket}/o/{object...}", GcpOperation::UpdateObject),
    ("DELETE", "/storage/v1/b/{bucket}/o/{object...}", GcpOperation::DeleteObject),
    ("GET", "/download/storage/v1/b/{bucket}/o/{object...}", GcpOperation::DownloadObject),
];

/// SQL routes, relative to [`SQL_PREFIX`].
const SQL_ROUTES: &[(&str, &str, GcpOperation)] = &[
    ("GET", "/instances", GcpOperation::ListInstances),
    ("POST", "/instances", GcpOperation::InsertInstance),
    ("GET", "/instances/{instance}", GcpOperation::GetInstance),
    ("PATCH", "/instances/{instance}", GcpOperation::PatchInstance),
    ("PUT", "/instances/{instance}", GcpOperation::UpdateInstance),
    ("DELETE", "/instances/{instance}", GcpOperation::DeleteInstance),
    ("GET", "/instances/{instance}/databases", GcpOperation::ListDatabases),
    ("POST", "/instances/{instance}/databases", GcpOperation::InsertDatabase),
    ("GET", "/instances/{instance}/databases/{database}", GcpOperation::GetDatabase),
    ("PATCH", "/instances/{instance}/databases/{database}", GcpOperation::PatchDatabase),
    ("PUT", "/instances/{instance}/databases/{database}", GcpOperation::UpdateDatabase),
    ("DELETE", "/instances/{instance}/databases/{database}", GcpOperation::DeleteDatabase),
    ("GET", "/instances/{instance}/users", GcpOperation::ListUsers),
    ("POST", "/instances/{instance}/users", GcpOperation::InsertUser),
    ("PUT", "/instances/{instance}/users", GcpOperation::UpdateUser),
    ("DELETE", "/instances/{instance}/users", GcpOperation::DeleteUser),
    ("GET", "/instances/{instance}/users/{user}", GcpOperation::GetUser),
    ("GET", "/operations", GcpOperation::ListOperations),
    ("GET", "/operations/{operation}", GcpOperation::GetOperation),
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Tail(String),
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    segments: Vec<Segment>,
    operation: GcpOperation,
}

impl Route {
    fn parse(method: &str, pattern: &str, operation: GcpOperation) -> Self {
        let segments = pattern
            .trim_start_matches('/')
            .split('/')
            .map(|seg| match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => match name.strip_suffix("...") {
                    Some(tail) => Segment::Tail(tail.to_owned()),
                    None => Segment::Param(name.to_owned()),
                },
                None => Segment::Literal(seg.to_owned()),
            })
            .collect();

        Self {
            method: Method::from_bytes(method.as_bytes()).unwrap_or(Method::GET),
            segments,
            operation,
        }
    }

    fn has_tail(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Tail(_)))
    }

    fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Match raw path segments. Captured values stay percent-encoded.
    fn match_path(&self, raw: &[&str]) -> Option<PathParams> {
        let raw = match raw.split_last() {
            Some((&"", rest)) if !self.has_tail() => rest,
            _ => raw,
        };

        let mut params = PathParams::default();
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(lit) => {
                    if raw.get(idx) != Some(&lit.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = raw.get(idx).filter(|v| !v.is_empty())?;
                    params.push(name, (*value).to_owned());
                }
                Segment::Tail(name) => {
                    let rest = raw.get(idx..)?.join("/");
                    if rest.is_empty() {
                        return None;
                    }
                    params.push(name, rest);
                    return Some(params);
                }
            }
        }

        (raw.len() == self.segments.len()).then_some(params)
    }
}

fn decode(raw: &str) -> Result<String, GcpError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|e| GcpError::invalid(format!("Invalid UTF-8 in {raw:?}: {e}")))
}

/// Decode a query component: `+` is a space, then percent-decoding.
fn decode_form(raw: &str) -> Result<String, GcpError> {
    if raw.contains('+') {
        decode(&raw.replace('+', " "))
    } else {
        decode(raw)
    }
}

/// Named path parameters extracted by the matcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    fn push(&mut self, name: &str, value: String) {
        self.0.push((name.to_owned(), value));
    }

    fn decoded(self) -> Result<Self, GcpError> {
        self.0
            .into_iter()
            .map(|(k, v)| Ok((k, decode(&v)?)))
            .collect::<Result<_, GcpError>>()
            .map(Self)
    }

    /// Look up a decoded parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a parameter the route guarantees.
    ///
    /// # Errors
    ///
    /// Returns an internal error when the route table and the handler disagree.
    pub fn require(&self, name: &str) -> Result<&str, GcpError> {
        self.get(name)
            .ok_or_else(|| GcpError::internal_error(format!("missing path parameter {name}")))
    }
}

/// Decoded query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Parse a raw `application/x-www-form-urlencoded` query string.
    ///
    /// # Errors
    ///
    /// Returns an `invalid` error when a key or value is not UTF-8 once decoded.
    pub fn parse(query: &str) -> Result<Self, GcpError> {
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                Ok((decode_form(key)?, decode_form(value)?))
            })
            .collect::<Result<_, GcpError>>()
            .map(Self)
    }

    /// First value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value for `name`.
    #[must_use]
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    /// Whether `name` is present at all.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.0.iter().any(|(k, _)| k == name)
    }
}

/// Everything the matcher learned about a request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The resolved operation.
    pub operation: GcpOperation,
    /// Decoded path parameters.
    pub path_params: PathParams,
    /// Decoded query parameters.
    pub query: QueryParams,
}

/// The route matcher.
#[derive(Debug, Clone)]
pub struct GcpRouter {
    routes: Vec<Route>,
}

impl Default for GcpRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl GcpRouter {
    /// Build the router with the full route table.
    #[must_use]
    pub fn new() -> Self {
        let mut routes: Vec<Route> = ROUTES
            .iter()
            .map(|(m, p, op)| Route::parse(m, p, *op))
            .chain(
                SQL_ROUTES
                    .iter()
                    .map(|(m, p, op)| Route::parse(m, &format!("{SQL_PREFIX}{p}"), *op)),
            )
            .collect();

        routes.sort_by(|a, b| {
            a.has_tail()
                .cmp(&b.has_tail())
                .then_with(|| b.literal_count().cmp(&a.literal_count()))
                .then_with(|| b.segments.len().cmp(&a.segments.len()))
        });

        Self { routes }
    }

    /// Resolve a request to an operation.
    ///
    /// # Errors
    ///
    /// `404` when no route matches the path, `405` when only the method is wrong.
    pub fn resolve(&self, method: &Method, uri: &http::Uri) -> Result<RequestContext, GcpError> {
        let path = uri.path();
        let raw: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        let mut path_matched = false;
        for route in &self.routes {
            let Some(path_params) = route.match_path(&raw) else {
                continue;
            };
            if route.method != *method {
                path_matched = true;
                continue;
            }
            return Ok(RequestContext {
                operation: route.operation,
                path_params: path_params.decoded()?,
                query: QueryParams::parse(uri.query().unwrap_or(""))?,
            });
        }

        if path_matched {
            Err(GcpError::method_not_allowed(method.as_str(), path))
        } else {
            Err(GcpError::no_route(method.as_str(), path))
        }
    }
}
