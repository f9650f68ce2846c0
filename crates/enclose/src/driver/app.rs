//! In-process application interface for [`super::MemoryDriver`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
}

impl Method {
    /// Parse a form `method` attribute; anything but POST is GET
    #[must_use]
    pub fn from_form_attr(value: Option<&str>) -> Self {
        match value {
            Some(m) if m.trim().eq_ignore_ascii_case("post") => Self::Post,
            _ => Self::Get,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// A request issued by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Method
    pub method: Method,
    /// Path without query string
    pub path: String,
    /// Query (GET) or body (POST) parameters, in form order
    pub params: Vec<(String, String)>,
}

impl Request {
    /// GET `path` without parameters
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            params: Vec::new(),
        }
    }

    /// POST `params` to `path`
    #[must_use]
    pub fn post(path: impl Into<String>, params: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            params,
        }
    }

    /// Last value submitted for `name`
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Parameters as a JSON object; repeated names keep the last value
    #[must_use]
    pub fn params_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .params
            .iter()
            .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
            .collect();
        serde_json::Value::Object(map)
    }
}

/// What the application answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A page to render
    Html(String),
    /// Redirect to another location
    Redirect(String),
    /// No route matched
    NotFound,
}

/// Something that serves requests
pub trait App {
    /// Handle one request
    fn call(&self, request: &Request) -> Response;
}

impl<F> App for F
where
    F: Fn(&Request) -> Response,
{
    fn call(&self, request: &Request) -> Response {
        self(request)
    }
}

type Handler = Box<dyn Fn(&Request) -> Response + Send + Sync>;

/// Route table keyed by method and exact path
#[derive(Default)]
pub struct Router {
    routes: HashMap<(Method, String), Handler>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<String> = self
            .routes
            .keys()
            .map(|(method, path)| format!("{method} {path}"))
            .collect();
        routes.sort();
        f.debug_struct("Router").field("routes", &routes).finish()
    }
}

impl Router {
    /// Empty router
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `method` and `path`
    #[must_use]
    pub fn route<F>(mut self, method: Method, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        let _ = self.routes.insert((method, path.into()), Box::new(handler));
        self
    }

    /// GET handler
    #[must_use]
    pub fn get<F>(self, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.route(Method::Get, path, handler)
    }

    /// POST handler
    #[must_use]
    pub fn post<F>(self, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.route(Method::Post, path, handler)
    }

    /// Static page served on GET
    #[must_use]
    pub fn page(self, path: impl Into<String>, html: impl Into<String>) -> Self {
        let html = html.into();
        self.get(path, move |_| Response::Html(html.clone()))
    }

    /// GET `from` redirects to `to`
    #[must_use]
    pub fn redirect(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        let to = to.into();
        self.get(from, move |_| Response::Redirect(to.clone()))
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no routes are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl App for Router {
    fn call(&self, request: &Request) -> Response {
        self.routes
            .get(&(request.method, request.path.clone()))
            .map_or(Response::NotFound, |handler| handler(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_dispatches_by_method_and_path() {
        let router = Router::new()
            .page("/", "<p>home</p>")
            .post("/form", |req| Response::Html(req.params_json().to_string()))
            .redirect("/old", "/");

        assert_eq!(
            router.call(&Request::get("/")),
            Response::Html("<p>home</p>".into())
        );
        assert_eq!(
            router.call(&Request::get("/old")),
            Response::Redirect("/".into())
        );
        assert_eq!(router.call(&Request::get("/form")), Response::NotFound);
        assert_eq!(
            router.call(&Request::post("/form", vec![("a".into(), "1".into())])),
            Response::Html(r#"{"a":"1"}"#.into())
        );
        assert_eq!(router.len(), 3);
    }

    #[test]
    fn test_closure_is_an_app() {
        let app = |req: &Request| Response::Html(req.path.clone());
        assert_eq!(app.call(&Request::get("/x")), Response::Html("/x".into()));
    }

    #[test]
    fn test_param_lookup_keeps_last_value() {
        let req = Request::post(
            "/f",
            vec![("a".into(), "1".into()), ("a".into(), "2".into())],
        );
        assert_eq!(req.param("a"), Some("2"));
        assert_eq!(req.param("b"), None);
        assert_eq!(req.params_json()["a"], "2");
    }

    #[test]
    fn test_method_from_form_attribute() {
        assert_eq!(Method::from_form_attr(Some(" POST ")), Method::Post);
        assert_eq!(Method::from_form_attr(Some("get")), Method::Get);
        assert_eq!(Method::from_form_attr(None), Method::Get);
    }

    #[test]
    fn test_router_debug_lists_routes() {
        let router = Router::new().page("/b", "").page("/a", "");
        assert_eq!(format!("{router:?}"), r#"Router { routes: ["GET /a", "GET /b"] }"#);
    }
}
