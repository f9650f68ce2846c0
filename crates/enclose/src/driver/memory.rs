//! In-memory driver: renders [`App`] responses with `scraper` and emulates
//! links, forms and form controls without a browser.

use std::collections::HashMap;

use scraper::node::Element;
use scraper::{ElementRef, Html};
use tracing::{debug, trace};
use url::Url;
use uuid::Uuid;

use super::app::{App, Method, Request, Response, Router};
use super::{DocumentQuery, Driver};
use crate::config::Config;
use crate::dom::{normalize_whitespace, raw_text, Dom};
use crate::node::{Node, Scope};
use crate::result::{EncloseError, EncloseResult};
use crate::selector::SelectorKind;
use crate::xpath;

/// Host relative paths are resolved against
pub const DEFAULT_APP_HOST: &str = "http://www.example.com";

/// Redirects followed before navigation fails
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Request paths kept by [`MemoryDriver::history`]
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Form state the user changed, keyed by element index
#[derive(Debug, Clone, Default)]
struct FieldState {
    value: Option<String>,
    checked: Option<bool>,
    selected: Option<bool>,
}

#[derive(Debug)]
struct Page {
    id: Uuid,
    url: Url,
    source: String,
    html: Html,
    state: HashMap<usize, FieldState>,
}

impl Page {
    fn state(&self, index: usize) -> Option<&FieldState> {
        self.state.get(&index)
    }

    fn path(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{query}", self.url.path()),
            None => self.url.path().to_string(),
        }
    }
}

/// Driver that talks to an in-process [`App`].
///
/// Every loaded response gets a fresh document id, so nodes found before a
/// navigation report `StaleNode` afterwards.
///
/// # Example
///
/// ```rust
/// use enclose::driver::{DocumentQuery, Driver, MemoryDriver, Router};
/// use enclose::{Scope, SelectorKind};
///
/// let app = Router::new().page("/", "<ul><li>one</li><li>two</li></ul>");
/// let mut driver = MemoryDriver::new(app);
/// driver.visit("/").unwrap();
/// let items = driver.query_all(&Scope::Root, SelectorKind::Css, "li").unwrap();
/// assert_eq!(items.len(), 2);
/// ```
#[derive(Debug)]
pub struct MemoryDriver<A: App = Router> {
    app: A,
    app_host: String,
    max_redirects: usize,
    page: Option<Page>,
    history: Vec<String>,
    history_limit: usize,
}

impl<A: App> MemoryDriver<A> {
    /// Driver for `app` on the default host
    pub fn new(app: A) -> Self {
        Self {
            app,
            app_host: DEFAULT_APP_HOST.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            page: None,
            history: Vec::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Driver using the host and redirect limit from `config`
    pub fn from_config(app: A, config: &Config) -> EncloseResult<Self> {
        config.validate()?;
        Ok(Self {
            app_host: config.app_host.clone(),
            max_redirects: config.max_redirects,
            ..Self::new(app)
        })
    }

    /// Change the redirect limit
    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Keep at most `limit` request paths, dropping the oldest
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self.trim_history();
        self
    }

    /// The application being driven
    pub const fn app(&self) -> &A {
        &self.app
    }

    /// Paths of the most recent requests, oldest first
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn trim_history(&mut self) {
        let excess = self.history.len().saturating_sub(self.history_limit);
        if excess > 0 {
            let _ = self.history.drain(..excess);
        }
    }

    fn page(&self) -> EncloseResult<&Page> {
        self.page.as_ref().ok_or(EncloseError::NoDocument)
    }

    fn page_for(&self, node: &Node) -> EncloseResult<&Page> {
        let page = self.page()?;
        if page.id == node.document() {
            Ok(page)
        } else {
            Err(EncloseError::StaleNode { node: *node })
        }
    }

    fn state_mut(&mut self, index: usize) -> EncloseResult<&mut FieldState> {
        let page = self.page.as_mut().ok_or(EncloseError::NoDocument)?;
        Ok(page.state.entry(index).or_default())
    }

    fn element<'p>(page: &'p Page, node: &Node) -> EncloseResult<ElementRef<'p>> {
        page.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .nth(node.index())
            .ok_or(EncloseError::StaleNode { node: *node })
    }

    fn resolve(&self, target: &str) -> EncloseResult<Url> {
        let joined = match &self.page {
            Some(page) => page.url.join(target),
            None => Url::parse(&self.app_host).and_then(|base| base.join(target)),
        };
        joined.map_err(|e| EncloseError::navigation(target, e.to_string()))
    }

    fn request(
        &mut self,
        mut method: Method,
        mut url: Url,
        mut params: Vec<(String, String)>,
    ) -> EncloseResult<()> {
        for _ in 0..=self.max_redirects {
            if method == Method::Get {
                params = url
                    .query_pairs()
                    .map(|(key, value)| (key.into_owned(), value.into_owned()))
                    .collect();
            }
            let request = Request {
                method,
                path: url.path().to_string(),
                params: std::mem::take(&mut params),
            };
            debug!(%method, path = %request.path, "request");
            self.history.push(request.path.clone());
            self.trim_history();

            match self.app.call(&request) {
                Response::Html(source) => {
                    self.load(url, source);
                    return Ok(());
                }
                Response::Redirect(location) => {
                    debug!(%location, "redirect");
                    url = url
                        .join(&location)
                        .map_err(|e| EncloseError::navigation(&location, e.to_string()))?;
                    method = Method::Get;
                }
                Response::NotFound => {
                    return Err(EncloseError::navigation(request.path, "no route matched"));
                }
            }
        }
        Err(EncloseError::navigation(
            url.path(),
            format!("redirected more than {} times", self.max_redirects),
        ))
    }

    fn load(&mut self, url: Url, source: String) {
        let html = Html::parse_document(&source);
        let page = Page {
            id: Uuid::new_v4(),
            url,
            source,
            html,
            state: HashMap::new(),
        };
        debug!(document = %page.id, path = %page.path(), "loaded document");
        self.page = Some(page);
    }

    fn submit(&mut self, submitter: &Node) -> EncloseResult<()> {
        let (method, mut url, params) = {
            let page = self.page_for(submitter)?;
            let dom = Dom::new(&page.html);
            let button = Self::element(page, submitter)?;
            let form = dom.ancestor_named(button, "form").ok_or_else(|| {
                EncloseError::unsupported_action("submit", "button is not inside a form")
            })?;
            let method = Method::from_form_attr(form.value().attr("method"));
            let url = match form.value().attr("action").filter(|a| !a.trim().is_empty()) {
                Some(action) => page
                    .url
                    .join(action)
                    .map_err(|e| EncloseError::navigation(action, e.to_string()))?,
                None => page.url.clone(),
            };
            (method, url, serialize_form(page, &dom, form, button))
        };
        debug!(%method, action = %url.path(), fields = params.len(), "submitting form");

        if method == Method::Get {
            url.set_query(None);
            if !params.is_empty() {
                let _ = url.query_pairs_mut().extend_pairs(params.iter());
            }
            self.request(Method::Get, url, Vec::new())
        } else {
            self.request(Method::Post, url, params)
        }
    }

    fn toggle(&mut self, node: &Node) -> EncloseResult<()> {
        let checked = {
            let page = self.page_for(node)?;
            is_checked(page, node.index(), Self::element(page, node)?.value())
        };
        self.set_checked(node, !checked)
    }
}

impl<A: App> DocumentQuery for MemoryDriver<A> {
    fn query_all(
        &self,
        scope: &Scope,
        kind: SelectorKind,
        locator: &str,
    ) -> EncloseResult<Vec<Node>> {
        let page = self.page()?;
        let dom = Dom::new(&page.html);
        let root = match scope {
            Scope::Root => None,
            Scope::Node(node) => Some(Self::element(self.page_for(node)?, node)?),
        };
        let invalid = |message: String| EncloseError::InvalidSelector {
            kind,
            locator: locator.to_string(),
            message,
        };

        let indices: Vec<usize> = match kind {
            SelectorKind::XPath => {
                let scope_index = root.and_then(|el| dom.index_of(&el));
                xpath::select(&dom, scope_index, locator).map_err(|e| invalid(e.to_string()))?
            }
            SelectorKind::Css => {
                let selector =
                    scraper::Selector::parse(locator).map_err(|e| invalid(e.to_string()))?;
                match root {
                    Some(el) => el
                        .select(&selector)
                        .filter_map(|found| dom.index_of(&found))
                        .collect(),
                    None => page
                        .html
                        .select(&selector)
                        .filter_map(|found| dom.index_of(&found))
                        .collect(),
                }
            }
        };
        trace!(%kind, locator, %scope, matches = indices.len(), "query");
        Ok(indices
            .into_iter()
            .map(|index| Node::new(page.id, index))
            .collect())
    }

    fn text_of(&self, node: &Node) -> EncloseResult<String> {
        let page = self.page_for(node)?;
        Ok(normalize_whitespace(&raw_text(Self::element(page, node)?)))
    }

    fn document_text(&self) -> EncloseResult<String> {
        let page = self.page()?;
        let dom = Dom::new(&page.html);
        Ok(normalize_whitespace(&raw_text(dom.body())))
    }

    fn attribute(&self, node: &Node, name: &str) -> EncloseResult<Option<String>> {
        let page = self.page_for(node)?;
        Ok(Self::element(page, node)?
            .value()
            .attr(name)
            .map(str::to_string))
    }

    fn tag_name(&self, node: &Node) -> EncloseResult<String> {
        let page = self.page_for(node)?;
        Ok(Self::element(page, node)?.value().name().to_string())
    }
}

impl<A: App> Driver for MemoryDriver<A> {
    fn visit(&mut self, path: &str) -> EncloseResult<()> {
        let url = self.resolve(path)?;
        self.request(Method::Get, url, Vec::new())
    }

    fn current_path(&self) -> Option<String> {
        self.page.as_ref().map(Page::path)
    }

    fn html(&self) -> EncloseResult<String> {
        Ok(self.page()?.source.clone())
    }

    fn click(&mut self, node: &Node) -> EncloseResult<()> {
        let (tag, kind, href, disabled) = {
            let page = self.page_for(node)?;
            let el = Self::element(page, node)?.value();
            (
                el.name().to_string(),
                el.attr("type").map(str::to_ascii_lowercase),
                el.attr("href").map(str::to_string),
                el.attr("disabled").is_some(),
            )
        };
        debug!(%node, %tag, "click");
        if disabled {
            debug!(%node, "ignoring click on disabled control");
            return Ok(());
        }

        match (tag.as_str(), kind.as_deref()) {
            ("a", _) => match href {
                Some(href) => {
                    let url = self.resolve(&href)?;
                    self.request(Method::Get, url, Vec::new())
                }
                None => Ok(()),
            },
            ("input", Some("submit" | "image")) | ("button", None | Some("submit")) => {
                self.submit(node)
            }
            ("input", Some("checkbox")) => self.toggle(node),
            ("input", Some("radio")) => self.set_checked(node, true),
            ("option", _) => self.select_option(node),
            _ => Ok(()),
        }
    }

    fn set_value(&mut self, node: &Node, value: &str) -> EncloseResult<()> {
        {
            let page = self.page_for(node)?;
            let el = Self::element(page, node)?.value();
            if !is_fillable(el) {
                return Err(EncloseError::unsupported_action(
                    "fill in",
                    format!("<{}> is not a fillable field", el.name()),
                ));
            }
        }
        trace!(%node, value, "set value");
        self.state_mut(node.index())?.value = Some(value.to_string());
        Ok(())
    }

    fn set_checked(&mut self, node: &Node, checked: bool) -> EncloseResult<()> {
        let group = {
            let page = self.page_for(node)?;
            let dom = Dom::new(&page.html);
            let el = Self::element(page, node)?;
            match (el.value().name(), input_type(el.value()).as_str()) {
                ("input", "checkbox") => Vec::new(),
                ("input", "radio") if checked => radio_group(&dom, el),
                ("input", "radio") => Vec::new(),
                _ => {
                    return Err(EncloseError::unsupported_action(
                        if checked { "check" } else { "uncheck" },
                        format!("<{}> is not a checkbox or radio button", el.value().name()),
                    ))
                }
            }
        };
        for index in group {
            self.state_mut(index)?.checked = Some(false);
        }
        trace!(%node, checked, "set checked");
        self.state_mut(node.index())?.checked = Some(checked);
        Ok(())
    }

    fn select_option(&mut self, node: &Node) -> EncloseResult<()> {
        let siblings = {
            let page = self.page_for(node)?;
            let dom = Dom::new(&page.html);
            let option = Self::element(page, node)?;
            if option.value().name() != "option" {
                return Err(EncloseError::unsupported_action(
                    "select",
                    format!("<{}> is not an option", option.value().name()),
                ));
            }
            match dom.ancestor_named(option, "select") {
                Some(select) if select.value().attr("multiple").is_none() => options(select)
                    .filter_map(|o| dom.index_of(&o))
                    .collect(),
                _ => Vec::new(),
            }
        };
        for index in siblings {
            self.state_mut(index)?.selected = Some(false);
        }
        trace!(%node, "select option");
        self.state_mut(node.index())?.selected = Some(true);
        Ok(())
    }

    fn value_of(&self, node: &Node) -> EncloseResult<Option<String>> {
        let page = self.page_for(node)?;
        let dom = Dom::new(&page.html);
        let el = Self::element(page, node)?;
        Ok(control_values(page, &dom, el).into_iter().next())
    }
}

fn input_type(el: &Element) -> String {
    el.attr("type")
        .map_or_else(|| "text".to_string(), str::to_ascii_lowercase)
}

fn is_fillable(el: &Element) -> bool {
    match el.name() {
        "textarea" => true,
        "input" => !matches!(
            input_type(el).as_str(),
            "submit" | "image" | "button" | "reset" | "checkbox" | "radio" | "file" | "hidden"
        ),
        _ => false,
    }
}

fn is_checked(page: &Page, index: usize, el: &Element) -> bool {
    page.state(index)
        .and_then(|s| s.checked)
        .unwrap_or_else(|| el.attr("checked").is_some())
}

fn options(select: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    select
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "option")
}

fn option_value(option: ElementRef<'_>) -> String {
    option
        .value()
        .attr("value")
        .map_or_else(|| normalize_whitespace(&raw_text(option)), str::to_string)
}

/// Radio buttons sharing `radio`'s name within the same form
fn radio_group<'a>(dom: &Dom<'a>, radio: ElementRef<'a>) -> Vec<usize> {
    let Some(name) = radio.value().attr("name") else {
        return Vec::new();
    };
    let form = dom.ancestor_named(radio, "form");
    dom.iter()
        .filter(|el| {
            el.value().name() == "input"
                && input_type(el.value()) == "radio"
                && el.value().attr("name") == Some(name)
                && dom.ancestor_named(*el, "form") == form
        })
        .filter_map(|el| dom.index_of(&el))
        .collect()
}

/// Values a control contributes, ignoring whether it is successful
fn control_values<'a>(page: &Page, dom: &Dom<'a>, el: ElementRef<'a>) -> Vec<String> {
    let Some(index) = dom.index_of(&el) else {
        return Vec::new();
    };
    let typed = page.state(index).and_then(|s| s.value.clone());
    match el.value().name() {
        "textarea" => vec![typed.unwrap_or_else(|| raw_text(el))],
        "select" => {
            let selected: Vec<String> = options(el)
                .filter(|o| {
                    dom.index_of(o)
                        .and_then(|i| page.state(i).and_then(|s| s.selected))
                        .unwrap_or_else(|| o.value().attr("selected").is_some())
                })
                .map(option_value)
                .collect();
            if selected.is_empty() && el.value().attr("multiple").is_none() {
                options(el).next().map(option_value).into_iter().collect()
            } else {
                selected
            }
        }
        "input" => match input_type(el.value()).as_str() {
            "checkbox" | "radio" => vec![el.value().attr("value").unwrap_or("on").to_string()],
            _ => vec![typed.unwrap_or_else(|| el.value().attr("value").unwrap_or("").to_string())],
        },
        "option" => vec![option_value(el)],
        _ => el.value().attr("value").map(str::to_string).into_iter().collect(),
    }
}

/// Successful controls of `form` as name/value pairs, in tree order
fn serialize_form<'a>(
    page: &Page,
    dom: &Dom<'a>,
    form: ElementRef<'a>,
    submitter: ElementRef<'a>,
) -> Vec<(String, String)> {
    let mut params = Vec::new();
    for el in form.descendants().filter_map(ElementRef::wrap) {
        let value = el.value();
        let Some(name) = value.attr("name").filter(|n| !n.is_empty()) else {
            continue;
        };
        if value.attr("disabled").is_some() {
            continue;
        }
        let successful = match value.name() {
            "input" => match input_type(value).as_str() {
                "submit" | "image" => el == submitter,
                "button" | "reset" | "file" => false,
                "checkbox" | "radio" => dom
                    .index_of(&el)
                    .is_some_and(|i| is_checked(page, i, value)),
                _ => true,
            },
            "button" => el == submitter,
            "textarea" | "select" => true,
            _ => false,
        };
        if successful {
            params.extend(
                control_values(page, dom, el)
                    .into_iter()
                    .map(|v| (name.to_string(), v)),
            );
        }
    }
    params
}
