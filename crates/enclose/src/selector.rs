//! Selector abstraction for scoped element queries.
//!
//! A [`Query`] is what a call site hands over: a locator string with an
//! optional explicit [`SelectorKind`] and inline filter options. It becomes a
//! [`Selector`] once the kind is fixed, which happens at resolution time by
//! reading the session's [`DefaultSelector`].
//!
//! # Design Philosophy
//!
//! - **Poka-Yoke**: selector kinds are a closed enum; string tags are
//!   validated once at the boundary
//! - **Late binding**: unqualified queries read the default kind when they
//!   are resolved, not when the enclosing scope was entered
//! - **Open filters**: unknown option keys travel with the selector to the
//!   resolver's filter registry

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use crate::result::{EncloseError, EncloseResult};

/// Query language a locator is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    /// CSS selector (e.g., "ul li.active")
    Css,
    /// XPath 1.0 expression (e.g., "//li[contains(., 'Go')]")
    #[default]
    XPath,
}

impl SelectorKind {
    /// Lowercase tag used in configuration files and errors
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::XPath => "xpath",
        }
    }

    const fn to_bits(self) -> u8 {
        match self {
            Self::Css => 0,
            Self::XPath => 1,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        if bits == 0 {
            Self::Css
        } else {
            Self::XPath
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectorKind {
    type Err = EncloseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "css" => Ok(Self::Css),
            "xpath" => Ok(Self::XPath),
            _ => Err(EncloseError::unsupported_kind(s)),
        }
    }
}

/// Shared, mutable default selector kind.
///
/// The process-wide handle returned by [`DefaultSelector::global`] is a
/// deliberate global: every session built on it sees a change made through
/// [`set_default_selector`] on its next unqualified resolution. Sessions that
/// need isolation (tests, per-config overrides) use
/// [`DefaultSelector::isolated`] instead.
#[derive(Debug, Clone)]
pub struct DefaultSelector {
    kind: Arc<AtomicU8>,
}

static GLOBAL_DEFAULT: OnceLock<DefaultSelector> = OnceLock::new();

impl DefaultSelector {
    /// The process-wide handle (initially `XPath`)
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_DEFAULT
            .get_or_init(|| Self::isolated(SelectorKind::default()))
            .clone()
    }

    /// A handle not shared with anything else
    #[must_use]
    pub fn isolated(kind: SelectorKind) -> Self {
        Self {
            kind: Arc::new(AtomicU8::new(kind.to_bits())),
        }
    }

    /// Current value
    #[must_use]
    pub fn get(&self) -> SelectorKind {
        SelectorKind::from_bits(self.kind.load(Ordering::SeqCst))
    }

    /// Replace the value for every holder of this handle
    pub fn set(&self, kind: SelectorKind) {
        self.kind.store(kind.to_bits(), Ordering::SeqCst);
    }

    /// Whether two handles share the same storage
    #[must_use]
    pub fn shares_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.kind, &other.kind)
    }
}

/// Read the process-wide default selector kind
#[must_use]
pub fn default_selector() -> SelectorKind {
    DefaultSelector::global().get()
}

/// Change the process-wide default selector kind
pub fn set_default_selector(kind: SelectorKind) {
    DefaultSelector::global().set(kind);
}

/// Filter constraints ANDed with the locator match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Matched node's normalized text must contain this substring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Options without built-in meaning, handed to registered filters
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl FilterOptions {
    /// Empty options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Add a pass-through option
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        let key = key.into();
        if key == "text" {
            let value = value.into();
            self.text = Some(
                value
                    .as_str()
                    .map_or_else(|| value.to_string(), str::to_string),
            );
        } else {
            let _ = self.extra.insert(key, value.into());
        }
        self
    }

    /// Overlay `other` onto these options; keys in `other` win
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        if other.text.is_some() {
            self.text = other.text;
        }
        self.extra.extend(other.extra);
        self
    }

    /// No constraints at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.extra.is_empty()
    }
}

/// A fully typed query expression
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    kind: SelectorKind,
    locator: String,
    options: FilterOptions,
}

impl Selector {
    /// Create a selector without filters
    #[must_use]
    pub fn new(kind: SelectorKind, locator: impl Into<String>) -> Self {
        Self {
            kind,
            locator: locator.into(),
            options: FilterOptions::default(),
        }
    }

    /// Create a CSS selector
    #[must_use]
    pub fn css(locator: impl Into<String>) -> Self {
        Self::new(SelectorKind::Css, locator)
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(locator: impl Into<String>) -> Self {
        Self::new(SelectorKind::XPath, locator)
    }

    /// Replace the filter options
    #[must_use]
    pub fn with_options(mut self, options: FilterOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the kind
    #[must_use]
    pub const fn kind(&self) -> SelectorKind {
        self.kind
    }

    /// Get the locator
    #[must_use]
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Get the filter options
    #[must_use]
    pub const fn options(&self) -> &FilterOptions {
        &self.options
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.kind, self.locator)?;
        if let Some(text) = &self.options.text {
            write!(f, " with text {text:?}")?;
        }
        for key in self.options.extra.keys() {
            write!(f, " [{key}]")?;
        }
        Ok(())
    }
}

/// A selector argument whose kind may still be open
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    kind: Option<SelectorKind>,
    locator: String,
    options: FilterOptions,
}

impl Query {
    /// Unqualified query; its kind comes from the default selector
    #[must_use]
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            kind: None,
            locator: locator.into(),
            options: FilterOptions::default(),
        }
    }

    /// Query with an explicit kind
    #[must_use]
    pub fn with_kind(kind: SelectorKind, locator: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            locator: locator.into(),
            options: FilterOptions::default(),
        }
    }

    /// Explicit CSS query
    #[must_use]
    pub fn css(locator: impl Into<String>) -> Self {
        Self::with_kind(SelectorKind::Css, locator)
    }

    /// Explicit XPath query
    #[must_use]
    pub fn xpath(locator: impl Into<String>) -> Self {
        Self::with_kind(SelectorKind::XPath, locator)
    }

    /// Filter by text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.options = self.options.with_text(text);
        self
    }

    /// Add a filter option
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options = self.options.with(key, value);
        self
    }

    /// Explicit kind, if any
    #[must_use]
    pub const fn kind(&self) -> Option<SelectorKind> {
        self.kind
    }

    /// Locator text
    #[must_use]
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Fix the kind and merge extra options.
    ///
    /// `default` must be read by the caller at the moment of resolution.
    #[must_use]
    pub fn normalize(self, default: SelectorKind, options: FilterOptions) -> Selector {
        Selector {
            kind: self.kind.unwrap_or(default),
            locator: self.locator,
            options: self.options.merge(options),
        }
    }
}

impl From<&str> for Query {
    fn from(locator: &str) -> Self {
        Self::new(locator)
    }
}

impl From<String> for Query {
    fn from(locator: String) -> Self {
        Self::new(locator)
    }
}

impl From<&String> for Query {
    fn from(locator: &String) -> Self {
        Self::new(locator.as_str())
    }
}

impl<S: Into<String>> From<(SelectorKind, S)> for Query {
    fn from((kind, locator): (SelectorKind, S)) -> Self {
        Self::with_kind(kind, locator)
    }
}

impl From<Selector> for Query {
    fn from(selector: Selector) -> Self {
        Self {
            kind: Some(selector.kind),
            locator: selector.locator,
            options: selector.options,
        }
    }
}

impl TryFrom<(&str, &str)> for Query {
    type Error = EncloseError;

    fn try_from((kind, locator): (&str, &str)) -> EncloseResult<Self> {
        Ok(Self::with_kind(kind.parse()?, locator))
    }
}
