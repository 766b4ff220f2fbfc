//! Locale - rendering language, and the binder that scopes it

use std::fmt;

/// Fallback when the client advertises no usable language
pub const DEFAULT_LANGUAGE: &str = "en";

/// Language tag used for rendering (`en`, `fr-FR`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Preferred locale from an `Accept-Language` header value
    ///
    /// Picks the entry with the highest `q` weight; ties keep header order.
    pub fn from_accept_language(header: Option<&str>) -> Self {
        let Some(header) = header else {
            return Self::default();
        };

        let mut best: Option<(&str, f32)> = None;
        for entry in header.split(',') {
            let mut parts = entry.split(';');
            let tag = parts.next().unwrap_or_default().trim();
            if tag.is_empty() || tag == "*" {
                continue;
            }
            let weight = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            if best.is_none_or(|(_, w)| weight > w) {
                best = Some((tag, weight));
            }
        }

        best.map_or_else(Self::default, |(tag, _)| Self::new(tag))
    }

    /// Full language tag
    pub fn tag(&self) -> &str {
        &self.0
    }

    /// Primary language subtag (`fr` for `fr-FR`)
    pub fn language(&self) -> &str {
        self.0.split(['-', '_']).next().unwrap_or(&self.0)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host mechanism that makes a locale current for renderers
///
/// Bindings nest like a stack: every `bind` is paired with exactly one
/// `unbind` on the same thread.
pub trait LocaleBinder: Send + Sync {
    fn bind(&self, locale: &Locale);

    fn unbind(&self);
}

/// Binder for hosts whose renderers only use the locale passed explicitly
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLocaleBinder;

impl LocaleBinder for NoopLocaleBinder {
    fn bind(&self, _locale: &Locale) {}

    fn unbind(&self) {}
}
