//! Scoped locale binding

use contracts::{Locale, LocaleBinder};

/// Keeps a locale bound for as long as it lives
///
/// Unbinding happens in `Drop`, so every exit path (early return, `?`,
/// panic unwinding) releases the binding.
#[must_use = "the locale is unbound as soon as the scope is dropped"]
pub struct LocaleScope<'a> {
    binder: &'a dyn LocaleBinder,
}

impl<'a> LocaleScope<'a> {
    pub fn bind(binder: &'a dyn LocaleBinder, locale: &Locale) -> Self {
        binder.bind(locale);
        Self { binder }
    }
}

impl Drop for LocaleScope<'_> {
    fn drop(&mut self) {
        self.binder.unbind();
    }
}
