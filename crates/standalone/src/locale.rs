//! Thread-scoped locale binding and message lookup

use std::cell::RefCell;

use contracts::{Locale, LocaleBinder};

thread_local! {
    static BOUND: RefCell<Vec<Locale>> = const { RefCell::new(Vec::new()) };
}

/// Binds locales on the calling thread, innermost binding wins
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadLocaleBinder;

impl LocaleBinder for ThreadLocaleBinder {
    fn bind(&self, locale: &Locale) {
        BOUND.with(|stack| stack.borrow_mut().push(locale.clone()));
    }

    fn unbind(&self) {
        BOUND.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Locale bound on this thread, or the default one
pub fn current_locale() -> Locale {
    BOUND.with(|stack| stack.borrow().last().cloned().unwrap_or_default())
}

/// Translatable console strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Title,
    Statistics,
    Graphs,
    Sessions,
    CurrentRequests,
    HeapHistogram,
    Processes,
    Hits,
    MeanDuration,
    MaxDuration,
    Errors,
    NoSession,
    CounterCleared,
    UnknownCounter,
    GcRequested,
    SessionsInvalidated,
    SessionInvalidated,
    MissingParameter,
}

/// Text of `message` in the current thread's locale
pub fn text(message: Message) -> &'static str {
    translate(&current_locale(), message)
}

/// Text of `message` in `locale`, English when the language is not known
pub fn translate(locale: &Locale, message: Message) -> &'static str {
    let french = locale.language().eq_ignore_ascii_case("fr");
    match (message, french) {
        (Message::Title, false) => "Monitoring",
        (Message::Title, true) => "Monitoring",
        (Message::Statistics, false) => "Statistics",
        (Message::Statistics, true) => "Statistiques",
        (Message::Graphs, false) => "Graphs",
        (Message::Graphs, true) => "Courbes",
        (Message::Sessions, false) => "Sessions",
        (Message::Sessions, true) => "Sessions",
        (Message::CurrentRequests, false) => "Current requests",
        (Message::CurrentRequests, true) => "Requêtes en cours",
        (Message::HeapHistogram, false) => "Heap histogram",
        (Message::HeapHistogram, true) => "Histogramme mémoire",
        (Message::Processes, false) => "Processes",
        (Message::Processes, true) => "Processus",
        (Message::Hits, false) => "Hits",
        (Message::Hits, true) => "Hits",
        (Message::MeanDuration, false) => "Mean time (ms)",
        (Message::MeanDuration, true) => "Temps moyen (ms)",
        (Message::MaxDuration, false) => "Max time (ms)",
        (Message::MaxDuration, true) => "Temps max (ms)",
        (Message::Errors, false) => "Errors",
        (Message::Errors, true) => "Erreurs",
        (Message::NoSession, false) => "Session not found",
        (Message::NoSession, true) => "Session introuvable",
        (Message::CounterCleared, false) => "Statistics cleared for counter",
        (Message::CounterCleared, true) => "Statistiques réinitialisées pour le compteur",
        (Message::UnknownCounter, false) => "Unknown counter",
        (Message::UnknownCounter, true) => "Compteur inconnu",
        (Message::GcRequested, false) => "Memory released",
        (Message::GcRequested, true) => "Mémoire libérée",
        (Message::SessionsInvalidated, false) => "Sessions invalidated",
        (Message::SessionsInvalidated, true) => "Sessions invalidées",
        (Message::SessionInvalidated, false) => "Session invalidated",
        (Message::SessionInvalidated, true) => "Session invalidée",
        (Message::MissingParameter, false) => "Missing parameter",
        (Message::MissingParameter, true) => "Paramètre manquant",
    }
}
