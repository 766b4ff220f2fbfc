//! System actions for the standalone host

use std::sync::Arc;

use tracing::info;

use contracts::{Action, ActionExecutor, Collector, ContractError, SessionRegistry};

use crate::locale::{text, Message};

/// Runs system actions against the collector and the session registry
///
/// Messages are localized with the locale bound on the calling thread.
pub struct DefaultActionExecutor {
    sessions: Arc<dyn SessionRegistry>,
}

impl DefaultActionExecutor {
    pub fn new(sessions: Arc<dyn SessionRegistry>) -> Self {
        Self { sessions }
    }
}

impl ActionExecutor for DefaultActionExecutor {
    fn execute(
        &self,
        action: Action,
        collector: &dyn Collector,
        counter_name: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<String, ContractError> {
        match action {
            Action::ClearCounter => {
                let name = counter_name.ok_or_else(|| {
                    ContractError::Other(format!("{} : counter", text(Message::MissingParameter)))
                })?;
                if collector.clear_counter(name) {
                    Ok(format!("{} {name}", text(Message::CounterCleared)))
                } else {
                    Err(ContractError::Other(format!(
                        "{} : {name}",
                        text(Message::UnknownCounter)
                    )))
                }
            }
            // no collector to run: message only
            Action::Gc => Ok(text(Message::GcRequested).to_string()),
            Action::InvalidateSessions => {
                let count = self.sessions.invalidate_all();
                info!(count, "Sessions invalidated");
                Ok(format!("{} ({count})", text(Message::SessionsInvalidated)))
            }
            Action::InvalidateSession => {
                let id = session_id.ok_or_else(|| {
                    ContractError::Other(format!("{} : sessionId", text(Message::MissingParameter)))
                })?;
                if self.sessions.invalidate(id) {
                    Ok(format!("{} : {id}", text(Message::SessionInvalidated)))
                } else {
                    Ok(format!("{} : {id}", text(Message::NoSession)))
                }
            }
            Action::HeapDump => Err(ContractError::Unsupported(
                "heap dumps are not available for native processes".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::InMemoryCollector;
    use crate::locale::ThreadLocaleBinder;
    use crate::sessions::InMemorySessionRegistry;
    use contracts::{Locale, LocaleBinder};

    fn executor() -> (DefaultActionExecutor, Arc<InMemorySessionRegistry>) {
        let sessions = Arc::new(InMemorySessionRegistry::new());
        (DefaultActionExecutor::new(sessions.clone()), sessions)
    }

    #[test]
    fn test_clear_counter() {
        let (executor, _) = executor();
        let collector = InMemoryCollector::new("shop");
        collector.record_request("http", "/", 1, false);

        let message = executor
            .execute(Action::ClearCounter, &collector, Some("http"), None)
            .unwrap();
        assert_eq!(message, "Statistics cleared for counter http");
        assert_eq!(collector.counter("http").unwrap().hits(), 0);

        assert!(executor
            .execute(Action::ClearCounter, &collector, Some("jms"), None)
            .is_err());
        assert!(executor
            .execute(Action::ClearCounter, &collector, None, None)
            .is_err());
    }

    #[test]
    fn test_session_actions() {
        let (executor, sessions) = executor();
        let collector = InMemoryCollector::new("shop");
        sessions.create("a", None, None);
        sessions.create("b", None, None);

        let message = executor
            .execute(Action::InvalidateSession, &collector, None, Some("a"))
            .unwrap();
        assert_eq!(message, "Session invalidated : a");

        let message = executor
            .execute(Action::InvalidateSessions, &collector, None, None)
            .unwrap();
        assert_eq!(message, "Sessions invalidated (1)");
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_heap_dump_unsupported() {
        let (executor, _) = executor();
        let collector = InMemoryCollector::new("shop");
        let err = executor
            .execute(Action::HeapDump, &collector, None, None)
            .unwrap_err();
        assert!(matches!(err, ContractError::Unsupported(_)));
    }

    #[test]
    fn test_messages_follow_bound_locale() {
        let (executor, _) = executor();
        let collector = InMemoryCollector::new("shop");
        ThreadLocaleBinder.bind(&Locale::new("fr"));
        let message = executor.execute(Action::Gc, &collector, None, None);
        ThreadLocaleBinder.unbind();
        assert_eq!(message.unwrap(), "Mémoire libérée");
    }
}
