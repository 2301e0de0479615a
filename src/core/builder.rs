use std::sync::Arc;

use crate::core::{Dispatcher, DispatcherConfig};
use crate::handlers::{AnyHandlerRef, Entry};

/// Builder for constructing a [`Dispatcher`] with initial wildcard handlers.
pub struct DispatcherBuilder {
    cfg: DispatcherConfig,
    wildcard: Vec<AnyHandlerRef>,
}

impl DispatcherBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: DispatcherConfig) -> Self {
        Self {
            cfg,
            wildcard: Vec::new(),
        }
    }

    /// Sets wildcard handlers registered before the dispatcher is handed out.
    ///
    /// They run, in this order, after the typed handlers of every dispatched event
    /// (e.g. `LogWriter` with the `logging` feature).
    pub fn with_wildcard_handlers(mut self, handlers: Vec<AnyHandlerRef>) -> Self {
        self.wildcard = handlers;
        self
    }

    /// Builds and returns the dispatcher.
    pub fn build(self) -> Dispatcher {
        let dispatcher = Dispatcher::with_config(self.cfg);
        dispatcher.register_wildcards(self.wildcard.into_iter().map(Entry::wildcard).collect());
        dispatcher
    }

    /// Builds the dispatcher behind an `Arc`, ready to share between tasks.
    pub fn build_shared(self) -> Arc<Dispatcher> {
        Arc::new(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::events::AnyEvent;
    use crate::handlers::AnyHandlerFn;

    #[test]
    fn test_builder_registers_wildcards_in_order() {
        let first: AnyHandlerRef = AnyHandlerFn::arc("first", |_ev: Arc<dyn AnyEvent>| async {
            Ok::<_, HandlerError>(())
        });
        let second: AnyHandlerRef = AnyHandlerFn::arc("second", |_ev: Arc<dyn AnyEvent>| async {
            Ok::<_, HandlerError>(())
        });

        let bus = Dispatcher::builder(DispatcherConfig::default())
            .with_wildcard_handlers(vec![first.clone(), second])
            .build();

        assert_eq!(bus.wildcard_count(), 2);
        assert!(bus.unsubscribe_any(&first));
        assert_eq!(bus.wildcard_count(), 1);
    }
}
