use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

/// What a handler hands back to the bus. An `Err` stops the current `send`.
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A registered callback. Removal matches on the `Rc` allocation, so keep a
/// clone of the handle around if you intend to `off` it later.
pub type Handler<P> = Rc<dyn Fn(Option<&P>) -> HandlerResult>;

#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("handler for `{event}` failed: {source}")]
    Handler {
        event: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Wrap a closure as a [`Handler`], pinning down its argument type.
pub fn handler<P, F>(f: F) -> Handler<P>
where
    F: Fn(Option<&P>) -> HandlerResult + 'static,
{
    Rc::new(f)
}

/// Named-event pub/sub registry.
///
/// Every method takes `&self` so a handler holding the bus can register or
/// unregister while a `send` is in flight. `send` dispatches to the handler
/// list as it stood when the call began; changes made during dispatch are
/// seen by the next `send`.
pub struct EventBus<P> {
    registry: RefCell<HashMap<String, Vec<Handler<P>>>>,
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self {
            registry: RefCell::new(HashMap::new()),
        }
    }
}

impl<P> fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        let mut map = f.debug_map();
        for (name, handlers) in registry.iter() {
            map.entry(name, &handlers.len());
        }
        map.finish()
    }
}

impl<P> EventBus<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `callback` to the list for `event_name`. Duplicates are kept.
    pub fn on(&self, event_name: impl Into<String>, callback: Handler<P>) {
        self.registry
            .borrow_mut()
            .entry(event_name.into())
            .or_default()
            .push(callback);
    }

    /// Unregister handlers.
    ///
    /// * `off(None, _)` drops everything.
    /// * `off(Some(name), None)` drops every handler for `name`.
    /// * `off(Some(name), Some(cb))` drops `cb` from `name` only; unknown
    ///   handles are ignored.
    pub fn off(&self, event_name: Option<&str>, callback: Option<&Handler<P>>) {
        let mut registry = self.registry.borrow_mut();
        match (event_name, callback) {
            (None, _) => registry.clear(),
            (Some(name), None) => {
                registry.remove(name);
            }
            (Some(name), Some(callback)) => {
                if let Some(handlers) = registry.get_mut(name) {
                    handlers.retain(|h| !Rc::ptr_eq(h, callback));
                }
            }
        }
    }

    /// Call every handler registered for `event_name`, in registration order.
    pub fn send(&self, event_name: &str, payload: Option<&P>) -> Result<(), EventBusError> {
        let handlers = self
            .registry
            .borrow()
            .get(event_name)
            .cloned()
            .unwrap_or_default();

        for h in &handlers {
            h(payload).map_err(|source| EventBusError::Handler {
                event: event_name.to_string(),
                source,
            })?;
        }

        Ok(())
    }

    pub fn listener_count(&self, event_name: &str) -> usize {
        self.registry
            .borrow()
            .get(event_name)
            .map_or(0, |handlers| handlers.len())
    }

    pub fn is_empty(&self) -> bool {
        self.registry.borrow().values().all(|handlers| handlers.is_empty())
    }
}
