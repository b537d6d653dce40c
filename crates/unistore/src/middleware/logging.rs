//! LoggingMiddleware - logs every action passing through

use crate::action::Action;
use crate::config::StoreConfig;
use crate::dispatcher::{DispatchFn, Dispatcher};
use crate::middleware::Middleware;

/// LoggingMiddleware - logs all actions and passes them on unchanged
pub struct LoggingMiddleware {
    name: String,
    level: log::Level,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self::from_config(&StoreConfig::default())
    }

    /// Use the store name and action log level from `config`
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            name: config.name.clone(),
            level: config.action_level(),
        }
    }

    pub fn with_level(mut self, level: log::Level) -> Self {
        self.level = level;
        self
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> Middleware<S, A> for LoggingMiddleware
where
    A: Action,
{
    fn handle(&self, action: A, _dispatcher: &Dispatcher<S, A>, next: &DispatchFn<A>) {
        log::log!(self.level, "[{}] Action: {:?}", self.name, action);
        next(action)
    }
}
