//! Redirect handling
//!
//! A redirect-class response sends the caller elsewhere. In a browser that
//! is a page navigation; here it is whatever the [`Navigator`] does.

/// Location used when a redirect carries no `Location` header
pub const DEFAULT_LOCATION: &str = "/";

/// Performs navigation for redirect responses
pub trait Navigator: Send + Sync {
    /// Go to `location`
    fn navigate(&self, location: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, location: &str) {
        self(location)
    }
}

/// Default navigator: logs the target
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, location: &str) {
        tracing::info!(location, "Redirect requested");
    }
}
