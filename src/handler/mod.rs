//! Handler module
//!
//! Handlers are the per-application endpoints routes dispatch to. They are
//! registered in an explicit registry at startup, keyed by their module path
//! (`blog`, `admin/user`, `blog/index`) — never resolved by building type
//! names from request strings at runtime.

pub mod dispatch;
pub mod welcome;

pub use dispatch::handle_request;

use crate::app::Application;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a handler gets to see about the request
pub struct ModuleContext<'a> {
    pub application: &'a Application,
    /// Hostname the request was resolved with
    pub hostname: &'a str,
    /// Full request path
    pub path: &'a str,
    /// Request path relative to the application's base URI
    pub relative_uri: &'a str,
    /// Query parameters merged with parameters bound by the route match;
    /// route parameters win on collision
    pub params: HashMap<String, String>,
    pub is_head: bool,
}

impl ModuleContext<'_> {
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// A request handler
pub trait Handler: Send + Sync {
    /// Authorization gate, called before `handle`. Returning `false` routes
    /// the request into the application's access-denied chain.
    fn secure(&self, _ctx: &ModuleContext<'_>) -> bool {
        true
    }

    fn handle(&self, ctx: &ModuleContext<'_>) -> Response<Full<Bytes>>;
}

/// Handlers registered for one application, keyed by module path
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn register(&mut self, id: impl Into<String>, handler: Arc<dyn Handler>) {
        self.handlers.insert(id.into(), handler);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(id).map(Arc::clone)
    }

    /// Resolve a handler from a relative request path.
    ///
    /// Tries the `/`-joined path itself, then its `index` variant; the empty
    /// path resolves to the given default handler.
    #[must_use]
    pub fn resolve_path(&self, relative_uri: &str, default_handler: &str) -> Option<Arc<dyn Handler>> {
        let joined = relative_uri
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        if joined.is_empty() {
            return self.get(default_handler);
        }

        self.get(&joined)
            .or_else(|| self.get(&format!("{joined}/index")))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// An application-defined response hook
pub type HookFn = Box<dyn Fn(&ModuleContext<'_>) -> Response<Full<Bytes>> + Send + Sync>;

/// Optional per-application hooks, consulted before the configured fallback
/// handlers
#[derive(Default)]
pub struct AppHooks {
    /// Nothing resolved for the request path
    pub not_found: Option<HookFn>,
    /// A handler's `secure()` denied the request
    pub access_denied: Option<HookFn>,
    /// A media request with a recognized extension found no file
    pub media_not_found: Option<HookFn>,
}
