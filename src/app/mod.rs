//! Application module
//!
//! An application is one configured tenant: a set of hostnames, a base URI,
//! a route table and an isolated media/handler namespace. All configured
//! applications are discovered once at startup; per request exactly one is
//! resolved and carried in the request context.

pub mod registry;
pub mod resolver;

pub use registry::{AppRegistry, Package, RegistryError};
pub use resolver::{detect, HostMatch, ResolveError};

use crate::handler::{AppHooks, HandlerRegistry};
use crate::routing::{self, RouteError, RouteMatch, RouteTable};
use serde::Deserialize;
use std::path::PathBuf;

/// Per-application configuration descriptor (`config.toml` in the
/// application directory)
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Hostnames served by this application; entries may contain `*`
    /// wildcards
    pub hostnames: Vec<String>,
    /// Path prefix the application is mounted under
    #[serde(default = "default_base_uri")]
    pub base_uri: String,
    /// Handler identifier to route patterns
    #[serde(default)]
    pub routes: RouteTable,
    /// Handler serving the application root when no route matches
    #[serde(default = "default_handler_id")]
    pub default_handler: String,
    /// Handler invoked when nothing resolves
    #[serde(default)]
    pub not_found_handler: Option<String>,
    /// Handler invoked when a handler denies access
    #[serde(default)]
    pub forbidden_handler: Option<String>,
    /// Short language code injected into rewritten URLs
    #[serde(default)]
    pub default_language: Option<String>,
}

fn default_base_uri() -> String {
    "/".to_string()
}

fn default_handler_id() -> String {
    "index".to_string()
}

impl AppConfig {
    /// Base URI with the empty value defaulted to `/`
    #[must_use]
    pub fn base_uri(&self) -> &str {
        if self.base_uri.is_empty() {
            "/"
        } else {
            &self.base_uri
        }
    }
}

/// One configured application
pub struct Application {
    /// Unique name, derived from the application directory
    pub name: String,
    /// Application directory
    pub path: PathBuf,
    /// Root of the application's media tree (per-category subdirectories)
    pub media_path: PathBuf,
    pub config: AppConfig,
    /// Handlers registered for this application, keyed by module path
    pub handlers: HandlerRegistry,
    pub hooks: AppHooks,
}

impl Application {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, config: AppConfig) -> Self {
        let path: PathBuf = path.into();
        let media_path = path.join("media");
        Self {
            name: name.into(),
            path,
            media_path,
            config,
            handlers: HandlerRegistry::default(),
            hooks: AppHooks::default(),
        }
    }

    /// Match a request path against this application's route table
    pub fn route(&self, request_path: &str) -> Result<RouteMatch, RouteError> {
        routing::match_route(&self.config.routes, request_path, self.config.base_uri())
    }

    /// Rewrite an internal URL to its external, routed form
    #[must_use]
    pub fn rewrite_url(&self, url: &str) -> String {
        routing::rewrite::rewrite(
            &self.config.routes,
            self.config.base_uri(),
            self.config.default_language.as_deref(),
            url,
        )
    }

    /// Rewrite absolute link attributes in an HTML document
    #[must_use]
    pub fn rewrite_html(&self, html: &str) -> String {
        routing::rewrite::rewrite_html(
            &self.config.routes,
            self.config.base_uri(),
            self.config.default_language.as_deref(),
            html,
        )
    }

    /// Rewrite `url(...)` references in a CSS document
    #[must_use]
    pub fn rewrite_css(&self, css: &str) -> String {
        routing::rewrite::rewrite_css(
            &self.config.routes,
            self.config.base_uri(),
            self.config.default_language.as_deref(),
            css,
        )
    }

    /// Media directory for one extension category
    #[must_use]
    pub fn media_dir(&self, category: &str) -> PathBuf {
        self.media_path.join(category)
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Parse an application descriptor from TOML
pub fn parse_app_config(raw: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_defaults() {
        let config = parse_app_config(r#"hostnames = ["example.com"]"#).unwrap();
        assert_eq!(config.base_uri(), "/");
        assert_eq!(config.default_handler, "index");
        assert!(config.routes.is_empty());
        assert!(config.default_language.is_none());
    }

    #[test]
    fn descriptor_with_routes() {
        let config = parse_app_config(
            r#"
            hostnames = ["shop.example.com", "*.shop.example.com"]
            base_uri = "/shop"
            default_language = "en"

            [routes]
            item = ["/item/$id"]
            "#,
        )
        .unwrap();

        assert_eq!(config.base_uri(), "/shop");
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.default_language.as_deref(), Some("en"));
    }

    #[test]
    fn application_routes_and_rewrites_under_its_base_uri() {
        let config = parse_app_config(
            r#"
            hostnames = ["example.com"]
            base_uri = "/shop"

            [routes]
            item = ["/item/$id"]
            "#,
        )
        .unwrap();
        let application = Application::new("shop", "/apps/shop", config);

        let matched = application.route("/shop/item/7").unwrap();
        assert_eq!(matched.handler, "item");
        assert_eq!(matched.params["id"], "7");

        assert_eq!(application.rewrite_url("item?id=7"), "/shop/item/7");
        assert_eq!(
            application.rewrite_html(r#"<a href="/item?id=7">x</a>"#),
            r#"<a href="/shop/item/7">x</a>"#
        );
    }

    #[test]
    fn empty_base_uri_defaults_to_root() {
        let config = parse_app_config(
            r#"
            hostnames = ["example.com"]
            base_uri = ""
            "#,
        )
        .unwrap();
        assert_eq!(config.base_uri(), "/");
    }
}
