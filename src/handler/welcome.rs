//! Built-in welcome handler
//!
//! Registered as the default handler for discovered applications that bring
//! no handlers of their own, so a freshly scaffolded application serves
//! something instead of a 404.

use crate::handler::{Handler, ModuleContext};
use crate::http::response;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

pub struct WelcomeHandler;

impl Handler for WelcomeHandler {
    fn handle(&self, ctx: &ModuleContext<'_>) -> Response<Full<Bytes>> {
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{name}</title>
</head>
<body>
    <h1>{name}</h1>
    <p>This application is up and serving <strong>{hostname}</strong>.</p>
    <p>Register handlers for it to replace this page.</p>
</body>
</html>"#,
            name = ctx.application.name,
            hostname = ctx.hostname,
        );

        response::build_html_response(html, ctx.is_head)
    }
}
