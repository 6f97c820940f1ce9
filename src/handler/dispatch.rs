//! Request dispatch
//!
//! The request boundary: extracts the hostname, resolves the application,
//! gives media a first shot at the path, then routes to a registered
//! handler. Every failure path ends in an explicit next step - a hook, a
//! configured fallback handler, or a fixed status response.

use crate::app::resolver::effective_hostname;
use crate::app::Application;
use crate::config::ServerState;
use crate::handler::{Handler, ModuleContext};
use crate::http::response;
use crate::logger::{self, AccessLogEntry};
use crate::media::{self, MediaError, MediaOutcome, MediaRequest};
use crate::routing::RouteError;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, Version};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<ServerState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();

    let response = match early_reject(&req, &state) {
        Some(response) => response,
        None => dispatch(&req, &state).await,
    };

    if state.access_log_enabled() {
        let entry = access_entry(&req, &response, peer_addr, started);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Method and body-size checks that do not need an application
fn early_reject<B>(req: &Request<B>, state: &ServerState) -> Option<Response<Full<Bytes>>> {
    match req.method() {
        &Method::GET | &Method::HEAD => {}
        &Method::OPTIONS => {
            return Some(response::build_options_response(state.config.http.enable_cors))
        }
        method => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            return Some(response::build_405_response());
        }
    }

    check_body_size(req, state.config.http.max_body_size)
}

/// Validate Content-Length and return 413 when the declared body is too big
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    let size_str = content_length.to_str().ok()?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(build_413_response())
        }
        _ => None,
    }
}

fn build_413_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(413)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("413 Payload Too Large")))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

async fn dispatch<B>(req: &Request<B>, state: &ServerState) -> Response<Full<Bytes>> {
    let path = req.uri().path();
    let is_head = *req.method() == Method::HEAD;

    let Some(hostname) = request_hostname(req) else {
        logger::log_warning("Request without a resolvable hostname");
        return response::build_400_response("hostname");
    };

    let host_match = match state.registry.detect(&hostname, path) {
        Ok(matched) => matched,
        Err(err) => {
            logger::log_warning(&err.to_string());
            return response::build_404_response(Some("application"));
        }
    };
    let application = host_match.application.as_ref();
    let relative_uri = host_match.relative_uri.as_str();

    // Media gets the first look; a recognized extension never falls back
    // into routing
    let media_request = MediaRequest {
        relative_uri,
        if_modified_since: header(req, "if-modified-since"),
        range: header(req, "range"),
        is_head,
    };
    match media::serve(
        media_request,
        application,
        &state.registry,
        state.config.http.max_media_file_size,
    )
    .await
    {
        Ok(MediaOutcome::Served(response)) => return response,
        Ok(MediaOutcome::NotHandled) => {}
        Err(MediaError::NotFound(_)) => {
            let ctx = module_context(application, &hostname, path, relative_uri, query_params(req), is_head);
            if let Some(hook) = &application.hooks.media_not_found {
                return hook(&ctx);
            }
            return response::build_404_response(Some("media"));
        }
        Err(err) => {
            logger::log_error(&err.to_string());
            return response::build_404_response(Some("media"));
        }
    }

    // Route the path; bound route parameters override query parameters
    let mut params = query_params(req);
    let handler = match application.route(path) {
        Ok(matched) => {
            params.extend(matched.params);
            let found = application.handlers.get(&matched.handler);
            if found.is_none() {
                logger::log_warning(&format!(
                    "Route '{}' names an unregistered handler",
                    matched.handler
                ));
            }
            found
        }
        Err(RouteError::NotFound { .. }) => application
            .handlers
            .resolve_path(relative_uri, &application.config.default_handler),
    };

    let ctx = module_context(application, &hostname, path, relative_uri, params, is_head);
    match handler {
        Some(handler) => invoke(&handler, application, &ctx),
        None => not_found(application, &ctx),
    }
}

fn invoke(
    handler: &Arc<dyn Handler>,
    application: &Application,
    ctx: &ModuleContext<'_>,
) -> Response<Full<Bytes>> {
    if !handler.secure(ctx) {
        return access_denied(application, ctx);
    }
    handler.handle(ctx)
}

/// Nothing resolved: hook, then the configured not-found handler, then 404
fn not_found(application: &Application, ctx: &ModuleContext<'_>) -> Response<Full<Bytes>> {
    if let Some(hook) = &application.hooks.not_found {
        return hook(ctx);
    }
    if let Some(id) = &application.config.not_found_handler {
        if let Some(handler) = application.handlers.get(id) {
            return handler.handle(ctx);
        }
    }
    response::build_404_response(None)
}

/// A handler denied the request: hook, then the forbidden handler, then 403
fn access_denied(application: &Application, ctx: &ModuleContext<'_>) -> Response<Full<Bytes>> {
    if let Some(hook) = &application.hooks.access_denied {
        return hook(ctx);
    }
    if let Some(id) = &application.config.forbidden_handler {
        if let Some(handler) = application.handlers.get(id) {
            return handler.handle(ctx);
        }
    }
    response::build_403_response()
}

fn module_context<'a>(
    application: &'a Application,
    hostname: &'a str,
    path: &'a str,
    relative_uri: &'a str,
    params: HashMap<String, String>,
    is_head: bool,
) -> ModuleContext<'a> {
    ModuleContext {
        application,
        hostname,
        path,
        relative_uri,
        params,
        is_head,
    }
}

/// Hostname for application resolution: the last X-Forwarded-Host entry
/// wins over Host, ports are stripped
fn request_hostname<B>(req: &Request<B>) -> Option<String> {
    let raw = header(req, "x-forwarded-host").or_else(|| header(req, "host"))?;
    let host = strip_port(effective_hostname(raw));
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

fn header<'a, B>(req: &'a Request<B>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

fn query_params<B>(req: &Request<B>) -> HashMap<String, String> {
    let Some(query) = req.uri().query() else {
        return HashMap::new();
    };

    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

fn access_entry<B>(
    req: &Request<B>,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        Version::HTTP_10 => "1.0".to_string(),
        Version::HTTP_2 => "2".to_string(),
        _ => "1.1".to_string(),
    };
    entry.status = response.status().as_u16();
    entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
        .unwrap_or(usize::MAX);
    entry.referer = header(req, "referer").map(ToString::to_string);
    entry.user_agent = header(req, "user-agent").map(ToString::to_string);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}
