use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use polyhost::app::AppRegistry;
use polyhost::config::{Config, ServerState};
use polyhost::handler::welcome::WelcomeHandler;
use polyhost::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Applications that register nothing still serve a page
    let registry = AppRegistry::discover_with(&cfg.paths, |application| {
        if application.handlers.is_empty() {
            let default = application.config.default_handler.clone();
            application
                .handlers
                .register(default, Arc::new(WelcomeHandler));
        }
    })?;

    let addr = cfg.socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;

    logger::log_server_start(&addr, &cfg, registry.applications().len());
    for application in registry.applications() {
        logger::log_application(application);
    }

    let state = Arc::new(ServerState::new(cfg, registry));
    let connections = Arc::new(AtomicUsize::new(0));

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                server::accept_connection(stream, peer_addr, &state, &connections);
            }
            Err(e) => {
                logger::log_error(&format!("Failed to accept connection: {e}"));
            }
        }
    }
}
