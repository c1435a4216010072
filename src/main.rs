use std::net::{SocketAddr, TcpListener};

use log::{error, info, warn};

use warp::Filter;

use proofy::warp_helpers::handle_rejection;
use proofy::{config, routes, storage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = config::Config::from_env()?;
    let port = config.port;
    let addr: SocketAddr = format!("{}:{}", config.host, port).parse()?;

    info!("Starting Proofy server on port {}", port);
    if config.admin_token.is_none() {
        warn!("PROOFY_ADMIN_TOKEN is not set, write endpoints are unprotected");
    }

    if !is_port_available(addr) {
        error!(
            "Port {} is already in use. Stop any existing Proofy instance or pick another port.",
            port
        );
        return Err(format!("Port {} is already in use", port).into());
    }

    let storage = storage::build_storage(&config)?;
    let routes = routes::api(storage, config.admin_token).recover(handle_rejection);

    info!(
        "Server started successfully, listening on http://localhost:{}",
        port
    );

    warp::serve(routes).run(addr).await;

    Ok(())
}

fn is_port_available(addr: SocketAddr) -> bool {
    TcpListener::bind(addr).is_ok()
}
