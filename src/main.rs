use clap::Parser;
use log::{error, info};
use std::process::ExitCode;
use static_devserver::logger;
use static_devserver::server::HttpServer;
use static_devserver::server::config::ServerConfig;
use static_devserver::server::error::ServerError;
use static_devserver::server::signal;

fn main() -> ExitCode {
    logger::init();

    let config = ServerConfig::parse();
    info!("Starting static file server with config: {:?}", config);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &ServerConfig) -> Result<(), ServerError> {
    let server = HttpServer::new(config)?;
    signal::install_interrupt_handler()?;

    println!(
        "Serving {} at http://{}:{}",
        server.root().display(),
        config.host,
        server.local_addr().port()
    );

    server.run()?;

    println!("\nShutting down…");
    Ok(())
}
