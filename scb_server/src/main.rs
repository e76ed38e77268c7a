use dotenvy::dotenv;
use log::info;
use scb_server::{cli::handle_command_line_args, config::ServerConfig, server::run_server};

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    if handle_command_line_args() {
        return;
    }
    let config = ServerConfig::from_env_or_default();

    info!("🚀️ Starting checkout bridge on {}:{}. Orders are created in {}.", config.host, config.port, config.shopify.shop);
    match run_server(config).await {
        Ok(_) => println!("Server shut down cleanly. Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
