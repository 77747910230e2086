use actix_web::HttpServer;
use dotenv::dotenv;
use std::io;

use taskbook::{app, config::Config, db, Services};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let pool = db::connect(&config.database_url).await.map_err(|err| {
        log::error!("failed to open database {}: {}", config.database_url, err);
        io::Error::new(io::ErrorKind::Other, err)
    })?;

    let services = Services::new(pool, config.bcrypt_cost);
    let allowed_origins = config.allowed_origins.clone();

    log::info!("starting taskbook server at {}", config.server_url());
    HttpServer::new(move || app::build(&services, &allowed_origins))
        .bind((config.server_host.as_str(), config.server_port))?
        .run()
        .await
}
