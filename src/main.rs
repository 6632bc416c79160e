use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use log::info;

use bvote::config::Config;
use bvote::routes;
use bvote::state::AppState;
use bvote::store::MongoStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;

    let store = MongoStore::connect(&config.mongodb_uri, &config.mongodb_database)
        .await
        .context("MongoDB connection error")?;
    info!("MongoDB connected");

    let state = web::Data::new(
        AppState::load(config, Arc::new(store)).context("failed to load contract metadata")?,
    );

    let address = (state.config.bind_address.clone(), state.config.port);
    info!("Server is running on {}:{}", address.0, address.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(|cfg| routes::configure(cfg, &state.config))
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
