use actix_cors::Cors;
use actix_web::{self, middleware::Logger, web, App, HttpServer};
use std::sync::LazyLock;

use crate::configs::{connect_database, BannerModule, ModuleConfig};

mod api;
mod configs;
mod constants;
mod modules;
mod test;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    let subscriber = tracing_subscriber::fmt().with_target(true).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool = connect_database().await.map_err(|e| {
        log::error!("Database connection error: {e}");
        std::io::Error::other("Database connection error")
    })?;

    let module = BannerModule::init(ModuleConfig::from_env(), db_pool).map_err(|e| {
        log::error!("Banner module initialization error: {e}");
        std::io::Error::other(e.to_string())
    })?;
    let banner_service = module.service();

    println!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(ENV.frontend_url.as_str())
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(banner_service.clone()))
            .service(health_check)
            .service(web::scope("/api").configure(modules::banner::route::configure))
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
