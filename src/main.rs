mod config;
mod error;
mod handlers;
mod model;
mod models;
mod preprocess;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use env_logger::Env;

use crate::config::EnvConfig;
use crate::model::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = EnvConfig::new();
    log::info!("Loading model...");
    let state = web::Data::new(AppState::initialize(&config));

    let bind_addr = config.bind_addr();
    log::info!("Server running at http://{}", bind_addr);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(state.clone())
            .service(
                web::resource(["/predict", "/predict/"]).route(web::post().to(handlers::predict)),
            )
            .service(web::resource("/health").route(web::get().to(handlers::health)))
    })
    .bind(bind_addr)?
    .run()
    .await
}
