use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::Context;

use task_manager::config::Config;
use task_manager::{db, routes, session, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env()?;

    // Create a connection pool and the tables it needs
    let db_pool = db::connect(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    log::info!("connected to {}", config.database_url);

    let state = web::Data::new(AppState::new(db_pool, &config));
    let addr = (config.ip.clone(), config.port);
    log::info!("listening on {}:{}", addr.0, addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(session::keep_pending_flash())
            .wrap(Logger::default())
            .app_data(state.clone())
            .service(actix_files::Files::new("/static", "./static"))
            .configure(routes::configure)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
