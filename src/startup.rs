use crate::configuration::Settings;
use crate::middleware;
use crate::routes;
use crate::services::AgentAvailability;
use crate::ws::ChatServer;
use actix::Actor;
use actix_cors::Cors;
use actix_web::{dev::Server, error, http, web, App, HttpServer};
use sqlx::{Pool, Postgres};
use std::net::TcpListener;
use std::time::Duration;
use tracing_actix_web::TracingLogger;

pub async fn run(
    listener: TcpListener,
    pg_pool: Pool<Postgres>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let settings = web::Data::new(settings);
    let pg_pool = web::Data::new(pg_pool);

    // one directory per process; sessions rebuild it by reconnecting
    let chat_server = web::Data::new(ChatServer::new().start());

    let availability = web::Data::new(AgentAvailability::new());

    let auth_http_client = reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
    let auth_http_client = web::Data::new(auth_http_client);

    let auth_cache = web::Data::new(middleware::authentication::AuthCache::new(
        Duration::from_secs(60),
    ));

    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let msg: String = match err {
            error::JsonPayloadError::Deserialize(err) => format!(
                "{{\"kind\":\"deserialize\",\"line\":{}, \"column\":{}, \"msg\":\"{}\"}}",
                err.line(),
                err.column(),
                err
            ),
            _ => format!("{{\"kind\":\"other\",\"msg\":\"{}\"}}", err),
        };
        error::InternalError::new(msg, http::StatusCode::BAD_REQUEST).into()
    });

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(middleware::authentication::Manager::new())
            .wrap(Cors::permissive())
            .service(web::scope("/health_check").service(routes::health_check))
            .service(
                web::scope("/conversations")
                    .service(routes::conversation::add::item)
                    .service(routes::conversation::get::list)
                    .service(routes::conversation::get::item)
                    .service(routes::conversation::close::item)
                    .service(routes::conversation::messages::history)
                    .service(routes::conversation::messages::send)
                    .service(routes::conversation::read::item),
            )
            .service(web::scope("/agents").service(routes::agent::availability))
            .service(
                web::scope("/ws")
                    .service(routes::ws::chat)
                    .service(routes::ws::agent_notifications),
            )
            .app_data(json_config.clone())
            .app_data(pg_pool.clone())
            .app_data(settings.clone())
            .app_data(chat_server.clone())
            .app_data(availability.clone())
            .app_data(auth_http_client.clone())
            .app_data(auth_cache.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
