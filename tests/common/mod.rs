use actix_web::{get, App, HttpRequest, HttpResponse, HttpServer, Responder};
use clarity_chat::configuration::{get_configuration, DatabaseSettings, Settings};
use clarity_chat::forms;
use sqlx::{Connection, Executor, PgConnection, PgPool};

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
}

impl TestApp {
    /// Bearer tokens for the mock auth service encode the identity:
    /// `{id}.{username}.{role}`.
    pub fn token(id: &str, username: &str, role: &str) -> String {
        format!("{}.{}.{}", id, username, role)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("{}{}", self.address.replacen("http", "ws", 1), path)
    }
}

/// Mock of the auth collaborator: resolves the bearer token into an
/// identity document, or 401 on a missing/empty token.
#[get("/me")]
async fn mock_auth(req: HttpRequest) -> actix_web::Result<impl Responder> {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or_default();

    let mut parts = token.split('.');
    let id = parts.next().unwrap_or_default().to_string();
    let username = parts.next().unwrap_or_default().to_string();
    let role = parts.next().unwrap_or("user").to_string();

    if id.is_empty() || username.is_empty() {
        return Ok(HttpResponse::Unauthorized().finish());
    }

    let user = forms::UserForm {
        id,
        first_name: username.clone(),
        last_name: String::new(),
        username,
        role,
    };

    Ok(HttpResponse::Ok().json(user))
}

async fn mock_auth_server(listener: std::net::TcpListener) -> std::io::Result<()> {
    HttpServer::new(|| App::new().service(mock_auth))
        .workers(1)
        .listen(listener)?
        .run()
        .await
}

pub async fn configure_database(config: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    let mut connection = PgConnection::connect(&config.connection_string_without_db()).await?;

    connection
        .execute(format!(r#"CREATE DATABASE "{}""#, config.database_name).as_str())
        .await?;

    let connection_pool = PgPool::connect(&config.connection_string()).await?;

    sqlx::migrate!("./migrations").run(&connection_pool).await?;

    Ok(connection_pool)
}

pub async fn spawn_app_with_configuration(mut configuration: Settings) -> Option<TestApp> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();

    let connection_pool = match configure_database(&configuration.database).await {
        Ok(pool) => pool,
        Err(err) => {
            eprintln!("Skipping tests: failed to connect to postgres: {}", err);
            return None;
        }
    };

    let server = clarity_chat::startup::run(listener, connection_pool.clone(), configuration)
        .await
        .expect("Failed to bind address.");

    let _ = actix_web::rt::spawn(server);

    Some(TestApp {
        address,
        db_pool: connection_pool,
    })
}

pub async fn spawn_app() -> Option<TestApp> {
    let mut configuration = get_configuration().expect("Failed to get configuration");

    let listener = std::net::TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind port for testing auth server");

    configuration.auth_url = format!(
        "http://127.0.0.1:{}/me",
        listener.local_addr().unwrap().port()
    );

    let _ = actix_web::rt::spawn(mock_auth_server(listener));
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    spawn_app_with_configuration(configuration).await
}

/// Authenticates the identity against the app once, so the user lands in
/// the local directory (agents must exist there before they can be
/// assigned).
pub async fn sync_user(app: &TestApp, token: &str) {
    let response = reqwest::Client::new()
        .get(format!("{}/conversations", app.address))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert!(
        response.status().is_success(),
        "failed to sync user, status {}",
        response.status()
    );
}
