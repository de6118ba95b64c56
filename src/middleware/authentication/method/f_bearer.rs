use crate::configuration::Settings;
use crate::db;
use crate::forms;
use crate::middleware::authentication::get_header;
use crate::models;
use actix_web::{dev::ServiceRequest, web, HttpMessage};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Short-lived cache of resolved identities, keyed by bearer token.
pub struct AuthCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedUser>>,
}

struct CachedUser {
    user: models::User,
    expires_at: Instant,
}

impl AuthCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, token: &str) -> Option<models::User> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(token) {
                if entry.expires_at > now {
                    return Some(entry.user.clone());
                }
            }
        }

        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(token) {
            if entry.expires_at <= now {
                entries.remove(token);
            } else {
                return Some(entry.user.clone());
            }
        }

        None
    }

    pub async fn insert(&self, token: String, user: models::User) {
        let expires_at = Instant::now() + self.ttl;
        let mut entries = self.entries.write().await;
        entries.insert(token, CachedUser { user, expires_at });
    }
}

fn try_extract_token(authentication: String) -> Result<String, String> {
    let mut authentication_parts = authentication.splitn(2, ' ');
    match authentication_parts.next() {
        Some("Bearer") => {}
        _ => return Err("Bearer scheme missing".to_string()),
    }
    let token = authentication_parts.next();
    if token.is_none() {
        tracing::error!("Bearer token is missing");
        return Err("Authentication required".to_string());
    }

    Ok(token.unwrap().into())
}

/// Browsers cannot attach headers to WebSocket upgrades, so the token may
/// also arrive as a `token` query parameter.
fn token_from_query(req: &ServiceRequest) -> Option<String> {
    req.query_string().split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some("token"), Some(value)) if !value.is_empty() => Some(value.to_string()),
            _ => None,
        }
    })
}

#[tracing::instrument(name = "Authenticate with bearer token", skip(req))]
pub async fn try_bearer(req: &mut ServiceRequest) -> Result<bool, String> {
    let token = match get_header::<String>(req, "authorization")? {
        Some(authentication) => try_extract_token(authentication)?,
        None => match token_from_query(req) {
            Some(token) => token,
            None => return Ok(false),
        },
    };

    let settings = req.app_data::<web::Data<Settings>>().unwrap();
    let http_client = req.app_data::<web::Data<reqwest::Client>>().unwrap();
    let cache = req.app_data::<web::Data<AuthCache>>().unwrap();
    let pg_pool = req.app_data::<web::Data<PgPool>>().unwrap();

    let user = match cache.get(&token).await {
        Some(user) => user,
        None => {
            let resolved =
                fetch_user(http_client.get_ref(), settings.auth_url.as_str(), &token).await;
            let user = match resolved {
                Ok(user) => user,
                // WS entry points emit their own close code for a dead
                // credential; everything else fails the request here
                Err(err) if req.path().starts_with("/ws/") => {
                    tracing::warn!("Dropping invalid websocket credential: {}", err);
                    return Ok(false);
                }
                Err(err) => return Err(err),
            };

            // keep the local directory current for membership queries and
            // agent assignment
            if let Err(err) = db::user::upsert(pg_pool.get_ref(), &user).await {
                tracing::error!("Failed to sync user into directory: {:?}", err);
                return Err("Authentication bookkeeping failed".to_string());
            }

            cache.insert(token.clone(), user.clone()).await;
            user
        }
    };

    if req.extensions_mut().insert(Arc::new(user)).is_some() {
        return Err("user already logged".to_string());
    }

    Ok(true)
}

pub async fn fetch_user(
    client: &reqwest::Client,
    auth_url: &str,
    token: &str,
) -> Result<models::User, String> {
    let resp = client
        .get(auth_url)
        .bearer_auth(token)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(|err| {
            tracing::error!(target: "auth", error = %err, "Auth service request failed");
            "No response from auth service".to_string()
        })?;

    if !resp.status().is_success() {
        return Err("401 Unauthorized".to_string());
    }

    resp.json::<forms::UserForm>()
        .await
        .map_err(|_err| "can't parse the response body".to_string())?
        .try_into()
}
