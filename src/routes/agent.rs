use crate::helpers::JsonResponse;
use crate::services::AgentAvailability;
use actix_web::{get, web, Responder, Result};

/// GET /agents/availability
/// Snapshot of the agents currently holding an open notification channel.
/// Expiry-based and eventually consistent; callers tolerate staleness.
#[tracing::instrument(name = "Get agent availability.", skip(availability))]
#[get("/availability")]
pub async fn availability(availability: web::Data<AgentAvailability>) -> Result<impl Responder> {
    let agents = availability.snapshot().await;
    Ok(JsonResponse::build().set_list(agents).ok("OK"))
}
