use actix_web::dev::ServiceRequest;

/// Last method in the chain. Only the health probe and the WebSocket
/// entry points may proceed without an identity; the WS handlers emit
/// their own distinct close code for unauthenticated connections.
pub fn anonym(req: &mut ServiceRequest) -> Result<bool, String> {
    let path = req.path();
    if path.starts_with("/health_check") || path.starts_with("/ws/") {
        return Ok(true);
    }

    Err("Authentication required".to_string())
}
