use actix_web::error::{
    ErrorBadRequest, ErrorForbidden, ErrorInternalServerError, ErrorNotFound, ErrorUnauthorized,
};
use actix_web::{Error, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct JsonResponse<T> {
    pub(crate) status: String,
    pub(crate) message: String,
    pub(crate) code: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) item: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) list: Option<Vec<T>>,
}

#[derive(Debug, Default)]
pub struct JsonResponseBuilder<T>
where
    T: Serialize,
{
    id: Option<Uuid>,
    item: Option<T>,
    list: Option<Vec<T>>,
}

impl<T> JsonResponse<T>
where
    T: Serialize,
{
    pub fn build() -> JsonResponseBuilder<T> {
        JsonResponseBuilder {
            id: None,
            item: None,
            list: None,
        }
    }
}

impl<T> JsonResponseBuilder<T>
where
    T: Serialize,
{
    pub fn set_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn set_item(mut self, item: T) -> Self {
        self.item = Some(item);
        self
    }

    pub fn set_list(mut self, list: Vec<T>) -> Self {
        self.list = Some(list);
        self
    }

    fn into_response(self, status: &str, code: u32, msg: &str) -> JsonResponse<T> {
        JsonResponse {
            status: status.to_string(),
            message: msg.to_string(),
            code,
            id: self.id,
            item: self.item,
            list: self.list,
        }
    }

    pub fn ok(self, msg: impl AsRef<str>) -> HttpResponse {
        HttpResponse::Ok().json(self.into_response("OK", 200, msg.as_ref()))
    }

    pub fn created(self, msg: impl AsRef<str>) -> HttpResponse {
        HttpResponse::Created().json(self.into_response("OK", 201, msg.as_ref()))
    }

    pub fn bad_request(self, msg: impl AsRef<str>) -> Error {
        ErrorBadRequest(self.to_json_string("Error", 400, msg.as_ref()))
    }

    pub fn unauthorized(self, msg: impl AsRef<str>) -> Error {
        ErrorUnauthorized(self.to_json_string("Error", 401, msg.as_ref()))
    }

    pub fn forbidden(self, msg: impl AsRef<str>) -> Error {
        ErrorForbidden(self.to_json_string("Error", 403, msg.as_ref()))
    }

    pub fn not_found(self, msg: impl AsRef<str>) -> Error {
        ErrorNotFound(self.to_json_string("Error", 404, msg.as_ref()))
    }

    pub fn internal_server_error(self, msg: impl AsRef<str>) -> Error {
        ErrorInternalServerError(self.to_json_string("Error", 500, msg.as_ref()))
    }

    fn to_json_string(self, status: &str, code: u32, msg: &str) -> String {
        let msg = if msg.trim().is_empty() {
            match code {
                400 => "Validation error",
                401 => "Unauthorized",
                403 => "Forbidden",
                404 => "Object not found",
                _ => "Internal error",
            }
        } else {
            msg
        };

        serde_json::to_string(&self.into_response(status, code, msg))
            .unwrap_or_else(|_| format!("{{\"status\":\"{}\",\"code\":{}}}", status, code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_carries_item() {
        let resp: JsonResponse<i32> = JsonResponse {
            status: "OK".into(),
            message: "OK".into(),
            code: 200,
            id: None,
            item: Some(5),
            list: None,
        };
        let body = serde_json::to_value(&resp).unwrap();
        assert_eq!(body["code"], 200);
        assert_eq!(body["item"], 5);
        assert!(body.get("list").is_none());
    }

    #[test]
    fn error_body_is_json() {
        let err = JsonResponse::<i32>::build().not_found("no such conversation");
        let body = format!("{}", err);
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["code"], 404);
        assert_eq!(parsed["message"], "no such conversation");
    }
}
