use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub fields: serde_json::Value,
}

fn bad_request(error: &str, fields: serde_json::Map<String, serde_json::Value>) -> actix_web::Error {
    let body = ErrorResponse {
        error: error.to_string(),
        fields: serde_json::Value::Object(fields),
    };
    actix_web::error::InternalError::from_response("", HttpResponse::BadRequest().json(body)).into()
}

/// Explain a body that failed to deserialize in terms of the job API
fn describe_deserialize_error(err: &str) -> &'static str {
    if err.contains("EOF while parsing") {
        "Request body is empty. Expected JSON payload"
    } else if err.contains("unknown variant") && err.contains("queued") {
        "Invalid status. Expected one of: queued, delayed"
    } else if err.contains("unknown variant") {
        "Invalid job kind. Expected one of: pdf, image, text, other"
    } else if err.contains("invalid type") {
        "Field has the wrong type; priority must be an integer"
    } else if err.contains("missing field") {
        "Required field missing"
    } else {
        "Invalid JSON format"
    }
}

/// JsonConfig shared by every job endpoint, turning extractor failures into
/// the `ErrorResponse` shape
pub fn json_config() -> actix_web_validator::JsonConfig {
    actix_web_validator::JsonConfig::default().error_handler(|err, _req| {
        let mut fields = serde_json::Map::new();

        match err {
            actix_web_validator::Error::Validate(validation_errors) => {
                for (field, errors) in validation_errors.field_errors() {
                    let messages: Vec<String> = errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| format!("Invalid value for {}", field))
                        })
                        .collect();
                    fields.insert(field.to_string(), serde_json::json!({ "errors": messages }));
                }
                bad_request("Validation failed", fields)
            }
            actix_web_validator::Error::Deserialize(de_err) => {
                let message = describe_deserialize_error(&de_err.to_string());
                fields.insert("message".to_string(), serde_json::json!(message));
                bad_request("Request validation failed", fields)
            }
            // Body parsing failures (bad JSON, unknown enum values) land here
            other => {
                let message = describe_deserialize_error(&other.to_string());
                fields.insert("message".to_string(), serde_json::json!(message));
                bad_request("Request validation failed", fields)
            }
        }
    })
}
