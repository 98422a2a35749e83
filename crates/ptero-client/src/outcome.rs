use crate::error::{PteroError, Result};
use crate::types::JsonObject;

/// Classification of a single panel response
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// 204
    NoContent,
    /// 200 or 201 with a JSON object body
    Data(JsonObject),
    /// 4xx carrying the panel's error document
    ClientError { code: String, body: JsonObject },
    /// Anything else, including a body that is not the expected JSON
    ServerError(u16),
}

impl RequestOutcome {
    /// Classify a response from its status and raw body
    pub fn classify(status: u16, body: &[u8]) -> Self {
        match status {
            204 => RequestOutcome::NoContent,
            200 | 201 => match decode_object(body) {
                Some(data) => RequestOutcome::Data(data),
                None => RequestOutcome::ServerError(status),
            },
            400..=499 => {
                let Some(body) = decode_object(body) else {
                    return RequestOutcome::ServerError(status);
                };
                match first_error_code(&body) {
                    Some(code) => RequestOutcome::ClientError { code, body },
                    None => RequestOutcome::ServerError(status),
                }
            }
            _ => RequestOutcome::ServerError(status),
        }
    }

    /// Whether the status alone says a body will be decoded
    pub fn expects_body(status: u16) -> bool {
        matches!(status, 200 | 201 | 400..=499)
    }

    /// Convert into the value returned to callers
    pub fn into_result(self) -> Result<Option<JsonObject>> {
        match self {
            RequestOutcome::NoContent => Ok(None),
            RequestOutcome::Data(data) => Ok(Some(data)),
            RequestOutcome::ClientError { code, body } => Err(PteroError::Api { code, body }),
            RequestOutcome::ServerError(status) => Err(PteroError::Transport { status }),
        }
    }
}

fn decode_object(body: &[u8]) -> Option<JsonObject> {
    serde_json::from_slice(body).ok()
}

fn first_error_code(body: &JsonObject) -> Option<String> {
    body.get("errors")?
        .as_array()?
        .first()?
        .get("code")?
        .as_str()
        .map(str::to_string)
}
