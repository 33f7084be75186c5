use crate::error::AttemptError;
use crate::models::Secret;
use crate::transport::HttpResponse;
use serde_json::Value;

const JSON_MIME: &str = "application/json";

pub(crate) fn expect_status(response: &HttpResponse, expected: u16) -> Result<(), AttemptError> {
    if response.status != expected {
        return Err(AttemptError::UnexpectedStatus {
            expected,
            status: response.status,
        });
    }
    Ok(())
}

/// Validate a read response and flatten its `data` object.
///
/// Checks run in order: status 200, JSON content type, UTF-8 JSON object
/// body, then a `data` object holding only string values.
pub(crate) fn parse_read(response: &HttpResponse) -> Result<Secret, AttemptError> {
    expect_status(response, 200)?;

    let mime = response.content_type.as_deref().unwrap_or("null");
    if mime != JSON_MIME {
        return Err(AttemptError::UnexpectedContentType(mime.to_string()));
    }

    let text = std::str::from_utf8(&response.body)
        .map_err(|e| AttemptError::MalformedBody(format!("body is not UTF-8: {}", e)))?;
    let root: Value = serde_json::from_str(text)
        .map_err(|e| AttemptError::MalformedBody(format!("invalid JSON: {}", e)))?;
    let root = match root {
        Value::Object(map) => map,
        other => {
            return Err(AttemptError::MalformedBody(format!(
                "expected a JSON object, got {}",
                type_name(&other)
            )));
        }
    };

    let data = match root.get("data") {
        Some(Value::Object(data)) => data,
        Some(other) => {
            return Err(AttemptError::MalformedEnvelope(format!(
                "\"data\" is {}, not an object",
                type_name(other)
            )));
        }
        None => {
            return Err(AttemptError::MalformedEnvelope(
                "missing \"data\" member".to_string(),
            ));
        }
    };

    data.iter()
        .map(|(field, value)| match value {
            Value::String(s) => Ok((field.clone(), s.clone())),
            other => Err(AttemptError::MalformedEnvelope(format!(
                "field {:?} is {}, not a string",
                field,
                type_name(other)
            ))),
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
