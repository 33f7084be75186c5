use crate::transport::HttpResponse;
use std::collections::HashMap;

/// Field name to value pairs stored at one path.
pub type Secret = HashMap<String, String>;

/// Outcome of a successful logical read or write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalResponse {
    raw_response: Option<HttpResponse>,
    retries: u32,
    data: Secret,
}

impl LogicalResponse {
    pub(crate) fn read(raw_response: HttpResponse, retries: u32, data: Secret) -> Self {
        Self {
            raw_response: Some(raw_response),
            retries,
            data,
        }
    }

    pub(crate) fn written(retries: u32) -> Self {
        Self {
            raw_response: None,
            retries,
            data: Secret::new(),
        }
    }

    /// Raw HTTP response; only reads keep it.
    pub fn raw_response(&self) -> Option<&HttpResponse> {
        self.raw_response.as_ref()
    }

    /// Failed attempts before the one that succeeded.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn data(&self) -> &Secret {
        &self.data
    }

    pub fn into_data(self) -> Secret {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_response_is_empty() {
        let resp = LogicalResponse::written(2);
        assert!(resp.raw_response().is_none());
        assert!(resp.data().is_empty());
        assert_eq!(resp.retries(), 2);
    }

    #[test]
    fn test_read_response_keeps_raw() {
        let raw = HttpResponse {
            status: 200,
            content_type: Some("application/json".into()),
            body: br#"{"data":{"k":"v"}}"#.to_vec(),
        };
        let data: Secret = [("k".to_string(), "v".to_string())].into_iter().collect();
        let resp = LogicalResponse::read(raw.clone(), 0, data.clone());
        assert_eq!(resp.raw_response(), Some(&raw));
        assert_eq!(resp.into_data(), data);
    }
}
