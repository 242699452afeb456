use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A conversation thread on the assistant service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Thread identifier used for subsequent chat requests.
    pub id: String,

    /// Creation timestamp as reported by the server.  Opaque to the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Free-form metadata attached by the server.  Opaque to the client.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

/// The envelope returned by the thread-creation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadResponse {
    /// Whether the server created the thread.
    pub success: bool,

    /// The created thread, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Thread>,

    /// Error text, present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ThreadResponse {
    /// Converts the envelope into the created thread.
    ///
    /// `success: false` or a missing `data` field is a thread-creation error.
    pub fn into_thread(self) -> Result<Thread> {
        match (self.success, self.data) {
            (true, Some(thread)) => Ok(thread),
            (true, None) => Err(Error::thread_creation(
                self.error
                    .unwrap_or_else(|| "response did not include a thread".to_string()),
            )),
            (false, _) => Err(Error::thread_creation(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }
}

/// Body of a thread-creation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreadRequest {
    /// Opening message for the thread.
    pub message: String,

    /// Whether the assistant should answer in JSON.  Always false for this client.
    pub json_response: bool,
}

impl Default for CreateThreadRequest {
    fn default() -> Self {
        Self {
            message: "Hola".to_string(),
            json_response: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_response() {
        let json = serde_json::json!({
            "success": true,
            "data": {"id": "thread_1", "createdAt": "2025-03-30T10:00:00Z", "metadata": {}}
        });
        let response: ThreadResponse = serde_json::from_value(json).unwrap();
        let thread = response.into_thread().unwrap();
        assert_eq!(thread.id, "thread_1");
        assert_eq!(thread.created_at.as_deref(), Some("2025-03-30T10:00:00Z"));
    }

    #[test]
    fn minimal_thread_parses() {
        let json = serde_json::json!({"success": true, "data": {"id": "t"}});
        let response: ThreadResponse = serde_json::from_value(json).unwrap();
        let thread = response.into_thread().unwrap();
        assert!(thread.created_at.is_none());
        assert!(thread.metadata.is_null());
    }

    #[test]
    fn failed_response_carries_server_error() {
        let json = serde_json::json!({"success": false, "error": "sin cuota"});
        let response: ThreadResponse = serde_json::from_value(json).unwrap();
        let err = response.into_thread().unwrap_err();
        assert!(matches!(err, Error::ThreadCreation { ref message } if message == "sin cuota"));
    }

    #[test]
    fn success_without_data_is_an_error() {
        let response = ThreadResponse {
            success: true,
            data: None,
            error: None,
        };
        assert!(response.into_thread().is_err());
    }

    #[test]
    fn create_request_serialization() {
        let json = serde_json::to_value(CreateThreadRequest::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "Hola", "jsonResponse": false})
        );
    }
}
