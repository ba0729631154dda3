use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Error payload carried inside a failed [`ApiResponse`].
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    pub status_code: u16,
    /// Structured detail (validation failures, offending field names)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub details: Option<serde_json::Value>,
}

/// The `{success, data?, error?, message?}` envelope every endpoint returns.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    error: Option<ErrorBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                message: message.into(),
                status_code,
                details: None,
            }),
            message: None,
        }
    }

    pub fn error_with_details(
        status_code: u16,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        let mut response = Self::error(status_code, message);
        if let Some(error) = response.error.as_mut() {
            error.details = Some(details);
        }
        response
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn error_body(&self) -> Option<&ErrorBody> {
        self.error.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl ApiResponse<()> {
    /// Success envelope with no `data`, only a message (deletes, logout).
    pub fn ok_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn success_envelope_omits_error() {
        let value = serde_json::to_value(ApiResponse::success(json!({"id": 1}))).unwrap();
        assert_eq!(value, json!({"success": true, "data": {"id": 1}}));
    }

    #[test]
    fn error_envelope_uses_status_code_key() {
        let value = serde_json::to_value(ApiResponse::<()>::error(404, "Cliente no encontrado"))
            .unwrap();
        assert_eq!(
            value,
            json!({
                "success": false,
                "error": {"message": "Cliente no encontrado", "statusCode": 404}
            })
        );
    }

    #[test]
    fn deserializes_envelope_without_optional_fields() {
        let parsed: ApiResponse<Vec<u32>> =
            serde_json::from_str(r#"{"success": true, "data": [1, 2]}"#).unwrap();
        assert!(parsed.is_success());
        assert_eq!(parsed.into_data(), Some(vec![1, 2]));
    }
}
