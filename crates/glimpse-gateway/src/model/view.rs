use glimpse_viewer::View;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Body of `GET /{code}`.
///
/// `found` and `exhausted` are always present so clients can tell an unknown
/// code from a used-up one without looking at the status code.
#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub found: bool,
    pub exhausted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_views: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl ViewResponse {
    pub fn not_found() -> Self {
        Self {
            found: false,
            exhausted: false,
            code: None,
            data: None,
            remaining_views: None,
            error: Some("code not found"),
        }
    }

    pub fn exhausted() -> Self {
        Self {
            found: true,
            exhausted: true,
            code: None,
            data: None,
            remaining_views: None,
            error: Some("code exhausted"),
        }
    }
}

impl From<View> for ViewResponse {
    fn from(view: View) -> Self {
        match view {
            View::NotFound => Self::not_found(),
            View::Exhausted => Self::exhausted(),
            View::Consumed {
                code,
                payload,
                remaining_views,
            } => Self {
                found: true,
                exhausted: false,
                code: Some(code.to_string()),
                data: Some(payload),
                remaining_views: Some(remaining_views),
                error: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
