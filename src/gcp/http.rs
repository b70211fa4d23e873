//! HTTP utilities for GCP REST API calls

use crate::error::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and drops non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Google API error envelope: `{"error": {"code": 404, "message": "..."}}`
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Extract the human-readable message of a Google API error body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_default()
}

/// HTTP client wrapper for GCP API calls
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
}

impl GcpHttpClient {
    /// Create a new HTTP client sending `user_agent` on every request
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    /// Make a GET request to a GCP API and decode the JSON body
    pub async fn get<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<T> {
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            // Callers decide how loud a failure is; a 404 is an expected answer
            tracing::debug!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(Error::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Format an error for display
/// Security: Maps API failures to generic messages instead of raw API details
pub fn format_error(error: &Error) -> String {
    match error {
        Error::Api { status: 403, .. } => {
            "Permission denied. Check your GCP IAM permissions.".to_string()
        }
        Error::Api { status: 401, .. } | Error::Auth(_) => {
            "Authentication failed. Run 'gcloud auth application-default login'.".to_string()
        }
        Error::Api { status: 429, .. } => {
            "Rate limit exceeded. Please try again later.".to_string()
        }
        Error::Api { status: 400, .. } => "Invalid request. Check your parameters.".to_string(),
        Error::Api { status, .. } if *status >= 500 => {
            "GCP service temporarily unavailable. Please try again.".to_string()
        }
        Error::Api { .. } | Error::Http(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        }
        other => {
            let message = other.to_string();
            let sanitized = message
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(240)
                .collect::<String>();

            if sanitized.len() < message.len() {
                format!("{}...", sanitized)
            } else {
                sanitized
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_for_log_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.contains("[truncated, 500 bytes total]"));
    }

    #[test]
    fn test_sanitize_for_log_strips_control_characters() {
        assert_eq!(sanitize_for_log("a\nb\tc d"), "abc d");
    }

    #[test]
    fn test_api_error_message_reads_envelope() {
        let body = r#"{"error":{"code":404,"message":"The resource 'x' was not found","errors":[]}}"#;
        assert_eq!(api_error_message(body), "The resource 'x' was not found");
        assert_eq!(api_error_message("<html>oops</html>"), "");
    }

    #[test]
    fn test_format_error_hides_api_details() {
        let err = Error::Api {
            status: 403,
            message: "Required 'compute.machineTypes.get' permission".to_string(),
        };
        assert_eq!(
            format_error(&err),
            "Permission denied. Check your GCP IAM permissions."
        );

        let err = Error::Api {
            status: 503,
            message: String::new(),
        };
        assert!(format_error(&err).contains("temporarily unavailable"));
    }

    #[test]
    fn test_format_error_keeps_input_errors_readable() {
        assert_eq!(
            format_error(&Error::MissingMachineType),
            "Please specify machine_type to get machine type details"
        );
    }
}
