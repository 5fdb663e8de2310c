//! Server error envelopes.
//!
//! A rejected request usually carries a JSON body such as
//!
//! ```json
//! { "status": 422, "error": "Invalid input", "details": [
//!     { "input": "nope", "message": "Not a valid email", "path": "email" } ] }
//! ```
//!
//! which is parsed into [`ApiError`] and rendered into the failure message.

use crate::codec::JsonCodec;
use crate::error::{ClientFailure, FailureKind};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Write;

/// Server-side error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Status code reported by the server.
    pub status: i32,

    /// Short description of the error.
    #[serde(rename = "error", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Per-input failures, in server order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub details: Vec<ErrorDetail>,
}

/// One validation failure inside an [`ApiError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// The input value that triggered the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,

    /// Where in the request the input was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ApiError {
    /// Render a multi-line diagnostic for a failed `method path` request.
    pub fn render(&self, method: &Method, path: &str) -> String {
        let mut out = format!(
            "Failed to request {method} {path}, received the following API error:\nStatus: {}",
            self.status
        );

        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = write!(out, "\nDescription: {description}");
        }

        for (i, detail) in self.details.iter().enumerate() {
            let _ = write!(out, "\n[#{}] {}", i + 1, detail.message);
            if let Some((input, at)) = detail.cause() {
                let _ = write!(out, " caused by input \"{input}\" at \"{at}\"");
            }
        }

        out
    }
}

impl ErrorDetail {
    /// Input and path, when both are present and non-empty.
    fn cause(&self) -> Option<(&str, &str)> {
        let input = self.input.as_deref().filter(|s| !s.is_empty())?;
        let path = self.path.as_deref().filter(|s| !s.is_empty())?;
        Some((input, path))
    }
}

/// Whether a `Content-Type` value names a JSON body.
pub(crate) fn is_json_content_type(value: &str) -> bool {
    value
        .parse::<mime::Mime>()
        .map(|m| {
            m.type_() == mime::APPLICATION
                && (m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
        })
        .unwrap_or(false)
}

/// Turn a rejected response into a failure.
///
/// Bodies that are empty or not declared as JSON are only previewed; JSON
/// bodies must parse as an [`ApiError`].
pub(crate) fn classify_failure(
    method: &Method,
    path: &str,
    status: StatusCode,
    content_type: Option<&str>,
    body: &str,
    codec: &JsonCodec,
) -> ClientFailure {
    let failure = |kind: FailureKind, message: String| {
        ClientFailure::new(kind, method.clone(), path, message).with_status(status)
    };

    if body.trim().is_empty() {
        return failure(
            FailureKind::Status,
            format!("Failed to request {method} {path}, received status code {status} with an empty body"),
        );
    }

    if !content_type.is_some_and(is_json_content_type) {
        return failure(
            FailureKind::Status,
            format!(
                "Failed to request {method} {path}, received status code {status}\nPreview: {}",
                codec.preview(body)
            ),
        );
    }

    match serde_json::from_str::<Option<ApiError>>(body) {
        Ok(Some(error)) => {
            let message = error.render(method, path);
            failure(FailureKind::Api, message).with_errors(vec![error])
        }
        Ok(None) => failure(
            FailureKind::Decode,
            format!("Failed to request {method} {path}, received status code {status} with a null error body"),
        ),
        Err(e) => failure(
            FailureKind::Decode,
            format!(
                "Failed to request {method} {path}, received status code {status} and an unreadable error body: {e}\nPreview: {}",
                codec.preview(body)
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const JSON: Option<&str> = Some("application/json; charset=utf-8");

    fn classify(status: u16, content_type: Option<&str>, body: &str) -> ClientFailure {
        classify_failure(
            &Method::POST,
            "report/urls",
            StatusCode::from_u16(status).unwrap(),
            content_type,
            body,
            &JsonCodec::new(),
        )
    }

    #[test]
    fn test_render_two_details() {
        let body = json!({
            "status": 422,
            "error": "Invalid input",
            "details": [
                {"input": "nope", "message": "Not a valid email", "path": "email"},
                {"message": "At least one URL is required"}
            ]
        })
        .to_string();

        let failure = classify(422, JSON, &body);

        assert_eq!(failure.kind(), FailureKind::Api);
        assert_eq!(failure.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
        assert_eq!(failure.errors().len(), 1);
        assert_eq!(
            failure.message(),
            "Failed to request POST report/urls, received the following API error:\n\
             Status: 422\n\
             Description: Invalid input\n\
             [#1] Not a valid email caused by input \"nope\" at \"email\"\n\
             [#2] At least one URL is required"
        );

        let numbered: Vec<_> = failure
            .message()
            .lines()
            .filter(|l| l.starts_with("[#"))
            .collect();
        assert_eq!(numbered.len(), 2);
    }

    #[test]
    fn test_render_needs_both_input_and_path() {
        let error = ApiError {
            status: 400,
            description: Some(String::new()),
            details: vec![
                ErrorDetail {
                    input: Some("x".into()),
                    message: "only input".into(),
                    path: None,
                },
                ErrorDetail {
                    input: Some(String::new()),
                    message: "empty input".into(),
                    path: Some("urls[0]".into()),
                },
            ],
        };

        let rendered = error.render(&Method::GET, "stats/leaderboard");

        assert!(!rendered.contains("Description:"));
        assert!(!rendered.contains("caused by"));
        assert!(rendered.ends_with("[#1] only input\n[#2] empty input"));
    }

    #[test]
    fn test_missing_and_null_details() {
        let failure = classify(400, JSON, r#"{"status": 400, "error": "Bad", "details": null}"#);
        assert_eq!(failure.kind(), FailureKind::Api);
        assert!(failure.errors()[0].details.is_empty());
        assert!(failure.message().ends_with("Description: Bad"));

        let failure = classify(404, JSON, r#"{"status": 404}"#);
        assert_eq!(failure.kind(), FailureKind::Api);
        assert!(failure.message().ends_with("Status: 404"));
    }

    #[test]
    fn test_html_body_is_previewed_not_parsed() {
        let body = format!("<html>{}</html>", "a".repeat(2_000));
        let failure = classify(500, Some("text/html"), &body);

        assert_eq!(failure.kind(), FailureKind::Status);
        assert!(failure.errors().is_empty());
        let preview = failure.message().split("Preview: ").nth(1).unwrap();
        assert_eq!(preview.chars().count(), 500);
        assert!(preview.starts_with("<html>"));
    }

    #[test]
    fn test_missing_content_type_is_previewed() {
        let failure = classify(502, None, r#"{"status": 502}"#);
        assert_eq!(failure.kind(), FailureKind::Status);
        assert!(failure.errors().is_empty());
    }

    #[test]
    fn test_empty_body() {
        let failure = classify(503, JSON, "");
        assert_eq!(failure.kind(), FailureKind::Status);
        assert!(failure.message().contains("empty body"));
    }

    #[test]
    fn test_unusable_json_is_a_decode_failure() {
        let failure = classify(400, JSON, "null");
        assert_eq!(failure.kind(), FailureKind::Decode);
        assert!(failure.errors().is_empty());

        let failure = classify(400, JSON, r#"{"message": "no status here"}"#);
        assert_eq!(failure.kind(), FailureKind::Decode);
        assert!(failure.message().contains("Preview: {\"message\""));

        let failure = classify(400, JSON, "{not json");
        assert_eq!(failure.kind(), FailureKind::Decode);
    }

    #[test]
    fn test_json_content_types() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/html; charset=utf-8"));
        assert!(!is_json_content_type("text/plain"));
        assert!(!is_json_content_type(""));
    }
}
