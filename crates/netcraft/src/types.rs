//! Wire enums and report payloads.

use crate::codec::option_int_bool;
use crate::wire_enum;
use serde::{Deserialize, Serialize};

wire_enum! {
    /// Processing state of a submission, sent as `no threats`, `in progress`, ...
    pub enum State: State {
        Processing,
        NoThreats,
        Unavailable,
        Suspicious,
        Malicious,
        Rejected,
        NotInjected,
        NotStarted,
        InProgress,
        Resolved,
    }
}

wire_enum! {
    /// Property to sort submission files by.
    pub enum FileSort: FileSort {
        FileName,
        FileState,
    }
}

wire_enum! {
    /// Sort order for submission listings.
    pub enum Direction: Direction {
        Ascending,
        Descending,
    }
}

/// A single URL in a URL report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlReport {
    pub url: String,
    /// ISO 3166-1 alpha-2 country the URL targets.
    pub country: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UrlReport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            country: None,
            tags: None,
        }
    }

    /// Set the targeted country.
    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Add a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(tag.into());
        self
    }
}

/// Body of `POST report/urls`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlsReport {
    /// Address that receives confirmation and classification updates.
    pub email: String,
    pub reason: String,
    pub urls: Vec<UrlReport>,
    /// Source UUID, only when one was issued to the reporter.
    pub source: Option<String>,
    /// Report without creating submissions. Only available to some reporters.
    #[serde(with = "option_int_bool")]
    pub no_submission: Option<bool>,
}

impl UrlsReport {
    pub fn new(
        email: impl Into<String>,
        reason: impl Into<String>,
        urls: impl IntoIterator<Item = UrlReport>,
    ) -> Self {
        Self {
            email: email.into(),
            reason: reason.into(),
            urls: urls.into_iter().collect(),
            source: None,
            no_submission: None,
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn no_submission(mut self, no_submission: bool) -> Self {
        self.no_submission = Some(no_submission);
        self
    }
}

/// Body of `POST report/email`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailReport {
    pub email: String,
    /// The reported email in MIME format, or its encrypted base64 form
    /// when `password` is set.
    pub message: String,
    pub password: Option<String>,
}

impl EmailReport {
    pub fn new(email: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            message: message.into(),
            password: None,
        }
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// Body of `POST report/mistake`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MistakeReport {
    pub email: String,
    pub reason: String,
    pub url: String,
}

impl MistakeReport {
    pub fn new(
        email: impl Into<String>,
        reason: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            reason: reason.into(),
            url: url.into(),
        }
    }
}

/// Response to a report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportResult {
    pub message: String,
    #[serde(default)]
    pub uuid: Option<String>,
}

/// An entry of the public reporter leaderboard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub nickname: String,
    pub confirmed_attacks: u64,
    pub percentage: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LeaderboardContainer {
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use serde_json::{json, Value};

    fn sent(body: &impl Serialize) -> Value {
        serde_json::from_slice(&JsonCodec::new().encode(body).unwrap()).unwrap()
    }

    #[test]
    fn test_urls_report_wire_shape() {
        let report = UrlsReport::new(
            "me@example.com",
            "phishing",
            [UrlReport::new("https://bad.test").country("GB").tag("bank")],
        )
        .no_submission(true);

        assert_eq!(
            sent(&report),
            json!({
                "email": "me@example.com",
                "reason": "phishing",
                "urls": [{"url": "https://bad.test", "country": "GB", "tags": ["bank"]}],
                "no_submission": 1
            })
        );
    }

    #[test]
    fn test_optional_fields_omitted() {
        let report = UrlsReport::new("me@example.com", "phishing", [UrlReport::new("https://bad.test")]);
        let json = sent(&report);

        assert!(json.get("source").is_none());
        assert!(json.get("no_submission").is_none());
        assert_eq!(json["urls"][0], json!({"url": "https://bad.test"}));

        let json = sent(&EmailReport::new("me@example.com", "MIME-Version: 1.0"));
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_report_result_without_uuid() {
        let result: ReportResult =
            serde_json::from_value(json!({"message": "Successfully reported mistake"})).unwrap();
        assert_eq!(result.uuid, None);
    }

    #[test]
    fn test_leaderboard_container() {
        let container: LeaderboardContainer = serde_json::from_value(json!({
            "leaderboard": [
                {"rank": 1, "nickname": "alice", "confirmed_attacks": 1200, "percentage": 12.5}
            ]
        }))
        .unwrap();

        assert_eq!(container.leaderboard[0].nickname, "alice");
        assert_eq!(container.leaderboard[0].confirmed_attacks, 1200);
    }
}
