//! Paperless-NGX REST client: connectivity check, document upload and task lookup.
//!
//! Every request carries `Authorization: Token <token>`. None of the public
//! methods return `Err` for HTTP or transport failures: the check reports
//! them in [`ConnectionStatus`] and the upload in [`UploadResult::Failed`],
//! so the orchestrator decides what is fatal.

use crate::error::{TaskLookupError, UploadError};
use crate::output::{ConnectionStatus, TaskStatus, UploadRequest, UploadResult};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest response body quoted in a failure detail.
const MAX_DETAIL_BODY: usize = 300;

pub struct PaperlessClient {
    client: Client,
    base_url: String,
    token: String,
}

impl PaperlessClient {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| UploadError::Http(e.to_string()))?;

        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// One authenticated `GET /api/`; reachable only on a 2xx answer.
    pub async fn check_connection(&self) -> ConnectionStatus {
        let url = format!("{}/api/", self.base_url);
        debug!("GET {}", url);

        match self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                ConnectionStatus {
                    reachable: status.is_success(),
                    detail: format!("HTTP {status}"),
                }
            }
            Err(e) => ConnectionStatus {
                reachable: false,
                detail: format!("connection error: {e}"),
            },
        }
    }

    /// Post one document to `/api/documents/post_document/`.
    ///
    /// No retry: a failed request is reported and the caller moves on.
    pub async fn upload(&self, request: &UploadRequest) -> UploadResult {
        let url = format!("{}/api/documents/post_document/", self.base_url);

        let form = match build_form(request) {
            Ok(form) => form,
            Err(e) => {
                return UploadResult::Failed {
                    detail: format!("could not build request: {e}"),
                }
            }
        };

        debug!(
            "POST {} ({} bytes, title {:?})",
            url,
            request.document.len(),
            request.title
        );

        let response = match self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .multipart(form)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Upload of {} failed: {}", request.filename, e);
                return UploadResult::Failed {
                    detail: e.to_string(),
                };
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return UploadResult::Failed {
                detail: format!("HTTP {status}: {}", truncate(body.trim(), MAX_DETAIL_BODY)),
            };
        }

        UploadResult::Uploaded {
            task_id: parse_task_id(&body),
        }
    }

    /// Look up a consumption task by id via `/api/tasks/?task_id=`.
    ///
    /// Returns `Ok(None)` when the server knows no such task.
    pub async fn task_status(
        &self,
        task_id: &str,
    ) -> Result<Option<TaskStatus>, TaskLookupError> {
        let url = format!("{}/api/tasks/", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .query(&[("task_id", task_id)])
            .send()
            .await
            .map_err(|e| TaskLookupError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TaskLookupError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TaskLookupError::Decode(e.to_string()))?;

        // Plain list on current servers, paginated {"results": [...]} on older ones.
        let first = match body {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            Value::Object(mut obj) => match obj.remove("results") {
                Some(Value::Array(mut items)) if !items.is_empty() => items.swap_remove(0),
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };

        serde_json::from_value(first)
            .map(Some)
            .map_err(|e| TaskLookupError::Decode(format!("task record: {e}")))
    }
}

fn build_form(request: &UploadRequest) -> Result<Form, reqwest::Error> {
    let document = Part::bytes(request.document.clone())
        .file_name(request.filename.clone())
        .mime_str("image/jpeg")?;

    let mut form = Form::new()
        .part("document", document)
        .text("title", request.title.clone())
        .text("created", request.created.format("%Y-%m-%d").to_string());

    if let Some(id) = request.document_type {
        form = form.text("document_type", id.to_string());
    }
    if let Some(id) = request.correspondent {
        form = form.text("correspondent", id.to_string());
    }
    for tag in &request.tags {
        form = form.text("tags", tag.to_string());
    }
    Ok(form)
}

/// Extract the task id from a successful upload response body.
///
/// Paperless-NGX answers with a bare JSON string (`"<uuid>"`); an object
/// carrying `task_id` is accepted too, and anything else is returned as-is.
pub fn parse_task_id(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(id)) => id,
        Ok(Value::Object(obj)) => match obj.get("task_id") {
            Some(Value::String(id)) => id.clone(),
            _ => body.trim().to_string(),
        },
        _ => body.trim().to_string(),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{head}\u{2026}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mockito::Matcher;

    fn request() -> UploadRequest {
        UploadRequest {
            document: vec![0xFF, 0xD8, 0xFF, 0xD9],
            filename: "german_handwriting_00001_20240101_120000.jpg".into(),
            title: "German Handwriting: Hallo Welt".into(),
            created: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            document_type: Some(3),
            correspondent: None,
            tags: vec![7, 9],
        }
    }

    #[test]
    fn task_id_from_bare_string() {
        assert_eq!(
            parse_task_id("\"b7c9a6f2-1d0e-4c1b-9f5a-2f4e6d8c0a11\""),
            "b7c9a6f2-1d0e-4c1b-9f5a-2f4e6d8c0a11"
        );
    }

    #[test]
    fn task_id_from_object_or_raw_text() {
        assert_eq!(parse_task_id(r#"{"task_id":"abc"}"#), "abc");
        assert_eq!(parse_task_id("  OK\n"), "OK");
    }

    #[test]
    fn truncate_adds_ellipsis_only_when_needed() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc\u{2026}");
    }

    #[tokio::test]
    async fn check_connection_reports_status() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/api/")
            .match_header("authorization", "Token good")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let denied = server
            .mock("GET", "/api/")
            .match_header("authorization", "Token bad")
            .with_status(401)
            .create_async()
            .await;

        let good = PaperlessClient::new(server.url(), "good", 5).expect("client");
        let status = good.check_connection().await;
        assert!(status.reachable, "{status:?}");

        let bad = PaperlessClient::new(server.url(), "bad", 5).expect("client");
        let status = bad.check_connection().await;
        assert!(!status.reachable);
        assert!(status.detail.contains("401"), "{status:?}");

        ok.assert_async().await;
        denied.assert_async().await;
    }

    #[tokio::test]
    async fn check_connection_transport_error_is_unreachable() {
        let client = PaperlessClient::new("http://127.0.0.1:1", "t", 2).expect("client");
        let status = client.check_connection().await;
        assert!(!status.reachable);
        assert!(status.detail.starts_with("connection error"), "{status:?}");
    }

    #[tokio::test]
    async fn upload_sends_form_fields_and_parses_task_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/documents/post_document/")
            .match_header("authorization", "Token t0k")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=".into()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="document"; filename="german_handwriting_00001_20240101_120000.jpg""#.into()),
                Matcher::Regex("German Handwriting: Hallo Welt".into()),
                Matcher::Regex(r#"name="created"\r\n\r\n2024-01-01"#.into()),
                Matcher::Regex(r#"name="document_type"\r\n\r\n3"#.into()),
                Matcher::Regex(r#"name="tags"\r\n\r\n7"#.into()),
                Matcher::Regex(r#"name="tags"\r\n\r\n9"#.into()),
            ]))
            .with_status(200)
            .with_body("\"task-123\"")
            .create_async()
            .await;

        let client = PaperlessClient::new(server.url(), "t0k", 5).expect("client");
        let result = client.upload(&request()).await;
        assert_eq!(
            result,
            UploadResult::Uploaded {
                task_id: "task-123".into()
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upload_rejection_is_a_failed_result() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/documents/post_document/")
            .with_status(400)
            .with_body("{\"document\":[\"File type not supported\"]}")
            .create_async()
            .await;

        let client = PaperlessClient::new(server.url(), "t", 5).expect("client");
        match client.upload(&request()).await {
            UploadResult::Failed { detail } => {
                assert!(detail.contains("400"), "got: {detail}");
                assert!(detail.contains("File type not supported"), "got: {detail}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn task_status_reads_first_result() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/tasks/")
            .match_query(Matcher::UrlEncoded("task_id".into(), "abc".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"[{"task_id":"abc","status":"SUCCESS","result":"Success. New document id 12 created","related_document":"12"}]"#)
            .create_async()
            .await;
        let _empty = server
            .mock("GET", "/api/tasks/")
            .match_query(Matcher::UrlEncoded("task_id".into(), "nope".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"results":[]}"#)
            .create_async()
            .await;

        let client = PaperlessClient::new(server.url(), "t", 5).expect("client");
        let status = client
            .task_status("abc")
            .await
            .expect("request ok")
            .expect("task present");
        assert_eq!(status.status, "SUCCESS");
        assert!(client.task_status("nope").await.expect("request ok").is_none());
    }

    #[tokio::test]
    async fn task_status_error_status_is_typed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/tasks/")
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let client = PaperlessClient::new(server.url(), "t", 5).expect("client");
        assert_eq!(
            client.task_status("abc").await,
            Err(TaskLookupError::Status(403))
        );
    }
}
