//! HTTP adapter for the answer service.
//!
//! `POST {base}/ask` with `{"question": ..}`; a 2xx reply carries `{"answer": ..}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use qarelay_core::{config::Config, errors::Error, ports::AnswerService, Result};

#[derive(Debug, Serialize)]
struct AnswerRequest<'a> {
    question: &'a str,
}

#[derive(Clone, Debug)]
pub struct HttpAnswerService {
    ask_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl HttpAnswerService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            ask_url: format!("{}/ask", base_url.trim_end_matches('/')),
            timeout,
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.answer_service_url, cfg.answer_timeout)
    }

    pub fn ask_url(&self) -> &str {
        &self.ask_url
    }

    fn map_send_err(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Transport(format!(
                "answer service timed out after {}ms",
                self.timeout.as_millis()
            ))
        } else {
            Error::Transport(format!("answer service request error: {e}"))
        }
    }
}

#[async_trait]
impl AnswerService for HttpAnswerService {
    async fn ask(&self, question: &str) -> Result<Option<String>> {
        let resp = self
            .http
            .post(&self.ask_url)
            .json(&AnswerRequest { question })
            .send()
            .await
            .map_err(|e| self.map_send_err(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body = resp.text().await.map_err(|e| self.map_send_err(e))?;
        debug!(status = status.as_u16(), len = body.len(), "answer service replied");
        parse_answer(&body)
    }
}

/// Extract the `answer` field from a 2xx body.
///
/// Absent answers and falsy scalars (`null`, `false`, `0`) are `Ok(None)`. A body that is not
/// JSON, a top-level `null`, or any other non-string answer is malformed.
pub fn parse_answer(body: &str) -> Result<Option<String>> {
    let v: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("answer body is not json: {e}")))?;

    if v.is_null() {
        return Err(Error::MalformedResponse("answer body is null".to_string()));
    }

    match v.get("answer") {
        None => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
        Some(v) if is_falsy_scalar(v) => Ok(None),
        Some(other) => Err(Error::MalformedResponse(format!(
            "answer field is not a string: {other}"
        ))),
    }
}

fn is_falsy_scalar(v: &serde_json::Value) -> bool {
    match v {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}
