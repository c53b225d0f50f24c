use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::reqwest_error::Error as ReqwestError;
use super::{Answer, AnswerGateway, ErrorKind};
use crate::gateway;

pub(crate) const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub(crate) const DEFAULT_ASK_PATH: &str = "/api/ask";
pub(crate) const DEFAULT_HEALTH_PATH: &str = "/health";

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("invalid api base: {0}")]
    InvalidApiBase(#[source] url::ParseError),

    #[error("api base \"{0}\" cannot have paths appended to it")]
    NotABase(String),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("a request to the answering service failed: {0}")]
    RequestFailed(#[from] ReqwestError),

    #[error("the answering service responded with {0}")]
    Status(StatusCode),

    #[error("could not decode the response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<Error> for gateway::Error {
    fn from(value: Error) -> Self {
        let kind = match &value {
            Error::InvalidApiBase(_) | Error::NotABase(_) | Error::InvalidEndpoint(_) => {
                ErrorKind::InvalidEndpoint
            }
            Error::RequestFailed(err) => err.gateway_kind(),
            Error::Status(_) => ErrorKind::Status,
            Error::Decode(_) => ErrorKind::UnexpectedResponse,
        };

        gateway::Error::from_source(kind, Box::new(value))
    }
}

/* === IO === */

// Structures to serialize the ask endpoint
#[derive(Serialize, Debug)]
struct AskRequest<'q> {
    question: &'q str,
}

// Structures to deserialize the ask endpoint
#[derive(Deserialize, Debug)]
struct AskResponse {
    answer: String,
    #[serde(default)]
    context: Option<Vec<String>>,
}

/// The body returned by the health endpoint.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct Health {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Joins `path` below `base`, keeping any path prefix that `base` carries.
fn endpoint(base: &Url, path: &str) -> Result<Url, Error> {
    let mut base = base.clone();

    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }

    Ok(base.join(path.trim_start_matches('/'))?)
}

/// An [`AnswerGateway`] reached over HTTP.
pub(crate) struct HttpGateway {
    client: Client,
    ask_url: Url,
    health_url: Url,
}

impl HttpGateway {
    pub(crate) fn with_endpoints(
        api_base: &str,
        ask_path: &str,
        health_path: &str,
    ) -> Result<HttpGateway, Error> {
        let base = Url::parse(api_base).map_err(Error::InvalidApiBase)?;

        if base.cannot_be_a_base() {
            return Err(Error::NotABase(api_base.to_string()));
        }

        Ok(HttpGateway {
            client: Client::new(),
            ask_url: endpoint(&base, ask_path)?,
            health_url: endpoint(&base, health_path)?,
        })
    }

    pub(crate) fn ask_url(&self) -> &Url {
        &self.ask_url
    }

    pub(crate) fn health_url(&self) -> &Url {
        &self.health_url
    }

    async fn read_json<T: serde::de::DeserializeOwned>(res: reqwest::Response) -> Result<T, Error> {
        let status = res.status();

        if !status.is_success() {
            return Err(Error::Status(status));
        }

        let body = res.text().await.map_err(ReqwestError::reading_body)?;

        Ok(serde_json::from_str(&body)?)
    }

    async fn post_question(&self, question: &str) -> Result<AskResponse, Error> {
        let res = self
            .client
            .post(self.ask_url.clone())
            .json(&AskRequest { question })
            .send()
            .await
            .map_err(ReqwestError::sending)?;

        Self::read_json(res).await
    }

    /// Probes the health endpoint of the service.
    pub(crate) async fn health(&self) -> Result<Health, gateway::Error> {
        let res = self
            .client
            .get(self.health_url.clone())
            .send()
            .await
            .map_err(|e| Error::from(ReqwestError::sending(e)))?;

        Ok(Self::read_json(res).await?)
    }
}

#[async_trait]
impl AnswerGateway for HttpGateway {
    async fn ask(&self, question: &str) -> Result<Answer, gateway::Error> {
        debug!(url = %self.ask_url, "posting question");

        let res = self.post_question(question).await?;

        debug!(
            sources = res.context.as_ref().map_or(0, |c| c.len()),
            "received answer"
        );

        Ok(Answer {
            text: res.answer,
            context: res.context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
    }

    fn content_length(head: &str) -> usize {
        head.lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Serves exactly one canned response and hands back the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];

            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);

                if let Some(end) = header_end(&buf) {
                    let head = String::from_utf8_lossy(&buf[..end]).to_string();
                    if buf.len() >= end + content_length(&head) {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );

            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8_lossy(&buf).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn gateway(base: &str) -> HttpGateway {
        HttpGateway::with_endpoints(base, DEFAULT_ASK_PATH, DEFAULT_HEALTH_PATH).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_prefix() {
        let gw = HttpGateway::with_endpoints("http://portal.test/chat", "/api/ask", "health").unwrap();

        assert_eq!(gw.ask_url().as_str(), "http://portal.test/chat/api/ask");
        assert_eq!(gw.health_url().as_str(), "http://portal.test/chat/health");

        let gw = gateway(DEFAULT_API_BASE);
        assert_eq!(gw.ask_url().as_str(), "http://localhost:8000/api/ask");
    }

    #[test]
    fn test_rejects_bad_api_base() {
        assert!(matches!(
            HttpGateway::with_endpoints("not a url", "/api/ask", "/health"),
            Err(Error::InvalidApiBase(_))
        ));

        assert!(matches!(
            HttpGateway::with_endpoints("mailto:someone@example.com", "/api/ask", "/health"),
            Err(Error::NotABase(_))
        ));
    }

    #[tokio::test]
    async fn test_ask_success() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"answer":"Riyadh is the capital.","context":["S1","S2"]}"#,
        )
        .await;

        let answer = gateway(&base).ask("What is the capital?").await.unwrap();

        assert_eq!(answer.text, "Riyadh is the capital.");
        assert_eq!(
            answer.context,
            Some(vec!["S1".to_string(), "S2".to_string()])
        );

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/ask "));
        assert!(request.ends_with(r#"{"question":"What is the capital?"}"#));
    }

    #[tokio::test]
    async fn test_ask_without_context() {
        let (base, _server) = serve_once("200 OK", r#"{"answer":"A","context":null}"#).await;

        let answer = gateway(&base).ask("Q").await.unwrap();

        assert_eq!(answer.text, "A");
        assert!(answer.context.is_none());
    }

    #[tokio::test]
    async fn test_ask_malformed_body() {
        let (base, _server) = serve_once("200 OK", "<html>oops</html>").await;

        let err = gateway(&base).ask("Q").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnexpectedResponse);
    }

    #[tokio::test]
    async fn test_ask_missing_answer_field() {
        let (base, _server) = serve_once("200 OK", r#"{"context":["S1"]}"#).await;

        let err = gateway(&base).ask("Q").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnexpectedResponse);
    }

    #[tokio::test]
    async fn test_ask_error_status() {
        let (base, _server) = serve_once(
            "500 Internal Server Error",
            r#"{"error":"Internal error: boom"}"#,
        )
        .await;

        let err = gateway(&base).ask("Q").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Status);
    }

    #[tokio::test]
    async fn test_ask_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = gateway(&format!("http://{}", addr))
            .ask("Q")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[tokio::test]
    async fn test_health() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"status":"healthy","service":"datasaudi-chatbot-minimal"}"#,
        )
        .await;

        let health = gateway(&base).health().await.unwrap();

        assert_eq!(health.status, "healthy");
        assert_eq!(health.service.as_deref(), Some("datasaudi-chatbot-minimal"));
        assert!(health.message.is_none());

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /health "));
    }
}
