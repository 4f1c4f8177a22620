use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::ScanError;
use crate::retry::RetryPolicy;

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct VisionClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl VisionClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Ask a question about an image given as a `data:` URL.
    pub async fn ask_about_image(
        &self,
        model: &str,
        prompt: &str,
        image_data_url: String,
        temperature: f32,
    ) -> Result<String, ScanError> {
        let content = MessageContent::Parts(vec![
            ContentPart::Text {
                text: prompt.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: image_data_url },
            },
        ]);
        self.complete(model, content, temperature).await
    }

    pub async fn ask(&self, model: &str, prompt: &str, temperature: f32) -> Result<String, ScanError> {
        self.complete(model, MessageContent::Text(prompt.to_string()), temperature)
            .await
    }

    async fn complete(
        &self,
        model: &str,
        content: MessageContent,
        temperature: f32,
    ) -> Result<String, ScanError> {
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            temperature,
            top_p: 1.0,
            stream: false,
        };

        self.retry
            .retry("chat_completion", || self.send(&request), ScanError::is_transient)
            .await
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<String, ScanError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ScanError::Status(response.status()));
        }

        let chat: ChatResponse = response.json().await?;
        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ScanError::EmptyResponse)?;

        debug!(model = request.model, chars = text.len(), "Vision response received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_image_request_shape() {
        let request = ChatRequest {
            model: "vision",
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text { text: "What is this?".into() },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: "data:image/png;base64,AA==".into() },
                    },
                ]),
            }],
            temperature: 0.5,
            top_p: 1.0,
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            json["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/png;base64,AA=="
        );
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_text_request_shape() {
        let message = ChatMessage {
            role: "user",
            content: MessageContent::Text("Summarise".into()),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "Summarise"}));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = VisionClient::new(
            "https://api.example.test/v1/".into(),
            "key".into(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://api.example.test/v1");
    }

    /// Serves every request with `status` and counts how many arrived.
    async fn fixed_status_server(status: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut request = Vec::new();
                let mut buf = [0u8; 4096];
                loop {
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                    if request_complete(&request) {
                        break;
                    }
                }
                let body = r#"{"error":"rejected"}"#;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}"), hits)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let (base_url, hits) = fixed_status_server("401 Unauthorized").await;
        let client = VisionClient::new(base_url, "bad-key".into(), Duration::from_secs(5))
            .unwrap()
            .with_retry(RetryPolicy::new(2, 1, 1));

        let result = client.ask("text-model", "Summarise", 0.3).await;

        assert!(matches!(result, Err(ScanError::Status(s)) if s == reqwest::StatusCode::UNAUTHORIZED));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_retried() {
        let (base_url, hits) = fixed_status_server("503 Service Unavailable").await;
        let client = VisionClient::new(base_url, "key".into(), Duration::from_secs(5))
            .unwrap()
            .with_retry(RetryPolicy::new(2, 1, 1));

        let result = client.ask("text-model", "Summarise", 0.3).await;

        assert!(matches!(result, Err(ScanError::Status(s)) if s.is_server_error()));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_transient_classification() {
        use reqwest::StatusCode;

        assert!(ScanError::Status(StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(ScanError::Status(StatusCode::BAD_GATEWAY).is_transient());
        assert!(!ScanError::Status(StatusCode::UNAUTHORIZED).is_transient());
        assert!(!ScanError::Status(StatusCode::BAD_REQUEST).is_transient());
        assert!(!ScanError::EmptyResponse.is_transient());
    }
}
