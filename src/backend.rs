// readmegen/src/backend.rs
//! Generation backends. Both take the assembled prompt and return text.
//!
//! - `OllamaBackend`: local HTTP endpoint, `POST {url}/api/generate`
//! - `GeminiBackend`: cloud API, `POST {base}/v1beta/models/{model}:generateContent?key=…`
//!
//! One shared `ureq` agent with fixed timeouts; bodies are read under a byte
//! limit. No retries: a failed call is reported to the user as is.

use serde::{
    Deserialize,
    Serialize
};
use std::{
    io::Read,
    sync::OnceLock,
    time::Duration,
};
use thiserror::Error;
use tracing::{
    debug,
    info
};
use crate::config::{
    BackendKind,
    Settings
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
// Local models can take minutes on a large prompt.
const READ_TIMEOUT: Duration = Duration::from_secs(300);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;
const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no API key configured for {0} (set GEMINI_API_KEY or gemini_api_key)")]
    MissingApiKey(&'static str),
    #[error("{backend} returned HTTP {code}: {body}")]
    Status { backend: &'static str, code: u16, body: String },
    #[error("{backend} request failed: {message}")]
    Transport { backend: &'static str, message: String },
    #[error("{backend} sent a malformed response: {message}")]
    Malformed { backend: &'static str, message: String },
    #[error("{0} returned no text")]
    Empty(&'static str),
}

/// Anything that turns a prompt into generated text.
pub trait TextGenerator {
    fn name(&self) -> &'static str;
    fn model(&self) -> &str;
    fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}

/// Build the backend selected in `settings`.
pub fn from_settings(settings: &Settings) -> Result<Box<dyn TextGenerator>, BackendError> {
    Ok(match settings.backend {
        BackendKind::Ollama => Box::new(OllamaBackend::new(&settings.ollama_url, &settings.ollama_model)),
        BackendKind::Gemini => {
            let key = settings
                .gemini_api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .ok_or(BackendError::MissingApiKey("gemini"))?;
            Box::new(GeminiBackend::new(GEMINI_BASE_URL, &settings.gemini_model, key))
        }
    })
}

/* ================================ Ollama ================================ */

#[derive(Clone, Debug)]
pub struct OllamaBackend {
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

impl OllamaBackend {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

impl TextGenerator for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let url = format!("{}/api/generate", self.base_url);
        info!(backend = self.name(), model = %self.model, prompt_bytes = prompt.len(), "requesting generation");
        let body = OllamaRequest { model: &self.model, prompt, stream: false };
        let raw = post_json(self.name(), &url, &body)?;
        let parsed: OllamaResponse = serde_json::from_str(&raw)
            .map_err(|e| BackendError::Malformed { backend: self.name(), message: e.to_string() })?;
        non_empty(self.name(), parsed.response)
    }
}

/* ================================ Gemini ================================ */

#[derive(Clone, Debug)]
pub struct GeminiBackend {
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContentOut<'a>>,
}

#[derive(Serialize)]
struct GeminiContentOut<'a> {
    parts: Vec<GeminiPartOut<'a>>,
}

#[derive(Serialize)]
struct GeminiPartOut<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize, Default)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContentIn,
}

#[derive(Deserialize, Default)]
struct GeminiContentIn {
    #[serde(default)]
    parts: Vec<GeminiPartIn>,
}

#[derive(Deserialize, Default)]
struct GeminiPartIn {
    #[serde(default)]
    text: String,
}

impl GeminiBackend {
    pub fn new(base_url: &str, model: &str, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }
}

impl TextGenerator for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let endpoint = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        info!(backend = self.name(), model = %self.model, prompt_bytes = prompt.len(), "requesting generation");
        let url = format!("{endpoint}?key={}", self.api_key.trim());
        let body = GeminiRequest {
            contents: vec![GeminiContentOut { parts: vec![GeminiPartOut { text: prompt }] }],
        };
        let raw = post_json(self.name(), &url, &body)?;
        let parsed: GeminiResponse = serde_json::from_str(&raw)
            .map_err(|e| BackendError::Malformed { backend: self.name(), message: e.to_string() })?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();
        non_empty(self.name(), text)
    }
}

/* ----------------------------- helpers ----------------------------- */

fn agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .timeout_write(WRITE_TIMEOUT)
            .build()
    })
}

fn post_json<T: Serialize>(backend: &'static str, url: &str, body: &T) -> Result<String, BackendError> {
    let req = agent()
        .post(url)
        .set("Accept", "application/json")
        .set("Content-Type", "application/json");
    let response = match req.send_json(body) {
        Ok(r) => r,
        Err(ureq::Error::Status(code, r)) => {
            let body = read_limited(r, MAX_ERROR_BODY_BYTES).unwrap_or_else(|e| e);
            return Err(BackendError::Status { backend, code, body });
        }
        Err(ureq::Error::Transport(t)) => {
            return Err(BackendError::Transport { backend, message: t.to_string() });
        }
    };
    debug!(backend, status = response.status(), "response received");
    read_limited(response, MAX_RESPONSE_BYTES).map_err(|message| BackendError::Malformed { backend, message })
}

fn read_limited(response: ureq::Response, max_bytes: usize) -> Result<String, String> {
    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(max_bytes as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| e.to_string())?;
    if bytes.len() > max_bytes {
        return Err(format!("response exceeded {max_bytes} bytes"));
    }
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

fn non_empty(backend: &'static str, text: String) -> Result<String, BackendError> {
    if text.trim().is_empty() {
        Err(BackendError::Empty(backend))
    } else {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::Write,
        net::TcpListener,
        sync::mpsc,
        thread,
    };

    /// Serve one canned response; the raw request comes back on the channel.
    fn serve_once(status: &str, body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut req = Vec::new();
                let mut buf = [0u8; 4096];
                // read headers, then the declared body
                loop {
                    let n = stream.read(&mut buf).unwrap_or(0);
                    if n == 0 { break; }
                    req.extend_from_slice(&buf[..n]);
                    let text = String::from_utf8_lossy(&req).to_string();
                    if let Some(end) = text.find("\r\n\r\n") {
                        let len = text[..end]
                            .lines()
                            .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().to_string()))
                            .and_then(|v| v.parse::<usize>().ok())
                            .unwrap_or(0);
                        if req.len() >= end + 4 + len { break; }
                    }
                }
                let _ = stream.write_all(response.as_bytes());
                let _ = tx.send(String::from_utf8_lossy(&req).to_string());
            }
        });
        (format!("http://{addr}"), rx)
    }

    #[test]
    fn ollama_posts_model_prompt_and_reads_response() {
        let (url, rx) = serve_once("200 OK", r##"{"model":"llama3","response":"# Demo\n","done":true}"##);
        let backend = OllamaBackend::new(&format!("{url}/"), "llama3");
        let text = backend.generate("describe").unwrap();
        assert_eq!(text, "# Demo\n");
        let req = rx.recv().unwrap();
        assert!(req.starts_with("POST /api/generate "));
        assert!(req.contains(r#""model":"llama3""#));
        assert!(req.contains(r#""prompt":"describe""#));
        assert!(req.contains(r#""stream":false"#));
    }

    #[test]
    fn gemini_posts_contents_and_joins_parts() {
        let body = r##"{"candidates":[{"content":{"parts":[{"text":"# A"},{"text":"\nB"}]}}]}"##;
        let (url, rx) = serve_once("200 OK", body);
        let backend = GeminiBackend::new(&url, "gemini-1.5-flash", "k3y".into());
        assert_eq!(backend.generate("hi").unwrap(), "# A\nB");
        let req = rx.recv().unwrap();
        assert!(req.starts_with("POST /v1beta/models/gemini-1.5-flash:generateContent?key=k3y "));
        assert!(req.contains(r#"{"contents":[{"parts":[{"text":"hi"}]}]}"#));
    }

    #[test]
    fn http_errors_carry_status_and_body() {
        let (url, _rx) = serve_once("403 Forbidden", r#"{"error":"bad key"}"#);
        let backend = GeminiBackend::new(&url, "m", "k".into());
        match backend.generate("x") {
            Err(BackendError::Status { code, body, .. }) => {
                assert_eq!(code, 403);
                assert!(body.contains("bad key"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_and_malformed_responses_are_errors() {
        let (url, _rx) = serve_once("200 OK", r#"{"candidates":[]}"#);
        let backend = GeminiBackend::new(&url, "m", "k".into());
        assert!(matches!(backend.generate("x"), Err(BackendError::Empty("gemini"))));

        let (url, _rx) = serve_once("200 OK", "not json");
        let backend = OllamaBackend::new(&url, "m");
        assert!(matches!(backend.generate("x"), Err(BackendError::Malformed { .. })));
    }

    #[test]
    fn gemini_requires_a_key() {
        let settings = Settings { backend: BackendKind::Gemini, ..Default::default() };
        assert!(matches!(from_settings(&settings), Err(BackendError::MissingApiKey(_))));

        let settings = Settings { backend: BackendKind::Gemini, gemini_api_key: Some("k".into()), ..Default::default() };
        let b = from_settings(&settings).unwrap();
        assert_eq!(b.name(), "gemini");
        assert_eq!(b.model(), "gemini-1.5-flash");
    }

    #[test]
    fn ollama_is_the_default_backend() {
        let b = from_settings(&Settings::default()).unwrap();
        assert_eq!(b.name(), "ollama");
        assert_eq!(b.model(), "llama3");
    }
}
