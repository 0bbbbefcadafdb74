//! Testing utilities including scripted engines and canned actions.
//!
//! These let applications exercise the orchestration loop and the pipeline
//! without making real model or network calls.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::EngineError;
use crate::schema::Record;
use crate::traits::{
    action::Capability,
    engine::{EngineReply, EngineRequest, ReasoningEngine},
};

/// An engine that replays a fixed script of replies.
///
/// Once the script runs out every further call fails with an API error.
#[derive(Default)]
pub struct ScriptedEngine {
    replies: Mutex<VecDeque<EngineReply>>,
    transcript_lengths: Arc<Mutex<Vec<usize>>>,
    tasks: Arc<Mutex<Vec<String>>>,
}

impl ScriptedEngine {
    pub fn new(replies: Vec<EngineReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    /// Transcript length shown to the engine on each call.
    pub fn seen_transcript_lengths(&self) -> Arc<Mutex<Vec<usize>>> {
        self.transcript_lengths.clone()
    }

    /// Task text shown to the engine on each call.
    pub fn seen_tasks(&self) -> Arc<Mutex<Vec<String>>> {
        self.tasks.clone()
    }
}

#[async_trait]
impl ReasoningEngine for ScriptedEngine {
    async fn next_step(&self, request: &EngineRequest<'_>) -> Result<EngineReply, EngineError> {
        self.transcript_lengths
            .lock()
            .unwrap()
            .push(request.transcript.len());
        self.tasks.lock().unwrap().push(request.task.to_string());

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| EngineError::Api("scripted engine has no replies left".into()))
    }
}

/// An engine that never finishes: every call requests the same action.
pub struct LoopingEngine {
    action: String,
    argument: String,
    calls: Arc<Mutex<usize>>,
}

impl LoopingEngine {
    pub fn new(action: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            argument: argument.into(),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> Arc<Mutex<usize>> {
        self.calls.clone()
    }
}

#[async_trait]
impl ReasoningEngine for LoopingEngine {
    async fn next_step(&self, _request: &EngineRequest<'_>) -> Result<EngineReply, EngineError> {
        *self.calls.lock().unwrap() += 1;
        Ok(EngineReply::action(&self.action, &self.argument))
    }
}

/// An action that always returns the same text and records its arguments.
pub struct StaticAction {
    reply: String,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StaticAction {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Arguments received so far, in call order.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl Capability for StaticAction {
    async fn invoke(&self, argument: &str) -> String {
        self.calls.lock().unwrap().push(argument.to_string());
        self.reply.clone()
    }
}

/// A well-formed record for tests.
pub fn sample_record(identifier: &str, popularity: u64) -> Record {
    Record {
        identifier: identifier.to_string(),
        url: format!("https://github.com/{}", identifier),
        summary: format!("{} does something useful.", identifier),
        popularity,
        primary_language: "Rust".to_string(),
        rationale: "Matches the topic.".to_string(),
    }
}

/// Serve one canned HTTP response on a local port and return its base URL.
///
/// The connection is closed after the response; a second request fails.
pub async fn serve_http_once(
    status_line: &'static str,
    content_type: &'static str,
    body: String,
) -> String {
    use tokio::io::AsyncWriteExt;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local test listener");
    let addr = listener.local_addr().expect("local test listener address");

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        read_request(&mut socket).await;
        let response = format!(
            "{}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            content_type,
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    format!("http://{}", addr)
}

/// Drain one request (headers plus `Content-Length` body) from the socket.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    use tokio::io::AsyncReadExt;

    let mut received = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let Ok(n) = socket.read(&mut chunk).await else {
            return;
        };
        if n == 0 {
            return;
        }
        received.extend_from_slice(&chunk[..n]);

        let Some(header_end) = received.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&received[..header_end]).to_ascii_lowercase();
        let body_len = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        if received.len() >= header_end + 4 + body_len {
            return;
        }
    }
}

/// Accept connections on a local port and never answer them.
///
/// Returns the base URL; accepted sockets stay open until the test ends.
pub async fn serve_silently() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local test listener");
    let addr = listener.local_addr().expect("local test listener address");

    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });

    format!("http://{}", addr)
}
