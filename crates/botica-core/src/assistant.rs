//! Hosted assistant protocol: threads, runs, and their event streams.
//!
//! The conversational backend is an external collaborator reached over its
//! thread/run REST protocol with SSE streaming. The session layer only sees
//! the `AssistantClient` trait and the `RunEvent` stream, so the whole
//! protocol, including the scripted client used in tests, sits behind one
//! seam.

use async_stream::try_stream;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::OnceLock;

use crate::core_types::{ToolCall, ToolOutput};
use crate::errors::AssistantError;

/// One event of a streamed run.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// Incremental assistant text for progressive rendering.
    TextDelta(String),
    /// The run is paused until every requested tool call is answered in one
    /// batch; partial submission is not supported upstream.
    RequiresAction {
        run_id: String,
        calls: Vec<ToolCall>,
    },
    Completed,
    Failed(String),
}

pub type RunEventStream = Pin<Box<dyn Stream<Item = Result<RunEvent, AssistantError>> + Send>>;

#[async_trait]
pub trait AssistantClient: Send + Sync {
    async fn create_thread(&self) -> Result<String, AssistantError>;

    async fn add_user_message(&self, thread_id: &str, content: &str)
        -> Result<(), AssistantError>;

    /// Starts a run on the thread and streams its events.
    async fn stream_run(&self, thread_id: &str) -> Result<RunEventStream, AssistantError>;

    /// Submits the full batch of tool outputs for a paused run and resumes
    /// the event stream.
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunEventStream, AssistantError>;

    /// The latest assistant message of the thread, annotation-free and with
    /// markdown emphasis stripped.
    async fn last_message(&self, thread_id: &str) -> Result<String, AssistantError>;
}

fn emphasis_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*|\*(.*?)\*").unwrap())
}

/// Removes bold and italic markdown markers, keeping the content.
pub fn remove_bold_italic(text: &str) -> String {
    text.lines()
        .map(|line| {
            emphasis_re()
                .replace_all(line, |caps: &regex::Captures<'_>| {
                    caps.get(1)
                        .or_else(|| caps.get(2))
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default()
                })
                .into_owned()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One raw SSE message: event name plus data payload.
#[derive(Debug, Clone, PartialEq)]
struct SseMessage {
    event: String,
    data: String,
}

/// Parses an SSE byte stream into (event, data) messages. Buffers chunks,
/// splits on newlines, and pairs `event:` lines with their `data:` payloads.
fn parse_sse_stream(
    byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
) -> impl Stream<Item = Result<SseMessage, AssistantError>> + Send {
    try_stream! {
        futures_util::pin_mut!(byte_stream);
        let mut buffer = Vec::new();
        let mut event = String::new();

        while let Some(chunk_result) = byte_stream.next().await {
            let chunk: Bytes = chunk_result?;
            buffer.extend_from_slice(&chunk);

            while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                let line_bytes = buffer.drain(..=newline_pos).collect::<Vec<u8>>();
                let line = std::str::from_utf8(&line_bytes)
                    .map_err(|e| AssistantError::ParsingError(e.to_string()))?
                    .trim_end_matches(['\n', '\r']);

                if let Some(name) = line.strip_prefix("event:") {
                    event = name.trim().to_string();
                } else if let Some(data) = line.strip_prefix("data:") {
                    let data = data.trim_start();
                    if !data.is_empty() && data != "[DONE]" {
                        yield SseMessage {
                            event: event.clone(),
                            data: data.to_string(),
                        };
                    }
                }
            }
        }
    }
}

/// Maps one SSE message onto a run event; protocol events the session does
/// not care about map to `None`.
fn run_event_from_sse(message: &SseMessage) -> Result<Option<RunEvent>, AssistantError> {
    match message.event.as_str() {
        "thread.message.delta" => {
            let data: Value = serde_json::from_str(&message.data)?;
            let mut text = String::new();
            if let Some(parts) = data
                .pointer("/delta/content")
                .and_then(|c| c.as_array())
            {
                for part in parts {
                    if let Some(value) = part.pointer("/text/value").and_then(|v| v.as_str()) {
                        text.push_str(value);
                    }
                }
            }
            if text.is_empty() {
                Ok(None)
            } else {
                Ok(Some(RunEvent::TextDelta(text)))
            }
        }
        "thread.run.requires_action" => {
            let data: Value = serde_json::from_str(&message.data)?;
            let run_id = data
                .get("id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    AssistantError::ParsingError("requires_action event without run id".to_string())
                })?
                .to_string();
            let mut calls = Vec::new();
            if let Some(raw_calls) = data
                .pointer("/required_action/submit_tool_outputs/tool_calls")
                .and_then(|c| c.as_array())
            {
                for raw in raw_calls {
                    let id = raw.get("id").and_then(|v| v.as_str()).unwrap_or_default();
                    let name = raw
                        .pointer("/function/name")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    let arguments = raw
                        .pointer("/function/arguments")
                        .and_then(|v| v.as_str())
                        .map(|s| {
                            serde_json::from_str(s)
                                .unwrap_or(Value::Object(serde_json::Map::new()))
                        })
                        .unwrap_or(Value::Object(serde_json::Map::new()));
                    calls.push(ToolCall {
                        id: id.to_string(),
                        name: name.to_string(),
                        arguments,
                    });
                }
            }
            Ok(Some(RunEvent::RequiresAction { run_id, calls }))
        }
        "thread.run.completed" => Ok(Some(RunEvent::Completed)),
        "thread.run.failed" | "thread.run.expired" | "thread.run.cancelled" => {
            let data: Value = serde_json::from_str(&message.data).unwrap_or(Value::Null);
            let reason = data
                .pointer("/last_error/message")
                .and_then(|v| v.as_str())
                .unwrap_or("run did not complete")
                .to_string();
            Ok(Some(RunEvent::Failed(reason)))
        }
        _ => Ok(None),
    }
}

fn into_run_events(
    byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
) -> RunEventStream {
    let stream = try_stream! {
        let sse = parse_sse_stream(byte_stream);
        futures_util::pin_mut!(sse);
        while let Some(message) = sse.next().await {
            let message = message?;
            if let Some(event) = run_event_from_sse(&message)? {
                yield event;
            }
        }
    };
    Box::pin(stream)
}

/// REST implementation against the hosted assistant v2 protocol.
pub struct HttpAssistantClient {
    client: Client,
    api_base: String,
    api_key: String,
    assistant_id: String,
}

impl HttpAssistantClient {
    pub fn new(api_base: &str, api_key: &str, assistant_id: &str) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            assistant_id: assistant_id.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_base, path))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value, AssistantError> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AssistantError::AssistantApi(format!(
                "{} failed with status {}: {}",
                path, status, text
            )));
        }
        Ok(response.json().await?)
    }

    async fn stream_request(&self, path: &str, body: Value) -> Result<RunEventStream, AssistantError> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AssistantError::AssistantApi(format!(
                "{} failed with status {}: {}",
                path, status, text
            )));
        }
        Ok(into_run_events(response.bytes_stream()))
    }
}

#[async_trait]
impl AssistantClient for HttpAssistantClient {
    async fn create_thread(&self) -> Result<String, AssistantError> {
        let response = self.post_json("/threads", Value::Object(Default::default())).await?;
        response
            .get("id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| AssistantError::ParsingError("thread response without id".to_string()))
    }

    async fn add_user_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<(), AssistantError> {
        let path = format!("/threads/{}/messages", thread_id);
        self.post_json(
            &path,
            serde_json::json!({ "role": "user", "content": content }),
        )
        .await?;
        Ok(())
    }

    async fn stream_run(&self, thread_id: &str) -> Result<RunEventStream, AssistantError> {
        let path = format!("/threads/{}/runs", thread_id);
        self.stream_request(
            &path,
            serde_json::json!({ "assistant_id": self.assistant_id, "stream": true }),
        )
        .await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunEventStream, AssistantError> {
        let path = format!(
            "/threads/{}/runs/{}/submit_tool_outputs",
            thread_id, run_id
        );
        self.stream_request(
            &path,
            serde_json::json!({ "tool_outputs": outputs, "stream": true }),
        )
        .await
    }

    async fn last_message(&self, thread_id: &str) -> Result<String, AssistantError> {
        let path = format!("/threads/{}/messages?limit=1", thread_id);
        let response = self.request(reqwest::Method::GET, &path).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(AssistantError::AssistantApi(format!(
                "messages.list failed with status {}",
                status
            )));
        }
        let body: Value = response.json().await?;
        let Some(content) = body.pointer("/data/0/content/0/text") else {
            log::warn!("Thread {} has no messages", thread_id);
            return Ok(String::new());
        };
        let mut value = content
            .get("value")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        if let Some(annotations) = content.get("annotations").and_then(|a| a.as_array()) {
            for annotation in annotations {
                if let Some(text) = annotation.get("text").and_then(|t| t.as_str()) {
                    value = value.replace(text, "");
                }
            }
        }
        Ok(remove_bold_italic(&value))
    }
}

/// Scripted client for tests: serves pre-baked event sequences and records
/// everything submitted to it.
pub struct ScriptedAssistantClient {
    streams: Mutex<VecDeque<Vec<RunEvent>>>,
    submitted: Mutex<Vec<Vec<ToolOutput>>>,
    messages: Mutex<Vec<String>>,
    final_message: String,
}

impl ScriptedAssistantClient {
    pub fn new(streams: Vec<Vec<RunEvent>>, final_message: &str) -> Self {
        Self {
            streams: Mutex::new(streams.into()),
            submitted: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            final_message: final_message.to_string(),
        }
    }

    pub fn submitted_batches(&self) -> Vec<Vec<ToolOutput>> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn user_messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    fn next_stream(&self) -> RunEventStream {
        let events = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| vec![RunEvent::Completed]);
        Box::pin(futures_util::stream::iter(
            events.into_iter().map(Ok::<RunEvent, AssistantError>),
        ))
    }
}

#[async_trait]
impl AssistantClient for ScriptedAssistantClient {
    async fn create_thread(&self) -> Result<String, AssistantError> {
        Ok("thread_test".to_string())
    }

    async fn add_user_message(
        &self,
        _thread_id: &str,
        content: &str,
    ) -> Result<(), AssistantError> {
        self.messages.lock().unwrap().push(content.to_string());
        Ok(())
    }

    async fn stream_run(&self, _thread_id: &str) -> Result<RunEventStream, AssistantError> {
        Ok(self.next_stream())
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        _run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunEventStream, AssistantError> {
        self.submitted.lock().unwrap().push(outputs);
        Ok(self.next_stream())
    }

    async fn last_message(&self, _thread_id: &str) -> Result<String, AssistantError> {
        Ok(self.final_message.clone())
    }
}
