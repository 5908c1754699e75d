//! Chat session orchestration.
//!
//! One `ChatSession` is an explicit per-session context object: the thread
//! id, the append-only turn log, the export buffer and the idle clock all
//! live here and are passed to every handler. The orchestrator drives the
//! run state machine: a user turn streams events until the run completes,
//! and whenever the assistant pauses for tool calls the whole batch is
//! executed and submitted at once; the upstream protocol does not accept
//! partial submissions.

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::assistant::{AssistantClient, RunEvent};
use crate::core_types::{ConversationTurn, ToolOutput};
use crate::errors::AssistantError;
use crate::export::LogExporter;
use crate::tools::ToolRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    New,
    AwaitingInput,
    StreamingResponse,
    ToolRequired,
}

pub struct ChatSession {
    pub id: Uuid,
    pub thread_id: String,
    pub state: SessionState,
    /// Append-only; a failed turn never rolls back recorded turns.
    pub turns: Vec<ConversationTurn>,
    export_buffer: Vec<String>,
    pub last_active: DateTime<Utc>,
    pending_export: bool,
}

impl ChatSession {
    fn new(thread_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            thread_id,
            state: SessionState::New,
            turns: Vec::new(),
            export_buffer: Vec::new(),
            last_active: Utc::now(),
            pending_export: false,
        }
    }

    fn record(&mut self, turn: ConversationTurn) {
        let role = match turn.role {
            crate::core_types::Role::User => "USER",
            crate::core_types::Role::Assistant => "ASSISTANT",
        };
        log::info!("[id:{}] {}: {}", self.id, role, turn.content);
        self.export_buffer.push(format!("[id:{}] {}: {}", self.id, role, turn.content));
        self.turns.push(turn);
    }

    #[cfg(test)]
    pub fn backdate_last_active(&mut self, by: chrono::Duration) {
        self.last_active -= by;
    }
}

pub struct Orchestrator {
    client: Arc<dyn AssistantClient>,
    tools: Arc<ToolRegistry>,
    exporter: Arc<dyn LogExporter>,
    idle_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn AssistantClient>,
        tools: Arc<ToolRegistry>,
        exporter: Arc<dyn LogExporter>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            client,
            tools,
            exporter,
            idle_timeout,
        }
    }

    /// Opens a thread and returns the fresh session with the configured
    /// greeting recorded.
    pub async fn start_session(&self, greeting: &str) -> Result<ChatSession, AssistantError> {
        let thread_id = self.client.create_thread().await?;
        let mut session = ChatSession::new(thread_id);
        log::info!("[id:{}] ## Inicio de la conversación ##", session.id);
        session.record(ConversationTurn::assistant(greeting));
        session.state = SessionState::AwaitingInput;
        Ok(session)
    }

    /// Runs one user turn to completion. Text deltas are handed to
    /// `on_delta` as they arrive for progressive rendering; the returned
    /// string is the final assistant message.
    pub async fn user_turn(
        &self,
        session: &mut ChatSession,
        input: &str,
        mut on_delta: impl FnMut(&str),
    ) -> Result<String, AssistantError> {
        session.record(ConversationTurn::user(input));
        session.pending_export = true;

        self.client
            .add_user_message(&session.thread_id, input)
            .await?;

        session.state = SessionState::StreamingResponse;
        let mut stream = self.client.stream_run(&session.thread_id).await?;
        let mut streamed_text = String::new();

        loop {
            let Some(event) = stream.next().await else {
                // Stream ended without a terminal event; the run is over.
                break;
            };
            match event? {
                RunEvent::TextDelta(delta) => {
                    on_delta(&delta);
                    streamed_text.push_str(&delta);
                }
                RunEvent::RequiresAction { run_id, calls } => {
                    session.state = SessionState::ToolRequired;
                    log::info!(
                        "[id:{}] Run {} requires {} tool call(s)",
                        session.id,
                        run_id,
                        calls.len()
                    );
                    let mut outputs: Vec<ToolOutput> = Vec::with_capacity(calls.len());
                    for call in &calls {
                        outputs.push(self.tools.execute_call(call).await?);
                    }
                    stream = self
                        .client
                        .submit_tool_outputs(&session.thread_id, &run_id, outputs)
                        .await?;
                    session.state = SessionState::StreamingResponse;
                }
                RunEvent::Completed => break,
                RunEvent::Failed(reason) => {
                    session.state = SessionState::AwaitingInput;
                    return Err(AssistantError::AssistantApi(reason));
                }
            }
        }

        let response = match self.client.last_message(&session.thread_id).await {
            Ok(message) if !message.is_empty() => message,
            Ok(_) => streamed_text,
            Err(e) => {
                log::warn!("[id:{}] Could not retrieve final message: {}", session.id, e);
                streamed_text
            }
        };
        session.record(ConversationTurn::assistant(&response));
        session.last_active = Utc::now();
        session.state = SessionState::AwaitingInput;
        Ok(response)
    }

    /// Exports the accumulated transcript if the session has been idle for
    /// the configured timeout, then clears the export buffer. Best-effort: a
    /// failing exporter is logged and never affects the chat session.
    pub async fn maybe_export_log(&self, session: &mut ChatSession) {
        let idle = Utc::now().signed_duration_since(session.last_active);
        if idle.to_std().unwrap_or_default() < self.idle_timeout {
            return;
        }
        session.last_active = Utc::now();
        if !session.pending_export || session.export_buffer.is_empty() {
            return;
        }
        let subject = format!("Chat Q&A: {}", Utc::now().format("%Y-%m-%d"));
        let body = session.export_buffer.join("\n");
        if let Err(e) = self.exporter.export(&subject, &body).await {
            log::warn!("[id:{}] Log export failed: {}", session.id, e);
        }
        session.export_buffer.clear();
        session.pending_export = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::ScriptedAssistantClient;
    use crate::core_types::{Role, ToolCall};
    use crate::tools::{HowManyBrandsTool, WhichBrandsTool};
    use serde_json::json;
    use std::sync::Mutex;

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Arc::new(HowManyBrandsTool));
        registry.register_tool(Arc::new(WhichBrandsTool));
        Arc::new(registry)
    }

    fn call(id: &str, name: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: json!({}),
        }
    }

    struct FailingExporter;

    #[async_trait::async_trait]
    impl LogExporter for FailingExporter {
        async fn export(&self, _subject: &str, _body: &str) -> Result<(), AssistantError> {
            Err(AssistantError::ExportError("smtp down".to_string()))
        }
    }

    struct RecordingExporter {
        bodies: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl LogExporter for RecordingExporter {
        async fn export(&self, _subject: &str, body: &str) -> Result<(), AssistantError> {
            self.bodies.lock().unwrap().push(body.to_string());
            Ok(())
        }
    }

    fn orchestrator(
        client: Arc<ScriptedAssistantClient>,
        exporter: Arc<dyn LogExporter>,
    ) -> Orchestrator {
        Orchestrator::new(client, registry(), exporter, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_plain_turn_streams_and_records() {
        let client = Arc::new(ScriptedAssistantClient::new(
            vec![vec![
                RunEvent::TextDelta("Hola, ".to_string()),
                RunEvent::TextDelta("¿qué tal?".to_string()),
                RunEvent::Completed,
            ]],
            "Hola, ¿qué tal?",
        ));
        let orchestrator = orchestrator(client.clone(), Arc::new(crate::export::NoopExporter));

        let mut session = orchestrator.start_session("Hola").await.unwrap();
        assert_eq!(session.state, SessionState::AwaitingInput);

        let mut deltas = Vec::new();
        let response = orchestrator
            .user_turn(&mut session, "buenas", |d| deltas.push(d.to_string()))
            .await
            .unwrap();

        assert_eq!(response, "Hola, ¿qué tal?");
        assert_eq!(deltas, vec!["Hola, ", "¿qué tal?"]);
        assert_eq!(session.state, SessionState::AwaitingInput);
        // Greeting + user + assistant, append-only.
        assert_eq!(session.turns.len(), 3);
        assert_eq!(session.turns[1].role, Role::User);
        assert_eq!(client.user_messages(), vec!["buenas"]);
    }

    #[tokio::test]
    async fn test_tool_batch_executed_and_submitted_once() {
        let client = Arc::new(ScriptedAssistantClient::new(
            vec![
                vec![RunEvent::RequiresAction {
                    run_id: "run_1".to_string(),
                    calls: vec![call("c1", "how_many_brands"), call("c2", "which_brands")],
                }],
                vec![
                    RunEvent::TextDelta("Hay 9 marcas.".to_string()),
                    RunEvent::Completed,
                ],
            ],
            "Hay 9 marcas.",
        ));
        let orchestrator = orchestrator(client.clone(), Arc::new(crate::export::NoopExporter));

        let mut session = orchestrator.start_session("Hola").await.unwrap();
        let response = orchestrator
            .user_turn(&mut session, "¿cuántas marcas hay?", |_| {})
            .await
            .unwrap();

        assert_eq!(response, "Hay 9 marcas.");
        let batches = client.submitted_batches();
        assert_eq!(batches.len(), 1, "all outputs must go in a single batch");
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[0][0].tool_call_id, "c1");
        assert_eq!(batches[0][0].output, "Hay 9 marcas en total.");
        assert_eq!(batches[0][1].tool_call_id, "c2");
    }

    #[tokio::test]
    async fn test_failed_run_aborts_turn_but_keeps_log() {
        let client = Arc::new(ScriptedAssistantClient::new(
            vec![vec![RunEvent::Failed("rate limited".to_string())]],
            "",
        ));
        let orchestrator = orchestrator(client, Arc::new(crate::export::NoopExporter));

        let mut session = orchestrator.start_session("Hola").await.unwrap();
        let result = orchestrator.user_turn(&mut session, "hola", |_| {}).await;
        assert!(result.is_err());
        // The user turn stays recorded even though the run failed.
        assert_eq!(session.turns.len(), 2);
        assert_eq!(session.turns[1].content, "hola");
    }

    #[tokio::test]
    async fn test_unknown_tool_fails_turn() {
        let client = Arc::new(ScriptedAssistantClient::new(
            vec![vec![RunEvent::RequiresAction {
                run_id: "run_1".to_string(),
                calls: vec![call("c1", "delete_everything")],
            }]],
            "",
        ));
        let orchestrator = orchestrator(client.clone(), Arc::new(crate::export::NoopExporter));

        let mut session = orchestrator.start_session("Hola").await.unwrap();
        assert!(orchestrator.user_turn(&mut session, "hola", |_| {}).await.is_err());
        assert!(client.submitted_batches().is_empty());
    }

    #[tokio::test]
    async fn test_idle_export_clears_buffer() {
        let client = Arc::new(ScriptedAssistantClient::new(
            vec![vec![RunEvent::TextDelta("ok".to_string()), RunEvent::Completed]],
            "ok",
        ));
        let exporter = Arc::new(RecordingExporter {
            bodies: Mutex::new(Vec::new()),
        });
        let orchestrator = Orchestrator::new(
            client,
            registry(),
            exporter.clone(),
            Duration::from_secs(3600),
        );

        let mut session = orchestrator.start_session("Hola").await.unwrap();
        orchestrator.user_turn(&mut session, "consulta", |_| {}).await.unwrap();

        // Not idle yet: nothing exported.
        orchestrator.maybe_export_log(&mut session).await;
        assert!(exporter.bodies.lock().unwrap().is_empty());

        session.backdate_last_active(chrono::Duration::hours(2));
        orchestrator.maybe_export_log(&mut session).await;
        let bodies = exporter.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].contains("USER: consulta"));

        // A second idle check without new activity exports nothing.
        drop(bodies);
        session.backdate_last_active(chrono::Duration::hours(2));
        orchestrator.maybe_export_log(&mut session).await;
        assert_eq!(exporter.bodies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_export_failure_does_not_affect_session() {
        let client = Arc::new(ScriptedAssistantClient::new(
            vec![
                vec![RunEvent::TextDelta("ok".to_string()), RunEvent::Completed],
                vec![RunEvent::TextDelta("sigo".to_string()), RunEvent::Completed],
            ],
            "ok",
        ));
        let orchestrator = orchestrator(client, Arc::new(FailingExporter));

        let mut session = orchestrator.start_session("Hola").await.unwrap();
        orchestrator.user_turn(&mut session, "consulta", |_| {}).await.unwrap();
        session.backdate_last_active(chrono::Duration::hours(2));
        orchestrator.maybe_export_log(&mut session).await;

        // The session keeps working after the failed export.
        let response = orchestrator.user_turn(&mut session, "otra", |_| {}).await.unwrap();
        assert_eq!(response, "ok");
    }
}
