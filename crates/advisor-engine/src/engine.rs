//! Conversation orchestrator
//!
//! Drives one user turn through the model service and the tool registry:
//! append the user message, send the turn, execute any requested tool calls
//! concurrently, feed the settled results back, and repeat under a bounded
//! round count. Exceeding the bound is not an error; the model's last text
//! becomes the terminal message so the conversation always converges to a
//! renderable state.
//!
//! Every dispatch after an await point is gated on the conversation id
//! captured at turn start, so a `reset()` during an in-flight turn drops
//! late-arriving results instead of resurrecting stale state.

use futures::future::join_all;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use advisor_core::{Message, Part, Result, RichContent};
use advisor_model::{ModelProvider, ModelTurn, ToolCallRequest, TurnInput};
use advisor_tools::ToolRegistry;

use crate::config::EngineConfig;
use crate::executor::ToolExecutor;
use crate::state::{reduce, Action, ConversationState};

/// The conversation engine exposed to the view layer
///
/// Views read state through [`state`](Self::state) or reactively through
/// [`subscribe`](Self::subscribe); they never mutate it directly.
pub struct ConversationEngine<P: ModelProvider> {
    provider: Arc<P>,
    executor: ToolExecutor,
    config: EngineConfig,
    state: RwLock<ConversationState>,
    watch_tx: watch::Sender<ConversationState>,
}

impl<P: ModelProvider> ConversationEngine<P> {
    pub fn new(provider: Arc<P>, registry: Arc<ToolRegistry>, config: EngineConfig) -> Self {
        let initial = ConversationState::new();
        let (watch_tx, _) = watch::channel(initial.clone());
        Self {
            provider,
            executor: ToolExecutor::new(registry, config.tool_timeout),
            config,
            state: RwLock::new(initial),
            watch_tx,
        }
    }

    /// Snapshot of the current conversation state
    pub async fn state(&self) -> ConversationState {
        self.state.read().await.clone()
    }

    /// Subscribe to state snapshots, one per transition
    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.watch_tx.subscribe()
    }

    /// Apply a transition unconditionally
    async fn dispatch(&self, action: Action) -> ConversationState {
        let mut state = self.state.write().await;
        *state = reduce(&state, action);
        let snapshot = state.clone();
        drop(state);
        let _ = self.watch_tx.send(snapshot.clone());
        snapshot
    }

    /// Apply a transition only if the given turn still belongs to the
    /// current conversation. Returns `None` when a reset has intervened.
    async fn dispatch_for_turn(&self, turn_id: &str, action: Action) -> Option<ConversationState> {
        let mut state = self.state.write().await;
        if state.conversation_id != turn_id {
            debug!("Dropping transition for superseded conversation");
            return None;
        }
        *state = reduce(&state, action);
        let snapshot = state.clone();
        drop(state);
        let _ = self.watch_tx.send(snapshot.clone());
        Some(snapshot)
    }

    /// Abandon the current conversation and start a fresh one
    ///
    /// Safe to invoke at any point; in-flight tool results that settle after
    /// the reset are dropped by the turn-id gate.
    pub async fn reset(&self) -> ConversationState {
        info!("Resetting conversation");
        self.dispatch(Action::Reset).await
    }

    /// Merge a partial context annotation into the active context bag
    pub async fn merge_context(&self, partial: Map<String, Value>) -> ConversationState {
        self.dispatch(Action::MergeContext(partial)).await
    }

    /// Process one user turn end to end
    pub async fn send_message(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        let turn_id = self.state.read().await.conversation_id.clone();

        info!(turn = %turn_id, "Processing user message");
        self.dispatch_for_turn(&turn_id, Action::BeginSend).await;
        self.dispatch_for_turn(
            &turn_id,
            Action::AppendUserMessage(Arc::new(Message::user(text.clone()))),
        )
        .await;

        let mut turn = match self.provider.send_turn(TurnInput::UserText(text)).await {
            Ok(turn) => turn,
            Err(e) => return self.fail_turn(&turn_id, e).await,
        };

        let mut rounds = 0;
        while turn.wants_tools() {
            if rounds >= self.config.max_tool_rounds {
                warn!(
                    rounds,
                    "Tool round bound reached; forcing terminal response"
                );
                break;
            }
            rounds += 1;

            // One model message per round: text first, then the calls in
            // the model's requested order.
            let mut parts = Vec::new();
            if let Some(text) = turn.text.as_deref().filter(|t| !t.is_empty()) {
                parts.push(Part::text(text));
            }
            for call in &turn.tool_calls {
                parts.push(Part::tool_call(&call.name, call.args.clone()));
            }
            if self
                .dispatch_for_turn(
                    &turn_id,
                    Action::AppendModelMessage(Arc::new(Message::model(parts))),
                )
                .await
                .is_none()
            {
                return Ok(());
            }

            // Fan out: all calls in the round run concurrently; join_all
            // keeps the results in request order regardless of which call
            // settles first.
            let results: Vec<Part> = join_all(
                turn.tool_calls
                    .iter()
                    .map(|call| self.run_tool_call(&turn_id, call)),
            )
            .await;

            if self
                .dispatch_for_turn(
                    &turn_id,
                    Action::AppendModelMessage(Arc::new(Message::tool_log(results.clone()))),
                )
                .await
                .is_none()
            {
                return Ok(());
            }

            self.dispatch_for_turn(&turn_id, Action::BeginSend).await;
            turn = match self
                .provider
                .send_turn(TurnInput::ToolResults(results))
                .await
            {
                Ok(turn) => turn,
                Err(e) => return self.fail_turn(&turn_id, e).await,
            };
        }

        self.dispatch_for_turn(
            &turn_id,
            Action::AppendModelMessage(Arc::new(final_message(turn))),
        )
        .await;

        Ok(())
    }

    /// Run one tool call with activity-flag transitions around it
    async fn run_tool_call(&self, turn_id: &str, call: &ToolCallRequest) -> Part {
        info!(tool = %call.name, "Executing tool call");
        self.dispatch_for_turn(turn_id, Action::BeginTool(call.name.clone()))
            .await;
        let result = self.executor.execute(&call.name, call.args.clone()).await;
        self.dispatch_for_turn(turn_id, Action::EndTool).await;
        result
    }

    /// Record a model-service failure and end the turn
    async fn fail_turn(&self, turn_id: &str, error: advisor_core::Error) -> Result<()> {
        warn!(error = %error, "Model turn failed");
        self.dispatch_for_turn(turn_id, Action::SetError(error.to_string()))
            .await;
        Err(error)
    }
}

/// Build the terminal model message for a turn, decoding any rich-content
/// blocks embedded in the text
fn final_message(turn: ModelTurn) -> Message {
    let text = turn.text.unwrap_or_default();
    let (plain, payloads) = split_rich_content(&text);

    let mut parts = Vec::new();
    if !plain.is_empty() {
        parts.push(Part::text(plain));
    }
    for payload in payloads {
        parts.push(Part::RichContent { payload });
    }
    Message::model(parts)
}

/// Split fenced ```json blocks that decode as rich-content payloads out of
/// the model's text. Blocks that do not decode stay in the text verbatim;
/// unknown future tags decode to the placeholder variant.
fn split_rich_content(text: &str) -> (String, Vec<RichContent>) {
    const OPEN: &str = "```json";
    const CLOSE: &str = "```";

    let mut plain = String::new();
    let mut payloads = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];
        let Some(end) = after.find(CLOSE) else {
            break;
        };
        let candidate = after[..end].trim();
        let parsed = serde_json::from_str::<Value>(candidate)
            .ok()
            .and_then(RichContent::from_value);

        match parsed {
            Some(payload) => {
                plain.push_str(&rest[..start]);
                payloads.push(payload);
            }
            None => {
                plain.push_str(&rest[..start + OPEN.len() + end + CLOSE.len()]);
            }
        }
        rest = &after[end + CLOSE.len()..];
    }
    plain.push_str(rest);

    (plain.trim().to_string(), payloads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::{Role, RichContent};
    use advisor_model::ToolCallRequest;
    use advisor_tools::tool::FnTool;
    use advisor_tools::FinancialSnapshot;
    use anyhow::anyhow;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Provider stub that replays a script of turns and counts calls
    struct ScriptedProvider {
        script: Mutex<VecDeque<Result<ModelTurn>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<ModelTurn>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into_iter().collect()),
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ModelProvider for ScriptedProvider {
        async fn send_turn(&self, _input: TurnInput) -> Result<ModelTurn> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Ok(text_turn("done")))
        }
    }

    /// Provider stub that requests the same tool call forever
    struct AlwaysCallsProvider {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ModelProvider for AlwaysCallsProvider {
        async fn send_turn(&self, _input: TurnInput) -> Result<ModelTurn> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ModelTurn {
                text: Some("still checking".to_string()),
                tool_calls: vec![ToolCallRequest {
                    name: "get_financial_summary".to_string(),
                    args: json!({}),
                }],
            })
        }
    }

    fn text_turn(text: &str) -> ModelTurn {
        ModelTurn {
            text: Some(text.to_string()),
            tool_calls: Vec::new(),
        }
    }

    fn call_turn(names: &[&str]) -> ModelTurn {
        ModelTurn {
            text: None,
            tool_calls: names
                .iter()
                .map(|name| ToolCallRequest {
                    name: name.to_string(),
                    args: json!({}),
                })
                .collect(),
        }
    }

    fn sample_registry() -> Arc<ToolRegistry> {
        let snapshot = Arc::new(FinancialSnapshot::sample());
        Arc::new(advisor_tools::builtin_registry(snapshot))
    }

    fn engine_with<Q: ModelProvider>(
        provider: Arc<Q>,
        registry: Arc<ToolRegistry>,
        config: EngineConfig,
    ) -> ConversationEngine<Q> {
        ConversationEngine::new(provider, registry, config)
    }

    fn result_payload(part: &Part) -> &Value {
        match part {
            Part::ToolResult { response, .. } => response,
            other => panic!("expected tool result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_happy_path_four_messages() {
        let provider = ScriptedProvider::new(vec![
            Ok(call_turn(&["get_financial_summary"])),
            Ok(text_turn("Your balance is $1000.")),
        ]);
        let engine = engine_with(provider.clone(), sample_registry(), EngineConfig::default());

        engine.send_message("What is my balance?").await.unwrap();

        let state = engine.state().await;
        assert_eq!(state.messages.len(), 4);
        assert_eq!(state.messages[0].role, Role::User);
        assert_eq!(state.messages[1].role, Role::Model);
        assert_eq!(state.messages[1].tool_call_names(), vec![
            "get_financial_summary"
        ]);
        assert_eq!(state.messages[2].role, Role::ToolLog);
        assert_eq!(state.messages[3].role, Role::Model);
        assert_eq!(state.messages[3].text(), "Your balance is $1000.");

        // The tool-log carries the adapter's real payload
        let payload = result_payload(&state.messages[2].parts[0]);
        assert!(payload["total_balance"].as_f64().unwrap() > 0.0);

        assert!(!state.is_loading);
        assert!(!state.is_tool_executing);
        assert!(state.error.is_none());
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_round_results_keep_request_order() {
        // A fails, B settles fastest, C is slow; the tool-log must still be
        // ordered A, B, C.
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FnTool::new(
            "a",
            "fails",
            json!({"type": "object"}),
            |_| Err(anyhow!("a exploded")),
        )));
        registry.register(Arc::new(FnTool::new(
            "b",
            "fast",
            json!({"type": "object"}),
            |_| Ok(json!({"who": "b"})),
        )));

        struct SlowC;
        #[async_trait::async_trait]
        impl advisor_tools::Tool for SlowC {
            fn name(&self) -> &str {
                "c"
            }
            fn description(&self) -> &str {
                "slow"
            }
            fn input_schema(&self) -> Value {
                json!({"type": "object"})
            }
            async fn execute(&self, _args: Value) -> anyhow::Result<Value> {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok(json!({"who": "c"}))
            }
        }
        registry.register(Arc::new(SlowC));

        let provider = ScriptedProvider::new(vec![
            Ok(call_turn(&["a", "b", "c"])),
            Ok(text_turn("done")),
        ]);
        let engine = engine_with(provider, Arc::new(registry), EngineConfig::default());

        engine.send_message("run them").await.unwrap();

        let state = engine.state().await;
        let log = &state.messages[2];
        assert_eq!(log.role, Role::ToolLog);
        let names: Vec<_> = log.parts.iter().filter_map(|p| p.tool_name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(result_payload(&log.parts[0])["error"], "a exploded");
        assert_eq!(result_payload(&log.parts[1])["who"], "b");
        assert_eq!(result_payload(&log.parts[2])["who"], "c");
    }

    #[tokio::test]
    async fn test_unknown_tool_does_not_abort_siblings() {
        let provider = ScriptedProvider::new(vec![
            Ok(call_turn(&["nonexistent", "get_financial_summary"])),
            Ok(text_turn("done")),
        ]);
        let engine = engine_with(provider, sample_registry(), EngineConfig::default());

        engine.send_message("go").await.unwrap();

        let state = engine.state().await;
        let log = &state.messages[2];
        assert_eq!(result_payload(&log.parts[0])["error"], "unknown tool");
        assert!(result_payload(&log.parts[1])["total_balance"].is_f64());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_bounded_convergence() {
        let provider = Arc::new(AlwaysCallsProvider {
            calls: AtomicUsize::new(0),
        });
        let config = EngineConfig::default().with_max_tool_rounds(3);
        let engine = engine_with(provider.clone(), sample_registry(), config);

        engine.send_message("loop forever").await.unwrap();

        // Initial turn plus one follow-up per allowed round
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);

        let state = engine.state().await;
        // user + 3 * (model-with-calls + tool-log) + terminal model message
        assert_eq!(state.messages.len(), 8);
        let last = state.messages.last().unwrap();
        assert_eq!(last.role, Role::Model);
        assert_eq!(last.text(), "still checking");
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_model_error_clears_activity_flags() {
        let provider = ScriptedProvider::new(vec![Err(advisor_core::Error::model(
            "connection refused",
        ))]);
        let engine = engine_with(provider, sample_registry(), EngineConfig::default());

        let err = engine.send_message("hello").await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));

        let state = engine.state().await;
        assert!(!state.is_loading);
        assert!(!state.is_tool_executing);
        assert!(state.error.as_deref().unwrap().contains("connection refused"));
        // The user message survives the failed turn
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_reset_during_flight_drops_late_results() {
        let mut registry = ToolRegistry::new();

        struct Stall;
        #[async_trait::async_trait]
        impl advisor_tools::Tool for Stall {
            fn name(&self) -> &str {
                "stall"
            }
            fn description(&self) -> &str {
                "sleeps"
            }
            fn input_schema(&self) -> Value {
                json!({"type": "object"})
            }
            async fn execute(&self, _args: Value) -> anyhow::Result<Value> {
                tokio::time::sleep(Duration::from_millis(150)).await;
                Ok(json!({"late": true}))
            }
        }
        registry.register(Arc::new(Stall));

        let provider = ScriptedProvider::new(vec![
            Ok(call_turn(&["stall"])),
            Ok(text_turn("should never land")),
        ]);
        let engine = Arc::new(engine_with(
            provider,
            Arc::new(registry),
            EngineConfig::default(),
        ));
        let old_id = engine.state().await.conversation_id.clone();

        let worker = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.send_message("start").await })
        };

        tokio::time::sleep(Duration::from_millis(40)).await;
        let state = engine.reset().await;
        assert_ne!(state.conversation_id, old_id);

        worker.await.unwrap().unwrap();

        let state = engine.state().await;
        assert!(state.messages.is_empty());
        assert_ne!(state.conversation_id, old_id);
        assert!(!state.is_loading);
        assert!(!state.is_tool_executing);
    }

    #[tokio::test]
    async fn test_subscribe_sees_transitions() {
        let provider = ScriptedProvider::new(vec![Ok(text_turn("hi"))]);
        let engine = engine_with(provider, sample_registry(), EngineConfig::default());
        let mut rx = engine.subscribe();

        engine.send_message("hello").await.unwrap();

        rx.changed().await.unwrap();
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.messages.len(), 2);
    }

    #[test]
    fn test_split_rich_content_extracts_known_payloads() {
        let text = "Here is your spending:\n```json\n{\"type\": \"bar-chart\", \
                    \"title\": \"Spending\", \"data\": [{\"label\": \"food\", \"value\": 296.88}]}\n```\nLet me know.";
        let (plain, payloads) = split_rich_content(text);

        assert!(plain.contains("Here is your spending:"));
        assert!(plain.contains("Let me know."));
        assert!(!plain.contains("```"));
        assert_eq!(payloads.len(), 1);
        assert!(matches!(payloads[0], RichContent::BarChart { .. }));
    }

    #[test]
    fn test_split_rich_content_keeps_non_payload_blocks() {
        let text = "Example:\n```json\n{\"just\": \"data\"}\n```";
        let (plain, payloads) = split_rich_content(text);
        assert!(payloads.is_empty());
        assert!(plain.contains("{\"just\": \"data\"}"));
    }

    #[test]
    fn test_split_rich_content_unknown_tag_is_placeholder() {
        let text = "```json\n{\"type\": \"hologram\"}\n```";
        let (plain, payloads) = split_rich_content(text);
        assert!(plain.is_empty());
        assert_eq!(payloads, vec![RichContent::Unknown]);
    }
}
