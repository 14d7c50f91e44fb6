// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request dispatch: classify, route, send, format.
//!
//! [`Dispatcher::plan`] makes every routing decision without touching the
//! network. [`Dispatcher::dispatch`] executes a plan and always returns a
//! [`ChatResponse`]; failures become error-tagged responses at this boundary.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;

use odoobot_anthropic::{
    format_blocks, session_key, AnthropicClient, ConnectionSettings, McpServer, MessageRequest,
    SessionManager,
};
use odoobot_config::model::TokenBudgets;
use odoobot_config::OdoobotConfig;
use odoobot_core::{ChatRequest, ChatResponse, DispatchError, VerbosityMode};
use odoobot_router::{build_prompt, EndpointResolver, QueryClassifier, QueryKind};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::pool::WorkerPool;

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Plain call, no tool server advertised.
    Direct,
    /// Call advertising the tool server at `endpoint` (already resolved).
    ToolAugmented { endpoint: String },
}

impl Route {
    pub fn is_tool_augmented(&self) -> bool {
        matches!(self, Route::ToolAugmented { .. })
    }
}

/// Every decision taken for a request before it is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    pub route: Route,
    /// Effective mode; data queries are forced to full.
    pub mode: VerbosityMode,
    pub kind: QueryKind,
    pub max_tokens: u32,
    pub timeout: Duration,
    /// Message content: the raw input on the direct route, the wrapped
    /// prompt on the tool route.
    pub content: String,
    pub model: String,
}

/// Orchestrates a chat turn against the upstream API.
///
/// Cheap to clone; clones share the connection and endpoint caches.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: AnthropicClient,
    sessions: Arc<SessionManager>,
    endpoints: Arc<EndpointResolver>,
    pool: Arc<WorkerPool>,
    classifier: QueryClassifier,
    backend: String,
    default_model: String,
    server_name: String,
    budgets: TokenBudgets,
    direct_timeout: Duration,
    tool_timeout: Duration,
}

impl Dispatcher {
    /// Dispatcher using the process-wide connection cache and worker pool.
    pub fn new(config: &OdoobotConfig) -> Self {
        Self {
            client: AnthropicClient::from_config(&config.anthropic),
            sessions: SessionManager::global_with(ConnectionSettings::from(&config.pool)),
            endpoints: Arc::new(EndpointResolver::new(config.routing.endpoint_cache_capacity)),
            pool: WorkerPool::global(config.pool.async_workers),
            classifier: QueryClassifier::with_simple_max_chars(
                config.routing.simple_query_max_chars,
            ),
            backend: config.chatbot.backend.clone(),
            default_model: config.anthropic.model_or_default().to_string(),
            server_name: config.mcp.server_name.clone(),
            budgets: config.anthropic.max_tokens,
            direct_timeout: config.anthropic.direct_timeout(),
            tool_timeout: config.anthropic.tool_timeout(),
        }
    }

    /// Use a private connection cache.
    pub fn with_sessions(mut self, sessions: Arc<SessionManager>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Use a private worker pool.
    pub fn with_pool(mut self, pool: Arc<WorkerPool>) -> Self {
        self.pool = pool;
        self
    }

    /// Key connections by a different backend identity.
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Decide route, mode, budget, timeout and content for `request`.
    pub fn plan(&self, request: &ChatRequest) -> Result<RoutePlan, DispatchError> {
        let input = request.user_input.as_str();
        if input.trim().is_empty() {
            return Err(DispatchError::EmptyInput);
        }
        if request.configuration.api_key().is_none() {
            return Err(DispatchError::MissingCredential);
        }

        let kind = self.classifier.classify(input);
        let mode = if self.classifier.is_data_query(input) {
            VerbosityMode::Full
        } else {
            request.verbosity_mode
        };

        let route = match request.configuration.tool_endpoint() {
            Some(base) if kind != QueryKind::Simple => Route::ToolAugmented {
                endpoint: self.endpoints.resolve(base),
            },
            _ => Route::Direct,
        };

        let tool = route.is_tool_augmented();
        let content = if tool {
            build_prompt(input, mode)
        } else {
            input.to_string()
        };

        Ok(RoutePlan {
            max_tokens: self.budgets.for_route(tool, mode),
            timeout: if tool {
                self.tool_timeout
            } else {
                self.direct_timeout
            },
            model: request
                .configuration
                .model()
                .unwrap_or(self.default_model.as_str())
                .to_string(),
            route,
            mode,
            kind,
            content,
        })
    }

    /// Run one chat turn. Never fails; errors come back as error-tagged responses.
    pub async fn dispatch(&self, request: ChatRequest) -> ChatResponse {
        let started = Instant::now();
        let result = self.try_dispatch(&request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                info!(elapsed_ms, backend = %self.backend, "dispatch completed");
                response
            }
            Err(err) => {
                warn!(elapsed_ms, backend = %self.backend, error = %err, "dispatch failed");
                ChatResponse::from(err)
            }
        }
    }

    /// Submit [`dispatch`](Self::dispatch) to the worker pool and hand the
    /// result to `on_complete`.
    ///
    /// Only a pool start-up failure is reported here; everything after
    /// submission reaches `on_complete`, including a panic during dispatch,
    /// which arrives as an error response.
    pub fn dispatch_async<F>(
        &self,
        request: ChatRequest,
        on_complete: F,
    ) -> Result<JoinHandle<()>, DispatchError>
    where
        F: FnOnce(ChatResponse) + Send + 'static,
    {
        let dispatcher = self.clone();
        let handle = self.pool.spawn(async move {
            let response = catch_panic(dispatcher.dispatch(request)).await;
            on_complete(response);
        })?;
        Ok(handle)
    }

    async fn try_dispatch(&self, request: &ChatRequest) -> Result<ChatResponse, DispatchError> {
        let plan = self.plan(request)?;
        // plan() has already rejected a missing key
        let api_key = request
            .configuration
            .api_key()
            .ok_or(DispatchError::MissingCredential)?;

        let route = if plan.route.is_tool_augmented() {
            "tool"
        } else {
            "direct"
        };
        info!(
            route,
            kind = %plan.kind,
            mode = %plan.mode,
            max_tokens = plan.max_tokens,
            model = plan.model.as_str(),
            "routing decision"
        );

        let mut message = MessageRequest::user(&plan.model, plan.max_tokens, &plan.content);
        if let Route::ToolAugmented { endpoint } = &plan.route {
            message = message.with_mcp_server(McpServer::url(endpoint, &self.server_name));
        }

        let connection = self
            .sessions
            .get_connection(&session_key(&self.backend))?;
        let reply = self
            .client
            .complete_message(&connection, api_key, &message, plan.timeout)
            .await?;

        Ok(ChatResponse::success(
            format_blocks(&reply.content, plan.mode),
            Some(200),
        ))
    }
}

/// Await `dispatch`, turning a panic into an error response.
async fn catch_panic(dispatch: impl Future<Output = ChatResponse>) -> ChatResponse {
    match AssertUnwindSafe(dispatch).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "dispatch panicked".to_string());
            error!(panic = %message, "dispatch panicked");
            ChatResponse::from(DispatchError::Unexpected(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odoobot_core::{ChatConfiguration, TransportFailure};
    use odoobot_test_utils::{test_config, test_request, MockUpstream};
    use serde_json::json;
    use tracing_test::traced_test;

    fn dispatcher(api_url: &str) -> Dispatcher {
        Dispatcher::new(&test_config(api_url)).with_sessions(Arc::new(SessionManager::default()))
    }

    fn offline() -> Dispatcher {
        dispatcher("http://127.0.0.1:9/v1/messages")
    }

    #[test]
    fn plan_rejects_blank_input() {
        let request = test_request("   \n\t", None, VerbosityMode::Fast);
        assert_eq!(offline().plan(&request), Err(DispatchError::EmptyInput));
    }

    #[test]
    fn plan_rejects_missing_key() {
        let request = ChatRequest::new("liste des leads", ChatConfiguration::default());
        assert_eq!(offline().plan(&request), Err(DispatchError::MissingCredential));

        let request = ChatRequest::new("liste des leads", ChatConfiguration::new("  "));
        assert_eq!(offline().plan(&request), Err(DispatchError::MissingCredential));
    }

    #[test]
    fn greeting_goes_direct_even_with_tool_endpoint() {
        let request = test_request("bonjour", Some("https://mcp.example.com"), VerbosityMode::Fast);
        let plan = offline().plan(&request).unwrap();
        assert_eq!(plan.route, Route::Direct);
        assert_eq!(plan.kind, QueryKind::Simple);
        assert_eq!(plan.content, "bonjour");
        assert_eq!(plan.max_tokens, 512);
        assert_eq!(plan.timeout, Duration::from_secs(15));
    }

    #[test]
    fn data_query_forces_full_mode() {
        let request = test_request("liste des leads", None, VerbosityMode::Fast);
        let plan = offline().plan(&request).unwrap();
        assert_eq!(plan.route, Route::Direct);
        assert_eq!(plan.mode, VerbosityMode::Full);
        assert_eq!(plan.max_tokens, 800);
        assert_eq!(plan.content, "liste des leads");
    }

    #[test]
    fn tool_route_wraps_prompt_and_resolves_endpoint() {
        let request = test_request(
            "liste des leads",
            Some("https://mcp.example.com/"),
            VerbosityMode::Fast,
        );
        let plan = offline().plan(&request).unwrap();
        assert_eq!(
            plan.route,
            Route::ToolAugmented {
                endpoint: "https://mcp.example.com/gradio_api/mcp/sse".into()
            }
        );
        assert_eq!(plan.mode, VerbosityMode::Full);
        assert_eq!(plan.max_tokens, 2000);
        assert_eq!(plan.timeout, Duration::from_secs(35));
        assert!(plan.content.contains("\"liste des leads\""));
        assert!(plan.content.contains("listes à puces"));
    }

    #[test]
    fn neutral_tool_query_keeps_fast_mode() {
        let request = test_request(
            "quelle est la météo à Paris",
            Some("https://mcp.example.com"),
            VerbosityMode::Fast,
        );
        let plan = offline().plan(&request).unwrap();
        assert!(plan.route.is_tool_augmented());
        assert_eq!(plan.mode, VerbosityMode::Fast);
        assert_eq!(plan.max_tokens, 1000);
    }

    #[test]
    fn model_override_and_default() {
        let request = test_request("hello there, how are you", None, VerbosityMode::Fast);
        assert_eq!(offline().plan(&request).unwrap().model, "claude-3-5-sonnet-20241022");

        let request = ChatRequest::new(
            "hello there, how are you",
            ChatConfiguration::new("k").with_model("claude-3-5-haiku-latest"),
        );
        assert_eq!(offline().plan(&request).unwrap().model, "claude-3-5-haiku-latest");
    }

    #[tokio::test]
    async fn empty_input_makes_no_network_call() {
        let upstream = MockUpstream::start().await;
        upstream.expect_no_calls().await;

        let response = dispatcher(&upstream.messages_url())
            .dispatch(test_request("  ", None, VerbosityMode::Fast))
            .await;
        assert!(response.is_error);
        assert_eq!(response.display_text, "KO : empty request");
        assert_eq!(upstream.received_count().await, 0);
    }

    #[tokio::test]
    async fn missing_key_makes_no_network_call() {
        let upstream = MockUpstream::start().await;
        upstream.expect_no_calls().await;

        let request = ChatRequest::new("bonjour", ChatConfiguration::default());
        let response = dispatcher(&upstream.messages_url()).dispatch(request).await;
        assert_eq!(response.display_text, "KO : API key required");
        assert_eq!(response.raw_status, None);
    }

    #[tokio::test]
    async fn greeting_with_tool_endpoint_sends_direct_payload() {
        let upstream = MockUpstream::start().await;
        upstream.reply_text(&["Bonjour ! Comment puis-je vous aider ?"]).await;

        let response = dispatcher(&upstream.messages_url())
            .dispatch(test_request("bonjour", Some("https://mcp.example.com"), VerbosityMode::Fast))
            .await;
        assert!(!response.is_error);
        assert_eq!(response.display_text, "Bonjour ! Comment puis-je vous aider ?");
        assert_eq!(response.raw_status, Some(200));

        let bodies = upstream.received_bodies().await;
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].get("mcp_servers").is_none());
        assert_eq!(bodies[0]["messages"][0]["content"], "bonjour");
        assert_eq!(bodies[0]["max_tokens"], 512);
        assert_eq!(upstream.received_header("anthropic-beta").await, vec![None]);
    }

    #[tokio::test]
    async fn tool_call_sends_descriptor_and_filters_raw_payloads() {
        let upstream = MockUpstream::start().await;
        upstream
            .reply_blocks(json!([
                {"type": "text", "text": "Voici vos leads :"},
                {"type": "mcp_tool_use", "id": "t1", "name": "search_leads", "server_name": "odoo-mcp-server", "input": {}},
                {"type": "mcp_tool_result", "tool_use_id": "t1", "is_error": false,
                 "content": [{"type": "text", "text": "[{\"name\": \"Acme\"}]"}]},
                {"type": "text", "text": "[{\"name\": \"Acme\"}]"},
                {"type": "text", "text": "- Acme : 5 000 €"}
            ]))
            .await;

        let response = dispatcher(&upstream.messages_url())
            .dispatch(test_request(
                "liste des leads",
                Some("https://mcp.example.com"),
                VerbosityMode::Fast,
            ))
            .await;
        assert_eq!(response.display_text, "Voici vos leads :\n- Acme : 5 000 €");

        let bodies = upstream.received_bodies().await;
        assert_eq!(
            bodies[0]["mcp_servers"],
            json!([{
                "type": "url",
                "url": "https://mcp.example.com/gradio_api/mcp/sse",
                "name": "odoo-mcp-server",
                "tool_configuration": {"enabled": true}
            }])
        );
        assert_eq!(bodies[0]["max_tokens"], 2000);
        assert_eq!(
            upstream.received_header("anthropic-beta").await,
            vec![Some("mcp-client-2025-04-04".to_string())]
        );
    }

    #[tokio::test]
    async fn status_400_is_invalid_configuration() {
        let upstream = MockUpstream::start().await;
        upstream.reply_error(400, "invalid_request_error", "bad mcp url").await;

        let response = dispatcher(&upstream.messages_url())
            .dispatch(test_request("résumé du pipeline", None, VerbosityMode::Fast))
            .await;
        assert!(response.is_error);
        assert_eq!(response.display_text, "KO : invalid configuration");
        assert_eq!(response.raw_status, Some(400));
    }

    #[tokio::test]
    async fn other_status_embeds_code() {
        let upstream = MockUpstream::start().await;
        upstream.reply_error(500, "api_error", "internal").await;

        let response = dispatcher(&upstream.messages_url())
            .dispatch(test_request("quelle heure est-il à Tokyo", None, VerbosityMode::Fast))
            .await;
        assert_eq!(response.display_text, "KO : upstream error 500");
        assert_eq!(response.raw_status, Some(500));
    }

    #[tokio::test]
    async fn empty_content_yields_placeholder() {
        let upstream = MockUpstream::start().await;
        upstream.reply_blocks(json!([])).await;

        let response = dispatcher(&upstream.messages_url())
            .dispatch(test_request("quelle heure est-il à Tokyo", None, VerbosityMode::Fast))
            .await;
        assert!(!response.is_error);
        assert_eq!(response.display_text, "no response");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_transport_error() {
        let response = offline()
            .dispatch(test_request("quelle heure est-il à Tokyo", None, VerbosityMode::Fast))
            .await;
        assert!(response.is_error);
        assert!(
            response.display_text.starts_with(&format!("KO : {}", TransportFailure::Connect)),
            "got: {}",
            response.display_text
        );
    }

    #[tokio::test]
    async fn connection_is_keyed_by_backend() {
        let upstream = MockUpstream::start().await;
        upstream.reply_text(&["ok"]).await;

        let dispatcher = dispatcher(&upstream.messages_url()).with_backend("tenant-a");
        for _ in 0..3 {
            dispatcher
                .dispatch(test_request("quelle heure est-il à Tokyo", None, VerbosityMode::Fast))
                .await;
        }
        assert_eq!(dispatcher.sessions().constructed_count(), 1);
        assert_eq!(dispatcher.backend(), "tenant-a");
    }

    #[tokio::test]
    #[traced_test]
    async fn elapsed_time_is_logged() {
        let upstream = MockUpstream::start().await;
        upstream.reply_text(&["ok"]).await;

        dispatcher(&upstream.messages_url())
            .dispatch(test_request("quelle heure est-il à Tokyo", None, VerbosityMode::Fast))
            .await;
        assert!(logs_contain("elapsed_ms"));
        assert!(logs_contain("dispatch completed"));
    }

    #[tokio::test]
    async fn tuned_pool_settings_still_share_one_cache() {
        let upstream = MockUpstream::start().await;
        upstream.reply_text(&["ok"]).await;

        let mut config = test_config(&upstream.messages_url());
        config.pool.max_idle_per_host = 4;
        config.pool.connect_retries = 2;
        let first = Dispatcher::new(&config).with_backend("tuned-pool-tenant");
        let second = Dispatcher::new(&config).with_backend("tuned-pool-tenant");
        assert!(Arc::ptr_eq(first.sessions(), second.sessions()));

        let before = first.sessions().constructed_count();
        for dispatcher in [&first, &second] {
            let response = dispatcher
                .dispatch(test_request("quelle heure est-il à Tokyo", None, VerbosityMode::Fast))
                .await;
            assert!(!response.is_error, "got: {}", response.display_text);
        }
        assert_eq!(first.sessions().constructed_count() - before, 1);
    }

    async fn exploding_dispatch() -> ChatResponse {
        panic!("formatter exploded")
    }

    #[tokio::test]
    #[traced_test]
    async fn panic_during_dispatch_becomes_error_response() {
        let response = catch_panic(exploding_dispatch()).await;
        assert!(response.is_error);
        assert_eq!(response.display_text, "KO : unexpected error: formatter exploded");
        assert!(logs_contain("dispatch panicked"));

        let response = catch_panic(async { ChatResponse::from(DispatchError::EmptyInput) }).await;
        assert_eq!(response.display_text, "KO : empty request");
    }
}
