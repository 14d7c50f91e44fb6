// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One pooled HTTP client per backend identity.
//!
//! [`SessionManager`] hands out [`ConnectionHandle`]s keyed by backend
//! (tenant/database) name. A handle is built on first use and shared by every
//! later call for that key until the process exits. The map lock covers the
//! check-and-insert only; requests run on the cloned handle without locking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use odoobot_config::model::PoolConfig;
use odoobot_core::ChatbotError;
use reqwest::header::HeaderMap;
use serde::Serialize;
use tracing::{debug, warn};

/// `User-Agent` sent on every upstream call.
pub const USER_AGENT: &str = concat!("odoobot/", env!("CARGO_PKG_VERSION"));

const TCP_KEEPALIVE: Duration = Duration::from_secs(60);

static GLOBAL: OnceLock<Arc<SessionManager>> = OnceLock::new();

/// Map key for a backend identity.
pub fn session_key(backend: &str) -> String {
    format!("anthropic_session_{backend}")
}

/// How each pooled client is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Idle keep-alive connections kept per host.
    pub max_idle_per_host: usize,
    /// Extra attempts after a connect error.
    pub connect_retries: u32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            max_idle_per_host: 10,
            connect_retries: 1,
        }
    }
}

impl From<&PoolConfig> for ConnectionSettings {
    fn from(pool: &PoolConfig) -> Self {
        Self {
            max_idle_per_host: pool.max_idle_per_host,
            connect_retries: pool.connect_retries,
        }
    }
}

/// Reusable outbound connection pool for one backend.
///
/// Cloning is cheap and shares the underlying pool.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    client: reqwest::Client,
    key: Arc<str>,
    connect_retries: u32,
}

impl ConnectionHandle {
    fn build(key: &str, settings: ConnectionSettings) -> Result<Self, ChatbotError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(settings.max_idle_per_host)
            .tcp_keepalive(TCP_KEEPALIVE)
            .build()
            .map_err(|e| ChatbotError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            key: Arc::from(key),
            connect_retries: settings.connect_retries,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// POST `body` as JSON with a per-call timeout.
    ///
    /// A send that fails to establish the connection is retried up to
    /// `connect_retries` times. Any other failure is returned as is.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &T,
        timeout: Duration,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut attempt = 0;
        loop {
            let result = self
                .client
                .post(url)
                .headers(headers.clone())
                .json(body)
                .timeout(timeout)
                .send()
                .await;

            match result {
                Err(e) if e.is_connect() && attempt < self.connect_retries => {
                    attempt += 1;
                    warn!(
                        key = %self.key,
                        attempt,
                        error = %e,
                        "connect failed, retrying"
                    );
                }
                other => return other,
            }
        }
    }
}

/// Process-wide cache of [`ConnectionHandle`]s.
#[derive(Debug)]
pub struct SessionManager {
    handles: Mutex<HashMap<String, ConnectionHandle>>,
    settings: ConnectionSettings,
    constructed: AtomicUsize,
}

impl SessionManager {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
            settings,
            constructed: AtomicUsize::new(0),
        }
    }

    /// Process-wide instance, created with default settings on first access.
    pub fn global() -> Arc<SessionManager> {
        Self::global_with(ConnectionSettings::default())
    }

    /// Process-wide instance, created with `settings` on first access.
    ///
    /// The first caller fixes the settings; later callers get the same
    /// instance whatever they pass.
    pub fn global_with(settings: ConnectionSettings) -> Arc<SessionManager> {
        let manager = GLOBAL.get_or_init(|| Arc::new(SessionManager::new(settings)));
        if manager.settings != settings {
            debug!(
                requested = ?settings,
                active = ?manager.settings,
                "shared session manager already initialized"
            );
        }
        Arc::clone(manager)
    }

    /// Handle for `key`, building it on first request.
    ///
    /// Concurrent callers with the same key get the same handle; exactly one
    /// is constructed.
    pub fn get_connection(&self, key: &str) -> Result<ConnectionHandle, ChatbotError> {
        let mut handles = self
            .handles
            .lock()
            .map_err(|_| ChatbotError::Internal("connection cache lock poisoned".into()))?;

        if let Some(handle) = handles.get(key) {
            return Ok(handle.clone());
        }

        let handle = ConnectionHandle::build(key, self.settings)?;
        self.constructed.fetch_add(1, Ordering::SeqCst);
        debug!(key, "constructed connection handle");
        handles.insert(key.to_string(), handle.clone());
        Ok(handle)
    }

    /// Number of handles built so far.
    pub fn constructed_count(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }

    pub fn settings(&self) -> ConnectionSettings {
        self.settings
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(ConnectionSettings::default())
    }
}
