//! Application state: the in-memory session store, prompts, and the model gateway.
//!
//! Each session sits behind its own async mutex. A turn holds that lock for its
//! whole duration and acquires it with `try_lock`, so an overlapping turn on the
//! same session fails fast with `TurnInProgress` instead of queueing.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

use crate::config::{load_agent_config_from_env, GatewayConfig, Prompts};
use crate::domain::Badge;
use crate::error::QuestError;
use crate::gateway::{GeminiClient, ModelGateway};
use crate::session::{Session, TurnEnv};
use crate::styles::{AdventureStyle, StyleFragments};

type SessionSlot = Arc<Mutex<Session>>;

#[derive(Clone)]
pub struct AppState {
    /// Live sessions by id. Entries leave only through `reset`; there is no
    /// idle eviction, so an abandoned session holds its context until exit.
    pub sessions: Arc<RwLock<HashMap<String, SessionSlot>>>,
    pub gateway: Arc<dyn ModelGateway>,
    pub prompts: Prompts,
    pub fragments: StyleFragments,
}

impl AppState {
    /// Build state from env: load the TOML agent config, read the gateway
    /// settings once, and build the Gemini client.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, QuestError> {
        let cfg = load_agent_config_from_env().unwrap_or_default();
        let gateway_cfg = GatewayConfig::from_env();
        let gemini = GeminiClient::new(gateway_cfg)?;

        match gemini.configuration_error() {
            None => info!(target: "study_quest", base_url = %gemini.base_url(), model = %gemini.model(), "Gemini enabled."),
            Some(reason) => warn!(target: "study_quest", %reason, "Gemini credential missing; sessions cannot start until it is set."),
        }

        Ok(Self::new(Arc::new(gemini), cfg.prompts.clone(), cfg.style_fragments()))
    }

    pub fn new(gateway: Arc<dyn ModelGateway>, prompts: Prompts, fragments: StyleFragments) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            gateway,
            prompts,
            fragments,
        }
    }

    fn env(&self) -> TurnEnv<'_> {
        TurnEnv { gateway: self.gateway.as_ref(), prompts: &self.prompts, fragments: &self.fragments }
    }

    /// Create a session and run its opening turn. The session is stored only
    /// if the opening turn succeeds.
    #[instrument(level = "info", skip(self, context), fields(%style, context_len = context.len()))]
    pub async fn start_session(&self, style: AdventureStyle, context: String) -> Result<Session, QuestError> {
        if let Some(reason) = self.gateway.configuration_error() {
            return Err(QuestError::Configuration(reason));
        }
        let mut session = Session::new(style);
        session.start(self.env(), context).await?;

        let snapshot = session.clone();
        self.sessions
            .write()
            .await
            .insert(session.id().to_string(), Arc::new(Mutex::new(session)));
        Ok(snapshot)
    }

    /// Run one answer turn on an existing session.
    #[instrument(level = "info", skip(self, answer), fields(%id, answer_len = answer.len()))]
    pub async fn submit_answer(&self, id: &str, answer: &str) -> Result<(Session, Option<Badge>), QuestError> {
        let slot = self.slot(id).await?;
        let mut session = slot.try_lock().map_err(|_| QuestError::TurnInProgress)?;
        let badge = session.submit_answer(self.env(), answer).await?;
        Ok((session.clone(), badge))
    }

    /// Current state of a session. Waits for an in-flight turn to finish.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn snapshot(&self, id: &str) -> Result<Session, QuestError> {
        let slot = self.slot(id).await?;
        let session = slot.lock().await;
        Ok(session.clone())
    }

    /// Drop a session (the user restarted). Returns whether it existed.
    #[instrument(level = "info", skip(self), fields(%id))]
    pub async fn reset(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    async fn slot(&self, id: &str) -> Result<SessionSlot, QuestError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| QuestError::UnknownSession(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::StubGateway;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    const OPENING: &str = r#"{"scene":"Scene one","examples":["a"],"medal":null}"#;
    const GOLD: &str = r#"{"scene":"Scene two","medal":{"type":"gold","message":"Brilliant","timestamp":1700000000000}}"#;

    fn state_with(gw: impl ModelGateway + 'static) -> AppState {
        AppState::new(Arc::new(gw), Prompts::default(), StyleFragments::default())
    }

    #[tokio::test]
    async fn start_stores_session_and_submit_advances_it() {
        let state = state_with(StubGateway::new().reply(OPENING).reply(GOLD));
        let s = state.start_session(AdventureStyle::Fantasy, "ctx".into()).await.unwrap();
        assert!(s.is_active());

        let (after, badge) = state.submit_answer(s.id(), "my answer").await.unwrap();
        assert_eq!(after.history(), ["my answer"]);
        assert_eq!(badge.unwrap().message, "Brilliant");
        assert_eq!(state.snapshot(s.id()).await.unwrap().badges().len(), 1);
    }

    #[tokio::test]
    async fn failed_opening_turn_stores_nothing() {
        let state = state_with(StubGateway::new().fail(QuestError::Authentication));
        let err = state.start_session(AdventureStyle::Fantasy, "ctx".into()).await.unwrap_err();
        assert!(matches!(err, QuestError::Authentication));
        assert!(state.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_and_reset_sessions() {
        let state = state_with(StubGateway::new().reply(OPENING));
        assert!(matches!(state.submit_answer("nope", "x").await, Err(QuestError::UnknownSession(_))));

        let s = state.start_session(AdventureStyle::Modern, "ctx".into()).await.unwrap();
        assert!(state.reset(s.id()).await);
        assert!(!state.reset(s.id()).await);
        assert!(matches!(state.snapshot(s.id()).await, Err(QuestError::UnknownSession(_))));
    }

    /// Replies to the opening turn immediately; parks every later call until released.
    struct ParkedGateway {
        calls: std::sync::atomic::AtomicUsize,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ModelGateway for ParkedGateway {
        async fn generate(&self, _prompt: &str) -> Result<String, QuestError> {
            let n = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if n > 0 {
                self.entered.notify_one();
                self.release.notified().await;
            }
            Ok(if n == 0 { OPENING.into() } else { GOLD.into() })
        }
    }

    #[tokio::test]
    async fn overlapping_turn_is_rejected() {
        let gw = Arc::new(ParkedGateway {
            calls: Default::default(),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let state = AppState::new(gw.clone(), Prompts::default(), StyleFragments::default());
        let s = state.start_session(AdventureStyle::Fantasy, "ctx".into()).await.unwrap();

        let first = {
            let state = state.clone();
            let id = s.id().to_string();
            tokio::spawn(async move { state.submit_answer(&id, "first").await })
        };
        gw.entered.notified().await;

        let second = state.submit_answer(s.id(), "second").await;
        assert!(matches!(second, Err(QuestError::TurnInProgress)));

        gw.release.notify_one();
        let (after, _) = first.await.unwrap().unwrap();
        assert_eq!(after.history(), ["first"]);
    }
}
