//! Application state
//!
//! All clients and stores are constructed here, at startup, and injected as
//! shared handles; handlers never build their own.

use std::sync::Arc;
use std::time::Duration;

use lingua_tutor_config::{LlmProvider, Settings, SpeechProvider, StorageProvider};
use lingua_tutor_core::{
    EntitlementCheck, LanguageModel, Result, SpeechToText, TextToSpeech,
};
use lingua_tutor_dialogue::{Orchestrator, ScenarioLibrary};
use lingua_tutor_llm::{ConversationReplier, OpenAiBackend, OpenAiConfig, ReplierConfig};
use lingua_tutor_persistence::{
    LearnerStore, PlanEntitlements, ProgressStore, ScyllaConfig,
};
use lingua_tutor_scoring::{PronunciationScorer, ScorerConfig};
use lingua_tutor_speech::{HostedStt, HostedTts, SimulatedSpeech, SttConfig, TtsConfig};

use crate::rate_limit::RateLimiter;
use crate::session::SessionManager;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<Settings>,
    /// Session manager
    pub sessions: Arc<SessionManager>,
    /// Scenario registry
    pub scenarios: Arc<ScenarioLibrary>,
    /// Turn orchestrator
    pub orchestrator: Orchestrator,
    /// Scoring pipeline
    pub scorer: Arc<PronunciationScorer>,
    /// Free-form reply generator, present when a model backend exists
    pub replier: Option<Arc<ConversationReplier>>,
    /// Speech-to-text client
    pub stt: Arc<dyn SpeechToText>,
    /// Text-to-speech client
    pub tts: Arc<dyn TextToSpeech>,
    /// Learner profiles
    pub learners: Arc<dyn LearnerStore>,
    /// Attempt history
    pub progress: Arc<dyn ProgressStore>,
    /// Entitlement gate
    pub entitlements: Arc<dyn EntitlementCheck>,
    /// Rate limiter for sessionless endpoints
    pub global_limiter: Arc<parking_lot::Mutex<RateLimiter>>,
}

impl AppState {
    /// Build application state from settings
    pub async fn build(config: Settings) -> Result<Self> {
        let llm = build_llm(&config);

        let scorer = Arc::new(PronunciationScorer::new(
            llm.clone(),
            ScorerConfig {
                model_timeout: Duration::from_secs(config.scoring.model_timeout_secs),
                temperature: config.scoring.temperature,
                max_tokens: config.scoring.max_tokens,
            },
        ));

        let replier = llm
            .map(|llm| Arc::new(ConversationReplier::new(llm, ReplierConfig::default())));

        let (stt, tts) = build_speech(&config)?;

        let (learners, progress) = build_storage(&config).await?;
        let entitlements: Arc<dyn EntitlementCheck> =
            Arc::new(PlanEntitlements::new(learners.clone()));

        let sessions = Arc::new(SessionManager::new(
            config.server.max_sessions,
            Duration::from_secs(config.server.session_timeout_seconds),
            config.server.rate_limit.clone(),
        ));

        let global_limiter = Arc::new(parking_lot::Mutex::new(RateLimiter::new(
            config.server.rate_limit.clone(),
        )));

        Ok(Self {
            orchestrator: Orchestrator::new(config.scoring.pass_threshold),
            config: Arc::new(config),
            sessions,
            scenarios: Arc::new(ScenarioLibrary::builtin()),
            scorer,
            replier,
            stt,
            tts,
            learners,
            progress,
            entitlements,
            global_limiter,
        })
    }
}

fn build_llm(config: &Settings) -> Option<Arc<dyn LanguageModel>> {
    match config.llm.provider {
        LlmProvider::Disabled => None,
        LlmProvider::OpenAi => match &config.llm.api_key {
            Some(api_key) => {
                let backend = OpenAiBackend::new(OpenAiConfig {
                    base_url: config.llm.base_url.clone(),
                    api_key: api_key.clone(),
                    model: config.llm.model.clone(),
                    timeout: Duration::from_secs(config.llm.timeout_secs),
                });
                match backend {
                    Ok(backend) => Some(Arc::new(backend) as Arc<dyn LanguageModel>),
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to build model backend");
                        None
                    }
                }
            }
            None => {
                tracing::warn!("llm.api_key unset, continuing without a model backend");
                None
            }
        },
    }
}

fn build_speech(config: &Settings) -> Result<(Arc<dyn SpeechToText>, Arc<dyn TextToSpeech>)> {
    match config.speech.provider {
        SpeechProvider::Simulated => Ok(simulated_speech()),
        SpeechProvider::Hosted => {
            let stt_key = config.speech.stt.api_key.clone();
            let tts_key = config.speech.tts.api_key.clone();

            match (stt_key, tts_key) {
                (Some(stt_key), Some(tts_key)) => {
                    let stt = HostedStt::new(SttConfig {
                        base_url: config.speech.stt.base_url.clone(),
                        api_key: stt_key,
                        model: config.speech.stt.model.clone(),
                        timeout: Duration::from_secs(30),
                    })?;
                    let tts = HostedTts::new(TtsConfig {
                        base_url: config.speech.tts.base_url.clone(),
                        api_key: tts_key,
                        model: config.speech.tts.model.clone(),
                        voice: config.speech.tts.voice.clone(),
                        timeout: Duration::from_secs(30),
                    })?;
                    Ok((Arc::new(stt) as Arc<dyn SpeechToText>, Arc::new(tts) as Arc<dyn TextToSpeech>))
                }
                _ => {
                    tracing::warn!("speech API keys unset, using simulated speech services");
                    Ok(simulated_speech())
                }
            }
        }
    }
}

fn simulated_speech() -> (Arc<dyn SpeechToText>, Arc<dyn TextToSpeech>) {
    let simulated = SimulatedSpeech::new();
    (Arc::new(simulated.clone()), Arc::new(simulated))
}

async fn build_storage(
    config: &Settings,
) -> Result<(Arc<dyn LearnerStore>, Arc<dyn ProgressStore>)> {
    match config.storage.provider {
        StorageProvider::Memory => {
            let layer = lingua_tutor_persistence::init_in_memory();
            Ok((layer.learners, layer.progress))
        }
        StorageProvider::Scylla => {
            let layer = lingua_tutor_persistence::init(ScyllaConfig {
                hosts: config.storage.scylla.hosts.clone(),
                keyspace: config.storage.scylla.keyspace.clone(),
                replication_factor: config.storage.scylla.replication_factor,
            })
            .await?;
            Ok((layer.learners, layer.progress))
        }
    }
}
