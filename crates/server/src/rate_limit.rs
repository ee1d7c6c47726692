//! Token bucket rate limiter
//!
//! Two budgets per consumer: scoring/turn requests and audio upload bytes.

use std::time::Instant;

use lingua_tutor_config::RateLimitConfig;

/// Token bucket rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    /// Request tokens
    request_tokens: f32,
    /// Audio byte tokens
    audio_tokens: f32,
    /// Last refill time
    last_refill: Instant,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config
    pub fn new(config: RateLimitConfig) -> Self {
        let burst_requests = config.requests_per_second as f32 * config.burst_multiplier;
        let burst_audio = config.audio_bytes_per_second as f32 * config.burst_multiplier;

        Self {
            config,
            request_tokens: burst_requests,
            audio_tokens: burst_audio,
            last_refill: Instant::now(),
        }
    }

    /// Refill tokens based on elapsed time
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed_secs = now.duration_since(self.last_refill).as_secs_f32();

        if elapsed_secs > 0.0 {
            let request_refill = elapsed_secs * self.config.requests_per_second as f32;
            let max_requests =
                self.config.requests_per_second as f32 * self.config.burst_multiplier;
            self.request_tokens = (self.request_tokens + request_refill).min(max_requests);

            let audio_refill = elapsed_secs * self.config.audio_bytes_per_second as f32;
            let max_audio =
                self.config.audio_bytes_per_second as f32 * self.config.burst_multiplier;
            self.audio_tokens = (self.audio_tokens + audio_refill).min(max_audio);

            self.last_refill = now;
        }
    }

    /// Check if a request can be made (and consume a token if so)
    pub fn check_request(&mut self) -> Result<(), RateLimitError> {
        if !self.config.enabled {
            return Ok(());
        }

        self.refill();

        if self.request_tokens >= 1.0 {
            self.request_tokens -= 1.0;
            Ok(())
        } else {
            Err(RateLimitError::RequestRateExceeded)
        }
    }

    /// Check if audio bytes can be uploaded (and consume tokens if so)
    pub fn check_audio(&mut self, bytes: usize) -> Result<(), RateLimitError> {
        if !self.config.enabled {
            return Ok(());
        }

        self.refill();

        let bytes_f32 = bytes as f32;
        if self.audio_tokens >= bytes_f32 {
            self.audio_tokens -= bytes_f32;
            Ok(())
        } else {
            Err(RateLimitError::AudioRateExceeded)
        }
    }

    /// Remaining request tokens (for diagnostics)
    pub fn remaining_request_tokens(&self) -> f32 {
        self.request_tokens
    }
}

/// Rate limit errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitError {
    /// Too many requests per second
    RequestRateExceeded,
    /// Too much audio data per second
    AudioRateExceeded,
}

impl std::fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateLimitError::RequestRateExceeded => write!(f, "Request rate limit exceeded"),
            RateLimitError::AudioRateExceeded => write!(f, "Audio rate limit exceeded"),
        }
    }
}

impl std::error::Error for RateLimitError {}
