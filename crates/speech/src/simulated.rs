//! Simulated speech services
//!
//! Stand-ins for the hosted APIs so development setups and tests run with no
//! keys. Transcription returns a canned transcript; synthesis returns a
//! short silent WAV clip.

use async_trait::async_trait;

use lingua_tutor_core::{Error, Language, Result, SpeechToText, TextToSpeech};

const SAMPLE_RATE: u32 = 16_000;

/// Simulated STT + TTS
#[derive(Debug, Clone)]
pub struct SimulatedSpeech {
    transcript: String,
}

impl SimulatedSpeech {
    pub fn new() -> Self {
        Self {
            transcript: "simulated transcript".to_string(),
        }
    }

    /// Fix the transcript returned by `transcribe`
    pub fn with_transcript(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
        }
    }
}

impl Default for SimulatedSpeech {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechToText for SimulatedSpeech {
    async fn transcribe(&self, audio: Vec<u8>, _language: Language) -> Result<String> {
        if audio.is_empty() {
            return Err(Error::input("audio payload is empty"));
        }
        Ok(self.transcript.clone())
    }
}

#[async_trait]
impl TextToSpeech for SimulatedSpeech {
    async fn synthesize(&self, text: &str, _language: Language) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(Error::input("synthesis text is empty"));
        }
        // 100ms of silence per word keeps clip length roughly proportional
        let words = text.split_whitespace().count().max(1) as u32;
        Ok(silent_wav(100 * words))
    }

    fn content_type(&self) -> &'static str {
        "audio/wav"
    }
}

/// A valid 16-bit mono PCM WAV file containing silence
fn silent_wav(duration_ms: u32) -> Vec<u8> {
    let sample_count = SAMPLE_RATE * duration_ms / 1000;
    let data_len = sample_count * 2;
    let mut wav = Vec::with_capacity(44 + data_len as usize);

    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes()); // byte rate
    wav.extend_from_slice(&2u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);

    wav
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transcribe_returns_canned_text() {
        let speech = SimulatedSpeech::with_transcript("hola amigo");
        let text = speech
            .transcribe(vec![0u8; 16], Language::Spanish)
            .await
            .unwrap();
        assert_eq!(text, "hola amigo");
    }

    #[tokio::test]
    async fn test_synthesize_emits_valid_wav() {
        let speech = SimulatedSpeech::new();
        let audio = speech
            .synthesize("bonjour tout le monde", Language::French)
            .await
            .unwrap();

        assert_eq!(&audio[0..4], b"RIFF");
        assert_eq!(&audio[8..12], b"WAVE");
        // Four words -> 400ms -> 6400 samples -> 12800 data bytes + header
        assert_eq!(audio.len(), 44 + 12_800);
    }

    #[test]
    fn test_wav_header_length_math() {
        let wav = silent_wav(100);
        let data_len = u32::from_le_bytes(wav[40..44].try_into().unwrap());
        assert_eq!(wav.len(), 44 + data_len as usize);
        assert_eq!(data_len, 16_000 / 10 * 2);
    }
}
