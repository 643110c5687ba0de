// src/lib.rs

pub mod config;
pub mod error;
pub mod notifier;
pub mod tts_engine;
pub mod voice;

pub use config::{Config, DEFAULT_MESSAGE};
pub use error::SpeechFailure;
pub use notifier::{initialize_engine, play_voice_prompt, speak_with, Outcome};
pub use tts_engine::{SpeechEngine, TtsEngine};
pub use voice::{find_chinese_voice, VoiceDescriptor};
