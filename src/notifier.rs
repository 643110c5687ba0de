// src/notifier.rs

use std::io::{self, Write};

use log::{debug, info, warn};

use crate::config::Config;
use crate::error::SpeechFailure;
use crate::tts_engine::{SpeechEngine, TtsEngine};
use crate::voice::find_chinese_voice;

pub const SUCCESS_PREFIX: &str = "已播放语音提示: ";
pub const FAILURE_PREFIX: &str = "播放语音失败: ";

/// 一次播放的结果，两者必居其一。
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Played,
    Failed(SpeechFailure),
}

/// 创建引擎并设置语速、音量，尽量切换到中文语音。
/// 找不到中文语音时保留默认语音，不视为错误。
pub fn initialize_engine<E, F>(create: F, config: &Config) -> Result<E, SpeechFailure>
where
    E: SpeechEngine,
    F: FnOnce() -> Result<E, SpeechFailure>,
{
    let mut engine = create()?;
    engine.set_rate(config.rate_wpm)?;
    engine.set_volume(config.volume)?;

    let voices = engine.list_voices()?;
    debug!("系统中共有 {} 个可用语音。", voices.len());
    match find_chinese_voice(&voices) {
        Some(voice) => {
            info!("使用中文语音: {} ({})", voice.name, voice.id);
            engine.set_voice(voice)?;
        }
        None => info!("未找到中文语音，将使用系统默认语音。"),
    }

    Ok(engine)
}

fn run<E, F>(create: F, config: &Config, message: &str) -> Result<(), SpeechFailure>
where
    E: SpeechEngine,
    F: FnOnce() -> Result<E, SpeechFailure>,
{
    let mut engine = initialize_engine(create, config)?;
    engine.speak(message)?;
    engine.wait_until_done()
}

/// 播放一条语音提示，并向 `out` 写入且仅写入一行结果。
/// 所有失败都在这里被捕获，不会继续向上传播。
pub fn speak_with<E, F, W>(create: F, config: &Config, message: &str, out: &mut W) -> Outcome
where
    E: SpeechEngine,
    F: FnOnce() -> Result<E, SpeechFailure>,
    W: Write,
{
    info!("准备播报: '{}', 配置: {}", message, config.to_json());

    let (line, outcome) = match run(create, config, message) {
        Ok(()) => (format!("{}{}", SUCCESS_PREFIX, message), Outcome::Played),
        Err(e) => {
            debug!("语音播报失败: {:?}", e);
            (format!("{}{}", FAILURE_PREFIX, e), Outcome::Failed(e))
        }
    };

    if let Err(e) = writeln!(out, "{}", line) {
        warn!("写入控制台失败: {}", e);
    }
    outcome
}

/// 使用系统语音引擎和默认配置播放语音提示。
pub fn play_voice_prompt(message: &str) -> Outcome {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    speak_with(TtsEngine::new, &Config::default(), message, &mut out)
}
