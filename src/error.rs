// src/error.rs

use thiserror::Error;

/// 语音播放过程中的所有失败都归为这一类，在播放入口处统一捕获。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeechFailure {
    #[error("无法初始化语音引擎: {0}")]
    EngineUnavailable(String),

    #[error("设置语音参数失败: {0}")]
    Configure(String),

    #[error("获取可用语音列表失败: {0}")]
    VoiceEnumeration(String),

    #[error("切换语音失败: {0}")]
    VoiceSelection(String),

    #[error("语音播放出错: {0}")]
    Playback(String),
}
