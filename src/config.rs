// src/config.rs

use serde::Serialize;

/// 默认的语音提示内容
pub const DEFAULT_MESSAGE: &str = "主人运行完毕，过来看看！";

/// 只用于记录日志，不从文件读取
#[derive(Serialize, Clone, Debug, PartialEq)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct Config {
    /// 语速，单位为每分钟字数
    pub rate_wpm: u32,
    /// 音量，0.0 (静音) 到 1.0 (最大)
    pub volume: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rate_wpm: 150,
            volume: 1.0,
        }
    }
}

impl Config {
    /// 用于日志输出的 JSON 形式。
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}
