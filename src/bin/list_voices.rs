// src/bin/list_voices.rs

use log::LevelFilter;

use voice_prompt::{find_chinese_voice, SpeechEngine, TtsEngine, VoiceDescriptor};

/// 列表末尾的说明，选中了中文语音时不需要说明
fn summary(supports_voices: bool, chosen: Option<&VoiceDescriptor>) -> Option<&'static str> {
    if !supports_voices {
        Some("此语音引擎不支持列出语音，语音提示将使用系统默认语音。")
    } else if chosen.is_none() {
        Some("未找到中文语音，语音提示将使用系统默认语音。")
    } else {
        None
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    simple_logging::log_to_stderr(LevelFilter::Warn);

    let engine = TtsEngine::new()?;
    let voices = engine.list_voices()?;
    let chosen = find_chinese_voice(&voices);

    println!("=============================================");
    println!("           系统中所有可用的TTS语音           ");
    println!("=============================================");

    for voice in &voices {
        let marker = if chosen == Some(voice) {
            "  <-- 语音提示将使用此语音"
        } else {
            ""
        };
        println!("  名称: {}{}", voice.name, marker);
        println!("  标识: {}", voice.id);
        println!("  语言: {}", voice.language.as_deref().unwrap_or("未知"));
        println!("---------------------------------------------");
    }

    if let Some(line) = summary(engine.supports_voices(), chosen) {
        println!("{}", line);
    }

    Ok(())
}
