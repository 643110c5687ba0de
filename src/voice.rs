// src/voice.rs

/// 匹配中文语音时使用的关键字 (比较前统一转为小写)
pub const CHINESE_VOICE_KEYWORDS: [&str; 3] = ["chinese", "china", "mandarin"];

/// 系统提供的一个可选语音。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoiceDescriptor {
    pub id: String,
    pub name: String,
    /// 仅用于展示，不参与匹配
    pub language: Option<String>,
}

impl VoiceDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: None,
        }
    }

    pub fn is_chinese(&self) -> bool {
        let id = self.id.to_lowercase();
        let name = self.name.to_lowercase();
        CHINESE_VOICE_KEYWORDS
            .iter()
            .any(|keyword| id.contains(keyword) || name.contains(keyword))
    }
}

/// 按顺序返回第一个中文语音，找不到时返回 `None`。
pub fn find_chinese_voice(voices: &[VoiceDescriptor]) -> Option<&VoiceDescriptor> {
    voices.iter().find(|v| v.is_chinese())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_keyword_in_id_ignoring_case() {
        assert!(VoiceDescriptor::new("com.example.MANDARIN.premium", "Lili").is_chinese());
        assert!(VoiceDescriptor::new("voice-China-female", "Xiaoxiao").is_chinese());
    }

    #[test]
    fn matches_keyword_in_name() {
        assert!(VoiceDescriptor::new("cmn", "Mandarin (Simplified)").is_chinese());
        assert!(VoiceDescriptor::new("sit/cmn", "Chinese_(Mandarin)").is_chinese());
    }

    #[test]
    fn language_tag_alone_does_not_match() {
        let mut voice = VoiceDescriptor::new("com.apple.voice.Tingting", "Tingting");
        voice.language = Some("zh-CN".to_string());
        assert!(!voice.is_chinese());
    }

    #[test]
    fn first_match_wins() {
        let voices = vec![
            VoiceDescriptor::new("en-us", "English (America)"),
            VoiceDescriptor::new("zh-yue", "Chinese_(Cantonese)"),
            VoiceDescriptor::new("cmn", "Mandarin"),
        ];
        assert_eq!(find_chinese_voice(&voices).map(|v| v.id.as_str()), Some("zh-yue"));
    }

    #[test]
    fn no_match_falls_back_to_none() {
        let voices = vec![
            VoiceDescriptor::new("en-us", "English (America)"),
            VoiceDescriptor::new("de", "German"),
        ];
        assert_eq!(find_chinese_voice(&voices), None);
        assert_eq!(find_chinese_voice(&[]), None);
    }
}
