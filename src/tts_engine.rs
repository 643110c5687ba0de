// src/tts_engine.rs

use std::fmt::Debug;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use tts::{Features, Tts, UtteranceId};

use crate::error::SpeechFailure;
use crate::voice::VoiceDescriptor;

/// 引擎 "正常语速" 对应的每分钟字数
pub const NORMAL_WPM: f32 = 200.0;
/// 映射到引擎最大语速的每分钟字数
pub const MAX_WPM: f32 = 500.0;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// 轮询模式下等待语音开始播放的上限
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// 平台语音合成能力。每次播放独占一个实例，用完即丢弃。
pub trait SpeechEngine {
    /// 以每分钟字数设置语速
    fn set_rate(&mut self, wpm: u32) -> Result<(), SpeechFailure>;
    /// 以 0.0 ~ 1.0 设置音量
    fn set_volume(&mut self, volume: f32) -> Result<(), SpeechFailure>;
    fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechFailure>;
    fn set_voice(&mut self, voice: &VoiceDescriptor) -> Result<(), SpeechFailure>;
    fn speak(&mut self, text: &str) -> Result<(), SpeechFailure>;
    /// 阻塞直到当前语音播放结束
    fn wait_until_done(&mut self) -> Result<(), SpeechFailure>;
}

/// 把每分钟字数分段线性地映射到引擎自己的语速区间，超出范围时截断。
pub fn wpm_to_engine_rate(wpm: u32, min: f32, normal: f32, max: f32) -> f32 {
    let wpm = (wpm as f32).clamp(0.0, MAX_WPM);
    if wpm <= NORMAL_WPM {
        min + (normal - min) * (wpm / NORMAL_WPM)
    } else {
        normal + (max - normal) * ((wpm - NORMAL_WPM) / (MAX_WPM - NORMAL_WPM))
    }
}

pub fn fraction_to_engine_volume(volume: f32, min: f32, max: f32) -> f32 {
    min + (max - min) * volume.clamp(0.0, 1.0)
}

/// 按语速估算朗读时长。非 ASCII 的词 (如中文) 每个字按一个词计。
pub fn estimated_duration(text: &str, wpm: u32) -> Duration {
    let words: usize = text
        .split_whitespace()
        .map(|token| {
            if token.is_ascii() {
                1
            } else {
                token.chars().count()
            }
        })
        .sum();
    Duration::from_millis(words as u64 * 60_000 / u64::from(wpm.max(1)))
}

/// 阻塞等待指定语音的结束事件。`id` 为 `None` 时任意一条结束事件都算。
pub fn wait_for_utterance_end<T>(
    ends: &Receiver<T>,
    id: Option<&T>,
) -> Result<(), SpeechFailure>
where
    T: PartialEq + Debug,
{
    loop {
        let ended = ends.recv().map_err(|_| {
            SpeechFailure::Playback("语音引擎在播放结束前断开".to_string())
        })?;
        match id {
            Some(id) if *id != ended => debug!("忽略其他语音的结束事件: {:?}", ended),
            _ => return Ok(()),
        }
    }
}

/// 先等语音开始播放 (最多 `startup`)，再等它播放结束。
pub fn poll_until_finished<F>(
    mut is_speaking: F,
    interval: Duration,
    startup: Duration,
) -> Result<(), SpeechFailure>
where
    F: FnMut() -> Result<bool, SpeechFailure>,
{
    let started = Instant::now();
    while !is_speaking()? {
        if started.elapsed() >= startup {
            warn!("{:?} 内未检测到语音开始播放，停止等待。", startup);
            return Ok(());
        }
        thread::sleep(interval);
    }
    while is_speaking()? {
        thread::sleep(interval);
    }
    Ok(())
}

struct Pending {
    id: Option<UtteranceId>,
    ends: Option<Receiver<UtteranceId>>,
    text: String,
}

pub struct TtsEngine {
    tts: Tts,
    features: Features,
    rate_wpm: u32,
    pending: Option<Pending>,
}

impl TtsEngine {
    pub fn new() -> Result<Self, SpeechFailure> {
        let tts = Tts::default().map_err(|e| SpeechFailure::EngineUnavailable(e.to_string()))?;
        let features = tts.supported_features();
        debug!("语音引擎已创建，支持的功能: {:?}", features);
        Ok(TtsEngine {
            tts,
            features,
            rate_wpm: NORMAL_WPM as u32,
            pending: None,
        })
    }

    /// 引擎能否列出可选语音
    pub fn supports_voices(&self) -> bool {
        self.features.voice
    }

    // 必须在 speak 之前注册，否则短语音的结束事件可能丢失
    fn subscribe_utterance_end(&self) -> Result<Receiver<UtteranceId>, SpeechFailure> {
        let (end_tx, ends) = mpsc::channel();
        let stop_tx = end_tx.clone();
        self.tts
            .on_utterance_end(Some(Box::new(move |id: UtteranceId| {
                let _ = end_tx.send(id);
            })))
            .map_err(|e| SpeechFailure::Playback(e.to_string()))?;
        self.tts
            .on_utterance_stop(Some(Box::new(move |id: UtteranceId| {
                let _ = stop_tx.send(id);
            })))
            .map_err(|e| SpeechFailure::Playback(e.to_string()))?;
        Ok(ends)
    }
}

impl SpeechEngine for TtsEngine {
    fn set_rate(&mut self, wpm: u32) -> Result<(), SpeechFailure> {
        if !self.features.rate {
            warn!("当前语音引擎不支持调整语速，保持默认语速。");
            return Ok(());
        }
        let rate = wpm_to_engine_rate(
            wpm,
            self.tts.min_rate(),
            self.tts.normal_rate(),
            self.tts.max_rate(),
        );
        debug!("语速 {} 字/分钟 -> 引擎语速 {}", wpm, rate);
        self.tts
            .set_rate(rate)
            .map_err(|e| SpeechFailure::Configure(e.to_string()))?;
        self.rate_wpm = wpm;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), SpeechFailure> {
        if !self.features.volume {
            warn!("当前语音引擎不支持调整音量，保持默认音量。");
            return Ok(());
        }
        let engine_volume =
            fraction_to_engine_volume(volume, self.tts.min_volume(), self.tts.max_volume());
        debug!("音量 {} -> 引擎音量 {}", volume, engine_volume);
        self.tts
            .set_volume(engine_volume)
            .map_err(|e| SpeechFailure::Configure(e.to_string()))?;
        Ok(())
    }

    fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SpeechFailure> {
        if !self.features.voice {
            warn!("当前语音引擎不支持切换语音，将使用默认语音。");
            return Ok(vec![]);
        }
        let voices = self
            .tts
            .voices()
            .map_err(|e| SpeechFailure::VoiceEnumeration(e.to_string()))?;
        Ok(voices
            .iter()
            .map(|v| VoiceDescriptor {
                id: v.id(),
                name: v.name(),
                language: Some(v.language().to_string()),
            })
            .collect())
    }

    fn set_voice(&mut self, voice: &VoiceDescriptor) -> Result<(), SpeechFailure> {
        let voices = self
            .tts
            .voices()
            .map_err(|e| SpeechFailure::VoiceSelection(e.to_string()))?;
        let target = voices
            .iter()
            .find(|v| v.id() == voice.id)
            .ok_or_else(|| {
                SpeechFailure::VoiceSelection(format!("语音 '{}' 已不可用", voice.id))
            })?;
        self.tts
            .set_voice(target)
            .map_err(|e| SpeechFailure::VoiceSelection(e.to_string()))
    }

    fn speak(&mut self, text: &str) -> Result<(), SpeechFailure> {
        let ends = if self.features.utterance_callbacks {
            Some(self.subscribe_utterance_end()?)
        } else {
            None
        };
        let id = self
            .tts
            .speak(text, false)
            .map_err(|e| SpeechFailure::Playback(e.to_string()))?;
        debug!("已提交语音: {:?}", id);
        self.pending = Some(Pending {
            id,
            ends,
            text: text.to_string(),
        });
        Ok(())
    }

    fn wait_until_done(&mut self) -> Result<(), SpeechFailure> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };

        if let Some(ends) = &pending.ends {
            debug!("等待语音结束回调。");
            return wait_for_utterance_end(ends, pending.id.as_ref());
        }

        if self.features.is_speaking {
            debug!("轮询播放状态直到语音结束。");
            let tts = &self.tts;
            return poll_until_finished(
                || {
                    tts.is_speaking()
                        .map_err(|e| SpeechFailure::Playback(e.to_string()))
                },
                POLL_INTERVAL,
                STARTUP_TIMEOUT,
            );
        }

        let estimate = estimated_duration(&pending.text, self.rate_wpm);
        warn!("当前语音引擎无法报告播放状态，按估算时长 {:?} 等待。", estimate);
        thread::sleep(estimate);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    fn assert_close(actual: f32, expected: f32) {
        assert!((actual - expected).abs() < 1e-4, "{} != {}", actual, expected);
    }

    #[test]
    fn rate_150_on_speech_dispatcher_scale() {
        assert_close(wpm_to_engine_rate(150, -100.0, 0.0, 100.0), -25.0);
    }

    #[test]
    fn rate_150_on_winrt_scale() {
        assert_close(wpm_to_engine_rate(150, 0.5, 1.0, 6.0), 0.875);
    }

    #[test]
    fn rate_endpoints_and_clamping() {
        assert_close(wpm_to_engine_rate(0, 0.1, 0.5, 2.0), 0.1);
        assert_close(wpm_to_engine_rate(200, 0.1, 0.5, 2.0), 0.5);
        assert_close(wpm_to_engine_rate(500, 0.1, 0.5, 2.0), 2.0);
        assert_close(wpm_to_engine_rate(9000, 0.1, 0.5, 2.0), 2.0);
        assert_close(wpm_to_engine_rate(350, -100.0, 0.0, 100.0), 50.0);
    }

    #[test]
    fn full_volume_maps_to_engine_maximum() {
        assert_close(fraction_to_engine_volume(1.0, 0.0, 100.0), 100.0);
        assert_close(fraction_to_engine_volume(1.0, -100.0, 100.0), 100.0);
        assert_close(fraction_to_engine_volume(0.5, -100.0, 100.0), 0.0);
        assert_close(fraction_to_engine_volume(3.0, 0.0, 1.0), 1.0);
        assert_close(fraction_to_engine_volume(-1.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn end_event_for_our_utterance_unblocks() {
        let (tx, rx) = mpsc::channel();
        let ours = 7u64;
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            tx.send(ours).unwrap();
        });
        assert_eq!(wait_for_utterance_end(&rx, Some(&ours)), Ok(()));
    }

    #[test]
    fn end_events_of_other_utterances_are_skipped() {
        let (tx, rx) = mpsc::channel();
        tx.send(3u64).unwrap();
        tx.send(4u64).unwrap();
        tx.send(7u64).unwrap();
        assert_eq!(wait_for_utterance_end(&rx, Some(&7)), Ok(()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unknown_utterance_id_accepts_first_end_event() {
        let (tx, rx) = mpsc::channel();
        tx.send(42u64).unwrap();
        assert_eq!(wait_for_utterance_end(&rx, None), Ok(()));
    }

    #[test]
    fn dropped_engine_before_end_is_playback_failure() {
        let (tx, rx) = mpsc::channel::<u64>();
        tx.send(1).unwrap();
        drop(tx);
        let result = wait_for_utterance_end(&rx, Some(&2));
        assert!(matches!(result, Err(SpeechFailure::Playback(_))));
    }

    fn scripted(states: &[bool]) -> RefCell<VecDeque<bool>> {
        RefCell::new(states.iter().copied().collect())
    }

    #[test]
    fn slow_start_is_waited_for_before_polling_for_end() {
        // 前几次轮询时引擎还没开始播放
        let states = scripted(&[false, false, false, true, true, false]);
        let result = poll_until_finished(
            || Ok(states.borrow_mut().pop_front().unwrap_or(false)),
            Duration::ZERO,
            Duration::from_secs(5),
        );
        assert_eq!(result, Ok(()));
        assert!(states.borrow().is_empty());
    }

    #[test]
    fn never_starting_gives_up_after_startup_timeout() {
        let polls = RefCell::new(0);
        let result = poll_until_finished(
            || {
                *polls.borrow_mut() += 1;
                Ok(false)
            },
            Duration::from_millis(5),
            Duration::from_millis(30),
        );
        assert_eq!(result, Ok(()));
        assert!(*polls.borrow() > 1);
    }

    #[test]
    fn status_error_is_playback_failure() {
        let result = poll_until_finished(
            || Err(SpeechFailure::Playback("status unavailable".to_string())),
            Duration::ZERO,
            Duration::from_secs(1),
        );
        assert_eq!(result, Err(SpeechFailure::Playback("status unavailable".to_string())));
    }

    #[test]
    fn duration_estimate_counts_chinese_characters() {
        // 12 个字符，150 字/分钟
        assert_eq!(
            estimated_duration("主人运行完毕，过来看看！", 150),
            Duration::from_millis(4800)
        );
        assert_eq!(estimated_duration("the run finished", 120), Duration::from_millis(1500));
        assert_eq!(estimated_duration("", 150), Duration::ZERO);
    }
}
