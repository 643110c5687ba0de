// src/main.rs

use log::LevelFilter;

use voice_prompt::{play_voice_prompt, DEFAULT_MESSAGE};

fn main() {
    // 控制台只输出一行结果，日志走 stderr 且默认只记录警告
    simple_logging::log_to_stderr(LevelFilter::Warn);

    // 结果已由 play_voice_prompt 打印，失败时退出码同样为 0
    play_voice_prompt(DEFAULT_MESSAGE);
}
