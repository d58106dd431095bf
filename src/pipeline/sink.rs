use serde::{Deserialize, Serialize};
use std::process::{Command, Stdio};

use crate::error::PostureError;
use crate::posture::PostureStatus;
use crate::render::SkeletonOverlay;

/// 画面に出すステータスラベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusLabel {
    Good,
    NeedsImprovement,
    /// 人物は居るが基準姿勢がまだ無い
    Analyzing,
    Undetected,
}

impl From<PostureStatus> for StatusLabel {
    fn from(status: PostureStatus) -> Self {
        match status {
            PostureStatus::Good => StatusLabel::Good,
            PostureStatus::NeedsImprovement => StatusLabel::NeedsImprovement,
        }
    }
}

/// 描画側への更新メッセージ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiEvent {
    Overlay(SkeletonOverlay),
    Status(StatusLabel),
    Feedback(String),
    Alert(String),
    Calibrated,
    CalibrationRejected(String),
}

pub trait UiSink {
    fn emit(&mut self, event: UiEvent);
}

/// デスクトップ通知など。許可が無ければ `SinkUnavailable`
pub trait NotificationSink {
    fn notify(&mut self, text: &str) -> Result<(), PostureError>;
}

/// 読み上げ。対応していない環境では `SinkUnavailable`
pub trait SpeechSink {
    fn speak(&mut self, text: &str) -> Result<(), PostureError>;
}

/// 何もしない出力先
pub struct NullSink;

impl UiSink for NullSink {
    fn emit(&mut self, _event: UiEvent) {}
}

impl NotificationSink for NullSink {
    fn notify(&mut self, _text: &str) -> Result<(), PostureError> {
        Ok(())
    }
}

impl SpeechSink for NullSink {
    fn speak(&mut self, _text: &str) -> Result<(), PostureError> {
        Ok(())
    }
}

impl UiSink for Vec<UiEvent> {
    fn emit(&mut self, event: UiEvent) {
        self.push(event);
    }
}

/// 外部コマンド（say / espeak）で読み上げる
///
/// 終了は待たない。起動できなければ `SinkUnavailable`。
pub struct CommandSpeech {
    command: Vec<String>,
}

impl CommandSpeech {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl SpeechSink for CommandSpeech {
    fn speak(&mut self, text: &str) -> Result<(), PostureError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| PostureError::SinkUnavailable("no speech command configured".to_string()))?;
        Command::new(program)
            .args(args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| PostureError::SinkUnavailable(format!("{}: {}", program, e)))
    }
}

/// 出力先一式
pub struct Sinks {
    pub ui: Box<dyn UiSink + Send>,
    pub notification: Box<dyn NotificationSink + Send>,
    pub speech: Box<dyn SpeechSink + Send>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_label_from_posture_status() {
        assert_eq!(StatusLabel::from(PostureStatus::Good), StatusLabel::Good);
        assert_eq!(
            StatusLabel::from(PostureStatus::NeedsImprovement),
            StatusLabel::NeedsImprovement
        );
    }

    #[test]
    fn test_ui_event_json() {
        let json = serde_json::to_string(&UiEvent::Status(StatusLabel::Undetected)).unwrap();
        assert_eq!(json, r#"{"status":"UNDETECTED"}"#);
        let json = serde_json::to_string(&UiEvent::Status(StatusLabel::Analyzing)).unwrap();
        assert_eq!(json, r#"{"status":"ANALYZING"}"#);
        let json = serde_json::to_string(&UiEvent::Calibrated).unwrap();
        assert_eq!(json, r#""calibrated""#);
    }

    #[test]
    fn test_empty_speech_command_unavailable() {
        let mut speech = CommandSpeech::new(Vec::new());
        assert!(matches!(speech.speak("hello"), Err(PostureError::SinkUnavailable(_))));
    }

    #[test]
    fn test_missing_speech_program_unavailable() {
        let mut speech = CommandSpeech::new(vec!["posture-guard-no-such-tts".to_string()]);
        assert!(matches!(speech.speak("hello"), Err(PostureError::SinkUnavailable(_))));
    }

    #[test]
    fn test_vec_collects_events() {
        let mut events: Vec<UiEvent> = Vec::new();
        events.emit(UiEvent::Feedback("x".to_string()));
        assert_eq!(events, vec![UiEvent::Feedback("x".to_string())]);
    }
}
