use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::pose::EstimatorOptions;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub estimator: EstimatorOptions,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// 姿勢評価の閾値（正規化座標・ラジアン）
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// 鼻の上下ずれ
    #[serde(default = "default_head_offset")]
    pub head_offset: f32,
    /// 左右の肩の高さの差
    #[serde(default = "default_shoulder_tilt")]
    pub shoulder_tilt: f32,
    /// 肩中点→腰中点の角度差（ラジアン）
    #[serde(default = "default_back_angle")]
    pub back_angle: f32,
    /// 首長さの比率（これを下回ると猫背）
    #[serde(default = "default_neck_ratio")]
    pub neck_ratio: f32,
    /// オーバーレイ用: 肩の水平判定
    #[serde(default = "default_shoulders_level")]
    pub shoulders_level: f32,
    /// オーバーレイ用: 背筋の直線判定（ラジアン）
    #[serde(default = "default_back_straight")]
    pub back_straight: f32,
    /// オーバーレイ用: 基準より鼻がカメラに近づいた量（z）
    #[serde(default = "default_face_close")]
    pub face_close: f32,
}

fn default_head_offset() -> f32 { 0.03 }
fn default_shoulder_tilt() -> f32 { 0.02 }
fn default_back_angle() -> f32 { 0.1 }
fn default_neck_ratio() -> f32 { 0.95 }
fn default_shoulders_level() -> f32 { 0.05 }
fn default_back_straight() -> f32 { 0.1 }
fn default_face_close() -> f32 { 0.5 }

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            head_offset: default_head_offset(),
            shoulder_tilt: default_shoulder_tilt(),
            back_angle: default_back_angle(),
            neck_ratio: default_neck_ratio(),
            shoulders_level: default_shoulders_level(),
            back_straight: default_back_straight(),
            face_close: default_face_close(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AlertConfig {
    /// 連続で悪い姿勢が続いたら警告するフレーム数
    #[serde(default = "default_bad_frames")]
    pub bad_frames: u32,
    /// 音声警告のクールダウン（ミリ秒）
    #[serde(default = "default_speech_cooldown_ms")]
    pub speech_cooldown_ms: u64,
    /// 通知テキスト
    #[serde(default = "default_notification_text")]
    pub notification_text: String,
}

fn default_bad_frames() -> u32 { 60 }
fn default_speech_cooldown_ms() -> u64 { 30_000 }
fn default_notification_text() -> String { "Posture needs attention!".to_string() }

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            bad_frames: default_bad_frames(),
            speech_cooldown_ms: default_speech_cooldown_ms(),
            notification_text: default_notification_text(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct CalibrationConfig {
    /// 基準姿勢として受け入れる最低可視性
    #[serde(default = "default_min_visibility")]
    pub min_visibility: f32,
}

fn default_min_visibility() -> f32 { 0.5 }

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_visibility: default_min_visibility(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AudioConfig {
    /// 起動時の音声警告の有効/無効
    #[serde(default = "default_audio_enabled")]
    pub enabled: bool,
    /// 読み上げコマンド（テキストは最後の引数として渡す）
    #[serde(default = "default_speech_command")]
    pub speech_command: Vec<String>,
}

fn default_audio_enabled() -> bool { true }
fn default_speech_command() -> Vec<String> {
    if cfg!(target_os = "macos") {
        vec!["say".to_string()]
    } else {
        vec!["espeak".to_string(), "-v".to_string(), "en-us".to_string()]
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: default_audio_enabled(),
            speech_command: default_speech_command(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// 処理スレッドへのフレームキュー長。満杯なら新しいフレームを捨てる
    #[serde(default = "default_frame_queue")]
    pub frame_queue: usize,
    #[serde(default)]
    pub verbose: bool,
}

fn default_listen_addr() -> String { "127.0.0.1:9300".to_string() }
fn default_frame_queue() -> usize { 1 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            frame_queue: default_frame_queue(),
            verbose: false,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.estimator.validate()?;
        Ok(config)
    }

    /// 読めなければデフォルト値で続行
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Config: {:#} (using defaults)", e);
                Self::default()
            }
        }
    }
}
