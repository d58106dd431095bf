use serde::{Deserialize, Serialize};

use super::geometry;
use crate::config::AnalysisConfig;
use crate::pose::{LandmarkIndex, LandmarkSnapshot};

pub const MSG_GOOD: &str = "Great posture! Keep it up!";
pub const MSG_ANALYZING: &str = "Analyzing posture...";
pub const MSG_LIFT_HEAD: &str = "Lift your head slightly";
pub const MSG_LOWER_HEAD: &str = "Lower your head slightly";
pub const MSG_RAISE_LEFT_SHOULDER: &str = "Raise your left shoulder";
pub const MSG_RAISE_RIGHT_SHOULDER: &str = "Raise your right shoulder";
pub const MSG_LEANING_FORWARD: &str = "Adjust your back posture, you are leaning forward";
pub const MSG_LEANING_BACKWARD: &str = "Adjust your back posture, you are leaning backward";
pub const MSG_NECK: &str = "Stretch your neck and relax shoulders";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostureStatus {
    Good,
    NeedsImprovement,
}

/// 1フレーム分の基準姿勢との比較結果
///
/// `status` が `None` のときは未キャリブレーション（評価不能）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationReport {
    /// 鼻のY差（正: 頭が下がった）
    pub head_offset: f32,
    /// 左右の肩のY差（絶対値）
    pub shoulder_tilt: f32,
    /// 背中角度の差（絶対値, ラジアン）
    pub back_angle_delta: f32,
    /// 背中角度の差（符号付き, 正: 前傾）
    pub lean_delta: f32,
    /// 首長さの短縮量（正: 縮んだ）
    pub neck_shortening: f32,
    pub messages: Vec<String>,
    pub status: Option<PostureStatus>,
}

impl DeviationReport {
    pub fn not_calibrated() -> Self {
        Self {
            head_offset: 0.0,
            shoulder_tilt: 0.0,
            back_angle_delta: 0.0,
            lean_delta: 0.0,
            neck_shortening: 0.0,
            messages: vec![MSG_ANALYZING.to_string()],
            status: None,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.status.is_some()
    }

    /// UI・読み上げ用のフィードバック文
    pub fn feedback_text(&self) -> String {
        self.messages.join(". ")
    }
}

/// 現在の姿勢を基準姿勢と比較する
pub struct PostureEvaluator {
    config: AnalysisConfig,
}

impl PostureEvaluator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn evaluate(
        &self,
        current: &LandmarkSnapshot,
        reference: Option<&LandmarkSnapshot>,
    ) -> DeviationReport {
        let reference = match reference {
            Some(r) => r,
            None => return DeviationReport::not_calibrated(),
        };
        let c = &self.config;
        let mut messages: Vec<String> = Vec::new();

        // 頭の高さ
        let head_offset = current.get(LandmarkIndex::Nose).y - reference.get(LandmarkIndex::Nose).y;
        if head_offset > c.head_offset {
            messages.push(MSG_LIFT_HEAD.to_string());
        } else if head_offset < -c.head_offset {
            messages.push(MSG_LOWER_HEAD.to_string());
        }

        // 肩の傾き: Yが大きい（画面上で低い）側を上げる
        let left = current.get(LandmarkIndex::LeftShoulder);
        let right = current.get(LandmarkIndex::RightShoulder);
        let shoulder_tilt = (left.y - right.y).abs();
        if shoulder_tilt > c.shoulder_tilt {
            messages.push(if left.y > right.y {
                MSG_RAISE_LEFT_SHOULDER.to_string()
            } else {
                MSG_RAISE_RIGHT_SHOULDER.to_string()
            });
        }

        // 背中の角度（前傾・後傾は同じ角度の符号で判定）
        let lean_delta = geometry::back_angle(current) - geometry::back_angle(reference);
        let back_angle_delta = lean_delta.abs();
        if back_angle_delta > c.back_angle {
            messages.push(if lean_delta > 0.0 {
                MSG_LEANING_FORWARD.to_string()
            } else {
                MSG_LEANING_BACKWARD.to_string()
            });
        }

        // 首: 鼻と肩が近づいたら猫背
        let neck = geometry::neck_length(current);
        let ref_neck = geometry::neck_length(reference);
        if neck < ref_neck * c.neck_ratio {
            messages.push(MSG_NECK.to_string());
        }

        let status = if messages.is_empty() {
            messages.push(MSG_GOOD.to_string());
            PostureStatus::Good
        } else {
            PostureStatus::NeedsImprovement
        };

        DeviationReport {
            head_offset,
            shoulder_tilt,
            back_angle_delta,
            lean_delta,
            neck_shortening: ref_neck - neck,
            messages,
            status: Some(status),
        }
    }
}

impl Default for PostureEvaluator {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
