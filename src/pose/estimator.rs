use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::landmark::LandmarkPoint;
use crate::error::PostureError;

/// 推定モデルの複雑度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelComplexity {
    Lite,
    Full,
    Heavy,
}

impl Default for ModelComplexity {
    fn default() -> Self {
        Self::Full
    }
}

/// 外部推定器に渡す検出・追跡オプション
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorOptions {
    #[serde(default = "default_confidence")]
    pub min_detection_confidence: f32,
    #[serde(default = "default_confidence")]
    pub min_tracking_confidence: f32,
    #[serde(default)]
    pub model_complexity: ModelComplexity,
}

fn default_confidence() -> f32 { 0.5 }

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            min_detection_confidence: default_confidence(),
            min_tracking_confidence: default_confidence(),
            model_complexity: ModelComplexity::default(),
        }
    }
}

impl EstimatorOptions {
    /// 信頼度が 0.0〜1.0 に収まっているか検証
    pub fn validate(&self) -> Result<(), PostureError> {
        for (name, value) in [
            ("min_detection_confidence", self.min_detection_confidence),
            ("min_tracking_confidence", self.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PostureError::InvalidOption(format!(
                    "{} must be within 0.0..=1.0, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// 画像フレームからランドマークを推定する外部コンポーネント
///
/// 人物が居なければ `Ok(None)`。推論失敗は `Err` で、そのフレームはスキップされる。
pub trait PoseEstimator {
    type Frame;

    fn estimate(&mut self, frame: &Self::Frame) -> Result<Option<Vec<LandmarkPoint>>>;

    fn options(&self) -> EstimatorOptions {
        EstimatorOptions::default()
    }
}

/// 推定済みランドマークを運ぶフレーム
///
/// 推定が別プロセス（ブラウザ・推論サーバ）で行われる場合に使う。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub timestamp_us: u64,
    pub landmarks: Option<Vec<LandmarkPoint>>,
}

/// `LandmarkFrame` の中身をそのまま返す推定器
pub struct RemoteEstimator {
    options: EstimatorOptions,
}

impl RemoteEstimator {
    pub fn new(options: EstimatorOptions) -> Self {
        Self { options }
    }
}

impl PoseEstimator for RemoteEstimator {
    type Frame = LandmarkFrame;

    fn estimate(&mut self, frame: &LandmarkFrame) -> Result<Option<Vec<LandmarkPoint>>> {
        Ok(frame.landmarks.clone().filter(|l| !l.is_empty()))
    }

    fn options(&self) -> EstimatorOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = EstimatorOptions::default();
        assert_eq!(opts.min_detection_confidence, 0.5);
        assert_eq!(opts.min_tracking_confidence, 0.5);
        assert_eq!(opts.model_complexity, ModelComplexity::Full);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_validate_out_of_range() {
        let opts = EstimatorOptions {
            min_detection_confidence: 1.5,
            ..Default::default()
        };
        assert!(matches!(opts.validate(), Err(PostureError::InvalidOption(_))));

        let opts = EstimatorOptions {
            min_tracking_confidence: -0.1,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_model_complexity_from_toml() {
        let opts: EstimatorOptions = toml::from_str("model_complexity = \"heavy\"").unwrap();
        assert_eq!(opts.model_complexity, ModelComplexity::Heavy);
        assert_eq!(opts.min_detection_confidence, 0.5);
    }

    #[test]
    fn test_remote_estimator_empty_is_undetected() {
        let mut est = RemoteEstimator::new(EstimatorOptions::default());
        let frame = LandmarkFrame { timestamp_us: 0, landmarks: Some(Vec::new()) };
        assert!(est.estimate(&frame).unwrap().is_none());

        let frame = LandmarkFrame { timestamp_us: 0, landmarks: None };
        assert!(est.estimate(&frame).unwrap().is_none());
    }

    #[test]
    fn test_remote_estimator_passthrough() {
        let mut est = RemoteEstimator::new(EstimatorOptions::default());
        let points = vec![LandmarkPoint::new(0.1, 0.2, 0.0, 0.9); 33];
        let frame = LandmarkFrame { timestamp_us: 10, landmarks: Some(points.clone()) };
        assert_eq!(est.estimate(&frame).unwrap(), Some(points));
    }
}
