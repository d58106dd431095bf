use thiserror::Error;

/// 姿勢解析コアのエラー
///
/// いずれもパイプラインにとって致命的ではない。フレーム単位でスキップされる。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PostureError {
    /// 推定器が人物を検出しなかった
    #[error("no person detected")]
    NoPersonDetected,

    /// 未検出・低信頼度のスナップショットでキャリブレーションを要求した
    #[error("invalid calibration target: {0}")]
    InvalidCalibrationTarget(String),

    /// 基準姿勢がまだ無い
    #[error("not calibrated")]
    NotCalibrated,

    /// 通知・音声の出力先が使えない
    #[error("sink unavailable: {0}")]
    SinkUnavailable(String),

    /// ランドマーク数が想定と異なる
    #[error("invalid snapshot: expected {expected} landmarks, got {actual}")]
    InvalidSnapshot { expected: usize, actual: usize },

    /// 推定器オプションが範囲外
    #[error("invalid estimator option: {0}")]
    InvalidOption(String),
}
