use crate::config::CalibrationConfig;
use crate::error::PostureError;
use crate::pose::LandmarkSnapshot;

/// 基準となる「良い姿勢」を保持する
///
/// 書き込みは `calibrate` のみ。セッション中は期限切れにならない。
pub struct ReferenceStore {
    min_visibility: f32,
    reference: Option<LandmarkSnapshot>,
}

impl ReferenceStore {
    pub fn new(min_visibility: f32) -> Self {
        Self {
            min_visibility,
            reference: None,
        }
    }

    pub fn from_config(config: &CalibrationConfig) -> Self {
        Self::new(config.min_visibility)
    }

    /// 基準姿勢を置き換える。無効なスナップショットなら何も変えない
    pub fn calibrate(&mut self, snapshot: &LandmarkSnapshot) -> Result<(), PostureError> {
        let missing = snapshot.missing_required(self.min_visibility);
        if !missing.is_empty() {
            return Err(PostureError::InvalidCalibrationTarget(format!(
                "low visibility: {:?}",
                missing
            )));
        }
        self.reference = Some(snapshot.clone());
        Ok(())
    }

    pub fn current(&self) -> Option<&LandmarkSnapshot> {
        self.reference.as_ref()
    }

    /// 基準姿勢が無ければ `NotCalibrated`
    pub fn require(&self) -> Result<&LandmarkSnapshot, PostureError> {
        self.reference.as_ref().ok_or(PostureError::NotCalibrated)
    }

    pub fn is_calibrated(&self) -> bool {
        self.reference.is_some()
    }
}
