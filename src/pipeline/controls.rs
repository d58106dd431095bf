use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::PostureError;

struct ControlFlags {
    calibration_pending: AtomicBool,
    audio_enabled: AtomicBool,
    person_detected: AtomicBool,
}

/// ユーザー操作（キャリブレーション要求・音声切替）の受け口
///
/// どのスレッドからでも書けるが、パイプラインはフレーム処理中の一箇所
/// （`sync`）でしか読まない。
#[derive(Clone)]
pub struct SessionControls {
    flags: Arc<ControlFlags>,
}

/// 同期点で読み取った操作内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSnapshot {
    pub calibrate: bool,
    pub audio_enabled: bool,
}

impl SessionControls {
    pub fn new(audio_enabled: bool) -> Self {
        Self {
            flags: Arc::new(ControlFlags {
                calibration_pending: AtomicBool::new(false),
                audio_enabled: AtomicBool::new(audio_enabled),
                person_detected: AtomicBool::new(false),
            }),
        }
    }

    /// キャリブレーションを予約する。直前のフレームで人物が居なければ拒否
    pub fn request_calibration(&self) -> Result<(), PostureError> {
        if !self.flags.person_detected.load(Ordering::Acquire) {
            return Err(PostureError::NoPersonDetected);
        }
        self.flags.calibration_pending.store(true, Ordering::Release);
        Ok(())
    }

    pub fn calibration_pending(&self) -> bool {
        self.flags.calibration_pending.load(Ordering::Acquire)
    }

    pub fn set_audio_enabled(&self, enabled: bool) {
        self.flags.audio_enabled.store(enabled, Ordering::Release);
    }

    pub fn audio_enabled(&self) -> bool {
        self.flags.audio_enabled.load(Ordering::Acquire)
    }

    /// 音声の有効/無効を反転し、新しい値を返す
    pub fn toggle_audio(&self) -> bool {
        !self.flags.audio_enabled.fetch_xor(true, Ordering::AcqRel)
    }

    /// 新しいクライアント用に検出状態と保留中の要求を捨てる（音声設定は残す）
    pub fn begin_session(&self) {
        self.flags.person_detected.store(false, Ordering::Release);
        self.flags.calibration_pending.store(false, Ordering::Release);
    }

    pub fn person_detected(&self) -> bool {
        self.flags.person_detected.load(Ordering::Acquire)
    }

    pub(crate) fn set_person_detected(&self, detected: bool) {
        self.flags.person_detected.store(detected, Ordering::Release);
    }

    /// 保留中のキャリブレーション要求を消費し、音声設定と一緒に返す
    pub(crate) fn sync(&self) -> ControlSnapshot {
        ControlSnapshot {
            calibrate: self.flags.calibration_pending.swap(false, Ordering::AcqRel),
            audio_enabled: self.flags.audio_enabled.load(Ordering::Acquire),
        }
    }
}

impl Default for SessionControls {
    fn default() -> Self {
        Self::new(true)
    }
}
