use std::sync::mpsc::Receiver;
use std::time::Instant;

use super::controls::SessionControls;
use super::sink::{Sinks, StatusLabel, UiEvent};
use crate::config::Config;
use crate::logging::LogFile;
use crate::pose::{LandmarkSnapshot, PoseEstimator};
use crate::posture::{AlertAction, AlertThrottler, DeviationReport, PostureEvaluator, ReferenceStore};
use crate::render::build_overlay;

/// 1フレームの処理結果
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// 推定器エラーでスキップ
    Skipped,
    /// 人物なし
    Undetected,
    /// 基準姿勢なし
    Uncalibrated,
    Evaluated {
        report: DeviationReport,
        action: AlertAction,
    },
}

/// フレーム処理パイプライン
///
/// 基準姿勢と警告状態はこの構造体だけが持つ。フレームは必ず1つずつ
/// `process_frame` を最後まで通す。
pub struct FramePipeline<E: PoseEstimator> {
    estimator: E,
    evaluator: PostureEvaluator,
    reference: ReferenceStore,
    throttler: AlertThrottler,
    controls: SessionControls,
    sinks: Sinks,
    notification_text: String,
    min_visibility: f32,
    logfile: LogFile,
    notification_warned: bool,
    speech_warned: bool,
}

impl<E: PoseEstimator> FramePipeline<E> {
    pub fn new(
        estimator: E,
        config: &Config,
        controls: SessionControls,
        sinks: Sinks,
        logfile: LogFile,
    ) -> Self {
        Self {
            estimator,
            evaluator: PostureEvaluator::new(config.analysis),
            reference: ReferenceStore::from_config(&config.calibration),
            throttler: AlertThrottler::from_config(&config.alert),
            controls,
            sinks,
            notification_text: config.alert.notification_text.clone(),
            min_visibility: config.calibration.min_visibility,
            logfile,
            notification_warned: false,
            speech_warned: false,
        }
    }

    pub fn controls(&self) -> &SessionControls {
        &self.controls
    }

    pub fn reference(&self) -> &ReferenceStore {
        &self.reference
    }

    pub fn throttler(&self) -> &AlertThrottler {
        &self.throttler
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn process_frame(&mut self, frame: &E::Frame, now: Instant) -> FrameOutcome {
        // 1. 推定
        let points = match self.estimator.estimate(frame) {
            Ok(Some(points)) => points,
            Ok(None) => return self.undetected(),
            Err(e) => {
                crate::log!(self.logfile, "[estimator] frame skipped: {:#}", e);
                return FrameOutcome::Skipped;
            }
        };

        // 2. スナップショット
        let snapshot = match LandmarkSnapshot::from_points(&points) {
            Ok(s) => s,
            Err(e) => {
                crate::log!(self.logfile, "[estimator] {}", e);
                return self.undetected();
            }
        };
        self.controls.set_person_detected(true);

        // 3. 骨格描画（キャリブレーション状態に関わらず）
        let overlay = build_overlay(
            &snapshot,
            self.reference.current(),
            self.evaluator.config(),
            self.min_visibility,
        );
        self.sinks.ui.emit(UiEvent::Overlay(overlay));

        // 4. 同期点: ユーザー操作はここでだけ反映する
        let sync = self.controls.sync();
        if sync.calibrate {
            self.calibrate(&snapshot);
        }

        // 5. 基準姿勢なし
        let reference = match self.reference.require() {
            Ok(reference) => reference,
            Err(_) => {
                let placeholder = DeviationReport::not_calibrated();
                self.sinks.ui.emit(UiEvent::Status(StatusLabel::Analyzing));
                self.sinks.ui.emit(UiEvent::Feedback(placeholder.feedback_text()));
                return FrameOutcome::Uncalibrated;
            }
        };
        let report = self.evaluator.evaluate(&snapshot, Some(reference));
        let Some(status) = report.status else {
            return FrameOutcome::Uncalibrated;
        };

        // 6. 評価・間引き・出力
        let feedback = report.feedback_text();
        self.sinks.ui.emit(UiEvent::Status(StatusLabel::from(status)));
        self.sinks.ui.emit(UiEvent::Feedback(feedback.clone()));

        let action = self.throttler.observe(report.status, now, sync.audio_enabled);
        self.dispatch(action, &feedback);

        FrameOutcome::Evaluated { report, action }
    }

    /// 受信側が閉じるまでフレームを順に処理する
    pub fn run(&mut self, rx: &Receiver<E::Frame>) {
        for frame in rx.iter() {
            self.process_frame(&frame, Instant::now());
        }
    }

    fn undetected(&mut self) -> FrameOutcome {
        self.controls.set_person_detected(false);
        self.sinks.ui.emit(UiEvent::Status(StatusLabel::Undetected));
        FrameOutcome::Undetected
    }

    fn calibrate(&mut self, snapshot: &LandmarkSnapshot) {
        match self.reference.calibrate(snapshot) {
            Ok(()) => {
                crate::log!(self.logfile, "Calibration complete");
                self.sinks.ui.emit(UiEvent::Calibrated);
            }
            Err(e) => {
                crate::log!(self.logfile, "Calibration rejected: {}", e);
                self.sinks.ui.emit(UiEvent::CalibrationRejected(e.to_string()));
            }
        }
    }

    fn dispatch(&mut self, action: AlertAction, feedback: &str) {
        if action.is_visual() {
            self.sinks.ui.emit(UiEvent::Alert(self.notification_text.clone()));
            if let Err(e) = self.sinks.notification.notify(&self.notification_text) {
                if !self.notification_warned {
                    crate::log!(self.logfile, "[notify] {}", e);
                    self.notification_warned = true;
                }
            }
        }
        if action.is_speech() {
            if let Err(e) = self.sinks.speech.speak(feedback) {
                if !self.speech_warned {
                    crate::log!(self.logfile, "[speech] {}", e);
                    self.speech_warned = true;
                }
            }
        }
    }
}
