use std::time::{Duration, Instant};

use super::evaluator::PostureStatus;
use crate::config::AlertConfig;

/// 警告の発火条件
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertPolicy {
    /// 連続で悪い姿勢が続いたら警告するフレーム数
    pub bad_frames: u32,
    /// 音声警告の最小間隔
    pub speech_cooldown: Duration,
}

impl AlertPolicy {
    pub fn from_config(config: &AlertConfig) -> Self {
        Self {
            bad_frames: config.bad_frames.max(1),
            speech_cooldown: Duration::from_millis(config.speech_cooldown_ms),
        }
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::from_config(&AlertConfig::default())
    }
}

/// 1フレームで発火させる副作用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    None,
    Visual,
    VisualAndSpeech,
}

impl AlertAction {
    pub fn is_visual(&self) -> bool {
        !matches!(self, AlertAction::None)
    }

    pub fn is_speech(&self) -> bool {
        matches!(self, AlertAction::VisualAndSpeech)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThrottleState {
    pub consecutive_bad_frames: u32,
    pub last_alert: Option<Instant>,
}

impl ThrottleState {
    /// 状態遷移。`status` が `None`（未キャリブレーション）は GOOD と同じ扱い
    ///
    /// 視覚警告はクールダウンなし、音声警告のみ `speech_cooldown` で間引く。
    /// `speech_enabled` が偽なら音声は出さず `last_alert` も更新しない。
    pub fn advance(
        self,
        status: Option<PostureStatus>,
        now: Instant,
        speech_enabled: bool,
        policy: &AlertPolicy,
    ) -> (ThrottleState, AlertAction) {
        if status != Some(PostureStatus::NeedsImprovement) {
            let next = ThrottleState {
                consecutive_bad_frames: 0,
                ..self
            };
            return (next, AlertAction::None);
        }

        let count = self.consecutive_bad_frames + 1;
        if count < policy.bad_frames {
            let next = ThrottleState {
                consecutive_bad_frames: count,
                ..self
            };
            return (next, AlertAction::None);
        }

        let cooled_down = match self.last_alert {
            Some(last) => now.saturating_duration_since(last) > policy.speech_cooldown,
            None => true,
        };

        if speech_enabled && cooled_down {
            let next = ThrottleState {
                consecutive_bad_frames: 0,
                last_alert: Some(now),
            };
            (next, AlertAction::VisualAndSpeech)
        } else {
            let next = ThrottleState {
                consecutive_bad_frames: 0,
                ..self
            };
            (next, AlertAction::Visual)
        }
    }
}

/// 警告の間引き
pub struct AlertThrottler {
    policy: AlertPolicy,
    state: ThrottleState,
}

impl AlertThrottler {
    pub fn new(policy: AlertPolicy) -> Self {
        Self {
            policy,
            state: ThrottleState::default(),
        }
    }

    pub fn from_config(config: &AlertConfig) -> Self {
        Self::new(AlertPolicy::from_config(config))
    }

    /// 評価済みフレームごとに1回呼ぶ
    pub fn observe(
        &mut self,
        status: Option<PostureStatus>,
        now: Instant,
        speech_enabled: bool,
    ) -> AlertAction {
        let (next, action) = self.state.advance(status, now, speech_enabled, &self.policy);
        self.state = next;
        action
    }

    pub fn state(&self) -> &ThrottleState {
        &self.state
    }
}
