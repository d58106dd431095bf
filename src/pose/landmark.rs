use serde::{Deserialize, Serialize};

use crate::error::PostureError;

/// BlazePose の 33 ランドマークインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    pub const COUNT: usize = 33;

    /// 姿勢評価に必須のランドマーク
    pub const REQUIRED: [LandmarkIndex; 8] = [
        LandmarkIndex::Nose,
        LandmarkIndex::MouthLeft,
        LandmarkIndex::LeftShoulder,
        LandmarkIndex::RightShoulder,
        LandmarkIndex::LeftHip,
        LandmarkIndex::RightHip,
        LandmarkIndex::LeftKnee,
        LandmarkIndex::RightKnee,
    ];
}

/// 単一ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    /// 正規化されたX座標 (0.0〜1.0)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0, 下向きが正)
    pub y: f32,
    /// 腰中心を基準にした相対奥行き
    #[serde(default)]
    pub z: f32,
    /// 可視性スコア (0.0〜1.0)
    #[serde(default)]
    pub visibility: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    /// 可視性が閾値以上か
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility >= threshold
    }
}

impl Default for LandmarkPoint {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            visibility: 0.0,
        }
    }
}

/// 1フレーム分の 33 ランドマーク
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSnapshot {
    points: [LandmarkPoint; LandmarkIndex::COUNT],
}

impl LandmarkSnapshot {
    pub fn new(points: [LandmarkPoint; LandmarkIndex::COUNT]) -> Self {
        Self { points }
    }

    /// 推定器の出力から構築する。個数が違えば未検出扱い。
    pub fn from_points(points: &[LandmarkPoint]) -> Result<Self, PostureError> {
        let points: [LandmarkPoint; LandmarkIndex::COUNT] =
            points.try_into().map_err(|_| PostureError::InvalidSnapshot {
                expected: LandmarkIndex::COUNT,
                actual: points.len(),
            })?;
        Ok(Self { points })
    }

    /// インデックスでランドマークを取得
    pub fn get(&self, index: LandmarkIndex) -> &LandmarkPoint {
        &self.points[index as usize]
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    /// 必須ランドマークがすべて閾値以上の可視性を持つか
    pub fn is_valid(&self, min_visibility: f32) -> bool {
        LandmarkIndex::REQUIRED
            .iter()
            .all(|&idx| self.get(idx).is_visible(min_visibility))
    }

    /// 必須ランドマークのうち可視性不足のもの
    pub fn missing_required(&self, min_visibility: f32) -> Vec<LandmarkIndex> {
        LandmarkIndex::REQUIRED
            .iter()
            .copied()
            .filter(|&idx| !self.get(idx).is_visible(min_visibility))
            .collect()
    }
}

impl Default for LandmarkSnapshot {
    fn default() -> Self {
        Self {
            points: [LandmarkPoint::default(); LandmarkIndex::COUNT],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_index_count() {
        assert_eq!(LandmarkIndex::COUNT, 33);
    }

    #[test]
    fn test_landmark_index_discriminants() {
        assert_eq!(LandmarkIndex::Nose as usize, 0);
        assert_eq!(LandmarkIndex::MouthLeft as usize, 9);
        assert_eq!(LandmarkIndex::RightKnee as usize, 26);
        assert_eq!(LandmarkIndex::RightFootIndex as usize, LandmarkIndex::COUNT - 1);
    }

    #[test]
    fn test_from_points_wrong_length() {
        let points = vec![LandmarkPoint::default(); 17];
        let err = LandmarkSnapshot::from_points(&points).unwrap_err();
        assert_eq!(err, PostureError::InvalidSnapshot { expected: 33, actual: 17 });
    }

    #[test]
    fn test_from_points_keeps_order() {
        let points: Vec<LandmarkPoint> = (0..LandmarkIndex::COUNT)
            .map(|i| LandmarkPoint::new(i as f32 / 100.0, 0.0, 0.0, 1.0))
            .collect();
        let snapshot = LandmarkSnapshot::from_points(&points).unwrap();
        assert_eq!(snapshot.get(LandmarkIndex::LeftHip).x, 0.23);
    }

    #[test]
    fn test_is_valid_requires_visibility() {
        let mut points = [LandmarkPoint::new(0.5, 0.5, 0.0, 0.9); LandmarkIndex::COUNT];
        let snapshot = LandmarkSnapshot::new(points);
        assert!(snapshot.is_valid(0.5));

        points[LandmarkIndex::LeftKnee as usize].visibility = 0.2;
        let snapshot = LandmarkSnapshot::new(points);
        assert!(!snapshot.is_valid(0.5));
        assert_eq!(snapshot.missing_required(0.5), vec![LandmarkIndex::LeftKnee]);
    }

    #[test]
    fn test_is_valid_ignores_optional_points() {
        let mut points = [LandmarkPoint::new(0.5, 0.5, 0.0, 0.9); LandmarkIndex::COUNT];
        points[LandmarkIndex::LeftAnkle as usize].visibility = 0.0;
        assert!(LandmarkSnapshot::new(points).is_valid(0.5));
    }

    #[test]
    fn test_point_deserialize_defaults() {
        let p: LandmarkPoint = serde_json::from_str(r#"{"x":0.1,"y":0.2}"#).unwrap();
        assert_eq!(p.z, 0.0);
        assert_eq!(p.visibility, 0.0);
    }
}
