use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::pose::{LandmarkIndex, LandmarkSnapshot};
use crate::posture::geometry;

/// 骨格の接続定義 (開始ランドマーク, 終了ランドマーク)
pub const POSE_CONNECTIONS: [(LandmarkIndex, LandmarkIndex); 18] = [
    // 顔
    (LandmarkIndex::LeftEar, LandmarkIndex::LeftEye),
    (LandmarkIndex::LeftEye, LandmarkIndex::Nose),
    (LandmarkIndex::Nose, LandmarkIndex::RightEye),
    (LandmarkIndex::RightEye, LandmarkIndex::RightEar),
    (LandmarkIndex::MouthLeft, LandmarkIndex::MouthRight),
    // 上半身
    (LandmarkIndex::LeftShoulder, LandmarkIndex::RightShoulder),
    (LandmarkIndex::LeftShoulder, LandmarkIndex::LeftElbow),
    (LandmarkIndex::LeftElbow, LandmarkIndex::LeftWrist),
    (LandmarkIndex::RightShoulder, LandmarkIndex::RightElbow),
    (LandmarkIndex::RightElbow, LandmarkIndex::RightWrist),
    // 胴体
    (LandmarkIndex::LeftShoulder, LandmarkIndex::LeftHip),
    (LandmarkIndex::RightShoulder, LandmarkIndex::RightHip),
    (LandmarkIndex::LeftHip, LandmarkIndex::RightHip),
    // 下半身
    (LandmarkIndex::LeftHip, LandmarkIndex::LeftKnee),
    (LandmarkIndex::RightHip, LandmarkIndex::RightKnee),
    (LandmarkIndex::LeftKnee, LandmarkIndex::LeftAnkle),
    (LandmarkIndex::RightKnee, LandmarkIndex::RightAnkle),
    (LandmarkIndex::LeftAnkle, LandmarkIndex::RightAnkle),
];

/// キーポイントの色 (RGB)
pub const KEYPOINT_COLOR: u32 = 0xFFFFFF; // 白

/// 骨格線の色 (RGB)
pub const SKELETON_COLOR: u32 = 0xFFFFFF; // 白

/// 判定OKの指標色 (RGB)
pub const GOOD_COLOR: u32 = 0x00FF00; // 緑

/// 判定NGの指標色 (RGB)
pub const BAD_COLOR: u32 = 0xFF0000; // 赤

/// 可視性が低いキーポイントの色 (RGB)
pub const LOW_VISIBILITY_COLOR: u32 = 0x808080; // 灰

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayPoint {
    pub x: f32,
    pub y: f32,
    pub color: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlaySegment {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub color: u32,
}

/// 描画側に渡すスケルトン描画コマンド（正規化座標）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SkeletonOverlay {
    pub points: Vec<OverlayPoint>,
    pub segments: Vec<OverlaySegment>,
}

fn is_face(a: LandmarkIndex) -> bool {
    (a as usize) <= LandmarkIndex::MouthRight as usize
}

fn is_shoulder_line(a: LandmarkIndex, b: LandmarkIndex) -> bool {
    matches!(
        (a, b),
        (LandmarkIndex::LeftShoulder, LandmarkIndex::RightShoulder)
    )
}

fn is_back_line(a: LandmarkIndex, b: LandmarkIndex) -> bool {
    use LandmarkIndex::*;
    matches!(
        (a, b),
        (LeftShoulder, LeftHip) | (RightShoulder, RightHip) | (LeftHip, LeftKnee) | (RightHip, RightKnee)
    )
}

/// スナップショットから描画コマンドを作る
///
/// 肩のラインは水平判定、胴体と太ももは背筋判定、顔は基準姿勢があれば
/// 下向き・接近判定で緑/赤に塗り分ける。
pub fn build_overlay(
    snapshot: &LandmarkSnapshot,
    reference: Option<&LandmarkSnapshot>,
    config: &AnalysisConfig,
    min_visibility: f32,
) -> SkeletonOverlay {
    let indicator = |ok: bool| if ok { GOOD_COLOR } else { BAD_COLOR };

    let level = geometry::shoulders_level(
        snapshot.get(LandmarkIndex::LeftShoulder),
        snapshot.get(LandmarkIndex::RightShoulder),
        config.shoulders_level,
    );
    let straight = geometry::back_straight(
        &geometry::shoulder_midpoint(snapshot),
        &geometry::hip_midpoint(snapshot),
        &geometry::knee_midpoint(snapshot),
        config.back_straight,
    );
    let head_color = reference.map(|r| {
        let ok = !geometry::head_dropped(snapshot, r) && !geometry::face_too_close(snapshot, r, config.face_close);
        indicator(ok)
    });

    let points = snapshot
        .points()
        .iter()
        .map(|p| OverlayPoint {
            x: p.x,
            y: p.y,
            color: if p.is_visible(min_visibility) { KEYPOINT_COLOR } else { LOW_VISIBILITY_COLOR },
        })
        .collect();

    let segments = POSE_CONNECTIONS
        .iter()
        .filter(|(a, b)| {
            snapshot.get(*a).is_visible(min_visibility) && snapshot.get(*b).is_visible(min_visibility)
        })
        .map(|&(a, b)| {
            let color = if is_shoulder_line(a, b) {
                indicator(level)
            } else if is_back_line(a, b) {
                indicator(straight)
            } else if is_face(a) && is_face(b) {
                head_color.unwrap_or(SKELETON_COLOR)
            } else {
                SKELETON_COLOR
            };
            let (pa, pb) = (snapshot.get(a), snapshot.get(b));
            OverlaySegment {
                from: (pa.x, pa.y),
                to: (pb.x, pb.y),
                color,
            }
        })
        .collect();

    SkeletonOverlay { points, segments }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::LandmarkPoint;

    fn set(points: &mut [LandmarkPoint], idx: LandmarkIndex, x: f32, y: f32) {
        points[idx as usize] = LandmarkPoint::new(x, y, 0.0, 0.9);
    }

    /// 立位: 肩・腰・膝が縦一直線
    fn standing() -> Vec<LandmarkPoint> {
        let mut pts = vec![LandmarkPoint::new(0.5, 0.1, 0.0, 0.9); LandmarkIndex::COUNT];
        set(&mut pts, LandmarkIndex::MouthLeft, 0.47, 0.15);
        set(&mut pts, LandmarkIndex::MouthRight, 0.53, 0.15);
        set(&mut pts, LandmarkIndex::LeftShoulder, 0.4, 0.3);
        set(&mut pts, LandmarkIndex::RightShoulder, 0.6, 0.3);
        set(&mut pts, LandmarkIndex::LeftHip, 0.4, 0.6);
        set(&mut pts, LandmarkIndex::RightHip, 0.6, 0.6);
        set(&mut pts, LandmarkIndex::LeftKnee, 0.4, 0.9);
        set(&mut pts, LandmarkIndex::RightKnee, 0.6, 0.9);
        pts
    }

    fn segment_color(overlay: &SkeletonOverlay, from: &LandmarkPoint, to: &LandmarkPoint) -> u32 {
        overlay
            .segments
            .iter()
            .find(|s| s.from == (from.x, from.y) && s.to == (to.x, to.y))
            .map(|s| s.color)
            .unwrap()
    }

    #[test]
    fn test_connection_count() {
        assert_eq!(POSE_CONNECTIONS.len(), 18);
    }

    #[test]
    fn test_level_and_straight_are_green() {
        let s = LandmarkSnapshot::from_points(&standing()).unwrap();
        let overlay = build_overlay(&s, None, &AnalysisConfig::default(), 0.5);
        assert_eq!(overlay.points.len(), LandmarkIndex::COUNT);
        let ls = s.get(LandmarkIndex::LeftShoulder);
        let rs = s.get(LandmarkIndex::RightShoulder);
        let lh = s.get(LandmarkIndex::LeftHip);
        assert_eq!(segment_color(&overlay, ls, rs), GOOD_COLOR);
        assert_eq!(segment_color(&overlay, ls, lh), GOOD_COLOR);
    }

    #[test]
    fn test_tilted_shoulders_are_red() {
        let mut pts = standing();
        set(&mut pts, LandmarkIndex::RightShoulder, 0.6, 0.4);
        let s = LandmarkSnapshot::from_points(&pts).unwrap();
        let overlay = build_overlay(&s, None, &AnalysisConfig::default(), 0.5);
        let ls = s.get(LandmarkIndex::LeftShoulder);
        let rs = s.get(LandmarkIndex::RightShoulder);
        assert_eq!(segment_color(&overlay, ls, rs), BAD_COLOR);
    }

    #[test]
    fn test_face_uncoloured_without_reference() {
        let s = LandmarkSnapshot::from_points(&standing()).unwrap();
        let overlay = build_overlay(&s, None, &AnalysisConfig::default(), 0.5);
        let ml = s.get(LandmarkIndex::MouthLeft);
        let mr = s.get(LandmarkIndex::MouthRight);
        assert_eq!(segment_color(&overlay, ml, mr), SKELETON_COLOR);
    }

    #[test]
    fn test_face_green_against_itself() {
        let s = LandmarkSnapshot::from_points(&standing()).unwrap();
        let overlay = build_overlay(&s, Some(&s), &AnalysisConfig::default(), 0.5);
        let ml = s.get(LandmarkIndex::MouthLeft);
        let mr = s.get(LandmarkIndex::MouthRight);
        assert_eq!(segment_color(&overlay, ml, mr), GOOD_COLOR);
    }

    #[test]
    fn test_face_close_threshold_from_config() {
        let reference = LandmarkSnapshot::from_points(&standing()).unwrap();
        let mut pts = standing();
        pts[LandmarkIndex::Nose as usize].z = -0.3;
        let s = LandmarkSnapshot::from_points(&pts).unwrap();
        let ml = s.get(LandmarkIndex::MouthLeft);
        let mr = s.get(LandmarkIndex::MouthRight);

        let overlay = build_overlay(&s, Some(&reference), &AnalysisConfig::default(), 0.5);
        assert_eq!(segment_color(&overlay, ml, mr), GOOD_COLOR);

        let strict = AnalysisConfig { face_close: 0.2, ..AnalysisConfig::default() };
        let overlay = build_overlay(&s, Some(&reference), &strict, 0.5);
        assert_eq!(segment_color(&overlay, ml, mr), BAD_COLOR);
    }

    #[test]
    fn test_invisible_points_skip_segments() {
        let mut pts = standing();
        pts[LandmarkIndex::LeftWrist as usize].visibility = 0.1;
        let s = LandmarkSnapshot::from_points(&pts).unwrap();
        let overlay = build_overlay(&s, None, &AnalysisConfig::default(), 0.5);
        assert_eq!(overlay.segments.len(), POSE_CONNECTIONS.len() - 1);
        assert_eq!(overlay.points[LandmarkIndex::LeftWrist as usize].color, LOW_VISIBILITY_COLOR);
    }
}
