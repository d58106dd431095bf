//! ランドマーク間の幾何計算
//!
//! 画像座標系（Yは下向きが正）。z はスクリーン上の比較では使わない。

use crate::pose::{LandmarkIndex, LandmarkPoint, LandmarkSnapshot};

/// 2点の中点（可視性は低い方）
pub fn midpoint(a: &LandmarkPoint, b: &LandmarkPoint) -> LandmarkPoint {
    LandmarkPoint::new(
        (a.x + b.x) / 2.0,
        (a.y + b.y) / 2.0,
        (a.z + b.z) / 2.0,
        a.visibility.min(b.visibility),
    )
}

/// p1→p2 の向き（ラジアン, -π〜π）
pub fn angle(p1: &LandmarkPoint, p2: &LandmarkPoint) -> f32 {
    f32::atan2(p2.y - p1.y, p2.x - p1.x)
}

/// XY平面上のユークリッド距離
pub fn distance(p1: &LandmarkPoint, p2: &LandmarkPoint) -> f32 {
    (p2.x - p1.x).hypot(p2.y - p1.y)
}

pub fn shoulders_level(left: &LandmarkPoint, right: &LandmarkPoint, threshold: f32) -> bool {
    (left.y - right.y).abs() < threshold
}

/// 肩→腰と腰→膝の角度差が閾値未満か
pub fn back_straight(
    shoulder: &LandmarkPoint,
    hip: &LandmarkPoint,
    knee: &LandmarkPoint,
    threshold: f32,
) -> bool {
    let upper = angle(shoulder, hip);
    let lower = angle(hip, knee);
    (upper - lower).abs() < threshold
}

pub fn shoulder_midpoint(s: &LandmarkSnapshot) -> LandmarkPoint {
    midpoint(s.get(LandmarkIndex::LeftShoulder), s.get(LandmarkIndex::RightShoulder))
}

pub fn hip_midpoint(s: &LandmarkSnapshot) -> LandmarkPoint {
    midpoint(s.get(LandmarkIndex::LeftHip), s.get(LandmarkIndex::RightHip))
}

pub fn knee_midpoint(s: &LandmarkSnapshot) -> LandmarkPoint {
    midpoint(s.get(LandmarkIndex::LeftKnee), s.get(LandmarkIndex::RightKnee))
}

/// 肩中点→腰中点の角度。直立でおよそ π/2
pub fn back_angle(s: &LandmarkSnapshot) -> f32 {
    angle(&shoulder_midpoint(s), &hip_midpoint(s))
}

/// 鼻から肩中点までの距離
pub fn neck_length(s: &LandmarkSnapshot) -> f32 {
    distance(s.get(LandmarkIndex::Nose), &shoulder_midpoint(s))
}

/// 下を向いているか
///
/// 鼻の下がり幅が、基準姿勢での鼻→口の縦幅を超えたら下向きとみなす。
pub fn head_dropped(current: &LandmarkSnapshot, reference: &LandmarkSnapshot) -> bool {
    let nose = current.get(LandmarkIndex::Nose).y;
    let ref_nose = reference.get(LandmarkIndex::Nose).y;
    let ref_mouth = reference.get(LandmarkIndex::MouthLeft).y;
    nose - ref_nose > ref_mouth - ref_nose
}

/// 顔が画面に近づきすぎているか（z は手前ほど小さい）
pub fn face_too_close(current: &LandmarkSnapshot, reference: &LandmarkSnapshot, threshold: f32) -> bool {
    reference.get(LandmarkIndex::Nose).z - current.get(LandmarkIndex::Nose).z > threshold
}
