// src/geometry.rs - Pixel-space distances and joint angles
use crate::landmarks::{FrameSize, Landmark};
use nalgebra::Vector2;

/// Euclidean distance between two landmarks after scaling to pixels.
pub fn pixel_distance(a: &Landmark, b: &Landmark, size: FrameSize) -> f64 {
    (size.to_pixels(&a.position) - size.to_pixels(&b.position)).norm()
}

/// Absolute vertical distance in pixels.
pub fn vertical_pixel_gap(a: &Landmark, b: &Landmark, size: FrameSize) -> f64 {
    (a.y() - b.y()).abs() * size.height
}

/// Absolute vertical distance as a fraction of frame height.
pub fn vertical_offset(a: &Landmark, b: &Landmark) -> f64 {
    (a.y() - b.y()).abs()
}

/// Absolute horizontal distance as a fraction of frame width.
pub fn horizontal_offset(a: &Landmark, b: &Landmark) -> f64 {
    (a.x() - b.x()).abs()
}

/// Angle in radians between two vectors, `None` if either has zero length.
pub fn angle_between_vectors(v1: &Vector2<f64>, v2: &Vector2<f64>) -> Option<f64> {
    let mag1 = v1.norm();
    let mag2 = v2.norm();

    if mag1 == 0.0 || mag2 == 0.0 {
        return None;
    }

    let cos_angle = (v1.dot(v2) / (mag1 * mag2)).clamp(-1.0, 1.0);
    Some(cos_angle.acos())
}

/// Interior angle at the elbow in degrees, measured in pixel space.
pub fn elbow_angle(
    shoulder: &Landmark,
    elbow: &Landmark,
    wrist: &Landmark,
    size: FrameSize,
) -> Option<f64> {
    let elbow_px = size.to_pixels(&elbow.position);
    let to_shoulder = size.to_pixels(&shoulder.position) - elbow_px;
    let to_wrist = size.to_pixels(&wrist.position) - elbow_px;

    angle_between_vectors(&to_shoulder, &to_wrist).map(f64::to_degrees)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: FrameSize = FrameSize {
        width: 1000.0,
        height: 1000.0,
    };

    #[test]
    fn test_pixel_distance_respects_aspect() {
        let a = Landmark::new(0.0, 0.0, 1.0);
        let b = Landmark::new(0.1, 0.1, 1.0);
        let size = FrameSize::new(300.0, 400.0);

        assert!((pixel_distance(&a, &b, size) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_elbow_angle_straight_arm() {
        let shoulder = Landmark::new(0.4, 0.3, 1.0);
        let elbow = Landmark::new(0.3, 0.3, 1.0);
        let wrist = Landmark::new(0.2, 0.3, 1.0);

        let angle = elbow_angle(&shoulder, &elbow, &wrist, SQUARE).unwrap();
        assert!((angle - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_elbow_angle_right_angle() {
        let shoulder = Landmark::new(0.5, 0.3, 1.0);
        let elbow = Landmark::new(0.5, 0.5, 1.0);
        let wrist = Landmark::new(0.7, 0.5, 1.0);

        let angle = elbow_angle(&shoulder, &elbow, &wrist, SQUARE).unwrap();
        assert!((angle - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_elbow_angle_degenerate_segment() {
        let shoulder = Landmark::new(0.5, 0.5, 1.0);
        let elbow = Landmark::new(0.5, 0.5, 1.0);
        let wrist = Landmark::new(0.7, 0.5, 1.0);

        assert!(elbow_angle(&shoulder, &elbow, &wrist, SQUARE).is_none());
    }

    #[test]
    fn test_angle_clamps_rounding_drift() {
        let v1 = Vector2::new(1e-8, 1.0);
        let v2 = Vector2::new(-1e-8, -1.0);
        let angle = angle_between_vectors(&v1, &v2).unwrap();
        assert!(angle.is_finite());
    }

    #[test]
    fn test_offsets() {
        let a = Landmark::new(0.2, 0.25, 1.0);
        let b = Landmark::new(0.3, 0.2, 1.0);

        assert!((vertical_offset(&a, &b) - 0.05).abs() < 1e-12);
        assert!((horizontal_offset(&a, &b) - 0.1).abs() < 1e-12);
        assert!((vertical_pixel_gap(&a, &b, SQUARE) - 50.0).abs() < 1e-9);
    }
}
