//! Hand landmark model.
//!
//! Landmarks follow the 21-point hand topology used by common hand-pose
//! estimators: wrist at 0, then four joints per digit from thumb to pinky.
//! Providers report normalized `[0, 1]` coordinates; the loop converts them to
//! pixel coordinates against the frame the hand was detected in.

use crate::error::MeasurementError;
use serde::{Deserialize, Serialize};

pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;

/// Number of keypoints in one hand
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Keypoint as reported by the landmark provider, normalized to the frame size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLandmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: Option<f64>,
}

impl NormalizedLandmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }
}

/// Keypoint in pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    /// Position within the hand topology
    pub id: usize,
    pub x: i32,
    pub y: i32,
    /// Relative depth, passed through from the provider when present
    pub z: Option<f64>,
}

impl Landmark {
    /// Scale a normalized keypoint onto a `width` x `height` frame. Pixel
    /// coordinates are truncated toward zero.
    pub fn from_normalized(id: usize, point: &NormalizedLandmark, width: u32, height: u32) -> Self {
        Self {
            id,
            x: (point.x * width as f64) as i32,
            y: (point.y * height as f64) as i32,
            z: point.z,
        }
    }
}

/// All landmarks of one detected hand in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    landmarks: Vec<Landmark>,
}

impl HandObservation {
    /// Build an observation, enforcing the topology length and that every
    /// landmark sits at the position matching its id.
    pub fn new(landmarks: Vec<Landmark>) -> Result<Self, MeasurementError> {
        if landmarks.len() != HAND_LANDMARK_COUNT {
            return Err(MeasurementError::TopologyMismatch {
                expected: HAND_LANDMARK_COUNT,
                actual: landmarks.len(),
            });
        }

        if let Some((position, lm)) = landmarks.iter().enumerate().find(|(i, lm)| lm.id != *i) {
            return Err(MeasurementError::MisplacedLandmark {
                position,
                id: lm.id,
            });
        }

        Ok(Self { landmarks })
    }

    /// Denormalize a provider hand against the frame dimensions
    pub fn from_normalized(
        points: &[NormalizedLandmark],
        width: u32,
        height: u32,
    ) -> Result<Self, MeasurementError> {
        let landmarks = points
            .iter()
            .enumerate()
            .map(|(id, p)| Landmark::from_normalized(id, p, width, height))
            .collect();

        Self::new(landmarks)
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn thumb_tip(&self) -> Landmark {
        self.landmarks[THUMB_TIP]
    }

    pub fn index_tip(&self) -> Landmark {
        self.landmarks[INDEX_TIP]
    }
}

#[cfg(test)]
pub(crate) fn hand_with_tips(thumb: (f64, f64), index: (f64, f64)) -> Vec<NormalizedLandmark> {
    let mut points = vec![NormalizedLandmark::new(0.5, 0.5); HAND_LANDMARK_COUNT];
    points[THUMB_TIP] = NormalizedLandmark::new(thumb.0, thumb.1);
    points[INDEX_TIP] = NormalizedLandmark::new(index.0, index.1);
    points
}
