use crate::app::LoopState;
use crate::mapper::VolumeRange;
use crate::measurement::Measurement;

/// Annotations drawn over one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub frame_id: u64,
    pub state: LoopState,
    /// Pinch measurement, absent when no hand was seen
    pub measurement: Option<Measurement>,
    /// Level reported by the sink, absent when the read failed
    pub volume: Option<f64>,
    pub range: Option<VolumeRange>,
}

impl Overlay {
    pub fn new(frame_id: u64, state: LoopState) -> Self {
        Self {
            frame_id,
            state,
            measurement: None,
            volume: None,
            range: None,
        }
    }

    /// Thumb tip and index tip markers in pixel space
    pub fn markers(&self) -> Option<[(i32, i32); 2]> {
        self.measurement
            .map(|m| [(m.thumb.x, m.thumb.y), (m.index.x, m.index.y)])
    }

    /// Segment joining the two markers
    pub fn line(&self) -> Option<((i32, i32), (i32, i32))> {
        self.markers().map(|[a, b]| (a, b))
    }

    pub fn volume_label(&self) -> String {
        match self.volume {
            Some(level) => format!("vol {:.2}", level),
            None => "vol --".to_string(),
        }
    }

    /// Position of the current level inside the range, 0.0 to 1.0
    pub fn volume_fraction(&self) -> Option<f64> {
        let (level, range) = (self.volume?, self.range?);
        let span = range.max() - range.min();
        if span <= 0.0 {
            return Some(1.0);
        }
        Some(((level - range.min()) / span).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{hand_with_tips, HandObservation};
    use crate::measurement::extract;

    #[test]
    fn test_overlay_without_hand() {
        let overlay = Overlay::new(4, LoopState::Running);
        assert_eq!(overlay.markers(), None);
        assert_eq!(overlay.line(), None);
        assert_eq!(overlay.volume_label(), "vol --");
        assert_eq!(overlay.volume_fraction(), None);
    }

    #[test]
    fn test_overlay_markers_and_label() {
        let hand =
            HandObservation::from_normalized(&hand_with_tips((0.1, 0.1), (0.5, 0.5)), 200, 100)
                .unwrap();
        let mut overlay = Overlay::new(1, LoopState::Running);
        overlay.measurement = Some(extract(&hand));
        overlay.volume = Some(-30.0);
        overlay.range = Some(VolumeRange::new(-60.0, 0.0).unwrap());

        assert_eq!(overlay.markers(), Some([(20, 10), (100, 50)]));
        assert_eq!(overlay.line(), Some(((20, 10), (100, 50))));
        assert_eq!(overlay.volume_label(), "vol -30.00");
        assert_eq!(overlay.volume_fraction(), Some(0.5));
    }
}
