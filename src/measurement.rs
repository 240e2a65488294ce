use crate::detector::DetectedHand;
use crate::error::MeasurementError;
use crate::frame::Frame;
use crate::landmarks::{HandObservation, Landmark};

/// Pinch distance in pixels between thumb tip and index tip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub distance: f64,
    pub thumb: Landmark,
    pub index: Landmark,
}

/// Reduce one hand to its thumb-index pinch distance.
pub fn extract(hand: &HandObservation) -> Measurement {
    let thumb = hand.thumb_tip();
    let index = hand.index_tip();
    let dx = (index.x - thumb.x) as f64;
    let dy = (index.y - thumb.y) as f64;

    Measurement {
        distance: dx.hypot(dy),
        thumb,
        index,
    }
}

/// Hand used for control when the provider reports several: always the first
/// one reported.
pub fn primary_hand(hands: &[DetectedHand]) -> Option<&DetectedHand> {
    hands.first()
}

/// Measurement for a frame, absent when no hand was reported.
///
/// Only the primary hand is denormalized, so malformed extra hands never
/// affect the result.
pub fn measure_frame(
    hands: &[DetectedHand],
    frame: &Frame,
) -> Result<Option<Measurement>, MeasurementError> {
    primary_hand(hands)
        .map(|hand| hand.observe(frame).map(|observation| extract(&observation)))
        .transpose()
}
