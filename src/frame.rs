use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

/// Pixel layout of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// Packed 8-bit RGB
    Rgb24,
    /// Packed 8-bit BGR (native order of most webcam pipelines)
    Bgr24,
}

impl FrameFormat {
    /// Get bytes per pixel for the format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            FrameFormat::Rgb24 | FrameFormat::Bgr24 => 3,
        }
    }

    /// Short tag used on the landmark provider wire
    pub fn tag(&self) -> &'static str {
        match self {
            FrameFormat::Rgb24 => "RGB",
            FrameFormat::Bgr24 => "BGR",
        }
    }
}

/// One captured image. Produced once per loop iteration and dropped at its end.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Monotonic frame identifier within one camera handle
    pub id: u64,
    /// Timestamp when frame was captured
    pub timestamp: SystemTime,
    /// Raw pixel data
    pub data: Arc<Vec<u8>>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel layout
    pub format: FrameFormat,
}

impl Frame {
    /// Create a new frame
    pub fn new(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FrameFormat,
    ) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
            format,
        }
    }

    /// Expected buffer length for the frame's dimensions and format
    pub fn expected_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Validate frame data size against expected size
    pub fn validate_size(&self) -> bool {
        self.data.len() == self.expected_size()
    }

    /// Convert a BGR frame to RGB, leaving RGB frames untouched
    pub fn to_rgb(&self) -> Frame {
        match self.format {
            FrameFormat::Rgb24 => self.clone(),
            FrameFormat::Bgr24 => {
                let mut data = self.data.as_ref().clone();
                for px in data.chunks_exact_mut(3) {
                    px.swap(0, 2);
                }
                Frame {
                    id: self.id,
                    timestamp: self.timestamp,
                    data: Arc::new(data),
                    width: self.width,
                    height: self.height,
                    format: FrameFormat::Rgb24,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_format_properties() {
        assert_eq!(FrameFormat::Rgb24.bytes_per_pixel(), 3);
        assert_eq!(FrameFormat::Bgr24.bytes_per_pixel(), 3);
        assert_eq!(FrameFormat::Rgb24.tag(), "RGB");
    }

    #[test]
    fn test_frame_size_validation() {
        let valid = Frame::new(1, SystemTime::now(), vec![0u8; 320 * 240 * 3], 320, 240, FrameFormat::Rgb24);
        assert!(valid.validate_size());

        let truncated = Frame::new(2, SystemTime::now(), vec![0u8; 100], 320, 240, FrameFormat::Rgb24);
        assert!(!truncated.validate_size());
    }

    #[test]
    fn test_bgr_to_rgb_swaps_channels() {
        let frame = Frame::new(7, SystemTime::now(), vec![1, 2, 3, 4, 5, 6], 2, 1, FrameFormat::Bgr24);
        let rgb = frame.to_rgb();

        assert_eq!(rgb.format, FrameFormat::Rgb24);
        assert_eq!(rgb.data.as_slice(), &[3, 2, 1, 6, 5, 4]);
        assert_eq!(rgb.id, 7);
    }
}
