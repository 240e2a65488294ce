use super::interface::{FrameSource, FrameSourceOpener, OpenRequest};
use crate::error::CameraError;
use crate::frame::{Frame, FrameFormat};
use async_trait::async_trait;
use std::time::SystemTime;
use tracing::{info, trace};

/// Test-pattern camera for running the loop without hardware
pub struct SyntheticCamera {
    index: u32,
    width: u32,
    height: u32,
    frame_counter: u64,
    open: bool,
}

impl SyntheticCamera {
    pub fn new(request: &OpenRequest) -> Self {
        Self {
            index: request.index,
            width: request.width,
            height: request.height,
            frame_counter: 0,
            open: true,
        }
    }
}

#[async_trait]
impl FrameSource for SyntheticCamera {
    async fn read(&mut self) -> Result<Frame, CameraError> {
        if !self.open {
            return Err(CameraError::Closed);
        }

        let frame_id = self.frame_counter;
        self.frame_counter += 1;

        // Slow horizontal gradient that shifts every frame
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for _y in 0..self.height {
            for x in 0..self.width {
                let shade = ((x as u64 + frame_id) % 256) as u8;
                data.extend_from_slice(&[shade, shade, shade]);
            }
        }

        trace!(
            "Generated synthetic frame {} ({}x{})",
            frame_id,
            self.width,
            self.height
        );

        Ok(Frame::new(
            frame_id,
            SystemTime::now(),
            data,
            self.width,
            self.height,
            FrameFormat::Rgb24,
        ))
    }

    fn close(&mut self) {
        self.open = false;
        info!("Synthetic camera {} closed after {} frames", self.index, self.frame_counter);
    }

    fn describe(&self) -> String {
        format!("synthetic:{} ({}x{})", self.index, self.width, self.height)
    }
}

/// Opener for [`SyntheticCamera`]
#[derive(Debug, Default, Clone)]
pub struct SyntheticOpener;

#[async_trait]
impl FrameSourceOpener for SyntheticOpener {
    async fn open(&self, request: &OpenRequest) -> Result<Box<dyn FrameSource>, CameraError> {
        info!(
            "Opening synthetic camera {} ({}x{})",
            request.index, request.width, request.height
        );
        Ok(Box::new(SyntheticCamera::new(request)))
    }
}
