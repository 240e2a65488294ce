use super::interface::{FrameSource, FrameSourceOpener, OpenRequest};
use crate::error::CameraError;
use crate::frame::{Frame, FrameFormat};
use async_trait::async_trait;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, trace, warn};

/// Time allowed for the pipeline to reach PLAYING and deliver a first frame
const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

/// V4L2 camera captured through a GStreamer pipeline delivering packed RGB
pub struct GstCamera {
    index: u32,
    pipeline: Pipeline,
    appsink: AppSink,
    read_timeout: Duration,
    frame_counter: u64,
    pending: Option<Frame>,
}

impl GstCamera {
    /// Build the pipeline, start it, and wait for the first frame.
    fn start(request: &OpenRequest) -> Result<Self, CameraError> {
        gstreamer::init().map_err(|e| CameraError::Configuration {
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;

        let pipeline_desc = Self::build_pipeline_string(request);
        info!("Creating GStreamer pipeline: {}", pipeline_desc);

        let pipeline = gstreamer::parse::launch(&pipeline_desc)
            .map_err(|e| CameraError::DeviceUnavailable {
                device: request.index,
                details: format!("Failed to create pipeline: {}", e),
            })?
            .downcast::<Pipeline>()
            .map_err(|_| CameraError::Configuration {
                details: "Failed to downcast to Pipeline".to_string(),
            })?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| CameraError::Configuration {
                details: "Pipeline has no appsink named 'sink'".to_string(),
            })?
            .downcast::<AppSink>()
            .map_err(|_| CameraError::Configuration {
                details: "Element 'sink' is not an AppSink".to_string(),
            })?;

        let mut camera = Self {
            index: request.index,
            pipeline,
            appsink,
            read_timeout: request.read_timeout,
            frame_counter: 0,
            pending: None,
        };

        if let Err(e) = camera.verify_streaming() {
            camera.close();
            return Err(e);
        }

        Ok(camera)
    }

    fn build_pipeline_string(request: &OpenRequest) -> String {
        format!(
            "v4l2src device=/dev/video{} ! videoconvert ! videoscale ! \
             video/x-raw,format=RGB,width={},height={},framerate={}/1 ! \
             appsink name=sink sync=false max-buffers=2 drop=true emit-signals=false",
            request.index, request.width, request.height, request.fps
        )
    }

    /// A pipeline that was built but cannot stream is not a usable device.
    fn verify_streaming(&mut self) -> Result<(), CameraError> {
        let device = self.index;
        let unavailable = move |details: String| CameraError::DeviceUnavailable { device, details };

        self.pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| unavailable(format!("Failed to start pipeline: {}", e)))?;

        let timeout = gstreamer::ClockTime::from_mseconds(STARTUP_TIMEOUT.as_millis() as u64);
        let (result, current, _pending) = self.pipeline.state(timeout);
        if result.is_err() || current != gstreamer::State::Playing {
            return Err(unavailable(format!(
                "Pipeline did not reach PLAYING (state {:?})",
                current
            )));
        }

        let sample = self
            .appsink
            .try_pull_sample(timeout)
            .ok_or_else(|| unavailable("No frame received after start".to_string()))?;

        let frame = self
            .sample_to_frame(&sample)
            .map_err(|e| unavailable(e.to_string()))?;

        info!(
            "Camera {} streaming at {}x{}",
            self.index, frame.width, frame.height
        );
        self.pending = Some(frame);
        Ok(())
    }

    fn sample_to_frame(&mut self, sample: &gstreamer::Sample) -> Result<Frame, CameraError> {
        let buffer = sample.buffer().ok_or_else(|| CameraError::FrameUnavailable {
            details: "No buffer in sample".to_string(),
        })?;

        let caps = sample.caps().ok_or_else(|| CameraError::FrameUnavailable {
            details: "No caps in sample".to_string(),
        })?;

        let video_info = VideoInfo::from_caps(caps).map_err(|e| CameraError::FrameUnavailable {
            details: format!("Failed to get video info: {}", e),
        })?;

        let width = video_info.width();
        let height = video_info.height();
        let stride = video_info.stride()[0] as usize;
        let row_bytes = width as usize * 3;

        let map = buffer
            .map_readable()
            .map_err(|e| CameraError::FrameUnavailable {
                details: format!("Failed to map buffer: {}", e),
            })?;

        // Rows may be padded to the stride
        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for row in map.as_slice().chunks(stride).take(height as usize) {
            if row.len() < row_bytes {
                return Err(CameraError::FrameUnavailable {
                    details: format!("Short row: {} < {} bytes", row.len(), row_bytes),
                });
            }
            data.extend_from_slice(&row[..row_bytes]);
        }

        let frame_id = self.frame_counter;
        self.frame_counter += 1;

        trace!("Captured RGB frame {} ({}x{})", frame_id, width, height);

        Ok(Frame::new(
            frame_id,
            SystemTime::now(),
            data,
            width,
            height,
            FrameFormat::Rgb24,
        ))
    }
}

#[async_trait]
impl FrameSource for GstCamera {
    async fn read(&mut self) -> Result<Frame, CameraError> {
        if let Some(frame) = self.pending.take() {
            return Ok(frame);
        }

        let appsink = self.appsink.clone();
        let timeout = gstreamer::ClockTime::from_mseconds(self.read_timeout.as_millis() as u64);

        // try_pull_sample blocks up to the read timeout
        let sample = tokio::task::spawn_blocking(move || appsink.try_pull_sample(timeout))
            .await
            .map_err(|e| CameraError::FrameUnavailable {
                details: format!("Frame read task failed: {}", e),
            })?
            .ok_or(CameraError::FrameTimeout {
                timeout: self.read_timeout,
            })?;

        self.sample_to_frame(&sample)
    }

    fn close(&mut self) {
        match self.pipeline.set_state(gstreamer::State::Null) {
            Ok(_) => debug!("GStreamer pipeline for camera {} stopped", self.index),
            Err(e) => warn!("Failed to stop GStreamer pipeline: {}", e),
        }
    }

    fn describe(&self) -> String {
        format!("/dev/video{}", self.index)
    }
}

/// Opener for V4L2 cameras through GStreamer
#[derive(Debug, Default, Clone)]
pub struct GstOpener;

#[async_trait]
impl FrameSourceOpener for GstOpener {
    async fn open(&self, request: &OpenRequest) -> Result<Box<dyn FrameSource>, CameraError> {
        info!(
            "Opening camera {} ({}x{} @ {}fps)",
            request.index, request.width, request.height, request.fps
        );

        let request = request.clone();
        let camera = tokio::task::spawn_blocking(move || GstCamera::start(&request))
            .await
            .map_err(|e| CameraError::Configuration {
                details: format!("Camera open task failed: {}", e),
            })??;

        Ok(Box::new(camera))
    }
}
