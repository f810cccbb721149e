use async_trait::async_trait;

use super::stream::MediaStream;
use crate::error::MediaAcquisitionError;

/// What to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Camera and microphone.
    WebCam,
    /// Microphone only.
    AudioOnly,
    /// Screen capture, video only.
    Screen,
}

/// Capture size and rate requested from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    pub min_width: Option<u32>,
    pub max_width: u32,
    pub min_height: Option<u32>,
    pub max_height: u32,
    pub frame_rate: u32,
}

impl MediaKind {
    pub fn wants_audio(&self) -> bool {
        matches!(self, MediaKind::WebCam | MediaKind::AudioOnly)
    }

    pub fn video_constraints(&self) -> Option<VideoConstraints> {
        match self {
            MediaKind::WebCam => Some(VideoConstraints {
                min_width: Some(320),
                max_width: 640,
                min_height: Some(240),
                max_height: 360,
                frame_rate: 10,
            }),
            MediaKind::Screen => Some(VideoConstraints {
                min_width: None,
                max_width: 1152,
                min_height: None,
                max_height: 648,
                frame_rate: 10,
            }),
            MediaKind::AudioOnly => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::WebCam => "webcam",
            MediaKind::AudioOnly => "microphone",
            MediaKind::Screen => "screen capture",
        }
    }
}

/// Local capture hardware.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn acquire(&self, kind: MediaKind) -> Result<MediaStream, MediaAcquisitionError>;
}
