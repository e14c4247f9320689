//! Camera access for the selfie step.
//!
//! A [`CameraSession`] owns the open [`MediaStream`] and stops every track
//! when it captures, is cancelled, or is dropped, so the camera light never
//! stays on after the step is left.

use super::{UpgradeError, UploadedFile};
use std::{future::Future, path::PathBuf, pin::Pin};
use tracing::debug;

pub trait MediaTrack: Send + Sync {
    fn id(&self) -> &str;
    fn is_live(&self) -> bool;
    /// Must be idempotent.
    fn stop(&mut self);
}

pub struct MediaStream {
    tracks: Vec<Box<dyn MediaTrack>>,
}

impl MediaStream {
    #[must_use]
    pub fn new(tracks: Vec<Box<dyn MediaTrack>>) -> Self {
        Self { tracks }
    }

    #[must_use]
    pub fn live_tracks(&self) -> usize {
        self.tracks.iter().filter(|track| track.is_live()).count()
    }

    pub fn stop_all(&mut self) {
        for track in &mut self.tracks {
            if track.is_live() {
                debug!(track = track.id(), "stopping media track");
                track.stop();
            }
        }
    }
}

pub trait MediaDevice: Send + Sync {
    fn open<'a>(&'a self)
    -> Pin<Box<dyn Future<Output = Result<MediaStream, UpgradeError>> + Send + 'a>>;

    /// Grabs a single encoded frame from an open stream.
    fn grab_frame<'a>(
        &'a self,
        stream: &'a MediaStream,
    ) -> Pin<Box<dyn Future<Output = Result<UploadedFile, UpgradeError>> + Send + 'a>>;
}

pub struct CameraSession<'d> {
    device: &'d dyn MediaDevice,
    stream: MediaStream,
}

impl<'d> CameraSession<'d> {
    /// # Errors
    /// Returns `UpgradeError::Camera` if the device cannot be opened.
    pub async fn open(device: &'d dyn MediaDevice) -> Result<Self, UpgradeError> {
        let stream = device.open().await?;
        Ok(Self { device, stream })
    }

    #[must_use]
    pub fn live_tracks(&self) -> usize {
        self.stream.live_tracks()
    }

    /// Takes the picture and closes the camera, whether or not the capture
    /// succeeded.
    ///
    /// # Errors
    /// Returns `UpgradeError::Camera` if no usable frame was captured.
    pub async fn capture(mut self) -> Result<UploadedFile, UpgradeError> {
        let frame = self.device.grab_frame(&self.stream).await;
        self.stream.stop_all();
        let frame = frame?;
        if frame.bytes.is_empty() {
            return Err(UpgradeError::Camera("captured an empty frame".to_string()));
        }
        Ok(frame)
    }

    /// Leaves the step without a picture.
    pub fn cancel(mut self) {
        self.stream.stop_all();
    }
}

impl Drop for CameraSession<'_> {
    fn drop(&mut self) {
        self.stream.stop_all();
    }
}

/// Serves a still image from disk in place of a live camera, for terminals
/// and headless runs.
#[derive(Clone, Debug)]
pub struct ImageFileDevice {
    path: PathBuf,
}

struct ImageFileTrack {
    id: String,
    live: bool,
}

impl MediaTrack for ImageFileTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn stop(&mut self) {
        self.live = false;
    }
}

impl ImageFileDevice {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MediaDevice for ImageFileDevice {
    fn open<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<MediaStream, UpgradeError>> + Send + 'a>> {
        Box::pin(async move {
            if !self.path.is_file() {
                return Err(UpgradeError::Camera(format!(
                    "no image at {}",
                    self.path.display()
                )));
            }
            Ok(MediaStream::new(vec![Box::new(ImageFileTrack {
                id: self.path.display().to_string(),
                live: true,
            })]))
        })
    }

    fn grab_frame<'a>(
        &'a self,
        _stream: &'a MediaStream,
    ) -> Pin<Box<dyn Future<Output = Result<UploadedFile, UpgradeError>> + Send + 'a>> {
        Box::pin(async move {
            let bytes = tokio::fs::read(&self.path).await.map_err(|err| {
                UpgradeError::Camera(format!("failed to read {}: {err}", self.path.display()))
            })?;
            let file_name = self
                .path
                .file_name()
                .map_or_else(|| "selfie.jpg".to_string(), |name| name.to_string_lossy().to_string());
            Ok(UploadedFile {
                content_type: content_type_for(&file_name).to_string(),
                file_name,
                bytes,
            })
        })
    }
}

/// Content type guessed from the file extension.
#[must_use]
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
