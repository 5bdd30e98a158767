//! Shared, async access to a camera
//!
//! The protocol is strictly one transaction at a time and every wait is a
//! blocking sleep. `SharedCamera` serializes callers behind a mutex and runs
//! each operation on tokio's blocking pool, so async code can await (or stop
//! awaiting) a capture without stalling the runtime. Dropping the future does
//! not interrupt the operation already running on the camera.

use std::sync::{Arc, Mutex};

use super::Camera;
use crate::protocol::{CommunicationChannel, PhotoSize, ProtocolError};

/// Cloneable handle to a camera shared between tasks
pub struct SharedCamera<C> {
    inner: Arc<Mutex<Camera<C>>>,
}

impl<C> Clone for SharedCamera<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: CommunicationChannel + 'static> SharedCamera<C> {
    pub fn new(camera: Camera<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(camera)),
        }
    }

    /// Run `op` with exclusive access to the camera on the blocking pool
    pub async fn with_camera<T, F>(&self, op: F) -> Result<T, ProtocolError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Camera<C>) -> Result<T, ProtocolError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut camera = inner
                .lock()
                .map_err(|_| ProtocolError::CameraUnavailable("camera lock poisoned".into()))?;
            op(&mut camera)
        })
        .await
        .map_err(|e| ProtocolError::CameraUnavailable(e.to_string()))?
    }

    pub async fn take_photo(&self) -> Result<Vec<u8>, ProtocolError> {
        self.with_camera(|camera| camera.take_photo()).await
    }

    pub async fn resume_video(&self) -> Result<(), ProtocolError> {
        self.with_camera(|camera| camera.resume_video()).await
    }

    pub async fn get_version(&self) -> Result<String, ProtocolError> {
        self.with_camera(|camera| camera.get_version()).await
    }

    pub async fn reset(&self) -> Result<(), ProtocolError> {
        self.with_camera(|camera| camera.reset()).await
    }

    pub async fn set_photo_size(&self, size: PhotoSize) -> Result<(), ProtocolError> {
        self.with_camera(move |camera| camera.set_photo_size(size)).await
    }

    pub async fn set_compression(&self, rate: u8) -> Result<(), ProtocolError> {
        self.with_camera(move |camera| camera.set_compression(rate)).await
    }
}
