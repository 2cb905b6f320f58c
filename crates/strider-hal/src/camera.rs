//! Generic `Camera` trait for image-capture hardware.

use strider_types::{CameraFrame, StriderError};

/// A camera or image-capture device.
///
/// The physics step consumer owns one camera and polls it once per render
/// tick.  The most recent frame is the only one that matters; drivers need
/// not buffer.
pub trait Camera: Send {
    /// Stable identifier for this camera, e.g. `"front_rgb"`.
    fn id(&self) -> &str;

    /// Configured `(width, height)` in pixels.
    fn resolution(&self) -> (u32, u32);

    /// Prepare the device for capture.  Called on the first tick after start
    /// and after every world reset.
    fn initialize(&mut self) -> Result<(), StriderError> {
        Ok(())
    }

    /// Capture and return the current frame as RGBA8.
    ///
    /// # Errors
    ///
    /// Returns [`StriderError::HardwareFault`] if the frame cannot be captured
    /// (e.g. the device is disconnected or the buffer is unavailable).
    fn capture(&mut self) -> Result<CameraFrame, StriderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockCamera {
        id: String,
    }

    impl Camera for MockCamera {
        fn id(&self) -> &str {
            &self.id
        }

        fn resolution(&self) -> (u32, u32) {
            (2, 2)
        }

        fn capture(&mut self) -> Result<CameraFrame, StriderError> {
            Ok(CameraFrame {
                width: 2,
                height: 2,
                data: vec![0u8; 2 * 2 * 4],
            })
        }
    }

    #[test]
    fn mock_camera_capture() {
        let mut cam = MockCamera {
            id: "front_rgb".to_string(),
        };
        assert_eq!(cam.id(), "front_rgb");
        assert!(cam.initialize().is_ok());
        let frame = cam.capture().unwrap();
        assert_eq!((frame.width, frame.height), cam.resolution());
        assert!(frame.is_well_formed());
    }
}
