//! Region capture on top of a full-screen source.

use image::{GrayImage, RgbaImage};

use crate::capture::region::{crop_grayscale, CaptureRegion};
use crate::error::CaptureError;

/// Something that can grab the whole screen.
pub trait ScreenSource {
    /// Returns the current screen size in pixels.
    fn dimensions(&self) -> Result<(u32, u32), CaptureError>;

    /// Grabs one full-screen RGBA frame.
    fn grab(&mut self) -> Result<RgbaImage, CaptureError>;
}

impl<S: ScreenSource + ?Sized> ScreenSource for Box<S> {
    fn dimensions(&self) -> Result<(u32, u32), CaptureError> {
        (**self).dimensions()
    }

    fn grab(&mut self) -> Result<RgbaImage, CaptureError> {
        (**self).grab()
    }
}

/// Captures grayscale crops of configured regions.
///
/// Every call re-samples the screen. Two calls for the same trigger therefore
/// see two separate acquisitions.
pub struct RegionCapturer<S> {
    source: S,
}

impl<S: ScreenSource> RegionCapturer<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn capture(&mut self, region: &CaptureRegion) -> Result<GrayImage, CaptureError> {
        let frame = self.source.grab()?;
        crop_grayscale(&frame, region)
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::region::{Rect, Role};
    use image::Rgba;

    /// Returns a frame filled with the call number, so each grab is distinguishable.
    struct CountingScreen {
        grabs: u8,
    }

    impl ScreenSource for CountingScreen {
        fn dimensions(&self) -> Result<(u32, u32), CaptureError> {
            Ok((64, 48))
        }

        fn grab(&mut self) -> Result<RgbaImage, CaptureError> {
            self.grabs += 1;
            let v = self.grabs;
            Ok(RgbaImage::from_pixel(64, 48, Rgba([v, v, v, 255])))
        }
    }

    struct BrokenScreen;

    impl ScreenSource for BrokenScreen {
        fn dimensions(&self) -> Result<(u32, u32), CaptureError> {
            Ok((64, 48))
        }

        fn grab(&mut self) -> Result<RgbaImage, CaptureError> {
            Err(CaptureError::Acquisition("device lost".to_string()))
        }
    }

    fn region(role: Role) -> CaptureRegion {
        CaptureRegion::new(role, Rect { x1: 4, x2: 20, y1: 8, y2: 16 }, (64, 48)).unwrap()
    }

    #[test]
    fn test_capture_resamples_every_call() {
        let mut capturer = RegionCapturer::new(CountingScreen { grabs: 0 });

        let first = capturer.capture(&region(Role::Player)).unwrap();
        let second = capturer.capture(&region(Role::Opponent)).unwrap();

        assert_eq!(capturer.source().grabs, 2);
        assert_eq!(first.get_pixel(0, 0)[0], 1);
        assert_eq!(second.get_pixel(0, 0)[0], 2);
        assert_eq!(first.dimensions(), (16, 8));
    }

    #[test]
    fn test_capture_failure_is_returned() {
        let mut capturer = RegionCapturer::new(BrokenScreen);
        let err = capturer.capture(&region(Role::Player)).unwrap_err();
        assert!(matches!(err, CaptureError::Acquisition(_)));
    }
}
