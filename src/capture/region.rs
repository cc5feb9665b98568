//! Capture regions: fixed screen rectangles tagged with a role.

use std::fmt;

use image::{GrayImage, RgbaImage};

use crate::error::{CaptureError, ConfigError};

/// Which side of the board a region shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Player,
    Opponent,
}

impl Role {
    /// File name prefix used for frames of this role.
    pub fn file_prefix(self) -> &'static str {
        match self {
            Role::Player => "player",
            Role::Opponent => "opponent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_prefix())
    }
}

/// A rectangle in absolute screen pixels.
///
/// Bounds are half-open: columns `x1..x2`, rows `y1..y2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x1: u32,
    pub x2: u32,
    pub y1: u32,
    pub y2: u32,
}

impl Rect {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Returns true if the rectangle lies inside a `width` x `height` frame.
    pub fn fits_in(&self, width: u32, height: u32) -> bool {
        self.x2 <= width && self.y2 <= height
    }
}

/// An immutable, validated capture region.
///
/// Only constructible through [`CaptureRegion::new`], so every instance has
/// a non-empty rectangle inside the screen it was validated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureRegion {
    role: Role,
    rect: Rect,
}

impl CaptureRegion {
    /// Validates `rect` against the screen size and builds the region.
    pub fn new(role: Role, rect: Rect, screen: (u32, u32)) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidRegion { role, reason };

        if rect.x1 >= rect.x2 {
            return Err(invalid(format!("x1 ({}) must be less than x2 ({})", rect.x1, rect.x2)));
        }
        if rect.y1 >= rect.y2 {
            return Err(invalid(format!("y1 ({}) must be less than y2 ({})", rect.y1, rect.y2)));
        }
        if !rect.fits_in(screen.0, screen.1) {
            return Err(invalid(format!(
                "({}, {}, {}, {}) exceeds the {}x{} screen",
                rect.x1, rect.x2, rect.y1, rect.y2, screen.0, screen.1
            )));
        }

        Ok(Self { role, rect })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }
}

/// The two regions captured on every trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionPair {
    pub player: CaptureRegion,
    pub opponent: CaptureRegion,
}

/// Crops `frame` to the region and reduces it to a single luma channel.
///
/// Fails if the frame is smaller than it was at startup.
pub fn crop_grayscale(frame: &RgbaImage, region: &CaptureRegion) -> Result<GrayImage, CaptureError> {
    let (width, height) = frame.dimensions();
    let rect = region.rect();
    if !rect.fits_in(width, height) {
        return Err(CaptureError::RegionOutsideFrame {
            role: region.role(),
            width,
            height,
        });
    }

    let cropped =
        image::imageops::crop_imm(frame, rect.x1, rect.y1, rect.width(), rect.height()).to_image();
    Ok(image::imageops::grayscale(&cropped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    fn gray_value(x: u32, y: u32) -> u8 {
        ((x * 7 + y * 13) % 256) as u8
    }

    /// 1280x720 frame whose channels are equal, so luma equals the channel value.
    fn reference_frame() -> RgbaImage {
        RgbaImage::from_fn(1280, 720, |x, y| {
            let v = gray_value(x, y);
            Rgba([v, v, v, 255])
        })
    }

    #[test]
    fn test_region_rejects_inverted_bounds() {
        let rect = Rect { x1: 600, x2: 0, y1: 450, y2: 625 };
        let err = CaptureRegion::new(Role::Player, rect, (1280, 720)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegion { role: Role::Player, .. }));

        let rect = Rect { x1: 0, x2: 600, y1: 625, y2: 625 };
        assert!(CaptureRegion::new(Role::Opponent, rect, (1280, 720)).is_err());
    }

    #[test]
    fn test_region_rejects_offscreen() {
        let rect = Rect { x1: 700, x2: 1300, y1: 0, y2: 100 };
        let err = CaptureRegion::new(Role::Opponent, rect, (1280, 720)).unwrap_err();
        assert!(err.to_string().contains("1280x720"));
    }

    #[test]
    fn test_region_accepts_full_screen() {
        let rect = Rect { x1: 0, x2: 1280, y1: 0, y2: 720 };
        let region = CaptureRegion::new(Role::Player, rect, (1280, 720)).unwrap();
        assert_eq!(region.rect().width(), 1280);
        assert_eq!(region.rect().height(), 720);
    }

    #[test]
    fn test_crop_matches_reference() {
        let frame = reference_frame();
        let rect = Rect { x1: 0, x2: 600, y1: 450, y2: 625 };
        let region = CaptureRegion::new(Role::Player, rect, (1280, 720)).unwrap();

        let cropped = crop_grayscale(&frame, &region).unwrap();

        let expected = GrayImage::from_fn(600, 175, |x, y| Luma([gray_value(x, y + 450)]));
        assert_eq!(cropped.dimensions(), (600, 175));
        assert_eq!(cropped, expected);
    }

    #[test]
    fn test_crop_offset_region() {
        let frame = reference_frame();
        let rect = Rect { x1: 680, x2: 1280, y1: 0, y2: 720 };
        let region = CaptureRegion::new(Role::Opponent, rect, (1280, 720)).unwrap();

        let cropped = crop_grayscale(&frame, &region).unwrap();

        assert_eq!(cropped.dimensions(), (600, 720));
        assert_eq!(cropped.get_pixel(0, 0)[0], gray_value(680, 0));
        assert_eq!(cropped.get_pixel(599, 719)[0], gray_value(1279, 719));
    }

    #[test]
    fn test_crop_reports_shrunk_frame() {
        let rect = Rect { x1: 0, x2: 600, y1: 450, y2: 625 };
        let region = CaptureRegion::new(Role::Player, rect, (1280, 720)).unwrap();
        let small = RgbaImage::new(800, 600);

        let err = crop_grayscale(&small, &region).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::RegionOutsideFrame { role: Role::Player, width: 800, height: 600 }
        ));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Player.to_string(), "player");
        assert_eq!(Role::Opponent.to_string(), "opponent");
    }
}
