use chrono::{DateTime, Utc};
use glimpse_core::{CaptureConfig, Error, RawFrame, Result, ScreenGrabber};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::io::Cursor;
use std::sync::Arc;

/// One screenshot event. Lives for a single pipeline turn and is never
/// persisted.
#[derive(Debug, Clone)]
pub struct Capture {
    pub timestamp: DateTime<Utc>,
    pub display_num: u32,
    /// JPEG-compressed frame
    pub jpeg: Vec<u8>,
    /// Logical dimensions after resize
    pub width: u32,
    pub height: u32,
}

/// Captures the primary display and compresses it per configuration.
pub struct Capturer {
    config: CaptureConfig,
    grabber: Arc<dyn ScreenGrabber>,
}

impl Capturer {
    pub fn new(config: CaptureConfig, grabber: Arc<dyn ScreenGrabber>) -> Self {
        Self { config, grabber }
    }

    /// Capture the primary display, resize within the configured bounds and
    /// encode as JPEG.
    pub fn capture_primary(&self) -> Result<Capture> {
        if self.grabber.count_displays() == 0 {
            return Err(Error::NoDisplay);
        }

        let bounds = self.grabber.bounds(0)?;
        let frame = self.grabber.grab(&bounds)?;
        let timestamp = Utc::now();

        let img = frame_to_image(frame)?;
        let img = resize_to_fit(img, self.config.max_width, self.config.max_height);
        let (width, height) = (img.width(), img.height());
        let jpeg = encode_jpeg(&img, self.config.quality)?;

        Ok(Capture {
            timestamp,
            display_num: 0,
            jpeg,
            width,
            height,
        })
    }
}

fn frame_to_image(frame: RawFrame) -> Result<RgbaImage> {
    RgbaImage::from_raw(frame.width, frame.height, frame.pixels)
        .ok_or_else(|| Error::Capture("grab returned a short pixel buffer".to_string()))
}

/// Scale the image down so both dimensions fit the configured caps,
/// preserving aspect ratio. A cap of 0 disables that axis. Nearest-neighbour
/// sampling: the vision model gains nothing from better resamplers and the
/// grab path is latency-sensitive.
fn resize_to_fit(img: RgbaImage, max_width: u32, max_height: u32) -> RgbaImage {
    let (width, height) = (img.width(), img.height());

    let scale_x = if max_width > 0 && width > max_width {
        max_width as f64 / width as f64
    } else {
        1.0
    };
    let scale_y = if max_height > 0 && height > max_height {
        max_height as f64 / height as f64
    } else {
        1.0
    };

    let scale = scale_x.min(scale_y);
    if scale >= 1.0 {
        return img;
    }

    let new_width = ((width as f64) * scale) as u32;
    let new_height = ((height as f64) * scale) as u32;
    imageops::resize(&img, new_width.max(1), new_height.max(1), FilterType::Nearest)
}

fn encode_jpeg(img: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG has no alpha channel
    let rgb = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();

    let quality = if quality == 0 || quality > 100 {
        60
    } else {
        quality
    };

    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| Error::Capture(format!("jpeg encode failed: {}", e)))?;

    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimpse_core::DisplayBounds;

    struct MockGrabber {
        displays: usize,
        width: u32,
        height: u32,
    }

    impl ScreenGrabber for MockGrabber {
        fn count_displays(&self) -> usize {
            self.displays
        }

        fn bounds(&self, _display: usize) -> Result<DisplayBounds> {
            Ok(DisplayBounds {
                x: 0,
                y: 0,
                width: self.width,
                height: self.height,
            })
        }

        fn grab(&self, bounds: &DisplayBounds) -> Result<RawFrame> {
            let mut pixels = Vec::with_capacity((bounds.width * bounds.height * 4) as usize);
            for y in 0..bounds.height {
                for x in 0..bounds.width {
                    pixels.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 128, 255]);
                }
            }
            Ok(RawFrame {
                width: bounds.width,
                height: bounds.height,
                pixels,
            })
        }
    }

    fn capturer(width: u32, height: u32, config: CaptureConfig) -> Capturer {
        Capturer::new(
            config,
            Arc::new(MockGrabber {
                displays: 1,
                width,
                height,
            }),
        )
    }

    #[test]
    fn test_no_displays() {
        let cap = Capturer::new(
            CaptureConfig::default(),
            Arc::new(MockGrabber {
                displays: 0,
                width: 0,
                height: 0,
            }),
        );
        assert!(matches!(cap.capture_primary(), Err(Error::NoDisplay)));
    }

    #[test]
    fn test_jpeg_magic_bytes() {
        let cap = capturer(320, 200, CaptureConfig::default());
        let capture = cap.capture_primary().unwrap();
        assert_eq!(&capture.jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_resize_fits_both_bounds() {
        let config = CaptureConfig {
            max_width: 1280,
            max_height: 720,
            ..CaptureConfig::default()
        };
        let cap = capturer(2560, 1440, config);
        let capture = cap.capture_primary().unwrap();
        assert!(capture.width <= 1280);
        assert!(capture.height <= 720);
    }

    #[test]
    fn test_resize_preserves_aspect_ratio() {
        let config = CaptureConfig {
            max_width: 1000,
            max_height: 1000,
            ..CaptureConfig::default()
        };
        let cap = capturer(3000, 2000, config);
        let capture = cap.capture_primary().unwrap();

        let source_ratio = 3000.0 / 2000.0;
        let expected_height = (capture.width as f64 / source_ratio).round();
        assert!((capture.height as f64 - expected_height).abs() <= 1.0);
    }

    #[test]
    fn test_no_resize_when_within_bounds() {
        let config = CaptureConfig {
            max_width: 1280,
            max_height: 720,
            ..CaptureConfig::default()
        };
        let cap = capturer(640, 480, config);
        let capture = cap.capture_primary().unwrap();
        assert_eq!(capture.width, 640);
        assert_eq!(capture.height, 480);
    }

    #[test]
    fn test_zero_caps_disable_resizing() {
        let config = CaptureConfig {
            max_width: 0,
            max_height: 0,
            ..CaptureConfig::default()
        };
        let cap = capturer(2560, 1440, config);
        let capture = cap.capture_primary().unwrap();
        assert_eq!(capture.width, 2560);
        assert_eq!(capture.height, 1440);
    }

    #[test]
    fn test_single_axis_cap() {
        let config = CaptureConfig {
            max_width: 800,
            max_height: 0,
            ..CaptureConfig::default()
        };
        let cap = capturer(1600, 1200, config);
        let capture = cap.capture_primary().unwrap();
        assert_eq!(capture.width, 800);
        assert_eq!(capture.height, 600);
    }

    #[test]
    fn test_invalid_quality_still_encodes() {
        let config = CaptureConfig {
            quality: 0,
            ..CaptureConfig::default()
        };
        let cap = capturer(100, 100, config);
        let capture = cap.capture_primary().unwrap();
        assert_eq!(&capture.jpeg[..2], &[0xFF, 0xD8]);
    }
}
