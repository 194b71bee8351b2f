//! Frame helpers: model-input resizing, JPEG encoding and box annotation

use crate::error::VisionError;
use catwatch_core::{Rect, MODEL_INPUT_SIZE};
use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect as ImageRect;
use std::io::Cursor;

/// One captured camera image
pub type Frame = DynamicImage;

const JPEG_QUALITY: u8 = 85;
const ANNOTATION_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const ANNOTATION_THICKNESS: i32 = 2;

/// Resize a frame to the detector input size, ignoring aspect ratio
pub fn resize_for_model(frame: &Frame, target: (u32, u32)) -> Result<Frame, VisionError> {
    if target.0 == 0 || target.1 == 0 {
        return Err(VisionError::Config("Target dimensions cannot be zero".to_string()));
    }
    if frame.width() == target.0 && frame.height() == target.1 {
        return Ok(frame.clone());
    }
    Ok(frame.resize_exact(target.0, target.1, FilterType::Triangle))
}

/// Encode a frame as JPEG
pub fn encode_jpeg(frame: &Frame) -> Result<Vec<u8>, VisionError> {
    // The JPEG encoder rejects alpha channels
    let rgb = DynamicImage::ImageRgb8(frame.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageOutputFormat::Jpeg(JPEG_QUALITY))?;
    Ok(buffer.into_inner())
}

/// Draw a model-space box onto a full-resolution copy of `frame`
pub fn annotate(frame: &Frame, bbox: &Rect) -> Frame {
    let mut canvas = frame.to_rgb8();
    let scaled = bbox.rescale(MODEL_INPUT_SIZE, (canvas.width(), canvas.height()));
    draw_rect_outline(&mut canvas, &scaled);
    DynamicImage::ImageRgb8(canvas)
}

fn draw_rect_outline(canvas: &mut RgbImage, rect: &Rect) {
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    if width == 0 || height == 0 {
        return;
    }

    let xmin = rect.xmin.clamp(0, width - 1);
    let xmax = rect.xmax.clamp(0, width - 1);
    let ymin = rect.ymin.clamp(0, height - 1);
    let ymax = rect.ymax.clamp(0, height - 1);

    // Inset one pixel per pass; stop once the box collapses
    for t in 0..ANNOTATION_THICKNESS {
        let (w, h) = (xmax - xmin - 2 * t + 1, ymax - ymin - 2 * t + 1);
        if w <= 0 || h <= 0 {
            break;
        }
        let outline = ImageRect::at(xmin + t, ymin + t).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(canvas, outline, ANNOTATION_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_frame(width: u32, height: u32) -> Frame {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([128, 128, 128])))
    }

    #[test]
    fn test_resize_for_model() {
        let frame = gray_frame(640, 480);
        let resized = resize_for_model(&frame, (300, 300)).unwrap();
        assert_eq!((resized.width(), resized.height()), (300, 300));
    }

    #[test]
    fn test_resize_zero_target() {
        let frame = gray_frame(640, 480);
        assert!(resize_for_model(&frame, (0, 300)).is_err());
    }

    #[test]
    fn test_encode_jpeg_roundtrip_dimensions() {
        let frame = gray_frame(64, 48);
        let jpeg = encode_jpeg(&frame).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn test_encode_jpeg_with_alpha() {
        let frame = DynamicImage::ImageRgba8(image::RgbaImage::new(16, 16));
        assert!(encode_jpeg(&frame).is_ok());
    }

    #[test]
    fn test_annotate_draws_scaled_box() {
        let frame = gray_frame(600, 600);
        let annotated = annotate(&frame, &Rect::new(50, 50, 100, 100)).to_rgb8();
        assert_eq!(annotated.get_pixel(100, 100), &ANNOTATION_COLOR);
        assert_eq!(annotated.get_pixel(200, 150), &ANNOTATION_COLOR);
        assert_eq!(annotated.get_pixel(150, 150), &Rgb([128, 128, 128]));
    }

    #[test]
    fn test_annotate_clamps_out_of_bounds_box() {
        let frame = gray_frame(30, 30);
        let annotated = annotate(&frame, &Rect::new(-50, -50, 900, 900)).to_rgb8();
        assert_eq!(annotated.get_pixel(0, 0), &ANNOTATION_COLOR);
        assert_eq!(annotated.get_pixel(29, 29), &ANNOTATION_COLOR);
    }

    #[test]
    fn test_annotate_thick_outline_leaves_interior() {
        let frame = gray_frame(300, 300);
        let annotated = annotate(&frame, &Rect::new(10, 10, 40, 40)).to_rgb8();
        assert_eq!(annotated.get_pixel(10, 25), &ANNOTATION_COLOR);
        assert_eq!(annotated.get_pixel(11, 25), &ANNOTATION_COLOR);
        assert_eq!(annotated.get_pixel(12, 25), &Rgb([128, 128, 128]));
        assert_eq!(annotated.get_pixel(40, 40), &ANNOTATION_COLOR);
    }

    #[test]
    fn test_annotate_degenerate_box() {
        let frame = gray_frame(300, 300);
        let annotated = annotate(&frame, &Rect::new(20, 20, 20, 20)).to_rgb8();
        assert_eq!(annotated.get_pixel(20, 20), &ANNOTATION_COLOR);
        assert_eq!(annotated.get_pixel(21, 21), &Rgb([128, 128, 128]));
    }
}
