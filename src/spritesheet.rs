//! Spritesheet rendering - composites source images into one sheet

use crate::config::PackMode;
use crate::pack::{bounds, offset_of, Size};
use image::{ImageOutputFormat, RgbaImage};
use std::io::Cursor;

/// Render source images into a single sheet.
///
/// # Arguments
///
/// * `images` - Source images in sheet order
/// * `mode` - Stacking direction
/// * `padding` - Gap between adjacent images in pixels
///
/// # Returns
///
/// A sheet sized to the packed bounds. Each image overwrites its region
/// without blending; gaps and the area beside narrower images stay
/// transparent.
///
/// # Examples
///
/// ```
/// use image::{Rgba, RgbaImage};
/// use spritepack::config::PackMode;
/// use spritepack::spritesheet::render_spritesheet;
///
/// let a = RgbaImage::from_pixel(2, 3, Rgba([255, 0, 0, 255]));
/// let b = RgbaImage::from_pixel(4, 1, Rgba([0, 255, 0, 255]));
///
/// let sheet = render_spritesheet(&[a.clone(), b.clone()], PackMode::Vertical, 1);
/// assert_eq!(sheet.dimensions(), (4, 5));
///
/// let sheet = render_spritesheet(&[a, b], PackMode::Horizontal, 0);
/// assert_eq!(sheet.dimensions(), (6, 3));
/// ```
pub fn render_spritesheet(images: &[RgbaImage], mode: PackMode, padding: u32) -> RgbaImage {
    let sizes: Vec<Size> = images.iter().map(Size::of).collect();
    let size = bounds(mode, padding, &sizes);

    let mut sheet = RgbaImage::new(size.x.max(0) as u32, size.y.max(0) as u32);

    for (i, image) in images.iter().enumerate() {
        let at = offset_of(mode, padding, &sizes, i);
        image::imageops::replace(&mut sheet, image, at.x as i64, at.y as i64);
    }

    sheet
}

/// Encode a sheet as PNG bytes.
pub fn encode_png(sheet: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());
    sheet.write_to(&mut buf, ImageOutputFormat::Png)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn make_solid_frame(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(width, height, color)
    }

    #[test]
    fn test_single_frame() {
        let red = Rgba([255, 0, 0, 255]);
        let frame = make_solid_frame(3, 3, red);
        let sheet = render_spritesheet(&[frame], PackMode::Vertical, 5);

        assert_eq!(sheet.width(), 3);
        assert_eq!(sheet.height(), 3);
        assert_eq!(*sheet.get_pixel(0, 0), red);
        assert_eq!(*sheet.get_pixel(2, 2), red);
    }

    #[test]
    fn test_vertical_stack_with_padding() {
        let red = Rgba([255, 0, 0, 255]);
        let green = Rgba([0, 255, 0, 255]);

        let frames = vec![make_solid_frame(2, 2, red), make_solid_frame(4, 3, green)];
        let sheet = render_spritesheet(&frames, PackMode::Vertical, 1);

        assert_eq!(sheet.width(), 4);
        assert_eq!(sheet.height(), 6);

        assert_eq!(*sheet.get_pixel(0, 0), red);
        assert_eq!(*sheet.get_pixel(1, 1), red);
        // Beside the narrower frame
        assert_eq!(*sheet.get_pixel(3, 0), TRANSPARENT);
        // Padding row
        assert_eq!(*sheet.get_pixel(0, 2), TRANSPARENT);
        assert_eq!(*sheet.get_pixel(0, 3), green);
        assert_eq!(*sheet.get_pixel(3, 5), green);
    }

    #[test]
    fn test_horizontal_row() {
        let red = Rgba([255, 0, 0, 255]);
        let green = Rgba([0, 255, 0, 255]);
        let blue = Rgba([0, 0, 255, 255]);

        let frames = vec![
            make_solid_frame(2, 2, red),
            make_solid_frame(2, 2, green),
            make_solid_frame(2, 2, blue),
        ];

        let sheet = render_spritesheet(&frames, PackMode::Horizontal, 0);

        assert_eq!(sheet.width(), 6);
        assert_eq!(sheet.height(), 2);
        assert_eq!(*sheet.get_pixel(0, 0), red);
        assert_eq!(*sheet.get_pixel(2, 0), green);
        assert_eq!(*sheet.get_pixel(4, 0), blue);
    }

    #[test]
    fn test_source_alpha_is_copied_not_blended() {
        let half = Rgba([10, 20, 30, 128]);
        let sheet = render_spritesheet(&[make_solid_frame(1, 1, half)], PackMode::Vertical, 0);
        assert_eq!(*sheet.get_pixel(0, 0), half);
    }

    #[test]
    fn test_empty_input() {
        let sheet = render_spritesheet(&[], PackMode::Vertical, 3);
        assert_eq!(sheet.dimensions(), (0, 0));
    }

    #[test]
    fn test_encode_png_decodes_back() {
        let frame = make_solid_frame(5, 7, Rgba([1, 2, 3, 4]));
        let bytes = encode_png(&frame).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, frame);
    }
}
