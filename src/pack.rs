//! Sprite sheet packing - computes where each image lands in the sheet
//!
//! Images are stacked along a single axis in input order with a fixed gap
//! between neighbours. The same function answers two questions:
//!
//! - for `0 <= i < n`, the top-left offset of image `i`
//! - for `i == n`, the size of the whole sheet
//!
//! [`bounds`] is defined as `pack(.., n)` so the two can never disagree.

use crate::config::PackMode;
use image::GenericImageView;
use serde::Serialize;

/// Pixel coordinates of an image in the sheet, or the sheet size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    /// Returned for indices outside `-1..=n`.
    pub const OUT_OF_RANGE: Pos = Pos { x: -1, y: -1 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Width and height of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size of any image type from the `image` crate.
    pub fn of<I: GenericImageView>(image: &I) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }

    /// Extent along the stacking axis.
    fn main(&self, mode: PackMode) -> i64 {
        match mode {
            PackMode::Vertical => self.height as i64,
            PackMode::Horizontal => self.width as i64,
        }
    }

    /// Extent across the stacking axis.
    fn cross(&self, mode: PackMode) -> i64 {
        match mode {
            PackMode::Vertical => self.width as i64,
            PackMode::Horizontal => self.height as i64,
        }
    }
}

/// Compute the offset of image `i`, or the sheet bounds when `i == sizes.len()`.
///
/// `i == 0` and `i == -1` (a failed lookup) both yield `(0, 0)`. Padding is
/// inserted between images only, never after the last one, so the bounds do
/// not include a trailing gap. Indices greater than the image count, or below
/// -1, return [`Pos::OUT_OF_RANGE`].
///
/// # Examples
///
/// ```
/// use spritepack::config::PackMode;
/// use spritepack::pack::{pack, Pos, Size};
///
/// let sizes = [Size::new(96, 139), Size::new(96, 140)];
/// assert_eq!(pack(PackMode::Vertical, 0, &sizes, 1), Pos::new(0, 139));
/// assert_eq!(pack(PackMode::Vertical, 0, &sizes, 2), Pos::new(96, 279));
/// assert_eq!(pack(PackMode::Horizontal, 10, &sizes, 2), Pos::new(202, 140));
/// ```
pub fn pack(mode: PackMode, padding: u32, sizes: &[Size], i: isize) -> Pos {
    if i == 0 || i == -1 {
        return Pos::new(0, 0);
    }
    if i < -1 || i as usize > sizes.len() {
        return Pos::OUT_OF_RANGE;
    }

    let i = i as usize;
    let is_bounds = i == sizes.len();

    // n images have n-1 gaps between them
    let mut main = padding as i64 * i as i64;
    if is_bounds {
        main -= padding as i64;
    }
    main += sizes[..i].iter().map(|s| s.main(mode)).sum::<i64>();

    let cross = if is_bounds { sizes.iter().map(|s| s.cross(mode)).max().unwrap_or(0) } else { 0 };

    match mode {
        PackMode::Vertical => Pos::new(cross as i32, main as i32),
        PackMode::Horizontal => Pos::new(main as i32, cross as i32),
    }
}

/// Top-left offset of image `i`.
pub fn offset_of(mode: PackMode, padding: u32, sizes: &[Size], i: usize) -> Pos {
    if i >= sizes.len() {
        return Pos::OUT_OF_RANGE;
    }
    pack(mode, padding, sizes, i as isize)
}

/// Size of the whole sheet.
pub fn bounds(mode: PackMode, padding: u32, sizes: &[Size]) -> Pos {
    pack(mode, padding, sizes, sizes.len() as isize)
}
