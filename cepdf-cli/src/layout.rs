use cepdf_core::{PageRect, Point, RenderImage, ScreenRect};
use crossterm::terminal::WindowSize;

/// Used when the terminal does not report its pixel size.
const FALLBACK_CELL_WIDTH: f32 = 8.0;
const FALLBACK_CELL_HEIGHT: f32 = 16.0;

const BPP: usize = RenderImage::BYTES_PER_PIXEL;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenLayout {
    pub total_cols: u32,
    pub total_rows: u32,
    pub cell_width: f32,
    pub cell_height: f32,
}

impl ScreenLayout {
    pub fn from_window(window: &WindowSize) -> Self {
        Self::new(
            u32::from(window.columns),
            u32::from(window.rows),
            u32::from(window.width),
            u32::from(window.height),
        )
    }

    pub fn new(total_cols: u32, total_rows: u32, pixel_width: u32, pixel_height: u32) -> Self {
        let total_cols = total_cols.max(1);
        let total_rows = total_rows.max(1);
        let (cell_width, cell_height) = if pixel_width > 0 && pixel_height > 0 {
            (
                pixel_width as f32 / total_cols as f32,
                pixel_height as f32 / total_rows as f32,
            )
        } else {
            (FALLBACK_CELL_WIDTH, FALLBACK_CELL_HEIGHT)
        };
        Self {
            total_cols,
            total_rows,
            cell_width,
            cell_height,
        }
    }

    /// Rows left for the page once the status line is taken.
    pub fn image_rows(&self) -> u32 {
        self.total_rows.saturating_sub(1).max(1)
    }

    pub fn cell_to_pixel(&self, column: u16, row: u16) -> Point {
        Point::new(
            (f32::from(column) * self.cell_width).round() as i32,
            (f32::from(row) * self.cell_height).round() as i32,
        )
    }
}

/// Scroll position of a page larger than the screen, as fractions of the overflow.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
}

impl Viewport {
    pub fn adjust(&mut self, delta_x: f32, delta_y: f32) -> bool {
        let next_x = (self.x + delta_x).clamp(0.0, 1.0);
        let next_y = (self.y + delta_y).clamp(0.0, 1.0);
        let changed = (next_x - self.x).abs() > f32::EPSILON || (next_y - self.y).abs() > f32::EPSILON;
        self.x = next_x;
        self.y = next_y;
        changed
    }
}

/// Where the visible part of a page goes on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub start_col: u32,
    pub start_row: u32,
    pub columns: u32,
    pub rows: u32,
    pub crop_x: u32,
    pub crop_y: u32,
    pub crop_width: u32,
    pub crop_height: u32,
}

impl Placement {
    pub fn needs_crop(&self, image: &RenderImage) -> bool {
        self.crop_width < image.width || self.crop_height < image.height
    }
}

/// Shows the page at one screen pixel per image pixel, cropping to the viewport
/// when the page is larger than the screen and centering it otherwise.
pub fn place_image(image: &RenderImage, layout: &ScreenLayout, viewport: Viewport) -> Placement {
    let available_cols = layout.total_cols;
    let available_rows = layout.image_rows();
    let max_width = ((available_cols as f32 * layout.cell_width).floor() as u32).max(1);
    let max_height = ((available_rows as f32 * layout.cell_height).floor() as u32).max(1);

    let crop_width = image.width.min(max_width).max(1);
    let crop_height = image.height.min(max_height).max(1);
    let crop_x = compute_viewport_origin(image.width, crop_width, viewport.x);
    let crop_y = compute_viewport_origin(image.height, crop_height, viewport.y);

    let columns = ((crop_width as f32 / layout.cell_width).ceil() as u32).clamp(1, available_cols);
    let rows = ((crop_height as f32 / layout.cell_height).ceil() as u32).clamp(1, available_rows);

    Placement {
        start_col: (available_cols - columns) / 2,
        start_row: (available_rows - rows) / 2,
        columns,
        rows,
        crop_x,
        crop_y,
        crop_width,
        crop_height,
    }
}

pub fn compute_viewport_origin(total: u32, viewport: u32, fraction: f32) -> u32 {
    if viewport >= total || total == 0 {
        return 0;
    }
    let max_offset = total - viewport;
    let clamped = fraction.clamp(0.0, 1.0);
    let raw = (max_offset as f32 * clamped).round();
    raw.max(0.0).min(max_offset as f32) as u32
}

pub fn crop_render_image(
    image: &RenderImage,
    origin_x: u32,
    origin_y: u32,
    width: u32,
    height: u32,
) -> RenderImage {
    if image.is_empty() {
        return RenderImage {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        };
    }

    let width = width.min(image.width).max(1);
    let height = height.min(image.height).max(1);
    let origin_x = origin_x.min(image.width - width);
    let origin_y = origin_y.min(image.height - height);

    let stride = image.width as usize * BPP;
    let mut pixels = Vec::with_capacity(width as usize * height as usize * BPP);

    for row in 0..height {
        let start = (origin_y + row) as usize * stride + origin_x as usize * BPP;
        let end = start + width as usize * BPP;
        pixels.extend_from_slice(&image.pixels[start..end]);
    }

    RenderImage {
        width,
        height,
        pixels,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

/// Maps a region already scaled to the rendered page onto the pixels of `image`.
pub fn page_rect_to_pixels(rect: PageRect, image: &RenderImage) -> Option<PixelRect> {
    clip_to_image(
        rect.left.floor() as i64,
        rect.top.floor() as i64,
        rect.right.ceil() as i64,
        rect.bottom.ceil() as i64,
        image,
    )
}

/// Maps a screen-space rectangle onto the cropped page drawn at `placement`.
pub fn screen_rect_to_image(
    rect: ScreenRect,
    placement: &Placement,
    layout: &ScreenLayout,
    image: &RenderImage,
) -> Option<PixelRect> {
    let origin_x = placement.start_col as f32 * layout.cell_width;
    let origin_y = placement.start_row as f32 * layout.cell_height;
    let drawn_width = placement.columns as f32 * layout.cell_width;
    let drawn_height = placement.rows as f32 * layout.cell_height;
    if drawn_width <= 0.0 || drawn_height <= 0.0 {
        return None;
    }
    let scale_x = image.width as f32 / drawn_width;
    let scale_y = image.height as f32 / drawn_height;

    clip_to_image(
        ((rect.x0 as f32 - origin_x) * scale_x).floor() as i64,
        ((rect.y0 as f32 - origin_y) * scale_y).floor() as i64,
        ((rect.x1 as f32 - origin_x) * scale_x).ceil() as i64,
        ((rect.y1 as f32 - origin_y) * scale_y).ceil() as i64,
        image,
    )
}

fn clip_to_image(x0: i64, y0: i64, x1: i64, y1: i64, image: &RenderImage) -> Option<PixelRect> {
    let max_x = i64::from(image.width);
    let max_y = i64::from(image.height);
    let x0 = x0.clamp(0, max_x);
    let x1 = x1.clamp(0, max_x);
    let y0 = y0.clamp(0, max_y);
    let y1 = y1.clamp(0, max_y);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(PixelRect {
        x0: x0 as u32,
        y0: y0 as u32,
        x1: x1 as u32,
        y1: y1 as u32,
    })
}

pub fn fill_rect(image: &mut RenderImage, rect: PixelRect, color: [u8; 3], alpha: f32) {
    let x1 = rect.x1.min(image.width);
    let y1 = rect.y1.min(image.height);
    let x0 = rect.x0.min(x1);
    let y0 = rect.y0.min(y1);
    let width = image.width as usize;

    for y in y0..y1 {
        let row_start = (y as usize) * width * BPP;
        for x in x0..x1 {
            let idx = row_start + (x as usize) * BPP;
            blend_pixel(&mut image.pixels[idx..idx + BPP], color, alpha);
        }
    }
}

fn blend_pixel(pixel: &mut [u8], color: [u8; 3], alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    let inv = 1.0 - alpha;
    for (channel, target) in pixel.iter_mut().zip(color) {
        *channel = ((*channel as f32 * inv) + (target as f32 * alpha))
            .round()
            .clamp(0.0, 255.0) as u8;
    }
}
