//! Slices one tall report image into A4 pages.
//!
//! Pixel measurements are converted to millimetres at 96 DPI and divided by
//! the rasterization scale. A report that fits on one page is drawn whole;
//! otherwise it is cut into horizontal bands of `px_per_page` rows, each
//! drawn at the top of its own page at full page width. Every page gets a
//! centered "Page N" footer drawn after the image.
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, ColorType};
use thiserror::Error;
use tracing::debug;

use super::pdf::{AssembleError, DocumentAssembler, JpegImage, TextStyle};
use super::raster::RasterImage;

/// Millimetres per CSS pixel (25.4 / 96).
pub const MM_PER_PX: f64 = 0.2645833333;

/// Distance from the bottom edge to the footer baseline.
pub const FOOTER_OFFSET_MM: f64 = 6.0;

pub const FOOTER_STYLE: TextStyle = TextStyle {
    size_pt: 10.0,
    gray: 120,
};

#[derive(Debug, Error)]
pub enum PaginateError {
    #[error("cannot paginate an empty image ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("rasterization scale must be positive, got {0}")]
    BadScale(f64),
    #[error("page height must be positive, got {0}mm")]
    BadPage(f64),
    #[error("failed to encode page image: {0}")]
    Encode(#[from] image::ImageError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

/// One horizontal band of the source image, placed on `page` (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub page: usize,
    pub y: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub width_mm: f64,
    pub height_mm: f64,
    /// Rows per page; `None` when the whole image fits on one page.
    pub px_per_page: Option<u32>,
    pub slices: Vec<Slice>,
}

impl PagePlan {
    pub fn page_count(&self) -> usize {
        self.slices.len()
    }

    pub fn is_single_page(&self) -> bool {
        self.px_per_page.is_none()
    }
}

pub fn px_to_mm(px: u32, scale: f64) -> f64 {
    px as f64 * MM_PER_PX / scale
}

/// Rows of source pixels one page can hold at `scale`, never less than one.
pub fn px_per_page(page_height_mm: f64, scale: f64) -> u32 {
    let rows = (page_height_mm / MM_PER_PX * scale).floor();
    if rows < 1.0 {
        1
    } else {
        rows as u32
    }
}

pub fn plan_pages(
    width_px: u32,
    height_px: u32,
    scale: f64,
    page_height_mm: f64,
) -> Result<PagePlan, PaginateError> {
    if width_px == 0 || height_px == 0 {
        return Err(PaginateError::EmptyImage {
            width: width_px,
            height: height_px,
        });
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(PaginateError::BadScale(scale));
    }
    if !page_height_mm.is_finite() || page_height_mm <= 0.0 {
        return Err(PaginateError::BadPage(page_height_mm));
    }

    let width_mm = px_to_mm(width_px, scale);
    let height_mm = px_to_mm(height_px, scale);

    if height_mm <= page_height_mm {
        return Ok(PagePlan {
            width_mm,
            height_mm,
            px_per_page: None,
            slices: vec![Slice {
                page: 1,
                y: 0,
                height: height_px,
            }],
        });
    }

    let per_page = px_per_page(page_height_mm, scale);
    let mut slices = Vec::new();
    let mut offset = 0u32;
    let mut page = 1;
    while offset < height_px {
        let height = per_page.min(height_px - offset);
        slices.push(Slice {
            page,
            y: offset,
            height,
        });
        offset += height;
        page += 1;
    }

    Ok(PagePlan {
        width_mm,
        height_mm,
        px_per_page: Some(per_page),
        slices,
    })
}

/// Lay `image` out onto `assembler` page by page. Returns the number of pages.
pub fn paginate<A: DocumentAssembler>(
    image: &RasterImage,
    assembler: &mut A,
    jpeg_quality: u8,
) -> Result<usize, PaginateError> {
    let (page_width_mm, page_height_mm) = assembler.page_size_mm();
    let scale = image.scale as f64;
    let plan = plan_pages(image.width(), image.height(), scale, page_height_mm)?;
    debug!(
        width = image.width(),
        height = image.height(),
        pages = plan.page_count(),
        px_per_page = ?plan.px_per_page,
        "paginating report"
    );

    let last = plan.slices.len();
    for (i, slice) in plan.slices.iter().enumerate() {
        let jpeg = encode_slice(image, slice, jpeg_quality)?;
        let slice_height_mm = px_to_mm(slice.height, scale);
        let drawn_height_mm = slice_height_mm / plan.width_mm * page_width_mm;
        assembler.add_image(&jpeg, 0.0, 0.0, page_width_mm, drawn_height_mm)?;
        assembler.text(
            &format!("Page {}", slice.page),
            page_width_mm / 2.0,
            page_height_mm - FOOTER_OFFSET_MM,
            FOOTER_STYLE,
        )?;
        if i + 1 < last {
            assembler.add_page();
        }
    }
    Ok(last)
}

fn encode_slice(image: &RasterImage, slice: &Slice, quality: u8) -> Result<JpegImage, PaginateError> {
    let width = image.width();
    let band = imageops::crop_imm(&image.pixels, 0, slice.y, width, slice.height).to_image();
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, quality).encode(
        band.as_raw(),
        width,
        slice.height,
        ColorType::Rgb8,
    )?;
    Ok(JpegImage {
        data,
        width,
        height: slice.height,
    })
}
