//! Image processing for uploaded media.
//!
//! Generates blurhash placeholders and the fixed set of resized variants
//! during upload. Variants never upscale: presets the source cannot fill are
//! skipped.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader, Limits};
use thiserror::Error;

/// Maximum file size we'll attempt to process (20 MB).
const MAX_PROCESSABLE_SIZE: usize = 20 * 1024 * 1024;

/// Thumbnail edge length: an exact square center-crop.
pub const THUMBNAIL_SIZE: u32 = 200;

/// Medium variant width bound, aspect preserved.
pub const MEDIUM_MAX_WIDTH: u32 = 800;

/// Large variant width bound, aspect preserved.
pub const LARGE_MAX_WIDTH: u32 = 1600;

/// Blurhash component counts (width x height).
const BLURHASH_COMPONENTS_X: u32 = 4;
const BLURHASH_COMPONENTS_Y: u32 = 3;

/// Size to downscale to before computing blurhash (for speed).
const BLURHASH_SAMPLE_SIZE: u32 = 32;

/// Maximum image dimension (width or height) to prevent decompression bombs.
const MAX_IMAGE_DIMENSION: u32 = 16384;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File too large for processing: {0} bytes")]
    TooLarge(usize),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Image decode failed: {0}")]
    DecodeFailed(String),
    #[error("Blurhash encoding failed: {0}")]
    BlurhashFailed(String),
    #[error("Image encoding failed: {0}")]
    EncodeFailed(String),
}

/// Result of processing an image: dimensions, blurhash, and the resized
/// variants the source was large enough to fill.
pub struct ImageProcessingResult {
    pub width: u32,
    pub height: u32,
    pub blurhash: String,
    /// Exact 200x200 center-crop (None if the source is smaller).
    pub thumbnail: Option<ProcessedVariant>,
    /// Width-bounded 800px variant (None if the source is not wider).
    pub medium: Option<ProcessedVariant>,
    /// Width-bounded 1600px variant (None if the source is not wider).
    pub large: Option<ProcessedVariant>,
}

/// A resized image variant ready for storage.
pub struct ProcessedVariant {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub content_type: String,
}

/// Process an image: extract dimensions, generate blurhash, and create the
/// preset variants re-encoded as WebP.
///
/// For animated formats (GIF), only dimensions and blurhash are generated
/// (no resized variants) to preserve animation.
///
/// This function is CPU-bound and should be called inside `spawn_blocking`.
pub fn process_image(
    data: &[u8],
    mime_type: &str,
) -> Result<ImageProcessingResult, ProcessingError> {
    if data.len() > MAX_PROCESSABLE_SIZE {
        return Err(ProcessingError::TooLarge(data.len()));
    }

    let format = mime_to_format(mime_type)?;
    let is_animated = matches!(format, ImageFormat::Gif);

    // Use reader API to enforce dimension limits (prevents decompression
    // bombs: a small compressed file can expand to enormous RGBA buffers)
    let mut reader = ImageReader::with_format(Cursor::new(data), format);
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_DIMENSION);
    limits.max_image_height = Some(MAX_IMAGE_DIMENSION);
    reader.limits(limits);

    let img = reader
        .decode()
        .map_err(|e| ProcessingError::DecodeFailed(e.to_string()))?;

    let (width, height) = img.dimensions();

    let blurhash = generate_blurhash(&img)?;

    // Skip resized variants for animated images to preserve animation
    let (thumbnail, medium, large) = if is_animated {
        (None, None, None)
    } else {
        (
            generate_thumbnail(&img)?,
            generate_width_variant(&img, MEDIUM_MAX_WIDTH)?,
            generate_width_variant(&img, LARGE_MAX_WIDTH)?,
        )
    };

    Ok(ImageProcessingResult {
        width,
        height,
        blurhash,
        thumbnail,
        medium,
        large,
    })
}

/// Map MIME type to `image` crate format.
fn mime_to_format(mime_type: &str) -> Result<ImageFormat, ProcessingError> {
    match mime_type {
        "image/png" => Ok(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Ok(ImageFormat::Jpeg),
        "image/gif" => Ok(ImageFormat::Gif),
        "image/webp" => Ok(ImageFormat::WebP),
        other => Err(ProcessingError::UnsupportedFormat(other.to_string())),
    }
}

/// Generate a blurhash from a small downscaled sample of the image.
fn generate_blurhash(img: &DynamicImage) -> Result<String, ProcessingError> {
    // Downscale to a small size for fast hashing
    let sample = img.resize(
        BLURHASH_SAMPLE_SIZE,
        BLURHASH_SAMPLE_SIZE,
        FilterType::Triangle,
    );
    let (w, h) = sample.dimensions();
    let rgba = sample.to_rgba8();

    blurhash::encode(
        BLURHASH_COMPONENTS_X,
        BLURHASH_COMPONENTS_Y,
        w,
        h,
        rgba.as_raw(),
    )
    .map_err(|e| ProcessingError::BlurhashFailed(e.to_string()))
}

/// Encode an image as WebP.
fn encode_webp(img: &DynamicImage) -> Result<Vec<u8>, ProcessingError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::WebP)
        .map_err(|e| ProcessingError::EncodeFailed(e.to_string()))?;
    Ok(buf.into_inner())
}

/// Generate the exact-square thumbnail via center-crop fill.
/// Returns `None` when the source is smaller than the preset in either
/// dimension (no upscaling).
fn generate_thumbnail(img: &DynamicImage) -> Result<Option<ProcessedVariant>, ProcessingError> {
    let (w, h) = img.dimensions();
    if w < THUMBNAIL_SIZE || h < THUMBNAIL_SIZE {
        return Ok(None);
    }

    let resized = img.resize_to_fill(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3);
    let data = encode_webp(&resized)?;

    Ok(Some(ProcessedVariant {
        data,
        width: THUMBNAIL_SIZE,
        height: THUMBNAIL_SIZE,
        content_type: "image/webp".to_string(),
    }))
}

/// Generate a width-bounded variant, aspect preserved.
/// Returns `None` when the source is not wider than `max_width`.
fn generate_width_variant(
    img: &DynamicImage,
    max_width: u32,
) -> Result<Option<ProcessedVariant>, ProcessingError> {
    let (w, h) = img.dimensions();
    if w <= max_width {
        return Ok(None);
    }

    let target_height =
        ((f64::from(max_width) * f64::from(h) / f64::from(w)).round() as u32).max(1);
    let resized = img.resize_exact(max_width, target_height, FilterType::Lanczos3);
    let (rw, rh) = resized.dimensions();
    let data = encode_webp(&resized)?;

    Ok(Some(ProcessedVariant {
        data,
        width: rw,
        height: rh,
        content_type: "image/webp".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a small solid-color PNG in memory.
    fn create_test_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgba8(width, height);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    /// Create a small GIF in memory.
    fn create_test_gif(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgba8(width, height);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Gif).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_square_source_fills_every_preset() {
        let data = create_test_png(2000, 2000);
        let result = process_image(&data, "image/png").unwrap();

        assert_eq!(result.width, 2000);
        assert_eq!(result.height, 2000);
        assert!(!result.blurhash.is_empty());

        let thumb = result.thumbnail.expect("should have thumbnail");
        assert_eq!((thumb.width, thumb.height), (200, 200));
        assert_eq!(thumb.content_type, "image/webp");
        assert!(!thumb.data.is_empty());

        let medium = result.medium.expect("should have medium variant");
        assert_eq!((medium.width, medium.height), (800, 800));

        let large = result.large.expect("should have large variant");
        assert_eq!((large.width, large.height), (1600, 1600));
    }

    #[test]
    fn test_aspect_ratio_preserved_for_width_variants() {
        let data = create_test_png(2000, 1000);
        let result = process_image(&data, "image/png").unwrap();

        let medium = result.medium.expect("should have medium variant");
        assert_eq!((medium.width, medium.height), (800, 400));

        let large = result.large.expect("should have large variant");
        assert_eq!((large.width, large.height), (1600, 800));

        // Thumbnail is still an exact square crop.
        let thumb = result.thumbnail.expect("should have thumbnail");
        assert_eq!((thumb.width, thumb.height), (200, 200));
    }

    #[test]
    fn test_small_source_generates_no_variants() {
        let data = create_test_png(150, 150);
        let result = process_image(&data, "image/png").unwrap();

        assert_eq!((result.width, result.height), (150, 150));
        assert!(result.thumbnail.is_none(), "no upscaled thumbnail");
        assert!(result.medium.is_none());
        assert!(result.large.is_none());
    }

    #[test]
    fn test_mid_size_source_fills_only_small_presets() {
        let data = create_test_png(1000, 500);
        let result = process_image(&data, "image/png").unwrap();

        assert!(result.thumbnail.is_some());
        let medium = result.medium.expect("1000px wide fills the 800 preset");
        assert_eq!((medium.width, medium.height), (800, 400));
        assert!(result.large.is_none(), "1000px wide cannot fill 1600");
    }

    #[test]
    fn test_narrow_but_tall_source_has_no_thumbnail() {
        // Wider than the medium bound but too short for the square crop.
        let data = create_test_png(900, 120);
        let result = process_image(&data, "image/png").unwrap();

        assert!(result.thumbnail.is_none());
        let medium = result.medium.expect("should have medium variant");
        assert_eq!(medium.width, 800);
    }

    #[test]
    fn test_gif_keeps_animation_no_variants() {
        let data = create_test_gif(500, 500);
        let result = process_image(&data, "image/gif").unwrap();

        assert_eq!((result.width, result.height), (500, 500));
        assert!(!result.blurhash.is_empty());
        assert!(result.thumbnail.is_none());
        assert!(result.medium.is_none());
        assert!(result.large.is_none());
    }

    #[test]
    fn test_too_large_file_rejected() {
        let err = process_image(&vec![0u8; MAX_PROCESSABLE_SIZE + 1], "image/png");
        assert!(matches!(err, Err(ProcessingError::TooLarge(_))));
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let err = process_image(b"fake", "image/bmp");
        assert!(matches!(err, Err(ProcessingError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_garbage_bytes_fail_decode() {
        let err = process_image(b"definitely not a png", "image/png");
        assert!(matches!(err, Err(ProcessingError::DecodeFailed(_))));
    }
}
