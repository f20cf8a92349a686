use image::{DynamicImage, ImageError, codecs::jpeg::JpegEncoder, imageops::FilterType};

/// Every stored photo is re-encoded to this format.
pub const OUTPUT_MIME_TYPE: &str = "image/jpeg";

#[derive(Debug)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode `input`, shrink it to at most `max_width` pixels wide (aspect ratio kept,
/// never enlarged) and re-encode it as JPEG at `quality`.
pub fn normalize_image(
    input: &[u8],
    max_width: u32,
    quality: u8,
) -> Result<NormalizedImage, ImageError> {
    let decoded = image::load_from_memory(input)?;
    let max_width = max_width.max(1);
    let resized = if decoded.width() > max_width {
        decoded.resize(max_width, u32::MAX, FilterType::Lanczos3)
    } else {
        decoded
    };

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)?;

    Ok(NormalizedImage {
        bytes,
        width: rgb.width(),
        height: rgb.height(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 128]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    #[test]
    fn shrinks_wide_images_keeping_aspect_ratio() {
        let out = normalize_image(&png(3200, 800), 1600, 80).expect("normalize");
        assert_eq!((out.width, out.height), (1600, 400));
        assert_eq!(image::guess_format(&out.bytes).ok(), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn never_upscales_small_images() {
        let out = normalize_image(&png(120, 90), 1600, 80).expect("normalize");
        assert_eq!((out.width, out.height), (120, 90));
    }

    #[test]
    fn rejects_non_image_input() {
        assert!(normalize_image(b"definitely not an image", 1600, 80).is_err());
    }
}
