//! Image decoding.
//!
//! Turns encoded bytes (PNG, JPEG, GIF, WebP, ...) and `data:` URLs into
//! [`BackgroundImage`]s.

use std::sync::Arc;

use base64::Engine;
use emoji_art_core::{BackgroundImage, FetchError};

/// Image container formats recognized from their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG.
    Png,
    /// JPEG.
    Jpeg,
    /// GIF (first frame only).
    Gif,
    /// WebP.
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Self::Png
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Self::Gif
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Self::WebP
        } else {
            Self::Unknown
        }
    }

    fn decoder_format(self) -> Option<image::ImageFormat> {
        match self {
            Self::Png => Some(image::ImageFormat::Png),
            Self::Jpeg => Some(image::ImageFormat::Jpeg),
            Self::Gif => Some(image::ImageFormat::Gif),
            Self::WebP => Some(image::ImageFormat::WebP),
            Self::Unknown => None,
        }
    }
}

/// Decode image bytes into RGBA pixels.
///
/// Recognized formats go straight to their decoder; anything else is left to
/// the image crate's own detection.
///
/// # Errors
///
/// Returns [`FetchError::Decode`] if the bytes are not a supported image.
pub fn decode_image(data: &[u8]) -> Result<BackgroundImage, FetchError> {
    if data.is_empty() {
        return Err(FetchError::Decode("empty image data".into()));
    }
    let format = ImageFormat::from_magic_bytes(data);
    let decoded = match format.decoder_format() {
        Some(known) => image::load_from_memory_with_format(data, known),
        None => image::load_from_memory(data),
    };
    let img = decoded.map_err(|e| FetchError::Decode(format!("{format:?} image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::debug!("Decoded {format:?} background {width}x{height}");

    Ok(BackgroundImage {
        width,
        height,
        pixels: Arc::from(rgba.into_raw()),
    })
}

/// Extract the payload of a `data:` URL.
///
/// Supports both `;base64` payloads and percent-encoded ones, for example
/// `data:image/png;base64,iVBORw0KGgo...`.
///
/// # Errors
///
/// Returns [`FetchError::Decode`] if the URL is malformed.
pub fn decode_data_url(uri: &str) -> Result<Vec<u8>, FetchError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| FetchError::Decode("not a data URL".into()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| FetchError::Decode("data URL is missing a comma".into()))?;

    if metadata.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        base64::engine::general_purpose::STANDARD
            .decode(percent_decode(payload)?)
            .map_err(|e| FetchError::Decode(format!("invalid base64: {e}")))
    } else {
        percent_decode(payload)
    }
}

fn percent_decode(input: &str) -> Result<Vec<u8>, FetchError> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| FetchError::Decode("invalid percent-encoding".into()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    #[test]
    fn test_magic_bytes() {
        assert_eq!(ImageFormat::from_magic_bytes(&png(1, 1)), ImageFormat::Png);
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a.."), ImageFormat::Gif);
        assert_eq!(ImageFormat::from_magic_bytes(b"RIFF\0\0\0\0WEBP"), ImageFormat::WebP);
        assert_eq!(ImageFormat::from_magic_bytes(b"hi"), ImageFormat::Unknown);
    }

    #[test]
    fn test_truncated_png_reports_format() {
        let bytes = png(4, 4);
        let Err(FetchError::Decode(message)) = decode_image(&bytes[..16]) else {
            panic!("truncated png should not decode");
        };
        assert!(message.starts_with("Png image"), "{message}");
    }

    #[test]
    fn test_decode_png() {
        let image = decode_image(&png(3, 2)).expect("decode");
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.pixels.len(), 3 * 2 * 4);
        assert_eq!(&image.pixels[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(decode_image(b"not an image"), Err(FetchError::Decode(_))));
        assert!(matches!(decode_image(&[]), Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_data_url_base64() {
        let bytes = png(1, 1);
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        );
        assert_eq!(decode_data_url(&uri).expect("decode"), bytes);
    }

    #[test]
    fn test_data_url_percent_encoded() {
        assert_eq!(
            decode_data_url("data:text/plain,a%20b%ff").expect("decode"),
            vec![b'a', b' ', b'b', 0xFF]
        );
        assert!(decode_data_url("data:text/plain,%zz").is_err());
        assert!(decode_data_url("data:text/plain").is_err());
        assert!(decode_data_url("https://example.com").is_err());
    }
}
