//! Data-URL snapshots stored with history entries

use crate::scanner::FileRef;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;
use std::io::Cursor;

/// Longest side of a thumbnail
pub const THUMBNAIL_SIZE: u32 = 256;

/// `data:<mime>;base64,<payload>` for one file.
///
/// Decodable images become a PNG thumbnail; anything else is embedded as is.
pub fn snapshot(file: &FileRef) -> String {
    if file.is_image() {
        match thumbnail_png(&file.bytes) {
            Ok(png) => return data_url("image/png", &png),
            Err(e) => tracing::debug!(file = %file.name, error = %e, "thumbnail failed, keeping raw bytes"),
        }
    }
    data_url(&file.mime_type, &file.bytes)
}

fn thumbnail_png(bytes: &[u8]) -> image::ImageResult<Vec<u8>> {
    let thumb = image::load_from_memory(bytes)?.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE);
    let mut png = Vec::new();
    thumb.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
        out
    }

    #[test]
    fn test_large_image_is_downscaled() {
        let file = FileRef::new("big.png", "image/png", png_bytes(1024, 512));
        let url = snapshot(&file);
        assert!(url.starts_with("data:image/png;base64,"));

        let payload = STANDARD.decode(url.trim_start_matches("data:image/png;base64,")).unwrap();
        let thumb = image::load_from_memory(&payload).unwrap();
        assert_eq!(thumb.width(), 256);
        assert_eq!(thumb.height(), 128);
    }

    #[test]
    fn test_undecodable_image_keeps_raw_bytes() {
        let file = FileRef::new("broken.jpg", "image/jpeg", b"not a jpeg".to_vec());
        assert_eq!(snapshot(&file), format!("data:image/jpeg;base64,{}", STANDARD.encode(b"not a jpeg")));
    }

    #[test]
    fn test_non_image_embedded() {
        let file = FileRef::new("notes.pdf", "application/pdf", b"%PDF".to_vec());
        assert!(snapshot(&file).starts_with("data:application/pdf;base64,"));
    }
}
