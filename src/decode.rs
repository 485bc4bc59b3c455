//! Turns the raw invocation argument into an RGB pixel buffer.
//!
//! The argument is either a path to a `.png`/`.jpg`/`.jpeg` file or a base64
//! encoded image. Browser data URLs (`data:image/png;base64,...`) are accepted
//! as well since the labeling UI sends those.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::RgbImage;
use std::path::Path;
use tracing::debug;

use crate::error::DecodeError;

const IMAGE_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];

/// Whether the argument should be read from disk rather than base64-decoded
pub fn is_image_path(input: &str) -> bool {
    let lower = input.trim().to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Decode a file path or base64 payload
pub fn decode(input: &str) -> Result<RgbImage, DecodeError> {
    if is_image_path(input) {
        decode_file(Path::new(input.trim()))
    } else {
        decode_base64(input)
    }
}

pub fn decode_file(path: &Path) -> Result<RgbImage, DecodeError> {
    debug!(path = %path.display(), "reading image file");
    let bytes = std::fs::read(path).map_err(|source| DecodeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode_bytes(&bytes)
}

pub fn decode_base64(payload: &str) -> Result<RgbImage, DecodeError> {
    // MIME-style payloads wrap lines; the standard engine rejects any whitespace
    let payload: String = strip_data_url(payload.trim())
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = BASE64.decode(payload)?;
    debug!(len = bytes.len(), "decoded base64 payload");
    decode_bytes(&bytes)
}

/// Decode an encoded image (any codec `image` recognizes) into RGB
pub fn decode_bytes(bytes: &[u8]) -> Result<RgbImage, DecodeError> {
    let img = image::load_from_memory(bytes)?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::Empty { width, height });
    }
    debug!(width, height, "image decoded");
    Ok(rgb)
}

fn strip_data_url(payload: &str) -> &str {
    if payload.starts_with("data:") {
        if let Some((_, data)) = payload.split_once(";base64,") {
            return data;
        }
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img: RgbImage = ImageBuffer::from_fn(width, height, |x, _| Rgb([x as u8, 0, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn recognizes_path_extensions() {
        assert!(is_image_path("scan.png"));
        assert!(is_image_path("dir/photo.JPG"));
        assert!(is_image_path("a.jpeg"));
        assert!(!is_image_path("iVBORw0KGgoAAAANSUhEUg"));
        assert!(!is_image_path("scan.webp"));
    }

    #[test]
    fn decodes_base64_png() {
        let encoded = BASE64.encode(png_bytes(7, 3));
        let img = decode(&encoded).unwrap();
        assert_eq!(img.dimensions(), (7, 3));
        assert_eq!(img.get_pixel(2, 1), &Rgb([2, 0, 255]));
    }

    #[test]
    fn decodes_data_url() {
        let encoded = format!("data:image/png;base64,{}", BASE64.encode(png_bytes(4, 4)));
        assert_eq!(decode(&encoded).unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn decodes_line_wrapped_base64() {
        let encoded = BASE64.encode(png_bytes(40, 20));
        let wrapped = encoded
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n");
        assert!(wrapped.contains('\n'));

        let img = decode(&wrapped).unwrap();
        assert_eq!(img.dimensions(), (40, 20));
        let url = format!("data:image/png;base64,\n{wrapped}\n");
        assert_eq!(decode(&url).unwrap().dimensions(), (40, 20));
    }

    #[test]
    fn malformed_base64_is_rejected() {
        assert!(matches!(decode("not base64 at all!!"), Err(DecodeError::Base64(_))));
    }

    #[test]
    fn valid_base64_of_garbage_is_a_codec_error() {
        let encoded = BASE64.encode(b"definitely not an image");
        assert!(matches!(decode(&encoded), Err(DecodeError::Codec(_))));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            decode("/nonexistent/dir/image.png"),
            Err(DecodeError::Read { .. })
        ));
    }

    #[test]
    fn reads_image_from_disk() {
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        std::fs::write(file.path(), png_bytes(5, 6)).unwrap();
        let img = decode(file.path().to_str().unwrap()).unwrap();
        assert_eq!(img.dimensions(), (5, 6));
    }
}
