//! Still images on disk via the `image` crate.
//!
//! Luma color types decode to one channel; everything else, including
//! alpha and 16-bit variants, is converted to 8-bit RGB.

use crate::error::Result;
use framelens_core::{ChannelLayout, ImageLoader, ImageWriter, PixelBuffer};
use image::{ColorType, DynamicImage, ExtendedColorType};
use std::path::Path;

/// [`ImageLoader`] backed by [`image::open`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFileLoader;

impl ImageLoader for ImageFileLoader {
	fn load(&self, path: &Path) -> framelens_core::Result<PixelBuffer> {
		read_image(path).map_err(|error| error.into_load(path))
	}
}

/// [`ImageWriter`] backed by [`image::save_buffer`]. The format follows the
/// output extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFileWriter;

impl ImageWriter for ImageFileWriter {
	fn write(&self, buffer: &PixelBuffer, path: &Path) -> framelens_core::Result<()> {
		write_image(buffer, path).map_err(|error| error.into_load(path))
	}
}

/// Decode the image at `path`.
///
/// # Errors
///
/// Returns an error when the file cannot be read or decoded.
pub fn read_image(path: &Path) -> Result<PixelBuffer> {
	let image = image::open(path)?;
	tracing::debug!(path = %path.display(), color = ?image.color(), "decoded image");
	to_buffer(image)
}

/// Encode `buffer` to `path`.
///
/// # Errors
///
/// Returns an error when the buffer is empty or encoding fails.
pub fn write_image(buffer: &PixelBuffer, path: &Path) -> Result<()> {
	buffer.ensure_loaded()?;
	let color = match buffer.layout() {
		ChannelLayout::Gray => ExtendedColorType::L8,
		ChannelLayout::Rgb => ExtendedColorType::Rgb8,
	};
	image::save_buffer(path, buffer.data(), buffer.width(), buffer.height(), color)?;
	tracing::debug!(path = %path.display(), "wrote image");
	Ok(())
}

/// Convert a decoded image into a core buffer.
///
/// # Errors
///
/// Returns an error if the converted samples do not match the geometry.
pub fn to_buffer(image: DynamicImage) -> Result<PixelBuffer> {
	let (width, height) = (image.width(), image.height());
	let buffer = match image.color() {
		ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16 => {
			PixelBuffer::new(width, height, ChannelLayout::Gray, image.into_luma8().into_raw())?
		}
		_ => PixelBuffer::new(width, height, ChannelLayout::Rgb, image.into_rgb8().into_raw())?,
	};
	Ok(buffer)
}

#[cfg(test)]
mod tests {
	use super::*;
	use framelens_core::AnalysisError;
	use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

	#[test]
	fn test_gray_png_roundtrip() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("gray.png");
		GrayImage::from_pixel(5, 3, Luma([200])).save(&path).unwrap();

		let buffer = ImageFileLoader.load(&path).unwrap();
		assert_eq!(buffer.shape(), (5, 3, 1));
		assert!(buffer.data().iter().all(|&v| v == 200));
	}

	#[test]
	fn test_alpha_is_dropped() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("rgba.png");
		RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 128])).save(&path).unwrap();

		let buffer = ImageFileLoader.load(&path).unwrap();
		assert_eq!(buffer.layout(), ChannelLayout::Rgb);
		assert_eq!(&buffer.data()[..3], &[10, 20, 30]);
	}

	#[test]
	fn test_channel_order_is_rgb() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("red.bmp");
		RgbImage::from_pixel(2, 2, Rgb([255, 0, 0])).save(&path).unwrap();

		let buffer = ImageFileLoader.load(&path).unwrap();
		assert_eq!(&buffer.data()[..3], &[255, 0, 0]);
	}

	#[test]
	fn test_missing_file_is_load_error() {
		let result = ImageFileLoader.load(Path::new("/definitely/not/here.png"));
		assert!(matches!(result, Err(AnalysisError::Load { .. })));
	}

	#[test]
	fn test_writer_roundtrip() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("frame.png");
		let buffer = PixelBuffer::filled(6, 4, ChannelLayout::Rgb, 77);
		ImageFileWriter.write(&buffer, &path).unwrap();

		let read = ImageFileLoader.load(&path).unwrap();
		assert_eq!(read, buffer);
	}

	#[test]
	fn test_writer_rejects_empty() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("empty.png");
		assert!(ImageFileWriter.write(&PixelBuffer::empty(), &path).is_err());
		assert!(!path.exists());
	}
}
