//! Image buffers and caller contexts shared by the test modules.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::aiimage_types::request::CallerContext;

fn encode(width: u32, height: u32, color: [u8; 3], format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), format)
        .expect("encode fixture image");
    out
}

pub fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(width, height, color, ImageFormat::Png)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, [200, 120, 40], ImageFormat::Jpeg)
}

pub fn webp(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, [40, 120, 200], ImageFormat::WebP)
}

pub fn gif(width: u32, height: u32) -> Vec<u8> {
    // Minimal GIF89a header with the requested logical screen size.
    let mut out = b"GIF89a".to_vec();
    out.extend_from_slice(&(width as u16).to_le_bytes());
    out.extend_from_slice(&(height as u16).to_le_bytes());
    out.extend_from_slice(&[0x00, 0x00, 0x00, 0x3b]);
    out
}

pub fn caller() -> CallerContext {
    CallerContext {
        user_id: 42,
        username: "student1".into(),
        user_context_id: 5,
        system_context_id: 1,
    }
}
