/// Decoded image in RGBA8 layout, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decodes PNG/JPEG/BMP bytes into RGBA8.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, image::ImageError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        pixels: rgba.into_raw(),
        width,
        height,
    })
}
