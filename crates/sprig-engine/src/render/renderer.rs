use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::dpi::PhysicalSize;

use crate::device::RenderDevice;
use crate::error::RenderError;
use crate::files::{DiskFiles, FileService};
use crate::resource::{decode_image, Texture, TextureHandle};
use crate::shader::{ReloadOutcome, ShaderManager};
use crate::text::{coverage_to_rgba, pack_font, Font, FontAtlasConfig, FontHandle};

use super::batch::SpriteBatch;
use super::common::SpriteInstance;
use super::frame::FrameStats;

/// Renderer start-up options.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// WGSL source of the sprite shader. Also compiled with `ERROR_SHADER`
    /// defined to build the fallback program.
    pub shader_path: PathBuf,
    /// Watch `shader_path` and recompile when it changes.
    pub hot_reload: bool,
    /// Minimum time between modify-time checks.
    pub hot_reload_interval: Duration,
    /// Instance upload buffer size in bytes; fixes the batch capacity.
    pub instance_buffer_size: u64,
    /// Atlas policy for [`Renderer::create_font`].
    pub font: FontAtlasConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            shader_path: PathBuf::from("shaders/sprite.wgsl"),
            hot_reload: true,
            hot_reload_interval: Duration::from_millis(500),
            instance_buffer_size: 6 * 1024 * 1024,
            font: FontAtlasConfig::default(),
        }
    }
}

/// Immediate-mode sprite and text renderer.
///
/// Owns the device, the open sprite batch and the shader program. Draw calls
/// are only accepted between [`begin_frame`](Self::begin_frame) and
/// [`end_frame`](Self::end_frame).
pub struct Renderer<D: RenderDevice> {
    pub(super) device: D,
    pub(super) files: Box<dyn FileService>,
    pub(super) config: RendererConfig,
    pub(super) batch: SpriteBatch<D>,
    /// Scratch buffer reused by every flush.
    pub(super) instances: Vec<SpriteInstance>,
    pub(super) shaders: ShaderManager<D>,
    pub(super) stats: FrameStats,
    pub(super) window_size: PhysicalSize<u32>,
    pub(super) white: TextureHandle<D>,
    pub(super) frame_open: bool,
}

impl<D: RenderDevice> Renderer<D> {
    /// Creates a renderer reading shader and asset files from disk.
    pub fn new(device: D, config: RendererConfig) -> Result<Self, RenderError> {
        Self::with_files(device, Box::new(DiskFiles), config)
    }

    /// Creates a renderer with a custom file service.
    ///
    /// Fails if the instance buffer cannot hold a sprite, the device rejects
    /// a start-up resource, or the error shader does not compile.
    pub fn with_files(
        mut device: D,
        files: Box<dyn FileService>,
        config: RendererConfig,
    ) -> Result<Self, RenderError> {
        let capacity = config.instance_buffer_size / SpriteInstance::SIZE as u64;
        if capacity == 0 {
            return Err(RenderError::InstanceBufferTooSmall {
                size: config.instance_buffer_size,
                instance_size: SpriteInstance::SIZE,
            });
        }
        device.create_instance_buffer(config.instance_buffer_size)?;

        let shaders = ShaderManager::new(
            &mut device,
            files.as_ref(),
            config.shader_path.clone(),
            config.hot_reload_interval,
            Instant::now(),
        )?;

        let white = device.create_texture(&[0xFF; 4], 1, 1)?;
        let white = Arc::new(Texture::new(1, 1, white));
        let window_size = device.window_size();

        log::debug!(
            "renderer ready: {}x{} window, batch capacity {capacity}, shader {}",
            window_size.width,
            window_size.height,
            config.shader_path.display()
        );

        Ok(Self {
            device,
            files,
            batch: SpriteBatch::new(capacity as usize),
            instances: Vec::new(),
            shaders,
            stats: FrameStats::default(),
            window_size,
            white,
            frame_open: false,
            config,
        })
    }

    /// Uploads an RGBA8 image. `rgba` must hold exactly `width * height * 4` bytes.
    pub fn create_texture(
        &mut self,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<TextureHandle<D>, RenderError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .unwrap_or(usize::MAX);
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(RenderError::InvalidTextureData {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        let raw = self.device.create_texture(rgba, width, height)?;
        Ok(Arc::new(Texture::new(width, height, raw)))
    }

    /// Decodes an encoded image (PNG, JPEG, BMP) and uploads it.
    pub fn create_texture_from_memory(
        &mut self,
        bytes: &[u8],
    ) -> Result<TextureHandle<D>, RenderError> {
        let image = decode_image(bytes).inspect_err(|e| log::warn!("image decode failed: {e}"))?;
        self.create_texture(&image.pixels, image.width, image.height)
    }

    pub fn create_texture_from_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<TextureHandle<D>, RenderError> {
        let bytes = self.read_file(path.as_ref())?;
        self.create_texture_from_memory(&bytes)
    }

    /// Bakes `font_bytes` (TTF/OTF) at `pixel_size` into an atlas texture,
    /// using [`RendererConfig::font`] as the packing policy.
    pub fn create_font(
        &mut self,
        font_bytes: &[u8],
        pixel_size: f32,
    ) -> Result<FontHandle<D>, RenderError> {
        let packed = pack_font(font_bytes, pixel_size, &self.config.font)
            .inspect_err(|e| log::warn!("font creation failed: {e}"))?;
        let (width, height) = packed.glyphs.atlas_size();
        let atlas = self.create_texture(&coverage_to_rgba(&packed.coverage), width, height)?;
        Ok(Arc::new(Font::new(atlas, packed.glyphs)))
    }

    pub fn create_font_from_file(
        &mut self,
        path: impl AsRef<Path>,
        pixel_size: f32,
    ) -> Result<FontHandle<D>, RenderError> {
        let bytes = self.read_file(path.as_ref())?;
        self.create_font(&bytes, pixel_size)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, RenderError> {
        let bytes = self.files.read(path);
        if bytes.is_empty() {
            log::warn!("{} is empty or unreadable", path.display());
            return Err(RenderError::FileRead { path: path.to_path_buf() });
        }
        Ok(bytes)
    }

    /// Recompiles the sprite shader now, regardless of the reload timer.
    pub fn reload_shader(&mut self) -> ReloadOutcome {
        self.shaders.reload(&mut self.device, self.files.as_ref())
    }

    pub fn shaders(&self) -> &ShaderManager<D> {
        &self.shaders
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Window size seen by the last `begin_frame`.
    pub fn window_size(&self) -> PhysicalSize<u32> {
        self.window_size
    }

    /// Built-in 1x1 white texture used by [`draw_rect`](Self::draw_rect).
    pub fn white_texture(&self) -> &TextureHandle<D> {
        &self.white
    }

    /// Sprites waiting in the open batch.
    pub fn queued_sprites(&self) -> usize {
        self.batch.len()
    }

    /// Sprites that fit into one draw call.
    pub fn batch_capacity(&self) -> usize {
        self.batch.capacity()
    }

    /// Whether a frame is open.
    pub fn in_frame(&self) -> bool {
        self.frame_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FontError;
    use crate::testing::{test_config, test_renderer, MemoryFiles, MockDevice, TEST_FONT};

    fn renderer() -> (Renderer<MockDevice>, MemoryFiles) {
        test_renderer(MockDevice::new(640, 480), test_config())
    }

    #[test]
    fn capacity_follows_buffer_size() {
        let (r, _) = test_renderer(MockDevice::new(1, 1), RendererConfig::default());
        assert_eq!(r.batch_capacity(), 131_072);
        assert_eq!(r.device().instance_capacity, 131_072);
    }

    #[test]
    fn zero_capacity_is_fatal() {
        let config = RendererConfig {
            instance_buffer_size: SpriteInstance::SIZE as u64 - 1,
            ..test_config()
        };
        let err = Renderer::with_files(MockDevice::new(1, 1), Box::new(MemoryFiles::new()), config)
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::InstanceBufferTooSmall { size: 47, instance_size: 48 }));
    }

    #[test]
    fn missing_shader_file_is_fatal() {
        let result =
            Renderer::with_files(MockDevice::new(1, 1), Box::new(MemoryFiles::new()), test_config());
        assert!(matches!(result, Err(RenderError::ErrorShader { .. })));
    }

    #[test]
    fn texture_data_must_match_dimensions() {
        let (mut r, _) = renderer();
        let err = r.create_texture(&[0; 15], 2, 2).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidTextureData { expected: 16, actual: 15, .. }
        ));
        assert!(r.create_texture(&[], 0, 0).is_err());

        let t = r.create_texture(&[0; 16], 2, 2).unwrap();
        assert_eq!((t.width(), t.height()), (2, 2));
    }

    #[test]
    fn texture_from_file_decodes_png() {
        let (mut r, files) = renderer();
        let mut png = Vec::new();
        image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 4]))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        files.insert("sprite.png", &png);

        let t = r.create_texture_from_file("sprite.png").unwrap();
        assert_eq!((t.width(), t.height()), (3, 2));
        assert!(matches!(
            r.create_texture_from_file("missing.png"),
            Err(RenderError::FileRead { .. })
        ));
        assert!(matches!(
            r.create_texture_from_memory(b"not an image"),
            Err(RenderError::ImageDecode(_))
        ));
    }

    #[test]
    fn font_atlas_is_uploaded_as_texture() {
        let (mut r, files) = renderer();
        let before = r.device().textures_created;
        let font = r.create_font(TEST_FONT, 16.0).unwrap();
        assert_eq!(r.device().textures_created, before + 1);
        assert_eq!((font.atlas().width(), font.atlas().height()), (512, 512));

        files.insert("mono.ttf", TEST_FONT);
        assert!(r.create_font_from_file("mono.ttf", 12.0).is_ok());
        assert!(matches!(
            r.create_font(b"garbage", 16.0),
            Err(RenderError::Font(FontError::Parse(_)))
        ));
    }

    #[test]
    fn forced_reload_recompiles() {
        let (mut r, _) = renderer();
        let count = r.shaders().compile_count();
        assert_eq!(r.reload_shader(), ReloadOutcome::Reloaded);
        assert_eq!(r.shaders().compile_count(), count + 1);
    }
}
