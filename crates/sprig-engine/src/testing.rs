//! Recording device and in-memory file service for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, SystemTime};

use winit::dpi::PhysicalSize;

use crate::coords::Color;
use crate::device::RenderDevice;
use crate::error::{RenderError, ShaderError, ShaderStage};
use crate::files::FileService;
use crate::render::{
    Renderer, RendererConfig, ShaderConstants, SpriteInstance, SPRITE_INPUT_LOCATIONS,
    SPRITE_RESOURCE_BINDINGS,
};
use crate::shader::{
    check_bindings, check_input_layout, validate_stage, StageInfo, SPRITE_SHADER_SOURCE,
};

pub(crate) const TEST_FONT: &[u8] = include_bytes!("../tests/fixtures/DejaVuSansMono.ttf");

pub(crate) const SHADER_PATH: &str = "shaders/sprite.wgsl";

/// Default config with a small instance buffer.
pub(crate) fn test_config() -> RendererConfig {
    RendererConfig {
        shader_path: SHADER_PATH.into(),
        instance_buffer_size: 64 * SpriteInstance::SIZE as u64,
        ..RendererConfig::default()
    }
}

/// Renderer over `device` whose shader file lives in the returned [`MemoryFiles`].
pub(crate) fn test_renderer(
    device: MockDevice,
    config: RendererConfig,
) -> (Renderer<MockDevice>, MemoryFiles) {
    let files = MemoryFiles::new();
    files.insert(&config.shader_path, SPRITE_SHADER_SOURCE);
    let renderer = Renderer::with_files(device, Box::new(files.clone()), config)
        .expect("renderer over the built-in shader");
    (renderer, files)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MockTexture {
    pub id: u32,
    pub width: u32,
    pub height: u32,
}

/// One recorded `draw_sprites` call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DrawCall {
    pub texture: u32,
    pub constants: ShaderConstants,
    pub instances: Vec<SpriteInstance>,
}

/// [`RenderDevice`] that records calls instead of rendering.
///
/// Stages are validated with naga exactly like the wgpu backend does, so
/// shader tests exercise the real compile path.
#[derive(Debug, Default)]
pub(crate) struct MockDevice {
    pub size: PhysicalSize<u32>,
    pub instance_capacity: usize,
    pub textures_created: u32,
    pub pipelines_created: u32,
    pub draws: Vec<DrawCall>,
    pub clears: Vec<Color>,
    pub presents: Vec<bool>,
    pub resizes: Vec<PhysicalSize<u32>>,
    in_frame: bool,
}

impl MockDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: PhysicalSize::new(width, height),
            ..Self::default()
        }
    }

    /// Simulates the platform resizing the window.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.size = PhysicalSize::new(width, height);
    }

    /// Instance counts of every draw, in submission order.
    pub fn draw_sizes(&self) -> Vec<usize> {
        self.draws.iter().map(|d| d.instances.len()).collect()
    }

    /// Texture ids of every draw, in submission order.
    pub fn draw_textures(&self) -> Vec<u32> {
        self.draws.iter().map(|d| d.texture).collect()
    }
}

impl RenderDevice for MockDevice {
    type Texture = MockTexture;
    type Stage = StageInfo;
    type Pipeline = ();

    fn window_size(&self) -> PhysicalSize<u32> {
        self.size
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.resizes.push(size);
    }

    fn create_instance_buffer(&mut self, size: u64) -> Result<(), RenderError> {
        self.instance_capacity = size as usize / SpriteInstance::SIZE;
        Ok(())
    }

    fn create_texture(
        &mut self,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<MockTexture, RenderError> {
        assert_eq!(rgba.len(), width as usize * height as usize * 4);
        self.textures_created += 1;
        Ok(MockTexture {
            id: self.textures_created,
            width,
            height,
        })
    }

    fn compile_stage(
        &mut self,
        source: &str,
        stage: ShaderStage,
        entry_point: &str,
        _label: &str,
    ) -> Result<StageInfo, ShaderError> {
        validate_stage(source, stage, entry_point)
    }

    fn create_input_layout(
        &mut self,
        vertex: &StageInfo,
        fragment: &StageInfo,
    ) -> Result<(), ShaderError> {
        check_input_layout(vertex, &SPRITE_INPUT_LOCATIONS)?;
        check_bindings(vertex, &SPRITE_RESOURCE_BINDINGS)?;
        check_bindings(fragment, &SPRITE_RESOURCE_BINDINGS)?;
        self.pipelines_created += 1;
        Ok(())
    }

    fn begin_frame(&mut self, clear: Color) -> Result<(), RenderError> {
        assert!(!self.in_frame, "device frame begun twice");
        self.in_frame = true;
        self.clears.push(clear);
        Ok(())
    }

    fn draw_sprites(
        &mut self,
        _pipeline: &(),
        texture: &MockTexture,
        constants: &ShaderConstants,
        instances: &[SpriteInstance],
    ) -> Result<(), RenderError> {
        assert!(self.in_frame, "draw outside of a device frame");
        assert!(!instances.is_empty(), "empty draw submitted");
        assert!(instances.len() <= self.instance_capacity, "instance buffer overrun");
        self.draws.push(DrawCall {
            texture: texture.id,
            constants: *constants,
            instances: instances.to_vec(),
        });
        Ok(())
    }

    fn present(&mut self, vsync: bool) -> Result<(), RenderError> {
        assert!(self.in_frame, "present without a device frame");
        self.in_frame = false;
        self.presents.push(vsync);
        Ok(())
    }
}

/// Shared in-memory [`FileService`]. Clones see the same files.
///
/// Every write bumps the file's modify time by one second.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryFiles {
    files: Rc<RefCell<HashMap<PathBuf, (Vec<u8>, SystemTime)>>>,
    clock: Rc<Cell<u64>>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&self) -> SystemTime {
        self.clock.set(self.clock.get() + 1);
        SystemTime::UNIX_EPOCH + Duration::from_secs(self.clock.get())
    }

    pub fn insert(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) {
        let stamp = self.tick();
        self.files
            .borrow_mut()
            .insert(path.as_ref().to_path_buf(), (contents.as_ref().to_vec(), stamp));
    }

    /// Bumps the modify time without changing contents.
    pub fn touch(&self, path: impl AsRef<Path>) {
        let stamp = self.tick();
        if let Some(entry) = self.files.borrow_mut().get_mut(path.as_ref()) {
            entry.1 = stamp;
        }
    }
}

impl FileService for MemoryFiles {
    fn read(&self, path: &Path) -> Vec<u8> {
        self.files
            .borrow()
            .get(path)
            .map(|(bytes, _)| bytes.clone())
            .unwrap_or_default()
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.files.borrow().get(path).map(|(_, stamp)| *stamp)
    }
}
