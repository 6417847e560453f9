use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::device::RenderDevice;
use crate::error::{RenderError, ShaderError, ShaderStage};
use crate::files::FileService;

use super::hot_reload::HotReload;
use super::preprocess::preprocess;
use super::program::ShaderProgram;
use super::{ERROR_SHADER_DEFINE, FRAGMENT_ENTRY_POINT, VERTEX_ENTRY_POINT};

/// Which program the batcher draws with.
pub enum ActiveShader<D: RenderDevice> {
    /// Nothing compiled yet.
    Unloaded,
    /// The last compile of the source file succeeded.
    Valid(Arc<ShaderProgram<D>>),
    /// The last compile failed; the error shader is drawn instead.
    Fallback(Arc<ShaderProgram<D>>),
}

impl<D: RenderDevice> ActiveShader<D> {
    pub fn program(&self) -> Option<&ShaderProgram<D>> {
        match self {
            ActiveShader::Unloaded => None,
            ActiveShader::Valid(p) | ActiveShader::Fallback(p) => Some(&**p),
        }
    }
}

/// Outcome of a recompile.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReloadOutcome {
    Reloaded,
    FellBack,
}

/// Owns the sprite shader program, its error fallback and the reload timer.
pub struct ShaderManager<D: RenderDevice> {
    path: PathBuf,
    error_shader: Arc<ShaderProgram<D>>,
    active: ActiveShader<D>,
    hot_reload: HotReload,
    compile_count: u64,
}

impl<D: RenderDevice> ShaderManager<D> {
    /// Builds the error shader (fatal on failure) and the main program.
    pub fn new(
        device: &mut D,
        files: &dyn FileService,
        path: impl Into<PathBuf>,
        reload_interval: Duration,
        now: Instant,
    ) -> Result<Self, RenderError> {
        let path = path.into();
        let modified = files.modified(&path);

        let error_shader = match build_program(device, files, &path, &[ERROR_SHADER_DEFINE])
            .into_result()
        {
            Ok(program) => Arc::new(program),
            Err(source) => return Err(RenderError::ErrorShader { path, source }),
        };

        let mut manager = Self {
            path,
            error_shader,
            active: ActiveShader::Unloaded,
            hot_reload: HotReload::new(reload_interval, now, modified),
            compile_count: 1,
        };
        manager.reload(device, files);
        Ok(manager)
    }

    /// Source file being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn active(&self) -> &ActiveShader<D> {
        &self.active
    }

    /// Program to draw with: the current one, or the error shader after a failed compile.
    pub fn program(&self) -> Option<&ShaderProgram<D>> {
        self.active.program()
    }

    pub fn is_fallback_active(&self) -> bool {
        matches!(self.active, ActiveShader::Fallback(_))
    }

    /// Number of compile attempts so far, error shader included.
    pub fn compile_count(&self) -> u64 {
        self.compile_count
    }

    /// Recompiles if the interval elapsed and the source file changed.
    pub fn poll_hot_reload(
        &mut self,
        now: Instant,
        device: &mut D,
        files: &dyn FileService,
    ) -> Option<ReloadOutcome> {
        let path = &self.path;
        if !self.hot_reload.poll(now, || files.modified(path)) {
            return None;
        }
        log::info!("shader source {} changed, recompiling", self.path.display());
        Some(self.reload(device, files))
    }

    /// Recompiles the source unconditionally and swaps the active program.
    ///
    /// The swap is all-or-nothing: a failed compile installs the error shader.
    pub fn reload(&mut self, device: &mut D, files: &dyn FileService) -> ReloadOutcome {
        self.compile_count += 1;
        let build = build_program(device, files, &self.path, &[]);
        if build.program.is_valid() {
            log::debug!("shader {} compiled", self.path.display());
            self.active = ActiveShader::Valid(Arc::new(build.program));
            ReloadOutcome::Reloaded
        } else {
            log::error!("shader {} failed to compile, using error shader", self.path.display());
            self.active = ActiveShader::Fallback(Arc::clone(&self.error_shader));
            ReloadOutcome::FellBack
        }
    }
}

#[cfg(test)]
impl<D: RenderDevice> ShaderManager<D> {
    pub(crate) fn unload(&mut self) {
        self.active = ActiveShader::Unloaded;
    }
}

/// One compile attempt: whatever stages built, and the first failure.
struct ProgramBuild<D: RenderDevice> {
    program: ShaderProgram<D>,
    error: Option<ShaderError>,
}

impl<D: RenderDevice> ProgramBuild<D> {
    fn failed(error: ShaderError) -> Self {
        Self {
            program: ShaderProgram::empty(),
            error: Some(error),
        }
    }

    fn record(&mut self, label: &str, error: ShaderError) {
        log::error!("{label}: {error}");
        self.error.get_or_insert(error);
    }

    fn into_result(self) -> Result<ShaderProgram<D>, ShaderError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.program),
        }
    }
}

/// Compiles both stages and the input layout. Stages that fail are left
/// out, so the program is valid exactly when nothing failed. Every failure
/// is logged; the first one is kept.
fn build_program<D: RenderDevice>(
    device: &mut D,
    files: &dyn FileService,
    path: &Path,
    defines: &[&str],
) -> ProgramBuild<D> {
    let label = path.display().to_string();
    let bytes = files.read(path);
    if bytes.is_empty() {
        let error = ShaderError::EmptySource { path: path.to_path_buf() };
        log::error!("{error}");
        return ProgramBuild::failed(error);
    }
    let source = match std::str::from_utf8(&bytes) {
        Ok(text) => preprocess(text, defines).map_err(ShaderError::from),
        Err(_) => Err(ShaderError::NotUtf8),
    };
    let source = match source {
        Ok(source) => source,
        Err(error) => {
            log::error!("{label}: {error}");
            return ProgramBuild::failed(error);
        }
    };

    let mut build = ProgramBuild {
        program: ShaderProgram::empty(),
        error: None,
    };
    match device.compile_stage(&source, ShaderStage::Vertex, VERTEX_ENTRY_POINT, &label) {
        Ok(stage) => build.program.vertex = Some(stage),
        Err(e) => build.record(&label, e),
    }
    match device.compile_stage(&source, ShaderStage::Fragment, FRAGMENT_ENTRY_POINT, &label) {
        Ok(stage) => build.program.fragment = Some(stage),
        Err(e) => build.record(&label, e),
    }
    if let (Some(vs), Some(fs)) = (&build.program.vertex, &build.program.fragment) {
        match device.create_input_layout(vs, fs) {
            Ok(layout) => build.program.input_layout = Some(layout),
            Err(e) => build.record(&label, e),
        }
    }
    build
}
