use std::fmt;

use crate::device::RenderDevice;

/// A vertex + fragment pair with its input layout.
///
/// Any missing piece makes the program invalid; an invalid program is never
/// installed as the active shader.
pub struct ShaderProgram<D: RenderDevice> {
    pub(crate) vertex: Option<D::Stage>,
    pub(crate) fragment: Option<D::Stage>,
    pub(crate) input_layout: Option<D::Pipeline>,
}

impl<D: RenderDevice> ShaderProgram<D> {
    pub(crate) fn empty() -> Self {
        Self {
            vertex: None,
            fragment: None,
            input_layout: None,
        }
    }

    /// Vertex stage, fragment stage and input layout are all present.
    pub fn is_valid(&self) -> bool {
        self.vertex.is_some() && self.fragment.is_some() && self.input_layout.is_some()
    }

    /// The bound pipeline; `None` for an invalid program.
    pub fn pipeline(&self) -> Option<&D::Pipeline> {
        self.input_layout.as_ref()
    }
}

impl<D: RenderDevice> fmt::Debug for ShaderProgram<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("vertex", &self.vertex.is_some())
            .field("fragment", &self.fragment.is_some())
            .field("input_layout", &self.input_layout.is_some())
            .finish()
    }
}
