//! WGSL stage validation and reflection via naga.
//!
//! This runs on the CPU before anything reaches the device, so a broken edit
//! produces diagnostics text instead of a device-level validation failure.

use naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::error::{ShaderError, ShaderStage};

/// What the renderer needs to know about a compiled stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageInfo {
    pub stage: ShaderStage,
    pub entry_point: String,
    /// `@location` inputs read by the entry point (vertex stages only matter).
    pub input_locations: Vec<u32>,
    /// `(group, binding)` of every resource the module declares.
    pub bindings: Vec<(u32, u32)>,
}

impl ShaderStage {
    fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

/// Parses and validates `source`, then looks up `entry_point` for `stage`.
pub fn validate_stage(
    source: &str,
    stage: ShaderStage,
    entry_point: &str,
) -> Result<StageInfo, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Compile {
        stage,
        diagnostics: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| ShaderError::Compile {
            stage,
            diagnostics: e.emit_to_string(source),
        })?;

    let ep = module
        .entry_points
        .iter()
        .find(|ep| ep.name == entry_point && ep.stage == stage.to_naga())
        .ok_or_else(|| ShaderError::MissingEntryPoint {
            stage,
            entry_point: entry_point.to_string(),
        })?;

    let mut input_locations = Vec::new();
    for arg in &ep.function.arguments {
        match &arg.binding {
            Some(naga::Binding::Location { location, .. }) => input_locations.push(*location),
            Some(_) => {}
            // Struct argument: bindings live on the members.
            None => {
                if let naga::TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                    for member in members {
                        if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                            input_locations.push(*location);
                        }
                    }
                }
            }
        }
    }
    input_locations.sort_unstable();

    let mut bindings: Vec<_> = module
        .global_variables
        .iter()
        .filter_map(|(_, var)| var.binding.as_ref().map(|b| (b.group, b.binding)))
        .collect();
    bindings.sort_unstable();

    Ok(StageInfo {
        stage,
        entry_point: entry_point.to_string(),
        input_locations,
        bindings,
    })
}

/// Checks that every input the vertex stage reads is supplied by `provided`.
pub fn check_input_layout(vertex: &StageInfo, provided: &[u32]) -> Result<(), ShaderError> {
    match vertex.input_locations.iter().find(|l| !provided.contains(l)) {
        Some(&location) => Err(ShaderError::UnboundVertexInput { location }),
        None => Ok(()),
    }
}

/// Checks that every resource the stage declares exists in the pipeline layout.
pub fn check_bindings(info: &StageInfo, provided: &[(u32, u32)]) -> Result<(), ShaderError> {
    match info.bindings.iter().find(|b| !provided.contains(b)) {
        Some(&(group, binding)) => Err(ShaderError::UnboundResource {
            stage: info.stage,
            group,
            binding,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{SPRITE_INPUT_LOCATIONS, SPRITE_RESOURCE_BINDINGS};
    use crate::shader::{preprocess, ERROR_SHADER_DEFINE, SPRITE_SHADER_SOURCE};

    fn sprite_source(defines: &[&str]) -> String {
        preprocess(SPRITE_SHADER_SOURCE, defines).unwrap()
    }

    #[test]
    fn builtin_shader_compiles_both_stages() {
        let src = sprite_source(&[]);
        let vs = validate_stage(&src, ShaderStage::Vertex, "vs_main").unwrap();
        let fs = validate_stage(&src, ShaderStage::Fragment, "fs_main").unwrap();
        assert_eq!(vs.input_locations, [0, 1, 2, 3, 4]);
        assert_eq!(fs.stage, ShaderStage::Fragment);
        assert_eq!(fs.bindings, [(0, 0), (1, 0), (1, 1)]);
        check_input_layout(&vs, &SPRITE_INPUT_LOCATIONS).unwrap();
        check_bindings(&fs, &SPRITE_RESOURCE_BINDINGS).unwrap();
    }

    #[test]
    fn error_variant_compiles_both_stages() {
        let src = sprite_source(&[ERROR_SHADER_DEFINE]);
        validate_stage(&src, ShaderStage::Vertex, "vs_main").unwrap();
        validate_stage(&src, ShaderStage::Fragment, "fs_main").unwrap();
    }

    #[test]
    fn syntax_error_yields_diagnostics() {
        let src = sprite_source(&[]).replace("return out;", "return out");
        let err = validate_stage(&src, ShaderStage::Vertex, "vs_main").unwrap_err();
        match err {
            ShaderError::Compile { stage, diagnostics } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!diagnostics.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn type_error_is_caught_by_validation() {
        let src = sprite_source(&[]).replace(
            "out.color = in.color;",
            "out.color = in.color + vec3<f32>(1.0);",
        );
        assert!(matches!(
            validate_stage(&src, ShaderStage::Vertex, "vs_main"),
            Err(ShaderError::Compile { .. })
        ));
    }

    #[test]
    fn entry_point_must_match_stage() {
        let src = sprite_source(&[]);
        assert_eq!(
            validate_stage(&src, ShaderStage::Fragment, "vs_main"),
            Err(ShaderError::MissingEntryPoint {
                stage: ShaderStage::Fragment,
                entry_point: "vs_main".into(),
            })
        );
    }

    #[test]
    fn unbound_vertex_input_is_rejected() {
        let vs = StageInfo {
            stage: ShaderStage::Vertex,
            entry_point: "vs_main".into(),
            input_locations: vec![0, 1, 7],
            bindings: vec![(0, 0), (2, 0)],
        };
        assert_eq!(
            check_input_layout(&vs, &SPRITE_INPUT_LOCATIONS),
            Err(ShaderError::UnboundVertexInput { location: 7 })
        );
        assert_eq!(
            check_bindings(&vs, &SPRITE_RESOURCE_BINDINGS),
            Err(ShaderError::UnboundResource {
                stage: ShaderStage::Vertex,
                group: 2,
                binding: 0,
            })
        );
    }
}
