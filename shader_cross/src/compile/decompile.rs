// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SPIR-V to portable GLSL.

use spirv_cross2::compile::glsl::GlslVersion;
use spirv_cross2::compile::CompilableTarget;
use spirv_cross2::targets::Glsl;
use spirv_cross2::{Compiler, Module, SpirvCrossError};

use super::BinaryModule;
use crate::profile::{EmitProfile, GlslTarget};
use crate::Error;

#[derive(Debug, thiserror::Error)]
pub enum DecompileError {
    #[error(transparent)]
    Cross(#[from] SpirvCrossError),
    #[error("GLSL {0} is not a decompiler target")]
    UnsupportedTarget(GlslTarget),
}

/// Decompile `module` into GLSL for the dialect in `emit`.
///
/// The module is consumed. The emitted `#version` line is replaced by
/// [`EmitProfile::header`]; nothing is returned if any step of the decompiler fails.
pub fn decompile(module: BinaryModule, emit: &EmitProfile) -> Result<String, Error> {
    let stage = module.stage();
    match emit_glsl(module, emit) {
        Ok(emitted) => Ok(finish_source(&emit.header, &emitted)),
        Err(source) => {
            log::error!("{stage} shader: decompiler failed: {source}");
            Err(Error::Decompile { stage, source })
        }
    }
}

fn emit_glsl(module: BinaryModule, emit: &EmitProfile) -> Result<String, DecompileError> {
    let version = glsl_version(emit.version)?;
    let words = module.into_words();
    let compiler = Compiler::<Glsl>::new(Module::from_words(&words))?;
    {
        // Resource reflection primes the compiler's internal state for emission.
        let _resources = compiler.shader_resources()?;
    }
    let mut options = Glsl::options();
    options.version = version;
    options.enable_420pack_extension = emit.enable_420pack;
    let artifact = compiler.compile(&options)?;
    Ok(artifact.to_string())
}

fn glsl_version(target: GlslTarget) -> Result<GlslVersion, DecompileError> {
    Ok(match target {
        GlslTarget::Desktop(110) => GlslVersion::Glsl110,
        GlslTarget::Desktop(120) => GlslVersion::Glsl120,
        GlslTarget::Desktop(130) => GlslVersion::Glsl130,
        GlslTarget::Desktop(140) => GlslVersion::Glsl140,
        GlslTarget::Desktop(150) => GlslVersion::Glsl150,
        GlslTarget::Desktop(330) => GlslVersion::Glsl330,
        GlslTarget::Desktop(400) => GlslVersion::Glsl400,
        GlslTarget::Desktop(410) => GlslVersion::Glsl410,
        GlslTarget::Desktop(420) => GlslVersion::Glsl420,
        GlslTarget::Desktop(430) => GlslVersion::Glsl430,
        GlslTarget::Desktop(440) => GlslVersion::Glsl440,
        GlslTarget::Desktop(450) => GlslVersion::Glsl450,
        GlslTarget::Desktop(460) => GlslVersion::Glsl460,
        GlslTarget::Es(100) => GlslVersion::Glsl100Es,
        GlslTarget::Es(300) => GlslVersion::Glsl300Es,
        GlslTarget::Es(310) => GlslVersion::Glsl310Es,
        GlslTarget::Es(320) => GlslVersion::Glsl320Es,
        other => return Err(DecompileError::UnsupportedTarget(other)),
    })
}

/// Drop the first line of `emitted` and put `header` in its place.
pub fn finish_source(header: &str, emitted: &str) -> String {
    let body = emitted.split_once('\n').map_or("", |(_, rest)| rest);
    let mut source = String::with_capacity(header.len() + body.len());
    source.push_str(header);
    source.push_str(body);
    source
}
