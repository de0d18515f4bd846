// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! GLSL front end: preamble injection, parsing, linking and SPIR-V generation.

use shaderc::{
    CompileOptions, Compiler, EnvVersion, GlslProfile, OptimizationLevel, SourceLanguage,
    SpirvVersion, TargetEnv,
};

use super::CompileRequest;
use crate::diagnostic::{
    parse_messages, unparsed_lines, Diagnostic, FragmentMap, Phase, Severity,
};
use crate::profile::{ClientApi, FrontProfile, LanguageProfile, SpirvTarget};
use crate::{Error, Stage};

const ENTRY_POINT: &str = "main";

/// The preamble, defines and source of a request joined into one compilable text.
#[derive(Clone, Debug)]
pub struct TranslationUnit {
    text: String,
    fragments: FragmentMap,
}

impl TranslationUnit {
    pub fn new(preamble: &str, defines: &str, source: &str) -> Self {
        let mut text = String::with_capacity(preamble.len() + defines.len() + source.len());
        text.push_str(preamble);
        text.push_str(defines);
        text.push_str(source);
        Self {
            text,
            fragments: FragmentMap::new(preamble, defines),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn fragments(&self) -> &FragmentMap {
        &self.fragments
    }
}

/// A linked single-stage program, as generated by the front end and not yet validated.
#[derive(Clone, Debug)]
pub struct IntermediateProgram {
    pub(crate) stage: Stage,
    pub(crate) words: Vec<u32>,
    pub(crate) warnings: Vec<Diagnostic>,
}

impl IntermediateProgram {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }
}

/// Parse and link `request` into an [`IntermediateProgram`].
///
/// Every diagnostic is written to the log before an error is returned.
pub fn compile_front(
    compiler: &Compiler,
    profile: &FrontProfile,
    request: &CompileRequest<'_>,
) -> Result<IntermediateProgram, Error> {
    let unit = TranslationUnit::new(&profile.preamble, request.defines, request.source);
    let options = compile_options(profile)?;
    let name = display_name(request.name);
    let artifact = compiler.compile_into_spirv(
        unit.text(),
        request.stage.shader_kind(),
        name,
        ENTRY_POINT,
        Some(&options),
    );
    match artifact {
        Ok(artifact) => {
            let warnings = if artifact.get_num_warnings() > 0 {
                let log = artifact.get_warning_messages();
                log::debug!("{name}: front end log:\n{log}");
                let warnings = parse_messages(&log, Severity::Warning, unit.fragments());
                log_unparsed(name, &log, &warnings, log::Level::Warn);
                warnings
            } else {
                vec![]
            };
            for warning in &warnings {
                log::warn!("{name}: {warning}");
            }
            Ok(IntermediateProgram {
                stage: request.stage,
                words: artifact.as_binary().to_vec(),
                warnings,
            })
        }
        Err(shaderc::Error::CompilationError(_, log)) => {
            log::debug!("{name}: front end log:\n{log}");
            let diagnostics = parse_messages(&log, Severity::Error, unit.fragments());
            log_unparsed(name, &log, &diagnostics, log::Level::Error);
            Err(front_failure(name, request.stage, diagnostics))
        }
        Err(other) => {
            let diagnostic = Diagnostic::new(Phase::Parse, Severity::Error, other.to_string());
            Err(front_failure(name, request.stage, vec![diagnostic]))
        }
    }
}

/// Write the log lines that did not become diagnostics to the sink.
///
/// When no line was recognized the whole log is already the single fallback diagnostic.
fn log_unparsed(name: &str, log: &str, diagnostics: &[Diagnostic], level: log::Level) {
    if let [only] = diagnostics {
        if only.line.is_none() && only.message == log.trim() {
            return;
        }
    }
    for line in unparsed_lines(log) {
        log::log!(level, "{name}: {line}");
    }
}

fn front_failure(name: &str, stage: Stage, diagnostics: Vec<Diagnostic>) -> Error {
    for diagnostic in &diagnostics {
        log::error!("{name}: {diagnostic}");
    }
    // Only a failure with nothing but link errors is a link failure; glslang stops
    // before linking when parsing fails.
    let link_only = diagnostics
        .iter()
        .filter(|d| d.is_error())
        .all(|d| d.phase == Phase::Link)
        && diagnostics.iter().any(|d| d.is_error());
    if link_only {
        Error::Link {
            stage,
            diagnostics: diagnostics.into(),
        }
    } else {
        Error::Parse {
            stage,
            diagnostics: diagnostics.into(),
        }
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "shader"
    } else {
        name
    }
}

fn compile_options(profile: &FrontProfile) -> Result<CompileOptions<'static>, Error> {
    let mut options = CompileOptions::new().ok_or(Error::FrontendUnavailable)?;
    options.set_source_language(SourceLanguage::GLSL);
    let (env, version) = match profile.client {
        ClientApi::Vulkan1_0 => (TargetEnv::Vulkan, EnvVersion::Vulkan1_0),
        ClientApi::Vulkan1_1 => (TargetEnv::Vulkan, EnvVersion::Vulkan1_1),
        ClientApi::Vulkan1_2 => (TargetEnv::Vulkan, EnvVersion::Vulkan1_2),
        ClientApi::OpenGl4_5 => (TargetEnv::OpenGL, EnvVersion::OpenGL4_5),
    };
    options.set_target_env(env, version as u32);
    options.set_target_spirv(match profile.target {
        SpirvTarget::V1_0 => SpirvVersion::V1_0,
        SpirvTarget::V1_1 => SpirvVersion::V1_1,
        SpirvTarget::V1_2 => SpirvVersion::V1_2,
        SpirvTarget::V1_3 => SpirvVersion::V1_3,
        SpirvTarget::V1_4 => SpirvVersion::V1_4,
        SpirvTarget::V1_5 => SpirvVersion::V1_5,
    });
    if !profile.preamble_has_version() {
        let language_profile = match profile.language_profile {
            LanguageProfile::Core => GlslProfile::Core,
            LanguageProfile::Compatibility => GlslProfile::Compatibility,
            LanguageProfile::Es => GlslProfile::Es,
        };
        options.set_forced_version_profile(profile.default_version, language_profile);
    }
    options.set_auto_bind_uniforms(profile.auto_bind);
    options.set_auto_map_locations(profile.auto_bind);
    // Keep the module close to the source; the decompiler output is read by people.
    options.set_optimization_level(OptimizationLevel::Zero);
    Ok(options)
}
