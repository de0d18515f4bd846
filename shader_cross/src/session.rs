// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::{Mutex, PoisonError};

use crate::compile::{decompile, front, lower, BinaryModule, CompileRequest};
use crate::diagnostic::Diagnostic;
use crate::{Error, Profile, Stage};

/// A compiled shader stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledShader {
    /// Portable GLSL, starting with the emit profile's header.
    pub source: String,
    /// Non-fatal front-end diagnostics.
    pub warnings: Vec<Diagnostic>,
}

/// Owns the front-end library state for the lifetime of a group of compilations.
///
/// Creating a session initializes the front end; dropping it (or calling
/// [`shutdown`](Self::shutdown)) releases it. Sessions are independent of each other.
///
/// Calls into the front end are serialized, so a session can be shared between
/// threads wherever the front-end library allows it.
pub struct Session {
    compiler: Mutex<shaderc::Compiler>,
    profile: Profile,
}

impl Session {
    /// Create a session using the default [`Profile`].
    pub fn new() -> Result<Self, Error> {
        Self::with_profile(Profile::default())
    }

    pub fn with_profile(profile: Profile) -> Result<Self, Error> {
        let compiler = shaderc::Compiler::new().ok_or(Error::FrontendUnavailable)?;
        log::debug!("shader compiler session ready");
        Ok(Self {
            compiler: Mutex::new(compiler),
            profile,
        })
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Run the whole pipeline for one stage.
    pub fn compile(&self, request: &CompileRequest<'_>) -> Result<CompiledShader, Error> {
        self.run(request).map_err(|err| failed(request.stage, err))
    }

    /// Compile `request` as far as a validated SPIR-V module.
    pub fn compile_binary(&self, request: &CompileRequest<'_>) -> Result<BinaryModule, Error> {
        self.lower(request)
            .map(|(module, _)| module)
            .map_err(|err| failed(request.stage, err))
    }

    /// Decompile a module produced by [`compile_binary`](Self::compile_binary).
    pub fn decompile(&self, module: BinaryModule) -> Result<String, Error> {
        let stage = module.stage();
        decompile::decompile(module, &self.profile.emit).map_err(|err| failed(stage, err))
    }

    /// Compile with the sentinel contract of the C ABI: `None` on any failure.
    ///
    /// Diagnostics are only available through the log.
    pub fn compile_source(
        &self,
        source: &str,
        name: &str,
        defines: &str,
        stage: Stage,
    ) -> Option<String> {
        let request = CompileRequest {
            source,
            name,
            defines,
            stage,
        };
        self.compile(&request).ok().map(|compiled| compiled.source)
    }

    /// Release the front end. Equivalent to dropping the session.
    pub fn shutdown(self) {
        log::debug!("shader compiler session shut down");
    }

    fn run(&self, request: &CompileRequest<'_>) -> Result<CompiledShader, Error> {
        let (module, warnings) = self.lower(request)?;
        let source = decompile::decompile(module, &self.profile.emit)?;
        Ok(CompiledShader { source, warnings })
    }

    fn lower(
        &self,
        request: &CompileRequest<'_>,
    ) -> Result<(BinaryModule, Vec<Diagnostic>), Error> {
        let program = {
            let compiler = self.compiler.lock().unwrap_or_else(PoisonError::into_inner);
            front::compile_front(&compiler, &self.profile.front, request)?
        };
        let warnings = program.warnings().to_vec();
        let module = lower::lower(program, self.profile.validation).map_err(|source| {
            log::error!("{} shader: lowering failed: {source}", request.stage);
            Error::Lowering {
                stage: request.stage,
                source,
            }
        })?;
        Ok((module, warnings))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

fn failed(stage: Stage, err: Error) -> Error {
    log::error!("{stage} shader compilation failed");
    err
}
