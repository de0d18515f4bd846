// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shader Cross compiles OpenGL-flavoured GLSL into portable GLSL by way of SPIR-V.
//!
//! Each request is assembled from a fixed [`PREAMBLE`], caller supplied preprocessor
//! defines and the shader source, then:
//!
//! 1. parsed, validated and linked for a single [`Stage`] by the GLSL front end,
//! 2. lowered into a checked SPIR-V [`BinaryModule`],
//! 3. decompiled into desktop GLSL with the [`PORTABILITY_HEADER`] in place of its
//!    `#version` line, so the result is accepted by both desktop and ES drivers.
//!
//! A [`Session`] owns the front end's global state and runs the pipeline:
//!
//! ```no_run
//! use shader_cross::{CompileRequest, Session, Stage};
//!
//! let session = Session::new()?;
//! let request = CompileRequest::new("void main() { gl_Position = vec4(0.0); }", Stage::Vertex)
//!     .with_name("basic.vert");
//! let compiled = session.compile(&request)?;
//! assert!(compiled.source.starts_with("#ifdef GL_ES"));
//! # Ok::<(), shader_cross::Error>(())
//! ```
//!
//! Hosts that cannot link Rust directly use the flat C ABI in [`ffi`], which exposes
//! the same pipeline with null-on-failure results and an explicit free function.
//!
//! The [`effect`] module reads effect files, which bundle the stages of one shader
//! program together with a list of optional features, and compiles every feature
//! permutation.

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]
#![allow(
    clippy::cast_possible_truncation,
    reason = "SPIR-V header fields are packed bytes"
)]

pub mod compile;
pub mod diagnostic;
pub mod effect;
#[cfg(feature = "ffi")]
pub mod ffi;
pub mod profile;

mod defines;
mod session;
mod stage;

pub use compile::{BinaryModule, CompileRequest, DecompileError, LoweringError};
pub use defines::Defines;
pub use diagnostic::{Diagnostic, DiagnosticList};
pub use profile::{Profile, PORTABILITY_HEADER, PREAMBLE};
pub use session::{CompiledShader, Session};
pub use stage::Stage;

use diagnostic::{Phase, Severity};
use thiserror::Error;

/// Errors that can occur while compiling a shader.
///
/// Every error is confined to the call that produced it; the [`Session`] remains usable.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The GLSL front end could not allocate its compiler or options.
    #[error("the GLSL front end could not be initialized")]
    FrontendUnavailable,
    /// The preamble, defines and source did not form a valid translation unit.
    #[error("{stage} shader failed to compile:\n{diagnostics}")]
    Parse {
        stage: Stage,
        diagnostics: DiagnosticList,
    },
    /// The parsed stage could not be linked into a program.
    #[error("{stage} shader failed to link:\n{diagnostics}")]
    Link {
        stage: Stage,
        diagnostics: DiagnosticList,
    },
    /// The front end's SPIR-V did not pass validation.
    #[error("{stage} shader failed to lower to SPIR-V")]
    Lowering {
        stage: Stage,
        #[source]
        source: LoweringError,
    },
    /// The decompiler rejected the module or the requested dialect.
    #[error("{stage} shader failed to decompile")]
    Decompile {
        stage: Stage,
        #[source]
        source: DecompileError,
    },
}

impl Error {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::FrontendUnavailable => None,
            Self::Parse { stage, .. }
            | Self::Link { stage, .. }
            | Self::Lowering { stage, .. }
            | Self::Decompile { stage, .. } => Some(*stage),
        }
    }

    /// The failure as structured diagnostics, whichever step produced it.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Self::FrontendUnavailable => vec![Diagnostic::new(
                Phase::Parse,
                Severity::Error,
                self.to_string(),
            )],
            Self::Parse { diagnostics, .. } | Self::Link { diagnostics, .. } => {
                diagnostics.0.clone()
            }
            Self::Lowering { source, .. } => vec![Diagnostic::new(
                Phase::Lower,
                Severity::Error,
                source.to_string(),
            )],
            Self::Decompile { source, .. } => vec![Diagnostic::new(
                Phase::Decompile,
                Severity::Error,
                source.to_string(),
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowering_errors_become_diagnostics() {
        let err = Error::Lowering {
            stage: Stage::Fragment,
            source: LoweringError::Empty,
        };
        assert_eq!(err.stage(), Some(Stage::Fragment));
        let diagnostics = err.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].phase, Phase::Lower);
        assert_eq!(err.to_string(), "fragment shader failed to lower to SPIR-V");
    }

    #[test]
    fn parse_errors_render_their_diagnostics() {
        let err = Error::Parse {
            stage: Stage::Vertex,
            diagnostics: vec![Diagnostic::new(Phase::Parse, Severity::Error, "syntax error")]
                .into(),
        };
        assert_eq!(
            err.to_string(),
            "vertex shader failed to compile:\nparse error: syntax error"
        );
        assert_eq!(err.diagnostics().len(), 1);
    }
}
