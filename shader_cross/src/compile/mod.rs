// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The three pipeline stages: GLSL front end, lowering to a validated SPIR-V module, and
//! decompilation back to portable GLSL.
//!
//! Most users should go through [`Session`](crate::Session), which runs the stages in
//! order and owns the front-end library state.

pub mod decompile;
pub mod front;
pub mod lower;

pub use decompile::{decompile, finish_source, DecompileError};
pub use front::{IntermediateProgram, TranslationUnit};
pub use lower::{lower, BinaryModule, LoweringError};

use crate::Stage;

/// One compilation: caller-owned text, borrowed for the duration of the call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CompileRequest<'a> {
    pub source: &'a str,
    /// Label used when attributing diagnostics. May be empty.
    pub name: &'a str,
    /// Raw preprocessor text inserted verbatim between the preamble and the source.
    pub defines: &'a str,
    pub stage: Stage,
}

impl<'a> CompileRequest<'a> {
    pub fn new(source: &'a str, stage: Stage) -> Self {
        Self {
            source,
            name: "",
            defines: "",
            stage,
        }
    }

    pub fn with_name(self, name: &'a str) -> Self {
        Self { name, ..self }
    }

    pub fn with_defines(self, defines: &'a str) -> Self {
        Self { defines, ..self }
    }
}
