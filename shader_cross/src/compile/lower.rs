// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lowering a linked program into a checked SPIR-V [`BinaryModule`].

use naga::front::spv;
use naga::valid::{Capabilities, ValidationError, ValidationFlags, Validator};
use naga::WithSpan;

use super::IntermediateProgram;
use crate::profile::Validation;
use crate::Stage;

/// First word of every SPIR-V module.
pub const MAGIC: u32 = 0x0723_0203;
const HEADER_WORDS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum LoweringError {
    #[error("the front end produced an empty module")]
    Empty,
    #[error("module header is truncated ({0} words)")]
    TruncatedHeader(usize),
    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),
    #[error("module declares an id bound of zero")]
    ZeroBound,
    #[error("instruction at word {offset} has a word count of zero")]
    ZeroWordCount { offset: usize },
    #[error("instruction at word {offset} needs {count} words but only {remaining} remain")]
    TruncatedInstruction {
        offset: usize,
        count: usize,
        remaining: usize,
    },
    #[error("module failed validation: {0}")]
    Validate(#[from] WithSpan<ValidationError>),
}

/// A lowered shader stage: a sequence of SPIR-V words in host order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryModule {
    stage: Stage,
    words: Vec<u32>,
}

impl BinaryModule {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    /// The `(major, minor)` SPIR-V version from the header.
    pub fn version(&self) -> Option<(u8, u8)> {
        let word = *self.words.get(1)?;
        Some(((word >> 16) as u8, (word >> 8) as u8))
    }

    /// All result ids in the module are below this bound.
    pub fn bound(&self) -> Option<u32> {
        self.words.get(3).copied()
    }

    pub fn into_words(self) -> Vec<u32> {
        self.words
    }
}

/// Turn a linked program into a [`BinaryModule`], checking it as `validation` requests.
pub fn lower(
    program: IntermediateProgram,
    validation: Validation,
) -> Result<BinaryModule, LoweringError> {
    let module = BinaryModule {
        stage: program.stage,
        words: program.words,
    };
    match validation {
        Validation::Off => {}
        Validation::Structural => check_structure(&module.words)?,
        Validation::Full => {
            check_structure(&module.words)?;
            validate_ir(&module)?;
        }
    }
    Ok(module)
}

/// Check the header and that instructions tile the stream exactly.
pub fn check_structure(words: &[u32]) -> Result<(), LoweringError> {
    if words.is_empty() {
        return Err(LoweringError::Empty);
    }
    if words.len() < HEADER_WORDS {
        return Err(LoweringError::TruncatedHeader(words.len()));
    }
    if words[0] != MAGIC {
        return Err(LoweringError::BadMagic(words[0]));
    }
    if words[3] == 0 {
        return Err(LoweringError::ZeroBound);
    }
    let mut offset = HEADER_WORDS;
    while offset < words.len() {
        // The high half of an instruction's first word is its length in words.
        let count = (words[offset] >> 16) as usize;
        if count == 0 {
            return Err(LoweringError::ZeroWordCount { offset });
        }
        let remaining = words.len() - offset;
        if count > remaining {
            return Err(LoweringError::TruncatedInstruction {
                offset,
                count,
                remaining,
            });
        }
        offset += count;
    }
    Ok(())
}

fn validate_ir(module: &BinaryModule) -> Result<(), LoweringError> {
    if module.stage == Stage::Geometry {
        log::debug!("geometry stage: IR validation unavailable, structural checks only");
        return Ok(());
    }
    let options = spv::Options {
        adjust_coordinate_space: false,
        strict_capabilities: false,
        ..Default::default()
    };
    // The reader models only part of SPIR-V (combined image samplers, for one, are
    // rejected), and the module has already passed the structural checks.
    let ir = match spv::parse_u8_slice(module.as_bytes(), &options) {
        Ok(ir) => ir,
        Err(err) => {
            log::debug!("{} stage: IR validation skipped: {err}", module.stage);
            return Ok(());
        }
    };
    Validator::new(
        ValidationFlags::all() & !ValidationFlags::CONTROL_FLOW_UNIFORMITY,
        Capabilities::all(),
    )
    .validate(&ir)?;
    Ok(())
}
