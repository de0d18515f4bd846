// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed dialect constants and the configuration that drives each pipeline stage.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Text injected ahead of the caller's defines and source.
///
/// Downstream tooling expects this exact header, byte for byte.
pub const PREAMBLE: &str = "#version 320 es\nprecision highp float;\nprecision highp int;\n";

/// Header prepended to every decompiled shader.
///
/// Declares default `highp` precision only when the consuming environment is GLSL ES,
/// so the same text is accepted by desktop and embedded drivers.
pub const PORTABILITY_HEADER: &str =
    "#ifdef GL_ES\nprecision highp float;\nprecision highp int;\n#endif\n";

/// Configuration for a [`Session`](crate::Session).
///
/// The default reproduces the fixed dialect the pipeline has always targeted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Profile {
    pub front: FrontProfile,
    pub emit: EmitProfile,
    pub validation: Validation,
}

/// Options for the GLSL front end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrontProfile {
    /// Injected as the first fragment of every translation unit.
    pub preamble: Cow<'static, str>,
    /// Language version assumed when the preamble has no `#version` directive.
    pub default_version: u32,
    /// Language profile paired with [`default_version`](Self::default_version).
    pub language_profile: LanguageProfile,
    /// Client API semantics the source is validated against.
    pub client: ClientApi,
    /// Version of the SPIR-V binary the front end generates.
    pub target: SpirvTarget,
    /// Assign `binding` and `location` qualifiers to resources that lack them.
    pub auto_bind: bool,
}

impl Default for FrontProfile {
    fn default() -> Self {
        Self {
            preamble: Cow::Borrowed(PREAMBLE),
            default_version: 150,
            language_profile: LanguageProfile::Compatibility,
            client: ClientApi::Vulkan1_0,
            target: SpirvTarget::V1_0,
            auto_bind: true,
        }
    }
}

impl FrontProfile {
    /// Whether the preamble already pins the language version.
    pub fn preamble_has_version(&self) -> bool {
        self.preamble
            .lines()
            .any(|line| line.trim_start().starts_with("#version"))
    }
}

/// Options for the GLSL emitted by the decompiler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitProfile {
    pub version: GlslTarget,
    /// Allow `layout(binding = N)` on desktop targets below 4.20.
    pub enable_420pack: bool,
    /// Prepended after the emitted `#version` line has been stripped.
    pub header: Cow<'static, str>,
}

impl Default for EmitProfile {
    fn default() -> Self {
        Self {
            // Lowest desktop version with geometry shaders.
            version: GlslTarget::Desktop(150),
            enable_420pack: false,
            header: Cow::Borrowed(PORTABILITY_HEADER),
        }
    }
}

/// How thoroughly a lowered binary is checked before decompilation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Validation {
    /// Hand the binary to the decompiler unchecked.
    Off,
    /// Check the header and instruction framing.
    Structural,
    /// Structural checks plus a full IR validation pass, where the validator
    /// understands the module.
    #[default]
    Full,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LanguageProfile {
    Core,
    Compatibility,
    Es,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClientApi {
    Vulkan1_0,
    Vulkan1_1,
    Vulkan1_2,
    OpenGl4_5,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SpirvTarget {
    V1_0,
    V1_1,
    V1_2,
    V1_3,
    V1_4,
    V1_5,
}

/// A GLSL dialect and version, e.g. desktop `150` or `300 es`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GlslTarget {
    Desktop(u16),
    Es(u16),
}

impl GlslTarget {
    pub fn is_es(self) -> bool {
        matches!(self, Self::Es(_))
    }
}

impl fmt::Display for GlslTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Desktop(version) => write!(f, "{version}"),
            Self::Es(version) => write!(f, "{version} es"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("`{0}` is not a GLSL version (expected e.g. `150`, `330` or `300es`)")]
pub struct InvalidGlslTarget(String);

impl FromStr for GlslTarget {
    type Err = InvalidGlslTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (digits, es) = match trimmed.strip_suffix("es") {
            Some(digits) => (digits.trim_end(), true),
            None => (trimmed, false),
        };
        let version = digits
            .parse::<u16>()
            .map_err(|_| InvalidGlslTarget(s.to_owned()))?;
        Ok(if es {
            Self::Es(version)
        } else {
            Self::Desktop(version)
        })
    }
}
