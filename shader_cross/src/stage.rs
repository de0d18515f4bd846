// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt;

/// A shader pipeline role.
///
/// The discriminants are part of the C ABI.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Stage {
    Vertex = 0,
    Fragment = 1,
    Geometry = 2,
}

impl Stage {
    pub const ALL: [Self; 3] = [Self::Vertex, Self::Fragment, Self::Geometry];

    /// Guess the stage from a conventional file extension such as `vert` or `fs`.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "vert" | "vs" => Some(Self::Vertex),
            "frag" | "fs" => Some(Self::Fragment),
            "geom" | "gs" => Some(Self::Geometry),
            _ => None,
        }
    }

    /// The conventional file extension for this stage.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Vertex => "vert",
            Self::Fragment => "frag",
            Self::Geometry => "geom",
        }
    }

    pub(crate) fn shader_kind(self) -> shaderc::ShaderKind {
        match self {
            Self::Vertex => shaderc::ShaderKind::Vertex,
            Self::Fragment => shaderc::ShaderKind::Fragment,
            Self::Geometry => shaderc::ShaderKind::Geometry,
        }
    }
}

impl TryFrom<i32> for Stage {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|stage| *stage as i32 == value)
            .ok_or(value)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Geometry => "geometry",
        })
    }
}
