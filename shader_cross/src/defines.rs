// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt;

/// Builds the preprocessor text passed as the defines fragment of a compile request.
///
/// ```
/// use shader_cross::Defines;
///
/// let mut defines = Defines::new();
/// defines.flag("SKINNED").define("MAX_LIGHTS", "8");
/// assert_eq!(defines.to_string(), "#define SKINNED\n#define MAX_LIGHTS 8\n");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Defines {
    entries: Vec<(String, Option<String>)>,
}

impl Defines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.push((name.into(), Some(value.into())));
        self
    }

    /// Define `name` without a value, for use with `#ifdef`.
    pub fn flag(&mut self, name: impl Into<String>) -> &mut Self {
        self.entries.push((name.into(), None));
        self
    }

    /// Add a command line style definition: `NAME` or `NAME=VALUE`.
    pub fn push_arg(&mut self, arg: &str) -> &mut Self {
        match arg.split_once('=') {
            Some((name, value)) => self.define(name.trim(), value.trim()),
            None => self.flag(arg.trim()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Defines {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut defines = Self::new();
        for arg in iter {
            defines.push_arg(arg.as_ref());
        }
        defines
    }
}

impl fmt::Display for Defines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            match value {
                Some(value) => writeln!(f, "#define {name} {value}")?,
                None => writeln!(f, "#define {name}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Defines;

    #[test]
    fn command_line_args() {
        let defines: Defines = ["A", "B=2", " C = vec4(1.0) "].into_iter().collect();
        assert_eq!(
            defines.to_string(),
            "#define A\n#define B 2\n#define C vec4(1.0)\n"
        );
    }

    #[test]
    fn empty_defines_render_nothing() {
        let defines = Defines::new();
        assert!(defines.is_empty());
        assert_eq!(defines.to_string(), "");
    }
}
