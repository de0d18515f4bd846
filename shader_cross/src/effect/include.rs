// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `@include(path)` expansion.

use std::fs;
use std::path::{Path, PathBuf};

use super::EffectError;

/// Includes nested deeper than this are treated as a cycle.
pub const MAX_DEPTH: usize = 32;

/// Read `path` and recursively splice in every `@include(...)` line.
///
/// Include paths are resolved relative to the directory of the file that names them.
pub fn expand_includes(path: &Path) -> Result<String, EffectError> {
    let text = read(path)?;
    expand(&text, path, 0)
}

fn expand(text: &str, path: &Path, depth: usize) -> Result<String, EffectError> {
    let mut output = String::with_capacity(text.len());
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    for line in text.lines() {
        let Some(target) = include_target(line) else {
            output.push_str(line);
            output.push('\n');
            continue;
        };
        let included = dir.join(target);
        if !included.is_file() {
            return Err(EffectError::MissingInclude {
                path: included,
                from: path.to_path_buf(),
            });
        }
        if depth + 1 >= MAX_DEPTH {
            return Err(EffectError::IncludeDepth { path: included });
        }
        let contents = read(&included)?;
        output.push_str(&expand(&contents, &included, depth + 1)?);
    }
    Ok(output)
}

/// The path of an `@include(path)` line: `@`, optional whitespace, `include`, then
/// a parenthesized path, as the first non-whitespace text on the line.
fn include_target(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('@')?;
    let rest = rest.trim_start().strip_prefix("include")?;
    let rest = rest.trim_start().strip_prefix('(')?;
    let (target, _) = rest.split_once(')')?;
    Some(target.trim())
}

fn read(path: &Path) -> Result<String, EffectError> {
    fs::read_to_string(path).map_err(|source| EffectError::Io {
        path: PathBuf::from(path),
        source,
    })
}
