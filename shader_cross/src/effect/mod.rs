// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effect files: the stages of one shader program in a single text file.
//!
//! ```text
//! @name Sprite
//! @feature VERTEX_COLORS
//! @include(common.glsl)
//! @vertex
//! layout(location = 0) in vec2 position;
//! void main() { gl_Position = vec4(position, 0.0, 1.0); }
//! @fragment
//! layout(location = 0) out vec4 color;
//! void main() { color = vec4(1.0); }
//! ```
//!
//! Directives start with `@` as the first non-whitespace character of a line that
//! neither lies inside nor contains a `/* */` comment. `@vertex`, `@fragment` and `@geometry` open a stage block, which
//! collects the following lines until the next directive; `@lazy` closes a block.
//! Every `@feature` produces an extra compilation of the program with that feature
//! `#define`d, for each combination of features.

mod include;
pub mod permutations;

use std::path::{Path, PathBuf};

pub use include::{expand_includes, MAX_DEPTH};

use crate::{CompileRequest, Error, Session, Stage};

/// Define added to every variant compiled for the GL 4.3 path.
pub const GL430_DEFINE: &str = "FEATURES430";

#[derive(thiserror::Error, Debug)]
pub enum EffectError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: could not find include '{}'", from.display(), path.display())]
    MissingInclude { path: PathBuf, from: PathBuf },
    #[error("include of '{}' nested more than {} deep", path.display(), MAX_DEPTH)]
    IncludeDepth { path: PathBuf },
    #[error("duplicate {stage} block at line {line}")]
    DuplicateBlock { stage: Stage, line: usize },
    #[error("{0} source not specified")]
    MissingStage(Stage),
    #[error("@feature without a name at line {line}")]
    UnnamedFeature { line: usize },
    #[error("{0} features is more than can be expanded into permutations")]
    TooManyFeatures(usize),
    #[error("effect {effect} ({variant}) failed to compile")]
    Compile {
        effect: String,
        variant: String,
        #[source]
        source: Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Effect {
    /// Identifier-safe name, from `@name` or the file stem.
    pub name: String,
    pub vertex: String,
    pub fragment: String,
    pub geometry: Option<String>,
    /// Features in declaration order.
    pub features: Vec<String>,
}

/// One permutation of an effect's features.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
    pub features: Vec<String>,
    /// Preprocessor text passed to every stage of this variant.
    pub defines: String,
}

impl Variant {
    /// `basic` for the variant without features, otherwise the features joined by `, `.
    pub fn label(&self) -> String {
        if self.features.is_empty() {
            "basic".to_owned()
        } else {
            self.features.join(", ")
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledVariant {
    pub features: Vec<String>,
    pub vertex: String,
    pub fragment: String,
    pub geometry: Option<String>,
}

impl Effect {
    /// Read an effect file, expanding its includes.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, EffectError> {
        let path = path.as_ref();
        let text = expand_includes(path)?;
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy())
            .unwrap_or_default();
        Self::parse(&text, &stem)
    }

    /// Parse effect text whose includes have already been expanded.
    ///
    /// `fallback_name` is used when the text has no `@name` directive.
    pub fn parse(text: &str, fallback_name: &str) -> Result<Self, EffectError> {
        let mut parser = Parser::default();
        for (index, line) in text.lines().enumerate() {
            parser.line(index + 1, line)?;
        }
        parser.finish(fallback_name)
    }

    /// The base variant followed by one variant per non-empty feature subset.
    pub fn variants(&self, gl430: bool) -> Result<Vec<Variant>, EffectError> {
        let base = if gl430 {
            format!("#define {GL430_DEFINE}\n")
        } else {
            String::new()
        };
        let mut variants = vec![Variant {
            features: vec![],
            defines: base.clone(),
        }];
        for features in permutations::feature_sets(&self.features)? {
            let mut defines = base.clone();
            for feature in &features {
                defines.push_str("#define ");
                defines.push_str(feature);
                defines.push('\n');
            }
            variants.push(Variant { features, defines });
        }
        Ok(variants)
    }

    /// Compile every stage of every variant.
    ///
    /// Stops at the first stage that fails to compile.
    pub fn compile(
        &self,
        session: &Session,
        gl430: bool,
    ) -> Result<Vec<CompiledVariant>, EffectError> {
        let mut compiled = vec![];
        for variant in self.variants(gl430)? {
            log::info!("Compiling {} ({})", self.name, variant.label());
            let stage =
                |stage: Stage, source: &str| self.compile_stage(session, &variant, stage, source);
            compiled.push(CompiledVariant {
                vertex: stage(Stage::Vertex, &self.vertex)?,
                fragment: stage(Stage::Fragment, &self.fragment)?,
                geometry: self
                    .geometry_source()
                    .map(|source| stage(Stage::Geometry, source))
                    .transpose()?,
                features: variant.features.clone(),
            });
        }
        Ok(compiled)
    }

    /// The geometry block, unless it is missing or blank.
    pub fn geometry_source(&self) -> Option<&str> {
        self.geometry
            .as_deref()
            .filter(|source| !source.trim().is_empty())
    }

    fn compile_stage(
        &self,
        session: &Session,
        variant: &Variant,
        stage: Stage,
        source: &str,
    ) -> Result<String, EffectError> {
        let name = format!("{}.{}", self.name, stage.extension());
        let request = CompileRequest::new(source, stage)
            .with_name(&name)
            .with_defines(&variant.defines);
        session
            .compile(&request)
            .map(|compiled| compiled.source)
            .map_err(|source| EffectError::Compile {
                effect: self.name.clone(),
                variant: variant.label(),
                source,
            })
    }
}

#[derive(Default)]
struct Parser {
    name: Option<String>,
    features: Vec<String>,
    blocks: [Option<String>; 3],
    current: Option<(Stage, String)>,
    in_comment: bool,
}

impl Parser {
    fn line(&mut self, number: usize, line: &str) -> Result<(), EffectError> {
        // A line that is inside, or opens, a block comment is never a directive.
        let commented = self.in_comment || line.contains("/*");
        self.track_comments(line);
        let directive = match line.trim_start().strip_prefix('@') {
            Some(directive) if !commented => directive.trim(),
            _ => {
                if let Some((_, block)) = &mut self.current {
                    block.push_str(line);
                    block.push('\n');
                }
                return Ok(());
            }
        };
        let (keyword, argument) = directive
            .split_once(char::is_whitespace)
            .map_or((directive, ""), |(keyword, rest)| (keyword, rest.trim()));
        let keyword = keyword.to_ascii_lowercase();
        let stage = match keyword.as_str() {
            "vertex" => Some(Stage::Vertex),
            "fragment" => Some(Stage::Fragment),
            "geometry" => Some(Stage::Geometry),
            "name" | "feature" | "lazy" => None,
            _ => {
                log::warn!("invalid directive `{}` at line {number}", line.trim());
                return Ok(());
            }
        };
        self.close_block();
        match (keyword.as_str(), stage) {
            (_, Some(stage)) => {
                if self.blocks[stage as usize].is_some() {
                    return Err(EffectError::DuplicateBlock { stage, line: number });
                }
                self.current = Some((stage, String::new()));
            }
            ("name", _) => self.name = Some(argument.to_owned()),
            ("feature", _) => {
                let feature = argument.split_whitespace().next();
                let feature = feature.ok_or(EffectError::UnnamedFeature { line: number })?;
                if self.features.iter().any(|known| known == feature) {
                    log::warn!("duplicate feature `{feature}` at line {number}");
                } else {
                    self.features.push(feature.to_owned());
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn track_comments(&mut self, line: &str) {
        let mut rest = line;
        loop {
            let marker = if self.in_comment { "*/" } else { "/*" };
            let Some(index) = rest.find(marker) else {
                break;
            };
            self.in_comment = !self.in_comment;
            rest = &rest[index + marker.len()..];
        }
    }

    fn close_block(&mut self) {
        if let Some((stage, block)) = self.current.take() {
            self.blocks[stage as usize] = Some(block);
        }
    }

    fn finish(mut self, fallback_name: &str) -> Result<Effect, EffectError> {
        self.close_block();
        let [vertex, fragment, geometry] = self.blocks;
        let name = match self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => fallback_name.to_owned(),
        };
        Ok(Effect {
            name: sanitize_name(&name),
            vertex: vertex.ok_or(EffectError::MissingStage(Stage::Vertex))?,
            fragment: fragment.ok_or(EffectError::MissingStage(Stage::Fragment))?,
            geometry,
            features: self.features,
        })
    }
}

/// Make `name` usable as an identifier: anything other than letters, digits and `_`
/// becomes `_`, and a leading digit gets a `_` prefix.
pub fn sanitize_name(name: &str) -> String {
    let name = name.trim();
    let mut sane = String::with_capacity(name.len() + 1);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        sane.push('_');
    }
    sane.extend(
        name.chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' }),
    );
    sane
}
