// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `shcross`: compile GLSL shader stages and effect files to portable GLSL.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use shader_cross::effect::{permutations, Effect};
use shader_cross::profile::{GlslTarget, Validation};
use shader_cross::{CompileRequest, Defines, Profile, Session, Stage};

#[derive(Parser, Debug)]
#[command(about, version)]
struct Args {
    /// Log progress as well as warnings and errors
    #[arg(long, short, global = true)]
    verbose: bool,
    /// GLSL dialect of the output, e.g. `150`, `330` or `300es`
    #[arg(long, global = true, default_value = "150")]
    glsl_version: GlslTarget,
    /// Skip SPIR-V validation between the front end and the decompiler
    #[arg(long, global = true)]
    no_validate: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a single shader stage
    Compile {
        input: PathBuf,
        /// Shader stage; guessed from the file extension when omitted
        #[arg(long, short)]
        stage: Option<StageArg>,
        /// Preprocessor define, `NAME` or `NAME=VALUE`
        #[arg(short = 'D', value_name = "NAME[=VALUE]")]
        define: Vec<String>,
        /// Output file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Write the validated SPIR-V module instead of GLSL
        #[arg(long)]
        spirv: bool,
    },
    /// Compile every feature permutation of one or more effect files
    Effect {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Directory to store the results into
        #[arg(long, short)]
        output: PathBuf,
        /// Also define `FEATURES430` in every variant
        #[arg(long)]
        gl430: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StageArg {
    Vertex,
    Fragment,
    Geometry,
}

impl From<StageArg> for Stage {
    fn from(stage: StageArg) -> Self {
        match stage {
            StageArg::Vertex => Self::Vertex,
            StageArg::Fragment => Self::Fragment,
            StageArg::Geometry => Self::Geometry,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut profile = Profile::default();
    profile.emit.version = args.glsl_version;
    if args.no_validate {
        profile.validation = Validation::Off;
    }
    let session = Session::with_profile(profile).context("initializing the shader compiler")?;

    match args.command {
        Command::Compile {
            input,
            stage,
            define,
            output,
            spirv,
        } => compile(&session, &input, stage, &define, output.as_deref(), spirv)?,
        Command::Effect {
            inputs,
            output,
            gl430,
        } => effects(&session, &inputs, &output, gl430)?,
    }
    session.shutdown();
    Ok(())
}

fn compile(
    session: &Session,
    input: &Path,
    stage: Option<StageArg>,
    define: &[String],
    output: Option<&Path>,
    spirv: bool,
) -> Result<()> {
    let stage = match stage {
        Some(stage) => stage.into(),
        None => input
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Stage::from_extension)
            .with_context(|| {
                format!(
                    "cannot tell the shader stage of {}; pass --stage",
                    input.display()
                )
            })?,
    };
    let source = fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let defines = define.iter().collect::<Defines>().to_string();
    let name = input.display().to_string();
    let request = CompileRequest::new(&source, stage)
        .with_name(&name)
        .with_defines(&defines);

    let bytes = if spirv {
        let module = session
            .compile_binary(&request)
            .with_context(|| format!("compiling {name}"))?;
        module.as_bytes().to_vec()
    } else {
        let compiled = session
            .compile(&request)
            .with_context(|| format!("compiling {name}"))?;
        compiled.source.into_bytes()
    };
    match output {
        Some(path) => {
            fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
        }
        None => std::io::stdout()
            .lock()
            .write_all(&bytes)
            .context("writing to stdout")?,
    }
    Ok(())
}

fn effects(session: &Session, inputs: &[PathBuf], output: &Path, gl430: bool) -> Result<()> {
    for input in inputs {
        if !input.is_file() {
            bail!("file does not exist {}", input.display());
        }
    }
    let mut effects = inputs
        .iter()
        .map(|input| Effect::read(input).with_context(|| format!("reading {}", input.display())))
        .collect::<Result<Vec<_>>>()?;
    // Output order must not depend on the order of the inputs.
    effects.sort_by(|a, b| a.name.cmp(&b.name));

    let bits = permutations::feature_bits(
        effects
            .iter()
            .flat_map(|effect| effect.features.iter().map(String::as_str)),
    )?;
    fs::create_dir_all(output).with_context(|| format!("creating {}", output.display()))?;

    for effect in &effects {
        let variants = effect.compile(session, gl430)?;
        let mut index = String::new();
        for variant in &variants {
            let mask = permutations::feature_mask(&bits, &variant.features);
            let stem = format!("{}_{mask}", effect.name);
            let stages = [
                (Stage::Vertex, Some(&variant.vertex)),
                (Stage::Fragment, Some(&variant.fragment)),
                (Stage::Geometry, variant.geometry.as_ref()),
            ];
            for (stage, source) in stages {
                let Some(source) = source else {
                    continue;
                };
                let path = output.join(format!("{stem}.{}", stage.extension()));
                fs::write(&path, source).with_context(|| format!("writing {}", path.display()))?;
            }
            index.push_str(&format!("{mask}\t{stem}\t{}\n", variant.features.join(" ")));
        }
        let path = output.join(format!("{}.variants", effect.name));
        fs::write(&path, index).with_context(|| format!("writing {}", path.display()))?;
        log::info!("{}: {} variants", effect.name, variants.len());
    }

    let features = bits
        .iter()
        .map(|(name, bit)| format!("{name}\t{bit}\n"))
        .collect::<String>();
    let path = output.join("features.txt");
    fs::write(&path, features).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
