// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end compilation through a real front end and decompiler.

use shader_cross::diagnostic::{Fragment, Phase};
use shader_cross::profile::{GlslTarget, Validation};
use shader_cross::{CompileRequest, Defines, Error, Profile, Session, Stage, PORTABILITY_HEADER};

const VERTEX: &str = "void main()\n{\n    gl_Position = vec4(0.0);\n}\n";

const FRAGMENT: &str = "\
layout(location = 0) out vec4 color;
void main()
{
    color = vec4(1.0, 0.5, 0.25, 1.0);
}
";

const GEOMETRY: &str = "\
layout(points) in;
layout(points, max_vertices = 1) out;
void main()
{
    gl_Position = gl_in[0].gl_Position;
    EmitVertex();
    EndPrimitive();
}
";

const TEXTURED_QUAD_VERTEX: &str = "\
layout(location = 0) in vec2 position;
layout(location = 1) in vec2 tex_coord;
layout(location = 0) out vec2 uv;
uniform Transform
{
    mat4 mvp;
};
void main()
{
    uv = tex_coord;
    gl_Position = mvp * vec4(position, 0.0, 1.0);
}
";

const TEXTURED_QUAD_FRAGMENT: &str = "\
layout(location = 0) in vec2 uv;
layout(location = 0) out vec4 color;
uniform sampler2D albedo;
void main()
{
    color = texture(albedo, uv);
}
";

const SKYBOX_FRAGMENT: &str = "\
layout(location = 0) in vec3 direction;
layout(location = 0) out vec4 color;
uniform samplerCube sky;
void main()
{
    color = texture(sky, normalize(direction));
}
";

fn session() -> Session {
    Session::new().unwrap()
}

fn assert_portable(source: &str) {
    assert!(source.starts_with(PORTABILITY_HEADER), "{source}");
    assert!(!source.contains("#version"), "{source}");
    assert!(source.contains("void main()"), "{source}");
}

#[test]
fn minimal_vertex_shader() {
    let session = session();
    let compiled = session
        .compile(&CompileRequest::new(VERTEX, Stage::Vertex).with_name("basic.vert"))
        .unwrap();
    assert_portable(&compiled.source);
    assert!(compiled.source.contains("gl_Position"));
}

#[test]
fn defines_are_visible_to_the_source() {
    let source = "\
layout(location = 0) out vec4 color;
void main()
{
    color = TINT;
}
";
    let mut defines = Defines::new();
    defines.define("TINT", "vec4(1.0, 0.0, 0.0, 1.0)");
    let defines = defines.to_string();

    let session = session();
    let request = CompileRequest::new(source, Stage::Fragment)
        .with_name("tint.frag")
        .with_defines(&defines);
    let compiled = session.compile(&request).unwrap();
    assert_portable(&compiled.source);
    assert!(!compiled.source.contains("TINT"), "{}", compiled.source);
    assert!(
        compiled.source.contains("vec4(1.0, 0.0, 0.0, 1.0)"),
        "{}",
        compiled.source
    );

    // Without the define the identifier is unknown.
    let undefined = CompileRequest::new(source, Stage::Fragment).with_name("tint.frag");
    assert!(session.compile(&undefined).is_err());
}

#[test]
fn textured_quad_with_default_profile() {
    let session = session();
    let vertex = session
        .compile(&CompileRequest::new(TEXTURED_QUAD_VERTEX, Stage::Vertex).with_name("quad.vert"))
        .unwrap();
    assert_portable(&vertex.source);
    assert!(vertex.source.contains("mvp"), "{}", vertex.source);
    assert!(vertex.source.contains("uv"), "{}", vertex.source);

    let fragment = session
        .compile(
            &CompileRequest::new(TEXTURED_QUAD_FRAGMENT, Stage::Fragment).with_name("quad.frag"),
        )
        .unwrap();
    assert_portable(&fragment.source);
    assert!(fragment.source.contains("sampler2D"), "{}", fragment.source);
    assert!(fragment.source.contains("texture("), "{}", fragment.source);
}

#[test]
fn cube_map_sampling_with_default_profile() {
    let session = session();
    let compiled = session
        .compile(&CompileRequest::new(SKYBOX_FRAGMENT, Stage::Fragment).with_name("sky.frag"))
        .unwrap();
    assert_portable(&compiled.source);
    assert!(compiled.source.contains("samplerCube"), "{}", compiled.source);
    assert_eq!(
        session.compile_source(SKYBOX_FRAGMENT, "sky.frag", "", Stage::Fragment),
        Some(compiled.source)
    );
}

#[test]
fn conditional_compilation_selects_a_branch() {
    let source = "\
layout(location = 0) out vec4 color;
void main()
{
#ifdef RED
    color = vec4(1.0, 0.0, 0.0, 1.0);
#else
    color = undefined_symbol;
#endif
}
";
    let session = session();
    let request = CompileRequest::new(source, Stage::Fragment).with_defines("#define RED\n");
    assert_portable(&session.compile(&request).unwrap().source);
    assert!(session
        .compile(&CompileRequest::new(source, Stage::Fragment))
        .is_err());
}

#[test]
fn syntax_errors_are_attributed_to_the_source() {
    let session = session();
    let request = CompileRequest::new("void main()\n{\n    int x = ;\n}\n", Stage::Vertex)
        .with_name("broken.vert");
    let err = session.compile(&request).unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            stage: Stage::Vertex,
            ..
        }
    ));
    let diagnostics = err.diagnostics();
    assert!(!diagnostics.is_empty());
    assert!(diagnostics.iter().all(|d| d.phase == Phase::Parse));
    assert!(diagnostics
        .iter()
        .any(|d| d.fragment == Some(Fragment::Source) && d.line == Some(3)));
    assert_eq!(session.compile_source("void main() {", "", "", Stage::Vertex), None);
}

#[test]
fn stage_is_part_of_the_request() {
    let session = session();
    // `gl_Position` is not a fragment shader built-in.
    assert!(session
        .compile(&CompileRequest::new(VERTEX, Stage::Fragment))
        .is_err());
    assert!(session
        .compile(&CompileRequest::new(VERTEX, Stage::Vertex))
        .is_ok());

    let geometry = session
        .compile(&CompileRequest::new(GEOMETRY, Stage::Geometry).with_name("points.geom"))
        .unwrap();
    assert_portable(&geometry.source);
    assert!(geometry.source.contains("EmitVertex()"));
}

#[test]
fn compilation_is_deterministic() {
    let session = session();
    let request = CompileRequest::new(FRAGMENT, Stage::Fragment);
    let first = session.compile(&request).unwrap();
    let second = session.compile(&request).unwrap();
    assert_eq!(first, second);

    let other = Session::new().unwrap();
    assert_eq!(other.compile(&request).unwrap(), first);
}

#[test]
fn failures_do_not_poison_the_session() {
    let session = session();
    for _ in 0..3 {
        assert_eq!(
            session.compile_source("not glsl at all", "bad.frag", "", Stage::Fragment),
            None
        );
        let source = session.compile_source(FRAGMENT, "good.frag", "", Stage::Fragment);
        assert_portable(&source.unwrap());
    }
}

#[test]
fn sessions_are_independent() {
    let first = session();
    let second = session();
    second.shutdown();
    assert!(first
        .compile(&CompileRequest::new(VERTEX, Stage::Vertex))
        .is_ok());
    first.shutdown();

    let again = session();
    assert!(again
        .compile(&CompileRequest::new(VERTEX, Stage::Vertex))
        .is_ok());
}

#[test]
fn header_does_not_depend_on_input() {
    let session = session();
    let requests = [
        CompileRequest::new(VERTEX, Stage::Vertex),
        CompileRequest::new(FRAGMENT, Stage::Fragment).with_defines("#define UNUSED 1\n"),
        CompileRequest::new(GEOMETRY, Stage::Geometry),
    ];
    for request in &requests {
        let source = session.compile(request).unwrap().source;
        assert_eq!(&source[..PORTABILITY_HEADER.len()], PORTABILITY_HEADER);
    }
}

#[test]
fn binary_then_decompile_matches_compile() {
    let session = session();
    let request = CompileRequest::new(FRAGMENT, Stage::Fragment);
    let module = session.compile_binary(&request).unwrap();
    assert_eq!(module.stage(), Stage::Fragment);
    assert_eq!(module.words()[0], shader_cross::compile::lower::MAGIC);
    assert_eq!(module.version(), Some((1, 0)));
    assert_eq!(
        session.decompile(module).unwrap(),
        session.compile(&request).unwrap().source
    );
}

#[test]
fn output_dialect_is_configurable() {
    let mut profile = Profile::default();
    profile.emit.version = GlslTarget::Desktop(330);
    profile.validation = Validation::Structural;
    let session = Session::with_profile(profile).unwrap();
    let compiled = session
        .compile(&CompileRequest::new(FRAGMENT, Stage::Fragment))
        .unwrap();
    assert_portable(&compiled.source);

    let mut profile = Profile::default();
    profile.emit.version = GlslTarget::Desktop(151);
    let session = Session::with_profile(profile).unwrap();
    assert!(matches!(
        session.compile(&CompileRequest::new(FRAGMENT, Stage::Fragment)),
        Err(Error::Decompile { .. })
    ));
}
