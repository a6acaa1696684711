//! Build script for fullscreen-compositor crate
//!
//! Assembles every WGSL variant of the compositor stage from the sources under `wgsl/`,
//! validates each one with naga, and embeds them as string constants so that a broken
//! shader fails the build instead of the first pipeline creation.

use std::path::PathBuf;

/// Vertex stage shared by all variants
const VERTEX: &str = "fullscreen_vertex.wgsl";

/// (constant name, fragment sources in concatenation order)
const VARIANTS: &[(&str, &[&str])] = &[
    ("DEBUG_GRADIENT", &["debug_gradient.wgsl"]),
    ("PASSTHROUGH_CLAMP", &["passthrough.wgsl", "edge_clamp.wgsl"]),
    ("PASSTHROUGH_REPEAT", &["passthrough.wgsl", "edge_repeat.wgsl"]),
    ("PASSTHROUGH_TRANSPARENT", &["passthrough.wgsl", "edge_transparent.wgsl"]),
];

/// Reads a shader file from the `wgsl/` directory
fn read_shader(wgsl_dir: &std::path::Path, file: &str) -> String {
    let path = wgsl_dir.join(file);
    println!("cargo:rerun-if-changed={}", path.display());
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()))
}

/// Parses and validates a composed shader, panicking with a readable report on failure
fn validate_wgsl(name: &str, shader: &str) {
    let module = naga::front::wgsl::parse_str(shader).unwrap_or_else(|e| panic!("Failed to parse WGSL variant {name}: {e:?}"));

    let mut validator = naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all());
    if let Err(e) = validator.validate(&module) {
        panic!("WGSL variant {name} failed validation: {e:?}");
    }
}

/// Converts WGSL shader source into a Rust string literal
fn dump_shader_string_literal(shader: &str) -> String {
    let escaped_shader = shader.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n");
    format!("\"{escaped_shader}\"")
}

fn main() {
    let wgsl_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("wgsl");
    let vertex = read_shader(&wgsl_dir, VERTEX);

    let mut code = String::new();
    code.push_str("// This file is generated by the build script.\n\n");

    for (name, fragments) in VARIANTS {
        let mut shader = vertex.clone();
        for file in fragments.iter() {
            shader.push('\n');
            shader.push_str(&read_shader(&wgsl_dir, file));
        }

        validate_wgsl(name, &shader);
        code.push_str(&format!("pub const {name}: &str = {};\n", dump_shader_string_literal(&shader)));
    }

    code.push_str("\n// END OF GENERATED CODE\n");

    let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR not set");
    let output_path = PathBuf::from(out_dir).join("shaders.rs");
    std::fs::write(output_path, code).expect("Failed to write shaders.rs");
}
