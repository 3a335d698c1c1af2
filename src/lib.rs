//! A compiler for a small shading language with separate vertex and fragment stages.
//!
//! A source file declares the stage interface (`@attributes`, `@outputs`, `@locals`), uniforms, constants and
//! standard functions, followed by `@vert` and `@frag` stage functions. [`compile`] checks the whole file and
//! produces a GLSL 450 module for each stage together with the reflection data of the shader interface.

use log::info;

use crate::{
	ast::StageKind,
	config::Options,
	diagnostic::{CompileError, Diagnostic, Diagnostics, Phase},
	reflect::ShaderInfo,
	text::Interner,
};

pub mod ast;
pub mod check;
pub mod config;
pub mod diagnostic;
pub mod emit;
pub mod parse;
pub mod reflect;
pub mod text;

pub use check::types::{ImageFormat, ShaderType};

/// The output of a successful compilation.
#[derive(Clone, Debug)]
pub struct CompiledShader {
	pub info: ShaderInfo,
	pub vertex: String,
	pub fragment: String,
}

/// Compiles `source`, reporting warnings to `diagnostics` and returning the first error.
pub fn compile(
	source: &str, file: &str, options: &Options, diagnostics: &mut Diagnostics,
) -> Result<CompiledShader, CompileError> {
	info!("compiling `{}`", file);
	let mut intern = Interner::new();

	let tu = match parse::parse(&mut intern, source, file) {
		Ok(tu) => tu,
		Err(diagnostic) => return Err(fail(file, source, diagnostic.in_phase(Phase::Parse), diagnostics)),
	};
	let file_text = intern.get(file);
	let program = match check::check(&tu, file_text, &mut intern, options, diagnostics) {
		Ok(program) => program,
		Err(diagnostic) => return Err(fail(file, source, diagnostic, diagnostics)),
	};

	let vertex = emit::module(&program, StageKind::Vertex);
	let fragment = emit::module(&program, StageKind::Fragment);
	info!(
		"compiled `{}`: {} attributes, {} outputs, {} uniforms, {} temporaries",
		file,
		program.info.attributes.len(),
		program.info.outputs.len(),
		program.info.uniforms.len(),
		program.temporaries
	);

	Ok(CompiledShader {
		info: program.info,
		vertex,
		fragment,
	})
}

fn fail(file: &str, source: &str, diagnostic: Diagnostic, diagnostics: &mut Diagnostics) -> CompileError {
	diagnostics.push(diagnostic.clone());
	CompileError::new(file, source, diagnostic)
}
