use log::debug;

use crate::{
	ast::StageKind,
	check::{types::ShaderType, Program},
};

/// Line based output with tab indentation.
#[derive(Clone, Debug, Default)]
pub struct CodeWriter {
	buf: String,
	indent: usize,
}

impl CodeWriter {
	pub fn new() -> Self { Self::default() }

	pub fn line(&mut self, line: impl AsRef<str>) {
		for _ in 0..self.indent {
			self.buf.push('\t');
		}
		self.buf.push_str(line.as_ref());
		self.buf.push('\n');
	}

	pub fn blank(&mut self) { self.buf.push('\n'); }

	pub fn indent(&mut self) { self.indent += 1; }

	pub fn dedent(&mut self) { self.indent = self.indent.saturating_sub(1); }

	/// Appends already formatted lines at the current indentation.
	pub fn append(&mut self, text: &str) {
		for line in text.lines() {
			if line.is_empty() {
				self.blank();
			} else {
				self.line(line);
			}
		}
	}

	pub fn finish(self) -> String { self.buf }
}

pub fn declarator(ty: ShaderType, name: &str, array_size: u32) -> String {
	if array_size > 0 {
		format!("{} {}[{}]", ty.glsl_name(), name, array_size)
	} else {
		format!("{} {}", ty.glsl_name(), name)
	}
}

/// Assembles the GLSL module of one stage.
pub fn module(program: &Program, stage: StageKind) -> String {
	let info = &program.info;
	let mut w = CodeWriter::new();

	w.line(format!("// Generated by vsl {}; do not edit.", env!("CARGO_PKG_VERSION")));
	if !info.name.is_empty() {
		w.line(format!("// Shader: {}", info.name));
	}
	w.line("#version 450");
	w.line("#extension GL_EXT_scalar_block_layout : require");
	w.blank();

	match stage {
		StageKind::Vertex => {
			for attribute in info.attributes.iter() {
				w.line(format!(
					"layout(location = {}) in {};",
					attribute.location,
					declarator(attribute.ty, &attribute.name, attribute.array_size)
				));
			}
			for internal in program.internals.iter() {
				w.line(format!(
					"layout(location = {}) {}out {};",
					internal.location,
					if internal.flat { "flat " } else { "" },
					declarator(internal.ty, &internal.name, internal.array_size)
				));
			}
		},
		StageKind::Fragment => {
			for internal in program.internals.iter() {
				w.line(format!(
					"layout(location = {}) {}in {};",
					internal.location,
					if internal.flat { "flat " } else { "" },
					declarator(internal.ty, &internal.name, internal.array_size)
				));
			}
			for output in info.outputs.iter() {
				w.line(format!(
					"layout(location = {}) out {};",
					output.location,
					declarator(output.ty, &output.name, 0)
				));
			}
		},
		_ => {},
	}

	let mut blocks_done = vec![false; info.blocks.len()];
	for uniform in info.uniforms.iter() {
		match uniform.block {
			Some(block) => {
				if blocks_done[block as usize] {
					continue;
				}
				blocks_done[block as usize] = true;

				let block = &info.blocks[block as usize];
				w.line(format!(
					"layout(set = 0, binding = {}, scalar) uniform _Block_{} {{",
					block.binding, block.binding
				));
				w.indent();
				for &member in block.members.iter() {
					let member = &info.uniforms[member];
					w.line(format!(
						"layout(offset = {}) {};",
						member.offset,
						declarator(member.ty, &member.name, member.array_size)
					));
				}
				w.dedent();
				w.line("};");
			},
			None => {
				if let Some(format) = uniform.format {
					w.line(format!(
						"layout(set = 0, binding = {}, {}) uniform {}{} {};",
						uniform.binding,
						format,
						format.glsl_prefix(),
						uniform.ty.glsl_name(),
						uniform.name
					));
				} else if let Some(index) = uniform.subpass_index {
					if stage == StageKind::Fragment {
						w.line(format!(
							"layout(set = 0, binding = {}, input_attachment_index = {}) uniform subpassInput {};",
							uniform.binding, index, uniform.name
						));
					}
				} else {
					w.line(format!(
						"layout(set = 0, binding = {}) uniform {} {};",
						uniform.binding,
						uniform.ty.glsl_name(),
						uniform.name
					));
				}
			},
		}
	}

	if !program.declarations.is_empty() {
		w.blank();
		for decl in program.declarations.iter() {
			w.line(decl);
		}
	}

	for function in program.functions.iter() {
		w.blank();
		w.append(function);
	}

	w.blank();
	w.line("void main() {");
	w.indent();
	match stage {
		StageKind::Vertex => w.append(&program.vertex),
		StageKind::Fragment => w.append(&program.fragment),
		_ => {},
	}
	w.dedent();
	w.line("}");

	let out = w.finish();
	debug!("emitted {:?} module of {} bytes", stage, out.len());
	out
}
