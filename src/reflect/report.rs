use std::fmt::Write;

use crate::reflect::{ShaderInfo, StageFlags};

const STAGE_NAMES: [(StageFlags, &str); 5] = [
	(StageFlags::VERTEX, "vertex"),
	(StageFlags::TESS_CONTROL, "tess_control"),
	(StageFlags::TESS_EVAL, "tess_eval"),
	(StageFlags::GEOMETRY, "geometry"),
	(StageFlags::FRAGMENT, "fragment"),
];

fn array_suffix(size: u32) -> String {
	if size > 0 {
		format!("[{}]", size)
	} else {
		String::new()
	}
}

impl ShaderInfo {
	/// A human readable description of the shader interface.
	pub fn report(&self) -> String {
		let mut out = String::new();
		// Writing to a `String` cannot fail.
		let _ = self.write_report(&mut out);
		out
	}

	fn write_report(&self, out: &mut String) -> std::fmt::Result {
		if self.name.is_empty() {
			writeln!(out, "Shader: <unnamed>")?;
		} else {
			writeln!(out, "Shader: {}", self.name)?;
		}

		let stages: Vec<_> = STAGE_NAMES
			.iter()
			.filter(|(flag, _)| self.stages.contains(*flag))
			.map(|(_, name)| *name)
			.collect();
		writeln!(out, "Stages: {}", stages.join(", "))?;

		writeln!(out, "Uniforms ({}):", self.uniforms.len())?;
		if !self.uniforms.is_empty() {
			writeln!(
				out,
				"  {:<20} {:<14} {:>7} {:>5} {:>5} {:>6} {:>5}",
				"name", "type", "binding", "block", "index", "offset", "size"
			)?;
		}
		for uniform in self.uniforms.iter() {
			let ty = match (uniform.format, uniform.subpass_index) {
				(Some(format), _) => format!("{}<{}>", uniform.ty, format),
				(_, Some(index)) => format!("{}<{}>", uniform.ty, index),
				_ => format!("{}{}", uniform.ty, array_suffix(uniform.array_size)),
			};
			let block = match uniform.block {
				Some(block) => block.to_string(),
				None => "-".to_string(),
			};
			writeln!(
				out,
				"  {:<20} {:<14} {:>7} {:>5} {:>5} {:>6} {:>5}",
				uniform.name,
				ty,
				uniform.binding,
				block,
				uniform.index,
				uniform.offset,
				uniform.size()
			)?;
		}
		for (i, block) in self.blocks.iter().enumerate() {
			writeln!(
				out,
				"  block {} at binding {}: {} members, {} bytes",
				i,
				block.binding,
				block.members.len(),
				block.size
			)?;
		}
		if !self.uniforms_contiguous() {
			writeln!(out, "  warning: uniform bindings are not contiguous from zero")?;
		}

		writeln!(out, "Attributes ({}):", self.attributes.len())?;
		if !self.attributes.is_empty() {
			writeln!(
				out,
				"  {:<20} {:<14} {:>8} {:>5} {:>5}",
				"name", "type", "location", "size", "slots"
			)?;
		}
		for attribute in self.attributes.iter() {
			writeln!(
				out,
				"  {:<20} {:<14} {:>8} {:>5} {:>5}",
				attribute.name,
				format!("{}{}", attribute.ty, array_suffix(attribute.array_size)),
				attribute.location,
				attribute.ty.byte_size() * attribute.array_size.max(1),
				attribute.slots()
			)?;
		}

		writeln!(out, "Outputs ({}):", self.outputs.len())?;
		if !self.outputs.is_empty() {
			writeln!(out, "  {:<20} {:<14} {:>8}", "name", "type", "location")?;
		}
		for output in self.outputs.iter() {
			writeln!(out, "  {:<20} {:<14} {:>8}", output.name, output.ty.to_string(), output.location)?;
		}

		writeln!(out, "Spec constants ({}):", self.spec_constants.len())?;
		for constant in self.spec_constants.iter() {
			writeln!(out, "  {:<20} {:<14} {:>8}", constant.name, constant.ty.to_string(), constant.index)?;
		}

		Ok(())
	}
}
