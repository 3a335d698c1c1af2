use std::cell::OnceCell;

use bitflags::bitflags;

use crate::{
	ast::StageKind,
	check::types::{ImageFormat, ShaderType},
};

pub mod binary;
pub mod report;

bitflags! {
	#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
	pub struct StageFlags: u8 {
		const VERTEX = 1 << 0;
		const TESS_CONTROL = 1 << 1;
		const TESS_EVAL = 1 << 2;
		const GEOMETRY = 1 << 3;
		const FRAGMENT = 1 << 4;
	}
}

impl From<StageKind> for StageFlags {
	fn from(stage: StageKind) -> Self {
		match stage {
			StageKind::Vertex => StageFlags::VERTEX,
			StageKind::TessControl => StageFlags::TESS_CONTROL,
			StageKind::TessEval => StageFlags::TESS_EVAL,
			StageKind::Geometry => StageFlags::GEOMETRY,
			StageKind::Fragment => StageFlags::FRAGMENT,
		}
	}
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct VertexAttribute {
	pub name: String,
	pub ty: ShaderType,
	pub array_size: u32,
	/// First slot, the running slot count of the attributes before this one.
	pub location: u32,
}

impl VertexAttribute {
	pub fn slots(&self) -> u32 { self.ty.binding_slot_count(self.array_size) }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FragmentOutput {
	pub name: String,
	pub ty: ShaderType,
	pub location: u32,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Uniform {
	pub name: String,
	pub ty: ShaderType,
	pub array_size: u32,
	pub binding: u32,
	/// Index of the block this uniform is a member of.
	pub block: Option<u32>,
	/// Position within the block.
	pub index: u32,
	/// Byte offset within the block.
	pub offset: u32,
	pub format: Option<ImageFormat>,
	pub subpass_index: Option<u32>,
}

impl Uniform {
	pub fn size(&self) -> u32 { self.ty.byte_size() * self.array_size.max(1) }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct UniformBlock {
	pub binding: u32,
	/// Indices into the uniform list, ordered by offset.
	pub members: Vec<usize>,
	pub size: u32,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct SpecConstant {
	pub name: String,
	pub ty: ShaderType,
	pub index: u32,
}

/// The external interface of a compiled shader.
#[derive(Clone, Debug, Default)]
pub struct ShaderInfo {
	pub name: String,
	pub stages: StageFlags,
	pub attributes: Vec<VertexAttribute>,
	pub outputs: Vec<FragmentOutput>,
	pub uniforms: Vec<Uniform>,
	pub blocks: Vec<UniformBlock>,
	pub spec_constants: Vec<SpecConstant>,
	contiguous: OnceCell<bool>,
}

impl Default for StageFlags {
	fn default() -> Self { StageFlags::empty() }
}

impl PartialEq for ShaderInfo {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name
			&& self.stages == other.stages
			&& self.attributes == other.attributes
			&& self.outputs == other.outputs
			&& self.uniforms == other.uniforms
			&& self.blocks == other.blocks
			&& self.spec_constants == other.spec_constants
	}
}

impl ShaderInfo {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	pub fn attribute_slots(&self) -> u32 { self.attributes.iter().map(|x| x.slots()).sum() }

	pub fn add_attribute(&mut self, name: impl Into<String>, ty: ShaderType, array_size: u32) -> u32 {
		let location = self.attribute_slots();
		self.attributes.push(VertexAttribute {
			name: name.into(),
			ty,
			array_size,
			location,
		});
		location
	}

	pub fn add_output(&mut self, name: impl Into<String>, ty: ShaderType) -> u32 {
		let location = self.outputs.len() as u32;
		self.outputs.push(FragmentOutput {
			name: name.into(),
			ty,
			location,
		});
		location
	}

	pub fn add_handle(
		&mut self, name: impl Into<String>, ty: ShaderType, binding: u32, format: Option<ImageFormat>,
		subpass_index: Option<u32>,
	) {
		self.contiguous = OnceCell::new();
		self.uniforms.push(Uniform {
			name: name.into(),
			ty,
			array_size: 0,
			binding,
			block: None,
			index: 0,
			offset: 0,
			format,
			subpass_index,
		});
	}

	/// Starts a new uniform block, returning its index.
	pub fn begin_block(&mut self, binding: u32) -> u32 {
		self.contiguous = OnceCell::new();
		self.blocks.push(UniformBlock {
			binding,
			members: Vec::new(),
			size: 0,
		});
		self.blocks.len() as u32 - 1
	}

	/// Appends a member to a block at the given offset, or right after the previous member.
	pub fn add_block_member(
		&mut self, block: u32, name: impl Into<String>, ty: ShaderType, array_size: u32, offset: Option<u32>,
	) -> u32 {
		let b = &self.blocks[block as usize];
		let binding = b.binding;
		let index = b.members.len() as u32;
		let offset = offset.unwrap_or(b.size);

		let uniform = Uniform {
			name: name.into(),
			ty,
			array_size,
			binding,
			block: Some(block),
			index,
			offset,
			format: None,
			subpass_index: None,
		};
		let end = offset + uniform.size();
		self.uniforms.push(uniform);

		let id = self.uniforms.len() - 1;
		let uniforms = &self.uniforms;
		let b = &mut self.blocks[block as usize];
		b.members.push(id);
		b.members.sort_by_key(|&x| uniforms[x].offset);
		b.size = b.size.max(end);
		offset
	}

	pub fn add_spec_constant(&mut self, name: impl Into<String>, ty: ShaderType, index: u32) {
		self.spec_constants.push(SpecConstant {
			name: name.into(),
			ty,
			index,
		});
	}

	pub fn add_stage(&mut self, stage: StageKind) { self.stages |= StageFlags::from(stage); }

	pub fn bindings(&self) -> Vec<u32> { self.uniforms.iter().map(|x| x.binding).collect() }

	/// Whether the uniform bindings form the range `0..n` with no gaps.
	pub fn uniforms_contiguous(&self) -> bool { *self.contiguous.get_or_init(|| bindings_contiguous(&self.bindings())) }
}

/// Whether a set of bindings, duplicates allowed, forms the range `0..n` with no gaps.
pub fn bindings_contiguous(bindings: &[u32]) -> bool {
	let mut bindings = bindings.to_vec();
	bindings.sort_unstable();
	bindings.dedup();
	bindings.into_iter().enumerate().all(|(i, binding)| i as u32 == binding)
}
