use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use thiserror::Error;

use crate::{
	check::types::{ImageFormat, ShaderType},
	reflect::{ShaderInfo, StageFlags},
};

pub const MAGIC: [u8; 4] = *b"VSLR";
const NO_EXTRA: u8 = 0xFF;

#[derive(Debug, Error)]
pub enum ReflectError {
	#[error("i/o error: {0}")]
	Io(#[from] std::io::Error),
	#[error("not a reflection record")]
	BadMagic,
	#[error("record written by incompatible version {0}.{1}.{2}")]
	Version(u8, u8, u8),
	#[error("invalid stage mask {0:#04x}")]
	StageMask(u8),
	#[error("unknown type code {0}")]
	UnknownType(u8),
	#[error("unknown image format {0}")]
	UnknownFormat(u8),
	#[error("name is not valid utf-8")]
	Utf8(#[from] std::string::FromUtf8Error),
	#[error("`{0}` does not fit in a reflection record")]
	TooLarge(String),
	#[error("uniform `{0}` refers to a missing block")]
	MissingBlock(String),
}

fn version() -> (u8, u8, u8) {
	(
		env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
		env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
		env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
	)
}

fn byte(value: u32, what: &str) -> Result<u8, ReflectError> {
	u8::try_from(value).map_err(|_| ReflectError::TooLarge(what.to_string()))
}

fn short(value: u32, what: &str) -> Result<u16, ReflectError> {
	u16::try_from(value).map_err(|_| ReflectError::TooLarge(what.to_string()))
}

fn write_name<W: Write>(w: &mut W, name: &str) -> Result<(), ReflectError> {
	let len = u8::try_from(name.len()).map_err(|_| ReflectError::TooLarge(name.to_string()))?;
	w.write_u8(len)?;
	w.write_all(name.as_bytes())?;
	Ok(())
}

fn read_name<R: Read>(r: &mut R) -> Result<String, ReflectError> {
	let len = r.read_u8()?;
	let mut bytes = vec![0; len as usize];
	r.read_exact(&mut bytes)?;
	Ok(String::from_utf8(bytes)?)
}

fn read_type<R: Read>(r: &mut R) -> Result<ShaderType, ReflectError> {
	let code = r.read_u8()?;
	match ShaderType::from_repr(code) {
		Some(ty) if ty.is_value_type() || ty.is_handle_type() => Ok(ty),
		_ => Err(ReflectError::UnknownType(code)),
	}
}

fn count<T>(items: &[T], what: &str) -> Result<u16, ReflectError> {
	u16::try_from(items.len()).map_err(|_| ReflectError::TooLarge(what.to_string()))
}

impl ShaderInfo {
	pub fn write_binary<W: Write>(&self, w: &mut W) -> Result<(), ReflectError> {
		let (major, minor, patch) = version();
		w.write_all(&MAGIC)?;
		w.write_u8(major)?;
		w.write_u8(minor)?;
		w.write_u8(patch)?;
		w.write_u8(self.stages.bits())?;
		write_name(w, &self.name)?;

		w.write_u16::<LittleEndian>(count(&self.uniforms, "uniforms")?)?;
		for uniform in self.uniforms.iter() {
			write_name(w, &uniform.name)?;
			w.write_u8(uniform.ty as u8)?;
			w.write_u16::<LittleEndian>(short(uniform.array_size, &uniform.name)?)?;
			let extra = match (uniform.format, uniform.subpass_index) {
				(Some(format), _) => format as u8,
				(_, Some(index)) => byte(index, &uniform.name)?,
				_ => NO_EXTRA,
			};
			w.write_u8(extra)?;
			w.write_u8(byte(uniform.binding, &uniform.name)?)?;
			let block = match uniform.block {
				Some(block) => byte(block, &uniform.name)?,
				None => NO_EXTRA,
			};
			w.write_u8(block)?;
			w.write_u8(byte(uniform.index, &uniform.name)?)?;
			w.write_u16::<LittleEndian>(short(uniform.offset, &uniform.name)?)?;
		}

		w.write_u16::<LittleEndian>(count(&self.attributes, "attributes")?)?;
		for attribute in self.attributes.iter() {
			write_name(w, &attribute.name)?;
			w.write_u8(attribute.ty as u8)?;
			w.write_u16::<LittleEndian>(short(attribute.array_size, &attribute.name)?)?;
			w.write_u8(NO_EXTRA)?;
			w.write_u8(byte(attribute.location, &attribute.name)?)?;
		}

		w.write_u16::<LittleEndian>(count(&self.outputs, "outputs")?)?;
		for output in self.outputs.iter() {
			write_name(w, &output.name)?;
			w.write_u8(output.ty as u8)?;
			w.write_u16::<LittleEndian>(0)?;
			w.write_u8(NO_EXTRA)?;
			w.write_u8(byte(output.location, &output.name)?)?;
		}

		w.write_u16::<LittleEndian>(count(&self.spec_constants, "spec constants")?)?;
		for constant in self.spec_constants.iter() {
			write_name(w, &constant.name)?;
			w.write_u8(constant.ty as u8)?;
			w.write_u16::<LittleEndian>(0)?;
			w.write_u8(NO_EXTRA)?;
			w.write_u8(byte(constant.index, &constant.name)?)?;
		}

		Ok(())
	}

	pub fn to_bytes(&self) -> Result<Vec<u8>, ReflectError> {
		let mut out = Vec::new();
		self.write_binary(&mut out)?;
		debug!("encoded reflection record of {} bytes", out.len());
		Ok(out)
	}

	pub fn read_binary<R: Read>(r: &mut R) -> Result<ShaderInfo, ReflectError> {
		let mut magic = [0; 4];
		r.read_exact(&mut magic)?;
		if magic != MAGIC {
			return Err(ReflectError::BadMagic);
		}

		let (major, minor, patch) = (r.read_u8()?, r.read_u8()?, r.read_u8()?);
		if major != version().0 {
			return Err(ReflectError::Version(major, minor, patch));
		}

		let mask = r.read_u8()?;
		let stages = StageFlags::from_bits(mask).ok_or(ReflectError::StageMask(mask))?;
		let mut info = ShaderInfo::new(read_name(r)?);
		info.stages = stages;

		for _ in 0..r.read_u16::<LittleEndian>()? {
			let name = read_name(r)?;
			let ty = read_type(r)?;
			let array_size = r.read_u16::<LittleEndian>()? as u32;
			let extra = r.read_u8()?;
			let binding = r.read_u8()? as u32;
			let block = r.read_u8()?;
			let _index = r.read_u8()?;
			let offset = r.read_u16::<LittleEndian>()? as u32;

			if block == NO_EXTRA {
				let (format, subpass_index) = if ty.is_image() {
					let format = ImageFormat::from_repr(extra).ok_or(ReflectError::UnknownFormat(extra))?;
					(Some(format), None)
				} else if ty.is_subpass_input() {
					(None, Some(extra as u32))
				} else {
					(None, None)
				};
				info.add_handle(name, ty, binding, format, subpass_index);
			} else {
				let block = block as usize;
				if block == info.blocks.len() {
					info.begin_block(binding);
				} else if block > info.blocks.len() {
					return Err(ReflectError::MissingBlock(name));
				}
				info.add_block_member(block as u32, name, ty, array_size, Some(offset));
			}
		}

		for _ in 0..r.read_u16::<LittleEndian>()? {
			let name = read_name(r)?;
			let ty = read_type(r)?;
			let array_size = r.read_u16::<LittleEndian>()? as u32;
			let _extra = r.read_u8()?;
			let _location = r.read_u8()?;
			info.add_attribute(name, ty, array_size);
		}

		for _ in 0..r.read_u16::<LittleEndian>()? {
			let name = read_name(r)?;
			let ty = read_type(r)?;
			let _array_size = r.read_u16::<LittleEndian>()?;
			let _extra = r.read_u8()?;
			let _location = r.read_u8()?;
			info.add_output(name, ty);
		}

		for _ in 0..r.read_u16::<LittleEndian>()? {
			let name = read_name(r)?;
			let ty = read_type(r)?;
			let _array_size = r.read_u16::<LittleEndian>()?;
			let _extra = r.read_u8()?;
			let index = r.read_u8()? as u32;
			info.add_spec_constant(name, ty, index);
		}

		Ok(info)
	}

	pub fn from_bytes(mut bytes: &[u8]) -> Result<ShaderInfo, ReflectError> { Self::read_binary(&mut bytes) }
}
