use std::fmt::Display;

use strum::{EnumIter, EnumString, FromRepr, IntoStaticStr};

/// Every type a value or resource can have.
///
/// The discriminants carry the type algebra: scalars and vectors sit in blocks of four starting at a multiple of
/// four (`bool` at 4, `int` at 8, `uint` at 12, `float` at 16), so the component count of a scalar or vector is its
/// discriminant modulo four plus one, and its component type is the discriminant with the low two bits cleared.
/// Matrices follow directly after the float vectors. Handles live in a separate range from 32 upwards and have no
/// components.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, EnumIter, IntoStaticStr, EnumString, FromRepr)]
#[repr(u8)]
pub enum ShaderType {
	#[strum(serialize = "<error>")]
	Error = 0,
	#[strum(serialize = "void")]
	Void = 1,

	#[strum(serialize = "bool")]
	Bool = 4,
	#[strum(serialize = "bool2")]
	Bool2 = 5,
	#[strum(serialize = "bool3")]
	Bool3 = 6,
	#[strum(serialize = "bool4")]
	Bool4 = 7,
	#[strum(serialize = "int")]
	Int = 8,
	#[strum(serialize = "int2")]
	Int2 = 9,
	#[strum(serialize = "int3")]
	Int3 = 10,
	#[strum(serialize = "int4")]
	Int4 = 11,
	#[strum(serialize = "uint")]
	UInt = 12,
	#[strum(serialize = "uint2")]
	UInt2 = 13,
	#[strum(serialize = "uint3")]
	UInt3 = 14,
	#[strum(serialize = "uint4")]
	UInt4 = 15,
	#[strum(serialize = "float")]
	Float = 16,
	#[strum(serialize = "float2")]
	Float2 = 17,
	#[strum(serialize = "float3")]
	Float3 = 18,
	#[strum(serialize = "float4")]
	Float4 = 19,
	#[strum(serialize = "float2x2")]
	Float2x2 = 20,
	#[strum(serialize = "float3x3")]
	Float3x3 = 21,
	#[strum(serialize = "float4x4")]
	Float4x4 = 22,

	#[strum(serialize = "tex1D")]
	Tex1D = 32,
	#[strum(serialize = "tex2D")]
	Tex2D = 33,
	#[strum(serialize = "tex3D")]
	Tex3D = 34,
	#[strum(serialize = "texCube")]
	TexCube = 35,
	#[strum(serialize = "tex1DArray")]
	Tex1DArray = 36,
	#[strum(serialize = "tex2DArray")]
	Tex2DArray = 37,
	#[strum(serialize = "image1D")]
	Image1D = 40,
	#[strum(serialize = "image2D")]
	Image2D = 41,
	#[strum(serialize = "image3D")]
	Image3D = 42,
	#[strum(serialize = "image1DArray")]
	Image1DArray = 43,
	#[strum(serialize = "image2DArray")]
	Image2DArray = 44,
	#[strum(serialize = "subpassInput")]
	SubpassInput = 48,
}

const FIRST_VALUE: u8 = ShaderType::Bool as u8;
const FIRST_MATRIX: u8 = ShaderType::Float2x2 as u8;
const LAST_VALUE: u8 = ShaderType::Float4x4 as u8;
const FIRST_HANDLE: u8 = ShaderType::Tex1D as u8;

const _: () = {
	assert!(ShaderType::Bool as u8 % 4 == 0);
	assert!(ShaderType::Int as u8 == ShaderType::Bool as u8 + 4);
	assert!(ShaderType::UInt as u8 == ShaderType::Int as u8 + 4);
	assert!(ShaderType::Float as u8 == ShaderType::UInt as u8 + 4);
	assert!(ShaderType::Float4 as u8 == ShaderType::Float as u8 + 3);
	assert!(FIRST_MATRIX == ShaderType::Float4 as u8 + 1);
	assert!(ShaderType::Float4x4 as u8 == FIRST_MATRIX + 2);
	assert!(FIRST_HANDLE > LAST_VALUE);
};

impl Display for ShaderType {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let s: &'static str = (*self).into();
		write!(f, "{}", s)
	}
}

impl ShaderType {
	pub fn keyword(self) -> &'static str { self.into() }

	pub fn is_value_type(self) -> bool { (FIRST_VALUE..=LAST_VALUE).contains(&(self as u8)) }

	pub fn is_handle_type(self) -> bool { self as u8 >= FIRST_HANDLE }

	pub fn is_scalar(self) -> bool { self.is_value_type() && !self.is_matrix() && self as u8 % 4 == 0 }

	pub fn is_vector(self) -> bool { self.is_value_type() && !self.is_matrix() && self as u8 % 4 != 0 }

	pub fn is_matrix(self) -> bool { (FIRST_MATRIX..=LAST_VALUE).contains(&(self as u8)) }

	pub fn is_texture(self) -> bool { (Self::Tex1D as u8..=Self::Tex2DArray as u8).contains(&(self as u8)) }

	pub fn is_image(self) -> bool { (Self::Image1D as u8..=Self::Image2DArray as u8).contains(&(self as u8)) }

	pub fn is_subpass_input(self) -> bool { self == Self::SubpassInput }

	/// The scalar type of each component. Matrices have float components; handles and `void` have none.
	pub fn component_type(self) -> ShaderType {
		if self.is_matrix() {
			Self::Float
		} else if self.is_value_type() {
			Self::from_repr(self as u8 & !3).unwrap_or(Self::Error)
		} else {
			Self::Error
		}
	}

	pub fn component_count(self) -> u32 {
		match self {
			Self::Float2x2 => 4,
			Self::Float3x3 => 9,
			Self::Float4x4 => 16,
			x if x.is_value_type() => x as u32 % 4 + 1,
			_ => 0,
		}
	}

	/// Expands a scalar to an `n` component vector of the same component type.
	pub fn to_vector(self, n: u32) -> Option<ShaderType> {
		if !self.is_scalar() || !(1..=4).contains(&n) {
			return None;
		}
		Self::from_repr(self as u8 + n as u8 - 1)
	}

	/// The same shape with a different component type. Matrices only exist with float components.
	pub fn with_component(self, base: ShaderType) -> Option<ShaderType> {
		if self.is_matrix() {
			(base == Self::Float).then_some(self)
		} else {
			base.to_vector(self.component_count())
		}
	}

	/// The row and column count of a square matrix.
	pub fn matrix_rank(self) -> Option<u32> {
		match self {
			Self::Float2x2 => Some(2),
			Self::Float3x3 => Some(3),
			Self::Float4x4 => Some(4),
			_ => None,
		}
	}

	pub fn matrix(rank: u32) -> Option<ShaderType> {
		match rank {
			2 => Some(Self::Float2x2),
			3 => Some(Self::Float3x3),
			4 => Some(Self::Float4x4),
			_ => None,
		}
	}

	pub fn is_numeric(self) -> bool { self.is_value_type() && self.component_type() != Self::Bool }

	pub fn is_integer(self) -> bool { matches!(self.component_type(), Self::Int | Self::UInt) }

	/// Position of a scalar in the `int -> uint -> float` promotion chain.
	fn promotion_rank(self) -> Option<u8> {
		match self {
			Self::Int => Some(0),
			Self::UInt => Some(1),
			Self::Float => Some(2),
			_ => None,
		}
	}

	pub fn can_implicit_cast(self, to: ShaderType) -> bool {
		if self == to {
			return self != Self::Error;
		}
		if !self.is_value_type() || !to.is_value_type() || self.is_matrix() || to.is_matrix() {
			return false;
		}
		if self.component_count() != to.component_count() {
			return false;
		}
		match (
			self.component_type().promotion_rank(),
			to.component_type().promotion_rank(),
		) {
			(Some(from), Some(to)) => from <= to,
			_ => false,
		}
	}

	/// The higher of two numeric component types in the promotion chain.
	pub fn promote_scalar(a: ShaderType, b: ShaderType) -> Option<ShaderType> {
		let (a, b) = (a.component_type(), b.component_type());
		let (ra, rb) = (a.promotion_rank()?, b.promotion_rank()?);
		Some(if ra >= rb { a } else { b })
	}

	/// The common type two equal-shaped value types promote to, if any.
	pub fn promote(a: ShaderType, b: ShaderType) -> Option<ShaderType> {
		if a.can_implicit_cast(b) {
			Some(b)
		} else if b.can_implicit_cast(a) {
			Some(a)
		} else {
			None
		}
	}

	pub fn byte_size(self) -> u32 {
		match self {
			Self::Float2x2 => 16,
			Self::Float3x3 => 36,
			Self::Float4x4 => 64,
			x if x.is_value_type() => 4 * x.component_count(),
			x if x.is_handle_type() => 4,
			_ => 0,
		}
	}

	/// Number of 16 byte binding slots a declaration of this type occupies.
	pub fn binding_slot_count(self, array_size: u32) -> u32 { (self.byte_size() + 15) / 16 * array_size.max(1) }

	/// Number of coordinates a sampling or image access takes.
	pub fn coord_count(self) -> u32 {
		match self {
			Self::Tex1D | Self::Image1D => 1,
			Self::Tex2D | Self::Tex1DArray | Self::Image2D | Self::Image1DArray => 2,
			Self::Tex3D | Self::TexCube | Self::Tex2DArray | Self::Image3D | Self::Image2DArray => 3,
			_ => 0,
		}
	}

	/// Number of components a size query of this resource returns.
	pub fn size_count(self) -> u32 {
		match self {
			Self::TexCube => 2,
			x => x.coord_count(),
		}
	}

	pub fn glsl_name(self) -> &'static str {
		match self {
			Self::Error => "<error>",
			Self::Void => "void",
			Self::Bool => "bool",
			Self::Bool2 => "bvec2",
			Self::Bool3 => "bvec3",
			Self::Bool4 => "bvec4",
			Self::Int => "int",
			Self::Int2 => "ivec2",
			Self::Int3 => "ivec3",
			Self::Int4 => "ivec4",
			Self::UInt => "uint",
			Self::UInt2 => "uvec2",
			Self::UInt3 => "uvec3",
			Self::UInt4 => "uvec4",
			Self::Float => "float",
			Self::Float2 => "vec2",
			Self::Float3 => "vec3",
			Self::Float4 => "vec4",
			Self::Float2x2 => "mat2",
			Self::Float3x3 => "mat3",
			Self::Float4x4 => "mat4",
			Self::Tex1D => "sampler1D",
			Self::Tex2D => "sampler2D",
			Self::Tex3D => "sampler3D",
			Self::TexCube => "samplerCube",
			Self::Tex1DArray => "sampler1DArray",
			Self::Tex2DArray => "sampler2DArray",
			Self::Image1D => "image1D",
			Self::Image2D => "image2D",
			Self::Image3D => "image3D",
			Self::Image1DArray => "image1DArray",
			Self::Image2DArray => "image2DArray",
			Self::SubpassInput => "subpassInput",
		}
	}
}

/// Texel formats a storage image can be declared with.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, EnumIter, IntoStaticStr, EnumString, FromRepr)]
#[repr(u8)]
pub enum ImageFormat {
	#[strum(serialize = "rgba32f")]
	Rgba32F,
	#[strum(serialize = "rgba16f")]
	Rgba16F,
	#[strum(serialize = "rg32f")]
	Rg32F,
	#[strum(serialize = "rg16f")]
	Rg16F,
	#[strum(serialize = "r32f")]
	R32F,
	#[strum(serialize = "r16f")]
	R16F,
	#[strum(serialize = "rgba8")]
	Rgba8,
	#[strum(serialize = "rgba8_snorm")]
	Rgba8Snorm,
	#[strum(serialize = "rg8")]
	Rg8,
	#[strum(serialize = "r8")]
	R8,
	#[strum(serialize = "rgba32i")]
	Rgba32I,
	#[strum(serialize = "rgba16i")]
	Rgba16I,
	#[strum(serialize = "rg32i")]
	Rg32I,
	#[strum(serialize = "r32i")]
	R32I,
	#[strum(serialize = "rgba32ui")]
	Rgba32UI,
	#[strum(serialize = "rgba16ui")]
	Rgba16UI,
	#[strum(serialize = "rg32ui")]
	Rg32UI,
	#[strum(serialize = "r32ui")]
	R32UI,
}

impl Display for ImageFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result { write!(f, "{}", self.keyword()) }
}

impl ImageFormat {
	pub fn keyword(self) -> &'static str { self.into() }

	/// Component type of the texels loaded from or stored to an image of this format.
	pub fn component_type(self) -> ShaderType {
		match self {
			Self::Rgba32I | Self::Rgba16I | Self::Rg32I | Self::R32I => ShaderType::Int,
			Self::Rgba32UI | Self::Rgba16UI | Self::Rg32UI | Self::R32UI => ShaderType::UInt,
			_ => ShaderType::Float,
		}
	}

	/// The image type prefix GLSL needs for this format.
	pub fn glsl_prefix(self) -> &'static str {
		match self.component_type() {
			ShaderType::Int => "i",
			ShaderType::UInt => "u",
			_ => "",
		}
	}
}
