use std::fmt::Display;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use rustc_hash::FxHashMap;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::{
	ast::StageKind,
	check::types::ShaderType,
	text::{Interner, Text},
};

/// Maps interned keywords to the enum variant they name.
pub struct Matcher<T> {
	map: FxHashMap<Text, T>,
}

impl<T: IntoEnumIterator + Copy + Into<&'static str>> Matcher<T> {
	pub fn new(intern: &mut Interner) -> Self {
		let mut map = FxHashMap::default();
		for variant in T::iter() {
			map.insert(intern.get_static(variant.into()), variant);
		}
		Self { map }
	}

	pub fn get(&self, text: Text) -> Option<T> { self.map.get(&text).copied() }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Access {
	Read,
	Write,
	ReadWrite,
}

impl Access {
	pub fn can_read(self) -> bool { !matches!(self, Access::Write) }

	pub fn can_write(self) -> bool { !matches!(self, Access::Read) }
}

/// A stage specific variable provided by the pipeline.
#[derive(Debug)]
pub struct BuiltinVariable {
	pub name: &'static str,
	pub stage: StageKind,
	pub ty: ShaderType,
	pub access: Access,
	pub glsl: &'static str,
}

pub static BUILTIN_VARIABLES: [BuiltinVariable; 9] = [
	BuiltinVariable {
		name: "$Position",
		stage: StageKind::Vertex,
		ty: ShaderType::Float4,
		access: Access::Write,
		glsl: "gl_Position",
	},
	BuiltinVariable {
		name: "$VertexIndex",
		stage: StageKind::Vertex,
		ty: ShaderType::Int,
		access: Access::Read,
		glsl: "gl_VertexIndex",
	},
	BuiltinVariable {
		name: "$InstanceIndex",
		stage: StageKind::Vertex,
		ty: ShaderType::Int,
		access: Access::Read,
		glsl: "gl_InstanceIndex",
	},
	BuiltinVariable {
		name: "$FragCoord",
		stage: StageKind::Fragment,
		ty: ShaderType::Float4,
		access: Access::Read,
		glsl: "gl_FragCoord",
	},
	BuiltinVariable {
		name: "$FrontFacing",
		stage: StageKind::Fragment,
		ty: ShaderType::Bool,
		access: Access::Read,
		glsl: "gl_FrontFacing",
	},
	BuiltinVariable {
		name: "$PointCoord",
		stage: StageKind::Fragment,
		ty: ShaderType::Float2,
		access: Access::Read,
		glsl: "gl_PointCoord",
	},
	BuiltinVariable {
		name: "$SampleId",
		stage: StageKind::Fragment,
		ty: ShaderType::Int,
		access: Access::Read,
		glsl: "gl_SampleID",
	},
	BuiltinVariable {
		name: "$SamplePosition",
		stage: StageKind::Fragment,
		ty: ShaderType::Float2,
		access: Access::Read,
		glsl: "gl_SamplePosition",
	},
	BuiltinVariable {
		name: "$FragDepth",
		stage: StageKind::Fragment,
		ty: ShaderType::Float,
		access: Access::Write,
		glsl: "gl_FragDepth",
	},
];

pub fn builtin_variables(stage: StageKind) -> impl Iterator<Item = &'static BuiltinVariable> {
	BUILTIN_VARIABLES.iter().filter(move |x| x.stage == stage)
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, EnumIter, IntoStaticStr)]
pub enum InbuiltFunction {
	#[strum(serialize = "radians")]
	Radians,
	#[strum(serialize = "degrees")]
	Degrees,
	#[strum(serialize = "sin")]
	Sin,
	#[strum(serialize = "cos")]
	Cos,
	#[strum(serialize = "tan")]
	Tan,
	#[strum(serialize = "asin")]
	Asin,
	#[strum(serialize = "acos")]
	Acos,
	#[strum(serialize = "atan")]
	Atan,
	#[strum(serialize = "sinh")]
	Sinh,
	#[strum(serialize = "cosh")]
	Cosh,
	#[strum(serialize = "tanh")]
	Tanh,
	#[strum(serialize = "asinh")]
	Asinh,
	#[strum(serialize = "acosh")]
	Acosh,
	#[strum(serialize = "atanh")]
	Atanh,
	#[strum(serialize = "exp")]
	Exp,
	#[strum(serialize = "log")]
	Log,
	#[strum(serialize = "exp2")]
	Exp2,
	#[strum(serialize = "log2")]
	Log2,
	#[strum(serialize = "sqrt")]
	Sqrt,
	#[strum(serialize = "inversesqrt")]
	InverseSqrt,
	#[strum(serialize = "floor")]
	Floor,
	#[strum(serialize = "trunc")]
	Trunc,
	#[strum(serialize = "round")]
	Round,
	#[strum(serialize = "roundEven")]
	RoundEven,
	#[strum(serialize = "ceil")]
	Ceil,
	#[strum(serialize = "fract")]
	Fract,
	#[strum(serialize = "abs")]
	Abs,
	#[strum(serialize = "sign")]
	Sign,
	#[strum(serialize = "length")]
	Length,
	#[strum(serialize = "normalize")]
	Normalize,
	#[strum(serialize = "vecAny")]
	VecAny,
	#[strum(serialize = "vecAll")]
	VecAll,
	#[strum(serialize = "vecNot")]
	VecNot,
	#[strum(serialize = "transpose")]
	Transpose,
	#[strum(serialize = "inverse")]
	Inverse,
	#[strum(serialize = "determinant")]
	Determinant,
	#[strum(serialize = "imageSize")]
	ImageSize,
	#[strum(serialize = "subpassLoad")]
	SubpassLoad,

	#[strum(serialize = "atan2")]
	Atan2,
	#[strum(serialize = "pow")]
	Pow,
	#[strum(serialize = "mod")]
	Mod,
	#[strum(serialize = "min")]
	Min,
	#[strum(serialize = "max")]
	Max,
	#[strum(serialize = "step")]
	Step,
	#[strum(serialize = "distance")]
	Distance,
	#[strum(serialize = "dot")]
	Dot,
	#[strum(serialize = "cross")]
	Cross,
	#[strum(serialize = "reflect")]
	Reflect,
	#[strum(serialize = "vecLT")]
	VecLT,
	#[strum(serialize = "vecLE")]
	VecLE,
	#[strum(serialize = "vecGT")]
	VecGT,
	#[strum(serialize = "vecGE")]
	VecGE,
	#[strum(serialize = "vecEQ")]
	VecEQ,
	#[strum(serialize = "vecNE")]
	VecNE,
	#[strum(serialize = "matCompMul")]
	MatCompMul,
	#[strum(serialize = "texture")]
	Texture,
	#[strum(serialize = "textureSize")]
	TextureSize,
	#[strum(serialize = "imageLoad")]
	ImageLoad,

	#[strum(serialize = "clamp")]
	Clamp,
	#[strum(serialize = "mix")]
	Mix,
	#[strum(serialize = "smoothstep")]
	Smoothstep,
	#[strum(serialize = "faceforward")]
	FaceForward,
	#[strum(serialize = "fma")]
	Fma,
	#[strum(serialize = "refract")]
	Refract,
	#[strum(serialize = "textureLod")]
	TextureLod,
	#[strum(serialize = "texelFetch")]
	TexelFetch,
	#[strum(serialize = "imageStore")]
	ImageStore,
}

impl Display for InbuiltFunction {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let s: &'static str = (*self).into();
		write!(f, "{}", s)
	}
}

impl InbuiltFunction {
	pub fn arity(self) -> usize {
		use InbuiltFunction::*;

		match self {
			Atan2 | Pow | Mod | Min | Max | Step | Distance | Dot | Cross | Reflect | VecLT | VecLE | VecGT | VecGE
			| VecEQ | VecNE | MatCompMul | Texture | TextureSize | ImageLoad => 2,
			Clamp | Mix | Smoothstep | FaceForward | Fma | Refract | TextureLod | TexelFetch | ImageStore => 3,
			_ => 1,
		}
	}

	pub fn glsl_name(self) -> &'static str {
		match self {
			Self::VecAny => "any",
			Self::VecAll => "all",
			Self::VecNot => "not",
			Self::Atan2 => "atan",
			Self::VecLT => "lessThan",
			Self::VecLE => "lessThanEqual",
			Self::VecGT => "greaterThan",
			Self::VecGE => "greaterThanEqual",
			Self::VecEQ => "equal",
			Self::VecNE => "notEqual",
			Self::MatCompMul => "matrixCompMult",
			x => x.into(),
		}
	}
}

/// Keywords of this language and of GLSL that cannot name a declaration.
pub fn reserved_words_and_keywords() -> Vec<String> {
	let mut words: Vec<String> = [
		// source keywords
		"const",
		"flat",
		"in",
		"out",
		"inout",
		"if",
		"elif",
		"else",
		"for",
		"while",
		"do",
		"return",
		"break",
		"continue",
		"discard",
		"true",
		"false",
		// GLSL
		"attribute",
		"uniform",
		"varying",
		"buffer",
		"shared",
		"coherent",
		"volatile",
		"restrict",
		"readonly",
		"writeonly",
		"layout",
		"centroid",
		"smooth",
		"noperspective",
		"patch",
		"sample",
		"invariant",
		"precise",
		"precision",
		"highp",
		"mediump",
		"lowp",
		"switch",
		"case",
		"default",
		"struct",
		"subroutine",
		"main",
		"texelFetch",
		"texture",
		"any",
		"all",
		"not",
		"lessThan",
		"lessThanEqual",
		"greaterThan",
		"greaterThanEqual",
		"equal",
		"notEqual",
		"matrixCompMult",
		// reserved for future use
		"asm",
		"class",
		"union",
		"enum",
		"typedef",
		"template",
		"this",
		"goto",
		"inline",
		"noinline",
		"public",
		"static",
		"extern",
		"external",
		"interface",
		"long",
		"short",
		"half",
		"fixed",
		"unsigned",
		"superp",
		"input",
		"output",
		"filter",
		"sizeof",
		"cast",
		"namespace",
		"using",
		"common",
		"partition",
		"active",
		"resource",
	]
	.iter()
	.map(|x| x.to_string())
	.collect();
	words.extend(glsl_type_names());
	words.extend(ShaderType::iter().map(|x| x.keyword().to_string()));
	words.extend(InbuiltFunction::iter().map(|x| <&'static str>::from(x).to_string()));
	words
}

const SHAPES: &[&str] = &[
	"1D",
	"2D",
	"3D",
	"Cube",
	"2DRect",
	"1DArray",
	"2DArray",
	"CubeArray",
	"Buffer",
	"2DMS",
	"2DMSArray",
];

/// Every type name GLSL and its Vulkan extension define or reserve.
fn glsl_type_names() -> Vec<String> {
	let mut names: Vec<String> = [
		"void",
		"bool",
		"int",
		"uint",
		"float",
		"double",
		"atomic_uint",
		"sampler",
		"samplerShadow",
		"sampler3DRect",
		"sampler1DShadow",
		"sampler2DShadow",
		"samplerCubeShadow",
		"sampler1DArrayShadow",
		"sampler2DArrayShadow",
		"samplerCubeArrayShadow",
		"sampler2DRectShadow",
	]
	.iter()
	.map(|x| x.to_string())
	.collect();

	for prefix in ["", "b", "i", "u", "d", "h", "f"] {
		for n in 2..=4 {
			names.push(format!("{}vec{}", prefix, n));
		}
	}
	for prefix in ["", "d"] {
		for columns in 2..=4 {
			names.push(format!("{}mat{}", prefix, columns));
			for rows in 2..=4 {
				names.push(format!("{}mat{}x{}", prefix, columns, rows));
			}
		}
	}
	for prefix in ["", "i", "u"] {
		for shape in SHAPES {
			names.push(format!("{}sampler{}", prefix, shape));
			names.push(format!("{}image{}", prefix, shape));
			names.push(format!("{}texture{}", prefix, shape));
		}
		names.push(format!("{}subpassInput", prefix));
		names.push(format!("{}subpassInputMS", prefix));
	}

	names
}

/// Matches whole reserved words at the start of an identifier. Callers compare the match length to the identifier
/// length.
pub fn reserved_matcher() -> AhoCorasick {
	AhoCorasickBuilder::new()
		.anchored(true)
		.match_kind(MatchKind::LeftmostLongest)
		.build(reserved_words_and_keywords())
}
