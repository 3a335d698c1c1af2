use strum::IntoEnumIterator;
use vsl::{compile, config::Options, diagnostic::Diagnostics, ImageFormat, ShaderType};

fn value_types() -> impl Iterator<Item = ShaderType> { ShaderType::iter().filter(|x| x.is_value_type()) }

#[test]
fn classification() {
	use ShaderType::*;

	for ty in ShaderType::iter() {
		let classes = [ty.is_scalar(), ty.is_vector(), ty.is_matrix(), ty.is_handle_type()];
		let count = classes.iter().filter(|x| **x).count();
		match ty {
			Error | Void => assert_eq!(count, 0, "{:?}", ty),
			_ => assert_eq!(count, 1, "{:?}", ty),
		}
	}

	assert_eq!(Int3.component_type(), Int);
	assert_eq!(Int3.component_count(), 3);
	assert_eq!(Float3x3.component_type(), Float);
	assert_eq!(Float3x3.component_count(), 9);
	assert_eq!(Bool.to_vector(4), Some(Bool4));
	assert_eq!(Bool2.to_vector(4), None);
	assert_eq!(Float4.with_component(UInt), Some(UInt4));
	assert_eq!(Float4x4.with_component(Int), None);
	assert_eq!(Float3x3.matrix_rank(), Some(3));
	assert_eq!(ShaderType::matrix(2), Some(Float2x2));
	assert!(!Bool3.is_numeric());
	assert!(UInt2.is_integer());
	assert!(Tex2DArray.is_texture() && !Tex2DArray.is_image());
	assert!(Image3D.is_image() && !Image3D.is_texture());
	assert!(SubpassInput.is_subpass_input() && SubpassInput.is_handle_type());
}

#[test]
fn component_closure() {
	for ty in value_types() {
		let base = ty.component_type();
		assert_eq!(base.component_type(), base, "{:?}", ty);
		assert!(base.is_scalar());
		if !ty.is_matrix() {
			let rebuilt = base.to_vector(ty.component_count()).unwrap();
			assert_eq!(rebuilt, ty);
			assert_eq!(rebuilt.byte_size(), ty.byte_size());
		}
	}
}

#[test]
fn keywords() {
	for ty in ShaderType::iter().filter(|x| *x != ShaderType::Error) {
		assert_eq!(ty.keyword().parse::<ShaderType>(), Ok(ty));
		assert_eq!(ty.to_string(), ty.keyword());
	}
	assert!("vec3".parse::<ShaderType>().is_err());

	assert_eq!(ShaderType::Float3.glsl_name(), "vec3");
	assert_eq!(ShaderType::UInt2.glsl_name(), "uvec2");
	assert_eq!(ShaderType::Bool4.glsl_name(), "bvec4");
	assert_eq!(ShaderType::Float4x4.glsl_name(), "mat4");
	assert_eq!(ShaderType::Tex2D.glsl_name(), "sampler2D");
	assert_eq!(ShaderType::TexCube.glsl_name(), "samplerCube");
}

#[test]
fn implicit_casts() {
	use ShaderType::*;

	for ty in ShaderType::iter() {
		assert_eq!(ty.can_implicit_cast(ty), ty != Error, "{:?}", ty);
	}
	for a in ShaderType::iter() {
		for b in ShaderType::iter() {
			for c in ShaderType::iter() {
				if a.can_implicit_cast(b) && b.can_implicit_cast(c) {
					assert!(a.can_implicit_cast(c), "{:?} -> {:?} -> {:?}", a, b, c);
				}
			}
		}
	}

	assert!(Int.can_implicit_cast(UInt));
	assert!(Int3.can_implicit_cast(Float3));
	assert!(UInt4.can_implicit_cast(Float4));
	assert!(!Float.can_implicit_cast(Int));
	assert!(!UInt.can_implicit_cast(Int));
	assert!(!Bool.can_implicit_cast(Int));
	assert!(!Int.can_implicit_cast(Bool));
	assert!(!Float2.can_implicit_cast(Float3));
	assert!(!Float.can_implicit_cast(Float2x2));
	assert!(!Tex2D.can_implicit_cast(Tex3D));
}

#[test]
fn promotion() {
	use ShaderType::*;

	for a in value_types() {
		assert_eq!(ShaderType::promote(a, a), Some(a));
		for b in value_types() {
			let promoted = ShaderType::promote(a, b);
			assert_eq!(promoted, ShaderType::promote(b, a), "{:?} {:?}", a, b);
			if let Some(p) = promoted {
				assert!(p == a || p == b);
				assert!(a.can_implicit_cast(p) && b.can_implicit_cast(p));
			}
		}
	}

	assert_eq!(ShaderType::promote(Int, Float), Some(Float));
	assert_eq!(ShaderType::promote(UInt2, Int2), Some(UInt2));
	assert_eq!(ShaderType::promote(Int, Int2), None);
	assert_eq!(ShaderType::promote(Bool, Int), None);
	assert_eq!(ShaderType::promote_scalar(Int3, Float), Some(Float));
	assert_eq!(ShaderType::promote_scalar(Bool, Float), None);
}

#[test]
fn sizes() {
	use ShaderType::*;

	assert_eq!(Float.byte_size(), 4);
	assert_eq!(Float3.byte_size(), 12);
	assert_eq!(Int4.byte_size(), 16);
	assert_eq!(Float2x2.byte_size(), 16);
	assert_eq!(Float3x3.byte_size(), 36);
	assert_eq!(Float4x4.byte_size(), 64);
	assert_eq!(Tex2D.byte_size(), 4);
	assert_eq!(Void.byte_size(), 0);

	assert_eq!(Float.binding_slot_count(0), 1);
	assert_eq!(Float4.binding_slot_count(0), 1);
	assert_eq!(Float3x3.binding_slot_count(0), 3);
	assert_eq!(Float4x4.binding_slot_count(0), 4);
	assert_eq!(Float2.binding_slot_count(3), 3);
	assert_eq!(Float4x4.binding_slot_count(2), 8);
}

#[test]
fn resource_shapes() {
	use ShaderType::*;

	assert_eq!(Tex1D.coord_count(), 1);
	assert_eq!(Tex2D.coord_count(), 2);
	assert_eq!(TexCube.coord_count(), 3);
	assert_eq!(TexCube.size_count(), 2);
	assert_eq!(Tex2DArray.size_count(), 3);
	assert_eq!(Image2D.coord_count(), 2);

	assert_eq!(ImageFormat::Rgba8.component_type(), Float);
	assert_eq!(ImageFormat::R32I.component_type(), Int);
	assert_eq!(ImageFormat::Rg32UI.component_type(), UInt);
	assert_eq!(ImageFormat::Rgba16UI.glsl_prefix(), "u");
	assert_eq!(ImageFormat::Rgba16F.glsl_prefix(), "");
	assert_eq!("rgba8_snorm".parse::<ImageFormat>(), Ok(ImageFormat::Rgba8Snorm));
	for format in ImageFormat::iter() {
		assert_eq!(format.to_string(), format.keyword());
	}
}

fn check(body: &str) -> Result<String, String> {
	let source = format!(
		"@attributes {{\n\tfloat4 p;\n\tint4 i;\n}}\n@outputs {{\n\tfloat4 color;\n}}\n@vert {{\n{}\n}}\n@frag {{\n}}\n",
		body
	);
	let mut diagnostics = Diagnostics::new();
	compile(&source, "types.vsl", &Options::default(), &mut diagnostics)
		.map(|x| x.vertex)
		.map_err(|x| x.message().to_string())
}

#[test]
fn swizzle_types() {
	assert!(check("float2 a = p.xy;\nfloat b = p.w;\nfloat4 c = p.wzyx;\nint3 d = i.rgb;").is_ok());
	assert!(check("float3 a = i.stp;").is_ok());
	assert_eq!(
		check("float3 a = p.xy;").unwrap_err(),
		"cannot initialize `float3` with `float2`"
	);
	assert_eq!(check("int2 a = p.xy;").unwrap_err(), "cannot initialize `int2` with `float2`");
	assert_eq!(check("float a = p.xyzwx;").unwrap_err(), "invalid swizzle `xyzwx`");

	let vertex = check("float3 a = i.xyz;").unwrap();
	assert!(vertex.contains("vec3 a = vec3(i.xyz);"), "{}", vertex);
}
