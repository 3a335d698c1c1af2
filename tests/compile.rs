use vsl::{
	compile,
	config::Options,
	diagnostic::{Diagnostics, Phase},
	reflect::StageFlags,
	CompiledShader,
	ShaderType,
};

fn test(source: &str, file: &str) -> CompiledShader {
	let mut diagnostics = Diagnostics::new();
	match compile(source, file, &Options::default(), &mut diagnostics) {
		Ok(shader) => shader,
		Err(err) => {
			let span = err.diagnostic.span;
			panic!(
				"failed to compile '{}': {} (`{}`)",
				file,
				err,
				&source[span.start as usize..span.end as usize]
			);
		},
	}
}

#[test]
fn cases() {
	for file in std::fs::read_dir("tests/in").unwrap() {
		let file = file.unwrap();
		if file.file_type().unwrap().is_dir() {
			continue;
		}

		let path = file.path();
		let source = std::fs::read_to_string(&path).unwrap();
		let shader = test(&source, path.to_str().unwrap());
		assert!(shader.vertex.contains("void main() {"));
		assert!(shader.fragment.contains("void main() {"));
	}
}

#[test]
fn minimal() {
	let source = r#"
@attributes {
	float value;
}

@outputs {
	float4 color;
}

@vert {
	$Position = float4(value, value, value, 1.0);
}

@frag {
	color = float4(1.0, 0.0, 0.0, 1.0);
}
"#;
	let shader = test(source, "minimal.vsl");
	let info = &shader.info;

	assert_eq!(info.attributes.len(), 1);
	assert_eq!(info.attributes[0].location, 0);
	assert_eq!(info.attributes[0].ty, ShaderType::Float);
	assert_eq!(info.outputs.len(), 1);
	assert_eq!(info.outputs[0].location, 0);
	assert_eq!(info.outputs[0].ty, ShaderType::Float4);
	assert!(info.uniforms.is_empty());
	assert_eq!(info.stages, StageFlags::VERTEX | StageFlags::FRAGMENT);

	assert!(shader.vertex.contains("layout(location = 0) in float value;"));
	assert!(shader.vertex.contains("gl_Position = vec4(value, value, value, 1.0);"));
	assert!(!shader.vertex.contains("out vec4 color"));
	assert!(shader.fragment.contains("layout(location = 0) out vec4 color;"));
	assert!(shader.fragment.contains("color = vec4(1.0, 0.0, 0.0, 1.0);"));
	assert!(!shader.fragment.contains("in float value"));
}

#[test]
fn basic_interface() {
	let source = std::fs::read_to_string("tests/in/basic.vsl").unwrap();
	let shader = test(&source, "basic.vsl");
	let info = &shader.info;

	assert_eq!(info.name, "basic");
	assert_eq!(info.attributes.len(), 2);
	assert_eq!(info.attributes[1].location, 1);

	let names: Vec<_> = info.uniforms.iter().map(|x| x.name.as_str()).collect();
	assert_eq!(names, ["albedo", "mvp", "tint"]);
	assert_eq!(info.uniforms[0].block, None);
	assert_eq!(info.uniforms[1].block, Some(0));
	assert_eq!(info.uniforms[1].offset, 0);
	assert_eq!(info.uniforms[2].offset, 64);
	assert_eq!(info.uniforms[2].index, 1);
	assert_eq!(info.blocks[0].binding, 1);
	assert_eq!(info.blocks[0].size, 80);
	assert!(info.uniforms_contiguous());

	assert_eq!(info.spec_constants.len(), 1);
	assert_eq!(info.spec_constants[0].name, "exposure");
	assert_eq!(info.spec_constants[0].index, 0);
}

#[test]
fn basic_glsl() {
	let source = std::fs::read_to_string("tests/in/basic.vsl").unwrap();
	let shader = test(&source, "basic.vsl");

	let vertex = &shader.vertex;
	assert!(vertex.starts_with("// Generated by vsl"));
	assert!(vertex.contains("// Shader: basic"));
	assert!(vertex.contains("#version 450"));
	assert!(vertex.contains("layout(location = 0) in vec3 position;"));
	assert!(vertex.contains("layout(location = 1) in vec2 uv;"));
	assert!(vertex.contains("layout(location = 0) out vec2 v_uv;"));
	assert!(vertex.contains("layout(set = 0, binding = 0) uniform sampler2D albedo;"));
	assert!(vertex.contains("layout(set = 0, binding = 1, scalar) uniform _Block_1 {"));
	assert!(vertex.contains("layout(offset = 64) vec4 tint;"));
	assert!(vertex.contains("layout(constant_id = 0) const float exposure = 1.0;"));
	assert!(vertex.contains("float luminance(vec3 c) {"));
	assert!(vertex.contains("float _t0 = dot(c, vec3(0.2126, 0.7152, 0.0722));"));
	assert!(vertex.contains("return _t0;"));
	assert!(vertex.contains("gl_Position = (mvp * vec4(position, 1.0));"));

	let fragment = &shader.fragment;
	assert!(fragment.contains("layout(location = 0) in vec2 v_uv;"));
	assert!(fragment.contains("layout(location = 0) out vec4 color;"));
	assert!(fragment.contains("vec4 _t1 = texture(albedo, v_uv);"));
	assert!(fragment.contains("vec4 texel = (_t1 * tint);"));
	assert!(fragment.contains("float _t2 = luminance(texel.rgb);"));
	assert!(fragment.contains("color = vec4((texel.rgb * exposure), _t2);"));
}

#[test]
fn lighting_interface() {
	let source = std::fs::read_to_string("tests/in/lighting.vsl").unwrap();
	let shader = test(&source, "lighting.vsl");
	let info = &shader.info;

	assert_eq!(info.attributes.len(), 4);
	assert_eq!(info.outputs[1].location, 1);
	assert_eq!(info.blocks[0].size, 208);

	let history = info.uniforms.iter().find(|x| x.name == "history").unwrap();
	assert_eq!(history.format, Some(vsl::ImageFormat::Rgba8));
	let previous = info.uniforms.iter().find(|x| x.name == "previous").unwrap();
	assert_eq!(previous.subpass_index, Some(0));

	assert!(shader.vertex.contains("layout(location = 2) flat out int v_material;"));
	assert!(shader.fragment.contains("layout(location = 2) flat in int v_material;"));
	assert!(shader.vertex.contains("layout(set = 0, binding = 2, rgba8) uniform image2D history;"));
	assert!(!shader.vertex.contains("subpassInput"));
	assert!(shader
		.fragment
		.contains("layout(set = 0, binding = 3, input_attachment_index = 0) uniform subpassInput previous;"));
	assert!(shader.fragment.contains("const vec3 fog_color = vec3(0.5, 0.6, 0.7);"));
	assert!(shader
		.fragment
		.contains("void shade(vec3 n, vec3 l, out float diffuse, inout vec3 accum) {"));
	assert!(shader.fragment.contains("} else if ((diffuse > 0.25)) {"));
	assert!(shader.fragment.contains("discard;"));
}

#[test]
fn lazy_positions_stay_inline() {
	let source = r#"
@attributes {
	float3 position;
}

@outputs {
	float4 color;
}

@vert {
	bool far = position.x > 1.0 && length(position) > 2.0;
	float scale = far ? sqrt(position.y) : 1.0;
	int i = 0;
	while (i < int(floor(scale))) {
		i++;
	}
	$Position = float4(position * scale, 1.0);
}

@frag {
	color = float4(1.0);
}
"#;
	let shader = test(source, "lazy.vsl");
	let vertex = &shader.vertex;
	assert!(vertex.contains("bool far = ((position.x > 1.0) && (length(position) > 2.0));"));
	assert!(vertex.contains("float scale = (far ? sqrt(position.y) : 1.0);"));
	assert!(vertex.contains("while ((i < int(floor(scale)))) {"));
	assert!(!vertex.contains("_t"));
}

#[test]
fn promotion_is_explicit() {
	let source = r#"
@attributes {
	float3 position;
}

@outputs {
	float4 color;
}

@vert {
	float r = int(1) + float(2.0);
	int i = 3;
	float3 v = position * i;
	$Position = float4(v, r);
}

@frag {
	color = float4(1.0);
}
"#;
	let shader = test(source, "promotion.vsl");
	assert!(shader.vertex.contains("float r = (float(int(1)) + float(2.0));"));
	assert!(shader.vertex.contains("vec3 v = (position * float(i));"));
}

#[test]
fn temporaries_are_unique() {
	let source = r#"
@attributes {
	float3 position;
}

@outputs {
	float4 color;
}

float twice(float x) {
	return x * 2.0;
}

@vert {
	{
		float a = twice(sin(position.x));
	}
	{
		float a = twice(cos(position.y));
	}
	$Position = float4(position, 1.0);
}

@frag {
	color = float4(twice(abs(-1.0)));
}
"#;
	let shader = test(source, "temps.vsl");
	let names: Vec<_> = shader
		.vertex
		.lines()
		.filter_map(|x| x.trim().strip_prefix("float _t"))
		.map(|x| x.split(' ').next().unwrap().to_string())
		.collect();
	let mut names = names;
	let count = names.len();
	names.sort();
	names.dedup();
	assert_eq!(names.len(), count);
	assert_eq!(count, 4);
	assert!(shader.fragment.contains("float _t4 = abs((-1.0));"));
	assert!(shader.fragment.contains("float _t5 = twice(_t4);"));
}

#[test]
fn side_effects_keep_order() {
	let source = r#"
@attributes {
	float3 position;
}

@outputs {
	float4 color;
}

float bump(inout float v) {
	v += 1.0;
	return v;
}

@vert {
	int i = 0;
	float y = pow(float(i++), sin(float(i)));
	float x = 1.0;
	float z = bump(x) + sin(x);
	float w = sin(x) + bump(x);
	$Position = float4(position, y + z + w);
}

@frag {
	color = float4(1.0);
}
"#;
	let shader = test(source, "effects.vsl");
	let vertex = &shader.vertex;
	assert!(vertex.contains("float y = pow(float((i++)), sin(float(i)));"));
	assert!(vertex.contains("float z = (bump(x) + sin(x));"));

	// A call to the left of the side effect may still be hoisted.
	let temps: Vec<_> = vertex.lines().filter(|x| x.trim().starts_with("float _t")).collect();
	assert_eq!(temps.len(), 1);
	assert_eq!(temps[0].trim(), "float _t0 = sin(x);");
	assert!(vertex.contains("float w = (_t0 + bump(x));"));
	let z = vertex.find("float z =").unwrap();
	assert!(vertex.find("float _t0").unwrap() > z);
}

#[test]
fn warnings_reach_callback() {
	let source = r#"
@shader;

@attributes {
	float3 position;
}

@outputs {
	float4 color;
}

@uniform(0) tex2D a;
@uniform(2) tex2D b;

@vert {
	$Position = float4(position, 1.0);
}

@frag {
	color = texture(a, float2(0.0)) + texture(b, float2(1.0));
}
"#;
	let seen = std::rc::Rc::new(std::cell::Cell::new(0));
	let counter = seen.clone();
	let mut diagnostics = Diagnostics::with_callback(move |_| counter.set(counter.get() + 1));
	let shader = compile(source, "warn.vsl", &Options::default(), &mut diagnostics).unwrap();

	assert_eq!(seen.get(), 2);
	assert_eq!(diagnostics.warnings().count(), 2);
	assert!(!diagnostics.had_error());
	assert!(!shader.info.uniforms_contiguous());
	assert!(shader.info.name.is_empty());

	let mut diagnostics = Diagnostics::new();
	let err = compile(source, "warn.vsl", &Options::strict(), &mut diagnostics).unwrap_err();
	assert!(err.message().contains("not contiguous"));
	assert!(diagnostics.had_error());
}

#[test]
fn parse_errors() {
	let mut diagnostics = Diagnostics::new();
	let source = "@attributes {\n\tfloat3 position;\n}\n@vert {\n\tfloat x = ;\n}\n";
	let err = compile(source, "broken.vsl", &Options::default(), &mut diagnostics).unwrap_err();
	assert_eq!(err.phase(), Phase::Parse);
	assert!(err.location.line >= 4);
	assert!(err.to_string().starts_with("broken.vsl:"));
}
