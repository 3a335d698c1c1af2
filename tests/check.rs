use vsl::{
	compile,
	config::{Limits, Options},
	diagnostic::{CompileError, Diagnostics, Phase},
};

fn shader(vert: &str, frag: &str) -> String {
	format!(
		"@attributes {{\n\tfloat3 position;\n\tfloat2 uv;\n}}\n\n@outputs {{\n\tfloat4 color;\n}}\n\n@locals {{\n\tfloat2 v_uv;\n}}\n\n@vert {{\n{}\n}}\n\n@frag {{\n{}\n}}\n",
		vert, frag
	)
}

fn fails(source: &str) -> CompileError {
	fails_with(source, &Options::default())
}

fn fails_with(source: &str, options: &Options) -> CompileError {
	let mut diagnostics = Diagnostics::new();
	match compile(source, "test.vsl", options, &mut diagnostics) {
		Ok(_) => panic!("compiled successfully:\n{}", source),
		Err(err) => {
			assert_eq!(err.phase(), Phase::Check);
			err
		},
	}
}

fn passes(source: &str) {
	let mut diagnostics = Diagnostics::new();
	if let Err(err) = compile(source, "test.vsl", &Options::default(), &mut diagnostics) {
		panic!("{}\n{}", err, source);
	}
}

fn assert_fails(source: &str, message: &str) {
	let err = fails(source);
	assert!(
		err.message().contains(message),
		"expected `{}`, got `{}`",
		message,
		err.message()
	);
}

#[test]
fn operand_classes() {
	passes(&shader("float r = int(1) + float(2.0);", ""));
	assert_fails(
		&shader("float r = bool(true) + int(1);", ""),
		"cannot apply `+` to `bool` and `int`",
	);
	assert_fails(&shader("bool b = !1;", ""), "cannot apply `!` to `int`");
	assert_fails(&shader("float x = 1.0 % 2.0;", ""), "cannot apply `%`");
	assert_fails(&shader("int x = 1 << 2.0;", ""), "cannot apply `<<`");
	assert_fails(&shader("bool b = 1 && true;", ""), "cannot apply `&&`");
	assert_fails(&shader("bool b = uv < uv;", ""), "cannot apply `<`");
	assert_fails(&shader("float2 v = position.xy + position;", ""), "cannot apply `+`");
	passes(&shader("bool b = uv == uv;", ""));
}

#[test]
fn matrix_products() {
	passes(&shader(
		"float4x4 m = float4x4(1.0);\nfloat4 v = m * float4(position, 1.0);\nfloat4 w = v * m;\nfloat4x4 n = m * 2.0;",
		"",
	));
	assert_fails(
		&shader("float4x4 m = float4x4(1.0);\nfloat3 v = m * position;", ""),
		"cannot apply `*` to `float4x4` and `float3`",
	);
	assert_fails(
		&shader("float4x4 m = float4x4(1.0);\nfloat4x4 n = 2.0 / m;", ""),
		"cannot apply `/`",
	);
}

#[test]
fn constructors() {
	passes(&shader(
		"float3 a = float3(uv, 1.0);\nfloat3 b = float3(1.0);\nfloat3 c = float3(float4(1.0));\nfloat3 d = float3(1, 2u, 3.0);",
		"",
	));
	assert_fails(
		&shader("float3 a = float3(uv, uv);", ""),
		"`float3` requires 3 components, found 4",
	);
	assert_fails(&shader("float4 a = float4(uv);", ""), "`float4` requires 4 components, found 2");
	assert_fails(&shader("int2 a = int2(uv);", ""), "cannot construct `int2` from `float2`");
	assert_fails(&shader("float a = float(uv);", ""), "cannot construct `float` from `float2`");
	assert_fails(&shader("float a = void(1.0);", ""), "cannot construct a value of type `void`");
	passes(&shader("float2x2 m = float2x2(uv, uv);\nfloat2x2 n = float2x2(m);", ""));
}

#[test]
fn swizzles() {
	passes(&shader(
		"float4 p = float4(position, 1.0);\nfloat2 a = p.xy;\nfloat3 b = p.bgr;\nfloat4 c = p.stpq;\np.zyx = position;",
		"",
	));
	assert_fails(&shader("float2 a = uv.xg;", ""), "mixes component sets");
	assert_fails(&shader("float a = uv.z;", ""), "`float2` has no component `z`");
	assert_fails(&shader("float a = 1.0;\nfloat b = a.x;", ""), "cannot swizzle `float`");
	assert_fails(&shader("float4 p = float4(1.0);\np.xx = uv;", ""), "repeated components");
}

#[test]
fn indexing() {
	passes(&shader(
		"float a[3];\na[0] = uv[1];\nfloat4x4 m = float4x4(1.0);\nfloat b = m[3, 0];",
		"",
	));
	assert_fails(&shader("float a[3];\na[3] = 1.0;", ""), "index 3 is out of range for `float[3]`");
	assert_fails(&shader("float a = uv[1.0];", ""), "index must be a scalar integer");
	assert_fails(&shader("float4x4 m = float4x4(1.0);\nfloat b = m[0];", ""), "takes 2 indexes");
	assert_fails(&shader("float a = 1.0;\nfloat b = a[0];", ""), "cannot index into `float`");
	assert_fails(&shader("float a[3];\nfloat b[3];\na = b;", ""), "cannot assign to a whole array");
}

#[test]
fn stage_visibility() {
	assert_fails(
		&shader("", "color = float4(position, 1.0);"),
		"attributes are only visible in the vertex stage",
	);
	assert_fails(&shader("color = float4(1.0);", ""), "outputs are only visible in the fragment stage");
	assert_fails(&shader("", "v_uv = float2(0.0);"), "`v_uv` is read-only in the fragment stage");
	assert_fails(&shader("position = float3(0.0);", ""), "cannot assign to read-only `position`");
	assert_fails(&shader("float4 p = $Position;", ""), "`gl_Position` is write-only");
	assert_fails(&shader("", "float4 p = $Position;"), "undefined identifier `$Position`");
	assert_fails(&shader("", "$FragCoord = float4(0.0);"), "cannot assign to read-only `$FragCoord`");
	assert_fails(&shader("discard;", ""), "only allowed in the fragment stage");
	passes(&shader("", "color = $FragCoord;\nif ($FrontFacing) {\n\tdiscard;\n}"));
}

#[test]
fn statements() {
	assert_fails(&shader("break;", ""), "`break` outside of a loop");
	assert_fails(&shader("if (true) {\n\tcontinue;\n}", ""), "`continue` outside of a loop");
	assert_fails(&shader("position.x + 1.0;", ""), "expression statement has no effect");
	assert_fails(&shader("float(1.0);", ""), "expression statement has no effect");
	assert_fails(&shader("sin(position.x);", ""), "expression statement has no effect");
	assert_fails(
		&shader("for (int i = 0; i < 4; length(position)) {\n}", ""),
		"expression statement has no effect",
	);
	assert_fails(&shader("if (1) {\n}", ""), "condition must be `bool`, found `int`");
	assert_fails(&shader("return 1;", ""), "stages cannot return a value");
	assert_fails(&shader("const float x;", ""), "constant `x` must be initialized");
	assert_fails(&shader("const float x = 1.0;\nx = 2.0;", ""), "cannot assign to read-only `x`");
	assert_fails(&shader("float x = 1.0;\nfloat x = 2.0;", ""), "`x` is already declared");
	assert_fails(&shader("float uv = 1.0;", ""), "`uv` is already declared");
	assert_fails(&shader("int x = 1.0;", ""), "cannot initialize `int` with `float`");
	assert_fails(&shader("int x = 1;\nx += 1.5;", ""), "cannot apply `+=` to `int` and `float`");
	assert_fails(&shader("tex2D t;", ""), "cannot declare a local of handle type");
	assert_fails(&shader("float a[2][2];", ""), "multi-dimensional arrays are not supported");
	assert_fails(&shader("float a[0];", ""), "array size must be positive");
	assert_fails(&shader("int n = 2;\nfloat a[n];", ""), "array size must be an integer literal");
	passes(&shader(
		"for (int i = 0; i < 4; i++) {\n\tif (i == 1) {\n\t\tcontinue;\n\t}\n\tbreak;\n}\nint j = 0;\nj <<= 2;\nj--;",
		"",
	));
	passes(&shader("{\n\tfloat x = 1.0;\n}\n{\n\tfloat x = 2.0;\n}", ""));
}

#[test]
fn literals() {
	passes(&shader(
		"int a = -2147483648;\nuint b = 4294967295u;\nint c = 0x7FFFFFFF;\nfloat d = 1e10;",
		"",
	));
	assert_fails(&shader("int a = 2147483648;", ""), "does not fit in `int`");
	assert_fails(&shader("uint a = 4294967296u;", ""), "does not fit in `uint`");
	assert_fails(&shader("float a = 1e39;", ""), "float literal `1e39` is out of range");
}

#[test]
fn identifiers() {
	assert_fails(&shader("float mix = 1.0;", ""), "`mix` is a reserved identifier");
	assert_fails(&shader("float vec3 = 1.0;", ""), "`vec3` is a reserved identifier");
	assert_fails(&shader("float float2 = 1.0;", ""), "`float2` is a reserved identifier");
	for name in [
		"isampler2D",
		"usampler3D",
		"sampler2DShadow",
		"iimage3D",
		"uimageCubeArray",
		"mat2x3",
		"dmat4",
		"dvec3",
		"atomic_uint",
		"texture2D",
		"subpassInputMS",
		"common",
	] {
		assert_fails(
			&shader(&format!("float {} = 1.0;", name), ""),
			&format!("`{}` is a reserved identifier", name),
		);
	}
	assert_fails(&shader("float _x = 1.0;", ""), "names starting with `_` or `gl_` are reserved");
	assert_fails(&shader("float gl_x = 1.0;", ""), "names starting with `_` or `gl_` are reserved");
	assert_fails(&shader("float $x = 1.0;", ""), "`$` is reserved for builtin variables");
	assert_fails(
		&shader("float abcdefghijklmnopqrstuvwxyz0123456 = 1.0;", ""),
		"is longer than 32 bytes",
	);
	passes(&shader("float mixed = 1.0;\nfloat index = 2.0;\nfloat tint = 3.0;\nfloat mat2x5 = 4.0;", ""));
}

#[test]
fn builtin_calls() {
	passes(&shader(
		"float a = clamp(position.x, 0, 1);\nfloat3 b = cross(position, float3(0.0, 1.0, 0.0));\nbool3 c = vecLT(position, b);\nbool d = vecAll(c);\nfloat e = atan2(1.0, 2.0);\nint f = max(1, 2);\nfloat3 g = mix(position, b, 0.5);",
		"",
	));
	assert_fails(&shader("float a = sin(1.0, 2.0);", ""), "`sin` takes 1 argument, found 2");
	assert_fails(&shader("float a = dot(position, uv);", ""), "argument 2 of `dot` must be `float3`");
	assert_fails(&shader("float a = length(true);", ""), "argument 1 of `length` must be a float scalar or vector");
	assert_fails(&shader("bool a = vecAny(true);", ""), "argument 1 of `vecAny` must be a bool vector");
	assert_fails(&shader("float a[2];\nfloat b = length(a);", ""), "`length` cannot take an array argument");
	assert_fails(&shader("float x = sin(1.0);\nfloat y = nope(x);", ""), "undefined function `nope`");
}

fn resources(body: &str) -> String {
	format!(
		"@attributes {{\n\tfloat2 uv;\n}}\n\n@outputs {{\n\tfloat4 color;\n}}\n\n@locals {{\n\tfloat2 v_uv;\n}}\n\n@uniform(0) tex2D albedo;\n@uniform(1) image2D<rgba32f> target;\n@uniform(2) image2D<r32ui> counts;\n@uniform(3) subpassInput<0> previous;\n\n@vert {{\n}}\n\n@frag {{\n{}\n}}\n",
		body
	)
}

#[test]
fn resource_calls() {
	passes(&resources(
		"int2 p = int2(1, 2);\nimageStore(target, p, texture(albedo, v_uv));\nuint4 n = imageLoad(counts, p);\nint2 s = imageSize(target);\nint2 t = textureSize(albedo, 0);\ncolor = subpassLoad(previous) + texelFetch(albedo, p, 0) + textureLod(albedo, v_uv, 0.0);",
	));
	assert_fails(&resources("int4 n = imageLoad(counts, int2(0));"), "cannot initialize `int4` with `uint4`");
	assert_fails(&resources("float4 c = texture(albedo, 1.0);"), "argument 2 of `texture` must be `float2` coordinates");
	assert_fails(&resources("imageStore(target, v_uv, float4(0.0));"), "argument 2 of `imageStore` must be `int2` coordinates");
	assert_fails(&resources("float4 c = texture(target, v_uv);"), "argument 1 of `texture` must be a texture");
	assert_fails(&resources("float x = imageStore(target, int2(0), float4(0.0));"), "cannot initialize `float` with `void`");

	let source = "@attributes {\n\tfloat2 uv;\n}\n@outputs {\n\tfloat4 color;\n}\n@uniform(0) subpassInput<0> previous;\n@vert {\n\tfloat4 c = subpassLoad(previous);\n}\n@frag {\n}\n";
	assert_fails(source, "subpass inputs are only visible in the fragment stage");
}

#[test]
fn uniforms() {
	let header = "@attributes {\n\tfloat2 uv;\n}\n@outputs {\n\tfloat4 color;\n}\n";
	let stages = "@vert {\n}\n@frag {\n}\n";
	let with = |decls: &str| format!("{}{}\n{}", header, decls, stages);

	assert_fails(
		&with("@uniform(0) tex2D albedo;\n@uniform(0) {\n\tfloat4 tint;\n}"),
		"binding 0 is already in use",
	);
	assert_fails(&with("@uniform(0) image2D target;"), "storage images require a format qualifier");
	assert_fails(&with("@uniform(0) subpassInput previous;"), "subpass inputs require an index qualifier");
	assert_fails(&with("@uniform(0) tex2D<rgba8> albedo;"), "does not take this qualifier");
	assert_fails(&with("@uniform(0) image2D<rgb9> target;"), "unknown image format `rgb9`");
	assert_fails(&with("@uniform(0) float4 tint;"), "value type uniforms must be declared in a uniform block");
	assert_fails(&with("@uniform(0) {\n\ttex2D albedo;\n}"), "uniform blocks can only contain value types");
	assert_fails(&with("@uniform(0) tex2D albedo[2];"), "arrays of handles are not supported");
	assert_fails(&with("@uniform(0) {\n}"), "uniform block cannot be empty");
	assert_fails(&with("@uniform(0) tex2D uv;"), "`uv` is already declared");
	assert_fails(&with("@uniform(-1) tex2D albedo;"), "uniform binding must not be negative");
	assert_fails(&with("@uniform(0) flat tex2D albedo;"), "only `@locals` members can be `flat`");
}

#[test]
fn constants() {
	let header = "@attributes {\n\tfloat2 uv;\n}\n@outputs {\n\tfloat4 color;\n}\n";
	let stages = "@vert {\n}\n@frag {\n}\n";
	let with = |decls: &str| format!("{}{}\n{}", header, decls, stages);

	assert_fails(&with("@spec(0) const float2 size = float2(1.0);"), "specialization constants must be initialized");
	assert_fails(&with("@spec(0) const float scale = 1;"), "must be initialized with a `float` literal");
	assert_fails(&with("const float a = 1.0;\n@spec(0) const float b = a;"), "must be initialized with a `float` literal");
	assert_fails(
		&with("@spec(0) const int a = 1;\n@spec(0) const int b = 2;"),
		"specialization constant index 0 is already in use",
	);
	assert_fails(&with("const float a[2] = 1.0;"), "constant arrays are not supported");
	assert_fails(&with("@uniform(0) {\n\tfloat s;\n}\nconst float a = s;"), "constant initializers can only reference constants");
	assert_fails(&with("const tex2D t = 1;"), "cannot initialize `tex2D` with `int`");
	passes(&with("const float a = 2.0;\nconst float b = a * 2.0 + float(-1);\n@spec(3) const int c = -4;"));
}

#[test]
fn functions() {
	let header = "@attributes {\n\tfloat2 uv;\n}\n@outputs {\n\tfloat4 color;\n}\n";
	let stages = "@vert {\n}\n@frag {\n}\n";
	let with = |decls: &str| format!("{}{}\n{}", header, decls, stages);

	assert_fails(&with("float f(float x) {\n\treturn f(x);\n}"), "recursion is not allowed");
	assert_fails(&with("float f() {\n\treturn g();\n}\nfloat g() {\n\treturn 1.0;\n}"), "undefined function `g`");
	assert_fails(&with("float f() {\n\treturn uv.x;\n}"), "functions can only reference uniforms, constants and their own locals");
	assert_fails(&with("float f() {\n\treturn;\n}"), "function must return a value of type `float`");
	assert_fails(&with("void f() {\n\treturn 1.0;\n}"), "`void` function cannot return a value");
	assert_fails(&with("float f() {\n\treturn true;\n}"), "expected return type `float`, found `bool`");
	assert_fails(&with("void f(float x, float x) {\n}"), "duplicate parameter `x`");
	assert_fails(&with("void f(void x) {\n}"), "parameter `x` cannot have type `void`");
	assert_fails(&with("void f(tex2D t) {\n}"), "handle types cannot be passed as parameters");
	assert_fails(&with("void f() {\n}\nvoid f() {\n}"), "`f` is already declared");
	assert_fails(&with("float color(float x) {\n\treturn x;\n}"), "`color` is already declared");
	assert_fails(&with("@uniform(0) tex2D albedo;\nvoid albedo() {\n}"), "`albedo` is already declared");
	assert_fails(&with("void f(out float x) {\n\tfloat y = x;\n}"), "`x` is write-only");
	assert_fails(&with("void f() {\n\tdiscard;\n}"), "only allowed in the fragment stage");

	let calls = |body: &str| {
		format!(
			"{}void split(float4 v, out float2 a, inout float b) {{\n\ta = v.xy;\n\tb += v.z;\n}}\n@vert {{\n}}\n@frag {{\n{}\n}}\n",
			header, body
		)
	};
	passes(&calls("float2 a;\nfloat b = 0.0;\nsplit(float4(1.0), a, b);\nsplit(float4(1), a, b);"));
	assert_fails(&calls("float2 a;\nsplit(float4(1.0), a);"), "`split` takes 3 arguments, found 2");
	assert_fails(&calls("float2 a;\nint b = 0;\nsplit(float4(1.0), a, b);"), "`inout` argument must have type `float`");
	assert_fails(&calls("float b = 0.0;\nsplit(float4(1.0), float2(0.0), b);"), "expression cannot be assigned to");
	assert_fails(&calls("float2 a;\nfloat b = 0.0;\nsplit(true, a, b);"), "expected `float4`, found `bool`");
}

#[test]
fn program_shape() {
	let err = fails("@outputs {\n\tfloat4 color;\n}\n@vert {\n\tfloat x = nope;\n}\n@frag {\n}\n");
	assert_eq!(err.message(), "shader requires an attributes block");
	assert_eq!(err.location.line, 1);

	assert_fails("@attributes {\n\tfloat2 uv;\n}\n@vert {\n}\n@frag {\n}\n", "shader requires an outputs block");
	assert_fails(
		"@attributes {\n}\n@outputs {\n\tfloat4 color;\n}\n@vert {\n}\n@frag {\n}\n",
		"`@attributes` block cannot be empty",
	);
	assert_fails(
		"@attributes {\n\tfloat2 uv;\n}\n@attributes {\n\tfloat2 st;\n}\n@outputs {\n\tfloat4 color;\n}\n@vert {\n}\n@frag {\n}\n",
		"duplicate `@attributes` block",
	);
	assert_fails(
		"@attributes {\n\tfloat2 uv;\n}\n@outputs {\n\tfloat4 color;\n}\n@vert {\n}\n",
		"shader requires a fragment stage",
	);
	assert_fails(
		"@attributes {\n\tfloat2 uv;\n}\n@outputs {\n\tfloat4 color;\n}\n@frag {\n}\n",
		"shader requires a vertex stage",
	);
	assert_fails(
		"@attributes {\n\tfloat2 uv;\n}\n@outputs {\n\tfloat4 color;\n}\n@vert {\n}\n@vert {\n}\n@frag {\n}\n",
		"duplicate vertex stage",
	);
	assert_fails(
		"@attributes {\n\tfloat2 uv;\n}\n@outputs {\n\tfloat4 color;\n}\n@vert {\n}\n@geom {\n}\n@frag {\n}\n",
		"geometry stage is not yet implemented",
	);
	assert_fails(
		"@attributes {\n\tfloat2 uv;\n}\n@shader \"late\";\n@outputs {\n\tfloat4 color;\n}\n@vert {\n}\n@frag {\n}\n",
		"`@shader` must be the first declaration",
	);
}

#[test]
fn interface_types() {
	let with = |attributes: &str, outputs: &str, locals: &str| {
		format!(
			"@attributes {{\n{}\n}}\n@outputs {{\n{}\n}}\n@locals {{\n{}\n}}\n@vert {{\n}}\n@frag {{\n}}\n",
			attributes, outputs, locals
		)
	};

	assert_fails(&with("bool b;", "float4 c;", "float x;"), "boolean types cannot be passed between stages");
	assert_fails(&with("float b;", "float4 c[2];", "float x;"), "outputs cannot be arrays");
	assert_fails(&with("float b;", "float4x4 c;", "float x;"), "outputs cannot be matrices");
	assert_fails(&with("tex2D b;", "float4 c;", "float x;"), "handle types cannot be passed between stages");
	assert_fails(&with("flat float b;", "float4 c;", "float x;"), "only `@locals` members can be `flat`");
	assert_fails(&with("void b;", "float4 c;", "float x;"), "`void` is only allowed as a return type");
	assert_fails(&with("vec3 b;", "float4 c;", "float x;"), "unknown type `vec3`");
	passes(&with("float4x4 b;\nfloat2 c[2];", "float4 o;\nint4 d;", "flat float x;\nint y[2];"));
}

#[test]
fn limits() {
	let mut options = Options::default();
	options.limits = Limits {
		max_attribute_slots: 4,
		..Limits::default()
	};
	let source = "@attributes {\n\tfloat4x4 m;\n\tfloat f;\n}\n@outputs {\n\tfloat4 color;\n}\n@vert {\n}\n@frag {\n}\n";
	let err = fails_with(source, &options);
	assert_eq!(err.message(), "attributes use more than 4 slots");
	let mut diagnostics = Diagnostics::new();
	let fits = source.replace("\tfloat f;\n", "");
	assert!(compile(&fits, "test.vsl", &options, &mut diagnostics).is_ok());

	let outputs: String = (0..9).map(|i| format!("\tfloat4 c{};\n", i)).collect();
	let source = format!("@attributes {{\n\tfloat f;\n}}\n@outputs {{\n{}}}\n@vert {{\n}}\n@frag {{\n}}\n", outputs);
	assert_fails(&source, "more than 8 outputs");
}
