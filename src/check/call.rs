use log::debug;

use crate::{
	ast::{Expr, Ident, ParamMode, StageKind},
	check::{
		expr::{describe, ExprResult},
		inbuilt::InbuiltFunction,
		types::ShaderType,
		Checker,
		Context,
	},
	diagnostic::{Diagnostic, Span},
};

/// A float scalar or vector, or something that converts to one.
fn floatish(ty: ShaderType) -> bool { ty.is_numeric() && !ty.is_matrix() }

fn float_of(ty: ShaderType) -> ShaderType { ty.with_component(ShaderType::Float).unwrap_or(ShaderType::Error) }

/// Whether `other` has the shape of `ty` or is a scalar that broadcasts to it.
fn fits(ty: ShaderType, other: ShaderType) -> bool {
	other.component_count() == ty.component_count() || other.is_scalar()
}

impl Checker<'_> {
	/// Checks a call, returning its result and whether it should be materialized when used as a value.
	pub(super) fn call(&mut self, name: Ident, args: &[Expr], span: Span) -> Result<(ExprResult, bool), Diagnostic> {
		if let Some(ty) = self.types.get(name.name) {
			let args = self.args(args)?;
			return Ok((self.construct(ty, &args, span)?, false));
		}
		if let Some(function) = self.inbuilt.get(name.name) {
			let args = self.args(args)?;
			let result = self.inbuilt_call(function, &args, span)?;
			if function == InbuiltFunction::ImageStore {
				self.effects = true;
			}
			let materialize = result.ty != ShaderType::Void;
			return Ok((result, materialize));
		}
		self.user_call(name, args, span)
	}

	fn args(&mut self, args: &[Expr]) -> Result<Vec<ExprResult>, Diagnostic> {
		args.iter().map(|x| self.expr(x)).collect()
	}

	fn user_call(&mut self, name: Ident, args: &[Expr], span: Span) -> Result<(ExprResult, bool), Diagnostic> {
		let fname = self.intern.resolve(name.name).to_string();
		if let Context::Function { name: current, .. } = self.context {
			if current == name.name {
				return Err(name.span.error(format!("`{}` calls itself: recursion is not allowed", fname))
					+ name.span.marker());
			}
		}
		let sig = match self.scopes.function(name.name) {
			Some(sig) => sig.clone(),
			None => return Err(name.span.error(format!("undefined function `{}`", fname)) + name.span.marker()),
		};

		if args.len() != sig.params.len() {
			return Err(span.error(format!(
				"`{}` takes {} argument{}, found {}",
				fname,
				sig.params.len(),
				if sig.params.len() == 1 { "" } else { "s" },
				args.len()
			)) + span.marker()
				+ sig.span.label("defined here"));
		}

		let mut texts = Vec::with_capacity(args.len());
		for (arg, (mode, param)) in args.iter().zip(sig.params.iter()) {
			let expected = describe(param.ty, param.array_size);
			match mode {
				ParamMode::In => {
					let result = self.expr(arg)?;
					if result.array_size != param.array_size || !result.ty.can_implicit_cast(param.ty) {
						return Err(arg.span.error(format!(
							"expected `{}`, found `{}`",
							expected,
							describe(result.ty, result.array_size)
						)) + arg.span.marker()
							+ param.span.label("parameter declared here"));
					}
					texts.push(self.cast_text(&result, param.ty));
				},
				ParamMode::Out | ParamMode::InOut => {
					let result = self.place(arg)?;
					if *mode == ParamMode::InOut {
						if let Some(var) = result.lvalue {
							self.check_read(&var, arg.span)?;
						}
					}
					if result.array_size != param.array_size || result.ty != param.ty {
						return Err(arg.span.error(format!(
							"`{}` argument must have type `{}`, found `{}`",
							if *mode == ParamMode::Out { "out" } else { "inout" },
							expected,
							describe(result.ty, result.array_size)
						)) + arg.span.marker()
							+ param.span.label("parameter declared here"));
					}
					texts.push(result.ref_text(self.intern).to_string());
				},
			}
		}

		let text = format!("{}({})", fname, texts.join(", "));
		if !sig.is_pure() {
			self.effects = true;
		}
		Ok((ExprResult::value(sig.ret, text, span), sig.is_pure() && sig.ret != ShaderType::Void))
	}

	fn inbuilt_call(
		&mut self, function: InbuiltFunction, args: &[ExprResult], span: Span,
	) -> Result<ExprResult, Diagnostic> {
		use InbuiltFunction::*;
		use ShaderType::*;

		if args.len() != function.arity() {
			return Err(span.error(format!(
				"`{}` takes {} argument{}, found {}",
				function,
				function.arity(),
				if function.arity() == 1 { "" } else { "s" },
				args.len()
			)) + span.marker());
		}
		if let Some(arg) = args.iter().find(|x| x.array_size > 0) {
			return Err(arg.span.error(format!("`{}` cannot take an array argument", function)) + arg.span.marker());
		}

		let bad = |i: usize, expected: &str| -> Diagnostic {
			args[i].span.error(format!(
				"argument {} of `{}` must be {}, found `{}`",
				i + 1,
				function,
				expected,
				args[i].ty
			)) + args[i].span.marker()
		};
		let ty = |i: usize| args[i].ty;

		let (result, casts): (ShaderType, Vec<Option<ShaderType>>) = match function {
			Radians | Degrees | Sin | Cos | Tan | Asin | Acos | Atan | Sinh | Cosh | Tanh | Asinh | Acosh | Atanh
			| Exp | Log | Exp2 | Log2 | Sqrt | InverseSqrt | Floor | Trunc | Round | RoundEven | Ceil | Fract => {
				if !floatish(ty(0)) {
					return Err(bad(0, "a float scalar or vector"));
				}
				(float_of(ty(0)), vec![Some(float_of(ty(0)))])
			},
			Abs | Sign => {
				if !floatish(ty(0)) || ty(0).component_type() == UInt {
					return Err(bad(0, "an int or float scalar or vector"));
				}
				(ty(0), vec![None])
			},
			Length => {
				if !floatish(ty(0)) {
					return Err(bad(0, "a float scalar or vector"));
				}
				(Float, vec![Some(float_of(ty(0)))])
			},
			Normalize => {
				if !floatish(ty(0)) || !ty(0).is_vector() {
					return Err(bad(0, "a float vector"));
				}
				(float_of(ty(0)), vec![Some(float_of(ty(0)))])
			},
			VecAny | VecAll | VecNot => {
				if !ty(0).is_vector() || ty(0).component_type() != Bool {
					return Err(bad(0, "a bool vector"));
				}
				(if function == VecNot { ty(0) } else { Bool }, vec![None])
			},
			Transpose | Inverse | Determinant => {
				if !ty(0).is_matrix() {
					return Err(bad(0, "a matrix"));
				}
				(if function == Determinant { Float } else { ty(0) }, vec![None])
			},
			ImageSize => {
				if !ty(0).is_image() {
					return Err(bad(0, "a storage image"));
				}
				(Int.to_vector(ty(0).size_count()).unwrap_or(Error), vec![None])
			},
			SubpassLoad => {
				if self.context != Context::Stage(StageKind::Fragment) {
					return Err(span.error("`subpassLoad` is only allowed in the fragment stage") + span.marker());
				}
				if !ty(0).is_subpass_input() {
					return Err(bad(0, "a subpass input"));
				}
				(Float4, vec![None])
			},
			Atan2 | Pow => {
				if !floatish(ty(0)) {
					return Err(bad(0, "a float scalar or vector"));
				}
				if !floatish(ty(1)) || ty(1).component_count() != ty(0).component_count() {
					return Err(bad(1, &format!("`{}`", float_of(ty(0)))));
				}
				let t = float_of(ty(0));
				(t, vec![Some(t), Some(t)])
			},
			Mod => {
				if !floatish(ty(0)) {
					return Err(bad(0, "a float scalar or vector"));
				}
				if !floatish(ty(1)) || !fits(ty(0), ty(1)) {
					return Err(bad(1, &format!("`float` or `{}`", float_of(ty(0)))));
				}
				(float_of(ty(0)), vec![Some(float_of(ty(0))), Some(float_of(ty(1)))])
			},
			Min | Max => {
				if !floatish(ty(0)) {
					return Err(bad(0, "a numeric scalar or vector"));
				}
				if !floatish(ty(1)) || !fits(ty(0), ty(1)) {
					return Err(bad(1, &format!("a scalar or `{}`", ty(0))));
				}
				let base = ShaderType::promote_scalar(ty(0), ty(1)).unwrap_or(Float);
				let t = ty(0).with_component(base).unwrap_or(Error);
				(t, vec![Some(t), ty(1).with_component(base)])
			},
			Step => {
				if !floatish(ty(1)) {
					return Err(bad(1, "a float scalar or vector"));
				}
				if !floatish(ty(0)) || !fits(ty(1), ty(0)) {
					return Err(bad(0, &format!("`float` or `{}`", float_of(ty(1)))));
				}
				(float_of(ty(1)), vec![Some(float_of(ty(0))), Some(float_of(ty(1)))])
			},
			Distance | Dot => {
				if !floatish(ty(0)) {
					return Err(bad(0, "a float scalar or vector"));
				}
				if !floatish(ty(1)) || ty(1).component_count() != ty(0).component_count() {
					return Err(bad(1, &format!("`{}`", float_of(ty(0)))));
				}
				(Float, vec![Some(float_of(ty(0))), Some(float_of(ty(1)))])
			},
			Cross => {
				for i in 0..2 {
					if !floatish(ty(i)) || ty(i).component_count() != 3 {
						return Err(bad(i, "`float3`"));
					}
				}
				(Float3, vec![Some(Float3), Some(Float3)])
			},
			Reflect => {
				if !floatish(ty(0)) || !ty(0).is_vector() {
					return Err(bad(0, "a float vector"));
				}
				if !floatish(ty(1)) || ty(1).component_count() != ty(0).component_count() {
					return Err(bad(1, &format!("`{}`", float_of(ty(0)))));
				}
				let t = float_of(ty(0));
				(t, vec![Some(t), Some(t)])
			},
			VecLT | VecLE | VecGT | VecGE | VecEQ | VecNE => {
				let any = matches!(function, VecEQ | VecNE);
				let valid = |t: ShaderType| t.is_vector() && (t.is_numeric() || any);
				if !valid(ty(0)) {
					return Err(bad(0, "a vector"));
				}
				if !valid(ty(1)) || ty(1).component_count() != ty(0).component_count() {
					return Err(bad(1, &format!("a vector like `{}`", ty(0))));
				}
				let n = ty(0).component_count();
				let result = Bool.to_vector(n).unwrap_or(Error);
				if ty(0).component_type() == Bool || ty(1).component_type() == Bool {
					if ty(0) != ty(1) {
						return Err(bad(1, &format!("`{}`", ty(0))));
					}
					(result, vec![None, None])
				} else {
					let base = ShaderType::promote_scalar(ty(0), ty(1)).unwrap_or(Float);
					(result, vec![ty(0).with_component(base), ty(1).with_component(base)])
				}
			},
			MatCompMul => {
				if !ty(0).is_matrix() {
					return Err(bad(0, "a matrix"));
				}
				if ty(1) != ty(0) {
					return Err(bad(1, &format!("`{}`", ty(0))));
				}
				(ty(0), vec![None, None])
			},
			Texture => {
				if !ty(0).is_texture() {
					return Err(bad(0, "a texture"));
				}
				let coords = Float.to_vector(ty(0).coord_count()).unwrap_or(Error);
				if !floatish(ty(1)) || ty(1).component_count() != coords.component_count() {
					return Err(bad(1, &format!("`{}` coordinates", coords)));
				}
				(Float4, vec![None, Some(coords)])
			},
			TextureSize => {
				if !ty(0).is_texture() {
					return Err(bad(0, "a texture"));
				}
				if ty(1) != Int {
					return Err(bad(1, "an `int` level of detail"));
				}
				(Int.to_vector(ty(0).size_count()).unwrap_or(Error), vec![None, None])
			},
			ImageLoad | ImageStore => {
				if !ty(0).is_image() {
					return Err(bad(0, "a storage image"));
				}
				let format = args[0]
					.lvalue
					.and_then(|x| x.format)
					.ok_or_else(|| bad(0, "a storage image uniform"))?;
				let coords = Int.to_vector(ty(0).coord_count()).unwrap_or(Error);
				if ty(1) != coords {
					return Err(bad(1, &format!("`{}` coordinates", coords)));
				}
				let texel = format.component_type().to_vector(4).unwrap_or(Error);
				if function == ImageLoad {
					(texel, vec![None, None])
				} else {
					if ty(2).component_count() != 4 || !ty(2).can_implicit_cast(texel) {
						return Err(bad(2, &format!("`{}`", texel)));
					}
					(Void, vec![None, None, Some(texel)])
				}
			},
			Clamp => {
				if !floatish(ty(0)) {
					return Err(bad(0, "a numeric scalar or vector"));
				}
				for i in 1..3 {
					if !floatish(ty(i)) || !fits(ty(0), ty(i)) {
						return Err(bad(i, &format!("a scalar or `{}`", ty(0))));
					}
				}
				let base = ShaderType::promote_scalar(ty(0), ty(1))
					.and_then(|x| ShaderType::promote_scalar(x, ty(2)))
					.unwrap_or(Float);
				let t = ty(0).with_component(base).unwrap_or(Error);
				(
					t,
					vec![Some(t), ty(1).with_component(base), ty(2).with_component(base)],
				)
			},
			Mix => {
				if !floatish(ty(0)) {
					return Err(bad(0, "a float scalar or vector"));
				}
				let t = float_of(ty(0));
				if !floatish(ty(1)) || ty(1).component_count() != t.component_count() {
					return Err(bad(1, &format!("`{}`", t)));
				}
				if !floatish(ty(2)) || !fits(t, ty(2)) {
					return Err(bad(2, &format!("`float` or `{}`", t)));
				}
				(t, vec![Some(t), Some(t), Some(float_of(ty(2)))])
			},
			Smoothstep => {
				if !floatish(ty(2)) {
					return Err(bad(2, "a float scalar or vector"));
				}
				let t = float_of(ty(2));
				for i in 0..2 {
					if !floatish(ty(i)) || !fits(t, ty(i)) {
						return Err(bad(i, &format!("`float` or `{}`", t)));
					}
				}
				(t, vec![Some(float_of(ty(0))), Some(float_of(ty(1))), Some(t)])
			},
			FaceForward | Fma => {
				if !floatish(ty(0)) {
					return Err(bad(0, "a float scalar or vector"));
				}
				let t = float_of(ty(0));
				for i in 1..3 {
					if !floatish(ty(i)) || ty(i).component_count() != t.component_count() {
						return Err(bad(i, &format!("`{}`", t)));
					}
				}
				(t, vec![Some(t), Some(t), Some(t)])
			},
			Refract => {
				if !floatish(ty(0)) || !ty(0).is_vector() {
					return Err(bad(0, "a float vector"));
				}
				let t = float_of(ty(0));
				if !floatish(ty(1)) || ty(1).component_count() != t.component_count() {
					return Err(bad(1, &format!("`{}`", t)));
				}
				if !floatish(ty(2)) || !ty(2).is_scalar() {
					return Err(bad(2, "a float scalar"));
				}
				(t, vec![Some(t), Some(t), Some(Float)])
			},
			TextureLod => {
				if !ty(0).is_texture() {
					return Err(bad(0, "a texture"));
				}
				let coords = Float.to_vector(ty(0).coord_count()).unwrap_or(Error);
				if !floatish(ty(1)) || ty(1).component_count() != coords.component_count() {
					return Err(bad(1, &format!("`{}` coordinates", coords)));
				}
				if !floatish(ty(2)) || !ty(2).is_scalar() {
					return Err(bad(2, "a float level of detail"));
				}
				(Float4, vec![None, Some(coords), Some(Float)])
			},
			TexelFetch => {
				if !ty(0).is_texture() || ty(0) == TexCube {
					return Err(bad(0, "a non-cube texture"));
				}
				let coords = Int.to_vector(ty(0).coord_count()).unwrap_or(Error);
				if ty(1) != coords {
					return Err(bad(1, &format!("`{}` coordinates", coords)));
				}
				if ty(2) != Int {
					return Err(bad(2, "an `int` level of detail"));
				}
				(Float4, vec![None, None, None])
			},
		};

		debug!("checked call to `{}`: {}", function, result);
		let texts: Vec<_> = args
			.iter()
			.zip(casts)
			.map(|(arg, cast)| match cast {
				Some(to) => self.cast_text(arg, to),
				None => arg.ref_text(self.intern).to_string(),
			})
			.collect();
		let text = format!("{}({})", function.glsl_name(), texts.join(", "));
		Ok(ExprResult::value(result, text, span))
	}
}
