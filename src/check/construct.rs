use crate::{
	check::{
		expr::{describe, ExprResult},
		types::ShaderType,
		Checker,
	},
	diagnostic::{Diagnostic, Span},
};

impl Checker<'_> {
	/// A type constructor call such as `float3(v.xy, 1.0)`.
	pub(super) fn construct(&self, ty: ShaderType, args: &[ExprResult], span: Span) -> Result<ExprResult, Diagnostic> {
		if !ty.is_value_type() {
			return Err(span.error(format!("cannot construct a value of type `{}`", ty)) + span.marker());
		}
		if args.is_empty() {
			return Err(span.error(format!("`{}` constructor requires arguments", ty)) + span.marker());
		}
		for arg in args {
			if arg.array_size > 0 || !arg.ty.is_value_type() {
				return Err(arg.span.error(format!(
					"cannot construct `{}` from `{}`",
					ty,
					describe(arg.ty, arg.array_size)
				)) + arg.span.marker());
			}
		}

		let count = ty.component_count();
		let base = ty.component_type();
		let castable = |arg: &ExprResult| arg.ty.component_type().can_implicit_cast(base);
		let components: u32 = args.iter().map(|x| x.ty.component_count()).sum();
		let wrong_count = || {
			span.error(format!(
				"`{}` requires {} components, found {}",
				ty, count, components
			)) + span.marker()
		};
		let bad_arg = |arg: &ExprResult| {
			arg.span.error(format!("cannot construct `{}` from `{}`", ty, arg.ty))
				+ arg.span.label(format!("has type `{}`", arg.ty))
		};

		if ty.is_scalar() {
			if args.len() != 1 {
				return Err(span.error(format!("`{}` constructor takes 1 argument, found {}", ty, args.len()))
					+ span.marker());
			}
			if !args[0].ty.is_scalar() {
				return Err(bad_arg(&args[0]));
			}
		} else if ty.is_vector() {
			if let Some(arg) = args.iter().find(|x| x.ty.is_matrix() || !castable(x)) {
				return Err(bad_arg(arg));
			}
			match args {
				[arg] if arg.ty.is_scalar() => {},
				[arg] if arg.ty.component_count() >= count => {},
				_ if components == count => {},
				_ => return Err(wrong_count()),
			}
		} else {
			match args {
				[arg] if arg.ty.is_matrix() => {},
				[arg] if arg.ty.is_scalar() && castable(arg) => {},
				_ => {
					if let Some(arg) = args.iter().find(|x| x.ty.is_matrix() || !castable(x)) {
						return Err(bad_arg(arg));
					}
					if components != count {
						return Err(wrong_count());
					}
				},
			}
		}

		let args: Vec<_> = args.iter().map(|x| x.ref_text(self.intern)).collect();
		let text = format!("{}({})", ty.glsl_name(), args.join(", "));
		Ok(ExprResult::value(ty, text, span))
	}
}
