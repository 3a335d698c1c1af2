use crate::{
	ast::{BinaryOp, Expr, ExprKind, Ident, Literal, PostfixOp, StageKind, UnaryOp},
	check::{
		literal_int,
		parse_int,
		scope::{VarScope, Variable},
		types::ShaderType,
		Checker,
		Context,
	},
	diagnostic::{Diagnostic, Span},
	text::Interner,
};

/// The checked form of an expression: its type and the GLSL text that computes it.
#[derive(Clone, Debug)]
pub struct ExprResult {
	pub ty: ShaderType,
	/// Zero when the value is not an array.
	pub array_size: u32,
	/// The temporary the value was stored in, if it was materialized.
	pub temp: Option<Variable>,
	pub text: String,
	/// Whether the expression is a literal, possibly negated.
	pub literal: bool,
	/// The variable this expression designates, if it is a place.
	pub lvalue: Option<Variable>,
	pub span: Span,
}

impl ExprResult {
	pub fn value(ty: ShaderType, text: String, span: Span) -> Self {
		Self {
			ty,
			array_size: 0,
			temp: None,
			text,
			literal: false,
			lvalue: None,
			span,
		}
	}

	/// The text that refers to this value: the temporary if there is one, otherwise the inline expression.
	pub fn ref_text<'s>(&'s self, intern: &'s Interner) -> &'s str {
		match self.temp {
			Some(temp) => intern.resolve(temp.name),
			None => &self.text,
		}
	}
}

pub(super) fn describe(ty: ShaderType, array_size: u32) -> String {
	if array_size > 0 {
		format!("{}[{}]", ty, array_size)
	} else {
		ty.to_string()
	}
}

const SWIZZLES: [&str; 3] = ["xyzw", "rgba", "stpq"];

impl Checker<'_> {
	pub(super) fn expr(&mut self, expr: &Expr) -> Result<ExprResult, Diagnostic> {
		match &expr.kind {
			ExprKind::Literal(lit) => self.literal(*lit, false, expr.span),
			ExprKind::Ident(ident) => self.ident(*ident),
			ExprKind::Unary(op, inner) => self.unary(*op, inner, expr.span),
			ExprKind::Postfix(op, inner) => {
				let op = match op {
					PostfixOp::Inc => UnaryOp::Inc,
					PostfixOp::Dec => UnaryOp::Dec,
				};
				self.step(op, false, inner, expr.span)
			},
			ExprKind::Binary(binary) => {
				let lhs = self.expr(&binary.lhs)?;
				let rhs = match binary.op {
					BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => self.lazily(|this| this.expr(&binary.rhs))?,
					_ => self.expr(&binary.rhs)?,
				};
				self.binary(binary.op, &lhs, &rhs, expr.span)
			},
			ExprKind::Ternary(cond, a, b) => self.ternary(cond, a, b, expr.span),
			ExprKind::Call(name, args) => {
				let (result, materialize) = self.call(*name, args, expr.span)?;
				Ok(if materialize { self.materialize(result) } else { result })
			},
			ExprKind::Index(base, indices) => {
				let base = self.expr(base)?;
				self.index(base, indices, expr.span)
			},
			ExprKind::Member(base, member) => {
				let base = self.expr(base)?;
				self.swizzle(base, *member, expr.span)
			},
		}
	}

	/// Runs `f` with temporaries disabled, for code that is not evaluated unconditionally.
	pub(super) fn lazily<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, Diagnostic>) -> Result<T, Diagnostic> {
		self.lazy += 1;
		let result = f(self);
		self.lazy -= 1;
		result
	}

	/// Stores a value in a fresh temporary so later references do not recompute it.
	pub(super) fn materialize(&mut self, mut result: ExprResult) -> ExprResult {
		if self.lazy > 0
			|| self.effects
			|| result.temp.is_some()
			|| result.array_size > 0
			|| !result.ty.is_value_type()
		{
			return result;
		}

		let temp = self
			.scopes
			.new_temporary(self.intern, result.ty, 0, result.span);
		self.out.line(format!(
			"{} {} = {};",
			result.ty.glsl_name(),
			self.intern.resolve(temp.name),
			result.text
		));
		result.temp = Some(temp);
		result
	}

	/// The text of `result` converted to `to`.
	pub(super) fn cast_text(&self, result: &ExprResult, to: ShaderType) -> String {
		let text = result.ref_text(self.intern);
		if result.ty == to {
			text.to_string()
		} else {
			format!("{}({})", to.glsl_name(), text)
		}
	}

	fn literal(&mut self, lit: Literal, negative: bool, span: Span) -> Result<ExprResult, Diagnostic> {
		let (ty, text) = match lit {
			Literal::Bool(value) => (ShaderType::Bool, value.to_string()),
			Literal::Int(text) => {
				let source = self.intern.resolve(text);
				let (value, unsigned) = parse_int(source, negative, span)?;
				let text = match (unsigned, negative) {
					(true, false) => format!("{}u", value),
					(true, true) => format!("(-{}u)", value),
					(false, false) => value.to_string(),
					(false, true) if value > i32::MAX as u64 => "(-2147483647 - 1)".to_string(),
					(false, true) => format!("(-{})", value),
				};
				(if unsigned { ShaderType::UInt } else { ShaderType::Int }, text)
			},
			Literal::Float(text) => {
				let source = self.intern.resolve(text);
				match source.trim_end_matches(['f', 'F']).parse::<f32>() {
					Ok(value) if value.is_finite() => {},
					_ => {
						return Err(span.error(format!("float literal `{}` is out of range", source)) + span.marker())
					},
				}
				let text = if negative {
					format!("(-{})", source)
				} else {
					source.to_string()
				};
				(ShaderType::Float, text)
			},
		};

		Ok(ExprResult {
			literal: true,
			..ExprResult::value(ty, text, span)
		})
	}

	/// Looks up a name, enforcing which storage the current context may see.
	pub(super) fn lookup(&self, ident: Ident) -> Result<Variable, Diagnostic> {
		let name = self.intern.resolve(ident.name);
		let var = self
			.scopes
			.resolve(ident.name)
			.ok_or_else(|| ident.span.error(format!("undefined identifier `{}`", name)) + ident.span.marker())?;

		let hidden = match self.context {
			Context::Global | Context::Constant => {
				(var.scope != VarScope::Constant).then_some("constant initializers can only reference constants")
			},
			Context::Function { .. } => match var.scope {
				VarScope::Uniform | VarScope::Constant | VarScope::Argument | VarScope::Local => None,
				_ => Some("functions can only reference uniforms, constants and their own locals"),
			},
			Context::Stage(stage) => match var.scope {
				VarScope::Attribute if stage != StageKind::Vertex => {
					Some("attributes are only visible in the vertex stage")
				},
				VarScope::Output if stage != StageKind::Fragment => Some("outputs are only visible in the fragment stage"),
				VarScope::Uniform if var.ty.is_subpass_input() && stage != StageKind::Fragment => {
					Some("subpass inputs are only visible in the fragment stage")
				},
				_ => None,
			},
		};
		if let Some(reason) = hidden {
			return Err(ident.span.error(format!("cannot use `{}` here: {}", name, reason))
				+ ident.span.marker()
				+ var.span.label("declared here"));
		}

		Ok(var)
	}

	pub(super) fn check_read(&self, var: &Variable, span: Span) -> Result<(), Diagnostic> {
		if var.access.can_read() {
			Ok(())
		} else {
			Err(span.error(format!("`{}` is write-only", var.emit_name(self.intern))) + span.marker())
		}
	}

	pub(super) fn check_write(&self, var: &Variable, span: Span) -> Result<(), Diagnostic> {
		let name = self.intern.resolve(var.name);
		if var.constant || !var.access.can_write() {
			return Err(span.error(format!("cannot assign to read-only `{}`", name))
				+ span.marker()
				+ var.span.label("declared here"));
		}
		if var.scope == VarScope::Internal && self.context == Context::Stage(StageKind::Fragment) {
			return Err(span.error(format!("`{}` is read-only in the fragment stage", name)) + span.marker());
		}
		Ok(())
	}

	fn var_result(&self, var: Variable, span: Span) -> ExprResult {
		ExprResult {
			array_size: var.array_size,
			lvalue: Some(var),
			..ExprResult::value(var.ty, var.emit_name(self.intern).to_string(), span)
		}
	}

	fn ident(&mut self, ident: Ident) -> Result<ExprResult, Diagnostic> {
		let var = self.lookup(ident)?;
		self.check_read(&var, ident.span)?;
		Ok(self.var_result(var, ident.span))
	}

	/// An assignable place, possibly a whole array.
	pub(super) fn place(&mut self, expr: &Expr) -> Result<ExprResult, Diagnostic> {
		match &expr.kind {
			ExprKind::Ident(ident) => {
				let var = self.lookup(*ident)?;
				self.check_write(&var, ident.span)?;
				Ok(self.var_result(var, ident.span))
			},
			ExprKind::Index(base, indices) => {
				let base = self.place(base)?;
				self.index(base, indices, expr.span)
			},
			ExprKind::Member(base, member) => {
				let letters = self.intern.resolve(member.name);
				if letters.chars().enumerate().any(|(i, c)| letters[..i].contains(c)) {
					return Err(member
						.span
						.error(format!("cannot assign to swizzle `{}` with repeated components", letters))
						+ member.span.marker());
				}
				let base = self.place(base)?;
				self.swizzle(base, *member, expr.span)
			},
			_ => Err(expr.span.error("expression cannot be assigned to") + expr.span.marker()),
		}
	}

	/// An assignable place holding a single value.
	pub(super) fn lvalue(&mut self, expr: &Expr) -> Result<ExprResult, Diagnostic> {
		let place = self.place(expr)?;
		if place.array_size > 0 {
			return Err(expr.span.error("cannot assign to a whole array") + expr.span.marker());
		}
		Ok(place)
	}

	fn unary(&mut self, op: UnaryOp, inner: &Expr, span: Span) -> Result<ExprResult, Diagnostic> {
		match op {
			UnaryOp::Minus => {
				if let ExprKind::Literal(lit @ (Literal::Int(_) | Literal::Float(_))) = &inner.kind {
					return self.literal(*lit, true, span);
				}
			},
			UnaryOp::Inc | UnaryOp::Dec => return self.step(op, true, inner, span),
			_ => {},
		}

		let operand = self.expr(inner)?;
		let ty = operand.ty;
		let valid = operand.array_size == 0
			&& match op {
				UnaryOp::Plus | UnaryOp::Minus => ty.is_numeric(),
				UnaryOp::Not => ty == ShaderType::Bool,
				UnaryOp::BitNot => ty.is_integer(),
				UnaryOp::Inc | UnaryOp::Dec => false,
			};
		if !valid {
			return Err(span.error(format!("cannot apply `{}` to `{}`", op, describe(ty, operand.array_size)))
				+ span.marker()
				+ operand.span.label(format!("has type `{}`", describe(ty, operand.array_size))));
		}

		let text = format!("({}{})", op, operand.ref_text(self.intern));
		Ok(ExprResult::value(ty, text, span))
	}

	/// Increment or decrement of a scalar variable.
	fn step(&mut self, op: UnaryOp, prefix: bool, inner: &Expr, span: Span) -> Result<ExprResult, Diagnostic> {
		let ident = match &inner.kind {
			ExprKind::Ident(ident) => *ident,
			_ => {
				return Err(inner.span.error(format!("`{}` can only be applied to a variable", op)) + inner.span.marker())
			},
		};

		let var = self.lookup(ident)?;
		self.check_write(&var, ident.span)?;
		self.check_read(&var, ident.span)?;
		if var.array_size > 0 || !var.ty.is_scalar() || !var.ty.is_numeric() {
			return Err(span.error(format!(
				"`{}` requires a scalar numeric variable, found `{}`",
				op,
				describe(var.ty, var.array_size)
			)) + inner.span.marker());
		}

		let name = var.emit_name(self.intern);
		let text = if prefix {
			format!("({}{})", op, name)
		} else {
			format!("({}{})", name, op)
		};
		self.effects = true;
		Ok(ExprResult::value(var.ty, text, span))
	}

	pub(super) fn binary(
		&mut self, op: BinaryOp, lhs: &ExprResult, rhs: &ExprResult, span: Span,
	) -> Result<ExprResult, Diagnostic> {
		let mismatch = || {
			span.error(format!(
				"cannot apply `{}` to `{}` and `{}`",
				op,
				describe(lhs.ty, lhs.array_size),
				describe(rhs.ty, rhs.array_size)
			)) + lhs.span.label(format!("has type `{}`", describe(lhs.ty, lhs.array_size)))
				+ rhs.span.label(format!("has type `{}`", describe(rhs.ty, rhs.array_size)))
		};

		let (l, r) = (lhs.ty, rhs.ty);
		if lhs.array_size > 0 || rhs.array_size > 0 || !l.is_value_type() || !r.is_value_type() {
			return Err(mismatch());
		}
		let integers = l.is_scalar() && r.is_scalar() && l.is_integer() && r.is_integer();

		let (ty, lcast, rcast) = match op {
			BinaryOp::Mul | BinaryOp::Div => Self::product(op, l, r).ok_or_else(mismatch)?,
			BinaryOp::Add | BinaryOp::Sub => {
				if !l.is_numeric() || !r.is_numeric() {
					return Err(mismatch());
				}
				let ty = ShaderType::promote(l, r).ok_or_else(mismatch)?;
				(ty, ty, ty)
			},
			BinaryOp::Mod | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor if integers => (l, l, l),
			BinaryOp::Shl | BinaryOp::Shr if integers => (l, l, r),
			BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
				if !l.is_scalar() || !r.is_scalar() || !l.is_numeric() || !r.is_numeric() {
					return Err(mismatch());
				}
				let ty = ShaderType::promote(l, r).ok_or_else(mismatch)?;
				(ShaderType::Bool, ty, ty)
			},
			BinaryOp::Eq | BinaryOp::Ne => {
				let ty = ShaderType::promote(l, r).ok_or_else(mismatch)?;
				(ShaderType::Bool, ty, ty)
			},
			BinaryOp::And | BinaryOp::Or | BinaryOp::Xor if l == ShaderType::Bool && r == ShaderType::Bool => {
				(ShaderType::Bool, l, r)
			},
			_ => return Err(mismatch()),
		};

		let text = format!(
			"({} {} {})",
			self.cast_text(lhs, lcast),
			op,
			self.cast_text(rhs, rcast)
		);
		Ok(ExprResult::value(ty, text, span))
	}

	/// Result and operand types of `*` and `/`.
	fn product(op: BinaryOp, l: ShaderType, r: ShaderType) -> Option<(ShaderType, ShaderType, ShaderType)> {
		if !l.is_numeric() || !r.is_numeric() {
			return None;
		}
		let base = ShaderType::promote_scalar(l, r)?;
		let div = op == BinaryOp::Div;

		match (l.matrix_rank(), r.matrix_rank()) {
			(Some(_), Some(_)) if !div && l == r => Some((l, l, r)),
			(Some(_), None) if r.is_scalar() => Some((l, l, ShaderType::Float)),
			(None, Some(_)) if l.is_scalar() && !div => Some((r, ShaderType::Float, r)),
			(Some(rank), None) if !div && r.component_count() == rank => {
				let v = ShaderType::Float.to_vector(rank)?;
				Some((v, l, v))
			},
			(None, Some(rank)) if !div && l.component_count() == rank => {
				let v = ShaderType::Float.to_vector(rank)?;
				Some((v, v, r))
			},
			(None, None) => {
				let (lc, rc) = (l.component_count(), r.component_count());
				if lc != rc && lc != 1 && rc != 1 {
					return None;
				}
				let ty = base.to_vector(lc.max(rc))?;
				Some((ty, l.with_component(base)?, r.with_component(base)?))
			},
			_ => None,
		}
	}

	fn ternary(&mut self, cond: &Expr, a: &Expr, b: &Expr, span: Span) -> Result<ExprResult, Diagnostic> {
		let cond = self.condition(cond)?;
		let (a, b) = self.lazily(|this| Ok((this.expr(a)?, this.expr(b)?)))?;
		if a.array_size > 0 || b.array_size > 0 || !a.ty.is_value_type() || !b.ty.is_value_type() {
			return Err(span.error(format!(
				"`?:` branches must be values, found `{}` and `{}`",
				describe(a.ty, a.array_size),
				describe(b.ty, b.array_size)
			)) + span.marker());
		}

		let ty = ShaderType::promote(a.ty, b.ty).ok_or_else(|| {
			span.error(format!("`?:` branches have incompatible types `{}` and `{}`", a.ty, b.ty))
				+ a.span.label(format!("has type `{}`", a.ty))
				+ b.span.label(format!("has type `{}`", b.ty))
		})?;
		let text = format!("({} ? {} : {})", cond, self.cast_text(&a, ty), self.cast_text(&b, ty));
		Ok(ExprResult::value(ty, text, span))
	}

	/// Checks a `bool` condition, returning the text that refers to it.
	pub(super) fn condition(&mut self, expr: &Expr) -> Result<String, Diagnostic> {
		let cond = self.expr(expr)?;
		if cond.ty != ShaderType::Bool || cond.array_size > 0 {
			return Err(expr.span.error(format!(
				"condition must be `bool`, found `{}`",
				describe(cond.ty, cond.array_size)
			)) + expr.span.marker());
		}
		Ok(cond.ref_text(self.intern).to_string())
	}

	fn index(&mut self, base: ExprResult, indices: &[Expr], span: Span) -> Result<ExprResult, Diagnostic> {
		let mut checked = Vec::with_capacity(indices.len());
		for index in indices {
			let result = self.expr(index)?;
			if result.array_size > 0 || !matches!(result.ty, ShaderType::Int | ShaderType::UInt) {
				return Err(index.span.error(format!(
					"index must be a scalar integer, found `{}`",
					describe(result.ty, result.array_size)
				)) + index.span.marker());
			}
			let value = literal_int(index, self.intern);
			if matches!(value, Some(v) if v < 0) {
				return Err(index.span.error("index must not be negative") + index.span.marker());
			}
			checked.push((result, value, index.span));
		}

		let desc = describe(base.ty, base.array_size);
		let (ty, bound, expected) = if base.array_size > 0 {
			(base.ty, base.array_size, 1)
		} else if base.ty.is_vector() {
			(base.ty.component_type(), base.ty.component_count(), 1)
		} else if let Some(rank) = base.ty.matrix_rank() {
			(ShaderType::Float, rank, 2)
		} else {
			return Err(span.error(format!("cannot index into `{}`", desc)) + base.span.label(format!("has type `{}`", desc)));
		};

		if checked.len() != expected {
			return Err(span.error(format!(
				"`{}` takes {} index{}, found {}",
				desc,
				expected,
				if expected == 1 { "" } else { "es" },
				checked.len()
			)) + span.marker());
		}
		for (_, value, index_span) in checked.iter() {
			if let Some(value) = *value {
				if value >= bound as i64 {
					return Err(index_span.error(format!("index {} is out of range for `{}`", value, desc))
						+ index_span.marker());
				}
			}
		}

		let mut text = base.ref_text(self.intern).to_string();
		for (index, ..) in checked.iter() {
			text.push('[');
			text.push_str(index.ref_text(self.intern));
			text.push(']');
		}
		Ok(ExprResult {
			lvalue: base.lvalue,
			..ExprResult::value(ty, text, span)
		})
	}

	fn swizzle(&mut self, base: ExprResult, member: Ident, span: Span) -> Result<ExprResult, Diagnostic> {
		let letters = self.intern.resolve(member.name);
		if base.array_size > 0 || !base.ty.is_vector() {
			return Err(span.error(format!(
				"cannot swizzle `{}`",
				describe(base.ty, base.array_size)
			)) + base.span.label(format!("has type `{}`", describe(base.ty, base.array_size))));
		}
		if letters.is_empty() || letters.len() > 4 {
			return Err(member.span.error(format!("invalid swizzle `{}`", letters)) + member.span.marker());
		}

		let first = letters.chars().next().unwrap_or('x');
		let family = SWIZZLES
			.iter()
			.find(|family| family.contains(first))
			.ok_or_else(|| member.span.error(format!("invalid swizzle `{}`", letters)) + member.span.marker())?;
		for c in letters.chars() {
			match family.find(c) {
				Some(i) if (i as u32) < base.ty.component_count() => {},
				Some(_) => {
					return Err(member.span.error(format!("`{}` has no component `{}`", base.ty, c)) + member.span.marker())
				},
				None => {
					return Err(member
						.span
						.error(format!("swizzle `{}` mixes component sets", letters))
						+ member.span.marker())
				},
			}
		}

		let ty = base
			.ty
			.component_type()
			.to_vector(letters.len() as u32)
			.unwrap_or(ShaderType::Error);
		let text = format!("{}.{}", base.ref_text(self.intern), letters);
		Ok(ExprResult {
			lvalue: base.lvalue,
			..ExprResult::value(ty, text, span)
		})
	}
}
