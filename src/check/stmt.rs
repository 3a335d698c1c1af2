use crate::{
	ast::{Assign, Block, ExprKind, For, If, Stmt, StmtKind, UnaryOp, VarDecl},
	check::{
		expr::describe,
		inbuilt::InbuiltFunction,
		scope::{VarScope, Variable},
		types::ShaderType,
		Checker,
		Context,
	},
	diagnostic::{Diagnostic, Span},
	emit::declarator,
};

impl Checker<'_> {
	pub(super) fn stmts(&mut self, stmts: &[Stmt]) -> Result<(), Diagnostic> {
		for stmt in stmts {
			self.stmt(stmt)?;
		}
		Ok(())
	}

	/// The contents of a block in a new scope, one level deeper.
	fn block(&mut self, block: &Block) -> Result<(), Diagnostic> {
		self.scopes.push_scope();
		self.out.indent();
		self.stmts(&block.stmts)?;
		self.out.dedent();
		self.scopes.pop_scope();
		Ok(())
	}

	fn loop_body(&mut self, block: &Block) -> Result<(), Diagnostic> {
		self.loops += 1;
		let result = self.block(block);
		self.loops -= 1;
		result
	}

	fn stmt(&mut self, stmt: &Stmt) -> Result<(), Diagnostic> {
		self.effects = false;
		match &stmt.kind {
			StmtKind::Block(block) => {
				self.out.line("{");
				self.block(block)?;
				self.out.line("}");
			},
			StmtKind::VarDecl(decl) => {
				let text = self.var_decl(decl)?;
				self.out.line(format!("{};", text));
			},
			StmtKind::Assign(_) | StmtKind::Expr(_) => {
				let text = self.simple(stmt)?;
				self.out.line(format!("{};", text));
			},
			StmtKind::If(if_) => self.if_(if_)?,
			StmtKind::For(for_) => self.for_(for_)?,
			StmtKind::While(while_) => {
				let cond = self.lazily(|this| this.condition(&while_.cond))?;
				self.out.line(format!("while ({}) {{", cond));
				self.loop_body(&while_.block)?;
				self.out.line("}");
			},
			StmtKind::DoWhile(while_) => {
				self.out.line("do {");
				self.loop_body(&while_.block)?;
				let cond = self.lazily(|this| this.condition(&while_.cond))?;
				self.out.line(format!("}} while ({});", cond));
			},
			StmtKind::Return(value) => self.return_(value.as_ref(), stmt.span)?,
			StmtKind::Break | StmtKind::Continue => {
				let keyword = if matches!(stmt.kind, StmtKind::Break) { "break" } else { "continue" };
				if self.loops == 0 {
					return Err(stmt.span.error(format!("`{}` outside of a loop", keyword)) + stmt.span.marker());
				}
				self.out.line(format!("{};", keyword));
			},
			StmtKind::Discard => {
				if self.context != Context::Stage(crate::ast::StageKind::Fragment) {
					return Err(stmt.span.error("`discard` is only allowed in the fragment stage") + stmt.span.marker());
				}
				self.out.line("discard;");
			},
		}
		Ok(())
	}

	fn var_decl(&mut self, decl: &VarDecl) -> Result<String, Diagnostic> {
		let ty = self.plain_type(&decl.ty)?;
		if ty.is_handle_type() {
			return Err(decl.ty.span.error(format!("cannot declare a local of handle type `{}`", ty)) + decl.ty.span.marker());
		}
		let array_size = self.array_size(&decl.array)?;
		self.verify_ident(decl.name)?;

		let init = match &decl.val {
			Some(val) => {
				let result = self.expr(val)?;
				let valid = if array_size > 0 {
					result.array_size == array_size && result.ty == ty
				} else {
					result.array_size == 0 && result.ty.can_implicit_cast(ty)
				};
				if !valid {
					return Err(val.span.error(format!(
						"cannot initialize `{}` with `{}`",
						describe(ty, array_size),
						describe(result.ty, result.array_size)
					)) + val.span.marker());
				}
				Some(self.cast_text(&result, ty))
			},
			None if decl.constant => {
				return Err(decl
					.name
					.span
					.error(format!("constant `{}` must be initialized", self.intern.resolve(decl.name.name)))
					+ decl.name.span.marker())
			},
			None => None,
		};

		let mut var = Variable::new(decl.name.name, decl.name.span, ty, VarScope::Local).with_array(array_size);
		var.constant = decl.constant;
		self.scopes
			.declare_local(var)
			.map_err(|e| e.to_diagnostic(decl.name.span, self.intern))?;

		let name = self.intern.resolve(decl.name.name);
		let mut text = declarator(ty, name, array_size);
		if decl.constant {
			text.insert_str(0, "const ");
		}
		if let Some(init) = init {
			text.push_str(" = ");
			text.push_str(&init);
		}
		Ok(text)
	}

	/// An assignment or call, without the trailing `;`.
	fn simple(&mut self, stmt: &Stmt) -> Result<String, Diagnostic> {
		match &stmt.kind {
			StmtKind::Assign(assign) => self.assign(assign, stmt.span),
			StmtKind::Expr(expr) => match &expr.kind {
				ExprKind::Call(name, args) => {
					let pure = self.types.get(name.name).is_some()
						|| self
							.inbuilt
							.get(name.name)
							.map_or(false, |x| x != InbuiltFunction::ImageStore);
					let (result, _) = self.call(*name, args, expr.span)?;
					if pure {
						return Err(expr.span.error("expression statement has no effect") + expr.span.marker());
					}
					Ok(result.text)
				},
				ExprKind::Unary(UnaryOp::Inc | UnaryOp::Dec, _) | ExprKind::Postfix(..) => Ok(self.expr(expr)?.text),
				_ => Err(expr.span.error("expression statement has no effect") + expr.span.marker()),
			},
			_ => Err(stmt.span.error("expected an assignment or call") + stmt.span.marker()),
		}
	}

	fn assign(&mut self, assign: &Assign, span: Span) -> Result<String, Diagnostic> {
		let lhs = self.lvalue(&assign.lhs)?;
		let rhs = self.expr(&assign.rhs)?;
		let target = lhs.ref_text(self.intern).to_string();

		match assign.op.binary() {
			None => {
				if rhs.array_size > 0 || !rhs.ty.can_implicit_cast(lhs.ty) {
					return Err(assign.rhs.span.error(format!(
						"cannot assign `{}` to `{}`",
						describe(rhs.ty, rhs.array_size),
						lhs.ty
					)) + assign.rhs.span.marker()
						+ lhs.span.label(format!("has type `{}`", lhs.ty)));
				}
				Ok(format!("{} = {}", target, self.cast_text(&rhs, lhs.ty)))
			},
			Some(op) => {
				if let Some(var) = lhs.lvalue {
					self.check_read(&var, assign.lhs.span)?;
				}
				let result = self.binary(op, &lhs, &rhs, span)?;
				if !result.ty.can_implicit_cast(lhs.ty) {
					return Err(span.error(format!(
						"cannot apply `{}` to `{}` and `{}`",
						assign.op, lhs.ty, rhs.ty
					)) + span.marker());
				}
				let value = match rhs.ty.with_component(lhs.ty.component_type()) {
					Some(to) => self.cast_text(&rhs, to),
					None => rhs.ref_text(self.intern).to_string(),
				};
				Ok(format!("{} {} {}", target, assign.op, value))
			},
		}
	}

	fn if_(&mut self, if_: &If) -> Result<(), Diagnostic> {
		let cond = self.condition(&if_.cond)?;
		self.out.line(format!("if ({}) {{", cond));
		self.block(&if_.block)?;
		for (cond, block) in if_.elifs.iter() {
			let cond = self.lazily(|this| this.condition(cond))?;
			self.out.line(format!("}} else if ({}) {{", cond));
			self.block(block)?;
		}
		if let Some(else_) = &if_.else_ {
			self.out.line("} else {");
			self.block(else_)?;
		}
		self.out.line("}");
		Ok(())
	}

	fn for_(&mut self, for_: &For) -> Result<(), Diagnostic> {
		self.out.line("{");
		self.out.indent();
		self.scopes.push_scope();

		if let Some(init) = &for_.init {
			let text = match &init.kind {
				StmtKind::VarDecl(decl) => self.var_decl(decl)?,
				StmtKind::Assign(_) | StmtKind::Expr(_) => self.simple(init)?,
				_ => return Err(init.span.error("invalid `for` initializer") + init.span.marker()),
			};
			self.out.line(format!("{};", text));
		}
		let cond = match &for_.cond {
			Some(cond) => self.lazily(|this| this.condition(cond))?,
			None => String::new(),
		};
		let update = match &for_.update {
			Some(update) => match update.kind {
				StmtKind::Assign(_) | StmtKind::Expr(_) => self.lazily(|this| this.simple(update))?,
				_ => return Err(update.span.error("invalid `for` update") + update.span.marker()),
			},
			None => String::new(),
		};

		self.out.line(format!("for (; {}; {}) {{", cond, update));
		self.loop_body(&for_.block)?;
		self.out.line("}");

		self.scopes.pop_scope();
		self.out.dedent();
		self.out.line("}");
		Ok(())
	}

	fn return_(&mut self, value: Option<&crate::ast::Expr>, span: Span) -> Result<(), Diagnostic> {
		let ret = match self.context {
			Context::Function { ret, .. } => ret,
			_ => {
				if let Some(value) = value {
					return Err(value.span.error("stages cannot return a value") + value.span.marker());
				}
				self.out.line("return;");
				return Ok(());
			},
		};

		match value {
			Some(value) => {
				if ret == ShaderType::Void {
					return Err(value.span.error("`void` function cannot return a value") + value.span.marker());
				}
				let result = self.expr(value)?;
				if result.array_size > 0 || !result.ty.can_implicit_cast(ret) {
					return Err(value.span.error(format!(
						"expected return type `{}`, found `{}`",
						ret,
						describe(result.ty, result.array_size)
					)) + value.span.marker());
				}
				let text = self.cast_text(&result, ret);
				self.out.line(format!("return {};", text));
			},
			None => {
				if ret != ShaderType::Void {
					return Err(span.error(format!("function must return a value of type `{}`", ret)) + span.marker());
				}
				self.out.line("return;");
			},
		}
		Ok(())
	}
}
