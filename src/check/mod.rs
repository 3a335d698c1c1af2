use aho_corasick::AhoCorasick;
use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::{
	ast,
	ast::{BlockKind, DeclBlock, Expr, ExprKind, GlobalDeclKind, Ident, Literal, StageFn, StageKind, TypeArg, TypeRef, UnaryOp},
	check::{
		inbuilt::{reserved_matcher, Access, InbuiltFunction, Matcher},
		scope::{FunctionSig, GlobalKind, ScopeError, ScopeManager, VarScope, Variable},
		types::{ImageFormat, ShaderType},
	},
	config::Options,
	diagnostic::{Diagnostic, Diagnostics, Span},
	emit::{declarator, CodeWriter},
	reflect::ShaderInfo,
	text::{Interner, Text},
};

mod call;
mod construct;
pub mod expr;
pub mod inbuilt;
pub mod scope;
mod stmt;
pub mod types;

pub use expr::ExprResult;

pub const MAX_IDENT_LEN: usize = 32;

/// A varying passed from the vertex to the fragment stage.
#[derive(Clone, Debug)]
pub struct Internal {
	pub name: String,
	pub ty: ShaderType,
	pub array_size: u32,
	pub location: u32,
	pub flat: bool,
}

/// Everything the emitter needs to assemble the stage modules.
#[derive(Clone, Debug)]
pub struct Program {
	pub info: ShaderInfo,
	pub internals: Vec<Internal>,
	/// Specialization and global constant declarations, in source order.
	pub declarations: Vec<String>,
	pub functions: Vec<String>,
	pub vertex: String,
	pub fragment: String,
	pub temporaries: u32,
}

/// What the code being checked is part of.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Context {
	Global,
	Constant,
	Function { name: Text, ret: ShaderType },
	Stage(StageKind),
}

pub fn check(
	tu: &ast::TranslationUnit, file: Text, intern: &mut Interner, options: &Options, diagnostics: &mut Diagnostics,
) -> Result<Program, Diagnostic> {
	Checker::new(file, intern, options, diagnostics).run(tu)
}

struct Checker<'a> {
	intern: &'a mut Interner,
	diagnostics: &'a mut Diagnostics,
	options: &'a Options,
	file: Text,
	scopes: ScopeManager,
	types: Matcher<ShaderType>,
	formats: Matcher<ImageFormat>,
	inbuilt: Matcher<InbuiltFunction>,
	reserved: AhoCorasick,
	info: ShaderInfo,
	internals: Vec<Internal>,
	internal_slots: u32,
	subpass_inputs: u32,
	declarations: Vec<String>,
	functions: Vec<String>,
	blocks: [Option<Span>; 3],
	bindings: FxHashMap<u32, Span>,
	spec_indices: FxHashMap<u32, Span>,
	out: CodeWriter,
	context: Context,
	lazy: u32,
	/// A side effect was emitted inline in the current statement, so later values stay inline too.
	effects: bool,
	loops: u32,
}

impl<'a> Checker<'a> {
	fn new(file: Text, intern: &'a mut Interner, options: &'a Options, diagnostics: &'a mut Diagnostics) -> Self {
		Self {
			types: Matcher::new(intern),
			formats: Matcher::new(intern),
			inbuilt: Matcher::new(intern),
			reserved: reserved_matcher(),
			intern,
			diagnostics,
			options,
			file,
			scopes: ScopeManager::new(),
			info: ShaderInfo::default(),
			internals: Vec::new(),
			internal_slots: 0,
			subpass_inputs: 0,
			declarations: Vec::new(),
			functions: Vec::new(),
			blocks: [None; 3],
			bindings: FxHashMap::default(),
			spec_indices: FxHashMap::default(),
			out: CodeWriter::new(),
			context: Context::Global,
			lazy: 0,
			effects: false,
			loops: 0,
		}
	}

	fn run(mut self, tu: &ast::TranslationUnit) -> Result<Program, Diagnostic> {
		for (i, decl) in tu.decls.iter().enumerate() {
			if let GlobalDeclKind::ShaderName(name) = &decl.kind {
				if i != 0 {
					return Err(decl.span.error("`@shader` must be the first declaration") + decl.span.marker());
				}
				match name {
					Some(name) => self.info.name = self.intern.resolve(name.value).to_string(),
					None => self.warn(decl.span.warning("`@shader` declaration has no name") + decl.span.marker()),
				}
			}
		}

		info!("checking global declarations");
		for decl in tu.decls.iter() {
			match &decl.kind {
				GlobalDeclKind::Block(block) => self.decl_block(block, decl.span)?,
				GlobalDeclKind::Uniform(uniform) => self.uniform(uniform, decl.span)?,
				GlobalDeclKind::Const(constant) => self.constant(constant, decl.span)?,
				_ => {},
			}
		}

		let start = Span {
			start: 0,
			end: 0,
			file: self.file,
		};
		if self.info.attributes.is_empty() {
			return Err(start.error("shader requires an attributes block") + start.marker());
		}
		if self.info.outputs.is_empty() {
			return Err(start.error("shader requires an outputs block") + start.marker());
		}
		if !self.info.uniforms_contiguous() {
			let message = format!(
				"uniform bindings are not contiguous from zero (found {:?})",
				self.info.bindings()
			);
			if self.options.strict_uniforms {
				return Err(start.error(message) + start.marker());
			}
			self.warn(start.warning(message) + start.marker());
		}

		info!("checking functions");
		for decl in tu.decls.iter() {
			if let GlobalDeclKind::Fn(f) = &decl.kind {
				self.function(f)?;
			}
		}

		info!("checking stages");
		let mut vertex: Option<&StageFn> = None;
		let mut fragment: Option<&StageFn> = None;
		for decl in tu.decls.iter() {
			if let GlobalDeclKind::Stage(stage) = &decl.kind {
				let slot = match stage.kind {
					StageKind::Vertex => &mut vertex,
					StageKind::Fragment => &mut fragment,
					other => {
						return Err(stage
							.keyword
							.error(format!("{} stage is not yet implemented", stage_name(other)))
							+ stage.keyword.marker())
					},
				};
				if let Some(previous) = slot {
					return Err(stage
						.keyword
						.error(format!("duplicate {} stage", stage_name(stage.kind)))
						+ stage.keyword.marker()
						+ previous.keyword.label("first defined here"));
				}
				*slot = Some(stage);
			}
		}

		let vertex = vertex.ok_or_else(|| start.error("shader requires a vertex stage") + start.marker())?;
		let fragment = fragment.ok_or_else(|| start.error("shader requires a fragment stage") + start.marker())?;
		let vertex = self.stage(vertex)?;
		let fragment = self.stage(fragment)?;

		Ok(Program {
			info: self.info,
			internals: self.internals,
			declarations: self.declarations,
			functions: self.functions,
			vertex,
			fragment,
			temporaries: self.scopes.temporaries(),
		})
	}

	fn warn(&mut self, diagnostic: Diagnostic) {
		warn!("{}", diagnostic.message);
		self.diagnostics.push(diagnostic);
	}

	fn decl_block(&mut self, block: &DeclBlock, span: Span) -> Result<(), Diagnostic> {
		let (slot, keyword, kind) = match block.kind {
			BlockKind::Attributes => (0, "@attributes", GlobalKind::Attribute),
			BlockKind::Outputs => (1, "@outputs", GlobalKind::Output),
			BlockKind::Locals => (2, "@locals", GlobalKind::Internal),
		};
		if let Some(previous) = self.blocks[slot] {
			return Err(span.error(format!("duplicate `{}` block", keyword))
				+ span.marker()
				+ previous.label("first declared here"));
		}
		self.blocks[slot] = Some(span);
		if block.members.is_empty() {
			return Err(span.error(format!("`{}` block cannot be empty", keyword)) + span.marker());
		}

		let limits = self.options.limits;
		for member in block.members.iter() {
			let ty = self.plain_type(&member.ty)?;
			let array_size = self.array_size(&member.array)?;
			self.verify_ident(member.name)?;

			let scope = match kind {
				GlobalKind::Attribute => VarScope::Attribute,
				GlobalKind::Output => VarScope::Output,
				_ => VarScope::Internal,
			};
			let mut var = Variable::new(member.name.name, member.name.span, ty, scope).with_array(array_size);
			var.flat = member.flat;
			let name = self.intern.resolve(member.name.name).to_string();

			match kind {
				GlobalKind::Attribute => {
					var.binding = Some(self.info.attribute_slots());
					self.declare_global(kind, var)?;
					self.info.add_attribute(name.as_str(), ty, array_size);
					if self.info.attribute_slots() > limits.max_attribute_slots {
						return Err(member.span.error(format!(
							"attributes use more than {} slots",
							limits.max_attribute_slots
						)) + member.span.marker());
					}
				},
				GlobalKind::Output => {
					var.binding = Some(self.info.outputs.len() as u32);
					self.declare_global(kind, var)?;
					self.info.add_output(name.as_str(), ty);
					if self.info.outputs.len() as u32 > limits.max_outputs {
						return Err(member.span.error(format!("more than {} outputs", limits.max_outputs))
							+ member.span.marker());
					}
				},
				_ => {
					let location = self.internal_slots;
					var.binding = Some(location);
					self.declare_global(kind, var)?;
					self.internal_slots += ty.binding_slot_count(array_size);
					if self.internal_slots > limits.max_internal_slots {
						return Err(member.span.error(format!(
							"locals use more than {} slots",
							limits.max_internal_slots
						)) + member.span.marker());
					}
					self.internals.push(Internal {
						name: name.clone(),
						ty,
						array_size,
						location,
						flat: member.flat || ty.is_integer(),
					});
				},
			}
			debug!("declared {} `{}`: {}", keyword, name, ty);
		}

		Ok(())
	}

	fn uniform(&mut self, uniform: &ast::Uniform, span: Span) -> Result<(), Diagnostic> {
		let binding = self.const_uint(&uniform.binding, "uniform binding")?;
		if let Some(&previous) = self.bindings.get(&binding) {
			return Err(uniform
				.binding
				.span
				.error(format!("binding {} is already in use", binding))
				+ uniform.binding.span.marker()
				+ previous.label("first used here"));
		}
		self.bindings.insert(binding, span);

		match &uniform.kind {
			ast::UniformKind::Handle(member) => {
				let ty = self.resolve_type(&member.ty)?;
				let (format, subpass_index) = match member.ty.arg {
					None => (None, None),
					Some(TypeArg::Ident(ident)) if ty.is_image() => {
						let format = self.formats.get(ident.name).ok_or_else(|| {
							ident.span.error(format!("unknown image format `{}`", self.intern.resolve(ident.name)))
								+ ident.span.marker()
						})?;
						(Some(format), None)
					},
					Some(TypeArg::Int(value, span)) if ty.is_subpass_input() => {
						let (index, _) = parse_int(self.intern.resolve(value), false, span)?;
						(None, Some(index as u32))
					},
					Some(_) => {
						return Err(member.ty.span.error(format!("type `{}` does not take this qualifier", ty))
							+ member.ty.span.marker())
					},
				};
				let array_size = self.array_size(&member.array)?;
				self.verify_ident(member.name)?;

				let mut var =
					Variable::new(member.name.name, member.name.span, ty, VarScope::Uniform).with_array(array_size);
				var.flat = member.flat;
				var.format = format;
				var.subpass_index = subpass_index;
				var.binding = Some(binding);
				self.declare_global(GlobalKind::HandleUniform, var)?;

				if ty.is_subpass_input() {
					self.subpass_inputs += 1;
					if self.subpass_inputs > self.options.limits.max_subpass_inputs {
						return Err(member.span.error(format!(
							"more than {} subpass inputs",
							self.options.limits.max_subpass_inputs
						)) + member.span.marker());
					}
				}

				let name = self.intern.resolve(member.name.name).to_string();
				debug!("declared uniform `{}`: {} at binding {}", name, ty, binding);
				self.info.add_handle(name, ty, binding, format, subpass_index);
			},
			ast::UniformKind::Block(members) => {
				if members.is_empty() {
					return Err(span.error("uniform block cannot be empty") + span.marker());
				}

				let block = self.info.begin_block(binding);
				for member in members.iter() {
					let ty = self.plain_type(&member.ty)?;
					let array_size = self.array_size(&member.array)?;
					self.verify_ident(member.name)?;

					let mut var = Variable::new(member.name.name, member.name.span, ty, VarScope::Uniform)
						.with_array(array_size);
					var.flat = member.flat;
					var.binding = Some(binding);
					self.declare_global(GlobalKind::BlockUniform, var)?;

					let name = self.intern.resolve(member.name.name).to_string();
					let offset = self.info.add_block_member(block, name.as_str(), ty, array_size, None);
					debug!("declared uniform `{}`: {} at binding {} offset {}", name, ty, binding, offset);
				}
			},
		}

		if self.info.uniforms.len() as u32 > self.options.limits.max_uniforms {
			return Err(span.error(format!("more than {} uniforms", self.options.limits.max_uniforms)) + span.marker());
		}
		Ok(())
	}

	fn constant(&mut self, constant: &ast::ConstDecl, span: Span) -> Result<(), Diagnostic> {
		let ty = self.plain_type(&constant.ty)?;
		if let Some(extra) = constant.array.first() {
			return Err(extra.span.error("constant arrays are not supported") + extra.span.marker());
		}
		self.verify_ident(constant.name)?;

		let spec_index = match &constant.spec {
			Some(index) => {
				let value = self.const_uint(index, "specialization constant index")?;
				if let Some(&previous) = self.spec_indices.get(&value) {
					return Err(index
						.span
						.error(format!("specialization constant index {} is already in use", value))
						+ index.span.marker()
						+ previous.label("first used here"));
				}
				self.spec_indices.insert(value, span);
				Some(value)
			},
			None => None,
		};

		self.context = Context::Constant;
		let value = self.lazily(|this| this.expr(&constant.val));
		self.context = Context::Global;
		let value = value?;

		if value.array_size > 0 || !value.ty.can_implicit_cast(ty) {
			return Err(constant
				.val
				.span
				.error(format!("cannot initialize `{}` with `{}`", ty, value.ty))
				+ constant.val.span.marker());
		}
		if spec_index.is_some() && (!value.literal || value.ty != ty) {
			return Err(constant
				.val
				.span
				.error(format!("specialization constants must be initialized with a `{}` literal", ty))
				+ constant.val.span.marker());
		}

		let mut var = Variable::new(constant.name.name, constant.name.span, ty, VarScope::Constant);
		var.spec_index = spec_index;
		self.declare_global(GlobalKind::Constant, var)?;

		let name = self.intern.resolve(constant.name.name).to_string();
		let init = self.cast_text(&value, ty);
		match spec_index {
			Some(index) => {
				self.declarations.push(format!(
					"layout(constant_id = {}) const {} = {};",
					index,
					declarator(ty, &name, 0),
					init
				));
				self.info.add_spec_constant(name.as_str(), ty, index);
			},
			None => self
				.declarations
				.push(format!("const {} = {};", declarator(ty, &name, 0), init)),
		}
		debug!("declared constant `{}`: {}", name, ty);

		Ok(())
	}

	fn function(&mut self, f: &ast::Fn) -> Result<(), Diagnostic> {
		let ret = self.resolve_type(&f.ret)?;
		self.no_qualifier(&f.ret, ret)?;
		if ret.is_handle_type() {
			return Err(f.ret.span.error("functions cannot return handle types") + f.ret.span.marker());
		}
		self.verify_ident(f.name)?;

		let mut params = Vec::with_capacity(f.params.len());
		for param in f.params.iter() {
			let ty = self.resolve_type(&param.ty)?;
			self.no_qualifier(&param.ty, ty)?;
			if ty.is_handle_type() {
				return Err(param.ty.span.error("handle types cannot be passed as parameters") + param.ty.span.marker());
			}
			let array_size = self.array_size(&param.array)?;
			self.verify_ident(param.name)?;

			let mut var = Variable::new(param.name.name, param.name.span, ty, VarScope::Argument).with_array(array_size);
			var.access = match param.mode {
				ast::ParamMode::Out => Access::Write,
				_ => Access::ReadWrite,
			};
			params.push((param.mode, var));
		}

		let sig = FunctionSig {
			name: f.name.name,
			span: f.name.span,
			ret,
			params: params.clone(),
		};
		self.scopes
			.declare_function(sig)
			.map_err(|e| e.to_diagnostic(f.name.span, self.intern))?;

		self.context = Context::Function { name: f.name.name, ret };
		self.out = CodeWriter::new();
		self.scopes.push_scope();
		for &(_, var) in params.iter() {
			self.scopes
				.declare_param(var)
				.map_err(|e| e.to_diagnostic(var.span, self.intern))?;
		}
		self.stmts(&f.block.stmts)?;
		self.scopes.pop_scope();
		self.context = Context::Global;

		let body = std::mem::take(&mut self.out).finish();
		let params: Vec<_> = params
			.iter()
			.map(|(mode, var)| {
				let mode = match mode {
					ast::ParamMode::In => "",
					ast::ParamMode::Out => "out ",
					ast::ParamMode::InOut => "inout ",
				};
				format!(
					"{}{}",
					mode,
					declarator(var.ty, self.intern.resolve(var.name), var.array_size)
				)
			})
			.collect();

		let name = self.intern.resolve(f.name.name);
		let mut w = CodeWriter::new();
		w.line(format!("{} {}({}) {{", ret.glsl_name(), name, params.join(", ")));
		w.indent();
		w.append(&body);
		w.dedent();
		w.line("}");
		debug!("checked function `{}`", name);
		self.functions.push(w.finish());

		Ok(())
	}

	fn stage(&mut self, stage: &StageFn) -> Result<String, Diagnostic> {
		self.context = Context::Stage(stage.kind);
		self.out = CodeWriter::new();
		self.scopes.push_scope();
		self.scopes.add_stage_builtins(stage.kind, self.intern, stage.keyword);
		self.stmts(&stage.block.stmts)?;
		self.scopes.pop_scope();
		self.context = Context::Global;

		self.info.add_stage(stage.kind);
		debug!("checked {} stage", stage_name(stage.kind));
		Ok(std::mem::take(&mut self.out).finish())
	}

	fn declare_global(&mut self, kind: GlobalKind, var: Variable) -> Result<Variable, Diagnostic> {
		self.scopes
			.declare_global(kind, var)
			.map_err(|e: ScopeError| e.to_diagnostic(var.span, self.intern))
	}

	fn resolve_type(&self, ty: &TypeRef) -> Result<ShaderType, Diagnostic> {
		match self.types.get(ty.name.name) {
			Some(t) if t != ShaderType::Error => Ok(t),
			_ => Err(ty
				.name
				.span
				.error(format!("unknown type `{}`", self.intern.resolve(ty.name.name)))
				+ ty.name.span.marker()),
		}
	}

	fn no_qualifier(&self, ty: &TypeRef, resolved: ShaderType) -> Result<(), Diagnostic> {
		match ty.arg {
			Some(_) => Err(ty.span.error(format!("type `{}` does not take a qualifier", resolved)) + ty.span.marker()),
			None => Ok(()),
		}
	}

	/// A type without qualifier that storage can be declared with.
	fn plain_type(&self, ty: &TypeRef) -> Result<ShaderType, Diagnostic> {
		let resolved = self.resolve_type(ty)?;
		self.no_qualifier(ty, resolved)?;
		if resolved == ShaderType::Void {
			return Err(ty.span.error("`void` is only allowed as a return type") + ty.span.marker());
		}
		Ok(resolved)
	}

	fn array_size(&mut self, array: &[Expr]) -> Result<u32, Diagnostic> {
		match array {
			[] => Ok(0),
			[size] => {
				let value = self.const_uint(size, "array size")?;
				if value == 0 {
					return Err(size.span.error("array size must be positive") + size.span.marker());
				}
				Ok(value)
			},
			[_, extra, ..] => {
				Err(extra.span.error("multi-dimensional arrays are not supported") + extra.span.marker())
			},
		}
	}

	/// An integer literal used where a compile time count or index is required.
	fn const_uint(&self, expr: &Expr, what: &str) -> Result<u32, Diagnostic> {
		match &expr.kind {
			ExprKind::Literal(Literal::Int(text)) => {
				let (value, _) = parse_int(self.intern.resolve(*text), false, expr.span)?;
				Ok(value as u32)
			},
			ExprKind::Unary(UnaryOp::Minus, inner) if matches!(inner.kind, ExprKind::Literal(Literal::Int(_))) => {
				Err(expr.span.error(format!("{} must not be negative", what)) + expr.span.marker())
			},
			_ => Err(expr.span.error(format!("{} must be an integer literal", what)) + expr.span.marker()),
		}
	}

	fn verify_ident(&self, ident: Ident) -> Result<(), Diagnostic> {
		let text = self.intern.resolve(ident.name);
		let error = |message: String| Err(ident.span.error(message) + ident.span.marker());

		if text.len() > MAX_IDENT_LEN {
			return error(format!("`{}` is longer than {} bytes", text, MAX_IDENT_LEN));
		}
		if text.starts_with('$') {
			return error(format!("`{}`: `$` is reserved for builtin variables", text));
		}
		if text.starts_with('_') || text.starts_with("gl_") {
			return error(format!("`{}`: names starting with `_` or `gl_` are reserved", text));
		}
		if let Some(m) = self.reserved.find(text) {
			if m.end() == text.len() {
				return error(format!("`{}` is a reserved identifier", text));
			}
		}
		Ok(())
	}
}

fn stage_name(stage: StageKind) -> &'static str {
	match stage {
		StageKind::Vertex => "vertex",
		StageKind::TessControl => "tessellation control",
		StageKind::TessEval => "tessellation evaluation",
		StageKind::Geometry => "geometry",
		StageKind::Fragment => "fragment",
	}
}

/// Parses an integer literal, returning its magnitude and whether it is unsigned.
pub fn parse_int(text: &str, negative: bool, span: Span) -> Result<(u64, bool), Diagnostic> {
	let unsigned = text.ends_with(['u', 'U']);
	let digits = text.trim_end_matches(['u', 'U']);
	let value = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
		Some(hex) => u64::from_str_radix(hex, 16),
		None => digits.parse::<u64>(),
	}
	.map_err(|_| span.error(format!("malformed integer literal `{}`", text)) + span.marker())?;

	let max = if unsigned {
		u32::MAX as u64
	} else if negative {
		i32::MAX as u64 + 1
	} else {
		i32::MAX as u64
	};
	if value > max {
		return Err(span.error(format!(
			"integer literal `{}{}` does not fit in `{}`",
			if negative { "-" } else { "" },
			text,
			if unsigned { "uint" } else { "int" }
		)) + span.marker());
	}

	Ok((value, unsigned))
}

/// The value of an integer literal expression, if it is one.
fn literal_int(expr: &Expr, intern: &Interner) -> Option<i64> {
	match &expr.kind {
		ExprKind::Literal(Literal::Int(text)) => parse_int(intern.resolve(*text), false, expr.span)
			.ok()
			.map(|(value, _)| value as i64),
		ExprKind::Unary(UnaryOp::Minus, inner) => match &inner.kind {
			ExprKind::Literal(Literal::Int(text)) => parse_int(intern.resolve(*text), true, expr.span)
				.ok()
				.map(|(value, _)| -(value as i64)),
			_ => None,
		},
		_ => None,
	}
}
