use rustc_hash::FxHashMap;

use crate::{
	ast::{ParamMode, StageKind},
	check::{
		inbuilt::{builtin_variables, Access, BuiltinVariable},
		types::{ImageFormat, ShaderType},
	},
	diagnostic::{Diagnostic, Span},
	text::{Interner, Text},
};

/// The kinds of global declaration, each with its own type constraints.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum GlobalKind {
	Attribute,
	Output,
	Internal,
	HandleUniform,
	BlockUniform,
	Constant,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum VarScope {
	Uniform,
	Attribute,
	Output,
	Internal,
	Builtin,
	Argument,
	Local,
	Constant,
}

/// A named storage location.
#[derive(Copy, Clone, Debug)]
pub struct Variable {
	pub name: Text,
	pub span: Span,
	pub ty: ShaderType,
	/// Zero when the variable is not an array.
	pub array_size: u32,
	pub scope: VarScope,
	pub constant: bool,
	pub access: Access,
	pub format: Option<ImageFormat>,
	pub subpass_index: Option<u32>,
	pub spec_index: Option<u32>,
	/// Binding of a uniform, location of an attribute, output or internal.
	pub binding: Option<u32>,
	pub flat: bool,
	pub builtin: Option<&'static BuiltinVariable>,
}

impl Variable {
	pub fn new(name: Text, span: Span, ty: ShaderType, scope: VarScope) -> Self {
		Self {
			name,
			span,
			ty,
			array_size: 0,
			scope,
			constant: matches!(scope, VarScope::Uniform | VarScope::Attribute | VarScope::Constant),
			access: match scope {
				VarScope::Uniform | VarScope::Attribute | VarScope::Constant => Access::Read,
				_ => Access::ReadWrite,
			},
			format: None,
			subpass_index: None,
			spec_index: None,
			binding: None,
			flat: false,
			builtin: None,
		}
	}

	pub fn with_array(mut self, array_size: u32) -> Self {
		self.array_size = array_size;
		self
	}

	/// The name this variable has in emitted code.
	pub fn emit_name<'a>(&self, intern: &'a Interner) -> &'a str {
		match self.builtin {
			Some(builtin) => builtin.glsl,
			None => intern.resolve(self.name),
		}
	}
}

/// The signature of a standard function.
#[derive(Clone, Debug)]
pub struct FunctionSig {
	pub name: Text,
	pub span: Span,
	pub ret: ShaderType,
	pub params: Vec<(ParamMode, Variable)>,
}

impl FunctionSig {
	/// Calls to functions without `out` or `inout` parameters have no side effects on their arguments.
	pub fn is_pure(&self) -> bool { self.params.iter().all(|(mode, _)| *mode == ParamMode::In) }
}

#[derive(Clone, Debug)]
pub enum ScopeError {
	DuplicateName { name: Text, previous: Span },
	DuplicateParam { name: Text, previous: Span },
	VoidParam { name: Text },
	InvalidType { name: Text, reason: &'static str },
	InvalidQualifier { name: Text, reason: &'static str },
}

impl ScopeError {
	pub fn to_diagnostic(&self, span: Span, intern: &Interner) -> Diagnostic {
		match *self {
			ScopeError::DuplicateName { name, previous } => {
				span.error(format!("`{}` is already declared", intern.resolve(name)))
					+ span.marker()
					+ previous.label("previously declared here")
			},
			ScopeError::DuplicateParam { name, previous } => {
				span.error(format!("duplicate parameter `{}`", intern.resolve(name)))
					+ span.marker()
					+ previous.label("previously declared here")
			},
			ScopeError::VoidParam { name } => {
				span.error(format!("parameter `{}` cannot have type `void`", intern.resolve(name))) + span.marker()
			},
			ScopeError::InvalidType { name, reason } => {
				span.error(format!("invalid type for `{}`: {}", intern.resolve(name), reason)) + span.marker()
			},
			ScopeError::InvalidQualifier { name, reason } => {
				span.error(format!("invalid qualifier for `{}`: {}", intern.resolve(name), reason)) + span.marker()
			},
		}
	}
}

#[derive(Default)]
struct Frame {
	builtins: FxHashMap<Text, Variable>,
	locals: FxHashMap<Text, Variable>,
	params: FxHashMap<Text, Variable>,
}

impl Frame {
	fn get(&self, name: Text) -> Option<Variable> {
		self.builtins
			.get(&name)
			.or_else(|| self.locals.get(&name))
			.or_else(|| self.params.get(&name))
			.copied()
	}
}

/// Tracks every name visible at a point of the program.
///
/// Globals of all kinds share one namespace, functions live in a second one that may not reuse a global name. Local
/// frames stack on top of the globals, and no name may be declared twice anywhere in the visible chain.
pub struct ScopeManager {
	globals: FxHashMap<Text, Variable>,
	functions: FxHashMap<Text, FunctionSig>,
	frames: Vec<Frame>,
	temps: u32,
}

impl Default for ScopeManager {
	fn default() -> Self { Self::new() }
}

impl ScopeManager {
	pub fn new() -> Self {
		Self {
			globals: FxHashMap::default(),
			functions: FxHashMap::default(),
			frames: Vec::new(),
			temps: 0,
		}
	}

	pub fn declare_global(&mut self, kind: GlobalKind, var: Variable) -> Result<Variable, ScopeError> {
		Self::validate_global(kind, &var)?;
		if let Some(previous) = self.globals.get(&var.name) {
			return Err(ScopeError::DuplicateName {
				name: var.name,
				previous: previous.span,
			});
		}

		self.globals.insert(var.name, var);
		Ok(var)
	}

	fn validate_global(kind: GlobalKind, var: &Variable) -> Result<(), ScopeError> {
		let name = var.name;
		let invalid = |reason| Err(ScopeError::InvalidType { name, reason });
		let qualifier = |reason| Err(ScopeError::InvalidQualifier { name, reason });

		if !var.ty.is_value_type() && !var.ty.is_handle_type() {
			return invalid("only value and handle types can be declared");
		}
		if var.flat && kind != GlobalKind::Internal {
			return qualifier("only `@locals` members can be `flat`");
		}

		match kind {
			GlobalKind::Attribute | GlobalKind::Output | GlobalKind::Internal => {
				if var.ty.is_handle_type() {
					return invalid("handle types cannot be passed between stages");
				}
				if var.ty.component_type() == ShaderType::Bool {
					return invalid("boolean types cannot be passed between stages");
				}
				if kind == GlobalKind::Output {
					if var.array_size > 0 {
						return invalid("outputs cannot be arrays");
					}
					if var.ty.is_matrix() {
						return invalid("outputs cannot be matrices");
					}
				}
			},
			GlobalKind::HandleUniform => {
				if !var.ty.is_handle_type() {
					return invalid("value type uniforms must be declared in a uniform block");
				}
				if var.array_size > 0 {
					return invalid("arrays of handles are not supported");
				}
				if var.ty.is_image() && var.format.is_none() {
					return qualifier("storage images require a format qualifier");
				}
				if !var.ty.is_image() && var.format.is_some() {
					return qualifier("only storage images take a format qualifier");
				}
				if var.ty.is_subpass_input() && var.subpass_index.is_none() {
					return qualifier("subpass inputs require an index qualifier");
				}
				if !var.ty.is_subpass_input() && var.subpass_index.is_some() {
					return qualifier("only subpass inputs take an index qualifier");
				}
			},
			GlobalKind::BlockUniform => {
				if var.ty.is_handle_type() {
					return invalid("uniform blocks can only contain value types");
				}
			},
			GlobalKind::Constant => {
				if var.ty.is_handle_type() {
					return invalid("constants must have a value type");
				}
				if var.spec_index.is_some() && !var.ty.is_scalar() {
					return invalid("specialization constants must be scalars");
				}
			},
		}

		Ok(())
	}

	/// Functions share the emitted program's global scope, so a function may not reuse a global's name either.
	pub fn declare_function(&mut self, sig: FunctionSig) -> Result<(), ScopeError> {
		let previous = self
			.functions
			.get(&sig.name)
			.map(|x| x.span)
			.or_else(|| self.globals.get(&sig.name).map(|x| x.span));
		if let Some(previous) = previous {
			return Err(ScopeError::DuplicateName {
				name: sig.name,
				previous,
			});
		}

		let mut seen: FxHashMap<Text, Span> = FxHashMap::default();
		for (_, param) in sig.params.iter() {
			if param.ty == ShaderType::Void {
				return Err(ScopeError::VoidParam { name: param.name });
			}
			if let Some(&previous) = seen.get(&param.name) {
				return Err(ScopeError::DuplicateParam {
					name: param.name,
					previous,
				});
			}
			seen.insert(param.name, param.span);
		}

		self.functions.insert(sig.name, sig);
		Ok(())
	}

	pub fn function(&self, name: Text) -> Option<&FunctionSig> { self.functions.get(&name) }

	pub fn push_scope(&mut self) { self.frames.push(Frame::default()); }

	pub fn pop_scope(&mut self) { self.frames.pop().expect("no scope to pop"); }

	pub fn declare_local(&mut self, var: Variable) -> Result<Variable, ScopeError> {
		if let Some(previous) = self.resolve(var.name) {
			return Err(ScopeError::DuplicateName {
				name: var.name,
				previous: previous.span,
			});
		}

		let frame = self.frames.last_mut().expect("no scope");
		frame.locals.insert(var.name, var);
		Ok(var)
	}

	pub fn declare_param(&mut self, var: Variable) -> Result<Variable, ScopeError> {
		if let Some(previous) = self.resolve(var.name) {
			return Err(ScopeError::DuplicateName {
				name: var.name,
				previous: previous.span,
			});
		}

		let frame = self.frames.last_mut().expect("no scope");
		frame.params.insert(var.name, var);
		Ok(var)
	}

	/// Allocates a uniquely named local. Temporary names are never reused within a compilation.
	pub fn new_temporary(&mut self, intern: &mut Interner, ty: ShaderType, array_size: u32, span: Span) -> Variable {
		let name = intern.get(&format!("_t{}", self.temps));
		self.temps += 1;

		let var = Variable::new(name, span, ty, VarScope::Local).with_array(array_size);
		let frame = self.frames.last_mut().expect("no scope");
		frame.locals.insert(name, var);
		var
	}

	pub fn temporaries(&self) -> u32 { self.temps }

	pub fn add_stage_builtins(&mut self, stage: StageKind, intern: &mut Interner, span: Span) {
		let frame = self.frames.last_mut().expect("no scope");
		for builtin in builtin_variables(stage) {
			let name = intern.get_static(builtin.name);
			let mut var = Variable::new(name, span, builtin.ty, VarScope::Builtin);
			var.access = builtin.access;
			var.builtin = Some(builtin);
			frame.builtins.insert(name, var);
		}
	}

	pub fn resolve(&self, name: Text) -> Option<Variable> {
		self.frames
			.iter()
			.rev()
			.find_map(|frame| frame.get(name))
			.or_else(|| self.globals.get(&name).copied())
	}
}
