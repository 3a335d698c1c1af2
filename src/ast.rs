use crate::{diagnostic::Span, text::Text};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Ident {
	pub name: Text,
	pub span: Span,
}

#[derive(Clone, Debug, Default)]
pub struct TranslationUnit {
	pub decls: Vec<GlobalDecl>,
}

#[derive(Clone, Debug)]
pub struct GlobalDecl {
	pub kind: GlobalDeclKind,
	pub span: Span,
}

#[derive(Clone, Debug)]
pub enum GlobalDeclKind {
	ShaderName(Option<StrLit>),
	Block(DeclBlock),
	Uniform(Uniform),
	Const(ConstDecl),
	Fn(Fn),
	Stage(StageFn),
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct StrLit {
	pub value: Text,
	pub span: Span,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BlockKind {
	Attributes,
	Outputs,
	Locals,
}

#[derive(Clone, Debug)]
pub struct DeclBlock {
	pub kind: BlockKind,
	pub members: Vec<Member>,
}

#[derive(Clone, Debug)]
pub struct Member {
	pub flat: bool,
	pub ty: TypeRef,
	pub name: Ident,
	pub array: Vec<Expr>,
	pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Uniform {
	pub binding: Expr,
	pub kind: UniformKind,
}

#[derive(Clone, Debug)]
pub enum UniformKind {
	Handle(Member),
	Block(Vec<Member>),
}

#[derive(Clone, Debug)]
pub struct ConstDecl {
	pub spec: Option<Expr>,
	pub ty: TypeRef,
	pub name: Ident,
	pub array: Vec<Expr>,
	pub val: Expr,
}

#[derive(Clone, Debug)]
pub struct TypeRef {
	pub name: Ident,
	pub arg: Option<TypeArg>,
	pub span: Span,
}

#[derive(Copy, Clone, Debug)]
pub enum TypeArg {
	Ident(Ident),
	Int(Text, Span),
}

#[derive(Clone, Debug)]
pub struct Fn {
	pub ret: TypeRef,
	pub name: Ident,
	pub params: Vec<Param>,
	pub block: Block,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ParamMode {
	In,
	Out,
	InOut,
}

#[derive(Clone, Debug)]
pub struct Param {
	pub mode: ParamMode,
	pub ty: TypeRef,
	pub name: Ident,
	pub array: Vec<Expr>,
	pub span: Span,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum StageKind {
	Vertex,
	TessControl,
	TessEval,
	Geometry,
	Fragment,
}

#[derive(Clone, Debug)]
pub struct StageFn {
	pub kind: StageKind,
	pub keyword: Span,
	pub block: Block,
}

#[derive(Clone, Debug)]
pub struct Block {
	pub stmts: Vec<Stmt>,
	pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Stmt {
	pub kind: StmtKind,
	pub span: Span,
}

#[derive(Clone, Debug)]
pub enum StmtKind {
	Block(Block),
	VarDecl(VarDecl),
	Assign(Assign),
	Expr(Expr),
	If(If),
	For(For),
	While(While),
	DoWhile(While),
	Return(Option<Expr>),
	Break,
	Continue,
	Discard,
}

#[derive(Clone, Debug)]
pub struct VarDecl {
	pub constant: bool,
	pub ty: TypeRef,
	pub name: Ident,
	pub array: Vec<Expr>,
	pub val: Option<Expr>,
}

#[derive(Clone, Debug)]
pub struct Assign {
	pub lhs: Expr,
	pub op: AssignOp,
	pub rhs: Expr,
}

#[derive(Clone, Debug)]
pub struct If {
	pub cond: Expr,
	pub block: Block,
	pub elifs: Vec<(Expr, Block)>,
	pub else_: Option<Block>,
}

#[derive(Clone, Debug)]
pub struct For {
	pub init: Option<Box<Stmt>>,
	pub cond: Option<Expr>,
	pub update: Option<Box<Stmt>>,
	pub block: Block,
}

#[derive(Clone, Debug)]
pub struct While {
	pub cond: Expr,
	pub block: Block,
}

#[derive(Clone, Debug)]
pub struct Expr {
	pub kind: ExprKind,
	pub span: Span,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
	Literal(Literal),
	Ident(Ident),
	Unary(UnaryOp, Box<Expr>),
	Postfix(PostfixOp, Box<Expr>),
	Binary(BinaryExpr),
	Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
	Call(Ident, Vec<Expr>),
	Index(Box<Expr>, Vec<Expr>),
	Member(Box<Expr>, Ident),
}

#[derive(Clone, Debug)]
pub struct BinaryExpr {
	pub lhs: Box<Expr>,
	pub op: BinaryOp,
	pub rhs: Box<Expr>,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Literal {
	Bool(bool),
	Int(Text),
	Float(Text),
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
	Plus,
	Minus,
	Not,
	BitNot,
	Inc,
	Dec,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PostfixOp {
	Inc,
	Dec,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
	Mul,
	Div,
	Mod,
	Add,
	Sub,
	Shl,
	Shr,
	Lt,
	Gt,
	Le,
	Ge,
	Eq,
	Ne,
	BitAnd,
	BitXor,
	BitOr,
	And,
	Xor,
	Or,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AssignOp {
	Assign,
	Add,
	Sub,
	Mul,
	Div,
	Mod,
	BitAnd,
	BitOr,
	BitXor,
	Shl,
	Shr,
}

impl AssignOp {
	/// The binary operator a compound assignment applies, if any.
	pub fn binary(self) -> Option<BinaryOp> {
		Some(match self {
			AssignOp::Assign => return None,
			AssignOp::Add => BinaryOp::Add,
			AssignOp::Sub => BinaryOp::Sub,
			AssignOp::Mul => BinaryOp::Mul,
			AssignOp::Div => BinaryOp::Div,
			AssignOp::Mod => BinaryOp::Mod,
			AssignOp::BitAnd => BinaryOp::BitAnd,
			AssignOp::BitOr => BinaryOp::BitOr,
			AssignOp::BitXor => BinaryOp::BitXor,
			AssignOp::Shl => BinaryOp::Shl,
			AssignOp::Shr => BinaryOp::Shr,
		})
	}
}

impl std::fmt::Display for BinaryOp {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let s = match self {
			BinaryOp::Mul => "*",
			BinaryOp::Div => "/",
			BinaryOp::Mod => "%",
			BinaryOp::Add => "+",
			BinaryOp::Sub => "-",
			BinaryOp::Shl => "<<",
			BinaryOp::Shr => ">>",
			BinaryOp::Lt => "<",
			BinaryOp::Gt => ">",
			BinaryOp::Le => "<=",
			BinaryOp::Ge => ">=",
			BinaryOp::Eq => "==",
			BinaryOp::Ne => "!=",
			BinaryOp::BitAnd => "&",
			BinaryOp::BitXor => "^",
			BinaryOp::BitOr => "|",
			BinaryOp::And => "&&",
			BinaryOp::Xor => "^^",
			BinaryOp::Or => "||",
		};
		write!(f, "{}", s)
	}
}

impl std::fmt::Display for UnaryOp {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let s = match self {
			UnaryOp::Plus => "+",
			UnaryOp::Minus => "-",
			UnaryOp::Not => "!",
			UnaryOp::BitNot => "~",
			UnaryOp::Inc => "++",
			UnaryOp::Dec => "--",
		};
		write!(f, "{}", s)
	}
}

impl std::fmt::Display for AssignOp {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self.binary() {
			Some(op) => write!(f, "{}=", op),
			None => write!(f, "="),
		}
	}
}
