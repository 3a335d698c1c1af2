use chumsky::{error::SimpleReason, prelude::*, Stream};
use log::debug;

use crate::{
	ast::*,
	diagnostic::{Diagnostic, Phase, Span},
	parse::lexer::Token,
	text::Interner,
};

pub mod lexer;

type ParseError = Simple<Token, Span>;

pub fn parse(intern: &mut Interner, source: &str, file: &str) -> Result<TranslationUnit, Diagnostic> {
	let file = intern.get(file);
	let tokens = lexer::lex(source, file, intern)?;
	debug!("lexed {} tokens", tokens.len());

	let len = source.len() as u32;
	let eoi = Span {
		start: len,
		end: len,
		file,
	};

	translation_unit()
		.parse(Stream::from_iter(eoi, tokens.into_iter()))
		.map_err(|errors| {
			let first = errors
				.into_iter()
				.min_by_key(|x| x.span().start)
				.expect("parser failed without an error");
			to_diagnostic(first)
		})
}

fn to_diagnostic(error: ParseError) -> Diagnostic {
	let span = error.span();
	let message = match error.reason() {
		SimpleReason::Unclosed { delimiter, .. } => format!("unclosed delimiter `{}`", delimiter),
		SimpleReason::Custom(message) => message.clone(),
		SimpleReason::Unexpected => {
			let found = match error.found() {
				Some(token) => format!("`{}`", token),
				None => "end of file".to_string(),
			};
			let mut expected: Vec<_> = error
				.expected()
				.map(|x| match x {
					Some(token) => format!("`{}`", token),
					None => "end of file".to_string(),
				})
				.collect();
			expected.sort();
			expected.dedup();

			if expected.is_empty() {
				format!("unexpected {}", found)
			} else {
				format!("unexpected {}, expected {}", found, expected.join(", "))
			}
		},
	};

	let mut diagnostic = span.error(message).in_phase(Phase::Parse) + span.marker();
	if let Some(label) = error.label() {
		diagnostic.rules.push(label);
	}
	diagnostic
}

fn unexpected(span: Span, token: Token) -> ParseError { Simple::expected_input_found(span, Vec::new(), Some(token)) }

fn ident() -> impl Parser<Token, Ident, Error = ParseError> + Clone {
	filter_map(|span, token| match token {
		Token::Ident(name) => Ok(Ident { name, span }),
		_ => Err(unexpected(span, token)),
	})
	.labelled("identifier")
}

fn type_ref() -> impl Parser<Token, TypeRef, Error = ParseError> + Clone {
	let arg = filter_map(|span, token| match token {
		Token::Ident(name) => Ok(TypeArg::Ident(Ident { name, span })),
		Token::Int(value) => Ok(TypeArg::Int(value, span)),
		_ => Err(unexpected(span, token)),
	});

	ident()
		.then(arg.delimited_by(just(Token::Lt), just(Token::Gt)).or_not())
		.map_with_span(|(name, arg), span| TypeRef { name, arg, span })
		.labelled("type")
}

fn array_suffix() -> impl Parser<Token, Vec<Expr>, Error = ParseError> + Clone {
	expr()
		.delimited_by(just(Token::LBracket), just(Token::RBracket))
		.repeated()
}

#[derive(Clone)]
enum Postfix {
	Index(Vec<Expr>),
	Member(Ident),
	Inc,
	Dec,
}

fn binary<'a>(
	operand: impl Parser<Token, Expr, Error = ParseError> + Clone + 'a,
	op: impl Parser<Token, BinaryOp, Error = ParseError> + Clone + 'a,
) -> BoxedParser<'a, Token, Expr, ParseError> {
	operand
		.clone()
		.then(op.then(operand).repeated())
		.foldl(|lhs, (op, rhs)| Expr {
			span: lhs.span + rhs.span,
			kind: ExprKind::Binary(BinaryExpr {
				lhs: Box::new(lhs),
				op,
				rhs: Box::new(rhs),
			}),
		})
		.boxed()
}

fn expr() -> impl Parser<Token, Expr, Error = ParseError> + Clone {
	recursive(|expr| {
		let literal = filter_map(|span, token| match token {
			Token::Int(x) => Ok(Literal::Int(x)),
			Token::Float(x) => Ok(Literal::Float(x)),
			Token::True => Ok(Literal::Bool(true)),
			Token::False => Ok(Literal::Bool(false)),
			_ => Err(unexpected(span, token)),
		})
		.map_with_span(|lit, span| Expr {
			kind: ExprKind::Literal(lit),
			span,
		});

		let call = ident()
			.then(
				expr.clone()
					.separated_by(just(Token::Comma))
					.delimited_by(just(Token::LParen), just(Token::RParen)),
			)
			.map_with_span(|(name, args), span| Expr {
				kind: ExprKind::Call(name, args),
				span,
			});

		let name = ident().map(|name| Expr {
			span: name.span,
			kind: ExprKind::Ident(name),
		});

		let parens = expr
			.clone()
			.delimited_by(just(Token::LParen), just(Token::RParen))
			.map_with_span(|inner: Expr, span| Expr { kind: inner.kind, span });

		let primary = choice((literal, call, name, parens)).labelled("expression");

		let postfix = primary
			.then(
				choice((
					expr.clone()
						.separated_by(just(Token::Comma))
						.at_least(1)
						.delimited_by(just(Token::LBracket), just(Token::RBracket))
						.map(Postfix::Index),
					just(Token::Dot).ignore_then(ident()).map(Postfix::Member),
					just(Token::PlusPlus).to(Postfix::Inc),
					just(Token::MinusMinus).to(Postfix::Dec),
				))
				.map_with_span(|op, span| (op, span))
				.repeated(),
			)
			.foldl(|base, (op, span)| {
				let span = base.span + span;
				let kind = match op {
					Postfix::Index(indices) => ExprKind::Index(Box::new(base), indices),
					Postfix::Member(member) => ExprKind::Member(Box::new(base), member),
					Postfix::Inc => ExprKind::Postfix(PostfixOp::Inc, Box::new(base)),
					Postfix::Dec => ExprKind::Postfix(PostfixOp::Dec, Box::new(base)),
				};
				Expr { kind, span }
			});

		let unary = choice((
			just(Token::Minus).to(UnaryOp::Minus),
			just(Token::Plus).to(UnaryOp::Plus),
			just(Token::Bang).to(UnaryOp::Not),
			just(Token::Tilde).to(UnaryOp::BitNot),
			just(Token::PlusPlus).to(UnaryOp::Inc),
			just(Token::MinusMinus).to(UnaryOp::Dec),
		))
		.map_with_span(|op, span| (op, span))
		.repeated()
		.then(postfix)
		.foldr(|(op, span), expr| Expr {
			span: span + expr.span,
			kind: ExprKind::Unary(op, Box::new(expr)),
		})
		.boxed();

		let product = binary(
			unary,
			choice((
				just(Token::Star).to(BinaryOp::Mul),
				just(Token::Slash).to(BinaryOp::Div),
				just(Token::Percent).to(BinaryOp::Mod),
			)),
		);
		let sum = binary(
			product,
			choice((
				just(Token::Plus).to(BinaryOp::Add),
				just(Token::Minus).to(BinaryOp::Sub),
			)),
		);
		let shift = binary(
			sum,
			choice((just(Token::Shl).to(BinaryOp::Shl), just(Token::Shr).to(BinaryOp::Shr))),
		);
		let relational = binary(
			shift,
			choice((
				just(Token::Le).to(BinaryOp::Le),
				just(Token::Ge).to(BinaryOp::Ge),
				just(Token::Lt).to(BinaryOp::Lt),
				just(Token::Gt).to(BinaryOp::Gt),
			)),
		);
		let equality = binary(
			relational,
			choice((
				just(Token::EqEq).to(BinaryOp::Eq),
				just(Token::NotEq).to(BinaryOp::Ne),
			)),
		);
		let bit_and = binary(equality, just(Token::Amp).to(BinaryOp::BitAnd));
		let bit_xor = binary(bit_and, just(Token::Caret).to(BinaryOp::BitXor));
		let bit_or = binary(bit_xor, just(Token::Pipe).to(BinaryOp::BitOr));
		let and = binary(bit_or, just(Token::AmpAmp).to(BinaryOp::And));
		let xor = binary(and, just(Token::CaretCaret).to(BinaryOp::Xor));
		let or = binary(xor, just(Token::PipePipe).to(BinaryOp::Or));

		or.then(
			just(Token::Question)
				.ignore_then(expr.clone())
				.then_ignore(just(Token::Colon))
				.then(expr)
				.or_not(),
		)
		.map(|(cond, branches)| match branches {
			Some((a, b)) => Expr {
				span: cond.span + b.span,
				kind: ExprKind::Ternary(Box::new(cond), Box::new(a), Box::new(b)),
			},
			None => cond,
		})
	})
}

fn block() -> impl Parser<Token, Block, Error = ParseError> + Clone {
	recursive(|block| {
		let var_decl = just(Token::Const)
			.or_not()
			.then(type_ref())
			.then(ident())
			.then(array_suffix())
			.then(just(Token::Assign).ignore_then(expr()).or_not())
			.map(|((((constant, ty), name), array), val)| {
				StmtKind::VarDecl(VarDecl {
					constant: constant.is_some(),
					ty,
					name,
					array,
					val,
				})
			});

		let assign_op = choice((
			just(Token::Assign).to(AssignOp::Assign),
			just(Token::AddAssign).to(AssignOp::Add),
			just(Token::SubAssign).to(AssignOp::Sub),
			just(Token::MulAssign).to(AssignOp::Mul),
			just(Token::DivAssign).to(AssignOp::Div),
			just(Token::ModAssign).to(AssignOp::Mod),
			just(Token::AndAssign).to(AssignOp::BitAnd),
			just(Token::OrAssign).to(AssignOp::BitOr),
			just(Token::XorAssign).to(AssignOp::BitXor),
			just(Token::ShlAssign).to(AssignOp::Shl),
			just(Token::ShrAssign).to(AssignOp::Shr),
		));
		let assign = expr()
			.then(assign_op)
			.then(expr())
			.map(|((lhs, op), rhs)| StmtKind::Assign(Assign { lhs, op, rhs }));

		let simple = var_decl
			.or(assign)
			.or(expr().map(StmtKind::Expr))
			.map_with_span(|kind, span| Stmt { kind, span })
			.boxed();

		let cond = expr().delimited_by(just(Token::LParen), just(Token::RParen));

		let if_ = just(Token::If)
			.ignore_then(cond.clone())
			.then(block.clone())
			.then(
				just(Token::Elif)
					.ignore_then(cond.clone())
					.then(block.clone())
					.repeated(),
			)
			.then(just(Token::Else).ignore_then(block.clone()).or_not())
			.map(|(((cond, block), elifs), else_)| {
				StmtKind::If(If {
					cond,
					block,
					elifs,
					else_,
				})
			});

		let for_ = just(Token::For)
			.ignore_then(
				simple
					.clone()
					.or_not()
					.then_ignore(just(Token::Semicolon))
					.then(expr().or_not())
					.then_ignore(just(Token::Semicolon))
					.then(simple.clone().or_not())
					.delimited_by(just(Token::LParen), just(Token::RParen)),
			)
			.then(block.clone())
			.map(|(((init, cond), update), block)| {
				StmtKind::For(For {
					init: init.map(Box::new),
					cond,
					update: update.map(Box::new),
					block,
				})
			});

		let while_ = just(Token::While)
			.ignore_then(cond.clone())
			.then(block.clone())
			.map(|(cond, block)| StmtKind::While(While { cond, block }));

		let do_while = just(Token::Do)
			.ignore_then(block.clone())
			.then_ignore(just(Token::While))
			.then(cond)
			.then_ignore(just(Token::Semicolon))
			.map(|(block, cond)| StmtKind::DoWhile(While { cond, block }));

		let return_ = just(Token::Return)
			.ignore_then(expr().or_not())
			.then_ignore(just(Token::Semicolon))
			.map(StmtKind::Return);

		let jump = choice((
			just(Token::Break).to(StmtKind::Break),
			just(Token::Continue).to(StmtKind::Continue),
			just(Token::Discard).to(StmtKind::Discard),
		))
		.then_ignore(just(Token::Semicolon));

		let compound = choice((
			if_,
			for_,
			while_,
			do_while,
			return_,
			jump,
			block.clone().map(StmtKind::Block),
		))
		.map_with_span(|kind, span| Stmt { kind, span });

		let stmt = compound
			.or(simple.then_ignore(just(Token::Semicolon)))
			.labelled("statement");

		stmt.repeated()
			.delimited_by(just(Token::LBrace), just(Token::RBrace))
			.map_with_span(|stmts, span| Block { stmts, span })
	})
}

fn translation_unit() -> impl Parser<Token, TranslationUnit, Error = ParseError> {
	let member = just(Token::Flat)
		.or_not()
		.then(type_ref())
		.then(ident())
		.then(array_suffix())
		.then_ignore(just(Token::Semicolon))
		.map_with_span(|(((flat, ty), name), array), span| Member {
			flat: flat.is_some(),
			ty,
			name,
			array,
			span,
		})
		.labelled("declaration");
	let members = member
		.clone()
		.repeated()
		.delimited_by(just(Token::LBrace), just(Token::RBrace));
	let qualifier = expr().delimited_by(just(Token::LParen), just(Token::RParen));

	let shader_name = just(Token::Shader)
		.ignore_then(
			filter_map(|span, token| match token {
				Token::Str(value) => Ok(StrLit { value, span }),
				_ => Err(unexpected(span, token)),
			})
			.or_not(),
		)
		.then_ignore(just(Token::Semicolon))
		.map(GlobalDeclKind::ShaderName);

	let decl_block = choice((
		just(Token::Attributes).to(BlockKind::Attributes),
		just(Token::Outputs).to(BlockKind::Outputs),
		just(Token::Locals).to(BlockKind::Locals),
	))
	.then(members.clone())
	.map(|(kind, members)| GlobalDeclKind::Block(DeclBlock { kind, members }));

	let uniform = just(Token::Uniform)
		.ignore_then(qualifier.clone())
		.then(member.map(UniformKind::Handle).or(members.map(UniformKind::Block)))
		.map(|(binding, kind)| GlobalDeclKind::Uniform(Uniform { binding, kind }));

	let constant = just(Token::Spec)
		.ignore_then(qualifier)
		.or_not()
		.then_ignore(just(Token::Const))
		.then(type_ref())
		.then(ident())
		.then(array_suffix())
		.then_ignore(just(Token::Assign))
		.then(expr())
		.then_ignore(just(Token::Semicolon))
		.map(|((((spec, ty), name), array), val)| {
			GlobalDeclKind::Const(ConstDecl {
				spec,
				ty,
				name,
				array,
				val,
			})
		});

	let param = choice((
		just(Token::In).to(ParamMode::In),
		just(Token::Out).to(ParamMode::Out),
		just(Token::InOut).to(ParamMode::InOut),
	))
	.or_not()
	.then(type_ref())
	.then(ident())
	.then(array_suffix())
	.map_with_span(|(((mode, ty), name), array), span| Param {
		mode: mode.unwrap_or(ParamMode::In),
		ty,
		name,
		array,
		span,
	});

	let function = type_ref()
		.then(ident())
		.then(
			param
				.separated_by(just(Token::Comma))
				.delimited_by(just(Token::LParen), just(Token::RParen)),
		)
		.then(block())
		.map(|(((ret, name), params), block)| {
			GlobalDeclKind::Fn(Fn {
				ret,
				name,
				params,
				block,
			})
		});

	let stage = choice((
		just(Token::Vert).to(StageKind::Vertex),
		just(Token::Tesc).to(StageKind::TessControl),
		just(Token::Tese).to(StageKind::TessEval),
		just(Token::Geom).to(StageKind::Geometry),
		just(Token::Frag).to(StageKind::Fragment),
	))
	.map_with_span(|kind, span| (kind, span))
	.then(block())
	.map(|((kind, keyword), block)| GlobalDeclKind::Stage(StageFn { kind, keyword, block }));

	choice((shader_name, decl_block, uniform, constant, function, stage))
		.map_with_span(|kind, span| GlobalDecl { kind, span })
		.repeated()
		.then_ignore(end())
		.map(|decls| TranslationUnit { decls })
}
