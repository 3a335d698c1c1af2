use std::fmt::Display;

use logos::{Lexer, Logos};

use crate::{
	diagnostic::{Diagnostic, Phase, Span},
	text::{Interner, Text},
};

#[derive(Logos, Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[logos(extras = Interner)]
pub enum Token {
	#[token("@shader")]
	Shader,
	#[token("@attributes")]
	Attributes,
	#[token("@outputs")]
	Outputs,
	#[token("@locals")]
	Locals,
	#[token("@uniform")]
	Uniform,
	#[token("@spec")]
	Spec,
	#[token("@vert")]
	Vert,
	#[token("@tesc")]
	Tesc,
	#[token("@tese")]
	Tese,
	#[token("@geom")]
	Geom,
	#[token("@frag")]
	Frag,

	#[token("const")]
	Const,
	#[token("flat")]
	Flat,
	#[token("in")]
	In,
	#[token("out")]
	Out,
	#[token("inout")]
	InOut,
	#[token("if")]
	If,
	#[token("elif")]
	Elif,
	#[token("else")]
	Else,
	#[token("for")]
	For,
	#[token("while")]
	While,
	#[token("do")]
	Do,
	#[token("return")]
	Return,
	#[token("break")]
	Break,
	#[token("continue")]
	Continue,
	#[token("discard")]
	Discard,
	#[token("true")]
	True,
	#[token("false")]
	False,

	#[regex(r"\$?[a-zA-Z_][a-zA-Z0-9_]*", intern)]
	Ident(Text),
	#[regex(r"0[xX][0-9a-fA-F]+[uU]?", intern)]
	#[regex(r"[0-9]+[uU]?", intern)]
	Int(Text),
	#[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", intern)]
	#[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", intern)]
	#[regex(r"[0-9]+[eE][+-]?[0-9]+", intern)]
	Float(Text),
	#[regex(r#""[^"\n]*""#, intern_str)]
	Str(Text),

	#[token("{")]
	LBrace,
	#[token("}")]
	RBrace,
	#[token("(")]
	LParen,
	#[token(")")]
	RParen,
	#[token("[")]
	LBracket,
	#[token("]")]
	RBracket,
	#[token(";")]
	Semicolon,
	#[token(",")]
	Comma,
	#[token(".")]
	Dot,
	#[token("?")]
	Question,
	#[token(":")]
	Colon,

	#[token("=")]
	Assign,
	#[token("+=")]
	AddAssign,
	#[token("-=")]
	SubAssign,
	#[token("*=")]
	MulAssign,
	#[token("/=")]
	DivAssign,
	#[token("%=")]
	ModAssign,
	#[token("&=")]
	AndAssign,
	#[token("|=")]
	OrAssign,
	#[token("^=")]
	XorAssign,
	#[token("<<=")]
	ShlAssign,
	#[token(">>=")]
	ShrAssign,

	#[token("+")]
	Plus,
	#[token("-")]
	Minus,
	#[token("*")]
	Star,
	#[token("/")]
	Slash,
	#[token("%")]
	Percent,
	#[token("++")]
	PlusPlus,
	#[token("--")]
	MinusMinus,
	#[token("!")]
	Bang,
	#[token("~")]
	Tilde,
	#[token("&")]
	Amp,
	#[token("|")]
	Pipe,
	#[token("^")]
	Caret,
	#[token("&&")]
	AmpAmp,
	#[token("||")]
	PipePipe,
	#[token("^^")]
	CaretCaret,
	#[token("<<")]
	Shl,
	#[token(">>")]
	Shr,
	#[token("<")]
	Lt,
	#[token(">")]
	Gt,
	#[token("<=")]
	Le,
	#[token(">=")]
	Ge,
	#[token("==")]
	EqEq,
	#[token("!=")]
	NotEq,

	#[error]
	#[regex(r"[ \t\r\n\f]+", logos::skip)]
	#[regex(r"//[^\n]*", logos::skip)]
	#[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
	Error,
}

fn intern(lex: &mut Lexer<Token>) -> Text {
	let slice = lex.slice();
	lex.extras.get(slice)
}

fn intern_str(lex: &mut Lexer<Token>) -> Text {
	let slice = lex.slice();
	lex.extras.get(&slice[1..slice.len() - 1])
}

impl Display for Token {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let s = match self {
			Token::Shader => "@shader",
			Token::Attributes => "@attributes",
			Token::Outputs => "@outputs",
			Token::Locals => "@locals",
			Token::Uniform => "@uniform",
			Token::Spec => "@spec",
			Token::Vert => "@vert",
			Token::Tesc => "@tesc",
			Token::Tese => "@tese",
			Token::Geom => "@geom",
			Token::Frag => "@frag",
			Token::Const => "const",
			Token::Flat => "flat",
			Token::In => "in",
			Token::Out => "out",
			Token::InOut => "inout",
			Token::If => "if",
			Token::Elif => "elif",
			Token::Else => "else",
			Token::For => "for",
			Token::While => "while",
			Token::Do => "do",
			Token::Return => "return",
			Token::Break => "break",
			Token::Continue => "continue",
			Token::Discard => "discard",
			Token::True => "true",
			Token::False => "false",
			Token::Ident(_) => "identifier",
			Token::Int(_) => "integer literal",
			Token::Float(_) => "float literal",
			Token::Str(_) => "string literal",
			Token::LBrace => "{",
			Token::RBrace => "}",
			Token::LParen => "(",
			Token::RParen => ")",
			Token::LBracket => "[",
			Token::RBracket => "]",
			Token::Semicolon => ";",
			Token::Comma => ",",
			Token::Dot => ".",
			Token::Question => "?",
			Token::Colon => ":",
			Token::Assign => "=",
			Token::AddAssign => "+=",
			Token::SubAssign => "-=",
			Token::MulAssign => "*=",
			Token::DivAssign => "/=",
			Token::ModAssign => "%=",
			Token::AndAssign => "&=",
			Token::OrAssign => "|=",
			Token::XorAssign => "^=",
			Token::ShlAssign => "<<=",
			Token::ShrAssign => ">>=",
			Token::Plus => "+",
			Token::Minus => "-",
			Token::Star => "*",
			Token::Slash => "/",
			Token::Percent => "%",
			Token::PlusPlus => "++",
			Token::MinusMinus => "--",
			Token::Bang => "!",
			Token::Tilde => "~",
			Token::Amp => "&",
			Token::Pipe => "|",
			Token::Caret => "^",
			Token::AmpAmp => "&&",
			Token::PipePipe => "||",
			Token::CaretCaret => "^^",
			Token::Shl => "<<",
			Token::Shr => ">>",
			Token::Lt => "<",
			Token::Gt => ">",
			Token::Le => "<=",
			Token::Ge => ">=",
			Token::EqEq => "==",
			Token::NotEq => "!=",
			Token::Error => "<error>",
		};
		write!(f, "{}", s)
	}
}

/// Splits `source` into tokens, stopping at the first character that starts no token.
pub fn lex(source: &str, file: Text, intern: &mut Interner) -> Result<Vec<(Token, Span)>, Diagnostic> {
	let mut lexer = Token::lexer_with_extras(source, std::mem::take(intern));
	let mut tokens = Vec::new();
	let mut error = None;

	while let Some(token) = lexer.next() {
		let range = lexer.span();
		let span = Span {
			start: range.start as u32,
			end: range.end as u32,
			file,
		};

		if let Token::Error = token {
			error = Some(
				span.error(format!("unexpected character `{}`", lexer.slice()))
					.in_phase(Phase::Parse)
					+ span.marker(),
			);
			break;
		}
		tokens.push((token, span));
	}

	*intern = lexer.extras;
	match error {
		Some(error) => Err(error),
		None => Ok(tokens),
	}
}
