use std::{
	fmt::{self, Display},
	ops::{Add, Range},
};

use crate::text::Text;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DiagnosticKind {
	Error,
	Warning,
}

/// The compiler stage a diagnostic originated from.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Phase {
	Parse,
	Check,
}

impl Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Phase::Parse => write!(f, "parse"),
			Phase::Check => write!(f, "check"),
		}
	}
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Diagnostic {
	pub kind: DiagnosticKind,
	pub phase: Phase,
	pub message: String,
	pub span: Span,
	pub labels: Vec<Label>,
	/// Grammar rules active where a parse failed, innermost last.
	pub rules: Vec<&'static str>,
}

impl Add<Label> for Diagnostic {
	type Output = Diagnostic;

	fn add(mut self, other: Label) -> Self::Output {
		self.labels.push(other);
		self
	}
}

impl Diagnostic {
	pub fn in_phase(mut self, phase: Phase) -> Self {
		self.phase = phase;
		self
	}
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
	pub message: String,
	pub span: Span,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Span {
	pub start: u32,
	pub end: u32,
	pub file: Text,
}

impl Add for Span {
	type Output = Span;

	fn add(self, other: Span) -> Self::Output {
		debug_assert_eq!(self.file, other.file);
		Span {
			start: self.start.min(other.start),
			end: self.end.max(other.end),
			file: self.file,
		}
	}
}

impl chumsky::Span for Span {
	type Context = Text;
	type Offset = u32;

	fn new(context: Self::Context, range: Range<Self::Offset>) -> Self {
		Self {
			start: range.start,
			end: range.end,
			file: context,
		}
	}

	fn context(&self) -> Self::Context { self.file }

	fn start(&self) -> Self::Offset { self.start }

	fn end(&self) -> Self::Offset { self.end }
}

impl Span {
	pub fn error(&self, message: impl Into<String>) -> Diagnostic {
		Diagnostic {
			kind: DiagnosticKind::Error,
			phase: Phase::Check,
			message: message.into(),
			span: *self,
			labels: Vec::new(),
			rules: Vec::new(),
		}
	}

	pub fn warning(&self, message: impl Into<String>) -> Diagnostic {
		Diagnostic {
			kind: DiagnosticKind::Warning,
			phase: Phase::Check,
			message: message.into(),
			span: *self,
			labels: Vec::new(),
			rules: Vec::new(),
		}
	}

	pub fn label(&self, message: impl Into<String>) -> Label {
		Label {
			message: message.into(),
			span: *self,
		}
	}

	pub fn marker(&self) -> Label {
		Label {
			message: String::new(),
			span: *self,
		}
	}
}

/// Collects warnings for a compilation, optionally forwarding each one to a callback as it arrives.
pub struct Diagnostics {
	diagnostics: Vec<Diagnostic>,
	had_error: bool,
	callback: Option<Box<dyn FnMut(&Diagnostic)>>,
}

impl Default for Diagnostics {
	fn default() -> Self { Self::new() }
}

impl Diagnostics {
	pub fn new() -> Self {
		Self {
			diagnostics: Vec::new(),
			had_error: false,
			callback: None,
		}
	}

	pub fn with_callback(callback: impl FnMut(&Diagnostic) + 'static) -> Self {
		Self {
			diagnostics: Vec::new(),
			had_error: false,
			callback: Some(Box::new(callback)),
		}
	}

	pub fn push(&mut self, diagnostic: Diagnostic) {
		if diagnostic.kind == DiagnosticKind::Error {
			self.had_error = true;
		}
		if let Some(callback) = self.callback.as_mut() {
			callback(&diagnostic);
		}
		self.diagnostics.push(diagnostic);
	}

	pub fn had_error(&self) -> bool { self.had_error }

	pub fn diags(&self) -> &[Diagnostic] { &self.diagnostics }

	pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
		self.diagnostics.iter().filter(|x| x.kind == DiagnosticKind::Warning)
	}
}

/// A source position: 1-based line, 0-based column.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Location {
	pub line: u32,
	pub column: u32,
}

impl Display for Location {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}:{}", self.line, self.column) }
}

/// Maps byte offsets in a source file to line and column numbers.
pub struct LineIndex {
	starts: Vec<u32>,
}

impl LineIndex {
	pub fn new(source: &str) -> Self {
		let mut starts = vec![0];
		starts.extend(
			source
				.char_indices()
				.filter(|&(_, c)| c == '\n')
				.map(|(i, _)| i as u32 + 1),
		);
		Self { starts }
	}

	pub fn locate(&self, offset: u32) -> Location {
		let line = match self.starts.binary_search(&offset) {
			Ok(line) => line,
			Err(next) => next - 1,
		};
		Location {
			line: line as u32 + 1,
			column: offset - self.starts[line],
		}
	}
}

/// A fatal diagnostic together with its resolved position in the source file.
#[derive(Clone, Debug)]
pub struct CompileError {
	pub file: String,
	pub location: Location,
	pub diagnostic: Diagnostic,
}

impl CompileError {
	pub fn new(file: &str, source: &str, diagnostic: Diagnostic) -> Self {
		Self {
			file: file.to_string(),
			location: LineIndex::new(source).locate(diagnostic.span.start),
			diagnostic,
		}
	}

	pub fn message(&self) -> &str { &self.diagnostic.message }

	pub fn phase(&self) -> Phase { self.diagnostic.phase }
}

impl Display for CompileError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(
			f,
			"{}:{}: {} error: {}",
			self.file, self.location, self.diagnostic.phase, self.diagnostic.message
		)?;
		if !self.diagnostic.rules.is_empty() {
			write!(f, " (in {})", self.diagnostic.rules.join(" > "))?;
		}
		Ok(())
	}
}

impl std::error::Error for CompileError {}
