/// A stable interval into one source file, shared by every parse-tree node.
///
/// `start`/`end` are token indices (not byte offsets) into the file's token
/// stream, matching the contract `spec.md` places on the parser: every node
/// exposes a `(start, stop)` pair usable as part of a symbol's interval key.
/// A zero-width span (`start == end`) points at a single token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// Hash of the source file this span lives in, see `Readable::hash`.
    pub file: u64,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(file: u64, start: usize, end: usize) -> Self {
        return Self { file, start, end };
    }

    /// Merges two spans from the same file into one spanning both.
    pub fn to(&self, other: &Span) -> Span {
        return Span::new(self.file, self.start, other.end);
    }
}

/// A single lexical token produced by the tokenizer.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Line, 1-indexed, for error printing.
    pub line: u32,
    /// Column, 0-indexed, for error printing.
    pub column: u32,
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: String, line: u32, column: u32, offset: usize) -> Self {
        return Self { kind, text, line, column, offset };
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,
    BooleanLiteral,
    Fn,
    Struct,
    Const,
    Return,
    Break,
    Continue,
    If,
    Else,
    For,
    While,
    Loop,
    In,
    Spawn,
    ParenOpen,
    ParenClose,
    BraceOpen,
    BraceClose,
    BracketOpen,
    BracketClose,
    Comma,
    Colon,
    Semicolon,
    Dot,
    DotDot,
    Arrow,
    Equals,
    ChanSend,
    ChanRecv,
    Operator,
    Eof,
}
