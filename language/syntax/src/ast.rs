use data::tokens::Span;

/// The parse tree this crate assumes as input. `spec.md` treats the actual
/// lexer/parser grammar as an external, ANTLR-generated collaborator; these
/// types are the concrete shape `language/parser` produces and everything
/// downstream (`language/checker`) consumes. Every node carries its `Span`,
/// which doubles as the stable source interval used in symbol keys.
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub functions: Vec<FunctionDecl>,
    pub structs: Vec<StructDecl>,
    pub consts: Vec<ConstDecl>,
}

#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<FunctionDecl>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: String,
    /// Raw textual type annotation, e.g. `"i64"`, if one was written.
    pub type_annotation: Option<String>,
    pub default: Option<Expr>,
    pub is_const: bool,
    pub span: Span,
}

impl FieldDecl {
    /// A field whose name begins with `_` is private (spec.md §4.2).
    pub fn is_private(&self) -> bool {
        return self.name.starts_with('_');
    }
}

#[derive(Clone, Debug)]
pub struct ConstDecl {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Clone, Debug, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

/// The left-hand side of an `Stmt::Assign`. `SelfField` is the only
/// supported path beyond a bare name, matching the struct analyzer's
/// writes-self detection (spec.md §4.2): `self.f = …` is a field write,
/// never a fresh binding.
#[derive(Clone, Debug)]
pub enum AssignTarget {
    Name(String),
    SelfField(String),
}

#[derive(Clone, Debug)]
pub enum Stmt {
    /// A variable binding or reassignment: `name = value;`, or a struct
    /// field write `self.f = value;`. Whether a `Name` target is a first
    /// declaration, a same-type reassignment, or a type-changing shadow is
    /// decided later by the mutability/binding classifier (C5); the parse
    /// tree makes no distinction.
    Assign { target: AssignTarget, value: Expr, span: Span },
    /// `spawn callee(args)`.
    Spawn { callee: String, args: Vec<Expr>, span: Span },
    /// `channel <- value`.
    ChannelSend { channel: String, value: Expr, span: Span },
    If { condition: Expr, then_block: Block, else_block: Option<Block>, span: Span },
    /// `for binding in range { .. }`.
    ForRange { binding: String, range: Expr, body: Block, span: Span },
    While { condition: Expr, body: Block, span: Span },
    /// An unconditional `loop { .. }`.
    Loop { body: Block, span: Span },
    Return { value: Option<Expr>, span: Span },
    Break { span: Span },
    Continue { span: Span },
    /// An expression evaluated for its side effects, e.g. a bare call.
    Expression { value: Expr, span: Span },
}

impl Stmt {
    pub fn span(&self) -> Span {
        return match self {
            Stmt::Assign { span, .. }
            | Stmt::Spawn { span, .. }
            | Stmt::ChannelSend { span, .. }
            | Stmt::If { span, .. }
            | Stmt::ForRange { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Loop { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span }
            | Stmt::Expression { span, .. } => *span,
        };
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equals,
    NotEquals,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
    And,
    Or,
}

impl BinaryOp {
    /// Relational, equality, and logical operators always yield `Boolean`;
    /// arithmetic operators use the promotion rule instead (spec.md §4.3).
    pub fn is_boolean_result(&self) -> bool {
        return !matches!(self, BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide);
    }
}

#[derive(Clone, Debug)]
pub enum Expr {
    IntegerLiteral { value: i64, span: Span },
    FloatLiteral { value: f64, span: Span },
    /// Raw, still-quoted text; `{self.field}` substrings are scanned
    /// textually by the struct analyzer rather than re-parsed (spec.md §4.2).
    StringLiteral { text: String, span: Span },
    BooleanLiteral { value: bool, span: Span },
    SelfExpr { span: Span },
    Identifier { name: String, span: Span },
    Unary { op: UnaryOp, operand: Box<Expr>, span: Span },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr>, span: Span },
    /// A call whose callee is a bare identifier, e.g. `add(a, b)`.
    Call { callee: String, args: Vec<Expr>, span: Span },
    /// `receiver.method(args)`. `receiver` resolves to either a struct name
    /// (static method reference) or an instance variable (instance method).
    MethodCall { receiver: Box<Expr>, method: String, args: Vec<Expr>, span: Span },
    FieldAccess { receiver: Box<Expr>, field: String, span: Span },
    ArrayLiteral { elements: Vec<Expr>, span: Span },
    Index { array: Box<Expr>, index: Box<Expr>, span: Span },
    /// `start..end`, always yields `Integer` regardless of endpoints.
    Range { start: Box<Expr>, end: Box<Expr>, span: Span },
    StructLiteral { name: String, fields: Vec<(String, Expr)>, span: Span },
    /// `<- channel`.
    ChannelRecv { channel: String, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        return match self {
            Expr::IntegerLiteral { span, .. }
            | Expr::FloatLiteral { span, .. }
            | Expr::StringLiteral { span, .. }
            | Expr::BooleanLiteral { span, .. }
            | Expr::SelfExpr { span }
            | Expr::Identifier { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Call { span, .. }
            | Expr::MethodCall { span, .. }
            | Expr::FieldAccess { span, .. }
            | Expr::ArrayLiteral { span, .. }
            | Expr::Index { span, .. }
            | Expr::Range { span, .. }
            | Expr::StructLiteral { span, .. }
            | Expr::ChannelRecv { span, .. } => *span,
        };
    }
}
