use syntax::ast::Expr;
use syntax::types::{promote, ArrayTypeInfo, BaseKind};

/// Maps a type name as written in source (`i64`, `f64`, `String`, `bool`, or
/// a struct name) to its `BaseKind`.
pub fn resolve_type_name(name: &str) -> BaseKind {
    return match name {
        "i64" | "i32" | "int" | "Integer" => BaseKind::Integer,
        "f64" | "f32" | "float" | "Float" => BaseKind::Float,
        "String" | "str" | "string" => BaseKind::String,
        "bool" | "Boolean" => BaseKind::Boolean,
        other => BaseKind::Struct(other.to_string()),
    };
}

/// Literal-shape type inference with no external scope: the base case used
/// by the struct analyzer for field defaults and const declarations, and
/// folded into the specializer's richer, scope-aware inference (spec.md
/// §4.3's literal/unary/binary/range/array/struct-literal rules).
pub fn literal_type(expr: &Expr) -> BaseKind {
    return match expr {
        Expr::IntegerLiteral { .. } => BaseKind::Integer,
        Expr::FloatLiteral { .. } => BaseKind::Float,
        Expr::StringLiteral { .. } => BaseKind::String,
        Expr::BooleanLiteral { .. } => BaseKind::Boolean,
        Expr::Unary { operand, .. } => literal_type(operand),
        Expr::Binary { op, left, right, .. } => {
            if op.is_boolean_result() {
                BaseKind::Boolean
            } else {
                promote(&literal_type(left), &literal_type(right))
            }
        }
        Expr::Range { .. } => BaseKind::Integer,
        Expr::ArrayLiteral { elements, .. } => {
            let element_type = elements.first().map(literal_type).unwrap_or(BaseKind::Unknown);
            BaseKind::Array(Box::new(ArrayTypeInfo::new(element_type)))
        }
        Expr::StructLiteral { name, .. } => BaseKind::Struct(name.clone()),
        _ => BaseKind::Unknown,
    };
}

/// A textual scan for `{self.field}` substrings inside a (still-quoted)
/// string literal: interpolated self-reads are never re-parsed as
/// expressions, just scanned for the exact `self.<ident>` shape (spec.md
/// §4.2).
pub fn self_fields_in_interpolation(text: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut rest = text;
    while let Some(brace_start) = rest.find('{') {
        let after_brace = &rest[brace_start + 1..];
        let Some(brace_end) = after_brace.find('}') else { break };
        let inner = &after_brace[..brace_end];
        if let Some(field) = inner.strip_prefix("self.") {
            fields.push(field.trim().to_string());
        }
        rest = &after_brace[brace_end + 1..];
    }
    return fields;
}
