use std::collections::HashMap;

use checker::CheckedProgram;
use syntax::ast::{AssignTarget, Block, Expr, FunctionDecl, Program, Stmt, StructDecl};
use syntax::atlas::MethodReceiver;
use syntax::symbol::ScopePath;
use syntax::types::BaseKind;

/// Turns a fully-resolved program into Rust source text. An external
/// collaborator per `spec.md` §6 ("The emitter is an external collaborator
/// and not specified here"); `RustEmitter` is the thin, string-construction
/// default needed to drive the CLI's `compile` verb end-to-end.
pub trait Emitter {
    fn emit(&self, program: &Program, checked: &CheckedProgram) -> String;
}

#[derive(Default)]
pub struct RustEmitter;

impl Emitter for RustEmitter {
    fn emit(&self, program: &Program, checked: &CheckedProgram) -> String {
        let functions_by_name: HashMap<&str, &FunctionDecl> = program.functions.iter().map(|f| (f.name.as_str(), f)).collect();
        let structs_by_name: HashMap<&str, &StructDecl> = program.structs.iter().map(|s| (s.name.as_str(), s)).collect();

        let mut out = String::new();
        emit_imports(&mut out, checked);
        emit_consts(&mut out, program, checked);
        emit_structs(&mut out, &structs_by_name, checked);
        emit_functions(&mut out, &functions_by_name, checked);
        emit_entry_point(&mut out, &functions_by_name, checked);
        return out;
    }
}

fn any_spawn_reached(checked: &CheckedProgram) -> bool {
    return checked.atlas.functions.values().any(|instance| instance.is_async);
}

/// Section 1: imports. An asynchronous runtime import appears iff any
/// `spawn` exists anywhere in the reachable program (spec.md §6).
fn emit_imports(out: &mut String, checked: &CheckedProgram) {
    if any_spawn_reached(checked) {
        out.push_str("use tokio::sync::mpsc;\n\n");
    }
}

/// Section 2: const declarations, UPPERCASE name with an explicit type.
fn emit_consts(out: &mut String, program: &Program, checked: &CheckedProgram) {
    let mut names: Vec<&String> = checked.atlas.consts.keys().collect();
    names.sort();
    for name in names {
        let Some(const_decl) = program.consts.iter().find(|c| &c.name == name) else { continue };
        let Some(instance) = checked.atlas.consts.get(name) else { continue };
        out.push_str(&format!(
            "const {}: {} = {};\n",
            name.to_uppercase(),
            instance.resolved_type.rust_type(),
            render_expr_bare(&const_decl.value, checked)
        ));
    }
    if !checked.atlas.consts.is_empty() {
        out.push('\n');
    }
}

/// Section 3: struct definitions with impl blocks. Only methods recorded in
/// `methodsUsed` are emitted (spec.md §3).
fn emit_structs(out: &mut String, structs_by_name: &HashMap<&str, &StructDecl>, checked: &CheckedProgram) {
    let mut names: Vec<&String> = checked.atlas.structs.keys().collect();
    names.sort();
    for name in names {
        let Some(instance) = checked.atlas.structs.get(name) else { continue };
        let Some(&struct_decl) = structs_by_name.get(name.as_str()) else { continue };

        out.push_str(&format!("pub struct {} {{\n", name));
        for field in &instance.fields {
            if field.is_const {
                continue;
            }
            out.push_str(&format!("    pub {}: {},\n", field.name, field_rust_type(field)));
        }
        out.push_str("}\n\n");

        out.push_str(&format!("impl {} {{\n", name));
        for field in &instance.fields {
            if !field.is_const {
                continue;
            }
            if let Some(default) = &field.default {
                out.push_str(&format!(
                    "    pub const {}: {} = {};\n",
                    field.name.to_uppercase(),
                    field_rust_type(field),
                    render_expr_bare(default, checked)
                ));
            }
        }
        for method in &instance.methods {
            if !instance.methods_used.contains(&method.name) {
                continue;
            }
            let Some(method_decl) = struct_decl.methods.iter().find(|m| m.name == method.name) else { continue };
            let receiver = match method.receiver {
                MethodReceiver::Static => "",
                MethodReceiver::SharedSelf => "&self",
                MethodReceiver::MutSelf => "&mut self",
            };
            let mut params = Vec::new();
            if !receiver.is_empty() {
                params.push(receiver.to_string());
            }
            for (param, param_type) in method_decl.params.iter().zip(method.param_types.iter()) {
                params.push(format!("{}: {}", param.name, param_type.rust_type()));
            }
            out.push_str(&format!("    pub fn {}({}) -> {} {{\n", method.name, params.join(", "), method.return_type.rust_type()));
            let scope = ScopePath::function(&format!("{}::{}", name, method.name));
            render_block(&method_decl.body, &scope, checked, out, 2);
            out.push_str("    }\n\n");
        }
        out.push_str("}\n\n");
    }
}

fn field_rust_type(field: &syntax::ast::FieldDecl) -> String {
    if let Some(annotation) = &field.type_annotation {
        return checker::infer::resolve_type_name(annotation).rust_type();
    }
    if let Some(default) = &field.default {
        return checker::infer::literal_type(default).rust_type();
    }
    return BaseKind::Unknown.rust_type();
}

/// Section 4: specialized function definitions in callee-first order.
fn emit_functions(out: &mut String, functions_by_name: &HashMap<&str, &FunctionDecl>, checked: &CheckedProgram) {
    for mangled_name in checked.atlas.topological_order() {
        if mangled_name == "main" {
            continue;
        }
        let Some(instance) = checked.atlas.functions.get(&mangled_name) else { continue };
        let Some(&function_decl) = functions_by_name.get(instance.original_name.as_str()) else { continue };

        let async_prefix = if instance.is_async { "async " } else { "" };
        let params: Vec<String> = function_decl
            .params
            .iter()
            .zip(instance.arg_types.iter())
            .enumerate()
            .map(|(index, (param, arg_type))| param_signature(param, arg_type, index, instance))
            .collect();
        out.push_str(&format!("{}fn {}({}) -> {} {{\n", async_prefix, mangled_name, params.join(", "), instance.return_type.rust_type()));
        let scope = ScopePath::function(&mangled_name);
        render_block(&function_decl.body, &scope, checked, out, 1);
        out.push_str("}\n\n");
    }
}

/// A parameter carrying a channel endpoint (tagged by C4 at its spawn call
/// site) is emitted with the sender's Rust type instead of the bare
/// `Channel<T>` kind (spec.md §4.4).
fn param_signature(param: &syntax::ast::Param, arg_type: &BaseKind, index: usize, instance: &syntax::atlas::FunctionInstance) -> String {
    if let Some(info) = instance.channel_arg_info.get(&index) {
        return format!("{}: {}", param.name, info.rust_sender_type());
    }
    return format!("{}: {}", param.name, arg_type.rust_type());
}

/// Sections 5-7: the entry point, its body, and the closing brace (the
/// final brace is emitted as part of `render_block`'s own closing line).
fn emit_entry_point(out: &mut String, functions_by_name: &HashMap<&str, &FunctionDecl>, checked: &CheckedProgram) {
    let Some(main_decl) = functions_by_name.get("main") else { return };
    let is_async = any_spawn_reached(checked);
    if is_async {
        out.push_str("#[tokio::main]\nasync fn main() {\n");
    } else {
        out.push_str("fn main() {\n");
    }
    let scope = ScopePath::function("main");
    render_block(&main_decl.body, &scope, checked, out, 1);
    out.push_str("}\n");
}

fn indent(depth: usize) -> String {
    return "    ".repeat(depth);
}

fn render_block(block: &Block, scope: &ScopePath, checked: &CheckedProgram, out: &mut String, depth: usize) {
    for stmt in &block.statements {
        render_stmt(stmt, scope, checked, out, depth);
    }
}

fn render_stmt(stmt: &Stmt, scope: &ScopePath, checked: &CheckedProgram, out: &mut String, depth: usize) {
    let pad = indent(depth);
    match stmt {
        Stmt::Assign { target, value, span } => match target {
            AssignTarget::Name(name) => {
                if let Expr::Call { callee, args, .. } = value {
                    if callee == "chan" {
                        render_channel_creation(name, args, *span, scope, checked, out, depth);
                        return;
                    }
                }
                let binding = checked.state.symbols.get(scope.as_str(), *span);
                let value_rust = render_expr(value, scope, checked);
                let is_declaration = binding.map(|binding| binding.is_shadow).unwrap_or(true) || checked.state.symbols.is_first_binding(scope.as_str(), name, *span);
                if is_declaration {
                    let mut_kw = if binding.map(|binding| binding.is_mutated).unwrap_or(false) { "mut " } else { "" };
                    out.push_str(&format!("{}let {}{} = {};\n", pad, mut_kw, name, value_rust));
                } else {
                    out.push_str(&format!("{}{} = {};\n", pad, name, value_rust));
                }
            }
            AssignTarget::SelfField(field) => {
                out.push_str(&format!("{}self.{} = {};\n", pad, field, render_expr(value, scope, checked)));
            }
        },
        Stmt::Spawn { callee, args, span } => {
            let mangled = checked.state.call_sites.get(span).cloned().unwrap_or_else(|| callee.clone());
            let rendered_args: Vec<String> = args.iter().map(|arg| render_expr(arg, scope, checked)).collect();
            out.push_str(&format!("{}tokio::spawn({}({}));\n", pad, mangled, rendered_args.join(", ")));
        }
        Stmt::ChannelSend { channel, value, span } => {
            let sender = checked.state.channel_endpoint_names.get(span).cloned().unwrap_or_else(|| format!("{channel}_tx"));
            let bounded = checked
                .state
                .symbols
                .last_binding(scope.as_str(), channel)
                .and_then(|binding| match &binding.resolved_type {
                    BaseKind::Channel(info) => Some(info.bounded),
                    _ => None,
                })
                .unwrap_or(false);
            let value_rust = render_expr(value, scope, checked);
            if bounded {
                out.push_str(&format!("{}{}.send({}).await.unwrap();\n", pad, sender, value_rust));
            } else {
                out.push_str(&format!("{}{}.send({}).unwrap();\n", pad, sender, value_rust));
            }
        }
        Stmt::If { condition, then_block, else_block, .. } => {
            out.push_str(&format!("{}if {} {{\n", pad, render_expr(condition, scope, checked)));
            let then_scope = scope.push("if");
            render_block(then_block, &then_scope, checked, out, depth + 1);
            if let Some(else_block) = else_block {
                out.push_str(&format!("{}}} else {{\n", pad));
                let else_scope = scope.push("else");
                render_block(else_block, &else_scope, checked, out, depth + 1);
            }
            out.push_str(&format!("{}}}\n", pad));
        }
        Stmt::ForRange { binding, range, body, .. } => {
            out.push_str(&format!("{}for {} in {} {{\n", pad, binding, render_expr(range, scope, checked)));
            let body_scope = scope.push("for");
            render_block(body, &body_scope, checked, out, depth + 1);
            out.push_str(&format!("{}}}\n", pad));
        }
        Stmt::While { condition, body, .. } => {
            out.push_str(&format!("{}while {} {{\n", pad, render_expr(condition, scope, checked)));
            let body_scope = scope.push("while");
            render_block(body, &body_scope, checked, out, depth + 1);
            out.push_str(&format!("{}}}\n", pad));
        }
        Stmt::Loop { body, .. } => {
            out.push_str(&format!("{}loop {{\n", pad));
            let body_scope = scope.push("loop");
            render_block(body, &body_scope, checked, out, depth + 1);
            out.push_str(&format!("{}}}\n", pad));
        }
        Stmt::Return { value: Some(value), .. } => {
            out.push_str(&format!("{}return {};\n", pad, render_expr(value, scope, checked)));
        }
        Stmt::Return { value: None, .. } => out.push_str(&format!("{}return;\n", pad)),
        Stmt::Break { .. } => out.push_str(&format!("{}break;\n", pad)),
        Stmt::Continue { .. } => out.push_str(&format!("{}continue;\n", pad)),
        Stmt::Expression { value, .. } => out.push_str(&format!("{}{};\n", pad, render_expr(value, scope, checked))),
    }
}

fn render_channel_creation(name: &str, args: &[Expr], span: data::tokens::Span, scope: &ScopePath, checked: &CheckedProgram, out: &mut String, depth: usize) {
    let pad = indent(depth);
    let binding = checked.state.symbols.get(scope.as_str(), span);
    let element_type = binding
        .and_then(|binding| match &binding.resolved_type {
            BaseKind::Channel(info) => Some(info.element_type.rust_type()),
            _ => None,
        })
        .unwrap_or_else(|| "_".to_string());
    let bounded = binding
        .and_then(|binding| match &binding.resolved_type {
            BaseKind::Channel(info) => Some(info.bounded),
            _ => None,
        })
        .unwrap_or(false);
    if bounded {
        let capacity = args.first().map(|arg| render_expr(arg, scope, checked)).unwrap_or_else(|| "1".to_string());
        out.push_str(&format!("{}let ({}_tx, {}_rx) = mpsc::channel::<{}>({});\n", pad, name, name, element_type, capacity));
    } else {
        out.push_str(&format!("{}let ({}_tx, {}_rx) = mpsc::unbounded_channel::<{}>();\n", pad, name, name, element_type));
    }
}

fn render_expr(expr: &Expr, scope: &ScopePath, checked: &CheckedProgram) -> String {
    match expr {
        Expr::IntegerLiteral { value, .. } => value.to_string(),
        Expr::FloatLiteral { value, .. } => format!("{value}f64"),
        Expr::StringLiteral { text, .. } => format!("{:?}.to_string()", text),
        Expr::BooleanLiteral { value, .. } => value.to_string(),
        Expr::SelfExpr { .. } => "self".to_string(),
        Expr::Identifier { name, span } => checked.state.channel_endpoint_names.get(span).cloned().unwrap_or_else(|| name.clone()),
        Expr::Unary { op, operand, .. } => {
            let symbol = match op {
                syntax::ast::UnaryOp::Negate => "-",
                syntax::ast::UnaryOp::Not => "!",
            };
            format!("{}({})", symbol, render_expr(operand, scope, checked))
        }
        Expr::Binary { op, left, right, .. } => {
            let symbol = binary_op_symbol(*op);
            format!("({} {} {})", render_expr(left, scope, checked), symbol, render_expr(right, scope, checked))
        }
        Expr::Call { callee, args, span } => render_call(callee, args, *span, scope, checked),
        Expr::MethodCall { receiver, method, args, .. } => {
            let rendered_args: Vec<String> = args.iter().map(|arg| render_expr(arg, scope, checked)).collect();
            format!("{}.{}({})", render_expr(receiver, scope, checked), method, rendered_args.join(", "))
        }
        Expr::FieldAccess { receiver, field, .. } => format!("{}.{}", render_expr(receiver, scope, checked), field),
        Expr::ArrayLiteral { elements, .. } => {
            let rendered: Vec<String> = elements.iter().map(|element| render_expr(element, scope, checked)).collect();
            format!("vec![{}]", rendered.join(", "))
        }
        Expr::Index { array, index, .. } => format!("{}[{}]", render_expr(array, scope, checked), render_expr(index, scope, checked)),
        Expr::Range { start, end, .. } => format!("{}..{}", render_expr(start, scope, checked), render_expr(end, scope, checked)),
        Expr::StructLiteral { name, fields, .. } => {
            let rendered: Vec<String> = fields.iter().map(|(field, value)| format!("{}: {}", field, render_expr(value, scope, checked))).collect();
            format!("{} {{ {} }}", name, rendered.join(", "))
        }
        Expr::ChannelRecv { channel, span } => {
            let receiver = checked.state.channel_endpoint_names.get(span).cloned().unwrap_or_else(|| format!("{channel}_rx"));
            format!("{}.recv().await.unwrap()", receiver)
        }
    }
}

/// Renders an expression with no enclosing function scope, for const and
/// field default initializers (which never reference a symbol-table entry).
fn render_expr_bare(expr: &Expr, checked: &CheckedProgram) -> String {
    return render_expr(expr, &ScopePath::function("<const>"), checked);
}

fn render_call(callee: &str, args: &[Expr], span: data::tokens::Span, scope: &ScopePath, checked: &CheckedProgram) -> String {
    if callee == "print" {
        let rendered: Vec<String> = args.iter().map(|arg| render_expr(arg, scope, checked)).collect();
        let placeholders = vec!["{}"; rendered.len()].join(" ");
        return format!("println!(\"{}\", {})", placeholders, rendered.join(", "));
    }
    let mangled = checked.state.call_sites.get(&span).cloned().unwrap_or_else(|| callee.to_string());
    let rendered_args: Vec<String> = args.iter().map(|arg| render_expr(arg, scope, checked)).collect();
    let call = format!("{}({})", mangled, rendered_args.join(", "));
    if checked.atlas.functions.get(&mangled).map(|instance| instance.is_async).unwrap_or(false) {
        return format!("{}.await", call);
    }
    return call;
}

fn binary_op_symbol(op: syntax::ast::BinaryOp) -> &'static str {
    use syntax::ast::BinaryOp::*;
    return match op {
        Add => "+",
        Subtract => "-",
        Multiply => "*",
        Divide => "/",
        Equals => "==",
        NotEquals => "!=",
        LessThan => "<",
        LessThanEquals => "<=",
        GreaterThan => ">",
        GreaterThanEquals => ">=",
        And => "&&",
        Or => "||",
    };
}
