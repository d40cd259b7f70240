use std::collections::{HashMap, HashSet, VecDeque};

use data::tokens::Span;
use syntax::ast::{AssignTarget, Block, Expr, Stmt};
use syntax::atlas::{Atlas, FunctionInstance};
use syntax::errors::{ErrorSource, ParsingMessage};
use syntax::ParsingError;

use syntax::atlas::ConstInstance;

use crate::definitions::Definitions;
use crate::infer::literal_type;

const BUILTINS: &[&str] = &["print", "chan"];

/// C1: computes the reachability set rooted at `main` (spec.md §4.1). Fails
/// only if `main` is absent. Only `main` receives a `FunctionInstance` here;
/// every other function's specialization is deferred to C3, because its
/// `argTypes` aren't known until its call sites are typed.
pub fn build(definitions: &Definitions) -> Result<Atlas, ParsingError> {
    let main = *definitions
        .functions
        .get("main")
        .ok_or_else(|| Span::default().make_error(ParsingMessage::MissingEntryPoint))?;

    let mut atlas = Atlas::new();
    atlas.functions.insert("main".to_string(), FunctionInstance::new("main".to_string(), "main".to_string(), main.span, Vec::new()));
    atlas.reachable_functions.insert("main".to_string());

    let mut worklist: VecDeque<String> = VecDeque::new();
    worklist.push_back("main".to_string());
    let mut visited = HashSet::new();
    visited.insert("main".to_string());

    while let Some(current) = worklist.pop_front() {
        let Some(function) = definitions.functions.get(&current) else { continue };
        let mut struct_vars: HashMap<String, String> = HashMap::new();
        walk_block(&function.body, &current, definitions, &mut atlas, &mut worklist, &mut visited, &mut struct_vars);
    }

    return Ok(atlas);
}

/// Types every const actually referenced by reachable code, from its literal
/// shape. Runs once after C1, since usages are only known once the
/// reachability walk has recorded `const_usages` (spec.md §4.1).
pub fn populate_consts(definitions: &Definitions, atlas: &mut Atlas) {
    let mut used_consts: Vec<String> = atlas.const_usages.values().flatten().cloned().collect();
    used_consts.sort();
    used_consts.dedup();

    for const_name in used_consts {
        if atlas.consts.contains_key(&const_name) {
            continue;
        }
        let Some(&const_decl) = definitions.consts.get(&const_name) else { continue };
        let resolved_type = literal_type(&const_decl.value);
        atlas.consts.insert(const_name.clone(), ConstInstance { name: const_name, parse_ref: const_decl.span, resolved_type });
    }
}

fn walk_block(
    block: &Block,
    current: &str,
    definitions: &Definitions,
    atlas: &mut Atlas,
    worklist: &mut VecDeque<String>,
    visited: &mut HashSet<String>,
    struct_vars: &mut HashMap<String, String>,
) {
    for stmt in &block.statements {
        walk_stmt(stmt, current, definitions, atlas, worklist, visited, struct_vars);
    }
}

fn walk_stmt(
    stmt: &Stmt,
    current: &str,
    definitions: &Definitions,
    atlas: &mut Atlas,
    worklist: &mut VecDeque<String>,
    visited: &mut HashSet<String>,
    struct_vars: &mut HashMap<String, String>,
) {
    match stmt {
        Stmt::Assign { target, value, .. } => {
            walk_expr(value, current, definitions, atlas, worklist, visited, struct_vars);
            if let (AssignTarget::Name(target), Expr::StructLiteral { name, .. }) = (target, value) {
                struct_vars.insert(target.clone(), name.clone());
            }
        }
        Stmt::Spawn { callee, args, .. } => {
            for arg in args {
                walk_expr(arg, current, definitions, atlas, worklist, visited, struct_vars);
            }
            record_function_edge(callee, current, definitions, atlas, worklist, visited);
        }
        Stmt::ChannelSend { value, .. } => walk_expr(value, current, definitions, atlas, worklist, visited, struct_vars),
        Stmt::If { condition, then_block, else_block, .. } => {
            walk_expr(condition, current, definitions, atlas, worklist, visited, struct_vars);
            walk_block(then_block, current, definitions, atlas, worklist, visited, struct_vars);
            if let Some(else_block) = else_block {
                walk_block(else_block, current, definitions, atlas, worklist, visited, struct_vars);
            }
        }
        Stmt::ForRange { range, body, .. } => {
            walk_expr(range, current, definitions, atlas, worklist, visited, struct_vars);
            walk_block(body, current, definitions, atlas, worklist, visited, struct_vars);
        }
        Stmt::While { condition, body, .. } => {
            walk_expr(condition, current, definitions, atlas, worklist, visited, struct_vars);
            walk_block(body, current, definitions, atlas, worklist, visited, struct_vars);
        }
        Stmt::Loop { body, .. } => walk_block(body, current, definitions, atlas, worklist, visited, struct_vars),
        Stmt::Return { value: Some(value), .. } => walk_expr(value, current, definitions, atlas, worklist, visited, struct_vars),
        Stmt::Return { value: None, .. } | Stmt::Break { .. } | Stmt::Continue { .. } => {}
        Stmt::Expression { value, .. } => walk_expr(value, current, definitions, atlas, worklist, visited, struct_vars),
    }
}

fn walk_expr(
    expr: &Expr,
    current: &str,
    definitions: &Definitions,
    atlas: &mut Atlas,
    worklist: &mut VecDeque<String>,
    visited: &mut HashSet<String>,
    struct_vars: &mut HashMap<String, String>,
) {
    match expr {
        Expr::IntegerLiteral { .. }
        | Expr::FloatLiteral { .. }
        | Expr::StringLiteral { .. }
        | Expr::BooleanLiteral { .. }
        | Expr::SelfExpr { .. }
        | Expr::ChannelRecv { .. } => {}
        Expr::Identifier { name, .. } => {
            if definitions.consts.contains_key(name) {
                atlas.record_const_usage(current, name);
            }
        }
        Expr::Unary { operand, .. } => walk_expr(operand, current, definitions, atlas, worklist, visited, struct_vars),
        Expr::Binary { left, right, .. } => {
            walk_expr(left, current, definitions, atlas, worklist, visited, struct_vars);
            walk_expr(right, current, definitions, atlas, worklist, visited, struct_vars);
        }
        Expr::Call { callee, args, .. } => {
            for arg in args {
                walk_expr(arg, current, definitions, atlas, worklist, visited, struct_vars);
            }
            if !BUILTINS.contains(&callee.as_str()) {
                record_function_edge(callee, current, definitions, atlas, worklist, visited);
            }
        }
        Expr::MethodCall { receiver, args, .. } => {
            walk_expr(receiver, current, definitions, atlas, worklist, visited, struct_vars);
            for arg in args {
                walk_expr(arg, current, definitions, atlas, worklist, visited, struct_vars);
            }
            if let Expr::Identifier { name, .. } = receiver.as_ref() {
                if definitions.structs.contains_key(name) {
                    atlas.record_struct_usage(current, name);
                } else if let Some(struct_name) = struct_vars.get(name) {
                    atlas.record_struct_usage(current, struct_name);
                }
            }
        }
        Expr::FieldAccess { receiver, .. } => walk_expr(receiver, current, definitions, atlas, worklist, visited, struct_vars),
        Expr::ArrayLiteral { elements, .. } => {
            for element in elements {
                walk_expr(element, current, definitions, atlas, worklist, visited, struct_vars);
            }
        }
        Expr::Index { array, index, .. } => {
            walk_expr(array, current, definitions, atlas, worklist, visited, struct_vars);
            walk_expr(index, current, definitions, atlas, worklist, visited, struct_vars);
        }
        Expr::Range { start, end, .. } => {
            walk_expr(start, current, definitions, atlas, worklist, visited, struct_vars);
            walk_expr(end, current, definitions, atlas, worklist, visited, struct_vars);
        }
        Expr::StructLiteral { name, fields, .. } => {
            if definitions.structs.contains_key(name) {
                atlas.record_struct_usage(current, name);
            }
            for (_, value) in fields {
                walk_expr(value, current, definitions, atlas, worklist, visited, struct_vars);
            }
        }
    }
}

fn record_function_edge(
    callee: &str,
    current: &str,
    definitions: &Definitions,
    atlas: &mut Atlas,
    worklist: &mut VecDeque<String>,
    visited: &mut HashSet<String>,
) {
    if !definitions.functions.contains_key(callee) {
        return;
    }
    atlas.calls.entry(current.to_string()).or_default().insert(callee.to_string());
    atlas.reachable_functions.insert(callee.to_string());
    if visited.insert(callee.to_string()) {
        worklist.push_back(callee.to_string());
    }
}
