use std::collections::HashMap;

use syntax::ast::{AssignTarget, Block, Expr, FieldDecl, FunctionDecl, Stmt, StructDecl};
use syntax::atlas::{Atlas, MethodInfo, MethodReceiver, StructInstance};
use syntax::types::BaseKind;

use crate::definitions::Definitions;
use crate::infer::{literal_type, resolve_type_name, self_fields_in_interpolation};

/// C2: for each struct recorded as used by C1, parses its fields and
/// classifies/types its methods (spec.md §4.2).
pub fn analyze(definitions: &Definitions, atlas: &mut Atlas) {
    let mut used_structs: Vec<String> = atlas.struct_usages.values().flatten().cloned().collect();
    used_structs.sort();
    used_structs.dedup();

    for struct_name in used_structs {
        if atlas.structs.contains_key(&struct_name) {
            continue;
        }
        let Some(&struct_decl) = definitions.structs.get(&struct_name) else { continue };
        atlas.structs.insert(struct_name.clone(), build_instance(struct_decl));
    }
}

fn build_instance(struct_decl: &StructDecl) -> StructInstance {
    let field_types = field_types(struct_decl);
    let methods = struct_decl.methods.iter().map(|method| analyze_method(method, struct_decl, &field_types)).collect();
    return StructInstance {
        name: struct_decl.name.clone(),
        parse_ref: struct_decl.span,
        fields: struct_decl.fields.clone(),
        methods,
        methods_used: Default::default(),
    };
}

/// A field's type is its explicit annotation if present, else the literal
/// shape of its default value, else `Unknown` (spec.md §4.2).
fn field_types(struct_decl: &StructDecl) -> HashMap<String, BaseKind> {
    let mut types = HashMap::new();
    for field in &struct_decl.fields {
        types.insert(field.name.clone(), field_type(field));
    }
    return types;
}

fn field_type(field: &FieldDecl) -> BaseKind {
    if let Some(annotation) = &field.type_annotation {
        return resolve_type_name(annotation);
    }
    if let Some(default) = &field.default {
        return literal_type(default);
    }
    return BaseKind::Unknown;
}

fn analyze_method(method: &FunctionDecl, struct_decl: &StructDecl, field_types: &HashMap<String, BaseKind>) -> MethodInfo {
    let (reads_self, writes_self) = self_usage(&method.body);
    let receiver = if writes_self {
        MethodReceiver::MutSelf
    } else if reads_self {
        MethodReceiver::SharedSelf
    } else {
        MethodReceiver::Static
    };

    let param_types = method.params.iter().map(|param| infer_param_type(&param.name, method, struct_decl, field_types)).collect();
    let return_type = infer_return_type(method, struct_decl, field_types);

    return MethodInfo { name: method.name.clone(), receiver, param_types, return_type, span: method.span };
}

/// `reads-self`: a `self.field` read, or a `{self.field}` substring inside
/// an interpolated string literal. `writes-self`: a direct assignment whose
/// target is `self.field` (spec.md §4.2).
fn self_usage(block: &Block) -> (bool, bool) {
    let mut reads = false;
    let mut writes = false;
    scan_block_self_usage(block, &mut reads, &mut writes);
    return (reads, writes);
}

fn scan_block_self_usage(block: &Block, reads: &mut bool, writes: &mut bool) {
    for stmt in &block.statements {
        scan_stmt_self_usage(stmt, reads, writes);
    }
}

fn scan_stmt_self_usage(stmt: &Stmt, reads: &mut bool, writes: &mut bool) {
    match stmt {
        Stmt::Assign { target, value, .. } => {
            if matches!(target, AssignTarget::SelfField(_)) {
                *writes = true;
            }
            scan_expr_self_usage(value, reads);
        }
        Stmt::Spawn { args, .. } => args.iter().for_each(|arg| scan_expr_self_usage(arg, reads)),
        Stmt::ChannelSend { value, .. } => scan_expr_self_usage(value, reads),
        Stmt::If { condition, then_block, else_block, .. } => {
            scan_expr_self_usage(condition, reads);
            scan_block_self_usage(then_block, reads, writes);
            if let Some(else_block) = else_block {
                scan_block_self_usage(else_block, reads, writes);
            }
        }
        Stmt::ForRange { range, body, .. } => {
            scan_expr_self_usage(range, reads);
            scan_block_self_usage(body, reads, writes);
        }
        Stmt::While { condition, body, .. } => {
            scan_expr_self_usage(condition, reads);
            scan_block_self_usage(body, reads, writes);
        }
        Stmt::Loop { body, .. } => scan_block_self_usage(body, reads, writes),
        Stmt::Return { value: Some(value), .. } => scan_expr_self_usage(value, reads),
        Stmt::Return { value: None, .. } | Stmt::Break { .. } | Stmt::Continue { .. } => {}
        Stmt::Expression { value, .. } => scan_expr_self_usage(value, reads),
    }
}

fn scan_expr_self_usage(expr: &Expr, reads: &mut bool) {
    match expr {
        Expr::FieldAccess { receiver, .. } if matches!(receiver.as_ref(), Expr::SelfExpr { .. }) => *reads = true,
        Expr::StringLiteral { text, .. } if !self_fields_in_interpolation(text).is_empty() => *reads = true,
        Expr::Unary { operand, .. } => scan_expr_self_usage(operand, reads),
        Expr::Binary { left, right, .. } => {
            scan_expr_self_usage(left, reads);
            scan_expr_self_usage(right, reads);
        }
        Expr::Call { args, .. } => args.iter().for_each(|arg| scan_expr_self_usage(arg, reads)),
        Expr::MethodCall { receiver, args, .. } => {
            scan_expr_self_usage(receiver, reads);
            args.iter().for_each(|arg| scan_expr_self_usage(arg, reads));
        }
        Expr::FieldAccess { receiver, .. } => scan_expr_self_usage(receiver, reads),
        Expr::ArrayLiteral { elements, .. } => elements.iter().for_each(|element| scan_expr_self_usage(element, reads)),
        Expr::Index { array, index, .. } => {
            scan_expr_self_usage(array, reads);
            scan_expr_self_usage(index, reads);
        }
        Expr::Range { start, end, .. } => {
            scan_expr_self_usage(start, reads);
            scan_expr_self_usage(end, reads);
        }
        Expr::StructLiteral { fields, .. } => fields.iter().for_each(|(_, value)| scan_expr_self_usage(value, reads)),
        _ => {}
    }
}

/// Evidence sources in priority order (spec.md §4.2): a parameter's type is
/// adopted from the first source that matches.
fn infer_param_type(param_name: &str, method: &FunctionDecl, struct_decl: &StructDecl, field_types: &HashMap<String, BaseKind>) -> BaseKind {
    if let Some(found) = find_in_returned_struct_literal(&method.body, param_name, struct_decl, field_types) {
        return found;
    }
    if let Some(found) = find_in_self_field_assignment(&method.body, param_name, field_types) {
        return found;
    }
    if let Some(found) = find_in_self_field_binary(&method.body, param_name, field_types) {
        return found;
    }
    return BaseKind::Unknown;
}

fn find_in_returned_struct_literal(block: &Block, param_name: &str, struct_decl: &StructDecl, field_types: &HashMap<String, BaseKind>) -> Option<BaseKind> {
    for stmt in &block.statements {
        match stmt {
            Stmt::Return { value: Some(Expr::StructLiteral { name, fields, .. }), .. } if name == &struct_decl.name => {
                for (field_name, value) in fields {
                    if let Expr::Identifier { name, .. } = value {
                        if name == param_name {
                            return field_types.get(field_name).cloned();
                        }
                    }
                }
            }
            Stmt::If { then_block, else_block, .. } => {
                if let Some(found) = find_in_returned_struct_literal(then_block, param_name, struct_decl, field_types) {
                    return Some(found);
                }
                if let Some(else_block) = else_block {
                    if let Some(found) = find_in_returned_struct_literal(else_block, param_name, struct_decl, field_types) {
                        return Some(found);
                    }
                }
            }
            Stmt::ForRange { body, .. } | Stmt::While { body, .. } | Stmt::Loop { body, .. } => {
                if let Some(found) = find_in_returned_struct_literal(body, param_name, struct_decl, field_types) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    return None;
}

fn find_in_self_field_assignment(block: &Block, param_name: &str, field_types: &HashMap<String, BaseKind>) -> Option<BaseKind> {
    for stmt in &block.statements {
        match stmt {
            Stmt::Assign { target: AssignTarget::SelfField(field), value, .. } if expr_mentions_identifier(value, param_name) => {
                return field_types.get(field).cloned();
            }
            Stmt::If { then_block, else_block, .. } => {
                if let Some(found) = find_in_self_field_assignment(then_block, param_name, field_types) {
                    return Some(found);
                }
                if let Some(else_block) = else_block {
                    if let Some(found) = find_in_self_field_assignment(else_block, param_name, field_types) {
                        return Some(found);
                    }
                }
            }
            Stmt::ForRange { body, .. } | Stmt::While { body, .. } | Stmt::Loop { body, .. } => {
                if let Some(found) = find_in_self_field_assignment(body, param_name, field_types) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    return None;
}

fn find_in_self_field_binary(block: &Block, param_name: &str, field_types: &HashMap<String, BaseKind>) -> Option<BaseKind> {
    for stmt in &block.statements {
        let expr = match stmt {
            Stmt::Assign { value, .. } | Stmt::ChannelSend { value, .. } | Stmt::Expression { value, .. } => Some(value),
            Stmt::Return { value: Some(value), .. } => Some(value),
            _ => None,
        };
        if let Some(expr) = expr {
            if let Some(found) = binary_self_field_evidence(expr, param_name, field_types) {
                return Some(found);
            }
        }
        match stmt {
            Stmt::If { then_block, else_block, .. } => {
                if let Some(found) = find_in_self_field_binary(then_block, param_name, field_types) {
                    return Some(found);
                }
                if let Some(else_block) = else_block {
                    if let Some(found) = find_in_self_field_binary(else_block, param_name, field_types) {
                        return Some(found);
                    }
                }
            }
            Stmt::ForRange { body, .. } | Stmt::While { body, .. } | Stmt::Loop { body, .. } => {
                if let Some(found) = find_in_self_field_binary(body, param_name, field_types) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    return None;
}

fn binary_self_field_evidence(expr: &Expr, param_name: &str, field_types: &HashMap<String, BaseKind>) -> Option<BaseKind> {
    if let Expr::Binary { left, right, .. } = expr {
        let self_field = self_field_name(left).or_else(|| self_field_name(right));
        let mentions_param = expr_mentions_identifier(left, param_name) || expr_mentions_identifier(right, param_name);
        if let (Some(field), true) = (self_field, mentions_param) {
            return field_types.get(&field).cloned();
        }
        return binary_self_field_evidence(left, param_name, field_types).or_else(|| binary_self_field_evidence(right, param_name, field_types));
    }
    return None;
}

fn self_field_name(expr: &Expr) -> Option<String> {
    if let Expr::FieldAccess { receiver, field, .. } = expr {
        if matches!(receiver.as_ref(), Expr::SelfExpr { .. }) {
            return Some(field.clone());
        }
    }
    return None;
}

fn expr_mentions_identifier(expr: &Expr, name: &str) -> bool {
    return match expr {
        Expr::Identifier { name: found, .. } => found == name,
        Expr::Unary { operand, .. } => expr_mentions_identifier(operand, name),
        Expr::Binary { left, right, .. } => expr_mentions_identifier(left, name) || expr_mentions_identifier(right, name),
        Expr::Call { args, .. } => args.iter().any(|arg| expr_mentions_identifier(arg, name)),
        Expr::MethodCall { receiver, args, .. } => expr_mentions_identifier(receiver, name) || args.iter().any(|arg| expr_mentions_identifier(arg, name)),
        Expr::FieldAccess { receiver, .. } => expr_mentions_identifier(receiver, name),
        Expr::ArrayLiteral { elements, .. } => elements.iter().any(|element| expr_mentions_identifier(element, name)),
        Expr::Index { array, index, .. } => expr_mentions_identifier(array, name) || expr_mentions_identifier(index, name),
        Expr::Range { start, end, .. } => expr_mentions_identifier(start, name) || expr_mentions_identifier(end, name),
        Expr::StructLiteral { fields, .. } => fields.iter().any(|(_, value)| expr_mentions_identifier(value, name)),
        _ => false,
    };
}

/// Walks return statements in source order; the first one found decides the
/// method's return type (spec.md §4.2, mirroring the open question about
/// function-level return inference in §9(b)).
fn infer_return_type(method: &FunctionDecl, struct_decl: &StructDecl, field_types: &HashMap<String, BaseKind>) -> BaseKind {
    return first_return_type(&method.body, struct_decl, field_types).unwrap_or(BaseKind::Void);
}

fn first_return_type(block: &Block, struct_decl: &StructDecl, field_types: &HashMap<String, BaseKind>) -> Option<BaseKind> {
    for stmt in &block.statements {
        match stmt {
            Stmt::Return { value: Some(value), .. } => return Some(resolve_method_expr_type(value, struct_decl, field_types)),
            Stmt::Return { value: None, .. } => return Some(BaseKind::Void),
            Stmt::If { then_block, else_block, .. } => {
                if let Some(found) = first_return_type(then_block, struct_decl, field_types) {
                    return Some(found);
                }
                if let Some(else_block) = else_block {
                    if let Some(found) = first_return_type(else_block, struct_decl, field_types) {
                        return Some(found);
                    }
                }
            }
            Stmt::ForRange { body, .. } | Stmt::While { body, .. } | Stmt::Loop { body, .. } => {
                if let Some(found) = first_return_type(body, struct_decl, field_types) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    return None;
}

fn resolve_method_expr_type(expr: &Expr, struct_decl: &StructDecl, field_types: &HashMap<String, BaseKind>) -> BaseKind {
    return match expr {
        Expr::StructLiteral { name, .. } if name == &struct_decl.name => BaseKind::Struct(name.clone()),
        Expr::FieldAccess { receiver, field, .. } if matches!(receiver.as_ref(), Expr::SelfExpr { .. }) => {
            field_types.get(field).cloned().unwrap_or(BaseKind::Unknown)
        }
        Expr::Unary { operand, .. } => resolve_method_expr_type(operand, struct_decl, field_types),
        Expr::Binary { op, left, right, .. } => {
            if op.is_boolean_result() {
                BaseKind::Boolean
            } else {
                syntax::types::promote(
                    &resolve_method_expr_type(left, struct_decl, field_types),
                    &resolve_method_expr_type(right, struct_decl, field_types),
                )
            }
        }
        other => literal_type(other),
    };
}
