use syntax::ast::{AssignTarget, Block, Expr, Stmt};
use syntax::atlas::Atlas;
use syntax::errors::{ErrorSource, ParsingMessage};
use syntax::symbol::{Binding, BindingKind, ScopePath};
use syntax::types::{promote, ArrayTypeInfo, BaseKind, ChannelTypeInfo};
use syntax::ParsingError;

use crate::binding_classifier;
use crate::channel_analyzer;
use crate::definitions::Definitions;
use crate::infer::literal_type;
use crate::output::CheckState;
use tracing::trace;

const BUILTIN_PRINT: &str = "print";
const BUILTIN_CHAN: &str = "chan";
/// The only append-style growing method this language recognizes, picked to
/// match the Rust `Vec::push` the emitter targets (spec.md §4.5 names no
/// concrete method, only "an append-style growing method").
const GROWING_METHOD: &str = "push";
const MAX_ITERATIONS: usize = 64;

/// C3 + C4 + C5, run together as one fixpoint loop over the Atlas's
/// specializations: each round walks every known specialization body
/// caller-first where possible, creating new specializations for concrete
/// call-site argument types (discovery) and recomputing each one's return
/// type from its first `return` statement (propagation). Both phases share
/// one walk because a specialization's return type and its internal call
/// sites are discovered by the same traversal; looping to a fixpoint gives
/// the same end state as running the two phases from spec.md §4.3 to
/// convergence, without needing a second full walk per round.
pub fn run(definitions: &Definitions, atlas: &mut Atlas) -> Result<CheckState, ParsingError> {
    let mut state = CheckState::default();
    for iteration in 0..MAX_ITERATIONS {
        let before_count = atlas.functions.len();
        state.channel_state_changed = false;
        let order = ordered_specialization_names(atlas);
        let mut return_type_changed = false;
        for mangled_name in order {
            if process_specialization(&mangled_name, definitions, atlas, &mut state)? {
                return_type_changed = true;
            }
        }
        let after_count = atlas.functions.len();
        let channel_state_changed = state.channel_state_changed;
        trace!(iteration, before_count, after_count, return_type_changed, channel_state_changed, "fixpoint round");
        if !return_type_changed && !channel_state_changed && before_count == after_count {
            break;
        }
    }
    return Ok(state);
}

/// Callee-first where the call graph already tells us the order; any
/// specialization created mid-pass (and so absent from the snapshot) is
/// still visited this round, just appended without the ordering preference.
fn ordered_specialization_names(atlas: &Atlas) -> Vec<String> {
    let mut order = atlas.topological_order();
    for name in atlas.functions.keys() {
        if !order.contains(name) {
            order.push(name.clone());
        }
    }
    return order;
}

/// Returns whether this specialization's return type changed this round.
fn process_specialization(mangled_name: &str, definitions: &Definitions, atlas: &mut Atlas, state: &mut CheckState) -> Result<bool, ParsingError> {
    let Some(instance) = atlas.functions.get(mangled_name) else { return Ok(false) };
    let original_name = instance.original_name.clone();
    let arg_types = instance.arg_types.clone();
    let previous_return_type = instance.return_type.clone();

    let Some(&function) = definitions.functions.get(&original_name) else { return Ok(false) };

    let scope = ScopePath::function(mangled_name);
    for (param, arg_type) in function.params.iter().zip(arg_types.iter()) {
        let binding = Binding::new(param.name.clone(), BindingKind::Parameter, arg_type.clone(), param.span);
        state.symbols.insert(scope.as_str(), binding);
    }

    let found_return = walk_block(&function.body, &scope, mangled_name, definitions, atlas, state)?;
    let resolved_return_type = found_return.unwrap_or(BaseKind::Void);

    let mut changed = resolved_return_type != previous_return_type;
    if let Some(instance) = atlas.functions.get_mut(mangled_name) {
        instance.return_type = resolved_return_type;
    }

    // C4: a channel-typed parameter's element type, once fixed by a send
    // inside this body, is folded back onto this specialization's own
    // `channel_arg_info` so a caller's spawn-channel back-flow
    // (`channel_analyzer::record_spawn_channel_arg`) can observe it on a
    // later fixpoint round.
    for (index, (param, arg_type)) in function.params.iter().zip(arg_types.iter()).enumerate() {
        let BaseKind::Channel(arg_info) = arg_type else { continue };
        let Some(binding) = state.symbols.last_binding(scope.as_str(), &param.name) else { continue };
        let BaseKind::Channel(observed) = &binding.resolved_type else { continue };
        if channel_analyzer::merge_channel_arg_info(atlas, mangled_name, index, arg_info.bounded, &observed.element_type) {
            changed = true;
        }
    }

    return Ok(changed);
}

/// Walks statements in source order, short-circuiting on the first `return`
/// encountered anywhere (including inside nested control blocks), matching
/// spec.md §9(b): only the first return is ever consulted.
fn walk_block(block: &Block, scope: &ScopePath, current: &str, definitions: &Definitions, atlas: &mut Atlas, state: &mut CheckState) -> Result<Option<BaseKind>, ParsingError> {
    for stmt in &block.statements {
        if let Some(return_type) = walk_stmt(stmt, scope, current, definitions, atlas, state)? {
            return Ok(Some(return_type));
        }
    }
    return Ok(None);
}

fn walk_stmt(stmt: &Stmt, scope: &ScopePath, current: &str, definitions: &Definitions, atlas: &mut Atlas, state: &mut CheckState) -> Result<Option<BaseKind>, ParsingError> {
    match stmt {
        Stmt::Assign { target, value, span } => {
            match target {
                AssignTarget::Name(name) => {
                    if let Expr::Call { callee, args, .. } = value {
                        if callee == BUILTIN_CHAN {
                            for arg in args {
                                infer_expr(arg, scope, current, definitions, atlas, state)?;
                            }
                            let bounded = !args.is_empty();
                            // Carry forward any element type a prior round
                            // already fixed at this exact `chan()` site
                            // (locally, or by spawn-channel back-flow);
                            // otherwise re-walking this statement on a later
                            // fixpoint round would reset it to `Unknown` and
                            // wipe that progress.
                            let already_observed = state
                                .symbols
                                .get(scope.as_str(), *span)
                                .and_then(|binding| match &binding.resolved_type {
                                    BaseKind::Channel(info) => Some(info.element_type.clone()),
                                    _ => None,
                                })
                                .unwrap_or(BaseKind::Unknown);
                            let mut info = ChannelTypeInfo::new(bounded);
                            info.element_type = already_observed;
                            let resolved = BaseKind::Channel(Box::new(info));
                            binding_classifier::classify_and_insert(&mut state.symbols, scope.as_str(), name, resolved, *span, BindingKind::Variable);
                            return Ok(None);
                        }
                    }
                    let resolved = infer_expr(value, scope, current, definitions, atlas, state)?;
                    binding_classifier::classify_and_insert(&mut state.symbols, scope.as_str(), name, resolved, *span, BindingKind::Variable);
                }
                AssignTarget::SelfField(_) => {
                    // Only valid inside a method body; C3 never walks
                    // methods directly (struct methods aren't specialized,
                    // spec.md §1's Non-goals), so this never fires.
                    infer_expr(value, scope, current, definitions, atlas, state)?;
                }
            }
            return Ok(None);
        }
        Stmt::Spawn { callee, args, span } => {
            let mut arg_types = Vec::with_capacity(args.len());
            for arg in args {
                arg_types.push(infer_expr(arg, scope, current, definitions, atlas, state)?);
            }
            if definitions.functions.contains_key(callee) && !arg_types.iter().any(BaseKind::is_unknown) {
                let mangled = atlas.add_specialization(callee, arg_types.clone(), *span, current);
                state.call_sites.insert(*span, mangled.clone());
                channel_analyzer::mark_spawn_reached(atlas, &mangled);
                for (index, arg) in args.iter().enumerate() {
                    if let (Expr::Identifier { name, span: arg_span }, Some(BaseKind::Channel(_))) = (arg, arg_types.get(index)) {
                        if channel_analyzer::record_spawn_channel_arg(state, scope.as_str(), name, *arg_span, &mangled, index, atlas) {
                            state.channel_state_changed = true;
                        }
                    }
                }
            }
            return Ok(None);
        }
        Stmt::ChannelSend { channel, value, span } => {
            let value_type = infer_expr(value, scope, current, definitions, atlas, state)?;
            channel_analyzer::record_send(state, scope.as_str(), channel, &value_type, *span)?;
            return Ok(None);
        }
        Stmt::If { condition, then_block, else_block, .. } => {
            infer_expr(condition, scope, current, definitions, atlas, state)?;
            let then_scope = scope.push("if");
            if let Some(found) = walk_block(then_block, &then_scope, current, definitions, atlas, state)? {
                return Ok(Some(found));
            }
            if let Some(else_block) = else_block {
                let else_scope = scope.push("else");
                if let Some(found) = walk_block(else_block, &else_scope, current, definitions, atlas, state)? {
                    return Ok(Some(found));
                }
            }
            return Ok(None);
        }
        Stmt::ForRange { binding, range, body, span } => {
            infer_expr(range, scope, current, definitions, atlas, state)?;
            let body_scope = scope.push("for");
            binding_classifier::classify_and_insert(&mut state.symbols, body_scope.as_str(), binding, BaseKind::Integer, *span, BindingKind::Variable);
            return walk_block(body, &body_scope, current, definitions, atlas, state);
        }
        Stmt::While { condition, body, .. } => {
            infer_expr(condition, scope, current, definitions, atlas, state)?;
            let body_scope = scope.push("while");
            return walk_block(body, &body_scope, current, definitions, atlas, state);
        }
        Stmt::Loop { body, .. } => {
            let body_scope = scope.push("loop");
            return walk_block(body, &body_scope, current, definitions, atlas, state);
        }
        Stmt::Return { value: Some(value), .. } => {
            let resolved = infer_expr(value, scope, current, definitions, atlas, state)?;
            return Ok(Some(resolved));
        }
        Stmt::Return { value: None, .. } => return Ok(Some(BaseKind::Void)),
        Stmt::Break { .. } | Stmt::Continue { .. } => return Ok(None),
        Stmt::Expression { value, .. } => {
            infer_expr(value, scope, current, definitions, atlas, state)?;
            return Ok(None);
        }
    }
}

/// Mirrors the struct analyzer's field typing (annotation, else default
/// literal shape, else `Unknown`) for field reads seen from function bodies.
fn field_decl_type(field: &syntax::ast::FieldDecl) -> BaseKind {
    if let Some(annotation) = &field.type_annotation {
        return crate::infer::resolve_type_name(annotation);
    }
    if let Some(default) = &field.default {
        return literal_type(default);
    }
    return BaseKind::Unknown;
}

fn infer_expr(expr: &Expr, scope: &ScopePath, current: &str, definitions: &Definitions, atlas: &mut Atlas, state: &mut CheckState) -> Result<BaseKind, ParsingError> {
    let resolved = match expr {
        Expr::IntegerLiteral { .. } | Expr::FloatLiteral { .. } | Expr::StringLiteral { .. } | Expr::BooleanLiteral { .. } => literal_type(expr),
        Expr::SelfExpr { .. } => BaseKind::Unknown,
        Expr::Identifier { name, span } => {
            if let Some(binding) = state.symbols.last_binding_in_chain(scope.as_str(), name) {
                binding.resolved_type.clone()
            } else if let Some(const_instance) = atlas.consts.get(name) {
                const_instance.resolved_type.clone()
            } else {
                return Err(span.make_error(ParsingMessage::UnresolvedReference(name.clone())));
            }
        }
        Expr::Unary { operand, .. } => infer_expr(operand, scope, current, definitions, atlas, state)?,
        Expr::Binary { op, left, right, .. } => {
            let left_type = infer_expr(left, scope, current, definitions, atlas, state)?;
            let right_type = infer_expr(right, scope, current, definitions, atlas, state)?;
            if op.is_boolean_result() {
                BaseKind::Boolean
            } else {
                promote(&left_type, &right_type)
            }
        }
        Expr::ChannelRecv { channel, span } => channel_analyzer::record_recv(state, scope.as_str(), channel, *span),
        Expr::Range { start, end, .. } => {
            infer_expr(start, scope, current, definitions, atlas, state)?;
            infer_expr(end, scope, current, definitions, atlas, state)?;
            BaseKind::Integer
        }
        Expr::ArrayLiteral { elements, .. } => {
            let mut element_type = BaseKind::Unknown;
            for (index, element) in elements.iter().enumerate() {
                let resolved = infer_expr(element, scope, current, definitions, atlas, state)?;
                if index == 0 {
                    element_type = resolved;
                }
            }
            BaseKind::Array(Box::new(ArrayTypeInfo::new(element_type)))
        }
        Expr::Index { array, index, .. } => {
            let array_type = infer_expr(array, scope, current, definitions, atlas, state)?;
            infer_expr(index, scope, current, definitions, atlas, state)?;
            match array_type {
                BaseKind::Array(info) => info.element_type,
                _ => BaseKind::Unknown,
            }
        }
        Expr::StructLiteral { name, fields, .. } => {
            for (_, value) in fields {
                infer_expr(value, scope, current, definitions, atlas, state)?;
            }
            BaseKind::Struct(name.clone())
        }
        Expr::FieldAccess { receiver, field, span } => {
            let receiver_type = infer_expr(receiver, scope, current, definitions, atlas, state)?;
            match &receiver_type {
                BaseKind::Struct(struct_name) => match atlas.structs.get(struct_name) {
                    Some(instance) => match instance.fields.iter().find(|f| &f.name == field) {
                        Some(field_decl) => field_decl_type(field_decl),
                        None => return Err(span.make_error(ParsingMessage::UnknownField(field.clone(), struct_name.clone()))),
                    },
                    None => return Err(span.make_error(ParsingMessage::UnresolvedReference(struct_name.clone()))),
                },
                BaseKind::Unknown => BaseKind::Unknown,
                other => return Err(span.make_error(ParsingMessage::FieldAccessOnNonStruct(other.clone()))),
            }
        }
        Expr::MethodCall { receiver, method, args, span } => {
            let receiver_type = infer_expr(receiver, scope, current, definitions, atlas, state)?;
            for arg in args {
                infer_expr(arg, scope, current, definitions, atlas, state)?;
            }
            match &receiver_type {
                BaseKind::Struct(struct_name) => {
                    if method == GROWING_METHOD {
                        if let Expr::Identifier { name, .. } = receiver.as_ref() {
                            binding_classifier::mark_declaration_mutable(&mut state.symbols, scope.as_str(), name);
                        }
                    }
                    if let Some(struct_instance) = atlas.structs.get_mut(struct_name) {
                        struct_instance.methods_used.insert(method.clone());
                        let method_info = struct_instance.methods.iter().find(|m| &m.name == method).cloned();
                        if let Some(method_info) = method_info {
                            if matches!(method_info.receiver, syntax::atlas::MethodReceiver::MutSelf) {
                                if let Expr::Identifier { name, .. } = receiver.as_ref() {
                                    binding_classifier::mark_declaration_mutable(&mut state.symbols, scope.as_str(), name);
                                }
                            }
                            return Ok(method_info.return_type);
                        }
                    }
                    BaseKind::Unknown
                }
                BaseKind::Array(info) => {
                    if method == GROWING_METHOD {
                        if let Expr::Identifier { name, .. } = receiver.as_ref() {
                            binding_classifier::mark_declaration_mutable(&mut state.symbols, scope.as_str(), name);
                        }
                        return Ok(BaseKind::Array(info.clone()));
                    }
                    BaseKind::Unknown
                }
                BaseKind::Unknown => BaseKind::Unknown,
                other => return Err(span.make_error(ParsingMessage::MethodOnNonStruct(method.clone(), other.clone()))),
            }
        }
        Expr::Call { callee, args, span } => {
            let mut arg_types = Vec::with_capacity(args.len());
            for arg in args {
                arg_types.push(infer_expr(arg, scope, current, definitions, atlas, state)?);
            }
            if callee == BUILTIN_PRINT {
                BaseKind::Void
            } else if callee == BUILTIN_CHAN {
                BaseKind::Channel(Box::new(ChannelTypeInfo::new(!args.is_empty())))
            } else if definitions.functions.contains_key(callee) {
                if arg_types.iter().any(BaseKind::is_unknown) {
                    BaseKind::Unknown
                } else {
                    let mangled = atlas.add_specialization(callee, arg_types, *span, current);
                    state.call_sites.insert(*span, mangled.clone());
                    atlas.functions.get(&mangled).map(|instance| instance.return_type.clone()).unwrap_or(BaseKind::Unknown)
                }
            } else {
                BaseKind::Unknown
            }
        }
    };
    return Ok(resolved);
}
