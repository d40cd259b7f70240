use std::collections::{HashMap, HashSet};

use data::tokens::Span;
use indexmap::IndexMap;

use crate::types::{BaseKind, ChannelTypeInfo};

/// A concrete `(name, argTypes)` specialization, mangled and ready to be
/// emitted as one Rust function. Mirrors spec.md §3's `FunctionInstance`.
#[derive(Clone, Debug)]
pub struct FunctionInstance {
    pub original_name: String,
    pub mangled_name: String,
    /// Span of the originating `FunctionDecl` in the parse tree.
    pub parse_ref: Span,
    pub arg_types: Vec<BaseKind>,
    pub return_type: BaseKind,
    pub is_async: bool,
    /// Per-argument channel info, populated when an argument carries a
    /// channel endpoint split by C4.
    pub channel_arg_info: HashMap<usize, ChannelTypeInfo>,
}

impl FunctionInstance {
    pub fn new(original_name: String, mangled_name: String, parse_ref: Span, arg_types: Vec<BaseKind>) -> Self {
        return Self {
            original_name,
            mangled_name,
            parse_ref,
            arg_types,
            return_type: BaseKind::Unknown,
            is_async: false,
            channel_arg_info: HashMap::new(),
        };
    }
}

/// A reachable struct plus the methods actually called on it (spec.md §3:
/// "only methods actually called are retained in `methodsUsed`").
#[derive(Clone, Debug, Default)]
pub struct StructInstance {
    pub name: String,
    pub parse_ref: Span,
    pub fields: Vec<crate::ast::FieldDecl>,
    pub methods: Vec<MethodInfo>,
    pub methods_used: HashSet<String>,
}

#[derive(Clone, Debug)]
pub struct MethodInfo {
    pub name: String,
    pub receiver: MethodReceiver,
    pub param_types: Vec<BaseKind>,
    pub return_type: BaseKind,
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodReceiver {
    Static,
    SharedSelf,
    MutSelf,
}

#[derive(Clone, Debug)]
pub struct ConstInstance {
    pub name: String,
    pub parse_ref: Span,
    pub resolved_type: BaseKind,
}

/// Deterministic mangling: `name_<rustType0>_<rustType1>...`; the
/// empty-argument case keeps the original name untouched (spec.md §4.3).
pub fn mangle(name: &str, arg_types: &[BaseKind]) -> String {
    if arg_types.is_empty() {
        return name.to_string();
    }
    let mut mangled = name.to_string();
    for arg in arg_types {
        mangled.push('_');
        mangled.push_str(&arg.mangle_component());
    }
    return mangled;
}

/// The reachability graph rooted at `main`: every function, struct, and
/// const actually used by the program, plus the call/usage edges between
/// them (spec.md §3).
#[derive(Default)]
pub struct Atlas {
    pub functions: IndexMap<String, FunctionInstance>,
    pub structs: HashMap<String, StructInstance>,
    pub consts: HashMap<String, ConstInstance>,
    /// caller mangled name -> set of callee mangled names.
    pub calls: HashMap<String, HashSet<String>>,
    pub struct_usages: HashMap<String, HashSet<String>>,
    pub const_usages: HashMap<String, HashSet<String>>,
    /// Raw (unmangled) function names found reachable by C1's worklist,
    /// before C3 has typed any call site. `main` is always a member. C3
    /// walks this set to know which declarations are worth specializing at
    /// all; a function absent from it is dead code and never emitted.
    pub reachable_functions: HashSet<String>,
}

impl Atlas {
    pub fn new() -> Self {
        return Self::default();
    }

    /// Idempotent: calling twice with the same `(name, argTypes)` returns
    /// the same mangled name without duplicating the instance (P2/L2).
    pub fn add_specialization(&mut self, name: &str, arg_types: Vec<BaseKind>, parse_ref: Span, caller: &str) -> String {
        let mangled_name = mangle(name, &arg_types);
        self.calls.entry(caller.to_string()).or_default().insert(mangled_name.clone());
        if !self.functions.contains_key(&mangled_name) {
            self.functions.insert(
                mangled_name.clone(),
                FunctionInstance::new(name.to_string(), mangled_name.clone(), parse_ref, arg_types),
            );
        }
        return mangled_name;
    }

    pub fn record_struct_usage(&mut self, caller: &str, struct_name: &str) {
        self.struct_usages.entry(caller.to_string()).or_default().insert(struct_name.to_string());
    }

    pub fn record_const_usage(&mut self, caller: &str, const_name: &str) {
        self.const_usages.entry(caller.to_string()).or_default().insert(const_name.to_string());
    }

    /// Depth-first post-order over `calls`, i.e. callee-first. Skips any
    /// name not present as a specialization in the Atlas (spec.md §4.1).
    pub fn topological_order(&self) -> Vec<String> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut roots: Vec<&String> = self.functions.keys().collect();
        roots.sort();
        for root in roots {
            self.visit_post_order(root, &mut visited, &mut order);
        }
        return order;
    }

    fn visit_post_order(&self, name: &str, visited: &mut HashSet<String>, order: &mut Vec<String>) {
        if visited.contains(name) {
            return;
        }
        visited.insert(name.to_string());
        if let Some(callees) = self.calls.get(name) {
            let mut sorted_callees: Vec<&String> = callees.iter().collect();
            sorted_callees.sort();
            for callee in sorted_callees {
                if self.functions.contains_key(callee) {
                    self.visit_post_order(callee, visited, order);
                }
            }
        }
        if self.functions.contains_key(name) {
            order.push(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mangle_no_args_keeps_original_name() {
        assert_eq!(mangle("main", &[]), "main");
    }

    #[test]
    fn mangle_joins_rust_type_components() {
        assert_eq!(mangle("add", &[BaseKind::Integer, BaseKind::Integer]), "add_i64_i64");
        assert_eq!(mangle("add", &[BaseKind::Float, BaseKind::Float]), "add_f64_f64");
    }

    #[test]
    fn add_specialization_is_idempotent() {
        let mut atlas = Atlas::new();
        let span = Span::default();
        let first = atlas.add_specialization("add", vec![BaseKind::Integer, BaseKind::Integer], span, "main");
        let second = atlas.add_specialization("add", vec![BaseKind::Integer, BaseKind::Integer], span, "main");
        assert_eq!(first, second);
        assert_eq!(atlas.functions.len(), 1);
    }

    #[test]
    fn distinct_argument_types_yield_distinct_specializations() {
        let mut atlas = Atlas::new();
        let span = Span::default();
        let int_variant = atlas.add_specialization("add", vec![BaseKind::Integer, BaseKind::Integer], span, "main");
        let float_variant = atlas.add_specialization("add", vec![BaseKind::Float, BaseKind::Float], span, "main");
        assert_ne!(int_variant, float_variant);
        assert_eq!(atlas.functions.len(), 2);
    }
}
