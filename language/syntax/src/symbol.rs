use std::collections::HashMap;

use data::tokens::Span;

use crate::types::BaseKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingKind {
    Variable,
    Parameter,
    Const,
    Temporary,
    Function,
    Builtin,
    Struct,
    Literal,
}

/// A named binding inside one specialization's scope.
///
/// `unique_name` is what the (out-of-core) emitter should print; it differs
/// from `original_name` only when a type-changing shadow forces a fresh
/// Rust binding for what was one source-level name (spec.md §3).
#[derive(Clone, Debug)]
pub struct Binding {
    pub original_name: String,
    pub unique_name: String,
    pub kind: BindingKind,
    pub resolved_type: BaseKind,
    pub source_interval: Span,
    pub is_mutated: bool,
    pub is_shadow: bool,
    pub element_type: Option<BaseKind>,
}

impl Binding {
    pub fn new(original_name: String, kind: BindingKind, resolved_type: BaseKind, source_interval: Span) -> Self {
        return Self {
            unique_name: original_name.clone(),
            original_name,
            kind,
            resolved_type,
            source_interval,
            is_mutated: false,
            is_shadow: false,
            element_type: None,
        };
    }
}

/// Symbols keyed by `(functionScope, sourceInterval)`. The function scope
/// name must appear in the key because the same source interval lives in
/// multiple specializations of the same template and must not collide
/// (spec.md §3, "Symbol table").
#[derive(Default)]
pub struct SymbolTable {
    bindings: HashMap<(String, Span), Binding>,
    /// Every binding ever created for `(scope, originalName)`, in creation
    /// order, so shadow-vs-reassignment classification can inspect the
    /// still-live prior binding for a name within a scope.
    by_name: HashMap<(String, String), Vec<Span>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        return Self::default();
    }

    pub fn insert(&mut self, scope: &str, binding: Binding) {
        let key = (scope.to_string(), binding.source_interval);
        self.by_name.entry((scope.to_string(), binding.original_name.clone())).or_default().push(binding.source_interval);
        self.bindings.insert(key, binding);
    }

    pub fn get(&self, scope: &str, interval: Span) -> Option<&Binding> {
        return self.bindings.get(&(scope.to_string(), interval));
    }

    pub fn get_mut(&mut self, scope: &str, interval: Span) -> Option<&mut Binding> {
        return self.bindings.get_mut(&(scope.to_string(), interval));
    }

    /// The most recent binding created for `name` in `scope`, if any. Used
    /// by C3 for identifier resolution and by C5 for shadow/reassignment
    /// classification.
    pub fn last_binding(&self, scope: &str, name: &str) -> Option<&Binding> {
        let intervals = self.by_name.get(&(scope.to_string(), name.to_string()))?;
        let last = intervals.last()?;
        return self.bindings.get(&(scope.to_string(), *last));
    }

    pub fn last_binding_mut(&mut self, scope: &str, name: &str) -> Option<&mut Binding> {
        let intervals = self.by_name.get(&(scope.to_string(), name.to_string()))?.clone();
        let last = intervals.last().copied()?;
        return self.bindings.get_mut(&(scope.to_string(), last));
    }

    /// `last_binding`, but falls back to each enclosing scope in turn
    /// (`fn.if_0.for_1` -> `fn.if_0` -> `fn`) when `name` has no binding in
    /// `scope` itself. A nested control-block scope only holds the bindings
    /// created inside it, so a read of an outer variable from inside an
    /// `if`/`for`/`while`/`loop` body needs this to resolve at all.
    pub fn last_binding_in_chain(&self, scope: &str, name: &str) -> Option<&Binding> {
        let mut current = scope;
        loop {
            if let Some(binding) = self.last_binding(current, name) {
                return Some(binding);
            }
            current = &current[..current.rfind('.')?];
        }
    }

    pub fn all_in_scope(&self, scope: &str) -> impl Iterator<Item = &Binding> {
        return self.bindings.iter().filter(move |((s, _), _)| s == scope).map(|(_, b)| b);
    }

    /// Whether `interval` was the very first binding ever created for
    /// `(scope, name)`. Used by the emitter to tell a first-declaration
    /// apart from a same-type reassignment, since both have `is_shadow ==
    /// false` but only the former should be rendered as a fresh `let`.
    pub fn is_first_binding(&self, scope: &str, name: &str, interval: Span) -> bool {
        let Some(intervals) = self.by_name.get(&(scope.to_string(), name.to_string())) else { return false };
        return intervals.first() == Some(&interval);
    }
}

/// Builds the hierarchical scope path used to key control-block child
/// scopes, e.g. `add_i64_i64.if_0.for_1` (spec.md §4.3).
#[derive(Clone)]
pub struct ScopePath {
    path: String,
    counters: HashMap<String, u32>,
}

impl ScopePath {
    pub fn function(mangled_name: &str) -> Self {
        return Self { path: mangled_name.to_string(), counters: HashMap::new() };
    }

    pub fn as_str(&self) -> &str {
        return &self.path;
    }

    /// Pushes a new child scope named `<kind>_<counter>` with a per-function
    /// counter for that kind.
    pub fn push(&self, kind: &str) -> Self {
        let mut counters = self.counters.clone();
        let counter = counters.entry(kind.to_string()).or_insert(0);
        let child_path = format!("{}.{}_{}", self.path, kind, counter);
        *counter += 1;
        return Self { path: child_path, counters };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_path_counters_increment_per_kind_independently() {
        let root = ScopePath::function("add_i64_i64");
        let if0 = root.push("if");
        let if1 = root.push("if");
        let for0 = root.push("for");
        assert_eq!(if0.as_str(), "add_i64_i64.if_0");
        assert_eq!(if1.as_str(), "add_i64_i64.if_1");
        assert_eq!(for0.as_str(), "add_i64_i64.for_0");
    }

    #[test]
    fn same_interval_in_different_scopes_does_not_collide() {
        let mut table = SymbolTable::new();
        let span = Span::new(1, 0, 0);
        table.insert("add_i64_i64", Binding::new("x".to_string(), BindingKind::Variable, BaseKind::Integer, span));
        table.insert("add_f64_f64", Binding::new("x".to_string(), BindingKind::Variable, BaseKind::Float, span));
        assert_eq!(table.get("add_i64_i64", span).unwrap().resolved_type, BaseKind::Integer);
        assert_eq!(table.get("add_f64_f64", span).unwrap().resolved_type, BaseKind::Float);
    }
}
