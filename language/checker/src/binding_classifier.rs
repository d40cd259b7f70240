use data::tokens::Span;
use syntax::symbol::{Binding, BindingKind, SymbolTable};
use syntax::types::BaseKind;

/// C5: classifies an assignment site as first-declaration, same-type
/// reassignment, or type-changing shadow, and marks the declaration mutable
/// when reassignment requires it (spec.md §4.5).
///
/// An empty array literal falls out of the same equality check for free:
/// `Array(Unknown) != Array(concrete)`, so reassigning one over a
/// concretely-typed prior binding is already a shadow without special-casing
/// it (spec.md §4.5, last paragraph).
pub fn classify_and_insert(symbols: &mut SymbolTable, scope: &str, name: &str, resolved_type: BaseKind, span: Span, kind: BindingKind) {
    let prior = symbols.last_binding(scope, name).cloned();
    let mut binding = Binding::new(name.to_string(), kind, resolved_type.clone(), span);

    match prior {
        None => binding.is_shadow = false,
        Some(prior) if prior.resolved_type == resolved_type => {
            binding.is_shadow = false;
            mark_declaration_mutable(symbols, scope, name);
        }
        Some(_) => binding.is_shadow = true,
    }

    symbols.insert(scope, binding);
}

/// Marks the still-live declaration for `name` in `scope` as needing a
/// mutable Rust binding. Shared by same-type reassignment, append-style
/// growth, and `&mut self`-style method invocation (spec.md §4.5).
pub fn mark_declaration_mutable(symbols: &mut SymbolTable, scope: &str, name: &str) {
    if let Some(binding) = symbols.last_binding_mut(scope, name) {
        binding.is_mutated = true;
    }
}
