use std::collections::HashMap;

use data::tokens::Span;
use syntax::atlas::Atlas;
use syntax::symbol::SymbolTable;

/// Bookkeeping threaded through C3/C4 as they walk specialization bodies.
/// Kept separate from `Atlas` because it is per-compile scratch state, not
/// part of the reachability graph itself.
#[derive(Default)]
pub struct CheckState {
    pub symbols: SymbolTable,
    /// Every call/spawn expression's span, resolved to the mangled callee it
    /// binds to (spec.md §4.3, "call-site resolution map"). The emitter
    /// consults this rather than re-deriving it.
    pub call_sites: HashMap<Span, String>,
    /// Every occurrence of a channel name at a send, receive, or
    /// spawn-argument site, resolved to its derived endpoint name
    /// (`<name>_tx` / `<name>_rx`, spec.md §4.4).
    pub channel_endpoint_names: HashMap<Span, String>,
    /// Set whenever a fixpoint round refines a channel's element type
    /// (locally, or by cross-function back-flow through a spawn argument).
    /// `specializer::run` resets this at the start of each round and keeps
    /// looping while it's set, even when no specialization count or return
    /// type changed, since channel inference can still be converging.
    pub channel_state_changed: bool,
}

/// The fully-resolved program handed off to the (out-of-core) emitter: the
/// reachability graph plus every piece of bookkeeping C2-C5 attached to it.
pub struct CheckedProgram {
    pub atlas: Atlas,
    pub state: CheckState,
}
