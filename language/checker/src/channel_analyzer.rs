use data::tokens::Span;
use syntax::atlas::Atlas;
use syntax::errors::{ErrorSource, ParsingMessage};
use syntax::types::{BaseKind, ChannelTypeInfo};
use syntax::ParsingError;

use crate::output::CheckState;

/// C4: sender/receiver endpoint naming, element-type observation, and the
/// spawn-reached async closure (spec.md §4.4).
pub fn sender_name(channel: &str) -> String {
    return format!("{channel}_tx");
}

pub fn receiver_name(channel: &str) -> String {
    return format!("{channel}_rx");
}

/// `x <- v`: rewrites `x` to its sender name and fixes (or checks) the
/// channel's element type. Divergent evidence is a fatal error per spec.md
/// §9(a).
pub fn record_send(state: &mut CheckState, scope: &str, channel: &str, value_type: &BaseKind, span: Span) -> Result<(), ParsingError> {
    state.channel_endpoint_names.insert(span, sender_name(channel));
    let Some(binding) = state.symbols.last_binding_mut(scope, channel) else { return Ok(()) };
    if let BaseKind::Channel(info) = &mut binding.resolved_type {
        let previous = info.element_type.clone();
        if !info.observe(value_type) {
            return Err(span.make_error(ParsingMessage::ConflictingTypeEvidence(channel.to_string(), previous, value_type.clone())));
        }
    }
    return Ok(());
}

/// `<- x`: rewrites `x` to its receiver name and yields its element type
/// (still `Unknown` if no send has fixed it yet this iteration).
pub fn record_recv(state: &mut CheckState, scope: &str, channel: &str, span: Span) -> BaseKind {
    state.channel_endpoint_names.insert(span, receiver_name(channel));
    let Some(binding) = state.symbols.last_binding(scope, channel) else { return BaseKind::Unknown };
    if let BaseKind::Channel(info) = &binding.resolved_type {
        return info.element_type.clone();
    }
    return BaseKind::Unknown;
}

/// A channel argument handed to `spawn f(...)` is rewritten to its sender
/// name, and the callee's corresponding parameter is tagged with the same
/// `ChannelTypeInfo` so the emitter produces a sender-typed parameter.
/// Returns whether this call changed anything (the callee's recorded info or
/// the caller's own channel binding), so `specializer::run` knows to keep
/// the fixpoint loop going until the element type settles on both sides.
pub fn record_spawn_channel_arg(state: &mut CheckState, scope: &str, channel: &str, span: Span, mangled_callee: &str, param_index: usize, atlas: &mut Atlas) -> bool {
    state.channel_endpoint_names.insert(span, sender_name(channel));
    let Some(caller_info) = state.symbols.last_binding(scope, channel).and_then(|binding| match &binding.resolved_type {
        BaseKind::Channel(info) => Some((**info).clone()),
        _ => None,
    }) else {
        return false;
    };

    let mut changed = merge_channel_arg_info(atlas, mangled_callee, param_index, caller_info.bounded, &caller_info.element_type);

    // Cross-function element inference (spec.md §4.4): if the callee has
    // already discovered a concrete element type on this parameter (e.g. it
    // sends on it internally, folded into `channel_arg_info` at the end of
    // `specializer::process_specialization`), but the caller's own channel
    // is still `Unknown`, back-flow the callee's evidence onto the caller's
    // binding.
    let back_flow = atlas
        .functions
        .get(mangled_callee)
        .and_then(|callee| callee.channel_arg_info.get(&param_index))
        .filter(|callee_info| !callee_info.element_type.is_unknown())
        .map(|callee_info| callee_info.element_type.clone());

    if let Some(concrete) = back_flow {
        if let Some(binding) = state.symbols.last_binding_mut(scope, channel) {
            if let BaseKind::Channel(info) = &mut binding.resolved_type {
                let was_unknown = info.element_type.is_unknown();
                info.observe(&concrete);
                changed = changed || (was_unknown && !info.element_type.is_unknown());
            }
        }
    }
    return changed;
}

/// Merges an observed element type onto a callee parameter's channel info,
/// creating the entry (with `bounded`) if this is the first evidence seen
/// for it. Monotonic like `ChannelTypeInfo::observe`: only ever moves
/// `Unknown -> concrete`, never the reverse. Returns whether the merge
/// changed anything.
pub fn merge_channel_arg_info(atlas: &mut Atlas, mangled_callee: &str, param_index: usize, bounded: bool, observed: &BaseKind) -> bool {
    let Some(instance) = atlas.functions.get_mut(mangled_callee) else { return false };
    let entry = instance.channel_arg_info.entry(param_index).or_insert_with(|| ChannelTypeInfo::new(bounded));
    if entry.element_type.is_unknown() && !observed.is_unknown() {
        entry.element_type = observed.clone();
        return true;
    }
    return false;
}

pub fn mark_spawn_reached(atlas: &mut Atlas, mangled_callee: &str) {
    if let Some(instance) = atlas.functions.get_mut(mangled_callee) {
        instance.is_async = true;
    }
}

/// `main` is async iff any spawn exists anywhere in the reachable program
/// (spec.md §4.4, "Async closure").
pub fn any_spawn_reached(atlas: &Atlas) -> bool {
    return atlas.functions.values().any(|instance| instance.is_async);
}
