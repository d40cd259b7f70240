//! The semantic middle-end: turns a raw parse tree into a fully-typed,
//! reachability-pruned program ready for emission. Five passes run in order
//! (C1-C5), each grounded in its own module; `check` is the single entry
//! point `language/runner` drives.

pub mod atlas_builder;
pub mod binding_classifier;
pub mod channel_analyzer;
pub mod definitions;
pub mod infer;
pub mod output;
pub mod specializer;
pub mod struct_analyzer;

use syntax::ast::Program;
use syntax::ParsingError;
use tracing::debug;

pub use output::{CheckState, CheckedProgram};

/// Runs the full pipeline: C1 (reachability) -> const typing -> C2 (structs)
/// -> C3/C4/C5 (specialization, channels, mutability, run together as one
/// fixpoint loop).
pub fn check(program: &Program) -> Result<CheckedProgram, ParsingError> {
    let definitions = definitions::Definitions::collect(program);
    debug!(functions = definitions.functions.len(), structs = definitions.structs.len(), consts = definitions.consts.len(), "collected definitions");

    let mut atlas = atlas_builder::build(&definitions)?;
    debug!(reachable = atlas.reachable_functions.len(), "C1 atlas built");

    atlas_builder::populate_consts(&definitions, &mut atlas);
    debug!(consts = atlas.consts.len(), "consts typed");

    struct_analyzer::analyze(&definitions, &mut atlas);
    debug!(structs = atlas.structs.len(), "C2 structs analyzed");

    let state = specializer::run(&definitions, &mut atlas)?;
    debug!(specializations = atlas.functions.len(), "C3/C4/C5 fixpoint converged");

    return Ok(CheckedProgram { atlas, state });
}
