use std::fmt::{self, Display, Formatter};

use data::Arguments;
use syntax::ast::Program;
use syntax::ParsingError;
use tracing::{debug, info};

use crate::emitter::{Emitter, RustEmitter};

/// The two-tier error surface this crate exposes: a parse failure (read or
/// grammar problem, `anyhow`-shaped) versus a semantic failure from the
/// checker (`ParsingError`, carrying a span `data::print_span` can render).
#[derive(Debug)]
pub enum CompileError {
    Parse(anyhow::Error),
    Check(ParsingError),
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        return match self {
            CompileError::Parse(error) => write!(f, "{error}"),
            CompileError::Check(error) => write!(f, "{error}"),
        };
    }
}

impl std::error::Error for CompileError {}

/// Reads every configured source file, concurrently across the I/O runtime,
/// parses and merges them into one `Program`, runs the checker's C1-C5
/// pipeline, and emits Rust source (spec.md §5: the compiler core itself is
/// single-threaded and synchronous; only source reads are parallelized
/// here).
pub async fn run(args: &Arguments) -> Result<String, CompileError> {
    let io_handle = args.io_runtime.as_ref().map(|runtime| runtime.handle().clone()).unwrap_or_else(|| args.cpu_runtime.handle().clone());

    let mut read_tasks = Vec::new();
    for source in &args.runner_settings.sources {
        for file in source.get_files() {
            let relative = source.relative(file.as_ref());
            let contents = file.contents();
            let file_id = file.hash();
            read_tasks.push(io_handle.spawn(async move { (relative, contents, file_id) }));
        }
    }

    let mut program = Program::default();
    for task in read_tasks {
        let (relative, contents, file_id) = task.await.map_err(|error| CompileError::Parse(error.into()))?;
        debug!(file = %relative, "parsing source file");
        let parsed = parser::parse(&contents, file_id).map_err(|error| CompileError::Parse(error.context(format!("failed to parse {relative}"))))?;
        program.functions.extend(parsed.functions);
        program.structs.extend(parsed.structs);
        program.consts.extend(parsed.consts);
    }

    info!(functions = program.functions.len(), structs = program.structs.len(), "running checker pipeline");
    let checked = checker::check(&program).map_err(CompileError::Check)?;

    let emitter = RustEmitter::default();
    return Ok(emitter.emit(&program, &checked));
}
