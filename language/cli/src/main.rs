use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use data::{print_span, Arguments as RunArguments, CompilerArguments, RunnerSettings, SourceSet};
use syntax::ast::Program;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::arguments::{Cli, Command};
use crate::source::FileSourceSet;

mod arguments;
mod source;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Compile { root, target, output, single_threaded } => compile(&root, &target, output.as_deref(), single_threaded),
        Command::PrintAst { root } => print_ast(&root),
        Command::SyntaxCheck { root } => syntax_check(&root),
    };

    return match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    };
}

fn init_logging(verbose: bool) {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::new("info") };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn compile(root: &Path, target: &str, output: Option<&Path>, single_threaded: bool) -> Result<(), ()> {
    let runner_settings = RunnerSettings {
        sources: vec![Box::new(FileSourceSet::new(root.to_path_buf()))],
        compiler_arguments: CompilerArguments { target: target.to_string(), temp_folder: std::env::temp_dir().join("ravenc") },
        verbose: false,
    };
    let args = RunArguments::build_args(single_threaded, runner_settings);

    let emitted = match args.cpu_runtime.block_on(runner::run(&args)) {
        Ok(emitted) => emitted,
        Err(runner::CompileError::Check(parse_error)) => {
            print_span(&args.runner_settings.sources, &parse_error.span, &parse_error.message.to_string());
            return Err(());
        }
        Err(error) => {
            error!(%error, "compilation failed");
            return Err(());
        }
    };

    match output {
        Some(path) => fs::write(path, emitted).map_err(|error| error!(%error, "failed to write output"))?,
        None => println!("{emitted}"),
    }
    return Ok(());
}

/// Parses every `.rv` file under `root` into one merged `Program`, without
/// running the checker. Shared by `print-ast` and `syntax-check`, neither of
/// which needs the concurrent I/O scheduling `compile` drives through
/// `runner::run`.
fn parse_tree(root: &Path) -> Result<(Program, FileSourceSet), ()> {
    let sources = FileSourceSet::new(root.to_path_buf());
    let mut program = Program::default();
    for file in sources.get_files() {
        let relative = sources.relative(file.as_ref());
        info!(file = %relative, "parsing source file");
        let parsed = match parser::parse(&file.contents(), file.hash()) {
            Ok(parsed) => parsed,
            Err(error) => {
                error!(%error, file = %relative, "failed to parse");
                return Err(());
            }
        };
        program.functions.extend(parsed.functions);
        program.structs.extend(parsed.structs);
        program.consts.extend(parsed.consts);
    }
    return Ok((program, sources));
}

fn print_ast(root: &Path) -> Result<(), ()> {
    let (program, _) = parse_tree(root)?;
    println!("{program:#?}");
    return Ok(());
}

fn syntax_check(root: &Path) -> Result<(), ()> {
    let (program, sources) = parse_tree(root)?;
    match checker::check(&program) {
        Ok(_) => {
            println!("ok");
            return Ok(());
        }
        Err(parse_error) => {
            print_span(&vec![Box::new(sources) as Box<dyn SourceSet>], &parse_error.span, &parse_error.message.to_string());
            return Err(());
        }
    }
}
