use std::fmt::Debug;
use std::path::PathBuf;

use colored::Colorize;
use tokio::runtime::{Builder, Runtime};

use crate::tokens::{Span, Token};

/// Source spans and lexical tokens, shared by the parser and the checker.
pub mod tokens;

/// Settings used to configure a compilation run.
pub struct RunnerSettings {
    /// Sources to pull source files from.
    pub sources: Vec<Box<dyn SourceSet>>,
    /// Arguments for the compiler backend.
    pub compiler_arguments: CompilerArguments,
    /// Print internal pipeline tracing (C1-C5 pass entry/exit) to stderr.
    pub verbose: bool,
}

/// Arguments used when configuring the emitted Rust program.
#[derive(Clone)]
pub struct CompilerArguments {
    /// Target function to expose as the emitted program's entry point,
    /// usually `main` or a qualified test name.
    pub target: String,
    /// The temp folder used while staging generated Rust source.
    pub temp_folder: PathBuf,
}

/// Top-level runtime handles plus settings, built once per run.
pub struct Arguments {
    /// The IO runtime, used for reading source files. `None` in single-threaded mode,
    /// in which case `cpu_runtime` is reused for IO.
    pub io_runtime: Option<Runtime>,
    /// The CPU runtime, used for the checker's concurrent passes.
    pub cpu_runtime: Runtime,
    /// The settings for the run.
    pub runner_settings: RunnerSettings,
}

impl Arguments {
    /// Builds the runtime handles for a run.
    pub fn build_args(single_threaded: bool, runner_settings: RunnerSettings) -> Arguments {
        let (mut io_runtime, mut cpu_runtime) = if single_threaded {
            (Builder::new_current_thread(), Builder::new_current_thread())
        } else {
            (Builder::new_multi_thread(), Builder::new_multi_thread())
        };

        return Arguments {
            io_runtime: if single_threaded {
                None
            } else {
                Some(io_runtime.enable_time().thread_name("io-runtime").build().expect("Failed to build I/O runtime"))
            },
            cpu_runtime: cpu_runtime.enable_time().thread_name("cpu-runtime").build().expect("Failed to build CPU runtime"),
            runner_settings,
        };
    }
}

/// A single readable source file.
pub trait Readable: Send {
    /// Tokenizes the file.
    fn read(&self) -> Vec<Token>;

    /// Gets the file's raw contents.
    fn contents(&self) -> String;

    /// Gets the path of the file, used for diagnostics.
    fn path(&self) -> String;

    /// A stable hash identifying this file across a compilation run.
    fn hash(&self) -> u64;
}

/// A set of source files to compile together.
pub trait SourceSet: Debug + Send + Sync {
    /// Returns all of the contained sources.
    fn get_files(&self) -> Vec<Box<dyn Readable>>;

    /// Gets the relative path in `folder::file` format, with no extension.
    fn relative(&self, other: &dyn Readable) -> String;

    /// Clones the source set and boxes it.
    fn cloned(&self) -> Box<dyn SourceSet>;
}

/// Prints a span's surrounding source line to stderr, underlining the span.
pub fn print_span(sources: &Vec<Box<dyn SourceSet>>, span: &Span, heading: &str) {
    let mut file = None;
    'outer: for source in sources {
        for readable in source.get_files() {
            if span.file == readable.hash() {
                file = Some(readable);
                break 'outer;
            }
        }
    }

    let Some(file) = file else {
        eprintln!("{}", format!("{heading} (in an unknown file)").bright_red());
        return;
    };

    let contents = file.contents();
    let tokens = file.read();
    if span.start >= tokens.len() {
        eprintln!("{}", heading.bright_red());
        return;
    }
    let start_token = &tokens[span.start];
    let end_token = &tokens[span.end.min(tokens.len() - 1)];

    let line = contents.lines().nth((start_token.line as usize).max(1) - 1).unwrap_or("???");
    eprintln!("{}", heading.bright_red());
    eprintln!("{}", format!("in file {}:{}:{}", file.path(), start_token.line, start_token.column).bright_red());
    eprintln!("{} {}", " ".repeat(start_token.line.to_string().len()), "|".bright_cyan());
    eprintln!("{} {} {}", start_token.line.to_string().bright_cyan(), "|".bright_cyan(), line.bright_red());
    let underline_width = (end_token.offset + end_token.text.len()).saturating_sub(start_token.offset).max(1);
    eprintln!(
        "{} {} {}{}",
        " ".repeat(start_token.line.to_string().len()),
        "|".bright_cyan(),
        " ".repeat(start_token.column as usize),
        "^".repeat(underline_width).bright_red()
    );
}
