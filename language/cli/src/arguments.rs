use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Source-to-source compiler for the language: translates a small
/// imperative, structurally-typed source language into idiomatic Rust.
#[derive(Parser)]
#[command(name = "ravenc", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Print internal pipeline tracing (parse, C1-C5 pass entry/exit) to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse, check, and emit the program as Rust source.
    Compile {
        /// Root directory of `.rv` source files.
        root: PathBuf,

        /// Entry point to expose in the emitted program, usually `main`.
        #[arg(long, default_value = "main")]
        target: String,

        /// Where to write the emitted Rust source; stdout if omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run the compiler on a single thread, without a separate I/O runtime.
        #[arg(long)]
        single_threaded: bool,
    },
    /// Parse the program and print its parse tree, without running the checker.
    PrintAst {
        /// Root directory of `.rv` source files.
        root: PathBuf,
    },
    /// Parse and check the program, reporting errors without emitting Rust.
    SyntaxCheck {
        /// Root directory of `.rv` source files.
        root: PathBuf,
    },
}
