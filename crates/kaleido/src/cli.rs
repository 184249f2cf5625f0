use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// When to color diagnostics.
    #[arg(long, value_enum, global = true, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run programs, in order, through one interpreter session.
    Run {
        /// The input files.
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Whether the given inputs should be used directly as the source instead
        /// of as source file paths.
        #[clap(long, short, action)]
        source: bool,

        /// Print the syntax tree of each unit before running it.
        #[arg(long)]
        print_ast: bool,

        /// Report each definition and declaration as it is made.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Read units interactively from standard input.
    Repl {
        /// Print the syntax tree of each unit before running it.
        #[arg(long)]
        print_ast: bool,

        /// Report each definition and declaration as it is made.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the tokens of a program.
    Tokens {
        /// The input file.
        input: String,

        /// Whether the given input should be used directly as the source instead
        /// of as the source file path.
        #[clap(long, short, action)]
        source: bool,
    },

    /// Print the syntax tree of each unit of a program without running it.
    Parse {
        /// The input file.
        input: String,

        /// Whether the given input should be used directly as the source instead
        /// of as the source file path.
        #[clap(long, short, action)]
        source: bool,
    },
}
