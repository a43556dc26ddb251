mod bindings_file;
mod test_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use interpreter::{
    Bindings, DEFAULT_RECURSION_LIMIT, MAX_RECURSION_LIMIT, RenderOptions, Template,
};
use mrkev::parser::ParseError;

const SUBCOMMANDS: &[&str] = &["render", "test", "help"];

#[derive(Parser)]
#[command(name = "mrkev", version, about = "mrkev template renderer")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log evaluation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a template to stdout
    Render(RenderArgs),

    /// Run .test.mrk golden files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Template source file
    file: String,

    /// TOML file with the bindings
    #[arg(short, long)]
    bindings: Option<String>,

    /// Bind a single value, overriding the bindings file. Repeatable.
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Parse only, don't render (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Dump the translated AST
    #[arg(long)]
    ast: bool,

    /// Dump the raw parse tree
    #[arg(long)]
    tree: bool,

    /// Maximum nesting of a self-referential definition (at most 100)
    #[arg(long, default_value_t = DEFAULT_RECURSION_LIMIT, value_parser = parse_recursion_limit)]
    recursion_limit: usize,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.mrk file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `mrkev page.mrk` works like `mrkev render page.mrk`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().skip(1).position(|a| !a.starts_with('-')) {
        if !SUBCOMMANDS.contains(&args[pos + 1].as_str()) {
            args.insert(pos + 1, "render".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_tracing(cli.verbose, cli.no_color);

    match cli.command {
        Command::Render(render_args) => do_render(render_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

/// Logs go to stderr, filtered by `MRKEV_LOG` (default `warn`).
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("MRKEV_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!no_color)
                .with_target(false)
                .with_filter(filter),
        )
        .init();
}

fn do_render(args: RenderArgs, no_color: bool) {
    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let tree = match mrkev::parser::Parser::new(source, file_id)
        .with_filename(args.file.as_str())
        .parse()
    {
        Ok(tree) => tree,
        Err(error) => {
            emit_parse_error(&files, &error, no_color);
            process::exit(1);
        }
    };

    if args.check {
        eprintln!("ok: {} parsed successfully", args.file);
        return;
    }

    if args.tree {
        println!("{:#?}", tree);
        return;
    }

    let ast = mrkev::translator::translate(tree);

    if args.ast {
        println!("{:#?}", ast);
        return;
    }

    let bindings = match collect_bindings(&args) {
        Ok(bindings) => bindings,
        Err(message) => {
            eprintln!("error: {}", message);
            process::exit(1);
        }
    };

    let options = RenderOptions::new().with_recursion_limit(args.recursion_limit);
    let template = Template::from_ast(ast).with_options(options);
    println!("{}", template.render(&bindings));
}

fn parse_recursion_limit(s: &str) -> Result<usize, String> {
    let limit: usize = s.parse().map_err(|e| format!("{}", e))?;
    if limit > MAX_RECURSION_LIMIT {
        return Err(format!("must be at most {}", MAX_RECURSION_LIMIT));
    }
    Ok(limit)
}

/// Bindings file first, then `--set` overrides in order.
fn collect_bindings(args: &RenderArgs) -> Result<Bindings, String> {
    let mut bindings = match &args.bindings {
        Some(path) => bindings_file::load(Path::new(path))?,
        None => Bindings::new(),
    };
    for assignment in &args.set {
        let (key, value) = bindings_file::parse_assignment(assignment)?;
        bindings.insert(key, value);
    }
    Ok(bindings)
}

fn emit_parse_error(files: &SimpleFiles<String, String>, error: &ParseError, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    let diagnostic = error.to_diagnostic();
    let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic);
}
