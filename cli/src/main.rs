//! indigo CLI - converts between the curly and indented surface syntaxes.
//!
//! Usage:
//!   indigo parse [flags] [path ...]     Convert curly (.go) to indented (.igo)
//!   indigo compile [flags] [path ...]   Convert indented (.igo) to curly (.go)
//!   indigo build                        Reserved
//!
//! Paths may be files or directories; directories are walked recursively.
//! Each converted file is written next to its source (or under --dest)
//! with the opposite extension.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

use indigo_lang::error::{ErrorList, IndigoError};
use indigo_lang::printer::Config;
use indigo_lang::scanner::Mode;
use indigo_lang::{convert, ConvertOptions};

#[derive(Parser, Debug)]
#[command(name = "indigo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert curly sources (.go) to indented syntax (.igo)
    Parse(ConvertArgs),
    /// Convert indented sources (.igo) to curly syntax (.go)
    Compile(ConvertArgs),
    /// Reserved; not implemented
    Build,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Files or directories to convert
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Carry comments through to the output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    comments: bool,

    /// Output directory; empty writes alongside each source file
    #[arg(long, default_value = "")]
    dest: String,

    /// Indent with tabs
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    tabs: bool,

    /// Tab width used for alignment and indentation measurement
    #[arg(long, default_value_t = 8)]
    tabwidth: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Parse(args) => run(Mode::Curly, &args),
        Command::Compile(args) => run(Mode::Indented, &args),
        Command::Build => {
            eprintln!("build is not implemented");
            eprintln!("usage: indigo [parse|compile] [flags] [path ...]");
            ExitCode::from(2)
        }
    }
}

fn run(mode: Mode, args: &ConvertArgs) -> ExitCode {
    let source_ext = match mode {
        Mode::Indented => "igo",
        Mode::Curly => "go",
    };

    let mut files = Vec::new();
    for path in &args.paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
                let p = entry.path();
                if p.is_file() && p.extension().is_some_and(|e| e == source_ext) {
                    files.push(p.to_path_buf());
                }
            }
        } else {
            files.push(path.clone());
        }
    }

    if files.is_empty() {
        eprintln!("no {} files found", source_ext);
        return ExitCode::from(1);
    }

    let mut failed = false;
    for file in &files {
        if let Err(errors) = convert_file(file, mode, args) {
            for err in &errors {
                eprintln!("{}", err);
            }
            failed = true;
        }
    }

    if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn convert_file(path: &Path, mode: Mode, args: &ConvertArgs) -> Result<(), ErrorList> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| vec![IndigoError::io(path.display().to_string(), e)])?;

    let opts = ConvertOptions {
        comments: args.comments,
        strict: false,
        config: Config {
            tab_indent: args.tabs,
            use_spaces: true,
            tabwidth: args.tabwidth,
            ..Config::default()
        },
    };

    let filename = path.display().to_string();
    let output = convert(&filename, &source, mode, &opts)?;

    let out_path = output_path(path, mode, &args.dest)
        .map_err(|e| vec![IndigoError::io(path.display().to_string(), e)])?;
    std::fs::write(&out_path, output)
        .map_err(|e| vec![IndigoError::io(out_path.display().to_string(), e)])?;
    Ok(())
}

/// The converted file gets the opposite extension, next to the source or
/// under `dest` when given.
fn output_path(path: &Path, mode: Mode, dest: &str) -> std::io::Result<PathBuf> {
    let out_ext = match mode {
        Mode::Indented => "go",
        Mode::Curly => "igo",
    };
    let renamed = path.with_extension(out_ext);
    if dest.is_empty() {
        return Ok(renamed);
    }
    std::fs::create_dir_all(dest)?;
    let name = renamed.file_name().unwrap_or_default();
    Ok(Path::new(dest).join(name))
}
