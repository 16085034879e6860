pub mod error;
pub mod parser;
pub mod position;
pub mod printer;
pub mod scanner;
pub mod tabwriter;

use error::{ErrorList, IndigoError};
use parser::ast::File;
use position::FileSet;
use printer::{Config, Node, Syntax};
use scanner::{Mode, ScanConfig};

/// Options for one conversion pass.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Carry comments through to the output.
    pub comments: bool,
    /// Reject mixed tab/space indentation when reading indented syntax.
    pub strict: bool,
    pub config: Config,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            comments: true,
            strict: false,
            config: Config::default(),
        }
    }
}

/// Scan and parse `source` in the given surface syntax.
pub fn parse_source(
    fset: &mut FileSet,
    filename: &str,
    source: &str,
    mode: Mode,
    opts: &ConvertOptions,
) -> Result<File, ErrorList> {
    let index = fset.add(filename, source);
    let scan_config = ScanConfig {
        scan_comments: opts.comments,
        strict: opts.strict,
        tabwidth: opts.config.tabwidth,
    };
    let result = scanner::scan(fset.file(index), source, mode, scan_config);
    if !result.errors.is_empty() {
        return Err(result
            .errors
            .iter()
            .map(|e| IndigoError::from_scan(e, fset))
            .collect());
    }
    parser::parse_file(result.tokens, result.comments)
        .map_err(|e| vec![IndigoError::from_parse(&e, fset)])
}

/// Convert `source` from one surface syntax to the other. A conversion is
/// pure input to output; nothing is persisted.
pub fn convert(filename: &str, source: &str, from: Mode, opts: &ConvertOptions) -> Result<String, ErrorList> {
    let mut fset = FileSet::new();
    let file = parse_source(&mut fset, filename, source, from, opts)?;
    let to = match from {
        Mode::Curly => Syntax::Indented,
        Mode::Indented => Syntax::Curly,
    };
    let mut out = Vec::new();
    printer::emit(&mut out, &fset, Node::File(&file), &opts.config, to)
        .map_err(|e| vec![IndigoError::from(e)])?;
    String::from_utf8(out).map_err(|_| {
        vec![IndigoError::Emit {
            message: "printer produced invalid UTF-8".to_string(),
        }]
    })
}
