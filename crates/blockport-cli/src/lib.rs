//! CLI logic for the Blockport converter.
//!
//! Converts each input to a Python program and writes it to stdout, an
//! output file or an output directory. Warnings are rendered with miette
//! against the diagram they point into and logged; a failing input is
//! reported and skipped so the remaining inputs are still converted.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Format};

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{error, info, warn};
use thiserror::Error;

use blockport::{BlockportError, Conversion, Converter, InputFormat};

use error_adapter::{DiagnosticAdapter, render, to_reportable};

/// Errors reported by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Blockport(#[from] BlockportError),

    #[error("{}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: BlockportError,
    },

    #[error("{0}")]
    Usage(String),

    #[error("{failed} of {total} inputs failed to convert")]
    Failed { failed: usize, total: usize },
}

/// Run the Blockport CLI application
///
/// # Errors
///
/// Returns `CliError` for:
/// - Configuration loading errors
/// - Conflicting output options
/// - Inputs that could not be converted (after all inputs were tried)
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(inputs = args.inputs.len(); "Processing inputs");

    if args.inputs.len() > 1 && args.out_dir.is_none() {
        return Err(CliError::Usage(
            "multiple inputs need --out-dir".to_string(),
        ));
    }

    let app_config = config::load_config(args.config.as_ref())?;
    let converter = Converter::try_new(app_config)?;

    if let Some(dir) = &args.out_dir {
        fs::create_dir_all(dir).map_err(BlockportError::from)?;
    }

    let mut failed = 0;
    for input in &args.inputs {
        let path = Path::new(input);
        if let Err(err) = convert_input(&converter, path, args) {
            error!("{}", render(&to_reportable(&err)));
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(CliError::Failed {
            failed,
            total: args.inputs.len(),
        });
    }
    Ok(())
}

fn convert_input(converter: &Converter, path: &Path, args: &Args) -> Result<(), CliError> {
    let input_error = |source: BlockportError| CliError::Input {
        path: path.to_path_buf(),
        source,
    };

    let format = args.format.resolve(path);
    info!(input:? = path, format:? = format; "Converting input");

    let (conversion, source) = match format {
        InputFormat::Diagram => {
            let source = fs::read_to_string(path).map_err(|err| input_error(err.into()))?;
            (converter.convert_diagram(&source), Some(source))
        }
        InputFormat::Archive => (
            converter
                .convert_path(path, InputFormat::Archive)
                .map_err(input_error)?,
            None,
        ),
    };

    report_warnings(path, &conversion, source.as_deref());

    let program = conversion.into_program();
    match output_path(path, args) {
        Some(output) => {
            fs::write(&output, program.source()).map_err(|err| input_error(err.into()))?;
            info!(output:? = output, blocks = program.block_count(); "Program written");
        }
        None => print!("{program}"),
    }
    Ok(())
}

/// Where the program for `input` goes; `None` means stdout.
fn output_path(input: &Path, args: &Args) -> Option<PathBuf> {
    if let Some(output) = &args.output {
        return Some(PathBuf::from(output));
    }
    let dir = args.out_dir.as_ref()?;
    let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
    name.push(".py");
    Some(Path::new(dir).join(name))
}

fn report_warnings(path: &Path, conversion: &Conversion, source: Option<&str>) {
    let source = source.or_else(|| conversion.diagram().map(|diagram| diagram.text()));
    for diagnostic in conversion.diagnostics() {
        let adapter = DiagnosticAdapter::new(diagnostic, source);
        warn!(input:? = path; "{}", render(&adapter));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(inputs: &[&str], output: Option<&str>, out_dir: Option<&str>) -> Args {
        Args {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            output: output.map(str::to_string),
            out_dir: out_dir.map(str::to_string),
            config: None,
            log_level: "off".to_string(),
            format: Format::Auto,
        }
    }

    #[test]
    fn test_output_path_selection() {
        let input = Path::new("programs/blink.llsp3");

        assert_eq!(output_path(input, &args(&["x"], None, None)), None);
        assert_eq!(
            output_path(input, &args(&["x"], Some("out.py"), None)),
            Some(PathBuf::from("out.py"))
        );
        assert_eq!(
            output_path(input, &args(&["x"], None, Some("build"))),
            Some(PathBuf::from("build/blink.py"))
        );
    }

    #[test]
    fn test_multiple_inputs_need_out_dir() {
        let err = run(&args(&["a.svg", "b.svg"], None, None)).unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }
}
