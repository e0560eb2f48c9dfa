//! Blockport - reconstructs SPIKE Prime Python programs from block programs.
//!
//! A block program arrives either as a rendered diagram (vector-graphics
//! markup) or as a project archive. Both are reduced to positioned block
//! records, classified against an ordered rule table, arranged into a nested
//! program by their layout and rendered as Python source.

pub mod classify;
pub mod codegen;
pub mod config;
pub mod structure;

mod error;

pub use blockport_core::{block, geometry, param, span};
pub use blockport_parser::{
    ArchiveSource, Diagnostic, DiagramSource, ErrorCode, ExtractError, MemoryArchive, Severity,
    ZipArchiveSource,
};

pub use codegen::GeneratedProgram;
pub use error::BlockportError;

use std::{fs::File, io::BufReader, path::Path};

use log::{debug, info};

use blockport_core::block::RawBlockRecord;
use blockport_parser::error::DiagnosticCollector;

use codegen::CodeGenerator;
use config::AppConfig;
use structure::{MAX_NESTING, ProgramTree};

/// How an input is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Vector-graphics markup.
    Diagram,
    /// A project archive.
    Archive,
}

impl InputFormat {
    /// Picks [`InputFormat::Diagram`] for `.svg` files and
    /// [`InputFormat::Archive`] otherwise.
    pub fn from_path(path: &Path) -> Self {
        let is_svg = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
        if is_svg { Self::Diagram } else { Self::Archive }
    }
}

/// The result of converting one input.
#[derive(Debug, Clone)]
pub struct Conversion {
    program: GeneratedProgram,
    diagnostics: Vec<Diagnostic>,
    diagram: Option<DiagramSource>,
}

impl Conversion {
    pub fn program(&self) -> &GeneratedProgram {
        &self.program
    }

    /// Warnings gathered along the way, in the order they were raised.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The diagram inside an archive that the blocks were read from.
    ///
    /// Diagnostic spans of an archive conversion index into this text. For
    /// [`Converter::convert_diagram`] they index into the caller's source and
    /// this is `None`.
    pub fn diagram(&self) -> Option<&DiagramSource> {
        self.diagram.as_ref()
    }

    pub fn into_program(self) -> GeneratedProgram {
        self.program
    }
}

/// Runs the conversion pipeline.
///
/// # Examples
///
/// ```
/// use blockport::{Converter, config::AppConfig};
///
/// let svg = r#"<svg>
///     <text x="0" y="0">when program starts</text>
///     <text x="0" y="40">motor A run for 3 seconds</text>
///     <text x="0" y="80">led set to red</text>
/// </svg>"#;
///
/// let converter = Converter::new(AppConfig::default());
/// let conversion = converter.convert_diagram(svg);
///
/// assert_eq!(
///     conversion.program().body(),
///     &[
///         "# when program starts",
///         "hub.port.A.motor.run_for_seconds(3.0)",
///         "hub.led('red')",
///     ]
/// );
/// assert!(conversion.diagnostics().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct Converter {
    config: AppConfig,
}

impl Converter {
    /// Creates a converter without checking the configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Creates a converter, rejecting unusable configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`BlockportError::Config`] describing the first invalid value.
    pub fn try_new(config: AppConfig) -> Result<Self, BlockportError> {
        config.validate().map_err(BlockportError::Config)?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Converts diagram markup.
    ///
    /// Never fails: malformed markup yields a warning and whatever blocks
    /// could be read, possibly none.
    pub fn convert_diagram(&self, source: &str) -> Conversion {
        info!(bytes = source.len(); "Converting diagram");
        let (records, diagnostics) = blockport_parser::parse_diagram(source).into_parts();
        self.convert_records(records, diagnostics, None)
    }

    /// Converts a project archive.
    ///
    /// # Errors
    ///
    /// Returns [`BlockportError::Extract`] when the archive is empty or holds
    /// nothing that describes blocks.
    pub fn convert_archive(
        &self,
        archive: &mut dyn ArchiveSource,
    ) -> Result<Conversion, BlockportError> {
        info!("Converting archive");
        let extraction =
            blockport_parser::extract(archive, self.config.layout().synthetic_layout())?;
        let (records, diagnostics, diagram) = extraction.into_parts();
        Ok(self.convert_records(records, diagnostics, diagram))
    }

    /// Reads and converts a file in the given format.
    ///
    /// # Errors
    ///
    /// Returns [`BlockportError::Io`] if the file cannot be read, and the
    /// errors of [`Converter::convert_archive`] for archives.
    pub fn convert_path(
        &self,
        path: &Path,
        format: InputFormat,
    ) -> Result<Conversion, BlockportError> {
        debug!(path:? = path, format:? = format; "Reading input");
        match format {
            InputFormat::Diagram => {
                let source = std::fs::read_to_string(path)?;
                Ok(self.convert_diagram(&source))
            }
            InputFormat::Archive => {
                let file = File::open(path)?;
                let mut archive = ZipArchiveSource::new(BufReader::new(file))?;
                self.convert_archive(&mut archive)
            }
        }
    }

    fn convert_records(
        &self,
        records: Vec<RawBlockRecord>,
        diagnostics: Vec<Diagnostic>,
        diagram: Option<DiagramSource>,
    ) -> Conversion {
        let mut collector = DiagnosticCollector::new();
        collector.extend(diagnostics);

        debug!(records = records.len(); "Classifying blocks");
        let blocks = classify::classify_all(records, &mut collector);

        let tree = ProgramTree::build(blocks, self.config.layout().indent_unit());
        if let Some(&first) = tree.flattened().first() {
            collector.emit(
                Diagnostic::warning(format!(
                    "{} control blocks reach the nesting limit of {MAX_NESTING}",
                    tree.flattened().len()
                ))
                .with_code(ErrorCode::W201)
                .with_optional_label(tree.node(first).block().record().span(), "first one here")
                .with_help("blocks indented under them were kept as their siblings"),
            );
        }
        let program = CodeGenerator::new(self.config.codegen()).generate(&tree);

        let diagnostics = collector.finish();
        info!(
            blocks = program.block_count(),
            warnings = diagnostics.len();
            "Conversion finished"
        );

        Conversion {
            program,
            diagnostics,
            diagram,
        }
    }
}
