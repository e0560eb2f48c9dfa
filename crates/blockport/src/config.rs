//! Configuration types for Blockport conversions.
//!
//! This module provides configuration structures that control how block
//! positions are interpreted and how generated code is laid out. All types
//! implement [`serde::Deserialize`] so they can be loaded from TOML.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout and codegen settings.
//! - [`LayoutConfig`] - Geometry used by the structure builder and archive extraction.
//! - [`CodegenConfig`] - Indentation and header options for generated programs.
//!
//! # Example
//!
//! ```
//! # use blockport::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.layout().indent_unit(), 20.0);
//! assert_eq!(config.codegen().indent_width(), 4);
//! assert!(config.validate().is_ok());
//! ```

use serde::Deserialize;

use blockport_parser::SyntheticLayout;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Code generation configuration section.
    #[serde(default)]
    codegen: CodegenConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(layout: LayoutConfig, codegen: CodegenConfig) -> Self {
        Self { layout, codegen }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the code generation configuration.
    pub fn codegen(&self) -> &CodegenConfig {
        &self.codegen
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        let positive = |name: &str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(format!("`layout.{name}` must be a positive number, got {value}"))
            }
        };

        positive("indent_unit", self.layout.indent_unit)?;
        positive("row_height", self.layout.row_height)?;

        if self.codegen.indent_width == 0 {
            return Err("`codegen.indent_width` must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Geometry of block layouts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    /// Horizontal offset, in diagram units, that opens a nesting level.
    #[serde(default = "default_indent_unit")]
    indent_unit: f32,

    /// Row spacing used to lay out archive records.
    #[serde(default = "default_row_height")]
    row_height: f32,
}

impl LayoutConfig {
    pub fn new(indent_unit: f32, row_height: f32) -> Self {
        Self {
            indent_unit,
            row_height,
        }
    }

    pub fn indent_unit(&self) -> f32 {
        self.indent_unit
    }

    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    /// The layout given to archive extraction.
    pub fn synthetic_layout(&self) -> SyntheticLayout {
        SyntheticLayout::new(self.indent_unit, self.row_height)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new(default_indent_unit(), default_row_height())
    }
}

/// Layout of generated source text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodegenConfig {
    /// Spaces per indentation level.
    #[serde(default = "default_indent_width")]
    indent_width: usize,

    /// Whether to emit the shebang and module docstring.
    #[serde(default = "default_header")]
    header: bool,
}

impl CodegenConfig {
    pub fn new(indent_width: usize, header: bool) -> Self {
        Self {
            indent_width,
            header,
        }
    }

    pub fn indent_width(&self) -> usize {
        self.indent_width
    }

    pub fn header(&self) -> bool {
        self.header
    }
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self::new(default_indent_width(), default_header())
    }
}

fn default_indent_unit() -> f32 {
    20.0
}

fn default_row_height() -> f32 {
    40.0
}

fn default_indent_width() -> usize {
    4
}

fn default_header() -> bool {
    true
}
