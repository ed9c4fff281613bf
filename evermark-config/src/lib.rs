//! Shared configuration loader for the evermark toolchain.
//!
//! `defaults/evermark.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`EvermarkConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use evermark_babel::formats::markdown::{
    DefinitionListStyle, ImageRendering, InternalLinkStyle, LineBreak, MediaEmbedding,
    RenderOptions,
};
use serde::Deserialize;
use std::path::Path;

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/evermark.default.toml");

/// Top-level configuration consumed by evermark applications.
#[derive(Debug, Clone, Deserialize)]
pub struct EvermarkConfig {
    pub render: RenderConfig,
    pub convert: ConvertConfig,
}

/// Mirrors the knobs exposed by the Markdown renderer.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub internal_link_style: InternalLinkStyle,
    pub definition_list_style: DefinitionListStyle,
    pub media_embedding: MediaEmbedding,
    pub image_rendering: ImageRendering,
    pub line_break: LineBreak,
    pub color_internal_links: bool,
    pub code_block_language: String,
    pub frontmatter: bool,
}

impl From<RenderConfig> for RenderOptions {
    fn from(config: RenderConfig) -> Self {
        RenderOptions {
            internal_link_style: config.internal_link_style,
            definition_list_style: config.definition_list_style,
            media_embedding: config.media_embedding,
            image_rendering: config.image_rendering,
            line_break: config.line_break,
            color_internal_links: config.color_internal_links,
            code_block_language: config.code_block_language,
            frontmatter: config.frontmatter,
        }
    }
}

impl From<&RenderConfig> for RenderOptions {
    fn from(config: &RenderConfig) -> Self {
        config.clone().into()
    }
}

/// Which notes a run converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMode {
    /// Only the given note
    Single,
    /// Every note of the folder
    All,
    /// The given note and every note reachable through its links
    Recursive,
}

impl ConversionMode {
    pub const NAMES: &'static [&'static str] = &["single", "all", "recursive"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionMode::Single => "single",
            ConversionMode::All => "all",
            ConversionMode::Recursive => "recursive",
        }
    }
}

/// Front-end conversion knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    pub mode: ConversionMode,
    pub copy_resources: bool,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (used for CLI flags).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<EvermarkConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<EvermarkConfig, ConfigError> {
    Loader::new().build()
}
