use serde::{Deserialize, Serialize};

/// Configuration for the Markdown renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// How links between notes are written
    pub internal_link_style: InternalLinkStyle,

    /// How definition lists are written
    pub definition_list_style: DefinitionListStyle,

    /// How links to non-image attachments are written
    pub media_embedding: MediaEmbedding,

    /// How images are written
    pub image_rendering: ImageRendering,

    /// How soft line breaks inside a paragraph are written
    pub line_break: LineBreak,

    /// Keep the green Evernote paints internal links with
    pub color_internal_links: bool,

    /// Fence language for Evernote code blocks (empty for none)
    pub code_block_language: String,

    /// Emit the YAML frontmatter block
    pub frontmatter: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            internal_link_style: InternalLinkStyle::Wiki,
            definition_list_style: DefinitionListStyle::Native,
            media_embedding: MediaEmbedding::PlaceholderLink,
            image_rendering: ImageRendering::RawMarkupTag,
            line_break: LineBreak::Backslash,
            color_internal_links: false,
            code_block_language: "bash".to_string(),
            frontmatter: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InternalLinkStyle {
    /// `[[Note]]` or `[[Note|label]]`
    Wiki,
    /// `[label](Note.md)`
    Markdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefinitionListStyle {
    /// `Term` followed by `: description` lines
    Native,
    /// Raw `<dl>` markup
    RawMarkup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaEmbedding {
    /// `[label](path)`, the label as written in the note
    PlaceholderLink,
    /// `[file.pdf](path)` for previewable media, so viewers can inline them
    AutoPreviewLink,
    /// `![[path]]`
    NativeTransclusion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageRendering {
    /// `<img src alt width height>`
    RawMarkupTag,
    /// `![alt|WxH](src)`
    MarkdownImageSyntax,
    /// `![[src|W]]`
    NativeTransclusion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineBreak {
    /// A trailing `\`
    Backslash,
    /// A trailing `<br>`
    Html,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = RenderOptions::default();
        assert_eq!(options.internal_link_style, InternalLinkStyle::Wiki);
        assert_eq!(options.code_block_language, "bash");
        assert!(options.frontmatter);
    }

    #[test]
    fn test_kebab_case_names() {
        let value: MediaEmbedding = serde_yaml::from_str("auto-preview-link").unwrap();
        assert_eq!(value, MediaEmbedding::AutoPreviewLink);
        let value: ImageRendering = serde_yaml::from_str("markdown-image-syntax").unwrap();
        assert_eq!(value, ImageRendering::MarkdownImageSyntax);
    }
}
