//! Style attribute normalization.
//!
//! Evernote notes carry twenty years of editor history: the same bold text may arrive as
//! `<b>`, `<strong>`, `<span style="font-weight: bold">` or `<span style="font-weight:700">`,
//! and code as `<code>`, `<tt>`, `<font face="Courier New">` or a `font-family` declaration
//! that was garbled by repeated re-exports. This module maps every known surface form to one
//! canonical [`StyleAttr`], so nothing downstream ever looks at tag names or CSS again.
//!
//! The mapping is table driven:
//!
//! | Surface form                                    | Canonical attribute   |
//! |-------------------------------------------------|-----------------------|
//! | `b`, `strong`, `font-weight: bold/bolder/600+`  | `Bold`                |
//! | `i`, `em`, `font-style: italic/oblique`         | `Italic`              |
//! | `u`, `ins`, `text-decoration: underline`        | `Underline`           |
//! | `s`, `strike`, `del`, `text-decoration: line-through` | `Strikethrough` |
//! | `sup`, `vertical-align: super`                  | `Superscript`         |
//! | `sub`, `vertical-align: sub`                    | `Subscript`           |
//! | `small`                                         | `Superscript + Subscript` |
//! | `code`, `tt`, `kbd`, `samp`, monospace fonts    | `Code`                |
//! | `color`, `<font color>`                         | `Color(#rrggbb)`      |
//! | `center`, `align`, `text-align: center/right`   | `Align`               |
//! | `abbr title`                                    | `Abbr(title)`         |
//!
//! Styling outside the table is ignored, unless it looks like a known export defect (a
//! malformed or unknown font family), which is reported so a human can check the note.

use crate::common::links::LinkTarget;
use crate::ir::nodes::Alignment;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Fonts rendered as inline code.
const MONOSPACE_FONTS: &[&str] = &[
    "andale mono",
    "consolas",
    "courier",
    "courier new",
    "lucida console",
    "menlo",
    "monaco",
    "monospace",
    "source code pro",
];

/// Proportional fonts seen in exports that carry no meaning.
const PROPORTIONAL_FONTS: &[&str] = &[
    "arial",
    "calibri",
    "georgia",
    "gotham",
    "helvetica",
    "helvetica neue",
    "lucida sans unicode",
    "sans-serif",
    "serif",
    "tahoma",
    "times new roman",
    "verdana",
    "wingdings",
];

/// Pixels per indentation level in `margin-left`/`padding-left` declarations.
const INDENT_PX: f32 = 40.0;

/// Evernote sometimes exports `font-family: ";"` after dropping the family name.
static GARBLED_FONT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(;\} |;)""#).expect("valid garbled font regex"));

/// A canonical style dimension and its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleAttr {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
    Code,
    Color(String),
    Align(Alignment),
    Abbr(String),
    Link(LinkTarget),
}

impl StyleAttr {
    /// Single-valued dimensions: at most one attribute per dimension lives in a set.
    fn same_dimension(&self, other: &StyleAttr) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// A normalized set of style attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StyleSet(BTreeSet<StyleAttr>);

impl StyleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an attribute, replacing any other value of the same dimension.
    pub fn insert(&mut self, attr: StyleAttr) {
        self.0.retain(|existing| !existing.same_dimension(&attr));
        self.0.insert(attr);
    }

    pub fn remove(&mut self, attr: &StyleAttr) -> bool {
        self.0.remove(attr)
    }

    pub fn contains(&self, attr: &StyleAttr) -> bool {
        self.0.contains(attr)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleAttr> {
        self.0.iter()
    }

    /// `self` overridden by `inner`, the way a nested element inherits from its parent.
    pub fn inherit(&self, inner: &StyleSet) -> StyleSet {
        let mut merged = self.clone();
        for attr in inner.iter() {
            merged.insert(attr.clone());
        }
        merged
    }

    pub fn intersection(&self, other: &StyleSet) -> StyleSet {
        StyleSet(self.0.intersection(&other.0).cloned().collect())
    }

    pub fn difference(&self, other: &StyleSet) -> StyleSet {
        StyleSet(self.0.difference(&other.0).cloned().collect())
    }

    pub fn color(&self) -> Option<&str> {
        self.0.iter().find_map(|attr| match attr {
            StyleAttr::Color(color) => Some(color.as_str()),
            _ => None,
        })
    }

    pub fn align(&self) -> Option<Alignment> {
        self.0.iter().find_map(|attr| match attr {
            StyleAttr::Align(align) => Some(*align),
            _ => None,
        })
    }

    pub fn abbr(&self) -> Option<&str> {
        self.0.iter().find_map(|attr| match attr {
            StyleAttr::Abbr(title) => Some(title.as_str()),
            _ => None,
        })
    }

    pub fn link(&self) -> Option<&LinkTarget> {
        self.0.iter().find_map(|attr| match attr {
            StyleAttr::Link(target) => Some(target),
            _ => None,
        })
    }

    /// Express the set as CSS declarations. Abbreviations and links have no CSS form and are
    /// left out.
    pub fn to_css(&self) -> String {
        let mut declarations = Vec::new();
        let mut decorations = Vec::new();
        for attr in self.iter() {
            match attr {
                StyleAttr::Bold => declarations.push("font-weight: bold".to_string()),
                StyleAttr::Italic => declarations.push("font-style: italic".to_string()),
                StyleAttr::Underline => decorations.push("underline"),
                StyleAttr::Strikethrough => decorations.push("line-through"),
                StyleAttr::Superscript => declarations.push("vertical-align: super".to_string()),
                StyleAttr::Subscript => declarations.push("vertical-align: sub".to_string()),
                StyleAttr::Code => declarations.push("font-family: monospace".to_string()),
                StyleAttr::Color(color) => declarations.push(format!("color: {color}")),
                StyleAttr::Align(Alignment::Center) => {
                    declarations.push("text-align: center".to_string())
                }
                StyleAttr::Align(Alignment::Right) => {
                    declarations.push("text-align: right".to_string())
                }
                StyleAttr::Align(_) | StyleAttr::Abbr(_) | StyleAttr::Link(_) => {}
            }
        }
        if !decorations.is_empty() {
            declarations.push(format!("text-decoration: {}", decorations.join(" ")));
        }
        declarations.join("; ")
    }
}

impl FromIterator<StyleAttr> for StyleSet {
    fn from_iter<T: IntoIterator<Item = StyleAttr>>(iter: T) -> Self {
        let mut set = StyleSet::new();
        for attr in iter {
            set.insert(attr);
        }
        set
    }
}

/// Parsed CSS declarations of a `style` attribute, keys lowercased.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Declarations(Vec<(String, String)>);

impl Declarations {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Split a `style` attribute into declarations, repairing known export damage first.
pub fn parse_declarations(style: &str) -> Declarations {
    let repaired = GARBLED_FONT.replace_all(style, "\"Courier New\"");
    let mut declarations = Vec::new();

    for token in repaired.split(';') {
        let Some((key, value)) = token.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim().trim_end_matches("!important").trim();
        if key.is_empty() {
            continue;
        }
        // Aliases
        let key = match key.as_str() {
            "text-decoration-line" => "text-decoration".to_string(),
            "--en-codeblock" => "-en-codeblock".to_string(),
            _ => key,
        };
        declarations.push((key, value.to_string()));
    }

    Declarations(declarations)
}

/// Result of normalizing some styling: the canonical set plus anything suspicious.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Normalized {
    pub style: StyleSet,
    pub suspicious: Vec<String>,
}

impl Normalized {
    fn merge(&mut self, other: Normalized) {
        self.style = self.style.inherit(&other.style);
        self.suspicious.extend(other.suspicious);
    }
}

/// Map CSS declarations to canonical attributes.
pub fn normalize_declarations(declarations: &Declarations) -> Normalized {
    let mut normalized = Normalized::default();
    let style = &mut normalized.style;

    if let Some(value) = declarations.get("font-style") {
        if matches!(value.to_ascii_lowercase().as_str(), "italic" | "oblique") {
            style.insert(StyleAttr::Italic);
        }
    }
    if let Some(value) = declarations.get("font-weight") {
        if is_bold_weight(value) {
            style.insert(StyleAttr::Bold);
        }
    }
    if let Some(value) = declarations.get("text-decoration") {
        let value = value.to_ascii_lowercase();
        if value.split_whitespace().any(|t| t == "underline") {
            style.insert(StyleAttr::Underline);
        }
        if value.split_whitespace().any(|t| t == "line-through") {
            style.insert(StyleAttr::Strikethrough);
        }
    }
    match declarations
        .get("vertical-align")
        .map(|v| v.to_ascii_lowercase())
        .as_deref()
    {
        Some("super") => style.insert(StyleAttr::Superscript),
        Some("sub") => style.insert(StyleAttr::Subscript),
        _ => {}
    }
    if let Some(value) = declarations.get("font-family") {
        match classify_font_family(value) {
            FontClass::Monospace => style.insert(StyleAttr::Code),
            FontClass::Proportional => {}
            FontClass::Unknown(name) => normalized
                .suspicious
                .push(format!("unknown font family '{name}'")),
            FontClass::Malformed => normalized
                .suspicious
                .push(format!("malformed font-family value '{value}'")),
        }
    }
    if let Some(color) = declarations.get("color").and_then(canonical_color) {
        normalized.style.insert(StyleAttr::Color(color));
    }
    if let Some(value) = declarations.get("text-align") {
        if let align @ (Alignment::Center | Alignment::Right) = Alignment::parse(value) {
            normalized.style.insert(StyleAttr::Align(align));
        }
    }

    normalized
}

/// Normalize an element: its tag name, presentational attributes and inline style.
///
/// `attr` looks up an attribute value on the element.
pub fn normalize_element<F>(tag: &str, attr: F) -> Normalized
where
    F: Fn(&str) -> Option<String>,
{
    let mut normalized = Normalized {
        style: tag_style(tag, &attr),
        suspicious: Vec::new(),
    };

    if tag == "font" {
        if let Some(face) = attr("face") {
            match classify_font_family(&face) {
                FontClass::Monospace => normalized.style.insert(StyleAttr::Code),
                FontClass::Proportional => {}
                FontClass::Unknown(name) => normalized
                    .suspicious
                    .push(format!("unknown font '{name}'")),
                FontClass::Malformed => normalized
                    .suspicious
                    .push(format!("malformed font face '{face}'")),
            }
        }
        if let Some(color) = attr("color").and_then(|c| canonical_color(&c)) {
            normalized.style.insert(StyleAttr::Color(color));
        }
    }

    if let Some(align) = attr("align") {
        if let align @ (Alignment::Center | Alignment::Right) = Alignment::parse(&align) {
            normalized.style.insert(StyleAttr::Align(align));
        }
    }

    if let Some(style) = attr("style") {
        normalized.merge(normalize_declarations(&parse_declarations(&style)));
    }

    normalized
}

fn tag_style<F>(tag: &str, attr: &F) -> StyleSet
where
    F: Fn(&str) -> Option<String>,
{
    let attrs = match tag {
        "b" | "strong" => vec![StyleAttr::Bold],
        "i" | "em" | "cite" | "dfn" | "var" => vec![StyleAttr::Italic],
        "u" | "ins" => vec![StyleAttr::Underline],
        "s" | "strike" | "del" => vec![StyleAttr::Strikethrough],
        "sup" => vec![StyleAttr::Superscript],
        "sub" => vec![StyleAttr::Subscript],
        "small" => vec![StyleAttr::Superscript, StyleAttr::Subscript],
        "code" | "tt" | "kbd" | "samp" => vec![StyleAttr::Code],
        "center" => vec![StyleAttr::Align(Alignment::Center)],
        "abbr" | "acronym" => {
            let title = attr("title").unwrap_or_else(|| " ".to_string());
            vec![StyleAttr::Abbr(title)]
        }
        _ => Vec::new(),
    };
    attrs.into_iter().collect()
}

/// Evernote code blocks are `<div style="-en-codeblock: true">`.
pub fn is_codeblock(declarations: &Declarations) -> bool {
    declarations
        .get("-en-codeblock")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Indentation levels implied by `margin-left` or `padding-left`.
pub fn indent_level(declarations: &Declarations) -> usize {
    ["margin-left", "padding-left"]
        .iter()
        .filter_map(|key| declarations.get(key))
        .filter_map(css_length_px)
        .map(|px| (px / INDENT_PX).round().max(0.0) as usize)
        .max()
        .unwrap_or(0)
}

fn css_length_px(value: &str) -> Option<f32> {
    let value = value.trim().to_ascii_lowercase();
    if let Some(px) = value.strip_suffix("px") {
        px.trim().parse().ok()
    } else if let Some(em) = value.strip_suffix("em") {
        em.trim().parse::<f32>().ok().map(|em| em * 16.0)
    } else if value == "0" {
        Some(0.0)
    } else {
        None
    }
}

fn is_bold_weight(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "bold" | "bolder" => true,
        _ => value.parse::<u16>().is_ok_and(|weight| weight >= 600),
    }
}

enum FontClass {
    Monospace,
    Proportional,
    Unknown(String),
    Malformed,
}

fn classify_font_family(value: &str) -> FontClass {
    let value = value.trim();
    if value.is_empty()
        || value.contains([';', '}', '{'])
        || value.matches('"').count() % 2 == 1
        || value.matches('\'').count() % 2 == 1
    {
        return FontClass::Malformed;
    }

    let families: Vec<String> = value
        .split(',')
        .map(|f| f.trim().trim_matches(['"', '\'']).trim().to_ascii_lowercase())
        .filter(|f| !f.is_empty())
        .collect();

    if families
        .iter()
        .any(|f| f.contains("courier") || MONOSPACE_FONTS.contains(&f.as_str()))
    {
        return FontClass::Monospace;
    }

    match families.first() {
        None => FontClass::Malformed,
        Some(first) if PROPORTIONAL_FONTS.contains(&first.as_str()) => FontClass::Proportional,
        // Any known fallback in the stack means the author picked a real font
        Some(_) if families.iter().any(|f| PROPORTIONAL_FONTS.contains(&f.as_str())) => {
            FontClass::Proportional
        }
        Some(first) => FontClass::Unknown(first.clone()),
    }
}

/// Canonical form of a CSS color: `#rrggbb`, a lowercase name, or `rgba(...)`.
///
/// Black is the default text color and normalizes to nothing.
pub fn canonical_color(value: &str) -> Option<String> {
    let value = value.trim().to_ascii_lowercase();
    let canonical = if let Some(hex) = value.strip_prefix('#') {
        canonical_hex(hex)?
    } else if let Some(args) = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        canonical_rgb(args)?
    } else if !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic()) {
        match value.as_str() {
            "inherit" | "initial" | "unset" | "currentcolor" | "windowtext" => return None,
            _ => value,
        }
    } else {
        return None;
    };

    match canonical.as_str() {
        "black" | "#000000" => None,
        _ => Some(canonical),
    }
}

fn canonical_hex(hex: &str) -> Option<String> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => Some(format!(
            "#{}",
            hex.chars().flat_map(|c| [c, c]).collect::<String>()
        )),
        6 => Some(format!("#{hex}")),
        _ => None,
    }
}

fn canonical_rgb(args: &str) -> Option<String> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let channel = |s: &str| s.parse::<u8>().ok();
    match parts.as_slice() {
        [r, g, b] => Some(format!(
            "#{:02x}{:02x}{:02x}",
            channel(r)?,
            channel(g)?,
            channel(b)?
        )),
        [r, g, b, a] => {
            let (r, g, b) = (channel(r)?, channel(g)?, channel(b)?);
            let alpha: f32 = a.parse().ok()?;
            if alpha >= 1.0 {
                Some(format!("#{r:02x}{g:02x}{b:02x}"))
            } else {
                Some(format!("rgba({r}, {g}, {b}, {alpha})"))
            }
        }
        _ => None,
    }
}
