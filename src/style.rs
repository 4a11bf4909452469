//! Direction and font metadata carried by a language pack, plus the optional
//! projection of that metadata into named style properties.
//!
//! The engine does not implement typography. It only reads a `direction`
//! field and a map of named font roles from the loaded document and hands
//! each value to a host-provided [`StyleSink`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Text direction of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

/// Font weight, restricted to the values a style sheet accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontWeight {
    #[serde(rename = "100")]
    W100,
    #[serde(rename = "200")]
    W200,
    #[serde(rename = "300")]
    W300,
    #[serde(rename = "400")]
    W400,
    #[serde(rename = "500")]
    W500,
    #[serde(rename = "600")]
    W600,
    #[serde(rename = "700")]
    W700,
    #[serde(rename = "800")]
    W800,
    #[serde(rename = "900")]
    W900,
    #[serde(rename = "bold")]
    Bold,
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "lighter")]
    Lighter,
}

impl FontWeight {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontWeight::W100 => "100",
            FontWeight::W200 => "200",
            FontWeight::W300 => "300",
            FontWeight::W400 => "400",
            FontWeight::W500 => "500",
            FontWeight::W600 => "600",
            FontWeight::W700 => "700",
            FontWeight::W800 => "800",
            FontWeight::W900 => "900",
            FontWeight::Bold => "bold",
            FontWeight::Normal => "normal",
            FontWeight::Lighter => "lighter",
        }
    }
}

/// Font slant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Normal,
    Italic,
}

impl FontStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
        }
    }
}

/// One named font role (e.g. `"regular"`, `"heading"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontFace {
    pub family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
}

/// The style metadata block of a language pack document.
///
/// Roles are kept in a `BTreeMap` so projection order is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleBlock {
    pub direction: Direction,
    #[serde(default)]
    pub fonts: BTreeMap<String, FontFace>,
}

/// Documents that carry a [`StyleBlock`] and can therefore participate in
/// style projection.
pub trait StyleAware {
    fn style(&self) -> &StyleBlock;
}

/// Destination for projected style properties.
///
/// A browser host would forward these to the document element's style;
/// tests typically record them in a vector.
pub trait StyleSink: Send + Sync {
    fn set_property(&self, name: &str, value: &str);
}

/// Write the direction and every font role of `doc` to `sink`.
///
/// Property names follow the `--ls_*` scheme: `--ls_dir` for the direction
/// and `--ls_{role}_font-family` / `--ls_{role}_font-style` /
/// `--ls_{role}_font-weight` per role.
pub(crate) fn project<D: StyleAware>(sink: &dyn StyleSink, doc: &D) {
    let style = doc.style();

    sink.set_property("--ls_dir", style.direction.as_str());
    for (role, font) in &style.fonts {
        sink.set_property(&format!("--ls_{role}_font-family"), &font.family);
        sink.set_property(&format!("--ls_{role}_font-style"), font.style.as_str());
        sink.set_property(&format!("--ls_{role}_font-weight"), font.weight.as_str());
    }
}
