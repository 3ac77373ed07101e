// src/core/parameters.rs

use crate::constants::{PARAM_PREFIX, PLACEHOLDER_STEM};
use serde::Serialize;
use std::path::{Path, PathBuf};

// --- DATA STRUCTS ---

/// The value given to one tool parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamValue {
    /// Emitted verbatim after the parameter name.
    Text(String),
    /// A valueless option: only `-NAME` is emitted.
    Switch,
    /// "Allocate a throwaway file for this parameter." The extension, when given,
    /// tells the external tool which format to write.
    Temp { extension: Option<String> },
}

/// A parameter after placeholder substitution, as it ends up on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedParam {
    pub name: String,
    /// `None` for switches.
    pub value: Option<String>,
    /// Whether `value` is a path allocated for a placeholder.
    pub temporary: bool,
}

/// Tool parameters in the order the caller supplied them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    entries: Vec<(String, ParamValue)>,
}

// --- VALUES ---

impl ParamValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// A placeholder without an extension.
    pub fn temp() -> Self {
        Self::Temp { extension: None }
    }

    /// A placeholder whose allocated path ends in `.{extension}`.
    pub fn temp_with_extension(extension: impl AsRef<str>) -> Self {
        let extension = extension.as_ref().trim_start_matches('.');
        Self::Temp {
            extension: (!extension.is_empty()).then(|| extension.to_string()),
        }
    }

    /// Interprets textual input the way the command line and pipeline files do:
    /// `temp` or `temp.<ext>` that does not name an existing file is a placeholder,
    /// anything else is text.
    pub fn parse(raw: &str) -> Self {
        let path = Path::new(raw);
        let is_placeholder_stem = path.file_stem().and_then(|s| s.to_str()) == Some(PLACEHOLDER_STEM)
            && path.parent().is_none_or(|p| p.as_os_str().is_empty());
        if is_placeholder_stem && !path.exists() {
            match path.extension().and_then(|e| e.to_str()) {
                Some(extension) => Self::temp_with_extension(extension),
                None => Self::temp(),
            }
        } else {
            Self::Text(raw.to_string())
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Temp { .. })
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<&Path> for ParamValue {
    fn from(value: &Path) -> Self {
        Self::Text(value.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for ParamValue {
    fn from(value: PathBuf) -> Self {
        Self::from(value.as_path())
    }
}

impl From<&PathBuf> for ParamValue {
    fn from(value: &PathBuf) -> Self {
        Self::from(value.as_path())
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    Self::Text(value.to_string())
                }
            }
        )*
    };
}

impl_from_number!(i32, i64, u32, u64, usize, f32, f64);

// --- PARAMETER SET ---

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Parameters::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds a parameter. Re-inserting a name replaces its value in place, keeping its
    /// original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Parameters
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl IntoIterator for Parameters {
    type Item = (String, ParamValue);
    type IntoIter = std::vec::IntoIter<(String, ParamValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// --- ENCODING ---

/// The option token for a parameter name: `-` followed by the upper-cased name.
pub fn option_token(name: &str) -> String {
    format!("{}{}", PARAM_PREFIX, name.to_uppercase())
}

/// Encodes resolved parameters as command tokens, `-NAME value` per parameter and a
/// lone `-NAME` per switch, preserving order.
pub fn encode(params: &[ResolvedParam]) -> Vec<String> {
    let mut tokens = Vec::with_capacity(params.len() * 2);
    for param in params {
        tokens.push(option_token(&param.name));
        if let Some(value) = &param.value {
            tokens.push(value.clone());
        }
    }
    tokens
}

/// Formats resolved parameters on one line, the way they read in verbose output.
pub fn format_inline(params: &[ResolvedParam]) -> String {
    params
        .iter()
        .map(|param| match &param.value {
            Some(value) => format!("{}={}", option_token(&param.name), value),
            None => option_token(&param.name),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits a `NAME=VALUE` assignment from the command line. The value goes through
/// [`ParamValue::parse`], so `temp.sdat` requests a placeholder.
pub fn parse_assignment(raw: &str) -> Option<(String, ParamValue)> {
    let (name, value) = raw.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), ParamValue::parse(value)))
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(name: &str, value: Option<&str>) -> ResolvedParam {
        ResolvedParam {
            name: name.to_string(),
            value: value.map(str::to_string),
            temporary: false,
        }
    }

    #[test]
    fn test_insert_keeps_caller_order() {
        let params = Parameters::new()
            .with("slope", "slope.tif")
            .with("elevation", "dem.tif")
            .with("aspect", "aspect.tif");
        let names: Vec<_> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["slope", "elevation", "aspect"]);
    }

    #[test]
    fn test_reinsert_replaces_in_place() {
        let mut params = Parameters::new().with("a", "1").with("b", "2");
        params.insert("a", "3");
        assert_eq!(params.len(), 2);
        let entries: Vec<_> = params.into_iter().collect();
        assert_eq!(entries[0], ("a".to_string(), ParamValue::text("3")));
    }

    #[test]
    fn test_encode_pairs_and_switches() {
        let tokens = encode(&[
            resolved("elevation", Some("dem.tif")),
            resolved("unit", None),
            resolved("method", Some("0")),
        ]);
        assert_eq!(tokens, vec!["-ELEVATION", "dem.tif", "-UNIT", "-METHOD", "0"]);
    }

    #[test]
    fn test_encode_passes_values_with_spaces_as_one_token() {
        let tokens = encode(&[resolved("grid", Some("my dem.sdat"))]);
        assert_eq!(tokens, vec!["-GRID", "my dem.sdat"]);
    }

    #[test]
    fn test_parse_placeholder_forms() {
        assert_eq!(ParamValue::parse("temp"), ParamValue::temp());
        assert_eq!(
            ParamValue::parse("temp.sdat"),
            ParamValue::temp_with_extension("sdat")
        );
        assert_eq!(ParamValue::parse("dem.tif"), ParamValue::text("dem.tif"));
        assert_eq!(
            ParamValue::parse("data/temp.sdat"),
            ParamValue::text("data/temp.sdat")
        );
    }

    #[test]
    fn test_parse_existing_temp_file_is_text() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("temp.tif");
        std::fs::write(&existing, b"").unwrap();
        let raw = existing.to_string_lossy().into_owned();
        assert_eq!(ParamValue::parse(&raw), ParamValue::Text(raw.clone()));
    }

    #[test]
    fn test_temp_with_extension_strips_dot() {
        assert_eq!(
            ParamValue::temp_with_extension(".shp"),
            ParamValue::Temp {
                extension: Some("shp".to_string())
            }
        );
        assert_eq!(ParamValue::temp_with_extension(""), ParamValue::temp());
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("elevation=dem.tif"),
            Some(("elevation".to_string(), ParamValue::text("dem.tif")))
        );
        assert_eq!(
            parse_assignment("query=a=b"),
            Some(("query".to_string(), ParamValue::text("a=b")))
        );
        assert_eq!(parse_assignment("=x"), None);
        assert_eq!(parse_assignment("novalue"), None);
    }

    #[test]
    fn test_format_inline() {
        let line = format_inline(&[resolved("dem", Some("a.sdat")), resolved("x", None)]);
        assert_eq!(line, "-DEM=a.sdat -X");
    }
}
