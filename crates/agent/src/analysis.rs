use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::prompt::DERIVED_MARKER;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedWord {
    #[serde(default)]
    pub hebrew: String,
    #[serde(default)]
    pub translit: String,
    #[serde(default)]
    pub english: String,
}

impl DerivedWord {
    pub fn label(&self) -> String {
        format!("{} - {} - {}", self.hebrew, self.translit, self.english)
    }
}

/// Structured view of one model completion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModelAnalysis {
    pub main_text: String,
    pub derived: Vec<DerivedWord>,
    pub hebrew_root: Option<String>,
    pub arabic_root: Option<String>,
    pub arabic_examples: Vec<String>,
}

impl ModelAnalysis {
    pub fn parse(raw: &str) -> Self {
        let (main_text, derived_json) = split_derived_block(raw);
        let derived = derived_json.map(parse_derived).unwrap_or_default();

        let lines: Vec<&str> =
            main_text.lines().map(str::trim).filter(|line| !line.is_empty()).collect();
        let hebrew_root = lines.iter().find_map(|line| hebrew_root(line));
        let arabic_root = lines.iter().find_map(|line| arabic_root(line)).flatten();
        let arabic_examples =
            if arabic_root.is_some() { arabic_examples(&lines) } else { Vec::new() };

        Self { main_text, derived, hebrew_root, arabic_root, arabic_examples }
    }

    /// Text shown to the user and, if they save it, written to the sheet.
    pub fn explanation(&self) -> String {
        if self.derived.is_empty() {
            return self.main_text.clone();
        }

        let mut text = self.main_text.clone();
        text.push_str("\n\nDerived words:");
        for word in &self.derived {
            text.push_str("\n* ");
            text.push_str(&word.label());
        }
        text
    }
}

fn split_derived_block(raw: &str) -> (String, Option<String>) {
    if let Some((main, json)) = raw.split_once(DERIVED_MARKER) {
        return (main.trim().to_owned(), Some(json.to_owned()));
    }

    match find_object_array(raw) {
        Some((start, end)) => {
            let main = format!("{}{}", &raw[..start], &raw[end..]);
            (main.trim().to_owned(), Some(raw[start..end].to_owned()))
        }
        None => (raw.trim().to_owned(), None),
    }
}

/// Byte range of the outermost `[ { ... } ]` span, if the text has one.
fn find_object_array(raw: &str) -> Option<(usize, usize)> {
    let start = raw
        .match_indices('[')
        .map(|(idx, _)| idx)
        .find(|&idx| raw[idx + 1..].trim_start().starts_with('{'))?;
    let end = raw
        .rmatch_indices(']')
        .map(|(idx, _)| idx)
        .find(|&idx| idx > start && raw[..idx].trim_end().ends_with('}'))?;
    Some((start, end + 1))
}

fn parse_derived(json: String) -> Vec<DerivedWord> {
    let mut json = json.trim();
    json = json.strip_prefix("```json").or_else(|| json.strip_prefix("```")).unwrap_or(json);
    json = json.strip_suffix("```").unwrap_or(json).trim();

    match serde_json::from_str::<Vec<DerivedWord>>(json) {
        Ok(words) => words,
        Err(error) => {
            warn!(error = %error, "failed to parse derived words block");
            Vec::new()
        }
    }
}

fn hebrew_root(line: &str) -> Option<String> {
    let (_, rest) = line.split_once(" root =")?;
    let (root, _) = rest.split_once("core meaning")?;
    let root = root.trim();
    (!root.is_empty()).then(|| root.to_owned())
}

/// `Some(None)` when the model explicitly said there is no cognate.
fn arabic_root(line: &str) -> Option<Option<String>> {
    let rest = line.strip_prefix("Arabic cognate root")?;
    if rest.contains("= none") {
        return Some(None);
    }

    let (root, meaning) = rest.split_once('=')?;
    let (root, meaning) = (root.trim(), meaning.trim());
    if root.is_empty() {
        return None;
    }
    Some(Some(format!("{root} {meaning}")))
}

fn arabic_examples(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .skip_while(|line| !line.starts_with("Arabic examples"))
        .skip(1)
        .filter(|line| line.starts_with('*'))
        .map(|line| line.trim_start_matches(['*', ' ']).trim().to_owned())
        .collect()
}
