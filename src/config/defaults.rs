/// Parsing of the tool defaults source, a C-style header shipped with the
/// consensus caller. Lines of the form `#define DEFAULT_<NAME> <value>`
/// carry the startup defaults; `#define VERSION "x.y.z"` carries the tool
/// version. Unrecognized declaration names are ignored.

use crate::config::defs::PipelineError;

const DEFINE_MARKER: &str = "#define ";

/// Defaults are loaded once at startup and never mutated afterwards;
/// user-facing current values live in `RunParameters`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefaults {
    pub primer_offset: i64,
    pub min_base_quality: i64,
    pub min_depth: i64,
    pub min_freq: f64,
    pub ambig_symbol: String,
    pub version: String,
}

impl Default for ToolDefaults {
    fn default() -> Self {
        ToolDefaults {
            primer_offset: 0,
            min_base_quality: 0,
            min_depth: 0,
            min_freq: 0.0,
            ambig_symbol: "N".to_string(),
            version: String::new(),
        }
    }
}

impl ToolDefaults {
    /// Extracts defaults and the version declaration from the header text.
    ///
    /// # Arguments
    ///
    /// * `text` - Contents of the defaults header.
    ///
    /// # Returns
    ///
    /// Populated ToolDefaults; declarations absent from the text keep the
    /// built-in fallback values.
    pub fn parse(text: &str) -> Result<Self, PipelineError> {
        let mut defaults = ToolDefaults::default();

        for line in text.lines() {
            let Some(rest) = line.strip_prefix(DEFINE_MARKER) else {
                continue;
            };
            let mut tokens = rest.split_whitespace();
            let (Some(name), Some(value)) = (tokens.next(), tokens.next()) else {
                continue;
            };

            match name {
                "DEFAULT_PRIMER_OFFSET" => defaults.primer_offset = parse_int(name, value)?,
                "DEFAULT_MIN_QUAL" => defaults.min_base_quality = parse_int(name, value)?,
                "DEFAULT_MIN_DEPTH" => defaults.min_depth = parse_int(name, value)?,
                "DEFAULT_MIN_FREQ" => defaults.min_freq = parse_float(name, value)?,
                "DEFAULT_AMBIG" => defaults.ambig_symbol = strip_quotes(value),
                "VERSION" => defaults.version = strip_quotes(value),
                _ => {} // unrecognized declarations are ignored
            }
        }

        Ok(defaults)
    }
}

fn strip_quotes(token: &str) -> String {
    token
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect()
}

fn parse_int(name: &str, token: &str) -> Result<i64, PipelineError> {
    token
        .parse::<i64>()
        .map_err(|_| PipelineError::InvalidConfig(format!("{}: not an integer: {}", name, token)))
}

fn parse_float(name: &str, token: &str) -> Result<f64, PipelineError> {
    token
        .parse::<f64>()
        .map_err(|_| PipelineError::InvalidConfig(format!("{}: not a number: {}", name, token)))
}
