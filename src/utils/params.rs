/// User-tunable run parameters and their per-field validators.
///
/// Validators are pure: each takes the raw text of one field and returns the
/// parsed value alongside a validity flag. Aggregate validity is computed at
/// submission time in `ValidationReport::evaluate`, not continuously.

use crate::config::defaults::ToolDefaults;

/// One user-supplied input slot. Reference and alignment are required for a
/// run; primer is always optional.
#[derive(Debug, Clone, PartialEq)]
pub enum InputFileRef {
    Absent,
    Upload { name: String, bytes: Vec<u8> },
    Example,
}

impl InputFileRef {
    pub fn is_set(&self) -> bool {
        !matches!(self, InputFileRef::Absent)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            InputFileRef::Upload { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Current values of the tunable parameters. Defaults come from the bundled
/// defaults header; these copies are user-mutable.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParameters {
    pub primer_offset: i64,
    pub min_base_quality: i64,
    pub min_depth: i64,
    pub min_freq: f64,
    pub ambig_symbol: String,
    pub gen_pos_counts: bool,
    pub gen_ins_counts: bool,
}

impl RunParameters {
    pub fn from_defaults(defaults: &ToolDefaults) -> Self {
        RunParameters {
            primer_offset: defaults.primer_offset,
            min_base_quality: defaults.min_base_quality,
            min_depth: defaults.min_depth,
            min_freq: defaults.min_freq,
            ambig_symbol: defaults.ambig_symbol.clone(),
            gen_pos_counts: false,
            gen_ins_counts: false,
        }
    }
}

/// Any integer is a valid offset; only a parse failure is invalid.
pub fn validate_offset(raw: &str) -> (Option<i64>, bool) {
    match raw.trim().parse::<i64>() {
        Ok(v) => (Some(v), true),
        Err(_) => (None, false),
    }
}

/// Valid iff the value parses and is non-negative. Out-of-range values are
/// still returned so the caller can keep displaying what the user typed.
pub fn validate_non_negative(raw: &str) -> (Option<i64>, bool) {
    match raw.trim().parse::<i64>() {
        Ok(v) => (Some(v), v >= 0),
        Err(_) => (None, false),
    }
}

/// Valid iff the value parses and lies in [0, 1] inclusive.
pub fn validate_freq(raw: &str) -> (Option<f64>, bool) {
    match raw.trim().parse::<f64>() {
        Ok(v) => (Some(v), (0.0..=1.0).contains(&v)),
        Err(_) => (None, false),
    }
}

/// Valid iff the string is exactly one character.
pub fn validate_ambig_symbol(raw: &str) -> (Option<String>, bool) {
    let valid = raw.chars().count() == 1;
    let value = if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    };
    (value, valid)
}

/// A required file slot is valid iff a file is selected or example mode is
/// active for it.
pub fn validate_required_file(file: &InputFileRef) -> bool {
    file.is_set()
}

/// Per-field validity captured as the user edits; mirrors the inline
/// diagnostics next to each control.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFlags {
    pub primer_offset: bool,
    pub min_base_quality: bool,
    pub min_depth: bool,
    pub min_freq: bool,
    pub ambig_symbol: bool,
}

impl Default for FieldFlags {
    fn default() -> Self {
        FieldFlags {
            primer_offset: true,
            min_base_quality: true,
            min_depth: true,
            min_freq: true,
            ambig_symbol: true,
        }
    }
}

/// Aggregate validation outcome, computed once per submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub ref_file_valid: bool,
    pub alignment_file_valid: bool,
    pub primer_offset_valid: bool,
    pub min_base_quality_valid: bool,
    pub min_depth_valid: bool,
    pub min_freq_valid: bool,
    pub ambig_symbol_valid: bool,
}

impl ValidationReport {
    pub fn evaluate(
        flags: &FieldFlags,
        reference: &InputFileRef,
        alignment: &InputFileRef,
    ) -> Self {
        ValidationReport {
            ref_file_valid: validate_required_file(reference),
            alignment_file_valid: validate_required_file(alignment),
            primer_offset_valid: flags.primer_offset,
            min_base_quality_valid: flags.min_base_quality,
            min_depth_valid: flags.min_depth,
            min_freq_valid: flags.min_freq,
            ambig_symbol_valid: flags.ambig_symbol,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.ref_file_valid
            && self.alignment_file_valid
            && self.primer_offset_valid
            && self.min_base_quality_valid
            && self.min_depth_valid
            && self.min_freq_valid
            && self.ambig_symbol_valid
    }

    /// One diagnostic per failing field, for the console.
    pub fn failures(&self) -> Vec<&'static str> {
        let mut messages = Vec::new();
        if !self.ref_file_valid {
            messages.push("Reference file is required (upload one or use the example data)");
        }
        if !self.alignment_file_valid {
            messages.push("Input reads file is required (upload one or use the example data)");
        }
        if !self.primer_offset_valid {
            messages.push("Primer offset must be an integer");
        }
        if !self.min_base_quality_valid {
            messages.push("Minimum base quality must be a non-negative integer");
        }
        if !self.min_depth_valid {
            messages.push("Minimum depth must be a non-negative integer");
        }
        if !self.min_freq_valid {
            messages.push("Minimum frequency must be between 0 and 1");
        }
        if !self.ambig_symbol_valid {
            messages.push("Ambiguous symbol must be exactly one character");
        }
        messages
    }
}
