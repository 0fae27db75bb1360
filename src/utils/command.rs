/// Functions and structs for constructing the pipeline command lines.
///
/// The command list is a pure function of the validated parameters, the
/// classified file kind, and the optional-input flags. Flag order is fixed
/// so repeated invocations produce byte-identical command text.

use crate::config::defs::{
    CONSENSUS_FILE, INSERTION_COUNTS_FILE, MINIMAP2_TAG, POSITION_COUNTS_FILE, STDIN_MARKER,
    VIRAL_CONSENSUS_TAG,
};
use crate::utils::classify::FileKind;
use crate::utils::params::RunParameters;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: &'static str,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn render(&self) -> String {
        let mut out = String::from(self.program);
        for arg in &self.args {
            out.push(' ');
            out.push_str(&shell_quote(arg));
        }
        out
    }
}

mod viral_consensus {
    use super::*;

    pub fn arg_generator(
        params: &RunParameters,
        input_designator: &str,
        ref_name: &str,
        primer_name: Option<&str>,
    ) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("-i".to_string());
        args_vec.push(input_designator.to_string());
        args_vec.push("-r".to_string());
        args_vec.push(ref_name.to_string());
        args_vec.push("-o".to_string());
        args_vec.push(CONSENSUS_FILE.to_string());

        if let Some(primer) = primer_name {
            args_vec.push("-p".to_string());
            args_vec.push(primer.to_string());
            args_vec.push("-po".to_string());
            args_vec.push(params.primer_offset.to_string());
        }

        args_vec.push("-q".to_string());
        args_vec.push(params.min_base_quality.to_string());
        args_vec.push("-d".to_string());
        args_vec.push(params.min_depth.to_string());
        args_vec.push("-f".to_string());
        args_vec.push(params.min_freq.to_string());
        args_vec.push("-a".to_string());
        args_vec.push(params.ambig_symbol.clone());

        if params.gen_pos_counts {
            args_vec.push("-op".to_string());
            args_vec.push(POSITION_COUNTS_FILE.to_string());
        }
        if params.gen_ins_counts {
            args_vec.push("-oi".to_string());
            args_vec.push(INSERTION_COUNTS_FILE.to_string());
        }

        args_vec
    }
}

mod minimap2 {
    /// Short-read preset, single thread, SAM output on stdout for the pipe
    /// into the consensus caller.
    pub fn arg_generator(ref_name: &str, reads_name: &str) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("-t".to_string());
        args_vec.push("1".to_string());
        args_vec.push("-a".to_string());
        args_vec.push("-x".to_string());
        args_vec.push("sr".to_string());
        args_vec.push(ref_name.to_string());
        args_vec.push(reads_name.to_string());
        args_vec
    }
}

/// Builds the ordered command list for one run.
///
/// # Arguments
///
/// * `params` - Validated run parameters.
/// * `kind` - Classified alignment input kind.
/// * `ref_name` - Staged reference file name.
/// * `alignment_name` - Staged alignment/reads file name.
/// * `primer_name` - Staged primer file name, if one was supplied.
///
/// # Returns
///
/// One command for pre-aligned input, or aligner + caller for raw reads.
pub fn build(
    params: &RunParameters,
    kind: FileKind,
    ref_name: &str,
    alignment_name: &str,
    primer_name: Option<&str>,
) -> Vec<ToolCommand> {
    let mut commands = Vec::new();

    let input_designator = if kind.needs_alignment() {
        STDIN_MARKER
    } else {
        alignment_name
    };

    if kind.needs_alignment() {
        commands.push(ToolCommand {
            program: MINIMAP2_TAG,
            args: minimap2::arg_generator(ref_name, alignment_name),
        });
    }

    commands.push(ToolCommand {
        program: VIRAL_CONSENSUS_TAG,
        args: viral_consensus::arg_generator(params, input_designator, ref_name, primer_name),
    });

    commands
}

/// Joins the command list into a single shell line, piping each stage into
/// the next.
pub fn render_pipeline(commands: &[ToolCommand]) -> String {
    commands
        .iter()
        .map(|c| c.render())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Quotes an argument for `sh -c`. Plain file names and numbers pass through
/// untouched; anything else is single-quoted.
fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/' | '+'));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
