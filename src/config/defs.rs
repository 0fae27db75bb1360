use lazy_static::lazy_static;
use std::collections::HashMap;
use thiserror::Error;

// External software
pub const VIRAL_CONSENSUS_TAG: &str = "viral_consensus";
pub const MINIMAP2_TAG: &str = "minimap2";

lazy_static! {
    pub static ref TOOL_VERSIONS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert(VIRAL_CONSENSUS_TAG, "0.0.5");
        m.insert(MINIMAP2_TAG, "2.22");

        m
    };
}

// Static Filenames
pub const CONSENSUS_FILE: &str = "consensus.fa";
pub const POSITION_COUNTS_FILE: &str = "positionCounts.tsv";
pub const INSERTION_COUNTS_FILE: &str = "insertionCounts.tsv";

// Staged names used when example data stands in for an upload
pub const EXAMPLE_REF_FILE_NAME: &str = "example_reference.fas";
pub const EXAMPLE_ALIGNMENT_FILE_NAME: &str = "example_alignment.sam";

// viral_consensus reads from stdin when the aligner pipes into it
pub const STDIN_MARKER: &str = "-";

// Alignment input suffixes; raw reads are checked before aligned formats
pub const RAW_READS_EXTS: &[&str] = &[".fastq", ".fq", ".fastq.gz", ".fq.gz"];
pub const ALIGNED_EXTS: &[&str] = &[".bam", ".sam", ".cram"];

// Static Parameters
pub const RUNTIME_POLL_INTERVAL_SECS: u64 = 2;
pub const RUNTIME_READY_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Runtime not ready after {0} seconds")]
    RuntimeNotReady(u64),

    #[error("No consensus genome generated: {0}")]
    NoOutput(String),

    #[error("Command execution failed: {0}")]
    Exec(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
