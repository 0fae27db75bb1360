/// Bundled resources: the defaults header and the example input payloads.
/// All three are compiled into the binary and loaded into memory once; the
/// example payloads substitute for user uploads when example mode is active.

pub const DEFAULTS_SOURCE: &str = include_str!("../../data/viral_consensus_common.h");

const EXAMPLE_REFERENCE: &str = include_str!("../../data/example_reference.fas");
const EXAMPLE_ALIGNMENT: &[u8] = include_bytes!("../../data/example_alignment.sam");

#[derive(Debug, Clone)]
pub struct ExampleData {
    /// Reference FASTA, text.
    pub reference: String,
    /// Pre-aligned reads, raw bytes.
    pub alignment: Vec<u8>,
}

impl ExampleData {
    pub fn bundled() -> Self {
        ExampleData {
            reference: EXAMPLE_REFERENCE.to_string(),
            alignment: EXAMPLE_ALIGNMENT.to_vec(),
        }
    }
}
