/// Classification of the alignment input by file name suffix. Decides
/// whether an aligner stage has to run ahead of the consensus caller.

use crate::config::defs::{ALIGNED_EXTS, RAW_READS_EXTS};
use crate::utils::params::InputFileRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Already-aligned input (.bam/.sam/.cram); fed straight to the caller.
    AlignedBinary,
    /// Raw reads (.fastq/.fq, optionally gzipped); needs an aligner stage.
    RawReads,
    /// Unknown suffix; treated as AlignedBinary with a warning.
    Unrecognized,
}

impl FileKind {
    pub fn needs_alignment(self) -> bool {
        self == FileKind::RawReads
    }
}

/// Case-sensitive suffix match, raw-reads suffixes checked first.
pub fn classify(file_name: &str) -> FileKind {
    if RAW_READS_EXTS.iter().any(|ext| file_name.ends_with(ext)) {
        return FileKind::RawReads;
    }
    if ALIGNED_EXTS.iter().any(|ext| file_name.ends_with(ext)) {
        return FileKind::AlignedBinary;
    }
    FileKind::Unrecognized
}

/// The example alignment is pre-aligned, so the example sentinel always
/// classifies as AlignedBinary.
pub fn classify_input(input: &InputFileRef) -> FileKind {
    match input {
        InputFileRef::Upload { name, .. } => classify(name),
        _ => FileKind::AlignedBinary,
    }
}
