use clap::Parser;

/// Numeric parameters are taken as raw text and pushed through the same
/// field validators the form setters use, so bad values surface as inline
/// diagnostics instead of clap parse errors.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "consensus-runner", version)]
pub struct Arguments {
    #[arg(short = 'r', long = "reference", help = "Reference file (FASTA)")]
    pub reference: Option<String>,

    #[arg(short = 'i', long = "reads", help = "Input reads file (BAM, SAM, CRAM, FASTQ)")]
    pub alignment: Option<String>,

    #[arg(short = 'p', long = "primer", help = "Primer (BED) file")]
    pub primer: Option<String>,

    #[arg(long, action, help = "Use the bundled example reference instead of an upload")]
    pub example_reference: bool,

    #[arg(long, action, help = "Use the bundled example alignment instead of an upload")]
    pub example_alignment: bool,

    #[arg(long = "primer-offset", help = "Number of bases after primer to also trim")]
    pub primer_offset: Option<String>,

    #[arg(short = 'q', long = "min-quality", help = "Min. base quality to count base in counts")]
    pub min_base_quality: Option<String>,

    #[arg(short = 'd', long = "min-depth", help = "Min. depth to call base in consensus")]
    pub min_depth: Option<String>,

    #[arg(short = 'f', long = "min-freq", help = "Min. frequency to call base/insertion in consensus")]
    pub min_freq: Option<String>,

    #[arg(short = 'a', long = "ambig", help = "Symbol to use for ambiguous bases")]
    pub ambig_symbol: Option<String>,

    #[arg(long = "position-counts", action, help = "Also generate positionCounts.tsv")]
    pub position_counts: bool,

    #[arg(long = "insertion-counts", action, help = "Also generate insertionCounts.tsv")]
    pub insertion_counts: bool,

    #[arg(short = 'o', long = "out", help = "Directory the output files are copied into. Defaults to 'consensus_out' in the current working directory.")]
    pub out_dir: Option<String>,

    #[arg(long, help = "Execution workspace directory; a temporary directory is used if not given")]
    pub workdir: Option<String>,

    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,
}
