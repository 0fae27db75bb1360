/// Workspace staging: clears stale output artifacts from a prior run, then
/// materializes every input the commands will reference. All writes are
/// awaited before this module returns, so no command can be dispatched
/// against a half-staged workspace.

use anyhow::{Result, bail};

use crate::config::assets::ExampleData;
use crate::config::defs::{
    CONSENSUS_FILE, EXAMPLE_ALIGNMENT_FILE_NAME, EXAMPLE_REF_FILE_NAME, INSERTION_COUNTS_FILE,
    POSITION_COUNTS_FILE,
};
use crate::utils::console::Console;
use crate::utils::params::InputFileRef;
use crate::utils::runtime::SandboxRuntime;

/// Names the inputs ended up under inside the workspace; the command builder
/// takes these verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedInputs {
    pub ref_name: String,
    pub alignment_name: String,
    pub primer_name: Option<String>,
}

/// Stages one run's inputs.
///
/// # Arguments
///
/// * `runtime` - Sandbox runtime backing the workspace.
/// * `console` - User-visible log sink.
/// * `reference`, `alignment`, `primer` - Input slots; reference and
///   alignment must be set (validation guarantees this), primer may be absent.
/// * `examples` - Bundled payloads substituted when example mode is active.
pub async fn stage<R: SandboxRuntime>(
    runtime: &mut R,
    console: &Console,
    reference: &InputFileRef,
    alignment: &InputFileRef,
    primer: &InputFileRef,
    examples: &ExampleData,
) -> Result<StagedInputs> {
    // Outputs from a prior run would otherwise be indistinguishable from
    // this run's results.
    for stale in [CONSENSUS_FILE, POSITION_COUNTS_FILE, INSERTION_COUNTS_FILE] {
        runtime.remove_file(stale).await?;
    }

    console.log("Writing reference file...");
    let ref_name = match reference {
        InputFileRef::Example => {
            runtime
                .write_file(EXAMPLE_REF_FILE_NAME, examples.reference.as_bytes())
                .await?;
            EXAMPLE_REF_FILE_NAME.to_string()
        }
        InputFileRef::Upload { name, bytes } => {
            runtime.write_file(name, bytes).await?;
            name.clone()
        }
        InputFileRef::Absent => bail!("Reference input missing at staging"),
    };

    console.log("Writing alignment file...");
    let alignment_name = match alignment {
        InputFileRef::Example => {
            runtime
                .write_file(EXAMPLE_ALIGNMENT_FILE_NAME, &examples.alignment)
                .await?;
            EXAMPLE_ALIGNMENT_FILE_NAME.to_string()
        }
        InputFileRef::Upload { name, bytes } => {
            runtime.write_file(name, bytes).await?;
            name.clone()
        }
        InputFileRef::Absent => bail!("Alignment input missing at staging"),
    };

    // The primer write must be durably visible before any command that
    // reads it is dispatched, hence the await here rather than a detached
    // background write.
    let primer_name = match primer {
        InputFileRef::Upload { name, bytes } => {
            console.log("Writing primer file...");
            runtime.remove_file(name).await?;
            runtime.write_file(name, bytes).await?;
            Some(name.clone())
        }
        _ => None,
    };

    Ok(StagedInputs {
        ref_name,
        alignment_name,
        primer_name,
    })
}
