/// Output retrieval: exports whichever expected artifacts exist in the
/// workspace. Absence of a toggle-dependent artifact is expected-missing and
/// silent; only the run controller decides whether the primary artifact's
/// absence is a failure.

use anyhow::Result;

use crate::config::defs::{CONSENSUS_FILE, INSERTION_COUNTS_FILE, POSITION_COUNTS_FILE};
use crate::utils::console::Console;
use crate::utils::runtime::SandboxRuntime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Pure export of workspace bytes; no validation of the contents.
pub async fn collect_outputs<R: SandboxRuntime>(
    runtime: &R,
    console: &Console,
) -> Result<Vec<OutputFile>> {
    let mut outputs = Vec::new();
    for name in [CONSENSUS_FILE, POSITION_COUNTS_FILE, INSERTION_COUNTS_FILE] {
        if runtime.file_size(name).await?.is_none() {
            continue;
        }
        let bytes = runtime.read_file(name).await?;
        console.log(format!("Downloaded {}", name));
        outputs.push(OutputFile {
            name: name.to_string(),
            bytes,
        });
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::runtime::LocalRuntime;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_optional_absence_is_silent() -> Result<()> {
        let dir = tempdir()?;
        let mut runtime = LocalRuntime::new(dir.path());
        runtime.write_file(CONSENSUS_FILE, b">consensus\nACGT\n").await?;

        let console = Console::new();
        let outputs = collect_outputs(&runtime, &console).await?;
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].name, CONSENSUS_FILE);
        assert_eq!(console.lines(), vec!["Downloaded consensus.fa"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_all_artifacts_exported_when_present() -> Result<()> {
        let dir = tempdir()?;
        let mut runtime = LocalRuntime::new(dir.path());
        runtime.write_file(CONSENSUS_FILE, b">c\nA\n").await?;
        runtime.write_file(POSITION_COUNTS_FILE, b"pos\t1\n").await?;
        runtime.write_file(INSERTION_COUNTS_FILE, b"ins\t2\n").await?;

        let outputs = collect_outputs(&runtime, &Console::new()).await?;
        let names: Vec<&str> = outputs.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec![CONSENSUS_FILE, POSITION_COUNTS_FILE, INSERTION_COUNTS_FILE]
        );
        Ok(())
    }
}
