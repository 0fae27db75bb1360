use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use anyhow::{Result, anyhow};
use consensus_runner::config::assets::ExampleData;
use consensus_runner::config::defaults::ToolDefaults;
use consensus_runner::config::defs::{
    CONSENSUS_FILE, INSERTION_COUNTS_FILE, PipelineError, POSITION_COUNTS_FILE,
};
use consensus_runner::pipelines::consensus::{RunController, RunState};
use consensus_runner::utils::params::InputFileRef;
use consensus_runner::utils::runtime::{ExecOutput, SandboxRuntime, ToolSpec};

/// In-memory runtime with a scripted exec step. `consensus_payload` is what
/// exec leaves behind as the primary artifact; None simulates a run that
/// produces nothing.
#[derive(Default)]
struct ScriptedRuntime {
    files: RefCell<HashMap<String, Vec<u8>>>,
    exec_log: RefCell<Vec<String>>,
    ready_after_polls: u32,
    polls: Cell<u32>,
    consensus_payload: Option<Vec<u8>>,
    optional_outputs: bool,
    primer_present_at_exec: Cell<Option<bool>>,
}

impl ScriptedRuntime {
    fn succeeding() -> Self {
        ScriptedRuntime {
            consensus_payload: Some(b">consensus\nACGTACGT\n".to_vec()),
            ..Default::default()
        }
    }

    fn commands(&self) -> Vec<String> {
        self.exec_log.borrow().clone()
    }
}

impl SandboxRuntime for ScriptedRuntime {
    async fn init(&mut self, _tools: &[ToolSpec]) -> Result<()> {
        Ok(())
    }

    async fn poll_ready(&self) -> bool {
        self.polls.set(self.polls.get() + 1);
        self.polls.get() > self.ready_after_polls
    }

    async fn file_size(&self, name: &str) -> Result<Option<u64>> {
        Ok(self.files.borrow().get(name).map(|b| b.len() as u64))
    }

    async fn write_file(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.files.borrow_mut().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn remove_file(&mut self, name: &str) -> Result<()> {
        self.files.borrow_mut().remove(name);
        Ok(())
    }

    async fn exec(&mut self, command: &str) -> Result<ExecOutput> {
        self.exec_log.borrow_mut().push(command.to_string());
        self.primer_present_at_exec
            .set(Some(self.files.borrow().contains_key("primers.bed")));
        if let Some(payload) = &self.consensus_payload {
            self.files
                .borrow_mut()
                .insert(CONSENSUS_FILE.to_string(), payload.clone());
        }
        if self.optional_outputs {
            let mut files = self.files.borrow_mut();
            files.insert(POSITION_COUNTS_FILE.to_string(), b"pos\t1\n".to_vec());
            files.insert(INSERTION_COUNTS_FILE.to_string(), b"ins\t1\n".to_vec());
        }
        Ok(ExecOutput {
            status: 0,
            stdout: Vec::new(),
            stderr: Vec::new(),
        })
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("No such file: {}", name))
    }
}

fn controller(runtime: ScriptedRuntime) -> RunController<ScriptedRuntime> {
    RunController::new(runtime, &ToolDefaults::default(), ExampleData::bundled())
}

fn upload(name: &str, bytes: &[u8]) -> InputFileRef {
    InputFileRef::Upload {
        name: name.to_string(),
        bytes: bytes.to_vec(),
    }
}

#[tokio::test]
async fn test_example_data_run_reaches_done() -> Result<()> {
    let mut controller = controller(ScriptedRuntime::succeeding());
    controller.inputs.load_example_data();

    let state = controller.submit().await?;
    assert_eq!(state, RunState::Done);
    assert_eq!(controller.state(), RunState::Done);
    assert!(!controller.stale());

    let commands = controller.runtime().commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(
        commands[0],
        "viral_consensus -i example_alignment.sam -r example_reference.fas -o consensus.fa -q 0 -d 0 -f 0 -a N"
    );
    assert!(!commands[0].contains('|'));

    let outputs = controller.download_outputs().await?;
    assert_eq!(outputs.len(), 1, "Only the primary artifact should exist");
    assert_eq!(outputs[0].name, CONSENSUS_FILE);
    assert!(!outputs[0].bytes.is_empty());

    assert!(
        controller.console().text().contains("Done! Time Elapsed:"),
        "Completion line with elapsed time expected"
    );
    Ok(())
}

#[tokio::test]
async fn test_fastq_upload_builds_piped_command_and_fails_without_output() -> Result<()> {
    let runtime = ScriptedRuntime::default(); // exec produces nothing
    let mut controller = controller(runtime);
    controller.inputs.set_reference(upload("ref.fa", b">r\nACGT\n"));
    controller
        .inputs
        .set_alignment(upload("reads.fastq", b"@r\nACGT\n+\nIIII\n"));

    let result = controller.submit().await;
    assert!(matches!(result, Err(PipelineError::NoOutput(_))));
    assert_eq!(controller.state(), RunState::Failed);

    let commands = controller.runtime().commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].matches('|').count(), 1);
    assert!(commands[0].starts_with("minimap2 -t 1 -a -x sr ref.fa reads.fastq | "));
    assert!(commands[0].contains("viral_consensus -i - -r ref.fa"));

    assert!(
        controller
            .console()
            .text()
            .contains("Error: No consensus genome generated."),
        "User-facing diagnostic expected"
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_required_files_is_invalid() -> Result<()> {
    let mut controller = controller(ScriptedRuntime::succeeding());
    let state = controller.submit().await?;
    assert_eq!(state, RunState::Invalid);

    let console = controller.console().text();
    assert!(console.contains("Reference file is required"));
    assert!(console.contains("Input reads file is required"));
    // Nothing was staged or executed
    assert!(controller.runtime().commands().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_invalid_parameter_blocks_submission() -> Result<()> {
    let mut controller = controller(ScriptedRuntime::succeeding());
    controller.inputs.load_example_data();
    assert!(!controller.inputs.set_min_depth("-1"));

    let state = controller.submit().await?;
    assert_eq!(state, RunState::Invalid);
    assert!(
        controller
            .console()
            .text()
            .contains("Minimum depth must be a non-negative integer")
    );

    // Correcting the field makes the next submission pass
    assert!(controller.inputs.set_min_depth("0"));
    assert_eq!(controller.submit().await?, RunState::Done);
    Ok(())
}

#[tokio::test]
async fn test_staleness_set_by_edit_and_cleared_by_clean_rerun() -> Result<()> {
    let mut controller = controller(ScriptedRuntime::succeeding());
    controller.inputs.load_example_data();

    assert_eq!(controller.submit().await?, RunState::Done);
    assert!(!controller.stale());

    controller.inputs.set_min_depth("5");
    assert!(controller.stale(), "Edit after Done should mark outputs stale");
    controller.inputs.set_gen_pos_counts(true);
    assert!(controller.stale());

    assert_eq!(controller.submit().await?, RunState::Done);
    assert!(!controller.stale(), "Clean re-run should clear staleness");
    Ok(())
}

#[tokio::test]
async fn test_unrecognized_extension_warns_and_proceeds_as_aligned() -> Result<()> {
    let mut controller = controller(ScriptedRuntime::succeeding());
    controller.inputs.set_reference(InputFileRef::Example);
    controller.inputs.set_alignment(upload("sample.xyz", b"data"));

    assert_eq!(controller.submit().await?, RunState::Done);
    assert!(
        controller
            .console()
            .text()
            .contains("WARNING: Alignment file extension not recognized.")
    );
    let commands = controller.runtime().commands();
    assert!(commands[0].contains("-i sample.xyz"));
    assert!(!commands[0].contains('|'));
    Ok(())
}

#[tokio::test]
async fn test_primer_staged_before_command_dispatch() -> Result<()> {
    let mut controller = controller(ScriptedRuntime::succeeding());
    controller.inputs.load_example_data();
    controller.inputs.set_primer(upload("primers.bed", b"ref\t0\t20\n"));
    controller.inputs.set_primer_offset("5");

    assert_eq!(controller.submit().await?, RunState::Done);
    assert_eq!(
        controller.runtime().primer_present_at_exec.get(),
        Some(true),
        "Primer must be fully staged before the command runs"
    );
    assert!(
        controller.runtime().commands()[0].contains("-p primers.bed -po 5"),
        "Primer flags expected on the consensus command"
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_submission_defers_until_runtime_ready() -> Result<()> {
    let runtime = ScriptedRuntime {
        ready_after_polls: 3,
        ..ScriptedRuntime::succeeding()
    };
    let mut controller = controller(runtime);
    controller.inputs.load_example_data();

    assert_eq!(controller.submit().await?, RunState::Done);
    assert!(
        controller.runtime().polls.get() > 3,
        "Readiness should have been polled through the backoff"
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_runtime_never_ready_times_out() -> Result<()> {
    let runtime = ScriptedRuntime {
        ready_after_polls: u32::MAX,
        ..ScriptedRuntime::succeeding()
    };
    let mut controller = controller(runtime);
    controller.inputs.load_example_data();

    let result = controller.submit().await;
    assert!(matches!(result, Err(PipelineError::RuntimeNotReady(_))));
    assert!(controller.runtime().commands().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_prior_run_artifacts_do_not_leak_into_next_run() -> Result<()> {
    let mut runtime = ScriptedRuntime::default(); // produces no output
    runtime
        .files
        .get_mut()
        .insert(CONSENSUS_FILE.to_string(), b"stale".to_vec());
    runtime
        .files
        .get_mut()
        .insert(POSITION_COUNTS_FILE.to_string(), b"stale".to_vec());

    let mut controller = controller(runtime);
    controller.inputs.load_example_data();

    // The stale primary artifact must not count as this run's result.
    let result = controller.submit().await;
    assert!(matches!(result, Err(PipelineError::NoOutput(_))));
    assert_eq!(controller.state(), RunState::Failed);
    assert!(
        !controller
            .runtime()
            .files
            .borrow()
            .contains_key(POSITION_COUNTS_FILE)
    );
    Ok(())
}

#[tokio::test]
async fn test_both_toggles_produce_optional_artifacts() -> Result<()> {
    let runtime = ScriptedRuntime {
        optional_outputs: true,
        ..ScriptedRuntime::succeeding()
    };
    let mut controller = controller(runtime);
    controller.inputs.load_example_data();
    controller.inputs.set_gen_pos_counts(true);
    controller.inputs.set_gen_ins_counts(true);

    assert_eq!(controller.submit().await?, RunState::Done);
    let commands = controller.runtime().commands();
    assert!(commands[0].ends_with("-op positionCounts.tsv -oi insertionCounts.tsv"));

    let outputs = controller.download_outputs().await?;
    let names: Vec<&str> = outputs.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(
        names,
        vec![CONSENSUS_FILE, POSITION_COUNTS_FILE, INSERTION_COUNTS_FILE]
    );
    Ok(())
}

#[tokio::test]
async fn test_download_requires_a_completed_run() -> Result<()> {
    let controller = controller(ScriptedRuntime::succeeding());
    let result = controller.download_outputs().await;
    assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    Ok(())
}
