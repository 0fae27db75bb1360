/// The consensus-genome run controller: a state machine driving
/// validate -> stage -> execute -> collect-output, with stale-output
/// tracking across resubmissions.
///
/// A single run executes at a time; `submit` owns the runtime mutably for
/// the whole cycle, so overlapping runs against the same workspace cannot
/// happen. Cancellation is not supported: once executing, a run proceeds to
/// Done or Failed.

use std::time::Instant;

use log::{debug, warn};
use tokio::time::{Duration, sleep, timeout};

use crate::config::assets::ExampleData;
use crate::config::defaults::ToolDefaults;
use crate::config::defs::{
    CONSENSUS_FILE, PipelineError, RUNTIME_POLL_INTERVAL_SECS, RUNTIME_READY_TIMEOUT_SECS,
};
use crate::utils::classify::{FileKind, classify_input};
use crate::utils::command::{build, render_pipeline};
use crate::utils::console::Console;
use crate::utils::output::{OutputFile, collect_outputs};
use crate::utils::params::{
    FieldFlags, InputFileRef, RunParameters, ValidationReport, validate_ambig_symbol,
    validate_freq, validate_non_negative, validate_offset,
};
use crate::utils::runtime::SandboxRuntime;
use crate::utils::stage::stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Invalid,
    Staging,
    Executing,
    Done,
    Failed,
}

/// The user-editable form: current parameter values, per-field validity, the
/// three input slots, and an edit generation counter backing the staleness
/// flag. Setters store what the user typed (when it parses at all), record
/// validity, and bump the generation; aggregate validity is evaluated only
/// at submission.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub params: RunParameters,
    pub flags: FieldFlags,
    pub reference: InputFileRef,
    pub alignment: InputFileRef,
    pub primer: InputFileRef,
    generation: u64,
}

impl RunInputs {
    pub fn new(defaults: &ToolDefaults) -> Self {
        RunInputs {
            params: RunParameters::from_defaults(defaults),
            flags: FieldFlags::default(),
            reference: InputFileRef::Absent,
            alignment: InputFileRef::Absent,
            primer: InputFileRef::Absent,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    pub fn set_primer_offset(&mut self, raw: &str) -> bool {
        let (value, valid) = validate_offset(raw);
        if let Some(v) = value {
            self.params.primer_offset = v;
        }
        self.flags.primer_offset = valid;
        self.touch();
        valid
    }

    pub fn set_min_base_quality(&mut self, raw: &str) -> bool {
        let (value, valid) = validate_non_negative(raw);
        if let Some(v) = value {
            self.params.min_base_quality = v;
        }
        self.flags.min_base_quality = valid;
        self.touch();
        valid
    }

    pub fn set_min_depth(&mut self, raw: &str) -> bool {
        let (value, valid) = validate_non_negative(raw);
        if let Some(v) = value {
            self.params.min_depth = v;
        }
        self.flags.min_depth = valid;
        self.touch();
        valid
    }

    pub fn set_min_freq(&mut self, raw: &str) -> bool {
        let (value, valid) = validate_freq(raw);
        if let Some(v) = value {
            self.params.min_freq = v;
        }
        self.flags.min_freq = valid;
        self.touch();
        valid
    }

    pub fn set_ambig_symbol(&mut self, raw: &str) -> bool {
        let (value, valid) = validate_ambig_symbol(raw);
        if let Some(v) = value {
            self.params.ambig_symbol = v;
        }
        self.flags.ambig_symbol = valid;
        self.touch();
        valid
    }

    pub fn set_gen_pos_counts(&mut self, on: bool) {
        self.params.gen_pos_counts = on;
        self.touch();
    }

    pub fn set_gen_ins_counts(&mut self, on: bool) {
        self.params.gen_ins_counts = on;
        self.touch();
    }

    pub fn set_reference(&mut self, file: InputFileRef) {
        self.reference = file;
        self.touch();
    }

    pub fn set_alignment(&mut self, file: InputFileRef) {
        self.alignment = file;
        self.touch();
    }

    pub fn set_primer(&mut self, file: InputFileRef) {
        self.primer = file;
        self.touch();
    }

    /// Switches both required inputs to the bundled example payloads. Only
    /// counts as an edit if something actually changed.
    pub fn load_example_data(&mut self) {
        if self.reference != InputFileRef::Example || self.alignment != InputFileRef::Example {
            self.reference = InputFileRef::Example;
            self.alignment = InputFileRef::Example;
            self.touch();
        }
    }

    pub fn evaluate(&self) -> ValidationReport {
        ValidationReport::evaluate(&self.flags, &self.reference, &self.alignment)
    }
}

pub struct RunController<R: SandboxRuntime> {
    runtime: R,
    console: Console,
    examples: ExampleData,
    pub inputs: RunInputs,
    state: RunState,
    /// Edit generation captured when the last Done was entered; staleness is
    /// the current generation having moved past it.
    done_generation: Option<u64>,
}

impl<R: SandboxRuntime> RunController<R> {
    pub fn new(runtime: R, defaults: &ToolDefaults, examples: ExampleData) -> Self {
        RunController {
            runtime,
            console: Console::new(),
            examples,
            inputs: RunInputs::new(defaults),
            state: RunState::Idle,
            done_generation: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// True whenever any input or parameter changed since the last
    /// transition into Done; cleared only when Done is re-entered with no
    /// interleaving changes.
    pub fn stale(&self) -> bool {
        match self.done_generation {
            Some(done_at) => self.inputs.generation() != done_at,
            None => false,
        }
    }

    /// Drives one full run cycle. Returns the terminal state for the
    /// attempt; infrastructure failures and a missing primary artifact come
    /// back as errors with the state already set accordingly.
    pub async fn submit(&mut self) -> Result<RunState, PipelineError> {
        let start = Instant::now();

        self.console.clear();
        self.console.log("Validating input...");
        let report = self.inputs.evaluate();
        if !report.is_valid() {
            for message in report.failures() {
                self.console.log(format!("Invalid input: {}", message));
            }
            self.state = RunState::Invalid;
            return Ok(RunState::Invalid);
        }

        // Snapshot for the staleness decision at Done; clearing is deferred
        // until the run actually completes.
        let submitted_generation = self.inputs.generation();

        self.wait_for_runtime().await?;

        self.state = RunState::Staging;
        self.console.log("Running viral_consensus...");
        let staged = stage(
            &mut self.runtime,
            &self.console,
            &self.inputs.reference,
            &self.inputs.alignment,
            &self.inputs.primer,
            &self.examples,
        )
        .await
        .map_err(|e| PipelineError::Exec(e.to_string()))?;

        let kind = classify_input(&self.inputs.alignment);
        if kind == FileKind::Unrecognized {
            self.console.log(
                "WARNING: Alignment file extension not recognized. Assuming bam/sam/cram format.",
            );
        }

        let commands = build(
            &self.inputs.params,
            kind,
            &staged.ref_name,
            &staged.alignment_name,
            staged.primer_name.as_deref(),
        );
        let command_line = render_pipeline(&commands);

        self.state = RunState::Executing;
        self.console.log(format!("Executing command: {}", command_line));
        let output = self
            .runtime
            .exec(&command_line)
            .await
            .map_err(|e| PipelineError::Exec(e.to_string()))?;
        if output.status != 0 {
            debug!(
                "Command exited with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
        }

        // Success is judged by the primary artifact, not the exit status.
        match self.runtime.file_size(CONSENSUS_FILE).await {
            Ok(Some(size)) if size > 0 => {
                self.state = RunState::Done;
                self.done_generation = Some(submitted_generation);
                self.console.log(format!(
                    "Done! Time Elapsed: {:.3} seconds",
                    start.elapsed().as_secs_f64()
                ));
                if self.stale() {
                    self.console.log(
                        "Warning: input has changed since this run started; run again for up-to-date output files.",
                    );
                }
                Ok(RunState::Done)
            }
            Ok(_) => {
                self.state = RunState::Failed;
                self.console
                    .log("Error: No consensus genome generated. Please check your input files.");
                Err(PipelineError::NoOutput(
                    "primary artifact consensus.fa is missing or empty".to_string(),
                ))
            }
            Err(e) => {
                self.state = RunState::Failed;
                Err(PipelineError::Exec(e.to_string()))
            }
        }
    }

    /// Exports the artifacts of the last successful run.
    pub async fn download_outputs(&self) -> Result<Vec<OutputFile>, PipelineError> {
        if self.state != RunState::Done {
            return Err(PipelineError::InvalidInput(
                "no completed run to download outputs from".to_string(),
            ));
        }
        collect_outputs(&self.runtime, &self.console)
            .await
            .map_err(|e| PipelineError::Exec(e.to_string()))
    }

    /// Waits for the runtime's one-shot initialization, polling at a fixed
    /// interval under a bounded deadline. Work arriving before init has
    /// finished is deferred here instead of failing.
    async fn wait_for_runtime(&mut self) -> Result<(), PipelineError> {
        let runtime = &self.runtime;
        let wait = async {
            while !runtime.poll_ready().await {
                warn!(
                    "Runtime not ready, retrying in {} seconds",
                    RUNTIME_POLL_INTERVAL_SECS
                );
                sleep(Duration::from_secs(RUNTIME_POLL_INTERVAL_SECS)).await;
            }
        };
        if timeout(Duration::from_secs(RUNTIME_READY_TIMEOUT_SECS), wait)
            .await
            .is_err()
        {
            self.console.log("Error: runtime failed to become ready.");
            return Err(PipelineError::RuntimeNotReady(RUNTIME_READY_TIMEOUT_SECS));
        }
        Ok(())
    }
}
