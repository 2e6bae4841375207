//! Transfer command implementation

use indicatif::{ProgressBar, ProgressStyle};
use jaggd_core::transfer::{TransferPhase, TransferProgress};
use jaggd_core::{Orchestrator, Plan, TransferConfig, Transport};

/// Progress sink drawing an indicatif bar per payload
#[derive(Default)]
pub struct IndicatifProgress {
    bar: Option<ProgressBar>,
}

impl IndicatifProgress {
    fn style(phase: TransferPhase) -> ProgressStyle {
        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
            phase
        );
        ProgressStyle::default_bar()
            .template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
    }
}

impl TransferProgress for IndicatifProgress {
    fn started(&mut self, phase: TransferPhase, total: u64) {
        let pb = ProgressBar::new(total);
        pb.set_style(Self::style(phase));
        self.bar = Some(pb);
    }

    fn progress(&mut self, sent: u64, _percent: u32) {
        if let Some(pb) = &self.bar {
            pb.set_position(sent);
        }
    }

    fn finished(&mut self, phase: TransferPhase) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message(format!("{} complete", phase));
        }
    }
}

impl Drop for IndicatifProgress {
    fn drop(&mut self) {
        // Leave an interrupted bar where it stopped
        if let Some(pb) = self.bar.take() {
            pb.abandon();
        }
    }
}

/// Run the transfer command
pub fn run_plan(
    transport: &mut dyn Transport,
    plan: Plan,
) -> Result<(), Box<dyn std::error::Error>> {
    let steps = plan.steps().len();
    let mut progress = IndicatifProgress::default();

    Orchestrator::new(transport, TransferConfig::default()).run(plan, &mut progress)?;

    println!("Done ({} command{})", steps, if steps == 1 { "" } else { "s" });
    Ok(())
}
