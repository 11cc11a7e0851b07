use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_yellow};

/// Progress tracking for the three generation phases
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    pub fn start_phase_1(depth: u32, children: u32) -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());
        let pb = create_spinner(
            bright_yellow(format!(
                "Phase 1/3: Building tree (depth {depth}, {children} children)"
            ))
            .to_string(),
        );
        Self { pb }
    }

    pub fn finish_phase_1_start_phase_2(self, node_count: usize) -> Self {
        self.pb.finish_with_message(
            bright_green(format!("Phase 1/3: Built tree with {node_count} nodes ✓")).to_string(),
        );
        let pb = create_spinner(bright_yellow("Phase 2/3: Assigning stages").to_string());
        Self { pb }
    }

    pub fn finish_phase_2_start_phase_3(self, stage_count: u32) -> Self {
        self.pb.finish_with_message(
            bright_green(format!("Phase 2/3: Assigned {stage_count} stages ✓")).to_string(),
        );
        let pb = create_spinner(bright_yellow("Phase 3/3: Writing job graph").to_string());
        Self { pb }
    }

    pub fn finish_phase_3(self) {
        self.pb
            .finish_with_message(bright_green("Phase 3/3: Job graph written ✓").to_string());
        eprintln!();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
