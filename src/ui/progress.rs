use crate::compile::RequestState;
use crate::ui::icons::{CHECK, CLOCK, HAMMER, PACKAGE};
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Terminal UI for a compile run, rendered via `indicatif` progress bars.
///
/// Two bars are stacked vertically:
/// - Staging bar: counts container members added so far
/// - Compile spinner: the async request's latest remote state
///
/// Bars are hidden automatically when stderr is not a terminal.
pub struct CompileUI {
    multi: MultiProgress,
    staging_bar: ProgressBar,
    compile_bar: ProgressBar,
    verbose: bool,
    polls: AtomicU32,
}

impl CompileUI {
    /// Create the UI and add the staging and compile bars to the multiplex renderer.
    ///
    /// # Arguments
    /// * `total_members` - number of container members to stage, sizes the staging bar
    /// * `verbose` - when `true`, container creation and every poll are echoed
    ///   as separate lines above the bars
    ///
    /// Create it only for a non-empty inventory, before the lifecycle runs.
    pub fn new(total_members: u64, verbose: bool) -> Self {
        let multi = MultiProgress::new();

        let staging_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let staging_bar = multi.add(ProgressBar::new(total_members));
        staging_bar.set_style(staging_style);
        staging_bar.set_prefix("Members");

        let compile_style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg}")
            .expect("progress bar template is a valid static string");

        let compile_bar = multi.add(ProgressBar::new_spinner());
        compile_bar.set_style(compile_style);
        compile_bar.set_prefix("Compile");

        Self {
            multi,
            staging_bar,
            compile_bar,
            verbose,
            polls: AtomicU32::new(0),
        }
    }

    /// Print a line via `MultiProgress`, falling back to `eprintln!` if the rich UI fails.
    fn print_line(&self, msg: impl AsRef<str>) {
        if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    pub fn container_created(&self, name: &str) {
        if self.verbose {
            self.print_line(format!("  {} Created container {}", PACKAGE, style(name).cyan()));
        }
        self.staging_bar.set_message("Adding members...");
    }

    /// Advance the staging bar after one member was added.
    ///
    /// Members within a batch settle in any order, so `done` is a running
    /// count rather than the member's position in the inventory.
    pub fn member_staged(&self, done: usize, total: usize) {
        self.staging_bar.set_position(done as u64);
        self.staging_bar
            .set_message(format!("[{}/{}] Adding members...", done, total));
    }

    pub fn staging_complete(&self, total: usize) {
        self.staging_bar
            .finish_with_message(format!("{} Added all {} members", CHECK, total));
    }

    /// Stop the staging bar where it is after a failed member.
    pub fn staging_failed(&self, unit: &str) {
        self.staging_bar.abandon_with_message(format!(
            "Failed adding {}",
            style(unit).red().bold()
        ));
    }

    pub fn compile_submitted(&self, request_id: &str) {
        self.compile_bar.set_message(format!(
            "{} Compiling... {}",
            HAMMER,
            style(request_id).dim()
        ));
        self.compile_bar
            .enable_steady_tick(Duration::from_millis(100));
    }

    /// Show the state observed by the latest poll.
    pub fn poll_state(&self, state: &RequestState) {
        let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        self.compile_bar.set_message(format!(
            "{} {} {}",
            HAMMER,
            style(state).yellow(),
            style(format!("(poll {})", polls)).dim()
        ));
        if self.verbose {
            self.print_line(format!(
                "    {} {} {}",
                CLOCK,
                style(state).dim(),
                style(format!("poll {}", polls)).dim()
            ));
        }
    }

    /// Stop the spinner once a terminal state is reached.
    pub fn compile_finished(&self, state: &RequestState) {
        let styled = if state.is_success() {
            style(state.to_string()).green().bold()
        } else {
            style(state.to_string()).red().bold()
        };
        self.compile_bar.finish_with_message(format!("{}", styled));
    }

    /// Tear down any bar still drawing, e.g. after an error.
    pub fn clear(&self) {
        if !self.staging_bar.is_finished() {
            self.staging_bar.abandon();
        }
        if !self.compile_bar.is_finished() {
            self.compile_bar.finish_and_clear();
        }
    }
}
