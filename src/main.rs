use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use owo_colors::{OwoColorize, Rgb};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;

use storyreel::logging::{init_logging, LoggingConfig};
use storyreel::scheduler::FrameScheduler;
use storyreel::settings::ReelConfig;
use storyreel::story::{StoryCatalog, StoryScreen, StripView};
use storyreel::transition::{GestureTracker, TransitionOutcome, TransitionState};

/// Upper bound on simulated time per phase.
const PHASE_LIMIT: Duration = Duration::from_secs(30);
/// Distance a full drag covers, in points.
const DRAG_EXTENT: f64 = 800.0;
/// Frames spent moving the finger, then holding still before release.
const DRAG_FRAMES: u64 = 12;
const HOLD_FRAMES: u64 = 6;
const BAR_WIDTH: usize = 24;

const ACCENT: Rgb = Rgb(236, 72, 153);
const TRACKING: Rgb = Rgb(34, 211, 238);
const SUCCESS: Rgb = Rgb(34, 197, 94);
const FAILURE: Rgb = Rgb(239, 68, 68);
const MUTED: Rgb = Rgb(107, 114, 128);

/// How a simulated drag ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReleaseMode {
    /// Let the gesture decide from distance and velocity
    #[default]
    Auto,
    /// Lift the finger and complete the dismissal
    Complete,
    /// Lift the finger and spring back
    Cancel,
    /// Drop the gesture source without ending it
    Orphan,
}

#[derive(Parser, Debug)]
#[command(name = "storyreel")]
#[command(version)]
#[command(about = "Story highlights strip with interactive overlay transitions")]
struct Cli {
    /// Configuration file (TOML); STORYREEL__* variables override it
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Disable colors (also respects NO_COLOR environment variable)
    #[arg(long, global = true)]
    no_color: bool,

    /// Suppress all output except errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short, action = ArgAction::Count, global = true, conflicts_with = "quiet")]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the highlight strip
    Strip {
        /// Story catalog (JSON)
        #[arg(long, short)]
        stories: PathBuf,
    },

    /// Open a story, then dismiss it, printing every frame
    Simulate {
        /// Story catalog (JSON)
        #[arg(long, short)]
        stories: PathBuf,

        /// Strip index to open
        #[arg(long, default_value = "0")]
        select: usize,

        /// Dismiss by dragging to this fraction of the screen (0.0-1.0)
        #[arg(long, value_parser = parse_fraction)]
        drag: Option<f64>,

        /// How the drag ends
        #[arg(long, value_enum, default_value = "auto", requires = "drag")]
        release: ReleaseMode,

        /// Leave the screen after this many frames of the presentation
        #[arg(long, value_name = "FRAMES")]
        interrupt: Option<u64>,

        /// Pace frames in wall-clock time instead of simulated time
        #[arg(long)]
        realtime: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn parse_fraction(value: &str) -> Result<f64, String> {
    let fraction: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number"))?;
    if !(0.0..=1.0).contains(&fraction) {
        return Err(format!("{fraction} is outside 0.0..=1.0"));
    }
    Ok(fraction)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let use_color =
        !cli.no_color && std::env::var("NO_COLOR").is_err() && std::io::stdout().is_terminal();
    let logging = LoggingConfig::from_flags(cli.verbose, cli.quiet)
        .with_ansi(use_color && std::io::stderr().is_terminal());
    if let Err(e) = init_logging(logging) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    match run(cli, use_color).await {
        Ok(code) => code,
        Err(e) => {
            if use_color {
                eprintln!("{} {}", "error:".color(FAILURE).bold(), e);
            } else {
                eprintln!("error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, use_color: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = ReelConfig::load(cli.config.as_ref())?;

    match cli.command {
        Commands::Strip { stories } => {
            let catalog = StoryCatalog::load(&stories)?;
            let view = StripView::new(config.strip.clone()).with_color(use_color);
            if !cli.quiet {
                println!("Highlights ({})", catalog.stories().len());
            }
            println!("{}", view.render(catalog.stories()));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Simulate {
            stories,
            select,
            drag,
            release,
            interrupt,
            realtime,
        } => {
            let catalog = StoryCatalog::load(&stories)?;
            let mut simulation = Simulation {
                screen: StoryScreen::from_config(Box::new(catalog), &config),
                scheduler: FrameScheduler::from_config(&config.scheduler),
                printer: FramePrinter {
                    use_color,
                    quiet: cli.quiet,
                },
                outcomes: Vec::new(),
                realtime,
            };
            simulation.run(select, drag, release, interrupt).await
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

struct Simulation {
    screen: StoryScreen,
    scheduler: FrameScheduler,
    printer: FramePrinter,
    outcomes: Vec<TransitionOutcome>,
    realtime: bool,
}

impl Simulation {
    async fn run(
        &mut self,
        row: usize,
        drag: Option<f64>,
        release: ReleaseMode,
        interrupt: Option<u64>,
    ) -> Result<ExitCode, Box<dyn std::error::Error>> {
        let id = self.screen.select(row)?;
        if let Some(overlay) = self.screen.presented() {
            self.printer
                .note(&format!("presenting {} ({})", overlay.story.display_name, id));
        }

        self.run_phase(
            |_| {},
            |screen, frame| {
                !screen.is_transitioning() || interrupt.is_some_and(|limit| frame + 1 >= limit)
            },
        )
        .await;

        if self.screen.is_transitioning() {
            self.printer.note("screen disappeared");
            let applied = self.screen.disappear();
            self.printer.outcomes(&applied);
            self.outcomes.extend(applied);
            return Ok(self.finish());
        }

        match drag {
            None => self.screen.dismiss(None)?,
            Some(target) => self.drag(target, release).await?,
        }

        self.run_phase(|_| {}, |screen, _| !screen.is_transitioning())
            .await;
        Ok(self.finish())
    }

    /// Drag the overlay down to `target`, hold, then end the gesture.
    async fn drag(
        &mut self,
        target: f64,
        release: ReleaseMode,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let tracker = Rc::new(GestureTracker::new(DRAG_EXTENT));
        self.screen.begin_drag(&tracker)?;

        let per_frame = target * DRAG_EXTENT / DRAG_FRAMES as f64;
        let speed = per_frame / self.scheduler.frame_duration().as_secs_f64();
        self.run_phase(
            |frame| {
                let moved = (frame + 1).min(DRAG_FRAMES) as f64;
                let velocity = if frame < DRAG_FRAMES { speed } else { 0.0 };
                tracker.update(per_frame * moved, velocity);
            },
            |_, frame| frame + 1 >= DRAG_FRAMES + HOLD_FRAMES,
        )
        .await;

        match release {
            ReleaseMode::Auto => {
                let complete = self.screen.release(&tracker);
                self.printer.note(if complete {
                    "released past the threshold"
                } else {
                    "released short of the threshold"
                });
            }
            ReleaseMode::Complete | ReleaseMode::Cancel => {
                self.screen.finish_drag(release == ReleaseMode::Complete);
                tracker.end();
                self.printer.note("released");
            }
            ReleaseMode::Orphan => {
                drop(tracker);
                self.printer.note("gesture source dropped mid-drag");
            }
        }
        Ok(())
    }

    /// Run frames until `done` says stop. `before` runs ahead of each tick
    /// with the frame's index within the phase.
    async fn run_phase<B, D>(&mut self, mut before: B, mut done: D) -> u64
    where
        B: FnMut(u64),
        D: FnMut(&StoryScreen, u64) -> bool,
    {
        let screen = &mut self.screen;
        let printer = &mut self.printer;
        let outcomes = &mut self.outcomes;
        let mut index = 0;
        let on_frame = |dt: Duration| {
            before(index);
            let applied = screen.tick(dt);
            printer.frame(screen);
            printer.outcomes(&applied);
            outcomes.extend(applied);
            let stop = done(screen, index);
            index += 1;
            if stop {
                std::ops::ControlFlow::Break(())
            } else {
                std::ops::ControlFlow::Continue(())
            }
        };

        if self.realtime {
            self.scheduler.run_realtime(PHASE_LIMIT, on_frame).await
        } else {
            self.scheduler.run_simulated(PHASE_LIMIT, on_frame)
        }
    }

    fn finish(&mut self) -> ExitCode {
        let summary = match self.screen.presented() {
            Some(overlay) => format!("{} is still on screen", overlay.story.display_name),
            None => "story released".to_string(),
        };
        self.printer.note(&format!(
            "{} after {} transitions, {} frames ({} ms)",
            summary,
            self.outcomes.len(),
            self.scheduler.frame(),
            self.scheduler.elapsed().as_millis()
        ));
        ExitCode::SUCCESS
    }
}

struct FramePrinter {
    use_color: bool,
    quiet: bool,
}

impl FramePrinter {
    fn frame(&self, screen: &StoryScreen) {
        if self.quiet {
            return;
        }
        let state = screen.transition_state();
        let (label, color) = match state {
            TransitionState::Idle => ("idle", MUTED),
            TransitionState::Animating { .. } => ("animating", ACCENT),
            TransitionState::InteractivelyTracking { .. } => ("tracking", TRACKING),
            TransitionState::Completed { success: true } => ("completed", SUCCESS),
            TransitionState::Completed { success: false } => ("cancelled", FAILURE),
        };
        let progress = state.progress();
        let bar = progress_bar(progress.unwrap_or(0.0));
        let progress = progress.map_or_else(|| "  -  ".to_string(), |p| format!("{p:.3}"));
        let dimming = screen.backdrop().state().dimming;

        if self.use_color {
            println!(
                "{:<10} {} {}  dim {:.2}",
                label.color(color),
                bar.color(color),
                progress,
                dimming
            );
        } else {
            println!("{:<10} {} {}  dim {:.2}", label, bar, progress, dimming);
        }
    }

    fn outcomes(&self, outcomes: &[TransitionOutcome]) {
        for outcome in outcomes {
            let verdict = if outcome.success { "completed" } else { "cancelled" };
            let line = format!("{} {} {}", outcome.direction, outcome.overlay, verdict);
            if self.use_color {
                let color = if outcome.success { SUCCESS } else { FAILURE };
                println!("{}", line.color(color).bold());
            } else {
                println!("{}", line);
            }
        }
    }

    fn note(&self, message: &str) {
        if self.quiet {
            return;
        }
        if self.use_color {
            println!("{}", message.color(MUTED));
        } else {
            println!("{}", message);
        }
    }
}

fn progress_bar(progress: f64) -> String {
    let filled = (progress.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}
