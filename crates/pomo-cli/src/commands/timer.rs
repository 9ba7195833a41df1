use std::sync::{Arc, Mutex, MutexGuard};

use clap::Args;
use pomo_core::{get_interval, Event, IntervalConfig, IntervalRunner, IntervalState, RunnerHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::Context;
use crate::render::Output;

#[derive(Args)]
pub struct RunArgs {
    /// Number of intervals to run back to back
    #[arg(short = 'n', long, default_value = "1")]
    pub count: u32,
    /// Emit one JSON event per line instead of the status line
    #[arg(long)]
    pub json: bool,
    /// Pomodoro length in minutes
    #[arg(long = "pomo")]
    pub pomodoro_min: Option<u32>,
    /// Short break length in minutes
    #[arg(long = "short")]
    pub short_break_min: Option<u32>,
    /// Long break length in minutes
    #[arg(long = "long")]
    pub long_break_min: Option<u32>,
}

/// A line typed while an interval runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Pause,
    Resume,
    Quit,
}

impl Control {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Some(Control::Pause),
            "r" | "resume" => Some(Control::Resume),
            "q" | "quit" => Some(Control::Quit),
            _ => None,
        }
    }
}

type Slot = Arc<Mutex<Option<RunnerHandle>>>;

fn lock(slot: &Slot) -> MutexGuard<'_, Option<RunnerHandle>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

fn current_handle(slot: &Slot) -> Option<RunnerHandle> {
    lock(slot).clone()
}

pub fn run(ctx: &Context, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = ctx.settings.clone();
    if let Some(min) = args.pomodoro_min {
        settings.durations.pomodoro_min = min;
    }
    if let Some(min) = args.short_break_min {
        settings.durations.short_break_min = min;
    }
    if let Some(min) = args.long_break_min {
        settings.durations.long_break_min = min;
    }
    let config = settings.interval_config(ctx.repo()?);
    let output = if args.json { Output::Json } else { Output::Text };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(async {
        let cancel = CancellationToken::new();
        let slot = Slot::default();
        tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
        tokio::spawn(read_controls(
            Arc::clone(&slot),
            config.clone(),
            cancel.clone(),
            output,
        ));
        if output == Output::Text {
            println!("p + enter to pause, r to resume, q to quit");
        }
        run_intervals(&config, args.count, cancel, &slot, output).await
    });
    // The stdin reader is parked in a blocking read.
    runtime.shutdown_background();
    result
}

/// Select and run up to `count` intervals, stopping early on cancellation.
async fn run_intervals(
    config: &IntervalConfig,
    count: u32,
    cancel: CancellationToken,
    slot: &Slot,
    output: Output,
) -> Result<(), Box<dyn std::error::Error>> {
    for _ in 0..count {
        if cancel.is_cancelled() {
            break;
        }
        let runner = IntervalRunner::new(get_interval(config)?);
        *lock(slot) = Some(runner.handle());

        let finished = runner
            .start(
                cancel.clone(),
                config,
                |i| output.emit(&Event::started(i, config.clock().now())),
                |i| output.emit(&Event::tick(i, config.clock().now())),
                |i| output.emit(&Event::finished(i, config.clock().now())),
            )
            .await;
        *lock(slot) = None;

        if finished?.state == IntervalState::Cancelled {
            break;
        }
    }
    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("interrupt received, cancelling");
        cancel.cancel();
    }
}

async fn read_controls(
    slot: Slot,
    config: IntervalConfig,
    cancel: CancellationToken,
    output: Output,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Some(control) = Control::parse(&line) else {
            continue;
        };
        if control == Control::Quit {
            cancel.cancel();
            break;
        }
        let Some(handle) = current_handle(&slot) else {
            continue;
        };
        let result = match control {
            Control::Pause => handle.pause().map(|i| Event::paused(&i, config.clock().now())),
            _ => handle.resume().map(|i| Event::resumed(&i, config.clock().now())),
        };
        match result {
            Ok(event) => output.emit(&event),
            Err(e) => warn!("{control:?} ignored: {e}"),
        }
    }
}
