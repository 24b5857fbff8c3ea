use clap::Parser;
use scene_swap::{
    AnimationConfig, AnimationSequencer, BuildError, CancelToken, ContentBuilder,
    ControlSwitchRegistry, DirectChannel, Display, DomainSet, DomainSetCache, DrawLoop,
    DrawLoopConfig, IndexSwitch, NeverCancel, OverlayPresenter, RedrawTrigger,
    RenderPresenterPort, Rendering, SwapConfig, Unit, precompute_frame_switch,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{Level, info};

#[derive(Parser, Debug)]
#[command(name = "swap_demo", version)]
struct Args {
    /// Content rebuilds to request while the draw loop runs.
    #[arg(long, default_value_t = 24)]
    rebuilds: u32,

    /// Animation frames to precompute.
    #[arg(long, default_value_t = 8)]
    frames: usize,

    /// Dwell per animation frame, in milliseconds.
    #[arg(long, default_value_t = 40)]
    step_ms: i64,

    /// Every n-th rebuild fails with a bad mapping (0 disables).
    #[arg(long, default_value_t = 7)]
    fail_every: u32,

    /// Log at debug level.
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug)]
struct Scene {
    values: Vec<f64>,
}

#[derive(Debug)]
struct SceneRequest {
    time: f64,
    samples: usize,
    fail: bool,
}

/// Samples a travelling wave; stands in for real geometry construction.
struct WaveBuilder;

impl ContentBuilder for WaveBuilder {
    type Request = SceneRequest;
    type Content = Scene;

    fn build(&self, request: &SceneRequest, cancel: &dyn CancelToken) -> Result<Scene, BuildError> {
        if request.fail {
            return Err(BuildError::bad_mapping(format!(
                "no spatial mapping at t={}",
                request.time
            )));
        }

        let mut values = Vec::with_capacity(request.samples);
        for i in 0..request.samples {
            if i % 64 == 0 {
                cancel.check()?;
            }
            values.push((request.time * 0.25 + i as f64 * 0.05).sin());
        }
        Ok(Scene { values })
    }
}

#[derive(Debug)]
struct DemoSummary {
    frames_drawn: u64,
    swaps: u64,
    failures: u64,
    animation_frame: Option<usize>,
    probe_edits: u64,
    save_string: String,
}

fn run(args: &Args) -> Result<DemoSummary, Box<dyn std::error::Error>> {
    let display = Arc::new(Display::new(SwapConfig::default()));
    let redraw = Arc::clone(display.redraw_signal()) as Arc<dyn RedrawTrigger>;
    let overlay = Arc::new(OverlayPresenter::new());
    let frames_drawn = Arc::new(AtomicU64::new(0));

    let mut draw_loop = {
        let frames_drawn = Arc::clone(&frames_drawn);
        DrawLoop::spawn(
            Arc::clone(&display),
            DrawLoopConfig::default(),
            move |_, scene: &Scene| {
                if !scene.values.is_empty() {
                    frames_drawn.fetch_add(1, Ordering::Relaxed);
                }
            },
        )
    };

    let builder = Arc::new(WaveBuilder);
    let rendering = Rendering::attach(
        &display,
        Arc::new(IndexSwitch::new(3)),
        Arc::clone(&builder),
        Arc::clone(&overlay) as Arc<dyn RenderPresenterPort>,
    );

    let frame_count = args.frames.max(1);
    let times: Arc<dyn DomainSet> = DomainSetCache::global().gridded(
        (0..frame_count).map(|t| t as f64).collect(),
        Some(Unit::base("h")),
    )?;
    let requests: Vec<SceneRequest> = (0..frame_count)
        .map(|t| SceneRequest {
            time: t as f64,
            samples: 128,
            fail: false,
        })
        .collect();
    let animation_frames = Arc::new(precompute_frame_switch(
        builder.as_ref(),
        &requests,
        &NeverCancel,
    )?);
    info!(frames = animation_frames.len(), "animation frames precomputed");

    let registry = Arc::new(ControlSwitchRegistry::new());
    rendering.bind_control(&registry, animation_frames.clone(), Arc::clone(&times));

    let mut animation = AnimationSequencer::new(
        Arc::clone(&registry),
        Arc::clone(&redraw),
        AnimationConfig::default(),
    );
    animation.set_set(Some(times));
    animation.set_step(args.step_ms)?;
    animation.set_on(true);

    let probe = DirectChannel::new([0.0_f64; 2], redraw);
    probe.begin_drag()?;

    let mut last = 0;
    for i in 0..args.rebuilds {
        let fail = args.fail_every > 0 && (i + 1) % args.fail_every == 0;
        last = rendering.request(SceneRequest {
            time: f64::from(i),
            samples: 4096,
            fail,
        });
        probe.manipulate(|p| p[0] += 0.5)?;
        thread::sleep(Duration::from_millis(2));
    }
    probe.end_drag()?;

    let deadline = Instant::now() + Duration::from_secs(5);
    while rendering.last_completed_generation() < last {
        if Instant::now() >= deadline {
            return Err("rendering did not complete its last request in time".into());
        }
        thread::sleep(Duration::from_millis(5));
    }

    animation.set_on(false);
    let save_string = animation.save_string();
    animation.shutdown();
    draw_loop.shutdown();

    let status = rendering.status();
    let summary = DemoSummary {
        frames_drawn: frames_drawn.load(Ordering::Relaxed),
        swaps: overlay.swaps_presented(),
        failures: overlay.failures_presented(),
        animation_frame: animation_frames.visible_index(),
        probe_edits: probe.generation(),
        save_string,
    };

    println!("Display frames: {}", display.frames_completed());
    println!("Frames drawn with content: {}", summary.frames_drawn);
    println!("Swaps: {}, failures: {}", summary.swaps, summary.failures);
    println!("Slots: {:?} (feasible: {})", status.states, status.feasible);
    println!("Slow-consumer timeouts: {}", status.slow_consumer_timeouts);
    for (rendering, message) in overlay.overlays() {
        println!("Overlay {rendering}: {message}");
    }
    println!("Animation frame: {:?}", summary.animation_frame);
    println!("Probe edits: {}", summary.probe_edits);
    println!("Animation save string: {}", summary.save_string);

    Ok(summary)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    run(&args)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_small_workload_returns_ok() {
        let args = Args::parse_from(["swap_demo", "--rebuilds", "6", "--frames", "3", "--step-ms", "5"]);

        let summary = run(&args).expect("demo should complete");

        assert!(summary.swaps >= 1);
        assert_eq!(summary.probe_edits, 6);
        assert!(summary.animation_frame.is_some());
        assert!(summary.save_string.starts_with("false true "));
    }

    #[test]
    fn test_failures_are_reported_not_fatal() {
        let args = Args::parse_from(["swap_demo", "--rebuilds", "1", "--fail-every", "1"]);

        let summary = run(&args).expect("failed builds must not abort the demo");

        assert_eq!(summary.swaps, 0);
        assert_eq!(summary.failures, 1);
    }
}
