//! Fixed-timestep driver
//!
//! Owns the [`Simulation`] and decides when ticks run. The simulation core
//! has no loop of its own; this is where pacing, frame-time clamping,
//! cancellation and frame output happen.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{RunError, SimError};
use crate::sim::{Frame, Simulation};

/// Cooperative stop signal, checked once per driver iteration
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Consumer of rendered frames (the renderer seam)
pub trait FrameSink {
    fn present(&mut self, frame: &Frame) -> io::Result<()>;
}

/// Discards every frame
#[derive(Debug, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _frame: &Frame) -> io::Result<()> {
        Ok(())
    }
}

/// Writes each frame as one line of JSON
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    out: W,
    frames: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, frames: 0 }
    }

    /// Frames written so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn present(&mut self, frame: &Frame) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, frame)?;
        self.out.write_all(b"\n")?;
        self.frames += 1;
        Ok(())
    }
}

/// Runs a simulation at its fixed tick rate
#[derive(Debug)]
pub struct Driver {
    sim: Simulation,
    /// Unsimulated wall-clock time carried between frames
    accumulator: f32,
    /// Headless runs present one frame per this many ticks
    present_every: u64,
}

impl Driver {
    pub fn new(sim: Simulation) -> Self {
        Self {
            sim,
            accumulator: 0.0,
            present_every: 1,
        }
    }

    pub fn with_present_every(mut self, ticks: u64) -> Self {
        self.present_every = ticks.max(1);
        self
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Run the ticks owed for `frame_dt` seconds of wall-clock time.
    ///
    /// Frame time is clamped to `max_frame_time` and at most `max_substeps`
    /// ticks run; any backlog beyond that is dropped. Returns the number of
    /// ticks run.
    pub fn advance(&mut self, frame_dt: f32) -> Result<u32, SimError> {
        let config = self.sim.config();
        let dt = config.tick;
        let max_substeps = config.max_substeps;
        let max_frame_time = config.max_frame_time;

        let mut frame_dt = if frame_dt.is_finite() { frame_dt.max(0.0) } else { 0.0 };
        if frame_dt > max_frame_time {
            log::warn!("Frame took {frame_dt:.3}s, clamping to {max_frame_time:.3}s");
            frame_dt = max_frame_time;
        }
        self.accumulator += frame_dt;

        let mut substeps = 0;
        while self.accumulator >= dt && substeps < max_substeps {
            self.sim.step(dt)?;
            self.accumulator -= dt;
            substeps += 1;
        }

        if self.accumulator >= dt {
            log::warn!(
                "Substep cap {max_substeps} hit, dropping {:.3}s of backlog",
                self.accumulator
            );
            self.accumulator %= dt;
        }
        Ok(substeps)
    }

    /// Run `ticks` fixed ticks as fast as possible, presenting the initial
    /// frame and then one frame every `present_every` ticks.
    ///
    /// Returns the number of ticks actually run (fewer if stopped).
    pub fn run_ticks(
        &mut self,
        ticks: u64,
        stop: &StopToken,
        sink: &mut impl FrameSink,
    ) -> Result<u64, RunError> {
        let dt = self.sim.config().tick;
        log::info!("Running {ticks} ticks headless (dt = {dt:.4}s)");

        sink.present(&self.sim.frame())?;
        let mut ran = 0;
        while ran < ticks {
            if stop.is_stopped() {
                log::info!("Stop requested after {ran} ticks");
                break;
            }
            self.sim.step(dt)?;
            ran += 1;
            if ran % self.present_every == 0 {
                sink.present(&self.sim.frame())?;
            }
        }
        Ok(ran)
    }

    /// Run in wall-clock time until `stop` is requested, presenting a frame
    /// after every iteration that ran at least one tick.
    pub fn run_realtime(
        &mut self,
        stop: &StopToken,
        sink: &mut impl FrameSink,
    ) -> Result<u64, RunError> {
        let frame_budget = Duration::from_secs_f32(self.sim.config().tick);
        log::info!("Running realtime at {:.1} Hz", 1.0 / frame_budget.as_secs_f32());

        sink.present(&self.sim.frame())?;
        let mut ran = 0u64;
        let mut last = Instant::now();
        while !stop.is_stopped() {
            let frame_start = Instant::now();
            let frame_dt = frame_start.duration_since(last).as_secs_f32();
            last = frame_start;

            let substeps = self.advance(frame_dt)?;
            ran += u64::from(substeps);
            if substeps > 0 {
                sink.present(&self.sim.frame())?;
            }

            let elapsed = frame_start.elapsed();
            if elapsed < frame_budget {
                std::thread::sleep(frame_budget - elapsed);
            }
        }
        log::info!("Stop requested after {ran} ticks");
        Ok(ran)
    }
}
