use crate::controllers::tiled::messages::{TileCommand, TileResponse};
use crate::core::actions::cancellation::{CancelToken, GenerationToken};
use crate::core::data::pixel_buffer::PixelBufferData;
use crate::core::fractals::mandelbrot::colour_schemes::ColourScheme;
use crate::core::fractals::mandelbrot::engine::MandelbrotEngine;
use crate::core::fractals::mandelbrot::params::RenderParams;
use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    Idle,
    Running,
    Stopped,
    Complete,
}

/// The coordinator's end of a freshly spawned tile.
pub(crate) struct SpawnedTile {
    pub commands: Sender<TileCommand>,
    pub generation: Arc<AtomicU64>,
    pub thread: JoinHandle<()>,
}

pub(crate) fn spawn_tile(
    tile: usize,
    responses: Sender<TileResponse>,
) -> std::io::Result<SpawnedTile> {
    let (commands, receiver) = unbounded();
    let generation = Arc::new(AtomicU64::new(0));
    let worker = TileWorker::new(tile, receiver, responses, Arc::clone(&generation));

    let thread = thread::Builder::new()
        .name(format!("tile-{}", tile))
        .spawn(move || worker.run())?;

    Ok(SpawnedTile {
        commands,
        generation,
        thread,
    })
}

struct TileRun {
    engine: MandelbrotEngine,
    params: RenderParams,
    token: GenerationToken,
}

/// One band's engine, driven by commands and a cooperative tick loop.
///
/// While running, the worker drains every queued command, then runs a single
/// `advance` and yields. Cancellation is only observed between ticks.
pub(crate) struct TileWorker {
    tile: usize,
    commands: Receiver<TileCommand>,
    responses: Sender<TileResponse>,
    generation: Arc<AtomicU64>,
    state: TileState,
    run: Option<TileRun>,
    throttle: Duration,
}

impl TileWorker {
    pub(crate) fn new(
        tile: usize,
        commands: Receiver<TileCommand>,
        responses: Sender<TileResponse>,
        generation: Arc<AtomicU64>,
    ) -> Self {
        Self {
            tile,
            commands,
            responses,
            generation,
            state: TileState::Idle,
            run: None,
            throttle: Duration::ZERO,
        }
    }

    pub(crate) fn run(mut self) {
        debug!(tile = self.tile, "tile worker started");

        loop {
            let command = if self.state == TileState::Running {
                match self.commands.try_recv() {
                    Ok(command) => Some(command),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => break,
                }
            } else {
                match self.commands.recv() {
                    Ok(command) => Some(command),
                    Err(_) => break,
                }
            };

            let flow = match command {
                Some(command) => self.handle(command),
                None => self.tick(),
            };

            if flow.is_break() {
                break;
            }
        }

        debug!(tile = self.tile, "tile worker exiting");
    }

    fn handle(&mut self, command: TileCommand) -> ControlFlow<()> {
        match command {
            TileCommand::Start { generation, params } => self.start(generation, params),
            TileCommand::Stop => {
                if self.state == TileState::Running {
                    self.state = TileState::Stopped;
                    debug!(tile = self.tile, "tile stopped");
                }
                ControlFlow::Continue(())
            }
            TileCommand::Request { request_id, scheme } => self.respond(request_id, scheme),
            TileCommand::Throttle(delay) => {
                self.throttle = delay;
                ControlFlow::Continue(())
            }
            TileCommand::Shutdown => ControlFlow::Break(()),
        }
    }

    fn start(&mut self, generation: u64, params: RenderParams) -> ControlFlow<()> {
        if generation != self.generation.load(Ordering::Acquire) {
            trace!(tile = self.tile, generation, "skipping superseded start");
            return ControlFlow::Continue(());
        }

        // a reissued start for the run already in place only needs the ack
        if self
            .run
            .as_ref()
            .is_some_and(|run| run.token.issued() == generation)
        {
            return self.send(TileResponse::Started {
                tile: self.tile,
                generation,
            });
        }

        match MandelbrotEngine::from_params(&params) {
            Ok(engine) => {
                self.run = Some(TileRun {
                    engine,
                    params,
                    token: GenerationToken::new(Arc::clone(&self.generation), generation),
                });
                self.state = TileState::Running;
                self.throttle = Duration::ZERO;

                debug!(
                    tile = self.tile,
                    generation,
                    width = params.geometry.width,
                    height = params.geometry.height,
                    row_offset = params.geometry.row_offset,
                    "tile started"
                );

                self.send(TileResponse::Started {
                    tile: self.tile,
                    generation,
                })
            }
            Err(error) => {
                warn!(tile = self.tile, generation, %error, "tile rejected start");
                self.run = None;
                self.state = TileState::Idle;

                self.send(TileResponse::Failed {
                    tile: self.tile,
                    generation,
                    error,
                })
            }
        }
    }

    fn tick(&mut self) -> ControlFlow<()> {
        let Some(run) = self.run.as_mut() else {
            self.state = TileState::Idle;
            return ControlFlow::Continue(());
        };

        if run.token.is_cancelled() {
            self.state = TileState::Stopped;
            debug!(
                tile = self.tile,
                generation = run.token.issued(),
                "run superseded, stopping"
            );
            return ControlFlow::Continue(());
        }

        let max_iterations = run.params.max_iterations;
        let batch = run
            .engine
            .advance_capped(run.params.iterations_per_tick, max_iterations);
        let current_iteration = run.engine.current_iteration();
        trace!(tile = self.tile, batch, current_iteration, "tick");

        if run.engine.is_complete(max_iterations) {
            let generation = run.token.issued();
            self.state = TileState::Complete;
            info!(tile = self.tile, current_iteration, "tile complete");

            return self.send(TileResponse::Completed {
                tile: self.tile,
                generation,
                current_iteration,
            });
        }

        if !self.throttle.is_zero() {
            thread::sleep(self.throttle);
        }
        thread::yield_now();

        ControlFlow::Continue(())
    }

    fn respond(&mut self, request_id: u64, scheme: ColourScheme) -> ControlFlow<()> {
        let (colour_buffer, current_iteration) = match &self.run {
            Some(run) => (
                run.engine.render(scheme).into_data(),
                run.engine.current_iteration(),
            ),
            None => (PixelBufferData::new(), 0),
        };

        self.send(TileResponse::Data {
            tile: self.tile,
            request_id,
            colour_buffer,
            current_iteration,
        })
    }

    fn send(&self, response: TileResponse) -> ControlFlow<()> {
        if self.responses.send(response).is_err() {
            debug!(tile = self.tile, "coordinator hung up");
            return ControlFlow::Break(());
        }

        ControlFlow::Continue(())
    }
}
