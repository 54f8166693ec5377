use crate::controllers::tiled::config::CoordinatorConfig;
use crate::controllers::tiled::errors::CoordinatorError;
use crate::controllers::tiled::messages::{TileCommand, TileResponse};
use crate::controllers::tiled::progress::Progress;
use crate::controllers::tiled::worker::spawn_tile;
use crate::core::actions::assemble_frame::assemble_frame;
use crate::core::data::band::Band;
use crate::core::data::pixel_buffer::{PixelBuffer, PixelBufferData};
use crate::core::fractals::mandelbrot::colour_schemes::ColourScheme;
use crate::core::fractals::mandelbrot::params::RenderParams;
use crate::core::util::calculate_bands::split_into_bands;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

struct PendingStart {
    params: RenderParams,
    deadline: Instant,
    attempts: u32,
}

/// Coordinator-side view of one tile.
struct TileHandle {
    commands: Sender<TileCommand>,
    generation: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
    run_generation: u64,
    pending_start: Option<PendingStart>,
    last_iteration: u64,
    complete: bool,
    throttled: bool,
}

impl TileHandle {
    fn new(
        commands: Sender<TileCommand>,
        generation: Arc<AtomicU64>,
        thread: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            commands,
            generation,
            thread,
            run_generation: 0,
            pending_start: None,
            last_iteration: 0,
            complete: false,
            throttled: false,
        }
    }

    /// Moves the tile to a new generation, retiring whatever it was running.
    fn bump_generation(&mut self) -> u64 {
        self.run_generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.run_generation
    }
}

/// Splits a view into horizontal bands and drives one tile worker per band.
///
/// Tiles run on their own threads and are reached only through channels.
/// No call blocks for longer than the configured timeouts: `start` returns
/// once commands are queued, and acknowledgements are collected (and missing
/// ones retried) whenever the coordinator services responses.
pub struct TileCoordinator {
    config: CoordinatorConfig,
    tiles: Vec<TileHandle>,
    responses_tx: Sender<TileResponse>,
    responses: Receiver<TileResponse>,
    view: Option<RenderParams>,
    bands: Vec<Band>,
    next_request_id: u64,
}

impl TileCoordinator {
    #[must_use]
    pub fn new(config: CoordinatorConfig) -> Self {
        let (responses_tx, responses) = unbounded();

        Self {
            config,
            tiles: Vec::new(),
            responses_tx,
            responses,
            view: None,
            bands: Vec::new(),
            next_request_id: 0,
        }
    }

    /// Builds a coordinator over tiles whose other ends the caller holds.
    #[cfg(test)]
    pub(crate) fn with_tiles(
        config: CoordinatorConfig,
        responses_tx: Sender<TileResponse>,
        responses: Receiver<TileResponse>,
        tiles: Vec<(Sender<TileCommand>, Arc<AtomicU64>)>,
    ) -> Self {
        Self {
            config,
            tiles: tiles
                .into_iter()
                .map(|(commands, generation)| TileHandle::new(commands, generation, None))
                .collect(),
            responses_tx,
            responses,
            view: None,
            bands: Vec::new(),
            next_request_id: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    #[must_use]
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    #[must_use]
    pub fn view(&self) -> Option<&RenderParams> {
        self.view.as_ref()
    }

    /// (Re)starts every tile on its band of `params`.
    ///
    /// Tiles already running are retired and reinitialised; tiles left over
    /// from a taller view are stopped.
    pub fn start(&mut self, params: RenderParams) -> Result<(), CoordinatorError> {
        params.validate()?;

        let bands = split_into_bands(self.config.workers, params.geometry.height);
        self.ensure_tiles(bands.len())?;

        info!(
            width = params.geometry.width,
            height = params.geometry.height,
            tiles = bands.len(),
            iterations_per_tick = params.iterations_per_tick,
            max_iterations = params.max_iterations,
            "starting view"
        );

        for (index, band) in bands.iter().enumerate() {
            self.send_start(index, params.for_band(band), 1)?;
        }

        for index in bands.len()..self.tiles.len() {
            self.stop_tile(index);
        }

        self.view = Some(params);
        self.bands = bands;

        Ok(())
    }

    /// Stops every tile at its next tick boundary. Fields stay as they are and
    /// can still be requested.
    pub fn stop(&mut self) {
        for index in 0..self.active_tiles() {
            self.stop_tile(index);
        }
        debug!("view stopped");
    }

    /// Waits up to `timeout` for every tile to acknowledge its latest
    /// `start`, reissuing starts that are overdue. Returns whether all did.
    pub fn await_started(&mut self, timeout: Duration) -> Result<bool, CoordinatorError> {
        self.service_until(timeout, |coordinator| coordinator.all_started())
    }

    /// Waits up to `timeout` for every tile of a bounded view to reach its
    /// iteration cap.
    pub fn await_complete(&mut self, timeout: Duration) -> Result<bool, CoordinatorError> {
        self.service_until(timeout, |coordinator| coordinator.is_complete())
    }

    /// True once every tile has reported reaching the view's iteration cap.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.view.is_some_and(|view| view.is_bounded())
            && self.active().all(|tile| tile.complete)
    }

    #[must_use]
    pub fn progress(&self) -> Option<Progress> {
        Progress::from_iterations(self.active().map(|tile| tile.last_iteration))
    }

    /// Collects every tile's current buffer under `scheme` and assembles
    /// them into one frame.
    ///
    /// Returns `Ok(None)` when the frame had to be dropped: a tile did not
    /// answer within the frame timeout or sent a buffer of the wrong size.
    pub fn request_frame(
        &mut self,
        scheme: ColourScheme,
    ) -> Result<Option<PixelBuffer>, CoordinatorError> {
        let Some(view) = self.view else {
            return Err(CoordinatorError::NotStarted);
        };

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        let tile_count = self.active_tiles();

        for index in 0..tile_count {
            let command = TileCommand::Request { request_id, scheme };
            if self.tiles[index].commands.send(command).is_err() {
                return Err(CoordinatorError::TileDisconnected { tile: index });
            }
        }

        let mut buffers: Vec<Option<PixelBufferData>> = vec![None; tile_count];
        let mut outstanding = tile_count;
        let deadline = Instant::now() + self.config.frame_timeout;

        while outstanding > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let response = match self.responses.recv_timeout(remaining) {
                Ok(response) => response,
                Err(RecvTimeoutError::Timeout) => {
                    warn!(request_id, outstanding, "tiles did not answer in time, dropping frame");
                    self.retry_overdue_starts()?;
                    return Ok(None);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    unreachable!("coordinator holds a response sender")
                }
            };

            match response {
                TileResponse::Data {
                    tile,
                    request_id: id,
                    colour_buffer,
                    current_iteration,
                } if id == request_id && tile < tile_count => {
                    if buffers[tile].is_none() {
                        outstanding -= 1;
                    }
                    self.tiles[tile].last_iteration = current_iteration;
                    buffers[tile] = Some(colour_buffer);
                }
                other => self.absorb(other),
            }
        }
        self.retry_overdue_starts()?;

        let tiles: Vec<PixelBufferData> = buffers.into_iter().flatten().collect();
        let geometry = view.geometry;

        let frame = match assemble_frame(geometry.width, geometry.height, &self.bands, &tiles) {
            Ok(frame) => frame,
            Err(error) => {
                warn!(request_id, %error, "dropping frame");
                return Ok(None);
            }
        };

        self.resync(&view);
        trace!(request_id, "frame assembled");

        Ok(Some(frame))
    }

    /// Stops every tile and joins their threads.
    pub fn shutdown(&mut self) {
        for tile in &self.tiles {
            tile.generation.fetch_add(1, Ordering::AcqRel);
            let _ = tile.commands.send(TileCommand::Shutdown);
        }

        for mut tile in self.tiles.drain(..) {
            if let Some(thread) = tile.thread.take() {
                let _ = thread.join();
            }
        }

        self.view = None;
        self.bands.clear();
    }

    fn active_tiles(&self) -> usize {
        self.bands.len().min(self.tiles.len())
    }

    fn active(&self) -> impl Iterator<Item = &TileHandle> {
        self.tiles.iter().take(self.active_tiles())
    }

    fn all_started(&self) -> bool {
        self.active().all(|tile| tile.pending_start.is_none())
    }

    fn ensure_tiles(&mut self, count: usize) -> Result<(), CoordinatorError> {
        while self.tiles.len() < count {
            let index = self.tiles.len();
            let spawned = spawn_tile(index, self.responses_tx.clone())?;
            self.tiles.push(TileHandle::new(
                spawned.commands,
                spawned.generation,
                Some(spawned.thread),
            ));
        }

        Ok(())
    }

    fn respawn(&mut self, index: usize) -> Result<(), CoordinatorError> {
        let spawned = spawn_tile(index, self.responses_tx.clone())?;
        let replacement =
            TileHandle::new(spawned.commands, spawned.generation, Some(spawned.thread));

        let mut old = std::mem::replace(&mut self.tiles[index], replacement);
        if let Some(thread) = old.thread.take() {
            let _ = thread.join();
        }

        Ok(())
    }

    /// Issues `start` under a fresh generation. A tile whose thread is gone is
    /// respawned once before giving up.
    fn send_start(
        &mut self,
        index: usize,
        params: RenderParams,
        attempts: u32,
    ) -> Result<(), CoordinatorError> {
        for _ in 0..2 {
            let generation = self.tiles[index].bump_generation();
            if self.dispatch_start(index, generation, params, attempts) {
                return Ok(());
            }

            warn!(tile = index, "tile worker is gone, respawning");
            self.respawn(index)?;
        }

        Err(CoordinatorError::TileDisconnected { tile: index })
    }

    /// Reissues a pending `start` under the generation it was first sent
    /// with, so an acknowledgement of any copy still counts.
    fn resend_start(
        &mut self,
        index: usize,
        params: RenderParams,
        attempts: u32,
    ) -> Result<(), CoordinatorError> {
        let generation = self.tiles[index].run_generation;
        if self.dispatch_start(index, generation, params, attempts) {
            return Ok(());
        }

        warn!(tile = index, "tile worker is gone, respawning");
        self.respawn(index)?;
        self.send_start(index, params, attempts)
    }

    /// Records the pending start and queues it. False if the tile hung up.
    fn dispatch_start(
        &mut self,
        index: usize,
        generation: u64,
        params: RenderParams,
        attempts: u32,
    ) -> bool {
        let start_timeout = self.config.start_timeout;
        let tile = &mut self.tiles[index];

        tile.pending_start = Some(PendingStart {
            params,
            deadline: Instant::now() + start_timeout,
            attempts,
        });
        tile.last_iteration = 0;
        tile.complete = false;
        tile.throttled = false;

        tile.commands
            .send(TileCommand::Start { generation, params })
            .is_ok()
    }

    fn stop_tile(&mut self, index: usize) {
        let tile = &mut self.tiles[index];
        tile.bump_generation();
        tile.pending_start = None;
        tile.throttled = false;

        if tile.commands.send(TileCommand::Stop).is_err() {
            debug!(tile = index, "stop sent to a tile that is gone");
        }
    }

    fn retry_overdue_starts(&mut self) -> Result<(), CoordinatorError> {
        let now = Instant::now();

        for index in 0..self.active_tiles() {
            let Some(pending) = &self.tiles[index].pending_start else {
                continue;
            };
            if pending.deadline > now {
                continue;
            }

            let params = pending.params;
            let attempts = pending.attempts + 1;
            warn!(tile = index, attempts, "tile did not acknowledge start, reissuing");
            self.resend_start(index, params, attempts)?;
        }

        Ok(())
    }

    /// Services responses until `done` holds or `timeout` runs out.
    fn service_until<F>(&mut self, timeout: Duration, done: F) -> Result<bool, CoordinatorError>
    where
        F: Fn(&Self) -> bool,
    {
        let deadline = Instant::now() + timeout;

        loop {
            self.retry_overdue_starts()?;
            if done(self) {
                return Ok(true);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }

            let wait = (deadline - now).min(self.config.start_timeout);
            match self.responses.recv_timeout(wait) {
                Ok(response) => self.absorb(response),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    unreachable!("coordinator holds a response sender")
                }
            }
        }
    }

    /// Applies a response that is not part of a frame being collected.
    fn absorb(&mut self, response: TileResponse) {
        match response {
            TileResponse::Started { tile, generation } => {
                let Some(handle) = self.tiles.get_mut(tile) else {
                    return;
                };
                if handle.run_generation == generation && handle.pending_start.take().is_some() {
                    debug!(tile, generation, "tile acknowledged start");
                }
            }
            TileResponse::Completed {
                tile,
                generation,
                current_iteration,
            } => {
                let Some(handle) = self.tiles.get_mut(tile) else {
                    return;
                };
                if handle.run_generation == generation {
                    handle.complete = true;
                    handle.last_iteration = current_iteration;
                    info!(tile, current_iteration, "tile reached iteration cap");
                }
            }
            TileResponse::Failed {
                tile,
                generation,
                error,
            } => {
                let Some(handle) = self.tiles.get_mut(tile) else {
                    return;
                };
                if handle.run_generation == generation {
                    handle.pending_start = None;
                    error!(tile, generation, %error, "tile failed to start");
                }
            }
            TileResponse::Data {
                tile, request_id, ..
            } => {
                trace!(tile, request_id, "discarding stale tile buffer");
            }
        }
    }

    /// Throttles tiles that have run ahead of the slowest by more than the
    /// configured slack, and releases those that have fallen back in line.
    fn resync(&mut self, view: &RenderParams) {
        if self.config.sync_delay.is_zero() {
            return;
        }
        let Some(progress) = self.progress() else {
            return;
        };

        let slack = self
            .config
            .resync_slack_ticks
            .saturating_mul(u64::from(view.iterations_per_tick));
        let sync_delay = self.config.sync_delay;

        for index in 0..self.active_tiles() {
            let tile = &mut self.tiles[index];
            let ahead = tile.last_iteration > progress.min.saturating_add(slack);
            if ahead == tile.throttled {
                continue;
            }

            let delay = if ahead { sync_delay } else { Duration::ZERO };
            if tile.commands.send(TileCommand::Throttle(delay)).is_ok() {
                tile.throttled = ahead;
                debug!(tile = index, throttled = ahead, "resync");
            }
        }
    }
}

impl Drop for TileCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
