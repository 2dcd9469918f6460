// resizekro/src/core/session.rs
use super::{
    ActionRejected, ArtifactOrigin, AspectRatio, Axis, DecodeError, Dimensions, ProcessedArtifact,
    ResizeKroError, Result, SessionConfig,
};
use crate::processors::{
    CompressionController, DimensionModel, Loader, ResizeController, SourceImage,
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Resize,
    Compress,
}

/// Identifies the load an in-flight operation was started against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Handed out by `begin_*` and consumed by [`SessionState::complete`].
#[derive(Debug, PartialEq, Eq)]
pub struct ActionTicket {
    generation: u64,
    kind: ActionKind,
}

impl ActionTicket {
    pub fn kind(&self) -> ActionKind {
        self.kind
    }
}

#[derive(Debug)]
pub struct ResizeRequest {
    pub ticket: ActionTicket,
    pub source: Arc<SourceImage>,
    pub target: Dimensions,
}

#[derive(Debug)]
pub struct CompressRequest {
    pub ticket: ActionTicket,
    pub source: Arc<SourceImage>,
    pub target_kb: f64,
}

/// Everything known about the one image being worked on.
///
/// Actions run in two halves: `begin_*` validates and hands out a request
/// holding its own reference to the source, and [`SessionState::complete`]
/// installs the outcome. Between the two the session refuses new actions.
/// A completion whose load generation no longer matches is dropped, so a
/// result computed for a replaced image never reaches the artifact slot.
pub struct SessionState {
    config: SessionConfig,
    loader: Loader,
    source: Option<Arc<SourceImage>>,
    decoding: bool,
    dimensions: DimensionModel,
    target_kb: Option<f64>,
    artifact: Option<ProcessedArtifact>,
    generation: u64,
    in_flight: Option<ActionKind>,
}

impl SessionState {
    pub fn new(config: SessionConfig) -> Self {
        let (max_width, max_height) = config.max_dimensions;
        Self {
            loader: Loader::new().with_max_dimensions(max_width, max_height),
            dimensions: DimensionModel::new(config.lock_aspect_ratio),
            config,
            source: None,
            decoding: false,
            target_kb: None,
            artifact: None,
            generation: 0,
            in_flight: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_deref()
    }

    pub fn is_decoding(&self) -> bool {
        self.decoding
    }

    pub fn dimensions(&self) -> &DimensionModel {
        &self.dimensions
    }

    pub fn aspect_ratio(&self) -> Option<AspectRatio> {
        self.dimensions.aspect_ratio()
    }

    pub fn target_kb(&self) -> Option<f64> {
        self.target_kb
    }

    pub fn artifact(&self) -> Option<&ProcessedArtifact> {
        self.artifact.as_ref()
    }

    pub fn in_flight(&self) -> Option<ActionKind> {
        self.in_flight
    }

    /// Drops the current image and everything derived from it. Dimensions
    /// read `(0, 0)` until [`SessionState::finish_load`] is called.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.source = None;
        self.decoding = true;
        self.dimensions.load(Dimensions::default());
        self.target_kb = None;
        self.artifact = None;
        self.in_flight = None;

        log::debug!("Load {} started", self.generation);
        LoadTicket {
            generation: self.generation,
        }
    }

    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        decoded: std::result::Result<SourceImage, DecodeError>,
    ) -> Result<Dimensions> {
        if ticket.generation != self.generation {
            log::debug!("Discarding decode for superseded load {}", ticket.generation);
            return Err(ActionRejected::Stale.into());
        }
        self.decoding = false;

        let source = decoded.map_err(|e| {
            log::warn!("Failed to decode image: {}", e);
            e
        })?;

        let original = source.dimensions;
        self.source = Some(Arc::new(source));
        self.dimensions.load(original);

        log::info!("Loaded image {} (load {})", original, self.generation);
        Ok(original)
    }

    pub fn load_image(&mut self, bytes: Vec<u8>) -> Result<Dimensions> {
        let ticket = self.begin_load();
        let decoded = self.loader.decode(bytes);
        self.finish_load(ticket, decoded)
    }

    pub async fn load_image_async(&mut self, bytes: Vec<u8>) -> Result<Dimensions> {
        let ticket = self.begin_load();
        let decoded = self.loader.decode_async(bytes).await;
        self.finish_load(ticket, decoded)
    }

    pub fn set_dimension(&mut self, axis: Axis, value: u32) -> Dimensions {
        self.dimensions.set_dimension(axis, value)
    }

    pub fn set_lock_aspect_ratio(&mut self, locked: bool) {
        self.dimensions.set_lock_aspect_ratio(locked);
    }

    pub fn set_target_kb(&mut self, target_kb: Option<f64>) {
        self.target_kb = target_kb;
    }

    /// Restores the original dimensions. Only a resize artifact is cleared.
    pub fn reset_resize(&mut self) -> Dimensions {
        self.clear_artifact_from(ArtifactOrigin::Resize);
        self.dimensions.reset_to_original()
    }

    /// Clears the target size. Only a compression artifact is cleared.
    pub fn reset_compress(&mut self) {
        self.target_kb = None;
        self.clear_artifact_from(ArtifactOrigin::Compress);
    }

    fn clear_artifact_from(&mut self, origin: ArtifactOrigin) {
        if self.artifact.as_ref().map(|a| a.origin) == Some(origin) {
            self.artifact = None;
        }
    }

    fn ready_source(&self) -> Result<Arc<SourceImage>> {
        if let Some(kind) = self.in_flight {
            return Err(ActionRejected::InFlight(kind).into());
        }
        if self.decoding {
            return Err(ActionRejected::NotDecoded.into());
        }
        self.source
            .clone()
            .ok_or(ResizeKroError::Rejected(ActionRejected::NotLoaded))
    }

    pub fn can_resize(&self) -> bool {
        self.ready_source()
            .and_then(|source| ResizeController::validate(Some(&*source), &self.dimensions))
            .is_ok()
    }

    pub fn can_compress(&self) -> bool {
        self.ready_source().is_ok()
            && CompressionController::validate_target(self.target_kb).is_ok()
    }

    fn ticket(&mut self, kind: ActionKind) -> ActionTicket {
        self.in_flight = Some(kind);
        ActionTicket {
            generation: self.generation,
            kind,
        }
    }

    pub fn begin_resize(&mut self) -> Result<ResizeRequest> {
        let source = self.ready_source()?;
        let target = ResizeController::validate(Some(&*source), &self.dimensions)?;
        Ok(ResizeRequest {
            ticket: self.ticket(ActionKind::Resize),
            source,
            target,
        })
    }

    pub fn begin_compress(&mut self) -> Result<CompressRequest> {
        let source = self.ready_source()?;
        let target_kb = CompressionController::validate_target(self.target_kb)?;
        Ok(CompressRequest {
            ticket: self.ticket(ActionKind::Compress),
            source,
            target_kb,
        })
    }

    /// Installs the result of an action started with `begin_*`. Failures
    /// leave the artifact slot as it was. A ticket that does not belong to the
    /// action currently in flight is refused without touching the slot.
    pub fn complete(
        &mut self,
        ticket: ActionTicket,
        outcome: Result<ProcessedArtifact>,
    ) -> Result<&ProcessedArtifact> {
        if ticket.generation != self.generation {
            log::debug!("Discarding {:?} result for a replaced image", ticket.kind);
            return Err(ActionRejected::Stale.into());
        }
        if self.in_flight != Some(ticket.kind) {
            log::debug!("Discarding {:?} result, not the action in flight", ticket.kind);
            return Err(ActionRejected::Stale.into());
        }
        self.in_flight = None;

        match outcome {
            Ok(artifact) => {
                log::info!(
                    "{} artifact ready: {} ({} KB)",
                    artifact.origin,
                    artifact.dimensions,
                    artifact.size_kb()
                );
                Ok(self.artifact.insert(artifact))
            }
            Err(e) => {
                log::warn!("{:?} failed: {}", ticket.kind, e);
                Err(e)
            }
        }
    }

    pub fn resize(&mut self, controller: &ResizeController) -> Result<&ProcessedArtifact> {
        let request = self.begin_resize()?;
        let outcome = controller.render(&request.source, request.target);
        self.complete(request.ticket, outcome)
    }

    pub async fn resize_async(
        &mut self,
        controller: &ResizeController,
    ) -> Result<&ProcessedArtifact> {
        let request = self.begin_resize()?;
        let outcome = controller.render_async(request.source, request.target).await;
        self.complete(request.ticket, outcome)
    }

    pub fn compress(&mut self, controller: &CompressionController) -> Result<&ProcessedArtifact> {
        let request = self.begin_compress()?;
        let outcome = controller.compress_to_target(&request.source, request.target_kb);
        self.complete(request.ticket, outcome)
    }

    pub async fn compress_async(
        &mut self,
        controller: &CompressionController,
    ) -> Result<&ProcessedArtifact> {
        let request = self.begin_compress()?;
        let outcome = controller
            .compress_to_target_async(request.source, request.target_kb)
            .await;
        self.complete(request.ticket, outcome)
    }

    pub fn resize_controller(&self) -> ResizeController {
        ResizeController::new(Arc::new(crate::processors::Resizer::new(
            self.config.algorithm,
        )))
    }

    pub fn compression_controller(&self) -> CompressionController {
        CompressionController::new(Arc::new(crate::processors::TargetSizeCompressor::new(
            self.config.algorithm,
        )))
        .with_initial_quality(self.config.initial_quality)
        .with_max_iterations(self.config.max_iterations)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("generation", &self.generation)
            .field("decoding", &self.decoding)
            .field("dimensions", &self.dimensions)
            .field("target_kb", &self.target_kb)
            .field("artifact", &self.artifact.as_ref().map(|a| (a.origin, a.size_bytes())))
            .field("in_flight", &self.in_flight)
            .finish()
    }
}
