//! Render synchronization: the phase machine that takes a form snapshot to
//! a capture-ready instance.
//!
//! Every wait is bounded. A step that runs out of time degrades (the phase
//! reached so far is reported) instead of hanging; only export-time
//! container loss is fatal. Settle frames are counted ticks, giving the
//! surface and the text sizer a fixed number of quiet iterations before the
//! instance is declared ready.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::assets::{self, AssetLoader};
use crate::compose::textfit::{self, HeuristicMeasurer};
use crate::compositor::{self, TemplateInstance, TemplateSource};
use crate::error::{Error, Result};
use crate::export::{self, DocumentPacker, DownloadSink, ExportReceipt, Rasterizer};
use crate::record::{FormSnapshot, ListingRecord};
use crate::{StudioConfig, TemplateVariant};

/// Pipeline phases, in order. `Ready` means capture may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Fetching,
    Substituted,
    ImagesSettled,
    Composited,
    TextFit,
    FramesSettled,
    Ready,
}

/// Poll a probe until it yields or the deadline passes.
pub fn wait_until<T>(timeout_ms: u64, mut probe: impl FnMut() -> Option<T>) -> Option<T> {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        if let Some(value) = probe() {
            return Some(value);
        }
        if Instant::now() >= deadline {
            return None;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
}

/// Give the instance `ticks` quiet iterations before moving on
fn settle_frames(ticks: u32) {
    for _ in 0..ticks {
        std::thread::yield_now();
    }
}

/// What one generation pass accomplished
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub variant: TemplateVariant,
    /// Phase reached; `Ready` on the happy path
    pub phase: Phase,
    /// The single user-facing warning from collection, if any
    pub warning: Option<String>,
    pub images_settled: usize,
    pub images_failed: usize,
    /// Textbox ids the sizer actually touched
    pub boxes_sized: Vec<String>,
    /// Digest of the composited surface, when one was drawn
    pub canvas_digest: Option<String>,
}

/// The blocking pipeline: owns the template source, asset loader and export
/// machinery, and keeps the latest settled instance per variant.
pub struct Pipeline {
    config: StudioConfig,
    templates: Box<dyn TemplateSource>,
    assets: Box<dyn AssetLoader>,
    rasterizer: Box<dyn Rasterizer>,
    sink: Box<dyn DownloadSink>,
    packer: Box<dyn DocumentPacker>,
    measurer: HeuristicMeasurer,
    instances: HashMap<TemplateVariant, TemplateInstance>,
}

impl Pipeline {
    pub fn new(
        config: StudioConfig,
        templates: Box<dyn TemplateSource>,
        assets: Box<dyn AssetLoader>,
        rasterizer: Box<dyn Rasterizer>,
        sink: Box<dyn DownloadSink>,
        packer: Box<dyn DocumentPacker>,
    ) -> Self {
        Self {
            config,
            templates,
            assets,
            rasterizer,
            sink,
            packer,
            measurer: HeuristicMeasurer::default(),
            instances: HashMap::new(),
        }
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    /// The latest settled instance for a variant, if one was generated
    pub fn instance(&self, variant: TemplateVariant) -> Option<&TemplateInstance> {
        self.instances.get(&variant)
    }

    /// Run the full phase machine for one variant and store the settled
    /// instance as that variant's current preview.
    pub fn generate(
        &mut self,
        variant: TemplateVariant,
        snapshot: &FormSnapshot,
    ) -> Result<GenerateReport> {
        let spec = variant.spec();
        let mut phase = Phase::Fetching;
        log::debug!("generate {}: {:?}", spec.name, phase);

        let (record, warning) = ListingRecord::collect(snapshot, &self.config);

        let mut instance = compositor::build_instance(variant, self.templates.as_ref(), &record)?;
        phase = Phase::Substituted;
        log::trace!("generate {}: {:?}", spec.name, phase);

        let (images_settled, images_failed) =
            assets::settle_images(&instance.dom, self.assets.as_ref());
        phase = Phase::ImagesSettled;
        log::trace!(
            "generate {}: {:?} ({} settled, {} failed)",
            spec.name,
            phase,
            images_settled,
            images_failed
        );

        // The surface must be in the document before compositing; a template
        // without one composites nothing and the phase still advances.
        let surface = wait_until(self.config.compose_wait_ms, || {
            Some(instance.dom.find_by_id(spec.canvas_id))
        })
        .flatten();
        let mut canvas_digest = None;
        if surface.is_some() {
            instance.canvas = compositor::composite_surface(
                &instance.dom,
                spec,
                &record,
                &self.config.overlay,
                self.assets.as_ref(),
            );
            canvas_digest = instance.canvas.as_ref().map(|c| c.digest());
        }
        compositor::apply_broker_overrides(&mut instance.dom, spec, &record, self.assets.as_ref());
        phase = Phase::Composited;
        log::trace!("generate {}: {:?}", spec.name, phase);

        settle_frames(self.config.settle_frames_compose);

        let boxes_sized = textfit::run_text_fit(
            &mut instance.dom,
            spec.fit_boxes,
            &self.config.text_fit,
            &self.measurer,
        );
        phase = Phase::TextFit;
        log::trace!("generate {}: {:?} ({} boxes)", spec.name, phase, boxes_sized.len());

        settle_frames(self.config.settle_frames_export);
        phase = Phase::FramesSettled;

        if instance.dom.capture_container().is_some() {
            phase = Phase::Ready;
        }
        instance.phase = phase;

        if phase < Phase::Ready {
            log::warn!("generate {}: stalled at {:?}", spec.name, phase);
        }
        self.instances.insert(variant, instance);

        Ok(GenerateReport {
            variant,
            phase,
            warning,
            images_settled,
            images_failed,
            boxes_sized,
            canvas_digest,
        })
    }

    /// Generate the variant fresh from the snapshot, then capture and
    /// deliver it. A capture container missing at this point is fatal.
    pub fn export(
        &mut self,
        variant: TemplateVariant,
        snapshot: &FormSnapshot,
    ) -> Result<ExportReceipt> {
        self.generate(variant, snapshot)?;

        let ready = wait_until(self.config.export_wait_ms, || {
            self.instances
                .get(&variant)
                .filter(|i| i.phase == Phase::Ready)
                .map(|_| ())
        });
        if ready.is_none() {
            return Err(Error::Timeout(self.config.export_wait_ms));
        }

        let instance = self
            .instances
            .get_mut(&variant)
            .ok_or(Error::ContainerMissing)?;
        export::export_instance(
            instance,
            &self.config,
            self.rasterizer.as_ref(),
            self.sink.as_ref(),
        )
    }

    /// Pack and deliver the summary document straight from the snapshot
    pub fn export_summary(&mut self, snapshot: &FormSnapshot) -> Result<ExportReceipt> {
        let (record, _) = ListingRecord::collect(snapshot, &self.config);
        export::export_summary(
            &record,
            &snapshot.date,
            &snapshot.time,
            self.packer.as_ref(),
            self.sink.as_ref(),
        )
    }
}
