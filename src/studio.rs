//! Async facade over the blocking pipeline.
//!
//! The pipeline is not `Sync`; a dedicated worker thread owns it and
//! processes commands from a channel, replying over oneshots. Callers get
//! plain async methods. A per-variant busy flag rejects a second request
//! for a variant whose previous request is still in flight, instead of
//! queueing it behind stale input.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::export::ExportReceipt;
use crate::record::FormSnapshot;
use crate::sync::{GenerateReport, Pipeline};
use crate::TemplateVariant;

enum Command {
    Generate(
        TemplateVariant,
        FormSnapshot,
        oneshot::Sender<Result<GenerateReport>>,
    ),
    Export(
        TemplateVariant,
        FormSnapshot,
        oneshot::Sender<Result<ExportReceipt>>,
    ),
    Summary(FormSnapshot, oneshot::Sender<Result<ExportReceipt>>),
    Close(oneshot::Sender<()>),
}

fn variant_slot(variant: TemplateVariant) -> usize {
    match variant {
        TemplateVariant::Social => 0,
        TemplateVariant::Newsletter => 1,
        TemplateVariant::Flyer => 2,
    }
}

/// Clears the variant's busy flag when the request finishes, even if the
/// caller's future is dropped mid-flight.
struct BusyGuard {
    flags: Arc<[AtomicBool; 3]>,
    slot: usize,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flags[self.slot].store(false, Ordering::Release);
    }
}

/// Handle to a pipeline worker. Cheap to clone; all clones share the worker
/// and the busy flags.
#[derive(Clone)]
pub struct Studio {
    tx: mpsc::Sender<Command>,
    busy: Arc<[AtomicBool; 3]>,
}

impl Studio {
    /// Spawn the worker thread that owns `pipeline`
    pub fn new(pipeline: Pipeline) -> Self {
        let (tx, rx) = mpsc::channel::<Command>();
        thread::Builder::new()
            .name("propkit-studio".to_string())
            .spawn(move || worker_loop(pipeline, rx))
            .ok();
        Self {
            tx,
            busy: Arc::new([AtomicBool::new(false), AtomicBool::new(false), AtomicBool::new(false)]),
        }
    }

    fn claim(&self, variant: TemplateVariant) -> Result<BusyGuard> {
        let slot = variant_slot(variant);
        if self.busy[slot]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::Busy(variant.name()));
        }
        Ok(BusyGuard {
            flags: Arc::clone(&self.busy),
            slot,
        })
    }

    async fn roundtrip<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .map_err(|_| Error::Other("studio worker is gone".to_string()))?;
        reply_rx
            .await
            .map_err(|_| Error::Other("studio worker dropped the reply".to_string()))?
    }

    /// Generate one variant's preview
    pub async fn generate(
        &self,
        variant: TemplateVariant,
        snapshot: FormSnapshot,
    ) -> Result<GenerateReport> {
        let _guard = self.claim(variant)?;
        self.roundtrip(|tx| Command::Generate(variant, snapshot, tx)).await
    }

    /// Generate, capture and deliver one variant
    pub async fn export(
        &self,
        variant: TemplateVariant,
        snapshot: FormSnapshot,
    ) -> Result<ExportReceipt> {
        let _guard = self.claim(variant)?;
        self.roundtrip(|tx| Command::Export(variant, snapshot, tx)).await
    }

    /// Pack and deliver the summary document
    pub async fn summary(&self, snapshot: FormSnapshot) -> Result<ExportReceipt> {
        self.roundtrip(|tx| Command::Summary(snapshot, tx)).await
    }

    /// Export every variant from the same snapshot. Per-variant results, in
    /// `TemplateVariant::ALL` order.
    pub async fn export_all(&self, snapshot: FormSnapshot) -> Vec<Result<ExportReceipt>> {
        let futures = TemplateVariant::ALL
            .iter()
            .map(|&v| self.export(v, snapshot.clone()));
        futures::future::join_all(futures).await
    }

    /// Drain the worker and shut it down
    pub async fn close(self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Close(reply_tx))
            .map_err(|_| Error::Other("studio worker is gone".to_string()))?;
        reply_rx
            .await
            .map_err(|_| Error::Other("studio worker dropped the reply".to_string()))
    }
}

fn worker_loop(mut pipeline: Pipeline, rx: mpsc::Receiver<Command>) {
    while let Ok(command) = rx.recv() {
        match command {
            Command::Generate(variant, snapshot, reply) => {
                let _ = reply.send(pipeline.generate(variant, &snapshot));
            }
            Command::Export(variant, snapshot, reply) => {
                let _ = reply.send(pipeline.export(variant, &snapshot));
            }
            Command::Summary(snapshot, reply) => {
                let _ = reply.send(pipeline.export_summary(&snapshot));
            }
            Command::Close(reply) => {
                let _ = reply.send(());
                break;
            }
        }
    }
    log::debug!("studio worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetLoader;
    use crate::compositor::TemplateSource;
    use crate::export::{CanvasRasterizer, DownloadSink, SummaryPacker};
    use crate::StudioConfig;
    use std::sync::Mutex;
    use std::time::Duration;

    struct SlowTemplates {
        delay: Duration,
        body: &'static str,
    }

    impl TemplateSource for SlowTemplates {
        fn fetch(&self, _: &str) -> Result<String> {
            thread::sleep(self.delay);
            Ok(self.body.to_string())
        }
    }

    struct NoAssets;

    impl AssetLoader for NoAssets {
        fn load(&self, path: &str) -> Result<Vec<u8>> {
            Err(Error::AssetError(path.to_string()))
        }
    }

    struct MemorySink(Mutex<Vec<String>>);

    impl DownloadSink for MemorySink {
        fn deliver(&self, filename: &str, _mime: &str, _bytes: &[u8]) -> Result<()> {
            self.0.lock().unwrap().push(filename.to_string());
            Ok(())
        }
    }

    const TEMPLATE: &str = r#"
      <div id="capture-container" style="display: none; width: 200px; height: 100px">
        <h1>{{headline}}</h1>
      </div>"#;

    fn studio(delay_ms: u64) -> Studio {
        Studio::new(Pipeline::new(
            StudioConfig {
                compose_wait_ms: 50,
                export_wait_ms: 50,
                ..Default::default()
            },
            Box::new(SlowTemplates {
                delay: Duration::from_millis(delay_ms),
                body: TEMPLATE,
            }),
            Box::new(NoAssets),
            Box::new(CanvasRasterizer),
            Box::new(MemorySink(Mutex::new(Vec::new()))),
            Box::new(SummaryPacker),
        ))
    }

    fn snapshot() -> FormSnapshot {
        FormSnapshot {
            headline: "SHOWHOUSE".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn generate_and_summary_round_trip() {
        let studio = studio(0);
        let report = studio
            .generate(TemplateVariant::Social, snapshot())
            .await
            .unwrap();
        assert_eq!(report.phase, crate::sync::Phase::Ready);

        let receipt = studio.summary(snapshot()).await.unwrap();
        assert_eq!(receipt.filename, crate::SUMMARY_FILENAME);
        studio.close().await.unwrap();
    }

    #[tokio::test]
    async fn second_request_for_a_busy_variant_is_rejected() {
        let studio = studio(150);
        let racing = studio.clone();
        let first = tokio::spawn(async move {
            racing.generate(TemplateVariant::Social, snapshot()).await
        });
        tokio::time::sleep(Duration::from_millis(30)).await;

        let second = studio.generate(TemplateVariant::Social, snapshot()).await;
        assert!(matches!(second, Err(Error::Busy("social"))));

        // A different variant is not blocked by the social flag
        let other = studio.generate(TemplateVariant::Newsletter, snapshot()).await;
        assert!(other.is_ok());

        assert!(first.await.unwrap().is_ok());
        // The flag clears once the first request lands
        let again = studio.generate(TemplateVariant::Social, snapshot()).await;
        assert!(again.is_ok());
        studio.close().await.unwrap();
    }

    #[tokio::test]
    async fn export_all_delivers_every_variant() {
        let studio = studio(0);
        let results = studio.export_all(snapshot()).await;
        assert_eq!(results.len(), 3);
        for result in results {
            assert!(result.is_ok());
        }
        studio.close().await.unwrap();
    }
}
