use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use image::RgbaImage;

use super::SheetKind;

/// Fetches raw encoded image bytes. Runs on the fetch worker thread.
pub trait ImageSource: Send + 'static {
    fn fetch(&self, location: &str) -> Result<Vec<u8>>;
}

/// Reads images from files under a root directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageSource for FileSource {
    fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        let path = self.root.join(location);
        std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))
    }
}

/// An image to fetch and the atlas region it replaces.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureRequest {
    pub sheet: SheetKind,
    pub region: String,
    pub location: String,
}

/// A decoded image ready to be written into its region.
#[derive(Debug, Clone)]
pub struct FetchedTexture {
    pub sheet: SheetKind,
    pub region: String,
    pub image: RgbaImage,
}

/// Background worker that fetches and decodes textures off the frame thread.
///
/// Results are only observed through [`TextureFetcher::drain`], which the
/// scene calls at the start of a frame. A failed fetch is logged on the worker
/// and the region keeps whatever it showed before.
pub struct TextureFetcher {
    jobs: Option<Sender<TextureRequest>>,
    results: Receiver<(TextureRequest, Option<RgbaImage>)>,
    worker: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl TextureFetcher {
    pub fn spawn(source: impl ImageSource) -> Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<TextureRequest>();
        let (result_tx, result_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("texture-fetch".to_string())
            .spawn(move || {
                for request in job_rx {
                    let image = match decode(&source, &request.location) {
                        Ok(image) => Some(image),
                        Err(e) => {
                            log::warn!("texture fetch for {} failed: {e:#}", request.region);
                            None
                        }
                    };
                    if result_tx.send((request, image)).is_err() {
                        break;
                    }
                }
            })
            .context("failed to spawn texture fetch worker")?;

        Ok(Self {
            jobs: Some(job_tx),
            results: result_rx,
            worker: Some(worker),
            in_flight: 0,
        })
    }

    pub fn request(&mut self, request: TextureRequest) {
        let Some(jobs) = &self.jobs else {
            return;
        };
        log::debug!("fetching {} for {}", request.location, request.region);
        if jobs.send(request).is_ok() {
            self.in_flight += 1;
        } else {
            log::warn!("texture fetch worker is gone; request dropped");
        }
    }

    /// Requests sent but not yet drained.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Collects every finished fetch without blocking.
    pub fn drain(&mut self) -> Vec<FetchedTexture> {
        let mut done = Vec::new();
        while let Ok((request, image)) = self.results.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            if let Some(image) = image {
                done.push(FetchedTexture {
                    sheet: request.sheet,
                    region: request.region,
                    image,
                });
            }
        }
        done
    }
}

impl Drop for TextureFetcher {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop.
        self.jobs = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("texture fetch worker panicked");
            }
        }
    }
}

fn decode(source: &impl ImageSource, location: &str) -> Result<RgbaImage> {
    let bytes = source.fetch(location)?;
    let image = image::load_from_memory(&bytes)
        .with_context(|| format!("failed to decode {location}"))?;
    Ok(image.to_rgba8())
}
