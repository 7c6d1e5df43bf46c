//! Persistence strategies for finished recordings.
//!
//! The recorder and player are parameterized by a [`PoseStore`] instead of
//! being specialized per backend. Two stores ship with the crate: an in-memory
//! asset slot and a CSV file. Large CSV files can also be read off the tick
//! thread with [`BackgroundCsvLoader`].

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::JoinHandle;

use crate::csv::CsvPoseCodec;
use crate::error::PoseError;
use crate::events::{EventQueue, LoadEvent};
use crate::stream::{PoseStream, DEFAULT_FRAME_RATE};

/// Save/load backend for whole recordings.
pub trait PoseStore {
    fn save(&mut self, stream: &PoseStream) -> Result<(), PoseError>;
    fn load(&mut self) -> Result<PoseStream, PoseError>;
}

/// Keeps the last saved recording in memory (the "asset" backend).
#[derive(Debug, Default)]
pub struct MemoryStore {
    stored: Option<PoseStream>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Option<&PoseStream> {
        self.stored.as_ref()
    }

    pub fn take(&mut self) -> Option<PoseStream> {
        self.stored.take()
    }
}

impl PoseStore for MemoryStore {
    fn save(&mut self, stream: &PoseStream) -> Result<(), PoseError> {
        self.stored = Some(stream.clone());
        Ok(())
    }

    fn load(&mut self) -> Result<PoseStream, PoseError> {
        self.stored
            .clone()
            .ok_or_else(|| PoseError::invalid_argument("memory store is empty"))
    }
}

/// One recording per CSV file, one frame per line.
#[derive(Debug, Clone)]
pub struct CsvFileStore {
    path: PathBuf,
    codec: CsvPoseCodec,
    /// Rate stamped on loaded streams (the file carries no metadata).
    pub frame_rate: f32,
    /// Lines skipped by the last `load`.
    pub last_skipped_lines: usize,
}

impl CsvFileStore {
    pub fn new(path: impl Into<PathBuf>, codec: CsvPoseCodec) -> Self {
        Self {
            path: path.into(),
            codec,
            frame_rate: DEFAULT_FRAME_RATE,
            last_skipped_lines: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PoseStore for CsvFileStore {
    fn save(&mut self, stream: &PoseStream) -> Result<(), PoseError> {
        let file = File::create(&self.path)?;
        write_csv(stream, &self.codec, BufWriter::new(file))?;
        log::info!(
            "saved {} frames to {}",
            stream.len(),
            self.path.display()
        );
        Ok(())
    }

    fn load(&mut self) -> Result<PoseStream, PoseError> {
        let file = File::open(&self.path)?;
        let loaded = read_csv(BufReader::new(file), &self.codec, self.frame_rate, |_| {})?;
        self.last_skipped_lines = loaded.skipped_lines;
        Ok(loaded.stream)
    }
}

/// Result of reading a CSV recording.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvLoad {
    pub stream: PoseStream,
    pub skipped_lines: usize,
}

/// Write every frame as one `\n`-terminated line.
pub fn write_csv<W: Write>(
    stream: &PoseStream,
    codec: &CsvPoseCodec,
    mut writer: W,
) -> Result<(), PoseError> {
    let mut line = String::new();
    for frame in stream.frames() {
        line.clear();
        codec.encode_into(frame, &mut line)?;
        line.push('\n');
        writer.write_all(line.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a CSV recording.
///
/// Lines that fail to decode, or that do not fit the stream (bone count
/// drift), are logged and skipped. I/O errors abort the whole load.
/// `on_bytes` receives the running count of consumed bytes.
pub fn read_csv<R: BufRead>(
    mut reader: R,
    codec: &CsvPoseCodec,
    frame_rate: f32,
    mut on_bytes: impl FnMut(u64),
) -> Result<CsvLoad, PoseError> {
    let mut stream = PoseStream::with_frame_rate(frame_rate);
    let mut skipped_lines = 0;
    let mut consumed: u64 = 0;
    let mut line = String::new();
    let mut line_no = 0usize;
    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            break;
        }
        line_no += 1;
        consumed += read as u64;
        on_bytes(consumed);

        if line.trim().is_empty() {
            continue;
        }
        let decoded = codec
            .decode(&line)
            .and_then(|frame| stream.add_frame(frame));
        if let Err(err) = decoded {
            log::warn!("skipping line {line_no}: {err}");
            skipped_lines += 1;
        }
    }
    stream.drain_events().for_each(drop);
    Ok(CsvLoad {
        stream,
        skipped_lines,
    })
}

/// Where a background load currently stands.
#[derive(Debug)]
pub enum LoadStatus {
    Idle,
    Loading { progress: f32 },
    Completed(CsvLoad),
    Failed(PoseError),
}

enum WorkerMsg {
    Progress(f32),
    Done(Result<CsvLoad, PoseError>),
}

struct Worker {
    rx: Receiver<WorkerMsg>,
    handle: Option<JoinHandle<()>>,
    progress: f32,
}

/// Reads a CSV recording on a worker thread so the tick loop never blocks on I/O.
///
/// At most one load runs at a time. `poll` is meant to be called once per tick.
#[derive(Default)]
pub struct BackgroundCsvLoader {
    worker: Option<Worker>,
    events: EventQueue<LoadEvent>,
}

impl std::fmt::Debug for BackgroundCsvLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundCsvLoader")
            .field("in_flight", &self.is_loading())
            .finish()
    }
}

/// Progress messages are throttled to one per this many lines.
const PROGRESS_EVERY_LINES: usize = 64;

impl BackgroundCsvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.worker.is_some()
    }

    /// Start reading `path`. Fails with [`PoseError::LoadInProgress`] while a
    /// previous load has not been collected by `poll`.
    pub fn start(
        &mut self,
        path: impl Into<PathBuf>,
        codec: CsvPoseCodec,
        frame_rate: f32,
    ) -> Result<(), PoseError> {
        if self.worker.is_some() {
            return Err(PoseError::LoadInProgress);
        }
        let path = path.into();
        let (tx, rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("pose-csv-load".into())
            .spawn(move || {
                let result = load_with_progress(&path, &codec, frame_rate, |p| {
                    // Receiver gone means the loader was dropped; nothing to report to.
                    let _ = tx.send(WorkerMsg::Progress(p));
                });
                let _ = tx.send(WorkerMsg::Done(result));
            })?;
        self.worker = Some(Worker {
            rx,
            handle: Some(handle),
            progress: 0.0,
        });
        Ok(())
    }

    /// Collect worker messages without blocking.
    pub fn poll(&mut self) -> LoadStatus {
        let Some(worker) = self.worker.as_mut() else {
            return LoadStatus::Idle;
        };
        let mut finished = None;
        loop {
            match worker.rx.try_recv() {
                Ok(WorkerMsg::Progress(p)) => {
                    worker.progress = p;
                    self.events.push(LoadEvent::Progress { progress: p });
                }
                Ok(WorkerMsg::Done(result)) => {
                    finished = Some(result);
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    finished = Some(Err(PoseError::Io {
                        reason: "load worker exited without a result".into(),
                    }));
                    break;
                }
            }
        }
        let Some(result) = finished else {
            return LoadStatus::Loading {
                progress: worker.progress,
            };
        };
        if let Some(handle) = worker.handle.take() {
            let _ = handle.join();
        }
        self.worker = None;
        match result {
            Ok(load) => {
                self.events.push(LoadEvent::Completed {
                    frames: load.stream.len(),
                    skipped_lines: load.skipped_lines,
                });
                LoadStatus::Completed(load)
            }
            Err(err) => {
                self.events.push(LoadEvent::Failed {
                    reason: err.to_string(),
                });
                LoadStatus::Failed(err)
            }
        }
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, LoadEvent> {
        self.events.drain()
    }
}

fn load_with_progress(
    path: &Path,
    codec: &CsvPoseCodec,
    frame_rate: f32,
    mut progress: impl FnMut(f32),
) -> Result<CsvLoad, PoseError> {
    let file = File::open(path)?;
    let total = file.metadata()?.len().max(1);
    let mut lines = 0usize;
    let load = read_csv(BufReader::new(file), codec, frame_rate, |bytes| {
        lines += 1;
        if lines % PROGRESS_EVERY_LINES == 0 {
            progress((bytes as f64 / total as f64).min(1.0) as f32);
        }
    })?;
    progress(1.0);
    Ok(load)
}
