//! Fault telemetry: catalog processor panics by text without stopping
//! the scheduler.
//!
//! Each worker thread runs its cycle body through [`FaultSink::run_guarded`].
//! A panic is caught, its text recorded with a running count and last-seen
//! time, and the store is kept bounded: rarest texts trimmed past a top-N
//! cap, stale texts evicted by age. The store is periodically persisted to a
//! per-thread file (best effort, write-to-temp then rename) and restored
//! when the path is attached.

use std::any::Any;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::config::FaultLogConfig;
use crate::ranked_map::RankedMap;
use crate::timing::IntervalTimer;

/// One cataloged fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultRecord {
    pub text: String,
    pub count: u64,
    /// Unix milliseconds of the last occurrence.
    pub last_seen_ms: i64,
}

/// Bounded catalog of fault texts with counts and last-seen times.
#[derive(Debug)]
pub struct FaultLog {
    path: Option<PathBuf>,
    counts: RankedMap<String, u64>,
    last_seen: RankedMap<String, i64>,
    dump_gate: IntervalTimer,
    top_size: usize,
    keep_ms: i64,
}

fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

impl FaultLog {
    pub fn new(config: &FaultLogConfig) -> Self {
        Self {
            path: None,
            counts: RankedMap::new(),
            last_seen: RankedMap::new(),
            dump_gate: IntervalTimer::new(config.dump_interval),
            top_size: config.top_size,
            keep_ms: config.keep_for.as_millis() as i64,
        }
    }

    /// Attach a persistence path, creating the file if missing and
    /// restoring whatever a previous run left there.
    pub fn attach(&mut self, path: PathBuf) {
        if let Err(err) = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            warn!(path = %path.display(), %err, "cannot open fault log, persistence disabled");
            return;
        }
        self.path = Some(path);
        self.restore();
    }

    /// Catalog one fault occurrence.
    pub fn record(&mut self, text: String) {
        let now = unix_millis();
        let count = self.counts.get(&text).copied().unwrap_or(0) + 1;
        self.counts.update(text.clone(), count);
        self.last_seen.update(text, now);
        self.remove_old(now);
        self.trim();
        self.dump();
    }

    pub fn count_of(&self, text: &str) -> Option<u64> {
        self.counts.get(&text.to_string()).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// All records, most frequent first.
    pub fn snapshot(&self) -> Vec<FaultRecord> {
        let mut records: Vec<FaultRecord> = self
            .counts
            .iter()
            .map(|(text, count)| FaultRecord {
                text: text.clone(),
                count: *count,
                last_seen_ms: self.last_seen.get(text).copied().unwrap_or(0),
            })
            .collect();
        records.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.text.cmp(&b.text)));
        records
    }

    fn remove_old(&mut self, now_ms: i64) {
        while let Some((text, seen)) = self.last_seen.lowest() {
            if seen > now_ms - self.keep_ms {
                return;
            }
            let text = text.clone();
            self.counts.remove(&text);
            self.last_seen.remove(&text);
        }
    }

    fn trim(&mut self) {
        while self.counts.len() > self.top_size {
            let Some((text, _)) = self.counts.lowest() else {
                return;
            };
            let text = text.clone();
            self.counts.remove(&text);
            self.last_seen.remove(&text);
        }
    }

    fn dump(&mut self) {
        if !self.dump_gate.is_due() {
            return;
        }
        let Some(path) = self.path.clone() else {
            return;
        };
        self.dump_gate.reset();
        if let Err(err) = self.write_dump(&path) {
            warn!(path = %path.display(), %err, "fault log dump failed");
        }
    }

    fn write_dump(&self, path: &Path) -> io::Result<()> {
        let tmp = path.with_extension("tmp");
        {
            let mut out = BufWriter::new(fs::File::create(&tmp)?);
            for (text, count) in self.counts.iter() {
                let last = self.last_seen.get(text).copied().unwrap_or(0);
                writeln!(out, "{count}\t{last}\t{}", escape(text))?;
            }
            out.flush()?;
        }
        fs::rename(&tmp, path)
    }

    fn restore(&mut self) {
        let Some(path) = &self.path else {
            return;
        };
        let Ok(contents) = fs::read_to_string(path) else {
            return;
        };
        for line in contents.lines() {
            let mut parts = line.splitn(3, '\t');
            let (Some(count), Some(last), Some(text)) = (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            let (Ok(count), Ok(last)) = (count.parse::<u64>(), last.parse::<i64>()) else {
                continue;
            };
            let text = unescape(text);
            self.counts.update(text.clone(), count);
            self.last_seen.update(text, last);
        }
    }
}

/// Extract a readable text from a panic payload.
pub fn panic_text(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else {
        "unstructured panic payload".to_string()
    }
}

/// Shared handle to one thread's [`FaultLog`].
#[derive(Debug, Clone)]
pub struct FaultSink {
    inner: Arc<Mutex<FaultLog>>,
}

impl FaultSink {
    pub fn new(log: FaultLog) -> Self {
        Self {
            inner: Arc::new(Mutex::new(log)),
        }
    }

    /// Run `f`, catching a panic. Returns `Some` with `f`'s result on the
    /// normal path, `None` when a panic was caught and cataloged.
    pub fn run_guarded<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => Some(value),
            Err(payload) => {
                let text = panic_text(payload.as_ref());
                warn!(fault = %text, "processor fault contained");
                self.lock().record(text);
                None
            }
        }
    }

    pub fn record(&self, text: String) {
        self.lock().record(text);
    }

    pub fn count_of(&self, text: &str) -> Option<u64> {
        self.lock().count_of(text)
    }

    pub fn snapshot(&self) -> Vec<FaultRecord> {
        self.lock().snapshot()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FaultLog> {
        // Recording never panics while holding the lock, but recover anyway.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
