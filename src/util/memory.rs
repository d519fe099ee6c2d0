//! Host memory pressure probes used by admission control.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of the host's current memory pressure.
///
/// Pressure is `1 - available / total`, in `[0, 1]`.
pub trait MemoryProbe: Send + Sync {
    /// Sample the current memory pressure.
    fn memory_pressure(&self) -> f64;
}

/// Snapshot of host memory in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySnapshot {
    /// Physical memory installed.
    pub total_bytes: u64,
    /// Memory the kernel considers available for new allocations.
    pub available_bytes: u64,
}

impl MemorySnapshot {
    /// Fraction of memory in use, clamped to `[0, 1]`. An empty total reads as no pressure.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pressure(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        let free = self.available_bytes.min(self.total_bytes) as f64;
        1.0 - free / self.total_bytes as f64
    }
}

/// Reads memory figures from the operating system.
///
/// On Linux this parses `/proc/meminfo`. Elsewhere, or when the file cannot be read,
/// the probe reports zero pressure so admission is never blocked by a missing probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMemoryProbe;

impl SystemMemoryProbe {
    /// Take a snapshot of host memory, if the platform exposes one.
    #[must_use]
    pub fn snapshot() -> Option<MemorySnapshot> {
        read_snapshot()
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn memory_pressure(&self) -> f64 {
        match read_snapshot() {
            Some(snapshot) => snapshot.pressure(),
            None => {
                tracing::debug!("memory snapshot unavailable, assuming no pressure");
                0.0
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn read_snapshot() -> Option<MemorySnapshot> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    parse_meminfo(&meminfo)
}

#[cfg(not(target_os = "linux"))]
fn read_snapshot() -> Option<MemorySnapshot> {
    None
}

/// Parse the `MemTotal`/`MemAvailable` lines of a `/proc/meminfo` dump.
///
/// Older kernels lack `MemAvailable`; `MemFree + Buffers + Cached` stands in for it.
#[must_use]
pub fn parse_meminfo(content: &str) -> Option<MemorySnapshot> {
    const KB_TO_BYTES: u64 = 1024;

    let mut total: u64 = 0;
    let mut available: Option<u64> = None;
    let mut free: u64 = 0;
    let mut buffers: u64 = 0;
    let mut cached: u64 = 0;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let value = value.parse::<u64>().unwrap_or(0) * KB_TO_BYTES;
        match key {
            "MemTotal:" => total = value,
            "MemAvailable:" => available = Some(value),
            "MemFree:" => free = value,
            "Buffers:" => buffers = value,
            "Cached:" => cached = value,
            _ => {}
        }
    }

    if total == 0 {
        return None;
    }

    Some(MemorySnapshot {
        total_bytes: total,
        available_bytes: available.unwrap_or(free + buffers + cached),
    })
}

/// Probe reporting a fixed, adjustable pressure. Clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct StaticMemoryProbe {
    bits: Arc<AtomicU64>,
}

impl StaticMemoryProbe {
    /// Create a probe that reports `pressure`.
    #[must_use]
    pub fn new(pressure: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(pressure.to_bits())),
        }
    }

    /// Change the reported pressure.
    pub fn set(&self, pressure: f64) {
        self.bits.store(pressure.to_bits(), Ordering::Release);
    }
}

impl MemoryProbe for StaticMemoryProbe {
    fn memory_pressure(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}
