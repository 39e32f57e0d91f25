//! Process memory counters from procfs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Counter field types from `/proc/[pid]/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CounterField {
    VmRss,
    VmSize,
    VmPeak,
    RssAnon,
}

/// Process-wide memory counters in kilobytes.
///
/// Read from `/proc/self/status`; on platforms without procfs the read
/// fails and callers decide how to degrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCounters {
    /// Resident set size in kilobytes.
    rss_kb: u64,

    /// Virtual memory size in kilobytes.
    vm_size_kb: u64,

    /// Peak virtual memory size in kilobytes.
    vm_peak_kb: u64,

    /// Anonymous resident pages in kilobytes.
    rss_anon_kb: u64,
}

impl MemoryCounters {
    /// Create counters from raw values.
    #[must_use]
    pub const fn new(rss_kb: u64, vm_size_kb: u64, vm_peak_kb: u64, rss_anon_kb: u64) -> Self {
        Self {
            rss_kb,
            vm_size_kb,
            vm_peak_kb,
            rss_anon_kb,
        }
    }

    /// Resident set size in kilobytes.
    #[must_use]
    pub const fn rss_kb(&self) -> u64 {
        self.rss_kb
    }

    /// Resident set size in megabytes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // display-precision only
    pub const fn rss_mb(&self) -> f64 {
        self.rss_kb as f64 / 1024.0
    }

    /// Virtual memory size in kilobytes.
    #[must_use]
    pub const fn vm_size_kb(&self) -> u64 {
        self.vm_size_kb
    }

    /// Peak virtual memory size in kilobytes.
    #[must_use]
    pub const fn vm_peak_kb(&self) -> u64 {
        self.vm_peak_kb
    }

    /// Anonymous resident pages in kilobytes.
    #[must_use]
    pub const fn rss_anon_kb(&self) -> u64 {
        self.rss_anon_kb
    }

    /// Read the current process's counters.
    ///
    /// # Errors
    ///
    /// Returns an error if `/proc/self/status` cannot be read or a
    /// required field is missing or malformed.
    pub fn read_self() -> Result<Self> {
        Self::read_from_path(Path::new("/proc/self/status"))
    }

    /// Read counters for another process.
    ///
    /// # Errors
    ///
    /// Returns an error if `/proc/[pid]/status` cannot be read or a
    /// required field is missing or malformed.
    pub fn read_from_proc(pid: u32) -> Result<Self> {
        Self::read_from_path(Path::new(&format!("/proc/{pid}/status")))
    }

    fn read_from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::StatusRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_status_text(&text)
    }

    /// Parse counters out of status-file text.
    ///
    /// `RssAnon` is optional (older kernels omit it); the other three
    /// fields are required.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing or a recognized
    /// line fails to parse.
    pub fn from_status_text(text: &str) -> Result<Self> {
        let mut rss_kb = None;
        let mut vm_size_kb = None;
        let mut vm_peak_kb = None;
        let mut rss_anon_kb = None;

        for line in text.lines() {
            if let Some((field, value)) = Self::parse_status_line(line)? {
                match field {
                    CounterField::VmRss => rss_kb = Some(value),
                    CounterField::VmSize => vm_size_kb = Some(value),
                    CounterField::VmPeak => vm_peak_kb = Some(value),
                    CounterField::RssAnon => rss_anon_kb = Some(value),
                }
            }
        }

        let rss_kb = rss_kb.ok_or(Error::MissingField { field: "VmRSS" })?;
        let vm_size_kb = vm_size_kb.ok_or(Error::MissingField { field: "VmSize" })?;
        let vm_peak_kb = vm_peak_kb.ok_or(Error::MissingField { field: "VmPeak" })?;
        let rss_anon_kb = rss_anon_kb.unwrap_or(0);

        Ok(Self::new(rss_kb, vm_size_kb, vm_peak_kb, rss_anon_kb))
    }

    /// Parse a single status line into a field and value.
    /// Format: "`FieldName`:    12345 kB"
    ///
    /// Returns `None` for lines that are not recognized counter fields.
    fn parse_status_line(line: &str) -> Result<Option<(CounterField, u64)>> {
        let Some(field) = (if line.starts_with("VmRSS:") {
            Some(CounterField::VmRss)
        } else if line.starts_with("VmSize:") {
            Some(CounterField::VmSize)
        } else if line.starts_with("VmPeak:") {
            Some(CounterField::VmPeak)
        } else if line.starts_with("RssAnon:") {
            Some(CounterField::RssAnon)
        } else {
            None
        }) else {
            return Ok(None);
        };

        let value = line
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| Error::MalformedLine {
                line: line.to_string(),
            })?
            .parse::<u64>()
            .map_err(|_| Error::MalformedLine {
                line: line.to_string(),
            })?;

        Ok(Some((field, value)))
    }
}
