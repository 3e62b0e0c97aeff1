//! Crash reports for unexpected errors and panics.
//!
//! A report collects the application version, the controller in use, the
//! platform and the full chain of error sources, so a failure can be
//! reported instead of silently taking the process down.

use crate::{BUILD_DATE, VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use tracing::error;

/// One level of an error source chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub message: String,
    /// Source location, for panics
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashReport {
    pub app_version: String,
    pub build_date: String,
    pub controller: Option<String>,
    pub os: String,
    pub arch: String,
    pub thread: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Outermost error first, then each source in turn
    pub errors: Vec<ErrorEntry>,
    /// Whether the application may keep running after this failure
    pub can_continue: bool,
}

impl CrashReport {
    fn blank(can_continue: bool) -> Self {
        Self {
            app_version: VERSION.to_string(),
            build_date: BUILD_DATE.to_string(),
            controller: None,
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            thread: std::thread::current().name().map(str::to_string),
            timestamp: Utc::now(),
            errors: Vec::new(),
            can_continue,
        }
    }

    /// Report for a recoverable error, walking its source chain
    pub fn new(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut report = Self::blank(true);
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
        while let Some(e) = current {
            report.errors.push(ErrorEntry {
                message: e.to_string(),
                location: None,
            });
            current = e.source();
        }
        report
    }

    /// Report for an `anyhow` error, including every attached context
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let mut report = Self::blank(true);
        report.errors = err
            .chain()
            .map(|e| ErrorEntry {
                message: e.to_string(),
                location: None,
            })
            .collect();
        report
    }

    /// Report for a panic
    pub fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let payload = info.payload();
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };

        let mut report = Self::blank(false);
        report.errors.push(ErrorEntry {
            message,
            location: info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column())),
        });
        report
    }

    pub fn with_controller(mut self, description: impl Into<String>) -> Self {
        self.controller = Some(description.into());
        self
    }

    /// Write the report as JSON into `dir`, returning the file path
    pub fn save_to_dir(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        use anyhow::Context;

        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating crash report directory {}", dir.display()))?;
        let path = dir.join(format!(
            "crash-{}.json",
            self.timestamp.format("%Y%m%d-%H%M%S%.3f")
        ));
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)
            .with_context(|| format!("writing crash report {}", path.display()))?;
        Ok(path)
    }
}

impl fmt::Display for CrashReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GrblPreview v{} ({})", self.app_version, self.build_date)?;
        if let Some(controller) = &self.controller {
            writeln!(f, "{}", controller)?;
        }
        writeln!(f, "{} ({})", self.os, self.arch)?;
        writeln!(f, "{}", self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(
            f,
            "Thread        [{}]",
            self.thread.as_deref().unwrap_or("<unnamed>")
        )?;
        writeln!(f)?;

        for (depth, entry) in self.errors.iter().enumerate() {
            if depth > 0 {
                writeln!(f, "Inner exception data")?;
            }
            writeln!(f, "Error message [{}]", entry.message)?;
            if let Some(location) = &entry.location {
                writeln!(f, "Location      [{}]", location)?;
            }
        }
        Ok(())
    }
}

/// Log a crash report for every panic, then run the previous hook
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let report = CrashReport::from_panic(info);
        error!(component = "Crash Report", "Unhandled panic\n{}", report);
        previous(info);
    }));
}
