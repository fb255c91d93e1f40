//! Post-encode size optimization.
//!
//! [`GifOptimizer`] rewrites an existing GIF in place. [`Gifsicle`] shells out
//! to the `gifsicle` tool, writes its result to a temporary file beside the
//! original, and swaps it in only when the tool succeeded and the output is
//! actually smaller. On any failure the original GIF is left untouched.

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::error::GifMakerError;

/// Sizes before and after an optimization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeOutcome {
    pub original_bytes: u64,
    pub optimized_bytes: u64,
    /// `false` when the optimized output was not smaller and was discarded.
    pub replaced: bool,
}

impl OptimizeOutcome {
    /// Bytes saved by the pass (zero when the original was kept).
    pub fn saved_bytes(&self) -> u64 {
        if self.replaced {
            self.original_bytes.saturating_sub(self.optimized_bytes)
        } else {
            0
        }
    }
}

/// A capability that shrinks a GIF file in place.
pub trait GifOptimizer {
    /// Optimize the GIF at `path`.
    ///
    /// Implementations must leave the file at `path` valid when they fail.
    fn optimize(&self, path: &Path) -> Result<OptimizeOutcome, GifMakerError>;
}

/// Optimizer backed by the `gifsicle` command-line tool.
#[derive(Debug, Clone)]
pub struct Gifsicle {
    program: PathBuf,
    arguments: Vec<OsString>,
}

impl Default for Gifsicle {
    fn default() -> Self {
        Self {
            program: PathBuf::from("gifsicle"),
            arguments: vec!["-O3".into()],
        }
    }
}

impl Gifsicle {
    /// Use `gifsicle` from `PATH` with `-O3`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `gifsicle` binary.
    #[must_use]
    pub fn with_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.program = program.into();
        self
    }

    /// Replace the optimization flags passed before the input file.
    #[must_use]
    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }
}

impl GifOptimizer for Gifsicle {
    fn optimize(&self, path: &Path) -> Result<OptimizeOutcome, GifMakerError> {
        let original_bytes = fs::metadata(path)?.len();
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let output = tempfile::Builder::new()
            .prefix(".gifmaker-")
            .suffix(".opt.gif")
            .tempfile_in(directory)?;

        log::debug!(
            "Running {} {:?} on {}",
            self.program.display(),
            self.arguments,
            path.display(),
        );

        let result = Command::new(&self.program)
            .args(&self.arguments)
            .arg(path)
            .arg("-o")
            .arg(output.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                GifMakerError::OptimizeError(format!(
                    "Failed to run {}: {e}",
                    self.program.display()
                ))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(GifMakerError::OptimizeError(format!(
                "{} exited with {}: {}",
                self.program.display(),
                result.status,
                stderr.trim(),
            )));
        }

        let optimized_bytes = fs::metadata(output.path())?.len();
        if optimized_bytes == 0 || optimized_bytes >= original_bytes {
            log::debug!(
                "Keeping original {} ({original_bytes} bytes, optimized {optimized_bytes})",
                path.display(),
            );
            return Ok(OptimizeOutcome {
                original_bytes,
                optimized_bytes,
                replaced: false,
            });
        }

        fs::set_permissions(output.path(), fs::metadata(path)?.permissions())?;
        output
            .persist(path)
            .map_err(|e| GifMakerError::OptimizeError(e.error.to_string()))?;

        Ok(OptimizeOutcome {
            original_bytes,
            optimized_bytes,
            replaced: true,
        })
    }
}
