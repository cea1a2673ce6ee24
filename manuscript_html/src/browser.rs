//! Print the assembled document to pdf with a headless Chromium-family browser.
//!
//! Each render gets its own rendering session: a fresh browser process with a
//! throwaway profile directory, loading the document from a scratch file.
//! The session is bounded by the load timeout plus the settle delay, and is killed
//! and its scratch files deleted on every way out of `render_pdf`.

use crate::assemble::assemble_print_document;
use crate::theme::resolve_style;
use manuscript_ast::{ExportError, ExportOptions, Manuscript, PdfRenderer};
use manuscript_common::process::{read_log_tail, spawn_failure, ChildGuard};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use temp_artifact::{ensure_scratch_dir, ScratchPath};
use tracing::{info, warn};
use url::Url;

/// Default time allowed for the document to load
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);
/// Default time allowed for fonts and styles to settle before printing
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);
/// Default viewport, in css pixels
pub const DEFAULT_VIEWPORT: (u32, u32) = (1280, 800);

/// Renders pdfs by printing html from a headless browser
#[derive(Debug, Clone)]
pub struct BrowserRenderer {
    program: PathBuf,
    scratch_dir: PathBuf,
    load_timeout: Duration,
    settle_delay: Duration,
    viewport: (u32, u32),
}

impl BrowserRenderer {
    /// A renderer running the browser at `program`, with scratch files in `scratch_dir`
    pub fn new<P: Into<PathBuf>, D: Into<PathBuf>>(program: P, scratch_dir: D) -> Self {
        BrowserRenderer {
            program: program.into(),
            scratch_dir: scratch_dir.into(),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            viewport: DEFAULT_VIEWPORT,
        }
    }

    /// Set how long the document may take to load
    pub fn load_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.load_timeout = timeout;
        self
    }

    /// Set how long to wait for asynchronous styles and fonts before printing
    pub fn settle_delay(&mut self, delay: Duration) -> &mut Self {
        self.settle_delay = delay;
        self
    }

    /// Set the viewport size in css pixels
    pub fn viewport(&mut self, width: u32, height: u32) -> &mut Self {
        self.viewport = (width, height);
        self
    }

    #[allow(missing_docs)]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn arguments(&self, profile: &Path, output: &Path) -> Vec<String> {
        vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--no-first-run".to_string(),
            "--hide-scrollbars".to_string(),
            "--run-all-compositor-stages-before-draw".to_string(),
            format!("--user-data-dir={}", profile.display()),
            format!("--window-size={},{}", self.viewport.0, self.viewport.1),
            format!("--virtual-time-budget={}", self.settle_delay.as_millis()),
            // page numbers and running heads come from the print stylesheet instead
            "--no-pdf-header-footer".to_string(),
            format!("--print-to-pdf={}", output.display()),
        ]
    }
}

fn file_url(path: &Path) -> Result<Url, ExportError> {
    Url::from_file_path(path).map_err(|()| {
        ExportError::temporary_io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "scratch path is not absolute"),
        )
    })
}

impl PdfRenderer for BrowserRenderer {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn render_pdf(
        &self,
        manuscript: &Manuscript,
        options: &ExportOptions,
    ) -> Result<Vec<u8>, ExportError> {
        let started_at = Instant::now();
        let scratch_dir = ensure_scratch_dir(&self.scratch_dir)
            .map_err(|e| ExportError::temporary_io(&self.scratch_dir, e))?;

        let style = resolve_style(manuscript.theme, manuscript.layout);
        let document = assemble_print_document(manuscript, &style, options);

        let input = ScratchPath::file_in(&scratch_dir, "manuscript", "html")
            .map_err(|e| ExportError::temporary_io(&scratch_dir, e))?;
        input
            .write(&document)
            .map_err(|e| ExportError::temporary_io(input.path(), e))?;
        let profile = ScratchPath::create_dir_in(&scratch_dir, "browser-profile")
            .map_err(|e| ExportError::temporary_io(&scratch_dir, e))?;
        let output = ScratchPath::file_in(&scratch_dir, "manuscript", "pdf")
            .map_err(|e| ExportError::temporary_io(&scratch_dir, e))?;
        let log = ScratchPath::file_in(&scratch_dir, "browser", "log")
            .map_err(|e| ExportError::temporary_io(&scratch_dir, e))?;

        let url = file_url(input.path())?;
        let log_file =
            File::create(log.path()).map_err(|e| ExportError::temporary_io(log.path(), e))?;
        let err_file = log_file
            .try_clone()
            .map_err(|e| ExportError::temporary_io(log.path(), e))?;

        let child = Command::new(&self.program)
            .args(self.arguments(profile.path(), output.path()))
            .arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(err_file))
            .spawn()
            .map_err(|e| {
                warn!(
                    op = "browser::render_pdf",
                    result = "error",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    program = %self.program.display(),
                    error = %e,
                    "failed to start rendering session"
                );
                spawn_failure(&self.program, e)
            })?;
        // declared after the scratch paths so the session is torn down before they are deleted
        let mut session = ChildGuard::new(child, self.program.display().to_string());

        let status = session
            .wait_timeout(self.load_timeout + self.settle_delay)
            .map_err(|e| {
                warn!(
                    op = "browser::render_pdf",
                    result = "error",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    error = %e,
                    "rendering session did not finish"
                );
                e
            })?;

        if !status.success() {
            let detail = read_log_tail(log.path());
            warn!(
                op = "browser::render_pdf",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                exit_code = status.code().unwrap_or(-1),
                "browser exited unsuccessfully"
            );
            return Err(ExportError::external_tool(
                self.program.display().to_string(),
                status.code(),
                detail,
            ));
        }

        let pdf = match fs::read(output.path()) {
            Ok(bytes) if !bytes.is_empty() => bytes,
            // the output path is created empty up front, so nothing printed reads as empty
            Ok(_) => {
                return Err(ExportError::external_tool(
                    self.program.display().to_string(),
                    status.code(),
                    format!("no pdf was printed: {}", read_log_tail(log.path())),
                ))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ExportError::external_tool(
                    self.program.display().to_string(),
                    status.code(),
                    format!("no pdf was printed: {}", read_log_tail(log.path())),
                ))
            }
            Err(e) => return Err(ExportError::temporary_io(output.path(), e)),
        };

        info!(
            op = "browser::render_pdf",
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            pdf_bytes = pdf.len(),
            "printed manuscript from rendering session"
        );
        Ok(pdf)
    }
}
