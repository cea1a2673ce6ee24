use crate::header::header_commands;
use crate::transform::{annotated_text, MetadataHeader};
use manuscript_ast::{ExportError, ExportOptions, Manuscript, PdfRenderer};
use manuscript_common::process::spawn_failure;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;
use temp_artifact::{ensure_scratch_dir, ScratchPath};
use tracing::{info, warn};

/// The typesetter used unless another is configured
pub const DEFAULT_TYPESETTER: &str = "pandoc";

/// Renders pdfs by running annotated markdown through an external typesetter
/// which drives a LaTeX engine
#[derive(Debug, Clone)]
pub struct TypesetRenderer {
	program: PathBuf,
	scratch_dir: PathBuf,
	use_header_file: bool
}

impl TypesetRenderer {
	/// A renderer running `program`, with scratch files in `scratch_dir`
	pub fn new<P: Into<PathBuf>, D: Into<PathBuf>>(program: P, scratch_dir: D) -> Self {
		TypesetRenderer {
			program: program.into(),
			scratch_dir: scratch_dir.into(),
			use_header_file: true
		}
	}

	/// Whether to pass preamble commands as a separate header file
	/// rather than embedding them in the document metadata
	pub fn use_header_file(&mut self, use_header_file: bool) -> &mut Self {
		self.use_header_file = use_header_file;
		self
	}

	#[allow(missing_docs)]
	pub fn program(&self) -> &Path {
		&self.program
	}

	fn tool(&self) -> String {
		self.program.display().to_string()
	}
}

impl PdfRenderer for TypesetRenderer {
	fn name(&self) -> &'static str {
		"typeset"
	}

	fn render_pdf(&self, manuscript: &Manuscript, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
		let started_at = Instant::now();
		let scratch_dir = ensure_scratch_dir(&self.scratch_dir)
			.map_err(|e| ExportError::temporary_io(&self.scratch_dir, e))?;

		let commands = header_commands(manuscript, options);
		let mut metadata = MetadataHeader::new(manuscript, options);
		let header = if self.use_header_file {
			let header = ScratchPath::file_in(&scratch_dir, "header", "tex")
				.map_err(|e| ExportError::temporary_io(&scratch_dir, e))?;
			header.write(&commands)
				.map_err(|e| ExportError::temporary_io(header.path(), e))?;
			Some(header)
		} else {
			metadata.header_includes(commands);
			None
		};

		let input = ScratchPath::file_in(&scratch_dir, "manuscript", "md")
			.map_err(|e| ExportError::temporary_io(&scratch_dir, e))?;
		input.write(annotated_text(&metadata, manuscript))
			.map_err(|e| ExportError::temporary_io(input.path(), e))?;
		let output = ScratchPath::file_in(&scratch_dir, "manuscript", "pdf")
			.map_err(|e| ExportError::temporary_io(&scratch_dir, e))?;

		let mut command = Command::new(&self.program);
		command.arg(input.path())
			.arg("--from=markdown")
			.arg(format!("--output={}", output.path().display()))
			.arg(format!("--pdf-engine={}", options.engine));
		if let Some(ref header) = header {
			command.arg(format!("--include-in-header={}", header.path().display()));
		}

		let result = command
			.current_dir(&scratch_dir)
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::piped())
			.output()
			.map_err(|e| {
				warn!(
					op = "typeset::render_pdf",
					result = "error",
					elapsed_ms = started_at.elapsed().as_millis() as u64,
					program = %self.program.display(),
					error = %e,
					"failed to start typesetter"
				);
				spawn_failure(&self.program, e)
			})?;

		if !result.status.success() {
			let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
			warn!(
				op = "typeset::render_pdf",
				result = "error",
				elapsed_ms = started_at.elapsed().as_millis() as u64,
				exit_code = result.status.code().unwrap_or(-1),
				engine = %options.engine,
				stderr = %stderr,
				"typesetter exited unsuccessfully"
			);
			let detail = if stderr.is_empty() {
				"no output was logged".to_string()
			} else {
				stderr
			};
			return Err(ExportError::external_tool(self.tool(), result.status.code(), detail));
		}

		let pdf = match fs::read(output.path()) {
			Ok(bytes) if !bytes.is_empty() => bytes,
			Ok(_) => return Err(ExportError::external_tool(self.tool(), result.status.code(), "exited successfully but produced no pdf")),
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				return Err(ExportError::external_tool(self.tool(), result.status.code(), "exited successfully but produced no pdf"))
			},
			Err(e) => return Err(ExportError::temporary_io(output.path(), e))
		};

		info!(
			op = "typeset::render_pdf",
			result = "ok",
			elapsed_ms = started_at.elapsed().as_millis() as u64,
			engine = %options.engine,
			pdf_bytes = pdf.len(),
			"typeset manuscript"
		);
		Ok(pdf)
	}
}

#[cfg(all(test, unix))]
mod tests {
	use super::*;
	use manuscript_ast::{ManuscriptBody, TypesetEngine};
	use std::os::unix::fs::PermissionsExt;
	use tempfile::TempDir;

	fn make_executable(path: &Path) {
		let mut perms = fs::metadata(path).expect("metadata").permissions();
		perms.set_mode(0o755);
		fs::set_permissions(path, perms).expect("set perms");
	}

	/// A stand-in typesetter recording its arguments and input,
	/// which refuses to run pdflatex
	fn fake_typesetter(dir: &Path) -> PathBuf {
		let script_path = dir.join("fake-pandoc");
		let script = format!(
			r#"#!/bin/sh
set -eu
echo "$@" > "{args}"
cp "$1" "{input}"
for arg in "$@"; do
  case "$arg" in
    --output=*) out="${{arg#--output=}}" ;;
    --pdf-engine=*) engine="${{arg#--pdf-engine=}}" ;;
    --include-in-header=*) cp "${{arg#--include-in-header=}}" "{header}" ;;
  esac
done
if [ "$engine" = "pdflatex" ]; then
  echo "Error producing PDF." >&2
  exit 43
fi
printf '%%PDF-1.5 typeset' > "$out"
"#,
			args = dir.join("args.log").display(),
			input = dir.join("input.md").display(),
			header = dir.join("header.tex").display()
		);
		fs::write(&script_path, script).expect("write script");
		make_executable(&script_path);
		script_path
	}

	fn manuscript() -> Manuscript {
		let mut m = Manuscript::new("m1");
		m.title = "Typeset Test".into();
		m.body = ManuscriptBody::Continuous("# One\n\nOnce.\n\n# Two\n\nTwice.".into());
		m
	}

	fn scratch_is_empty(dir: &Path) -> bool {
		fs::read_dir(dir).map(|mut d| d.next().is_none()).unwrap_or(true)
	}

	#[test]
	fn typesets_and_cleans_up() {
		let dir = TempDir::new().expect("temp dir");
		let scratch = dir.path().join("scratch");
		let renderer = TypesetRenderer::new(fake_typesetter(dir.path()), &scratch);

		let pdf = renderer.render_pdf(&manuscript(), &ExportOptions::default()).expect("pdf");
		assert_eq!(pdf, b"%PDF-1.5 typeset".to_vec());

		let args = fs::read_to_string(dir.path().join("args.log")).expect("read args");
		assert!(args.contains("--pdf-engine=xelatex"), "{}", args);
		assert!(args.contains("--include-in-header="), "{}", args);
		let input = fs::read_to_string(dir.path().join("input.md")).expect("read input");
		assert!(input.contains("\\lettrine{O}{nc}e."));
		assert!(input.contains("\\newpage\n\n# Two"));
		assert!(!input.contains("header-includes"));
		let header = fs::read_to_string(dir.path().join("header.tex")).expect("read header");
		assert!(header.contains("\\usepackage{lettrine}"));
		assert!(scratch_is_empty(&scratch));
	}

	#[test]
	fn embeds_header_without_header_file() {
		let dir = TempDir::new().expect("temp dir");
		let scratch = dir.path().join("scratch");
		let mut renderer = TypesetRenderer::new(fake_typesetter(dir.path()), &scratch);
		renderer.use_header_file(false);

		renderer.render_pdf(&manuscript(), &ExportOptions::default()).expect("pdf");
		let args = fs::read_to_string(dir.path().join("args.log")).expect("read args");
		assert!(!args.contains("--include-in-header"), "{}", args);
		let input = fs::read_to_string(dir.path().join("input.md")).expect("read input");
		assert!(input.contains("header-includes: |"));
		assert!(scratch_is_empty(&scratch));
	}

	#[test]
	fn surfaces_typesetter_errors_and_cleans_up() {
		let dir = TempDir::new().expect("temp dir");
		let scratch = dir.path().join("scratch");
		let renderer = TypesetRenderer::new(fake_typesetter(dir.path()), &scratch);
		let options = ExportOptions {
			engine: TypesetEngine::Pdflatex,
			..ExportOptions::default()
		};

		let err = renderer.render_pdf(&manuscript(), &options).expect_err("expected failure");
		match err {
			ExportError::ExternalToolFailure { exit_code, detail, .. } => {
				assert_eq!(exit_code, Some(43));
				assert!(detail.contains("Error producing PDF."), "{}", detail);
			},
			other => panic!("unexpected error variant: {:?}", other)
		}
		assert!(scratch_is_empty(&scratch));
	}

	#[test]
	fn missing_typesetter_is_a_failure() {
		let dir = TempDir::new().expect("temp dir");
		let scratch = dir.path().join("scratch");
		let renderer = TypesetRenderer::new(dir.path().join("no-such-pandoc"), &scratch);

		let err = renderer.render_pdf(&manuscript(), &ExportOptions::default()).expect_err("expected failure");
		match err {
			ExportError::ExternalToolFailure { exit_code, detail, .. } => {
				assert_eq!(exit_code, None);
				assert!(detail.contains("is it installed"), "{}", detail);
			},
			other => panic!("unexpected error variant: {:?}", other)
		}
		assert!(scratch_is_empty(&scratch));
	}
}
