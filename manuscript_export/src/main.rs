use anyhow::Context;
use clap::Parser;
use manuscript_export::config::{self, CliArgs, Command, ExportArgs, OutlineArgs};
use manuscript_export::deserialization::{manuscript_from_json, overrides_from_json};
use manuscript_export::{outline, telemetry, ExportOverrides, Exporter, MemoryStore};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::info;

fn main() -> anyhow::Result<()> {
	let cli = CliArgs::parse();
	let settings = config::load(&cli).context("failed to load configuration")?;
	telemetry::init(&settings.logging)?;

	match &cli.command {
		Command::Export(args) => run_export(&settings, args),
		Command::Outline(args) => run_outline(args)
	}
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
	match path {
		Some(p) => fs::read_to_string(p)
			.with_context(|| format!("failed to read {}", p.display())),
		None => {
			let mut json = String::new();
			io::stdin()
				.read_to_string(&mut json)
				.context("failed to read stdin")?;
			Ok(json)
		}
	}
}

fn run_export(settings: &config::ExportConfig, args: &ExportArgs) -> anyhow::Result<()> {
	let json = read_input(args.input.as_deref())?;
	let manuscript = manuscript_from_json(&json)?;
	let base = match args.options_file.as_deref() {
		Some(p) => overrides_from_json(&read_input(Some(p))?)?,
		None => ExportOverrides::default()
	};
	let overrides = args.apply_to(base);

	let id = manuscript.id.clone();
	let store = MemoryStore::new();
	store.save(manuscript);
	let exporter = Exporter::from_config(store, settings);
	let artifact = exporter.export(&id, &overrides)?;

	match args.output.as_deref() {
		Some(p) => {
			let target = if p.is_dir() {
				p.join(&artifact.filename)
			} else {
				p.to_path_buf()
			};
			fs::write(&target, artifact.as_bytes())
				.with_context(|| format!("failed to write {}", target.display()))?;
			info!(path = %target.display(), content_type = artifact.content_type(), "wrote artifact");
		},
		None => {
			let mut stdout = io::stdout();
			stdout.write_all(artifact.as_bytes())?;
			stdout.flush()?;
		}
	}
	Ok(())
}

fn run_outline(args: &OutlineArgs) -> anyhow::Result<()> {
	let json = read_input(args.input.as_deref())?;
	let manuscript = manuscript_from_json(&json)?;
	let mut stdout = io::stdout();
	for entry in outline(&manuscript.body_text()) {
		writeln!(stdout, "{}{}", "  ".repeat(entry.indent), entry.title)?;
	}
	Ok(())
}
