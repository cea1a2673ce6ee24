//! This is a tiny crate with one purpose:
//! give every export its own scratch files
//! and make sure they are gone again once the export is finished.
//!
//! Paths are created through `tempfile`, which picks a random name and creates it
//! exclusively, so concurrent exports writing into the same directory never share
//! or overwrite each other's files.
//!
//! A `ScratchPath` owns the file or directory it names; dropping it deletes
//! whatever is there, whether the caller returned normally or bailed out with `?`.
//! Failing to delete is logged and otherwise ignored, so that cleanup never hides
//! the error which caused the early return in the first place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir, TempPath};
use tracing::{debug, warn};

/// Create `dir` (and any parents) if needed and return its canonical form,
/// so that paths derived from it can be handed to other processes.
pub fn ensure_scratch_dir<P: AsRef<Path>>(dir: P) -> io::Result<PathBuf> {
	let dir = dir.as_ref();
	if !dir.exists() {
		fs::create_dir_all(dir)?;
	}
	dir.canonicalize()
}

#[derive(Debug)]
enum Scratch {
	File(TempPath),
	Dir(TempDir)
}

/// A uniquely named path inside a scratch directory,
/// removed from disk when this value is dropped.
#[derive(Debug)]
pub struct ScratchPath {
	path: PathBuf,
	inner: Option<Scratch>
}

impl ScratchPath {
	/// Create a unique, empty file `prefix-<random>.ext` inside `dir`.
	/// It may be written by us or replaced by an external process,
	/// and is deleted on drop if it exists by then.
	pub fn file_in<P: AsRef<Path>>(dir: P, prefix: &str, ext: &str) -> io::Result<Self> {
		let prefix = format!("{}-", prefix);
		let suffix = if ext.is_empty() { String::new() } else { format!(".{}", ext) };
		let file = Builder::new()
			.prefix(&prefix)
			.suffix(&suffix)
			.tempfile_in(dir)?;
		let temp_path = file.into_temp_path();
		Ok(ScratchPath {
			path: temp_path.to_path_buf(),
			inner: Some(Scratch::File(temp_path))
		})
	}

	/// Create a unique, empty directory inside `dir`; it is removed recursively on drop.
	pub fn create_dir_in<P: AsRef<Path>>(dir: P, prefix: &str) -> io::Result<Self> {
		let temp_dir = Builder::new()
			.prefix(&format!("{}-", prefix))
			.tempdir_in(dir)?;
		Ok(ScratchPath {
			path: temp_dir.path().to_path_buf(),
			inner: Some(Scratch::Dir(temp_dir))
		})
	}

	/// The path this guard owns
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Write `contents` to this path, replacing anything already there
	pub fn write<C: AsRef<[u8]>>(&self, contents: C) -> io::Result<()> {
		fs::write(&self.path, contents)
	}
}

impl Drop for ScratchPath {
	fn drop(&mut self) {
		let released = match self.inner.take() {
			Some(Scratch::File(temp_path)) => temp_path.close(),
			Some(Scratch::Dir(temp_dir)) => temp_dir.close(),
			None => return
		};
		match released {
			Ok(()) => debug!(path = %self.path.display(), "removed scratch path"),
			// already gone, e.g. an output the external tool removed after failing
			Err(e) if e.kind() == io::ErrorKind::NotFound => {},
			Err(e) => warn!(
				path = %self.path.display(),
				error = %e,
				"failed to remove scratch path"
			)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_names_are_unique_and_shaped() {
		let dir = TempDir::new().unwrap();
		let a = ScratchPath::file_in(dir.path(), "export", "md").unwrap();
		let b = ScratchPath::file_in(dir.path(), "export", "md").unwrap();
		assert_ne!(a.path(), b.path());
		let name = a.path().file_name().unwrap().to_string_lossy().to_string();
		assert!(name.starts_with("export-"), "{}", name);
		assert!(name.ends_with(".md"), "{}", name);
		let profile = ScratchPath::create_dir_in(dir.path(), "profile").unwrap();
		assert!(profile.path().is_dir());
		assert!(!profile.path().file_name().unwrap().to_string_lossy().contains('.'));
	}

	#[test]
	fn test_file_removed_on_drop() {
		let dir = TempDir::new().unwrap();
		let path = {
			let scratch = ScratchPath::file_in(dir.path(), "input", "md").unwrap();
			scratch.write("# Hello").unwrap();
			assert!(scratch.path().exists());
			scratch.path().to_path_buf()
		};
		assert!(!path.exists());
	}

	#[test]
	fn test_file_removed_elsewhere_is_not_an_error() {
		let dir = TempDir::new().unwrap();
		let scratch = ScratchPath::file_in(dir.path(), "output", "pdf").unwrap();
		fs::remove_file(scratch.path()).unwrap();
		drop(scratch);
		assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
	}

	#[test]
	fn test_dir_removed_recursively() {
		let dir = TempDir::new().unwrap();
		let path = {
			let scratch = ScratchPath::create_dir_in(dir.path(), "profile").unwrap();
			fs::write(scratch.path().join("Preferences"), "{}").unwrap();
			scratch.path().to_path_buf()
		};
		assert!(!path.exists());
	}

	#[test]
	fn test_removed_on_early_return() {
		fn fails_halfway(dir: &Path) -> Result<(), String> {
			let scratch = ScratchPath::file_in(dir, "input", "md").map_err(|e| e.to_string())?;
			scratch.write("text").map_err(|e| e.to_string())?;
			Err("tool failed".to_string())
		}

		let dir = TempDir::new().unwrap();
		assert!(fails_halfway(dir.path()).is_err());
		assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
	}

	#[test]
	fn test_concurrent_paths_never_collide() {
		let dir = TempDir::new().unwrap();
		let root = dir.path();
		let paths = std::thread::scope(|s| {
			let handles = (0..8)
				.map(|_| s.spawn(move || {
					(0..16)
						.map(|_| ScratchPath::file_in(root, "manuscript", "md").unwrap())
						.collect::<Vec<_>>()
				}))
				.collect::<Vec<_>>();
			handles.into_iter().flat_map(|h| h.join().unwrap()).collect::<Vec<_>>()
		});
		let mut names = paths.iter().map(|p| p.path().to_path_buf()).collect::<Vec<_>>();
		names.sort();
		names.dedup();
		assert_eq!(names.len(), 8 * 16);
		drop(paths);
		assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
	}

	#[test]
	fn test_ensure_scratch_dir() {
		let dir = TempDir::new().unwrap();
		let nested = dir.path().join("a").join("b");
		let created = ensure_scratch_dir(&nested).unwrap();
		assert!(created.is_dir());
		assert!(created.is_absolute());
	}
}
