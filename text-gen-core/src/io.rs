use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{fs, io};

use crate::error::StoreError;
use crate::model::text_model::ModelState;

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/quotes.txt` + `"bin"` → `data/quotes.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Writes a learned state as a compact `postcard` snapshot.
pub fn save_snapshot<P: AsRef<Path>>(path: P, state: &ModelState) -> Result<(), StoreError> {
	let bytes = postcard::to_stdvec(state)?;
	fs::write(path, bytes)?;
	Ok(())
}

/// Reads a state written by [`save_snapshot`].
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<ModelState, StoreError> {
	let bytes = fs::read(path)?;
	Ok(postcard::from_bytes(&bytes)?)
}

/// Writes a learned state as pretty JSON.
pub fn save_json<P: AsRef<Path>>(path: P, state: &ModelState) -> Result<(), StoreError> {
	let json = serde_json::to_string_pretty(state)?;
	fs::write(path, json)?;
	Ok(())
}

/// Reads a state written by [`save_json`] (or any JSON of the same shape).
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<ModelState, StoreError> {
	let contents = fs::read_to_string(path)?;
	Ok(serde_json::from_str(&contents)?)
}
