//! Reader for the IDX files of the MNIST distribution.
//!
//! Image files (`magic 2051`) carry a big-endian `u32` header `count, rows,
//! cols` followed by `count * rows * cols` unsigned pixel bytes; label files
//! (`magic 2049`) carry `count` followed by one byte per label. Files whose
//! name ends in `.gz` are decompressed on the fly.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::datasets::InMemoryDataset;
use crate::error::DataError;

pub const IMAGE_MAGIC: u32 = 2051;
pub const LABEL_MAGIC: u32 = 2049;
pub const MNIST_CLASSES: usize = 10;

/// Decoded IDX image file; pixels are scaled to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IdxImages {
    pub count: usize,
    pub rows: usize,
    pub cols: usize,
    /// `count` row-major images of `rows * cols` values each.
    pub pixels: Vec<f32>,
}

impl IdxImages {
    pub fn pixels_per_image(&self) -> usize {
        self.rows * self.cols
    }
}

/// Reads an IDX image file from `reader`.
///
/// # Errors
/// - `DataError::Format` for a wrong magic number, an oversized header or a
///   truncated body.
/// - `DataError::Io` for other read failures.
pub fn read_images<R: Read>(mut reader: R) -> Result<IdxImages, DataError> {
    expect_magic(&mut reader, IMAGE_MAGIC, "image")?;
    let count = read_u32(&mut reader)? as usize;
    let rows = read_u32(&mut reader)? as usize;
    let cols = read_u32(&mut reader)? as usize;
    let total = count
        .checked_mul(rows)
        .and_then(|n| n.checked_mul(cols))
        .ok_or_else(|| DataError::Format(format!("image header {} x {} x {} overflows", count, rows, cols)))?;

    let bytes = read_body(&mut reader, total, "image")?;
    let pixels = bytes.into_iter().map(|b| b as f32 / 255.0).collect();
    Ok(IdxImages {
        count,
        rows,
        cols,
        pixels,
    })
}

/// Reads an IDX label file from `reader`.
///
/// # Errors
/// Same conditions as [`read_images`].
pub fn read_labels<R: Read>(mut reader: R) -> Result<Vec<usize>, DataError> {
    expect_magic(&mut reader, LABEL_MAGIC, "label")?;
    let count = read_u32(&mut reader)? as usize;
    let bytes = read_body(&mut reader, count, "label")?;
    Ok(bytes.into_iter().map(usize::from).collect())
}

/// Loads a pair of IDX image and label files into a 10-class dataset.
///
/// # Errors
/// - `DataError::Io` if a file cannot be opened or read.
/// - `DataError::Format` for malformed files, differing sample counts or
///   labels outside `0..10`.
pub fn load_idx(images_path: impl AsRef<Path>, labels_path: impl AsRef<Path>) -> Result<InMemoryDataset, DataError> {
    let images_path = images_path.as_ref();
    let labels_path = labels_path.as_ref();
    let images = read_images(open(images_path)?)?;
    let labels = read_labels(open(labels_path)?)?;
    if images.count != labels.len() {
        return Err(DataError::Format(format!(
            "{} holds {} images but {} holds {} labels",
            images_path.display(),
            images.count,
            labels_path.display(),
            labels.len()
        )));
    }
    log::debug!(
        "load_idx: {} images of {}x{} from {}",
        images.count,
        images.rows,
        images.cols,
        images_path.display()
    );
    let dim = images.pixels_per_image();
    InMemoryDataset::new(images.pixels, labels, dim, MNIST_CLASSES)
}

fn open(path: &Path) -> Result<Box<dyn Read>, DataError> {
    let file = BufReader::new(File::open(path)?);
    if path.extension().map_or(false, |ext| ext == "gz") {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

fn expect_magic<R: Read>(reader: &mut R, expected: u32, what: &str) -> Result<(), DataError> {
    let magic = read_u32(reader)?;
    if magic != expected {
        return Err(DataError::Format(format!(
            "bad {} file magic number {} (expected {})",
            what, magic, expected
        )));
    }
    Ok(())
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, DataError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            DataError::Format("truncated header".to_string())
        } else {
            DataError::Io(err)
        }
    })?;
    Ok(u32::from_be_bytes(buf))
}

fn read_body<R: Read>(reader: &mut R, len: usize, what: &str) -> Result<Vec<u8>, DataError> {
    let mut bytes = Vec::new();
    (&mut *reader).take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(DataError::Format(format!(
            "truncated {} data: {} of {} bytes",
            what,
            bytes.len(),
            len
        )));
    }
    Ok(bytes)
}

#[cfg(test)]
#[path = "mnist_test.rs"]
mod tests;
