// mongobackup/src/restore/verification.rs
use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// First four bytes of every `mongodump --archive` stream.
pub const ARCHIVE_MAGIC: [u8; 4] = [0x6d, 0xe2, 0x99, 0x81];

/// Checks that a downloaded archive is an intact gzip stream wrapping a mongodump archive.
///
/// Reads the whole file, so a truncated or bit-flipped download fails here
/// instead of halfway through `mongorestore`. Returns the decompressed size.
pub fn verify_archive(path: &Path) -> Result<u64> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open archive {}", path.display()))?;
    let mut decoder = GzDecoder::new(file);

    let mut magic = [0u8; 4];
    decoder
        .read_exact(&mut magic)
        .with_context(|| format!("{} is not a readable gzip archive", path.display()))?;
    if magic != ARCHIVE_MAGIC {
        bail!(
            "{} does not contain a mongodump archive (header {:02x?})",
            path.display(),
            magic
        );
    }

    let rest = io::copy(&mut decoder, &mut io::sink())
        .with_context(|| format!("Archive {} is corrupt or truncated", path.display()))?;
    Ok(rest + magic.len() as u64)
}
