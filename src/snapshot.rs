//! Snapshot codec: a self-describing byte stream for the whole index
//! (spec §4.6), plus a thin named-file layer over a configured directory
//! (spec §6's "snapshot files... stored under a configured directory").

use crate::error::{ExclusionError, Result};
use crate::index::ExclusionIndex;
use crate::interval::Interval;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const MAGIC: [u8; 4] = *b"EXMS";
const CURRENT_VERSION: u16 = 1;

/// Write every stored interval to `writer` as `MAGIC || version || bincode
/// body`. Handles are written verbatim so [`deserialize_into`] can restore
/// them exactly (property P5).
///
/// Raw I/O failures while writing (`writer.write_all`) surface as
/// [`ExclusionError::Io`], not `BoundsOverflow` — the latter is reserved for
/// values that fail to round-trip through the codec itself.
pub fn serialize<P, W: Write>(index: &ExclusionIndex<P>, mut writer: W) -> Result<()>
where
    P: Serialize,
{
    writer.write_all(&MAGIC)?;
    writer.write_all(&CURRENT_VERSION.to_le_bytes())?;

    let arcs = index.iter_arcs();
    let borrowed: Vec<&Interval<P>> = arcs.iter().map(|a| a.as_ref()).collect();
    bincode::serialize_into(&mut writer, &borrowed).map_err(|e| ExclusionError::BoundsOverflow {
        reason: format!("failed to encode snapshot body: {e}"),
    })?;
    Ok(())
}

/// Read a byte stream produced by [`serialize`] and atomically replace
/// `index`'s contents with it. On a format or decode error, `index` is
/// left untouched.
pub fn deserialize_into<P, R: Read>(index: &mut ExclusionIndex<P>, mut reader: R) -> Result<()>
where
    P: DeserializeOwned,
{
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(|e| ExclusionError::CorruptSnapshot {
        reason: format!("failed to read magic: {e}"),
    })?;
    if magic != MAGIC {
        return Err(ExclusionError::CorruptSnapshot {
            reason: "bad magic bytes".to_string(),
        });
    }

    let mut version_bytes = [0u8; 2];
    reader
        .read_exact(&mut version_bytes)
        .map_err(|e| ExclusionError::CorruptSnapshot {
            reason: format!("failed to read version: {e}"),
        })?;
    let version = u16::from_le_bytes(version_bytes);
    if version != CURRENT_VERSION {
        return Err(ExclusionError::CorruptSnapshot {
            reason: format!("unsupported snapshot version: {version}"),
        });
    }

    let intervals: Vec<Interval<P>> = bincode::deserialize_from(&mut reader).map_err(|e| ExclusionError::CorruptSnapshot {
        reason: format!("failed to decode snapshot body: {e}"),
    })?;

    index.rebuild_from(intervals)
}

fn snapshot_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.exms"))
}

/// Save the index to `<dir>/<name>.exms`, creating `dir` if needed.
///
/// Failure to create the directory or file (permissions, disk full,
/// missing parent) surfaces as [`ExclusionError::Io`].
pub fn save_to_dir<P>(index: &ExclusionIndex<P>, dir: &Path, name: &str) -> Result<()>
where
    P: Serialize,
{
    fs::create_dir_all(dir)?;
    let file = fs::File::create(snapshot_path(dir, name))?;
    serialize(index, std::io::BufWriter::new(file))
}

/// Load `<dir>/<name>.exms` into `index`, replacing its contents on success.
pub fn load_from_dir<P>(index: &mut ExclusionIndex<P>, dir: &Path, name: &str) -> Result<()>
where
    P: DeserializeOwned,
{
    let path = snapshot_path(dir, name);
    let file = fs::File::open(&path).map_err(|_| ExclusionError::UnknownSnapshot(name.to_string()))?;
    deserialize_into(index, std::io::BufReader::new(file))
}

/// Delete `<dir>/<name>.exms`.
pub fn delete_from_dir(dir: &Path, name: &str) -> Result<()> {
    let path = snapshot_path(dir, name);
    fs::remove_file(&path).map_err(|_| ExclusionError::UnknownSnapshot(name.to_string()))
}

/// List the names of every snapshot stored in `dir` (empty if `dir`
/// doesn't exist yet).
pub fn list_snapshots(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let path = e.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("exms") {
                path.file_stem().and_then(|s| s.to_str()).map(|s| s.to_string())
            } else {
                None
            }
        })
        .collect()
}
