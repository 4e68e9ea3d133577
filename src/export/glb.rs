//! Binary glTF (GLB) container inspection.
//!
//! Validates the container layout and summarises what the validation rules
//! need: mesh, vertex, polygon and material counts, and image sizes.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"
const CHUNK_BIN: u32 = 0x004E_4942; // "BIN\0"
const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const MODE_TRIANGLES: u32 = 4;
const MODE_TRIANGLE_STRIP: u32 = 5;
const MODE_TRIANGLE_FAN: u32 = 6;

#[derive(Debug, Error)]
pub enum GlbError {
    #[error("file too short for a GLB header ({0} bytes)")]
    TooShort(usize),

    #[error("not a GLB file (magic 0x{0:08x})")]
    BadMagic(u32),

    #[error("unsupported GLB version {0} (expected 2)")]
    UnsupportedVersion(u32),

    #[error("declared length {declared} does not match actual length {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("chunk at offset {offset} is truncated")]
    TruncatedChunk { offset: usize },

    #[error("chunk at offset {offset} has unaligned length {length}")]
    UnalignedChunk { offset: usize, length: usize },

    #[error("first chunk must be JSON")]
    MissingJsonChunk,

    #[error("invalid glTF JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One image referenced by the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub name: String,
    /// Pixel size, when it could be read from an embedded PNG.
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Stored in the BIN chunk or as a data URI.
    pub embedded: bool,
    /// External file that does not exist next to the GLB.
    pub missing: bool,
}

impl ImageInfo {
    pub fn max_dimension(&self) -> Option<u32> {
        Some(self.width?.max(self.height?))
    }
}

/// What a GLB contains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GlbSummary {
    pub byte_len: usize,
    pub mesh_count: usize,
    pub vertex_count: u64,
    pub polygon_count: u64,
    pub material_count: usize,
    pub images: Vec<ImageInfo>,
    pub has_bin_chunk: bool,
}

impl GlbSummary {
    pub fn missing_textures(&self) -> Vec<&str> {
        self.images
            .iter()
            .filter(|i| i.missing)
            .map(|i| i.name.as_str())
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Document {
    meshes: Vec<Mesh>,
    accessors: Vec<Accessor>,
    materials: Vec<serde_json::Value>,
    images: Vec<Image>,
    buffer_views: Vec<BufferView>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Mesh {
    primitives: Vec<Primitive>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Primitive {
    attributes: BTreeMap<String, usize>,
    indices: Option<usize>,
    mode: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Accessor {
    count: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Image {
    name: Option<String>,
    uri: Option<String>,
    buffer_view: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BufferView {
    byte_offset: usize,
    byte_length: usize,
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

struct Chunks<'a> {
    json: &'a [u8],
    bin: Option<&'a [u8]>,
}

fn split_chunks(bytes: &[u8]) -> Result<Chunks<'_>, GlbError> {
    if bytes.len() < HEADER_LEN {
        return Err(GlbError::TooShort(bytes.len()));
    }
    let magic = read_u32(bytes, 0).ok_or(GlbError::TooShort(bytes.len()))?;
    if magic != GLB_MAGIC {
        return Err(GlbError::BadMagic(magic));
    }
    let version = read_u32(bytes, 4).ok_or(GlbError::TooShort(bytes.len()))?;
    if version != 2 {
        return Err(GlbError::UnsupportedVersion(version));
    }
    let declared = read_u32(bytes, 8).ok_or(GlbError::TooShort(bytes.len()))? as usize;
    if declared != bytes.len() {
        return Err(GlbError::LengthMismatch {
            declared,
            actual: bytes.len(),
        });
    }

    let mut offset = HEADER_LEN;
    let mut json = None;
    let mut bin = None;

    while offset < bytes.len() {
        let length = read_u32(bytes, offset).ok_or(GlbError::TruncatedChunk { offset })? as usize;
        let kind = read_u32(bytes, offset + 4).ok_or(GlbError::TruncatedChunk { offset })?;
        if length % 4 != 0 {
            return Err(GlbError::UnalignedChunk { offset, length });
        }
        let start = offset + CHUNK_HEADER_LEN;
        let data = start
            .checked_add(length)
            .and_then(|end| bytes.get(start..end))
            .ok_or(GlbError::TruncatedChunk { offset })?;

        match kind {
            CHUNK_JSON if json.is_none() && offset == HEADER_LEN => json = Some(data),
            _ if json.is_none() => return Err(GlbError::MissingJsonChunk),
            CHUNK_BIN if bin.is_none() => bin = Some(data),
            // Unknown chunk types are skipped.
            _ => {}
        }
        offset = start + length;
    }

    Ok(Chunks {
        json: json.ok_or(GlbError::MissingJsonChunk)?,
        bin,
    })
}

fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.get(..8)? != PNG_SIGNATURE || data.get(12..16)? != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(data.get(16..20)?.try_into().ok()?);
    let height = u32::from_be_bytes(data.get(20..24)?.try_into().ok()?);
    Some((width, height))
}

fn triangle_count(mode: u32, count: u64) -> u64 {
    match mode {
        MODE_TRIANGLES => count / 3,
        MODE_TRIANGLE_STRIP | MODE_TRIANGLE_FAN => count.saturating_sub(2),
        _ => 0,
    }
}

/// Inspect an in-memory GLB. External image URIs are resolved against
/// `base_dir`; without one they are reported missing.
pub fn inspect(bytes: &[u8], base_dir: Option<&Path>) -> Result<GlbSummary, GlbError> {
    let chunks = split_chunks(bytes)?;
    let doc: Document = serde_json::from_slice(chunks.json)?;

    let accessor_count = |index: usize| doc.accessors.get(index).map_or(0, |a| a.count);

    let mut vertex_count = 0u64;
    let mut polygon_count = 0u64;
    for primitive in doc.meshes.iter().flat_map(|m| &m.primitives) {
        let positions = primitive
            .attributes
            .get("POSITION")
            .map_or(0, |&i| accessor_count(i));
        vertex_count = vertex_count.saturating_add(positions);

        let elements = primitive.indices.map_or(positions, accessor_count);
        polygon_count = polygon_count
            .saturating_add(triangle_count(primitive.mode.unwrap_or(MODE_TRIANGLES), elements));
    }

    let images = doc
        .images
        .iter()
        .enumerate()
        .map(|(index, image)| {
            let name = image
                .name
                .clone()
                .or_else(|| image.uri.clone())
                .unwrap_or_else(|| format!("image_{}", index));

            if let Some(view) = image.buffer_view {
                let dims = doc
                    .buffer_views
                    .get(view)
                    .zip(chunks.bin)
                    .and_then(|(v, bin)| bin.get(v.byte_offset..v.byte_offset.checked_add(v.byte_length)?))
                    .and_then(png_dimensions);
                return ImageInfo {
                    name,
                    width: dims.map(|d| d.0),
                    height: dims.map(|d| d.1),
                    embedded: true,
                    missing: false,
                };
            }

            match image.uri.as_deref() {
                Some(uri) if uri.starts_with("data:") => ImageInfo {
                    name,
                    width: None,
                    height: None,
                    embedded: true,
                    missing: false,
                },
                Some(uri) => ImageInfo {
                    name,
                    width: None,
                    height: None,
                    embedded: false,
                    missing: !base_dir.is_some_and(|dir| dir.join(uri).exists()),
                },
                None => ImageInfo {
                    name,
                    width: None,
                    height: None,
                    embedded: false,
                    missing: true,
                },
            }
        })
        .collect();

    Ok(GlbSummary {
        byte_len: bytes.len(),
        mesh_count: doc.meshes.len(),
        vertex_count,
        polygon_count,
        material_count: doc.materials.len(),
        images,
        has_bin_chunk: chunks.bin.is_some(),
    })
}

/// Read and inspect a GLB file, resolving external images next to it.
pub fn inspect_file(path: &Path) -> Result<GlbSummary, GlbError> {
    let bytes = std::fs::read(path)?;
    inspect(&bytes, path.parent())
}
