//! Wire types shared by backends: component ids and metadata records.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::upload::placement::{Placement, Quat, Vec3};

/// Identifier of a component record, formatted `GLTF_<n>`.
///
/// A fresh id is minted for every store attempt; ids are never derived from
/// content, so re-uploading identical bytes yields a new id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Mint a new random id in `GLTF_0..GLTF_999999999`.
    pub fn mint() -> Self {
        let n: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        Self(format!("GLTF_{}", n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComponentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input to a single binary store call.
#[derive(Debug, Clone)]
pub struct StoreRequest {
    /// Human-readable asset name.
    pub name: String,
    /// GLB bytes, shared read-only between attempts.
    pub payload: Bytes,
    /// Lowercase hex SHA-256 of `payload`.
    pub content_hash: String,
}

/// Where a payload ended up after a successful store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAsset {
    /// Location reference handed back to callers (download URL or server hash).
    pub location: String,
    /// Backend-side key, when the backend exposes one.
    pub storage_path: Option<String>,
}

/// Component record: a reusable asset pointing at stored bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub id: ComponentId,
    pub url: String,
}

/// Entity record binding a component to a named scene position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(rename = "__meta")]
    pub meta: EntityMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMeta {
    pub active: bool,
    pub components: BTreeMap<String, bool>,
    pub layer: u32,
    pub local_position: Vec3,
    pub local_rotation: Quat,
    pub local_scale: Vec3,
    pub position: Vec3,
    pub rotation: Quat,
    pub uuid: u64,
}

impl EntityRecord {
    /// Build an entity for `component_id`, with a random uuid below 10^10.
    pub fn new(component_id: &ComponentId, placement: &Placement) -> Self {
        let uuid = rand::thread_rng().gen_range(0..10_000_000_000u64);
        let mut components = BTreeMap::new();
        components.insert(component_id.to_string(), true);

        Self {
            meta: EntityMeta {
                active: true,
                components,
                layer: 0,
                local_position: placement.position,
                local_rotation: placement.rotation,
                local_scale: placement.scale,
                position: placement.position,
                rotation: placement.rotation,
                uuid,
            },
        }
    }
}
