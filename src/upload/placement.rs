//! Scene placement data attached to entity records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A 3-component vector serialized as `{x, y, z}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A rotation quaternion serialized as `{x, y, z, w}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quat {
    pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }
}

/// Position, rotation and scale of a placed entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Error parsing a comma-separated vector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected} comma-separated numbers, got '{input}'")]
pub struct ParseVectorError {
    expected: usize,
    input: String,
}

fn parse_components<const N: usize>(s: &str) -> Result<[f64; N], ParseVectorError> {
    let err = || ParseVectorError {
        expected: N,
        input: s.to_string(),
    };

    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(err());
    }

    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        let value: f64 = part.parse().map_err(|_| err())?;
        if !value.is_finite() {
            return Err(err());
        }
        *slot = value;
    }
    Ok(out)
}

impl FromStr for Vec3 {
    type Err = ParseVectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [x, y, z] = parse_components::<3>(s)?;
        Ok(Vec3 { x, y, z })
    }
}

impl FromStr for Quat {
    type Err = ParseVectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [x, y, z, w] = parse_components::<4>(s)?;
        Ok(Quat { x, y, z, w })
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}
