// Conversions between the model file's axis convention and world space.
//
// Model files are Y-up with 16 units per block. World space is Z-up, metric,
// with the model's Z axis becoming world Y.

use glam::{DQuat, DVec3};

/// Model units per world unit (16 pixels = 1 meter).
pub const UNITS_PER_METER: f64 = 16.0;

/// Swap the Y and Z components: model `[x, y, z]` -> world `[x, z, y]`.
pub fn swap_yz(v: DVec3) -> DVec3 {
    DVec3::new(v.x, v.z, v.y)
}

/// Convert a model-space point (pivot, origin, offset) to world space.
pub fn to_world_point(v: DVec3) -> DVec3 {
    swap_yz(v) / UNITS_PER_METER
}

/// Convert a model-space extent (size, inflate) to world units.
///
/// Same as [`to_world_point`]; kept separate so call sites read as what
/// they convert.
pub fn to_world_extent(v: DVec3) -> DVec3 {
    to_world_point(v)
}

/// Convert a model Euler rotation (degrees) into a world rotation.
///
/// The model rotation `(rx, ry, rz)` becomes `(rx, rz, -ry)` radians about
/// world X, Y, Z, applied X first, then Z, then Y.
pub fn source_rotation(degrees: DVec3) -> DQuat {
    let x = degrees.x.to_radians();
    let y = degrees.z.to_radians();
    let z = -degrees.y.to_radians();

    DQuat::from_rotation_y(y) * DQuat::from_rotation_z(z) * DQuat::from_rotation_x(x)
}
