//! Conversions between the storable position form and the scene's vector
//! type.

use dragonkeep_types::StorableVector3;
use nalgebra::Vector3;

/// Scene-space position.
pub type ScenePoint = Vector3<f64>;

/// Convert a persisted position into scene space.
pub fn to_usable_vector3(position: StorableVector3) -> ScenePoint {
    Vector3::new(position.x, position.y, position.z)
}

/// Convert a scene-space position into its persisted form.
pub fn to_storable_vector3(point: &ScenePoint) -> StorableVector3 {
    StorableVector3::new(point.x, point.y, point.z)
}
