//! Movement section validation: cadence, speed, smoothing, and room geometry.

use crate::schema::ClassroomConfig;

use super::helpers::{validate_range, validate_range_f32};

pub(crate) fn validate_movement(errors: &mut Vec<String>, config: &ClassroomConfig) {
    let movement = &config.movement;

    validate_range(
        errors,
        "movement.tick_interval_ms",
        movement.tick_interval_ms,
        5,
        1000,
    );
    validate_range_f32(errors, "movement.speed", movement.speed, 0.01, 100.0);
    validate_range_f32(errors, "movement.lerp_factor", movement.lerp_factor, 0.01, 1.0);

    let bounds = &movement.bounds;
    if !(bounds.min_x < bounds.max_x) {
        errors.push(format!(
            "movement.bounds: min_x ({}) must be below max_x ({})",
            bounds.min_x, bounds.max_x
        ));
    }
    if !(bounds.min_z < bounds.max_z) {
        errors.push(format!(
            "movement.bounds: min_z ({}) must be below max_z ({})",
            bounds.min_z, bounds.max_z
        ));
    }

    let [x, y, z] = movement.spawn;
    if !y.is_finite() || !bounds.contains(x, z) {
        errors.push(format!("movement.spawn = [{x}, {y}, {z}] is outside the room bounds"));
    }
    if movement.waiting_area.iter().any(|v| !v.is_finite()) {
        errors.push("movement.waiting_area must be finite".to_string());
    }
}
