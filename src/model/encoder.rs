//! Instance × configuration → geometry model.

use super::config::PackingConfig;
use super::constraints::Constraint;
use super::model::{CircuitVars, GeometryModel};
use super::variables::{BoolVar, IntVar};
use crate::error::{FloorplanError, InputError};
use crate::instance::Instance;

/// Builds the geometry model of `instance`.
///
/// Rejects the instance with [`InputError::CircuitTooWide`] when some circuit
/// fits the plate width in no allowed orientation.
///
/// Rotation variables are fixed when only one orientation is meaningful:
/// squares stay upright, and a circuit whose other orientation is wider than
/// the plate keeps the orientation that fits.
pub fn encode(instance: &Instance, config: &PackingConfig) -> Result<GeometryModel, FloorplanError> {
    config.validate()?;

    let plate_width = instance.plate_width();
    let rotation = config.allow_rotation;

    if let Some(index) = instance.first_unplaceable(rotation) {
        let c = instance.circuits()[index];
        return Err(InputError::CircuitTooWide {
            index,
            width: c.width,
            height: c.height,
            plate_width,
            rotation,
        }
        .into());
    }

    let lower = instance.area_lower_bound();
    let upper = instance.stacking_upper_bound(rotation);
    let mut model = GeometryModel::new(
        format!("strip_packing_{}x{}", plate_width, instance.len()),
        plate_width,
        lower,
        upper,
    );

    for (i, circuit) in instance.circuits().iter().enumerate() {
        let x = model.add_int_var(IntVar::new(format!("x_{i}"), 0, plate_width));
        let y = model.add_int_var(IntVar::new(format!("y_{i}"), 0, upper));
        let rotated = rotation.then(|| {
            let name = format!("rotated_{i}");
            let upright = circuit.fits(plate_width, false);
            let turned = circuit.fits(plate_width, true);
            let var = if circuit.is_square() || !turned {
                BoolVar::fixed(name, false)
            } else if !upright {
                BoolVar::fixed(name, true)
            } else {
                BoolVar::new(name)
            };
            model.add_bool_var(var)
        });
        model.add_circuit(*circuit, CircuitVars { x, y, rotated });
    }

    let n = instance.len();
    for i in 0..n {
        model.add_constraint(Constraint::Boundary { circuit: i });
        if let Some(rotated) = model.circuit_vars(i).rotated {
            model.add_constraint(Constraint::RotationConsistency {
                circuit: i,
                rotated,
            });
        }
    }

    for first in 0..n {
        for second in (first + 1)..n {
            model.add_constraint(Constraint::NonOverlap { first, second });
        }
    }

    if config.cumulative && n > 1 {
        model.add_constraint(Constraint::Cumulative {
            circuits: (0..n).collect(),
            capacity: plate_width,
        });
    }

    if config.symmetry_breaking {
        if let Some((first, second)) = largest_pair(instance) {
            model.add_constraint(Constraint::LexicographicOrder { first, second });
            model.add_constraint(Constraint::LowerLeftQuadrant { circuit: first });
        }
    }

    log::debug!(
        "encoded {}: {} int vars, {} bool vars, {} constraints, height in [{}, {}]",
        model.name,
        model.int_vars().len(),
        model.bool_vars().len(),
        model.constraint_count(),
        lower,
        upper
    );

    model.validate()?;
    Ok(model)
}

/// The two largest-area circuits, larger first; ties go to the lower index.
///
/// `None` for single-circuit instances.
pub fn largest_pair(instance: &Instance) -> Option<(usize, usize)> {
    if instance.len() < 2 {
        return None;
    }
    let mut order: Vec<usize> = (0..instance.len()).collect();
    // Stable sort keeps index order among equal areas.
    order.sort_by_key(|&i| std::cmp::Reverse(instance.circuits()[i].area()));
    Some((order[0], order[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConstraintFamily;

    #[test]
    fn test_bounds() {
        let inst = Instance::from_dims(8, &[(4, 4), (4, 4)]).unwrap();
        let model = encode(&inst, &PackingConfig::default()).unwrap();
        assert_eq!(model.lower_height_bound(), 4);
        assert_eq!(model.upper_height_bound(), 8);
        assert_eq!(model.int_var(model.circuit_vars(0).x).max, 8);
        assert_eq!(model.int_var(model.circuit_vars(1).y).max, 8);
    }

    #[test]
    fn test_rotation_upper_bound() {
        let inst = Instance::from_dims(10, &[(5, 2), (3, 1)]).unwrap();
        let config = PackingConfig::default().with_rotation(true);
        let model = encode(&inst, &config).unwrap();
        assert_eq!(model.upper_height_bound(), 8);
        assert_eq!(model.constraints_in(ConstraintFamily::RotationConsistency).count(), 2);
    }

    #[test]
    fn test_family_counts() {
        let inst = Instance::from_dims(10, &[(1, 2), (2, 3), (3, 4), (4, 5)]).unwrap();
        let model = encode(&inst, &PackingConfig::default()).unwrap();
        assert_eq!(model.constraints_in(ConstraintFamily::Boundary).count(), 4);
        assert_eq!(model.constraints_in(ConstraintFamily::NonOverlap).count(), 6);
        assert_eq!(model.constraints_in(ConstraintFamily::Cumulative).count(), 1);
        assert!(!model.has_family(ConstraintFamily::SymmetryBreaking));
        assert!(!model.has_family(ConstraintFamily::RotationConsistency));
    }

    #[test]
    fn test_cumulative_toggle() {
        let inst = Instance::from_dims(10, &[(1, 2), (2, 3)]).unwrap();
        let config = PackingConfig::default().with_cumulative(false);
        let model = encode(&inst, &config).unwrap();
        assert!(!model.has_family(ConstraintFamily::Cumulative));
    }

    #[test]
    fn test_single_circuit_has_no_pairwise_constraints() {
        let inst = Instance::from_dims(5, &[(3, 2)]).unwrap();
        let config = PackingConfig::default().with_symmetry_breaking(true);
        let model = encode(&inst, &config).unwrap();
        assert!(!model.has_family(ConstraintFamily::NonOverlap));
        assert!(!model.has_family(ConstraintFamily::Cumulative));
        assert!(!model.has_family(ConstraintFamily::SymmetryBreaking));
        assert_eq!(model.lower_height_bound(), 2);
    }

    #[test]
    fn test_symmetry_breaking_targets_largest_pair() {
        let inst = Instance::from_dims(10, &[(1, 1), (3, 3), (2, 2), (3, 3)]).unwrap();
        assert_eq!(largest_pair(&inst), Some((1, 3)));

        let config = PackingConfig::default().with_symmetry_breaking(true);
        let model = encode(&inst, &config).unwrap();
        assert_eq!(model.symmetry_pair(), Some((1, 3)));
        assert_eq!(model.quadrant_circuit(), Some(1));
        assert_eq!(model.constraints_in(ConstraintFamily::SymmetryBreaking).count(), 2);
    }

    #[test]
    fn test_rotation_fixing() {
        // square, only-upright, only-turned, free
        let inst = Instance::from_dims(4, &[(2, 2), (3, 5), (6, 2), (1, 3)]).unwrap();
        let config = PackingConfig::default().with_rotation(true);
        let model = encode(&inst, &config).unwrap();
        assert_eq!(model.orientations(0), &[false]);
        assert_eq!(model.orientations(1), &[false]);
        assert_eq!(model.orientations(2), &[true]);
        assert_eq!(model.orientations(3), &[false, true]);
    }

    #[test]
    fn test_too_wide_rejected() {
        let inst = Instance::from_dims(4, &[(2, 2), (7, 9)]).unwrap();
        let config = PackingConfig::default().with_rotation(true);
        match encode(&inst, &config) {
            Err(FloorplanError::Input(InputError::CircuitTooWide { index, .. })) => {
                assert_eq!(index, 1)
            }
            other => panic!("expected CircuitTooWide, got {other:?}"),
        }
    }

    #[test]
    fn test_too_wide_without_rotation_only() {
        let inst = Instance::from_dims(4, &[(6, 2)]).unwrap();
        assert!(encode(&inst, &PackingConfig::default()).is_err());
        assert!(encode(&inst, &PackingConfig::default().with_rotation(true)).is_ok());
    }
}
