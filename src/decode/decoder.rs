//! Assignment → validated placement.

use super::types::{PlacedCircuit, Placement};
use crate::backend::SolveOutcome;
use crate::error::{Result, ValidationError};
use crate::model::{ConstraintFamily, GeometryModel};

/// Decodes the assignment carried by `outcome` into a [`Placement`].
///
/// Re-checks containment, non-overlap, the area lower bound and the
/// symmetry-breaking and cumulative families. Any violation is returned as
/// a [`ValidationError`]; nothing is corrected. Decoding depends only on its
/// arguments, so decoding the same outcome twice gives equal placements.
///
/// # Examples
///
/// ```
/// use u_floorplan::backend::{CpBackend, SolverBackend, SolverConfig};
/// use u_floorplan::decode::decode;
/// use u_floorplan::instance::Instance;
/// use u_floorplan::model::{encode, PackingConfig};
///
/// let instance = Instance::from_dims(8, &[(4, 4), (4, 4)]).unwrap();
/// let model = encode(&instance, &PackingConfig::default()).unwrap();
/// let outcome = CpBackend::new().solve(&model, &SolverConfig::default()).unwrap();
/// let placement = decode(&model, &outcome).unwrap();
/// assert_eq!(placement.plate_height, 4);
/// ```
pub fn decode(model: &GeometryModel, outcome: &SolveOutcome) -> Result<Placement> {
    let assignment = match &outcome.assignment {
        Some(a) if outcome.status.has_solution() => a,
        _ => return Err(ValidationError::MissingAssignment.into()),
    };
    let value = |id: crate::model::IntVarId| {
        assignment
            .int(id)
            .ok_or_else(|| ValidationError::MissingValue(model.int_var(id).name.clone()))
    };

    let plate_height = value(model.height())?;
    let mut circuits = Vec::with_capacity(model.circuit_count());
    for i in 0..model.circuit_count() {
        let vars = model.circuit_vars(i);
        let rotated = match vars.rotated {
            Some(id) => assignment
                .bool(id)
                .ok_or_else(|| ValidationError::MissingValue(model.bool_var(id).name.clone()))?,
            None => false,
        };
        if !model.orientations(i).contains(&rotated) {
            return Err(ValidationError::ForbiddenRotation { circuit: i }.into());
        }
        let (effective_width, effective_height) = model.effective_dims(i, rotated);
        circuits.push(PlacedCircuit {
            effective_width,
            effective_height,
            x: value(vars.x)?,
            y: value(vars.y)?,
            rotated,
        });
    }

    let placement = Placement {
        plate_width: model.plate_width(),
        plate_height,
        circuits,
    };

    if let Err(err) = placement.validate() {
        log::error!("decoded placement of {} is invalid: {err}", model.name);
        return Err(err.into());
    }

    let lower_bound = model.lower_height_bound();
    if plate_height < lower_bound {
        log::error!(
            "decoded height {plate_height} of {} is below the area bound {lower_bound}",
            model.name
        );
        return Err(ValidationError::BelowLowerBound {
            height: plate_height,
            lower_bound,
        }
        .into());
    }

    let rects = placement.rects();
    for family in [ConstraintFamily::SymmetryBreaking, ConstraintFamily::Cumulative] {
        if let Some(c) = model
            .constraints_in(family)
            .find(|c| !c.holds(&rects, placement.plate_width, plate_height))
        {
            log::error!(
                "decoded placement of {} violates {family} on circuits {:?}",
                model.name,
                c.circuits()
            );
            return Err(ValidationError::ConstraintViolated {
                family,
                circuits: c.circuits(),
            }
            .into());
        }
    }

    Ok(placement)
}
