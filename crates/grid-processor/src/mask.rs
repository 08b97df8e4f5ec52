//! Threshold co-masking of two co-registered fields.

use crate::error::{GridProcessorError, Result};
use crate::types::Field;

/// Keep `values` where `selector >= threshold`, NaN elsewhere.
///
/// The result carries the name, dimensions and attributes of `values`. A NaN
/// selector never passes the threshold.
///
/// # Errors
///
/// Returns [`GridProcessorError::ShapeMismatch`] if the fields differ in shape.
pub fn mask_by_threshold(selector: &Field, values: &Field, threshold: f32) -> Result<Field> {
    if selector.shape != values.shape {
        return Err(GridProcessorError::shape_mismatch(
            &selector.shape,
            &values.shape,
        ));
    }

    let data = selector
        .data
        .iter()
        .zip(&values.data)
        .map(|(&s, &v)| if s >= threshold { v } else { f32::NAN })
        .collect();

    Ok(Field {
        data,
        ..values.clone()
    })
}
