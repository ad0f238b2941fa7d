//! Encoding stage state into flat records and validating records on the way
//! back.
//!
//! Decoding checks the whole record before anything is applied and reports
//! every problem it finds, not just the first.

use super::error::{PersistError, RestoreViolation};
use super::record::{StageRecord, CURRENT_STEP_KEY};
use crate::core::Marker;
use crate::stage::StageFields;
use serde_json::Value;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Serialize fields, then add the marker ordinal under `current_step`.
pub fn encode_record<M: Marker, F: StageFields>(
    current: M,
    fields: &F,
) -> Result<StageRecord, PersistError> {
    let value =
        serde_json::to_value(fields).map_err(|e| PersistError::SerializationFailed(e.to_string()))?;
    let Value::Object(mut map) = value else {
        return Err(PersistError::SerializationFailed(format!(
            "fields of stage '{}' must serialize to an object",
            M::STAGE
        )));
    };
    map.insert(CURRENT_STEP_KEY.to_string(), Value::from(current.ordinal()));
    Ok(StageRecord::from_map(map))
}

/// Check a record without decoding it for use.
pub fn validate_record<M: Marker, F: StageFields>(
    record: &StageRecord,
) -> Validation<(), NonEmptyVec<RestoreViolation>> {
    let checks = vec![
        as_check(&decode_step::<M>(record)),
        as_check(&decode_fields::<F>(record)),
    ];
    Validation::all_vec(checks).map(|_| ())
}

/// Decode a record into its marker and fields.
///
/// Fails with [`PersistError::InvalidRecord`] carrying every violation.
pub fn decode_record<M: Marker, F: StageFields>(
    record: &StageRecord,
) -> Result<(M, F), PersistError> {
    let step = decode_step::<M>(record);
    let fields = decode_fields::<F>(record);

    let checks = vec![as_check(&step), as_check(&fields)];
    if let Validation::Failure(violations) = Validation::all_vec(checks) {
        return Err(PersistError::InvalidRecord(
            violations.iter().cloned().collect(),
        ));
    }

    let step = step.map_err(|v| PersistError::InvalidRecord(vec![v]))?;
    let fields = fields.map_err(|v| PersistError::InvalidRecord(vec![v]))?;
    Ok((step, fields))
}

fn decode_step<M: Marker>(record: &StageRecord) -> Result<M, RestoreViolation> {
    let value = record
        .current_step()
        .ok_or(RestoreViolation::MissingCurrentStep)?;
    let ordinal = value
        .as_u64()
        .ok_or_else(|| RestoreViolation::MalformedCurrentStep {
            value: value.to_string(),
        })?;
    u32::try_from(ordinal)
        .ok()
        .and_then(M::from_ordinal)
        .ok_or(RestoreViolation::UnknownStep {
            stage: M::STAGE,
            ordinal,
            len: M::all().len(),
        })
}

fn decode_fields<F: StageFields>(record: &StageRecord) -> Result<F, RestoreViolation> {
    serde_json::from_value(Value::Object(record.field_map())).map_err(|e| {
        RestoreViolation::MalformedFields {
            message: e.to_string(),
        }
    })
}

fn as_check<T>(result: &Result<T, RestoreViolation>) -> Validation<(), NonEmptyVec<RestoreViolation>> {
    match result {
        Ok(_) => Validation::success(()),
        Err(violation) => Validation::fail(violation.clone()),
    }
}
