//! Adjust directives: move, remove and add instructions against an
//! existing plan.

use crate::{CropId, CroftError, CroftResult, FieldId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveAction {
    Move,
    Remove,
    Add,
}

/// One user directive. `allocation_id` may be a synthetic marker for
/// `add` instructions (the allocation does not exist yet), so it is kept
/// as a raw string and parsed only where a real ID is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveInstruction {
    pub allocation_id: String,
    pub action: MoveAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_field_id: Option<FieldId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_crop_id: Option<CropId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_area: Option<f64>,
}

impl MoveInstruction {
    /// Structural validation of the instruction shape. Referential checks
    /// (does the allocation/field/crop exist, is the date inside the
    /// window) belong to the adjuster, which rejects per-instruction
    /// rather than failing the run.
    pub fn validate(&self) -> CroftResult<()> {
        match self.action {
            MoveAction::Move => {
                if self.target_field_id.is_none()
                    && self.target_start_date.is_none()
                    && self.target_area.is_none()
                {
                    return Err(CroftError::InvalidInput(format!(
                        "move {}: requires at least one of target field, start date or area",
                        self.allocation_id
                    )));
                }
            }
            MoveAction::Remove => {}
            MoveAction::Add => {
                if self.target_field_id.is_none()
                    || self.target_crop_id.is_none()
                    || self.target_start_date.is_none()
                {
                    return Err(CroftError::InvalidInput(format!(
                        "add {}: requires target field, crop and start date",
                        self.allocation_id
                    )));
                }
            }
        }
        Ok(())
    }
}
