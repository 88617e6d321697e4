//! Condition extraction from submitted objects

use crate::error::Result;
use appflow_crd::{Condition, UnstructuredObject};

/// Extracts a named status condition from a submitted object
pub trait ConditionReader: Send + Sync {
    /// Find the condition of `condition_type`, `None` when not reported
    fn read_condition(
        &self,
        object: &UnstructuredObject,
        condition_type: &str,
    ) -> Result<Option<Condition>>;
}

/// Reads conditions from the conventional `status.conditions` list
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusConditionReader;

impl ConditionReader for StatusConditionReader {
    fn read_condition(
        &self,
        object: &UnstructuredObject,
        condition_type: &str,
    ) -> Result<Option<Condition>> {
        Ok(object.condition(condition_type)?)
    }
}
