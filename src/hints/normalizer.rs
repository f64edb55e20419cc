use super::timestamp::parse_optional_timestamp;
use crate::{error::InputError, OperationType, TimeRange, VerificationHints};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Raw hints as sent by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintsInput {
    /// Specific batch for a direct lookup (fastest path)
    pub batch_id: Option<String>,
    pub database_name: Option<String>,
    pub table_name: Option<String>,
    /// ISO-8601 start of the search window
    pub time_start: Option<String>,
    /// ISO-8601 end of the search window
    pub time_end: Option<String>,
    /// Disambiguates identical rows recorded by different operations
    pub expected_operation: Option<OperationType>,
}

/// What to do when only one bound of a time range is usable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRangePolicy {
    /// Drop the lone bound and search without a time range
    #[default]
    Lenient,
    /// Reject the request
    Strict,
}

/// Converts raw hints into the canonical backend form.
#[derive(Debug, Clone, Copy, Default)]
pub struct HintNormalizer {
    policy: TimeRangePolicy,
}

impl HintNormalizer {
    pub fn new(policy: TimeRangePolicy) -> Self {
        Self { policy }
    }

    /// Normalize caller hints
    ///
    /// # Returns
    /// * `Ok(None)` when no usable hint is present (unconstrained scan)
    /// * `Ok(Some(hints))` when at least one field is set
    /// * `Err(InputError)` when a supplied timestamp is malformed, or a
    ///   range is half-specified under the strict policy
    pub fn normalize(
        &self,
        input: Option<&HintsInput>,
    ) -> Result<Option<VerificationHints>, InputError> {
        let Some(input) = input else {
            return Ok(None);
        };

        let time_range =
            self.resolve_time_range(input.time_start.as_deref(), input.time_end.as_deref())?;

        let hints = VerificationHints {
            batch_id: non_empty(&input.batch_id),
            database_name: non_empty(&input.database_name),
            table_name: non_empty(&input.table_name),
            time_range,
            expected_operation: input.expected_operation,
        };

        if hints == VerificationHints::default() {
            debug!("No usable hints supplied, backend will scan unconstrained");
            return Ok(None);
        }

        Ok(Some(hints))
    }

    fn resolve_time_range(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Option<TimeRange>, InputError> {
        // Each bound is validated on its own before pairing.
        let start = parse_optional_timestamp("time_start", start)?;
        let end = parse_optional_timestamp("time_end", end)?;

        match (start, end) {
            (Some(start), Some(end)) => Ok(Some(TimeRange { start, end })),
            (None, None) => Ok(None),
            (Some(_), None) => self.lone_bound("time_start", "time_end"),
            (None, Some(_)) => self.lone_bound("time_end", "time_start"),
        }
    }

    fn lone_bound(
        &self,
        present: &'static str,
        missing: &'static str,
    ) -> Result<Option<TimeRange>, InputError> {
        match self.policy {
            TimeRangePolicy::Lenient => {
                debug!("Dropping {} hint: {} not supplied", present, missing);
                Ok(None)
            }
            TimeRangePolicy::Strict => Err(InputError::IncompleteTimeRange { present, missing }),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
