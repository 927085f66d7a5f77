// scanmotion_core/src/serde_helpers.rs

/// Range readings with "no return" written as `null`.
///
/// JSON has no representation for `inf` or `NaN`. Non-finite readings are
/// serialized as `null` and read back as `inf`.
pub mod ranges_with_null_as_no_return {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ranges: &[f64], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(ranges.iter().map(|r| r.is_finite().then_some(*r)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Vec<Option<f64>> = Deserialize::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|r| r.unwrap_or(f64::INFINITY))
            .collect())
    }
}
