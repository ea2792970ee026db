/// (De)serializes a `std::time::Duration` as whole milliseconds.
pub mod duration_millis {
    use std::time::Duration;

    use schemars::gen::SchemaGenerator;
    use schemars::schema::{InstanceType, Schema, SchemaObject};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }

    pub fn schema(_gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::Integer.into()),
            format: Some("milliseconds".to_owned()),
            ..Default::default()
        }
        .into()
    }
}

/// Parses an environment variable, falling back to `default` if it is unset
/// or does not parse.
pub fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Settings {
        #[serde(with = "super::duration_millis")]
        interval: Duration,
    }

    #[test]
    fn duration_as_millis() {
        let settings: Settings = serde_json::from_str(r#"{"interval":250}"#).unwrap();
        assert_eq!(settings.interval, Duration::from_millis(250));
        assert_eq!(
            serde_json::to_string(&settings).unwrap(),
            r#"{"interval":250}"#
        );
    }

    #[test]
    fn env_or_falls_back() {
        assert_eq!(super::env_or("FLEETIX_SURELY_UNSET_VARIABLE", 7u32), 7);
    }
}
