#[cfg(test)]
pub mod test {
    use serde::{Deserialize, Serialize};
    use serde_json::Value;

    use crate::types::{Duration, Timestamp};

    #[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
    #[serde(default)]
    pub struct TestConfig {
        pub name: String,
        pub text: String,
        #[cfg(feature = "url")]
        pub url: Option<crate::types::Url>,
        pub birdie: Option<Nest>,
        pub nested: Nested,
        pub debug: bool,
        pub port: u16,
        pub ratio: f64,
        pub any: Value,
        pub double: Option<Option<String>>,
        pub tags: Vec<String>,
        pub timeout: Duration,
        pub started: Option<Timestamp>,
        pub secret: String,
    }

    #[cfg(feature = "url")]
    crate::record!(TestConfig {
        name, text, url, birdie, nested, debug, port, ratio, any, double, tags, timeout, started,
    } hidden { secret });

    #[cfg(not(feature = "url"))]
    crate::record!(TestConfig {
        name, text, birdie, nested, debug, port, ratio, any, double, tags, timeout, started,
    } hidden { secret });

    #[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
    #[serde(default)]
    pub struct Nest {
        pub name: String,
        pub value: i64,
        pub complex_env: i32,
        pub inner: Option<Inner>,
        pub note: String,
    }

    crate::record!(Nest { name, value, complex_env, inner } hidden { note });

    #[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
    #[serde(default)]
    pub struct Inner {
        pub level: u8,
    }

    crate::record!(Inner { level });

    #[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
    #[serde(default)]
    pub struct Nested {
        pub value: String,
        pub count: u32,
    }

    crate::record!(Nested { value, count });

    /// The config with the defaults a caller would preset before population.
    pub fn with_defaults() -> TestConfig {
        TestConfig {
            text: "default".into(),
            port: 8080,
            ..TestConfig::default()
        }
    }

    /// A synthetic environment, so tests never touch the process environment.
    pub fn env(pairs: &[(&str, &str)]) -> std::collections::HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn fixture_starts_zeroed_apart_from_defaults() {
        use crate::field::Field;

        let config = with_defaults();
        assert_eq!(config.text, "default");
        assert_eq!(config.port, 8080);
        assert!(config.birdie.is_none());
        assert!(config.nested.is_zero());
        assert!(!config.is_zero());
    }
}
