use std::env;

use crate::codegen::GeneratorOptions;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    /// Journey name used when a request doesn't name one
    pub journey_name: String,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            host: env::var("HOST").unwrap_or(defaults.host),
            journey_name: env::var("JOURNEY_NAME")
                .ok()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(defaults.journey_name),
        }
    }

    /// Generator options seeded from this configuration
    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            journey_name: self.journey_name.clone(),
            ..GeneratorOptions::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8765,
            host: "127.0.0.1".to_string(),
            journey_name: GeneratorOptions::default().journey_name,
        }
    }
}
