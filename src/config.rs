//! Network configuration.
//!
//! `NetConfig` fixes the two-layer topology: vector lengths, batch length,
//! learn rate, per-layer activation, and optional weight file paths. A
//! config is an implicit contract with any weight files it names — the
//! persisted format carries no shape metadata, so loading a file written
//! under a different topology fails at the size check, not here.
//!
//! With the `serde` feature a config round-trips through JSON, validated on
//! load.

use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use std::path::Path;

use crate::activation::Activation;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetConfig {
    /// Length of one input vector.
    pub input_len: usize,
    /// Width of the hidden layer.
    pub hidden_len: usize,
    /// Length of one output vector.
    pub output_len: usize,
    /// Number of input vectors processed per call.
    pub batch_len: usize,
    /// SGD learn rate.
    pub rate: f32,
    pub hidden_activation: Activation,
    pub output_activation: Activation,
    /// Weight file for the hidden layer; `None` keeps the layer in memory.
    pub hidden_weights: Option<PathBuf>,
    /// Weight file for the output layer; `None` keeps the layer in memory.
    pub output_weights: Option<PathBuf>,
}

impl Default for NetConfig {
    /// The MNIST-sized default: 784 inputs, 280 hidden units, 10 outputs,
    /// single-sample batches, ReLU over sigmoid.
    fn default() -> Self {
        Self {
            input_len: 784,
            hidden_len: 280,
            output_len: 10,
            batch_len: 1,
            rate: 0.05,
            hidden_activation: Activation::ReLU,
            output_activation: Activation::Sigmoid,
            hidden_weights: None,
            output_weights: None,
        }
    }
}

impl NetConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("input_len", self.input_len),
            ("hidden_len", self.hidden_len),
            ("output_len", self.output_len),
            ("batch_len", self.batch_len),
        ] {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be > 0")));
            }
        }
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "rate must be finite and > 0, got {}",
                self.rate
            )));
        }
        Ok(())
    }

    #[cfg(feature = "serde")]
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: NetConfig = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    #[cfg(feature = "serde")]
    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::InvalidData(format!("failed to serialize config: {e}")))
    }

    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p).map_err(|source| Error::Io {
            path: p.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&s)
    }

    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let p = path.as_ref();
        std::fs::write(p, self.to_json_string_pretty()?).map_err(|source| Error::Io {
            path: p.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(NetConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_dims_and_bad_rates_are_rejected() {
        let mut cfg = NetConfig::default();
        cfg.hidden_len = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = NetConfig::default();
        cfg.rate = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = NetConfig::default();
        cfg.rate = f32::NAN;
        assert!(cfg.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trips() {
        let cfg = NetConfig {
            input_len: 5,
            hidden_len: 7,
            output_len: 3,
            batch_len: 2,
            rate: 0.1,
            hidden_activation: Activation::Tanh,
            output_activation: Activation::Sigmoid,
            hidden_weights: Some(PathBuf::from("data/hidden.w")),
            output_weights: None,
        };

        let json = cfg.to_json_string_pretty().unwrap();
        let loaded = NetConfig::from_json_str(&json).unwrap();
        assert_eq!(cfg, loaded);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn invalid_json_config_is_rejected_on_load() {
        let json = r#"{
            "input_len": 0, "hidden_len": 1, "output_len": 1, "batch_len": 1,
            "rate": 0.1,
            "hidden_activation": "relu", "output_activation": "sigmoid",
            "hidden_weights": null, "output_weights": null
        }"#;
        assert!(NetConfig::from_json_str(json).is_err());
    }
}
