//! Engine configuration files
//!
//! An [`EngineConfig`] is stored as JSON; every field is optional and falls
//! back to its default.
//!
//! ```json
//! {
//!   "mode": "weighted_euclidean_distance",
//!   "page_size": 10,
//!   "scales": { "smoke": "match" },
//!   "default_weights": { "gestation": 2.0, "parity": 1.0, "age": 1.0,
//!                        "height": 1.0, "weight": 1.0, "smoke": 1.0 }
//! }
//! ```

use casebase_core::Result;
use casebase_similarity::EngineConfig;
use std::path::Path;
use tracing::info;

/// Read, parse and validate an engine configuration file
pub fn load_engine_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&text)?;
    config.validate()?;
    info!("Loaded engine config from {:?} (mode: {})", path, config.mode);
    Ok(config)
}
