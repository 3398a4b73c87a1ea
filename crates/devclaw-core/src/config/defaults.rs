//! Default values shared by the config structs.

pub const DEFAULT_MAX_RESULTS: usize = 6;
pub const DEFAULT_MIN_SCORE: f64 = 0.1;
pub const DEFAULT_VECTOR_WEIGHT: f64 = 0.7;
pub const DEFAULT_KEYWORD_WEIGHT: f64 = 0.3;
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 30.0;
pub const DEFAULT_MMR_LAMBDA: f64 = 0.7;
pub const DEFAULT_CACHE_KEEP_ENTRIES: usize = 10_000;

pub const DEFAULT_EXEC_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 64 * 1024;
pub const DEFAULT_CONTAINER_IMAGE: &str = "python:3.12-slim";

pub const DEFAULT_EMBED_HTTP_TIMEOUT_SECS: u64 = 30;
