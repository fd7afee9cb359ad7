use std::path::PathBuf;

pub fn default_version() -> u32 {
    1
}

pub fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

pub fn default_max_score() -> f64 {
    100.0
}

pub fn default_max_attempts() -> u32 {
    3
}

pub fn default_backoff_base_ms() -> u64 {
    200
}
