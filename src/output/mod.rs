mod report;

pub use report::write_creation_report;
