pub mod offending_interval;
pub mod segment_localizer;
