pub mod abuse_classifier;
pub mod detection_result;
pub mod keyword_matcher;
pub mod text_normalizer;
