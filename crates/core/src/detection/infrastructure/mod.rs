pub mod onnx_abuse_classifier;
pub mod score_cache;
