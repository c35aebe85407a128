pub mod speech_recognizer;
pub mod transcript;
