pub mod audio_censor;
pub mod censor_plan;
