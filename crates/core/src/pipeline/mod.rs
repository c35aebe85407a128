pub mod censor_video_use_case;
pub mod manifest;
pub mod pipeline_logger;
