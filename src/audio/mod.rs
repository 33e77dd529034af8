pub mod bucket_mapper;
pub mod config;
pub mod constants;
pub mod dynamics;
pub mod fft_engine;
pub mod sample_buffer_engine;
pub mod spectrum_analyzer;
pub mod window_functions;
