//! Debayering module for converting Bayer pattern frames to RGB

pub mod cpu_debayer;

pub use cpu_debayer::CpuDebayer;
