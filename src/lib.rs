//! Reelpress - upload, probe, and re-encode media with ffmpeg
//!
//! A small web service that accepts an audio or video upload, checks it for a
//! video stream with ffprobe, runs ffmpeg (optionally burning in a portrait
//! caption overlay and writing container tags), and offers the result for
//! download.

pub mod cli;
pub mod config;
pub mod error;
pub mod janitor;
pub mod media;
pub mod storage;
pub mod upload;
pub mod web;
pub mod workflow;
