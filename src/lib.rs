//! scenecut
//!
//! Ingests an uploaded video, samples it into a timestamped snapshot
//! timeline, segments the timeline into fixed-length scenes, and selects
//! representative keyframes per scene for downstream description.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod services;
