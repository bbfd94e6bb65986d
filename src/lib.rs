pub mod analysis;
pub mod channels;
pub mod classify;
pub mod config;
pub mod db;
pub mod duration;
pub mod model;
pub mod score;
pub mod search;
pub mod service;
pub mod session;
pub mod youtube;
