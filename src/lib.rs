pub mod audit;
pub mod config;
pub mod conversation;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod geo;
pub mod imaging;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
