pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod entity;
pub mod repository;
pub mod service;
