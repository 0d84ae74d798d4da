pub mod assignment;
pub mod booking;
pub mod event;
pub mod handler;
pub mod review;
pub mod service;
