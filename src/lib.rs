//! 认证服务库
//! 提供用户注册、凭证校验与 JWT 签发/验证能力

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
