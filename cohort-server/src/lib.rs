// Library exports for cohort-server, shared by the binary, the migration
// tools and the integration tests

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod demo_store;
pub mod domain_check;
pub mod legacy;
pub mod rate_limit;
pub mod session;
pub mod state;
pub mod video;
