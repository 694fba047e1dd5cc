//! gRPC front end of the credential authentication service

pub mod config;
pub mod envelope;
pub mod mapper;
pub mod proto_stub;
pub mod purge;
pub mod service;
