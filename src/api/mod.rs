// API module - read-only HTTP view of the routing table

pub mod rest;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct LookupResponse {
    pub destination: String,
    pub next_hop: String,
    pub out_interface: crate::routes::InterfaceId,
    pub matched_route: crate::routes::Route,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
