mod deal_flow_api;
mod escrow_api;

pub use deal_flow_api::DealFlowApi;
pub use escrow_api::EscrowApi;
