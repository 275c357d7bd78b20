use esewa_gateway::EsewaApi;
use konnect_common::Rupees;

/// The confirmation oracle the orchestrator consults before committing a settlement.
///
/// Implementations must be conservative: any outcome other than a positive, well-formed confirmation from the
/// gateway — a decline, a timeout, a transport fault, a garbled body — is `false`. A deal is never advanced on
/// ambiguous evidence; the caller can always re-check later through the same interface.
#[allow(async_fn_in_trait)]
pub trait GatewayVerifier {
    async fn verify(&self, transaction_ref: &str, amount: Rupees) -> bool;
}

impl GatewayVerifier for EsewaApi {
    async fn verify(&self, transaction_ref: &str, amount: Rupees) -> bool {
        EsewaApi::verify(self, transaction_ref, amount).await
    }
}
