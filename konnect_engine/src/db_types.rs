use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use konnect_common::Rupees;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Error)]
#[error("Invalid identifier: {0}")]
pub struct IdParseError(String);

//--------------------------------------       DealId        ---------------------------------------------------------
/// Identifier of a deal. Freshly minted ids are v4 UUIDs; parsing validates the UUID form so that arbitrary
/// strings from path parameters or gateway payloads never reach the database as lookup keys.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct DealId(pub String);

impl DealId {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DealId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Uuid::parse_str(s).map_err(|e| IdParseError(format!("{s} is not a valid deal id. {e}")))?;
        Ok(Self(id.to_string()))
    }
}

impl Display for DealId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------      PaymentId       ---------------------------------------------------------
/// Identifier of a payment attempt. It doubles as the gateway's `transaction_uuid` correlation token, so it must
/// be globally unique and unguessable; a v4 UUID covers both. Parsing validates the UUID form, which is what lets
/// the callback path silently discard probes with fabricated transaction references.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct PaymentId(pub String);

impl PaymentId {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PaymentId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Uuid::parse_str(s).map_err(|e| IdParseError(format!("{s} is not a valid payment id. {e}")))?;
        Ok(Self(id.to_string()))
    }
}

impl Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------      DealStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DealStatus {
    /// The deal has been proposed and awaits the creator's acceptance.
    Pending,
    /// The creator has accepted; the business has not yet funded escrow.
    Accepted,
    /// Escrow is funded and the creator is producing content.
    InProgress,
    /// The creator has submitted content for review.
    ContentSubmitted,
    /// The business has asked for changes.
    RevisionRequested,
    /// The business has approved the submitted content.
    Approved,
    /// Escrow release to the creator is underway.
    PaymentPending,
    /// The collaboration is finished. Terminal.
    Completed,
    /// The deal was called off before completion. Terminal.
    Cancelled,
    /// Either party has raised a dispute; resolution happens outside this system.
    Disputed,
}

impl DealStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DealStatus::Completed | DealStatus::Cancelled)
    }

    /// Legality table for the general status-update path. The edge into `InProgress` is deliberately absent:
    /// it exists only on the settlement path, so no caller can self-declare payment receipt.
    pub fn can_transition_to(&self, next: DealStatus) -> bool {
        use DealStatus::*;
        if *self == next {
            return false;
        }
        match (*self, next) {
            (from, Disputed) => !from.is_terminal(),
            (Pending, Accepted | Cancelled) => true,
            (Accepted, Cancelled) => true,
            (InProgress, ContentSubmitted | Cancelled) => true,
            (ContentSubmitted, RevisionRequested | Approved) => true,
            (RevisionRequested, ContentSubmitted | Cancelled) => true,
            (Approved, PaymentPending | Completed) => true,
            (PaymentPending, Completed) => true,
            (_, _) => false,
        }
    }

    /// Whether a confirmed escrow payment may move this deal into `InProgress`.
    pub fn awaits_payment(&self) -> bool {
        matches!(self, DealStatus::Pending | DealStatus::Accepted)
    }
}

impl Display for DealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DealStatus::Pending => "Pending",
            DealStatus::Accepted => "Accepted",
            DealStatus::InProgress => "InProgress",
            DealStatus::ContentSubmitted => "ContentSubmitted",
            DealStatus::RevisionRequested => "RevisionRequested",
            DealStatus::Approved => "Approved",
            DealStatus::PaymentPending => "PaymentPending",
            DealStatus::Completed => "Completed",
            DealStatus::Cancelled => "Cancelled",
            DealStatus::Disputed => "Disputed",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for DealStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Accepted" => Ok(Self::Accepted),
            "InProgress" => Ok(Self::InProgress),
            "ContentSubmitted" => Ok(Self::ContentSubmitted),
            "RevisionRequested" => Ok(Self::RevisionRequested),
            "Approved" => Ok(Self::Approved),
            "PaymentPending" => Ok(Self::PaymentPending),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            "Disputed" => Ok(Self::Disputed),
            s => Err(StatusConversionError(format!("Invalid deal status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Created, awaiting the gateway's outcome. The only status the settlement edges accept.
    Pending,
    /// The gateway confirmed receipt; funds are held in escrow.
    Escrow,
    /// Escrow has been paid out to the creator.
    Released,
    /// Escrow has been returned to the business.
    Refunded,
    /// The gateway declined, the user abandoned the attempt, or verification failed.
    Failed,
}

impl PaymentStatus {
    /// Whether this payment ever cleared into escrow. Rows in these states carry `paid_at` and a gateway
    /// reference.
    pub fn has_cleared_escrow(&self) -> bool {
        matches!(self, PaymentStatus::Escrow | PaymentStatus::Released | PaymentStatus::Refunded)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Escrow => "Escrow",
            PaymentStatus::Released => "Released",
            PaymentStatus::Refunded => "Refunded",
            PaymentStatus::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PaymentStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Escrow" => Ok(Self::Escrow),
            "Released" => Ok(Self::Released),
            "Refunded" => Ok(Self::Refunded),
            "Failed" => Ok(Self::Failed),
            s => Err(StatusConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------        Deal         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    /// The campaign this deal was struck under. Campaigns live in an external service; the reference is opaque
    /// here and immutable after creation.
    pub campaign_id: String,
    pub creator_id: String,
    pub business_id: String,
    pub agreed_price: Rupees,
    pub status: DealStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set exactly once, when the deal reaches `Completed`.
    pub completed_at: Option<DateTime<Utc>>,
}

//--------------------------------------       NewDeal       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewDeal {
    pub campaign_id: String,
    pub creator_id: String,
    pub business_id: String,
    pub agreed_price: Rupees,
    pub notes: Option<String>,
}

impl NewDeal {
    pub fn new<S: Into<String>>(campaign_id: S, creator_id: S, business_id: S, agreed_price: Rupees) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            creator_id: creator_id.into(),
            business_id: business_id.into(),
            agreed_price,
            notes: None,
        }
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

//--------------------------------------       Payment       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    /// Also the gateway's `transaction_uuid` for this attempt.
    pub id: PaymentId,
    pub deal_id: DealId,
    pub amount: Rupees,
    pub status: PaymentStatus,
    /// The gateway's transaction code, recorded only when the gateway confirms completion.
    pub esewa_ref_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set exactly once, when the payment reaches `Escrow`.
    pub paid_at: Option<DateTime<Utc>>,
}

//--------------------------------------      NewPayment      ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub deal_id: DealId,
    pub amount: Rupees,
}

impl NewPayment {
    pub fn new(deal_id: DealId, amount: Rupees) -> Self {
        Self { deal_id, amount }
    }
}
