//! Call disposition codes and their lifecycle outcomes.
//!
//! Every code maps explicitly to exactly one [`CallOutcome`]. Classification
//! never inspects the free-text label, so a future code whose label mentions
//! both confirmation and cancellation still has a single unambiguous outcome.

use super::{OrderDomainError, OrderStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome category of a call attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    /// Customer confirmed the order.
    Confirmed,
    /// Customer cancelled the order.
    Cancelled,
    /// Call did not settle the order; it goes back to the agent queue.
    Retry,
}

impl CallOutcome {
    /// Returns the order status an order moves to for this outcome.
    #[must_use]
    pub const fn resulting_status(self) -> OrderStatus {
        match self {
            Self::Confirmed => OrderStatus::Confirmed,
            Self::Cancelled => OrderStatus::Cancelled,
            Self::Retry => OrderStatus::Assigned,
        }
    }

    /// Returns the tag pushed to the source system for this outcome.
    #[must_use]
    pub const fn sync_tag(self) -> SyncTag {
        match self {
            Self::Confirmed => SyncTag::Confirmed,
            Self::Cancelled => SyncTag::Cancelled,
            Self::Retry => SyncTag::Retry,
        }
    }

    /// Returns whether the outcome settles the order.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Cancelled)
    }
}

/// Tag written back to the originating store after a disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncTag {
    /// `COD-Confirmed`.
    #[serde(rename = "COD-Confirmed")]
    Confirmed,
    /// `COD-Cancelled`.
    #[serde(rename = "COD-Cancelled")]
    Cancelled,
    /// `COD-Retry`.
    #[serde(rename = "COD-Retry")]
    Retry,
}

impl SyncTag {
    /// Returns the tag text as written to the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "COD-Confirmed",
            Self::Cancelled => "COD-Cancelled",
            Self::Retry => "COD-Retry",
        }
    }
}

impl fmt::Display for SyncTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Known disposition codes an agent may record after a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispositionCode {
    /// Confirmed during a phone call.
    ConfirmOnCall,
    /// Confirmed during a `WhatsApp` call.
    ConfirmOnWhatsappCall,
    /// Confirmed by text message.
    ConfirmOnText,
    /// Confirmed by `WhatsApp` text.
    ConfirmOnWhatsappText,
    /// Cancelled during a phone call.
    CancelOnCall,
    /// Cancelled during a `WhatsApp` call.
    CancelOnWhatsappCall,
    /// Cancelled by `WhatsApp` text.
    CancelOnWhatsappText,
    /// Cancelled by text message.
    CancelOnText,
    /// Call rang out unanswered.
    NotReceived,
    /// Line was busy.
    LineBusy,
    /// Call was forwarded.
    CallForwarded,
    /// Incoming calls unavailable for the number.
    IncomingNotAvailable,
    /// Customer declined the call.
    CallDeclined,
    /// Agent and customer could not communicate.
    LanguageBarrier,
    /// Call could not be connected.
    CallNotConnected,
    /// Message was seen but not answered.
    SeenNoReply,
    /// Message was not delivered.
    Undelivered,
    /// The number has no `WhatsApp` account.
    NumberNotOnWhatsapp,
}

impl DispositionCode {
    /// All known codes in presentation order.
    pub const ALL: [Self; 18] = [
        Self::ConfirmOnCall,
        Self::ConfirmOnWhatsappCall,
        Self::ConfirmOnText,
        Self::ConfirmOnWhatsappText,
        Self::CancelOnCall,
        Self::CancelOnWhatsappCall,
        Self::CancelOnWhatsappText,
        Self::CancelOnText,
        Self::NotReceived,
        Self::LineBusy,
        Self::CallForwarded,
        Self::IncomingNotAvailable,
        Self::CallDeclined,
        Self::LanguageBarrier,
        Self::CallNotConnected,
        Self::SeenNoReply,
        Self::Undelivered,
        Self::NumberNotOnWhatsapp,
    ];

    /// Returns the canonical label recorded as the order's final status.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ConfirmOnCall => "Confirm on Call",
            Self::ConfirmOnWhatsappCall => "Confirm on WhatsApp Call",
            Self::ConfirmOnText => "Confirm on Text",
            Self::ConfirmOnWhatsappText => "Confirm on WhatsApp Text",
            Self::CancelOnCall => "Cancel on Call",
            Self::CancelOnWhatsappCall => "Cancel on WhatsApp Call",
            Self::CancelOnWhatsappText => "Cancel on WhatsApp Text",
            Self::CancelOnText => "Cancel on Text",
            Self::NotReceived => "Not Received",
            Self::LineBusy => "Line Busy",
            Self::CallForwarded => "Call Forwarded",
            Self::IncomingNotAvailable => "Incoming Not Available",
            Self::CallDeclined => "Call Declined",
            Self::LanguageBarrier => "Language Barrier",
            Self::CallNotConnected => "Call Not Connected",
            Self::SeenNoReply => "Seen No Reply",
            Self::Undelivered => "Undelivered",
            Self::NumberNotOnWhatsapp => "Number Not on WhatsApp",
        }
    }

    /// Returns the outcome category of this code.
    #[must_use]
    pub const fn outcome(self) -> CallOutcome {
        match self {
            Self::ConfirmOnCall
            | Self::ConfirmOnWhatsappCall
            | Self::ConfirmOnText
            | Self::ConfirmOnWhatsappText => CallOutcome::Confirmed,
            Self::CancelOnCall
            | Self::CancelOnWhatsappCall
            | Self::CancelOnWhatsappText
            | Self::CancelOnText => CallOutcome::Cancelled,
            Self::NotReceived
            | Self::LineBusy
            | Self::CallForwarded
            | Self::IncomingNotAvailable
            | Self::CallDeclined
            | Self::LanguageBarrier
            | Self::CallNotConnected
            | Self::SeenNoReply
            | Self::Undelivered
            | Self::NumberNotOnWhatsapp => CallOutcome::Retry,
        }
    }
}

impl fmt::Display for DispositionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<&str> for DispositionCode {
    type Error = OrderDomainError;

    /// Matches a label case-insensitively, ignoring surrounding and repeated
    /// whitespace.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = normalize_label(value);
        Self::ALL
            .into_iter()
            .find(|code| code.label().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| OrderDomainError::InvalidDisposition(value.to_owned()))
    }
}

fn normalize_label(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
