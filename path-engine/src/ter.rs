//! Transaction result codes
//!
//! Every calculation ends in exactly one [`Ter`]. Codes fall into classes
//! that tell the caller what to do next:
//!
//! - `tes` success: apply the view
//! - `tel`/`ter` retryable: nothing applied, try again on a later ledger
//! - `tem` malformed: the request itself is wrong, never retry
//! - `tec` claimed: the payment failed but the fee is still charged
//! - `tef` fatal: an internal invariant broke

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result class of a [`Ter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResultClass {
    /// Payment applied
    Success,
    /// Local or retryable failure
    Retryable,
    /// Malformed request
    Malformed,
    /// Failed, fee claimed
    Claimed,
    /// Internal failure
    Fatal,
}

impl ResultClass {
    /// Label used in metrics
    pub fn label(&self) -> &'static str {
        match self {
            ResultClass::Success => "success",
            ResultClass::Retryable => "retryable",
            ResultClass::Malformed => "malformed",
            ResultClass::Claimed => "claimed",
            ResultClass::Fatal => "fatal",
        }
    }
}

/// Transaction result code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ter {
    /// Payment delivered (fully, or partially when allowed)
    Success,

    /// Pass ceiling reached on an open ledger
    TelFailedProcessing,

    /// Non-positive amount
    TemBadAmount,
    /// Structurally invalid path
    TemBadPath,
    /// Path revisits an account or book
    TemBadPathLoop,
    /// Native to native needs no path engine
    TemBadSendNative,
    /// No paths and the default path is disallowed
    TemPathsEmpty,
    /// Path state could not be created
    TemUnknown,

    /// Delivered more than requested
    TefException,
    /// Ledger access failed mid-calculation
    TefInternal,
    /// Ledger contents contradict themselves
    TefBadLedger,

    /// Account on the path does not exist
    TerNoAccount,
    /// Trust line on the path does not exist or is frozen
    TerNoLine,
    /// Intermediate account refuses to ripple
    TerNoRipple,

    /// Could not deliver the full amount and partial payment is disallowed
    TecPathPartial,
    /// No liquidity at all
    TecPathDry,
    /// Pass ceiling reached on a closed ledger
    TecFailedProcessing,
}

impl Ter {
    /// Class of this code
    pub fn class(&self) -> ResultClass {
        match self {
            Ter::Success => ResultClass::Success,
            Ter::TelFailedProcessing | Ter::TerNoAccount | Ter::TerNoLine | Ter::TerNoRipple => {
                ResultClass::Retryable
            }
            Ter::TemBadAmount
            | Ter::TemBadPath
            | Ter::TemBadPathLoop
            | Ter::TemBadSendNative
            | Ter::TemPathsEmpty
            | Ter::TemUnknown => ResultClass::Malformed,
            Ter::TecPathPartial | Ter::TecPathDry | Ter::TecFailedProcessing => {
                ResultClass::Claimed
            }
            Ter::TefException | Ter::TefInternal | Ter::TefBadLedger => ResultClass::Fatal,
        }
    }

    /// Stable token
    pub fn token(&self) -> &'static str {
        match self {
            Ter::Success => "tesSUCCESS",
            Ter::TelFailedProcessing => "telFAILED_PROCESSING",
            Ter::TemBadAmount => "temBAD_AMOUNT",
            Ter::TemBadPath => "temBAD_PATH",
            Ter::TemBadPathLoop => "temBAD_PATH_LOOP",
            Ter::TemBadSendNative => "temBAD_SEND_NATIVE",
            Ter::TemPathsEmpty => "temPATHS_EMPTY",
            Ter::TemUnknown => "temUNKNOWN",
            Ter::TefException => "tefEXCEPTION",
            Ter::TefInternal => "tefINTERNAL",
            Ter::TefBadLedger => "tefBAD_LEDGER",
            Ter::TerNoAccount => "terNO_ACCOUNT",
            Ter::TerNoLine => "terNO_LINE",
            Ter::TerNoRipple => "terNO_RIPPLE",
            Ter::TecPathPartial => "tecPATH_PARTIAL",
            Ter::TecPathDry => "tecPATH_DRY",
            Ter::TecFailedProcessing => "tecFAILED_PROCESSING",
        }
    }

    /// True for `tesSUCCESS`
    pub fn is_success(&self) -> bool {
        matches!(self, Ter::Success)
    }

    /// True for `tem` codes
    pub fn is_malformed(&self) -> bool {
        self.class() == ResultClass::Malformed
    }

    /// True for `tef` codes
    pub fn is_fatal(&self) -> bool {
        self.class() == ResultClass::Fatal
    }
}

impl fmt::Display for Ter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl From<ledger_core::Error> for Ter {
    fn from(err: ledger_core::Error) -> Self {
        tracing::error!("Ledger access failed during path calculation: {}", err);
        Ter::TefInternal
    }
}
