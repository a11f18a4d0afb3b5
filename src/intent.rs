//! Update intents that replace mutually exclusive boolean flags.
//!
//! An invoice has a single `closed` flag on the service, but a request can
//! want to set it, clear it, or leave it alone. Two independent booleans
//! (`closed` and `reopen`) admit a fourth, contradictory state; an enum does not.
//!
//! ```
//! use invoice_kit::intent::CloseIntent;
//!
//! // Leave the flag alone (default)
//! let _i = CloseIntent::NoChange;
//!
//! // Stop further item attachment
//! let _i = CloseIntent::Close;
//!
//! // Accept items again
//! let _i = CloseIntent::Reopen;
//! ```
//!
//! | Intent | Wire | Effect on `closed` |
//! |--------|------|--------------------|
//! | **NoChange** | *(omitted)* | unchanged |
//! | **Close** | `closed=true` | `true` |
//! | **Reopen** | `closed=false` | `false` |
//!
//! Closing and reopening never touch `paid`; the two axes are independent.

use crate::params::Params;

/// Requested change to an invoice's `closed` flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum CloseIntent {
    #[default]
    NoChange,

    /// Close the invoice. No further items are attached to it.
    Close,

    /// Reopen a closed invoice.
    ///
    /// Items removed while it was closed are not attached again.
    Reopen,
}

impl CloseIntent {
    /// Value of the `closed` flag this intent asks for, if any.
    pub fn closed_flag(&self) -> Option<bool> {
        match self {
            CloseIntent::NoChange => None,
            CloseIntent::Close => Some(true),
            CloseIntent::Reopen => Some(false),
        }
    }

    pub(crate) fn append_to(&self, params: &mut Params) {
        params.push_opt("closed", self.closed_flag());
    }
}

impl std::fmt::Display for CloseIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseIntent::NoChange => write!(f, "NoChange"),
            CloseIntent::Close => write!(f, "Close"),
            CloseIntent::Reopen => write!(f, "Reopen"),
        }
    }
}
