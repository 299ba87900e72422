// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Structural validation of ticket documents.
//
// Only the document envelope is checked.  Command payloads are opaque here:
// a barcode whose data cannot be encoded under its symbology is rejected by
// the print service, not by this layer.

use tracing::debug;

use crate::document::TicketDocument;
use crate::error::{Result, ValidationError};

/// Check a document for submission.
///
/// Rules run in a fixed order and the first violation is returned:
/// 1. `version` is non-empty
/// 2. `profile.model` is non-empty
/// 3. `commands` is non-empty
pub fn validate(doc: &TicketDocument) -> std::result::Result<(), ValidationError> {
    if doc.version.is_empty() {
        return Err(ValidationError::MissingVersion);
    }
    if doc.profile.model.is_empty() {
        return Err(ValidationError::MissingProfileModel);
    }
    if doc.commands.is_empty() {
        return Err(ValidationError::MissingCommands);
    }
    debug!(commands = doc.commands.len(), "ticket document valid");
    Ok(())
}

/// Parse JSON text and validate the resulting document.
///
/// Malformed JSON surfaces as `TicketError::Serialization`; a well-formed
/// document that breaks a rule surfaces as `TicketError::Validation`.
pub fn parse_and_validate(text: &str) -> Result<TicketDocument> {
    let doc = TicketDocument::from_json(text)?;
    validate(&doc)?;
    Ok(doc)
}
