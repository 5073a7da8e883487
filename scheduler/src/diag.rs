// diag.rs — Unified diagnostics model
//
// Provides the shared diagnostic types used by the frontend phases
// (catalogue collection, DFG building). The scheduling core itself reports
// through `schedule::ScheduleError`, not diagnostics.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use crate::ast::Span;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0100`, `W0200`).
///
/// Codes are `&'static str` constants defined in the `codes` module.
/// Once assigned, a code must never be reassigned to a different semantic
/// meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable diagnostic codes. E-prefixed codes are errors, W-prefixed warnings.
pub mod codes {
    use super::DiagCode;

    /// Statement references an op-kind absent from the catalogue.
    pub const E0100: DiagCode = DiagCode("E0100");
    /// Statement argument names a value no statement defines.
    pub const E0101: DiagCode = DiagCode("E0101");
    /// Value name defined by more than one statement.
    pub const E0102: DiagCode = DiagCode("E0102");
    /// Unknown attribute name on an `op` declaration.
    pub const E0103: DiagCode = DiagCode("E0103");
    /// Attribute value out of range (negative delay, fractional latency, ...).
    pub const E0104: DiagCode = DiagCode("E0104");
    /// Op-kind declared more than once.
    pub const E0105: DiagCode = DiagCode("E0105");
    /// Attribute repeated on one `op` declaration.
    pub const E0106: DiagCode = DiagCode("E0106");
    /// No clock period given by the source or the command line.
    pub const E0107: DiagCode = DiagCode("E0107");

    /// A later `period` declaration shadows an earlier one.
    pub const W0201: DiagCode = DiagCode("W0201");
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A compiler diagnostic emitted by any frontend phase.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with no code or hint.
    pub fn new(level: DiagLevel, span: Span, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            span,
            message: message.into(),
            hint: None,
        }
    }

    /// Attach a stable diagnostic code.
    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        if let Some(code) = &self.code {
            write!(f, "{}[{}]: {}", level, code, self.message)?;
        } else {
            write!(f, "{}: {}", level, self.message)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

/// True if any diagnostic in the slice is error-level.
pub fn has_errors(diags: &[Diagnostic]) -> bool {
    diags.iter().any(|d| d.level == DiagLevel::Error)
}
