//! PRI token computation.

use super::FormatError;

/// Render the PRI token placed between `<` and `>`.
///
/// Kernel facility messages keep a leading zero marker: a zero priority with
/// a non-zero severity renders as `0` followed by the severity. Everything
/// else follows RFC 5424, `priority * 8 + severity`.
pub fn pri_token(priority: u64, severity: u64) -> Result<String, FormatError> {
    match (priority, severity) {
        (0, 0) => Ok("0".to_owned()),
        (0, sev) => Ok(format!("0{sev}")),
        (pri, sev) => pri
            .checked_mul(8)
            .and_then(|scaled| scaled.checked_add(sev))
            .map(|value| value.to_string())
            .ok_or(FormatError::PriorityOverflow {
                priority: pri,
                severity: sev,
            }),
    }
}
