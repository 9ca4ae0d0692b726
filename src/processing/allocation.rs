//! Subnet CIDR allocation checks.
//!
//! Every subnet CIDR is validated against the VPC CIDR and against every
//! subnet CIDR accepted before it. Acceptance is first-come-first-served:
//! the accumulator grows one block at a time and later candidates are checked
//! against everything already in it.

use crate::error::CidrError;
use crate::models::CidrBlock;

/// Validate `candidate` for insertion into `container` next to `siblings`.
///
/// Returns the parsed block on success. The caller is responsible for adding
/// it to `siblings` before validating the next candidate; [`CidrAllocator`]
/// does this.
pub fn validate(
    candidate: &str,
    container: &CidrBlock,
    siblings: &[CidrBlock],
) -> Result<CidrBlock, CidrError> {
    let cidr = CidrBlock::new_aws(candidate)?;

    if !container.contains(&cidr) {
        return Err(CidrError::NotContained {
            candidate: cidr.to_string(),
            container: container.to_string(),
        });
    }

    if let Some(existing) = siblings.iter().find(|s| s.overlaps(&cidr)) {
        return Err(CidrError::OverlapsSibling {
            candidate: cidr.to_string(),
            existing: existing.to_string(),
        });
    }

    Ok(cidr)
}

/// Running set of subnet CIDRs accepted into one VPC.
#[derive(Debug, Clone)]
pub struct CidrAllocator {
    container: CidrBlock,
    accepted: Vec<CidrBlock>,
}

impl CidrAllocator {
    pub fn new(container: CidrBlock) -> CidrAllocator {
        CidrAllocator {
            container,
            accepted: Vec::new(),
        }
    }

    /// Blocks accepted so far, in acceptance order.
    pub fn accepted(&self) -> &[CidrBlock] {
        &self.accepted
    }

    /// Check `candidate` without accepting it.
    pub fn check(&self, candidate: &str) -> Result<CidrBlock, CidrError> {
        validate(candidate, &self.container, &self.accepted)
    }

    /// Validate `candidate` and, on success, add it to the accepted set.
    pub fn accept(&mut self, candidate: &str) -> Result<CidrBlock, CidrError> {
        let cidr = self.check(candidate).map_err(|e| {
            log::debug!("rejected subnet CIDR {candidate}: {e}");
            e
        })?;
        self.accepted.push(cidr);
        log::debug!(
            "accepted subnet CIDR {cidr} ({} in {})",
            self.accepted.len(),
            self.container
        );
        Ok(cidr)
    }
}
