//! Fallible allocation helpers.
//!
//! Every heap growth on a mutation or query path goes through here, so that
//! exhaustion surfaces as a [`TryReserveError`] the caller can roll back from
//! instead of aborting the process.

use std::collections::TryReserveError;

/// Make room for one more element, doubling the capacity when full.
pub(crate) fn grow_one<T>(v: &mut Vec<T>) -> Result<(), TryReserveError> {
    if v.len() < v.capacity() {
        return Ok(());
    }
    checkpoint()?;
    let extra = v.capacity().max(1);
    v.try_reserve_exact(extra)
}

pub(crate) fn vec_with_capacity<T>(n: usize) -> Result<Vec<T>, TryReserveError> {
    checkpoint()?;
    let mut v = Vec::new();
    v.try_reserve_exact(n)?;
    Ok(v)
}

pub(crate) fn copy_number(number: &str) -> Result<String, TryReserveError> {
    splice(number, "")
}

/// `head` followed by `tail`, allocated exactly once.
pub(crate) fn splice(head: &str, tail: &str) -> Result<String, TryReserveError> {
    checkpoint()?;
    let mut out = String::new();
    out.try_reserve_exact(head.len() + tail.len())?;
    out.push_str(head);
    out.push_str(tail);
    Ok(out)
}

/// Called once per logical allocation. Always succeeds outside tests.
#[cfg(not(test))]
#[inline(always)]
pub(crate) fn checkpoint() -> Result<(), TryReserveError> {
    Ok(())
}

#[cfg(test)]
pub(crate) fn checkpoint() -> Result<(), TryReserveError> {
    if fault::tick() {
        return Err(fault::exhausted());
    }
    Ok(())
}
