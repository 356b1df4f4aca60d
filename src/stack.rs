//! Stack safety for the recursive passes.
//!
//! The parser, resolver and interpreter all recurse once per nesting level
//! of the program they walk.  Wrapping those recursion points in
//! [`ensure_sufficient_stack`] grows the native stack on demand instead of
//! overflowing it on deeply nested input.

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
