// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Feature switches for the post-MVP grammar.
//!
//! Every grammar rule in this crate is keyed by the set of WebAssembly
//! proposals the caller has enabled. The MVP grammar corresponds to the
//! empty set; each flag unlocks a disjoint slice of the encoding space
//! (types, section ids, segment flags, and opcodes).

use bitflags::bitflags;

bitflags! {
    /// An immutable bag of enabled WebAssembly proposals.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct Features: u32 {
        /// Import/export of mutable globals.
        const MUTABLE_GLOBALS = 1 << 0;
        /// Saturating float-to-int conversions (`0xfc` 0..=7).
        const SATURATING_FLOAT_TO_INT = 1 << 1;
        /// Sign-extension operators (`0xc0`..=`0xc4`).
        const SIGN_EXTENSION = 1 << 2;
        /// Multi-value blocks and functions (type-index block types).
        const MULTI_VALUE = 1 << 3;
        /// Reference types (`anyref`/`nullref`, table instructions,
        /// typed `select`, declared element segments).
        const REFERENCE_TYPES = 1 << 4;
        /// Bulk memory and table operations, flag-encoded segments, and
        /// the DataCount section.
        const BULK_MEMORY = 1 << 5;
        /// Tail calls (`return_call`, `return_call_indirect`).
        const TAIL_CALL = 1 << 6;
        /// 128-bit SIMD (`v128` and the `0xfd` opcode space).
        const SIMD = 1 << 7;
        /// Threads: shared limits and the `0xfe` atomic opcode space.
        const THREADS = 1 << 8;
        /// Exception handling: events, `try`/`catch`, and `br_on_exn`.
        const EXCEPTIONS = 1 << 9;
    }
}

impl Features {
    /// The MVP feature set, enabling no proposals.
    pub const MVP: Features = Features::empty();

    // Whether a grammar entry requiring `required` is enabled. An empty
    // requirement means the entry is part of the MVP grammar; a multi-bit
    // requirement is satisfied by any one of its bits.
    pub(crate) fn enables(self, required: Features) -> bool {
        required.is_empty() || self.intersects(required)
    }
}
