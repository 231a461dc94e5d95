// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! WebAssembly binary format decoding.
//!
//! Decoding is *reporting*, not failing: every read returns an
//! `Option<Located<T>>`, and a failed read pushes a [`DecodeError`] into
//! the caller's [`Errors`] sink, carrying the offending offset, the error,
//! and the stack of contextual labels active at the time. Containers keep
//! decoding their remaining siblings, so one corrupt entry does not blind
//! downstream consumers.
//!
//! A module is decoded lazily: [`read_module`] yields raw sections, and
//! each known section's payload parses on demand into a count-prefixed
//! [`LazySequence`] of typed entries.

mod expr;
mod leb128;
mod name;
mod read_impls;

pub use expr::{InstructionIter, expression_instructions, read_expression, read_instruction};
pub use name::{
    NameSectionIter, read_function_names, read_local_names, read_module_name, read_name_section,
};

use core::fmt;
use core::marker::PhantomData;
use std::borrow::Cow;

use thiserror::Error;

use crate::Features;
use crate::located::Located;
use crate::types::{KnownSection, Name, Opcode, Section, Start};

/// A decoding failure.
///
/// The display strings are the diagnostics surfaced to users; they embed
/// the offending values the way the format's tooling conventionally prints
/// them (decimal for enum bytes and opcodes, hex for LEB terminal bytes).
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    #[error("Unable to read u8")]
    ReadU8,
    #[error("Unable to read {0} bytes")]
    ReadBytes(usize),
    #[error("Length extends past end: {length} > {remaining}")]
    LengthPastEnd { length: u32, remaining: usize },
    #[error("Count extends past end: {count} > {remaining}")]
    CountPastEnd { count: u32, remaining: usize },
    #[error("Last byte of {kind} must be zero extension: expected {expected:#x}, got {got:#x}")]
    UnsignedLebExtension {
        kind: &'static str,
        expected: u8,
        got: u8,
    },
    #[error(
        "Last byte of {kind} must be sign extension: expected {positive:#x} or {negative:#x}, got {got:#x}"
    )]
    SignedLebExtension {
        kind: &'static str,
        positive: u8,
        negative: u8,
        got: u8,
    },
    #[error("Unknown value type: {0}")]
    UnknownValueType(u8),
    #[error("Unknown element type: {0}")]
    UnknownElementType(u8),
    #[error("Unknown external kind: {0}")]
    UnknownExternalKind(u8),
    #[error("Unknown mutability: {0}")]
    UnknownMutability(u8),
    #[error("Unknown block type: {0}")]
    UnknownBlockType(i64),
    #[error("Unknown section id: {0}")]
    UnknownSectionId(u32),
    #[error("Unknown name subsection id: {0}")]
    UnknownNameSubsectionId(u8),
    #[error("Unknown type form: {0}")]
    UnknownTypeForm(u8),
    #[error("Unknown event attribute: {0}")]
    UnknownEventAttribute(u32),
    #[error("Unknown flags value: {0}")]
    UnknownLimitsFlags(u8),
    #[error("Unknown flags: {0}")]
    UnknownSegmentFlags(u32),
    #[error("Unknown opcode: {0}")]
    UnknownOpcode(u8),
    #[error("Unknown opcode: {prefix} {code}")]
    UnknownPrefixedOpcode { prefix: u8, code: u32 },
    #[error("Expected reserved byte 0, got {0}")]
    ReservedMismatch(u8),
    #[error("Illegal instruction in constant expression: {0}")]
    IllegalConstantInstruction(Opcode),
    #[error("Illegal instruction in element expression: {0}")]
    IllegalElementInstruction(Opcode),
    #[error("Expected end instruction")]
    ExpectedEnd,
    #[error("Magic mismatch: expected [0, 97, 115, 109], got {0:?}")]
    MagicMismatch([u8; 4]),
    #[error("Version mismatch: expected 1, got {0}")]
    VersionMismatch(u32),
    #[error("Invalid UTF-8 encoding")]
    InvalidUtf8,
}

/// One frame of decoding context: what was being decoded, and the offset
/// where that decoding started.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ContextFrame {
    pub offset: usize,
    pub label: &'static str,
}

/// A reported decoding failure with its context stack (outermost first).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodeError {
    /// The absolute byte offset where decoding stopped.
    pub offset: usize,
    pub error: Error,
    pub context: Vec<ContextFrame>,
}

impl DecodeError {
    /// The full trace as `(offset, text)` pairs: each context frame in
    /// order, then the error itself.
    pub fn trace(&self) -> Vec<(usize, String)> {
        self.context
            .iter()
            .map(|frame| (frame.offset, frame.label.to_string()))
            .chain(core::iter::once((self.offset, self.error.to_string())))
            .collect()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}: {}", self.offset, self.error)?;
        for (depth, frame) in self.context.iter().enumerate() {
            write!(f, "\n{:#x}: ", frame.offset)?;
            for _ in 0..depth {
                write!(f, "  ")?;
            }
            write!(f, "{}", frame.label)?;
        }
        Ok(())
    }
}

/// The sink decoding errors are pushed into.
///
/// The context stack mirrors the decoder's call nesting; each reported
/// error snapshots the live stack.
pub trait Errors {
    fn push_context(&mut self, offset: usize, label: &'static str);
    fn pop_context(&mut self);
    fn report(&mut self, offset: usize, error: Error);
}

/// A [`Vec`]-backed error sink, recording errors in the order they occur.
#[derive(Debug, Default)]
pub struct ErrorLog {
    stack: Vec<ContextFrame>,
    errors: Vec<DecodeError>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &[DecodeError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<DecodeError> {
        self.errors
    }
}

impl Errors for ErrorLog {
    fn push_context(&mut self, offset: usize, label: &'static str) {
        self.stack.push(ContextFrame { offset, label });
    }

    fn pop_context(&mut self) {
        debug_assert!(!self.stack.is_empty());
        self.stack.pop();
    }

    fn report(&mut self, offset: usize, error: Error) {
        self.errors.push(DecodeError {
            offset,
            error,
            context: self.stack.clone(),
        });
    }
}

/// The state threaded through every read: the enabled features and the
/// error sink.
#[derive(Debug)]
pub struct ReadContext<'e, E: Errors> {
    pub features: Features,
    pub errors: &'e mut E,
}

impl<'e, E: Errors> ReadContext<'e, E> {
    pub fn new(features: Features, errors: &'e mut E) -> Self {
        Self { features, errors }
    }

    pub(crate) fn report(&mut self, offset: usize, error: Error) {
        self.errors.report(offset, error);
    }
}

/// An advance-and-consume view over the input buffer.
///
/// Sub-slices (section payloads, code bodies) share the underlying buffer
/// coordinates, so positions and spans are always absolute offsets into
/// the originally decoded input.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    data: &'a [u8],
    origin: usize,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// A cursor over the start of a buffer.
    pub fn new(data: &'a [u8]) -> Self {
        Self::at(data, 0)
    }

    /// A cursor over a sub-slice that begins at the given absolute offset.
    pub fn at(data: &'a [u8], origin: usize) -> Self {
        Self {
            data,
            origin,
            pos: 0,
        }
    }

    /// The current absolute byte offset.
    pub fn pos(&self) -> usize {
        self.origin + self.pos
    }

    /// The number of bytes left in this cursor's window.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The next byte, without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub(crate) fn read_u8<E: Errors>(&mut self, ctx: &mut ReadContext<'_, E>) -> Option<u8> {
        if self.pos < self.data.len() {
            let byte = self.data[self.pos];
            self.pos += 1;
            Some(byte)
        } else {
            ctx.report(self.pos(), Error::ReadU8);
            None
        }
    }

    pub(crate) fn read_array<const N: usize, E: Errors>(
        &mut self,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<[u8; N]> {
        if self.remaining() < N {
            ctx.report(self.pos(), Error::ReadBytes(N));
            return None;
        }
        let bytes = self.data[self.pos..self.pos + N].try_into().unwrap();
        self.pos += N;
        Some(bytes)
    }

    // Consumes `len` bytes. The caller must have checked `len` against
    // `remaining()` (read_length does).
    pub(crate) fn take(&mut self, len: usize) -> &'a [u8] {
        debug_assert!(len <= self.remaining());
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        slice
    }

    pub(crate) fn take_rest(&mut self) -> &'a [u8] {
        self.take(self.remaining())
    }

    // The bytes between two absolute offsets previously visited by this
    // cursor.
    pub(crate) fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        &self.data[start - self.origin..end - self.origin]
    }
}

// The read-with-span combinator: pushes a context frame, runs the read,
// pops the frame, and wraps a successful value with the consumed span.
pub(crate) fn read_guarded<'a, T, E, F>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
    label: &'static str,
    f: F,
) -> Option<Located<T>>
where
    E: Errors,
    F: FnOnce(&mut Cursor<'a>, &mut ReadContext<'_, E>) -> Option<T>,
{
    let start = cursor.pos();
    ctx.errors.push_context(start, label);
    let value = f(cursor, ctx);
    ctx.errors.pop_context();
    value.map(|value| Located::new(start..cursor.pos(), value))
}

pub(crate) fn read_u32<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<Located<u32>> {
    read_guarded(cursor, ctx, "u32", leb128::read)
}

pub(crate) fn read_s32<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<Located<i32>> {
    read_guarded(cursor, ctx, "s32", leb128::read)
}

pub(crate) fn read_s64<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<Located<i64>> {
    read_guarded(cursor, ctx, "s64", leb128::read)
}

pub(crate) fn read_f32<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<Located<f32>> {
    read_guarded(cursor, ctx, "f32", |cursor, ctx| {
        cursor.read_array::<4, E>(ctx).map(f32::from_le_bytes)
    })
}

pub(crate) fn read_f64<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<Located<f64>> {
    read_guarded(cursor, ctx, "f64", |cursor, ctx| {
        cursor.read_array::<8, E>(ctx).map(f64::from_le_bytes)
    })
}

// An index read: a bare u32 LEB under a caller-supplied label ("type
// index", "table index", ...).
pub(crate) fn read_index<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
    label: &'static str,
) -> Option<Located<u32>> {
    read_guarded(cursor, ctx, label, leb128::read)
}

// A vector-element count: a u32 that must not exceed the remaining bytes
// (each element takes at least one).
pub(crate) fn read_count<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<Located<u32>> {
    let count = read_guarded(cursor, ctx, "count", leb128::read)?;
    if *count as usize > cursor.remaining() {
        ctx.report(
            cursor.pos(),
            Error::CountPastEnd {
                count: *count,
                remaining: cursor.remaining(),
            },
        );
        return None;
    }
    Some(count)
}

// A byte length: a u32 that must not exceed the remaining bytes.
pub(crate) fn read_length<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<Located<u32>> {
    let length = read_guarded(cursor, ctx, "length", leb128::read)?;
    if *length as usize > cursor.remaining() {
        ctx.report(
            cursor.pos(),
            Error::LengthPastEnd {
                length: *length,
                remaining: cursor.remaining(),
            },
        );
        return None;
    }
    Some(length)
}

// A length-prefixed UTF-8 string. The resulting span covers the length
// prefix as well as the contents.
pub(crate) fn read_string<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
    label: &'static str,
) -> Option<Located<Name<'a>>> {
    read_guarded(cursor, ctx, label, |cursor, ctx| {
        let length = read_length(cursor, ctx)?;
        let start = cursor.pos();
        let bytes = cursor.take(*length as usize);
        match core::str::from_utf8(bytes) {
            Ok(name) => Some(Cow::Borrowed(name)),
            Err(_) => {
                ctx.report(start, Error::InvalidUtf8);
                None
            }
        }
    })
}

// A length-prefixed byte slice. The resulting span covers the length
// prefix as well as the contents.
pub(crate) fn read_byte_slice<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<Located<&'a [u8]>> {
    let start = cursor.pos();
    let length = read_length(cursor, ctx)?;
    let bytes = cursor.take(*length as usize);
    Some(Located::new(start..cursor.pos(), bytes))
}

/// A type that can be decoded from the binary format.
pub trait Read<'a>: Sized {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>>;
}

// An eagerly-read vector: count, then that many elements.
pub(crate) fn read_vector<'a, T, E>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
    label: &'static str,
) -> Option<Located<Vec<Located<T>>>>
where
    T: Read<'a>,
    E: Errors,
{
    read_guarded(cursor, ctx, label, |cursor, ctx| {
        let count = read_count(cursor, ctx)?;
        let mut items = Vec::with_capacity(*count as usize);
        for _ in 0..*count {
            items.push(T::read(cursor, ctx)?);
        }
        Some(items)
    })
}

/// A lazily-decoded, count-prefixed sequence of section entries.
///
/// The sequence holds the payload slice and its own cursor, so iteration
/// can be restarted by constructing a fresh sequence from the same
/// section. Iteration fuses on the first failed entry; the error is in
/// the sink.
pub struct LazySequence<'a, 'e, T, E: Errors> {
    cursor: Cursor<'a>,
    ctx: ReadContext<'e, E>,
    count: Option<Located<u32>>,
    remaining: u32,
    _entry: PhantomData<T>,
}

impl<'a, 'e, T, E: Errors> LazySequence<'a, 'e, T, E> {
    fn new(mut cursor: Cursor<'a>, mut ctx: ReadContext<'e, E>) -> Self {
        let count = read_count(&mut cursor, &mut ctx);
        let remaining = count.as_ref().map_or(0, |count| **count);
        Self {
            cursor,
            ctx,
            count,
            remaining,
            _entry: PhantomData,
        }
    }

    /// The declared entry count, if it decoded.
    pub fn count(&self) -> Option<Located<u32>> {
        self.count.clone()
    }
}

impl<'a, T, E> Iterator for LazySequence<'a, '_, T, E>
where
    T: Read<'a>,
    E: Errors,
{
    type Item = Located<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match T::read(&mut self.cursor, &mut self.ctx) {
            Some(entry) => {
                self.remaining -= 1;
                Some(entry)
            }
            None => {
                self.remaining = 0;
                None
            }
        }
    }
}

/// A lazy, restartable walk over a module's sections.
///
/// The 8-byte header is checked up front; each call to `next` then frames
/// one section. A framing failure ends iteration (the raw stream can no
/// longer be followed), but a parse failure *inside* a section payload
/// does not affect its siblings.
pub struct LazyModule<'a, 'e, E: Errors> {
    cursor: Cursor<'a>,
    ctx: ReadContext<'e, E>,
    failed: bool,
}

impl<'a, E: Errors> Iterator for LazyModule<'a, '_, E> {
    type Item = Located<Section<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor.is_empty() {
            return None;
        }
        match Section::read(&mut self.cursor, &mut self.ctx) {
            Some(section) => {
                match section.value() {
                    Section::Known(known) => {
                        tracing::trace!(id = ?known.id.value(), size = known.data.len(), "section");
                    }
                    Section::Custom(custom) => {
                        tracing::trace!(name = %custom.name.value(), size = custom.data.len(), "custom section");
                    }
                }
                Some(section)
            }
            None => {
                self.failed = true;
                None
            }
        }
    }
}

/// Begins decoding a module: checks the magic/version header and returns
/// a lazy section walk. Header errors land in the sink and yield an empty
/// walk.
pub fn read_module<'a, 'e, E: Errors>(
    data: &'a [u8],
    features: Features,
    errors: &'e mut E,
) -> LazyModule<'a, 'e, E> {
    let mut cursor = Cursor::new(data);
    let mut ctx = ReadContext::new(features, errors);
    let header = read_header(&mut cursor, &mut ctx);
    LazyModule {
        cursor,
        ctx,
        failed: header.is_none(),
    }
}

fn read_header<E: Errors>(cursor: &mut Cursor<'_>, ctx: &mut ReadContext<'_, E>) -> Option<()> {
    read_guarded(cursor, ctx, "magic", |cursor, ctx| {
        let bytes = cursor.read_array::<4, E>(ctx)?;
        if bytes == *b"\0asm" {
            Some(())
        } else {
            ctx.report(cursor.pos(), Error::MagicMismatch(bytes));
            None
        }
    })?;
    read_guarded(cursor, ctx, "version", |cursor, ctx| {
        let version = u32::from_le_bytes(cursor.read_array::<4, E>(ctx)?);
        if version == 1 {
            Some(())
        } else {
            ctx.report(cursor.pos(), Error::VersionMismatch(version));
            None
        }
    })?;
    Some(())
}

/// Decodes a known section's payload as a lazy sequence of entries.
///
/// The entry type is chosen by the caller to match the section id:
/// [`crate::types::TypeEntry`] for Type, [`crate::types::Import`] for
/// Import, [`crate::types::Function`] for Function, and so on. The Start
/// and DataCount sections are not vector-framed; use
/// [`read_start_section`] and [`read_data_count_section`] instead.
pub fn read_section_entries<'a, 'e, T, E>(
    section: &KnownSection<'a>,
    features: Features,
    errors: &'e mut E,
) -> LazySequence<'a, 'e, T, E>
where
    T: Read<'a>,
    E: Errors,
{
    let cursor = Cursor::at(section.data.value(), section.data.span().start);
    LazySequence::new(cursor, ReadContext::new(features, errors))
}

/// Decodes the start section's payload: a single function index.
pub fn read_start_section<'a, E: Errors>(
    section: &KnownSection<'a>,
    features: Features,
    errors: &mut E,
) -> Option<Located<Start>> {
    let mut cursor = Cursor::at(section.data.value(), section.data.span().start);
    let mut ctx = ReadContext::new(features, errors);
    Start::read(&mut cursor, &mut ctx)
}

/// Decodes the data-count section's payload: a single u32.
pub fn read_data_count_section<E: Errors>(
    section: &KnownSection<'_>,
    features: Features,
    errors: &mut E,
) -> Option<Located<u32>> {
    let mut cursor = Cursor::at(section.data.value(), section.data.span().start);
    let mut ctx = ReadContext::new(features, errors);
    read_u32(&mut cursor, &mut ctx)
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

    // Reads a value, expecting success with no reported errors.
    pub(crate) fn expect_read<'a, T>(data: &'a [u8], features: Features) -> Located<T>
    where
        T: Read<'a> + fmt::Debug,
    {
        let mut errors = ErrorLog::new();
        let mut cursor = Cursor::new(data);
        let mut ctx = ReadContext::new(features, &mut errors);
        let value = T::read(&mut cursor, &mut ctx);
        assert!(
            errors.is_empty(),
            "unexpected errors: {:?}",
            errors.errors()
        );
        value.expect("read failed without reporting")
    }

    // Reads a value, expecting failure with exactly the given error trace.
    pub(crate) fn expect_read_error<'a, T>(
        data: &'a [u8],
        features: Features,
        expected: &[(usize, &str)],
    ) where
        T: Read<'a> + fmt::Debug,
    {
        let mut errors = ErrorLog::new();
        let mut cursor = Cursor::new(data);
        let mut ctx = ReadContext::new(features, &mut errors);
        let value = T::read(&mut cursor, &mut ctx);
        assert!(value.is_none(), "expected failure, got {value:?}");
        let expected: Vec<(usize, String)> = expected
            .iter()
            .map(|&(offset, text)| (offset, text.to_string()))
            .collect();
        assert_eq!(errors.errors().len(), 1, "errors: {:?}", errors.errors());
        assert_eq!(errors.errors()[0].trace(), expected);
    }
}
