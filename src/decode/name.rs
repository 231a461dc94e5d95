// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! The "name" custom section.
//!
//! A custom section named exactly "name" holds a sequence of subsections,
//! each `{id, length, payload}`: the module's own name, a function name
//! map, and per-function local name maps.

use crate::Features;
use crate::located::Located;
use crate::types::{CustomSection, IndirectNameAssoc, Name, NameAssoc, NameSubsection};

use super::{Cursor, Errors, LazySequence, Read, ReadContext, read_string};

/// Walks the subsections of a "name" custom section.
///
/// Iteration stops at the end of the payload or at the first subsection
/// that fails to frame (e.g. an unknown subsection id).
pub struct NameSectionIter<'a, 'e, E: Errors> {
    cursor: Cursor<'a>,
    ctx: ReadContext<'e, E>,
    failed: bool,
}

impl<'a, E: Errors> Iterator for NameSectionIter<'a, '_, E> {
    type Item = Located<NameSubsection<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor.is_empty() {
            return None;
        }
        match NameSubsection::read(&mut self.cursor, &mut self.ctx) {
            Some(subsection) => {
                tracing::trace!(id = ?subsection.id.value(), size = subsection.data.len(), "name subsection");
                Some(subsection)
            }
            None => {
                self.failed = true;
                None
            }
        }
    }
}

/// Walks the subsections of a "name" custom section's payload.
pub fn read_name_section<'a, 'e, E: Errors>(
    section: &CustomSection<'a>,
    features: Features,
    errors: &'e mut E,
) -> NameSectionIter<'a, 'e, E> {
    NameSectionIter {
        cursor: Cursor::at(section.data.value(), section.data.span().start),
        ctx: ReadContext::new(features, errors),
        failed: false,
    }
}

/// Decodes a ModuleName subsection payload: a single name.
pub fn read_module_name<'a, E: Errors>(
    subsection: &NameSubsection<'a>,
    features: Features,
    errors: &mut E,
) -> Option<Located<Name<'a>>> {
    let mut cursor = Cursor::at(subsection.data.value(), subsection.data.span().start);
    let mut ctx = ReadContext::new(features, errors);
    read_string(&mut cursor, &mut ctx, "module name")
}

/// Decodes a FunctionNames subsection payload: a name map.
///
/// Name maps are required to be sorted by index with unique entries;
/// neither is enforced here (a validator concern).
pub fn read_function_names<'a, 'e, E: Errors>(
    subsection: &NameSubsection<'a>,
    features: Features,
    errors: &'e mut E,
) -> LazySequence<'a, 'e, NameAssoc<'a>, E> {
    let cursor = Cursor::at(subsection.data.value(), subsection.data.span().start);
    LazySequence::new(cursor, ReadContext::new(features, errors))
}

/// Decodes a LocalNames subsection payload: a vector of
/// `(function index, name map)` pairs.
pub fn read_local_names<'a, 'e, E: Errors>(
    subsection: &NameSubsection<'a>,
    features: Features,
    errors: &'e mut E,
) -> LazySequence<'a, 'e, IndirectNameAssoc<'a>, E> {
    let cursor = Cursor::at(subsection.data.value(), subsection.data.span().start);
    LazySequence::new(cursor, ReadContext::new(features, errors))
}
