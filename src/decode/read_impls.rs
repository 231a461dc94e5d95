// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Read trait implementations for the binary tree types.
//!
//! The context labels pushed here are the ones surfaced in diagnostics;
//! they follow the grammar's own vocabulary ("limits", "element segment",
//! "locals vector", ...).

use std::borrow::Cow;

use crate::Features;
use crate::located::Located;
use crate::types::*;

use super::{
    Cursor, Error, Errors, Read, ReadContext, leb128, read_byte_slice, read_guarded, read_index,
    read_length, read_string, read_u32, read_vector,
};

impl<'a> Read<'a> for u32 {
    // A bare index; used for index lists and branch targets.
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        let start = cursor.pos();
        let value = leb128::read(cursor, ctx)?;
        Some(Located::new(start..cursor.pos(), value))
    }
}

impl<'a> Read<'a> for ValueType {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "value type", |cursor, ctx| {
            let byte = cursor.read_u8(ctx)?;
            let value = ValueType::from_wire(byte, ctx.features);
            if value.is_none() {
                ctx.report(cursor.pos(), Error::UnknownValueType(byte));
            }
            value
        })
    }
}

impl<'a> Read<'a> for ElementType {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "element type", |cursor, ctx| {
            let byte = cursor.read_u8(ctx)?;
            let value = ElementType::from_wire(byte, ctx.features);
            if value.is_none() {
                ctx.report(cursor.pos(), Error::UnknownElementType(byte));
            }
            value
        })
    }
}

impl<'a> Read<'a> for ExternalKind {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "external kind", |cursor, ctx| {
            let byte = cursor.read_u8(ctx)?;
            let value = ExternalKind::from_wire(byte, ctx.features);
            if value.is_none() {
                ctx.report(cursor.pos(), Error::UnknownExternalKind(byte));
            }
            value
        })
    }
}

impl<'a> Read<'a> for Mutability {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "mutability", |cursor, ctx| {
            let byte = cursor.read_u8(ctx)?;
            match Mutability::try_from(byte) {
                Ok(value) => Some(value),
                Err(_) => {
                    ctx.report(cursor.pos(), Error::UnknownMutability(byte));
                    None
                }
            }
        })
    }
}

impl<'a> Read<'a> for BlockType {
    // Without multi-value the block type is a single byte. With
    // multi-value it is a signed LEB: non-negative values are function
    // type indices, negative single-byte values map back to the type
    // table.
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "block type", |cursor, ctx| {
            if ctx.features.contains(Features::MULTI_VALUE) {
                let value: i32 = leb128::read(cursor, ctx)?;
                if value >= 0 {
                    return Some(BlockType::Index(value as u32));
                }
                let block_type = u8::try_from(value + 0x80)
                    .ok()
                    .and_then(|byte| decode_block_type_byte(byte, ctx.features));
                if block_type.is_none() {
                    ctx.report(cursor.pos(), Error::UnknownBlockType(i64::from(value)));
                }
                block_type
            } else {
                let byte = cursor.read_u8(ctx)?;
                let block_type = decode_block_type_byte(byte, ctx.features);
                if block_type.is_none() {
                    ctx.report(cursor.pos(), Error::UnknownBlockType(i64::from(byte)));
                }
                block_type
            }
        })
    }
}

fn decode_block_type_byte(byte: u8, features: Features) -> Option<BlockType> {
    if byte == 0x40 {
        Some(BlockType::Void)
    } else {
        ValueType::from_wire(byte, features).map(BlockType::Value)
    }
}

impl<'a> Read<'a> for Limits {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "limits", |cursor, ctx| {
            let flags = read_guarded(cursor, ctx, "flags", |cursor, ctx| cursor.read_u8(ctx))?;
            let (has_max, shared) = match *flags {
                0x00 => (false, Shared::No),
                0x01 => (true, Shared::No),
                0x03 if ctx.features.contains(Features::THREADS) => (true, Shared::Yes),
                other => {
                    ctx.report(cursor.pos(), Error::UnknownLimitsFlags(other));
                    return None;
                }
            };
            let min = read_guarded(cursor, ctx, "min", |cursor, ctx| {
                read_u32(cursor, ctx).map(Located::into_value)
            })?;
            let max = if has_max {
                Some(read_guarded(cursor, ctx, "max", |cursor, ctx| {
                    read_u32(cursor, ctx).map(Located::into_value)
                })?)
            } else {
                None
            };
            Some(Limits {
                min,
                max,
                shared: Located::new(flags.span(), shared),
            })
        })
    }
}

impl<'a> Read<'a> for MemoryType {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "memory type", |cursor, ctx| {
            Some(MemoryType {
                limits: Limits::read(cursor, ctx)?,
            })
        })
    }
}

impl<'a> Read<'a> for TableType {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "table type", |cursor, ctx| {
            Some(TableType {
                ty: ElementType::read(cursor, ctx)?,
                limits: Limits::read(cursor, ctx)?,
            })
        })
    }
}

impl<'a> Read<'a> for GlobalType {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "global type", |cursor, ctx| {
            Some(GlobalType {
                ty: ValueType::read(cursor, ctx)?,
                mutability: Mutability::read(cursor, ctx)?,
            })
        })
    }
}

impl<'a> Read<'a> for EventType {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "event type", |cursor, ctx| {
            let attribute = read_guarded(cursor, ctx, "event attribute", |cursor, ctx| {
                let value = read_u32(cursor, ctx)?;
                match EventAttribute::try_from(*value) {
                    Ok(attribute) => Some(attribute),
                    Err(_) => {
                        ctx.report(cursor.pos(), Error::UnknownEventAttribute(*value));
                        None
                    }
                }
            })?;
            Some(EventType {
                attribute,
                type_index: read_index(cursor, ctx, "type index")?,
            })
        })
    }
}

impl<'a> Read<'a> for FunctionType {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "function type", |cursor, ctx| {
            let params = read_vector::<ValueType, E>(cursor, ctx, "param types")?;
            let results = read_vector::<ValueType, E>(cursor, ctx, "result types")?;
            Some(FunctionType {
                params: params.into_value(),
                results: results.into_value(),
            })
        })
    }
}

impl<'a> Read<'a> for TypeEntry {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "type entry", |cursor, ctx| {
            let form = cursor.read_u8(ctx)?;
            if form != 0x60 {
                ctx.report(cursor.pos(), Error::UnknownTypeForm(form));
                return None;
            }
            Some(TypeEntry {
                ty: FunctionType::read(cursor, ctx)?,
            })
        })
    }
}

impl<'a> Read<'a> for Import<'a> {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "import", |cursor, ctx| {
            let module = read_string(cursor, ctx, "module name")?;
            let name = read_string(cursor, ctx, "field name")?;
            let kind = ExternalKind::read(cursor, ctx)?;
            let desc = match kind.value() {
                ExternalKind::Function => {
                    ImportDesc::Function(read_index(cursor, ctx, "function index")?)
                }
                ExternalKind::Table => ImportDesc::Table(TableType::read(cursor, ctx)?),
                ExternalKind::Memory => ImportDesc::Memory(MemoryType::read(cursor, ctx)?),
                ExternalKind::Global => ImportDesc::Global(GlobalType::read(cursor, ctx)?),
                ExternalKind::Event => ImportDesc::Event(EventType::read(cursor, ctx)?),
            };
            Some(Import { module, name, desc })
        })
    }
}

impl<'a> Read<'a> for Export<'a> {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "export", |cursor, ctx| {
            Some(Export {
                name: read_string(cursor, ctx, "name")?,
                kind: ExternalKind::read(cursor, ctx)?,
                index: read_index(cursor, ctx, "index")?,
            })
        })
    }
}

impl<'a> Read<'a> for Function {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "function", |cursor, ctx| {
            Some(Function {
                type_index: read_index(cursor, ctx, "type index")?,
            })
        })
    }
}

impl<'a> Read<'a> for Table {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "table", |cursor, ctx| {
            Some(Table {
                ty: TableType::read(cursor, ctx)?,
            })
        })
    }
}

impl<'a> Read<'a> for Memory {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "memory", |cursor, ctx| {
            Some(Memory {
                ty: MemoryType::read(cursor, ctx)?,
            })
        })
    }
}

impl<'a> Read<'a> for Global {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "global", |cursor, ctx| {
            Some(Global {
                ty: GlobalType::read(cursor, ctx)?,
                init: ConstantExpression::read(cursor, ctx)?,
            })
        })
    }
}

impl<'a> Read<'a> for Start {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "start", |cursor, ctx| {
            Some(Start {
                func_index: read_index(cursor, ctx, "function index")?,
            })
        })
    }
}

impl<'a> Read<'a> for Event {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "event", |cursor, ctx| {
            Some(Event {
                ty: EventType::read(cursor, ctx)?,
            })
        })
    }
}

impl<'a> Read<'a> for Locals {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "locals", |cursor, ctx| {
            let count = read_guarded(cursor, ctx, "count", leb128::read)?;
            let ty = read_guarded(cursor, ctx, "type", |cursor, ctx| {
                ValueType::read(cursor, ctx).map(Located::into_value)
            })?;
            Some(Locals { count, ty })
        })
    }
}

impl<'a> Read<'a> for Code<'a> {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "code", |cursor, ctx| {
            let length = read_length(cursor, ctx)?;
            let body_start = cursor.pos();
            let payload = cursor.take(*length as usize);
            let mut body = Cursor::at(payload, body_start);
            let locals = read_vector::<Locals, E>(&mut body, ctx, "locals vector")?;
            let expr_start = body.pos();
            let expr = body.take_rest();
            Some(Code {
                locals: locals.into_value(),
                body: Located::new(expr_start..expr_start + expr.len(), Expression::new(expr)),
            })
        })
    }
}

// Reads a segment offset: a constant expression under an "offset" label.
fn read_offset<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<Located<ConstantExpression>> {
    read_guarded(cursor, ctx, "offset", |cursor, ctx| {
        ConstantExpression::read(cursor, ctx).map(Located::into_value)
    })
}

impl<'a> Read<'a> for ElementSegment {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "element segment", |cursor, ctx| {
            if ctx
                .features
                .intersects(Features::BULK_MEMORY | Features::REFERENCE_TYPES)
            {
                read_element_segment_flags(cursor, ctx)
            } else {
                // MVP shape: the leading u32 is the table index itself.
                let table = read_index(cursor, ctx, "table index")?;
                let offset = read_offset(cursor, ctx)?;
                let init = read_vector::<u32, E>(cursor, ctx, "initializers")?.into_value();
                if *table == 0 {
                    Some(ElementSegment::Active {
                        table,
                        offset,
                        init,
                    })
                } else {
                    Some(ElementSegment::ActiveWithTable {
                        table,
                        offset,
                        kind: ExternalKind::Function.into(),
                        init,
                    })
                }
            }
        })
    }
}

fn read_element_segment_flags<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<ElementSegment> {
    let flags = read_guarded(cursor, ctx, "flags", leb128::read)?;
    // Declared segments (flags 3 and 7) arrived with reference types.
    let declared = ctx.features.contains(Features::REFERENCE_TYPES);
    match *flags {
        0 => Some(ElementSegment::Active {
            table: Located::new(flags.span(), 0),
            offset: read_offset(cursor, ctx)?,
            init: read_vector::<u32, E>(cursor, ctx, "initializers")?.into_value(),
        }),
        1 => Some(ElementSegment::Passive {
            kind: ExternalKind::read(cursor, ctx)?,
            init: read_vector::<u32, E>(cursor, ctx, "initializers")?.into_value(),
        }),
        2 => Some(ElementSegment::ActiveWithTable {
            table: read_index(cursor, ctx, "table index")?,
            offset: read_offset(cursor, ctx)?,
            kind: ExternalKind::read(cursor, ctx)?,
            init: read_vector::<u32, E>(cursor, ctx, "initializers")?.into_value(),
        }),
        3 if declared => Some(ElementSegment::Declared {
            kind: ExternalKind::read(cursor, ctx)?,
            init: read_vector::<u32, E>(cursor, ctx, "initializers")?.into_value(),
        }),
        4 => Some(ElementSegment::ActiveExpressions {
            table: Located::new(flags.span(), 0),
            offset: read_offset(cursor, ctx)?,
            init: read_vector::<ElementExpression, E>(cursor, ctx, "initializers")?.into_value(),
        }),
        5 => Some(ElementSegment::PassiveExpressions {
            ty: ElementType::read(cursor, ctx)?,
            init: read_vector::<ElementExpression, E>(cursor, ctx, "initializers")?.into_value(),
        }),
        6 => Some(ElementSegment::ActiveWithTableExpressions {
            table: read_index(cursor, ctx, "table index")?,
            offset: read_offset(cursor, ctx)?,
            ty: ElementType::read(cursor, ctx)?,
            init: read_vector::<ElementExpression, E>(cursor, ctx, "initializers")?.into_value(),
        }),
        7 if declared => Some(ElementSegment::DeclaredExpressions {
            ty: ElementType::read(cursor, ctx)?,
            init: read_vector::<ElementExpression, E>(cursor, ctx, "initializers")?.into_value(),
        }),
        other => {
            ctx.report(cursor.pos(), Error::UnknownSegmentFlags(other));
            None
        }
    }
}

impl<'a> Read<'a> for DataSegment<'a> {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "data segment", |cursor, ctx| {
            if ctx.features.contains(Features::BULK_MEMORY) {
                let flags = read_guarded(cursor, ctx, "flags", leb128::read)?;
                match *flags {
                    0 => Some(DataSegment::Active {
                        memory: Located::new(flags.span(), 0),
                        offset: read_offset(cursor, ctx)?,
                        init: read_init_bytes(cursor, ctx)?,
                    }),
                    1 => Some(DataSegment::Passive {
                        init: read_init_bytes(cursor, ctx)?,
                    }),
                    2 => Some(DataSegment::ActiveWithMemory {
                        memory: read_index(cursor, ctx, "memory index")?,
                        offset: read_offset(cursor, ctx)?,
                        init: read_init_bytes(cursor, ctx)?,
                    }),
                    other => {
                        ctx.report(cursor.pos(), Error::UnknownSegmentFlags(other));
                        None
                    }
                }
            } else {
                // MVP shape: the leading u32 is the memory index itself.
                let memory = read_index(cursor, ctx, "memory index")?;
                let offset = read_offset(cursor, ctx)?;
                let init = read_init_bytes(cursor, ctx)?;
                if *memory == 0 {
                    Some(DataSegment::Active {
                        memory,
                        offset,
                        init,
                    })
                } else {
                    Some(DataSegment::ActiveWithMemory {
                        memory,
                        offset,
                        init,
                    })
                }
            }
        })
    }
}

fn read_init_bytes<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<Located<Cow<'a, [u8]>>> {
    read_byte_slice(cursor, ctx).map(|bytes| bytes.map(Cow::Borrowed))
}

impl<'a> Read<'a> for SectionId {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "section id", |cursor, ctx| {
            let value = read_u32(cursor, ctx)?;
            let id = SectionId::from_wire(*value, ctx.features);
            if id.is_none() {
                ctx.report(cursor.pos(), Error::UnknownSectionId(*value));
            }
            id
        })
    }
}

impl<'a> Read<'a> for Section<'a> {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "section", |cursor, ctx| {
            let id = SectionId::read(cursor, ctx)?;
            let length = read_length(cursor, ctx)?;
            let start = cursor.pos();
            let payload = cursor.take(*length as usize);
            if *id.value() == SectionId::Custom {
                let mut contents = Cursor::at(payload, start);
                let name = read_string(&mut contents, ctx, "name")?;
                let data_start = contents.pos();
                let data = contents.take_rest();
                Some(Section::Custom(CustomSection {
                    name,
                    data: Located::new(data_start..data_start + data.len(), data),
                }))
            } else {
                Some(Section::Known(KnownSection {
                    id,
                    data: Located::new(start..start + payload.len(), payload),
                }))
            }
        })
    }
}

impl<'a> Read<'a> for NameSubsection<'a> {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "name subsection", |cursor, ctx| {
            let id = read_guarded(cursor, ctx, "name subsection id", |cursor, ctx| {
                let byte = cursor.read_u8(ctx)?;
                match NameSubsectionId::try_from(byte) {
                    Ok(id) => Some(id),
                    Err(_) => {
                        ctx.report(cursor.pos(), Error::UnknownNameSubsectionId(byte));
                        None
                    }
                }
            })?;
            let length = read_length(cursor, ctx)?;
            let start = cursor.pos();
            let data = cursor.take(*length as usize);
            Some(NameSubsection {
                id,
                data: Located::new(start..start + data.len(), data),
            })
        })
    }
}

impl<'a> Read<'a> for NameAssoc<'a> {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "name assoc", |cursor, ctx| {
            Some(NameAssoc {
                index: read_index(cursor, ctx, "index")?,
                name: read_string(cursor, ctx, "name")?,
            })
        })
    }
}

impl<'a> Read<'a> for IndirectNameAssoc<'a> {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "indirect name assoc", |cursor, ctx| {
            let index = read_index(cursor, ctx, "index")?;
            let name_map = read_vector::<NameAssoc, E>(cursor, ctx, "name map")?;
            Some(IndirectNameAssoc {
                index,
                name_map: name_map.into_value(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{expect_read, expect_read_error};
    use super::*;
    use crate::located::Span;

    fn at<T>(span: Span, value: T) -> Located<T> {
        Located::new(span, value)
    }

    #[test]
    fn test_value_type() {
        assert_eq!(
            *expect_read::<ValueType>(b"\x7f", Features::MVP),
            ValueType::I32
        );
        assert_eq!(
            *expect_read::<ValueType>(b"\x7b", Features::SIMD),
            ValueType::V128
        );
        expect_read_error::<ValueType>(
            b"\x7b",
            Features::MVP,
            &[(0, "value type"), (1, "Unknown value type: 123")],
        );
        expect_read_error::<ValueType>(
            b"\x10",
            Features::MVP,
            &[(0, "value type"), (1, "Unknown value type: 16")],
        );
        // Overlong encoding is not allowed: only one byte is read.
        expect_read_error::<ValueType>(
            b"\xff\x7f",
            Features::MVP,
            &[(0, "value type"), (1, "Unknown value type: 255")],
        );
    }

    #[test]
    fn test_element_type() {
        assert_eq!(
            *expect_read::<ElementType>(b"\x70", Features::MVP),
            ElementType::Funcref
        );
        expect_read_error::<ElementType>(
            b"\x6f",
            Features::MVP,
            &[(0, "element type"), (1, "Unknown element type: 111")],
        );
        assert_eq!(
            *expect_read::<ElementType>(b"\x6f", Features::REFERENCE_TYPES),
            ElementType::Anyref
        );
        assert_eq!(
            *expect_read::<ElementType>(b"\x68", Features::EXCEPTIONS),
            ElementType::Exnref
        );
        expect_read_error::<ElementType>(
            b"\xf0\x7f",
            Features::MVP,
            &[(0, "element type"), (1, "Unknown element type: 240")],
        );
    }

    #[test]
    fn test_external_kind() {
        assert_eq!(
            *expect_read::<ExternalKind>(b"\x00", Features::MVP),
            ExternalKind::Function
        );
        expect_read_error::<ExternalKind>(
            b"\x04",
            Features::MVP,
            &[(0, "external kind"), (1, "Unknown external kind: 4")],
        );
        assert_eq!(
            *expect_read::<ExternalKind>(b"\x04", Features::EXCEPTIONS),
            ExternalKind::Event
        );
        expect_read_error::<ExternalKind>(
            b"\x84\x00",
            Features::MVP,
            &[(0, "external kind"), (1, "Unknown external kind: 132")],
        );
    }

    #[test]
    fn test_mutability() {
        assert_eq!(
            *expect_read::<Mutability>(b"\x00", Features::MVP),
            Mutability::Const
        );
        assert_eq!(
            *expect_read::<Mutability>(b"\x01", Features::MVP),
            Mutability::Var
        );
        expect_read_error::<Mutability>(
            b"\x04",
            Features::MVP,
            &[(0, "mutability"), (1, "Unknown mutability: 4")],
        );
        expect_read_error::<Mutability>(
            b"\x84\x00",
            Features::MVP,
            &[(0, "mutability"), (1, "Unknown mutability: 132")],
        );
    }

    #[test]
    fn test_block_type_mvp() {
        assert_eq!(
            *expect_read::<BlockType>(b"\x7f", Features::MVP),
            BlockType::Value(ValueType::I32)
        );
        assert_eq!(
            *expect_read::<BlockType>(b"\x7c", Features::MVP),
            BlockType::Value(ValueType::F64)
        );
        assert_eq!(
            *expect_read::<BlockType>(b"\x40", Features::MVP),
            BlockType::Void
        );
        expect_read_error::<BlockType>(
            b"\x00",
            Features::MVP,
            &[(0, "block type"), (1, "Unknown block type: 0")],
        );
        expect_read_error::<BlockType>(
            b"\x01",
            Features::MVP,
            &[(0, "block type"), (1, "Unknown block type: 1")],
        );
        // Overlong encoding is not allowed.
        expect_read_error::<BlockType>(
            b"\xff\x7f",
            Features::MVP,
            &[(0, "block type"), (1, "Unknown block type: 255")],
        );
    }

    #[test]
    fn test_block_type_features() {
        expect_read_error::<BlockType>(
            b"\x7b",
            Features::MVP,
            &[(0, "block type"), (1, "Unknown block type: 123")],
        );
        assert_eq!(
            *expect_read::<BlockType>(b"\x7b", Features::SIMD),
            BlockType::Value(ValueType::V128)
        );
        expect_read_error::<BlockType>(
            b"\x6f",
            Features::MVP,
            &[(0, "block type"), (1, "Unknown block type: 111")],
        );
        assert_eq!(
            *expect_read::<BlockType>(b"\x6f", Features::REFERENCE_TYPES),
            BlockType::Value(ValueType::Anyref)
        );
    }

    #[test]
    fn test_block_type_multi_value() {
        assert_eq!(
            *expect_read::<BlockType>(b"\x01", Features::MULTI_VALUE),
            BlockType::Index(1)
        );
        assert_eq!(
            *expect_read::<BlockType>(b"\xc0\x03", Features::MULTI_VALUE),
            BlockType::Index(448)
        );
        assert_eq!(
            *expect_read::<BlockType>(b"\x7f", Features::MULTI_VALUE),
            BlockType::Value(ValueType::I32)
        );
        // Negative values that do not name a type are rejected, reported
        // as their signed value.
        expect_read_error::<BlockType>(
            b"\x77",
            Features::MULTI_VALUE,
            &[(0, "block type"), (1, "Unknown block type: -9")],
        );
    }

    #[test]
    fn test_limits() {
        assert_eq!(
            expect_read::<Limits>(b"\x00\x81\x01", Features::MVP).into_value(),
            Limits {
                min: at(1..3, 129),
                max: None,
                shared: at(0..1, Shared::No),
            }
        );
        assert_eq!(
            expect_read::<Limits>(b"\x01\x02\xe8\x07", Features::MVP).into_value(),
            Limits {
                min: at(1..2, 2),
                max: Some(at(2..4, 1000)),
                shared: at(0..1, Shared::No),
            }
        );
    }

    #[test]
    fn test_limits_bad_flags() {
        expect_read_error::<Limits>(
            b"\x02\x01",
            Features::MVP,
            &[(0, "limits"), (1, "Unknown flags value: 2")],
        );
        expect_read_error::<Limits>(
            b"\x03\x01",
            Features::MVP,
            &[(0, "limits"), (1, "Unknown flags value: 3")],
        );
    }

    #[test]
    fn test_limits_threads() {
        assert_eq!(
            expect_read::<Limits>(b"\x03\x02\xe8\x07", Features::THREADS).into_value(),
            Limits {
                min: at(1..2, 2),
                max: Some(at(2..4, 1000)),
                shared: at(0..1, Shared::Yes),
            }
        );
    }

    #[test]
    fn test_limits_past_end() {
        expect_read_error::<Limits>(
            b"\x00",
            Features::MVP,
            &[
                (0, "limits"),
                (1, "min"),
                (1, "u32"),
                (1, "Unable to read u8"),
            ],
        );
        expect_read_error::<Limits>(
            b"\x01\x00",
            Features::MVP,
            &[
                (0, "limits"),
                (2, "max"),
                (2, "u32"),
                (2, "Unable to read u8"),
            ],
        );
    }

    #[test]
    fn test_table_type() {
        let table_type = expect_read::<TableType>(b"\x70\x00\x01", Features::MVP).into_value();
        assert_eq!(table_type.ty, ElementType::Funcref);
        assert_eq!(table_type.limits.min, 1);
        assert_eq!(table_type.limits.max, None);

        expect_read_error::<TableType>(
            b"\x00",
            Features::MVP,
            &[
                (0, "table type"),
                (0, "element type"),
                (1, "Unknown element type: 0"),
            ],
        );
        expect_read_error::<TableType>(
            b"\x70",
            Features::MVP,
            &[
                (0, "table type"),
                (1, "limits"),
                (1, "flags"),
                (1, "Unable to read u8"),
            ],
        );
    }

    #[test]
    fn test_memory_type() {
        let memory_type =
            expect_read::<MemoryType>(b"\x01\x00\x80\x01", Features::MVP).into_value();
        assert_eq!(memory_type.limits.min, 0);
        assert_eq!(memory_type.limits.max.as_deref().copied(), Some(128));

        expect_read_error::<MemoryType>(
            b"",
            Features::MVP,
            &[
                (0, "memory type"),
                (0, "limits"),
                (0, "flags"),
                (0, "Unable to read u8"),
            ],
        );
    }

    #[test]
    fn test_global_type() {
        let global_type = expect_read::<GlobalType>(b"\x7f\x00", Features::MVP).into_value();
        assert_eq!(global_type.ty, ValueType::I32);
        assert_eq!(global_type.mutability, Mutability::Const);

        expect_read_error::<GlobalType>(
            b"\x7f",
            Features::MVP,
            &[
                (0, "global type"),
                (1, "mutability"),
                (1, "Unable to read u8"),
            ],
        );
    }

    #[test]
    fn test_function_type() {
        assert_eq!(
            expect_read::<FunctionType>(b"\x00\x00", Features::MVP).into_value(),
            FunctionType::default()
        );
        // Scenario: (i32, i64) -> (f64).
        assert_eq!(
            expect_read::<FunctionType>(b"\x02\x7f\x7e\x01\x7c", Features::MVP).into_value(),
            FunctionType {
                params: vec![at(1..2, ValueType::I32), at(2..3, ValueType::I64)],
                results: vec![at(4..5, ValueType::F64)],
            }
        );
    }

    #[test]
    fn test_function_type_past_end() {
        expect_read_error::<FunctionType>(
            b"",
            Features::MVP,
            &[
                (0, "function type"),
                (0, "param types"),
                (0, "count"),
                (0, "Unable to read u8"),
            ],
        );
        expect_read_error::<FunctionType>(
            b"\x01",
            Features::MVP,
            &[
                (0, "function type"),
                (0, "param types"),
                (1, "Count extends past end: 1 > 0"),
            ],
        );
        expect_read_error::<FunctionType>(
            b"\x00\x01",
            Features::MVP,
            &[
                (0, "function type"),
                (1, "result types"),
                (2, "Count extends past end: 1 > 0"),
            ],
        );
    }

    #[test]
    fn test_type_entry() {
        let entry = expect_read::<TypeEntry>(b"\x60\x00\x01\x7f", Features::MVP).into_value();
        assert_eq!(
            entry.ty.value(),
            &FunctionType {
                params: vec![],
                results: vec![at(3..4, ValueType::I32)],
            }
        );
        expect_read_error::<TypeEntry>(
            b"\x40",
            Features::MVP,
            &[(0, "type entry"), (1, "Unknown type form: 64")],
        );
    }

    #[test]
    fn test_import() {
        let import =
            expect_read::<Import>(b"\x01a\x04func\x00\x0b", Features::MVP).into_value();
        assert_eq!(*import.module.value(), "a");
        assert_eq!(*import.name.value(), "func");
        assert_eq!(import.desc, ImportDesc::Function(at(8..9, 11)));
        assert_eq!(import.desc.kind(), ExternalKind::Function);

        let import =
            expect_read::<Import>(b"\x01b\x05table\x01\x70\x00\x01", Features::MVP).into_value();
        assert!(matches!(import.desc, ImportDesc::Table(_)));

        let import =
            expect_read::<Import>(b"\x01c\x06memory\x02\x01\x00\x02", Features::MVP).into_value();
        assert!(matches!(import.desc, ImportDesc::Memory(_)));

        let import = expect_read::<Import>(b"\x01\x64\x06global\x03\x7f\x00", Features::MVP)
            .into_value();
        assert!(matches!(import.desc, ImportDesc::Global(_)));
    }

    #[test]
    fn test_import_event() {
        expect_read_error::<Import>(
            b"\x01v\x06!event\x04\x00\x02",
            Features::MVP,
            &[
                (0, "import"),
                (9, "external kind"),
                (10, "Unknown external kind: 4"),
            ],
        );
        let import = expect_read::<Import>(b"\x01v\x06!event\x04\x00\x02", Features::EXCEPTIONS)
            .into_value();
        match import.desc {
            ImportDesc::Event(event_type) => {
                assert_eq!(event_type.attribute, EventAttribute::Exception);
                assert_eq!(event_type.type_index, 2);
            }
            _ => panic!("expected an event import"),
        }
    }

    #[test]
    fn test_import_past_end() {
        expect_read_error::<Import>(
            b"",
            Features::MVP,
            &[
                (0, "import"),
                (0, "module name"),
                (0, "length"),
                (0, "Unable to read u8"),
            ],
        );
        expect_read_error::<Import>(
            b"\x00\x00\x00",
            Features::MVP,
            &[
                (0, "import"),
                (3, "function index"),
                (3, "Unable to read u8"),
            ],
        );
        expect_read_error::<Import>(
            b"\x00\x00\x01",
            Features::MVP,
            &[
                (0, "import"),
                (3, "table type"),
                (3, "element type"),
                (3, "Unable to read u8"),
            ],
        );
        expect_read_error::<Import>(
            b"\x00\x00\x02",
            Features::MVP,
            &[
                (0, "import"),
                (3, "memory type"),
                (3, "limits"),
                (3, "flags"),
                (3, "Unable to read u8"),
            ],
        );
        expect_read_error::<Import>(
            b"\x00\x00\x03",
            Features::MVP,
            &[
                (0, "import"),
                (3, "global type"),
                (3, "value type"),
                (3, "Unable to read u8"),
            ],
        );
    }

    #[test]
    fn test_export() {
        let export = expect_read::<Export>(b"\x02hi\x00\x03", Features::MVP).into_value();
        assert_eq!(*export.name.value(), "hi");
        assert_eq!(export.kind, ExternalKind::Function);
        assert_eq!(export.index, 3);

        let export = expect_read::<Export>(b"\x00\x01\xe8\x07", Features::MVP).into_value();
        assert_eq!(*export.name.value(), "");
        assert_eq!(export.kind, ExternalKind::Table);
        assert_eq!(export.index, 1000);
    }

    #[test]
    fn test_export_past_end() {
        expect_read_error::<Export>(
            b"",
            Features::MVP,
            &[
                (0, "export"),
                (0, "name"),
                (0, "length"),
                (0, "Unable to read u8"),
            ],
        );
        expect_read_error::<Export>(
            b"\x00\x00",
            Features::MVP,
            &[(0, "export"), (2, "index"), (2, "Unable to read u8")],
        );
    }

    #[test]
    fn test_function() {
        assert_eq!(
            expect_read::<Function>(b"\x01", Features::MVP).into_value(),
            Function {
                type_index: at(0..1, 1)
            }
        );
        expect_read_error::<Function>(
            b"",
            Features::MVP,
            &[(0, "function"), (0, "type index"), (0, "Unable to read u8")],
        );
    }

    #[test]
    fn test_start() {
        assert_eq!(
            expect_read::<Start>(b"\x80\x02", Features::MVP).into_value(),
            Start {
                func_index: at(0..2, 256)
            }
        );
    }

    #[test]
    fn test_global() {
        // An i32 global with an i64.const initializer: a validator error,
        // but it still decodes.
        let global = expect_read::<Global>(b"\x7f\x01\x42\x00\x0b", Features::MVP).into_value();
        assert_eq!(global.ty.ty, ValueType::I32);
        assert_eq!(global.ty.mutability, Mutability::Var);
        assert_eq!(global.init.instruction.opcode, Opcode::I64Const);

        expect_read_error::<Global>(
            b"\x7f\x00",
            Features::MVP,
            &[
                (0, "global"),
                (2, "constant expression"),
                (2, "opcode"),
                (2, "Unable to read u8"),
            ],
        );
    }

    #[test]
    fn test_event() {
        let event = expect_read::<Event>(b"\x00\x01", Features::EXCEPTIONS).into_value();
        assert_eq!(event.ty.attribute, EventAttribute::Exception);
        assert_eq!(event.ty.type_index, 1);

        expect_read_error::<Event>(
            b"",
            Features::EXCEPTIONS,
            &[
                (0, "event"),
                (0, "event type"),
                (0, "event attribute"),
                (0, "u32"),
                (0, "Unable to read u8"),
            ],
        );
        expect_read_error::<Event>(
            b"\x00",
            Features::EXCEPTIONS,
            &[
                (0, "event"),
                (0, "event type"),
                (1, "type index"),
                (1, "Unable to read u8"),
            ],
        );
    }

    #[test]
    fn test_locals() {
        assert_eq!(
            expect_read::<Locals>(b"\x02\x7f", Features::MVP).into_value(),
            Locals {
                count: at(0..1, 2),
                ty: at(1..2, ValueType::I32),
            }
        );
        assert_eq!(
            expect_read::<Locals>(b"\xc0\x02\x7c", Features::MVP).into_value(),
            Locals {
                count: at(0..2, 320),
                ty: at(2..3, ValueType::F64),
            }
        );
    }

    #[test]
    fn test_locals_past_end() {
        expect_read_error::<Locals>(
            b"",
            Features::MVP,
            &[(0, "locals"), (0, "count"), (0, "Unable to read u8")],
        );
        expect_read_error::<Locals>(
            b"\xc0\x02",
            Features::MVP,
            &[
                (0, "locals"),
                (2, "type"),
                (2, "value type"),
                (2, "Unable to read u8"),
            ],
        );
    }

    #[test]
    fn test_code() {
        // Scenario: length 7, locals [(2, i32), (3, i64)], body [nop, end].
        let code =
            expect_read::<Code>(b"\x07\x02\x02\x7f\x03\x7e\x01\x0b", Features::MVP).into_value();
        assert_eq!(
            code.locals,
            vec![
                at(
                    2..4,
                    Locals {
                        count: at(2..3, 2),
                        ty: at(3..4, ValueType::I32)
                    }
                ),
                at(
                    4..6,
                    Locals {
                        count: at(4..5, 3),
                        ty: at(5..6, ValueType::I64)
                    }
                ),
            ]
        );
        assert_eq!(code.body.data.as_ref(), b"\x01\x0b");
        assert_eq!(code.body.span(), 6..8);

        // Smallest valid empty body.
        let code = expect_read::<Code>(b"\x02\x00\x0b", Features::MVP).into_value();
        assert!(code.locals.is_empty());
        assert_eq!(code.body.data.as_ref(), b"\x0b");
    }

    #[test]
    fn test_element_segment_mvp() {
        let segment = expect_read::<ElementSegment>(
            b"\x00\x41\x01\x0b\x03\x01\x02\x03",
            Features::MVP,
        )
        .into_value();
        match segment {
            ElementSegment::Active {
                table,
                offset,
                init,
            } => {
                assert_eq!(table, 0);
                assert_eq!(offset.instruction.opcode, Opcode::I32Const);
                assert_eq!(init, vec![at(5..6, 1), at(6..7, 2), at(7..8, 3)]);
            }
            other => panic!("expected an active segment, got {other:?}"),
        }
    }

    #[test]
    fn test_element_segment_mvp_past_end() {
        expect_read_error::<ElementSegment>(
            b"",
            Features::MVP,
            &[
                (0, "element segment"),
                (0, "table index"),
                (0, "Unable to read u8"),
            ],
        );
        expect_read_error::<ElementSegment>(
            b"\x00",
            Features::MVP,
            &[
                (0, "element segment"),
                (1, "offset"),
                (1, "constant expression"),
                (1, "opcode"),
                (1, "Unable to read u8"),
            ],
        );
        expect_read_error::<ElementSegment>(
            b"\x00\x23\x00\x0b",
            Features::MVP,
            &[
                (0, "element segment"),
                (4, "initializers"),
                (4, "count"),
                (4, "Unable to read u8"),
            ],
        );
    }

    #[test]
    fn test_element_segment_bulk_memory() {
        let features = Features::BULK_MEMORY;

        // Flags 1: passive, index list.
        let segment =
            expect_read::<ElementSegment>(b"\x01\x00\x02\x01\x02", features).into_value();
        match segment {
            ElementSegment::Passive { kind, init } => {
                assert_eq!(kind, ExternalKind::Function);
                assert_eq!(init, vec![at(3..4, 1), at(4..5, 2)]);
            }
            other => panic!("expected a passive segment, got {other:?}"),
        }

        // Flags 2: active, table index, index list.
        let segment = expect_read::<ElementSegment>(
            b"\x02\x01\x41\x02\x0b\x00\x02\x03\x04",
            features,
        )
        .into_value();
        match segment {
            ElementSegment::ActiveWithTable { table, init, .. } => {
                assert_eq!(table, 1);
                assert_eq!(init, vec![at(7..8, 3), at(8..9, 4)]);
            }
            other => panic!("expected an active segment, got {other:?}"),
        }

        // Flags 4: active, expression list.
        let segment =
            expect_read::<ElementSegment>(b"\x04\x41\x05\x0b\x01\xd2\x06\x0b", features)
                .into_value();
        match segment {
            ElementSegment::ActiveExpressions { table, init, .. } => {
                assert_eq!(table, 0);
                assert_eq!(init.len(), 1);
                assert_eq!(init[0].instruction.opcode, Opcode::RefFunc);
            }
            other => panic!("expected an active segment, got {other:?}"),
        }

        // Flags 5: passive, element type, expression list.
        let segment =
            expect_read::<ElementSegment>(b"\x05\x70\x02\xd2\x07\x0b\xd0\x0b", features)
                .into_value();
        match segment {
            ElementSegment::PassiveExpressions { ty, init } => {
                assert_eq!(ty, ElementType::Funcref);
                assert_eq!(init.len(), 2);
                assert_eq!(init[1].instruction.opcode, Opcode::RefNull);
            }
            other => panic!("expected a passive segment, got {other:?}"),
        }

        // Flags 6: active, table index, element type, expression list.
        let segment =
            expect_read::<ElementSegment>(b"\x06\x02\x41\x08\x0b\x70\x01\xd0\x0b", features)
                .into_value();
        match segment {
            ElementSegment::ActiveWithTableExpressions { table, ty, init, .. } => {
                assert_eq!(table, 2);
                assert_eq!(ty, ElementType::Funcref);
                assert_eq!(init.len(), 1);
            }
            other => panic!("expected an active segment, got {other:?}"),
        }
    }

    #[test]
    fn test_element_segment_declared_needs_reference_types() {
        expect_read_error::<ElementSegment>(
            b"\x03",
            Features::BULK_MEMORY,
            &[(0, "element segment"), (1, "Unknown flags: 3")],
        );
        expect_read_error::<ElementSegment>(
            b"\x07",
            Features::BULK_MEMORY,
            &[(0, "element segment"), (1, "Unknown flags: 7")],
        );

        let segment =
            expect_read::<ElementSegment>(b"\x03\x00\x01\x05", Features::REFERENCE_TYPES)
                .into_value();
        assert!(matches!(segment, ElementSegment::Declared { .. }));
        let segment =
            expect_read::<ElementSegment>(b"\x07\x70\x01\xd0\x0b", Features::REFERENCE_TYPES)
                .into_value();
        assert!(matches!(segment, ElementSegment::DeclaredExpressions { .. }));
    }

    #[test]
    fn test_element_segment_bulk_memory_past_end() {
        let features = Features::BULK_MEMORY;
        expect_read_error::<ElementSegment>(
            b"",
            features,
            &[(0, "element segment"), (0, "flags"), (0, "Unable to read u8")],
        );
        expect_read_error::<ElementSegment>(
            b"\x01",
            features,
            &[
                (0, "element segment"),
                (1, "external kind"),
                (1, "Unable to read u8"),
            ],
        );
        expect_read_error::<ElementSegment>(
            b"\x02",
            features,
            &[
                (0, "element segment"),
                (1, "table index"),
                (1, "Unable to read u8"),
            ],
        );
        expect_read_error::<ElementSegment>(
            b"\x05",
            features,
            &[
                (0, "element segment"),
                (1, "element type"),
                (1, "Unable to read u8"),
            ],
        );
    }

    #[test]
    fn test_data_segment_mvp() {
        let segment =
            expect_read::<DataSegment>(b"\x01\x42\x01\x0b\x04wxyz", Features::MVP).into_value();
        match segment {
            DataSegment::ActiveWithMemory {
                memory,
                offset,
                init,
            } => {
                assert_eq!(memory, 1);
                assert_eq!(offset.instruction.opcode, Opcode::I64Const);
                assert_eq!(init.as_ref(), b"wxyz");
                assert_eq!(init.span(), 4..9);
            }
            other => panic!("expected an active segment, got {other:?}"),
        }
    }

    #[test]
    fn test_data_segment_mvp_past_end() {
        expect_read_error::<DataSegment>(
            b"",
            Features::MVP,
            &[
                (0, "data segment"),
                (0, "memory index"),
                (0, "Unable to read u8"),
            ],
        );
        expect_read_error::<DataSegment>(
            b"\x00",
            Features::MVP,
            &[
                (0, "data segment"),
                (1, "offset"),
                (1, "constant expression"),
                (1, "opcode"),
                (1, "Unable to read u8"),
            ],
        );
        expect_read_error::<DataSegment>(
            b"\x00\x41\x00\x0b",
            Features::MVP,
            &[(0, "data segment"), (4, "length"), (4, "Unable to read u8")],
        );
        expect_read_error::<DataSegment>(
            b"\x00\x41\x00\x0b\x02",
            Features::MVP,
            &[(0, "data segment"), (5, "Length extends past end: 2 > 0")],
        );
    }

    #[test]
    fn test_data_segment_bulk_memory() {
        let features = Features::BULK_MEMORY;

        let segment = expect_read::<DataSegment>(b"\x01\x04wxyz", features).into_value();
        match segment {
            DataSegment::Passive { init } => assert_eq!(init.as_ref(), b"wxyz"),
            other => panic!("expected a passive segment, got {other:?}"),
        }

        // Scenario: active, memory index 1, offset i32.const 2, init "xyz".
        let segment =
            expect_read::<DataSegment>(b"\x02\x01\x41\x02\x0b\x03xyz", features).into_value();
        match segment {
            DataSegment::ActiveWithMemory {
                memory,
                offset,
                init,
            } => {
                assert_eq!(memory, 1);
                assert_eq!(offset.instruction.opcode, Opcode::I32Const);
                assert_eq!(
                    offset.instruction.immediate,
                    Immediate::S32(at(3..4, 2))
                );
                assert_eq!(init.as_ref(), b"xyz");
            }
            other => panic!("expected an active segment, got {other:?}"),
        }

        expect_read_error::<DataSegment>(
            b"\x03",
            features,
            &[(0, "data segment"), (1, "Unknown flags: 3")],
        );
    }

    #[test]
    fn test_data_segment_bulk_memory_past_end() {
        let features = Features::BULK_MEMORY;
        expect_read_error::<DataSegment>(
            b"",
            features,
            &[(0, "data segment"), (0, "flags"), (0, "Unable to read u8")],
        );
        expect_read_error::<DataSegment>(
            b"\x01",
            features,
            &[(0, "data segment"), (1, "length"), (1, "Unable to read u8")],
        );
        expect_read_error::<DataSegment>(
            b"\x01\x01",
            features,
            &[(0, "data segment"), (2, "Length extends past end: 1 > 0")],
        );
        expect_read_error::<DataSegment>(
            b"\x02",
            features,
            &[
                (0, "data segment"),
                (1, "memory index"),
                (1, "Unable to read u8"),
            ],
        );
    }

    #[test]
    fn test_section_id() {
        assert_eq!(
            *expect_read::<SectionId>(b"\x00", Features::MVP),
            SectionId::Custom
        );
        assert_eq!(
            *expect_read::<SectionId>(b"\x0b", Features::MVP),
            SectionId::Data
        );
        // Section ids are u32s; overlong encodings are accepted.
        assert_eq!(
            *expect_read::<SectionId>(b"\x80\x00", Features::MVP),
            SectionId::Custom
        );
        expect_read_error::<SectionId>(
            b"\x0c",
            Features::MVP,
            &[(0, "section id"), (1, "Unknown section id: 12")],
        );
        assert_eq!(
            *expect_read::<SectionId>(b"\x0c", Features::BULK_MEMORY),
            SectionId::DataCount
        );
        expect_read_error::<SectionId>(
            b"\x0d",
            Features::MVP,
            &[(0, "section id"), (1, "Unknown section id: 13")],
        );
        assert_eq!(
            *expect_read::<SectionId>(b"\x0d", Features::EXCEPTIONS),
            SectionId::Event
        );
        expect_read_error::<SectionId>(
            b"\x0e",
            Features::MVP,
            &[(0, "section id"), (1, "Unknown section id: 14")],
        );
    }

    #[test]
    fn test_section() {
        let section =
            expect_read::<Section>(b"\x01\x03\x01\x02\x03", Features::MVP).into_value();
        match section {
            Section::Known(known) => {
                assert_eq!(known.id, SectionId::Type);
                assert_eq!(*known.data.value(), b"\x01\x02\x03");
                assert_eq!(known.data.span(), 2..5);
            }
            Section::Custom(_) => panic!("expected a known section"),
        }

        let section =
            expect_read::<Section>(b"\x00\x08\x04name\x04\x05\x06", Features::MVP).into_value();
        match section {
            Section::Custom(custom) => {
                assert_eq!(*custom.name.value(), "name");
                assert_eq!(*custom.data.value(), b"\x04\x05\x06");
            }
            Section::Known(_) => panic!("expected a custom section"),
        }
    }

    #[test]
    fn test_section_past_end() {
        expect_read_error::<Section>(
            b"",
            Features::MVP,
            &[
                (0, "section"),
                (0, "section id"),
                (0, "u32"),
                (0, "Unable to read u8"),
            ],
        );
        expect_read_error::<Section>(
            b"\x01",
            Features::MVP,
            &[(0, "section"), (1, "length"), (1, "Unable to read u8")],
        );
        expect_read_error::<Section>(
            b"\x01\x01",
            Features::MVP,
            &[(0, "section"), (2, "Length extends past end: 1 > 0")],
        );
    }

    #[test]
    fn test_name_assoc() {
        let assoc = expect_read::<NameAssoc>(b"\x02\x02hi", Features::MVP).into_value();
        assert_eq!(assoc.index, 2);
        assert_eq!(*assoc.name.value(), "hi");

        expect_read_error::<NameAssoc>(
            b"",
            Features::MVP,
            &[(0, "name assoc"), (0, "index"), (0, "Unable to read u8")],
        );
        expect_read_error::<NameAssoc>(
            b"\x00",
            Features::MVP,
            &[
                (0, "name assoc"),
                (1, "name"),
                (1, "length"),
                (1, "Unable to read u8"),
            ],
        );
    }

    #[test]
    fn test_indirect_name_assoc() {
        let assoc = expect_read::<IndirectNameAssoc>(
            b"\x64\x02\x00\x04zero\x01\x03one",
            Features::MVP,
        )
        .into_value();
        assert_eq!(assoc.index, 100);
        assert_eq!(assoc.name_map.len(), 2);
        assert_eq!(assoc.name_map[0].index, 0);
        assert_eq!(*assoc.name_map[0].name.value(), "zero");
        assert_eq!(*assoc.name_map[1].name.value(), "one");

        expect_read_error::<IndirectNameAssoc>(
            b"\x00\x01",
            Features::MVP,
            &[
                (0, "indirect name assoc"),
                (1, "name map"),
                (2, "Count extends past end: 1 > 0"),
            ],
        );
    }

    #[test]
    fn test_name_subsection() {
        let subsection =
            expect_read::<NameSubsection>(b"\x00\x01\x00", Features::MVP).into_value();
        assert_eq!(subsection.id, NameSubsectionId::ModuleName);
        assert_eq!(*subsection.data.value(), b"\x00");

        expect_read_error::<NameSubsection>(
            b"\x03",
            Features::MVP,
            &[
                (0, "name subsection"),
                (0, "name subsection id"),
                (1, "Unknown name subsection id: 3"),
            ],
        );
        expect_read_error::<NameSubsection>(
            b"\x00",
            Features::MVP,
            &[
                (0, "name subsection"),
                (1, "length"),
                (1, "Unable to read u8"),
            ],
        );
    }
}
