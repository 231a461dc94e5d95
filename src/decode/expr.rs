// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Instruction and expression decoding.
//!
//! Instructions dispatch on the first opcode byte; the `0xfc`/`0xfd`/`0xfe`
//! prefixes (when their features are enabled) select secondary tables via
//! a trailing u32 LEB. The immediate that follows is determined by the
//! opcode table's immediate-kind column.
//!
//! Expressions are instruction sequences terminated by an `end` at nesting
//! depth zero; constant and element expressions restrict the permitted
//! opcodes to a feature-dependent set.

use crate::Features;
use crate::located::Located;
use crate::types::{
    BlockType, BrOnExnImmediate, BrTableImmediate, CallIndirectImmediate, ConstantExpression,
    CopyImmediate, ElementExpression, Expression, Immediate, ImmediateKind, InitImmediate,
    Instruction, MemArg, Opcode, V128, ValueType,
};

use super::{
    Cursor, Error, Errors, Read, ReadContext, leb128, read_f32, read_f64, read_guarded,
    read_index, read_s32, read_s64, read_vector,
};

/// Decodes a single instruction: an opcode and its immediate.
pub fn read_instruction<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<Located<Instruction>> {
    let start = cursor.pos();
    let opcode = read_opcode(cursor, ctx)?;
    let immediate = read_immediate(cursor, ctx, *opcode.value())?;
    Some(Located::new(
        start..cursor.pos(),
        Instruction { opcode, immediate },
    ))
}

impl<'a> Read<'a> for Instruction {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_instruction(cursor, ctx)
    }
}

fn read_opcode<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<Located<Opcode>> {
    read_guarded(cursor, ctx, "opcode", |cursor, ctx| {
        let byte = cursor.read_u8(ctx)?;
        if Opcode::prefix_enabled(byte, ctx.features) {
            let code = leb128::read(cursor, ctx)?;
            let opcode = Opcode::from_wire(byte, code, ctx.features);
            if opcode.is_none() {
                ctx.report(
                    cursor.pos(),
                    Error::UnknownPrefixedOpcode { prefix: byte, code },
                );
            }
            opcode
        } else {
            // A disabled prefix byte reads as an unknown single-byte
            // opcode.
            let opcode = Opcode::from_wire(0, u32::from(byte), ctx.features);
            if opcode.is_none() {
                ctx.report(cursor.pos(), Error::UnknownOpcode(byte));
            }
            opcode
        }
    })
}

fn read_reserved<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<Located<u8>> {
    read_guarded(cursor, ctx, "reserved", |cursor, ctx| {
        let byte = cursor.read_u8(ctx)?;
        if byte == 0 {
            Some(0)
        } else {
            ctx.report(cursor.pos(), Error::ReservedMismatch(byte));
            None
        }
    })
}

fn read_memarg<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<Located<MemArg>> {
    read_guarded(cursor, ctx, "memarg", |cursor, ctx| {
        Some(MemArg {
            align_log2: read_guarded(cursor, ctx, "align log2", leb128::read)?,
            offset: read_guarded(cursor, ctx, "offset", leb128::read)?,
        })
    })
}

fn read_immediate<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
    opcode: Opcode,
) -> Option<Immediate> {
    let reference_types = ctx.features.contains(Features::REFERENCE_TYPES);
    Some(match opcode.immediate_kind() {
        ImmediateKind::None => Immediate::None,
        ImmediateKind::BlockType => Immediate::BlockType(BlockType::read(cursor, ctx)?),
        ImmediateKind::Index => Immediate::Index(read_index(cursor, ctx, "index")?),
        ImmediateKind::BrTable => {
            Immediate::BrTable(read_guarded(cursor, ctx, "br_table", |cursor, ctx| {
                Some(BrTableImmediate {
                    targets: read_vector::<u32, E>(cursor, ctx, "targets")?.into_value(),
                    default_target: read_index(cursor, ctx, "default target")?,
                })
            })?)
        }
        ImmediateKind::CallIndirect => Immediate::CallIndirect(read_guarded(
            cursor,
            ctx,
            "call_indirect",
            |cursor, ctx| {
                let type_index = read_index(cursor, ctx, "type index")?;
                let table_index = if reference_types {
                    read_index(cursor, ctx, "table index")?
                } else {
                    read_reserved(cursor, ctx)?.map(u32::from)
                };
                Some(CallIndirectImmediate {
                    type_index,
                    table_index,
                })
            },
        )?),
        ImmediateKind::BrOnExn => {
            Immediate::BrOnExn(read_guarded(cursor, ctx, "br_on_exn", |cursor, ctx| {
                Some(BrOnExnImmediate {
                    target: read_index(cursor, ctx, "target")?,
                    event_index: read_index(cursor, ctx, "event index")?,
                })
            })?)
        }
        ImmediateKind::ReservedByte => Immediate::Byte(read_reserved(cursor, ctx)?),
        ImmediateKind::MemArg => Immediate::MemArg(read_memarg(cursor, ctx)?),
        ImmediateKind::S32 => Immediate::S32(read_s32(cursor, ctx)?),
        ImmediateKind::S64 => Immediate::S64(read_s64(cursor, ctx)?),
        ImmediateKind::F32 => Immediate::F32(read_f32(cursor, ctx)?),
        ImmediateKind::F64 => Immediate::F64(read_f64(cursor, ctx)?),
        ImmediateKind::V128 => {
            Immediate::V128(read_guarded(cursor, ctx, "v128", |cursor, ctx| {
                cursor.read_array::<16, E>(ctx).map(V128::new)
            })?)
        }
        ImmediateKind::InitMem => Immediate::Init(read_guarded(
            cursor,
            ctx,
            "init immediate",
            |cursor, ctx| {
                let segment = read_index(cursor, ctx, "segment index")?;
                let dst = read_reserved(cursor, ctx)?.map(u32::from);
                Some(InitImmediate { segment, dst })
            },
        )?),
        ImmediateKind::InitTable => Immediate::Init(read_guarded(
            cursor,
            ctx,
            "init immediate",
            |cursor, ctx| {
                let segment = read_index(cursor, ctx, "segment index")?;
                let dst = if reference_types {
                    read_index(cursor, ctx, "table index")?
                } else {
                    read_reserved(cursor, ctx)?.map(u32::from)
                };
                Some(InitImmediate { segment, dst })
            },
        )?),
        ImmediateKind::CopyMem => Immediate::Copy(read_guarded(
            cursor,
            ctx,
            "copy immediate",
            |cursor, ctx| {
                let dst = read_reserved(cursor, ctx)?.map(u32::from);
                let src = read_reserved(cursor, ctx)?.map(u32::from);
                Some(CopyImmediate { dst, src })
            },
        )?),
        ImmediateKind::CopyTable => Immediate::Copy(read_guarded(
            cursor,
            ctx,
            "copy immediate",
            |cursor, ctx| {
                let (dst, src) = if reference_types {
                    (
                        read_index(cursor, ctx, "table index")?,
                        read_index(cursor, ctx, "table index")?,
                    )
                } else {
                    (
                        read_reserved(cursor, ctx)?.map(u32::from),
                        read_reserved(cursor, ctx)?.map(u32::from),
                    )
                };
                Some(CopyImmediate { dst, src })
            },
        )?),
        ImmediateKind::SelectTypes => {
            Immediate::SelectTypes(read_vector::<ValueType, E>(cursor, ctx, "select types")?)
        }
        ImmediateKind::Shuffle => Immediate::Shuffle(read_guarded(
            cursor,
            ctx,
            "shuffle immediate",
            |cursor, ctx| {
                let mut lanes = [0u8; 16];
                for lane in &mut lanes {
                    *lane = cursor.read_u8(ctx)?;
                }
                Some(lanes)
            },
        )?),
        ImmediateKind::SimdLane => {
            Immediate::SimdLane(read_guarded(cursor, ctx, "lane", |cursor, ctx| {
                cursor.read_u8(ctx)
            })?)
        }
    })
}

/// Decodes an expression: instructions up to and including the `end` that
/// closes nesting depth zero. The expression's bytes are borrowed from
/// the input.
pub fn read_expression<'a, E: Errors>(
    cursor: &mut Cursor<'a>,
    ctx: &mut ReadContext<'_, E>,
) -> Option<Located<Expression<'a>>> {
    let start = cursor.pos();
    let mut depth = 0u32;
    loop {
        let instruction = read_instruction(cursor, ctx)?;
        match *instruction.opcode.value() {
            Opcode::Block | Opcode::Loop | Opcode::If | Opcode::Try => depth += 1,
            Opcode::End => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    let bytes = cursor.slice(start, cursor.pos());
    Some(Located::new(start..cursor.pos(), Expression::new(bytes)))
}

impl<'a> Read<'a> for Expression<'a> {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_expression(cursor, ctx)
    }
}

// The opcodes permitted in a constant expression. Reference types extends
// the MVP set; the list is derived from the feature flags rather than
// fixed.
fn constant_expression_opcode(opcode: Opcode, features: Features) -> bool {
    matches!(
        opcode,
        Opcode::I32Const
            | Opcode::I64Const
            | Opcode::F32Const
            | Opcode::F64Const
            | Opcode::GlobalGet
    ) || (features.contains(Features::REFERENCE_TYPES)
        && matches!(opcode, Opcode::RefNull | Opcode::RefFunc))
}

impl<'a> Read<'a> for ConstantExpression {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "constant expression", |cursor, ctx| {
            let instruction = read_instruction(cursor, ctx)?;
            if !constant_expression_opcode(*instruction.opcode.value(), ctx.features) {
                ctx.report(
                    cursor.pos(),
                    Error::IllegalConstantInstruction(*instruction.opcode.value()),
                );
                return None;
            }
            let terminator = read_instruction(cursor, ctx)?;
            if *terminator.opcode.value() != Opcode::End {
                ctx.report(cursor.pos(), Error::ExpectedEnd);
                return None;
            }
            Some(ConstantExpression { instruction })
        })
    }
}

impl<'a> Read<'a> for ElementExpression {
    fn read<E: Errors>(
        cursor: &mut Cursor<'a>,
        ctx: &mut ReadContext<'_, E>,
    ) -> Option<Located<Self>> {
        read_guarded(cursor, ctx, "element expression", |cursor, ctx| {
            // Element expressions carry reference instructions even when
            // only bulk memory is enabled.
            let saved = ctx.features;
            ctx.features |= Features::REFERENCE_TYPES;
            let result = (|| {
                let instruction = read_instruction(cursor, ctx)?;
                if !matches!(
                    *instruction.opcode.value(),
                    Opcode::RefNull | Opcode::RefFunc
                ) {
                    ctx.report(
                        cursor.pos(),
                        Error::IllegalElementInstruction(*instruction.opcode.value()),
                    );
                    return None;
                }
                let terminator = read_instruction(cursor, ctx)?;
                if *terminator.opcode.value() != Opcode::End {
                    ctx.report(cursor.pos(), Error::ExpectedEnd);
                    return None;
                }
                Some(ElementExpression { instruction })
            })();
            ctx.features = saved;
            result
        })
    }
}

/// Walks the instructions of a decoded [`Expression`].
///
/// Offsets in the yielded spans are relative to the start of the
/// expression's bytes. Iteration ends after the `end` that closes depth
/// zero, at the end of the data, or at the first failed instruction.
pub struct InstructionIter<'a, 'e, E: Errors> {
    cursor: Cursor<'a>,
    ctx: ReadContext<'e, E>,
    depth: u32,
    done: bool,
}

impl<'a, E: Errors> Iterator for InstructionIter<'a, '_, E> {
    type Item = Located<Instruction>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor.is_empty() {
            return None;
        }
        let Some(instruction) = read_instruction(&mut self.cursor, &mut self.ctx) else {
            self.done = true;
            return None;
        };
        match *instruction.opcode.value() {
            Opcode::Block | Opcode::Loop | Opcode::If | Opcode::Try => self.depth += 1,
            Opcode::End => {
                if self.depth == 0 {
                    self.done = true;
                } else {
                    self.depth -= 1;
                }
            }
            _ => {}
        }
        Some(instruction)
    }
}

/// Iterates the instructions of an expression's raw bytes.
pub fn expression_instructions<'a, 'e, E: Errors>(
    expression: &'a Expression<'_>,
    features: Features,
    errors: &'e mut E,
) -> InstructionIter<'a, 'e, E> {
    InstructionIter {
        cursor: Cursor::new(expression.data.as_ref()),
        ctx: ReadContext::new(features, errors),
        depth: 0,
        done: false,
    }
}
