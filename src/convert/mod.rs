// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Text-form to binary-form conversion.
//!
//! The converter walks a resolved text tree (see [`text`]) in source order
//! and materialises an owned binary [`Module`]:
//!
//! * omitted indices (tables, memories, `call_indirect` tables, copy/init
//!   targets) default to 0;
//! * adjacent locals of the same type fuse into run-length runs, with
//!   source order preserved;
//! * inline block results become value-type block types, absent results
//!   become void, and type uses become (31-bit) indices;
//! * memory accesses with omitted alignment get the opcode's natural
//!   alignment; explicit alignments convert from bytes to log2;
//! * instruction bodies serialise through the encoder into owned buffers,
//!   with the terminating `end` appended;
//! * items carrying an inline import contribute an Import entry and
//!   nothing else.
//!
//! The symmetric binary-to-text direction is not provided.

pub mod text;

use std::borrow::Cow;

use crate::encode::Write;
use crate::located::Located;
use crate::types::*;

/// Converts a resolved text module into a binary module tree.
pub fn text_to_binary(module: &text::Module) -> Module<'static> {
    tracing::trace!(items = module.items.len(), "converting text module");
    let mut result = Module::default();
    for item in &module.items {
        match item {
            text::Item::Type(type_def) => {
                result.types.push(convert_type_def(type_def).into());
            }
            text::Item::Import(import) => {
                result.imports.push(convert_import(import).into());
            }
            text::Item::Function(function) => {
                if let Some(import) = &function.import {
                    result.imports.push(
                        inline_import(import, ImportDesc::Function(function.type_use.0.into()))
                            .into(),
                    );
                } else {
                    result.functions.push(
                        Function {
                            type_index: function.type_use.0.into(),
                        }
                        .into(),
                    );
                    result.codes.push(convert_code(function).into());
                }
            }
            text::Item::Table(table) => {
                let ty = convert_table_type(&table.ty);
                if let Some(import) = &table.import {
                    result
                        .imports
                        .push(inline_import(import, ImportDesc::Table(ty.into())).into());
                } else {
                    result.tables.push(Table { ty: ty.into() }.into());
                }
            }
            text::Item::Memory(memory) => {
                let ty = convert_memory_type(&memory.ty);
                if let Some(import) = &memory.import {
                    result
                        .imports
                        .push(inline_import(import, ImportDesc::Memory(ty.into())).into());
                } else {
                    result.memories.push(Memory { ty: ty.into() }.into());
                }
            }
            text::Item::Global(global) => {
                let ty = convert_global_type(&global.ty);
                if let Some(import) = &global.import {
                    result
                        .imports
                        .push(inline_import(import, ImportDesc::Global(ty.into())).into());
                } else {
                    let init = global
                        .init
                        .as_ref()
                        .expect("non-imported global requires an initializer");
                    result.globals.push(
                        Global {
                            ty: ty.into(),
                            init: convert_constant_expression(init).into(),
                        }
                        .into(),
                    );
                }
            }
            text::Item::Export(export) => {
                result.exports.push(
                    Export {
                        name: Located::from(Cow::Owned(export.name.clone())),
                        kind: export.kind.into(),
                        index: export.var.0.into(),
                    }
                    .into(),
                );
            }
            text::Item::Start(start) => {
                result.start = Some(
                    Start {
                        func_index: start.var.0.into(),
                    }
                    .into(),
                );
            }
            text::Item::Element(segment) => {
                result
                    .element_segments
                    .push(convert_element_segment(segment).into());
            }
            text::Item::Data(segment) => {
                result
                    .data_segments
                    .push(convert_data_segment(segment).into());
            }
            text::Item::Event(event) => {
                let ty = convert_event_type(&event.ty);
                if let Some(import) = &event.import {
                    result
                        .imports
                        .push(inline_import(import, ImportDesc::Event(ty.into())).into());
                } else {
                    result.events.push(Event { ty: ty.into() }.into());
                }
            }
        }
    }
    result
}

fn convert_type_def(type_def: &text::TypeDef) -> TypeEntry {
    // Parameter identifiers are dropped; only the types survive.
    let params = type_def
        .params
        .iter()
        .map(|param| param.ty.into())
        .collect();
    let results = type_def
        .results
        .iter()
        .map(|&result| result.into())
        .collect();
    TypeEntry {
        ty: FunctionType { params, results }.into(),
    }
}

fn inline_import(import: &text::InlineImport, desc: ImportDesc) -> Import<'static> {
    Import {
        module: Located::from(Cow::Owned(import.module.clone())),
        name: Located::from(Cow::Owned(import.name.clone())),
        desc,
    }
}

fn convert_import(import: &text::Import) -> Import<'static> {
    let desc = match &import.desc {
        text::ImportDesc::Function(type_use) => ImportDesc::Function(type_use.0.into()),
        text::ImportDesc::Table(ty) => ImportDesc::Table(convert_table_type(ty).into()),
        text::ImportDesc::Memory(ty) => ImportDesc::Memory(convert_memory_type(ty).into()),
        text::ImportDesc::Global(ty) => ImportDesc::Global(convert_global_type(ty).into()),
        text::ImportDesc::Event(ty) => ImportDesc::Event(convert_event_type(ty).into()),
    };
    Import {
        module: Located::from(Cow::Owned(import.module.clone())),
        name: Located::from(Cow::Owned(import.name.clone())),
        desc,
    }
}

fn convert_limits(limits: &text::Limits) -> Limits {
    Limits {
        min: limits.min.into(),
        max: limits.max.map(Located::from),
        shared: if limits.shared {
            Shared::Yes.into()
        } else {
            Shared::No.into()
        },
    }
}

fn convert_table_type(ty: &text::TableType) -> TableType {
    TableType {
        ty: ty.ty.into(),
        limits: convert_limits(&ty.limits).into(),
    }
}

fn convert_memory_type(ty: &text::MemoryType) -> MemoryType {
    MemoryType {
        limits: convert_limits(&ty.limits).into(),
    }
}

fn convert_global_type(ty: &text::GlobalType) -> GlobalType {
    GlobalType {
        ty: ty.ty.into(),
        mutability: ty.mutability.into(),
    }
}

fn convert_event_type(ty: &text::EventType) -> EventType {
    EventType {
        attribute: ty.attribute.into(),
        type_index: ty.type_use.0.into(),
    }
}

// Fuses adjacent bindings of the same type into run-length runs. Order is
// preserved; non-adjacent runs of the same type are not merged.
fn convert_locals(locals: &[text::BoundValueType]) -> Vec<Located<Locals>> {
    let mut runs: Vec<Located<Locals>> = Vec::new();
    for local in locals {
        match runs.last_mut() {
            Some(run) if *run.ty.value() == local.ty => {
                *run.count += 1;
            }
            _ => runs.push(
                Locals {
                    count: 1.into(),
                    ty: local.ty.into(),
                }
                .into(),
            ),
        }
    }
    runs
}

fn convert_code(function: &text::Function) -> Code<'static> {
    Code {
        locals: convert_locals(&function.locals),
        body: convert_expression(&function.instructions),
    }
}

// Serialises an instruction list into an owned expression buffer, with
// the implicit terminating `end` appended.
fn convert_expression(instructions: &[text::Instruction]) -> Located<Expression<'static>> {
    let mut buffer = Vec::new();
    for instruction in instructions {
        convert_instruction(instruction).write(&mut buffer);
    }
    Instruction::bare(Opcode::End.into()).write(&mut buffer);
    Expression::new(buffer).into()
}

fn convert_constant_expression(expression: &text::ConstantExpression) -> ConstantExpression {
    ConstantExpression {
        instruction: convert_instruction(&expression.instruction).into(),
    }
}

fn convert_element_expression(expression: &text::ElementExpression) -> ElementExpression {
    ElementExpression {
        instruction: convert_instruction(&expression.instruction).into(),
    }
}

fn convert_block_type(block_type: text::BlockType) -> BlockType {
    match block_type {
        text::BlockType::Inline(None) => BlockType::Void,
        text::BlockType::Inline(Some(ty)) => BlockType::Value(ty),
        text::BlockType::TypeUse(type_use) => {
            // Block type indices are encoded as non-negative signed LEBs.
            assert!(type_use.0 < 0x8000_0000, "block type index out of range");
            BlockType::Index(type_use.0)
        }
    }
}

// Converts an alignment in bytes to its log2 encoding. Non-power-of-two
// alignments are a precondition violation in the text tree.
fn align_log2(align: u32) -> u32 {
    assert!(
        align.is_power_of_two(),
        "alignment must be a power of two, got {align}"
    );
    align.trailing_zeros()
}

fn convert_opt_var(var: Option<text::Var>) -> Located<Index> {
    var.map_or(0, |var| var.0).into()
}

fn convert_vars(vars: &[text::Var]) -> Vec<Located<Index>> {
    vars.iter().map(|var| var.0.into()).collect()
}

fn convert_instruction(instruction: &text::Instruction) -> Instruction {
    let opcode = instruction.opcode;
    let immediate = match &instruction.immediate {
        text::Immediate::None => Immediate::None,
        text::Immediate::S32(value) => Immediate::S32((*value).into()),
        text::Immediate::S64(value) => Immediate::S64((*value).into()),
        text::Immediate::F32(value) => Immediate::F32((*value).into()),
        text::Immediate::F64(value) => Immediate::F64((*value).into()),
        text::Immediate::V128(value) => Immediate::V128((*value).into()),
        text::Immediate::Var(var) => Immediate::Index(var.0.into()),
        text::Immediate::Block(block_type) => {
            Immediate::BlockType(convert_block_type(*block_type).into())
        }
        text::Immediate::BrOnExn { target, event } => Immediate::BrOnExn(
            BrOnExnImmediate {
                target: target.0.into(),
                event_index: event.0.into(),
            }
            .into(),
        ),
        text::Immediate::BrTable {
            targets,
            default_target,
        } => Immediate::BrTable(
            BrTableImmediate {
                targets: convert_vars(targets),
                default_target: default_target.0.into(),
            }
            .into(),
        ),
        text::Immediate::CallIndirect { type_use, table } => Immediate::CallIndirect(
            CallIndirectImmediate {
                type_index: type_use.0.into(),
                table_index: convert_opt_var(*table),
            }
            .into(),
        ),
        text::Immediate::Copy { dst, src } => Immediate::Copy(
            CopyImmediate {
                dst: convert_opt_var(*dst),
                src: convert_opt_var(*src),
            }
            .into(),
        ),
        text::Immediate::Init { segment, dst } => Immediate::Init(
            InitImmediate {
                segment: segment.0.into(),
                dst: convert_opt_var(*dst),
            }
            .into(),
        ),
        text::Immediate::MemArg { align, offset } => {
            let align_bytes = align.unwrap_or_else(|| opcode.natural_alignment());
            Immediate::MemArg(
                MemArg {
                    align_log2: align_log2(align_bytes).into(),
                    offset: offset.unwrap_or(0).into(),
                }
                .into(),
            )
        }
        text::Immediate::SelectTypes(types) => Immediate::SelectTypes(Located::from(
            types.iter().map(|&ty| Located::from(ty)).collect::<Vec<_>>(),
        )),
        text::Immediate::Shuffle(lanes) => Immediate::Shuffle((*lanes).into()),
        text::Immediate::SimdLane(lane) => Immediate::SimdLane((*lane).into()),
    };
    Instruction::new(opcode.into(), immediate)
}

fn convert_element_segment(segment: &text::ElementSegment) -> ElementSegment {
    match (&segment.mode, &segment.elements) {
        (
            text::SegmentMode::Active { target, offset },
            text::ElementList::Indices { kind, list },
        ) => {
            let offset = convert_constant_expression(offset).into();
            let init = convert_vars(list);
            // The short active form only holds function indices for
            // table 0.
            if target.is_none() && *kind == ExternalKind::Function {
                ElementSegment::Active {
                    table: 0.into(),
                    offset,
                    init,
                }
            } else {
                ElementSegment::ActiveWithTable {
                    table: convert_opt_var(*target),
                    offset,
                    kind: (*kind).into(),
                    init,
                }
            }
        }
        (
            text::SegmentMode::Active { target, offset },
            text::ElementList::Expressions { ty, list },
        ) => {
            let offset = convert_constant_expression(offset).into();
            let init = list
                .iter()
                .map(|expression| convert_element_expression(expression).into())
                .collect();
            if target.is_none() && *ty == ElementType::Funcref {
                ElementSegment::ActiveExpressions {
                    table: 0.into(),
                    offset,
                    init,
                }
            } else {
                ElementSegment::ActiveWithTableExpressions {
                    table: convert_opt_var(*target),
                    offset,
                    ty: (*ty).into(),
                    init,
                }
            }
        }
        (text::SegmentMode::Passive, text::ElementList::Indices { kind, list }) => {
            ElementSegment::Passive {
                kind: (*kind).into(),
                init: convert_vars(list),
            }
        }
        (text::SegmentMode::Passive, text::ElementList::Expressions { ty, list }) => {
            ElementSegment::PassiveExpressions {
                ty: (*ty).into(),
                init: list
                    .iter()
                    .map(|expression| convert_element_expression(expression).into())
                    .collect(),
            }
        }
        (text::SegmentMode::Declared, text::ElementList::Indices { kind, list }) => {
            ElementSegment::Declared {
                kind: (*kind).into(),
                init: convert_vars(list),
            }
        }
        (text::SegmentMode::Declared, text::ElementList::Expressions { ty, list }) => {
            ElementSegment::DeclaredExpressions {
                ty: (*ty).into(),
                init: list
                    .iter()
                    .map(|expression| convert_element_expression(expression).into())
                    .collect(),
            }
        }
    }
}

fn convert_data_segment(segment: &text::DataSegment) -> DataSegment<'static> {
    let init = Located::from(Cow::Owned(segment.data.concat()));
    match &segment.mode {
        text::DataMode::Active { memory, offset } => {
            let offset = convert_constant_expression(offset).into();
            // Active segments keep their memory index and offset; the
            // short form is used when the memory is left implicit.
            if memory.is_none() {
                DataSegment::Active {
                    memory: 0.into(),
                    offset,
                    init,
                }
            } else {
                DataSegment::ActiveWithMemory {
                    memory: convert_opt_var(*memory),
                    offset,
                    init,
                }
            }
        }
        text::DataMode::Passive => DataSegment::Passive { init },
    }
}
