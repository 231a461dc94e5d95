// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Write trait implementations for the binary tree types.

use crate::types::*;

use super::{Write, write_string, write_var_s32, write_var_s64, write_var_u32, write_vec};

impl Write for u32 {
    fn write(&self, out: &mut Vec<u8>) {
        write_var_u32(out, *self);
    }
}

impl Write for ValueType {
    fn write(&self, out: &mut Vec<u8>) {
        out.push(self.wire());
    }
}

impl Write for ElementType {
    fn write(&self, out: &mut Vec<u8>) {
        out.push(self.wire());
    }
}

impl Write for ExternalKind {
    fn write(&self, out: &mut Vec<u8>) {
        out.push(self.wire());
    }
}

impl Write for Mutability {
    fn write(&self, out: &mut Vec<u8>) {
        out.push(*self as u8);
    }
}

impl Write for BlockType {
    fn write(&self, out: &mut Vec<u8>) {
        match self {
            BlockType::Void => out.push(0x40),
            BlockType::Value(ty) => out.push(ty.wire()),
            BlockType::Index(index) => {
                // Type-index block types are signed LEBs; indices at or
                // above 2^31 cannot be represented.
                assert!(*index < 0x8000_0000, "block type index out of range");
                write_var_s32(out, *index as i32);
            }
        }
    }
}

impl Write for Limits {
    fn write(&self, out: &mut Vec<u8>) {
        let mut flags = u8::from(self.max.is_some());
        if *self.shared.value() == Shared::Yes {
            flags |= 0x02;
        }
        out.push(flags);
        write_var_u32(out, *self.min.value());
        if let Some(max) = &self.max {
            write_var_u32(out, *max.value());
        }
    }
}

impl Write for MemoryType {
    fn write(&self, out: &mut Vec<u8>) {
        self.limits.write(out);
    }
}

impl Write for TableType {
    fn write(&self, out: &mut Vec<u8>) {
        self.ty.write(out);
        self.limits.write(out);
    }
}

impl Write for GlobalType {
    fn write(&self, out: &mut Vec<u8>) {
        self.ty.write(out);
        self.mutability.write(out);
    }
}

impl Write for EventType {
    fn write(&self, out: &mut Vec<u8>) {
        write_var_u32(out, *self.attribute.value() as u32);
        self.type_index.write(out);
    }
}

impl Write for FunctionType {
    fn write(&self, out: &mut Vec<u8>) {
        write_vec(out, &self.params);
        write_vec(out, &self.results);
    }
}

impl Write for TypeEntry {
    fn write(&self, out: &mut Vec<u8>) {
        out.push(0x60);
        self.ty.write(out);
    }
}

impl Write for Import<'_> {
    fn write(&self, out: &mut Vec<u8>) {
        write_string(out, self.module.value());
        write_string(out, self.name.value());
        self.desc.kind().write(out);
        match &self.desc {
            ImportDesc::Function(index) => index.write(out),
            ImportDesc::Table(ty) => ty.write(out),
            ImportDesc::Memory(ty) => ty.write(out),
            ImportDesc::Global(ty) => ty.write(out),
            ImportDesc::Event(ty) => ty.write(out),
        }
    }
}

impl Write for Export<'_> {
    fn write(&self, out: &mut Vec<u8>) {
        write_string(out, self.name.value());
        self.kind.write(out);
        self.index.write(out);
    }
}

impl Write for Function {
    fn write(&self, out: &mut Vec<u8>) {
        self.type_index.write(out);
    }
}

impl Write for Table {
    fn write(&self, out: &mut Vec<u8>) {
        self.ty.write(out);
    }
}

impl Write for Memory {
    fn write(&self, out: &mut Vec<u8>) {
        self.ty.write(out);
    }
}

impl Write for Global {
    fn write(&self, out: &mut Vec<u8>) {
        self.ty.write(out);
        self.init.write(out);
    }
}

impl Write for Start {
    fn write(&self, out: &mut Vec<u8>) {
        self.func_index.write(out);
    }
}

impl Write for Event {
    fn write(&self, out: &mut Vec<u8>) {
        self.ty.write(out);
    }
}

impl Write for Expression<'_> {
    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.data);
    }
}

impl Write for ConstantExpression {
    fn write(&self, out: &mut Vec<u8>) {
        self.instruction.write(out);
        out.push(0x0b);
    }
}

impl Write for ElementExpression {
    fn write(&self, out: &mut Vec<u8>) {
        self.instruction.write(out);
        out.push(0x0b);
    }
}

impl Write for Locals {
    fn write(&self, out: &mut Vec<u8>) {
        write_var_u32(out, *self.count.value());
        self.ty.write(out);
    }
}

impl Write for Code<'_> {
    fn write(&self, out: &mut Vec<u8>) {
        let mut body = Vec::new();
        write_vec(&mut body, &self.locals);
        self.body.write(&mut body);
        write_var_u32(out, body.len() as u32);
        out.extend_from_slice(&body);
    }
}

impl Write for ElementSegment {
    fn write(&self, out: &mut Vec<u8>) {
        match self {
            ElementSegment::Active {
                table: _,
                offset,
                init,
            } => {
                out.push(0x00);
                offset.write(out);
                write_vec(out, init);
            }
            ElementSegment::Passive { kind, init } => {
                out.push(0x01);
                kind.write(out);
                write_vec(out, init);
            }
            ElementSegment::ActiveWithTable {
                table,
                offset,
                kind,
                init,
            } => {
                out.push(0x02);
                table.write(out);
                offset.write(out);
                kind.write(out);
                write_vec(out, init);
            }
            ElementSegment::Declared { kind, init } => {
                out.push(0x03);
                kind.write(out);
                write_vec(out, init);
            }
            ElementSegment::ActiveExpressions {
                table: _,
                offset,
                init,
            } => {
                out.push(0x04);
                offset.write(out);
                write_vec(out, init);
            }
            ElementSegment::PassiveExpressions { ty, init } => {
                out.push(0x05);
                ty.write(out);
                write_vec(out, init);
            }
            ElementSegment::ActiveWithTableExpressions {
                table,
                offset,
                ty,
                init,
            } => {
                out.push(0x06);
                table.write(out);
                offset.write(out);
                ty.write(out);
                write_vec(out, init);
            }
            ElementSegment::DeclaredExpressions { ty, init } => {
                out.push(0x07);
                ty.write(out);
                write_vec(out, init);
            }
        }
    }
}

impl Write for DataSegment<'_> {
    fn write(&self, out: &mut Vec<u8>) {
        match self {
            DataSegment::Active {
                memory: _,
                offset,
                init,
            } => {
                out.push(0x00);
                offset.write(out);
                write_var_u32(out, init.len() as u32);
                out.extend_from_slice(init);
            }
            DataSegment::Passive { init } => {
                out.push(0x01);
                write_var_u32(out, init.len() as u32);
                out.extend_from_slice(init);
            }
            DataSegment::ActiveWithMemory {
                memory,
                offset,
                init,
            } => {
                out.push(0x02);
                memory.write(out);
                offset.write(out);
                write_var_u32(out, init.len() as u32);
                out.extend_from_slice(init);
            }
        }
    }
}

impl Write for KnownSection<'_> {
    fn write(&self, out: &mut Vec<u8>) {
        out.push(self.id.wire());
        write_var_u32(out, self.data.len() as u32);
        out.extend_from_slice(self.data.value());
    }
}

impl Write for CustomSection<'_> {
    fn write(&self, out: &mut Vec<u8>) {
        out.push(SectionId::Custom.wire());
        let mut payload = Vec::new();
        write_string(&mut payload, self.name.value());
        payload.extend_from_slice(self.data.value());
        write_var_u32(out, payload.len() as u32);
        out.extend_from_slice(&payload);
    }
}

impl Write for Section<'_> {
    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Section::Known(section) => section.write(out),
            Section::Custom(section) => section.write(out),
        }
    }
}

impl Write for NameAssoc<'_> {
    fn write(&self, out: &mut Vec<u8>) {
        self.index.write(out);
        write_string(out, self.name.value());
    }
}

impl Write for IndirectNameAssoc<'_> {
    fn write(&self, out: &mut Vec<u8>) {
        self.index.write(out);
        write_vec(out, &self.name_map);
    }
}

impl Write for NameSubsection<'_> {
    fn write(&self, out: &mut Vec<u8>) {
        out.push(*self.id.value() as u8);
        write_var_u32(out, self.data.len() as u32);
        out.extend_from_slice(self.data.value());
    }
}

impl Write for Instruction {
    fn write(&self, out: &mut Vec<u8>) {
        let (prefix, code) = self.opcode.wire();
        if prefix == 0 {
            out.push(code as u8);
        } else {
            out.push(prefix);
            write_var_u32(out, code);
        }
        self.immediate.write(out);
    }
}

impl Write for Immediate {
    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Immediate::None => {}
            Immediate::BlockType(block_type) => block_type.write(out),
            Immediate::Index(index) => index.write(out),
            Immediate::CallIndirect(immediate) => {
                immediate.type_index.write(out);
                immediate.table_index.write(out);
            }
            Immediate::BrTable(immediate) => {
                write_vec(out, &immediate.targets);
                immediate.default_target.write(out);
            }
            Immediate::BrOnExn(immediate) => {
                immediate.target.write(out);
                immediate.event_index.write(out);
            }
            Immediate::Byte(byte) => out.push(*byte.value()),
            Immediate::MemArg(memarg) => {
                memarg.align_log2.write(out);
                memarg.offset.write(out);
            }
            Immediate::S32(value) => write_var_s32(out, *value.value()),
            Immediate::S64(value) => write_var_s64(out, *value.value()),
            Immediate::F32(value) => out.extend_from_slice(&value.to_le_bytes()),
            Immediate::F64(value) => out.extend_from_slice(&value.to_le_bytes()),
            Immediate::V128(value) => out.extend_from_slice(&value.bytes()),
            Immediate::Init(immediate) => {
                immediate.segment.write(out);
                immediate.dst.write(out);
            }
            Immediate::Copy(immediate) => {
                immediate.dst.write(out);
                immediate.src.write(out);
            }
            Immediate::SelectTypes(types) => write_vec(out, types.value()),
            Immediate::Shuffle(lanes) => out.extend_from_slice(lanes.value()),
            Immediate::SimdLane(lane) => out.push(*lane.value()),
        }
    }
}
