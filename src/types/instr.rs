// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! WebAssembly instruction opcodes and immediates.
//!
//! The opcode space is a single table with one row per instruction:
//! wire encoding (prefix byte and code), text mnemonic, gating feature,
//! immediate shape, and natural alignment for memory accesses. The
//! decoder, encoder, mnemonic display, and the text converter's alignment
//! defaulting all index this table.

use core::fmt;

use crate::Features;
use crate::located::Located;

use super::{BlockType, Index, ValueType};

// Feature requirements of the opcode table. An empty requirement is MVP;
// a two-bit requirement is satisfied by either proposal.
const MVP: Features = Features::MVP;
const SATURATING_FLOAT_TO_INT: Features = Features::SATURATING_FLOAT_TO_INT;
const SIGN_EXTENSION: Features = Features::SIGN_EXTENSION;
const REFERENCE_TYPES: Features = Features::REFERENCE_TYPES;
const BULK_MEMORY: Features = Features::BULK_MEMORY;
const BULK_OR_REFERENCE: Features = Features::BULK_MEMORY.union(Features::REFERENCE_TYPES);
const TAIL_CALL: Features = Features::TAIL_CALL;
const SIMD: Features = Features::SIMD;
const THREADS: Features = Features::THREADS;
const EXCEPTIONS: Features = Features::EXCEPTIONS;

// Invokes a callback declarative macro with every opcode row:
//
//   Name = (prefix, code, mnemonic, feature, immediate kind, natural align)
//
// A prefix of 0 marks a single-byte opcode; 0xfc/0xfd/0xfe rows are the
// misc, SIMD, and atomic tables selected by a trailing u32 LEB code.
macro_rules! for_each_opcode {
    ($m:ident) => {
        $m! {
            // Control instructions.
            Unreachable = (0, 0x00, "unreachable", MVP, None, 0),
            Nop = (0, 0x01, "nop", MVP, None, 0),
            Block = (0, 0x02, "block", MVP, BlockType, 0),
            Loop = (0, 0x03, "loop", MVP, BlockType, 0),
            If = (0, 0x04, "if", MVP, BlockType, 0),
            Else = (0, 0x05, "else", MVP, None, 0),
            Try = (0, 0x06, "try", EXCEPTIONS, BlockType, 0),
            Catch = (0, 0x07, "catch", EXCEPTIONS, None, 0),
            Throw = (0, 0x08, "throw", EXCEPTIONS, Index, 0),
            Rethrow = (0, 0x09, "rethrow", EXCEPTIONS, None, 0),
            BrOnExn = (0, 0x0a, "br_on_exn", EXCEPTIONS, BrOnExn, 0),
            End = (0, 0x0b, "end", MVP, None, 0),
            Br = (0, 0x0c, "br", MVP, Index, 0),
            BrIf = (0, 0x0d, "br_if", MVP, Index, 0),
            BrTable = (0, 0x0e, "br_table", MVP, BrTable, 0),
            Return = (0, 0x0f, "return", MVP, None, 0),
            Call = (0, 0x10, "call", MVP, Index, 0),
            CallIndirect = (0, 0x11, "call_indirect", MVP, CallIndirect, 0),
            ReturnCall = (0, 0x12, "return_call", TAIL_CALL, Index, 0),
            ReturnCallIndirect = (0, 0x13, "return_call_indirect", TAIL_CALL, CallIndirect, 0),

            // Parametric instructions.
            Drop = (0, 0x1a, "drop", MVP, None, 0),
            Select = (0, 0x1b, "select", MVP, None, 0),
            SelectT = (0, 0x1c, "select", REFERENCE_TYPES, SelectTypes, 0),

            // Variable instructions.
            LocalGet = (0, 0x20, "local.get", MVP, Index, 0),
            LocalSet = (0, 0x21, "local.set", MVP, Index, 0),
            LocalTee = (0, 0x22, "local.tee", MVP, Index, 0),
            GlobalGet = (0, 0x23, "global.get", MVP, Index, 0),
            GlobalSet = (0, 0x24, "global.set", MVP, Index, 0),

            // Table instructions.
            TableGet = (0, 0x25, "table.get", REFERENCE_TYPES, Index, 0),
            TableSet = (0, 0x26, "table.set", REFERENCE_TYPES, Index, 0),

            // Memory instructions.
            I32Load = (0, 0x28, "i32.load", MVP, MemArg, 4),
            I64Load = (0, 0x29, "i64.load", MVP, MemArg, 8),
            F32Load = (0, 0x2a, "f32.load", MVP, MemArg, 4),
            F64Load = (0, 0x2b, "f64.load", MVP, MemArg, 8),
            I32Load8S = (0, 0x2c, "i32.load8_s", MVP, MemArg, 1),
            I32Load8U = (0, 0x2d, "i32.load8_u", MVP, MemArg, 1),
            I32Load16S = (0, 0x2e, "i32.load16_s", MVP, MemArg, 2),
            I32Load16U = (0, 0x2f, "i32.load16_u", MVP, MemArg, 2),
            I64Load8S = (0, 0x30, "i64.load8_s", MVP, MemArg, 1),
            I64Load8U = (0, 0x31, "i64.load8_u", MVP, MemArg, 1),
            I64Load16S = (0, 0x32, "i64.load16_s", MVP, MemArg, 2),
            I64Load16U = (0, 0x33, "i64.load16_u", MVP, MemArg, 2),
            I64Load32S = (0, 0x34, "i64.load32_s", MVP, MemArg, 4),
            I64Load32U = (0, 0x35, "i64.load32_u", MVP, MemArg, 4),
            I32Store = (0, 0x36, "i32.store", MVP, MemArg, 4),
            I64Store = (0, 0x37, "i64.store", MVP, MemArg, 8),
            F32Store = (0, 0x38, "f32.store", MVP, MemArg, 4),
            F64Store = (0, 0x39, "f64.store", MVP, MemArg, 8),
            I32Store8 = (0, 0x3a, "i32.store8", MVP, MemArg, 1),
            I32Store16 = (0, 0x3b, "i32.store16", MVP, MemArg, 2),
            I64Store8 = (0, 0x3c, "i64.store8", MVP, MemArg, 1),
            I64Store16 = (0, 0x3d, "i64.store16", MVP, MemArg, 2),
            I64Store32 = (0, 0x3e, "i64.store32", MVP, MemArg, 4),
            MemorySize = (0, 0x3f, "memory.size", MVP, ReservedByte, 0),
            MemoryGrow = (0, 0x40, "memory.grow", MVP, ReservedByte, 0),

            // Numeric instructions.
            I32Const = (0, 0x41, "i32.const", MVP, S32, 0),
            I64Const = (0, 0x42, "i64.const", MVP, S64, 0),
            F32Const = (0, 0x43, "f32.const", MVP, F32, 0),
            F64Const = (0, 0x44, "f64.const", MVP, F64, 0),
            I32Eqz = (0, 0x45, "i32.eqz", MVP, None, 0),
            I32Eq = (0, 0x46, "i32.eq", MVP, None, 0),
            I32Ne = (0, 0x47, "i32.ne", MVP, None, 0),
            I32LtS = (0, 0x48, "i32.lt_s", MVP, None, 0),
            I32LtU = (0, 0x49, "i32.lt_u", MVP, None, 0),
            I32GtS = (0, 0x4a, "i32.gt_s", MVP, None, 0),
            I32GtU = (0, 0x4b, "i32.gt_u", MVP, None, 0),
            I32LeS = (0, 0x4c, "i32.le_s", MVP, None, 0),
            I32LeU = (0, 0x4d, "i32.le_u", MVP, None, 0),
            I32GeS = (0, 0x4e, "i32.ge_s", MVP, None, 0),
            I32GeU = (0, 0x4f, "i32.ge_u", MVP, None, 0),
            I64Eqz = (0, 0x50, "i64.eqz", MVP, None, 0),
            I64Eq = (0, 0x51, "i64.eq", MVP, None, 0),
            I64Ne = (0, 0x52, "i64.ne", MVP, None, 0),
            I64LtS = (0, 0x53, "i64.lt_s", MVP, None, 0),
            I64LtU = (0, 0x54, "i64.lt_u", MVP, None, 0),
            I64GtS = (0, 0x55, "i64.gt_s", MVP, None, 0),
            I64GtU = (0, 0x56, "i64.gt_u", MVP, None, 0),
            I64LeS = (0, 0x57, "i64.le_s", MVP, None, 0),
            I64LeU = (0, 0x58, "i64.le_u", MVP, None, 0),
            I64GeS = (0, 0x59, "i64.ge_s", MVP, None, 0),
            I64GeU = (0, 0x5a, "i64.ge_u", MVP, None, 0),
            F32Eq = (0, 0x5b, "f32.eq", MVP, None, 0),
            F32Ne = (0, 0x5c, "f32.ne", MVP, None, 0),
            F32Lt = (0, 0x5d, "f32.lt", MVP, None, 0),
            F32Gt = (0, 0x5e, "f32.gt", MVP, None, 0),
            F32Le = (0, 0x5f, "f32.le", MVP, None, 0),
            F32Ge = (0, 0x60, "f32.ge", MVP, None, 0),
            F64Eq = (0, 0x61, "f64.eq", MVP, None, 0),
            F64Ne = (0, 0x62, "f64.ne", MVP, None, 0),
            F64Lt = (0, 0x63, "f64.lt", MVP, None, 0),
            F64Gt = (0, 0x64, "f64.gt", MVP, None, 0),
            F64Le = (0, 0x65, "f64.le", MVP, None, 0),
            F64Ge = (0, 0x66, "f64.ge", MVP, None, 0),
            I32Clz = (0, 0x67, "i32.clz", MVP, None, 0),
            I32Ctz = (0, 0x68, "i32.ctz", MVP, None, 0),
            I32Popcnt = (0, 0x69, "i32.popcnt", MVP, None, 0),
            I32Add = (0, 0x6a, "i32.add", MVP, None, 0),
            I32Sub = (0, 0x6b, "i32.sub", MVP, None, 0),
            I32Mul = (0, 0x6c, "i32.mul", MVP, None, 0),
            I32DivS = (0, 0x6d, "i32.div_s", MVP, None, 0),
            I32DivU = (0, 0x6e, "i32.div_u", MVP, None, 0),
            I32RemS = (0, 0x6f, "i32.rem_s", MVP, None, 0),
            I32RemU = (0, 0x70, "i32.rem_u", MVP, None, 0),
            I32And = (0, 0x71, "i32.and", MVP, None, 0),
            I32Or = (0, 0x72, "i32.or", MVP, None, 0),
            I32Xor = (0, 0x73, "i32.xor", MVP, None, 0),
            I32Shl = (0, 0x74, "i32.shl", MVP, None, 0),
            I32ShrS = (0, 0x75, "i32.shr_s", MVP, None, 0),
            I32ShrU = (0, 0x76, "i32.shr_u", MVP, None, 0),
            I32Rotl = (0, 0x77, "i32.rotl", MVP, None, 0),
            I32Rotr = (0, 0x78, "i32.rotr", MVP, None, 0),
            I64Clz = (0, 0x79, "i64.clz", MVP, None, 0),
            I64Ctz = (0, 0x7a, "i64.ctz", MVP, None, 0),
            I64Popcnt = (0, 0x7b, "i64.popcnt", MVP, None, 0),
            I64Add = (0, 0x7c, "i64.add", MVP, None, 0),
            I64Sub = (0, 0x7d, "i64.sub", MVP, None, 0),
            I64Mul = (0, 0x7e, "i64.mul", MVP, None, 0),
            I64DivS = (0, 0x7f, "i64.div_s", MVP, None, 0),
            I64DivU = (0, 0x80, "i64.div_u", MVP, None, 0),
            I64RemS = (0, 0x81, "i64.rem_s", MVP, None, 0),
            I64RemU = (0, 0x82, "i64.rem_u", MVP, None, 0),
            I64And = (0, 0x83, "i64.and", MVP, None, 0),
            I64Or = (0, 0x84, "i64.or", MVP, None, 0),
            I64Xor = (0, 0x85, "i64.xor", MVP, None, 0),
            I64Shl = (0, 0x86, "i64.shl", MVP, None, 0),
            I64ShrS = (0, 0x87, "i64.shr_s", MVP, None, 0),
            I64ShrU = (0, 0x88, "i64.shr_u", MVP, None, 0),
            I64Rotl = (0, 0x89, "i64.rotl", MVP, None, 0),
            I64Rotr = (0, 0x8a, "i64.rotr", MVP, None, 0),
            F32Abs = (0, 0x8b, "f32.abs", MVP, None, 0),
            F32Neg = (0, 0x8c, "f32.neg", MVP, None, 0),
            F32Ceil = (0, 0x8d, "f32.ceil", MVP, None, 0),
            F32Floor = (0, 0x8e, "f32.floor", MVP, None, 0),
            F32Trunc = (0, 0x8f, "f32.trunc", MVP, None, 0),
            F32Nearest = (0, 0x90, "f32.nearest", MVP, None, 0),
            F32Sqrt = (0, 0x91, "f32.sqrt", MVP, None, 0),
            F32Add = (0, 0x92, "f32.add", MVP, None, 0),
            F32Sub = (0, 0x93, "f32.sub", MVP, None, 0),
            F32Mul = (0, 0x94, "f32.mul", MVP, None, 0),
            F32Div = (0, 0x95, "f32.div", MVP, None, 0),
            F32Min = (0, 0x96, "f32.min", MVP, None, 0),
            F32Max = (0, 0x97, "f32.max", MVP, None, 0),
            F32Copysign = (0, 0x98, "f32.copysign", MVP, None, 0),
            F64Abs = (0, 0x99, "f64.abs", MVP, None, 0),
            F64Neg = (0, 0x9a, "f64.neg", MVP, None, 0),
            F64Ceil = (0, 0x9b, "f64.ceil", MVP, None, 0),
            F64Floor = (0, 0x9c, "f64.floor", MVP, None, 0),
            F64Trunc = (0, 0x9d, "f64.trunc", MVP, None, 0),
            F64Nearest = (0, 0x9e, "f64.nearest", MVP, None, 0),
            F64Sqrt = (0, 0x9f, "f64.sqrt", MVP, None, 0),
            F64Add = (0, 0xa0, "f64.add", MVP, None, 0),
            F64Sub = (0, 0xa1, "f64.sub", MVP, None, 0),
            F64Mul = (0, 0xa2, "f64.mul", MVP, None, 0),
            F64Div = (0, 0xa3, "f64.div", MVP, None, 0),
            F64Min = (0, 0xa4, "f64.min", MVP, None, 0),
            F64Max = (0, 0xa5, "f64.max", MVP, None, 0),
            F64Copysign = (0, 0xa6, "f64.copysign", MVP, None, 0),
            I32WrapI64 = (0, 0xa7, "i32.wrap_i64", MVP, None, 0),
            I32TruncF32S = (0, 0xa8, "i32.trunc_f32_s", MVP, None, 0),
            I32TruncF32U = (0, 0xa9, "i32.trunc_f32_u", MVP, None, 0),
            I32TruncF64S = (0, 0xaa, "i32.trunc_f64_s", MVP, None, 0),
            I32TruncF64U = (0, 0xab, "i32.trunc_f64_u", MVP, None, 0),
            I64ExtendI32S = (0, 0xac, "i64.extend_i32_s", MVP, None, 0),
            I64ExtendI32U = (0, 0xad, "i64.extend_i32_u", MVP, None, 0),
            I64TruncF32S = (0, 0xae, "i64.trunc_f32_s", MVP, None, 0),
            I64TruncF32U = (0, 0xaf, "i64.trunc_f32_u", MVP, None, 0),
            I64TruncF64S = (0, 0xb0, "i64.trunc_f64_s", MVP, None, 0),
            I64TruncF64U = (0, 0xb1, "i64.trunc_f64_u", MVP, None, 0),
            F32ConvertI32S = (0, 0xb2, "f32.convert_i32_s", MVP, None, 0),
            F32ConvertI32U = (0, 0xb3, "f32.convert_i32_u", MVP, None, 0),
            F32ConvertI64S = (0, 0xb4, "f32.convert_i64_s", MVP, None, 0),
            F32ConvertI64U = (0, 0xb5, "f32.convert_i64_u", MVP, None, 0),
            F32DemoteF64 = (0, 0xb6, "f32.demote_f64", MVP, None, 0),
            F64ConvertI32S = (0, 0xb7, "f64.convert_i32_s", MVP, None, 0),
            F64ConvertI32U = (0, 0xb8, "f64.convert_i32_u", MVP, None, 0),
            F64ConvertI64S = (0, 0xb9, "f64.convert_i64_s", MVP, None, 0),
            F64ConvertI64U = (0, 0xba, "f64.convert_i64_u", MVP, None, 0),
            F64PromoteF32 = (0, 0xbb, "f64.promote_f32", MVP, None, 0),
            I32ReinterpretF32 = (0, 0xbc, "i32.reinterpret_f32", MVP, None, 0),
            I64ReinterpretF64 = (0, 0xbd, "i64.reinterpret_f64", MVP, None, 0),
            F32ReinterpretI32 = (0, 0xbe, "f32.reinterpret_i32", MVP, None, 0),
            F64ReinterpretI64 = (0, 0xbf, "f64.reinterpret_i64", MVP, None, 0),
            I32Extend8S = (0, 0xc0, "i32.extend8_s", SIGN_EXTENSION, None, 0),
            I32Extend16S = (0, 0xc1, "i32.extend16_s", SIGN_EXTENSION, None, 0),
            I64Extend8S = (0, 0xc2, "i64.extend8_s", SIGN_EXTENSION, None, 0),
            I64Extend16S = (0, 0xc3, "i64.extend16_s", SIGN_EXTENSION, None, 0),
            I64Extend32S = (0, 0xc4, "i64.extend32_s", SIGN_EXTENSION, None, 0),

            // Reference instructions.
            RefNull = (0, 0xd0, "ref.null", REFERENCE_TYPES, None, 0),
            RefIsNull = (0, 0xd1, "ref.is_null", REFERENCE_TYPES, None, 0),
            RefFunc = (0, 0xd2, "ref.func", REFERENCE_TYPES, Index, 0),

            // Misc table (0xfc): saturating conversions and bulk
            // memory/table operations.
            I32TruncSatF32S = (0xfc, 0x00, "i32.trunc_sat_f32_s", SATURATING_FLOAT_TO_INT, None, 0),
            I32TruncSatF32U = (0xfc, 0x01, "i32.trunc_sat_f32_u", SATURATING_FLOAT_TO_INT, None, 0),
            I32TruncSatF64S = (0xfc, 0x02, "i32.trunc_sat_f64_s", SATURATING_FLOAT_TO_INT, None, 0),
            I32TruncSatF64U = (0xfc, 0x03, "i32.trunc_sat_f64_u", SATURATING_FLOAT_TO_INT, None, 0),
            I64TruncSatF32S = (0xfc, 0x04, "i64.trunc_sat_f32_s", SATURATING_FLOAT_TO_INT, None, 0),
            I64TruncSatF32U = (0xfc, 0x05, "i64.trunc_sat_f32_u", SATURATING_FLOAT_TO_INT, None, 0),
            I64TruncSatF64S = (0xfc, 0x06, "i64.trunc_sat_f64_s", SATURATING_FLOAT_TO_INT, None, 0),
            I64TruncSatF64U = (0xfc, 0x07, "i64.trunc_sat_f64_u", SATURATING_FLOAT_TO_INT, None, 0),
            MemoryInit = (0xfc, 0x08, "memory.init", BULK_MEMORY, InitMem, 0),
            DataDrop = (0xfc, 0x09, "data.drop", BULK_MEMORY, Index, 0),
            MemoryCopy = (0xfc, 0x0a, "memory.copy", BULK_MEMORY, CopyMem, 0),
            MemoryFill = (0xfc, 0x0b, "memory.fill", BULK_MEMORY, ReservedByte, 0),
            TableInit = (0xfc, 0x0c, "table.init", BULK_OR_REFERENCE, InitTable, 0),
            ElemDrop = (0xfc, 0x0d, "elem.drop", BULK_OR_REFERENCE, Index, 0),
            TableCopy = (0xfc, 0x0e, "table.copy", BULK_OR_REFERENCE, CopyTable, 0),
            TableGrow = (0xfc, 0x0f, "table.grow", REFERENCE_TYPES, Index, 0),
            TableSize = (0xfc, 0x10, "table.size", REFERENCE_TYPES, Index, 0),
            TableFill = (0xfc, 0x11, "table.fill", REFERENCE_TYPES, Index, 0),

            // SIMD table (0xfd).
            V128Load = (0xfd, 0x00, "v128.load", SIMD, MemArg, 16),
            V128Store = (0xfd, 0x01, "v128.store", SIMD, MemArg, 16),
            V128Const = (0xfd, 0x02, "v128.const", SIMD, V128, 0),
            I8X16Splat = (0xfd, 0x04, "i8x16.splat", SIMD, None, 0),
            I8X16ExtractLaneS = (0xfd, 0x05, "i8x16.extract_lane_s", SIMD, SimdLane, 0),
            I8X16ExtractLaneU = (0xfd, 0x06, "i8x16.extract_lane_u", SIMD, SimdLane, 0),
            I8X16ReplaceLane = (0xfd, 0x07, "i8x16.replace_lane", SIMD, SimdLane, 0),
            I16X8Splat = (0xfd, 0x08, "i16x8.splat", SIMD, None, 0),
            I16X8ExtractLaneS = (0xfd, 0x09, "i16x8.extract_lane_s", SIMD, SimdLane, 0),
            I16X8ExtractLaneU = (0xfd, 0x0a, "i16x8.extract_lane_u", SIMD, SimdLane, 0),
            I16X8ReplaceLane = (0xfd, 0x0b, "i16x8.replace_lane", SIMD, SimdLane, 0),
            I32X4Splat = (0xfd, 0x0c, "i32x4.splat", SIMD, None, 0),
            I32X4ExtractLane = (0xfd, 0x0d, "i32x4.extract_lane", SIMD, SimdLane, 0),
            I32X4ReplaceLane = (0xfd, 0x0e, "i32x4.replace_lane", SIMD, SimdLane, 0),
            I64X2Splat = (0xfd, 0x0f, "i64x2.splat", SIMD, None, 0),
            I64X2ExtractLane = (0xfd, 0x10, "i64x2.extract_lane", SIMD, SimdLane, 0),
            I64X2ReplaceLane = (0xfd, 0x11, "i64x2.replace_lane", SIMD, SimdLane, 0),
            F32X4Splat = (0xfd, 0x12, "f32x4.splat", SIMD, None, 0),
            F32X4ExtractLane = (0xfd, 0x13, "f32x4.extract_lane", SIMD, SimdLane, 0),
            F32X4ReplaceLane = (0xfd, 0x14, "f32x4.replace_lane", SIMD, SimdLane, 0),
            F64X2Splat = (0xfd, 0x15, "f64x2.splat", SIMD, None, 0),
            F64X2ExtractLane = (0xfd, 0x16, "f64x2.extract_lane", SIMD, SimdLane, 0),
            F64X2ReplaceLane = (0xfd, 0x17, "f64x2.replace_lane", SIMD, SimdLane, 0),
            I8X16Eq = (0xfd, 0x18, "i8x16.eq", SIMD, None, 0),
            I8X16Ne = (0xfd, 0x19, "i8x16.ne", SIMD, None, 0),
            I8X16LtS = (0xfd, 0x1a, "i8x16.lt_s", SIMD, None, 0),
            I8X16LtU = (0xfd, 0x1b, "i8x16.lt_u", SIMD, None, 0),
            I8X16GtS = (0xfd, 0x1c, "i8x16.gt_s", SIMD, None, 0),
            I8X16GtU = (0xfd, 0x1d, "i8x16.gt_u", SIMD, None, 0),
            I8X16LeS = (0xfd, 0x1e, "i8x16.le_s", SIMD, None, 0),
            I8X16LeU = (0xfd, 0x1f, "i8x16.le_u", SIMD, None, 0),
            I8X16GeS = (0xfd, 0x20, "i8x16.ge_s", SIMD, None, 0),
            I8X16GeU = (0xfd, 0x21, "i8x16.ge_u", SIMD, None, 0),
            I16X8Eq = (0xfd, 0x22, "i16x8.eq", SIMD, None, 0),
            I16X8Ne = (0xfd, 0x23, "i16x8.ne", SIMD, None, 0),
            I16X8LtS = (0xfd, 0x24, "i16x8.lt_s", SIMD, None, 0),
            I16X8LtU = (0xfd, 0x25, "i16x8.lt_u", SIMD, None, 0),
            I16X8GtS = (0xfd, 0x26, "i16x8.gt_s", SIMD, None, 0),
            I16X8GtU = (0xfd, 0x27, "i16x8.gt_u", SIMD, None, 0),
            I16X8LeS = (0xfd, 0x28, "i16x8.le_s", SIMD, None, 0),
            I16X8LeU = (0xfd, 0x29, "i16x8.le_u", SIMD, None, 0),
            I16X8GeS = (0xfd, 0x2a, "i16x8.ge_s", SIMD, None, 0),
            I16X8GeU = (0xfd, 0x2b, "i16x8.ge_u", SIMD, None, 0),
            I32X4Eq = (0xfd, 0x2c, "i32x4.eq", SIMD, None, 0),
            I32X4Ne = (0xfd, 0x2d, "i32x4.ne", SIMD, None, 0),
            I32X4LtS = (0xfd, 0x2e, "i32x4.lt_s", SIMD, None, 0),
            I32X4LtU = (0xfd, 0x2f, "i32x4.lt_u", SIMD, None, 0),
            I32X4GtS = (0xfd, 0x30, "i32x4.gt_s", SIMD, None, 0),
            I32X4GtU = (0xfd, 0x31, "i32x4.gt_u", SIMD, None, 0),
            I32X4LeS = (0xfd, 0x32, "i32x4.le_s", SIMD, None, 0),
            I32X4LeU = (0xfd, 0x33, "i32x4.le_u", SIMD, None, 0),
            I32X4GeS = (0xfd, 0x34, "i32x4.ge_s", SIMD, None, 0),
            I32X4GeU = (0xfd, 0x35, "i32x4.ge_u", SIMD, None, 0),
            F32X4Eq = (0xfd, 0x40, "f32x4.eq", SIMD, None, 0),
            F32X4Ne = (0xfd, 0x41, "f32x4.ne", SIMD, None, 0),
            F32X4Lt = (0xfd, 0x42, "f32x4.lt", SIMD, None, 0),
            F32X4Gt = (0xfd, 0x43, "f32x4.gt", SIMD, None, 0),
            F32X4Le = (0xfd, 0x44, "f32x4.le", SIMD, None, 0),
            F32X4Ge = (0xfd, 0x45, "f32x4.ge", SIMD, None, 0),
            F64X2Eq = (0xfd, 0x46, "f64x2.eq", SIMD, None, 0),
            F64X2Ne = (0xfd, 0x47, "f64x2.ne", SIMD, None, 0),
            F64X2Lt = (0xfd, 0x48, "f64x2.lt", SIMD, None, 0),
            F64X2Gt = (0xfd, 0x49, "f64x2.gt", SIMD, None, 0),
            F64X2Le = (0xfd, 0x4a, "f64x2.le", SIMD, None, 0),
            F64X2Ge = (0xfd, 0x4b, "f64x2.ge", SIMD, None, 0),
            V128Not = (0xfd, 0x4c, "v128.not", SIMD, None, 0),
            V128And = (0xfd, 0x4d, "v128.and", SIMD, None, 0),
            V128Or = (0xfd, 0x4e, "v128.or", SIMD, None, 0),
            V128Xor = (0xfd, 0x4f, "v128.xor", SIMD, None, 0),
            V128BitSelect = (0xfd, 0x50, "v128.bitselect", SIMD, None, 0),
            I8X16Neg = (0xfd, 0x51, "i8x16.neg", SIMD, None, 0),
            I8X16AnyTrue = (0xfd, 0x52, "i8x16.any_true", SIMD, None, 0),
            I8X16AllTrue = (0xfd, 0x53, "i8x16.all_true", SIMD, None, 0),
            I8X16Shl = (0xfd, 0x54, "i8x16.shl", SIMD, None, 0),
            I8X16ShrS = (0xfd, 0x55, "i8x16.shr_s", SIMD, None, 0),
            I8X16ShrU = (0xfd, 0x56, "i8x16.shr_u", SIMD, None, 0),
            I8X16Add = (0xfd, 0x57, "i8x16.add", SIMD, None, 0),
            I8X16AddSaturateS = (0xfd, 0x58, "i8x16.add_saturate_s", SIMD, None, 0),
            I8X16AddSaturateU = (0xfd, 0x59, "i8x16.add_saturate_u", SIMD, None, 0),
            I8X16Sub = (0xfd, 0x5a, "i8x16.sub", SIMD, None, 0),
            I8X16SubSaturateS = (0xfd, 0x5b, "i8x16.sub_saturate_s", SIMD, None, 0),
            I8X16SubSaturateU = (0xfd, 0x5c, "i8x16.sub_saturate_u", SIMD, None, 0),
            I8X16MinS = (0xfd, 0x5e, "i8x16.min_s", SIMD, None, 0),
            I8X16MinU = (0xfd, 0x5f, "i8x16.min_u", SIMD, None, 0),
            I8X16MaxS = (0xfd, 0x60, "i8x16.max_s", SIMD, None, 0),
            I8X16MaxU = (0xfd, 0x61, "i8x16.max_u", SIMD, None, 0),
            I16X8Neg = (0xfd, 0x62, "i16x8.neg", SIMD, None, 0),
            I16X8AnyTrue = (0xfd, 0x63, "i16x8.any_true", SIMD, None, 0),
            I16X8AllTrue = (0xfd, 0x64, "i16x8.all_true", SIMD, None, 0),
            I16X8Shl = (0xfd, 0x65, "i16x8.shl", SIMD, None, 0),
            I16X8ShrS = (0xfd, 0x66, "i16x8.shr_s", SIMD, None, 0),
            I16X8ShrU = (0xfd, 0x67, "i16x8.shr_u", SIMD, None, 0),
            I16X8Add = (0xfd, 0x68, "i16x8.add", SIMD, None, 0),
            I16X8AddSaturateS = (0xfd, 0x69, "i16x8.add_saturate_s", SIMD, None, 0),
            I16X8AddSaturateU = (0xfd, 0x6a, "i16x8.add_saturate_u", SIMD, None, 0),
            I16X8Sub = (0xfd, 0x6b, "i16x8.sub", SIMD, None, 0),
            I16X8SubSaturateS = (0xfd, 0x6c, "i16x8.sub_saturate_s", SIMD, None, 0),
            I16X8SubSaturateU = (0xfd, 0x6d, "i16x8.sub_saturate_u", SIMD, None, 0),
            I16X8Mul = (0xfd, 0x6e, "i16x8.mul", SIMD, None, 0),
            I16X8MinS = (0xfd, 0x6f, "i16x8.min_s", SIMD, None, 0),
            I16X8MinU = (0xfd, 0x70, "i16x8.min_u", SIMD, None, 0),
            I16X8MaxS = (0xfd, 0x71, "i16x8.max_s", SIMD, None, 0),
            I16X8MaxU = (0xfd, 0x72, "i16x8.max_u", SIMD, None, 0),
            I32X4Neg = (0xfd, 0x73, "i32x4.neg", SIMD, None, 0),
            I32X4AnyTrue = (0xfd, 0x74, "i32x4.any_true", SIMD, None, 0),
            I32X4AllTrue = (0xfd, 0x75, "i32x4.all_true", SIMD, None, 0),
            I32X4Shl = (0xfd, 0x76, "i32x4.shl", SIMD, None, 0),
            I32X4ShrS = (0xfd, 0x77, "i32x4.shr_s", SIMD, None, 0),
            I32X4ShrU = (0xfd, 0x78, "i32x4.shr_u", SIMD, None, 0),
            I32X4Add = (0xfd, 0x79, "i32x4.add", SIMD, None, 0),
            I32X4Sub = (0xfd, 0x7c, "i32x4.sub", SIMD, None, 0),
            I32X4Mul = (0xfd, 0x7f, "i32x4.mul", SIMD, None, 0),
            I32X4MinS = (0xfd, 0x80, "i32x4.min_s", SIMD, None, 0),
            I32X4MinU = (0xfd, 0x81, "i32x4.min_u", SIMD, None, 0),
            I32X4MaxS = (0xfd, 0x82, "i32x4.max_s", SIMD, None, 0),
            I32X4MaxU = (0xfd, 0x83, "i32x4.max_u", SIMD, None, 0),
            I64X2Neg = (0xfd, 0x84, "i64x2.neg", SIMD, None, 0),
            I64X2Shl = (0xfd, 0x87, "i64x2.shl", SIMD, None, 0),
            I64X2ShrS = (0xfd, 0x88, "i64x2.shr_s", SIMD, None, 0),
            I64X2ShrU = (0xfd, 0x89, "i64x2.shr_u", SIMD, None, 0),
            I64X2Add = (0xfd, 0x8a, "i64x2.add", SIMD, None, 0),
            I64X2Sub = (0xfd, 0x8d, "i64x2.sub", SIMD, None, 0),
            I64X2Mul = (0xfd, 0x90, "i64x2.mul", SIMD, None, 0),
            F32X4Abs = (0xfd, 0x95, "f32x4.abs", SIMD, None, 0),
            F32X4Neg = (0xfd, 0x96, "f32x4.neg", SIMD, None, 0),
            F32X4Sqrt = (0xfd, 0x97, "f32x4.sqrt", SIMD, None, 0),
            F32X4Add = (0xfd, 0x9a, "f32x4.add", SIMD, None, 0),
            F32X4Sub = (0xfd, 0x9b, "f32x4.sub", SIMD, None, 0),
            F32X4Mul = (0xfd, 0x9c, "f32x4.mul", SIMD, None, 0),
            F32X4Div = (0xfd, 0x9d, "f32x4.div", SIMD, None, 0),
            F32X4Min = (0xfd, 0x9e, "f32x4.min", SIMD, None, 0),
            F32X4Max = (0xfd, 0x9f, "f32x4.max", SIMD, None, 0),
            F64X2Abs = (0xfd, 0xa0, "f64x2.abs", SIMD, None, 0),
            F64X2Neg = (0xfd, 0xa1, "f64x2.neg", SIMD, None, 0),
            F64X2Sqrt = (0xfd, 0xa2, "f64x2.sqrt", SIMD, None, 0),
            F64X2Add = (0xfd, 0xa5, "f64x2.add", SIMD, None, 0),
            F64X2Sub = (0xfd, 0xa6, "f64x2.sub", SIMD, None, 0),
            F64X2Mul = (0xfd, 0xa7, "f64x2.mul", SIMD, None, 0),
            F64X2Div = (0xfd, 0xa8, "f64x2.div", SIMD, None, 0),
            F64X2Min = (0xfd, 0xa9, "f64x2.min", SIMD, None, 0),
            F64X2Max = (0xfd, 0xaa, "f64x2.max", SIMD, None, 0),
            I32X4TruncSatF32X4S = (0xfd, 0xab, "i32x4.trunc_sat_f32x4_s", SIMD, None, 0),
            I32X4TruncSatF32X4U = (0xfd, 0xac, "i32x4.trunc_sat_f32x4_u", SIMD, None, 0),
            F32X4ConvertI32X4S = (0xfd, 0xaf, "f32x4.convert_i32x4_s", SIMD, None, 0),
            F32X4ConvertI32X4U = (0xfd, 0xb0, "f32x4.convert_i32x4_u", SIMD, None, 0),
            V8X16Swizzle = (0xfd, 0xc0, "v8x16.swizzle", SIMD, None, 0),
            V8X16Shuffle = (0xfd, 0xc1, "v8x16.shuffle", SIMD, Shuffle, 0),
            V8X16LoadSplat = (0xfd, 0xc2, "v8x16.load_splat", SIMD, MemArg, 1),
            V16X8LoadSplat = (0xfd, 0xc3, "v16x8.load_splat", SIMD, MemArg, 2),
            V32X4LoadSplat = (0xfd, 0xc4, "v32x4.load_splat", SIMD, MemArg, 4),
            V64X2LoadSplat = (0xfd, 0xc5, "v64x2.load_splat", SIMD, MemArg, 8),
            I8X16NarrowI16X8S = (0xfd, 0xc6, "i8x16.narrow_i16x8_s", SIMD, None, 0),
            I8X16NarrowI16X8U = (0xfd, 0xc7, "i8x16.narrow_i16x8_u", SIMD, None, 0),
            I16X8NarrowI32X4S = (0xfd, 0xc8, "i16x8.narrow_i32x4_s", SIMD, None, 0),
            I16X8NarrowI32X4U = (0xfd, 0xc9, "i16x8.narrow_i32x4_u", SIMD, None, 0),
            I16X8WidenLowI8X16S = (0xfd, 0xca, "i16x8.widen_low_i8x16_s", SIMD, None, 0),
            I16X8WidenHighI8X16S = (0xfd, 0xcb, "i16x8.widen_high_i8x16_s", SIMD, None, 0),
            I16X8WidenLowI8X16U = (0xfd, 0xcc, "i16x8.widen_low_i8x16_u", SIMD, None, 0),
            I16X8WidenHighI8X16U = (0xfd, 0xcd, "i16x8.widen_high_i8x16_u", SIMD, None, 0),
            I32X4WidenLowI16X8S = (0xfd, 0xce, "i32x4.widen_low_i16x8_s", SIMD, None, 0),
            I32X4WidenHighI16X8S = (0xfd, 0xcf, "i32x4.widen_high_i16x8_s", SIMD, None, 0),
            I32X4WidenLowI16X8U = (0xfd, 0xd0, "i32x4.widen_low_i16x8_u", SIMD, None, 0),
            I32X4WidenHighI16X8U = (0xfd, 0xd1, "i32x4.widen_high_i16x8_u", SIMD, None, 0),
            I16X8Load8X8S = (0xfd, 0xd2, "i16x8.load8x8_s", SIMD, MemArg, 8),
            I16X8Load8X8U = (0xfd, 0xd3, "i16x8.load8x8_u", SIMD, MemArg, 8),
            I32X4Load16X4S = (0xfd, 0xd4, "i32x4.load16x4_s", SIMD, MemArg, 8),
            I32X4Load16X4U = (0xfd, 0xd5, "i32x4.load16x4_u", SIMD, MemArg, 8),
            I64X2Load32X2S = (0xfd, 0xd6, "i64x2.load32x2_s", SIMD, MemArg, 8),
            I64X2Load32X2U = (0xfd, 0xd7, "i64x2.load32x2_u", SIMD, MemArg, 8),
            V128Andnot = (0xfd, 0xd8, "v128.andnot", SIMD, None, 0),
            I8X16AvgrU = (0xfd, 0xd9, "i8x16.avgr_u", SIMD, None, 0),
            I16X8AvgrU = (0xfd, 0xda, "i16x8.avgr_u", SIMD, None, 0),
            I8X16Abs = (0xfd, 0xe1, "i8x16.abs", SIMD, None, 0),
            I16X8Abs = (0xfd, 0xe2, "i16x8.abs", SIMD, None, 0),
            I32X4Abs = (0xfd, 0xe3, "i32x4.abs", SIMD, None, 0),

            // Atomic table (0xfe).
            AtomicNotify = (0xfe, 0x00, "atomic.notify", THREADS, MemArg, 4),
            I32AtomicWait = (0xfe, 0x01, "i32.atomic.wait", THREADS, MemArg, 4),
            I64AtomicWait = (0xfe, 0x02, "i64.atomic.wait", THREADS, MemArg, 8),
            I32AtomicLoad = (0xfe, 0x10, "i32.atomic.load", THREADS, MemArg, 4),
            I64AtomicLoad = (0xfe, 0x11, "i64.atomic.load", THREADS, MemArg, 8),
            I32AtomicLoad8U = (0xfe, 0x12, "i32.atomic.load8_u", THREADS, MemArg, 1),
            I32AtomicLoad16U = (0xfe, 0x13, "i32.atomic.load16_u", THREADS, MemArg, 2),
            I64AtomicLoad8U = (0xfe, 0x14, "i64.atomic.load8_u", THREADS, MemArg, 1),
            I64AtomicLoad16U = (0xfe, 0x15, "i64.atomic.load16_u", THREADS, MemArg, 2),
            I64AtomicLoad32U = (0xfe, 0x16, "i64.atomic.load32_u", THREADS, MemArg, 4),
            I32AtomicStore = (0xfe, 0x17, "i32.atomic.store", THREADS, MemArg, 4),
            I64AtomicStore = (0xfe, 0x18, "i64.atomic.store", THREADS, MemArg, 8),
            I32AtomicStore8 = (0xfe, 0x19, "i32.atomic.store8", THREADS, MemArg, 1),
            I32AtomicStore16 = (0xfe, 0x1a, "i32.atomic.store16", THREADS, MemArg, 2),
            I64AtomicStore8 = (0xfe, 0x1b, "i64.atomic.store8", THREADS, MemArg, 1),
            I64AtomicStore16 = (0xfe, 0x1c, "i64.atomic.store16", THREADS, MemArg, 2),
            I64AtomicStore32 = (0xfe, 0x1d, "i64.atomic.store32", THREADS, MemArg, 4),
            I32AtomicRmwAdd = (0xfe, 0x1e, "i32.atomic.rmw.add", THREADS, MemArg, 4),
            I64AtomicRmwAdd = (0xfe, 0x1f, "i64.atomic.rmw.add", THREADS, MemArg, 8),
            I32AtomicRmw8AddU = (0xfe, 0x20, "i32.atomic.rmw8.add_u", THREADS, MemArg, 1),
            I32AtomicRmw16AddU = (0xfe, 0x21, "i32.atomic.rmw16.add_u", THREADS, MemArg, 2),
            I64AtomicRmw8AddU = (0xfe, 0x22, "i64.atomic.rmw8.add_u", THREADS, MemArg, 1),
            I64AtomicRmw16AddU = (0xfe, 0x23, "i64.atomic.rmw16.add_u", THREADS, MemArg, 2),
            I64AtomicRmw32AddU = (0xfe, 0x24, "i64.atomic.rmw32.add_u", THREADS, MemArg, 4),
            I32AtomicRmwSub = (0xfe, 0x25, "i32.atomic.rmw.sub", THREADS, MemArg, 4),
            I64AtomicRmwSub = (0xfe, 0x26, "i64.atomic.rmw.sub", THREADS, MemArg, 8),
            I32AtomicRmw8SubU = (0xfe, 0x27, "i32.atomic.rmw8.sub_u", THREADS, MemArg, 1),
            I32AtomicRmw16SubU = (0xfe, 0x28, "i32.atomic.rmw16.sub_u", THREADS, MemArg, 2),
            I64AtomicRmw8SubU = (0xfe, 0x29, "i64.atomic.rmw8.sub_u", THREADS, MemArg, 1),
            I64AtomicRmw16SubU = (0xfe, 0x2a, "i64.atomic.rmw16.sub_u", THREADS, MemArg, 2),
            I64AtomicRmw32SubU = (0xfe, 0x2b, "i64.atomic.rmw32.sub_u", THREADS, MemArg, 4),
            I32AtomicRmwAnd = (0xfe, 0x2c, "i32.atomic.rmw.and", THREADS, MemArg, 4),
            I64AtomicRmwAnd = (0xfe, 0x2d, "i64.atomic.rmw.and", THREADS, MemArg, 8),
            I32AtomicRmw8AndU = (0xfe, 0x2e, "i32.atomic.rmw8.and_u", THREADS, MemArg, 1),
            I32AtomicRmw16AndU = (0xfe, 0x2f, "i32.atomic.rmw16.and_u", THREADS, MemArg, 2),
            I64AtomicRmw8AndU = (0xfe, 0x30, "i64.atomic.rmw8.and_u", THREADS, MemArg, 1),
            I64AtomicRmw16AndU = (0xfe, 0x31, "i64.atomic.rmw16.and_u", THREADS, MemArg, 2),
            I64AtomicRmw32AndU = (0xfe, 0x32, "i64.atomic.rmw32.and_u", THREADS, MemArg, 4),
            I32AtomicRmwOr = (0xfe, 0x33, "i32.atomic.rmw.or", THREADS, MemArg, 4),
            I64AtomicRmwOr = (0xfe, 0x34, "i64.atomic.rmw.or", THREADS, MemArg, 8),
            I32AtomicRmw8OrU = (0xfe, 0x35, "i32.atomic.rmw8.or_u", THREADS, MemArg, 1),
            I32AtomicRmw16OrU = (0xfe, 0x36, "i32.atomic.rmw16.or_u", THREADS, MemArg, 2),
            I64AtomicRmw8OrU = (0xfe, 0x37, "i64.atomic.rmw8.or_u", THREADS, MemArg, 1),
            I64AtomicRmw16OrU = (0xfe, 0x38, "i64.atomic.rmw16.or_u", THREADS, MemArg, 2),
            I64AtomicRmw32OrU = (0xfe, 0x39, "i64.atomic.rmw32.or_u", THREADS, MemArg, 4),
            I32AtomicRmwXor = (0xfe, 0x3a, "i32.atomic.rmw.xor", THREADS, MemArg, 4),
            I64AtomicRmwXor = (0xfe, 0x3b, "i64.atomic.rmw.xor", THREADS, MemArg, 8),
            I32AtomicRmw8XorU = (0xfe, 0x3c, "i32.atomic.rmw8.xor_u", THREADS, MemArg, 1),
            I32AtomicRmw16XorU = (0xfe, 0x3d, "i32.atomic.rmw16.xor_u", THREADS, MemArg, 2),
            I64AtomicRmw8XorU = (0xfe, 0x3e, "i64.atomic.rmw8.xor_u", THREADS, MemArg, 1),
            I64AtomicRmw16XorU = (0xfe, 0x3f, "i64.atomic.rmw16.xor_u", THREADS, MemArg, 2),
            I64AtomicRmw32XorU = (0xfe, 0x40, "i64.atomic.rmw32.xor_u", THREADS, MemArg, 4),
            I32AtomicRmwXchg = (0xfe, 0x41, "i32.atomic.rmw.xchg", THREADS, MemArg, 4),
            I64AtomicRmwXchg = (0xfe, 0x42, "i64.atomic.rmw.xchg", THREADS, MemArg, 8),
            I32AtomicRmw8XchgU = (0xfe, 0x43, "i32.atomic.rmw8.xchg_u", THREADS, MemArg, 1),
            I32AtomicRmw16XchgU = (0xfe, 0x44, "i32.atomic.rmw16.xchg_u", THREADS, MemArg, 2),
            I64AtomicRmw8XchgU = (0xfe, 0x45, "i64.atomic.rmw8.xchg_u", THREADS, MemArg, 1),
            I64AtomicRmw16XchgU = (0xfe, 0x46, "i64.atomic.rmw16.xchg_u", THREADS, MemArg, 2),
            I64AtomicRmw32XchgU = (0xfe, 0x47, "i64.atomic.rmw32.xchg_u", THREADS, MemArg, 4),
            I32AtomicRmwCmpxchg = (0xfe, 0x48, "i32.atomic.rmw.cmpxchg", THREADS, MemArg, 4),
            I64AtomicRmwCmpxchg = (0xfe, 0x49, "i64.atomic.rmw.cmpxchg", THREADS, MemArg, 8),
            I32AtomicRmw8CmpxchgU = (0xfe, 0x4a, "i32.atomic.rmw8.cmpxchg_u", THREADS, MemArg, 1),
            I32AtomicRmw16CmpxchgU = (0xfe, 0x4b, "i32.atomic.rmw16.cmpxchg_u", THREADS, MemArg, 2),
            I64AtomicRmw8CmpxchgU = (0xfe, 0x4c, "i64.atomic.rmw8.cmpxchg_u", THREADS, MemArg, 1),
            I64AtomicRmw16CmpxchgU = (0xfe, 0x4d, "i64.atomic.rmw16.cmpxchg_u", THREADS, MemArg, 2),
            I64AtomicRmw32CmpxchgU = (0xfe, 0x4e, "i64.atomic.rmw32.cmpxchg_u", THREADS, MemArg, 4),
        }
    };
}

// The shape of the immediate that follows an opcode on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ImmediateKind {
    None,
    BlockType,
    Index,
    BrTable,
    CallIndirect,
    BrOnExn,
    ReservedByte,
    MemArg,
    S32,
    S64,
    F32,
    F64,
    V128,
    InitMem,
    InitTable,
    CopyMem,
    CopyTable,
    SelectTypes,
    Shuffle,
    SimdLane,
}

macro_rules! define_opcodes {
    ($($name:ident = ($prefix:literal, $code:literal, $text:literal, $feature:ident, $imm:ident, $align:literal)),* $(,)?) => {
        /// A WebAssembly instruction opcode.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum Opcode {
            $($name,)*
        }

        impl Opcode {
            // Looks up an opcode by its wire encoding. A prefix of 0
            // stands for the single-byte table. Returns None for unknown
            // encodings and for entries whose gating feature is disabled.
            pub(crate) fn from_wire(prefix: u8, code: u32, features: Features) -> Option<Self> {
                match (prefix, code) {
                    $(($prefix, $code) if features.enables($feature) => Some(Self::$name),)*
                    _ => None,
                }
            }

            // The wire encoding as (prefix, code); a prefix of 0 stands
            // for the single-byte table.
            pub(crate) fn wire(self) -> (u8, u32) {
                match self {
                    $(Self::$name => ($prefix, $code),)*
                }
            }

            /// The opcode's multi-byte prefix (`0xfc`, `0xfd`, or `0xfe`),
            /// if any.
            pub fn prefix(self) -> Option<u8> {
                let (prefix, _) = self.wire();
                (prefix != 0).then_some(prefix)
            }

            /// The opcode's text-format mnemonic.
            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Self::$name => $text,)*
                }
            }

            pub(crate) fn immediate_kind(self) -> ImmediateKind {
                match self {
                    $(Self::$name => ImmediateKind::$imm,)*
                }
            }

            /// The natural alignment in bytes of a memory-access opcode,
            /// or 0 for opcodes without a memory argument.
            pub fn natural_alignment(self) -> u32 {
                match self {
                    $(Self::$name => $align,)*
                }
            }
        }
    };
}
for_each_opcode!(define_opcodes);

impl Opcode {
    // Whether a prefix byte introduces a multi-byte opcode under the given
    // features. A disabled prefix byte reads as a single-byte unknown
    // opcode instead.
    pub(crate) fn prefix_enabled(prefix: u8, features: Features) -> bool {
        match prefix {
            0xfc => features.intersects(
                Features::SATURATING_FLOAT_TO_INT
                    | Features::BULK_MEMORY
                    | Features::REFERENCE_TYPES,
            ),
            0xfd => features.contains(Features::SIMD),
            0xfe => features.contains(Features::THREADS),
            _ => false,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A 128-bit SIMD value, viewable as lanes of various widths.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct V128([u8; 16]);

impl V128 {
    pub fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn from_u64x2(lanes: [u64; 2]) -> Self {
        let mut bytes = [0; 16];
        bytes[..8].copy_from_slice(&lanes[0].to_le_bytes());
        bytes[8..].copy_from_slice(&lanes[1].to_le_bytes());
        Self(bytes)
    }

    pub fn bytes(self) -> [u8; 16] {
        self.0
    }

    pub fn as_u8x16(self) -> [u8; 16] {
        self.0
    }

    pub fn as_u16x8(self) -> [u16; 8] {
        core::array::from_fn(|i| u16::from_le_bytes([self.0[2 * i], self.0[2 * i + 1]]))
    }

    pub fn as_u32x4(self) -> [u32; 4] {
        core::array::from_fn(|i| {
            u32::from_le_bytes(self.0[4 * i..4 * i + 4].try_into().unwrap())
        })
    }

    pub fn as_u64x2(self) -> [u64; 2] {
        core::array::from_fn(|i| {
            u64::from_le_bytes(self.0[8 * i..8 * i + 8].try_into().unwrap())
        })
    }

    pub fn as_f32x4(self) -> [f32; 4] {
        self.as_u32x4().map(f32::from_bits)
    }

    pub fn as_f64x2(self) -> [f64; 2] {
        self.as_u64x2().map(f64::from_bits)
    }
}

impl fmt::Debug for V128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v128:")?;
        for byte in self.0 {
            write!(f, " {byte:#04x}")?;
        }
        Ok(())
    }
}

/// Memory access operands: alignment (as a log2) and static offset.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MemArg {
    /// Alignment hint, stored as log2 of the alignment in bytes.
    pub align_log2: Located<u32>,
    /// Static offset added to the dynamic address.
    pub offset: Located<u32>,
}

/// Operands of `call_indirect` and `return_call_indirect`.
///
/// The table slot is a reserved zero byte unless the reference types
/// feature supplies a real table index.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CallIndirectImmediate {
    pub type_index: Located<Index>,
    pub table_index: Located<Index>,
}

/// Operands of `br_table`: branch targets and the default target.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct BrTableImmediate {
    pub targets: Vec<Located<Index>>,
    pub default_target: Located<Index>,
}

/// Operands of `br_on_exn`: branch depth and event index.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct BrOnExnImmediate {
    pub target: Located<Index>,
    pub event_index: Located<Index>,
}

/// Operands of `memory.init` and `table.init`: the segment to copy from
/// and the destination memory/table.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct InitImmediate {
    pub segment: Located<Index>,
    pub dst: Located<Index>,
}

/// Operands of `memory.copy` and `table.copy`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CopyImmediate {
    pub dst: Located<Index>,
    pub src: Located<Index>,
}

/// An instruction immediate, in one of the shapes of the opcode table.
#[derive(Clone, Debug, PartialEq)]
pub enum Immediate {
    None,
    BlockType(Located<BlockType>),
    Index(Located<Index>),
    CallIndirect(Located<CallIndirectImmediate>),
    BrTable(Located<BrTableImmediate>),
    BrOnExn(Located<BrOnExnImmediate>),
    /// A reserved byte (`memory.size`, `memory.grow`, `memory.fill`).
    Byte(Located<u8>),
    MemArg(Located<MemArg>),
    S32(Located<i32>),
    S64(Located<i64>),
    F32(Located<f32>),
    F64(Located<f64>),
    V128(Located<V128>),
    Init(Located<InitImmediate>),
    Copy(Located<CopyImmediate>),
    SelectTypes(Located<Vec<Located<ValueType>>>),
    Shuffle(Located<[u8; 16]>),
    SimdLane(Located<u8>),
}

/// A decoded instruction: an opcode with its immediate.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub opcode: Located<Opcode>,
    pub immediate: Immediate,
}

impl Instruction {
    pub fn new(opcode: Located<Opcode>, immediate: Immediate) -> Self {
        Self { opcode, immediate }
    }

    /// An instruction without an immediate.
    pub fn bare(opcode: Located<Opcode>) -> Self {
        Self {
            opcode,
            immediate: Immediate::None,
        }
    }
}
