// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! WebAssembly binary tree definitions.
//!
//! This module contains the typed representation of a WebAssembly binary
//! module: value and reference types, composite types, section entries,
//! segments, and the owned module tree produced by the text converter.
//!
//! Nodes that reference input bytes hold [`Cow`] data, so the decoder can
//! borrow from the input buffer while the converter owns its storage.

mod instr;
pub use instr::*;

use std::borrow::Cow;

use num_enum::TryFromPrimitive;

use crate::Features;
use crate::located::Located;

/// An index into one of a module's index spaces.
pub type Index = u32;

/// A name (of a module, import field, export, or custom section).
pub type Name<'a> = Cow<'a, str>;

/// Value types classify the individual values that WebAssembly code
/// computes with.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum ValueType {
    /// 32-bit integer.
    I32 = 0x7f,
    /// 64-bit integer.
    I64 = 0x7e,
    /// 32-bit IEEE-754 float.
    F32 = 0x7d,
    /// 64-bit IEEE-754 float.
    F64 = 0x7c,
    /// 128-bit SIMD vector.
    V128 = 0x7b,
    /// Function reference.
    Funcref = 0x70,
    /// Opaque host reference.
    Anyref = 0x6f,
    /// Null reference.
    Nullref = 0x6e,
    /// Exception reference.
    Exnref = 0x68,
}

impl ValueType {
    pub(crate) fn from_wire(byte: u8, features: Features) -> Option<Self> {
        match byte {
            0x7f => Some(Self::I32),
            0x7e => Some(Self::I64),
            0x7d => Some(Self::F32),
            0x7c => Some(Self::F64),
            0x7b if features.contains(Features::SIMD) => Some(Self::V128),
            0x70 if features.contains(Features::REFERENCE_TYPES) => Some(Self::Funcref),
            0x6f if features.contains(Features::REFERENCE_TYPES) => Some(Self::Anyref),
            0x6e if features.contains(Features::REFERENCE_TYPES) => Some(Self::Nullref),
            0x68 if features.contains(Features::EXCEPTIONS) => Some(Self::Exnref),
            _ => None,
        }
    }

    pub(crate) fn wire(self) -> u8 {
        self as u8
    }
}

/// The type of references an element segment or table holds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum ElementType {
    /// Function reference.
    Funcref = 0x70,
    /// Opaque host reference.
    Anyref = 0x6f,
    /// Null reference.
    Nullref = 0x6e,
    /// Exception reference.
    Exnref = 0x68,
}

impl ElementType {
    pub(crate) fn from_wire(byte: u8, features: Features) -> Option<Self> {
        match byte {
            0x70 => Some(Self::Funcref),
            0x6f if features.contains(Features::REFERENCE_TYPES) => Some(Self::Anyref),
            0x6e if features.contains(Features::REFERENCE_TYPES) => Some(Self::Nullref),
            0x68 if features.contains(Features::EXCEPTIONS) => Some(Self::Exnref),
            _ => None,
        }
    }

    pub(crate) fn wire(self) -> u8 {
        self as u8
    }
}

/// The mutability of a global variable.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum Mutability {
    /// Immutable.
    Const = 0x00,
    /// Mutable.
    Var = 0x01,
}

/// Whether a linear memory or table may be shared between threads.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Shared {
    No,
    Yes,
}

/// The kind of an imported or exported entity.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum ExternalKind {
    Function = 0x00,
    Table = 0x01,
    Memory = 0x02,
    Global = 0x03,
    /// Exception event; requires the exceptions feature.
    Event = 0x04,
}

impl ExternalKind {
    pub(crate) fn from_wire(byte: u8, features: Features) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Function),
            0x01 => Some(Self::Table),
            0x02 => Some(Self::Memory),
            0x03 => Some(Self::Global),
            0x04 if features.contains(Features::EXCEPTIONS) => Some(Self::Event),
            _ => None,
        }
    }

    pub(crate) fn wire(self) -> u8 {
        self as u8
    }
}

/// Section identifier within a module.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum SectionId {
    /// Custom section with arbitrary data.
    Custom = 0,
    /// Function type declarations.
    Type = 1,
    /// Import declarations.
    Import = 2,
    /// Function type indices for module functions.
    Function = 3,
    /// Table declarations.
    Table = 4,
    /// Memory declarations.
    Memory = 5,
    /// Global declarations.
    Global = 6,
    /// Export declarations.
    Export = 7,
    /// Start function index.
    Start = 8,
    /// Element segments for table initialization.
    Element = 9,
    /// Function bodies.
    Code = 10,
    /// Data segments for memory initialization.
    Data = 11,
    /// Data segment count; requires the bulk memory feature.
    DataCount = 12,
    /// Event declarations; requires the exceptions feature.
    Event = 13,
}

impl SectionId {
    pub(crate) fn from_wire(value: u32, features: Features) -> Option<Self> {
        match value {
            0 => Some(Self::Custom),
            1 => Some(Self::Type),
            2 => Some(Self::Import),
            3 => Some(Self::Function),
            4 => Some(Self::Table),
            5 => Some(Self::Memory),
            6 => Some(Self::Global),
            7 => Some(Self::Export),
            8 => Some(Self::Start),
            9 => Some(Self::Element),
            10 => Some(Self::Code),
            11 => Some(Self::Data),
            12 if features.contains(Features::BULK_MEMORY) => Some(Self::DataCount),
            13 if features.contains(Features::EXCEPTIONS) => Some(Self::Event),
            _ => None,
        }
    }

    pub(crate) fn wire(self) -> u8 {
        self as u8
    }
}

/// The attribute of an event declaration. Exceptions are the only kind of
/// event so far.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, TryFromPrimitive)]
#[repr(u32)]
pub enum EventAttribute {
    Exception = 0,
}

/// The type of a structured control instruction.
///
/// Encoded as a signed LEB128 value: negative values select a value type
/// (or void), non-negative values are function type indices and require
/// the multi-value feature.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BlockType {
    /// The block produces no values.
    Void,
    /// The block produces a single value of the given type.
    Value(ValueType),
    /// The block's signature is the function type at the given index.
    Index(Index),
}

/// The size range of a resizeable storage: memory pages or table elements.
///
/// `max >= min` is not checked here (a validator concern).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Limits {
    /// Minimum size.
    pub min: Located<u32>,
    /// Maximum size, with None indicating no upper limit.
    pub max: Option<Located<u32>>,
    /// Whether the storage is shared between threads (threads feature).
    pub shared: Located<Shared>,
}

/// A linear memory type.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MemoryType {
    pub limits: Located<Limits>,
}

/// A table type: the element type it holds and its size limits.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TableType {
    pub ty: Located<ElementType>,
    pub limits: Located<Limits>,
}

/// A global variable type.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct GlobalType {
    pub ty: Located<ValueType>,
    pub mutability: Located<Mutability>,
}

/// An event type: its attribute and the function type it refers to.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct EventType {
    pub attribute: Located<EventAttribute>,
    pub type_index: Located<Index>,
}

/// The signature of a function, mapping parameters to results.
///
/// More than one result requires the multi-value feature; the decoder does
/// not enforce this (a validator concern).
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct FunctionType {
    pub params: Vec<Located<ValueType>>,
    pub results: Vec<Located<ValueType>>,
}

/// An entry of the type section: a function type behind its form byte.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TypeEntry {
    pub ty: Located<FunctionType>,
}

/// What an import provides.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ImportDesc {
    Function(Located<Index>),
    Table(Located<TableType>),
    Memory(Located<MemoryType>),
    Global(Located<GlobalType>),
    Event(Located<EventType>),
}

impl ImportDesc {
    /// The external kind of the imported entity.
    pub fn kind(&self) -> ExternalKind {
        match self {
            Self::Function(_) => ExternalKind::Function,
            Self::Table(_) => ExternalKind::Table,
            Self::Memory(_) => ExternalKind::Memory,
            Self::Global(_) => ExternalKind::Global,
            Self::Event(_) => ExternalKind::Event,
        }
    }
}

/// An import declaration.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Import<'a> {
    /// Name of the module to import from.
    pub module: Located<Name<'a>>,
    /// Name of the imported entity within that module.
    pub name: Located<Name<'a>>,
    /// Type of the imported entity.
    pub desc: ImportDesc,
}

/// An export declaration.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Export<'a> {
    pub name: Located<Name<'a>>,
    pub kind: Located<ExternalKind>,
    pub index: Located<Index>,
}

/// A function section entry: the index of the function's type.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Function {
    pub type_index: Located<Index>,
}

/// A table section entry.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Table {
    pub ty: Located<TableType>,
}

/// A memory section entry.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Memory {
    pub ty: Located<MemoryType>,
}

/// A global declaration with its initializer.
#[derive(Clone, Debug, PartialEq)]
pub struct Global {
    pub ty: Located<GlobalType>,
    pub init: Located<ConstantExpression>,
}

/// The start section: the index of the module's start function.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Start {
    pub func_index: Located<Index>,
}

/// An event declaration; requires the exceptions feature.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Event {
    pub ty: Located<EventType>,
}

/// A raw instruction sequence, terminated by an `end` instruction.
///
/// The bytes are kept as-is; use [`crate::decode::InstructionIter`] to walk
/// them.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Expression<'a> {
    pub data: Cow<'a, [u8]>,
}

impl<'a> Expression<'a> {
    pub fn new(data: impl Into<Cow<'a, [u8]>>) -> Self {
        Self { data: data.into() }
    }
}

/// A restricted expression used for segment offsets and global
/// initializers: exactly one value-producing instruction followed by `end`.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantExpression {
    pub instruction: Located<Instruction>,
}

/// An element-segment initializer expression: `ref.null` or `ref.func n`
/// followed by `end`.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementExpression {
    pub instruction: Located<Instruction>,
}

/// A run in the run-length-encoded locals vector of a function body.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Locals {
    pub count: Located<u32>,
    pub ty: Located<ValueType>,
}

/// A code section entry: local declarations and the function body.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Code<'a> {
    pub locals: Vec<Located<Locals>>,
    pub body: Located<Expression<'a>>,
}

/// An element segment, in one of the eight shapes selected by its flag
/// value. The first shape doubles as the MVP encoding (table index, offset,
/// function indices), whose bytes coincide with flag 0 when the index is 0.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementSegment {
    /// Flag 0: active, table 0 implicit, function-index list.
    Active {
        table: Located<Index>,
        offset: Located<ConstantExpression>,
        init: Vec<Located<Index>>,
    },
    /// Flag 1: passive, external-kind byte, index list.
    Passive {
        kind: Located<ExternalKind>,
        init: Vec<Located<Index>>,
    },
    /// Flag 2: active with explicit table index, external-kind byte,
    /// index list.
    ActiveWithTable {
        table: Located<Index>,
        offset: Located<ConstantExpression>,
        kind: Located<ExternalKind>,
        init: Vec<Located<Index>>,
    },
    /// Flag 3: declared, external-kind byte, index list.
    Declared {
        kind: Located<ExternalKind>,
        init: Vec<Located<Index>>,
    },
    /// Flag 4: active, table 0 implicit, element-expression list.
    ActiveExpressions {
        table: Located<Index>,
        offset: Located<ConstantExpression>,
        init: Vec<Located<ElementExpression>>,
    },
    /// Flag 5: passive, element-type byte, element-expression list.
    PassiveExpressions {
        ty: Located<ElementType>,
        init: Vec<Located<ElementExpression>>,
    },
    /// Flag 6: active with explicit table index, element-type byte,
    /// element-expression list.
    ActiveWithTableExpressions {
        table: Located<Index>,
        offset: Located<ConstantExpression>,
        ty: Located<ElementType>,
        init: Vec<Located<ElementExpression>>,
    },
    /// Flag 7: declared, element-type byte, element-expression list.
    DeclaredExpressions {
        ty: Located<ElementType>,
        init: Vec<Located<ElementExpression>>,
    },
}

/// A data segment, in one of the three shapes selected by its flag value.
/// The first shape doubles as the MVP encoding (memory index, offset,
/// bytes), whose bytes coincide with flag 0 when the index is 0.
#[derive(Clone, Debug, PartialEq)]
pub enum DataSegment<'a> {
    /// Flag 0: active, memory 0 implicit.
    Active {
        memory: Located<Index>,
        offset: Located<ConstantExpression>,
        init: Located<Cow<'a, [u8]>>,
    },
    /// Flag 1: passive.
    Passive { init: Located<Cow<'a, [u8]>> },
    /// Flag 2: active with explicit memory index.
    ActiveWithMemory {
        memory: Located<Index>,
        offset: Located<ConstantExpression>,
        init: Located<Cow<'a, [u8]>>,
    },
}

/// A known (standardized) section with its raw payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KnownSection<'a> {
    pub id: Located<SectionId>,
    pub data: Located<&'a [u8]>,
}

/// A custom section: a name followed by opaque bytes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CustomSection<'a> {
    pub name: Located<Name<'a>>,
    pub data: Located<&'a [u8]>,
}

/// A top-level framing unit of a binary module.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Section<'a> {
    Known(KnownSection<'a>),
    Custom(CustomSection<'a>),
}

/// The identifier of a "name" custom-section subsection.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum NameSubsectionId {
    /// The module's own name.
    ModuleName = 0,
    /// Names of functions.
    FunctionNames = 1,
    /// Names of the locals of each function.
    LocalNames = 2,
}

/// A subsection of the "name" custom section with its raw payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NameSubsection<'a> {
    pub id: Located<NameSubsectionId>,
    pub data: Located<&'a [u8]>,
}

/// An `(index, name)` pair of a name map.
///
/// Name maps are required to be sorted by index with unique entries;
/// neither is enforced here (a validator concern).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NameAssoc<'a> {
    pub index: Located<Index>,
    pub name: Located<Name<'a>>,
}

/// A `(function index, name map)` pair of the local-names subsection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndirectNameAssoc<'a> {
    pub index: Located<Index>,
    pub name_map: Vec<Located<NameAssoc<'a>>>,
}

/// An owned module tree, keyed by section kind.
///
/// This is the shape the text converter produces and the encoder consumes.
/// (Decoding yields a lazy section sequence instead; see the decode
/// module.)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Module<'a> {
    pub types: Vec<Located<TypeEntry>>,
    pub imports: Vec<Located<Import<'a>>>,
    pub functions: Vec<Located<Function>>,
    pub tables: Vec<Located<Table>>,
    pub memories: Vec<Located<Memory>>,
    pub globals: Vec<Located<Global>>,
    pub exports: Vec<Located<Export<'a>>>,
    pub start: Option<Located<Start>>,
    pub element_segments: Vec<Located<ElementSegment>>,
    pub data_count: Option<Located<u32>>,
    pub codes: Vec<Located<Code<'a>>>,
    pub data_segments: Vec<Located<DataSegment<'a>>>,
    pub events: Vec<Located<Event>>,
}
