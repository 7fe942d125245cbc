//! SPIR-V opcode numbers and per-opcode metadata
//!
//! Only the opcodes the reflector inspects are listed; anything else is
//! skipped over by its word count during parsing.

/// First word of every SPIR-V module
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Words in the module header: magic, version, generator, id bound, reserved
pub const HEADER_WORD_COUNT: usize = 5;

pub const OP_NAME: u32 = 5;
pub const OP_MEMBER_NAME: u32 = 6;
pub const OP_ENTRY_POINT: u32 = 15;
pub const OP_TYPE_VOID: u32 = 19;
pub const OP_TYPE_BOOL: u32 = 20;
pub const OP_TYPE_INT: u32 = 21;
pub const OP_TYPE_FLOAT: u32 = 22;
pub const OP_TYPE_VECTOR: u32 = 23;
pub const OP_TYPE_MATRIX: u32 = 24;
pub const OP_TYPE_IMAGE: u32 = 25;
pub const OP_TYPE_SAMPLER: u32 = 26;
pub const OP_TYPE_SAMPLED_IMAGE: u32 = 27;
pub const OP_TYPE_ARRAY: u32 = 28;
pub const OP_TYPE_RUNTIME_ARRAY: u32 = 29;
pub const OP_TYPE_STRUCT: u32 = 30;
pub const OP_TYPE_OPAQUE: u32 = 31;
pub const OP_TYPE_POINTER: u32 = 32;
pub const OP_CONSTANT_TRUE: u32 = 41;
pub const OP_CONSTANT_FALSE: u32 = 42;
pub const OP_CONSTANT: u32 = 43;
pub const OP_VARIABLE: u32 = 59;
pub const OP_DECORATE: u32 = 71;
pub const OP_MEMBER_DECORATE: u32 = 72;

/// Variable storage classes
pub mod storage_class {
    pub const UNIFORM_CONSTANT: u32 = 0;
    pub const INPUT: u32 = 1;
    pub const UNIFORM: u32 = 2;
    pub const OUTPUT: u32 = 3;
    pub const PUSH_CONSTANT: u32 = 9;
}

/// Decoration numbers consumed by reflection
pub mod decoration {
    pub const BLOCK: u32 = 2;
    pub const BUFFER_BLOCK: u32 = 3;
    pub const BUILT_IN: u32 = 11;
    pub const LOCATION: u32 = 30;
    pub const BINDING: u32 = 33;
    pub const DESCRIPTOR_SET: u32 = 34;
    pub const OFFSET: u32 = 35;
}

/// Image dimensionality values from `OpTypeImage`
pub mod dim {
    pub const DIM_1D: u32 = 0;
    pub const DIM_2D: u32 = 1;
    pub const DIM_3D: u32 = 2;
    pub const CUBE: u32 = 3;
    pub const RECT: u32 = 4;
    pub const BUFFER: u32 = 5;
    pub const SUBPASS_DATA: u32 = 6;
}

/// Static metadata for one opcode
#[derive(Debug, Clone, Copy)]
pub struct OpCodeInfo {
    pub name: &'static str,
    pub code: u32,
    /// Smallest word count a well-formed instruction of this opcode can
    /// carry; shorter encodings are discarded during parsing
    pub min_word_count: usize,
    pub has_result: bool,
    pub has_result_type: bool,
    pub is_type: bool,
}

const fn info(
    name: &'static str,
    code: u32,
    min_word_count: usize,
    has_result: bool,
    has_result_type: bool,
    is_type: bool,
) -> OpCodeInfo {
    OpCodeInfo {
        name,
        code,
        min_word_count,
        has_result,
        has_result_type,
        is_type,
    }
}

/// Metadata table for recognized opcodes, ordered by opcode number
pub const OPCODE_TABLE: &[OpCodeInfo] = &[
    info("OpName", OP_NAME, 3, false, false, false),
    info("OpMemberName", OP_MEMBER_NAME, 4, false, false, false),
    info("OpEntryPoint", OP_ENTRY_POINT, 4, false, false, false),
    info("OpTypeVoid", OP_TYPE_VOID, 2, true, false, true),
    info("OpTypeBool", OP_TYPE_BOOL, 2, true, false, true),
    info("OpTypeInt", OP_TYPE_INT, 4, true, false, true),
    info("OpTypeFloat", OP_TYPE_FLOAT, 3, true, false, true),
    info("OpTypeVector", OP_TYPE_VECTOR, 4, true, false, true),
    info("OpTypeMatrix", OP_TYPE_MATRIX, 4, true, false, true),
    info("OpTypeImage", OP_TYPE_IMAGE, 9, true, false, true),
    info("OpTypeSampler", OP_TYPE_SAMPLER, 2, true, false, true),
    info("OpTypeSampledImage", OP_TYPE_SAMPLED_IMAGE, 3, true, false, true),
    info("OpTypeArray", OP_TYPE_ARRAY, 4, true, false, true),
    info("OpTypeRuntimeArray", OP_TYPE_RUNTIME_ARRAY, 3, true, false, true),
    info("OpTypeStruct", OP_TYPE_STRUCT, 2, true, false, true),
    info("OpTypeOpaque", OP_TYPE_OPAQUE, 3, true, false, true),
    info("OpTypePointer", OP_TYPE_POINTER, 4, true, false, true),
    info("OpConstantTrue", OP_CONSTANT_TRUE, 3, true, true, false),
    info("OpConstantFalse", OP_CONSTANT_FALSE, 3, true, true, false),
    info("OpConstant", OP_CONSTANT, 4, true, true, false),
    info("OpVariable", OP_VARIABLE, 4, true, true, false),
    info("OpDecorate", OP_DECORATE, 3, false, false, false),
    info("OpMemberDecorate", OP_MEMBER_DECORATE, 4, false, false, false),
];

/// Metadata for an opcode number, `None` for unrecognized opcodes
pub fn lookup(code: u32) -> Option<&'static OpCodeInfo> {
    OPCODE_TABLE.iter().find(|i| i.code == code)
}
