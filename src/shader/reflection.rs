//! SPIR-V word-stream parsing and reflection
//!
//! Parsing makes a single linear pass over the instruction stream, recording
//! each instruction and indexing opcodes by result id for O(1) backward
//! reference resolution (a result id is always assigned before any later
//! instruction references it). Reflection then classifies `OpVariable`
//! entries by storage class into uniform blocks, opaque uniforms and stage
//! interface variables, annotated from `OpDecorate`/`OpMemberDecorate`.
//!
//! A module without the magic number is not SPIR-V: [`reflect`] returns
//! `None` and the caller treats the shader module as absent. Unrecognized
//! opcodes are skipped over by their word count.

use std::collections::{BTreeMap, HashMap};

use super::opcode::{self, decoration, dim, storage_class};

/// Concrete descriptor kind for a shader-visible resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    UniformBuffer,
    Sampler,
    SampledImage,
    CombinedImageSampler,
    StorageImage,
    UniformTexelBuffer,
    StorageTexelBuffer,
}

/// One shader-visible resource binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorBinding {
    pub name: String,
    pub set: u32,
    pub binding: u32,
    pub descriptor_type: DescriptorType,
}

/// A member of a uniform block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlockMember {
    pub name: String,
    pub offset: u32,
    pub size: u32,
}

/// A `Block`-decorated uniform struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlock {
    pub name: String,
    pub set: u32,
    pub binding: u32,
    /// Total byte size: the last member's offset plus its size
    pub size: u32,
    pub members: Vec<UniformBlockMember>,
}

/// A vertex-stage input variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexInputAttribute {
    pub name: String,
    pub location: u32,
}

/// A fragment-stage output variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentOutput {
    pub name: String,
    pub location: u32,
}

/// Ready-to-consume layout description for one descriptor set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSetLayout {
    pub set: u32,
    /// Sorted by binding index
    pub bindings: Vec<DescriptorBinding>,
}

/// Structured reflection of one shader module
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderReflection {
    pub descriptor_bindings: Vec<DescriptorBinding>,
    pub uniform_blocks: Vec<UniformBlock>,
    pub vertex_input_attributes: Vec<VertexInputAttribute>,
    pub fragment_outputs: Vec<FragmentOutput>,
}

impl ShaderReflection {
    /// Group bindings per descriptor set, sorted by binding index
    pub fn descriptor_set_layouts(&self) -> Vec<DescriptorSetLayout> {
        let mut sets: BTreeMap<u32, Vec<DescriptorBinding>> = BTreeMap::new();
        for binding in &self.descriptor_bindings {
            sets.entry(binding.set).or_default().push(binding.clone());
        }
        sets.into_iter()
            .map(|(set, mut bindings)| {
                bindings.sort_by_key(|b| b.binding);
                DescriptorSetLayout { set, bindings }
            })
            .collect()
    }
}

/// One parsed instruction: opcode plus its word span in the module
#[derive(Debug, Clone, Copy)]
struct Instruction {
    code: u32,
    offset: usize,
    word_count: usize,
}

struct Module<'a> {
    words: &'a [u32],
    instructions: Vec<Instruction>,
    /// result id -> index into `instructions`
    op_results: Vec<Option<usize>>,
}

impl<'a> Module<'a> {
    fn parse(words: &'a [u32]) -> Option<Self> {
        if words.len() < opcode::HEADER_WORD_COUNT || words[0] != opcode::SPIRV_MAGIC {
            return None;
        }
        let id_bound = words[3] as usize;
        let mut instructions = Vec::new();
        let mut op_results = vec![None; id_bound];

        let mut offset = opcode::HEADER_WORD_COUNT;
        while offset < words.len() {
            let opword = words[offset];
            let word_count = ((opword >> 16) & 0xFFFF) as usize;
            let code = opword & 0xFFFF;
            if word_count == 0 || offset + word_count > words.len() {
                // Truncated or malformed tail; keep what parsed so far
                log::debug!("Malformed instruction at word {}, stopping parse", offset);
                break;
            }
            if let Some(info) = opcode::lookup(code) {
                // Recognized instructions shorter than their minimum
                // encoding are dropped; reflection never sees them, so
                // operand accesses downstream stay in bounds.
                if word_count < info.min_word_count {
                    log::debug!(
                        "Short {} ({} of {} words) at word {}, skipping",
                        info.name,
                        word_count,
                        info.min_word_count,
                        offset
                    );
                    offset += word_count;
                    continue;
                }
                if info.has_result {
                    let result_word = if info.has_result_type { 2 } else { 1 };
                    let result_id = words[offset + result_word] as usize;
                    if result_id < op_results.len() {
                        op_results[result_id] = Some(instructions.len());
                    }
                }
            }
            instructions.push(Instruction {
                code,
                offset,
                word_count,
            });
            offset += word_count;
        }
        Some(Self {
            words,
            instructions,
            op_results,
        })
    }

    /// Operand words of an instruction (everything after the opword)
    fn operands(&self, instruction: &Instruction) -> &[u32] {
        &self.words[instruction.offset + 1..instruction.offset + instruction.word_count]
    }

    fn instruction_for_result(&self, id: u32) -> Option<&Instruction> {
        self.op_results
            .get(id as usize)
            .copied()
            .flatten()
            .map(|index| &self.instructions[index])
    }

    /// Pointee type of an `OpTypePointer` result
    fn pointee_type(&self, pointer_type_id: u32) -> Option<&Instruction> {
        let pointer = self.instruction_for_result(pointer_type_id)?;
        if pointer.code != opcode::OP_TYPE_POINTER {
            return None;
        }
        self.instruction_for_result(self.operands(pointer)[2])
    }

    /// Byte size of a type id, resolving nested vectors/matrices/arrays
    fn type_size(&self, type_id: u32) -> u32 {
        let Some(instruction) = self.instruction_for_result(type_id) else {
            return 0;
        };
        let operands = self.operands(instruction);
        match instruction.code {
            opcode::OP_TYPE_BOOL => 4,
            opcode::OP_TYPE_INT | opcode::OP_TYPE_FLOAT => operands[1] / 8,
            opcode::OP_TYPE_VECTOR | opcode::OP_TYPE_MATRIX => {
                // component/column type id, then count
                operands[2] * self.type_size(operands[1])
            }
            opcode::OP_TYPE_ARRAY => {
                let length = self
                    .instruction_for_result(operands[2])
                    .filter(|c| c.code == opcode::OP_CONSTANT)
                    .map(|c| self.operands(c)[2])
                    .unwrap_or(0);
                length * self.type_size(operands[1])
            }
            opcode::OP_TYPE_STRUCT => operands[1..].iter().map(|&m| self.type_size(m)).sum(),
            _ => 0,
        }
    }
}

/// Decode a null-terminated string literal packed four bytes per word
fn decode_string(words: &[u32]) -> String {
    let mut bytes = Vec::with_capacity(words.len() * 4);
    'outer: for word in words {
        for byte in word.to_le_bytes() {
            if byte == 0 {
                break 'outer;
            }
            bytes.push(byte);
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Parse and reflect a shader binary. `None` means the words are not a
/// SPIR-V module (bad magic or truncated header).
pub fn reflect(words: &[u32]) -> Option<ShaderReflection> {
    let module = Module::parse(words)?;

    // Index names and decorations before walking variables
    let mut names: HashMap<u32, String> = HashMap::new();
    let mut member_names: HashMap<(u32, u32), String> = HashMap::new();
    let mut decorations: HashMap<(u32, u32), u32> = HashMap::new();
    let mut member_decorations: HashMap<(u32, u32, u32), u32> = HashMap::new();
    for instruction in &module.instructions {
        let operands = module.operands(instruction);
        match instruction.code {
            opcode::OP_NAME => {
                names.insert(operands[0], decode_string(&operands[1..]));
            }
            opcode::OP_MEMBER_NAME => {
                member_names.insert((operands[0], operands[1]), decode_string(&operands[2..]));
            }
            opcode::OP_DECORATE => {
                let value = operands.get(2).copied().unwrap_or(0);
                decorations.insert((operands[0], operands[1]), value);
            }
            opcode::OP_MEMBER_DECORATE => {
                let value = operands.get(3).copied().unwrap_or(0);
                member_decorations.insert((operands[0], operands[1], operands[2]), value);
            }
            _ => {}
        }
    }

    let name_of = |id: u32| names.get(&id).cloned().unwrap_or_default();
    let has_decoration = |id: u32, decoration: u32| decorations.contains_key(&(id, decoration));
    let decoration_value =
        |id: u32, decoration: u32| decorations.get(&(id, decoration)).copied().unwrap_or(0);

    let mut reflection = ShaderReflection::default();
    for instruction in &module.instructions {
        if instruction.code != opcode::OP_VARIABLE {
            continue;
        }
        let operands = module.operands(instruction);
        let pointer_type_id = operands[0];
        let variable_id = operands[1];
        let storage = operands[2];
        match storage {
            storage_class::INPUT | storage_class::OUTPUT => {
                if has_decoration(variable_id, decoration::BUILT_IN)
                    || is_builtin_interface_block(&module, pointer_type_id, &member_decorations)
                {
                    continue;
                }
                let name = name_of(variable_id);
                let location = decoration_value(variable_id, decoration::LOCATION);
                if storage == storage_class::INPUT {
                    reflection
                        .vertex_input_attributes
                        .push(VertexInputAttribute { name, location });
                } else {
                    reflection.fragment_outputs.push(FragmentOutput { name, location });
                }
            }
            storage_class::UNIFORM => {
                let Some(pointee) = module.pointee_type(pointer_type_id) else {
                    continue;
                };
                let struct_id = module.operands(pointee)[0];
                if pointee.code != opcode::OP_TYPE_STRUCT
                    || !(has_decoration(struct_id, decoration::BLOCK)
                        || has_decoration(struct_id, decoration::BUFFER_BLOCK))
                {
                    continue;
                }
                let set = decoration_value(variable_id, decoration::DESCRIPTOR_SET);
                let binding = decoration_value(variable_id, decoration::BINDING);
                // Block name sits on the struct type when the instance
                // variable is anonymous
                let mut name = name_of(variable_id);
                if name.is_empty() {
                    name = name_of(struct_id);
                }
                let block =
                    resolve_uniform_block(&module, struct_id, pointee, &member_names, &member_decorations);
                reflection.descriptor_bindings.push(DescriptorBinding {
                    name: name.clone(),
                    set,
                    binding,
                    descriptor_type: DescriptorType::UniformBuffer,
                });
                reflection.uniform_blocks.push(UniformBlock {
                    name,
                    set,
                    binding,
                    size: block.0,
                    members: block.1,
                });
            }
            storage_class::UNIFORM_CONSTANT => {
                let Some(pointee) = module.pointee_type(pointer_type_id) else {
                    continue;
                };
                let Some(descriptor_type) = classify_opaque_uniform(&module, pointee) else {
                    log::debug!(
                        "Skipping unclassifiable uniform constant '{}'",
                        name_of(variable_id)
                    );
                    continue;
                };
                reflection.descriptor_bindings.push(DescriptorBinding {
                    name: name_of(variable_id),
                    set: decoration_value(variable_id, decoration::DESCRIPTOR_SET),
                    binding: decoration_value(variable_id, decoration::BINDING),
                    descriptor_type,
                });
            }
            _ => {}
        }
    }
    Some(reflection)
}

/// gl_PerVertex-style interface blocks carry `BuiltIn` member decorations
/// and are not application attributes
fn is_builtin_interface_block(
    module: &Module,
    pointer_type_id: u32,
    member_decorations: &HashMap<(u32, u32, u32), u32>,
) -> bool {
    let Some(pointee) = module.pointee_type(pointer_type_id) else {
        return false;
    };
    if pointee.code != opcode::OP_TYPE_STRUCT {
        return false;
    }
    let struct_id = module.operands(pointee)[0];
    member_decorations
        .keys()
        .any(|&(id, _, decoration)| id == struct_id && decoration == decoration::BUILT_IN)
}

/// Distinguish the concrete descriptor kind of a `UniformConstant` variable
/// from its pointee type's structure: the image's declared `sampled` flag
/// (1 = sampled, 2 = storage) and its dimensionality (buffer vs image).
fn classify_opaque_uniform(module: &Module, pointee: &Instruction) -> Option<DescriptorType> {
    match pointee.code {
        opcode::OP_TYPE_SAMPLER => Some(DescriptorType::Sampler),
        opcode::OP_TYPE_SAMPLED_IMAGE => {
            let image_id = module.operands(pointee)[1];
            let image = module.instruction_for_result(image_id)?;
            if image.code != opcode::OP_TYPE_IMAGE {
                return None;
            }
            if module.operands(image)[2] == dim::BUFFER {
                Some(DescriptorType::UniformTexelBuffer)
            } else {
                Some(DescriptorType::CombinedImageSampler)
            }
        }
        opcode::OP_TYPE_IMAGE => {
            let operands = module.operands(pointee);
            let dimensionality = operands[2];
            let sampled = operands[6];
            if dimensionality == dim::BUFFER {
                if sampled == 2 {
                    Some(DescriptorType::StorageTexelBuffer)
                } else {
                    Some(DescriptorType::UniformTexelBuffer)
                }
            } else if sampled == 2 {
                Some(DescriptorType::StorageImage)
            } else {
                Some(DescriptorType::SampledImage)
            }
        }
        _ => None,
    }
}

/// Member names, offsets and sizes of a block struct; total size is the
/// last member's offset plus its size
fn resolve_uniform_block(
    module: &Module,
    struct_id: u32,
    struct_instruction: &Instruction,
    member_names: &HashMap<(u32, u32), String>,
    member_decorations: &HashMap<(u32, u32, u32), u32>,
) -> (u32, Vec<UniformBlockMember>) {
    let member_types = &module.operands(struct_instruction)[1..];
    let mut members = Vec::with_capacity(member_types.len());
    let mut total_size = 0u32;
    for (index, &member_type) in member_types.iter().enumerate() {
        let index = index as u32;
        let name = member_names
            .get(&(struct_id, index))
            .cloned()
            .unwrap_or_default();
        let offset = member_decorations
            .get(&(struct_id, index, decoration::OFFSET))
            .copied()
            .unwrap_or(0);
        let size = module.type_size(member_type);
        total_size = total_size.max(offset + size);
        members.push(UniformBlockMember { name, offset, size });
    }
    (total_size, members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::opcode::*;

    /// Assembles a SPIR-V word stream instruction by instruction
    struct ModuleBuilder {
        words: Vec<u32>,
        next_id: u32,
    }

    impl ModuleBuilder {
        fn new() -> Self {
            // magic, version 1.0, generator, id bound (patched), reserved
            Self {
                words: vec![SPIRV_MAGIC, 0x0001_0000, 0, 0, 0],
                next_id: 1,
            }
        }

        fn id(&mut self) -> u32 {
            let id = self.next_id;
            self.next_id += 1;
            id
        }

        fn inst(&mut self, code: u32, operands: &[u32]) {
            let word_count = (operands.len() + 1) as u32;
            self.words.push((word_count << 16) | code);
            self.words.extend_from_slice(operands);
        }

        fn name(&mut self, target: u32, name: &str) {
            let mut operands = vec![target];
            operands.extend(encode_string(name));
            self.inst(OP_NAME, &operands);
        }

        fn member_name(&mut self, target: u32, member: u32, name: &str) {
            let mut operands = vec![target, member];
            operands.extend(encode_string(name));
            self.inst(OP_MEMBER_NAME, &operands);
        }

        fn build(mut self) -> Vec<u32> {
            self.words[3] = self.next_id;
            self.words
        }
    }

    fn encode_string(s: &str) -> Vec<u32> {
        let mut bytes: Vec<u8> = s.bytes().collect();
        bytes.push(0);
        while bytes.len() % 4 != 0 {
            bytes.push(0);
        }
        bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    /// A vertex-shader-shaped module: one uniform block (mat4 + vec4), one
    /// combined image sampler at binding 1, one input attribute.
    fn sample_module() -> Vec<u32> {
        let mut b = ModuleBuilder::new();
        let f32_ty = b.id();
        let vec4_ty = b.id();
        let mat4_ty = b.id();
        let block_ty = b.id();
        let block_ptr = b.id();
        let block_var = b.id();
        let image_ty = b.id();
        let sampled_image_ty = b.id();
        let sampler_ptr = b.id();
        let sampler_var = b.id();
        let input_ptr = b.id();
        let input_var = b.id();

        b.name(block_ty, "WorldBlock");
        b.member_name(block_ty, 0, "uMvp");
        b.member_name(block_ty, 1, "uColor");
        b.name(sampler_var, "sTexture");
        b.name(input_var, "aPosition");

        b.inst(OP_DECORATE, &[block_ty, decoration::BLOCK]);
        b.inst(
            OP_MEMBER_DECORATE,
            &[block_ty, 0, decoration::OFFSET, 0],
        );
        b.inst(
            OP_MEMBER_DECORATE,
            &[block_ty, 1, decoration::OFFSET, 64],
        );
        b.inst(OP_DECORATE, &[block_var, decoration::DESCRIPTOR_SET, 0]);
        b.inst(OP_DECORATE, &[block_var, decoration::BINDING, 0]);
        b.inst(OP_DECORATE, &[sampler_var, decoration::DESCRIPTOR_SET, 0]);
        b.inst(OP_DECORATE, &[sampler_var, decoration::BINDING, 1]);
        b.inst(OP_DECORATE, &[input_var, decoration::LOCATION, 0]);

        b.inst(OP_TYPE_FLOAT, &[f32_ty, 32]);
        b.inst(OP_TYPE_VECTOR, &[vec4_ty, f32_ty, 4]);
        b.inst(OP_TYPE_MATRIX, &[mat4_ty, vec4_ty, 4]);
        b.inst(OP_TYPE_STRUCT, &[block_ty, mat4_ty, vec4_ty]);
        b.inst(
            OP_TYPE_POINTER,
            &[block_ptr, storage_class::UNIFORM, block_ty],
        );
        b.inst(OP_VARIABLE, &[block_ptr, block_var, storage_class::UNIFORM]);
        // 2D image, depth 0, not arrayed, single sampled, sampled flag 1
        b.inst(OP_TYPE_IMAGE, &[image_ty, f32_ty, dim::DIM_2D, 0, 0, 0, 1, 0]);
        b.inst(OP_TYPE_SAMPLED_IMAGE, &[sampled_image_ty, image_ty]);
        b.inst(
            OP_TYPE_POINTER,
            &[sampler_ptr, storage_class::UNIFORM_CONSTANT, sampled_image_ty],
        );
        b.inst(
            OP_VARIABLE,
            &[sampler_ptr, sampler_var, storage_class::UNIFORM_CONSTANT],
        );
        b.inst(OP_TYPE_POINTER, &[input_ptr, storage_class::INPUT, vec4_ty]);
        b.inst(OP_VARIABLE, &[input_ptr, input_var, storage_class::INPUT]);
        b.build()
    }

    #[test]
    fn test_bad_magic_is_not_spirv() {
        let mut words = sample_module();
        words[0] = 0xDEAD_BEEF;
        assert!(reflect(&words).is_none());
        assert!(reflect(&[]).is_none());
    }

    #[test]
    fn test_reflection_is_deterministic() {
        let words = sample_module();
        let first = reflect(&words).unwrap();
        let second = reflect(&words).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_descriptor_bindings() {
        let reflection = reflect(&sample_module()).unwrap();
        assert_eq!(reflection.descriptor_bindings.len(), 2);

        let block = &reflection.descriptor_bindings[0];
        assert_eq!(block.name, "WorldBlock");
        assert_eq!(block.set, 0);
        assert_eq!(block.binding, 0);
        assert_eq!(block.descriptor_type, DescriptorType::UniformBuffer);

        let sampler = &reflection.descriptor_bindings[1];
        assert_eq!(sampler.name, "sTexture");
        assert_eq!(sampler.binding, 1);
        assert_eq!(
            sampler.descriptor_type,
            DescriptorType::CombinedImageSampler
        );
    }

    #[test]
    fn test_uniform_block_members_and_size() {
        let reflection = reflect(&sample_module()).unwrap();
        assert_eq!(reflection.uniform_blocks.len(), 1);
        let block = &reflection.uniform_blocks[0];
        assert_eq!(
            block.members,
            vec![
                UniformBlockMember {
                    name: "uMvp".into(),
                    offset: 0,
                    size: 64
                },
                UniformBlockMember {
                    name: "uColor".into(),
                    offset: 64,
                    size: 16
                },
            ]
        );
        assert_eq!(block.size, 80);
    }

    #[test]
    fn test_vertex_input_attributes() {
        let reflection = reflect(&sample_module()).unwrap();
        assert_eq!(
            reflection.vertex_input_attributes,
            vec![VertexInputAttribute {
                name: "aPosition".into(),
                location: 0
            }]
        );
    }

    #[test]
    fn test_descriptor_set_layouts_sorted_by_binding() {
        let reflection = reflect(&sample_module()).unwrap();
        let layouts = reflection.descriptor_set_layouts();
        assert_eq!(layouts.len(), 1);
        assert_eq!(layouts[0].set, 0);
        let bindings: Vec<u32> = layouts[0].bindings.iter().map(|b| b.binding).collect();
        assert_eq!(bindings, vec![0, 1]);
    }

    #[test]
    fn test_storage_and_texel_buffer_classification() {
        let mut b = ModuleBuilder::new();
        let f32_ty = b.id();
        let storage_image_ty = b.id();
        let storage_image_ptr = b.id();
        let storage_image_var = b.id();
        let texel_ty = b.id();
        let texel_ptr = b.id();
        let texel_var = b.id();
        b.name(storage_image_var, "uOutput");
        b.name(texel_var, "uLut");
        b.inst(OP_DECORATE, &[storage_image_var, decoration::BINDING, 0]);
        b.inst(OP_DECORATE, &[texel_var, decoration::BINDING, 1]);
        b.inst(OP_TYPE_FLOAT, &[f32_ty, 32]);
        // 2D image with sampled flag 2: storage image
        b.inst(
            OP_TYPE_IMAGE,
            &[storage_image_ty, f32_ty, dim::DIM_2D, 0, 0, 0, 2, 0],
        );
        b.inst(
            OP_TYPE_POINTER,
            &[
                storage_image_ptr,
                storage_class::UNIFORM_CONSTANT,
                storage_image_ty,
            ],
        );
        b.inst(
            OP_VARIABLE,
            &[
                storage_image_ptr,
                storage_image_var,
                storage_class::UNIFORM_CONSTANT,
            ],
        );
        // Buffer-dimension image with sampled flag 2: storage texel buffer
        b.inst(
            OP_TYPE_IMAGE,
            &[texel_ty, f32_ty, dim::BUFFER, 0, 0, 0, 2, 0],
        );
        b.inst(
            OP_TYPE_POINTER,
            &[texel_ptr, storage_class::UNIFORM_CONSTANT, texel_ty],
        );
        b.inst(
            OP_VARIABLE,
            &[texel_ptr, texel_var, storage_class::UNIFORM_CONSTANT],
        );

        let reflection = reflect(&b.build()).unwrap();
        assert_eq!(
            reflection.descriptor_bindings[0].descriptor_type,
            DescriptorType::StorageImage
        );
        assert_eq!(
            reflection.descriptor_bindings[1].descriptor_type,
            DescriptorType::StorageTexelBuffer
        );
    }

    #[test]
    fn test_short_instructions_are_dropped() {
        // Well-formed module followed by under-length encodings of
        // recognized opcodes: a decoration with no target, a name with no
        // string, a variable missing its storage class.
        let mut words = sample_module();
        words.push((2 << 16) | OP_DECORATE);
        words.push(5);
        words.push((1 << 16) | OP_NAME);
        words.push((3 << 16) | OP_VARIABLE);
        words.push(1);
        words.push(2);
        let reflection = reflect(&words).unwrap();
        assert_eq!(reflection, reflect(&sample_module()).unwrap());
    }

    #[test]
    fn test_lone_short_decoration_reflects_to_nothing() {
        let words = vec![SPIRV_MAGIC, 0x0001_0000, 0, 10, 0, (2 << 16) | OP_DECORATE, 5];
        let reflection = reflect(&words).unwrap();
        assert_eq!(reflection, ShaderReflection::default());
    }

    #[test]
    fn test_unknown_opcodes_are_skipped() {
        let mut words = sample_module();
        // Append an unrecognized instruction; reflection is unaffected
        words.push((2 << 16) | 400);
        words.push(0);
        let reflection = reflect(&words).unwrap();
        assert_eq!(reflection.descriptor_bindings.len(), 2);
    }
}
