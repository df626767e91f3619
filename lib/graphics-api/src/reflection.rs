//! Shader reflection data and stage merging.
//!
//! Reflection blobs arrive from the shader pipeline alongside the compiled
//! bytecode. Program construction merges the per-stage blobs into one table
//! that drives descriptor-set-layout creation and the state tracker's
//! relevance decisions (active vertex attributes, written color attachments).

use std::hash::{Hash, Hasher};

use fnv::FnvHasher;

use crate::{GfxResult, ShaderStageFlags, MAX_DESCRIPTOR_SET_LAYOUTS};

/// What kind of resource a binding slot expects.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShaderResourceType {
    Sampler,
    SampledTexture,
    StorageTexture,
    UniformBuffer,
    StorageBuffer,
    TexelBuffer,
    AccelerationStructure,
}

/// One binding slot within a descriptor set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShaderResource {
    pub binding: u32,
    pub resource_type: ShaderResourceType,
    pub array_size: u32,
    pub used_in_stages: ShaderStageFlags,
}

impl ShaderResource {
    pub fn array_size_normalized(&self) -> u32 {
        self.array_size.max(1)
    }

    fn verify_compatible_across_stages(&self, other: &Self) -> GfxResult<()> {
        if self.resource_type != other.resource_type {
            return Err(format!(
                "binding {} is used with different resource types {:?} and {:?} across stages",
                self.binding, self.resource_type, other.resource_type
            )
            .into());
        }

        if self.array_size_normalized() != other.array_size_normalized() {
            return Err(format!(
                "binding {} is used with different array sizes {} and {} across stages",
                self.binding,
                self.array_size_normalized(),
                other.array_size_normalized()
            )
            .into());
        }

        Ok(())
    }
}

/// The bindings of one descriptor set, kept sorted by binding index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DescriptorSetReflection {
    pub bindings: Vec<ShaderResource>,
}

impl DescriptorSetReflection {
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Content hash, the key of the descriptor-set-layout factory.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = FnvHasher::default();
        for binding in &self.bindings {
            binding.binding.hash(&mut hasher);
            binding.resource_type.hash(&mut hasher);
            binding.array_size_normalized().hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Reflection data for one compiled shader stage or a whole program.
#[derive(Clone, Debug, Default)]
pub struct ShaderReflection {
    pub stages: ShaderStageFlags,
    /// Bit i set: the program reads vertex attribute location i.
    pub vertex_attribute_mask: u32,
    /// Bit i set: the fragment stage writes color attachment i.
    pub color_attachment_mask: u32,
    pub descriptor_sets: [DescriptorSetReflection; MAX_DESCRIPTOR_SET_LAYOUTS],
    pub push_constant_size: u32,
    pub workgroup_size: Option<[u32; 3]>,
    pub has_discard: bool,
}

impl ShaderReflection {
    /// Merges another stage's reflection into this one, checking that shared
    /// bindings are compatible.
    pub fn merge(&mut self, other: &Self) -> GfxResult<()> {
        // Several miss/hit-group shaders legitimately share a ray-tracing
        // stage; a duplicated graphics or compute stage is a caller bug.
        let overlap = self.stages & other.stages;
        if overlap.intersects(ShaderStageFlags::ALL_GRAPHICS | ShaderStageFlags::COMPUTE) {
            return Err(format!(
                "duplicate shader stage {:?} while merging reflection",
                overlap
            )
            .into());
        }
        self.stages |= other.stages;

        self.vertex_attribute_mask |= other.vertex_attribute_mask;
        self.color_attachment_mask |= other.color_attachment_mask;
        self.has_discard |= other.has_discard;

        if other.workgroup_size.is_some() {
            self.workgroup_size = other.workgroup_size;
        }

        if self.push_constant_size != 0
            && other.push_constant_size != 0
            && self.push_constant_size != other.push_constant_size
        {
            return Err("push constant block has different sizes in different stages"
                .to_string()
                .into());
        }
        self.push_constant_size = self.push_constant_size.max(other.push_constant_size);

        for (set_index, other_set) in other.descriptor_sets.iter().enumerate() {
            let merged_set = &mut self.descriptor_sets[set_index];
            for resource in &other_set.bindings {
                match merged_set
                    .bindings
                    .iter_mut()
                    .find(|b| b.binding == resource.binding)
                {
                    Some(existing) => {
                        existing.verify_compatible_across_stages(resource)?;
                        existing.used_in_stages |= resource.used_in_stages | other.stages;
                    }
                    None => {
                        let mut resource = resource.clone();
                        resource.used_in_stages |= other.stages;
                        merged_set.bindings.push(resource);
                    }
                }
            }
            merged_set.bindings.sort_by_key(|b| b.binding);
        }

        Ok(())
    }

    /// Number of trailing descriptor sets that are actually populated.
    pub fn descriptor_set_count(&self) -> usize {
        self.descriptor_sets
            .iter()
            .rposition(|set| !set.is_empty())
            .map_or(0, |index| index + 1)
    }

    /// Content hash over everything the pipeline layout depends on.
    pub fn layout_hash(&self) -> u64 {
        let mut hasher = FnvHasher::default();
        for set in &self.descriptor_sets {
            set.content_hash().hash(&mut hasher);
        }
        self.push_constant_size.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_reflection(
        stages: ShaderStageFlags,
        set: usize,
        binding: u32,
        resource_type: ShaderResourceType,
    ) -> ShaderReflection {
        let mut reflection = ShaderReflection {
            stages,
            ..ShaderReflection::default()
        };
        reflection.descriptor_sets[set].bindings.push(ShaderResource {
            binding,
            resource_type,
            array_size: 0,
            used_in_stages: stages,
        });
        reflection
    }

    #[test]
    fn merge_unions_stages() {
        let mut merged = stage_reflection(
            ShaderStageFlags::VERTEX,
            0,
            0,
            ShaderResourceType::UniformBuffer,
        );
        let fragment = stage_reflection(
            ShaderStageFlags::FRAGMENT,
            0,
            0,
            ShaderResourceType::UniformBuffer,
        );
        merged.merge(&fragment).unwrap();

        assert_eq!(merged.stages, ShaderStageFlags::ALL_GRAPHICS);
        assert_eq!(merged.descriptor_sets[0].bindings.len(), 1);
        assert_eq!(
            merged.descriptor_sets[0].bindings[0].used_in_stages,
            ShaderStageFlags::ALL_GRAPHICS
        );
    }

    #[test]
    fn merge_rejects_mismatched_types() {
        let mut merged = stage_reflection(
            ShaderStageFlags::VERTEX,
            0,
            3,
            ShaderResourceType::UniformBuffer,
        );
        let fragment = stage_reflection(
            ShaderStageFlags::FRAGMENT,
            0,
            3,
            ShaderResourceType::StorageBuffer,
        );
        assert!(merged.merge(&fragment).is_err());
    }

    #[test]
    fn merge_rejects_duplicate_stage() {
        let mut merged = stage_reflection(
            ShaderStageFlags::FRAGMENT,
            0,
            0,
            ShaderResourceType::Sampler,
        );
        let again = stage_reflection(
            ShaderStageFlags::FRAGMENT,
            1,
            0,
            ShaderResourceType::Sampler,
        );
        assert!(merged.merge(&again).is_err());
    }

    #[test]
    fn set_count_and_hash() {
        let reflection = stage_reflection(
            ShaderStageFlags::COMPUTE,
            2,
            0,
            ShaderResourceType::StorageBuffer,
        );
        assert_eq!(reflection.descriptor_set_count(), 3);
        assert!(reflection.descriptor_sets[2].content_hash() != 0);

        // Same content, different construction order, same hash.
        let mut a = DescriptorSetReflection::default();
        a.bindings.push(ShaderResource {
            binding: 1,
            resource_type: ShaderResourceType::SampledTexture,
            array_size: 4,
            used_in_stages: ShaderStageFlags::FRAGMENT,
        });
        let b = a.clone();
        assert_eq!(a.content_hash(), b.content_hash());
    }
}
