//! Per-command-buffer accumulation of graphics pipeline state.
//!
//! This is the way the command buffer sets the graphics state. Every setter
//! is equality-gated: setting a value that is already current does nothing,
//! in particular it does not invalidate the owning sub-state's content hash.
//! A draw calls [`GraphicsStateTracker::update_hashes`], which recomputes
//! only the stale sub-states, folds them into one combined hash and reports
//! whether the pipeline object has to be (re)bound.
//!
//! Dynamic state (viewport, scissor, stencil reference/masks, depth bias,
//! line width) bypasses the pipeline hash entirely; it carries its own dirty
//! bits and is re-emitted right before a draw by the backend.

use std::hash::{Hash, Hasher};

use fnv::FnvHasher;

use crate::{
    BlendFactor, BlendOperation, ColorWriteMask, CompareOperation, DynamicStateMask, Extents2D,
    FaceSelection, FillMode, Format, PrimitiveTopology, StencilOperation, VertexStepRate,
    MAX_COLOR_RENDER_TARGETS, MAX_VERTEX_ATTRIBUTES,
};

/// Initializer for dynamic stencil values. Deliberately implausible so the
/// first legitimate `set` call never compares equal to an uninitialized
/// default, and so the backend can assert the value was set before emission.
pub(crate) const UNSET_STENCIL_VALUE: u32 = 0x5A5A_5A5A;

fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = FnvHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Marker hash for a sub-state that is currently irrelevant (no active
/// vertex attributes, no color targets, no depth/stencil attachment).
const EMPTY_SUB_STATE_HASH: u64 = 0xC0FFEE;

/// The program-derived facts the tracker needs. Extracted from the shader
/// program's reflection by the command buffer when binding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BoundProgram {
    pub uuid: u64,
    /// Bit i set: the vertex stage reads attribute location i.
    pub vertex_attribute_mask: u32,
    /// Bit i set: the fragment stage writes color attachment i.
    pub color_attachment_mask: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct VertexBindingState {
    pub stride: u32,
    pub step_rate: VertexStepRate,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct VertexAttributeState {
    pub binding: u32,
    pub format: Format,
    pub relative_offset: u32,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct VertexSubState {
    pub bindings: [VertexBindingState; MAX_VERTEX_ATTRIBUTES],
    pub attributes: [VertexAttributeState; MAX_VERTEX_ATTRIBUTES],
    /// Which entries of `bindings`/`attributes` were ever set.
    pub bindings_set_mask: u32,
    pub attributes_set_mask: u32,
    /// Which attributes the bound program actually reads.
    pub active_attributes: u32,
}

#[derive(Clone, Debug)]
pub(crate) struct InputAssemblySubState {
    pub topology: PrimitiveTopology,
    pub primitive_restart: bool,
}

impl Default for InputAssemblySubState {
    fn default() -> Self {
        Self {
            topology: PrimitiveTopology::TriangleList,
            primitive_restart: false,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct RasterSubState {
    pub fill_mode: FillMode,
    pub cull_mode: FaceSelection,
    pub depth_bias_enabled: bool,
}

impl Default for RasterSubState {
    fn default() -> Self {
        Self {
            fill_mode: FillMode::Solid,
            cull_mode: FaceSelection::BACK,
            depth_bias_enabled: false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct StencilFaceState {
    pub fail_op: StencilOperation,
    pub pass_depth_fail_op: StencilOperation,
    pub pass_op: StencilOperation,
    pub compare: CompareOperation,
}

impl Default for StencilFaceState {
    fn default() -> Self {
        Self {
            fail_op: StencilOperation::Keep,
            pass_depth_fail_op: StencilOperation::Keep,
            pass_op: StencilOperation::Keep,
            compare: CompareOperation::Always,
        }
    }
}

impl StencilFaceState {
    /// The stencil unit does work iff some op can modify the buffer or the
    /// compare can reject fragments.
    pub(crate) fn test_enabled(&self) -> bool {
        self.compare != CompareOperation::Always
            || self.fail_op != StencilOperation::Keep
            || self.pass_depth_fail_op != StencilOperation::Keep
            || self.pass_op != StencilOperation::Keep
    }
}

#[derive(Clone, Debug)]
pub(crate) struct DepthSubState {
    pub compare: CompareOperation,
    pub write_enabled: bool,
}

impl Default for DepthSubState {
    fn default() -> Self {
        Self {
            compare: CompareOperation::Less,
            write_enabled: true,
        }
    }
}

pub(crate) fn depth_test_enabled(compare: CompareOperation, write_enabled: bool) -> bool {
    compare != CompareOperation::Always || write_enabled
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct BlendTargetState {
    pub src_rgb: BlendFactor,
    pub dst_rgb: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub rgb_op: BlendOperation,
    pub alpha_op: BlendOperation,
    pub channel_write_mask: ColorWriteMask,
}

impl Default for BlendTargetState {
    fn default() -> Self {
        Self {
            src_rgb: BlendFactor::One,
            dst_rgb: BlendFactor::Zero,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
            rgb_op: BlendOperation::Add,
            alpha_op: BlendOperation::Add,
            channel_write_mask: ColorWriteMask::ALL,
        }
    }
}

impl BlendTargetState {
    pub(crate) fn blending_enabled(&self) -> bool {
        self.src_rgb != BlendFactor::One
            || self.dst_rgb != BlendFactor::Zero
            || self.src_alpha != BlendFactor::One
            || self.dst_alpha != BlendFactor::Zero
            || self.rgb_op != BlendOperation::Add
            || self.alpha_op != BlendOperation::Add
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct BlendSubState {
    pub targets: [BlendTargetState; MAX_COLOR_RENDER_TARGETS],
    pub alpha_to_coverage: bool,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct MiscSubState {
    pub color_formats: [Format; MAX_COLOR_RENDER_TARGETS],
    /// Bit i set: color attachment i is bound.
    pub color_attachment_mask: u32,
    pub depth_stencil_format: Format,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct StaticState {
    pub vertex: VertexSubState,
    pub input_assembly: InputAssemblySubState,
    pub raster: RasterSubState,
    pub stencil_faces: [StencilFaceState; 2],
    pub depth: DepthSubState,
    pub blend: BlendSubState,
    pub misc: MiscSubState,
    pub program: Option<BoundProgram>,
}

/// State the native API treats as dynamic. Not hashed; re-emitted before a
/// draw when its dirty bit is set.
#[derive(Clone, Debug)]
pub(crate) struct DynamicState {
    pub stencil_compare_masks: [u32; 2],
    pub stencil_write_masks: [u32; 2],
    pub stencil_references: [u32; 2],

    pub viewport: [u32; 4],
    pub scissor: [u32; 4],

    pub depth_bias_constant: f32,
    pub depth_bias_clamp: f32,
    pub depth_bias_slope: f32,
    pub line_width: f32,

    pub stencil_compare_mask_dirty: bool,
    pub stencil_write_mask_dirty: bool,
    pub stencil_reference_dirty: bool,
    pub viewport_dirty: bool,
    pub scissor_dirty: bool,
    pub depth_bias_dirty: bool,
    pub line_width_dirty: bool,
    pub topology_dirty: bool,
}

impl Default for DynamicState {
    fn default() -> Self {
        Self {
            stencil_compare_masks: [UNSET_STENCIL_VALUE; 2],
            stencil_write_masks: [UNSET_STENCIL_VALUE; 2],
            stencil_references: [UNSET_STENCIL_VALUE; 2],
            viewport: [0; 4],
            scissor: [0, 0, u32::MAX, u32::MAX],
            depth_bias_constant: 0.0,
            depth_bias_clamp: 0.0,
            depth_bias_slope: 0.0,
            line_width: 1.0,
            stencil_compare_mask_dirty: true,
            stencil_write_mask_dirty: true,
            stencil_reference_dirty: true,
            viewport_dirty: true,
            scissor_dirty: true,
            depth_bias_dirty: true,
            line_width_dirty: true,
            topology_dirty: true,
        }
    }
}

/// Per-sub-state content hashes. `None` means the sub-state was mutated since
/// the hash was last computed.
#[derive(Clone, Debug, Default)]
struct SubStateHashes {
    vertex: Option<u64>,
    input_assembly: Option<u64>,
    raster: Option<u64>,
    depth_stencil: Option<u64>,
    blend: Option<u64>,
    misc: Option<u64>,
    program: Option<u64>,
}

/// See the module documentation.
pub struct GraphicsStateTracker {
    pub(crate) static_state: StaticState,
    pub(crate) dynamic_state: DynamicState,
    hashes: SubStateHashes,
    global_hash: u64,
    pub(crate) render_target_size: Extents2D,
    dynamic_mask: DynamicStateMask,
}

impl GraphicsStateTracker {
    pub fn new(dynamic_mask: DynamicStateMask) -> Self {
        Self {
            static_state: StaticState::default(),
            dynamic_state: DynamicState::default(),
            hashes: SubStateHashes::default(),
            global_hash: 0,
            render_target_size: Extents2D::default(),
            dynamic_mask,
        }
    }

    pub fn bind_vertex_buffer_state(&mut self, binding: u32, stride: u32, step_rate: VertexStepRate) {
        assert!((binding as usize) < MAX_VERTEX_ATTRIBUTES);
        let vertex = &mut self.static_state.vertex;
        let bit = 1u32 << binding;
        let state = VertexBindingState { stride, step_rate };
        if vertex.bindings_set_mask & bit == 0 || vertex.bindings[binding as usize] != state {
            vertex.bindings[binding as usize] = state;
            vertex.bindings_set_mask |= bit;
            self.hashes.vertex = None;
        }
    }

    pub fn set_vertex_attribute(
        &mut self,
        location: u32,
        buffer_binding: u32,
        format: Format,
        relative_offset: u32,
    ) {
        assert!((location as usize) < MAX_VERTEX_ATTRIBUTES);
        let vertex = &mut self.static_state.vertex;
        let bit = 1u32 << location;
        let state = VertexAttributeState {
            binding: buffer_binding,
            format,
            relative_offset,
        };
        if vertex.attributes_set_mask & bit == 0 || vertex.attributes[location as usize] != state {
            vertex.attributes[location as usize] = state;
            vertex.attributes_set_mask |= bit;
            self.hashes.vertex = None;
        }
    }

    pub fn set_fill_mode(&mut self, mode: FillMode) {
        if self.static_state.raster.fill_mode != mode {
            self.static_state.raster.fill_mode = mode;
            self.hashes.raster = None;
        }
    }

    pub fn set_cull_mode(&mut self, mode: FaceSelection) {
        if self.static_state.raster.cull_mode != mode {
            self.static_state.raster.cull_mode = mode;
            self.hashes.raster = None;
        }
    }

    pub fn set_stencil_operations(
        &mut self,
        face: FaceSelection,
        fail_op: StencilOperation,
        pass_depth_fail_op: StencilOperation,
        pass_op: StencilOperation,
    ) {
        assert!(!face.is_empty());
        for (index, bit) in [FaceSelection::FRONT, FaceSelection::BACK].iter().enumerate() {
            if !face.contains(*bit) {
                continue;
            }
            let state = &mut self.static_state.stencil_faces[index];
            if state.fail_op != fail_op
                || state.pass_depth_fail_op != pass_depth_fail_op
                || state.pass_op != pass_op
            {
                state.fail_op = fail_op;
                state.pass_depth_fail_op = pass_depth_fail_op;
                state.pass_op = pass_op;
                self.hashes.depth_stencil = None;
            }
        }
    }

    pub fn set_stencil_compare_operation(&mut self, face: FaceSelection, compare: CompareOperation) {
        assert!(!face.is_empty());
        for (index, bit) in [FaceSelection::FRONT, FaceSelection::BACK].iter().enumerate() {
            if face.contains(*bit) && self.static_state.stencil_faces[index].compare != compare {
                self.static_state.stencil_faces[index].compare = compare;
                self.hashes.depth_stencil = None;
            }
        }
    }

    pub fn set_stencil_compare_mask(&mut self, face: FaceSelection, mask: u32) {
        assert!(!face.is_empty());
        debug_assert!(self
            .dynamic_mask
            .contains(DynamicStateMask::STENCIL_COMPARE_MASK));
        for (index, bit) in [FaceSelection::FRONT, FaceSelection::BACK].iter().enumerate() {
            if face.contains(*bit) && self.dynamic_state.stencil_compare_masks[index] != mask {
                self.dynamic_state.stencil_compare_masks[index] = mask;
                self.dynamic_state.stencil_compare_mask_dirty = true;
            }
        }
    }

    pub fn set_stencil_write_mask(&mut self, face: FaceSelection, mask: u32) {
        assert!(!face.is_empty());
        debug_assert!(self
            .dynamic_mask
            .contains(DynamicStateMask::STENCIL_WRITE_MASK));
        for (index, bit) in [FaceSelection::FRONT, FaceSelection::BACK].iter().enumerate() {
            if face.contains(*bit) && self.dynamic_state.stencil_write_masks[index] != mask {
                self.dynamic_state.stencil_write_masks[index] = mask;
                self.dynamic_state.stencil_write_mask_dirty = true;
            }
        }
    }

    pub fn set_stencil_reference(&mut self, face: FaceSelection, reference: u32) {
        assert!(!face.is_empty());
        for (index, bit) in [FaceSelection::FRONT, FaceSelection::BACK].iter().enumerate() {
            if face.contains(*bit) && self.dynamic_state.stencil_references[index] != reference {
                self.dynamic_state.stencil_references[index] = reference;
                self.dynamic_state.stencil_reference_dirty = true;
            }
        }
    }

    pub fn set_depth_write(&mut self, enabled: bool) {
        if self.static_state.depth.write_enabled != enabled {
            self.static_state.depth.write_enabled = enabled;
            self.hashes.depth_stencil = None;
        }
    }

    pub fn set_depth_compare_operation(&mut self, compare: CompareOperation) {
        if self.static_state.depth.compare != compare {
            self.static_state.depth.compare = compare;
            self.hashes.depth_stencil = None;
        }
    }

    /// Depth bias values are dynamic; whether biasing happens at all is baked
    /// into the pipeline.
    pub fn set_polygon_offset(&mut self, factor: f32, units: f32) {
        if self.dynamic_state.depth_bias_constant != factor
            || self.dynamic_state.depth_bias_slope != units
        {
            self.dynamic_state.depth_bias_constant = factor;
            self.dynamic_state.depth_bias_slope = units;
            self.dynamic_state.depth_bias_clamp = 0.0;
            self.dynamic_state.depth_bias_dirty = true;

            let enabled = factor != 0.0 || units != 0.0;
            if self.static_state.raster.depth_bias_enabled != enabled {
                self.static_state.raster.depth_bias_enabled = enabled;
                self.hashes.raster = None;
            }
        }
    }

    pub fn set_alpha_to_coverage(&mut self, enabled: bool) {
        if self.static_state.blend.alpha_to_coverage != enabled {
            self.static_state.blend.alpha_to_coverage = enabled;
            self.hashes.blend = None;
        }
    }

    pub fn set_blend_factors(
        &mut self,
        attachment: u32,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        assert!((attachment as usize) < MAX_COLOR_RENDER_TARGETS);
        let target = &mut self.static_state.blend.targets[attachment as usize];
        if target.src_rgb != src_rgb
            || target.dst_rgb != dst_rgb
            || target.src_alpha != src_alpha
            || target.dst_alpha != dst_alpha
        {
            target.src_rgb = src_rgb;
            target.dst_rgb = dst_rgb;
            target.src_alpha = src_alpha;
            target.dst_alpha = dst_alpha;
            self.hashes.blend = None;
        }
    }

    pub fn set_blend_operations(
        &mut self,
        attachment: u32,
        rgb_op: BlendOperation,
        alpha_op: BlendOperation,
    ) {
        assert!((attachment as usize) < MAX_COLOR_RENDER_TARGETS);
        let target = &mut self.static_state.blend.targets[attachment as usize];
        if target.rgb_op != rgb_op || target.alpha_op != alpha_op {
            target.rgb_op = rgb_op;
            target.alpha_op = alpha_op;
            self.hashes.blend = None;
        }
    }

    pub fn set_color_channel_write_mask(&mut self, attachment: u32, mask: ColorWriteMask) {
        assert!((attachment as usize) < MAX_COLOR_RENDER_TARGETS);
        let target = &mut self.static_state.blend.targets[attachment as usize];
        if target.channel_write_mask != mask {
            target.channel_write_mask = mask;
            self.hashes.blend = None;
        }
    }

    pub fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        if self.static_state.input_assembly.topology != topology {
            self.static_state.input_assembly.topology = topology;
            if self.dynamic_mask.contains(DynamicStateMask::TOPOLOGY) {
                // Dynamic on this backend: replayed before the next draw,
                // bypassing the pipeline cache.
                self.dynamic_state.topology_dirty = true;
            } else {
                self.hashes.input_assembly = None;
            }
        }
    }

    pub fn set_primitive_restart(&mut self, enabled: bool) {
        if self.static_state.input_assembly.primitive_restart != enabled {
            self.static_state.input_assembly.primitive_restart = enabled;
            self.hashes.input_assembly = None;
        }
    }

    pub fn set_viewport(&mut self, min_x: u32, min_y: u32, width: u32, height: u32) {
        let viewport = [min_x, min_y, width, height];
        if self.dynamic_state.viewport != viewport {
            self.dynamic_state.viewport = viewport;
            self.dynamic_state.viewport_dirty = true;
            // The scissor is clamped against the viewport; re-emit it too.
            self.dynamic_state.scissor_dirty = true;
        }
    }

    pub fn set_scissor(&mut self, min_x: u32, min_y: u32, width: u32, height: u32) {
        let scissor = [min_x, min_y, width, height];
        if self.dynamic_state.scissor != scissor {
            self.dynamic_state.scissor = scissor;
            self.dynamic_state.scissor_dirty = true;
        }
    }

    pub fn set_line_width(&mut self, width: f32) {
        if self.dynamic_state.line_width != width {
            self.dynamic_state.line_width = width;
            self.dynamic_state.line_width_dirty = true;
        }
    }

    /// Render-target format changes are rare; the misc hash is invalidated
    /// unconditionally instead of paying per-field comparisons on every pass.
    pub fn begin_render_pass(
        &mut self,
        color_formats: &[Format],
        depth_stencil_format: Format,
        render_target_size: Extents2D,
    ) {
        assert!(color_formats.len() <= MAX_COLOR_RENDER_TARGETS);
        let misc = &mut self.static_state.misc;
        misc.color_formats = [Format::None; MAX_COLOR_RENDER_TARGETS];
        misc.color_attachment_mask = 0;
        for (index, &format) in color_formats.iter().enumerate() {
            assert!(format != Format::None);
            misc.color_formats[index] = format;
            misc.color_attachment_mask |= 1 << index;
        }
        misc.depth_stencil_format = depth_stencil_format;

        self.hashes.misc = None;

        if self.render_target_size != render_target_size {
            self.render_target_size = render_target_size;
            // Viewport and scissor depend on the render-target size.
            self.dynamic_state.viewport_dirty = true;
            self.dynamic_state.scissor_dirty = true;
        }
    }

    pub fn bind_program(&mut self, program: BoundProgram) {
        if self.static_state.program.map(|p| p.uuid) == Some(program.uuid) {
            return;
        }

        if self.static_state.vertex.active_attributes != program.vertex_attribute_mask {
            self.static_state.vertex.active_attributes = program.vertex_attribute_mask;
            self.hashes.vertex = None;
        }

        if self.static_state.misc.color_attachment_mask != program.color_attachment_mask {
            self.static_state.misc.color_attachment_mask = program.color_attachment_mask;
            self.hashes.misc = None;
        }

        self.static_state.program = Some(program);
        self.hashes.program = None;
    }

    pub fn bound_program(&self) -> BoundProgram {
        self.static_state.program.expect("no shader program bound")
    }

    fn has_depth_attachment(&self) -> bool {
        self.static_state.misc.depth_stencil_format.is_depth()
    }

    fn has_stencil_attachment(&self) -> bool {
        self.static_state.misc.depth_stencil_format.is_stencil()
    }

    /// Recomputes the hashes of stale sub-states and folds them into the
    /// combined hash. Returns true iff the combined hash changed, i.e. the
    /// pipeline object has to be looked up and bound again.
    pub fn update_hashes(&mut self) -> bool {
        let state = &self.static_state;

        if self.hashes.vertex.is_none() {
            let hash = if state.vertex.active_attributes != 0 {
                let mut hasher = FnvHasher::default();
                for location in 0..MAX_VERTEX_ATTRIBUTES {
                    let bit = 1u32 << location;
                    if state.vertex.active_attributes & bit == 0 {
                        continue;
                    }
                    assert!(
                        state.vertex.attributes_set_mask & bit != 0,
                        "vertex attribute {} read by the program was never set",
                        location
                    );
                    let attribute = &state.vertex.attributes[location];
                    attribute.hash(&mut hasher);

                    let binding_bit = 1u32 << attribute.binding;
                    assert!(
                        state.vertex.bindings_set_mask & binding_bit != 0,
                        "vertex buffer binding {} was never described",
                        attribute.binding
                    );
                    state.vertex.bindings[attribute.binding as usize].hash(&mut hasher);
                }
                hasher.finish()
            } else {
                EMPTY_SUB_STATE_HASH
            };
            self.hashes.vertex = Some(hash);
        }

        if self.hashes.input_assembly.is_none() {
            let mut hasher = FnvHasher::default();
            if !self.dynamic_mask.contains(DynamicStateMask::TOPOLOGY) {
                state.input_assembly.topology.hash(&mut hasher);
            }
            state.input_assembly.primitive_restart.hash(&mut hasher);
            self.hashes.input_assembly = Some(hasher.finish());
        }

        if self.hashes.raster.is_none() {
            let mut hasher = FnvHasher::default();
            state.raster.fill_mode.hash(&mut hasher);
            state.raster.cull_mode.bits().hash(&mut hasher);
            state.raster.depth_bias_enabled.hash(&mut hasher);
            self.hashes.raster = Some(hasher.finish());
        }

        if self.hashes.depth_stencil.is_none() {
            // Only the sub-state the bound attachments actually read makes it
            // into the hash: a stale stencil config without a stencil
            // attachment must never force a pipeline miss.
            let mut hash = EMPTY_SUB_STATE_HASH;
            if self.has_stencil_attachment() {
                let mut hasher = FnvHasher::default();
                hash.hash(&mut hasher);
                state.stencil_faces.hash(&mut hasher);
                hash = hasher.finish();
            }
            if self.has_depth_attachment() {
                let mut hasher = FnvHasher::default();
                hash.hash(&mut hasher);
                state.depth.compare.hash(&mut hasher);
                state.depth.write_enabled.hash(&mut hasher);
                hash = hasher.finish();
            }
            self.hashes.depth_stencil = Some(hash);
        }

        if self.hashes.blend.is_none() {
            let hash = if state.misc.color_attachment_mask != 0 {
                let mut hasher = FnvHasher::default();
                state.blend.alpha_to_coverage.hash(&mut hasher);
                for target in 0..MAX_COLOR_RENDER_TARGETS {
                    if state.misc.color_attachment_mask & (1 << target) != 0 {
                        state.blend.targets[target].hash(&mut hasher);
                    }
                }
                hasher.finish()
            } else {
                EMPTY_SUB_STATE_HASH
            };
            self.hashes.blend = Some(hash);
        }

        if self.hashes.misc.is_none() {
            let mut hasher = FnvHasher::default();
            state.misc.color_attachment_mask.hash(&mut hasher);
            for target in 0..MAX_COLOR_RENDER_TARGETS {
                if state.misc.color_attachment_mask & (1 << target) != 0 {
                    state.misc.color_formats[target].hash(&mut hasher);
                }
            }
            state.misc.depth_stencil_format.hash(&mut hasher);
            self.hashes.misc = Some(hasher.finish());
        }

        if self.hashes.program.is_none() {
            self.hashes.program = Some(self.bound_program().uuid);
        }

        let global_hash = hash_one(&[
            self.hashes.vertex.unwrap(),
            self.hashes.input_assembly.unwrap(),
            self.hashes.raster.unwrap(),
            self.hashes.depth_stencil.unwrap(),
            self.hashes.blend.unwrap(),
            self.hashes.misc.unwrap(),
            self.hashes.program.unwrap(),
        ]);

        if global_hash != self.global_hash {
            self.global_hash = global_hash;
            true
        } else {
            false
        }
    }

    /// The combined hash of the last `update_hashes` call; the pipeline
    /// cache key.
    pub fn global_hash(&self) -> u64 {
        self.global_hash
    }

    pub(crate) fn stencil_test_enabled(&self) -> bool {
        (self.static_state.stencil_faces[0].test_enabled()
            || self.static_state.stencil_faces[1].test_enabled())
            && self.has_stencil_attachment()
    }

    pub(crate) fn depth_test_enabled_now(&self) -> bool {
        self.has_depth_attachment()
            && depth_test_enabled(
                self.static_state.depth.compare,
                self.static_state.depth.write_enabled,
            )
    }

    #[cfg(test)]
    fn stale_mask(&self) -> [bool; 7] {
        [
            self.hashes.vertex.is_none(),
            self.hashes.input_assembly.is_none(),
            self.hashes.raster.is_none(),
            self.hashes.depth_stencil.is_none(),
            self.hashes.blend.is_none(),
            self.hashes.misc.is_none(),
            self.hashes.program.is_none(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with_pass() -> GraphicsStateTracker {
        let mut tracker = GraphicsStateTracker::new(DynamicStateMask::default());
        tracker.begin_render_pass(
            &[Format::R8G8B8A8Unorm],
            Format::D24UnormS8Uint,
            Extents2D {
                width: 128,
                height: 128,
            },
        );
        tracker.bind_program(BoundProgram {
            uuid: 42,
            vertex_attribute_mask: 0b1,
            color_attachment_mask: 0b1,
        });
        tracker.set_vertex_attribute(0, 0, Format::R32G32B32Sfloat, 0);
        tracker.bind_vertex_buffer_state(0, 12, VertexStepRate::Vertex);
        tracker
    }

    #[test]
    fn redundant_set_is_a_no_op() {
        let mut tracker = tracker_with_pass();
        tracker.set_cull_mode(FaceSelection::BACK | FaceSelection::FRONT);
        assert!(tracker.update_hashes());
        let hash = tracker.global_hash();

        // Same value again: no staleness, no combined-hash change.
        tracker.set_cull_mode(FaceSelection::BACK | FaceSelection::FRONT);
        assert_eq!(tracker.stale_mask(), [false; 7]);
        assert!(!tracker.update_hashes());
        assert_eq!(tracker.global_hash(), hash);
    }

    #[test]
    fn sub_state_isolation() {
        let mut tracker = tracker_with_pass();
        assert!(tracker.update_hashes());

        // Touching blend state must not invalidate unrelated sub-states.
        tracker.set_blend_factors(
            0,
            BlendFactor::SrcAlpha,
            BlendFactor::OneMinusSrcAlpha,
            BlendFactor::One,
            BlendFactor::Zero,
        );
        let stale = tracker.stale_mask();
        assert_eq!(
            stale,
            [false, false, false, false, true, false, false],
            "only the blend sub-state may be stale"
        );
        assert!(tracker.update_hashes());
    }

    #[test]
    fn final_state_determines_hash_not_call_order() {
        let mut a = tracker_with_pass();
        a.set_depth_write(false);
        a.set_cull_mode(FaceSelection::FRONT);
        a.update_hashes();

        let mut b = tracker_with_pass();
        b.set_cull_mode(FaceSelection::BACK);
        b.set_cull_mode(FaceSelection::FRONT);
        b.update_hashes();
        b.set_depth_write(true);
        b.set_depth_write(false);
        b.update_hashes();

        assert_eq!(a.global_hash(), b.global_hash());
    }

    #[test]
    fn stale_irrelevant_stencil_does_not_miss() {
        let mut tracker = GraphicsStateTracker::new(DynamicStateMask::default());
        // Depth-only attachment: stencil state is irrelevant.
        tracker.begin_render_pass(
            &[Format::R8G8B8A8Unorm],
            Format::D32Sfloat,
            Extents2D {
                width: 64,
                height: 64,
            },
        );
        tracker.bind_program(BoundProgram {
            uuid: 7,
            vertex_attribute_mask: 0,
            color_attachment_mask: 0b1,
        });
        assert!(tracker.update_hashes());
        let hash = tracker.global_hash();

        tracker.set_stencil_operations(
            FaceSelection::FRONT_AND_BACK,
            StencilOperation::Replace,
            StencilOperation::Keep,
            StencilOperation::Keep,
        );
        assert!(!tracker.update_hashes());
        assert_eq!(tracker.global_hash(), hash);
    }

    #[test]
    fn begin_render_pass_always_dirties_misc() {
        let mut tracker = tracker_with_pass();
        tracker.update_hashes();

        tracker.begin_render_pass(
            &[Format::R8G8B8A8Unorm],
            Format::D24UnormS8Uint,
            Extents2D {
                width: 128,
                height: 128,
            },
        );
        assert!(tracker.stale_mask()[5]);
        // Identical formats: hash recomputes to the same value, no rebind.
        assert!(!tracker.update_hashes());
    }

    #[test]
    fn dynamic_state_bypasses_the_pipeline_hash() {
        let mut tracker = tracker_with_pass();
        tracker.update_hashes();
        let hash = tracker.global_hash();

        tracker.set_stencil_reference(FaceSelection::FRONT_AND_BACK, 0x80);
        tracker.set_viewport(0, 0, 64, 64);
        assert!(tracker.dynamic_state.stencil_reference_dirty);
        assert!(tracker.dynamic_state.viewport_dirty);
        assert!(tracker.dynamic_state.scissor_dirty);
        assert!(!tracker.update_hashes());
        assert_eq!(tracker.global_hash(), hash);
    }

    #[test]
    fn dynamic_topology_backend_skips_ia_invalidation() {
        let mask = DynamicStateMask::default() | DynamicStateMask::TOPOLOGY;
        let mut tracker = GraphicsStateTracker::new(mask);
        tracker.begin_render_pass(
            &[Format::R8G8B8A8Unorm],
            Format::None,
            Extents2D {
                width: 32,
                height: 32,
            },
        );
        tracker.bind_program(BoundProgram {
            uuid: 1,
            vertex_attribute_mask: 0,
            color_attachment_mask: 0b1,
        });
        tracker.update_hashes();
        tracker.dynamic_state.topology_dirty = false;
        let hash = tracker.global_hash();

        tracker.set_primitive_topology(PrimitiveTopology::LineList);
        assert!(tracker.dynamic_state.topology_dirty);
        assert!(!tracker.update_hashes());
        assert_eq!(tracker.global_hash(), hash);

        // On a backend where topology is baked, the same call misses.
        let mut baked = GraphicsStateTracker::new(DynamicStateMask::default());
        baked.begin_render_pass(
            &[Format::R8G8B8A8Unorm],
            Format::None,
            Extents2D {
                width: 32,
                height: 32,
            },
        );
        baked.bind_program(BoundProgram {
            uuid: 1,
            vertex_attribute_mask: 0,
            color_attachment_mask: 0b1,
        });
        baked.update_hashes();
        baked.set_primitive_topology(PrimitiveTopology::LineList);
        assert!(baked.update_hashes());
    }

    #[test]
    fn program_rebind_with_same_uuid_is_a_no_op() {
        let mut tracker = tracker_with_pass();
        tracker.update_hashes();
        tracker.bind_program(BoundProgram {
            uuid: 42,
            vertex_attribute_mask: 0b1,
            color_attachment_mask: 0b1,
        });
        assert_eq!(tracker.stale_mask(), [false; 7]);
    }

    #[test]
    #[should_panic]
    fn unset_active_attribute_asserts() {
        let mut tracker = GraphicsStateTracker::new(DynamicStateMask::default());
        tracker.begin_render_pass(
            &[Format::R8G8B8A8Unorm],
            Format::None,
            Extents2D {
                width: 8,
                height: 8,
            },
        );
        tracker.bind_program(BoundProgram {
            uuid: 9,
            vertex_attribute_mask: 0b10,
            color_attachment_mask: 0b1,
        });
        tracker.update_hashes();
    }
}
