//! Shader-binding-table layout.
//!
//! The GPU reads the table directly during ray dispatch, so the record
//! ordering is a fixed contract: ray-gen records first, then miss records,
//! then hit-group records. A hit record is selected by
//! `hit_region + record_size * (ray_type + ray_type_count * geometry_index
//! + instance_hit_group_index)`.

/// Byte layout of one shader-binding table.
#[derive(Copy, Clone, Debug)]
pub struct SbtLayout {
    record_size: u32,
    ray_gen_count: u32,
    miss_count: u32,
    hit_group_count: u32,
    ray_type_count: u32,
}

/// A byte region of the table, handed to the native trace-rays command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SbtRegion {
    pub offset: u64,
    pub stride: u64,
    pub size: u64,
}

impl SbtLayout {
    /// `record_size` comes from `DeviceInfo::sbt_record_size` and must hold
    /// one shader-group handle.
    pub fn new(
        record_size: u32,
        ray_gen_count: u32,
        miss_count: u32,
        hit_group_count: u32,
        ray_type_count: u32,
    ) -> Self {
        assert!(record_size > 0);
        assert!(ray_gen_count > 0 && miss_count > 0);
        assert!(ray_type_count > 0);
        assert!(
            hit_group_count % ray_type_count == 0,
            "hit groups must cover every ray type"
        );

        Self {
            record_size,
            ray_gen_count,
            miss_count,
            hit_group_count,
            ray_type_count,
        }
    }

    pub fn record_size(&self) -> u32 {
        self.record_size
    }

    pub fn ray_type_count(&self) -> u32 {
        self.ray_type_count
    }

    pub fn total_record_count(&self) -> u32 {
        self.ray_gen_count + self.miss_count + self.hit_group_count
    }

    pub fn total_size(&self) -> u64 {
        u64::from(self.total_record_count()) * u64::from(self.record_size)
    }

    pub fn ray_gen_record_offset(&self, index: u32) -> u64 {
        assert!(index < self.ray_gen_count);
        u64::from(index) * u64::from(self.record_size)
    }

    pub fn miss_record_offset(&self, index: u32) -> u64 {
        assert!(index < self.miss_count);
        u64::from(self.ray_gen_count + index) * u64::from(self.record_size)
    }

    fn hit_region_first_record(&self) -> u32 {
        self.ray_gen_count + self.miss_count
    }

    /// Record index inside the hit region for a given ray type, geometry and
    /// per-instance hit-group offset.
    pub fn hit_record_index(
        &self,
        ray_type: u32,
        geometry_index: u32,
        instance_hit_group_index: u32,
    ) -> u32 {
        assert!(ray_type < self.ray_type_count);
        let index =
            ray_type + self.ray_type_count * geometry_index + instance_hit_group_index;
        assert!(index < self.hit_group_count);
        index
    }

    pub fn hit_record_offset(
        &self,
        ray_type: u32,
        geometry_index: u32,
        instance_hit_group_index: u32,
    ) -> u64 {
        let record = self.hit_region_first_record()
            + self.hit_record_index(ray_type, geometry_index, instance_hit_group_index);
        u64::from(record) * u64::from(self.record_size)
    }

    /// The three regions a trace-rays command consumes. `ray_gen_index`
    /// selects which ray-gen record the dispatch starts from.
    pub fn regions(&self, ray_gen_index: u32) -> (SbtRegion, SbtRegion, SbtRegion) {
        let stride = u64::from(self.record_size);
        let ray_gen = SbtRegion {
            offset: self.ray_gen_record_offset(ray_gen_index),
            stride,
            // The ray-gen region of a dispatch is a single record.
            size: stride,
        };
        let miss = SbtRegion {
            offset: self.miss_record_offset(0),
            stride,
            size: stride * u64::from(self.miss_count),
        };
        let hit = SbtRegion {
            offset: u64::from(self.hit_region_first_record()) * stride,
            stride,
            size: stride * u64::from(self.hit_group_count),
        };
        (ray_gen, miss, hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_zero_is_ray_gen_then_miss_then_hit() {
        let layout = SbtLayout::new(64, 1, 2, 6, 2);
        assert_eq!(layout.ray_gen_record_offset(0), 0);
        assert_eq!(layout.miss_record_offset(0), 64);
        assert_eq!(layout.miss_record_offset(1), 128);
        assert_eq!(layout.hit_record_offset(0, 0, 0), 192);
        assert_eq!(layout.total_size(), 64 * 9);
    }

    #[test]
    fn hit_records_are_monotonic_and_disjoint() {
        let ray_types = 3;
        let geometries = 4;
        let layout = SbtLayout::new(32, 1, 1, ray_types * geometries, ray_types);

        let mut offsets = Vec::new();
        for geometry in 0..geometries {
            for ray_type in 0..ray_types {
                offsets.push(layout.hit_record_offset(ray_type, geometry, 0));
            }
        }

        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        sorted.dedup();
        // Every (ray type, geometry) combination addresses a distinct record.
        assert_eq!(sorted.len(), offsets.len());

        // Ranges are exactly adjacent, never overlapping.
        for pair in sorted.windows(2) {
            assert_eq!(pair[1] - pair[0], u64::from(layout.record_size()));
        }
        // And stay inside the table.
        assert!(sorted.last().unwrap() + u64::from(layout.record_size()) <= layout.total_size());
    }

    #[test]
    fn regions_cover_the_table() {
        let layout = SbtLayout::new(32, 2, 3, 4, 1);
        let (ray_gen, miss, hit) = layout.regions(1);
        assert_eq!(ray_gen.offset, 32);
        assert_eq!(ray_gen.size, 32);
        assert_eq!(miss.offset, 64);
        assert_eq!(miss.size, 96);
        assert_eq!(hit.offset, 160);
        assert_eq!(hit.size, 128);
        assert_eq!(hit.offset + hit.size, layout.total_size());
    }

    #[test]
    #[should_panic]
    fn out_of_bounds_hit_record_asserts() {
        let layout = SbtLayout::new(32, 1, 1, 2, 2);
        let _ = layout.hit_record_offset(0, 1, 0);
    }
}
