//! Material presets for common musculoskeletal tissues and implant alloys.
//!
//! Values are representative literature figures for planning-grade
//! analyses, not patient-specific calibrations.

use std::collections::HashMap;

use crate::model::Material;

/// A named collection of material presets.
#[derive(Debug, Clone)]
pub struct MaterialDatabase {
    materials: HashMap<String, Material>,
}

impl MaterialDatabase {
    /// Database with the built-in presets.
    pub fn with_defaults() -> Self {
        let mut db = Self::empty();
        db.register("cortical_bone", Material::linear_elastic(17.0e9, 0.3, 1900.0));
        db.register("cancellous_bone", Material::linear_elastic(0.4e9, 0.2, 600.0));
        db.register("ti6al4v", Material::linear_elastic(113.8e9, 0.342, 4430.0));
        db.register("cobalt_chrome", Material::linear_elastic(210.0e9, 0.3, 8300.0));
        db.register("peek", Material::linear_elastic(3.6e9, 0.38, 1320.0));
        db.register("cartilage", Material::neo_hookean(10.0e6, 0.45, 1100.0));
        db.register("ligament", Material::mooney_rivlin(10.0e6, 0.45, 1100.0, 0.8));
        db
    }

    pub fn empty() -> Self {
        Self {
            materials: HashMap::new(),
        }
    }

    /// Registers a material. Overwrites if the name already exists.
    pub fn register(&mut self, name: impl Into<String>, material: Material) {
        self.materials.insert(name.into(), material);
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.materials.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialDatabase {
    fn default() -> Self {
        Self::with_defaults()
    }
}
