//! Ground-texture layer descriptors.

/// One ground-texture layer referenced by the blendmap.
///
/// Texture names are opaque identifiers resolved by the external material
/// system; this crate never loads them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerInfo {
    /// Diffuse (albedo) texture identifier.
    pub diffuse_map: String,
    /// Optional tangent-space normal map.
    pub normal_map: Option<String>,
    /// The normal map's alpha channel holds a parallax height.
    pub parallax: bool,
    /// The diffuse map's alpha channel holds a specular mask.
    pub specular: bool,
}

impl LayerInfo {
    /// A layer with only a diffuse map.
    pub fn diffuse(name: impl Into<String>) -> Self {
        Self {
            diffuse_map: name.into(),
            ..Default::default()
        }
    }

    /// Attach a normal map.
    #[must_use]
    pub fn with_normal_map(mut self, name: impl Into<String>) -> Self {
        self.normal_map = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diffuse_only_layer() {
        let layer = LayerInfo::diffuse("sand.dds");
        assert_eq!(layer.diffuse_map, "sand.dds");
        assert!(layer.normal_map.is_none());
        assert!(!layer.parallax && !layer.specular);
    }

    #[test]
    fn test_with_normal_map() {
        let layer = LayerInfo::diffuse("rock.dds").with_normal_map("rock_n.dds");
        assert_eq!(layer.normal_map.as_deref(), Some("rock_n.dds"));
    }
}
