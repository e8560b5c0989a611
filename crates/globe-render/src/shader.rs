//! Composable WGSL programs.
//!
//! A base program exposes named insertion points as marker comments
//! (`//#insert common`, ...). Extensions are registered per point as ordered
//! fragment lists and spliced in by [`ShaderGraph::compose`]. Points are
//! always applied in [`InsertionPoint`] order, so the output does not depend
//! on the order in which callers registered fragments for different points.

use std::borrow::Cow;
use std::collections::BTreeMap;

use log::debug;
use thiserror::Error;

/// Errors produced while composing a shader graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShaderError {
    #[error("shader '{shader}' has no `{marker}` insertion point")]
    MissingInsertionPoint { shader: String, marker: &'static str },

    #[error("shader '{shader}' declares `{marker}` more than once")]
    AmbiguousInsertionPoint { shader: String, marker: &'static str },

    #[error("fragment '{label}' is already registered at `{marker}`")]
    DuplicatePatch { label: String, marker: &'static str },
}

/// Named location inside a base lighting program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InsertionPoint {
    /// Module scope, after the base bindings. Declarations go here.
    Common,
    /// Inside the fragment entry point once `roughness` is initialized.
    Roughness,
    /// Inside the fragment entry point before `diffuse` is lit and `emissive` is added.
    Emissive,
}

impl InsertionPoint {
    pub const ALL: [InsertionPoint; 3] = [Self::Common, Self::Roughness, Self::Emissive];

    /// Marker comment that must appear exactly once in the base program.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Common => "//#insert common",
            Self::Roughness => "//#insert roughness",
            Self::Emissive => "//#insert emissive",
        }
    }
}

/// A labelled block of WGSL spliced at an insertion point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderFragment {
    pub label: Cow<'static, str>,
    pub code: Cow<'static, str>,
}

impl ShaderFragment {
    pub fn new(label: impl Into<Cow<'static, str>>, code: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            code: code.into(),
        }
    }
}

/// Base program plus the extensions registered against it.
#[derive(Debug, Clone)]
pub struct ShaderGraph {
    name: Cow<'static, str>,
    base: Cow<'static, str>,
    fragments: BTreeMap<InsertionPoint, Vec<ShaderFragment>>,
}

impl ShaderGraph {
    pub fn new(name: impl Into<Cow<'static, str>>, base: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            base: base.into(),
            fragments: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a fragment to the list at `point`. Labels are unique per point.
    pub fn extend(
        &mut self,
        point: InsertionPoint,
        fragment: ShaderFragment,
    ) -> Result<&mut Self, ShaderError> {
        let list = self.fragments.entry(point).or_default();
        if list.iter().any(|f| f.label == fragment.label) {
            return Err(ShaderError::DuplicatePatch {
                label: fragment.label.into_owned(),
                marker: point.marker(),
            });
        }
        list.push(fragment);
        Ok(self)
    }

    pub fn fragments(&self, point: InsertionPoint) -> &[ShaderFragment] {
        self.fragments.get(&point).map_or(&[], Vec::as_slice)
    }

    /// Splice every registered fragment into the base program.
    ///
    /// Points without fragments keep their marker comment and need not exist
    /// in the base. Points with fragments must appear exactly once.
    pub fn compose(&self) -> Result<String, ShaderError> {
        let mut source = self.base.to_string();

        for (&point, list) in &self.fragments {
            if list.is_empty() {
                continue;
            }
            let marker = point.marker();
            match source.matches(marker).count() {
                0 => {
                    return Err(ShaderError::MissingInsertionPoint {
                        shader: self.name.to_string(),
                        marker,
                    });
                }
                1 => {}
                _ => {
                    return Err(ShaderError::AmbiguousInsertionPoint {
                        shader: self.name.to_string(),
                        marker,
                    });
                }
            }

            let mut block = String::new();
            for fragment in list {
                block.push_str("// ");
                block.push_str(&fragment.label);
                block.push('\n');
                block.push_str(fragment.code.trim_end());
                block.push('\n');
            }
            source = source.replacen(marker, &block, 1);
            debug!(
                "Shader '{}': spliced {} fragment(s) at {:?}",
                self.name,
                list.len(),
                point
            );
        }

        Ok(source)
    }
}

/// Create a WGSL module from composed source.
pub fn create_shader_module(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> wgpu::ShaderModule {
    debug!("Creating shader module '{}'", label);
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "\
struct A { x: f32 }
//#insert common
fn main() {
    var roughness = 1.0;
    //#insert roughness
    var emissive = vec3<f32>(0.0);
    //#insert emissive
}
";

    #[test]
    fn test_compose_without_fragments_is_identity() {
        let graph = ShaderGraph::new("base", BASE);
        assert_eq!(graph.compose().unwrap(), BASE);
    }

    #[test]
    fn test_fragments_replace_markers() {
        let mut graph = ShaderGraph::new("base", BASE);
        graph
            .extend(
                InsertionPoint::Common,
                ShaderFragment::new("offset", "var<private> offset: f32;"),
            )
            .unwrap();
        let out = graph.compose().unwrap();
        assert!(out.contains("// offset\nvar<private> offset: f32;"));
        assert!(!out.contains("//#insert common"));
        assert!(out.contains("//#insert emissive"));
    }

    #[test]
    fn test_order_within_point_is_preserved() {
        let mut graph = ShaderGraph::new("base", BASE);
        graph
            .extend(InsertionPoint::Emissive, ShaderFragment::new("first", "let a = 1;"))
            .unwrap()
            .extend(InsertionPoint::Emissive, ShaderFragment::new("second", "let b = 2;"))
            .unwrap();
        let out = graph.compose().unwrap();
        let a = out.find("let a").unwrap();
        let b = out.find("let b").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_output_independent_of_registration_order() {
        let common = ShaderFragment::new("decl", "var<private> k: f32;");
        let emissive = ShaderFragment::new("glow", "emissive += vec3<f32>(k);");

        let mut forward = ShaderGraph::new("base", BASE);
        forward
            .extend(InsertionPoint::Common, common.clone())
            .unwrap()
            .extend(InsertionPoint::Emissive, emissive.clone())
            .unwrap();

        let mut reverse = ShaderGraph::new("base", BASE);
        reverse
            .extend(InsertionPoint::Emissive, emissive)
            .unwrap()
            .extend(InsertionPoint::Common, common)
            .unwrap();

        assert_eq!(forward.compose().unwrap(), reverse.compose().unwrap());
    }

    #[test]
    fn test_missing_marker_is_error() {
        let mut graph = ShaderGraph::new("plain", "fn main() {}");
        graph
            .extend(InsertionPoint::Roughness, ShaderFragment::new("r", "roughness *= 0.5;"))
            .unwrap();
        assert_eq!(
            graph.compose(),
            Err(ShaderError::MissingInsertionPoint {
                shader: "plain".to_string(),
                marker: "//#insert roughness",
            })
        );
    }

    #[test]
    fn test_repeated_marker_is_error() {
        let base = "//#insert common\n//#insert common\n";
        let mut graph = ShaderGraph::new("twice", base);
        graph
            .extend(InsertionPoint::Common, ShaderFragment::new("c", "const C = 1;"))
            .unwrap();
        assert!(matches!(
            graph.compose(),
            Err(ShaderError::AmbiguousInsertionPoint { .. })
        ));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let mut graph = ShaderGraph::new("base", BASE);
        graph
            .extend(InsertionPoint::Common, ShaderFragment::new("same", "const A = 1;"))
            .unwrap();
        let err = graph
            .extend(InsertionPoint::Common, ShaderFragment::new("same", "const B = 2;"))
            .unwrap_err();
        assert!(matches!(err, ShaderError::DuplicatePatch { .. }));
        assert_eq!(graph.fragments(InsertionPoint::Common).len(), 1);
        // Same label at a different point is fine.
        assert!(
            graph
                .extend(InsertionPoint::Emissive, ShaderFragment::new("same", "let z = 0;"))
                .is_ok()
        );
    }

    #[test]
    fn test_markers_are_distinct() {
        let markers: Vec<_> = InsertionPoint::ALL.iter().map(|p| p.marker()).collect();
        for (i, a) in markers.iter().enumerate() {
            for b in &markers[i + 1..] {
                assert!(!a.contains(b) && !b.contains(a));
            }
        }
    }
}
