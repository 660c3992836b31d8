//! Named, styled collections of drawing primitives.

use tracing::debug;

use crate::color::Style;
use crate::error::{ExportError, Result};

/// A layer and the primitives converted onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer<P> {
    pub name: String,
    pub style: Style,
    primitives: Vec<P>,
}

impl<P> Layer<P> {
    /// Empty layer.
    pub fn new(name: impl Into<String>, style: Style) -> Self {
        Self {
            name: name.into(),
            style,
            primitives: Vec::new(),
        }
    }

    pub fn primitives(&self) -> &[P] {
        &self.primitives
    }

    pub fn extend(&mut self, primitives: impl IntoIterator<Item = P>) {
        self.primitives.extend(primitives);
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }
}

/// Layers of one document, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSet<P> {
    layers: Vec<Layer<P>>,
}

impl<P> Default for LayerSet<P> {
    fn default() -> Self {
        Self { layers: Vec::new() }
    }
}

impl<P> LayerSet<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set holding one empty layer.
    pub fn with_layer(name: &str, style: Style) -> Self {
        Self {
            layers: vec![Layer::new(name, style)],
        }
    }

    /// Declare a layer. Names are unique within the set.
    pub fn add(&mut self, name: &str, style: Style) -> Result<&mut Layer<P>> {
        if self.contains(name) {
            return Err(ExportError::DuplicateLayer(name.to_string()));
        }
        debug!(
            layer = name,
            color = style.color.index(),
            line_weight = style.line_weight,
            line_type = %style.line_type,
            "declared layer"
        );
        self.layers.push(Layer::new(name, style));
        let last = self.layers.len() - 1;
        Ok(&mut self.layers[last])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.name == name)
    }

    pub fn get(&self, name: &str) -> Result<&Layer<P>> {
        self.layers
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(|| ExportError::UndefinedLayer(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Layer<P>> {
        self.layers
            .iter_mut()
            .find(|l| l.name == name)
            .ok_or_else(|| ExportError::UndefinedLayer(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer<P>> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Widest line weight over all layers, zero when there are none.
    pub fn max_line_weight(&self) -> f64 {
        self.layers
            .iter()
            .map(|l| l.style.line_weight)
            .fold(0.0, f64::max)
    }
}
