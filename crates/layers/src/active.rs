use std::sync::Arc;

use formats::{Dataset, FeatureCollection};
use foundation::Aabb2;
use streaming::SimplificationCache;

use crate::layer::LayerSelector;
use crate::symbology::LayerStyle;

/// Display toggles that travel with the layer set.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    pub basemap: bool,
    pub attribute_panel: bool,
}

#[derive(Debug, Clone)]
pub struct ActiveLayer {
    pub selector: LayerSelector,
    /// `None` for the original geometry.
    pub algorithm: Option<String>,
    pub tolerance: Option<f64>,
    pub style: LayerStyle,
    pub collection: Arc<FeatureCollection>,
}

/// What the renderer should draw right now.
///
/// Built by projecting the cache at one tolerance index; never issues a
/// request and never copies geometry (layers share the cached `Arc`s).
#[derive(Debug, Clone)]
pub struct ActiveLayerSet {
    tolerance_index: usize,
    layers: Vec<ActiveLayer>,
    bounds: Option<Aabb2>,
    view: ViewOptions,
}

impl ActiveLayerSet {
    pub fn project(
        dataset: &Dataset,
        cache: &SimplificationCache,
        tolerance_index: usize,
        view: ViewOptions,
    ) -> Self {
        let mut layers = Vec::with_capacity(1 + cache.slots().len());
        layers.push(ActiveLayer {
            selector: LayerSelector::Original,
            algorithm: None,
            tolerance: None,
            style: LayerStyle::for_layer(LayerSelector::Original),
            collection: Arc::clone(dataset.collection()),
        });

        let tolerance = cache.series().and_then(|s| s.get(tolerance_index));
        for slot in cache.slots() {
            let Some(collection) = slot.results.get(tolerance_index) else {
                continue;
            };
            let selector = LayerSelector::Slot(slot.slot);
            layers.push(ActiveLayer {
                selector,
                algorithm: Some(slot.algorithm.clone()),
                tolerance,
                style: LayerStyle::for_layer(selector),
                collection: Arc::clone(collection),
            });
        }

        Self {
            tolerance_index,
            layers,
            bounds: dataset.bounds(),
            view,
        }
    }

    pub fn tolerance_index(&self) -> usize {
        self.tolerance_index
    }

    pub fn layers(&self) -> &[ActiveLayer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, selector: LayerSelector) -> Option<&ActiveLayer> {
        self.layers.iter().find(|l| l.selector == selector)
    }

    pub fn selectors(&self) -> impl Iterator<Item = LayerSelector> + '_ {
        self.layers.iter().map(|l| l.selector)
    }

    /// Extent to fit the map view to.
    pub fn bounds(&self) -> Option<Aabb2> {
        self.bounds
    }

    pub fn view(&self) -> ViewOptions {
        self.view
    }
}
