use crate::layer::LayerSelector;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerStyle {
    pub visible: bool,
    pub color: [f32; 4],
    /// Stroke width in screen pixels.
    pub width: f32,
}

impl LayerStyle {
    pub const fn new(visible: bool, color: [f32; 4], width: f32) -> Self {
        Self {
            visible,
            color,
            width,
        }
    }

    /// Slot order determines color: slot 1 red, slot 2 blue, original grey underneath.
    pub const fn for_layer(selector: LayerSelector) -> Self {
        match selector {
            LayerSelector::Original => ORIGINAL,
            LayerSelector::Slot(slot) => {
                if slot.index() == 0 {
                    SLOT1
                } else {
                    SLOT2
                }
            }
        }
    }
}

const ORIGINAL: LayerStyle = LayerStyle::new(true, [0.45, 0.45, 0.45, 1.0], 1.0);
const SLOT1: LayerStyle = LayerStyle::new(true, [0.86, 0.16, 0.16, 1.0], 2.0);
const SLOT2: LayerStyle = LayerStyle::new(true, [0.16, 0.35, 0.86, 1.0], 2.0);

impl Default for LayerStyle {
    fn default() -> Self {
        ORIGINAL
    }
}
