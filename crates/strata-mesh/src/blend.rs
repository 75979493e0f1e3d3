//! Per-chunk texture layer palettes and vertex blend weights.

use strata_heightfield::BlendSample;

/// Hard limit on distinct layers a single chunk can blend.
pub const MAX_LAYERS_PER_CHUNK: usize = 4;

/// The layers one chunk blends between, ordered by total weight.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerPalette {
    layers: Vec<u32>,
    failed_over: bool,
}

impl LayerPalette {
    /// Collect the layers referenced by `samples`. When more than
    /// `max_layers` (itself capped at [`MAX_LAYERS_PER_CHUNK`]) are present,
    /// the palette falls back to the single dominant layer.
    pub fn build(samples: &[BlendSample], max_layers: usize) -> Self {
        let max_layers = max_layers.clamp(1, MAX_LAYERS_PER_CHUNK);

        let mut totals: Vec<(u32, f32)> = Vec::new();
        for &(layer, weight) in samples.iter().flatten() {
            if weight <= 0.0 {
                continue;
            }
            match totals.iter_mut().find(|(l, _)| *l == layer) {
                Some(entry) => entry.1 += weight,
                None => totals.push((layer, weight)),
            }
        }
        totals.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        if totals.len() <= max_layers {
            Self {
                layers: totals.into_iter().map(|(l, _)| l).collect(),
                failed_over: false,
            }
        } else {
            Self {
                layers: vec![totals[0].0],
                failed_over: true,
            }
        }
    }

    /// Global layer index per palette slot.
    pub fn layers(&self) -> &[u32] {
        &self.layers
    }

    /// Whether the chunk needed more layers than allowed.
    pub fn failed_over(&self) -> bool {
        self.failed_over
    }

    /// Quantized per-slot weights for one vertex.
    pub fn weights(&self, sample: &BlendSample) -> [u8; 4] {
        if self.failed_over {
            return [255, 0, 0, 0];
        }
        let mut slots = [0.0; 4];
        for &(layer, weight) in sample {
            if let Some(slot) = self.layers.iter().position(|&l| l == layer) {
                slots[slot] += weight;
            }
        }
        quantize_weights(slots)
    }
}

/// Scale weights to bytes that sum to exactly 255. Rounding error lands on
/// the heaviest slot; all-zero input puts everything in slot 0.
pub fn quantize_weights(weights: [f32; 4]) -> [u8; 4] {
    let total: f32 = weights.iter().sum();
    if total <= 0.0 {
        return [255, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    let mut sum = 0i32;
    let mut heaviest = 0;
    for (i, &w) in weights.iter().enumerate() {
        out[i] = (w / total * 255.0).round().clamp(0.0, 255.0) as u8;
        sum += out[i] as i32;
        if w > weights[heaviest] {
            heaviest = i;
        }
    }
    out[heaviest] = (out[heaviest] as i32 + 255 - sum).clamp(0, 255) as u8;
    out
}
