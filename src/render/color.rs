use eframe::egui::Color32;

/// Color a node fill starts from at zero weight.
const FILL_BASE: Color32 = Color32::from_rgb(238, 238, 232);
const LINK_COLOR: Color32 = Color32::from_rgb(120, 124, 132);
const FOCUSED_LINK_COLOR: Color32 = Color32::from_rgb(241, 146, 94);

pub(crate) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(crate) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

/// Share of `max` covered by `value`, square-rooted so small values stay distinguishable.
pub(crate) fn weight_share(value: f32, max: f32) -> f32 {
    if max <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0).sqrt()
}

/// Cluster hue at intensity `0.5 + 0.5 * sqrt(weight / max_weight)`.
pub(crate) fn node_fill(cluster: Color32, weight: f32, max_weight: f32) -> Color32 {
    blend_color(FILL_BASE, cluster, 0.5 + 0.5 * weight_share(weight, max_weight))
}

pub(crate) fn link_color(focused: bool, dimmed: bool) -> Color32 {
    match (focused, dimmed) {
        (true, _) => FOCUSED_LINK_COLOR,
        (false, true) => dim_color(LINK_COLOR, 0.4),
        (false, false) => LINK_COLOR,
    }
}
