//! Inline CSS for the reveal layers.
//!
//! Every layer is absolutely positioned inside a clipping wrapper. The
//! wrapper takes the caller's [`ImageStyle`]; explicit dimensions are
//! applied as pixels and missing ones fill the parent.

use std::fmt::Write;

use glimmer_reveal::{Extent, ImageStyle, PulseConfig, ResizeMode};

/// Name of the skeleton's looping keyframes emitted by [`pulse_keyframes`].
pub const PULSE_ANIMATION: &str = "glimmer-pulse";

/// Name of the skeleton's first leg, from the rest opacity to `low`.
pub const PULSE_IN_ANIMATION: &str = "glimmer-pulse-in";

/// CSS `object-fit` for a resize mode.
///
/// [`ResizeMode::Repeat`] has no `object-fit` equivalent; callers render
/// it with [`tiled_background`] instead.
#[must_use]
pub const fn object_fit(mode: ResizeMode) -> &'static str {
    match mode {
        ResizeMode::Cover => "cover",
        ResizeMode::Contain => "contain",
        ResizeMode::Stretch => "fill",
        ResizeMode::Center => "scale-down",
        ResizeMode::Repeat => "none",
    }
}

fn extent(value: Extent) -> String {
    match value {
        Extent::Explicit(px) => format!("{px}px"),
        Extent::Fill => "100%".to_owned(),
    }
}

/// Style of the clipping wrapper.
#[must_use]
pub fn wrapper(style: &ImageStyle) -> String {
    let image_box = style.image_box();
    format!(
        "position: relative; overflow: hidden; width: {}; height: {}; border-radius: {}px;",
        extent(image_box.width),
        extent(image_box.height),
        image_box.border_radius,
    )
}

/// A layer covering the whole wrapper.
#[must_use]
pub fn fill_layer(extra: &str) -> String {
    format!("position: absolute; inset: 0; width: 100%; height: 100%; {extra}")
}

/// Style of an `<img>` layer at `opacity`.
#[must_use]
pub fn image_layer(mode: ResizeMode, opacity: f32) -> String {
    fill_layer(&format!(
        "object-fit: {}; opacity: {opacity};",
        object_fit(mode)
    ))
}

/// Append a linear opacity transition of `fade_ms` to `css`. Zero jumps.
#[must_use]
pub fn with_fade(mut css: String, fade_ms: u128) -> String {
    let _ = write!(css, " transition: opacity {fade_ms}ms linear;");
    css
}

/// The final image layer: like [`image_layer`] plus an opacity
/// transition of `fade_ms`.
///
/// For [`ResizeMode::Repeat`] the `<img>` only reports the load and stays
/// hidden; the pixels come from a [`tiled_background`] layer.
#[must_use]
pub fn final_layer(mode: ResizeMode, opacity: f32, fade_ms: u128) -> String {
    if mode == ResizeMode::Repeat {
        return "display: none;".to_owned();
    }
    with_fade(image_layer(mode, opacity), fade_ms)
}

/// A tiled background layer for [`ResizeMode::Repeat`].
#[must_use]
pub fn tiled_background(href: &str, opacity: f32) -> String {
    fill_layer(&format!(
        "background-image: url(\"{}\"); background-repeat: repeat; opacity: {opacity};",
        href.replace('"', "%22")
    ))
}

/// The skeleton layer, pulsing while `animating`.
#[must_use]
pub fn skeleton(color: &str, pulse: &PulseConfig, animating: bool) -> String {
    let animation = if animating {
        // The loop waits out the first leg; alternate gives one leg per iteration.
        let leg = pulse.leg_duration.as_millis();
        format!(
            "animation: {PULSE_IN_ANIMATION} {leg}ms linear forwards, \
             {PULSE_ANIMATION} {leg}ms linear {leg}ms infinite alternate;"
        )
    } else {
        String::new()
    };
    fill_layer(&format!(
        "background-color: {color}; opacity: {}; {animation}",
        pulse.rest
    ))
}

/// Keyframes for the skeleton pulse: rest to `low` once, then `low` to
/// `high` and back.
#[must_use]
pub fn pulse_keyframes(pulse: &PulseConfig) -> String {
    format!(
        "@keyframes {PULSE_IN_ANIMATION} {{ from {{ opacity: {}; }} to {{ opacity: {}; }} }} \
         @keyframes {PULSE_ANIMATION} {{ from {{ opacity: {}; }} to {{ opacity: {}; }} }}",
        pulse.rest, pulse.low, pulse.low, pulse.high
    )
}

/// Name of the spinner rotation keyframes.
pub const SPIN_ANIMATION: &str = "glimmer-spin";

/// Centers the activity indicator and tints it with `color`.
#[must_use]
pub fn spinner_layer(color: &str) -> String {
    fill_layer(&format!(
        "display: flex; align-items: center; justify-content: center; color: {color};"
    ))
}

/// Rotation applied to the spinner icon.
#[must_use]
pub fn spinner_icon() -> String {
    format!("display: flex; animation: {SPIN_ANIMATION} 1s linear infinite;")
}

/// Keyframes for the skeleton pulse and the spinner rotation.
#[must_use]
pub fn keyframes(pulse: &PulseConfig) -> String {
    format!(
        "{} @keyframes {SPIN_ANIMATION} {{ to {{ transform: rotate(360deg); }} }}",
        pulse_keyframes(pulse)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stretch_maps_to_fill() {
        assert_eq!(object_fit(ResizeMode::Stretch), "fill");
        assert_eq!(object_fit(ResizeMode::default()), "cover");
    }

    #[test]
    fn wrapper_fills_without_dimensions() {
        let css = wrapper(&ImageStyle::default());
        assert!(css.contains("width: 100%"));
        assert!(css.contains("height: 100%"));
        assert!(css.contains("border-radius: 0px"));
        assert!(css.contains("overflow: hidden"));
    }

    #[test]
    fn wrapper_uses_explicit_dimensions() {
        let css = wrapper(&ImageStyle {
            width: Some(120.0),
            height: Some(80.0),
            border_radius: Some(8.0),
        });
        assert!(css.contains("width: 120px"));
        assert!(css.contains("height: 80px"));
        assert!(css.contains("border-radius: 8px"));
    }

    #[test]
    fn final_layer_has_fade_transition() {
        let css = final_layer(ResizeMode::Contain, 0.0, 260);
        assert!(css.contains("object-fit: contain"));
        assert!(css.contains("opacity: 0;"));
        assert!(css.contains("transition: opacity 260ms"));
    }

    #[test]
    fn skeleton_animation_uses_leg_duration() {
        let pulse = PulseConfig::default();
        let css = skeleton("#ccc", &pulse, true);
        assert!(css.contains("glimmer-pulse-in 500ms linear forwards"));
        assert!(css.contains("glimmer-pulse 500ms linear 500ms infinite alternate"));
        assert!(!skeleton("#ccc", &pulse, false).contains("animation"));
    }

    #[test]
    fn pulse_keyframes_start_at_rest_then_loop_from_low() {
        let css = pulse_keyframes(&PulseConfig::default());
        assert!(css.contains(
            "@keyframes glimmer-pulse-in { from { opacity: 0.6; } to { opacity: 0.4; } }"
        ));
        assert!(css.contains(
            "@keyframes glimmer-pulse { from { opacity: 0.4; } to { opacity: 0.7; } }"
        ));
    }

    #[test]
    fn repeat_hides_final_img() {
        assert_eq!(final_layer(ResizeMode::Repeat, 1.0, 260), "display: none;");
    }

    #[test]
    fn tiled_background_escapes_quotes() {
        let css = tiled_background("/a\"b.png", 1.0);
        assert!(css.contains("url(\"/a%22b.png\")"));
    }
}
