//! Named palettes and dominant-colour extraction.

use std::collections::HashMap;

use image::RgbaImage;

use super::Colour;

/// The standard PICO-8 16-colour palette.
pub const PICO8: [Colour; 16] = [
    Colour::rgb(0, 0, 0),
    Colour::rgb(29, 43, 83),
    Colour::rgb(126, 37, 83),
    Colour::rgb(0, 135, 81),
    Colour::rgb(171, 82, 54),
    Colour::rgb(95, 87, 79),
    Colour::rgb(194, 195, 199),
    Colour::rgb(255, 241, 232),
    Colour::rgb(255, 0, 77),
    Colour::rgb(255, 163, 0),
    Colour::rgb(255, 236, 39),
    Colour::rgb(0, 228, 54),
    Colour::rgb(41, 173, 255),
    Colour::rgb(131, 118, 156),
    Colour::rgb(255, 119, 168),
    Colour::rgb(255, 204, 170),
];

/// The original four-shade handheld green.
pub const GAMEBOY: [Colour; 4] = [
    Colour::rgb(15, 56, 15),
    Colour::rgb(48, 98, 48),
    Colour::rgb(139, 172, 15),
    Colour::rgb(155, 188, 15),
];

/// A 16-colour subset of the NES master palette.
pub const NES: [Colour; 16] = [
    Colour::rgb(0, 0, 0),
    Colour::rgb(124, 124, 124),
    Colour::rgb(188, 188, 188),
    Colour::rgb(252, 252, 252),
    Colour::rgb(168, 16, 0),
    Colour::rgb(248, 56, 0),
    Colour::rgb(252, 160, 68),
    Colour::rgb(248, 184, 0),
    Colour::rgb(0, 120, 0),
    Colour::rgb(0, 184, 0),
    Colour::rgb(88, 216, 84),
    Colour::rgb(0, 0, 188),
    Colour::rgb(0, 88, 248),
    Colour::rgb(60, 188, 252),
    Colour::rgb(148, 0, 132),
    Colour::rgb(248, 120, 248),
];

/// Eight evenly spaced greys.
pub const GRAYSCALE: [Colour; 8] = [
    Colour::rgb(0, 0, 0),
    Colour::rgb(36, 36, 36),
    Colour::rgb(73, 73, 73),
    Colour::rgb(109, 109, 109),
    Colour::rgb(146, 146, 146),
    Colour::rgb(182, 182, 182),
    Colour::rgb(219, 219, 219),
    Colour::rgb(255, 255, 255),
];

/// Look up a builtin palette by name.
///
/// Names are matched case-insensitively and ignore `-`, `_` and spaces, so
/// "PICO-8", "pico8" and "pico 8" all resolve.
pub fn named_palette(name: &str) -> Option<&'static [Colour]> {
    let key: String = name
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect();

    match key.as_str() {
        "pico8" => Some(&PICO8),
        "gameboy" | "gb" | "dmg" => Some(&GAMEBOY),
        "nes" => Some(&NES),
        "grayscale" | "greyscale" | "gray" | "grey" => Some(&GRAYSCALE),
        _ => None,
    }
}

/// Canonical names of the builtin palettes.
pub const PALETTE_NAMES: [&str; 4] = ["pico-8", "gameboy", "nes", "grayscale"];

/// Count colour frequencies across images, skipping fully transparent pixels.
pub fn colour_histogram<'a>(images: impl IntoIterator<Item = &'a RgbaImage>) -> HashMap<Colour, usize> {
    let mut counts: HashMap<Colour, usize> = HashMap::new();
    for image in images {
        for pixel in image.pixels() {
            let colour = Colour::from(*pixel);
            if colour.is_transparent() {
                continue;
            }
            *counts.entry(colour).or_insert(0) += 1;
        }
    }
    counts
}

/// Most frequent colours first; ties broken by colour value so output is stable.
pub fn dominant_colours<'a>(
    images: impl IntoIterator<Item = &'a RgbaImage>,
    limit: Option<usize>,
) -> Vec<Colour> {
    let mut colours: Vec<(Colour, usize)> = colour_histogram(images).into_iter().collect();
    colours.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut out: Vec<Colour> = colours.into_iter().map(|(c, _)| c).collect();
    if let Some(limit) = limit {
        out.truncate(limit);
    }
    out
}

/// Number of distinct non-transparent colours in an image.
pub fn distinct_colours(image: &RgbaImage) -> usize {
    colour_histogram(std::iter::once(image)).len()
}
