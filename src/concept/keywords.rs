//! Keyword tables for concept interpretation.
//!
//! Each table is ordered: when two phrases of equal length match, the one
//! declared first wins. Phrases are written as space-separated lowercase
//! tokens; hyphens in the concept are treated as spaces before matching.

use crate::types::{Style, ViewAngle};

pub const STYLES: &[(&str, Style)] = &[
    ("pixel art", Style::PixelArt),
    ("pixel", Style::PixelArt),
    ("pixelated", Style::PixelArt),
    ("8 bit", Style::PixelArt),
    ("16 bit", Style::PixelArt),
    ("retro", Style::PixelArt),
    ("cartoon", Style::Cartoon),
    ("toon", Style::Cartoon),
    ("cel shaded", Style::Cartoon),
    ("hand painted", Style::Painterly),
    ("painterly", Style::Painterly),
    ("painted", Style::Painterly),
    ("watercolor", Style::Painterly),
    ("realistic", Style::Realistic),
    ("photorealistic", Style::Realistic),
    ("low poly", Style::LowPoly),
    ("lowpoly", Style::LowPoly),
];

pub const VIEWS: &[(&str, ViewAngle)] = &[
    ("side", ViewAngle::Side),
    ("profile", ViewAngle::Side),
    ("front", ViewAngle::Front),
    ("facing", ViewAngle::Front),
    ("back", ViewAngle::Back),
    ("behind", ViewAngle::Back),
    ("three quarter", ViewAngle::ThreeQuarter),
    ("3/4", ViewAngle::ThreeQuarter),
    ("top down", ViewAngle::TopDown),
    ("topdown", ViewAngle::TopDown),
    ("overhead", ViewAngle::TopDown),
    ("isometric", ViewAngle::Isometric),
    ("iso", ViewAngle::Isometric),
];

/// An action and how many frames its animation has by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionKind {
    pub name: &'static str,
    pub frames: u32,
    /// Motion verbs imply an animation even without an explicit marker.
    pub motion: bool,
}

const fn action(name: &'static str, frames: u32, motion: bool) -> ActionKind {
    ActionKind { name, frames, motion }
}

pub const IDLE: ActionKind = action("idle", 8, false);
pub const WALK: ActionKind = action("walk", 8, true);
pub const RUN: ActionKind = action("run", 8, true);
pub const ATTACK: ActionKind = action("attack", 6, true);
pub const JUMP: ActionKind = action("jump", 6, true);
pub const HURT: ActionKind = action("hurt", 4, false);
pub const DEATH: ActionKind = action("death", 8, true);
pub const CAST: ActionKind = action("cast", 8, true);

pub const ACTIONS: &[(&str, ActionKind)] = &[
    ("idle", IDLE),
    ("idling", IDLE),
    ("breathing", IDLE),
    ("walk", WALK),
    ("walking", WALK),
    ("run", RUN),
    ("running", RUN),
    ("sprint", RUN),
    ("attack", ATTACK),
    ("attacking", ATTACK),
    ("slash", ATTACK),
    ("jump", JUMP),
    ("jumping", JUMP),
    ("hurt", HURT),
    ("hit", HURT),
    ("death", DEATH),
    ("dying", DEATH),
    ("die", DEATH),
    ("cast", CAST),
    ("casting", CAST),
    ("spellcast", CAST),
];

/// Look up an action by canonical name.
pub fn action_by_name(name: &str) -> Option<ActionKind> {
    ACTIONS
        .iter()
        .map(|(_, kind)| *kind)
        .find(|kind| kind.name == name)
}

pub const THEMES: &[(&str, &str)] = &[
    ("fire", "fire"),
    ("flame", "fire"),
    ("fiery", "fire"),
    ("lava", "fire"),
    ("ember", "fire"),
    ("water", "water"),
    ("aqua", "water"),
    ("ocean", "water"),
    ("ice", "ice"),
    ("frost", "ice"),
    ("frozen", "ice"),
    ("snow", "ice"),
    ("nature", "nature"),
    ("forest", "nature"),
    ("leaf", "nature"),
    ("plant", "nature"),
    ("shadow", "shadow"),
    ("dark", "shadow"),
    ("void", "shadow"),
    ("holy", "light"),
    ("radiant", "light"),
    ("electric", "electric"),
    ("lightning", "electric"),
    ("thunder", "electric"),
    ("poison", "poison"),
    ("toxic", "poison"),
    ("metal", "metal"),
    ("steel", "metal"),
    ("robot", "metal"),
    ("stone", "earth"),
    ("earth", "earth"),
];

pub const PALETTES: &[(&str, &str)] = &[
    ("pico 8", "pico-8"),
    ("pico8", "pico-8"),
    ("game boy", "gameboy"),
    ("gameboy", "gameboy"),
    ("nes", "nes"),
    ("grayscale", "grayscale"),
    ("greyscale", "grayscale"),
    ("monochrome", "grayscale"),
];

/// Words that turn an action into an animation.
pub const ANIMATION_MARKERS: &[(&str, ())] = &[
    ("animation", ()),
    ("animated", ()),
    ("anim", ()),
    ("cycle", ()),
    ("loop", ()),
    ("sprite sheet", ()),
    ("spritesheet", ()),
    ("sheet", ()),
];

/// Words that drop the transparency requirement.
pub const OPAQUE_MARKERS: &[(&str, ())] = &[
    ("with background", ()),
    ("opaque", ()),
    ("solid background", ()),
];

/// Filler words that never become part of the entity name.
pub const STOPWORDS: &[&str] = &[
    "a", "an", "the", "of", "with", "and", "in", "on", "for", "style", "view", "sprite",
    "sprites", "asset", "game", "pose", "art", "please", "make", "create", "generate", "me",
    "some", "frame", "frames", "color", "colors", "colour", "colours", "px", "seed",
];
