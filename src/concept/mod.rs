//! Concept interpretation: free text to [`GenerationSpec`].
//!
//! Interpretation is best-effort. Every field the concept does not mention
//! falls back to a documented default, and the defaulted fields are
//! reported alongside the generation spec. The only hard failure is a concept with no
//! usable words at all.
//!
//! Within each keyword table the most specific (longest) matching phrase
//! wins; equal-length matches are resolved by table order.

pub mod keywords;

use tracing::debug;

use crate::error::{GenError, Result};
use crate::types::{Colour, GenerationSpec, PaletteConstraint, Resolution, MAX_EDGE};

use keywords::{ActionKind, IDLE};

/// Concepts longer than this are rejected as malformed.
pub const MAX_CONCEPT_LEN: usize = 1000;

/// Entity name used when no word is left over after keyword matching.
pub const DEFAULT_ENTITY: &str = "sprite";

/// A spec plus the names of the fields that were filled by defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub spec: GenerationSpec,
    pub defaulted: Vec<&'static str>,
}

/// Parse a concept into a spec, discarding the defaulted-field report.
pub fn interpret(text: &str) -> Result<GenerationSpec> {
    Interpreter.interpret(text).map(|i| i.spec)
}

/// Stateless natural-language to spec mapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter;

impl Interpreter {
    pub fn interpret(&self, text: &str) -> Result<Interpretation> {
        if text.chars().count() > MAX_CONCEPT_LEN {
            return Err(GenError::Interpretation {
                message: format!("concept is longer than {} characters", MAX_CONCEPT_LEN),
                help: Some("Describe the sprite in a short phrase".to_string()),
            });
        }

        let tokens = tokenize(text);
        if !tokens.iter().any(|t| t.chars().any(char::is_alphanumeric)) {
            return Err(GenError::Interpretation {
                message: "concept contains no words".to_string(),
                help: Some("Try something like \"pixel art fire pet idle animation\"".to_string()),
            });
        }

        let mut matcher = Matcher::new(&tokens);
        let mut defaulted = Vec::new();

        let style = matcher.best(keywords::STYLES);
        let view = matcher.best(keywords::VIEWS);
        let palette_name = matcher.best(keywords::PALETTES);
        let action = matcher.best(keywords::ACTIONS);
        let theme = matcher.best(keywords::THEMES);
        let animated = matcher.best(keywords::ANIMATION_MARKERS).is_some();
        let opaque = matcher.best(keywords::OPAQUE_MARKERS).is_some();
        let explicit = matcher.numeric_tokens();
        if let Some(token) = &explicit.out_of_range {
            return Err(GenError::Interpretation {
                message: format!("size '{}' is out of range", token),
                help: Some(format!("Sizes go up to {}px per side", MAX_EDGE)),
            });
        }
        let entity = matcher.entity();

        let mut builder = GenerationSpec::builder(entity.unwrap_or_else(|| {
            defaulted.push("entity");
            DEFAULT_ENTITY.to_string()
        }));

        match style {
            Some(style) => builder = builder.style(style),
            None => defaulted.push("style"),
        }
        match view {
            Some(view) => builder = builder.view(view),
            None => defaulted.push("view"),
        }
        match theme {
            Some(theme) => builder = builder.theme(theme),
            None => defaulted.push("theme"),
        }

        let action_kind = action.unwrap_or_else(|| {
            defaulted.push("action");
            IDLE
        });
        builder = builder.action(action_kind.name);

        let frames = match explicit.frames {
            Some(n) => n,
            None => {
                let inferred = infer_frame_count(action, animated);
                if action.is_none() && !animated {
                    defaulted.push("frameCount");
                }
                inferred
            }
        };
        builder = builder.frame_count(frames);

        match explicit.resolution {
            Some(resolution) => builder = builder.resolution(resolution),
            None => defaulted.push("resolution"),
        }

        if !explicit.hex.is_empty() {
            builder = builder.palette(PaletteConstraint::Hex(explicit.hex));
        } else if let Some(name) = palette_name {
            builder = builder.palette(PaletteConstraint::Named(name.to_string()));
        }
        if let Some(max) = explicit.max_colors {
            builder = builder.max_colors(max);
        }
        if opaque {
            builder = builder.require_transparency(false);
        }
        if let Some(seed) = explicit.seed {
            builder = builder.seed(seed);
        }

        // Only reachable through out-of-range explicit values.
        let spec = builder.build().map_err(|e| match e {
            GenError::Parse { message, help } => GenError::Interpretation { message, help },
            other => GenError::Interpretation {
                message: other.to_string(),
                help: None,
            },
        })?;

        debug!(
            entity = spec.entity(),
            style = %spec.style(),
            action = spec.action(),
            frames = spec.frame_count(),
            defaulted = ?defaulted,
            "interpreted concept"
        );

        Ok(Interpretation { spec, defaulted })
    }
}

/// Frame count implied by an action when no explicit count was given.
fn infer_frame_count(action: Option<ActionKind>, animated: bool) -> u32 {
    match action {
        Some(kind) if animated || kind.motion => kind.frames,
        None if animated => IDLE.frames,
        _ => 1,
    }
}

/// Lowercase, split on anything that isn't part of a word, hex colour or "3/4".
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '#' || c == '/'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// `WxH` or `Npx` with all-digit numbers.
fn is_size_shaped(token: &str) -> bool {
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match token.split_once('x') {
        Some((w, h)) => digits(w) && digits(h),
        None => token.strip_suffix("px").is_some_and(digits),
    }
}

#[derive(Debug, Default)]
struct ExplicitValues {
    resolution: Option<Resolution>,
    frames: Option<u32>,
    max_colors: Option<usize>,
    seed: Option<u64>,
    hex: Vec<Colour>,
    /// A size-shaped token ("WxH", "Npx") whose numbers do not fit.
    out_of_range: Option<String>,
}

/// Tracks which tokens have been claimed by a keyword table.
struct Matcher<'a> {
    tokens: &'a [String],
    used: Vec<bool>,
}

impl<'a> Matcher<'a> {
    fn new(tokens: &'a [String]) -> Self {
        Self {
            tokens,
            used: vec![false; tokens.len()],
        }
    }

    /// Find the most specific match from `table` among unclaimed tokens.
    ///
    /// Every matching phrase in the table claims its tokens, so a losing
    /// keyword ("ice" in "ice fire dragon") does not leak into the entity.
    fn best<T: Copy>(&mut self, table: &[(&str, T)]) -> Option<T> {
        // (phrase length, declaration index, start)
        let mut matches: Vec<(usize, usize, usize)> = Vec::new();

        for (decl, (phrase, _)) in table.iter().enumerate() {
            let words: Vec<&str> = phrase.split(' ').collect();
            if words.len() > self.tokens.len() {
                continue;
            }
            for start in 0..=self.tokens.len() - words.len() {
                let window = start..start + words.len();
                let fits = window.clone().all(|i| !self.used[i])
                    && self.tokens[window].iter().zip(&words).all(|(t, w)| t == w);
                if fits {
                    matches.push((words.len(), decl, start));
                }
            }
        }

        let best = matches
            .iter()
            .copied()
            .min_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)))?;

        for (len, _, start) in &matches {
            for flag in &mut self.used[*start..*start + *len] {
                *flag = true;
            }
        }

        Some(table[best.1].1)
    }

    /// Pull out numbers with units, sizes, hex colours and seeds.
    fn numeric_tokens(&mut self) -> ExplicitValues {
        let mut out = ExplicitValues::default();
        let tokens = self.tokens;

        for i in 0..tokens.len() {
            if self.used[i] {
                continue;
            }
            let token = tokens[i].as_str();
            let next = tokens
                .get(i + 1)
                .filter(|_| !self.used.get(i + 1).copied().unwrap_or(true))
                .map(String::as_str);

            if token.starts_with('#') {
                if let Ok(colour) = Colour::from_hex(token) {
                    out.hex.push(colour);
                    self.used[i] = true;
                }
                continue;
            }

            if token == "seed" {
                if let Some(seed) = next.and_then(|n| n.parse::<u64>().ok()) {
                    out.seed = Some(seed);
                    self.used[i] = true;
                    self.used[i + 1] = true;
                }
                continue;
            }

            if is_size_shaped(token) {
                self.used[i] = true;
                let parsed = match token.strip_suffix("px") {
                    Some(n) => n.parse::<u32>().ok().and_then(|n| Resolution::new(n, n).ok()),
                    None => token.parse::<Resolution>().ok(),
                };
                match parsed {
                    Some(resolution) => out.resolution = Some(resolution),
                    None => out.out_of_range = Some(token.to_string()),
                }
                continue;
            }

            let Ok(n) = token.parse::<u32>() else {
                continue;
            };
            match next {
                Some("frame" | "frames") if n > 0 => out.frames = Some(n),
                Some("color" | "colors" | "colour" | "colours") if n > 0 => {
                    out.max_colors = Some(n as usize)
                }
                Some("px") => {
                    if let Ok(resolution) = Resolution::new(n, n) {
                        out.resolution = Some(resolution);
                    }
                }
                _ => continue,
            }
            self.used[i] = true;
            self.used[i + 1] = true;
        }

        out
    }

    /// Whatever is left that isn't a stopword, joined with hyphens.
    ///
    /// Leftovers are split on anything outside `[a-z0-9]`, so stray `/`,
    /// `#` or non-ASCII text never reaches the entity.
    fn entity(&self) -> Option<String> {
        let words: Vec<&str> = self
            .tokens
            .iter()
            .zip(&self.used)
            .filter(|(_, used)| !**used)
            .flat_map(|(token, _)| token.split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit())))
            .filter(|word| {
                !word.is_empty()
                    && !keywords::STOPWORDS.contains(word)
                    && word.chars().any(|c| c.is_ascii_lowercase())
            })
            .collect();

        (!words.is_empty()).then(|| words.join("-"))
    }
}
