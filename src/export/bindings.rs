//! Engine code bindings.
//!
//! Pure templating over [`AnimationMetadata`]. Unknown engine identifiers
//! get a comment-only stub instead of an error.

use std::fmt::Write as _;

use serde::Serialize;

use super::metadata::AnimationMetadata;

/// Engines with a dedicated template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Godot,
    Unity,
    Phaser,
    Love2d,
    Generic,
}

impl Engine {
    pub const ALL: [Engine; 5] = [
        Engine::Godot,
        Engine::Unity,
        Engine::Phaser,
        Engine::Love2d,
        Engine::Generic,
    ];

    /// Look up an engine by identifier, ignoring case and separators.
    pub fn from_id(id: &str) -> Option<Engine> {
        let id: String = id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match id.as_str() {
            "godot" | "godot4" => Some(Engine::Godot),
            "unity" => Some(Engine::Unity),
            "phaser" | "phaser3" => Some(Engine::Phaser),
            "love2d" | "love" => Some(Engine::Love2d),
            "generic" => Some(Engine::Generic),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Engine::Godot => "godot",
            Engine::Unity => "unity",
            Engine::Phaser => "phaser",
            Engine::Love2d => "love2d",
            Engine::Generic => "generic",
        }
    }
}

/// Generated source text keyed by its relative output path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBinding {
    pub engine: String,
    pub path: String,
    pub source: String,
}

/// Outcome of binding generation.
#[derive(Debug, Clone)]
pub struct Bindings {
    pub bindings: Vec<CodeBinding>,
    /// Set when the engine id was not recognised and a stub was emitted.
    pub unsupported: Option<String>,
}

/// Emit bindings for `engine_id`.
pub fn generate(engine_id: &str, meta: &AnimationMetadata) -> Bindings {
    let Some(engine) = Engine::from_id(engine_id) else {
        return Bindings {
            bindings: vec![stub(engine_id, meta)],
            unsupported: Some(engine_id.to_string()),
        };
    };

    let binding = match engine {
        Engine::Godot => godot(meta),
        Engine::Unity => unity(meta),
        Engine::Phaser => phaser(meta),
        Engine::Love2d => love2d(meta),
        Engine::Generic => generic(meta),
    };
    Bindings {
        bindings: vec![binding],
        unsupported: None,
    }
}

fn snake(name: &str) -> String {
    name.replace('-', "_")
}

fn pascal(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|p| !p.is_empty())
        .map(|p| {
            let mut chars = p.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn index_list(frames: &[usize]) -> String {
    frames.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

fn stub(engine_id: &str, meta: &AnimationMetadata) -> CodeBinding {
    let mut s = String::new();
    let _ = writeln!(s, "// No binding template for engine '{}'.", engine_id);
    let _ = writeln!(s, "// Sheet: {}", meta.image);
    let _ = writeln!(s, "// Frame size: {}x{}", meta.frame_width, meta.frame_height);
    for cycle in &meta.animations {
        let _ = writeln!(s, "// Animation '{}': frames [{}]", cycle.name, index_list(&cycle.frames));
    }

    let ext = engine_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    CodeBinding {
        engine: engine_id.to_string(),
        path: format!("{}.{}.txt", meta.name, if ext.is_empty() { "engine" } else { ext.as_str() }),
        source: s,
    }
}

fn godot(meta: &AnimationMetadata) -> CodeBinding {
    let mut s = String::new();
    let _ = writeln!(s, "extends AnimatedSprite2D");
    let _ = writeln!(s);
    let _ = writeln!(s, "const SHEET := preload(\"res://{}\")", meta.image);
    let _ = writeln!(s, "const FRAME_SIZE := Vector2i({}, {})", meta.frame_width, meta.frame_height);
    let _ = writeln!(s);
    let _ = writeln!(s, "func _ready() -> void:");
    let _ = writeln!(s, "\tvar frames := SpriteFrames.new()");
    for cycle in &meta.animations {
        let _ = writeln!(s, "\tframes.add_animation(\"{}\")", cycle.name);
        let _ = writeln!(s, "\tframes.set_animation_speed(\"{}\", {})", cycle.name, cycle.frame_rate);
        let _ = writeln!(s, "\tframes.set_animation_loop(\"{}\", {})", cycle.name, cycle.looping);
        for &i in &cycle.frames {
            let b = meta.frames[i].bounds;
            let _ = writeln!(s, "\tvar tex_{}_{} := AtlasTexture.new()", snake(&cycle.name), i);
            let _ = writeln!(s, "\ttex_{}_{}.atlas = SHEET", snake(&cycle.name), i);
            let _ = writeln!(
                s,
                "\ttex_{}_{}.region = Rect2({}, {}, {}, {})",
                snake(&cycle.name),
                i,
                b.x,
                b.y,
                b.width,
                b.height
            );
            let _ = writeln!(s, "\tframes.add_frame(\"{}\", tex_{}_{})", cycle.name, snake(&cycle.name), i);
        }
    }
    let _ = writeln!(s, "\tsprite_frames = frames");
    if let Some(first) = meta.animations.first() {
        let _ = writeln!(s, "\tplay(\"{}\")", first.name);
    }

    CodeBinding {
        engine: Engine::Godot.as_str().to_string(),
        path: format!("scripts/{}.gd", snake(&meta.name)),
        source: s,
    }
}

fn unity(meta: &AnimationMetadata) -> CodeBinding {
    let class = format!("{}Animator", pascal(&meta.name));
    let mut s = String::new();
    let _ = writeln!(s, "using System.Collections.Generic;");
    let _ = writeln!(s, "using UnityEngine;");
    let _ = writeln!(s);
    let _ = writeln!(s, "public class {} : MonoBehaviour", class);
    let _ = writeln!(s, "{{");
    let _ = writeln!(s, "    public Texture2D sheet;");
    let _ = writeln!(s, "    public float framesPerSecond = {}f;", meta.frame_rate.max(1));
    let _ = writeln!(s);
    let _ = writeln!(s, "    static readonly Rect[] Frames = {{");
    for f in &meta.frames {
        let b = f.bounds;
        // Unity's texture origin is bottom-left.
        let y = meta.sprite_sheet_dimensions.height.saturating_sub(b.bottom());
        let _ = writeln!(s, "        new Rect({}, {}, {}, {}),", b.x, y, b.width, b.height);
    }
    let _ = writeln!(s, "    }};");
    let _ = writeln!(s);
    let _ = writeln!(s, "    static readonly Dictionary<string, int[]> Animations = new Dictionary<string, int[]> {{");
    for cycle in &meta.animations {
        let _ = writeln!(s, "        {{ \"{}\", new[] {{ {} }} }},", cycle.name, index_list(&cycle.frames));
    }
    let _ = writeln!(s, "    }};");
    let _ = writeln!(s);
    let _ = writeln!(s, "    SpriteRenderer spriteRenderer;");
    let _ = writeln!(s, "    Sprite[] sprites;");
    let _ = writeln!(s, "    int[] current;");
    let _ = writeln!(s, "    float clock;");
    let _ = writeln!(s, "    bool looping = {};", meta.looping);
    let _ = writeln!(s);
    let _ = writeln!(s, "    void Awake()");
    let _ = writeln!(s, "    {{");
    let _ = writeln!(s, "        spriteRenderer = GetComponent<SpriteRenderer>();");
    let _ = writeln!(s, "        sprites = new Sprite[Frames.Length];");
    let _ = writeln!(s, "        for (int i = 0; i < Frames.Length; i++)");
    let _ = writeln!(s, "            sprites[i] = Sprite.Create(sheet, Frames[i], new Vector2(0.5f, 0.5f), {});", meta.frame_height.max(1));
    if let Some(first) = meta.animations.first() {
        let _ = writeln!(s, "        Play(\"{}\");", first.name);
    }
    let _ = writeln!(s, "    }}");
    let _ = writeln!(s);
    let _ = writeln!(s, "    public void Play(string name)");
    let _ = writeln!(s, "    {{");
    let _ = writeln!(s, "        current = Animations[name];");
    let _ = writeln!(s, "        clock = 0f;");
    let _ = writeln!(s, "    }}");
    let _ = writeln!(s);
    let _ = writeln!(s, "    void Update()");
    let _ = writeln!(s, "    {{");
    let _ = writeln!(s, "        clock += Time.deltaTime * framesPerSecond;");
    let _ = writeln!(s, "        int step = (int)clock;");
    let _ = writeln!(s, "        step = looping ? step % current.Length : Mathf.Min(step, current.Length - 1);");
    let _ = writeln!(s, "        spriteRenderer.sprite = sprites[current[step]];");
    let _ = writeln!(s, "    }}");
    let _ = writeln!(s, "}}");

    CodeBinding {
        engine: Engine::Unity.as_str().to_string(),
        path: format!("Scripts/{}.cs", class),
        source: s,
    }
}

fn phaser(meta: &AnimationMetadata) -> CodeBinding {
    let key = &meta.name;
    let mut s = String::new();
    let _ = writeln!(s, "export function preload{}(scene) {{", pascal(key));
    let _ = writeln!(s, "  scene.load.spritesheet('{}', '{}', {{", key, meta.image);
    let _ = writeln!(s, "    frameWidth: {},", meta.frame_width);
    let _ = writeln!(s, "    frameHeight: {},", meta.frame_height);
    let _ = writeln!(s, "    spacing: {},", meta.padding);
    let _ = writeln!(s, "  }});");
    let _ = writeln!(s, "}}");
    let _ = writeln!(s);
    let _ = writeln!(s, "export function create{}Animations(scene) {{", pascal(key));
    for cycle in &meta.animations {
        let _ = writeln!(s, "  scene.anims.create({{");
        let _ = writeln!(s, "    key: '{}-{}',", key, cycle.name);
        let _ = writeln!(
            s,
            "    frames: scene.anims.generateFrameNumbers('{}', {{ frames: [{}] }}),",
            key,
            index_list(&cycle.frames)
        );
        let _ = writeln!(s, "    frameRate: {},", cycle.frame_rate.max(1));
        let _ = writeln!(s, "    repeat: {},", if cycle.looping { -1 } else { 0 });
        let _ = writeln!(s, "  }});");
    }
    let _ = writeln!(s, "}}");

    CodeBinding {
        engine: Engine::Phaser.as_str().to_string(),
        path: format!("src/{}.js", key),
        source: s,
    }
}

fn love2d(meta: &AnimationMetadata) -> CodeBinding {
    let mut s = String::new();
    let _ = writeln!(s, "local M = {{}}");
    let _ = writeln!(s);
    let _ = writeln!(s, "function M.load()");
    let _ = writeln!(s, "  M.image = love.graphics.newImage(\"{}\")", meta.image);
    let _ = writeln!(s, "  M.image:setFilter(\"nearest\", \"nearest\")");
    let _ = writeln!(s, "  local w, h = M.image:getDimensions()");
    let _ = writeln!(s, "  M.quads = {{");
    for f in &meta.frames {
        let b = f.bounds;
        let _ = writeln!(s, "    love.graphics.newQuad({}, {}, {}, {}, w, h),", b.x, b.y, b.width, b.height);
    }
    let _ = writeln!(s, "  }}");
    let _ = writeln!(s, "  M.animations = {{");
    for cycle in &meta.animations {
        // Lua arrays are 1-based.
        let frames: Vec<String> = cycle.frames.iter().map(|i| (i + 1).to_string()).collect();
        let _ = writeln!(
            s,
            "    [\"{}\"] = {{ frames = {{ {} }}, fps = {}, loop = {} }},",
            cycle.name,
            frames.join(", "),
            cycle.frame_rate.max(1),
            cycle.looping
        );
    }
    let _ = writeln!(s, "  }}");
    let _ = writeln!(s, "end");
    let _ = writeln!(s);
    let _ = writeln!(s, "function M.frame(name, time)");
    let _ = writeln!(s, "  local anim = M.animations[name]");
    let _ = writeln!(s, "  local step = math.floor(time * anim.fps)");
    let _ = writeln!(s, "  if anim.loop then");
    let _ = writeln!(s, "    step = step % #anim.frames");
    let _ = writeln!(s, "  else");
    let _ = writeln!(s, "    step = math.min(step, #anim.frames - 1)");
    let _ = writeln!(s, "  end");
    let _ = writeln!(s, "  return M.quads[anim.frames[step + 1]]");
    let _ = writeln!(s, "end");
    let _ = writeln!(s);
    let _ = writeln!(s, "return M");

    CodeBinding {
        engine: Engine::Love2d.as_str().to_string(),
        path: format!("{}.lua", snake(&meta.name)),
        source: s,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenericBinding<'a> {
    sprite: &'a str,
    image: &'a str,
    frame_width: u32,
    frame_height: u32,
    animations: Vec<GenericAnimation<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenericAnimation<'a> {
    name: &'a str,
    frames: &'a [usize],
    frame_rate: u32,
    #[serde(rename = "loop")]
    looping: bool,
}

fn generic(meta: &AnimationMetadata) -> CodeBinding {
    let doc = GenericBinding {
        sprite: &meta.name,
        image: &meta.image,
        frame_width: meta.frame_width,
        frame_height: meta.frame_height,
        animations: meta
            .animations
            .iter()
            .map(|c| GenericAnimation {
                name: &c.name,
                frames: &c.frames,
                frame_rate: c.frame_rate,
                looping: c.looping,
            })
            .collect(),
    };

    CodeBinding {
        engine: Engine::Generic.as_str().to_string(),
        path: format!("{}.binding.json", meta.name),
        source: serde_json::to_string_pretty(&doc).unwrap_or_default() + "\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::metadata::AnimationMetadata;
    use crate::export::sheet::{Layout, SheetPacker};
    use crate::types::{GenerationSpec, ProcessedFrame, RawFrame};
    use image::RgbaImage;

    fn meta(action: &str, frames: usize) -> AnimationMetadata {
        let spec = GenerationSpec::builder("pet")
            .theme("fire")
            .action(action)
            .frame_count(frames as u32)
            .build()
            .unwrap();
        let frames: Vec<_> = (0..frames)
            .map(|i| ProcessedFrame::from_raw(RawFrame::new(i, RgbaImage::new(32, 32))))
            .collect();
        let sheet = SheetPacker::default().pack(&frames).unwrap();
        AnimationMetadata::describe(&spec, &sheet, Layout::Horizontal, format!("{}-sheet.png", spec.asset_name()))
    }

    #[test]
    fn test_engine_ids() {
        assert_eq!(Engine::from_id("Godot"), Some(Engine::Godot));
        assert_eq!(Engine::from_id("LOVE-2D"), Some(Engine::Love2d));
        assert_eq!(Engine::from_id("phaser3"), Some(Engine::Phaser));
        assert_eq!(Engine::from_id("genericEngine"), None);
        for engine in Engine::ALL {
            assert_eq!(Engine::from_id(engine.as_str()), Some(engine));
        }
    }

    #[test]
    fn test_unknown_engine_stub() {
        let out = generate("genericEngine", &meta("idle", 2));
        assert_eq!(out.unsupported.as_deref(), Some("genericEngine"));
        assert_eq!(out.bindings[0].path, "fire-pet-idle.genericengine.txt");
        insta::assert_snapshot!(out.bindings[0].source, @r"
        // No binding template for engine 'genericEngine'.
        // Sheet: fire-pet-idle-sheet.png
        // Frame size: 32x32
        // Animation 'idle': frames [0, 1]
        ");
    }

    #[test]
    fn test_godot_binding() {
        let out = generate("godot", &meta("walk", 3));
        assert!(out.unsupported.is_none());
        let b = &out.bindings[0];
        assert_eq!(b.path, "scripts/fire_pet_walk.gd");
        assert!(b.source.contains("preload(\"res://fire-pet-walk-sheet.png\")"));
        assert!(b.source.contains("tex_walk_2.region = Rect2(64, 0, 32, 32)"));
        assert!(b.source.contains("set_animation_loop(\"walk\", true)"));
        assert!(b.source.contains("play(\"walk\")"));
    }

    #[test]
    fn test_unity_binding_flips_y() {
        let b = &generate("unity", &meta("attack", 4)).bindings[0];
        assert_eq!(b.path, "Scripts/FirePetAttackAnimator.cs");
        assert!(b.source.contains("public class FirePetAttackAnimator : MonoBehaviour"));
        assert!(b.source.contains("new Rect(96, 0, 32, 32),"));
        assert!(b.source.contains("{ \"attack-strike\", new[] { 2, 3 } },"));
    }

    #[test]
    fn test_phaser_binding() {
        let b = &generate("phaser", &meta("run", 2)).bindings[0];
        assert_eq!(b.path, "src/fire-pet-run.js");
        assert!(b.source.contains("key: 'fire-pet-run-run'"));
        assert!(b.source.contains("repeat: -1"));
    }

    #[test]
    fn test_love2d_uses_one_based_frames() {
        let b = &generate("love2d", &meta("idle", 3)).bindings[0];
        assert_eq!(b.path, "fire_pet_idle.lua");
        assert!(b.source.contains("frames = { 1, 2, 3 }"));
        assert!(b.source.contains("love.graphics.newQuad(64, 0, 32, 32, w, h)"));
    }

    #[test]
    fn test_generic_binding_is_json() {
        let b = &generate("generic", &meta("jump", 4)).bindings[0];
        let json: serde_json::Value = serde_json::from_str(&b.source).unwrap();
        assert_eq!(json["sprite"], "fire-pet-jump");
        assert_eq!(json["animations"][1]["name"], "jump-rise");
        assert_eq!(json["animations"][0]["loop"], false);
    }
}
