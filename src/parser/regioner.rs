//! Groups character primitives into same-styled rectangular runs.

use serde::Serialize;

use super::state::{ParserState, EPSILON};
use super::Primitive;
use crate::tokenizer::{CharacterSize, DrcsGlyph};
use crate::types::{Profile, RegionerOptions, RubyMode};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Glyph {
    Text(String),
    Drcs(DrcsGlyph),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegionItem {
    pub glyph:       Glyph,
    pub non_spacing: bool,
    pub state:       ParserState,
    pub x:           f64,
    /// Zero for non-spacing characters
    pub width:       f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Span {
    Normal(Vec<RegionItem>),
    Ruby { base: Vec<RegionItem>, ruby: Vec<RegionItem> },
    Script { superscript: RegionItem, subscript: RegionItem },
}

impl Span {
    fn start(&self) -> f64 {
        match self {
            Span::Normal(items) | Span::Ruby { base: items, .. } => items.first().map_or(0.0, |i| i.x),
            Span::Script { superscript, .. } => superscript.x,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Region {
    pub x:          f64,
    /// Top edge
    pub y:          f64,
    pub width:      f64,
    pub height:     f64,
    pub size:       CharacterSize,
    pub background: u8,
    pub highlight:  u8,
    pub spans:      Vec<Span>,
}

fn same(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Middle-size text lines up with normal text.
fn merge_class(size: CharacterSize) -> CharacterSize {
    match size {
        CharacterSize::Middle => CharacterSize::Normal,
        other => other,
    }
}

impl Region {
    fn from_primitive(primitive: &Primitive) -> Option<Self> {
        let (glyph, non_spacing, state) = match primitive {
            Primitive::Character { text, non_spacing, state } => (Glyph::Text(text.clone()), *non_spacing, state),
            Primitive::Drcs { glyph, state } => (Glyph::Drcs(glyph.clone()), false, state),
            Primitive::Bitmap { .. } | Primitive::ClearScreen { .. } => return None,
        };
        let height = state.cell_height();
        let width = if non_spacing { 0.0 } else { state.cell_width() };
        let item = RegionItem { glyph, non_spacing, state: *state, x: state.position[0], width };
        Some(Region {
            x: state.position[0],
            y: state.position[1] + state.magnification - height,
            width,
            height,
            size: state.size,
            background: state.background,
            highlight: state.highlight,
            spans: vec![Span::Normal(vec![item])],
        })
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    fn is_small(&self) -> bool {
        self.size == CharacterSize::Small
    }

    fn is_normal(&self) -> bool {
        merge_class(self.size) == CharacterSize::Normal
    }

    fn joins(&self, next: &Region) -> bool {
        same(self.right(), next.x)
            && same(self.y, next.y)
            && self.background == next.background
            && (self.highlight != 0) == (next.highlight != 0)
            && merge_class(self.size) == merge_class(next.size)
    }

    fn absorb(&mut self, next: Region) {
        self.width += next.width;
        self.height = self.height.max(next.height);
        for span in next.spans {
            match (self.spans.last_mut(), span) {
                (Some(Span::Normal(items)), Span::Normal(more)) => items.extend(more),
                (_, span) => self.spans.push(span),
            }
        }
    }

    /// Every item in reading order
    pub fn items(&self) -> Vec<&RegionItem> {
        let mut out = Vec::new();
        for span in &self.spans {
            match span {
                Span::Normal(items) => out.extend(items),
                Span::Ruby { base, ruby } => out.extend(base.iter().chain(ruby)),
                Span::Script { superscript, subscript } => out.extend([superscript, subscript]),
            }
        }
        out
    }

    /// Base text, ruby and scripts excluded
    pub fn text(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            let items = match span {
                Span::Normal(items) | Span::Ruby { base: items, .. } => items,
                Span::Script { .. } => continue,
            };
            for item in items {
                if let Glyph::Text(t) = &item.glyph {
                    out.push_str(t);
                }
            }
        }
        out
    }
}

/// Adjacency merge in row-then-column order; merging an already merged list changes nothing.
pub fn merge_regions(mut regions: Vec<Region>) -> Vec<Region> {
    regions.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
    let mut out: Vec<Region> = Vec::with_capacity(regions.len());
    for region in regions {
        match out.iter().rposition(|r| r.joins(&region)) {
            Some(i) => out[i].absorb(region),
            None => out.push(region),
        }
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct Regioner {
    options: RegionerOptions,
}

impl Regioner {
    pub fn new(options: RegionerOptions) -> Self {
        Self { options }
    }

    pub fn regions(&self, primitives: &[Primitive]) -> Vec<Region> {
        let mut regions = merge_regions(primitives.iter().filter_map(Region::from_primitive).collect());
        if self.options.profile == Profile::Arib {
            extract_scripts(&mut regions);
            regions = merge_regions(regions);
        }
        match self.options.ruby {
            RubyMode::Guess => extract_ruby(&mut regions),
            RubyMode::Preserve => {}
            RubyMode::Ignore => regions.retain(|r| !r.is_small()),
        }
        regions
    }
}

/// A small run starting at a base's top-right corner paired with one ending at its bottom-right corner
fn extract_scripts(regions: &mut Vec<Region>) {
    'scan: loop {
        for b in 0..regions.len() {
            let base = &regions[b];
            if !base.is_normal() {
                continue;
            }
            let sup = regions
                .iter()
                .position(|r| r.is_small() && same(r.y, base.y) && same(r.x, base.right()));
            let sub = regions
                .iter()
                .position(|r| r.is_small() && same(r.bottom(), base.bottom()) && same(r.x, base.right()));
            let (Some(p), Some(s)) = (sup, sub) else { continue };
            if p == s {
                continue;
            }

            let width = regions[p].width.min(regions[s].width);
            let pairs: Vec<Span> = regions[p]
                .items()
                .into_iter()
                .zip(regions[s].items())
                .map(|(sup, sub)| Span::Script { superscript: sup.clone(), subscript: sub.clone() })
                .collect();
            regions[b].spans.extend(pairs);
            regions[b].width += width;
            regions.remove(p.max(s));
            regions.remove(p.min(s));
            continue 'scan;
        }
        break;
    }
}

/// Splits `base` around the horizontal extent of `ruby`; `None` when nothing sits under it.
fn split_ruby(base: &Region, ruby: &Region) -> Option<Vec<Span>> {
    let (lo, hi) = (ruby.x, ruby.right());
    let mut before: Vec<Span> = Vec::new();
    let mut under: Vec<RegionItem> = Vec::new();
    let mut after: Vec<Span> = Vec::new();

    fn push_item(spans: &mut Vec<Span>, item: RegionItem) {
        match spans.last_mut() {
            Some(Span::Normal(items)) => items.push(item),
            _ => spans.push(Span::Normal(vec![item])),
        }
    }

    for span in &base.spans {
        match span {
            Span::Normal(items) => {
                for item in items {
                    let center = item.x + item.width / 2.0;
                    if center < lo - EPSILON {
                        push_item(&mut before, item.clone());
                    } else if center < hi - EPSILON {
                        under.push(item.clone());
                    } else {
                        push_item(&mut after, item.clone());
                    }
                }
            }
            other if other.start() < lo => before.push(other.clone()),
            other => after.push(other.clone()),
        }
    }
    if under.is_empty() {
        return None;
    }
    let ruby = ruby.items().into_iter().cloned().collect();
    before.push(Span::Ruby { base: under, ruby });
    before.extend(after);
    Some(before)
}

/// Attaches each small run sitting on top of normal text to the text it overlaps most.
fn extract_ruby(regions: &mut Vec<Region>) {
    'scan: loop {
        for b in 0..regions.len() {
            let base = &regions[b];
            if !base.is_normal() {
                continue;
            }
            let mut best: Option<(usize, f64)> = None;
            for (i, r) in regions.iter().enumerate() {
                if !r.is_small() || !same(r.bottom(), base.y) {
                    continue;
                }
                let overlap = r.right().min(base.right()) - r.x.max(base.x);
                if overlap > EPSILON && best.is_none_or(|(_, o)| overlap > o + EPSILON) {
                    best = Some((i, overlap));
                }
            }
            let Some((i, _)) = best else { continue };
            let Some(spans) = split_ruby(base, &regions[i]) else { continue };
            regions[b].spans = spans;
            regions.remove(i);
            continue 'scan;
        }
        break;
    }
}
