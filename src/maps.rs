// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The complete flame: an ordered list of mappings chosen at random
//! during iteration, a final mapping applied to every output point,
//! and the two HDR tone parameters handed on to the renderer.
//!
//! Flames are stored as whitespace-delimited text:
//!
//! ```text
//! FlamEd V1
//! <hdr_exposure> <hdr_power>
//! <final mapping>
//! --
//! <mapping 0>
//! --
//! <mapping 1>
//! ----
//! ```
//!
//! A mapping is written as its pre-affine map (`a b c d cx cy`), its
//! variation name, its post-affine map, its color (`r g b`) and its
//! color speed.

use itertools::Itertools;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::SplitWhitespace;

use crate::error::FlameError;
use crate::fit::EditMode;
use crate::linalg::{AffineMap, Color3, Matrix2, Vector2};
use crate::mapping::{AffineStage, FlameMapping};
use crate::variation::Variation;

const MAGIC: &str = "FlamEd";
const VERSION: &str = "V1";
const MAP_SEPARATOR: &str = "--";
const TERMINATOR: &str = "----";

/// A whole flame.
#[derive(Clone, Debug, PartialEq)]
pub struct FlameMaps {
    /// Exposure used by the HDR tone mapper.
    pub hdr_exposure: f64,
    /// Power (gamma) used by the HDR tone mapper.
    pub hdr_power: f64,
    /// Applied to every output point; never chosen at random.
    pub final_map: FlameMapping,
    /// The mappings chosen uniformly at random during iteration.
    pub maps: Vec<FlameMapping>,
}

impl FlameMaps {
    /// Constructor.
    pub fn new(final_map: FlameMapping, maps: Vec<FlameMapping>) -> Self {
        FlameMaps {
            hdr_exposure: 1.0,
            hdr_power: 1.0,
            final_map,
            maps,
        }
    }

    /// Number of randomly chosen mappings.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// True when there is nothing to iterate.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Mutable access to one mapping.
    pub fn map_mut(&mut self, index: usize) -> Result<&mut FlameMapping, FlameError> {
        let len = self.maps.len();
        self.maps
            .get_mut(index)
            .ok_or(FlameError::NoSuchMap { index, len })
    }

    /// Append a mapping, returning its index.
    pub fn add_map(&mut self, mapping: FlameMapping) -> usize {
        self.maps.push(mapping);
        self.maps.len() - 1
    }

    /// Insert a copy of the mapping at `index` right after it,
    /// returning the index of the copy.
    pub fn duplicate_map(&mut self, index: usize) -> Result<usize, FlameError> {
        let copy = *self.map_mut(index)?;
        self.maps.insert(index + 1, copy);
        Ok(index + 1)
    }

    /// Remove and return a mapping.  The last remaining mapping cannot
    /// be removed.
    pub fn remove_map(&mut self, index: usize) -> Result<FlameMapping, FlameError> {
        self.map_mut(index)?;
        if self.maps.len() == 1 {
            return Err(FlameError::NoMaps);
        }
        Ok(self.maps.remove(index))
    }

    /// Apply a drag to one mapping.  See [`FlameMapping::edit`].
    pub fn edit(
        &mut self,
        index: usize,
        mode: EditMode,
        p: Vector2,
        df: Vector2,
        stage: AffineStage,
    ) -> Result<(), FlameError> {
        self.map_mut(index)?.edit(mode, p, df, stage)
    }

    /// Write the flame in `FlamEd V1` format.
    pub fn save<W: Write>(&self, out: &mut W) -> Result<(), FlameError> {
        writeln!(out, "{} {}", MAGIC, VERSION)?;
        writeln!(out, "{} {}", self.hdr_exposure, self.hdr_power)?;
        write_mapping(out, &self.final_map)?;
        for mapping in &self.maps {
            writeln!(out, "{}", MAP_SEPARATOR)?;
            write_mapping(out, mapping)?;
        }
        writeln!(out, "{}", TERMINATOR)?;
        Ok(())
    }

    /// Parse a flame in `FlamEd V1` format.
    pub fn read<R: Read>(input: &mut R) -> Result<FlameMaps, FlameError> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        let mut tokens = Tokens(text.split_whitespace());

        let magic = tokens.next("header")?;
        if magic != MAGIC {
            return Err(FlameError::BadHeader(magic.to_string()));
        }
        let version = tokens.next("header")?;
        if version != VERSION {
            return Err(FlameError::BadHeader(format!("{} {}", magic, version)));
        }

        let hdr_exposure = tokens.number("hdr exposure")?;
        let hdr_power = tokens.number("hdr power")?;
        let final_map = read_mapping(&mut tokens)?;
        let mut maps = Vec::new();
        let mut token = tokens.next("map separator")?;
        while token == MAP_SEPARATOR {
            maps.push(read_mapping(&mut tokens)?);
            token = tokens.next("map separator")?;
        }
        if token != TERMINATOR {
            return Err(FlameError::BadTerminator(token.to_string()));
        }

        Ok(FlameMaps {
            hdr_exposure,
            hdr_power,
            final_map,
            maps,
        })
    }

    /// Replace `self` with the flame read from `input`.  On any error
    /// `self` is left exactly as it was.
    pub fn load<R: Read>(&mut self, input: &mut R) -> Result<(), FlameError> {
        *self = FlameMaps::read(input)?;
        Ok(())
    }

    /// Read a flame file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<FlameMaps, FlameError> {
        let mut input = BufReader::new(File::open(path)?);
        FlameMaps::read(&mut input)
    }

    /// Write a flame file to disk.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), FlameError> {
        let mut out = BufWriter::new(File::create(path)?);
        self.save(&mut out)?;
        out.flush()?;
        Ok(())
    }
}

impl Default for FlameMaps {
    /// A small starter flame: a Sierpinski-style triangle of three
    /// half-scale linear maps plus a contracted swirl, each with its
    /// own color, and an identity final map.
    fn default() -> Self {
        let half = Matrix2::identity() * 0.5;
        let corner = |x: f64, y: f64, color: Color3| {
            FlameMapping::new(
                AffineMap::new(half, Vector2::new(x, y)),
                Variation::Linear,
                AffineMap::identity(),
                color,
                0.5,
            )
        };
        let swirl = FlameMapping::new(
            AffineMap::new(Matrix2::new(0.6, -0.2, 0.2, 0.6), Vector2::new(0.1, 0.0)),
            Variation::Swirl,
            AffineMap::new(Matrix2::identity() * 0.4, Vector2::new(0.0, 0.0)),
            Color3::new(1.0, 0.85, 0.3),
            0.2,
        );
        let maps = vec![
            corner(-0.5, -0.5, Color3::new(1.0, 0.2, 0.2)),
            corner(0.5, -0.5, Color3::new(0.2, 1.0, 0.2)),
            corner(0.0, 0.5, Color3::new(0.2, 0.4, 1.0)),
            swirl,
        ];
        FlameMaps::new(FlameMapping::default(), maps)
    }
}

fn write_affine<W: Write>(out: &mut W, aff: &AffineMap) -> Result<(), FlameError> {
    let fields = [aff.m.a, aff.m.b, aff.m.c, aff.m.d];
    writeln!(out, "{}   {} {}", fields.iter().join(" "), aff.c.x, aff.c.y)?;
    Ok(())
}

fn write_mapping<W: Write>(out: &mut W, mapping: &FlameMapping) -> Result<(), FlameError> {
    write_affine(out, &mapping.pre_map)?;
    writeln!(out, "{}", mapping.variation)?;
    write_affine(out, &mapping.post_map)?;
    let color = [mapping.color.r, mapping.color.g, mapping.color.b];
    writeln!(out, "{}   {}", color.iter().join(" "), mapping.color_speed)?;
    Ok(())
}

struct Tokens<'a>(SplitWhitespace<'a>);

impl<'a> Tokens<'a> {
    fn next(&mut self, what: &'static str) -> Result<&'a str, FlameError> {
        self.0.next().ok_or(FlameError::UnexpectedEof(what))
    }

    fn number(&mut self, field: &'static str) -> Result<f64, FlameError> {
        let token = self.next(field)?;
        token.parse::<f64>().map_err(|_| FlameError::BadNumber {
            token: token.to_string(),
            field,
        })
    }
}

fn read_affine(tokens: &mut Tokens) -> Result<AffineMap, FlameError> {
    let a = tokens.number("affine matrix")?;
    let b = tokens.number("affine matrix")?;
    let c = tokens.number("affine matrix")?;
    let d = tokens.number("affine matrix")?;
    let cx = tokens.number("affine translation")?;
    let cy = tokens.number("affine translation")?;
    Ok(AffineMap::new(Matrix2::new(a, b, c, d), Vector2::new(cx, cy)))
}

fn read_mapping(tokens: &mut Tokens) -> Result<FlameMapping, FlameError> {
    let pre_map = read_affine(tokens)?;
    let variation = tokens.next("variation")?.parse::<Variation>()?;
    let post_map = read_affine(tokens)?;
    let r = tokens.number("color")?;
    let g = tokens.number("color")?;
    let b = tokens.number("color")?;
    let color_speed = tokens.number("color speed")?;
    Ok(FlameMapping::new(
        pre_map,
        variation,
        post_map,
        Color3::new(r, g, b),
        color_speed,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FlameMaps {
        let mut maps = FlameMaps::default();
        maps.hdr_exposure = 1.75e-3;
        maps.hdr_power = 0.45;
        maps.final_map.post_map = AffineMap::new(
            Matrix2::new(0.123456789012, -1.0 / 3.0, 1e-7, 42.0),
            Vector2::new(-0.25, 1.0 / 7.0),
        );
        maps.maps[1].variation = Variation::Horseshoe;
        maps
    }

    fn saved(maps: &FlameMaps) -> String {
        let mut out = Vec::new();
        maps.save(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn save_then_read_reproduces_every_field() {
        let maps = sample();
        let text = saved(&maps);
        let back = FlameMaps::read(&mut text.as_bytes()).unwrap();
        assert_eq!(back, maps);
    }

    #[test]
    fn save_layout_has_header_separators_and_terminator() {
        let text = saved(&sample());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "FlamEd V1");
        assert_eq!(lines.iter().filter(|l| **l == "--").count(), 4);
        assert_eq!(*lines.last().unwrap(), "----");
    }

    #[test]
    fn load_with_bad_header_leaves_receiver_alone() {
        let mut maps = sample();
        let text = saved(&FlameMaps::default()).replacen("FlamEd", "NotFlamEd", 1);
        match maps.load(&mut text.as_bytes()) {
            Err(FlameError::BadHeader(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(maps, sample());
    }

    #[test]
    fn load_with_wrong_version_fails() {
        let text = saved(&sample()).replacen("V1", "V2", 1);
        assert!(FlameMaps::read(&mut text.as_bytes()).is_err());
    }

    #[test]
    fn load_without_terminator_leaves_receiver_alone() {
        let mut maps = sample();
        let text = saved(&FlameMaps::default()).replace("----", "-----");
        match maps.load(&mut text.as_bytes()) {
            Err(FlameError::BadTerminator(token)) => assert_eq!(token, "-----"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(maps, sample());
    }

    #[test]
    fn truncated_input_is_reported() {
        let text = saved(&sample());
        let truncated = &text[..text.len() / 2];
        assert!(FlameMaps::read(&mut truncated.as_bytes()).is_err());
    }

    #[test]
    fn garbage_number_is_reported() {
        let text = "FlamEd V1\n1 one\n";
        match FlameMaps::read(&mut text.as_bytes()) {
            Err(FlameError::BadNumber { token, .. }) => assert_eq!(token, "one"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn successful_load_replaces_receiver() {
        let mut maps = FlameMaps::default();
        maps.load(&mut saved(&sample()).as_bytes()).unwrap();
        assert_eq!(maps, sample());
    }

    #[test]
    fn flame_with_only_a_final_map_loads() {
        let only_final = FlameMaps::new(FlameMapping::default(), vec![]);
        let back = FlameMaps::read(&mut saved(&only_final).as_bytes()).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn remove_refuses_to_empty_the_list() {
        let mut maps = FlameMaps::new(FlameMapping::default(), vec![FlameMapping::default()]);
        match maps.remove_map(0) {
            Err(FlameError::NoMaps) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(maps.len(), 1);
    }

    #[test]
    fn duplicate_and_remove() {
        let mut maps = FlameMaps::default();
        let n = maps.len();
        let copy = maps.duplicate_map(2).unwrap();
        assert_eq!(copy, 3);
        assert_eq!(maps.maps[2], maps.maps[3]);
        maps.remove_map(copy).unwrap();
        assert_eq!(maps.len(), n);
        assert!(maps.remove_map(n).is_err());
    }

    #[test]
    fn edit_targets_one_mapping() {
        let mut maps = FlameMaps::default();
        let before = maps.clone();
        maps.edit(
            1,
            EditMode::Translate,
            Vector2::new(0.2, 0.1),
            Vector2::new(0.05, 0.0),
            AffineStage::Post,
        )
        .unwrap();
        assert_ne!(maps.maps[1], before.maps[1]);
        assert_eq!(maps.maps[0], before.maps[0]);
        assert_eq!(maps.maps[2], before.maps[2]);
        assert_eq!(maps.final_map, before.final_map);
    }
}
