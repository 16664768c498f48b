//! Physical dimensions and unit recognition.
//!
//! A [`Dimension`] is a product of base dimensions raised to integer powers
//! (time¹, length¹·time⁻¹, …) together with the units that may express it.
//! Unit tables are supplied by the caller; this module only knows how to
//! read a unit string such as `kJ/mol`, `cm-1` or `[ns]` against one.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::{ModelError, ModelResult};

/// Metric magnitude prefixes and their powers of ten.
pub const MAGNITUDES: &[(&str, i32)] = &[
    ("T", 12),
    ("G", 9),
    ("M", 6),
    ("k", 3),
    ("c", -2),
    ("m", -3),
    ("µ", -6),
    ("μ", -6),
    ("n", -9),
    ("p", -12),
    ("f", -15),
];

/// Largest absolute power accepted after a unit, as in `m2` or `s^-1`.
pub const MAX_UNIT_POWER: i32 = 9;

/// A unit and the base dimensions it expresses.
pub struct UnitDef {
    name: String,
    pattern: String,
    regex: Regex,
    powers: BTreeMap<String, i32>,
}

impl UnitDef {
    /// `pattern` is matched at the current position of a unit string, e.g.
    /// `s(ec(ond)?s?)?` for seconds.
    pub fn new(name: impl Into<String>, pattern: &str, powers: BTreeMap<String, i32>) -> ModelResult<Self> {
        let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|err| {
            ModelError::InvalidConfiguration(format!("unit pattern `{}`: {}", pattern, err))
        })?;
        Ok(UnitDef {
            name: name.into(),
            pattern: pattern.to_string(),
            regex,
            powers,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The regex source of this unit, for building token-level grammars.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn match_len(&self, text: &str) -> Option<usize> {
        self.regex.find(text).map(|found| found.end()).filter(|len| *len > 0)
    }
}

impl fmt::Debug for UnitDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitDef")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("powers", &self.powers)
            .finish()
    }
}

/// A physical dimension and the units that can express it.
#[derive(Debug, Clone)]
pub struct Dimension {
    name: String,
    powers: BTreeMap<String, i32>,
    units: Vec<Arc<UnitDef>>,
}

impl Dimension {
    /// A base dimension named `name`, with the given `(unit name, pattern)` units.
    pub fn base(name: &str, units: &[(&str, &str)]) -> ModelResult<Self> {
        let powers: BTreeMap<String, i32> = std::iter::once((name.to_string(), 1)).collect();
        Self::with_units(name, powers, units)
    }

    /// A dimension with no base dimensions. With units (e.g. percent) it is a
    /// ratio; without units it is a plain number.
    pub fn dimensionless(name: &str, units: &[(&str, &str)]) -> ModelResult<Self> {
        Self::with_units(name, BTreeMap::new(), units)
    }

    fn with_units(name: &str, powers: BTreeMap<String, i32>, units: &[(&str, &str)]) -> ModelResult<Self> {
        let units = units
            .iter()
            .map(|(unit_name, pattern)| UnitDef::new(*unit_name, pattern, powers.clone()).map(Arc::new))
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(Dimension {
            name: name.to_string(),
            powers,
            units,
        })
    }

    /// A derived dimension, e.g. `[(&length, 1), (&time, -1)]` for speed.
    /// Units of every factor are available to it.
    pub fn product(name: &str, factors: &[(&Dimension, i32)]) -> Self {
        let mut powers = BTreeMap::new();
        let mut units: Vec<Arc<UnitDef>> = Vec::new();
        for (dimension, power) in factors {
            for (base, base_power) in &dimension.powers {
                *powers.entry(base.clone()).or_insert(0) += base_power * power;
            }
            for unit in &dimension.units {
                if !units.iter().any(|known| known.name == unit.name) {
                    units.push(unit.clone());
                }
            }
        }
        powers.retain(|_, power| *power != 0);
        Dimension {
            name: name.to_string(),
            powers,
            units,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &[Arc<UnitDef>] {
        &self.units
    }

    pub fn powers(&self) -> &BTreeMap<String, i32> {
        &self.powers
    }

    /// True for a plain number with no units at all.
    pub fn is_dimensionless(&self) -> bool {
        self.powers.is_empty() && self.units.is_empty()
    }

    /// Read `text` as a product of this dimension's units.
    pub fn decompose(&self, text: &str) -> Option<ParsedUnits> {
        let mut reader = UnitReader {
            text,
            position: 0,
            units: &self.units,
        };
        let parts = reader.sequence(1)?;
        if reader.position != text.len() || parts.is_empty() {
            return None;
        }
        Some(ParsedUnits { parts })
    }

    /// Whether `text` reads as units whose dimensions are exactly this one's.
    pub fn matches(&self, text: &str) -> bool {
        self.decompose(text)
            .map(|parsed| parsed.powers() == self.powers)
            .unwrap_or(false)
    }
}

/// One unit factor of a unit string.
#[derive(Debug, Clone)]
pub struct UnitPower {
    pub unit: Arc<UnitDef>,
    /// Power of ten of the magnitude prefix.
    pub magnitude: i32,
    pub power: i32,
}

/// A unit string read as a product of unit factors.
#[derive(Debug, Clone)]
pub struct ParsedUnits {
    parts: Vec<UnitPower>,
}

impl ParsedUnits {
    pub fn parts(&self) -> &[UnitPower] {
        &self.parts
    }

    /// Combined powers of the base dimensions.
    pub fn powers(&self) -> BTreeMap<String, i32> {
        let mut powers = BTreeMap::new();
        for part in &self.parts {
            for (base, base_power) in &part.unit.powers {
                *powers.entry(base.clone()).or_insert(0) += base_power * part.power;
            }
        }
        powers.retain(|_, power| *power != 0);
        powers
    }

    /// Power of ten contributed by the magnitude prefixes.
    pub fn magnitude(&self) -> i32 {
        self.parts.iter().map(|part| part.magnitude * part.power).sum()
    }

    /// Render as `(10^-9.0) * Second^(1.0)`.
    pub fn render(&self) -> String {
        let mut terms: Vec<(&str, i32)> = Vec::new();
        for part in &self.parts {
            match terms.iter_mut().find(|(name, _)| *name == part.unit.name()) {
                Some((_, power)) => *power += part.power,
                None => terms.push((part.unit.name(), part.power)),
            }
        }
        let rendered: Vec<String> = terms
            .iter()
            .filter(|(_, power)| *power != 0)
            .map(|(name, power)| format!("{}^({:.1})", name, f64::from(*power)))
            .collect();
        let magnitude = self.magnitude();
        if magnitude == 0 {
            rendered.join("  ")
        } else {
            format!("(10^{:.1}) * {}", f64::from(magnitude), rendered.join("  "))
        }
    }
}

struct UnitReader<'t> {
    text: &'t str,
    position: usize,
    units: &'t [Arc<UnitDef>],
}

impl<'t> UnitReader<'t> {
    fn rest(&self) -> &'t str {
        &self.text[self.position..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.position += c.len_utf8();
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(' ' | '·' | '⋅' | '•' | '*' | '.')) {
            self.bump();
        }
    }

    /// Factors up to the end of the text or a closing bracket.
    fn sequence(&mut self, sign: i32) -> Option<Vec<UnitPower>> {
        let mut parts = Vec::new();
        loop {
            self.skip_separators();
            match self.peek() {
                None | Some(')' | ']') => return Some(parts),
                _ => {}
            }
            let mut factor_sign = sign;
            if self.peek() == Some('/') {
                self.bump();
                self.skip_separators();
                factor_sign = -sign;
            }
            match self.peek() {
                Some(open @ ('(' | '[')) => {
                    self.bump();
                    let inner = self.sequence(factor_sign)?;
                    let close = if open == '(' { ')' } else { ']' };
                    if self.peek() != Some(close) {
                        return None;
                    }
                    self.bump();
                    let power = self.power()?.unwrap_or(1);
                    parts.extend(inner.into_iter().map(|mut part| {
                        part.power *= power;
                        part
                    }));
                }
                _ => {
                    let (unit, magnitude) = self.unit()?;
                    let power = self.power()?.unwrap_or(1);
                    parts.push(UnitPower {
                        unit,
                        magnitude,
                        power: power * factor_sign,
                    });
                }
            }
        }
    }

    /// Longest unit, with or without a magnitude prefix, at the cursor.
    fn unit(&mut self) -> Option<(Arc<UnitDef>, i32)> {
        let rest = self.rest();
        let mut best: Option<(usize, Arc<UnitDef>, i32)> = None;
        let mut consider = |len: usize, unit: &Arc<UnitDef>, magnitude: i32| {
            if best.as_ref().map_or(true, |(best_len, _, _)| len > *best_len) {
                best = Some((len, unit.clone(), magnitude));
            }
        };
        for unit in self.units {
            if let Some(len) = unit.match_len(rest) {
                consider(len, unit, 0);
            }
            for (prefix, magnitude) in MAGNITUDES {
                if let Some(after) = rest.strip_prefix(prefix) {
                    if let Some(len) = unit.match_len(after) {
                        consider(prefix.len() + len, unit, *magnitude);
                    }
                }
            }
        }
        let (len, unit, magnitude) = best?;
        self.position += len;
        Some((unit, magnitude))
    }

    /// An optional power: `2`, `-1`, `^3`, `⁻¹`. `Some(None)` when absent,
    /// `None` when malformed or out of range.
    fn power(&mut self) -> Option<Option<i32>> {
        let start = self.position;
        if self.peek() == Some('^') {
            self.bump();
        }
        let mut sign = 1;
        if matches!(self.peek(), Some('-' | '−' | '–' | '⁻')) {
            sign = -1;
            self.bump();
        } else if matches!(self.peek(), Some('+' | '⁺')) {
            self.bump();
        }
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            let digit = match c {
                '0'..='9' => c,
                '⁰' => '0',
                '¹' => '1',
                '²' => '2',
                '³' => '3',
                '⁴' => '4',
                '⁵' => '5',
                '⁶' => '6',
                '⁷' => '7',
                '⁸' => '8',
                '⁹' => '9',
                _ => break,
            };
            digits.push(digit);
            self.bump();
        }
        if digits.is_empty() {
            self.position = start;
            return Some(None);
        }
        let power: i32 = digits.parse().ok()?;
        if power == 0 || power > MAX_UNIT_POWER {
            return None;
        }
        Some(Some(sign * power))
    }
}
